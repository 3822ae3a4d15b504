//! HTTP JSON service in front of the `slidematch` engine.
//!
//! # Endpoints
//!
//! - `GET /` - liveness message
//! - `POST /ocr` - `{"image": <base64>}` to recognized text
//! - `POST /slide` - `{"bg_image", "slide_image"}` or `{"full_image"}` to a
//!   slider offset `{"x", "y"}`
//!
//! Every response is a JSON envelope whose `code` is 0 on success and 1 on
//! a reported failure. Slide matching failures are never reported: they
//! answer the default offset `(150, 0)`.
//!
//! ```rust,no_run
//! use clap::Parser;
//! use slidematch_server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     slidematch_server::start_server(ServerConfig::parse()).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use server::{build_router, init_tracing, serve, start_server};
pub use state::AppState;
