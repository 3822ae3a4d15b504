use clap::Parser;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 9898;
/// Default request body limit (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Log filter used when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "slidematch=info,slidematch_server=info,tower_http=info";

/// Server configuration, read from flags or `SLIDEMATCH_*` environment variables.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about = "Slide-captcha offset and text captcha HTTP service")]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "SLIDEMATCH_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    /// Port to listen on.
    #[arg(long, env = "SLIDEMATCH_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Maximum accepted request body size in bytes.
    #[arg(long, env = "SLIDEMATCH_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
    /// Log filter directive (overrides RUST_LOG).
    #[arg(long, env = "SLIDEMATCH_LOG")]
    pub log_level: Option<String>,
    /// Emit logs as JSON lines.
    #[arg(long, env = "SLIDEMATCH_LOG_JSON")]
    pub log_json: bool,
    /// Disable the permissive CORS layer.
    #[arg(long, env = "SLIDEMATCH_NO_CORS")]
    pub no_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_level: None,
            log_json: false,
            no_cors: false,
        }
    }
}

impl ServerConfig {
    /// Whether cross-origin requests are allowed.
    pub fn cors_enabled(&self) -> bool {
        !self.no_cors
    }

    /// `host:port` string for logging.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
