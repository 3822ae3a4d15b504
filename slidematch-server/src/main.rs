use clap::Parser;
use slidematch_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    slidematch_server::start_server(config).await
}
