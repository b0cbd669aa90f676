use anyhow::Context;
use tracing_subscriber::EnvFilter;

use infiniweb::config::AppConfig;
use infiniweb::server::run_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("infiniweb=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("loading configuration from environment")?;
    run_server(config).await.context("running server")?;
    Ok(())
}
