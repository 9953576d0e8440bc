use clap::Parser;
use common::config::Config;
use metrics_exporter_prometheus::PrometheusBuilder;
use review::server::{AppState, run_backend};
use review::storage::PgStorage;
use std::{error::Error, sync::Arc};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "config/backend.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.backend.log_level)),
        )
        .init();

    PrometheusBuilder::new().install()?;

    let storage = Arc::new(PgStorage::new(&config.common.database_url).await?);
    storage.initialize_schema().await?;

    let state = AppState::new(
        storage.clone(),
        storage.clone(),
        storage.clone(),
        storage,
    );
    run_backend(config.backend, state).await
}
