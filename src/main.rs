use anyhow::{Context, Result};

use consentry::{cli::config_path_from_args, config::Config, logging::init_tracing, runtime};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let logging_guard = init_tracing(&config.logging)?;
    tracing::info!(
        target: "runtime",
        run_id = %logging_guard.run_id(),
        config = %config_path.display(),
        "consentry_starting"
    );

    runtime::run(config).await
}
