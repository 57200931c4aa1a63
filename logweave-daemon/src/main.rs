use anyhow::Result;
use clap::Parser;

use logweave_core::config::LogweaveConfig;
use logweave_daemon::cli::DaemonCli;
use logweave_daemon::daemon::Daemon;
use logweave_daemon::logging;
use logweave_pipeline::ComponentRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // file -> env -> CLI, validated once all layers are applied
    let mut config = LogweaveConfig::parse(
        &tokio::fs::read_to_string(&cli.config)
            .await
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", cli.config.display(), e))?,
    )?;
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!(
            "configuration is valid ({} pipeline(s))",
            config.pipelines.len()
        );
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(config = %cli.config.display(), "logweave-daemon starting");

    let mut daemon = Daemon::build_from_config(config, &ComponentRegistry::with_defaults())?;
    daemon.run().await?;

    tracing::info!("logweave-daemon shut down");
    Ok(())
}
