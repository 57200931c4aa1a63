//! Daemon lifecycle -- pipeline assembly, startup, health reporting and shutdown.
//!
//! The [`Daemon`] owns a [`PipelineManager`] built from `logweave.toml`.
//! `run` starts every enabled pipeline, logs aggregated health on a fixed
//! interval and stops all pipelines once a shutdown signal arrives.

use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use logweave_core::config::LogweaveConfig;
use logweave_core::metrics as m;
use logweave_pipeline::{ComponentRegistry, PipelineManager};

use crate::health::{DaemonHealth, PipelineHealth, aggregate_status};
use crate::metrics_server;

/// Interval between aggregated health log lines.
const HEALTH_REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// The logweave daemon.
pub struct Daemon {
    config: LogweaveConfig,
    manager: PipelineManager,
    start_time: Instant,
}

impl Daemon {
    /// Load configuration from a file and build the daemon.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = LogweaveConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config, &ComponentRegistry::with_defaults())
    }

    /// Build from an already-loaded configuration.
    ///
    /// Installs the Prometheus recorder first when `[metrics]` is enabled,
    /// so that pipeline counters are recorded from the first entry.
    pub fn build_from_config(config: LogweaveConfig, registry: &ComponentRegistry) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }
        record_build_info();

        let manager = PipelineManager::from_config(&config, registry)
            .map_err(|e| anyhow::anyhow!("failed to build pipelines: {}", e))?;

        tracing::info!(pipelines = manager.len(), "daemon initialized");

        Ok(Self {
            config,
            manager,
            start_time: Instant::now(),
        })
    }

    /// Start all pipelines and block until SIGTERM or SIGINT.
    pub async fn run(&mut self) -> Result<()> {
        let signal = shutdown_signal()?;
        self.run_until(signal).await
    }

    /// Start all pipelines and block until `shutdown` resolves.
    ///
    /// If any pipeline fails to start, the ones already running are
    /// stopped again and the start error is returned.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = &'static str>,
    {
        tracing::info!("starting all pipelines");
        if let Err(e) = self.manager.start_all().await {
            tracing::warn!("startup failed, stopping already-started pipelines");
            if let Err(stop_err) = self.manager.stop_all().await {
                tracing::error!(
                    startup_error = %e,
                    rollback_error = %stop_err,
                    "rollback also failed during startup failure cleanup"
                );
            }
            return Err(e.into());
        }

        tokio::pin!(shutdown);
        let mut interval = tokio::time::interval(HEALTH_REPORT_INTERVAL);
        // first tick completes immediately
        interval.tick().await;

        let signal = loop {
            tokio::select! {
                signal = &mut shutdown => break signal,
                _ = interval.tick() => self.report_health().await,
            }
        };
        tracing::info!(signal = signal, "shutdown signal received");

        self.shutdown().await
    }

    /// Stop every running pipeline and log the final statistics.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping all pipelines");
        let result = self.manager.stop_all().await;

        for stats in self.manager.stats() {
            match serde_json::to_string(&stats) {
                Ok(json) => tracing::info!(pipeline = %stats.name, stats = %json, "final pipeline stats"),
                Err(e) => tracing::warn!(pipeline = %stats.name, error = %e, "failed to serialize stats"),
            }
        }

        result.map_err(Into::into)
    }

    /// Current aggregated health.
    pub async fn health(&self) -> DaemonHealth {
        let pipelines: Vec<PipelineHealth> = self
            .manager
            .health()
            .await
            .into_iter()
            .map(|(name, status)| PipelineHealth {
                enabled: self.manager.get(&name).is_some_and(|p| p.is_enabled()),
                name,
                status,
            })
            .collect();

        DaemonHealth {
            status: aggregate_status(&pipelines),
            uptime_secs: self.start_time.elapsed().as_secs(),
            pipelines,
        }
    }

    async fn report_health(&self) {
        let health = self.health().await;
        record_uptime(health.uptime_secs);
        if health.status.is_healthy() {
            tracing::debug!(uptime_secs = health.uptime_secs, "daemon healthy");
        } else {
            tracing::warn!(
                uptime_secs = health.uptime_secs,
                status = %health.status,
                "daemon health check"
            );
        }
    }

    /// The pipeline manager.
    pub fn manager(&self) -> &PipelineManager {
        &self.manager
    }

    /// The loaded configuration.
    pub fn config(&self) -> &LogweaveConfig {
        &self.config
    }
}

/// Install SIGTERM and SIGINT handlers.
///
/// The returned future resolves with the name of the first signal received.
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Export the build info gauge (always 1, labelled with the crate version).
fn record_build_info() {
    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

#[allow(clippy::cast_precision_loss)]
fn record_uptime(uptime_secs: u64) {
    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
}
