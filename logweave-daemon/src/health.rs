//! Aggregated health reporting.
//!
//! Collects each pipeline's `health_check()` into a [`DaemonHealth`]
//! report. The overall status is the worst status among enabled pipelines.
//!
//! # Aggregation Rule
//!
//! - All Healthy -> Healthy
//! - Any Degraded, none Unhealthy -> Degraded(reason)
//! - Any Unhealthy -> Unhealthy(reason)

use logweave_core::pipeline::HealthStatus;

/// Aggregated health report for the whole daemon.
#[derive(Debug, Clone)]
pub struct DaemonHealth {
    /// Overall status (worst of all enabled pipelines).
    pub status: HealthStatus,
    /// Seconds since the daemon was built.
    pub uptime_secs: u64,
    /// Per-pipeline reports, ordered by name.
    pub pipelines: Vec<PipelineHealth>,
}

/// Health status of a single pipeline.
#[derive(Debug, Clone)]
pub struct PipelineHealth {
    /// Pipeline name.
    pub name: String,
    /// Whether the pipeline is enabled in configuration.
    pub enabled: bool,
    /// Current health status.
    pub status: HealthStatus,
}

/// Aggregate pipeline statuses into a single status.
///
/// Returns the worst status found: Unhealthy > Degraded > Healthy.
/// Disabled pipelines are ignored.
pub fn aggregate_status(pipelines: &[PipelineHealth]) -> HealthStatus {
    let mut worst = HealthStatus::Healthy;
    let mut reasons = Vec::new();

    for pipeline in pipelines.iter().filter(|p| p.enabled) {
        match &pipeline.status {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => {
                if !worst.is_unhealthy() {
                    reasons.push(format!("{}: {}", pipeline.name, reason));
                    worst = HealthStatus::Degraded(String::new());
                }
            }
            HealthStatus::Unhealthy(reason) => {
                if !worst.is_unhealthy() {
                    // degraded reasons are superseded
                    reasons.clear();
                }
                reasons.push(format!("{}: {}", pipeline.name, reason));
                worst = HealthStatus::Unhealthy(String::new());
            }
        }
    }

    match worst {
        HealthStatus::Healthy => HealthStatus::Healthy,
        HealthStatus::Degraded(_) => HealthStatus::Degraded(reasons.join("; ")),
        HealthStatus::Unhealthy(_) => HealthStatus::Unhealthy(reasons.join("; ")),
    }
}
