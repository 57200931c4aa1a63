//! 파이프라인 관리자 -- 이름이 붙은 여러 파이프라인의 생명주기를 감독합니다.

use std::collections::BTreeMap;

use logweave_core::config::LogweaveConfig;
use logweave_core::pipeline::{HealthStatus, Pipeline};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::pipeline::{LogPipeline, PipelineStats};
use crate::registry::ComponentRegistry;

/// 파이프라인 관리자
///
/// 파이프라인은 이름순으로 보관되며 `start_all`/`stop_all`도 이름순으로 진행합니다.
/// 일괄 작업은 개별 실패에서 멈추지 않고 실패를 모아 하나의 에러로 반환합니다.
#[derive(Default)]
pub struct PipelineManager {
    pipelines: BTreeMap<String, LogPipeline>,
}

impl PipelineManager {
    /// 빈 관리자를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정에 선언된 모든 파이프라인을 하나의 레지스트리로 생성합니다.
    pub fn from_config(
        config: &LogweaveConfig,
        registry: &ComponentRegistry,
    ) -> Result<Self, LogPipelineError> {
        let mut manager = Self::new();
        for declared in &config.pipelines {
            let pipeline_config = PipelineConfig::from_core(declared)?;
            manager.add(LogPipeline::new(pipeline_config, registry.clone())?)?;
        }
        Ok(manager)
    }

    /// 파이프라인을 등록합니다.
    pub fn add(&mut self, pipeline: LogPipeline) -> Result<(), LogPipelineError> {
        let name = pipeline.name().to_owned();
        if self.pipelines.contains_key(&name) {
            return Err(LogPipelineError::PipelineExists(name));
        }
        info!(pipeline = %name, "pipeline registered");
        self.pipelines.insert(name, pipeline);
        Ok(())
    }

    /// 파이프라인을 제거합니다. 실행 중이면 먼저 정지합니다.
    pub async fn remove(&mut self, name: &str) -> Result<LogPipeline, LogPipelineError> {
        let pipeline = self
            .pipelines
            .get_mut(name)
            .ok_or_else(|| LogPipelineError::PipelineNotFound(name.to_owned()))?;
        if pipeline.is_running() {
            pipeline.shutdown().await?;
        }
        self.pipelines
            .remove(name)
            .ok_or_else(|| LogPipelineError::PipelineNotFound(name.to_owned()))
    }

    /// 이름으로 파이프라인을 시작합니다.
    pub async fn start(&mut self, name: &str) -> Result<(), LogPipelineError> {
        self.get_mut(name)?.launch().await
    }

    /// 이름으로 파이프라인을 정지합니다.
    pub async fn stop(&mut self, name: &str) -> Result<(), LogPipelineError> {
        self.get_mut(name)?.shutdown().await
    }

    /// 활성화된 모든 파이프라인을 시작합니다.
    ///
    /// 비활성화 또는 이미 실행 중인 파이프라인은 건너뜁니다.
    pub async fn start_all(&mut self) -> Result<(), LogPipelineError> {
        let mut failures = Vec::new();
        for (name, pipeline) in &mut self.pipelines {
            if !pipeline.is_enabled() {
                info!(pipeline = %name, "pipeline disabled, skipping");
                continue;
            }
            if pipeline.is_running() {
                continue;
            }
            if let Err(e) = pipeline.launch().await {
                warn!(pipeline = %name, error = %e, "pipeline failed to start");
                failures.push(format!("{name}: {e}"));
            }
        }
        aggregate(failures)
    }

    /// 실행 중인 모든 파이프라인을 정지합니다.
    pub async fn stop_all(&mut self) -> Result<(), LogPipelineError> {
        let mut failures = Vec::new();
        for (name, pipeline) in &mut self.pipelines {
            if !pipeline.is_running() {
                continue;
            }
            if let Err(e) = pipeline.shutdown().await {
                warn!(pipeline = %name, error = %e, "pipeline failed to stop");
                failures.push(format!("{name}: {e}"));
            }
        }
        aggregate(failures)
    }

    /// 이름으로 파이프라인을 조회합니다.
    pub fn get(&self, name: &str) -> Option<&LogPipeline> {
        self.pipelines.get(name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut LogPipeline, LogPipelineError> {
        self.pipelines
            .get_mut(name)
            .ok_or_else(|| LogPipelineError::PipelineNotFound(name.to_owned()))
    }

    /// 등록된 파이프라인 이름 (정렬됨)
    pub fn names(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }

    /// 등록된 파이프라인 수
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// 등록된 파이프라인이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// 모든 파이프라인의 통계
    pub fn stats(&self) -> Vec<PipelineStats> {
        self.pipelines.values().map(LogPipeline::stats).collect()
    }

    /// 모든 파이프라인의 건강 상태
    pub async fn health(&self) -> Vec<(String, HealthStatus)> {
        let mut statuses = Vec::with_capacity(self.pipelines.len());
        for (name, pipeline) in &self.pipelines {
            statuses.push((name.clone(), pipeline.health_check().await));
        }
        statuses
    }
}

fn aggregate(failures: Vec<String>) -> Result<(), LogPipelineError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(LogPipelineError::PipelinesFailed { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;
    use logweave_core::config::ComponentConfig;
    use std::time::Duration;

    fn pipeline(name: &str) -> LogPipeline {
        let config = PipelineConfigBuilder::new()
            .name(name)
            .shutdown_grace(Duration::from_millis(1))
            .build()
            .unwrap();
        LogPipeline::new(config, ComponentRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut manager = PipelineManager::new();
        manager.add(pipeline("app")).unwrap();
        assert!(matches!(
            manager.add(pipeline("app")),
            Err(LogPipelineError::PipelineExists(name)) if name == "app"
        ));
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn unknown_names_are_errors() {
        let mut manager = PipelineManager::new();
        assert!(matches!(
            manager.start("nope").await,
            Err(LogPipelineError::PipelineNotFound(_))
        ));
        assert!(matches!(
            manager.stop("nope").await,
            Err(LogPipelineError::PipelineNotFound(_))
        ));
        assert!(manager.remove("nope").await.is_err());
    }

    #[tokio::test]
    async fn start_stop_by_name() {
        let mut manager = PipelineManager::new();
        manager.add(pipeline("a")).unwrap();
        manager.add(pipeline("b")).unwrap();

        manager.start("a").await.unwrap();
        assert!(manager.get("a").unwrap().is_running());
        assert!(!manager.get("b").unwrap().is_running());
        assert!(matches!(
            manager.start("a").await,
            Err(LogPipelineError::AlreadyRunning(_))
        ));

        manager.stop("a").await.unwrap();
        assert!(matches!(
            manager.stop("a").await,
            Err(LogPipelineError::NotRunning(_))
        ));
    }

    #[tokio::test]
    async fn remove_stops_running_pipeline() {
        let mut manager = PipelineManager::new();
        manager.add(pipeline("a")).unwrap();
        manager.start("a").await.unwrap();

        let removed = manager.remove("a").await.unwrap();
        assert!(!removed.is_running());
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn start_all_skips_disabled_and_stop_all_stops_running() {
        let mut manager = PipelineManager::new();
        manager.add(pipeline("a")).unwrap();
        manager.add(pipeline("b")).unwrap();
        let disabled = PipelineConfigBuilder::new().name("c").enabled(false).build().unwrap();
        manager
            .add(LogPipeline::new(disabled, ComponentRegistry::new()).unwrap())
            .unwrap();

        manager.start_all().await.unwrap();
        let running: Vec<bool> = manager
            .names()
            .iter()
            .map(|n| manager.get(n).unwrap().is_running())
            .collect();
        assert_eq!(running, vec![true, true, false]);

        manager.stop_all().await.unwrap();
        assert!(manager.stats().iter().all(|s| s.state != crate::pipeline::PipelineState::Running));

        let health = manager.health().await;
        assert_eq!(health.len(), 3);
        assert!(health.iter().all(|(_, status)| status.is_unhealthy()));
    }

    #[tokio::test]
    async fn start_all_skips_running_pipelines() {
        let mut manager = PipelineManager::new();
        manager.add(pipeline("a")).unwrap();
        manager.add(pipeline("b")).unwrap();
        manager.start("a").await.unwrap();

        manager.start_all().await.unwrap();
        assert!(manager.get("b").unwrap().is_running());
        manager.stop_all().await.unwrap();
    }

    #[test]
    fn from_config_builds_every_pipeline() {
        let toml = r#"
            [[pipelines]]
            name = "app"

            [[pipelines.outputs]]
            type = "console"
            name = "stdout"

            [[pipelines]]
            name = "audit"
            enabled = false
        "#;
        let config = LogweaveConfig::parse(toml).unwrap();
        let manager = PipelineManager::from_config(&config, &ComponentRegistry::with_defaults()).unwrap();
        assert_eq!(manager.names(), vec!["app", "audit"]);
        assert!(!manager.get("audit").unwrap().is_enabled());
        assert_eq!(
            manager.get("app").unwrap().config().outputs,
            vec![ComponentConfig::new("console", "stdout")]
        );
    }

    #[test]
    fn from_config_rejects_duplicate_names() {
        // parse는 검증하지 않으므로 중복 이름이 그대로 들어옴
        let config = LogweaveConfig::parse(
            r#"
            [[pipelines]]
            name = "app"

            [[pipelines]]
            name = "app"
        "#,
        )
        .unwrap();

        let err = PipelineManager::from_config(&config, &ComponentRegistry::new())
            .err()
            .unwrap();
        assert!(matches!(err, LogPipelineError::PipelineExists(_)));
    }
}
