//! 로그 파이프라인 런타임 설정
//!
//! [`PipelineConfig`]는 core의 [`LogPipelineConfig`](logweave_core::config::LogPipelineConfig)
//! 선언을 파이프라인 내부에서 바로 쓸 수 있는 형태(`Duration`, 열거형)로 변환한 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use logweave_core::config::LogweaveConfig;
//! use logweave_pipeline::config::PipelineConfig;
//!
//! let core_config = LogweaveConfig::parse(toml_str)?;
//! let config = PipelineConfig::from_core(&core_config.pipelines[0])?;
//! ```

use std::time::Duration;

use logweave_core::config::{ComponentConfig, LogPipelineConfig};
use serde::{Deserialize, Serialize};

use crate::error::LogPipelineError;

/// 버퍼 오버플로우 시 드롭 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPolicy {
    /// 가장 오래된 엔트리를 드롭 (기본값)
    #[default]
    Oldest,
    /// 가장 최신 엔트리를 드롭 (새 유입 거부)
    Newest,
}

impl DropPolicy {
    /// 설정 문자열에서 드롭 정책을 파싱합니다.
    pub fn parse(s: &str) -> Result<Self, LogPipelineError> {
        match s {
            "oldest" => Ok(Self::Oldest),
            "newest" => Ok(Self::Newest),
            other => Err(LogPipelineError::Config {
                field: "drop_policy".to_owned(),
                reason: format!("unknown drop policy '{other}', expected 'oldest' or 'newest'"),
            }),
        }
    }
}

/// 로그 파이프라인 런타임 설정
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 파이프라인 이름
    pub name: String,
    /// 활성화 여부
    pub enabled: bool,
    /// 버퍼 및 내부 채널 용량
    pub buffer_size: usize,
    /// 주기적 플러시 간격
    pub flush_interval: Duration,
    /// 이 개수만큼 쌓이면 즉시 플러시
    pub flush_threshold: usize,
    /// 프로세서 워커 수
    pub workers: usize,
    /// 출력 호출당 타임아웃
    pub output_timeout: Duration,
    /// 재시도 횟수 (예약됨, 어떤 실행 경로에서도 사용하지 않음)
    pub retry_attempts: u32,
    /// 재시도 지연 (예약됨)
    pub retry_delay: Duration,
    /// 버퍼 오버플로우 드롭 정책
    pub drop_policy: DropPolicy,
    /// 통계 샘플링 간격
    pub stats_interval: Duration,
    /// 정지 시 진행 중 작업 대기 시간
    pub shutdown_grace: Duration,
    /// 수집기 선언
    pub collectors: Vec<ComponentConfig>,
    /// 프로세서 선언
    pub processors: Vec<ComponentConfig>,
    /// 출력 선언
    pub outputs: Vec<ComponentConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            enabled: true,
            buffer_size: 10_000,
            flush_interval: Duration::from_secs(5),
            flush_threshold: 100,
            workers: 4,
            output_timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            drop_policy: DropPolicy::Oldest,
            stats_interval: Duration::from_secs(10),
            shutdown_grace: Duration::from_millis(100),
            collectors: Vec::new(),
            processors: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// core의 파이프라인 선언에서 런타임 설정을 생성합니다.
    pub fn from_core(core: &LogPipelineConfig) -> Result<Self, LogPipelineError> {
        let config = Self {
            name: core.name.clone(),
            enabled: core.enabled,
            buffer_size: core.buffer_size,
            flush_interval: Duration::from_secs(core.flush_interval_secs),
            flush_threshold: core.flush_threshold,
            workers: core.workers,
            output_timeout: Duration::from_secs(core.output_timeout_secs),
            retry_attempts: core.retry_attempts,
            retry_delay: Duration::from_secs(core.retry_delay_secs),
            drop_policy: DropPolicy::parse(&core.drop_policy)?,
            stats_interval: Duration::from_secs(core.stats_interval_secs.max(1)),
            shutdown_grace: Duration::from_millis(core.shutdown_grace_ms),
            collectors: core.collectors.clone(),
            processors: core.processors.clone(),
            outputs: core.outputs.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        const MAX_BUFFER_SIZE: usize = 10_000_000;
        const MAX_WORKERS: usize = 1024;

        if self.name.trim().is_empty() {
            return Err(LogPipelineError::Config {
                field: "name".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(LogPipelineError::Config {
                field: "buffer_size".to_owned(),
                reason: format!("must be 1-{MAX_BUFFER_SIZE}"),
            });
        }

        if self.flush_threshold == 0 || self.flush_threshold > self.buffer_size {
            return Err(LogPipelineError::Config {
                field: "flush_threshold".to_owned(),
                reason: format!("must be 1-{}", self.buffer_size),
            });
        }

        if self.flush_interval.is_zero() {
            return Err(LogPipelineError::Config {
                field: "flush_interval".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(LogPipelineError::Config {
                field: "workers".to_owned(),
                reason: format!("must be 1-{MAX_WORKERS}"),
            });
        }

        if self.output_timeout.is_zero() {
            return Err(LogPipelineError::Config {
                field: "output_timeout".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.stats_interval.is_zero() {
            return Err(LogPipelineError::Config {
                field: "stats_interval".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
///
/// 3개 이상의 설정 필드가 있으므로 빌더 패턴을 사용합니다.
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 파이프라인 이름을 설정합니다.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// 활성화 여부를 설정합니다.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// 버퍼 크기를 설정합니다.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// 플러시 간격을 설정합니다.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// 플러시 임계값을 설정합니다.
    pub fn flush_threshold(mut self, threshold: usize) -> Self {
        self.config.flush_threshold = threshold;
        self
    }

    /// 워커 수를 설정합니다.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// 출력 호출당 타임아웃을 설정합니다.
    pub fn output_timeout(mut self, timeout: Duration) -> Self {
        self.config.output_timeout = timeout;
        self
    }

    /// 드롭 정책을 설정합니다.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.config.drop_policy = policy;
        self
    }

    /// 통계 샘플링 간격을 설정합니다.
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.config.stats_interval = interval;
        self
    }

    /// 정지 대기 시간을 설정합니다.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace = grace;
        self
    }

    /// 수집기 선언을 추가합니다.
    pub fn collector(mut self, component: ComponentConfig) -> Self {
        self.config.collectors.push(component);
        self
    }

    /// 프로세서 선언을 추가합니다.
    pub fn processor(mut self, component: ComponentConfig) -> Self {
        self.config.processors.push(component);
        self
    }

    /// 출력 선언을 추가합니다.
    pub fn output(mut self, component: ComponentConfig) -> Self {
        self.config.outputs.push(component);
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
