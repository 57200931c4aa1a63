//! 설정 관리 -- logweave.toml 파싱 및 런타임 설정
//!
//! [`LogweaveConfig`]는 데몬과 모든 파이프라인의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGWEAVE_GENERAL_LOG_LEVEL=debug` 형식)
//! 3. 설정 파일 (`logweave.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logweave_core::error::LogweaveError> {
//! use logweave_core::config::LogweaveConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogweaveConfig::load("logweave.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogweaveConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogweaveError};

/// Logweave 통합 설정
///
/// `logweave.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogweaveConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 메트릭 노출 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 파이프라인 선언 목록
    #[serde(default)]
    pub pipelines: Vec<LogPipelineConfig>,
}

impl LogweaveConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogweaveError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogweaveError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogweaveError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogweaveError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogweaveError> {
        toml::from_str(toml_str).map_err(|e| {
            LogweaveError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGWEAVE_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "LOGWEAVE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGWEAVE_GENERAL_LOG_FORMAT");

        override_bool(&mut self.metrics.enabled, "LOGWEAVE_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "LOGWEAVE_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "LOGWEAVE_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogweaveError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.port".to_owned(),
                reason: "must be greater than 0 when metrics are enabled".to_owned(),
            }
            .into());
        }

        let mut names = HashSet::new();
        for (idx, pipeline) in self.pipelines.iter().enumerate() {
            if !names.insert(pipeline.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("pipelines[{idx}].name"),
                    reason: format!("duplicate pipeline name '{}'", pipeline.name),
                }
                .into());
            }
            pipeline.validate(idx)?;
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// Prometheus 메트릭 노출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

/// 파이프라인 선언
///
/// 한 파이프라인의 버퍼/플러시/워커 설정과 구성 요소 선언 목록입니다.
/// 런타임 설정은 `logweave-pipeline`의 `PipelineConfig::from_core`로 변환됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPipelineConfig {
    /// 파이프라인 이름 (고유)
    pub name: String,
    /// 활성화 여부
    pub enabled: bool,
    /// 버퍼 및 내부 채널 용량
    pub buffer_size: usize,
    /// 주기적 플러시 간격 (초)
    pub flush_interval_secs: u64,
    /// 이 개수만큼 쌓이면 즉시 플러시
    pub flush_threshold: usize,
    /// 프로세서 워커 수
    pub workers: usize,
    /// 출력 호출당 타임아웃 (초)
    pub output_timeout_secs: u64,
    /// 재시도 횟수 (예약됨, 아직 사용되지 않음)
    pub retry_attempts: u32,
    /// 재시도 지연 (초, 예약됨)
    pub retry_delay_secs: u64,
    /// 버퍼 오버플로우 드롭 정책 ("oldest" | "newest")
    pub drop_policy: String,
    /// 통계 샘플링 간격 (초)
    pub stats_interval_secs: u64,
    /// 정지 시 진행 중 작업 대기 시간 (밀리초)
    pub shutdown_grace_ms: u64,
    /// 수집기 선언
    pub collectors: Vec<ComponentConfig>,
    /// 프로세서 선언 (선언 순서대로 체인 구성)
    pub processors: Vec<ComponentConfig>,
    /// 출력 선언
    pub outputs: Vec<ComponentConfig>,
}

impl Default for LogPipelineConfig {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            enabled: true,
            buffer_size: 10_000,
            flush_interval_secs: 5,
            flush_threshold: 100,
            workers: 4,
            output_timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_secs: 1,
            drop_policy: "oldest".to_owned(),
            stats_interval_secs: 10,
            shutdown_grace_ms: 100,
            collectors: Vec::new(),
            processors: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl LogPipelineConfig {
    /// 파이프라인 선언의 유효성을 검증합니다.
    ///
    /// 구성 요소의 타입별 옵션은 여기서 검증하지 않습니다 (생성 시점에 검증).
    pub fn validate(&self, idx: usize) -> Result<(), LogweaveError> {
        let field = |name: &str| format!("pipelines[{idx}].{name}");

        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field("name"),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: field("buffer_size"),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.flush_threshold == 0 || self.flush_threshold > self.buffer_size {
            return Err(ConfigError::InvalidValue {
                field: field("flush_threshold"),
                reason: format!("must be 1-{}", self.buffer_size),
            }
            .into());
        }

        if self.flush_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: field("flush_interval_secs"),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: field("workers"),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        let valid_policies = ["oldest", "newest"];
        if !valid_policies.contains(&self.drop_policy.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: field("drop_policy"),
                reason: format!("must be one of: {}", valid_policies.join(", ")),
            }
            .into());
        }

        for (kind, components) in [
            ("collectors", &self.collectors),
            ("processors", &self.processors),
            ("outputs", &self.outputs),
        ] {
            let mut names = HashSet::new();
            for (cidx, component) in components.iter().enumerate() {
                if component.kind.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: field(&format!("{kind}[{cidx}].type")),
                        reason: "must not be empty".to_owned(),
                    }
                    .into());
                }
                if !names.insert(component.name.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        field: field(&format!("{kind}[{cidx}].name")),
                        reason: format!("duplicate component name '{}'", component.name),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}

/// 구성 요소 선언 (수집기/프로세서/출력 공통)
///
/// `options`는 타입별 설정 테이블이며, 레지스트리의 생성자가
/// 구성 요소 고유의 설정 구조체로 역직렬화합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// 구성 요소 타입 (예: "file", "filter", "elasticsearch")
    #[serde(rename = "type")]
    pub kind: String,
    /// 구성 요소 이름 (미지정 시 타입 이름)
    #[serde(default)]
    pub name: String,
    /// 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 타입별 옵션
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl ComponentConfig {
    /// 새 구성 요소 선언을 생성합니다.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            enabled: true,
            options: serde_json::Map::new(),
        }
    }

    /// 옵션 테이블을 설정합니다. 객체가 아닌 값은 무시됩니다.
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = options {
            self.options = map;
        }
        self
    }

    /// 활성화 여부를 설정합니다.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// 표시용 이름을 반환합니다. 이름이 비어 있으면 타입 이름을 사용합니다.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.kind
        } else {
            &self.name
        }
    }
}

fn default_true() -> bool {
    true
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}
