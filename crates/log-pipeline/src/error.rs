//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for LogweaveError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logweave_core::error::{ConfigError, LogweaveError, PipelineError};

/// 로그 파이프라인 도메인 에러
///
/// 수집, 파싱, 출력, 구성 요소 생성, 생명주기 등 파이프라인 내부의
/// 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 로그 파싱 실패
    #[error("parse error: {format}: {reason}")]
    Parse {
        /// 파서 형식 (json, regex, csv 등)
        format: String,
        /// 실패 사유
        reason: String,
    },

    /// 수집기 에러 (파일 I/O 등)
    #[error("collector error: {name}: {reason}")]
    Collector {
        /// 수집기 이름
        name: String,
        /// 에러 사유
        reason: String,
    },

    /// 단일 출력 쓰기/종료 실패
    #[error("output error: {name}: {reason}")]
    Output {
        /// 출력 이름
        name: String,
        /// 에러 사유
        reason: String,
    },

    /// 여러 출력 중 일부가 실패 (나머지 출력에는 전달 완료)
    #[error("{} output(s) failed: {}", .failures.len(), .failures.join("; "))]
    OutputsFailed {
        /// 실패한 출력별 메시지 ("name: reason")
        failures: Vec<String>,
    },

    /// 등록되지 않은 구성 요소 타입
    #[error("unknown {category} type '{kind}'")]
    UnknownComponent {
        /// 구성 요소 분류 (collector, processor, output)
        category: String,
        /// 선언된 타입 이름
        kind: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 이미 실행 중
    #[error("pipeline '{0}' is already running")]
    AlreadyRunning(String),

    /// 실행 중이 아님
    #[error("pipeline '{0}' is not running")]
    NotRunning(String),

    /// 설정에서 비활성화된 파이프라인 시작 시도
    #[error("pipeline '{0}' is disabled")]
    Disabled(String),

    /// 같은 이름의 파이프라인이 이미 등록됨
    #[error("pipeline '{0}' already exists")]
    PipelineExists(String),

    /// 등록되지 않은 파이프라인
    #[error("pipeline '{0}' not found")]
    PipelineNotFound(String),

    /// 여러 파이프라인 중 일부의 생명주기 작업 실패
    #[error("{} pipeline(s) failed: {}", .failures.len(), .failures.join("; "))]
    PipelinesFailed {
        /// 실패한 파이프라인별 메시지
        failures: Vec<String>,
    },

    /// 타임아웃
    #[error("timeout after {millis}ms: {operation}")]
    Timeout {
        /// 타임아웃된 작업
        operation: String,
        /// 타임아웃 (밀리초)
        millis: u128,
    },

    /// HTTP 전송 에러
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 직렬화/역직렬화 에러
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl LogPipelineError {
    /// 구성 요소 옵션 역직렬화 실패를 설정 에러로 변환합니다.
    pub(crate) fn invalid_options(component: &str, err: serde_json::Error) -> Self {
        Self::Config {
            field: format!("{component}.options"),
            reason: err.to_string(),
        }
    }
}

impl From<LogPipelineError> for LogweaveError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::AlreadyRunning(_) => {
                LogweaveError::Pipeline(PipelineError::AlreadyRunning)
            }
            LogPipelineError::NotRunning(_) => LogweaveError::Pipeline(PipelineError::NotRunning),
            LogPipelineError::Disabled(name) => {
                LogweaveError::Pipeline(PipelineError::Disabled(name))
            }
            LogPipelineError::Config { field, reason } => {
                LogweaveError::Config(ConfigError::InvalidValue { field, reason })
            }
            LogPipelineError::Output { .. } | LogPipelineError::OutputsFailed { .. } => {
                LogweaveError::Pipeline(PipelineError::OutputFailed(err.to_string()))
            }
            LogPipelineError::Io(e) => LogweaveError::Io(e),
            other => LogweaveError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
