//! 도메인 타입 -- 파이프라인 전 단계에서 공유되는 로그 데이터 모델
//!
//! [`LogEntry`]는 수집기가 한 번 생성하고, 프로세서 체인이 필드/태그를
//! 추가하거나 값을 재작성하며, 최종적으로 출력으로 전달되는 단위입니다.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 로그 레벨
///
/// `Ord` 구현으로 레벨 비교가 가능합니다 (`Debug < Info < Warn < Error < Fatal`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 디버그
    Debug,
    /// 정보성
    #[default]
    Info,
    /// 경고
    Warn,
    /// 에러
    Error,
    /// 치명적 에러
    Fatal,
}

impl LogLevel {
    /// 문자열에서 로그 레벨을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않으며, 흔히 쓰이는 별칭도 허용합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" | "debug" => Some(Self::Debug),
            "info" | "information" | "notice" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "err" => Some(Self::Error),
            "fatal" | "critical" | "crit" | "panic" | "emerg" | "emergency" | "alert" => {
                Some(Self::Fatal)
            }
            _ => None,
        }
    }

    /// 소문자 레벨 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 엔트리
///
/// 다양한 소스(파일, 외부 생산자)에서 수집된 로그를 통합 형식으로 표현합니다.
/// 엔트리는 단계 사이에서 값으로 이동하므로 두 단계가 동시에 같은 엔트리를
/// 변경하는 일은 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 타임스탬프 (UTC)
    pub timestamp: DateTime<Utc>,
    /// 로그 레벨
    #[serde(default)]
    pub level: LogLevel,
    /// 로그 메시지
    #[serde(default)]
    pub message: String,
    /// 원본 소스 (파일 경로 등)
    #[serde(default)]
    pub source: String,
    /// 서비스 이름
    #[serde(default)]
    pub service: String,
    /// 트레이스 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// 스팬 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    /// 구조화 필드 (임의 타입 값)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, serde_json::Value>,
    /// 태그 (문자열 값)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl LogEntry {
    /// 현재 시각, `info` 레벨로 새 엔트리를 생성합니다.
    pub fn new(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: message.into(),
            source: source.into(),
            service: String::new(),
            trace_id: None,
            span_id: None,
            fields: HashMap::new(),
            tags: HashMap::new(),
        }
    }

    /// 레벨을 설정합니다.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// 서비스 이름을 설정합니다.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// 타임스탬프를 설정합니다.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 필드를 추가합니다.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// 태그를 추가합니다.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// 엔트리를 한 줄짜리 JSON 문자열로 직렬화합니다.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.timestamp.to_rfc3339(),
            self.level,
            self.source,
            self.message,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn level_from_str_loose() {
        assert_eq!(LogLevel::from_str_loose("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str_loose("err"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_str_loose("crit"), Some(LogLevel::Fatal));
        assert_eq!(LogLevel::from_str_loose("trace"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str_loose("verbose"), None);
    }

    #[test]
    fn level_display_is_lowercase() {
        assert_eq!(LogLevel::Error.to_string(), "error");
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn entry_builder_methods() {
        let entry = LogEntry::new("db timeout", "/var/log/app.log")
            .with_level(LogLevel::Error)
            .with_service("billing")
            .with_field("latency_ms", 1200)
            .with_tag("env", "prod");
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.service, "billing");
        assert_eq!(entry.fields["latency_ms"], serde_json::json!(1200));
        assert_eq!(entry.tags["env"], "prod");
    }

    #[test]
    fn json_omits_empty_optional_parts() {
        let entry = LogEntry::new("hello", "test");
        let json = entry.to_json_line().unwrap();
        assert!(json.contains("\"level\":\"info\""));
        assert!(!json.contains("trace_id"));
        assert!(!json.contains("fields"));
        assert!(!json.contains("tags"));
    }

    #[test]
    fn json_serialize_roundtrip_keeps_fields() {
        let entry = LogEntry::new("hello", "test")
            .with_field("status", 500)
            .with_tag("region", "eu");
        let json = entry.to_json_line().unwrap();
        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn display_contains_level_and_source() {
        let entry = LogEntry::new("boom", "/var/log/x.log").with_level(LogLevel::Fatal);
        let s = entry.to_string();
        assert!(s.contains("[fatal]"));
        assert!(s.contains("/var/log/x.log: boom"));
    }
}
