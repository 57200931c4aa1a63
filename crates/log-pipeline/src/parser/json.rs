//! JSON 라인 파서
//!
//! JSON 객체 한 줄에서 `timestamp`, `level`, `message`, `trace_id`, `span_id`를
//! 추출하고, 나머지 키는 모두 엔트리의 `fields`로 옮깁니다.
//!
//! # 사용 예시
//! ```ignore
//! use logweave_pipeline::parser::{JsonLineParser, LineParser};
//!
//! let parser = JsonLineParser::default();
//! let entry = parser.parse_line(r#"{"level":"warn","message":"disk 91%"}"#, "app.log");
//! assert_eq!(entry.level, LogLevel::Warn);
//! ```

use chrono::{DateTime, Utc};
use logweave_core::types::{LogEntry, LogLevel};

use super::LineParser;
use crate::error::LogPipelineError;

/// 엔트리 내장 필드로 옮겨지는 JSON 키
const KNOWN_KEYS: [&str; 5] = ["timestamp", "level", "message", "trace_id", "span_id"];

/// JSON 라인 파서
pub struct JsonLineParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl Default for JsonLineParser {
    fn default() -> Self {
        Self {
            max_input_size: 1024 * 1024, // 1MB
        }
    }
}

impl JsonLineParser {
    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// 엄격 모드 파싱: JSON 객체가 아니면 에러를 반환합니다.
    pub fn try_parse(&self, line: &str, source: &str) -> Result<LogEntry, LogPipelineError> {
        if line.len() > self.max_input_size {
            return Err(LogPipelineError::Parse {
                format: "json".to_owned(),
                reason: format!(
                    "input too large: {} bytes (max: {})",
                    line.len(),
                    self.max_input_size
                ),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| LogPipelineError::Parse {
                format: "json".to_owned(),
                reason: e.to_string(),
            })?;

        let serde_json::Value::Object(mut obj) = value else {
            return Err(LogPipelineError::Parse {
                format: "json".to_owned(),
                reason: "expected JSON object at top level".to_owned(),
            });
        };

        let timestamp = obj
            .get("timestamp")
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);
        let level = obj
            .get("level")
            .and_then(|v| v.as_str())
            .and_then(LogLevel::from_str_loose)
            .unwrap_or_default();
        let message = obj
            .get("message")
            .map(value_to_string)
            .unwrap_or_default();
        let trace_id = obj.get("trace_id").map(value_to_string);
        let span_id = obj.get("span_id").map(value_to_string);

        for key in KNOWN_KEYS {
            obj.remove(key);
        }

        let mut entry = LogEntry::new(message, source)
            .with_level(level)
            .with_timestamp(timestamp);
        entry.trace_id = trace_id;
        entry.span_id = span_id;
        entry.fields = obj.into_iter().collect();
        Ok(entry)
    }
}

impl LineParser for JsonLineParser {
    fn format_name(&self) -> &str {
        "json"
    }

    fn parse_line(&self, line: &str, source: &str) -> LogEntry {
        match self.try_parse(line, source) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::trace!(error = %e, source, "json parse failed, keeping raw line");
                LogEntry::new(line, source)
            }
        }
    }
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 타임스탬프 값을 파싱합니다.
///
/// 지원 형식:
/// - RFC 3339 (ISO 8601): `2024-01-15T12:00:00Z`
/// - Unix timestamp (초): `1705320000`
/// - Unix timestamp (밀리초): `1705320000000`
///
/// 숫자 값과 숫자 문자열 모두 허용합니다.
pub(crate) fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let number = match value {
        serde_json::Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            s.trim().parse::<i64>().ok()?
        }
        serde_json::Value::Number(n) => n.as_i64()?,
        _ => return None,
    };

    // 10자리 = 초, 13자리 = 밀리초
    if number > 9_999_999_999 {
        DateTime::from_timestamp_millis(number)
    } else {
        DateTime::from_timestamp(number, 0)
    }
}
