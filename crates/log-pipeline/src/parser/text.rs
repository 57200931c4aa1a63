//! 평문/액세스 로그 라인 파서

use logweave_core::types::{LogEntry, LogLevel};

use super::LineParser;

/// 평문 라인 파서
///
/// 소문자로 변환한 줄에서 `error`, `warn`, `debug`, `fatal` 순으로
/// 키워드를 찾아 레벨을 정합니다. 어느 것도 없으면 `info`입니다.
pub struct TextLineParser;

impl TextLineParser {
    /// 키워드 휴리스틱으로 레벨을 추정합니다.
    pub fn detect_level(line: &str) -> LogLevel {
        let lower = line.to_lowercase();
        if lower.contains("error") {
            LogLevel::Error
        } else if lower.contains("warn") {
            LogLevel::Warn
        } else if lower.contains("debug") {
            LogLevel::Debug
        } else if lower.contains("fatal") {
            LogLevel::Fatal
        } else {
            LogLevel::Info
        }
    }
}

impl LineParser for TextLineParser {
    fn format_name(&self) -> &str {
        "text"
    }

    fn parse_line(&self, line: &str, source: &str) -> LogEntry {
        LogEntry::new(line, source).with_level(Self::detect_level(line))
    }
}

/// nginx/apache 액세스 로그 파서
///
/// 줄을 해석하지 않고 `info` 엔트리로 담은 뒤 `log_type` 필드에 형식을 기록합니다.
pub struct AccessLogParser {
    log_type: String,
}

impl AccessLogParser {
    /// 형식 이름(`nginx`, `apache`)으로 파서를 생성합니다.
    pub fn new(log_type: impl Into<String>) -> Self {
        Self {
            log_type: log_type.into(),
        }
    }
}

impl LineParser for AccessLogParser {
    fn format_name(&self) -> &str {
        &self.log_type
    }

    fn parse_line(&self, line: &str, source: &str) -> LogEntry {
        LogEntry::new(line, source).with_field("log_type", self.log_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_levels_by_keyword() {
        let parser = TextLineParser;
        assert_eq!(parser.parse_line("ERROR db down", "s").level, LogLevel::Error);
        assert_eq!(parser.parse_line("Warning: disk", "s").level, LogLevel::Warn);
        assert_eq!(parser.parse_line("debug: cache miss", "s").level, LogLevel::Debug);
        assert_eq!(parser.parse_line("FATAL: oom", "s").level, LogLevel::Fatal);
        assert_eq!(parser.parse_line("request served", "s").level, LogLevel::Info);
    }

    #[test]
    fn error_checked_before_fatal() {
        assert_eq!(
            TextLineParser::detect_level("fatal error in worker"),
            LogLevel::Error
        );
    }

    #[test]
    fn text_keeps_line_and_source() {
        let entry = TextLineParser.parse_line("hello world", "/var/log/app.log");
        assert_eq!(entry.message, "hello world");
        assert_eq!(entry.source, "/var/log/app.log");
    }

    #[test]
    fn access_log_tags_log_type() {
        let parser = AccessLogParser::new("nginx");
        let line = r#"10.0.0.1 - - [15/Jan/2024:12:00:00 +0000] "GET / HTTP/1.1" 500 12"#;
        let entry = parser.parse_line(line, "/var/log/nginx/access.log");
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message, line);
        assert_eq!(entry.fields["log_type"], serde_json::json!("nginx"));
    }
}
