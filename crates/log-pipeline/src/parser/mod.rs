//! 라인 파서 -- 원시 로그 한 줄을 [`LogEntry`]로 변환
//!
//! 파일 수집기는 설정의 `parser` 값으로 파서를 선택합니다 ([`create_parser`]).
//!
//! # 지원 형식
//! - `json`: JSON 객체 한 줄 ([`JsonLineParser`])
//! - `nginx`, `apache`: 액세스 로그를 그대로 담고 `log_type` 필드를 표시 ([`AccessLogParser`])
//! - `text` (기본값): 키워드 기반 레벨 추정 ([`TextLineParser`])
//!
//! 라인 파서는 실패하지 않습니다. 해석할 수 없는 줄은 `info` 레벨 엔트리가 되고
//! 원본 줄이 메시지로 보존됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use logweave_pipeline::parser::create_parser;
//!
//! let parser = create_parser("json")?;
//! let entry = parser.parse_line(r#"{"level":"error","message":"boom"}"#, "/var/log/app.log");
//! ```

pub mod json;
pub mod text;

pub use json::JsonLineParser;
pub use text::{AccessLogParser, TextLineParser};

use logweave_core::types::LogEntry;

use crate::error::LogPipelineError;

/// 한 줄 단위 로그 파서
pub trait LineParser: Send + Sync {
    /// 파서 형식 이름
    fn format_name(&self) -> &str;

    /// 원시 줄을 엔트리로 변환합니다. `source`는 엔트리의 출처(파일 경로)입니다.
    fn parse_line(&self, line: &str, source: &str) -> LogEntry;
}

/// 형식 이름으로 라인 파서를 생성합니다.
pub fn create_parser(format: &str) -> Result<Box<dyn LineParser>, LogPipelineError> {
    match format {
        "json" => Ok(Box::new(JsonLineParser::default())),
        "nginx" | "apache" => Ok(Box::new(AccessLogParser::new(format))),
        "" | "text" => Ok(Box::new(TextLineParser)),
        other => Err(LogPipelineError::Config {
            field: "parser".to_owned(),
            reason: format!("unknown parser '{other}', expected json, nginx, apache or text"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_known_parsers() {
        for name in ["json", "nginx", "apache", "text"] {
            let parser = create_parser(name).unwrap();
            assert_eq!(parser.format_name(), name);
        }
    }

    #[test]
    fn empty_name_defaults_to_text() {
        assert_eq!(create_parser("").unwrap().format_name(), "text");
    }

    #[test]
    fn unknown_parser_is_config_error() {
        let err = create_parser("xml").err().unwrap();
        assert!(matches!(err, LogPipelineError::Config { .. }));
    }
}
