//! 파싱 프로세서
//!
//! 메시지(또는 `source_field`)에서 구조화 데이터를 추출해 `fields`에 병합합니다.
//! 추출 실패는 치명적이지 않으며, 엔트리는 변경 없이 통과합니다.
//!
//! 캡처 그룹/CSV 열 이름은 `field_names`의 같은 위치 이름, 그룹 자체 이름,
//! `field_N`(0부터 시작하는 위치) 순으로 정합니다.

use logweave_core::config::ComponentConfig;
use logweave_core::types::LogEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Processor, resolve_field};
use crate::error::LogPipelineError;
use crate::registry::decode_options;

/// 추출 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseFormat {
    /// JSON 객체
    Json,
    /// 정규식 캡처 그룹
    Regex,
    /// 구분자 분리
    Csv,
}

/// 파싱 프로세서 옵션
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// 추출 형식
    pub format: ParseFormat,
    /// 정규식 패턴 (`regex` 형식에서 필수)
    #[serde(default)]
    pub pattern: Option<String>,
    /// 위치별 필드 이름
    #[serde(default)]
    pub field_names: Vec<String>,
    /// CSV 구분자
    #[serde(default = "default_separator")]
    pub separator: String,
    /// 추출 대상 필드
    #[serde(default = "default_source_field")]
    pub source_field: String,
}

fn default_separator() -> String {
    ",".to_owned()
}

fn default_source_field() -> String {
    "message".to_owned()
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            format: ParseFormat::Json,
            pattern: None,
            field_names: Vec::new(),
            separator: default_separator(),
            source_field: default_source_field(),
        }
    }
}

/// 파싱 프로세서
pub struct ParseProcessor {
    name: String,
    config: ParseConfig,
    regex: Option<Regex>,
}

impl ParseProcessor {
    /// 새 파싱 프로세서를 생성합니다.
    pub fn new(name: impl Into<String>, config: ParseConfig) -> Result<Self, LogPipelineError> {
        let name = name.into();
        let regex = match config.format {
            ParseFormat::Regex => {
                let pattern = config.pattern.as_deref().ok_or_else(|| LogPipelineError::Config {
                    field: format!("{name}.options.pattern"),
                    reason: "required for regex format".to_owned(),
                })?;
                Some(Regex::new(pattern)?)
            }
            _ => None,
        };

        if config.format == ParseFormat::Csv && config.separator.is_empty() {
            return Err(LogPipelineError::Config {
                field: format!("{name}.options.separator"),
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(Self {
            name,
            config,
            regex,
        })
    }

    /// 구성 요소 선언에서 파싱 프로세서를 생성합니다.
    pub fn from_component(component: &ComponentConfig) -> Result<Self, LogPipelineError> {
        let config: ParseConfig = decode_options(component)?;
        Self::new(component.display_name(), config)
    }

    fn column_name(&self, index: usize, group_name: Option<&str>) -> String {
        self.config
            .field_names
            .get(index)
            .cloned()
            .or_else(|| group_name.map(str::to_owned))
            .unwrap_or_else(|| format!("field_{index}"))
    }

    /// 원문에서 필드를 추출합니다.
    fn extract(
        &self,
        text: &str,
    ) -> Result<Vec<(String, serde_json::Value)>, LogPipelineError> {
        match self.config.format {
            ParseFormat::Json => {
                let value: serde_json::Value = serde_json::from_str(text)?;
                match value {
                    serde_json::Value::Object(obj) => Ok(obj.into_iter().collect()),
                    _ => Err(LogPipelineError::Parse {
                        format: "json".to_owned(),
                        reason: "expected JSON object".to_owned(),
                    }),
                }
            }
            ParseFormat::Regex => {
                let Some(regex) = &self.regex else {
                    return Ok(Vec::new());
                };
                let captures = regex.captures(text).ok_or_else(|| LogPipelineError::Parse {
                    format: "regex".to_owned(),
                    reason: "pattern did not match".to_owned(),
                })?;

                let fields = regex
                    .capture_names()
                    .enumerate()
                    .skip(1)
                    .filter_map(|(group, group_name)| {
                        let matched = captures.get(group)?;
                        Some((
                            self.column_name(group - 1, group_name),
                            serde_json::Value::String(matched.as_str().to_owned()),
                        ))
                    })
                    .collect();
                Ok(fields)
            }
            ParseFormat::Csv => Ok(text
                .split(self.config.separator.as_str())
                .enumerate()
                .map(|(index, column)| {
                    (
                        self.column_name(index, None),
                        serde_json::Value::String(column.trim().to_owned()),
                    )
                })
                .collect()),
        }
    }
}

impl Processor for ParseProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, mut entry: LogEntry) -> Option<LogEntry> {
        let Some(text) = resolve_field(&entry, &self.config.source_field)
            .map(|value| value.as_string().into_owned())
        else {
            return Some(entry);
        };

        match self.extract(&text) {
            Ok(fields) => entry.fields.extend(fields),
            Err(e) => {
                tracing::trace!(processor = %self.name, error = %e, "parse failed, passing entry through");
            }
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn processor(options: serde_json::Value) -> ParseProcessor {
        ParseProcessor::from_component(&ComponentConfig::new("parse", "p").with_options(options))
            .unwrap()
    }

    #[test]
    fn json_object_merged_into_fields() {
        let p = processor(json!({"format": "json"}));
        let out = p
            .process(LogEntry::new(r#"{"user":"kim","status":401}"#, "s"))
            .unwrap();
        assert_eq!(out.fields["user"], json!("kim"));
        assert_eq!(out.fields["status"], json!(401));
    }

    #[test]
    fn invalid_json_passes_unchanged() {
        let p = processor(json!({"format": "json"}));
        let entry = LogEntry::new("plain text", "s");
        let out = p.process(entry.clone()).unwrap();
        assert_eq!(out, entry);
    }

    #[test]
    fn regex_names_positional_then_group_then_index() {
        let p = processor(json!({
            "format": "regex",
            "pattern": r"^(\S+) (?P<method>\S+) (\S+) (\d+)$",
            "field_names": ["client"]
        }));
        let out = p
            .process(LogEntry::new("10.0.0.1 GET /orders 200", "s"))
            .unwrap();
        assert_eq!(out.fields["client"], json!("10.0.0.1"));
        assert_eq!(out.fields["method"], json!("GET"));
        assert_eq!(out.fields["field_2"], json!("/orders"));
        assert_eq!(out.fields["field_3"], json!("200"));
    }

    #[test]
    fn regex_without_match_passes_unchanged() {
        let p = processor(json!({"format": "regex", "pattern": r"^\d+$"}));
        let out = p.process(LogEntry::new("abc", "s")).unwrap();
        assert!(out.fields.is_empty());
    }

    #[test]
    fn regex_requires_pattern() {
        let result = ParseProcessor::from_component(
            &ComponentConfig::new("parse", "p").with_options(json!({"format": "regex"})),
        );
        assert!(result.is_err());
    }

    #[test]
    fn csv_uses_names_then_index() {
        let p = processor(json!({
            "format": "csv",
            "separator": ";",
            "field_names": ["user", "action"]
        }));
        let out = p.process(LogEntry::new("kim; login; ok", "s")).unwrap();
        assert_eq!(out.fields["user"], json!("kim"));
        assert_eq!(out.fields["action"], json!("login"));
        assert_eq!(out.fields["field_2"], json!("ok"));
    }

    #[test]
    fn source_field_selects_input() {
        let p = processor(json!({"format": "csv", "source_field": "raw"}));
        let entry = LogEntry::new("ignored", "s").with_field("raw", "a,b");
        let out = p.process(entry).unwrap();
        assert_eq!(out.fields["field_0"], json!("a"));
        assert_eq!(out.fields["field_1"], json!("b"));
    }

    #[test]
    fn missing_source_field_passes_unchanged() {
        let p = processor(json!({"format": "csv", "source_field": "raw"}));
        let out = p.process(LogEntry::new("a,b", "s")).unwrap();
        assert!(out.fields.is_empty());
    }
}
