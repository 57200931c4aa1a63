//! 변환 프로세서 -- 규칙별 단일 필드 변경
//!
//! `level`은 변환 대상이 아닙니다. 문자열이 아닌 구조화 필드 값은
//! 문자열 연산(`lowercase`, `uppercase`, `trim`, `replace`)에서 그대로 유지됩니다.

use logweave_core::config::ComponentConfig;
use logweave_core::types::LogEntry;
use serde::{Deserialize, Serialize};

use super::Processor;
use crate::error::LogPipelineError;
use crate::registry::decode_options;

/// 변환 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformAction {
    /// 소문자 변환
    Lowercase,
    /// 대문자 변환
    Uppercase,
    /// 앞뒤 공백 제거
    Trim,
    /// 부분 문자열 치환 (`options.old` -> `options.new`)
    Replace,
    /// 필드 제거
    Remove,
}

/// `replace` 동작 옵션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplaceOptions {
    /// 찾을 문자열
    #[serde(default)]
    pub old: String,
    /// 바꿀 문자열
    #[serde(default)]
    pub new: String,
}

/// 변환 규칙
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRule {
    /// 대상 필드
    pub field: String,
    /// 동작
    pub action: TransformAction,
    /// 동작별 옵션
    #[serde(default)]
    pub options: ReplaceOptions,
}

/// 변환 프로세서 옵션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    /// 규칙 목록 (순서대로 적용)
    #[serde(default)]
    pub rules: Vec<TransformRule>,
}

/// 변환 프로세서
pub struct TransformProcessor {
    name: String,
    rules: Vec<TransformRule>,
}

impl TransformProcessor {
    /// 새 변환 프로세서를 생성합니다.
    pub fn new(name: impl Into<String>, config: TransformConfig) -> Result<Self, LogPipelineError> {
        let name = name.into();
        for rule in &config.rules {
            if rule.field == "level" {
                return Err(LogPipelineError::Config {
                    field: format!("{name}.options.rules"),
                    reason: "field 'level' cannot be transformed".to_owned(),
                });
            }
            if rule.action == TransformAction::Replace && rule.options.old.is_empty() {
                return Err(LogPipelineError::Config {
                    field: format!("{name}.options.rules"),
                    reason: format!("replace on '{}' requires options.old", rule.field),
                });
            }
        }

        Ok(Self {
            name,
            rules: config.rules,
        })
    }

    /// 구성 요소 선언에서 변환 프로세서를 생성합니다.
    pub fn from_component(component: &ComponentConfig) -> Result<Self, LogPipelineError> {
        let config: TransformConfig = decode_options(component)?;
        Self::new(component.display_name(), config)
    }
}

fn apply(rule: &TransformRule, value: &str) -> String {
    match rule.action {
        TransformAction::Lowercase => value.to_lowercase(),
        TransformAction::Uppercase => value.to_uppercase(),
        TransformAction::Trim => value.trim().to_owned(),
        TransformAction::Replace => value.replace(&rule.options.old, &rule.options.new),
        TransformAction::Remove => String::new(),
    }
}

fn apply_in_place(rule: &TransformRule, target: &mut String) {
    *target = apply(rule, target);
}

fn apply_optional(rule: &TransformRule, target: &mut Option<String>) {
    if rule.action == TransformAction::Remove {
        *target = None;
    } else if let Some(value) = target.as_mut() {
        apply_in_place(rule, value);
    }
}

fn apply_to_maps(rule: &TransformRule, entry: &mut LogEntry, key: &str, fields: bool, tags: bool) {
    if fields && entry.fields.contains_key(key) {
        if rule.action == TransformAction::Remove {
            entry.fields.remove(key);
        } else if let Some(serde_json::Value::String(s)) = entry.fields.get_mut(key) {
            apply_in_place(rule, s);
        }
        return;
    }

    if tags {
        if rule.action == TransformAction::Remove {
            entry.tags.remove(key);
        } else if let Some(value) = entry.tags.get_mut(key) {
            apply_in_place(rule, value);
        }
    }
}

impl Processor for TransformProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, mut entry: LogEntry) -> Option<LogEntry> {
        for rule in &self.rules {
            let field = rule.field.as_str();
            if let Some(key) = field.strip_prefix("fields.") {
                apply_to_maps(rule, &mut entry, key, true, false);
                continue;
            }
            if let Some(key) = field.strip_prefix("tags.") {
                apply_to_maps(rule, &mut entry, key, false, true);
                continue;
            }

            match field {
                "message" => apply_in_place(rule, &mut entry.message),
                "source" => apply_in_place(rule, &mut entry.source),
                "service" => apply_in_place(rule, &mut entry.service),
                "trace_id" => apply_optional(rule, &mut entry.trace_id),
                "span_id" => apply_optional(rule, &mut entry.span_id),
                key => apply_to_maps(rule, &mut entry, key, true, true),
            }
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn processor(rules: serde_json::Value) -> TransformProcessor {
        TransformProcessor::from_component(
            &ComponentConfig::new("transform", "t").with_options(json!({ "rules": rules })),
        )
        .unwrap()
    }

    #[test]
    fn string_actions_on_builtins() {
        let p = processor(json!([
            {"field": "message", "action": "trim"},
            {"field": "message", "action": "uppercase"},
            {"field": "service", "action": "lowercase"}
        ]));
        let out = p
            .process(LogEntry::new("  hello  ", "s").with_service("Billing"))
            .unwrap();
        assert_eq!(out.message, "HELLO");
        assert_eq!(out.service, "billing");
    }

    #[test]
    fn replace_uses_options() {
        let p = processor(json!([
            {"field": "message", "action": "replace", "options": {"old": "password=secret", "new": "password=***"}}
        ]));
        let out = p
            .process(LogEntry::new("login password=secret ok", "s"))
            .unwrap();
        assert_eq!(out.message, "login password=*** ok");
    }

    #[test]
    fn remove_clears_builtins_and_deletes_keys() {
        let p = processor(json!([
            {"field": "trace_id", "action": "remove"},
            {"field": "message", "action": "remove"},
            {"field": "user", "action": "remove"},
            {"field": "env", "action": "remove"}
        ]));
        let mut entry = LogEntry::new("m", "s")
            .with_field("user", "kim")
            .with_tag("env", "prod");
        entry.trace_id = Some("abc".to_owned());

        let out = p.process(entry).unwrap();
        assert!(out.trace_id.is_none());
        assert!(out.message.is_empty());
        assert!(out.fields.is_empty());
        assert!(out.tags.is_empty());
    }

    #[test]
    fn non_string_field_left_unchanged() {
        let p = processor(json!([{"field": "status", "action": "uppercase"}]));
        let out = p
            .process(LogEntry::new("m", "s").with_field("status", 500))
            .unwrap();
        assert_eq!(out.fields["status"], json!(500));
    }

    #[test]
    fn tag_transform() {
        let p = processor(json!([{"field": "tags.env", "action": "uppercase"}]));
        let out = p
            .process(LogEntry::new("m", "s").with_tag("env", "prod"))
            .unwrap();
        assert_eq!(out.tags["env"], "PROD");
    }

    #[test]
    fn level_is_rejected() {
        let result = TransformProcessor::from_component(
            &ComponentConfig::new("transform", "t")
                .with_options(json!({"rules": [{"field": "level", "action": "uppercase"}]})),
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_field_is_noop() {
        let p = processor(json!([{"field": "nope", "action": "uppercase"}]));
        let entry = LogEntry::new("m", "s");
        assert_eq!(p.process(entry.clone()).unwrap(), entry);
    }
}
