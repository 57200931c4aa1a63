//! 보강 프로세서
//!
//! 정적 필드/태그를 모든 엔트리에 병합한 뒤, 조건 규칙이 매칭되면
//! 해당 규칙의 필드/태그를 추가로 병합합니다. 엔트리를 드롭하지 않습니다.

use std::collections::HashMap;

use logweave_core::config::ComponentConfig;
use logweave_core::types::LogEntry;
use serde::{Deserialize, Serialize};

use super::{Condition, Predicate, Processor};
use crate::error::LogPipelineError;
use crate::registry::decode_options;

/// 조건부 보강 규칙
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichRule {
    /// 매칭 조건
    #[serde(flatten)]
    pub condition: Condition,
    /// 매칭 시 병합할 필드
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
    /// 매칭 시 병합할 태그
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// 보강 프로세서 옵션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// 항상 병합할 필드
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
    /// 항상 병합할 태그
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// 조건부 규칙
    #[serde(default)]
    pub rules: Vec<EnrichRule>,
}

struct CompiledRule {
    predicate: Predicate,
    fields: HashMap<String, serde_json::Value>,
    tags: HashMap<String, String>,
}

/// 보강 프로세서
pub struct EnrichProcessor {
    name: String,
    fields: HashMap<String, serde_json::Value>,
    tags: HashMap<String, String>,
    rules: Vec<CompiledRule>,
}

impl EnrichProcessor {
    /// 새 보강 프로세서를 생성합니다.
    pub fn new(name: impl Into<String>, config: EnrichConfig) -> Result<Self, LogPipelineError> {
        let rules = config
            .rules
            .into_iter()
            .map(|rule| {
                Ok(CompiledRule {
                    predicate: Predicate::compile(&rule.condition)?,
                    fields: rule.fields,
                    tags: rule.tags,
                })
            })
            .collect::<Result<Vec<_>, LogPipelineError>>()?;

        Ok(Self {
            name: name.into(),
            fields: config.fields,
            tags: config.tags,
            rules,
        })
    }

    /// 구성 요소 선언에서 보강 프로세서를 생성합니다.
    pub fn from_component(component: &ComponentConfig) -> Result<Self, LogPipelineError> {
        let config: EnrichConfig = decode_options(component)?;
        Self::new(component.display_name(), config)
    }
}

fn merge(
    entry: &mut LogEntry,
    fields: &HashMap<String, serde_json::Value>,
    tags: &HashMap<String, String>,
) {
    entry
        .fields
        .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    entry
        .tags
        .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
}

impl Processor for EnrichProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, mut entry: LogEntry) -> Option<LogEntry> {
        merge(&mut entry, &self.fields, &self.tags);
        for rule in &self.rules {
            if rule.predicate.matches(&entry) {
                merge(&mut entry, &rule.fields, &rule.tags);
            }
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logweave_core::types::LogLevel;
    use serde_json::json;

    fn enricher() -> EnrichProcessor {
        let component = ComponentConfig::new("enrich", "add-env").with_options(json!({
            "fields": {"datacenter": "fra1"},
            "tags": {"env": "prod"},
            "rules": [
                {"field": "level", "operator": "eq", "value": "error",
                 "tags": {"alert": "true"}, "fields": {"priority": 1}}
            ]
        }));
        EnrichProcessor::from_component(&component).unwrap()
    }

    #[test]
    fn static_values_always_merged() {
        let out = enricher().process(LogEntry::new("ok", "s")).unwrap();
        assert_eq!(out.fields["datacenter"], json!("fra1"));
        assert_eq!(out.tags["env"], "prod");
        assert!(!out.tags.contains_key("alert"));
    }

    #[test]
    fn conditional_rule_merges_on_match() {
        let entry = LogEntry::new("boom", "s").with_level(LogLevel::Error);
        let out = enricher().process(entry).unwrap();
        assert_eq!(out.tags["alert"], "true");
        assert_eq!(out.fields["priority"], json!(1));
    }

    #[test]
    fn static_values_override_existing_keys() {
        let entry = LogEntry::new("m", "s").with_tag("env", "dev");
        let out = enricher().process(entry).unwrap();
        assert_eq!(out.tags["env"], "prod");
    }

    #[test]
    fn rules_see_static_values() {
        let component = ComponentConfig::new("enrich", "chained").with_options(json!({
            "tags": {"env": "prod"},
            "rules": [{"field": "env", "operator": "eq", "value": "prod", "tags": {"paging": "on"}}]
        }));
        let processor = EnrichProcessor::from_component(&component).unwrap();
        let out = processor.process(LogEntry::new("m", "s")).unwrap();
        assert_eq!(out.tags["paging"], "on");
    }
}
