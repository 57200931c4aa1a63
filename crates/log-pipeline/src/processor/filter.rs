//! 필터 프로세서
//!
//! 규칙을 선언 순서대로 평가하여 처음 매칭된 규칙의 동작을 적용합니다.
//!
//! ```toml
//! [[pipelines.processors]]
//! type = "filter"
//! name = "drop-health"
//! [[pipelines.processors.options.rules]]
//! field = "message"
//! operator = "contains"
//! value = "/health"
//! action = "drop"
//! ```

use logweave_core::config::ComponentConfig;
use logweave_core::types::LogEntry;
use serde::{Deserialize, Serialize};

use super::{Condition, Predicate, Processor};
use crate::error::LogPipelineError;
use crate::registry::decode_options;

/// 규칙 매칭 시 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterAction {
    /// 엔트리를 드롭
    Drop,
    /// 엔트리를 그대로 통과
    Keep,
}

/// 필터 규칙
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    /// 매칭 조건
    #[serde(flatten)]
    pub condition: Condition,
    /// 매칭 시 동작
    pub action: FilterAction,
}

/// 필터 프로세서 옵션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 규칙 목록 (선언 순서대로 평가)
    #[serde(default)]
    pub rules: Vec<FilterRule>,
}

/// 필터 프로세서
pub struct FilterProcessor {
    name: String,
    rules: Vec<(Predicate, FilterAction)>,
}

impl FilterProcessor {
    /// 규칙을 컴파일하여 필터를 생성합니다.
    pub fn new(name: impl Into<String>, config: FilterConfig) -> Result<Self, LogPipelineError> {
        let rules = config
            .rules
            .iter()
            .map(|rule| Ok((Predicate::compile(&rule.condition)?, rule.action)))
            .collect::<Result<Vec<_>, LogPipelineError>>()?;

        Ok(Self {
            name: name.into(),
            rules,
        })
    }

    /// 구성 요소 선언에서 필터를 생성합니다.
    pub fn from_component(component: &ComponentConfig) -> Result<Self, LogPipelineError> {
        let config: FilterConfig = decode_options(component)?;
        Self::new(component.display_name(), config)
    }
}

impl Processor for FilterProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, entry: LogEntry) -> Option<LogEntry> {
        for (predicate, action) in &self.rules {
            if predicate.matches(&entry) {
                return match action {
                    FilterAction::Drop => None,
                    FilterAction::Keep => Some(entry),
                };
            }
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Operator;
    use proptest::prelude::*;
    use serde_json::json;

    fn rule(field: &str, operator: Operator, value: serde_json::Value, action: FilterAction) -> FilterRule {
        FilterRule {
            condition: Condition::new(field, operator, value),
            action,
        }
    }

    fn filter(rules: Vec<FilterRule>) -> FilterProcessor {
        FilterProcessor::new("test-filter", FilterConfig { rules }).unwrap()
    }

    #[test]
    fn drop_rule_drops_match() {
        let f = filter(vec![rule(
            "message",
            Operator::Contains,
            json!("/health"),
            FilterAction::Drop,
        )]);
        assert!(f.process(LogEntry::new("GET /health", "s")).is_none());
        assert!(f.process(LogEntry::new("GET /orders", "s")).is_some());
    }

    #[test]
    fn first_matching_rule_wins() {
        let f = filter(vec![
            rule("level", Operator::Eq, json!("error"), FilterAction::Keep),
            rule("message", Operator::Contains, json!("noise"), FilterAction::Drop),
        ]);
        let kept = LogEntry::new("noise", "s").with_level(logweave_core::types::LogLevel::Error);
        assert!(f.process(kept).is_some());
        assert!(f.process(LogEntry::new("noise", "s")).is_none());
    }

    #[test]
    fn no_rules_passes_everything() {
        let f = filter(Vec::new());
        assert!(f.process(LogEntry::new("anything", "s")).is_some());
    }

    #[test]
    fn from_component_reads_rules() {
        let component = ComponentConfig::new("filter", "errors-only").with_options(json!({
            "rules": [
                {"field": "status", "operator": "gte", "value": 500, "action": "keep"},
                {"field": "status", "operator": "lt", "value": 500, "action": "drop"}
            ]
        }));
        let f = FilterProcessor::from_component(&component).unwrap();
        assert_eq!(f.name(), "errors-only");
        assert!(f.process(LogEntry::new("m", "s").with_field("status", 502)).is_some());
        assert!(f.process(LogEntry::new("m", "s").with_field("status", 200)).is_none());
    }

    #[test]
    fn from_component_rejects_bad_regex() {
        let component = ComponentConfig::new("filter", "bad").with_options(json!({
            "rules": [{"field": "message", "operator": "regex", "value": "([", "action": "drop"}]
        }));
        assert!(FilterProcessor::from_component(&component).is_err());
    }

    #[test]
    fn from_component_rejects_unknown_action() {
        let component = ComponentConfig::new("filter", "bad").with_options(json!({
            "rules": [{"field": "message", "operator": "eq", "value": "x", "action": "explode"}]
        }));
        let err = FilterProcessor::from_component(&component).err().unwrap();
        assert!(err.to_string().contains("bad.options"));
    }

    proptest! {
        #[test]
        fn gt_drops_exactly_values_above_threshold(value in -1.0e6f64..1.0e6, threshold in -1.0e6f64..1.0e6) {
            let f = filter(vec![rule("latency", Operator::Gt, json!(threshold), FilterAction::Drop)]);
            let entry = LogEntry::new("m", "s").with_field("latency", value);
            let dropped = f.process(entry).is_none();
            prop_assert_eq!(dropped, value > threshold);
        }

        #[test]
        fn gt_never_matches_non_numeric(text in "x[a-zA-Z]{0,12}") {
            let f = filter(vec![rule("latency", Operator::Gt, json!(0), FilterAction::Drop)]);
            let entry = LogEntry::new("m", "s").with_field("latency", text);
            prop_assert!(f.process(entry).is_some());
        }
    }
}
