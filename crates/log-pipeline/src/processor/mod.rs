//! 프로세서 체인 -- 엔트리 변환, 필터링, 보강
//!
//! 각 프로세서는 엔트리를 값으로 받아 변환된 엔트리 또는 `None`(드롭)을 반환합니다.
//! [`ProcessorChain`]은 선언 순서대로 프로세서를 적용하고 `None`에서 즉시 중단합니다.
//!
//! # 필드 해석
//! 필터, 보강, 변환, 속도 제한은 모두 [`resolve_field`]로 필드를 찾습니다.
//! - 내장 필드: `level`, `message`, `source`, `service`, `trace_id`, `span_id`
//! - 그 외: `fields`에서 먼저, 없으면 `tags`에서 검색
//! - `fields.<key>` / `tags.<key>` 접두어로 특정 맵을 지정
//!
//! 해석되지 않는 필드는 어떤 연산자와도 매칭되지 않습니다.

pub mod enrich;
pub mod filter;
pub mod parse;
pub mod rate_limit;
pub mod transform;

pub use enrich::EnrichProcessor;
pub use filter::FilterProcessor;
pub use parse::ParseProcessor;
pub use rate_limit::RateLimitProcessor;
pub use transform::TransformProcessor;

use std::borrow::Cow;

use logweave_core::types::LogEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LogPipelineError;

/// 엔트리 단위 프로세서
///
/// `&self`로 호출되므로 여러 워커가 같은 체인을 동시에 사용할 수 있습니다.
/// 상태가 필요한 프로세서는 내부 잠금을 사용합니다.
pub trait Processor: Send + Sync {
    /// 프로세서 이름
    fn name(&self) -> &str;

    /// 엔트리를 처리합니다. `None`을 반환하면 엔트리는 드롭됩니다.
    fn process(&self, entry: LogEntry) -> Option<LogEntry>;
}

/// 순서가 있는 프로세서 목록
#[derive(Default)]
pub struct ProcessorChain {
    processors: Vec<Box<dyn Processor>>,
}

impl ProcessorChain {
    /// 빈 체인을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로세서를 체인 끝에 추가합니다.
    pub fn push(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    /// 빌더 형태로 프로세서를 추가합니다.
    pub fn with(mut self, processor: Box<dyn Processor>) -> Self {
        self.push(processor);
        self
    }

    /// 모든 프로세서를 순서대로 적용합니다.
    pub fn process(&self, entry: LogEntry) -> Option<LogEntry> {
        let mut current = entry;
        for processor in &self.processors {
            current = processor.process(current)?;
        }
        Some(current)
    }

    /// 등록된 프로세서 수
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// 체인이 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// 프로세서 이름 목록
    pub fn names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }
}

/// 엔트리에서 해석된 필드 값
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    /// 문자열 값 (내장 필드, 태그)
    Str(&'a str),
    /// 구조화 필드 값
    Json(&'a serde_json::Value),
}

impl<'a> FieldValue<'a> {
    /// 문자열 표현을 반환합니다. 문자열이 아닌 JSON 값은 JSON 텍스트가 됩니다.
    pub fn as_string(&self) -> Cow<'a, str> {
        match *self {
            FieldValue::Str(s) => Cow::Borrowed(s),
            FieldValue::Json(serde_json::Value::String(s)) => Cow::Borrowed(s.as_str()),
            FieldValue::Json(other) => Cow::Owned(other.to_string()),
        }
    }

    /// 숫자로 변환합니다. 숫자 문자열도 허용합니다.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Str(s) => s.trim().parse().ok(),
            FieldValue::Json(serde_json::Value::Number(n)) => n.as_f64(),
            FieldValue::Json(serde_json::Value::String(s)) => s.trim().parse().ok(),
            FieldValue::Json(_) => None,
        }
    }
}

/// 엔트리에서 필드를 해석합니다.
pub fn resolve_field<'a>(entry: &'a LogEntry, field: &str) -> Option<FieldValue<'a>> {
    if let Some(key) = field.strip_prefix("fields.") {
        return entry.fields.get(key).map(FieldValue::Json);
    }
    if let Some(key) = field.strip_prefix("tags.") {
        return entry.tags.get(key).map(|v| FieldValue::Str(v.as_str()));
    }

    match field {
        "level" => Some(FieldValue::Str(entry.level.as_str())),
        "message" => Some(FieldValue::Str(&entry.message)),
        "source" => Some(FieldValue::Str(&entry.source)),
        "service" => Some(FieldValue::Str(&entry.service)),
        "trace_id" => entry.trace_id.as_deref().map(FieldValue::Str),
        "span_id" => entry.span_id.as_deref().map(FieldValue::Str),
        _ => entry
            .fields
            .get(field)
            .map(FieldValue::Json)
            .or_else(|| entry.tags.get(field).map(|v| FieldValue::Str(v.as_str()))),
    }
}

/// 비교 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// 문자열 일치
    Eq,
    /// 문자열 불일치
    Ne,
    /// 부분 문자열 포함
    Contains,
    /// 정규식 매칭
    Regex,
    /// 초과
    Gt,
    /// 미만
    Lt,
    /// 이상
    Gte,
    /// 이하
    Lte,
}

/// 조건 선언 (필터 규칙, 보강 규칙에서 공유)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// 대상 필드
    pub field: String,
    /// 연산자
    pub operator: Operator,
    /// 비교 값 (`regex`의 경우 패턴)
    pub value: serde_json::Value,
}

impl Condition {
    /// 새 조건을 생성합니다.
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// 컴파일된 조건
///
/// 정규식은 생성 시 한 번만 컴파일하며, 잘못된 패턴은 생성 에러가 됩니다.
#[derive(Debug, Clone)]
pub struct Predicate {
    field: String,
    operator: Operator,
    text: String,
    number: Option<f64>,
    regex: Option<Regex>,
}

impl Predicate {
    /// 조건을 컴파일합니다.
    pub fn compile(condition: &Condition) -> Result<Self, LogPipelineError> {
        let text = match &condition.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let number = match &condition.value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        let regex = if condition.operator == Operator::Regex {
            Some(Regex::new(&text).map_err(|e| LogPipelineError::Config {
                field: condition.field.clone(),
                reason: format!("invalid regex '{text}': {e}"),
            })?)
        } else {
            None
        };

        Ok(Self {
            field: condition.field.clone(),
            operator: condition.operator,
            text,
            number,
            regex,
        })
    }

    /// 조건 대상 필드
    pub fn field(&self) -> &str {
        &self.field
    }

    /// 엔트리가 조건을 만족하는지 평가합니다.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let Some(value) = resolve_field(entry, &self.field) else {
            return false;
        };

        match self.operator {
            Operator::Eq => value.as_string() == self.text,
            Operator::Ne => value.as_string() != self.text,
            Operator::Contains => value.as_string().contains(self.text.as_str()),
            Operator::Regex => self
                .regex
                .as_ref()
                .is_some_and(|re| re.is_match(&value.as_string())),
            Operator::Gt => self.compare(value, |a, b| a > b),
            Operator::Lt => self.compare(value, |a, b| a < b),
            Operator::Gte => self.compare(value, |a, b| a >= b),
            Operator::Lte => self.compare(value, |a, b| a <= b),
        }
    }

    fn compare(&self, value: FieldValue<'_>, cmp: impl Fn(f64, f64) -> bool) -> bool {
        match (value.as_f64(), self.number) {
            (Some(actual), Some(expected)) => cmp(actual, expected),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logweave_core::types::LogLevel;
    use serde_json::json;

    fn sample_entry() -> LogEntry {
        LogEntry::new("GET /health 200", "/var/log/app.log")
            .with_level(LogLevel::Warn)
            .with_service("api")
            .with_field("status", 503)
            .with_field("region", "eu-west")
            .with_tag("region", "tag-region")
            .with_tag("env", "prod")
    }

    struct Upper;

    impl Processor for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn process(&self, mut entry: LogEntry) -> Option<LogEntry> {
            entry.message = entry.message.to_uppercase();
            Some(entry)
        }
    }

    struct DropAll;

    impl Processor for DropAll {
        fn name(&self) -> &str {
            "drop-all"
        }

        fn process(&self, _entry: LogEntry) -> Option<LogEntry> {
            None
        }
    }

    #[test]
    fn resolve_builtin_fields() {
        let entry = sample_entry();
        assert_eq!(
            resolve_field(&entry, "level").unwrap().as_string(),
            "warn"
        );
        assert_eq!(resolve_field(&entry, "service").unwrap().as_string(), "api");
        assert!(resolve_field(&entry, "trace_id").is_none());
    }

    #[test]
    fn fields_checked_before_tags() {
        let entry = sample_entry();
        assert_eq!(
            resolve_field(&entry, "region").unwrap().as_string(),
            "eu-west"
        );
        assert_eq!(
            resolve_field(&entry, "tags.region").unwrap().as_string(),
            "tag-region"
        );
        assert_eq!(resolve_field(&entry, "env").unwrap().as_string(), "prod");
        assert!(resolve_field(&entry, "fields.env").is_none());
    }

    #[test]
    fn numeric_field_stringifies() {
        let entry = sample_entry();
        let value = resolve_field(&entry, "status").unwrap();
        assert_eq!(value.as_string(), "503");
        assert_eq!(value.as_f64(), Some(503.0));
    }

    #[test]
    fn predicate_operators() {
        let entry = sample_entry();
        let check = |op, value: serde_json::Value, field: &str| {
            Predicate::compile(&Condition::new(field, op, value))
                .unwrap()
                .matches(&entry)
        };

        assert!(check(Operator::Eq, json!("warn"), "level"));
        assert!(check(Operator::Ne, json!("error"), "level"));
        assert!(check(Operator::Contains, json!("/health"), "message"));
        assert!(check(Operator::Regex, json!(r"^GET\s"), "message"));
        assert!(check(Operator::Gt, json!(500), "status"));
        assert!(check(Operator::Gte, json!("503"), "status"));
        assert!(!check(Operator::Lt, json!(500), "status"));
        assert!(check(Operator::Lte, json!(503.0), "status"));
    }

    #[test]
    fn missing_field_never_matches() {
        let entry = sample_entry();
        for op in [Operator::Eq, Operator::Ne, Operator::Contains, Operator::Gt] {
            let predicate = Predicate::compile(&Condition::new("nope", op, "x")).unwrap();
            assert!(!predicate.matches(&entry), "{op:?}");
        }
    }

    #[test]
    fn non_numeric_never_matches_comparisons() {
        let entry = sample_entry();
        let predicate = Predicate::compile(&Condition::new("service", Operator::Gt, 1)).unwrap();
        assert!(!predicate.matches(&entry));
    }

    #[test]
    fn invalid_regex_fails_compile() {
        let result = Predicate::compile(&Condition::new("message", Operator::Regex, "(unclosed"));
        assert!(matches!(result, Err(LogPipelineError::Config { .. })));
    }

    #[test]
    fn operator_deserializes_lowercase() {
        let condition: Condition =
            serde_json::from_value(json!({"field": "status", "operator": "gte", "value": 400}))
                .unwrap();
        assert_eq!(condition.operator, Operator::Gte);
    }

    #[test]
    fn chain_applies_in_order_and_short_circuits() {
        let chain = ProcessorChain::new().with(Box::new(Upper));
        let out = chain.process(LogEntry::new("hi", "s")).unwrap();
        assert_eq!(out.message, "HI");

        let chain = ProcessorChain::new()
            .with(Box::new(DropAll))
            .with(Box::new(Upper));
        assert!(chain.process(LogEntry::new("hi", "s")).is_none());
        assert_eq!(chain.names(), vec!["drop-all", "upper"]);
    }

    #[test]
    fn empty_chain_passes_through() {
        let chain = ProcessorChain::new();
        assert!(chain.is_empty());
        assert!(chain.process(LogEntry::new("hi", "s")).is_some());
    }
}
