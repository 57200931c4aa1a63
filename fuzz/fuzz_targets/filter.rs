#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logweave_core::types::LogEntry;
use logweave_pipeline::processor::filter::{FilterAction, FilterConfig, FilterRule};
use logweave_pipeline::processor::{Condition, FilterProcessor, Operator, Processor};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 규칙 목록 (최대 8개로 제한)
    rules: Vec<FuzzRule>,
    message: String,
    field_value: String,
    numeric_value: f64,
}

#[derive(Arbitrary, Debug)]
struct FuzzRule {
    field: FuzzField,
    operator: FuzzOperator,
    value: String,
    keep: bool,
}

#[derive(Arbitrary, Debug)]
enum FuzzField {
    Message,
    Level,
    Text,
    Number,
    Missing,
}

#[derive(Arbitrary, Debug)]
enum FuzzOperator {
    Eq,
    Ne,
    Contains,
    Regex,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl FuzzField {
    fn as_str(&self) -> &str {
        match self {
            FuzzField::Message => "message",
            FuzzField::Level => "level",
            FuzzField::Text => "text",
            FuzzField::Number => "number",
            FuzzField::Missing => "missing",
        }
    }
}

impl FuzzOperator {
    fn to_operator(&self) -> Operator {
        match self {
            FuzzOperator::Eq => Operator::Eq,
            FuzzOperator::Ne => Operator::Ne,
            FuzzOperator::Contains => Operator::Contains,
            FuzzOperator::Regex => Operator::Regex,
            FuzzOperator::Gt => Operator::Gt,
            FuzzOperator::Lt => Operator::Lt,
            FuzzOperator::Gte => Operator::Gte,
            FuzzOperator::Lte => Operator::Lte,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let rules: Vec<FilterRule> = input
        .rules
        .iter()
        .take(8)
        .map(|r| FilterRule {
            condition: Condition::new(r.field.as_str(), r.operator.to_operator(), r.value.clone()),
            action: if r.keep {
                FilterAction::Keep
            } else {
                FilterAction::Drop
            },
        })
        .collect();

    // 잘못된 정규식은 생성 단계에서 거부됨
    let Ok(filter) = FilterProcessor::new("fuzz", FilterConfig { rules }) else {
        return;
    };

    let mut entry = LogEntry::new(input.message, "fuzz").with_field("text", input.field_value);
    if let Some(number) = serde_json::Number::from_f64(input.numeric_value) {
        entry = entry.with_field("number", serde_json::Value::Number(number));
    }

    let _ = filter.process(entry);
});
