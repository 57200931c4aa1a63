#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logweave_core::types::LogEntry;
use logweave_pipeline::processor::parse::{ParseConfig, ParseFormat};
use logweave_pipeline::processor::{ParseProcessor, Processor};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    format: u8,
    pattern: String,
    separator: String,
    field_names: Vec<String>,
    message: String,
}

fuzz_target!(|input: FuzzInput| {
    let format = match input.format % 3 {
        0 => ParseFormat::Json,
        1 => ParseFormat::Regex,
        _ => ParseFormat::Csv,
    };
    let config = ParseConfig {
        format,
        pattern: Some(input.pattern),
        field_names: input.field_names.into_iter().take(16).collect(),
        separator: input.separator,
        source_field: "message".to_owned(),
    };

    let Ok(processor) = ParseProcessor::new("fuzz", config) else {
        return;
    };

    // 추출 실패는 엔트리를 그대로 통과시켜야 함
    let out = processor.process(LogEntry::new(input.message, "fuzz"));
    assert!(out.is_some());
});
