//! logweave.toml 통합 설정 테스트
//!
//! - logweave.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use logweave_core::config::{ComponentConfig, LogPipelineConfig, LogweaveConfig};
use logweave_core::error::{ConfigError, LogweaveError};

const EXAMPLE: &str = include_str!("../../../logweave.toml.example");

// =============================================================================
// logweave.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = LogweaveConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert!(!config.metrics.enabled);
    assert_eq!(config.pipelines.len(), 2);
}

#[test]
fn example_config_passes_validation() {
    let config = LogweaveConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_declares_components_in_order() {
    let config = LogweaveConfig::parse(EXAMPLE).expect("should parse");
    let app = &config.pipelines[0];

    assert_eq!(app.name, "app");
    assert_eq!(app.collectors[0].kind, "file");
    let processors: Vec<&str> = app.processors.iter().map(ComponentConfig::display_name).collect();
    assert_eq!(processors, vec!["drop-debug", "add-host", "per-service"]);
    let outputs: Vec<&str> = app.outputs.iter().map(|c| c.kind.as_str()).collect();
    assert_eq!(outputs, vec!["file", "elasticsearch"]);

    let access = &config.pipelines[1];
    assert!(!access.enabled);
    assert_eq!(access.collectors[0].options["parser"], "nginx");
}

#[test]
fn example_config_matches_code_defaults() {
    let config = LogweaveConfig::parse(EXAMPLE).expect("should parse");
    let defaults = LogPipelineConfig::default();
    let app = &config.pipelines[0];

    assert_eq!(app.buffer_size, defaults.buffer_size);
    assert_eq!(app.flush_interval_secs, defaults.flush_interval_secs);
    assert_eq!(app.flush_threshold, defaults.flush_threshold);
    assert_eq!(app.workers, defaults.workers);
    assert_eq!(app.output_timeout_secs, defaults.output_timeout_secs);
    assert_eq!(app.drop_policy, defaults.drop_policy);
    assert_eq!(app.stats_interval_secs, defaults.stats_interval_secs);
    assert_eq!(app.shutdown_grace_ms, defaults.shutdown_grace_ms);
}

// =============================================================================
// 부분 설정 로딩 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let config = LogweaveConfig::parse("[general]\nlog_level = \"debug\"").expect("should parse");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.metrics.port, 9100);
    assert!(config.pipelines.is_empty());
}

#[test]
fn partial_pipeline_fills_defaults() {
    let toml = r#"
[[pipelines]]
name = "minimal"
"#;
    let config = LogweaveConfig::parse(toml).expect("should parse");
    let pipeline = &config.pipelines[0];

    assert!(pipeline.enabled);
    assert_eq!(pipeline.buffer_size, 10_000);
    assert_eq!(pipeline.retry_attempts, 3);
    assert!(pipeline.collectors.is_empty());
    config.validate().expect("minimal pipeline should validate");
}

#[test]
fn component_without_name_or_options() {
    let toml = r#"
[[pipelines]]
name = "p"

[[pipelines.outputs]]
type = "console"
"#;
    let config = LogweaveConfig::parse(toml).expect("should parse");
    let output = &config.pipelines[0].outputs[0];

    assert_eq!(output.display_name(), "console");
    assert!(output.enabled);
    assert!(output.options.is_empty());
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"
"#;

    // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGWEAVE_GENERAL_LOG_LEVEL", "error");
    }

    let mut config = LogweaveConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();

    // SAFETY: 테스트 정리
    unsafe {
        std::env::remove_var("LOGWEAVE_GENERAL_LOG_LEVEL");
    }

    assert_eq!(config.general.log_level, "error");
    assert_eq!(config.general.log_format, "pretty");
}

#[test]
#[serial_test::serial]
fn env_override_bool_and_numeric_fields() {
    // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("LOGWEAVE_METRICS_ENABLED", "true");
        std::env::set_var("LOGWEAVE_METRICS_PORT", "9999");
    }

    let mut config = LogweaveConfig::parse("").expect("should parse");
    config.apply_env_overrides();

    // SAFETY: 테스트 정리
    unsafe {
        std::env::remove_var("LOGWEAVE_METRICS_ENABLED");
        std::env::remove_var("LOGWEAVE_METRICS_PORT");
    }

    assert!(config.metrics.enabled);
    assert_eq!(config.metrics.port, 9999);
}

#[test]
#[serial_test::serial]
fn env_override_missing_var_keeps_toml_value() {
    // SAFETY: 존재하지 않는 변수를 명시적으로 제거
    unsafe {
        std::env::remove_var("LOGWEAVE_GENERAL_LOG_LEVEL");
    }

    let mut config =
        LogweaveConfig::parse("[general]\nlog_level = \"warn\"").expect("should parse");
    config.apply_env_overrides();

    assert_eq!(config.general.log_level, "warn");
}

// =============================================================================
// 빈 파일 / 잘못된 형식 에러 테스트
// =============================================================================

#[test]
fn empty_string_parses_with_defaults() {
    let config = LogweaveConfig::parse("").expect("empty string should parse");
    assert_eq!(config.general.log_level, "info");
    assert!(config.pipelines.is_empty());
}

#[test]
fn comments_only_parses_with_defaults() {
    let config = LogweaveConfig::parse("# nothing here\n# at all\n").expect("should parse");
    assert!(config.pipelines.is_empty());
}

#[test]
fn malformed_toml_returns_parse_error() {
    let err = LogweaveConfig::parse("[[pipelines]\nname = ").unwrap_err();
    assert!(matches!(
        err,
        LogweaveError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_type_for_numeric_field() {
    let toml = r#"
[[pipelines]]
name = "p"
buffer_size = "large"
"#;
    assert!(LogweaveConfig::parse(toml).is_err());
}

#[test]
fn component_without_type_is_rejected() {
    let toml = r#"
[[pipelines]]
name = "p"

[[pipelines.outputs]]
name = "nameless"
"#;
    assert!(LogweaveConfig::parse(toml).is_err());
}

#[test]
fn validation_reports_indexed_field() {
    let toml = r#"
[[pipelines]]
name = "ok"

[[pipelines]]
name = "bad"
flush_threshold = 0
"#;
    let config = LogweaveConfig::parse(toml).expect("should parse");
    match config.validate().unwrap_err() {
        LogweaveError::Config(ConfigError::InvalidValue { field, .. }) => {
            assert_eq!(field, "pipelines[1].flush_threshold");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_section_is_ignored() {
    let toml = r#"
[general]
log_level = "info"

[storage]
retention_days = 30
"#;
    assert!(LogweaveConfig::parse(toml).is_ok());
}

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let err = LogweaveConfig::from_file("/nonexistent/logweave.toml")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LogweaveError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn load_example_config_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("logweave.toml");
    std::fs::write(&path, EXAMPLE).expect("write");

    let config = LogweaveConfig::load(&path).await.expect("load should succeed");
    assert_eq!(config.pipelines[0].name, "app");
}

// =============================================================================
// 직렬화 라운드트립 테스트
// =============================================================================

#[test]
fn example_config_serialize_roundtrip() {
    let config = LogweaveConfig::parse(EXAMPLE).expect("should parse");
    let serialized = toml::to_string(&config).expect("should serialize");
    let reparsed = LogweaveConfig::parse(&serialized).expect("should reparse");

    assert_eq!(reparsed.pipelines.len(), config.pipelines.len());
    assert_eq!(
        reparsed.pipelines[0].processors,
        config.pipelines[0].processors
    );
}
