//! 콘솔 출력
//!
//! `text`, `json`, `colored` 형식을 지원합니다. `colored`는 텍스트 레이아웃에서
//! 레벨 토큰만 ANSI 색상으로 감쌉니다.

use std::io::Write;
use std::sync::Mutex;

use logweave_core::config::ComponentConfig;
use logweave_core::pipeline::BoxFuture;
use logweave_core::types::{LogEntry, LogLevel};
use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_TIME_FORMAT, Output, OutputState, OutputStats, render_json, render_text,
    validate_time_format,
};
use crate::error::LogPipelineError;
use crate::registry::decode_options;

const ANSI_RESET: &str = "\x1b[0m";

/// 콘솔 출력 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    /// 텍스트 레이아웃
    #[default]
    Text,
    /// JSON 한 줄
    Json,
    /// 레벨에 색상을 입힌 텍스트 레이아웃
    Colored,
}

/// 출력 대상 스트림
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    /// 표준 출력
    #[default]
    Stdout,
    /// 표준 에러
    Stderr,
}

/// 콘솔 출력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleOutputConfig {
    /// 출력 형식
    pub format: ConsoleFormat,
    /// 타임스탬프 형식 (strftime)
    pub time_format: String,
    /// `colored` 형식에서 색상 사용 여부
    pub colors: bool,
    /// 출력 스트림
    pub target: ConsoleTarget,
}

impl Default for ConsoleOutputConfig {
    fn default() -> Self {
        Self {
            format: ConsoleFormat::Text,
            time_format: DEFAULT_TIME_FORMAT.to_owned(),
            colors: true,
            target: ConsoleTarget::Stdout,
        }
    }
}

/// 레벨별 ANSI 색상 코드
fn level_color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "\x1b[36m", // cyan
        LogLevel::Info => "\x1b[32m",  // green
        LogLevel::Warn => "\x1b[33m",  // yellow
        LogLevel::Error => "\x1b[31m", // red
        LogLevel::Fatal => "\x1b[35m", // magenta
    }
}

/// 콘솔 출력
pub struct ConsoleOutput {
    state: OutputState,
    config: ConsoleOutputConfig,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleOutput {
    /// 설정된 스트림에 쓰는 콘솔 출력을 생성합니다.
    pub fn new(name: impl Into<String>, config: ConsoleOutputConfig) -> Result<Self, LogPipelineError> {
        let writer: Box<dyn Write + Send> = match config.target {
            ConsoleTarget::Stdout => Box::new(std::io::stdout()),
            ConsoleTarget::Stderr => Box::new(std::io::stderr()),
        };
        Self::with_writer(name, config, writer)
    }

    /// 임의의 writer에 쓰는 콘솔 출력을 생성합니다.
    pub fn with_writer(
        name: impl Into<String>,
        config: ConsoleOutputConfig,
        writer: Box<dyn Write + Send>,
    ) -> Result<Self, LogPipelineError> {
        let name = name.into();
        validate_time_format(format!("{name}.options.time_format"), &config.time_format)?;
        Ok(Self {
            state: OutputState::new(&name),
            config,
            writer: Mutex::new(writer),
        })
    }

    /// 구성 요소 선언에서 콘솔 출력을 생성합니다.
    pub fn from_component(component: &ComponentConfig) -> Result<Self, LogPipelineError> {
        let config: ConsoleOutputConfig = decode_options(component)?;
        Self::new(component.display_name(), config)
    }

    /// 엔트리 한 개를 설정된 형식의 한 줄로 렌더링합니다.
    pub fn render(&self, entry: &LogEntry) -> Result<String, LogPipelineError> {
        match self.config.format {
            ConsoleFormat::Json => render_json(entry),
            ConsoleFormat::Text => Ok(render_text(
                entry,
                &self.config.time_format,
                entry.level.as_str(),
            )),
            ConsoleFormat::Colored if self.config.colors => {
                let level = format!(
                    "{}{}{}",
                    level_color(entry.level),
                    entry.level.as_str(),
                    ANSI_RESET
                );
                Ok(render_text(entry, &self.config.time_format, &level))
            }
            ConsoleFormat::Colored => Ok(render_text(
                entry,
                &self.config.time_format,
                entry.level.as_str(),
            )),
        }
    }

    fn write_lines(&self, entries: &[LogEntry]) -> Result<usize, LogPipelineError> {
        let mut payload = String::with_capacity(entries.len() * 128);
        for entry in entries {
            payload.push_str(&self.render(entry)?);
            payload.push('\n');
        }

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.write_all(payload.as_bytes())?;
        writer.flush()?;
        Ok(payload.len())
    }
}

impl Output for ConsoleOutput {
    fn name(&self) -> &str {
        &self.state.name
    }

    fn write<'a>(&'a self, entries: &'a [LogEntry]) -> BoxFuture<'a, Result<(), LogPipelineError>> {
        Box::pin(async move {
            if entries.is_empty() {
                return Ok(());
            }
            match self.write_lines(entries) {
                Ok(bytes) => {
                    self.state.record_success(entries.len(), bytes);
                    Ok(())
                }
                Err(e) => {
                    let err = LogPipelineError::Output {
                        name: self.state.name.clone(),
                        reason: e.to_string(),
                    };
                    self.state.record_error(&err);
                    Err(err)
                }
            }
        })
    }

    fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.state.set_enabled(enabled);
    }

    fn close(&self) -> BoxFuture<'_, Result<(), LogPipelineError>> {
        Box::pin(async move {
            self.writer
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .flush()?;
            Ok(())
        })
    }

    fn stats(&self) -> OutputStats {
        self.state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// 테스트용 공유 버퍼 writer
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn console(format: ConsoleFormat, colors: bool) -> (ConsoleOutput, SharedBuf) {
        let buf = SharedBuf::default();
        let config = ConsoleOutputConfig {
            format,
            colors,
            time_format: "%H:%M:%S".to_owned(),
            ..Default::default()
        };
        let output = ConsoleOutput::with_writer("console", config, Box::new(buf.clone())).unwrap();
        (output, buf)
    }

    #[test]
    fn colored_wraps_level_token() {
        let (output, _) = console(ConsoleFormat::Colored, true);
        let entry = LogEntry::new("disk full", "app").with_level(LogLevel::Error);
        let line = output.render(&entry).unwrap();
        assert!(line.contains("[\x1b[31merror\x1b[0m] app: disk full"), "{line:?}");
    }

    #[test]
    fn colored_without_colors_is_plain() {
        let (output, _) = console(ConsoleFormat::Colored, false);
        let line = output.render(&LogEntry::new("m", "s")).unwrap();
        assert!(line.contains("[info] s: m"));
        assert!(!line.contains('\x1b'));
    }

    #[test]
    fn every_level_has_distinct_color() {
        let colors: std::collections::HashSet<&str> = [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Fatal,
        ]
        .into_iter()
        .map(level_color)
        .collect();
        assert_eq!(colors.len(), 5);
    }

    #[tokio::test]
    async fn writes_json_lines_to_writer() {
        let (output, buf) = console(ConsoleFormat::Json, false);
        output
            .write(&[LogEntry::new("a", "s"), LogEntry::new("b", "s")])
            .await
            .unwrap();

        let contents = buf.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(value["message"], "b");
        assert_eq!(output.stats().written_count, 2);
    }

    #[test]
    fn options_deserialize() {
        let component = ComponentConfig::new("console", "stderr").with_options(serde_json::json!({
            "format": "colored", "colors": false, "target": "stderr"
        }));
        let output = ConsoleOutput::from_component(&component).unwrap();
        assert_eq!(output.config.target, ConsoleTarget::Stderr);
        assert_eq!(output.config.format, ConsoleFormat::Colored);
        assert!(!output.config.colors);
    }
}
