//! 출력 모듈 -- 플러시된 배치를 외부로 내보냅니다.
//!
//! # 출력 종류
//! - [`FileOutput`]: 크기 기반 로테이션 파일
//! - [`ConsoleOutput`]: stdout/stderr (text, json, colored)
//! - [`ElasticsearchOutput`]: Bulk API (NDJSON)
//!
//! [`OutputManager`]는 이름으로 출력을 관리하며, 모든 출력에 배치를 전달하고
//! 실패를 하나의 에러로 모읍니다.
//!
//! 출력은 `Arc<dyn Output>`로 공유되므로 모든 메서드가 `&self`를 받고
//! 내부 상태는 각 출력이 자체 잠금으로 보호합니다. 쓰기 취소는 future를
//! drop하는 방식이며, 파이프라인은 매 호출을 타임아웃으로 감쌉니다.

pub mod console;
pub mod elasticsearch;
pub mod file;
pub mod manager;

pub use console::{ConsoleOutput, ConsoleOutputConfig};
pub use elasticsearch::{ElasticsearchOutput, ElasticsearchOutputConfig};
pub use file::{FileOutput, FileOutputConfig};
pub use manager::OutputManager;

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use logweave_core::metrics as m;
use logweave_core::pipeline::BoxFuture;
use logweave_core::types::LogEntry;
use serde::{Deserialize, Serialize};

use crate::error::LogPipelineError;

/// 기본 타임스탬프 형식 (RFC 3339, 밀리초)
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// 로그 출력
pub trait Output: Send + Sync {
    /// 출력 이름
    fn name(&self) -> &str;

    /// 배치를 기록합니다.
    fn write<'a>(&'a self, entries: &'a [LogEntry]) -> BoxFuture<'a, Result<(), LogPipelineError>>;

    /// 활성화 여부
    fn is_enabled(&self) -> bool;

    /// 활성화 여부를 변경합니다.
    fn set_enabled(&self, enabled: bool);

    /// 출력을 닫고 자원을 정리합니다.
    fn close(&self) -> BoxFuture<'_, Result<(), LogPipelineError>>;

    /// 통계 스냅샷
    fn stats(&self) -> OutputStats;
}

/// 출력 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputStats {
    /// 출력 이름
    pub name: String,
    /// 활성화 여부
    pub enabled: bool,
    /// 기록한 엔트리 수
    pub written_count: u64,
    /// 기록한 배치 수
    pub batches_written: u64,
    /// 기록한 바이트 수
    pub bytes_written: u64,
    /// 실패 수
    pub error_count: u64,
    /// 마지막 에러 메시지
    pub last_error: Option<String>,
    /// 마지막 에러 시각
    pub last_error_time: Option<DateTime<Utc>>,
    /// 마지막 성공 쓰기 시각
    pub last_write_time: Option<DateTime<Utc>>,
}

/// 출력 공통 상태 (활성화 플래그 + 통계)
pub(crate) struct OutputState {
    name: String,
    enabled: AtomicBool,
    stats: RwLock<OutputStats>,
}

impl OutputState {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            enabled: AtomicBool::new(true),
            stats: RwLock::new(OutputStats {
                name: name.to_owned(),
                enabled: true,
                ..Default::default()
            }),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self, entries: usize, bytes: usize) {
        {
            let mut stats = self.stats.write().unwrap_or_else(|e| e.into_inner());
            stats.written_count += entries as u64;
            stats.batches_written += 1;
            stats.bytes_written += bytes as u64;
            stats.last_write_time = Some(Utc::now());
        }
        metrics::counter!(m::OUTPUT_ENTRIES_WRITTEN_TOTAL, m::LABEL_COMPONENT => self.name.clone())
            .increment(entries as u64);
    }

    pub(crate) fn record_error(&self, error: &LogPipelineError) {
        {
            let mut stats = self.stats.write().unwrap_or_else(|e| e.into_inner());
            stats.error_count += 1;
            stats.last_error = Some(error.to_string());
            stats.last_error_time = Some(Utc::now());
        }
        metrics::counter!(m::OUTPUT_ERRORS_TOTAL, m::LABEL_COMPONENT => self.name.clone())
            .increment(1);
    }

    pub(crate) fn snapshot(&self) -> OutputStats {
        let mut stats = self
            .stats
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        stats.enabled = self.is_enabled();
        stats
    }
}

/// 엔트리 직렬화 형식 (파일 출력)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineFormat {
    /// JSON 한 줄
    #[default]
    Json,
    /// `<timestamp> [<level>] <source>: <message>`
    Text,
}

/// 텍스트 레이아웃으로 엔트리를 렌더링합니다.
pub fn render_text(entry: &LogEntry, time_format: &str, level: &str) -> String {
    format!(
        "{} [{}] {}: {}",
        entry.timestamp.format(time_format),
        level,
        entry.source,
        entry.message
    )
}

/// JSON 한 줄로 엔트리를 렌더링합니다.
pub fn render_json(entry: &LogEntry) -> Result<String, LogPipelineError> {
    Ok(entry.to_json_line()?)
}

/// strftime 형식 문자열을 검증합니다.
pub(crate) fn validate_time_format(field: String, format: &str) -> Result<(), LogPipelineError> {
    use chrono::format::{Item, StrftimeItems};

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(LogPipelineError::Config {
            field,
            reason: format!("invalid time format '{format}'"),
        });
    }
    Ok(())
}
