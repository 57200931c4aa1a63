//! 로그 수집 모듈 -- 외부 소스에서 로그를 읽어 [`LogEntry`]로 내보냅니다.
//!
//! # 수집 소스
//! - [`FileCollector`]: 파일/디렉토리 감시 (tail -f 방식 폴링)
//!
//! # 아키텍처
//! 각 수집기는 자체 tokio 태스크에서 실행되며, 생성한 엔트리를
//! [`EntrySink`] (`tokio::mpsc::Sender<LogEntry>`)로 파이프라인에 전달합니다.
//! 수집기는 파이프라인 실행마다 공유되는 `CancellationToken`으로 협력적으로 종료됩니다.

pub mod file;

pub use file::{FileCollector, FileCollectorConfig};

use chrono::{DateTime, Utc};
use logweave_core::pipeline::BoxFuture;
use logweave_core::types::LogEntry;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::LogPipelineError;

/// 수집기가 엔트리를 보내는 채널 송신측
pub type EntrySink = mpsc::Sender<LogEntry>;

/// 로그 수집기
///
/// `start`는 감시 태스크를 띄운 뒤 바로 반환합니다.
/// 비동기 메서드는 trait object로 쓰기 위해 [`BoxFuture`]를 반환합니다.
pub trait Collector: Send + Sync {
    /// 수집기 이름
    fn name(&self) -> &str;

    /// 엔트리를 보낼 채널을 연결합니다. `start` 전에 호출해야 합니다.
    fn set_output(&mut self, sink: EntrySink);

    /// 수집을 시작합니다.
    fn start(&mut self, cancel: CancellationToken) -> BoxFuture<'_, Result<(), LogPipelineError>>;

    /// 수집을 중지하고 모든 감시 태스크를 정리합니다.
    fn stop(&mut self) -> BoxFuture<'_, Result<(), LogPipelineError>>;

    /// 실행 중 여부
    fn is_running(&self) -> bool;

    /// 통계 스냅샷
    fn stats(&self) -> CollectorStats;
}

/// 수집기 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectorStats {
    /// 수집기 이름
    pub name: String,
    /// 실행 중 여부
    pub running: bool,
    /// 내보낸 엔트리 수
    pub collected_count: u64,
    /// 에러 수
    pub error_count: u64,
    /// 감시 중인 파일 수
    pub watched_files: usize,
    /// 마지막 에러 메시지
    pub last_error: Option<String>,
    /// 마지막 에러 시각
    pub last_error_time: Option<DateTime<Utc>>,
}

impl CollectorStats {
    /// 이름만 채운 빈 통계를 생성합니다.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 에러를 기록합니다.
    pub fn record_error(&mut self, error: impl ToString) {
        self.error_count += 1;
        self.last_error = Some(error.to_string());
        self.last_error_time = Some(Utc::now());
    }
}
