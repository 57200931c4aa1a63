//! 로그 버퍼링 -- 인메모리 버퍼 및 배치 플러시
//!
//! [`LogBuffer`]는 프로세서 체인을 통과한 엔트리를 인메모리에 보관하고,
//! 임계값 또는 시간 간격에 따라 출력으로 플러시할 배치를 내어줍니다.
//!
//! 파이프라인은 버퍼를 `Mutex`로 감싸 공유하고, 임계값 도달 시
//! 한 칸짜리 플러시 신호 채널([`flush_signal`])로 플러시 태스크를 깨웁니다.
//!
//! # 오버플로우 정책
//! 버퍼가 가득 찬 경우:
//! - [`DropPolicy::Oldest`](crate::config::DropPolicy::Oldest): 가장 오래된 엔트리를 드롭
//! - [`DropPolicy::Newest`](crate::config::DropPolicy::Newest): 새 유입을 거부

use std::collections::VecDeque;

use logweave_core::types::LogEntry;
use tokio::sync::mpsc;

use crate::config::DropPolicy;

/// 인메모리 로그 버퍼
///
/// 버퍼 용량이 초과되면 설정된 드롭 정책에 따라 엔트리를 제거합니다.
pub struct LogBuffer {
    /// 버퍼 내부 저장소
    buffer: VecDeque<LogEntry>,
    /// 최대 용량
    capacity: usize,
    /// 드롭 정책
    drop_policy: DropPolicy,
    /// 드롭된 엔트리 카운터 (통계용)
    dropped_count: u64,
    /// 총 유입 엔트리 카운터
    total_received: u64,
}

impl LogBuffer {
    /// 새 로그 버퍼를 생성합니다.
    pub fn new(capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(10_000)),
            capacity,
            drop_policy,
            dropped_count: 0,
            total_received: 0,
        }
    }

    /// 엔트리를 버퍼에 추가합니다.
    ///
    /// 버퍼가 가득 찬 경우 드롭 정책에 따라 처리합니다.
    /// 드롭이 발생하면 `true`를 반환합니다.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        self.total_received += 1;

        if self.buffer.len() >= self.capacity {
            self.dropped_count += 1;
            match self.drop_policy {
                DropPolicy::Oldest => {
                    self.buffer.pop_front();
                    self.buffer.push_back(entry);
                    tracing::warn!(
                        dropped = self.dropped_count,
                        capacity = self.capacity,
                        "buffer full, dropped oldest entry"
                    );
                }
                DropPolicy::Newest => {
                    tracing::warn!(
                        dropped = self.dropped_count,
                        capacity = self.capacity,
                        "buffer full, rejected new entry"
                    );
                }
            }
            return true;
        }

        self.buffer.push_back(entry);
        false
    }

    /// 배치 크기만큼 또는 버퍼에 남은 만큼 엔트리를 드레인합니다.
    pub fn drain_batch(&mut self, batch_size: usize) -> Vec<LogEntry> {
        let count = batch_size.min(self.buffer.len());
        self.buffer.drain(..count).collect()
    }

    /// 버퍼의 모든 엔트리를 드레인합니다.
    pub fn drain_all(&mut self) -> Vec<LogEntry> {
        self.buffer.drain(..).collect()
    }

    /// 현재 버퍼에 저장된 엔트리 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// 버퍼가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// 버퍼 최대 용량을 반환합니다.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 지금까지 드롭된 엔트리 수를 반환합니다.
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// 총 유입 엔트리 수를 반환합니다.
    pub fn total_received(&self) -> u64 {
        self.total_received
    }

    /// 버퍼 사용률을 0.0~1.0 범위로 반환합니다.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(u32::try_from(self.buffer.len()).unwrap_or(u32::MAX))
            / f64::from(u32::try_from(self.capacity).unwrap_or(u32::MAX))
    }

    /// 임계값 플러시 조건을 확인합니다.
    pub fn should_flush(&self, threshold: usize) -> bool {
        self.buffer.len() >= threshold
    }
}

/// 한 칸짜리 플러시 신호 채널을 생성합니다.
///
/// 신호가 이미 대기 중이면 추가 신호는 합쳐집니다 ([`signal_flush`]).
pub fn flush_signal() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(1)
}

/// 플러시 태스크에 신호를 보냅니다. 이미 신호가 대기 중이면 아무것도 하지 않습니다.
pub fn signal_flush(tx: &mpsc::Sender<()>) {
    let _ = tx.try_send(());
}
