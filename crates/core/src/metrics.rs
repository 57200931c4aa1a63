//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 파이프라인은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logweave_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logweave_core::metrics::PIPELINE_ENTRIES_PROCESSED_TOTAL,
//!     logweave_core::metrics::LABEL_PIPELINE => "app").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 파이프라인 이름 레이블 키
pub const LABEL_PIPELINE: &str = "pipeline";

/// 구성 요소 이름 레이블 키 (수집기/출력)
pub const LABEL_COMPONENT: &str = "component";

/// 드롭 사유 레이블 키 (backpressure, buffer_overflow, processor)
pub const LABEL_REASON: &str = "reason";

// ─── 수집기 메트릭 ─────────────────────────────────────────────────

/// 수집기: 수집된 엔트리 수 (counter)
pub const COLLECTOR_ENTRIES_TOTAL: &str = "logweave_collector_entries_total";

/// 수집기: 에러 수 (counter)
pub const COLLECTOR_ERRORS_TOTAL: &str = "logweave_collector_errors_total";

/// 수집기: 감시 중인 파일 수 (gauge)
pub const COLLECTOR_WATCHED_FILES: &str = "logweave_collector_watched_files";

// ─── 파이프라인 메트릭 ─────────────────────────────────────────────

/// 파이프라인: 프로세서 체인을 통과한 엔트리 수 (counter)
pub const PIPELINE_ENTRIES_PROCESSED_TOTAL: &str = "logweave_pipeline_entries_processed_total";

/// 파이프라인: 드롭된 엔트리 수 (counter, label: reason)
pub const PIPELINE_ENTRIES_DROPPED_TOTAL: &str = "logweave_pipeline_entries_dropped_total";

/// 파이프라인: 출력으로 플러시된 엔트리 수 (counter)
pub const PIPELINE_ENTRIES_FLUSHED_TOTAL: &str = "logweave_pipeline_entries_flushed_total";

/// 파이프라인: 버퍼 내 엔트리 수 (gauge)
pub const PIPELINE_BUFFER_SIZE: &str = "logweave_pipeline_buffer_size";

/// 파이프라인: 초당 처리량 (gauge)
pub const PIPELINE_THROUGHPUT: &str = "logweave_pipeline_throughput";

// ─── 출력 메트릭 ───────────────────────────────────────────────────

/// 출력: 기록된 엔트리 수 (counter)
pub const OUTPUT_ENTRIES_WRITTEN_TOTAL: &str = "logweave_output_entries_written_total";

/// 출력: 쓰기 실패 수 (counter)
pub const OUTPUT_ERRORS_TOTAL: &str = "logweave_output_errors_total";

// ─── 데몬 메트릭 ───────────────────────────────────────────────────

/// 데몬: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "logweave_daemon_uptime_seconds";

/// 데몬: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "logweave_daemon_build_info";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 전역 recorder 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(COLLECTOR_ENTRIES_TOTAL, "Entries emitted by collectors");
    describe_counter!(COLLECTOR_ERRORS_TOTAL, "Collector errors (watch/read failures)");
    describe_gauge!(COLLECTOR_WATCHED_FILES, "Files currently watched by a collector");

    describe_counter!(
        PIPELINE_ENTRIES_PROCESSED_TOTAL,
        "Entries that passed the processor chain"
    );
    describe_counter!(PIPELINE_ENTRIES_DROPPED_TOTAL, "Entries dropped, by reason");
    describe_counter!(PIPELINE_ENTRIES_FLUSHED_TOTAL, "Entries flushed to outputs");
    describe_gauge!(PIPELINE_BUFFER_SIZE, "Entries waiting in the flush buffer");
    describe_gauge!(PIPELINE_THROUGHPUT, "Processed entries per second");

    describe_counter!(OUTPUT_ENTRIES_WRITTEN_TOTAL, "Entries written by outputs");
    describe_counter!(OUTPUT_ERRORS_TOTAL, "Failed output writes");

    describe_gauge!(DAEMON_UPTIME_SECONDS, "Daemon uptime in seconds");
    describe_gauge!(DAEMON_BUILD_INFO, "Daemon build information");
}
