//! 파이프라인 오케스트레이션 -- 수집/처리/버퍼링/출력의 전체 흐름을 관리합니다.
//!
//! [`LogPipeline`]은 core의 [`Pipeline`] trait을 구현하여
//! `logweave-daemon`에서 동일한 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! Collectors -> input mpsc -> Workers (ProcessorChain) -> output mpsc (try_send)
//!     -> Drainer -> LogBuffer -> Flush task (interval | threshold) -> OutputManager
//! ```
//!
//! 실행 한 번마다 하나의 `CancellationToken`을 모든 태스크가 공유합니다.
//! 출력 큐가 가득 차면 엔트리를 드롭하고 `dropped_count`를 올립니다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use logweave_core::error::LogweaveError;
use logweave_core::metrics as m;
use logweave_core::pipeline::{HealthStatus, Pipeline};
use logweave_core::types::LogEntry;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::buffer::{self, LogBuffer};
use crate::collector::{Collector, CollectorStats};
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::output::{OutputManager, OutputStats};
use crate::processor::ProcessorChain;
use crate::registry::ComponentRegistry;

/// 버퍼 사용률이 이 값을 넘으면 Degraded
const DEGRADED_UTILIZATION: f64 = 0.9;

/// 파이프라인 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

impl PipelineState {
    /// 상태 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// 파이프라인 통계 스냅샷
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    /// 파이프라인 이름
    pub name: String,
    /// 현재 상태
    pub state: PipelineState,
    /// 마지막 실행 식별자
    pub run_id: Option<String>,
    /// 마지막 시작 시각
    pub start_time: Option<DateTime<Utc>>,
    /// 워커가 받은 엔트리 수
    pub received_count: u64,
    /// 프로세서 체인을 통과한 엔트리 수
    pub processed_count: u64,
    /// 프로세서가 드롭한 엔트리 수
    pub filtered_count: u64,
    /// 백프레셔 + 버퍼 오버플로우로 드롭된 엔트리 수
    pub dropped_count: u64,
    /// 출력으로 플러시된 엔트리 수
    pub flushed_count: u64,
    /// 플러시 횟수
    pub flush_count: u64,
    /// 에러 수 (출력 실패 + 구성 요소 생성 실패)
    pub error_count: u64,
    /// 마지막 에러 메시지
    pub last_error: Option<String>,
    /// 마지막 에러 시각
    pub last_error_time: Option<DateTime<Utc>>,
    /// 버퍼에 대기 중인 엔트리 수
    pub buffer_len: usize,
    /// 버퍼 사용률 (%)
    pub buffer_utilization: f64,
    /// 마지막 샘플 구간의 초당 처리량
    pub throughput: f64,
    /// 수집기별 통계
    pub collectors: Vec<CollectorStats>,
    /// 출력별 통계
    pub outputs: Vec<OutputStats>,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    processed: AtomicU64,
    filtered: AtomicU64,
    backpressure_dropped: AtomicU64,
    flushed: AtomicU64,
    flushes: AtomicU64,
    errors: AtomicU64,
}

#[derive(Default)]
struct Sample {
    throughput: f64,
    errors_in_window: bool,
}

/// 실행 간에 유지되는 공유 상태
struct Shared {
    name: String,
    counters: Counters,
    last_error: RwLock<Option<(String, DateTime<Utc>)>>,
    sample: RwLock<Sample>,
}

impl Shared {
    fn record_error(&self, message: String) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        *self.last_error.write().unwrap_or_else(|e| e.into_inner()) = Some((message, Utc::now()));
    }
}

/// 로그 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use logweave_pipeline::{ComponentRegistry, LogPipelineBuilder};
///
/// let mut pipeline = LogPipelineBuilder::new()
///     .config(config)
///     .registry(ComponentRegistry::with_defaults())
///     .build()?;
///
/// pipeline.launch().await?;
/// // ...
/// pipeline.shutdown().await?;
/// ```
pub struct LogPipeline {
    config: PipelineConfig,
    registry: ComponentRegistry,
    state: PipelineState,
    shared: Arc<Shared>,
    buffer: Arc<Mutex<LogBuffer>>,
    outputs: Arc<OutputManager>,
    collectors: Vec<Box<dyn Collector>>,
    processor_names: Vec<String>,
    cancel: Option<CancellationToken>,
    input_tx: Option<mpsc::Sender<LogEntry>>,
    tasks: Vec<JoinHandle<()>>,
    run_id: Option<String>,
    start_time: Option<DateTime<Utc>>,
}

impl LogPipeline {
    /// 설정과 레지스트리로 파이프라인을 생성합니다.
    pub fn new(config: PipelineConfig, registry: ComponentRegistry) -> Result<Self, LogPipelineError> {
        config.validate()?;

        let buffer = LogBuffer::new(config.buffer_size, config.drop_policy);
        Ok(Self {
            shared: Arc::new(Shared {
                name: config.name.clone(),
                counters: Counters::default(),
                last_error: RwLock::new(None),
                sample: RwLock::new(Sample::default()),
            }),
            buffer: Arc::new(Mutex::new(buffer)),
            outputs: Arc::new(OutputManager::new(config.output_timeout)),
            config,
            registry,
            state: PipelineState::Initialized,
            collectors: Vec::new(),
            processor_names: Vec::new(),
            cancel: None,
            input_tx: None,
            tasks: Vec::new(),
            run_id: None,
            start_time: None,
        })
    }

    /// 파이프라인 이름
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// 파이프라인 설정
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 현재 상태
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// 실행 중 여부
    pub fn is_running(&self) -> bool {
        self.state == PipelineState::Running
    }

    /// 설정에서 활성화되어 있는지 확인합니다.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// 입력 채널 송신측을 반환합니다 (실행 중일 때만).
    ///
    /// 외부 생산자는 이 채널로 엔트리를 직접 주입할 수 있습니다.
    pub fn entry_sender(&self) -> Option<mpsc::Sender<LogEntry>> {
        self.input_tx.clone()
    }

    /// 현재 실행에서 생성된 프로세서 이름 (선언 순서)
    pub fn processor_names(&self) -> &[String] {
        &self.processor_names
    }

    /// 현재 실행에서 생성된 출력 관리자
    pub fn outputs(&self) -> &OutputManager {
        &self.outputs
    }

    /// 버퍼 사용률 (0.0~1.0)
    pub fn buffer_utilization(&self) -> f64 {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .utilization()
    }

    /// 파이프라인을 시작합니다.
    ///
    /// 구성 요소 생성 실패는 기록만 하고 해당 구성 요소를 제외한 채 계속합니다.
    pub async fn launch(&mut self) -> Result<(), LogPipelineError> {
        if self.state == PipelineState::Running {
            return Err(LogPipelineError::AlreadyRunning(self.config.name.clone()));
        }
        if !self.config.enabled {
            return Err(LogPipelineError::Disabled(self.config.name.clone()));
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        info!(pipeline = %self.config.name, run_id = %run_id, "starting log pipeline");

        let cancel = CancellationToken::new();
        let (input_tx, input_rx) = mpsc::channel(self.config.buffer_size);
        let (output_tx, output_rx) = mpsc::channel(self.config.buffer_size);
        let (flush_tx, flush_rx) = buffer::flush_signal();

        let chain = Arc::new(self.build_processors());
        self.processor_names = chain.names().into_iter().map(str::to_owned).collect();
        self.outputs = Arc::new(self.build_outputs());
        self.collectors = self.start_collectors(&input_tx, &cancel).await;

        let input_rx = Arc::new(tokio::sync::Mutex::new(input_rx));
        for worker_id in 0..self.config.workers {
            let ctx = WorkerContext {
                worker_id,
                shared: Arc::clone(&self.shared),
                chain: Arc::clone(&chain),
                input: Arc::clone(&input_rx),
                output: output_tx.clone(),
            };
            self.tasks.push(tokio::spawn(run_worker(ctx, cancel.clone())));
        }
        drop(output_tx);

        self.tasks.push(tokio::spawn(run_drainer(
            Arc::clone(&self.shared),
            Arc::clone(&self.buffer),
            output_rx,
            flush_tx,
            self.config.flush_threshold,
        )));

        let flusher = Flusher {
            shared: Arc::clone(&self.shared),
            buffer: Arc::clone(&self.buffer),
            outputs: Arc::clone(&self.outputs),
        };
        self.tasks.push(tokio::spawn(run_flush(
            flusher,
            flush_rx,
            self.config.flush_interval,
            self.config.flush_threshold,
            cancel.clone(),
        )));

        self.tasks.push(tokio::spawn(run_stats(
            Arc::clone(&self.shared),
            Arc::clone(&self.buffer),
            self.config.stats_interval,
            cancel.clone(),
        )));

        self.cancel = Some(cancel);
        self.input_tx = Some(input_tx);
        self.run_id = Some(run_id);
        self.start_time = Some(Utc::now());
        self.state = PipelineState::Running;

        info!(
            pipeline = %self.config.name,
            collectors = self.collectors.len(),
            processors = self.processor_names.len(),
            outputs = self.outputs.len(),
            workers = self.config.workers,
            "log pipeline started"
        );
        Ok(())
    }

    /// 파이프라인을 정지합니다.
    ///
    /// 모든 태스크를 정리한 뒤 버퍼에 남은 엔트리를 강제 플러시하고 출력을 닫습니다.
    /// 플러시/종료 실패는 기록만 하며 정지 자체는 성공합니다.
    pub async fn shutdown(&mut self) -> Result<(), LogPipelineError> {
        if self.state != PipelineState::Running {
            return Err(LogPipelineError::NotRunning(self.config.name.clone()));
        }

        info!(pipeline = %self.config.name, "stopping log pipeline");

        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }

        for collector in &mut self.collectors {
            if let Err(e) = collector.stop().await {
                warn!(pipeline = %self.config.name, collector = %collector.name(), error = %e, "collector stop failed");
                self.shared.record_error(e.to_string());
            }
        }
        self.input_tx = None;

        tokio::time::sleep(self.config.shutdown_grace).await;

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(pipeline = %self.config.name, error = %e, "pipeline task panicked");
            }
        }

        let flusher = Flusher {
            shared: Arc::clone(&self.shared),
            buffer: Arc::clone(&self.buffer),
            outputs: Arc::clone(&self.outputs),
        };
        let remaining = flusher.drain_all();
        if !remaining.is_empty() {
            info!(pipeline = %self.config.name, count = remaining.len(), "flushing remaining buffered entries");
        }
        flusher.flush(remaining).await;

        if let Err(e) = self.outputs.close().await {
            warn!(pipeline = %self.config.name, error = %e, "closing outputs failed");
            self.shared.record_error(e.to_string());
        }

        self.state = PipelineState::Stopped;
        info!(pipeline = %self.config.name, "log pipeline stopped");
        Ok(())
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> PipelineStats {
        let counters = &self.shared.counters;
        let (buffer_len, utilization, overflow_dropped) = {
            let buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            (buffer.len(), buffer.utilization(), buffer.dropped_count())
        };
        let (last_error, last_error_time) = self
            .shared
            .last_error
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .map_or((None, None), |(msg, at)| (Some(msg), Some(at)));
        let throughput = self
            .shared
            .sample
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .throughput;

        PipelineStats {
            name: self.config.name.clone(),
            state: self.state,
            run_id: self.run_id.clone(),
            start_time: self.start_time,
            received_count: counters.received.load(Ordering::Relaxed),
            processed_count: counters.processed.load(Ordering::Relaxed),
            filtered_count: counters.filtered.load(Ordering::Relaxed),
            dropped_count: counters.backpressure_dropped.load(Ordering::Relaxed) + overflow_dropped,
            flushed_count: counters.flushed.load(Ordering::Relaxed),
            flush_count: counters.flushes.load(Ordering::Relaxed),
            error_count: counters.errors.load(Ordering::Relaxed),
            last_error,
            last_error_time,
            buffer_len,
            buffer_utilization: utilization * 100.0,
            throughput,
            collectors: self.collectors.iter().map(|c| c.stats()).collect(),
            outputs: self.outputs.stats(),
        }
    }

    fn record_component_error(&self, category: &str, name: &str, error: &LogPipelineError) {
        warn!(
            pipeline = %self.config.name,
            category,
            component = %name,
            error = %error,
            "component skipped"
        );
        self.shared.record_error(format!("{category} '{name}': {error}"));
    }

    fn build_processors(&self) -> ProcessorChain {
        let mut chain = ProcessorChain::new();
        for decl in self.config.processors.iter().filter(|d| d.enabled) {
            match self.registry.build_processor(decl) {
                Ok(processor) => chain.push(processor),
                Err(e) => self.record_component_error("processor", decl.display_name(), &e),
            }
        }
        chain
    }

    fn build_outputs(&self) -> OutputManager {
        let manager = OutputManager::new(self.config.output_timeout);
        for decl in self.config.outputs.iter().filter(|d| d.enabled) {
            let added = self
                .registry
                .build_output(decl)
                .and_then(|output| manager.add(output));
            if let Err(e) = added {
                self.record_component_error("output", decl.display_name(), &e);
            }
        }
        manager
    }

    async fn start_collectors(
        &self,
        input_tx: &mpsc::Sender<LogEntry>,
        cancel: &CancellationToken,
    ) -> Vec<Box<dyn Collector>> {
        let mut started = Vec::new();
        for decl in self.config.collectors.iter().filter(|d| d.enabled) {
            let mut collector = match self.registry.build_collector(decl) {
                Ok(collector) => collector,
                Err(e) => {
                    self.record_component_error("collector", decl.display_name(), &e);
                    continue;
                }
            };
            collector.set_output(input_tx.clone());
            match collector.start(cancel.clone()).await {
                Ok(()) => started.push(collector),
                Err(e) => self.record_component_error("collector", decl.display_name(), &e),
            }
        }
        started
    }
}

impl Pipeline for LogPipeline {
    async fn start(&mut self) -> Result<(), LogweaveError> {
        self.launch().await.map_err(LogweaveError::from)
    }

    async fn stop(&mut self) -> Result<(), LogweaveError> {
        self.shutdown().await.map_err(LogweaveError::from)
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                let utilization = self.buffer_utilization();
                if utilization > DEGRADED_UTILIZATION {
                    return HealthStatus::Degraded(format!(
                        "buffer utilization high: {:.1}%",
                        utilization * 100.0
                    ));
                }
                let errors_in_window = self
                    .shared
                    .sample
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .errors_in_window;
                if errors_in_window {
                    HealthStatus::Degraded("errors recorded in last sample".to_owned())
                } else {
                    HealthStatus::Healthy
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 로그 파이프라인 빌더
pub struct LogPipelineBuilder {
    config: PipelineConfig,
    registry: Option<ComponentRegistry>,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            registry: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 구성 요소 레지스트리를 지정합니다. 기본값은 [`ComponentRegistry::with_defaults`]입니다.
    pub fn registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<LogPipeline, LogPipelineError> {
        let registry = self.registry.unwrap_or_else(ComponentRegistry::with_defaults);
        LogPipeline::new(self.config, registry)
    }
}

impl Default for LogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ─── 백그라운드 태스크 ─────────────────────────────────────────────

struct WorkerContext {
    worker_id: usize,
    shared: Arc<Shared>,
    chain: Arc<ProcessorChain>,
    input: Arc<tokio::sync::Mutex<mpsc::Receiver<LogEntry>>>,
    output: mpsc::Sender<LogEntry>,
}

impl WorkerContext {
    fn handle(&self, entry: LogEntry) {
        let counters = &self.shared.counters;
        counters.received.fetch_add(1, Ordering::Relaxed);

        let Some(entry) = self.chain.process(entry) else {
            counters.filtered.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(
                m::PIPELINE_ENTRIES_DROPPED_TOTAL,
                m::LABEL_PIPELINE => self.shared.name.clone(),
                m::LABEL_REASON => "processor"
            )
            .increment(1);
            return;
        };

        counters.processed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::PIPELINE_ENTRIES_PROCESSED_TOTAL, m::LABEL_PIPELINE => self.shared.name.clone())
            .increment(1);

        if let Err(e) = self.output.try_send(entry) {
            counters.backpressure_dropped.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(
                m::PIPELINE_ENTRIES_DROPPED_TOTAL,
                m::LABEL_PIPELINE => self.shared.name.clone(),
                m::LABEL_REASON => "backpressure"
            )
            .increment(1);
            debug!(pipeline = %self.shared.name, worker = self.worker_id, error = %e, "output queue rejected entry");
        }
    }
}

async fn run_worker(ctx: WorkerContext, cancel: CancellationToken) {
    loop {
        let next = {
            let mut rx = ctx.input.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                entry = rx.recv() => entry,
            }
        };
        match next {
            Some(entry) => ctx.handle(entry),
            None => break,
        }
    }

    // 취소 시점에 이미 큐에 있던 엔트리까지 처리
    loop {
        let next = ctx.input.lock().await.try_recv().ok();
        let Some(entry) = next else { break };
        ctx.handle(entry);
    }

    debug!(pipeline = %ctx.shared.name, worker = ctx.worker_id, "worker stopped");
}

/// 출력 큐를 버퍼로 옮깁니다. 모든 워커가 끝나 큐가 닫히면 종료합니다.
async fn run_drainer(
    shared: Arc<Shared>,
    buffer: Arc<Mutex<LogBuffer>>,
    mut output_rx: mpsc::Receiver<LogEntry>,
    flush_tx: mpsc::Sender<()>,
    flush_threshold: usize,
) {
    while let Some(entry) = output_rx.recv().await {
        let (dropped, should_flush) = {
            let mut buf = buffer.lock().unwrap_or_else(|e| e.into_inner());
            let dropped = buf.push(entry);
            (dropped, buf.should_flush(flush_threshold))
        };
        if dropped {
            metrics::counter!(
                m::PIPELINE_ENTRIES_DROPPED_TOTAL,
                m::LABEL_PIPELINE => shared.name.clone(),
                m::LABEL_REASON => "buffer_overflow"
            )
            .increment(1);
        }
        if should_flush {
            buffer::signal_flush(&flush_tx);
        }
    }
    debug!(pipeline = %shared.name, "drainer stopped");
}

struct Flusher {
    shared: Arc<Shared>,
    buffer: Arc<Mutex<LogBuffer>>,
    outputs: Arc<OutputManager>,
}

impl Flusher {
    fn drain_all(&self) -> Vec<LogEntry> {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain_all()
    }

    fn drain_threshold(&self, threshold: usize) -> Vec<LogEntry> {
        let mut buf = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        if buf.should_flush(threshold) {
            buf.drain_batch(threshold)
        } else {
            Vec::new()
        }
    }

    async fn flush(&self, batch: Vec<LogEntry>) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len() as u64;
        let counters = &self.shared.counters;
        counters.flushes.fetch_add(1, Ordering::Relaxed);
        counters.flushed.fetch_add(count, Ordering::Relaxed);
        metrics::counter!(m::PIPELINE_ENTRIES_FLUSHED_TOTAL, m::LABEL_PIPELINE => self.shared.name.clone())
            .increment(count);

        if let Err(e) = self.outputs.write_to_all(&batch).await {
            warn!(pipeline = %self.shared.name, entries = count, error = %e, "flush failed");
            self.shared.record_error(e.to_string());
        } else {
            debug!(pipeline = %self.shared.name, entries = count, "batch flushed");
        }
    }
}

async fn run_flush(
    flusher: Flusher,
    mut flush_rx: mpsc::Receiver<()>,
    interval: Duration,
    threshold: usize,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // 첫 tick은 즉시 완료되므로 소비
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(()) = flush_rx.recv() => {
                loop {
                    let batch = flusher.drain_threshold(threshold);
                    if batch.is_empty() {
                        break;
                    }
                    flusher.flush(batch).await;
                }
            }
            _ = ticker.tick() => {
                let batch = flusher.drain_all();
                flusher.flush(batch).await;
            }
        }
    }
    debug!(pipeline = %flusher.shared.name, "flush task stopped");
}

async fn run_stats(
    shared: Arc<Shared>,
    buffer: Arc<Mutex<LogBuffer>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    let mut last_processed = shared.counters.processed.load(Ordering::Relaxed);
    let mut last_errors = shared.counters.errors.load(Ordering::Relaxed);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let processed = shared.counters.processed.load(Ordering::Relaxed);
                let errors = shared.counters.errors.load(Ordering::Relaxed);
                let throughput = (processed - last_processed) as f64 / interval.as_secs_f64();
                let buffer_len = buffer.lock().unwrap_or_else(|e| e.into_inner()).len();

                {
                    let mut sample = shared.sample.write().unwrap_or_else(|e| e.into_inner());
                    sample.throughput = throughput;
                    sample.errors_in_window = errors > last_errors;
                }
                last_processed = processed;
                last_errors = errors;

                metrics::gauge!(m::PIPELINE_THROUGHPUT, m::LABEL_PIPELINE => shared.name.clone())
                    .set(throughput);
                metrics::gauge!(m::PIPELINE_BUFFER_SIZE, m::LABEL_PIPELINE => shared.name.clone())
                    .set(buffer_len as f64);
                debug!(pipeline = %shared.name, throughput, buffer_len, "stats sampled");
            }
        }
    }
}
