//! 파일 기반 로그 수집기
//!
//! 설정된 경로(파일 또는 디렉토리)에서 대상 파일을 찾아 파일마다 감시 태스크를 띄웁니다.
//! 각 태스크는 주기적으로 파일 크기를 확인하고, 늘어난 부분만 줄 단위로 읽어
//! 라인 파서로 변환한 뒤 파이프라인에 전달합니다.
//!
//! # 오프셋 규칙
//! - 시작 위치: `tail_mode`이면 파일 끝, 아니면 0
//! - 현재 크기 < 마지막 오프셋이면 truncation으로 보고 0부터 다시 읽음
//! - 크기가 늘었으면 오프셋부터 확인한 크기까지 읽고 오프셋을 갱신
//!
//! # 사용 예시
//! ```ignore
//! use logweave_pipeline::collector::{Collector, FileCollector, FileCollectorConfig};
//!
//! let config = FileCollectorConfig {
//!     paths: vec!["/var/log/app".into()],
//!     patterns: vec!["*.log".to_owned()],
//!     ..Default::default()
//! };
//! let mut collector = FileCollector::new("app-logs", config)?;
//! collector.set_output(tx);
//! collector.start(cancel.clone()).await?;
//! ```

use std::collections::{BTreeSet, HashMap};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use logweave_core::config::ComponentConfig;
use logweave_core::metrics as m;
use logweave_core::pipeline::BoxFuture;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Collector, CollectorStats, EntrySink};
use crate::error::LogPipelineError;
use crate::parser::{LineParser, create_parser};
use crate::registry::decode_options;

/// 파일 수집기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCollectorConfig {
    /// 감시할 파일 또는 디렉토리 경로
    pub paths: Vec<PathBuf>,
    /// 포함할 파일 이름 glob (비어 있으면 모두 포함)
    pub patterns: Vec<String>,
    /// 제외할 파일 이름 glob
    pub exclude: Vec<String>,
    /// 하위 디렉토리까지 탐색
    pub recursive: bool,
    /// 파일 끝부터 읽기 시작
    pub tail_mode: bool,
    /// 라인 파서 (json, nginx, apache, text)
    pub parser: String,
    /// 모든 엔트리에 병합할 필드
    pub fields: HashMap<String, serde_json::Value>,
    /// 모든 엔트리에 병합할 태그
    pub tags: HashMap<String, String>,
    /// 엔트리에 기록할 서비스 이름
    pub service: String,
    /// 파일 상태 체크 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 최대 라인 길이 (바이트, 초과분은 잘림)
    pub max_line_length: usize,
}

impl Default for FileCollectorConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            patterns: Vec::new(),
            exclude: Vec::new(),
            recursive: false,
            tail_mode: false,
            parser: "text".to_owned(),
            fields: HashMap::new(),
            tags: HashMap::new(),
            service: String::new(),
            poll_interval_ms: 1000,
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

/// glob 패턴을 파일 이름 매칭용 정규식으로 변환합니다.
///
/// `*`, `?`, `[...]` (`[!...]` 부정 포함)을 지원합니다.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, LogPipelineError> {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                out.push('[');
                if chars.peek() == Some(&'!') {
                    chars.next();
                    out.push('^');
                }
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                    if inner == '\\' {
                        out.push_str("\\\\");
                    } else {
                        out.push(inner);
                    }
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Ok(Regex::new(&out)?)
}

/// 감시 태스크가 공유하는 상태
struct WatchContext {
    collector: String,
    parser: Arc<dyn LineParser>,
    sink: EntrySink,
    stats: Arc<RwLock<CollectorStats>>,
    fields: HashMap<String, serde_json::Value>,
    tags: HashMap<String, String>,
    service: String,
    poll_interval: Duration,
    max_line_length: usize,
    tail_mode: bool,
}

impl WatchContext {
    fn record_error(&self, error: &LogPipelineError) {
        self.stats
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .record_error(error);
        metrics::counter!(m::COLLECTOR_ERRORS_TOTAL, m::LABEL_COMPONENT => self.collector.clone())
            .increment(1);
    }

    fn build_entry(&self, line: &str, source: &str) -> logweave_core::types::LogEntry {
        let mut entry = self.parser.parse_line(line, source);
        entry
            .fields
            .extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        entry
            .tags
            .extend(self.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        if !self.service.is_empty() {
            entry.service.clone_from(&self.service);
        }
        entry
    }
}

/// 파일 하나에 대한 감시 태스크 핸들
struct WatcherHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// 파일 기반 로그 수집기
pub struct FileCollector {
    name: String,
    config: FileCollectorConfig,
    parser: Arc<dyn LineParser>,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    sink: Option<EntrySink>,
    stats: Arc<RwLock<CollectorStats>>,
    /// 정규화된 경로 -> 감시 태스크
    watchers: HashMap<PathBuf, WatcherHandle>,
    running: bool,
}

impl FileCollector {
    /// 새 파일 수집기를 생성합니다.
    ///
    /// 파서 이름이나 glob 패턴이 잘못되면 에러를 반환합니다.
    pub fn new(name: impl Into<String>, config: FileCollectorConfig) -> Result<Self, LogPipelineError> {
        let name = name.into();
        if config.poll_interval_ms == 0 {
            return Err(LogPipelineError::Config {
                field: format!("{name}.options.poll_interval_ms"),
                reason: "must be greater than 0".to_owned(),
            });
        }

        let parser: Arc<dyn LineParser> = Arc::from(create_parser(&config.parser)?);
        let include = config
            .patterns
            .iter()
            .map(|p| glob_to_regex(p))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude = config
            .exclude
            .iter()
            .map(|p| glob_to_regex(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            stats: Arc::new(RwLock::new(CollectorStats::named(name.clone()))),
            name,
            config,
            parser,
            include,
            exclude,
            sink: None,
            watchers: HashMap::new(),
            running: false,
        })
    }

    /// 구성 요소 선언에서 파일 수집기를 생성합니다.
    pub fn from_component(component: &ComponentConfig) -> Result<Self, LogPipelineError> {
        let config: FileCollectorConfig = decode_options(component)?;
        Self::new(component.display_name(), config)
    }

    /// 현재 감시 중인 파일 경로 목록 (정규화된 경로)
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.watchers.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// 파일 이름이 포함/제외 패턴을 통과하는지 확인합니다.
    fn matches_patterns(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let included =
            self.include.is_empty() || self.include.iter().any(|re| re.is_match(file_name));
        included && !self.exclude.iter().any(|re| re.is_match(file_name))
    }

    fn record_error(&self, error: &LogPipelineError) {
        self.stats
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .record_error(error);
        metrics::counter!(m::COLLECTOR_ERRORS_TOTAL, m::LABEL_COMPONENT => self.name.clone())
            .increment(1);
    }

    /// 설정된 경로에서 감시 대상 파일을 찾습니다.
    ///
    /// 접근할 수 없는 경로는 에러를 기록하고 건너뜁니다.
    async fn resolve_targets(&self) -> BTreeSet<PathBuf> {
        let mut targets = BTreeSet::new();

        for path in &self.config.paths {
            let metadata = match tokio::fs::metadata(path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    self.skip_path(format!("cannot watch {}: {e}", path.display()));
                    continue;
                }
            };

            if metadata.is_dir() {
                targets.extend(self.walk_dir(path).await);
            } else if self.matches_patterns(path) {
                match tokio::fs::canonicalize(path).await {
                    Ok(canonical) => {
                        targets.insert(canonical);
                    }
                    Err(e) => self.record_error(&LogPipelineError::Io(e)),
                }
            }
        }

        targets
    }

    /// 디렉토리를 탐색하여 패턴에 맞는 파일을 모읍니다.
    ///
    /// 읽을 수 없는 하위 디렉토리나 항목은 에러를 기록하고 건너뛰며,
    /// 그때까지 찾은 파일은 유지합니다.
    async fn walk_dir(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    self.skip_path(format!("cannot read directory {}: {e}", dir.display()));
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        self.skip_path(format!("cannot list directory {}: {e}", dir.display()));
                        break;
                    }
                };
                let path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        self.skip_path(format!("cannot stat {}: {e}", path.display()));
                        continue;
                    }
                };
                if file_type.is_dir() {
                    if self.config.recursive {
                        pending.push(path);
                    }
                } else if self.matches_patterns(&path) {
                    // 끊어진 심볼릭 링크는 여기서 실패
                    match tokio::fs::canonicalize(&path).await {
                        Ok(canonical) => files.push(canonical),
                        Err(e) => {
                            self.skip_path(format!("cannot watch {}: {e}", path.display()));
                        }
                    }
                }
            }
        }

        files
    }

    fn skip_path(&self, reason: String) {
        let err = LogPipelineError::Collector {
            name: self.name.clone(),
            reason,
        };
        warn!(collector = %self.name, error = %err, "skipping path");
        self.record_error(&err);
    }
}

impl Collector for FileCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_output(&mut self, sink: EntrySink) {
        self.sink = Some(sink);
    }

    fn start(&mut self, cancel: CancellationToken) -> BoxFuture<'_, Result<(), LogPipelineError>> {
        Box::pin(async move {
            if self.running {
                return Err(LogPipelineError::Collector {
                    name: self.name.clone(),
                    reason: "already running".to_owned(),
                });
            }
            let sink = self.sink.clone().ok_or_else(|| LogPipelineError::Collector {
                name: self.name.clone(),
                reason: "output channel not set".to_owned(),
            })?;

            let ctx = Arc::new(WatchContext {
                collector: self.name.clone(),
                parser: Arc::clone(&self.parser),
                sink,
                stats: Arc::clone(&self.stats),
                fields: self.config.fields.clone(),
                tags: self.config.tags.clone(),
                service: self.config.service.clone(),
                poll_interval: Duration::from_millis(self.config.poll_interval_ms),
                max_line_length: self.config.max_line_length.max(1),
                tail_mode: self.config.tail_mode,
            });

            for path in self.resolve_targets().await {
                if self.watchers.contains_key(&path) {
                    continue;
                }
                let child = cancel.child_token();
                let task = tokio::spawn(watch_file(Arc::clone(&ctx), path.clone(), child.clone()));
                self.watchers.insert(path, WatcherHandle { cancel: child, task });
            }

            let watched = self.watchers.len();
            {
                let mut stats = self.stats.write().unwrap_or_else(|e| e.into_inner());
                stats.running = true;
                stats.watched_files = watched;
            }
            metrics::gauge!(m::COLLECTOR_WATCHED_FILES, m::LABEL_COMPONENT => self.name.clone())
                .set(watched as f64);

            self.running = true;
            info!(collector = %self.name, watched_files = watched, "file collector started");
            Ok(())
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), LogPipelineError>> {
        Box::pin(async move {
            for (path, handle) in self.watchers.drain() {
                handle.cancel.cancel();
                if let Err(e) = handle.task.await {
                    warn!(collector = %self.name, path = %path.display(), error = %e, "watcher task panicked");
                }
            }

            {
                let mut stats = self.stats.write().unwrap_or_else(|e| e.into_inner());
                stats.running = false;
                stats.watched_files = 0;
            }
            metrics::gauge!(m::COLLECTOR_WATCHED_FILES, m::LABEL_COMPONENT => self.name.clone())
                .set(0.0);

            if self.running {
                info!(collector = %self.name, "file collector stopped");
            }
            self.running = false;
            Ok(())
        })
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn stats(&self) -> CollectorStats {
        self.stats.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// 파일 하나를 감시합니다. 취소될 때까지 실행됩니다.
async fn watch_file(ctx: Arc<WatchContext>, path: PathBuf, cancel: CancellationToken) {
    let mut offset = if ctx.tail_mode {
        tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.len())
            .unwrap_or(0)
    } else {
        0
    };
    debug!(collector = %ctx.collector, path = %path.display(), offset, "watching file");

    let mut ticker = tokio::time::interval(ctx.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = read_new_lines(&ctx, &path, &mut offset, &cancel).await {
                    warn!(collector = %ctx.collector, path = %path.display(), error = %e, "read failed");
                    ctx.record_error(&e);
                }
            }
        }
    }

    debug!(collector = %ctx.collector, path = %path.display(), "watcher stopped");
}

/// 오프셋 이후 추가된 줄을 읽어 전송합니다.
///
/// `offset`은 전송한 줄만큼 바로 전진하므로, 읽기 도중 실패해도
/// 이미 보낸 줄은 다음 틱에 다시 읽지 않습니다.
async fn read_new_lines(
    ctx: &WatchContext,
    path: &Path,
    offset: &mut u64,
    cancel: &CancellationToken,
) -> Result<(), LogPipelineError> {
    let size = tokio::fs::metadata(path).await?.len();

    if size < *offset {
        info!(collector = %ctx.collector, path = %path.display(), "file truncated, reading from start");
        *offset = 0;
    }
    if size == *offset {
        return Ok(());
    }

    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(*offset)).await?;
    let mut reader = BufReader::new(file.take(size - *offset));

    let source = path.to_string_lossy();
    let mut sent = 0u64;
    let result = send_lines(ctx, &mut reader, &source, offset, &mut sent, cancel).await;

    if sent > 0 {
        ctx.stats
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .collected_count += sent;
        metrics::counter!(m::COLLECTOR_ENTRIES_TOTAL, m::LABEL_COMPONENT => ctx.collector.clone())
            .increment(sent);
    }

    result
}

/// 리더가 끝날 때까지 줄 단위로 엔트리를 전송합니다.
async fn send_lines<R>(
    ctx: &WatchContext,
    reader: &mut R,
    source: &str,
    offset: &mut u64,
    sent: &mut u64,
    cancel: &CancellationToken,
) -> Result<(), LogPipelineError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        *offset += n as u64;

        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        if buf.len() > ctx.max_line_length {
            buf.truncate(ctx.max_line_length);
        }
        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }

        let entry = ctx.build_entry(&line, source);
        tokio::select! {
            result = ctx.sink.send(entry) => {
                if result.is_err() {
                    return Err(LogPipelineError::Channel("pipeline input closed".to_owned()));
                }
            }
            _ = cancel.cancelled() => return Ok(()),
        }
        *sent += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logweave_core::types::{LogEntry, LogLevel};
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;

    fn config_for(paths: Vec<PathBuf>) -> FileCollectorConfig {
        FileCollectorConfig {
            paths,
            poll_interval_ms: 20,
            ..Default::default()
        }
    }

    async fn recv(rx: &mut mpsc::Receiver<LogEntry>) -> LogEntry {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for entry")
            .expect("channel closed")
    }

    async fn append(path: &Path, text: &str) {
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await
            .unwrap();
        file.write_all(text.as_bytes()).await.unwrap();
        file.flush().await.unwrap();
    }

    #[test]
    fn glob_conversion() {
        let re = glob_to_regex("*.log").unwrap();
        assert!(re.is_match("app.log"));
        assert!(!re.is_match("app.log.gz"));

        let re = glob_to_regex("app-?.txt").unwrap();
        assert!(re.is_match("app-1.txt"));
        assert!(!re.is_match("app-12.txt"));

        let re = glob_to_regex("[!a]*.log").unwrap();
        assert!(re.is_match("b.log"));
        assert!(!re.is_match("a.log"));

        let re = glob_to_regex("v[0-9].log").unwrap();
        assert!(re.is_match("v3.log"));
    }

    #[test]
    fn unknown_parser_fails_construction() {
        let config = FileCollectorConfig {
            parser: "xml".to_owned(),
            ..Default::default()
        };
        assert!(FileCollector::new("files", config).is_err());
    }

    #[tokio::test]
    async fn start_without_output_fails() {
        let mut collector = FileCollector::new("files", config_for(Vec::new())).unwrap();
        assert!(collector.start(CancellationToken::new()).await.is_err());
    }

    #[tokio::test]
    async fn reads_existing_and_appended_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, "first line\nERROR second line\n\n").await;

        let mut config = config_for(vec![path.clone()]);
        config.service = "billing".to_owned();
        config.tags.insert("env".to_owned(), "test".to_owned());

        let (tx, mut rx) = mpsc::channel(16);
        let mut collector = FileCollector::new("files", config).unwrap();
        collector.set_output(tx);
        let cancel = CancellationToken::new();
        collector.start(cancel.clone()).await.unwrap();

        let first = recv(&mut rx).await;
        assert_eq!(first.message, "first line");
        assert_eq!(first.service, "billing");
        assert_eq!(first.tags["env"], "test");
        let second = recv(&mut rx).await;
        assert_eq!(second.level, LogLevel::Error);

        append(&path, "third line\n").await;
        assert_eq!(recv(&mut rx).await.message, "third line");

        collector.stop().await.unwrap();
        assert!(!collector.is_running());
        assert_eq!(collector.stats().collected_count, 3);
    }

    #[tokio::test]
    async fn tail_mode_skips_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, "old line\n").await;

        let mut config = config_for(vec![path.clone()]);
        config.tail_mode = true;

        let (tx, mut rx) = mpsc::channel(16);
        let mut collector = FileCollector::new("files", config).unwrap();
        collector.set_output(tx);
        collector.start(CancellationToken::new()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        append(&path, "new line\n").await;
        assert_eq!(recv(&mut rx).await.message, "new line");

        collector.stop().await.unwrap();
    }

    #[tokio::test]
    async fn truncation_restarts_from_beginning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, "a fairly long first line\n").await;

        let (tx, mut rx) = mpsc::channel(16);
        let mut collector = FileCollector::new("files", config_for(vec![path.clone()])).unwrap();
        collector.set_output(tx);
        collector.start(CancellationToken::new()).await.unwrap();
        assert_eq!(recv(&mut rx).await.message, "a fairly long first line");

        tokio::fs::write(&path, "short\n").await.unwrap();
        assert_eq!(recv(&mut rx).await.message, "short");

        collector.stop().await.unwrap();
    }

    #[tokio::test]
    async fn directory_patterns_and_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        tokio::fs::create_dir(&nested).await.unwrap();
        append(&dir.path().join("a.log"), "a\n").await;
        append(&dir.path().join("b.log.gz"), "b\n").await;
        append(&dir.path().join("c.txt"), "c\n").await;
        append(&nested.join("d.log"), "d\n").await;

        let mut config = config_for(vec![dir.path().to_path_buf(), dir.path().join("a.log")]);
        config.patterns = vec!["*.log*".to_owned()];
        config.exclude = vec!["*.gz".to_owned()];
        config.recursive = true;

        let (tx, _rx) = mpsc::channel(16);
        let mut collector = FileCollector::new("files", config).unwrap();
        collector.set_output(tx);
        collector.start(CancellationToken::new()).await.unwrap();

        let names: Vec<String> = collector
            .watched_paths()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a.log".to_owned()));
        assert!(names.contains(&"d.log".to_owned()));
        assert_eq!(collector.stats().watched_files, 2);

        collector.stop().await.unwrap();
    }

    #[tokio::test]
    async fn missing_path_is_recorded_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.log");
        append(&good, "ok\n").await;

        let config = config_for(vec![dir.path().join("missing.log"), good]);
        let (tx, mut rx) = mpsc::channel(16);
        let mut collector = FileCollector::new("files", config).unwrap();
        collector.set_output(tx);
        collector.start(CancellationToken::new()).await.unwrap();

        assert_eq!(recv(&mut rx).await.message, "ok");
        let stats = collector.stats();
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.watched_files, 1);
        assert!(stats.last_error.unwrap().contains("missing.log"));

        collector.stop().await.unwrap();
    }

    #[tokio::test]
    async fn dangling_symlink_does_not_hide_siblings() {
        let dir = tempfile::tempdir().unwrap();
        append(&dir.path().join("good.log"), "ok\n").await;
        std::os::unix::fs::symlink(dir.path().join("missing-target"), dir.path().join("broken.log"))
            .unwrap();

        let mut config = config_for(vec![dir.path().to_path_buf()]);
        config.patterns = vec!["*.log".to_owned()];
        let (tx, mut rx) = mpsc::channel(16);
        let mut collector = FileCollector::new("files", config).unwrap();
        collector.set_output(tx);
        collector.start(CancellationToken::new()).await.unwrap();

        assert_eq!(recv(&mut rx).await.message, "ok");
        let stats = collector.stats();
        assert_eq!(stats.watched_files, 1);
        assert_eq!(stats.error_count, 1);
        assert!(stats.last_error.unwrap().contains("broken.log"));

        collector.stop().await.unwrap();
    }

    /// 읽기 도중 항상 실패하는 리더
    struct FailingReader;

    impl tokio::io::AsyncRead for FailingReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn read_error_keeps_offset_of_sent_lines() {
        let (tx, mut rx) = mpsc::channel(16);
        let ctx = WatchContext {
            collector: "files".to_owned(),
            parser: Arc::from(create_parser("text").unwrap()),
            sink: tx,
            stats: Arc::new(RwLock::new(CollectorStats::named("files"))),
            fields: HashMap::new(),
            tags: HashMap::new(),
            service: String::new(),
            poll_interval: Duration::from_millis(20),
            max_line_length: 1024,
            tail_mode: false,
        };

        let mut reader = BufReader::new((&b"one\ntwo\n"[..]).chain(FailingReader));
        let mut offset = 100;
        let mut sent = 0;
        let result = send_lines(
            &ctx,
            &mut reader,
            "app.log",
            &mut offset,
            &mut sent,
            &CancellationToken::new(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(offset, 108);
        assert_eq!(sent, 2);
        assert_eq!(rx.recv().await.unwrap().message, "one");
        assert_eq!(rx.recv().await.unwrap().message, "two");
    }

    #[tokio::test]
    async fn long_lines_are_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, &format!("{}\n", "x".repeat(100))).await;

        let mut config = config_for(vec![path]);
        config.max_line_length = 10;
        let (tx, mut rx) = mpsc::channel(16);
        let mut collector = FileCollector::new("files", config).unwrap();
        collector.set_output(tx);
        collector.start(CancellationToken::new()).await.unwrap();

        assert_eq!(recv(&mut rx).await.message.len(), 10);
        collector.stop().await.unwrap();
    }
}
