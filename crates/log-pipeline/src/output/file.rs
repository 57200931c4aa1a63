//! 파일 출력 -- 크기 기반 로테이션
//!
//! 쓰기 전 활성 파일 크기가 `max_size` 이상이면 로테이션합니다.
//!
//! ```text
//! app.log.<max_files>   삭제
//! app.log.N  -> app.log.N+1   (N = max_files-1 .. 1)
//! app.log    -> app.log.1
//! app.log    새로 생성
//! ```
//!
//! 배치마다 `fsync`합니다.

use std::path::{Path, PathBuf};

use logweave_core::config::ComponentConfig;
use logweave_core::pipeline::BoxFuture;
use logweave_core::types::LogEntry;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    DEFAULT_TIME_FORMAT, LineFormat, Output, OutputState, OutputStats, render_json, render_text,
    validate_time_format,
};
use crate::error::LogPipelineError;
use crate::registry::decode_options;

/// 파일 출력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutputConfig {
    /// 활성 파일 경로
    pub path: PathBuf,
    /// 로테이션 기준 크기 (바이트)
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    /// 보관할 백업 파일 수
    #[serde(default = "default_max_files")]
    pub max_files: u32,
    /// 로테이션된 파일 압축 요청 (현재는 로그만 남김)
    #[serde(default)]
    pub compress: bool,
    /// 줄 형식
    #[serde(default)]
    pub format: LineFormat,
    /// 텍스트 형식의 타임스탬프 (strftime)
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

fn default_max_size() -> u64 {
    100 * 1024 * 1024 // 100MB
}

fn default_max_files() -> u32 {
    5
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_owned()
}

impl FileOutputConfig {
    /// 경로만 지정한 기본 설정을 생성합니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size: default_max_size(),
            max_files: default_max_files(),
            compress: false,
            format: LineFormat::default(),
            time_format: default_time_format(),
        }
    }
}

/// 열린 활성 파일과 현재 크기
struct ActiveFile {
    file: tokio::fs::File,
    size: u64,
}

/// 파일 출력
pub struct FileOutput {
    state: OutputState,
    config: FileOutputConfig,
    active: Mutex<Option<ActiveFile>>,
}

impl FileOutput {
    /// 새 파일 출력을 생성합니다. 파일은 첫 쓰기 때 엽니다.
    pub fn new(name: impl Into<String>, config: FileOutputConfig) -> Result<Self, LogPipelineError> {
        let name = name.into();
        if config.path.as_os_str().is_empty() {
            return Err(LogPipelineError::Config {
                field: format!("{name}.options.path"),
                reason: "must not be empty".to_owned(),
            });
        }
        if config.max_size == 0 {
            return Err(LogPipelineError::Config {
                field: format!("{name}.options.max_size"),
                reason: "must be greater than 0".to_owned(),
            });
        }
        validate_time_format(format!("{name}.options.time_format"), &config.time_format)?;

        Ok(Self {
            state: OutputState::new(&name),
            config,
            active: Mutex::new(None),
        })
    }

    /// 구성 요소 선언에서 파일 출력을 생성합니다.
    pub fn from_component(component: &ComponentConfig) -> Result<Self, LogPipelineError> {
        let config: FileOutputConfig = decode_options(component)?;
        Self::new(component.display_name(), config)
    }

    /// 활성 파일 경로
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.config.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    async fn open(&self) -> Result<ActiveFile, LogPipelineError> {
        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.path)
            .await?;
        let size = file.metadata().await?.len();
        debug!(output = %self.state.name, path = %self.config.path.display(), size, "file opened");
        Ok(ActiveFile { file, size })
    }

    /// 백업 체인을 한 칸씩 밀고 활성 파일을 `.1`로 옮깁니다.
    async fn rotate(&self) -> Result<(), LogPipelineError> {
        let max_files = self.config.max_files;

        if max_files == 0 {
            remove_if_exists(&self.config.path).await?;
        } else {
            remove_if_exists(&self.backup_path(max_files)).await?;
            for index in (1..max_files).rev() {
                let from = self.backup_path(index);
                if tokio::fs::try_exists(&from).await? {
                    tokio::fs::rename(&from, self.backup_path(index + 1)).await?;
                }
            }
            tokio::fs::rename(&self.config.path, self.backup_path(1)).await?;
        }

        if self.config.compress {
            info!(
                output = %self.state.name,
                path = %self.backup_path(1).display(),
                "compression requested for rotated file (not performed)"
            );
        }
        info!(output = %self.state.name, path = %self.config.path.display(), "file rotated");
        Ok(())
    }

    fn render(&self, entries: &[LogEntry]) -> Result<Vec<u8>, LogPipelineError> {
        let mut buf = Vec::with_capacity(entries.len() * 128);
        for entry in entries {
            let line = match self.config.format {
                LineFormat::Json => render_json(entry)?,
                LineFormat::Text => {
                    render_text(entry, &self.config.time_format, entry.level.as_str())
                }
            };
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
        }
        Ok(buf)
    }

    async fn write_batch(&self, entries: &[LogEntry]) -> Result<usize, LogPipelineError> {
        let payload = self.render(entries)?;
        let mut guard = self.active.lock().await;

        if guard.is_none() {
            *guard = Some(self.open().await?);
        }

        let needs_rotation = guard
            .as_ref()
            .is_some_and(|active| active.size >= self.config.max_size);
        if needs_rotation {
            if let Some(active) = guard.take() {
                active.file.sync_all().await?;
            }
            self.rotate().await?;
            *guard = Some(self.open().await?);
        }

        let Some(active) = guard.as_mut() else {
            return Err(LogPipelineError::Output {
                name: self.state.name.clone(),
                reason: "file not open".to_owned(),
            });
        };
        active.file.write_all(&payload).await?;
        active.file.sync_all().await?;
        active.size += payload.len() as u64;
        Ok(payload.len())
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), LogPipelineError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl Output for FileOutput {
    fn name(&self) -> &str {
        &self.state.name
    }

    fn write<'a>(&'a self, entries: &'a [LogEntry]) -> BoxFuture<'a, Result<(), LogPipelineError>> {
        Box::pin(async move {
            if entries.is_empty() {
                return Ok(());
            }
            match self.write_batch(entries).await {
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
            if let Some(mut active) = self.active.lock().await.take() {
                active.file.flush().await?;
                active.file.sync_all().await?;
            }
            Ok(())
        })
    }

    fn stats(&self) -> OutputStats {
        self.state.snapshot()
    }
}
