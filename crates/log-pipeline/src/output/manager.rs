//! 출력 관리자 -- 이름 기반 출력 레지스트리와 팬아웃

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use logweave_core::types::LogEntry;
use tracing::{debug, warn};

use super::{Output, OutputStats};
use crate::error::LogPipelineError;

/// 출력 관리자
///
/// 쓰기 시 레지스트리 스냅샷을 뜬 뒤 잠금 없이 각 출력을 호출합니다.
/// 한 출력의 실패가 다른 출력의 쓰기를 막지 않으며, 모든 실패는
/// [`LogPipelineError::OutputsFailed`] 하나로 모입니다.
pub struct OutputManager {
    outputs: RwLock<HashMap<String, Arc<dyn Output>>>,
    write_timeout: Duration,
}

impl OutputManager {
    /// 출력 호출당 타임아웃을 지정해 새 관리자를 생성합니다.
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            outputs: RwLock::new(HashMap::new()),
            write_timeout,
        }
    }

    /// 출력을 등록합니다. 같은 이름이 이미 있으면 에러를 반환합니다.
    pub fn add(&self, output: Arc<dyn Output>) -> Result<(), LogPipelineError> {
        let mut outputs = self.outputs.write().unwrap_or_else(|e| e.into_inner());
        let name = output.name().to_owned();
        if outputs.contains_key(&name) {
            return Err(LogPipelineError::Config {
                field: "outputs".to_owned(),
                reason: format!("duplicate output name '{name}'"),
            });
        }
        debug!(output = %name, "output registered");
        outputs.insert(name, output);
        Ok(())
    }

    /// 출력을 제거하고 반환합니다.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Output>> {
        self.outputs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
    }

    /// 이름으로 출력을 조회합니다.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Output>> {
        self.outputs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// 등록된 출력 이름 (정렬됨)
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .outputs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// 등록된 출력 수
    pub fn len(&self) -> usize {
        self.outputs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 등록된 출력이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 이름순으로 정렬된 출력 스냅샷
    fn snapshot(&self) -> Vec<Arc<dyn Output>> {
        let mut outputs: Vec<Arc<dyn Output>> = self
            .outputs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        outputs.sort_by(|a, b| a.name().cmp(b.name()));
        outputs
    }

    /// 활성화된 모든 출력에 배치를 기록합니다.
    pub async fn write_to_all(&self, entries: &[LogEntry]) -> Result<(), LogPipelineError> {
        let targets: Vec<Arc<dyn Output>> = self
            .snapshot()
            .into_iter()
            .filter(|output| output.is_enabled())
            .collect();
        self.write_each(&targets, entries).await
    }

    /// 지정한 이름의 활성화된 출력에만 배치를 기록합니다.
    ///
    /// 등록되지 않은 이름은 경고만 남깁니다.
    pub async fn write_to_specific(
        &self,
        names: &[&str],
        entries: &[LogEntry],
    ) -> Result<(), LogPipelineError> {
        let mut targets = Vec::with_capacity(names.len());
        for name in names {
            match self.get(name) {
                Some(output) if output.is_enabled() => targets.push(output),
                Some(_) => debug!(output = %name, "output disabled, skipping"),
                None => warn!(output = %name, "unknown output, skipping"),
            }
        }
        self.write_each(&targets, entries).await
    }

    async fn write_each(
        &self,
        targets: &[Arc<dyn Output>],
        entries: &[LogEntry],
    ) -> Result<(), LogPipelineError> {
        let mut failures = Vec::new();

        for output in targets {
            let result = tokio::time::timeout(self.write_timeout, output.write(entries)).await;
            let error = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(_) => LogPipelineError::Timeout {
                    operation: format!("write to output '{}'", output.name()),
                    millis: self.write_timeout.as_millis(),
                },
            };
            warn!(output = %output.name(), error = %error, entries = entries.len(), "output write failed");
            failures.push(failure_message(output.name(), &error));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LogPipelineError::OutputsFailed { failures })
        }
    }

    /// 모든 출력을 닫습니다. 실패는 모아서 반환합니다.
    pub async fn close(&self) -> Result<(), LogPipelineError> {
        let mut failures = Vec::new();
        for output in self.snapshot() {
            if let Err(e) = output.close().await {
                warn!(output = %output.name(), error = %e, "output close failed");
                failures.push(failure_message(output.name(), &e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LogPipelineError::OutputsFailed { failures })
        }
    }

    /// 모든 출력의 통계 (이름순)
    pub fn stats(&self) -> Vec<OutputStats> {
        self.snapshot().iter().map(|output| output.stats()).collect()
    }
}

fn failure_message(name: &str, error: &LogPipelineError) -> String {
    match error {
        LogPipelineError::Output { reason, .. } => format!("{name}: {reason}"),
        other => format!("{name}: {other}"),
    }
}
