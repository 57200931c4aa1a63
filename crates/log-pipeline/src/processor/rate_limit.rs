//! 속도 제한 프로세서
//!
//! 그룹 키(`group_by`로 해석한 값, 없으면 `"default"`)마다 고정 윈도우 카운터를 둡니다.
//! 윈도우가 지나면 카운터가 0으로 돌아갑니다. 한도를 넘은 엔트리는
//! `drop`이면 모두 드롭하고, `sample`이면 10개 중 1개만 통과시킵니다.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use logweave_core::config::ComponentConfig;
use logweave_core::types::LogEntry;
use serde::{Deserialize, Serialize};

use super::{Processor, resolve_field};
use crate::error::LogPipelineError;
use crate::registry::decode_options;

/// 샘플링 모드에서 통과시키는 간격
const SAMPLE_EVERY: u64 = 10;

/// 그룹 키가 없을 때 사용하는 키
const DEFAULT_GROUP: &str = "default";

/// 이 수를 넘으면 새 그룹을 만들기 전에 만료된 윈도우를 정리합니다.
const MAX_TRACKED_GROUPS: usize = 10_000;

/// 한도 초과 시 동작
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitAction {
    /// 모두 드롭
    #[default]
    Drop,
    /// 10개 중 1개 통과
    Sample,
}

/// 속도 제한 옵션
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// 윈도우당 허용 엔트리 수
    pub rate: u64,
    /// 윈도우 길이 (초)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// 그룹 키 필드
    #[serde(default)]
    pub group_by: Option<String>,
    /// 한도 초과 동작
    #[serde(default)]
    pub action: RateLimitAction,
}

fn default_window_secs() -> u64 {
    60
}

/// 그룹별 윈도우 상태
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    started: Instant,
}

/// 속도 제한 프로세서
pub struct RateLimitProcessor {
    name: String,
    rate: u64,
    window: Duration,
    group_by: Option<String>,
    action: RateLimitAction,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimitProcessor {
    /// 새 속도 제한 프로세서를 생성합니다.
    pub fn new(
        name: impl Into<String>,
        rate: u64,
        window: Duration,
        group_by: Option<String>,
        action: RateLimitAction,
    ) -> Self {
        Self {
            name: name.into(),
            rate,
            window,
            group_by,
            action,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// 구성 요소 선언에서 속도 제한 프로세서를 생성합니다.
    pub fn from_component(component: &ComponentConfig) -> Result<Self, LogPipelineError> {
        let config: RateLimitConfig = decode_options(component)?;
        if config.window_secs == 0 {
            return Err(LogPipelineError::Config {
                field: format!("{}.options.window_secs", component.display_name()),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(Self::new(
            component.display_name(),
            config.rate,
            Duration::from_secs(config.window_secs),
            config.group_by,
            config.action,
        ))
    }

    /// 현재 추적 중인 그룹 수를 반환합니다.
    pub fn group_count(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn group_key(&self, entry: &LogEntry) -> String {
        self.group_by
            .as_deref()
            .and_then(|field| resolve_field(entry, field))
            .map(|value| value.as_string().into_owned())
            .unwrap_or_else(|| DEFAULT_GROUP.to_owned())
    }

    /// 주어진 시각 기준으로 엔트리 통과 여부를 결정합니다.
    pub(crate) fn process_at(&self, entry: LogEntry, now: Instant) -> Option<LogEntry> {
        let key = self.group_key(&entry);
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        if windows.len() >= MAX_TRACKED_GROUPS && !windows.contains_key(&key) {
            windows.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        }
        let window = windows.entry(key).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.saturating_duration_since(window.started) >= self.window {
            window.count = 0;
            window.started = now;
        }

        if window.count < self.rate {
            window.count += 1;
            return Some(entry);
        }

        match self.action {
            RateLimitAction::Drop => None,
            RateLimitAction::Sample => {
                let keep = window.count % SAMPLE_EVERY == 0;
                window.count += 1;
                keep.then_some(entry)
            }
        }
    }
}

impl Processor for RateLimitProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, entry: LogEntry) -> Option<LogEntry> {
        self.process_at(entry, Instant::now())
    }
}
