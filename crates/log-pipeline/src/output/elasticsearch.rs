//! Elasticsearch 출력 -- Bulk API
//!
//! 배치를 NDJSON bulk 본문으로 만들어 `<host>/_bulk`에 POST합니다.
//! 엔트리마다 액션 줄과 문서 줄 두 줄을 씁니다.
//!
//! ```text
//! {"index":{"_index":"logs-2024.01.15"}}
//! {"timestamp":"2024-01-15T12:00:00Z","level":"error","message":"..."}
//! ```
//!
//! - `batch_size`보다 큰 배치는 여러 요청으로 나눕니다.
//! - 요청마다 `hosts`를 라운드로빈으로 사용합니다.
//! - 상태 코드 400 이상은 쓰기 실패이며 재시도하지 않습니다.
//! - 2xx 응답의 `"errors": true`는 경고와 에러 통계로만 기록합니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use logweave_core::config::ComponentConfig;
use logweave_core::pipeline::BoxFuture;
use logweave_core::types::LogEntry;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Output, OutputState, OutputStats, validate_time_format};
use crate::error::LogPipelineError;
use crate::registry::decode_options;

/// 응답 본문을 에러 메시지에 포함할 때의 최대 길이
const MAX_ERROR_BODY: usize = 512;

/// Elasticsearch 출력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchOutputConfig {
    /// 클러스터 주소 목록 (예: `http://localhost:9200`)
    pub hosts: Vec<String>,
    /// 고정 인덱스 이름
    #[serde(default = "default_index")]
    pub index: String,
    /// 엔트리 타임스탬프로 포맷하는 인덱스 패턴 (strftime, 예: `logs-%Y.%m.%d`)
    #[serde(default)]
    pub index_pattern: Option<String>,
    /// basic auth 사용자
    #[serde(default)]
    pub username: Option<String>,
    /// basic auth 비밀번호
    #[serde(default)]
    pub password: Option<String>,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// bulk 요청당 최대 문서 수
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// 호환성을 위해 받지만 사용하지 않음 (파이프라인 플러시가 주기를 결정)
    #[serde(default)]
    pub flush_interval_secs: Option<u64>,
    /// 추가 HTTP 헤더
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_index() -> String {
    "logs".to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    1000
}

impl ElasticsearchOutputConfig {
    /// 호스트 목록만 지정한 기본 설정을 생성합니다.
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            hosts,
            index: default_index(),
            index_pattern: None,
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
            flush_interval_secs: None,
            headers: HashMap::new(),
        }
    }
}

/// Elasticsearch bulk 출력
pub struct ElasticsearchOutput {
    state: OutputState,
    config: ElasticsearchOutputConfig,
    client: reqwest::Client,
    next_host: AtomicUsize,
}

impl ElasticsearchOutput {
    /// 새 Elasticsearch 출력을 생성합니다.
    pub fn new(
        name: impl Into<String>,
        config: ElasticsearchOutputConfig,
    ) -> Result<Self, LogPipelineError> {
        let name = name.into();
        let invalid = |field: &str, reason: String| LogPipelineError::Config {
            field: format!("{name}.options.{field}"),
            reason,
        };

        if config.hosts.is_empty() || config.hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(invalid("hosts", "at least one non-empty host is required".to_owned()));
        }
        if config.batch_size == 0 {
            return Err(invalid("batch_size", "must be greater than 0".to_owned()));
        }
        if config.timeout_secs == 0 {
            return Err(invalid("timeout_secs", "must be greater than 0".to_owned()));
        }
        if let Some(pattern) = &config.index_pattern {
            validate_time_format(format!("{name}.options.index_pattern"), pattern)?;
        }
        if config.flush_interval_secs.is_some() {
            warn!(
                output = %name,
                "flush_interval_secs is ignored, the pipeline flush interval applies"
            );
        }

        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| invalid("headers", format!("invalid header name '{key}': {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| invalid("headers", format!("invalid value for '{key}': {e}")))?;
            headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            state: OutputState::new(&name),
            config,
            client,
            next_host: AtomicUsize::new(0),
        })
    }

    /// 구성 요소 선언에서 Elasticsearch 출력을 생성합니다.
    pub fn from_component(component: &ComponentConfig) -> Result<Self, LogPipelineError> {
        let config: ElasticsearchOutputConfig = decode_options(component)?;
        Self::new(component.display_name(), config)
    }

    /// 엔트리가 들어갈 인덱스 이름
    pub fn index_for(&self, entry: &LogEntry) -> String {
        match &self.config.index_pattern {
            Some(pattern) => entry.timestamp.format(pattern).to_string(),
            None => self.config.index.clone(),
        }
    }

    /// NDJSON bulk 본문을 생성합니다.
    pub fn build_bulk_body(&self, entries: &[LogEntry]) -> Result<String, LogPipelineError> {
        let mut body = String::with_capacity(entries.len() * 256);
        for entry in entries {
            let action = serde_json::json!({ "index": { "_index": self.index_for(entry) } });
            body.push_str(&serde_json::to_string(&action)?);
            body.push('\n');
            body.push_str(&entry.to_json_line()?);
            body.push('\n');
        }
        Ok(body)
    }

    fn pick_host(&self) -> &str {
        let index = self.next_host.fetch_add(1, Ordering::Relaxed) % self.config.hosts.len();
        self.config.hosts[index].trim_end_matches('/')
    }

    /// bulk 요청 한 건을 보냅니다.
    async fn send_bulk(&self, entries: &[LogEntry]) -> Result<usize, LogPipelineError> {
        let body = self.build_bulk_body(entries)?;
        let bytes = body.len();
        let url = format!("{}/_bulk", self.pick_host());

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.as_u16() >= 400 {
            let mut snippet = text;
            if snippet.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !snippet.is_char_boundary(cut) {
                    cut -= 1;
                }
                snippet.truncate(cut);
            }
            return Err(LogPipelineError::Output {
                name: self.state.name.clone(),
                reason: format!("bulk request to {url} returned {status}: {snippet}"),
            });
        }

        let has_item_errors = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("errors").and_then(serde_json::Value::as_bool))
            .unwrap_or(false);
        if has_item_errors {
            let err = LogPipelineError::Output {
                name: self.state.name.clone(),
                reason: "bulk response reported item errors".to_owned(),
            };
            warn!(output = %self.state.name, url = %url, "bulk response reported item errors");
            self.state.record_error(&err);
        }

        debug!(output = %self.state.name, url = %url, documents = entries.len(), "bulk request sent");
        Ok(bytes)
    }
}

impl Output for ElasticsearchOutput {
    fn name(&self) -> &str {
        &self.state.name
    }

    fn write<'a>(&'a self, entries: &'a [LogEntry]) -> BoxFuture<'a, Result<(), LogPipelineError>> {
        Box::pin(async move {
            for chunk in entries.chunks(self.config.batch_size) {
                match self.send_bulk(chunk).await {
                    Ok(bytes) => self.state.record_success(chunk.len(), bytes),
                    Err(e) => {
                        let err = match e {
                            LogPipelineError::Output { .. } => e,
                            other => LogPipelineError::Output {
                                name: self.state.name.clone(),
                                reason: other.to_string(),
                            },
                        };
                        self.state.record_error(&err);
                        return Err(err);
                    }
                }
            }
            Ok(())
        })
    }

    fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.state.set_enabled(enabled);
    }

    fn close(&self) -> BoxFuture<'_, Result<(), LogPipelineError>> {
        Box::pin(async { Ok(()) })
    }

    fn stats(&self) -> OutputStats {
        self.state.snapshot()
    }
}
