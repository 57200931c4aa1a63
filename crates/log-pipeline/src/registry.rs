//! 구성 요소 레지스트리 -- 설정 선언의 `type` 이름을 생성자에 연결합니다.
//!
//! 파이프라인은 시작 시 [`ComponentRegistry`]로 수집기, 프로세서, 출력을
//! 생성합니다. 각 생성자는 선언의 `options` 테이블을 해당 구성 요소의
//! 타입 설정으로 역직렬화하므로, 잘못된 옵션은 구성 요소 이름이 담긴
//! `Config` 에러로 실패합니다.
//!
//! # 사용 예시
//! ```ignore
//! let mut registry = ComponentRegistry::with_defaults();
//! registry.register_output("memory", |c| Ok(Arc::new(MemoryOutput::new(c.display_name()))));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use logweave_core::config::ComponentConfig;
use serde::de::DeserializeOwned;

use crate::collector::{Collector, FileCollector};
use crate::error::LogPipelineError;
use crate::output::{ConsoleOutput, ElasticsearchOutput, FileOutput, Output};
use crate::processor::{
    EnrichProcessor, FilterProcessor, ParseProcessor, Processor, RateLimitProcessor,
    TransformProcessor,
};

/// 수집기 생성자
pub type CollectorFactory =
    Arc<dyn Fn(&ComponentConfig) -> Result<Box<dyn Collector>, LogPipelineError> + Send + Sync>;

/// 프로세서 생성자
pub type ProcessorFactory =
    Arc<dyn Fn(&ComponentConfig) -> Result<Box<dyn Processor>, LogPipelineError> + Send + Sync>;

/// 출력 생성자
pub type OutputFactory =
    Arc<dyn Fn(&ComponentConfig) -> Result<Arc<dyn Output>, LogPipelineError> + Send + Sync>;

/// 구성 요소 선언의 `options`를 타입 설정으로 역직렬화합니다.
pub(crate) fn decode_options<T: DeserializeOwned>(
    component: &ComponentConfig,
) -> Result<T, LogPipelineError> {
    serde_json::from_value(serde_json::Value::Object(component.options.clone()))
        .map_err(|e| LogPipelineError::invalid_options(component.display_name(), e))
}

/// 구성 요소 타입 이름 -> 생성자 테이블
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    collectors: HashMap<String, CollectorFactory>,
    processors: HashMap<String, ProcessorFactory>,
    outputs: HashMap<String, OutputFactory>,
}

impl ComponentRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 내장 구성 요소가 모두 등록된 레지스트리를 생성합니다.
    ///
    /// - 수집기: `file`
    /// - 프로세서: `filter`, `enrich`, `parse`, `transform`, `rate_limit`
    /// - 출력: `file`, `console`, `elasticsearch`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_collector("file", |c| Ok(Box::new(FileCollector::from_component(c)?)));

        registry.register_processor("filter", |c| {
            Ok(Box::new(FilterProcessor::from_component(c)?))
        });
        registry.register_processor("enrich", |c| {
            Ok(Box::new(EnrichProcessor::from_component(c)?))
        });
        registry.register_processor("parse", |c| Ok(Box::new(ParseProcessor::from_component(c)?)));
        registry.register_processor("transform", |c| {
            Ok(Box::new(TransformProcessor::from_component(c)?))
        });
        registry.register_processor("rate_limit", |c| {
            Ok(Box::new(RateLimitProcessor::from_component(c)?))
        });

        registry.register_output("file", |c| Ok(Arc::new(FileOutput::from_component(c)?)));
        registry.register_output("console", |c| Ok(Arc::new(ConsoleOutput::from_component(c)?)));
        registry.register_output("elasticsearch", |c| {
            Ok(Arc::new(ElasticsearchOutput::from_component(c)?))
        });

        registry
    }

    /// 수집기 타입을 등록합니다. 같은 이름은 덮어씁니다.
    pub fn register_collector<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&ComponentConfig) -> Result<Box<dyn Collector>, LogPipelineError>
            + Send
            + Sync
            + 'static,
    {
        self.collectors.insert(kind.into(), Arc::new(factory));
    }

    /// 프로세서 타입을 등록합니다. 같은 이름은 덮어씁니다.
    pub fn register_processor<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&ComponentConfig) -> Result<Box<dyn Processor>, LogPipelineError>
            + Send
            + Sync
            + 'static,
    {
        self.processors.insert(kind.into(), Arc::new(factory));
    }

    /// 출력 타입을 등록합니다. 같은 이름은 덮어씁니다.
    pub fn register_output<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&ComponentConfig) -> Result<Arc<dyn Output>, LogPipelineError>
            + Send
            + Sync
            + 'static,
    {
        self.outputs.insert(kind.into(), Arc::new(factory));
    }

    /// 선언에서 수집기를 생성합니다.
    pub fn build_collector(
        &self,
        component: &ComponentConfig,
    ) -> Result<Box<dyn Collector>, LogPipelineError> {
        let factory = self
            .collectors
            .get(&component.kind)
            .ok_or_else(|| unknown("collector", component))?;
        factory(component)
    }

    /// 선언에서 프로세서를 생성합니다.
    pub fn build_processor(
        &self,
        component: &ComponentConfig,
    ) -> Result<Box<dyn Processor>, LogPipelineError> {
        let factory = self
            .processors
            .get(&component.kind)
            .ok_or_else(|| unknown("processor", component))?;
        factory(component)
    }

    /// 선언에서 출력을 생성합니다.
    pub fn build_output(
        &self,
        component: &ComponentConfig,
    ) -> Result<Arc<dyn Output>, LogPipelineError> {
        let factory = self
            .outputs
            .get(&component.kind)
            .ok_or_else(|| unknown("output", component))?;
        factory(component)
    }

    /// 등록된 수집기 타입 (정렬됨)
    pub fn collector_kinds(&self) -> Vec<&str> {
        sorted_keys(&self.collectors)
    }

    /// 등록된 프로세서 타입 (정렬됨)
    pub fn processor_kinds(&self) -> Vec<&str> {
        sorted_keys(&self.processors)
    }

    /// 등록된 출력 타입 (정렬됨)
    pub fn output_kinds(&self) -> Vec<&str> {
        sorted_keys(&self.outputs)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("collectors", &self.collector_kinds())
            .field("processors", &self.processor_kinds())
            .field("outputs", &self.output_kinds())
            .finish()
    }
}

fn unknown(category: &str, component: &ComponentConfig) -> LogPipelineError {
    LogPipelineError::UnknownComponent {
        category: category.to_owned(),
        kind: component.kind.clone(),
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}
