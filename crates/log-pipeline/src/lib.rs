#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: 파일 감시 수집기
//! - [`parser`]: 수집기가 사용하는 라인 파서 (json, nginx/apache, text)
//! - [`processor`]: 필터, 보강, 파싱, 변환, 속도 제한 프로세서와 체인
//! - [`buffer`]: 인메모리 버퍼와 플러시 신호
//! - [`output`]: 파일, 콘솔, Elasticsearch 출력과 출력 관리자
//! - [`registry`]: 설정 선언 → 구성 요소 생성자 테이블
//! - [`pipeline`]: 단일 파이프라인 오케스트레이션 (Pipeline trait 구현)
//! - [`manager`]: 여러 파이프라인의 생명주기 관리
//! - [`config`]: 파이프라인 런타임 설정
//! - [`error`]: 도메인 에러 타입

pub mod buffer;
pub mod config;
pub mod error;
pub mod manager;
pub mod pipeline;
pub mod registry;

pub mod collector;
pub mod output;
pub mod parser;
pub mod processor;

// --- 주요 타입 re-export ---

// 파이프라인
pub use manager::PipelineManager;
pub use pipeline::{LogPipeline, LogPipelineBuilder, PipelineState, PipelineStats};

// 설정
pub use config::{DropPolicy, PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::LogPipelineError;

// 레지스트리
pub use registry::ComponentRegistry;

// 수집기
pub use collector::{Collector, CollectorStats, FileCollector};

// 프로세서
pub use processor::{Processor, ProcessorChain};

// 출력
pub use output::{Output, OutputManager, OutputStats};

// 버퍼
pub use buffer::LogBuffer;
