//! 파이프라인 trait -- 생명주기 관리 확장 포인트 정의

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::LogweaveError;

/// `Send` 가능한 boxed future
///
/// RPITIT를 쓰는 trait은 `dyn`으로 사용할 수 없으므로,
/// trait object가 필요한 확장 포인트(수집기, 출력 등)는 이 타입을 반환합니다.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 모듈 건강 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 성능/신뢰성 저하
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 시작/정지 생명주기를 가진 파이프라인 trait
///
/// 데몬은 이 trait을 통해 모든 파이프라인을 동일한 방식으로 관리합니다.
pub trait Pipeline: Send + Sync {
    /// 파이프라인을 시작합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), LogweaveError>> + Send;

    /// 파이프라인을 정지합니다. 버퍼에 남은 데이터는 플러시됩니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), LogweaveError>> + Send;

    /// 건강 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_predicates() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(!HealthStatus::Degraded("slow".to_owned()).is_healthy());
        assert!(HealthStatus::Unhealthy("stopped".to_owned()).is_unhealthy());
    }

    #[test]
    fn health_status_display() {
        assert_eq!(
            HealthStatus::Degraded("buffer 95%".to_owned()).to_string(),
            "degraded: buffer 95%"
        );
    }
}
