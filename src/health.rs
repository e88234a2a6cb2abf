// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Health check endpoints and monitoring utilities

use crate::constants::protocol;
use crate::errors::PipelineError;
use crate::pipeline::ExercisePipeline;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::info;

/// Overall health status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: HealthStatus,
    /// Service information
    pub service: ServiceInfo,
    /// Individual component checks
    pub checks: Vec<ComponentHealth>,
    /// Response timestamp
    pub timestamp: u64,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

/// Service information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
}

/// Individual component health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: String,
    pub duration_ms: u64,
}

/// Health checker for the exercise bridge server
pub struct HealthChecker {
    start_time: Instant,
    pipeline: Arc<ExercisePipeline>,
    cached_status: RwLock<Option<(HealthResponse, Instant)>>,
    cache_ttl: Duration,
}

impl HealthChecker {
    pub fn new(pipeline: Arc<ExercisePipeline>) -> Self {
        Self {
            start_time: Instant::now(),
            pipeline,
            cached_status: RwLock::new(None),
            cache_ttl: Duration::from_secs(30),
        }
    }

    fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            name: protocol::SERVER_NAME.to_string(),
            version: protocol::SERVER_VERSION.to_string(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "unknown".to_string()),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Fast check suitable for liveness probes.
    pub async fn basic_health(&self) -> HealthResponse {
        let start = Instant::now();

        let checks = vec![ComponentHealth {
            name: "service".to_string(),
            status: HealthStatus::Healthy,
            message: "Service is running".to_string(),
            duration_ms: 0,
        }];

        HealthResponse {
            status: HealthStatus::Healthy,
            service: self.service_info(),
            checks,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            response_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Comprehensive check: store reachability and permission-gate state.
    pub async fn comprehensive_health(&self) -> HealthResponse {
        let start = Instant::now();

        {
            let cached = self.cached_status.read().await;
            if let Some((response, cached_at)) = cached.as_ref() {
                if cached_at.elapsed() < self.cache_ttl {
                    return response.clone();
                }
            }
        }

        info!("Performing comprehensive health check");

        let mut checks = Vec::new();
        checks.push(self.check_gate().await);

        let overall_status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let response = HealthResponse {
            status: overall_status,
            service: self.service_info(),
            checks,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            response_time_ms: start.elapsed().as_millis() as u64,
        };

        {
            let mut cached = self.cached_status.write().await;
            *cached = Some((response.clone(), Instant::now()));
        }

        response
    }

    /// One check covering the whole query precondition: store present and
    /// every required scope decided. An incomplete gate is degraded rather
    /// than unhealthy; the bridge can still serve `requestPermissions`.
    async fn check_gate(&self) -> ComponentHealth {
        let start = Instant::now();

        let (status, message) = match self.pipeline.check_permission_gate().await {
            Ok(()) => (
                HealthStatus::Healthy,
                "Health store reachable, all scopes decided".to_string(),
            ),
            Err(PipelineError::AuthorizationIncomplete { .. }) => (
                HealthStatus::Degraded,
                "Health store reachable, scopes awaiting user decision".to_string(),
            ),
            Err(e) => (HealthStatus::Unhealthy, format!("Gate check failed: {}", e)),
        };

        ComponentHealth {
            name: "health_store".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Readiness (Kubernetes-style): can we serve exercise queries now.
    pub async fn readiness(&self) -> HealthResponse {
        let mut response = self.basic_health().await;

        let gate_check = self.check_gate().await;
        response.status = match gate_check.status {
            HealthStatus::Unhealthy => HealthStatus::Unhealthy,
            _ => HealthStatus::Healthy,
        };
        response.checks.push(gate_check);

        response
    }

    /// Liveness: just confirms the service loop is alive.
    pub async fn liveness(&self) -> HealthResponse {
        self.basic_health().await
    }
}

/// Health check middleware for HTTP endpoints
pub mod middleware {
    use super::*;
    use warp::{Filter, Reply};

    /// Create health check routes
    pub fn routes(
        health_checker: Arc<HealthChecker>,
    ) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
        let health = warp::path("health")
            .and(warp::get())
            .and(with_health_checker(health_checker.clone()))
            .and_then(health_handler);

        let ready = warp::path("ready")
            .and(warp::get())
            .and(with_health_checker(health_checker.clone()))
            .and_then(readiness_handler);

        let live = warp::path("live")
            .and(warp::get())
            .and(with_health_checker(health_checker))
            .and_then(liveness_handler);

        health.or(ready).or(live)
    }

    fn with_health_checker(
        health_checker: Arc<HealthChecker>,
    ) -> impl Filter<Extract = (Arc<HealthChecker>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || health_checker.clone())
    }

    async fn health_handler(
        health_checker: Arc<HealthChecker>,
    ) -> Result<impl Reply, warp::Rejection> {
        let response = health_checker.comprehensive_health().await;
        let status_code = match response.status {
            HealthStatus::Healthy | HealthStatus::Degraded => warp::http::StatusCode::OK,
            HealthStatus::Unhealthy => warp::http::StatusCode::SERVICE_UNAVAILABLE,
        };

        Ok(warp::reply::with_status(
            warp::reply::json(&response),
            status_code,
        ))
    }

    async fn readiness_handler(
        health_checker: Arc<HealthChecker>,
    ) -> Result<impl Reply, warp::Rejection> {
        let response = health_checker.readiness().await;
        let status_code = match response.status {
            HealthStatus::Healthy => warp::http::StatusCode::OK,
            _ => warp::http::StatusCode::SERVICE_UNAVAILABLE,
        };

        Ok(warp::reply::with_status(
            warp::reply::json(&response),
            status_code,
        ))
    }

    async fn liveness_handler(
        health_checker: Arc<HealthChecker>,
    ) -> Result<impl Reply, warp::Rejection> {
        let response = health_checker.liveness().await;
        Ok(warp::reply::json(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::StoreCapabilities;
    use crate::store::memory::MemoryStore;
    use crate::store::{AuthorizationStatus, Scope};

    fn checker(store: MemoryStore) -> HealthChecker {
        let pipeline = ExercisePipeline::new(
            Arc::new(store),
            StoreCapabilities::for_platform_version("17.0"),
        );
        HealthChecker::new(Arc::new(pipeline))
    }

    #[tokio::test]
    async fn test_basic_health_check() {
        let response = checker(MemoryStore::new()).basic_health().await;

        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.service.name, "exercise-bridge-server");
        assert!(!response.checks.is_empty());
    }

    #[tokio::test]
    async fn test_comprehensive_health_with_decided_scopes() {
        let response = checker(MemoryStore::new()).comprehensive_health().await;

        assert_eq!(response.status, HealthStatus::Healthy);
        assert!(response.checks.iter().any(|c| c.name == "health_store"));
    }

    #[tokio::test]
    async fn test_health_degraded_on_undecided_scope() {
        let store = MemoryStore::new()
            .with_status(Scope::HeartRate, AuthorizationStatus::NotDetermined);
        let response = checker(store).comprehensive_health().await;

        assert_eq!(response.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_health_unhealthy_when_store_unavailable() {
        let response = checker(MemoryStore::new().unavailable())
            .comprehensive_health()
            .await;

        assert_eq!(response.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_readiness_includes_gate_check() {
        let response = checker(MemoryStore::new()).readiness().await;
        assert!(response.checks.iter().any(|c| c.name == "health_store"));
        assert_eq!(response.status, HealthStatus::Healthy);
    }
}
