// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Abstract health-data-store interface and its backends
//!
//! The pipeline never talks to a platform SDK directly; it goes through
//! [`HealthStore`], which exposes exactly the capability surface the
//! pipeline needs: an availability check, per-scope authorization status, an
//! authorization request, a time-ranged session query, a time-ranged
//! cumulative-sum query, and a time-ranged ordered heart-rate sample query.

use crate::activity::DistanceKind;
use crate::models::Session;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod agent;
pub mod memory;

/// A single health-data read permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    ExerciseSessions,
    ActiveEnergy,
    HeartRate,
    Distance(DistanceKind),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::ExerciseSessions => f.write_str("exercise_sessions"),
            Scope::ActiveEnergy => f.write_str("active_energy"),
            Scope::HeartRate => f.write_str("heart_rate"),
            Scope::Distance(kind) => write!(f, "distance_{}", kind.as_str()),
        }
    }
}

/// Authorization decision state for one scope.
///
/// `Denied` still counts as decided: the pipeline proceeds and degrades to
/// empty/zero output rather than blocking on a user who said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Granted,
}

impl AuthorizationStatus {
    pub fn is_decided(self) -> bool {
        !matches!(self, AuthorizationStatus::NotDetermined)
    }
}

/// Metric selector for cumulative-sum queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    ActiveEnergy,
    Distance(DistanceKind),
}

impl MetricKind {
    /// Wire identifier used by the native agent.
    pub fn as_str(self) -> String {
        match self {
            MetricKind::ActiveEnergy => "active_energy".to_string(),
            MetricKind::Distance(kind) => format!("distance_{}", kind.as_str()),
        }
    }
}

/// Capability surface of a platform health store.
///
/// The store handle is stateless and reentrant from the pipeline's point of
/// view; concurrent sub-queries share one instance behind an `Arc`.
#[async_trait]
pub trait HealthStore: Send + Sync + fmt::Debug {
    /// Whether the health store exists and is enabled on this device.
    async fn is_available(&self) -> bool;

    /// Current authorization decision for one scope.
    async fn authorization_status(&self, scope: Scope) -> Result<AuthorizationStatus>;

    /// Trigger the platform consent flow for the given scopes. Resolves when
    /// the flow completes; does not report per-scope outcomes.
    async fn request_authorization(&self, scopes: &[Scope]) -> Result<()>;

    /// Sessions whose window intersects `[start, end)`, newest first.
    async fn sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>>;

    /// One aggregate total for a metric over `[start, end)`.
    async fn cumulative_sum(
        &self,
        metric: MetricKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64>;

    /// Time-ordered heart-rate readings (BPM) over `[start, end)`.
    async fn heart_rate_series(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<f64>>;

    fn store_name(&self) -> &'static str;
}

/// Build the configured store backend.
pub fn create_store(config: &crate::config::StoreConfig) -> Result<Arc<dyn HealthStore>> {
    match config.backend.to_lowercase().as_str() {
        "agent" => Ok(Arc::new(agent::NativeAgentStore::new(
            &config.agent_base_url,
        )?)),
        "memory" => {
            let store = match &config.seed_path {
                Some(path) => memory::MemoryStore::from_seed_file(path)?,
                None => memory::MemoryStore::new(),
            };
            Ok(Arc::new(store))
        }
        other => Err(anyhow::anyhow!(
            "Unknown store backend: {}. Currently supported: agent, memory",
            other
        )),
    }
}
