// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory health store
//!
//! Backs development runs (seeded from a JSON file) and tests (built with
//! the fluent helpers below). Supports per-query fault injection so tests
//! can exercise the pipeline's degrade-to-default behavior.

use super::{AuthorizationStatus, HealthStore, MetricKind, Scope};
use crate::activity::{ActivityType, DistanceKind};
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One timestamped metric reading.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricEvent {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// JSON seed shape for development data.
#[derive(Debug, Default, Deserialize)]
struct MemorySeed {
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    energy: Vec<MetricEvent>,
    #[serde(default)]
    distance: HashMap<DistanceKind, Vec<MetricEvent>>,
    #[serde(default)]
    heart_rate: Vec<MetricEvent>,
}

#[derive(Debug)]
pub struct MemoryStore {
    available: bool,
    default_status: AuthorizationStatus,
    statuses: RwLock<HashMap<Scope, AuthorizationStatus>>,
    sessions: Vec<Session>,
    energy: Vec<MetricEvent>,
    distance: HashMap<DistanceKind, Vec<MetricEvent>>,
    heart_rate: Vec<MetricEvent>,
    fail_sessions: bool,
    fail_energy: bool,
    fail_distance: bool,
    fail_heart_rate: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            available: true,
            default_status: AuthorizationStatus::Granted,
            statuses: RwLock::new(HashMap::new()),
            sessions: Vec::new(),
            energy: Vec::new(),
            distance: HashMap::new(),
            heart_rate: Vec::new(),
            fail_sessions: false,
            fail_energy: false,
            fail_distance: false,
            fail_heart_rate: false,
        }
    }

    /// Load a store from a JSON seed file.
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read seed file: {}", path.as_ref().display())
        })?;
        let seed: MemorySeed =
            serde_json::from_str(&content).context("Failed to parse seed file")?;

        let mut store = Self::new();
        store.sessions = seed.sessions;
        store.energy = seed.energy;
        store.distance = seed.distance;
        store.heart_rate = seed.heart_rate;
        Ok(store)
    }

    /// Add a session with a generated id.
    pub fn with_session(
        mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        activity_type: ActivityType,
    ) -> Self {
        self.sessions.push(Session {
            id: Uuid::new_v4().to_string(),
            start_time: start,
            end_time: end,
            activity_type,
        });
        self
    }

    pub fn with_energy(mut self, time: DateTime<Utc>, kcal: f64) -> Self {
        self.energy.push(MetricEvent { time, value: kcal });
        self
    }

    pub fn with_distance(
        mut self,
        kind: DistanceKind,
        time: DateTime<Utc>,
        meters: f64,
    ) -> Self {
        self.distance
            .entry(kind)
            .or_default()
            .push(MetricEvent { time, value: meters });
        self
    }

    pub fn with_heart_rate(mut self, time: DateTime<Utc>, bpm: f64) -> Self {
        self.heart_rate.push(MetricEvent { time, value: bpm });
        self
    }

    pub fn with_status(mut self, scope: Scope, status: AuthorizationStatus) -> Self {
        self.statuses.get_mut().insert(scope, status);
        self
    }

    pub fn with_default_status(mut self, status: AuthorizationStatus) -> Self {
        self.default_status = status;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing_sessions(mut self) -> Self {
        self.fail_sessions = true;
        self
    }

    pub fn failing_energy(mut self) -> Self {
        self.fail_energy = true;
        self
    }

    pub fn failing_distance(mut self) -> Self {
        self.fail_distance = true;
        self
    }

    pub fn failing_heart_rate(mut self) -> Self {
        self.fail_heart_rate = true;
        self
    }

    fn sum_in_range(
        events: &[MetricEvent],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> f64 {
        events
            .iter()
            .filter(|e| e.time >= start && e.time < end)
            .map(|e| e.value)
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthStore for MemoryStore {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn authorization_status(&self, scope: Scope) -> Result<AuthorizationStatus> {
        let statuses = self.statuses.read().await;
        Ok(*statuses.get(&scope).unwrap_or(&self.default_status))
    }

    async fn request_authorization(&self, scopes: &[Scope]) -> Result<()> {
        let mut statuses = self.statuses.write().await;
        for scope in scopes {
            statuses.insert(*scope, AuthorizationStatus::Granted);
        }
        Ok(())
    }

    async fn sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        if self.fail_sessions {
            return Err(anyhow::anyhow!("injected session query failure"));
        }

        let mut hits: Vec<Session> = self
            .sessions
            .iter()
            .filter(|s| s.start_time < end && s.end_time > start)
            .cloned()
            .collect();
        // Newest first; stable sort keeps insertion order on ties.
        hits.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(hits)
    }

    async fn cumulative_sum(
        &self,
        metric: MetricKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64> {
        match metric {
            MetricKind::ActiveEnergy => {
                if self.fail_energy {
                    return Err(anyhow::anyhow!("injected energy query failure"));
                }
                Ok(Self::sum_in_range(&self.energy, start, end))
            }
            MetricKind::Distance(kind) => {
                if self.fail_distance {
                    return Err(anyhow::anyhow!("injected distance query failure"));
                }
                Ok(self
                    .distance
                    .get(&kind)
                    .map(|events| Self::sum_in_range(events, start, end))
                    .unwrap_or(0.0))
            }
        }
    }

    async fn heart_rate_series(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<f64>> {
        if self.fail_heart_rate {
            return Err(anyhow::anyhow!("injected heart rate query failure"));
        }

        let mut readings: Vec<&MetricEvent> = self
            .heart_rate
            .iter()
            .filter(|e| e.time >= start && e.time < end)
            .collect();
        readings.sort_by_key(|e| e.time);
        Ok(readings.into_iter().map(|e| e.value).collect())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn test_sessions_window_intersection() {
        let store = MemoryStore::new()
            .with_session(at(6, 0), at(7, 0), ActivityType(56))
            .with_session(at(9, 0), at(10, 0), ActivityType(8))
            .with_session(at(12, 0), at(13, 0), ActivityType(79));

        // Window clips the first and last sessions out.
        let hits = store.sessions_between(at(8, 0), at(11, 0)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].activity_type, ActivityType(8));
    }

    #[tokio::test]
    async fn test_sessions_sorted_newest_first() {
        let store = MemoryStore::new()
            .with_session(at(6, 0), at(7, 0), ActivityType(56))
            .with_session(at(9, 0), at(10, 0), ActivityType(8));

        let hits = store.sessions_between(at(0, 0), at(23, 0)).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].start_time > hits[1].start_time);
    }

    #[tokio::test]
    async fn test_cumulative_sum_respects_range() {
        let store = MemoryStore::new()
            .with_energy(at(6, 10), 100.0)
            .with_energy(at(6, 50), 150.0)
            .with_energy(at(8, 0), 999.0);

        let sum = store
            .cumulative_sum(MetricKind::ActiveEnergy, at(6, 0), at(7, 0))
            .await
            .unwrap();
        assert_eq!(sum, 250.0);
    }

    #[tokio::test]
    async fn test_distance_sum_by_kind() {
        let store = MemoryStore::new()
            .with_distance(DistanceKind::WalkingRunning, at(6, 30), 5000.0)
            .with_distance(DistanceKind::Cycling, at(6, 30), 20000.0);

        let running = store
            .cumulative_sum(
                MetricKind::Distance(DistanceKind::WalkingRunning),
                at(6, 0),
                at(7, 0),
            )
            .await
            .unwrap();
        assert_eq!(running, 5000.0);

        let swimming = store
            .cumulative_sum(
                MetricKind::Distance(DistanceKind::Swimming),
                at(6, 0),
                at(7, 0),
            )
            .await
            .unwrap();
        assert_eq!(swimming, 0.0);
    }

    #[tokio::test]
    async fn test_heart_rate_series_chronological() {
        let store = MemoryStore::new()
            .with_heart_rate(at(6, 20), 130.0)
            .with_heart_rate(at(6, 10), 110.0)
            .with_heart_rate(at(6, 30), 140.0);

        let series = store.heart_rate_series(at(6, 0), at(7, 0)).await.unwrap();
        assert_eq!(series, vec![110.0, 130.0, 140.0]);
    }

    #[tokio::test]
    async fn test_request_authorization_grants_scopes() {
        let store = MemoryStore::new().with_default_status(AuthorizationStatus::NotDetermined);
        assert_eq!(
            store.authorization_status(Scope::HeartRate).await.unwrap(),
            AuthorizationStatus::NotDetermined
        );

        store
            .request_authorization(&[Scope::HeartRate, Scope::ExerciseSessions])
            .await
            .unwrap();
        assert_eq!(
            store.authorization_status(Scope::HeartRate).await.unwrap(),
            AuthorizationStatus::Granted
        );
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryStore::new().failing_heart_rate();
        assert!(store.heart_rate_series(at(0, 0), at(23, 0)).await.is_err());
        // Other metrics are unaffected.
        assert!(store
            .cumulative_sum(MetricKind::ActiveEnergy, at(0, 0), at(23, 0))
            .await
            .is_ok());
    }

    #[test]
    fn test_seed_file_parsing() {
        let seed = r#"{
            "sessions": [
                {"id": "s-1", "start_time": "2024-03-01T07:00:00Z",
                 "end_time": "2024-03-01T07:30:00Z", "activity_type": 56}
            ],
            "energy": [{"time": "2024-03-01T07:10:00Z", "value": 120.0}],
            "distance": {
                "walking_running": [{"time": "2024-03-01T07:15:00Z", "value": 2500.0}]
            },
            "heart_rate": [{"time": "2024-03-01T07:05:00Z", "value": 115.0}]
        }"#;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        fs::write(&path, seed).unwrap();

        let store = MemoryStore::from_seed_file(&path).expect("seed should parse");
        assert_eq!(store.sessions.len(), 1);
        assert_eq!(store.sessions[0].activity_type, ActivityType(56));
        assert_eq!(store.energy.len(), 1);
        assert_eq!(
            store.distance[&DistanceKind::WalkingRunning][0].value,
            2500.0
        );
    }
}
