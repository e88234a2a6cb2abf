// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Exercise-data aggregation pipeline
//!
//! One invocation is a strict fan-out/fan-in: the permission gate runs
//! first, the session discoverer queries the store once, every discovered
//! session fans out into its own aggregation task (which itself fans out
//! into concurrent energy/distance/heart-rate sub-queries), and the result
//! assembler joins everything before serializing. No state survives the
//! invocation.

use crate::activity::StoreCapabilities;
use crate::errors::PipelineError;
use crate::models::{ExerciseRecord, MetricBundle, Session};
use crate::store::{HealthStore, MetricKind, Scope};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ExercisePipeline {
    store: Arc<dyn HealthStore>,
    capabilities: StoreCapabilities,
}

impl ExercisePipeline {
    pub fn new(store: Arc<dyn HealthStore>, capabilities: StoreCapabilities) -> Self {
        Self {
            store,
            capabilities,
        }
    }

    /// Read scopes this device needs before exercise queries can run:
    /// sessions, active energy, heart rate, and every distance kind the
    /// capability set carries.
    pub fn required_scopes(&self) -> Vec<Scope> {
        let mut scopes = vec![
            Scope::ExerciseSessions,
            Scope::ActiveEnergy,
            Scope::HeartRate,
        ];
        scopes.extend(
            self.capabilities
                .distance_kinds()
                .iter()
                .map(|&kind| Scope::Distance(kind)),
        );
        scopes
    }

    /// Trigger the platform consent flow for all required scopes.
    pub async fn request_permissions(&self) -> Result<(), PipelineError> {
        if !self.store.is_available().await {
            return Err(PipelineError::PlatformUnavailable);
        }

        let scopes = self.required_scopes();
        self.store
            .request_authorization(&scopes)
            .await
            .map_err(|e| PipelineError::QueryFailed(format!("authorization request: {}", e)))?;

        info!(scopes = scopes.len(), "Authorization flow completed");
        Ok(())
    }

    /// Permission gate: every required scope must be decided. A denied scope
    /// passes (queries then degrade to empty output); only scopes never
    /// prompted block, so the caller knows to run `request_permissions`.
    pub async fn check_permission_gate(&self) -> Result<(), PipelineError> {
        if !self.store.is_available().await {
            return Err(PipelineError::PlatformUnavailable);
        }

        let mut undetermined = Vec::new();
        for scope in self.required_scopes() {
            let status = self
                .store
                .authorization_status(scope)
                .await
                .map_err(|e| PipelineError::QueryFailed(format!("authorization status: {}", e)))?;
            if !status.is_decided() {
                undetermined.push(scope);
            }
        }

        if undetermined.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::AuthorizationIncomplete {
                scopes: undetermined,
            })
        }
    }

    /// Full inbound operation: parse the time bounds, gate, discover,
    /// aggregate, assemble, and serialize to the wire JSON array.
    pub async fn get_exercise_data(
        &self,
        start_raw: &str,
        end_raw: &str,
    ) -> Result<String, PipelineError> {
        let start = parse_instant(start_raw)?;
        let end = parse_instant(end_raw)?;
        if start > end {
            return Err(PipelineError::InvalidArgument(format!(
                "start time {} is after end time {}",
                start_raw, end_raw
            )));
        }

        self.check_permission_gate().await?;

        let records = self.collect_records(start, end).await?;
        serde_json::to_string(&records)
            .map_err(|e| PipelineError::SerializationFailed(e.to_string()))
    }

    /// Discover sessions in `[start, end)` and aggregate each one
    /// concurrently. Records come back sorted descending by start time,
    /// ties in discovery order.
    pub async fn collect_records(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ExerciseRecord>, PipelineError> {
        let sessions = self
            .store
            .sessions_between(start, end)
            .await
            .map_err(|e| PipelineError::QueryFailed(e.to_string()))?;

        info!(
            sessions = sessions.len(),
            store = self.store.store_name(),
            "Discovered exercise sessions"
        );

        // Fan out one task per session; fan in by awaiting the handles in
        // discovery order, so the merge itself stays single-threaded.
        let mut handles = Vec::with_capacity(sessions.len());
        for session in sessions {
            let store = Arc::clone(&self.store);
            let capabilities = self.capabilities.clone();
            handles.push(tokio::spawn(async move {
                let bundle = aggregate_session(&*store, &capabilities, &session).await;
                ExerciseRecord::assemble(&session, bundle)
            }));
        }

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(record) => records.push(record),
                // A panicked aggregation task loses that one session; the
                // rest of the invocation still completes.
                Err(e) => warn!(error = %e, "Session aggregation task failed, skipping session"),
            }
        }

        records.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(records)
    }
}

/// Compute one session's metric bundle. The three sub-queries run
/// concurrently and are joined before returning; each failure degrades that
/// metric to its zero/empty default instead of surfacing.
async fn aggregate_session(
    store: &dyn HealthStore,
    capabilities: &StoreCapabilities,
    session: &Session,
) -> MetricBundle {
    let window = (session.start_time, session.end_time);

    let energy_query = store.cumulative_sum(MetricKind::ActiveEnergy, window.0, window.1);
    let heart_rate_query = store.heart_rate_series(window.0, window.1);
    let distance_query = async {
        let kind = session
            .activity_type
            .distance_kind()
            .filter(|&k| capabilities.supports_distance(k));
        match kind {
            Some(kind) => Some(
                store
                    .cumulative_sum(MetricKind::Distance(kind), window.0, window.1)
                    .await,
            ),
            // No appropriate metric for this activity on this device.
            None => None,
        }
    };

    let (energy, distance, heart_rate) =
        tokio::join!(energy_query, distance_query, heart_rate_query);

    let active_energy_kcal = match energy {
        Ok(kcal) => kcal,
        Err(e) => {
            warn!(session = %session.id, error = %e, "Energy query degraded to 0.0");
            0.0
        }
    };

    let total_distance_meters = match distance {
        Some(Ok(meters)) => meters,
        Some(Err(e)) => {
            warn!(session = %session.id, error = %e, "Distance query degraded to 0.0");
            0.0
        }
        None => {
            debug!(
                session = %session.id,
                activity = session.activity_type.label(),
                "No distance metric for activity"
            );
            0.0
        }
    };

    let heart_rate_samples_bpm = match heart_rate {
        Ok(series) => series,
        Err(e) => {
            warn!(session = %session.id, error = %e, "Heart rate query degraded to empty");
            Vec::new()
        }
    };

    MetricBundle {
        active_energy_kcal,
        total_distance_meters,
        heart_rate_samples_bpm,
    }
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, PipelineError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PipelineError::InvalidArgument(format!("bad timestamp '{}': {}", raw, e)))
}
