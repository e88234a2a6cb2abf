// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Core data structures for the exercise-data pipeline: the [`Session`]
//! records discovered in the health store, the per-session [`MetricBundle`]
//! computed by the aggregator, and the [`ExerciseRecord`] wire shape handed
//! back to the web layer.
//!
//! ## Design Principles
//!
//! - **Store agnostic**: the same shapes flow whether the backing store is
//!   the native agent or the in-memory store
//! - **Serializable**: wire types serialize to the exact JSON the web layer
//!   consumes (camelCase, millisecond UTC timestamps)
//! - **Read only**: sessions are sourced fresh per query and never mutated
//!   by this system

use crate::activity::ActivityType;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Sample tag for the cumulative active-energy entry.
pub const SAMPLE_TAG_ACTIVE_CALORIES: &str = "ACTIVE_CALORIES_BURNED";
/// Sample tag for the heart-rate series entry.
pub const SAMPLE_TAG_HEART_RATE: &str = "HEART_RATE";

/// A discovered workout/exercise session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque platform identifier, kept for dedup and logging.
    pub id: String,
    /// Session start (UTC).
    pub start_time: DateTime<Utc>,
    /// Session end (UTC), always >= `start_time`.
    pub end_time: DateTime<Utc>,
    /// Platform exercise-type code.
    pub activity_type: ActivityType,
}

impl Session {
    /// Session length in seconds.
    pub fn duration_seconds(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

/// Aggregated metric values for exactly one session.
///
/// Every field carries its zero/empty default when the underlying sub-query
/// failed or the data does not exist; the aggregator absorbs those failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBundle {
    /// Active-energy sum over the session window, kcal.
    pub active_energy_kcal: f64,
    /// Distance sum over the session window, meters.
    pub total_distance_meters: f64,
    /// Chronological heart-rate readings, BPM.
    pub heart_rate_samples_bpm: Vec<f64>,
}

/// One tagged sample block inside an [`ExerciseRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    #[serde(with = "wire_time")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "wire_time")]
    pub end_date: DateTime<Utc>,
    pub block: u32,
    pub values: Vec<f64>,
    pub additional_data: String,
}

/// The normalized output unit: one session flattened with its metrics.
///
/// Invariant: `samples` always holds exactly one `ACTIVE_CALORIES_BURNED`
/// entry and one `HEART_RATE` entry, even when the underlying values are
/// zero or empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    #[serde(with = "wire_time")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "wire_time")]
    pub end_date: DateTime<Utc>,
    /// Session length in seconds.
    pub duration: f64,
    /// Human-readable activity label.
    pub activity: String,
    /// Meters.
    pub total_distance: f64,
    /// Kilocalories.
    pub total_energy_burned: f64,
    pub samples: Vec<MetricSample>,
}

impl ExerciseRecord {
    /// Flatten a session and its metric bundle into the wire shape.
    pub fn assemble(session: &Session, bundle: MetricBundle) -> Self {
        let samples = vec![
            MetricSample {
                start_date: session.start_time,
                end_date: session.end_time,
                block: 1,
                values: vec![bundle.active_energy_kcal],
                additional_data: SAMPLE_TAG_ACTIVE_CALORIES.to_string(),
            },
            MetricSample {
                start_date: session.start_time,
                end_date: session.end_time,
                block: 1,
                values: bundle.heart_rate_samples_bpm,
                additional_data: SAMPLE_TAG_HEART_RATE.to_string(),
            },
        ];

        ExerciseRecord {
            start_date: session.start_time,
            end_date: session.end_time,
            duration: session.duration_seconds(),
            activity: session.activity_type.label().to_string(),
            total_distance: bundle.total_distance_meters,
            total_energy_burned: bundle.active_energy_kcal,
            samples,
        }
    }
}

/// RFC 3339 UTC with millisecond fractional seconds, the format the web
/// layer sends and expects back.
pub mod wire_time {
    use super::*;
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
