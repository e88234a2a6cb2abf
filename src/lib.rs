// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Exercise Bridge Server
//!
//! A bridge server that exposes platform health-store data to web
//! application code: it discovers workout/exercise sessions over a
//! caller-specified time range, fans out per-session sub-queries for
//! derived metrics (active energy, distance, heart rate), and normalizes
//! everything into one JSON shape the web layer consumes.
//!
//! ## Features
//!
//! - **Store abstraction**: one `HealthStore` trait in front of the
//!   on-device native agent and an in-memory development store
//! - **Concurrent aggregation**: per-session metric sub-queries run in
//!   parallel and degrade independently on failure
//! - **Tolerant permission gate**: denied scopes pass through (queries
//!   return empty data); only never-prompted scopes block
//! - **Stable wire shape**: camelCase records with a fixed two-entry
//!   samples block per session
//!
//! ## Architecture
//!
//! The server follows a modular architecture:
//! - **Store**: abstract health-data-store backends
//! - **Pipeline**: permission gate, session discovery, metric aggregation,
//!   result assembly
//! - **Bridge**: line-delimited JSON-RPC server for the web layer
//! - **Models**: session, metric bundle, and wire record shapes
//! - **Config**: configuration management and persistence
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use exercise_bridge_server::activity::StoreCapabilities;
//! use exercise_bridge_server::config::Config;
//! use exercise_bridge_server::pipeline::ExercisePipeline;
//! use exercise_bridge_server::store::create_store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!
//!     let store = create_store(&config.store)?;
//!     let capabilities =
//!         StoreCapabilities::for_platform_version(&config.store.platform_version);
//!     let pipeline = ExercisePipeline::new(store, capabilities);
//!
//!     let json = pipeline
//!         .get_exercise_data("2024-03-01T00:00:00.000Z", "2024-03-31T00:00:00.000Z")
//!         .await?;
//!     println!("{}", json);
//!
//!     Ok(())
//! }
//! ```

/// Activity-type labels, distance-metric selection, and capabilities
pub mod activity;

/// Line-delimited JSON-RPC bridge for the web layer
pub mod bridge;

/// Configuration management and persistence
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Fatal error taxonomy for pipeline invocations
pub mod errors;

/// Health checks and monitoring
pub mod health;

/// Production logging and structured output
pub mod logging;

/// Common data models for sessions, metrics, and wire records
pub mod models;

/// The exercise-data aggregation pipeline
pub mod pipeline;

/// Health-data-store trait and backends
pub mod store;
