// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fatal error taxonomy for the exercise-data pipeline
//!
//! Per-metric sub-query failures are deliberately absent here: they degrade
//! to a zero/empty value inside the aggregator instead of aborting the
//! invocation.

use crate::store::Scope;
use thiserror::Error;

/// Errors that terminate a single pipeline invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The health store is not present or enabled on this device.
    #[error("health store not available on this device")]
    PlatformUnavailable,

    /// One or more required scopes were never prompted. A denied scope does
    /// not land here; the gate only blocks on scopes still undecided.
    #[error("authorization incomplete, request permissions first (undetermined scopes: {})", format_scopes(.scopes))]
    AuthorizationIncomplete { scopes: Vec<Scope> },

    /// Malformed or inconsistent caller input, surfaced before any query.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The session-discovery query itself failed.
    #[error("session query failed: {0}")]
    QueryFailed(String),

    /// The assembled result could not be encoded to the wire format.
    #[error("failed to serialize exercise records: {0}")]
    SerializationFailed(String),
}

fn format_scopes(scopes: &[Scope]) -> String {
    scopes
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
