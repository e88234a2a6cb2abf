// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Integration tests for the native-agent store backend
//!
//! These verify the HTTP surface against mocked agent responses: endpoint
//! shapes, payload parsing, and error propagation.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use mockito::{Matcher, Server};
use serde_json::json;

use exercise_bridge_server::activity::{ActivityType, DistanceKind};
use exercise_bridge_server::store::agent::NativeAgentStore;
use exercise_bridge_server::store::{AuthorizationStatus, HealthStore, MetricKind, Scope};

fn window() -> (DateTime<Utc>, DateTime<Utc>) {
    (
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn test_availability_roundtrip() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/availability")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"available": true}).to_string())
        .create_async()
        .await;

    let store = NativeAgentStore::new(&server.url())?;
    assert!(store.is_available().await);
    Ok(())
}

#[tokio::test]
async fn test_availability_false_when_agent_unreachable() -> Result<()> {
    // Nothing listening on this port.
    let store = NativeAgentStore::new("http://127.0.0.1:9/")?;
    assert!(!store.is_available().await);
    Ok(())
}

#[tokio::test]
async fn test_authorization_status_parsing() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/authorization/status")
        .match_query(Matcher::UrlEncoded("scope".into(), "heart_rate".into()))
        .with_status(200)
        .with_body(json!({"status": "not_determined"}).to_string())
        .create_async()
        .await;

    let store = NativeAgentStore::new(&server.url())?;
    let status = store.authorization_status(Scope::HeartRate).await?;
    assert_eq!(status, AuthorizationStatus::NotDetermined);
    Ok(())
}

#[tokio::test]
async fn test_request_authorization_posts_scope_names() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/authorization/request")
        .match_body(Matcher::PartialJson(json!({
            "scopes": ["exercise_sessions", "heart_rate", "distance_swimming"]
        })))
        .with_status(200)
        .create_async()
        .await;

    let store = NativeAgentStore::new(&server.url())?;
    store
        .request_authorization(&[
            Scope::ExerciseSessions,
            Scope::HeartRate,
            Scope::Distance(DistanceKind::Swimming),
        ])
        .await?;

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_sessions_parsing_and_mapping() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/sessions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([
                {
                    "id": "hc-1001",
                    "start_time": "2024-03-01T07:00:00Z",
                    "end_time": "2024-03-01T07:30:00Z",
                    "activity_type": 56
                },
                {
                    "id": "hc-1000",
                    "start_time": "2024-03-01T06:00:00Z",
                    "end_time": "2024-03-01T06:45:00Z",
                    "activity_type": 8
                }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let store = NativeAgentStore::new(&server.url())?;
    let (start, end) = window();
    let sessions = store.sessions_between(start, end).await?;

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, "hc-1001");
    assert_eq!(sessions[0].activity_type, ActivityType(56));
    assert_eq!(sessions[1].activity_type, ActivityType(8));
    Ok(())
}

#[tokio::test]
async fn test_sessions_error_status_propagates() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/sessions")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let store = NativeAgentStore::new(&server.url())?;
    let (start, end) = window();
    assert!(store.sessions_between(start, end).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_cumulative_sum_selects_metric() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/aggregate")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("metric".into(), "distance_walking_running".into()),
            Matcher::UrlEncoded("start".into(), "2024-03-01T00:00:00.000Z".into()),
        ]))
        .with_status(200)
        .with_body(json!({"sum": 5021.5}).to_string())
        .create_async()
        .await;

    let store = NativeAgentStore::new(&server.url())?;
    let (start, end) = window();
    let sum = store
        .cumulative_sum(
            MetricKind::Distance(DistanceKind::WalkingRunning),
            start,
            end,
        )
        .await?;
    assert_eq!(sum, 5021.5);
    Ok(())
}

#[tokio::test]
async fn test_heart_rate_series_preserves_order() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/samples/heart_rate")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([
                {"time": "2024-03-01T07:05:00Z", "bpm": 112.0},
                {"time": "2024-03-01T07:10:00Z", "bpm": 126.0},
                {"time": "2024-03-01T07:15:00Z", "bpm": 139.0}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let store = NativeAgentStore::new(&server.url())?;
    let (start, end) = window();
    let series = store.heart_rate_series(start, end).await?;
    assert_eq!(series, vec![112.0, 126.0, 139.0]);
    Ok(())
}

#[tokio::test]
async fn test_malformed_agent_payload_is_an_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/aggregate")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let store = NativeAgentStore::new(&server.url())?;
    let (start, end) = window();
    let result = store.cumulative_sum(MetricKind::ActiveEnergy, start, end).await;
    assert!(result.is_err());
    Ok(())
}
