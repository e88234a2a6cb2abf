// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! HTTP client for the on-device native agent
//!
//! The native shim (Health Connect on Android, HealthKit on iOS) runs a
//! small localhost agent that exposes the capability-query surface as plain
//! HTTP endpoints. This backend is a thin typed client over that surface;
//! it holds no state beyond the base URL.

use super::{AuthorizationStatus, HealthStore, MetricKind, Scope};
use crate::activity::ActivityType;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

#[derive(Debug)]
pub struct NativeAgentStore {
    client: Client,
    base_url: Url,
}

impl NativeAgentStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid agent base URL: {}", base_url))?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid agent endpoint path: {}", path))
    }

    fn ranged_endpoint(
        &self,
        path: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("start", &start.to_rfc3339_opts(SecondsFormat::Millis, true))
            .append_pair("end", &end.to_rfc3339_opts(SecondsFormat::Millis, true));
        Ok(url)
    }
}

#[async_trait]
impl HealthStore for NativeAgentStore {
    async fn is_available(&self) -> bool {
        let Ok(url) = self.endpoint("availability") else {
            return false;
        };
        match self.client.get(url).send().await {
            Ok(response) => response
                .json::<AgentAvailability>()
                .await
                .map(|a| a.available)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn authorization_status(&self, scope: Scope) -> Result<AuthorizationStatus> {
        let mut url = self.endpoint("authorization/status")?;
        url.query_pairs_mut()
            .append_pair("scope", &scope.to_string());

        let response: AgentAuthorizationStatus = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Malformed authorization status from agent")?;

        Ok(response.status)
    }

    async fn request_authorization(&self, scopes: &[Scope]) -> Result<()> {
        let url = self.endpoint("authorization/request")?;
        let body = serde_json::json!({
            "scopes": scopes.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        });

        self.client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .context("Agent rejected authorization request")?;

        Ok(())
    }

    async fn sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        let url = self.ranged_endpoint("sessions", start, end)?;

        let response: Vec<AgentSession> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Malformed session list from agent")?;

        Ok(response.into_iter().map(|s| s.into()).collect())
    }

    async fn cumulative_sum(
        &self,
        metric: MetricKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64> {
        let mut url = self.ranged_endpoint("aggregate", start, end)?;
        url.query_pairs_mut()
            .append_pair("metric", &metric.as_str());

        let response: AgentAggregate = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Malformed aggregate from agent")?;

        Ok(response.sum)
    }

    async fn heart_rate_series(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<f64>> {
        let url = self.ranged_endpoint("samples/heart_rate", start, end)?;

        let response: Vec<AgentHeartRateSample> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Malformed heart rate samples from agent")?;

        // The agent returns samples in time order already.
        Ok(response.into_iter().map(|s| s.bpm).collect())
    }

    fn store_name(&self) -> &'static str {
        "native-agent"
    }
}

#[derive(Debug, Deserialize)]
struct AgentAvailability {
    available: bool,
}

#[derive(Debug, Deserialize)]
struct AgentAuthorizationStatus {
    status: AuthorizationStatus,
}

#[derive(Debug, Deserialize)]
struct AgentSession {
    id: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    activity_type: u32,
}

impl From<AgentSession> for Session {
    fn from(agent: AgentSession) -> Self {
        Session {
            id: agent.id,
            start_time: agent.start_time,
            end_time: agent.end_time,
            activity_type: ActivityType(agent.activity_type),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AgentAggregate {
    sum: f64,
}

#[derive(Debug, Deserialize)]
struct AgentHeartRateSample {
    #[allow(dead_code)]
    time: DateTime<Utc>,
    bpm: f64,
}
