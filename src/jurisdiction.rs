use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Collaborator check for whether this session is in a jurisdiction that
/// requires a consent prompt at all.
#[async_trait]
pub trait JurisdictionPort: Send + Sync {
    /// Adapters resolve their own failures: an undecidable probe must come
    /// back `true` so the prompt is never skipped by accident.
    async fn in_scope(&self) -> bool;
}

/// Always in scope. The default when no probe endpoint is configured.
pub struct StaticJurisdiction;

#[async_trait]
impl JurisdictionPort for StaticJurisdiction {
    async fn in_scope(&self) -> bool {
        true
    }
}

#[derive(Debug, Deserialize)]
struct ProbeResponse {
    in_eu: bool,
}

pub struct HttpJurisdictionProbe {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpJurisdictionProbe {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl JurisdictionPort for HttpJurisdictionProbe {
    async fn in_scope(&self) -> bool {
        let response = match self.client.get(&self.endpoint).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(target: "jurisdiction", error = %err, "jurisdiction_probe_failed");
                return true;
            }
        };
        match response.json::<ProbeResponse>().await {
            Ok(parsed) => parsed.in_eu,
            Err(err) => {
                tracing::warn!(target: "jurisdiction", error = %err, "jurisdiction_probe_unreadable");
                true
            }
        }
    }
}
