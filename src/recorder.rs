use std::{fmt, time::Duration};

use async_trait::async_trait;

use crate::consent::types::ConsentDecision;

const RECORD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderError {
    pub message: String,
}

impl RecorderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RecorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RecorderError {}

/// Outbound port for recording a consent decision with a collaborator
/// service. Callers fire-and-forget: a failed recording is logged and
/// dropped, never retried or surfaced.
#[async_trait]
pub trait ConsentRecorder: Send + Sync {
    async fn record(&self, decision: &ConsentDecision) -> Result<(), RecorderError>;
}

pub struct NoopConsentRecorder;

#[async_trait]
impl ConsentRecorder for NoopConsentRecorder {
    async fn record(&self, _decision: &ConsentDecision) -> Result<(), RecorderError> {
        Ok(())
    }
}

pub struct HttpConsentRecorder {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpConsentRecorder {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RecorderError> {
        let client = reqwest::Client::builder()
            .timeout(RECORD_TIMEOUT)
            .build()
            .map_err(|err| RecorderError::new(format!("failed to build http client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ConsentRecorder for HttpConsentRecorder {
    async fn record(&self, decision: &ConsentDecision) -> Result<(), RecorderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(decision)
            .send()
            .await
            .map_err(|err| {
                RecorderError::new(format!("consent recording request failed: {err}"))
            })?;
        response.error_for_status().map_err(|err| {
            RecorderError::new(format!("consent recording endpoint rejected: {err}"))
        })?;
        Ok(())
    }
}
