//! Core `Predictor` trait and `DataRobotClient` implementation.
//!
//! `DataRobotClient` calls the unstructured-prediction route of a hosted
//! deployment.  All connection details come from [`PredictionConfig`];
//! nothing is hardcoded except the route template and the payload limit.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::PredictionConfig;
use crate::predict::response::ParsedPrediction;
use crate::predict::transport::{HttpTransport, ReqwestTransport, TransportRequest};

/// Maximum request payload in bytes (50 MiB), enforced server-side too.
///
/// Payloads of exactly this size are rejected.
pub const MAX_PREDICTION_BYTES: usize = 52_428_800;

const CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

// ---------------------------------------------------------------------------
// PredictionError
// ---------------------------------------------------------------------------

/// Errors that can occur during a prediction call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    /// The encoded payload reached [`MAX_PREDICTION_BYTES`]; nothing was sent.
    #[error("input is too large: {size} bytes (max allowed is {max} bytes)")]
    InputTooLarge { size: usize, max: usize },

    /// The deployment answered with a non-2xx status.
    #[error("{status_code} Error: {body}")]
    UpstreamError { status_code: u16, body: String },

    /// The 2xx response body did not match the expected JSON shape.
    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("prediction request timed out")]
    Timeout,
}

impl From<reqwest::Error> for PredictionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PredictionError::Timeout
        } else {
            PredictionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Predictor trait
// ---------------------------------------------------------------------------

/// Async trait for one unstructured prediction.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn Predictor>`).
///
/// # Arguments
/// * `text`          – UTF-8 payload sent as the request body.
/// * `deployment_id` – which hosted model to invoke.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(
        &self,
        text: &str,
        deployment_id: &str,
    ) -> Result<ParsedPrediction, PredictionError>;
}

// ---------------------------------------------------------------------------
// DataRobotClient
// ---------------------------------------------------------------------------

/// Calls `POST https://{host}/predApi/v1.0/deployments/{id}/predictionsUnstructured`.
///
/// One call is one request: errors are returned to the caller, never
/// retried here.
pub struct DataRobotClient {
    transport: Arc<dyn HttpTransport>,
    config: PredictionConfig,
}

impl DataRobotClient {
    /// Build a client over a [`ReqwestTransport`] using `config.timeout_secs`.
    pub fn from_config(config: &PredictionConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new(config.timeout_secs)))
    }

    /// Build a client over an arbitrary transport.
    pub fn with_transport(config: &PredictionConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            config: config.clone(),
        }
    }

    /// Full prediction URL for `deployment_id`.
    pub fn endpoint_url(&self, deployment_id: &str) -> String {
        format!(
            "https://{host}/predApi/v1.0/deployments/{deployment_id}/predictionsUnstructured",
            host = self.config.host,
        )
    }

    fn build_request(&self, text: &str, deployment_id: &str) -> TransportRequest {
        TransportRequest {
            url: self.endpoint_url(deployment_id),
            headers: vec![
                ("Content-Type".into(), CONTENT_TYPE.into()),
                ("Authorization".into(), format!("Bearer {}", self.config.api_key)),
                ("DataRobot-Key".into(), self.config.datarobot_key.clone()),
            ],
            body: text.as_bytes().to_vec(),
        }
    }
}

#[async_trait]
impl Predictor for DataRobotClient {
    async fn predict(
        &self,
        text: &str,
        deployment_id: &str,
    ) -> Result<ParsedPrediction, PredictionError> {
        let size = text.len();
        if size >= MAX_PREDICTION_BYTES {
            log::warn!("predict: payload of {size} bytes rejected before sending");
            return Err(PredictionError::InputTooLarge {
                size,
                max: MAX_PREDICTION_BYTES,
            });
        }

        log::debug!("predict: deployment={deployment_id} bytes={size}");
        let response = self
            .transport
            .post(self.build_request(text, deployment_id))
            .await?;

        if !response.is_success() {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            log::warn!("predict: deployment={deployment_id} status={}", response.status);
            return Err(PredictionError::UpstreamError {
                status_code: response.status,
                body,
            });
        }

        ParsedPrediction::from_slice(&response.body)
    }
}

// ---------------------------------------------------------------------------
// ScriptedPredictor (test double)
// ---------------------------------------------------------------------------

/// Predictor that answers from a per-deployment script and records every
/// call as `(deployment_id, text)`.
#[cfg(test)]
pub struct ScriptedPredictor {
    responses: std::collections::HashMap<String, Result<ParsedPrediction, PredictionError>>,
    calls: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl ScriptedPredictor {
    pub fn new() -> Self {
        Self {
            responses: std::collections::HashMap::new(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Answer `deployment_id` with the decoded `json` body.
    pub fn ok(mut self, deployment_id: &str, json: &str) -> Self {
        let parsed = ParsedPrediction::from_slice(json.as_bytes()).expect("valid test JSON");
        self.responses.insert(deployment_id.into(), Ok(parsed));
        self
    }

    /// Answer `deployment_id` with `err`.
    pub fn err(mut self, deployment_id: &str, err: PredictionError) -> Self {
        self.responses.insert(deployment_id.into(), Err(err));
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Predictor for ScriptedPredictor {
    async fn predict(
        &self,
        text: &str,
        deployment_id: &str,
    ) -> Result<ParsedPrediction, PredictionError> {
        self.calls
            .lock()
            .unwrap()
            .push((deployment_id.to_string(), text.to_string()));
        self.responses
            .get(deployment_id)
            .cloned()
            .unwrap_or_else(|| {
                Err(PredictionError::UpstreamError {
                    status_code: 404,
                    body: format!("no scripted response for {deployment_id}"),
                })
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
