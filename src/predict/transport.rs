//! HTTP transport seam used by [`DataRobotClient`](super::DataRobotClient).
//!
//! The client builds a fully-formed [`TransportRequest`]; the transport only
//! moves bytes.  Keeping the seam this narrow lets tests count calls and
//! inspect the exact URL / headers / body without a network.

use async_trait::async_trait;

use crate::predict::client::PredictionError;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A single POST request, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    /// Header name / value pairs, sent in order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TransportRequest {
    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and raw body of an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// HttpTransport trait
// ---------------------------------------------------------------------------

/// Object-safe async POST transport.
///
/// Implementations return `Ok` for every response that arrived, whatever
/// its status; only connection-level failures are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, request: TransportRequest) -> Result<RawResponse, PredictionError>;
}

// ---------------------------------------------------------------------------
// ReqwestTransport
// ---------------------------------------------------------------------------

/// Production transport backed by a shared [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests time out after `timeout_secs`.
    ///
    /// A default (no-timeout) client is used as a last-resort fallback if
    /// the builder fails.
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: TransportRequest) -> Result<RawResponse, PredictionError> {
        let mut req = self.client.post(&request.url).body(request.body);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
