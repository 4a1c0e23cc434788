//! Prediction API client for the hosted summarize / translate deployments.
//!
//! This module provides:
//! * [`Predictor`]: async trait implemented by every prediction backend.
//! * [`DataRobotClient`]: unstructured-prediction REST client.
//! * [`HttpTransport`] / [`ReqwestTransport`]: the HTTP seam under the client.
//! * [`ParsedPrediction`]: the decoded JSON response.
//! * [`PredictionError`]: error variants for prediction calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use summary_feedback::config::PredictionConfig;
//! use summary_feedback::predict::{DataRobotClient, Predictor};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = DataRobotClient::from_config(&PredictionConfig::default());
//!
//!     let parsed = client
//!         .predict("Hello world.", "summarize-deployment")
//!         .await
//!         .unwrap();
//!
//!     println!("{}", parsed.joined_text("summary_text").unwrap());
//! }
//! ```

pub mod client;
pub mod response;
pub mod transport;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{DataRobotClient, PredictionError, Predictor, MAX_PREDICTION_BYTES};
pub use response::ParsedPrediction;
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, TransportRequest};

// test-only re-export so the pipeline and session tests can script
// responses without a transport.
#[cfg(test)]
pub use client::ScriptedPredictor;
