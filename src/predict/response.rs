//! Decoded unstructured-prediction response.
//!
//! Wire format:
//!
//! ```text
//! {"prediction": [{"summary_text": "..."}, ...], "model_run_time_seconds": 0.5}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::predict::client::PredictionError;

/// One decoded prediction response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParsedPrediction {
    /// Per-segment prediction objects, in upstream order.
    pub prediction: Vec<Map<String, Value>>,

    /// Model run time reported by the deployment.
    pub model_run_time_seconds: f64,
}

impl ParsedPrediction {
    /// Decode a response body.
    ///
    /// Invalid JSON, missing keys and negative run times are all
    /// [`PredictionError::MalformedResponse`].
    pub fn from_slice(body: &[u8]) -> Result<Self, PredictionError> {
        let parsed: Self = serde_json::from_slice(body)
            .map_err(|e| PredictionError::MalformedResponse(e.to_string()))?;

        if !parsed.model_run_time_seconds.is_finite() || parsed.model_run_time_seconds < 0.0 {
            return Err(PredictionError::MalformedResponse(format!(
                "invalid model_run_time_seconds: {}",
                parsed.model_run_time_seconds
            )));
        }

        Ok(parsed)
    }

    /// Collect `field` from every segment.
    pub fn segment_texts(&self, field: &str) -> Result<Vec<&str>, PredictionError> {
        if self.prediction.is_empty() {
            return Err(PredictionError::MalformedResponse(
                "response contains no prediction segments".into(),
            ));
        }

        self.prediction
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                segment.get(field).and_then(Value::as_str).ok_or_else(|| {
                    PredictionError::MalformedResponse(format!(
                        "segment {i} has no string field `{field}`"
                    ))
                })
            })
            .collect()
    }

    /// `field` from every segment, joined with `\n`.
    pub fn joined_text(&self, field: &str) -> Result<String, PredictionError> {
        Ok(self.segment_texts(field)?.join("\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
