//! One prediction hop and its field-extraction rule.

use serde::{Deserialize, Serialize};

use crate::predict::{ParsedPrediction, PredictionError};

/// A pipeline stage: which deployment to call, which per-segment field to
/// read back, and where the result is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Short machine name, also the CSV header (e.g. `"summary"`).
    pub name: String,
    /// Human-readable label used in the timing report (e.g. `"要約"`).
    pub label: String,
    /// Deployment invoked for this stage.
    pub deployment_id: String,
    /// Per-segment JSON field holding the text (e.g. `"summary_text"`).
    pub field: String,
    /// Record table column receiving the output (e.g. `"SUMMARY"`).
    pub column: String,
}

impl Stage {
    /// The stock summarize stage.
    pub fn summarize(deployment_id: impl Into<String>) -> Self {
        Self {
            name: "summary".into(),
            label: "要約".into(),
            deployment_id: deployment_id.into(),
            field: "summary_text".into(),
            column: "SUMMARY".into(),
        }
    }

    /// The stock translate stage.
    pub fn translate(deployment_id: impl Into<String>) -> Self {
        Self {
            name: "translation".into(),
            label: "翻訳".into(),
            deployment_id: deployment_id.into(),
            field: "translation_text".into(),
            column: "TRANSLATION".into(),
        }
    }

    /// Pull this stage's text out of a decoded response.
    pub fn extract(&self, parsed: &ParsedPrediction) -> Result<String, PredictionError> {
        parsed.joined_text(&self.field)
    }
}

/// Text produced by one stage, with the upstream-reported run time.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput {
    pub name: String,
    pub label: String,
    pub column: String,
    pub text: String,
    pub elapsed_secs: f64,
}
