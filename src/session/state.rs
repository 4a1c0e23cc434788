//! Per-session state: the current submission and what the UI shows.
//!
//! [`SessionState`] is a plain value owned by whoever drives the session
//! (the orchestrator task, or a test) and passed to
//! [`Workflow`](super::Workflow) operations by `&mut`.

use crate::pipeline::{PipelineOutput, StageOutput};
use crate::store::RecordKey;

use super::gate::RatingGate;

/// State of one interactive session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// `(id, sub_id)` of the current submission, `None` before the first.
    pub key: Option<RecordKey>,

    /// Normalized input of the current submission.
    pub input_text: String,

    /// Stage outputs, populated only once the record has been appended.
    pub outputs: Vec<StageOutput>,

    /// Tracks whether the current record was already rated.
    pub gate: RatingGate,

    /// The one live status line, overwritten by every action.
    pub status_message: String,

    /// CSV bytes offered for download, `None` while there is no result.
    pub download_payload: Option<Vec<u8>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new submission: fresh ids, gate reopened, previous outputs
    /// and download cleared.
    pub fn begin_submission(&mut self, input_text: String) -> RecordKey {
        let key = RecordKey::generate();
        self.key = Some(key.clone());
        self.input_text = input_text;
        self.outputs.clear();
        self.gate.reset();
        self.download_payload = None;
        key
    }

    /// Publish a persisted result.
    pub fn publish(&mut self, output: PipelineOutput, download_payload: Vec<u8>) {
        self.outputs = output.stages;
        self.download_payload = Some(download_payload);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    /// Whether the current record was already rated.
    pub fn submitted(&self) -> bool {
        self.gate.is_submitted()
    }

    pub fn download_enabled(&self) -> bool {
        self.download_payload.is_some()
    }

    /// The text shown in the output area: the last stage's output.
    pub fn display_text(&self) -> &str {
        self.outputs.last().map(|s| s.text.as_str()).unwrap_or("")
    }

    /// `true` once a result with non-empty text has been published.
    pub fn has_output(&self) -> bool {
        !self.display_text().is_empty()
    }
}
