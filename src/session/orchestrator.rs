//! Session orchestrator: the async loop between the UI and the workflow.
//!
//! The UI sends [`SessionCommand`]s and renders the [`SessionView`]
//! snapshots it gets back.  The loop owns the [`SessionState`], so commands
//! of one session are handled strictly one after another.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::store::{RecordKey, Vote};

use super::state::SessionState;
use super::workflow::Workflow;

/// Commands sent from the UI thread to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Run the pipeline on the raw input text.
    Summarize(String),
    /// Rate the record the UI was showing, identified by its key.
    Rate(Option<RecordKey>, Vote),
}

/// Everything the UI renders, sent after every state change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionView {
    /// Key of the record the snapshot belongs to.
    pub key: Option<RecordKey>,
    /// Output area text: the final stage's output.
    pub display_text: String,
    pub status_message: String,
    /// CSV bytes; the download button is enabled while this is `Some`.
    pub download_payload: Option<Vec<u8>>,
    /// Whether the current record has been rated.
    pub submitted: bool,
    /// `true` while a submission is in flight.
    pub busy: bool,
}

impl SessionView {
    pub fn from_state(state: &SessionState, busy: bool) -> Self {
        Self {
            key: state.key.clone(),
            display_text: state.display_text().to_string(),
            status_message: state.status_message.clone(),
            download_payload: state.download_payload.clone(),
            submitted: state.submitted(),
            busy,
        }
    }

    pub fn download_enabled(&self) -> bool {
        self.download_payload.is_some()
    }
}

/// Serve one session until the command channel closes.
pub async fn run_session(
    workflow: Arc<Workflow>,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    view_tx: mpsc::Sender<SessionView>,
) {
    let mut state = SessionState::new();

    while let Some(cmd) = command_rx.recv().await {
        match cmd {
            SessionCommand::Summarize(raw) => {
                if view_tx.send(SessionView::from_state(&state, true)).await.is_err() {
                    log::debug!("session: view receiver dropped, stopping");
                    break;
                }
                if let Err(e) = workflow.summarize(&mut state, &raw).await {
                    log::warn!("session: submit failed: {e}");
                }
            }
            SessionCommand::Rate(seen, vote) => {
                if let Err(e) = workflow.rate(&mut state, seen.as_ref(), vote).await {
                    log::info!("session: rating not recorded: {e}");
                }
            }
        }

        if view_tx.send(SessionView::from_state(&state, false)).await.is_err() {
            log::debug!("session: view receiver dropped, stopping");
            break;
        }
    }

    log::debug!("session: command channel closed");
}
