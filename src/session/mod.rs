//! Interactive session: submit text, show the result, rate it once.
//!
//! # Architecture
//!
//! ```text
//! UI ──SessionCommand──▶ run_session (owns SessionState)
//!                             │
//!                             ├─ Workflow::summarize → PipelineRunner + RecordStore::append
//!                             └─ Workflow::rate      → RatingGate + RecordStore::update_rating
//!    ◀──SessionView──────────┘
//! ```

pub mod download;
pub mod gate;
pub mod orchestrator;
pub mod state;
pub mod workflow;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use download::build_csv;
pub use gate::{GateState, RatingError, RatingGate};
pub use orchestrator::{run_session, SessionCommand, SessionView};
pub use state::SessionState;
pub use workflow::{normalize_input, Workflow, WorkflowError};
