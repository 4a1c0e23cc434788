//! Prediction pipeline: an ordered list of stages run against one predictor.
//!
//! # Architecture
//!
//! ```text
//! PipelineRunner::run(text)
//!        │
//!        ├─ Stage "summary"     → Predictor::predict(text, smry_id)
//!        │                         └─ join summary_text segments
//!        │
//!        └─ Stage "translation" → Predictor::predict(summary, trans_id)
//!                                  └─ join translation_text segments
//! ```
//!
//! The one-stage and two-stage variants are the same runner with different
//! stage lists, either built in code ([`PipelineRunner::summarize`],
//! [`PipelineRunner::summarize_and_translate`]) or loaded from
//! `[[pipeline.stages]]` in `settings.toml`.

pub mod runner;
pub mod stage;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{PipelineOutput, PipelineRunner};
pub use stage::{Stage, StageOutput};
