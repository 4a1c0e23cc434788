//! Submit / rate workflow for one session.
//!
//! # Submit
//!
//! ```text
//! raw input ─normalize─▶ empty? ──yes──▶ EmptyInput (no network, no store)
//!                          │no
//!                          ▼
//!               new ids, gate reset
//!                          ▼
//!               PipelineRunner::run ──err──▶ Prediction (nothing persisted)
//!                          ▼
//!               RecordStore::append ──err──▶ Store (outputs not shown)
//!                          ▼
//!               publish outputs, CSV, timing status
//! ```
//!
//! # Rate
//!
//! ```text
//! seen key ≠ current key ──▶ NothingToRate (no store call)
//!     ▼
//! gate check ──err──▶ AlreadyRated / NothingToRate (no store call)
//!     ▼
//! RecordStore::update_rating ──err──▶ Store (gate stays open)
//!     ▼
//! gate commit, status
//! ```
//!
//! Every outcome, success or failure, overwrites the session status line.

use std::sync::Arc;

use thiserror::Error;

use crate::pipeline::PipelineRunner;
use crate::predict::PredictionError;
use crate::store::{Record, RecordKey, RecordStore, StoreError, Vote};

use super::download;
use super::gate::RatingError;
use super::state::SessionState;

// ---------------------------------------------------------------------------
// Status messages
// ---------------------------------------------------------------------------

pub const MSG_EMPTY_INPUT: &str = "文書を貼り付けてください";
pub const MSG_ALREADY_RATED: &str = "既に送信した";
pub const MSG_NOTHING_TO_RATE: &str = "まだ要約してない";
pub const MSG_RATED_UP: &str = "👍を記録した！";
pub const MSG_RATED_DOWN: &str = "👎を記録した...";

fn rated_message(vote: Vote) -> &'static str {
    match vote {
        Vote::Up => MSG_RATED_UP,
        Vote::Down => MSG_RATED_DOWN,
    }
}

// ---------------------------------------------------------------------------
// WorkflowError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("input is empty")]
    EmptyInput,

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Rating(#[from] RatingError),
}

impl WorkflowError {
    /// The line shown to the user for this failure.
    pub fn status_message(&self) -> String {
        match self {
            WorkflowError::EmptyInput => MSG_EMPTY_INPUT.to_string(),
            WorkflowError::Rating(RatingError::AlreadyRated) => MSG_ALREADY_RATED.to_string(),
            WorkflowError::Rating(RatingError::NothingToRate) => MSG_NOTHING_TO_RATE.to_string(),
            WorkflowError::Prediction(PredictionError::InputTooLarge { size, max }) => {
                format!("入力が大きすぎます（{size}バイト、上限{max}バイト）")
            }
            WorkflowError::Prediction(e) => format!("予測に失敗しました: {e}"),
            WorkflowError::Store(e) => format!("記録に失敗しました: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Input normalization
// ---------------------------------------------------------------------------

/// Trim the text, drop whitespace-only lines, join the rest with `\n`.
///
/// ```
/// use summary_feedback::session::normalize_input;
///
/// assert_eq!(normalize_input("  a\n\n  \nb\r\n"), "a\nb");
/// assert_eq!(normalize_input(" \n\t "), "");
/// ```
pub fn normalize_input(raw: &str) -> String {
    raw.trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Shared, stateless half of a session: the pipeline and the store.
///
/// One `Workflow` serves any number of sessions; per-session state lives in
/// the [`SessionState`] passed to each call.
pub struct Workflow {
    runner: PipelineRunner,
    store: Arc<dyn RecordStore>,
}

impl Workflow {
    pub fn new(runner: PipelineRunner, store: Arc<dyn RecordStore>) -> Self {
        Self { runner, store }
    }

    /// Run the pipeline on `raw_input` and persist the result.
    pub async fn summarize(
        &self,
        session: &mut SessionState,
        raw_input: &str,
    ) -> Result<(), WorkflowError> {
        let result = self.try_summarize(session, raw_input).await;
        if let Err(e) = &result {
            session.set_status(e.status_message());
        }
        result
    }

    async fn try_summarize(
        &self,
        session: &mut SessionState,
        raw_input: &str,
    ) -> Result<(), WorkflowError> {
        let input = normalize_input(raw_input);
        if input.is_empty() {
            log::warn!("workflow: empty input, nothing submitted");
            return Err(WorkflowError::EmptyInput);
        }

        let key = session.begin_submission(input.clone());
        log::info!(
            "workflow: submit id={} sub_id={} ({} bytes)",
            key.id,
            key.sub_id,
            input.len()
        );

        let output = self.runner.run(&input).await?;

        let record = Record::from_output(key, &input, &output);
        self.store
            .append(&record)
            .await
            .inspect_err(|e| log::error!("workflow: append failed: {e}"))?;

        let payload = download::build_csv(&input, &output.stages);
        let timing = output.timing_report();
        session.publish(output, payload);
        session.set_status(timing);
        Ok(())
    }

    /// Record `vote` for the current submission, at most once.
    ///
    /// `seen` is the key of the record the user was looking at when voting.
    /// A vote for anything but the current record is refused.
    pub async fn rate(
        &self,
        session: &mut SessionState,
        seen: Option<&RecordKey>,
        vote: Vote,
    ) -> Result<(), WorkflowError> {
        let result = self.try_rate(session, seen, vote).await;
        match &result {
            Ok(()) => session.set_status(rated_message(vote)),
            Err(e) => session.set_status(e.status_message()),
        }
        result
    }

    async fn try_rate(
        &self,
        session: &mut SessionState,
        seen: Option<&RecordKey>,
        vote: Vote,
    ) -> Result<(), WorkflowError> {
        if seen != session.key.as_ref() {
            log::warn!("workflow: vote for a record that is no longer current, ignored");
            return Err(RatingError::NothingToRate.into());
        }

        let key = session
            .gate
            .check(session.key.as_ref(), session.has_output())
            .inspect_err(|e| log::warn!("workflow: rating refused: {e}"))?;

        self.store
            .update_rating(&key, vote)
            .await
            .inspect_err(|e| log::error!("workflow: rating update failed: {e}"))?;

        session.gate.commit(vote);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::{Predictor, ScriptedPredictor};
    use crate::session::gate::GateState;
    use crate::store::{MemoryRecordStore, Rating};

    const SUMMARY_JSON: &str =
        r#"{"prediction":[{"summary_text":"Hello."}],"model_run_time_seconds":0.5}"#;
    const TRANSLATION_JSON: &str =
        r#"{"prediction":[{"translation_text":"こんにちは。"}],"model_run_time_seconds":1.2}"#;

    struct Fixture {
        predictor: Arc<ScriptedPredictor>,
        store: Arc<MemoryRecordStore>,
        workflow: Workflow,
    }

    fn fixture(predictor: ScriptedPredictor, translate: bool) -> Fixture {
        let predictor = Arc::new(predictor);
        let store = Arc::new(MemoryRecordStore::new());

        let shared: Arc<dyn Predictor> = Arc::clone(&predictor) as Arc<dyn Predictor>;
        let runner = if translate {
            PipelineRunner::summarize_and_translate(shared, "smry", "trans")
        } else {
            PipelineRunner::summarize(shared, "smry")
        };
        let workflow = Workflow::new(runner, Arc::clone(&store) as Arc<dyn RecordStore>);

        Fixture {
            predictor,
            store,
            workflow,
        }
    }

    /// Vote on whatever record the session currently shows.
    async fn rate_current(
        f: &Fixture,
        session: &mut SessionState,
        vote: Vote,
    ) -> Result<(), WorkflowError> {
        let seen = session.key.clone();
        f.workflow.rate(session, seen.as_ref(), vote).await
    }

    fn summarize_only() -> Fixture {
        fixture(ScriptedPredictor::new().ok("smry", SUMMARY_JSON), false)
    }

    // ---- normalize_input ---

    #[test]
    fn normalize_drops_blank_lines_and_outer_whitespace() {
        assert_eq!(normalize_input("\n\n  first\n   \nsecond  \n\n"), "first\nsecond");
    }

    #[test]
    fn normalize_keeps_inner_indentation() {
        assert_eq!(normalize_input("a\n  b"), "a\n  b");
    }

    // ---- summarize ---

    #[tokio::test]
    async fn summarize_persists_and_publishes() {
        let f = summarize_only();
        let mut session = SessionState::new();

        f.workflow.summarize(&mut session, "Hello world.").await.unwrap();

        assert_eq!(session.display_text(), "Hello.");
        assert!((session.outputs[0].elapsed_secs - 0.5).abs() < f64::EPSILON);
        assert_eq!(session.status_message, "計算時間: 要約0.50秒");
        assert!(session.download_enabled());

        let rows = f.store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(Some(&rows[0].key), session.key.as_ref());
        assert_eq!(rows[0].input_text, "Hello world.");
        assert_eq!(rows[0].output("SUMMARY"), Some("Hello."));
        assert_eq!(rows[0].rating, Rating::Unrated);
    }

    #[tokio::test]
    async fn summarize_and_translate_persists_both_columns() {
        let f = fixture(
            ScriptedPredictor::new()
                .ok("smry", SUMMARY_JSON)
                .ok("trans", TRANSLATION_JSON),
            true,
        );
        let mut session = SessionState::new();

        f.workflow.summarize(&mut session, "Hello world.").await.unwrap();

        assert_eq!(session.display_text(), "こんにちは。");
        assert_eq!(session.status_message, "計算時間: 要約0.50秒、翻訳1.20秒");

        let rows = f.store.rows();
        assert_eq!(rows[0].output("SUMMARY"), Some("Hello."));
        assert_eq!(rows[0].output("TRANSLATION"), Some("こんにちは。"));
    }

    #[tokio::test]
    async fn blank_input_touches_nothing() {
        let f = summarize_only();
        let mut session = SessionState::new();

        let err = f.workflow.summarize(&mut session, "   \n\t\n ").await.unwrap_err();

        assert_eq!(err, WorkflowError::EmptyInput);
        assert_eq!(session.status_message, MSG_EMPTY_INPUT);
        assert!(f.predictor.calls().is_empty());
        assert_eq!(f.store.append_calls(), 0);
        assert!(session.key.is_none());
    }

    #[tokio::test]
    async fn input_is_normalized_before_prediction() {
        let f = summarize_only();
        let mut session = SessionState::new();

        f.workflow
            .summarize(&mut session, "  Hello\n\n   \nworld.  ")
            .await
            .unwrap();

        assert_eq!(f.predictor.calls()[0].1, "Hello\nworld.");
        assert_eq!(f.store.rows()[0].input_text, "Hello\nworld.");
    }

    #[tokio::test]
    async fn oversized_input_is_rejected_without_append() {
        let f = fixture(
            ScriptedPredictor::new().err(
                "smry",
                PredictionError::InputTooLarge {
                    size: 60_000_000,
                    max: 52_428_800,
                },
            ),
            false,
        );
        let mut session = SessionState::new();

        let err = f.workflow.summarize(&mut session, "big").await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Prediction(PredictionError::InputTooLarge { .. })
        ));
        assert_eq!(f.store.append_calls(), 0);
        assert!(!session.has_output());
        assert!(session.status_message.contains("52428800"));
    }

    #[tokio::test]
    async fn second_stage_failure_persists_nothing() {
        let f = fixture(
            ScriptedPredictor::new().ok("smry", SUMMARY_JSON).err(
                "trans",
                PredictionError::UpstreamError {
                    status_code: 500,
                    body: "boom".into(),
                },
            ),
            true,
        );
        let mut session = SessionState::new();

        let err = f.workflow.summarize(&mut session, "Hello world.").await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Prediction(PredictionError::UpstreamError { status_code: 500, .. })
        ));
        assert_eq!(f.store.append_calls(), 0);
        assert!(!session.download_enabled());
        assert!(session.status_message.contains("500 Error: boom"));
    }

    #[tokio::test]
    async fn append_failure_hides_outputs() {
        let f = summarize_only();
        f.store.set_failure(Some(StoreError::Connection("down".into())));
        let mut session = SessionState::new();

        let err = f.workflow.summarize(&mut session, "Hello world.").await.unwrap_err();

        assert!(matches!(err, WorkflowError::Store(StoreError::Connection(_))));
        assert!(!session.has_output());
        assert!(!session.download_enabled());
    }

    #[tokio::test]
    async fn resubmitting_creates_a_new_row() {
        let f = summarize_only();
        let mut session = SessionState::new();

        f.workflow.summarize(&mut session, "Hello world.").await.unwrap();
        let first = session.key.clone();
        f.workflow.summarize(&mut session, "Hello world.").await.unwrap();

        assert_ne!(session.key, first);
        assert_eq!(f.store.rows().len(), 2);
    }

    // ---- rate ---

    #[tokio::test]
    async fn rating_is_accepted_once() {
        let f = summarize_only();
        let mut session = SessionState::new();
        f.workflow.summarize(&mut session, "Hello world.").await.unwrap();

        rate_current(&f, &mut session, Vote::Up).await.unwrap();
        assert_eq!(session.status_message, MSG_RATED_UP);
        assert_eq!(session.gate.state(), GateState::Rated(Vote::Up));

        let err = rate_current(&f, &mut session, Vote::Down).await.unwrap_err();
        assert_eq!(err, WorkflowError::Rating(RatingError::AlreadyRated));
        assert_eq!(session.status_message, MSG_ALREADY_RATED);

        assert_eq!(f.store.update_calls(), 1);
        assert_eq!(f.store.rows()[0].rating, Rating::Up);
    }

    #[tokio::test]
    async fn down_vote_message() {
        let f = summarize_only();
        let mut session = SessionState::new();
        f.workflow.summarize(&mut session, "Hello world.").await.unwrap();

        rate_current(&f, &mut session, Vote::Down).await.unwrap();

        assert_eq!(session.status_message, MSG_RATED_DOWN);
        assert_eq!(f.store.rows()[0].rating, Rating::Down);
    }

    #[tokio::test]
    async fn rating_before_any_result_is_refused() {
        let f = summarize_only();
        let mut session = SessionState::new();

        let err = rate_current(&f, &mut session, Vote::Up).await.unwrap_err();

        assert_eq!(err, WorkflowError::Rating(RatingError::NothingToRate));
        assert_eq!(session.status_message, MSG_NOTHING_TO_RATE);
        assert_eq!(f.store.update_calls(), 0);
    }

    #[tokio::test]
    async fn new_submission_reopens_rating() {
        let f = summarize_only();
        let mut session = SessionState::new();

        f.workflow.summarize(&mut session, "one").await.unwrap();
        rate_current(&f, &mut session, Vote::Up).await.unwrap();
        f.workflow.summarize(&mut session, "two").await.unwrap();
        rate_current(&f, &mut session, Vote::Down).await.unwrap();

        assert_eq!(f.store.update_calls(), 2);
        let ratings: Vec<Rating> = {
            let mut rows = f.store.rows();
            rows.sort_by(|a, b| a.input_text.cmp(&b.input_text));
            rows.into_iter().map(|r| r.rating).collect()
        };
        assert_eq!(ratings, vec![Rating::Up, Rating::Down]);
    }

    #[tokio::test]
    async fn failed_update_leaves_gate_open() {
        let f = summarize_only();
        let mut session = SessionState::new();
        f.workflow.summarize(&mut session, "Hello world.").await.unwrap();

        f.store.set_failure(Some(StoreError::Write("locked".into())));
        let err = rate_current(&f, &mut session, Vote::Up).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Store(_)));
        assert!(!session.submitted());

        f.store.set_failure(None);
        rate_current(&f, &mut session, Vote::Up).await.unwrap();
        assert!(session.submitted());
        assert_eq!(f.store.update_calls(), 2);
    }

    #[tokio::test]
    async fn empty_input_after_result_keeps_previous_record_rateable() {
        let f = summarize_only();
        let mut session = SessionState::new();
        f.workflow.summarize(&mut session, "Hello world.").await.unwrap();

        f.workflow.summarize(&mut session, "  ").await.unwrap_err();
        rate_current(&f, &mut session, Vote::Up).await.unwrap();

        assert_eq!(f.store.rows()[0].rating, Rating::Up);
    }

    #[tokio::test]
    async fn vote_for_a_replaced_record_is_refused() {
        let f = summarize_only();
        let mut session = SessionState::new();

        f.workflow.summarize(&mut session, "first").await.unwrap();
        let first = session.key.clone();
        f.workflow.summarize(&mut session, "second").await.unwrap();

        let err = f
            .workflow
            .rate(&mut session, first.as_ref(), Vote::Up)
            .await
            .unwrap_err();

        assert_eq!(err, WorkflowError::Rating(RatingError::NothingToRate));
        assert_eq!(f.store.update_calls(), 0);
        assert!(!session.submitted());
        assert!(f.store.rows().iter().all(|r| r.rating == Rating::Unrated));
    }
}
