//! Pipeline runner: chains prediction stages, each feeding the next.
//!
//! # Pipeline flow
//!
//! ```text
//! normalized input
//!   └─▶ stage 1 (summarize)  → joined summary_text        [elapsed from upstream]
//!         └─▶ stage 2 (translate, optional) on the summary [elapsed from upstream]
//!               └─▶ PipelineOutput
//! ```
//!
//! Stages run strictly in order; the first failure aborts the run and is
//! returned unchanged.

use std::sync::Arc;

use crate::predict::{PredictionError, Predictor};

use super::stage::{Stage, StageOutput};

// ---------------------------------------------------------------------------
// PipelineOutput
// ---------------------------------------------------------------------------

/// Result bundle of a fully successful run: one entry per stage, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineOutput {
    pub stages: Vec<StageOutput>,
}

impl PipelineOutput {
    /// `計算時間: 要約0.50秒、翻訳1.20秒`
    pub fn timing_report(&self) -> String {
        let parts: Vec<String> = self
            .stages
            .iter()
            .map(|s| format!("{}{:.2}秒", s.label, s.elapsed_secs))
            .collect();
        format!("計算時間: {}", parts.join("、"))
    }
}

// ---------------------------------------------------------------------------
// PipelineRunner
// ---------------------------------------------------------------------------

/// Runs an ordered list of [`Stage`]s against one [`Predictor`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use summary_feedback::config::PredictionConfig;
/// use summary_feedback::pipeline::PipelineRunner;
/// use summary_feedback::predict::DataRobotClient;
///
/// # async fn example() {
/// let client = Arc::new(DataRobotClient::from_config(&PredictionConfig::default()));
/// let runner = PipelineRunner::summarize_and_translate(client, "smry-id", "trans-id");
///
/// let output = runner.run("Some long English text.").await.unwrap();
/// for stage in &output.stages {
///     println!("{}: {}", stage.label, stage.text);
/// }
/// println!("{}", output.timing_report());
/// # }
/// ```
pub struct PipelineRunner {
    predictor: Arc<dyn Predictor>,
    stages: Vec<Stage>,
}

impl PipelineRunner {
    pub fn new(predictor: Arc<dyn Predictor>, stages: Vec<Stage>) -> Self {
        Self { predictor, stages }
    }

    /// Single-stage runner: `run` yields the summary only.
    pub fn summarize(predictor: Arc<dyn Predictor>, deployment_id: &str) -> Self {
        Self::new(predictor, vec![Stage::summarize(deployment_id)])
    }

    /// Two-stage runner: summarize, then translate the summary.
    pub fn summarize_and_translate(
        predictor: Arc<dyn Predictor>,
        summarize_id: &str,
        translate_id: &str,
    ) -> Self {
        Self::new(
            predictor,
            vec![Stage::summarize(summarize_id), Stage::translate(translate_id)],
        )
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every stage in order.  Stage n+1 receives stage n's joined text.
    pub async fn run(&self, text: &str) -> Result<PipelineOutput, PredictionError> {
        let mut outputs = Vec::with_capacity(self.stages.len());
        let mut input = text.to_string();

        for stage in &self.stages {
            log::debug!("pipeline: stage `{}` → {}", stage.name, stage.deployment_id);

            let parsed = self
                .predictor
                .predict(&input, &stage.deployment_id)
                .await
                .inspect_err(|e| log::warn!("pipeline: stage `{}` failed: {e}", stage.name))?;
            let text = stage.extract(&parsed)?;

            outputs.push(StageOutput {
                name: stage.name.clone(),
                label: stage.label.clone(),
                column: stage.column.clone(),
                text: text.clone(),
                elapsed_secs: parsed.model_run_time_seconds,
            });
            input = text;
        }

        Ok(PipelineOutput { stages: outputs })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::ScriptedPredictor;

    const SUMMARY_JSON: &str =
        r#"{"prediction":[{"summary_text":"Hello."}],"model_run_time_seconds":0.5}"#;

    fn text<'a>(output: &'a PipelineOutput, name: &str) -> Option<&'a str> {
        output
            .stages
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.text.as_str())
    }

    const TRANSLATION_JSON: &str =
        r#"{"prediction":[{"translation_text":"こんにちは。"}],"model_run_time_seconds":1.25}"#;

    #[tokio::test]
    async fn summarize_scenario() {
        let predictor = Arc::new(ScriptedPredictor::new().ok("smry", SUMMARY_JSON));
        let runner = PipelineRunner::summarize(predictor, "smry");

        let output = runner.run("Hello world.").await.unwrap();

        assert_eq!(text(&output, "summary"), Some("Hello."));
        assert_eq!(text(&output, "translation"), None);
        assert!((output.stages[0].elapsed_secs - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn translate_receives_summary_not_source() {
        let predictor = Arc::new(
            ScriptedPredictor::new()
                .ok("smry", r#"{"prediction":[{"summary_text":"S"}],"model_run_time_seconds":0.1}"#)
                .ok("trans", TRANSLATION_JSON),
        );
        let shared: Arc<dyn Predictor> = Arc::clone(&predictor) as Arc<dyn Predictor>;
        let runner = PipelineRunner::summarize_and_translate(shared, "smry", "trans");

        runner.run("the original long text").await.unwrap();

        let calls = predictor.calls();
        assert_eq!(
            calls,
            vec![
                ("smry".to_string(), "the original long text".to_string()),
                ("trans".to_string(), "S".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn two_stage_output_carries_both_timings() {
        let predictor = Arc::new(
            ScriptedPredictor::new()
                .ok("smry", SUMMARY_JSON)
                .ok("trans", TRANSLATION_JSON),
        );
        let runner = PipelineRunner::summarize_and_translate(predictor, "smry", "trans");

        let output = runner.run("Hello world.").await.unwrap();

        assert_eq!(text(&output, "summary"), Some("Hello."));
        assert_eq!(text(&output, "translation"), Some("こんにちは。"));
        assert_eq!(output.stages.last().map(|s| s.text.as_str()), Some("こんにちは。"));
        assert_eq!(output.timing_report(), "計算時間: 要約0.50秒、翻訳1.25秒");
    }

    #[tokio::test]
    async fn multi_segment_summary_is_joined_before_chaining() {
        let predictor = Arc::new(
            ScriptedPredictor::new()
                .ok(
                    "smry",
                    r#"{"prediction":[{"summary_text":"A"},{"summary_text":"B"}],"model_run_time_seconds":0}"#,
                )
                .ok("trans", TRANSLATION_JSON),
        );
        let shared: Arc<dyn Predictor> = Arc::clone(&predictor) as Arc<dyn Predictor>;
        let runner = PipelineRunner::summarize_and_translate(shared, "smry", "trans");

        let output = runner.run("x").await.unwrap();

        assert_eq!(text(&output, "summary"), Some("A\nB"));
        assert_eq!(predictor.calls()[1].1, "A\nB");
    }

    #[tokio::test]
    async fn first_stage_failure_skips_second_stage() {
        let err = PredictionError::UpstreamError {
            status_code: 500,
            body: "boom".into(),
        };
        let predictor = Arc::new(
            ScriptedPredictor::new()
                .err("smry", err.clone())
                .ok("trans", TRANSLATION_JSON),
        );
        let shared: Arc<dyn Predictor> = Arc::clone(&predictor) as Arc<dyn Predictor>;
        let runner = PipelineRunner::summarize_and_translate(shared, "smry", "trans");

        assert_eq!(runner.run("x").await, Err(err));
        assert_eq!(predictor.calls().len(), 1);
    }

    #[tokio::test]
    async fn second_stage_failure_propagates_unchanged() {
        let predictor = Arc::new(
            ScriptedPredictor::new()
                .ok("smry", SUMMARY_JSON)
                .err("trans", PredictionError::Timeout),
        );
        let runner = PipelineRunner::summarize_and_translate(predictor, "smry", "trans");

        assert_eq!(runner.run("x").await, Err(PredictionError::Timeout));
    }

    #[tokio::test]
    async fn wrong_field_is_malformed() {
        // Summarize deployment answering with translation_text.
        let predictor = Arc::new(ScriptedPredictor::new().ok("smry", TRANSLATION_JSON));
        let runner = PipelineRunner::summarize(predictor, "smry");

        assert!(matches!(
            runner.run("x").await,
            Err(PredictionError::MalformedResponse(_))
        ));
    }
}
