//! Persisted record types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::PipelineOutput;

// ---------------------------------------------------------------------------
// RecordKey
// ---------------------------------------------------------------------------

/// `(ID, SUB_ID)` pair identifying one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub id: String,
    pub sub_id: String,
}

impl RecordKey {
    /// Fresh random pair, 32-char lowercase hex each.
    pub fn generate() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            sub_id: Uuid::new_v4().simple().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Vote / Rating
// ---------------------------------------------------------------------------

/// A user rating action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn value(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

/// Stored rating: `-1`, `0` (not yet rated) or `+1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rating {
    Down,
    #[default]
    Unrated,
    Up,
}

impl Rating {
    pub fn value(self) -> i64 {
        match self {
            Rating::Down => -1,
            Rating::Unrated => 0,
            Rating::Up => 1,
        }
    }

    /// Inverse of [`value`](Self::value); `None` outside `{-1, 0, 1}`.
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Rating::Down),
            0 => Some(Rating::Unrated),
            1 => Some(Rating::Up),
            _ => None,
        }
    }
}

impl From<Vote> for Rating {
    fn from(vote: Vote) -> Self {
        match vote {
            Vote::Up => Rating::Up,
            Vote::Down => Rating::Down,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One output column value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputField {
    pub column: String,
    pub text: String,
}

/// One submission as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub input_text: String,
    pub outputs: Vec<OutputField>,
    pub rating: Rating,
}

impl Record {
    /// Build the unrated record for a completed pipeline run.
    pub fn from_output(key: RecordKey, input_text: &str, output: &PipelineOutput) -> Self {
        Self {
            key,
            input_text: input_text.to_string(),
            outputs: output
                .stages
                .iter()
                .map(|s| OutputField {
                    column: s.column.clone(),
                    text: s.text.clone(),
                })
                .collect(),
            rating: Rating::Unrated,
        }
    }

    /// Text stored under `column`.
    pub fn output(&self, column: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|f| f.column.eq_ignore_ascii_case(column))
            .map(|f| f.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StageOutput;

    #[test]
    fn generated_keys_are_distinct_hex() {
        let a = RecordKey::generate();
        let b = RecordKey::generate();

        assert_ne!(a, b);
        assert_ne!(a.id, a.sub_id);
        assert_eq!(a.id.len(), 32);
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn rating_values() {
        assert_eq!(Rating::from(Vote::Up).value(), 1);
        assert_eq!(Rating::from(Vote::Down).value(), -1);
        assert_eq!(Rating::default().value(), 0);
        assert_eq!(Rating::from_value(1), Some(Rating::Up));
        assert_eq!(Rating::from_value(2), None);
    }

    #[test]
    fn record_from_output_is_unrated() {
        let output = PipelineOutput {
            stages: vec![StageOutput {
                name: "summary".into(),
                label: "要約".into(),
                column: "SUMMARY".into(),
                text: "S".into(),
                elapsed_secs: 0.2,
            }],
        };

        let record = Record::from_output(RecordKey::generate(), "in", &output);

        assert_eq!(record.rating, Rating::Unrated);
        assert_eq!(record.output("summary"), Some("S"));
        assert_eq!(record.input_text, "in");
    }
}
