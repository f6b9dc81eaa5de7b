use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::sheets::CellValue;

/// Header the response sheet gives the submission time column.
pub const TIMESTAMP_LABEL: &str = "Timestamp";
/// Header of the collected respondent email column.
pub const EMAIL_LABEL: &str = "Email Address";

/// One completed form response, keyed by question label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Submission {
    answers: BTreeMap<String, String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, label: impl Into<String>, answer: impl Into<String>) -> Self {
        self.answers.insert(label.into(), answer.into());
        self
    }

    /// Pairs a response row with the header row. Columns without a header
    /// are dropped; missing cells become empty answers. A numeric timestamp
    /// cell is a date serial and is rendered as a readable date.
    pub fn from_row(headers: &[CellValue], row: &[CellValue]) -> Self {
        let answers = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, header)| {
                let label = header.to_text();
                if label.is_empty() {
                    return None;
                }
                let answer = match row.get(idx) {
                    Some(cell) if label == TIMESTAMP_LABEL => cell.to_timestamp_text(),
                    Some(cell) => cell.to_text(),
                    None => String::new(),
                };
                Some((label, answer))
            })
            .collect();
        Self { answers }
    }

    /// First non-blank answer among `labels`.
    pub fn answer(&self, labels: &[&str]) -> Option<&str> {
        labels
            .iter()
            .filter_map(|label| self.answers.get(*label))
            .map(|answer| answer.trim())
            .find(|answer| !answer.is_empty())
    }

    /// Answers in label order.
    pub fn answers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers
            .iter()
            .map(|(label, answer)| (label.as_str(), answer.as_str()))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
