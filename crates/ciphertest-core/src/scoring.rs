//! Scoring of a completed answer form.

use crate::model::{AnswerCell, ScoreResult};

/// Counts correct answers in the scored range.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    first_scored: u32,
}

impl Scorer {
    pub fn new(first_scored: u32) -> Self {
        Self { first_scored }
    }

    /// Score cells `first_scored..=last_answered`.
    ///
    /// Cells past `last_answered` are left out entirely rather than counted
    /// as wrong. A cell without a submitted value inside the range counts as
    /// wrong.
    pub fn score(&self, cells: &[AnswerCell], last_answered: u32) -> ScoreResult {
        let score = cells
            .iter()
            .filter(|c| (self.first_scored..=last_answered).contains(&c.cell_index))
            .filter(|c| c.is_correct())
            .count() as u32;
        ScoreResult { score }
    }
}
