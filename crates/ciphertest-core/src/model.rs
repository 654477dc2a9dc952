//! Core data model types for ciphertest.
//!
//! These types describe the payload received from the server, the decrypted
//! answer key, the answer cells the subject fills in, and the records
//! emitted when a test run completes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TestError;

/// The obfuscated answer key as transmitted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Rows of encoded symbol references.
    pub data: Vec<Vec<u8>>,
    /// Obfuscation key, applied column-wise after a left rotation.
    pub mask: Vec<u8>,
}

impl EncryptedPayload {
    /// Total number of cells across all rows.
    pub fn cell_count(&self) -> usize {
        self.data.iter().map(Vec::len).sum()
    }
}

/// The plaintext answer key, same shape as [`EncryptedPayload::data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyGrid {
    pub rows: Vec<Vec<u8>>,
}

impl KeyGrid {
    pub fn new(rows: Vec<Vec<u8>>) -> Self {
        Self { rows }
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Cells in reading order: left to right, top to bottom.
    pub fn cells(&self) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().flatten().copied()
    }
}

/// A single keypad digit, 0 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    pub const MAX: u8 = 9;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Digit {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Digit::new(value).ok_or_else(|| format!("not a keypad digit: {value}"))
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Digit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c
                .to_digit(10)
                .and_then(|d| Digit::new(d as u8))
                .ok_or_else(|| format!("not a keypad digit: {trimmed}")),
            _ => Err(format!("not a keypad digit: {trimmed}")),
        }
    }
}

/// One answer slot of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCell {
    /// 1-based position in reading order.
    pub cell_index: u32,
    /// The symbol drawn above the cell.
    pub symbol_id: u8,
    /// The digit the key legend assigns to the symbol.
    pub correct_answer: Digit,
    /// What the subject entered, if the cell was reached.
    #[serde(default)]
    pub submitted_value: Option<Digit>,
}

impl AnswerCell {
    /// Lay out answer cells from a decrypted key grid.
    ///
    /// The legend maps symbol `n` to digit `n`, so a decrypted value is both
    /// the symbol to draw and the expected answer. Values the keypad cannot
    /// produce mean the payload is corrupt.
    pub fn from_grid(grid: &KeyGrid) -> Result<Vec<AnswerCell>, TestError> {
        grid.cells()
            .enumerate()
            .map(|(i, value)| {
                Digit::new(value)
                    .map(|correct_answer| AnswerCell {
                        cell_index: i as u32 + 1,
                        symbol_id: value,
                        correct_answer,
                        submitted_value: None,
                    })
                    .ok_or_else(|| {
                        TestError::config(format!(
                            "cell {} decrypts to {value}, outside the keypad digits",
                            i + 1
                        ))
                    })
            })
            .collect()
    }

    pub fn is_correct(&self) -> bool {
        self.submitted_value == Some(self.correct_answer)
    }
}

/// Result of a finished test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Number of correctly answered cells in the scored range.
    pub score: u32,
}

/// Which path brought the flow to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// The subject filled the last cell.
    AllAnswered,
    /// The countdown ran out first.
    TimerExpired,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionReason::AllAnswered => write!(f, "all answered"),
            CompletionReason::TimerExpired => write!(f, "timer expired"),
        }
    }
}

/// Everything the host needs to persist about a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub run_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub score: u32,
    pub last_answered_cell: u32,
    pub reason: CompletionReason,
}
