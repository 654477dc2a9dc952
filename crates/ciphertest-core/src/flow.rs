//! Sequential answer flow.
//!
//! Exactly one cell accepts input at a time and the active cell only moves
//! forward. Cells before the scored range form a practice block that is
//! answerable from load; the last of them is the warm-up cell, whose value
//! signals that the subject is ready and the countdown should start.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TestError;
use crate::model::{AnswerCell, Digit};

/// Lifecycle of a single test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    NotStarted,
    Running,
    Completed,
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowStatus::NotStarted => write!(f, "not started"),
            FlowStatus::Running => write!(f, "running"),
            FlowStatus::Completed => write!(f, "completed"),
        }
    }
}

/// What a successful submit did to the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The next cell is now active.
    Advanced { next: u32 },
    /// The warm-up cell was filled; the scored range waits for `start`.
    WarmUpFilled { next: u32 },
    /// The last cell was filled and the flow is complete.
    Completed,
}

/// The answer form and its single active cell.
#[derive(Debug, Clone)]
pub struct AnswerFlow {
    cells: Vec<AnswerCell>,
    status: FlowStatus,
    active_cell: u32,
    last_answered: Option<u32>,
    first_scored: u32,
}

impl AnswerFlow {
    /// Build a flow over `cells`, which must be numbered `1..=n`.
    ///
    /// `first_scored` must leave at least one practice cell before it.
    pub fn new(cells: Vec<AnswerCell>, first_scored: u32) -> Result<Self, TestError> {
        if cells.is_empty() {
            return Err(TestError::config("answer form has no cells"));
        }
        if let Some((i, cell)) = cells
            .iter()
            .enumerate()
            .find(|(i, cell)| cell.cell_index as usize != i + 1)
        {
            return Err(TestError::config(format!(
                "cell at position {} is numbered {}",
                i + 1,
                cell.cell_index
            )));
        }
        let last_cell = cells.len() as u32;
        if first_scored < 2 || first_scored > last_cell {
            return Err(TestError::config(format!(
                "first scored cell {first_scored} must be within 2..={last_cell}"
            )));
        }

        Ok(Self {
            cells,
            status: FlowStatus::NotStarted,
            active_cell: 1,
            last_answered: None,
            first_scored,
        })
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    /// The cell accepting the next digit, if any.
    pub fn active_cell(&self) -> Option<u32> {
        (self.status != FlowStatus::Completed).then_some(self.active_cell)
    }

    pub fn is_active(&self, cell_index: u32) -> bool {
        self.active_cell() == Some(cell_index)
    }

    pub fn last_answered(&self) -> Option<u32> {
        self.last_answered
    }

    pub fn first_scored_cell(&self) -> u32 {
        self.first_scored
    }

    pub fn warm_up_cell(&self) -> u32 {
        self.first_scored - 1
    }

    pub fn last_cell(&self) -> u32 {
        self.cells.len() as u32
    }

    pub fn cells(&self) -> &[AnswerCell] {
        &self.cells
    }

    pub fn cell(&self, cell_index: u32) -> Option<&AnswerCell> {
        let pos = (cell_index as usize).checked_sub(1)?;
        self.cells.get(pos)
    }

    /// Record `value` into the active cell and move on.
    pub fn submit(&mut self, cell_index: u32, value: Digit) -> Result<SubmitOutcome, TestError> {
        let accepts = match self.status {
            FlowStatus::NotStarted => cell_index < self.first_scored,
            FlowStatus::Running => true,
            FlowStatus::Completed => false,
        };
        if !accepts || cell_index != self.active_cell {
            warn!(
                cell_index,
                active = self.active_cell,
                status = %self.status,
                "rejecting submit"
            );
            return Err(self.invalid("submit"));
        }

        self.cells[cell_index as usize - 1].submitted_value = Some(value);

        if cell_index == self.last_cell() {
            self.status = FlowStatus::Completed;
            self.last_answered = Some(cell_index);
            debug!(cell_index, "last cell filled, flow completed");
            return Ok(SubmitOutcome::Completed);
        }

        self.active_cell += 1;
        debug!(cell_index, next = self.active_cell, "cell answered");
        if cell_index == self.warm_up_cell() {
            Ok(SubmitOutcome::WarmUpFilled {
                next: self.active_cell,
            })
        } else {
            Ok(SubmitOutcome::Advanced {
                next: self.active_cell,
            })
        }
    }

    /// Open the scored range with the first scored cell active.
    pub fn start(&mut self) -> Result<(), TestError> {
        if self.status != FlowStatus::NotStarted {
            warn!(status = %self.status, active = self.active_cell, "rejecting start");
            return Err(self.invalid("start"));
        }
        self.status = FlowStatus::Running;
        self.active_cell = self.first_scored;
        debug!(active = self.active_cell, "scored range open");
        Ok(())
    }

    /// End the run early, keeping whatever was answered so far.
    ///
    /// Returns the last answered cell.
    pub fn force_finish(&mut self) -> Result<u32, TestError> {
        match self.status {
            FlowStatus::Running => {
                let last = self.active_cell - 1;
                self.status = FlowStatus::Completed;
                self.last_answered = Some(last);
                debug!(last_answered = last, "flow force-finished");
                Ok(last)
            }
            FlowStatus::Completed => Err(TestError::TimerRace),
            FlowStatus::NotStarted => Err(self.invalid("force_finish")),
        }
    }

    fn invalid(&self, action: &'static str) -> TestError {
        TestError::InvalidState {
            action,
            status: self.status,
            active_cell: self.active_cell,
        }
    }
}
