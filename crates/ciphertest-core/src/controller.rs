//! Test controller: the composition root of a single test run.
//!
//! Owns the decrypted key, the answer flow, the countdown and the scorer,
//! and exposes the handful of events a rendering layer delivers. Handlers
//! are called one at a time and each runs to completion.

use anyhow::Context;
use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cipher;
use crate::config::TestConfig;
use crate::error::TestError;
use crate::flow::{AnswerFlow, FlowStatus, SubmitOutcome};
use crate::model::{
    AnswerCell, CompletionReason, CompletionRecord, Digit, EncryptedPayload, KeyGrid, ScoreResult,
};
use crate::progress::TestProgress;
use crate::scoring::Scorer;
use crate::timer::{CountdownTimer, TimerEvent, TimerState};

/// Callbacks into the hosting screen.
pub trait TestHost {
    /// A new cell became the active one.
    fn on_cell_activated(&mut self, _cell_index: u32) {}

    /// The countdown moved; `label` is the text to display.
    fn on_timer_tick(&mut self, _remaining: u32, _label: &str) {}

    /// The run is over. Called exactly once per run.
    fn finish(&mut self, result: ScoreResult);
}

/// Host that ignores every callback.
pub struct NoopHost;

impl TestHost for NoopHost {
    fn finish(&mut self, _: ScoreResult) {}
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    /// The digit was recorded and `next` is now active.
    Recorded { cell: u32, next: u32 },
    /// The warm-up cell was filled; the countdown is running.
    Started { cell: u32, next: u32 },
    /// The last cell was filled and the run finished.
    Completed { cell: u32, result: ScoreResult },
    /// The screen has been torn down.
    Ignored,
}

/// Drives one encryption test run.
pub struct TestController<H: TestHost> {
    config: TestConfig,
    host: H,
    payload: EncryptedPayload,
    key: KeyGrid,
    flow: AnswerFlow,
    scorer: Scorer,
    timer: CountdownTimer,
    timer_events: UnboundedReceiver<TimerEvent>,
    run_id: Uuid,
    record: Option<CompletionRecord>,
    torn_down: bool,
}

impl<H: TestHost> TestController<H> {
    /// Decrypt `payload` and lay out the answer form.
    ///
    /// The payload must carry exactly `config.last_cell` cells.
    pub fn initialize(
        config: TestConfig,
        payload: EncryptedPayload,
        host: H,
    ) -> Result<Self, TestError> {
        let cell_count = payload.cell_count();
        if cell_count != config.last_cell as usize {
            return Err(TestError::config(format!(
                "payload has {cell_count} cells, the answer form needs {}",
                config.last_cell
            )));
        }

        let key = cipher::decrypt(&payload)?;
        let cells = AnswerCell::from_grid(&key)?;
        let flow = AnswerFlow::new(cells, config.first_scored_cell)?;
        let scorer = Scorer::new(config.first_scored_cell);

        let (tx, rx) = mpsc::unbounded_channel();
        let timer = CountdownTimer::new(config.duration_secs, tx);
        let run_id = Uuid::new_v4();

        info!(
            %run_id,
            cells = cell_count,
            first_scored = config.first_scored_cell,
            duration_secs = config.duration_secs,
            "encryption test initialized"
        );

        Ok(Self {
            config,
            host,
            payload,
            key,
            flow,
            scorer,
            timer,
            timer_events: rx,
            run_id,
            record: None,
            torn_down: false,
        })
    }

    /// Initialize from saved progress, calling `fetch` only when the
    /// progress does not already hold a payload.
    pub fn initialize_with_progress<F>(
        config: TestConfig,
        progress: &TestProgress,
        fetch: F,
        host: H,
    ) -> anyhow::Result<Self>
    where
        F: FnOnce() -> anyhow::Result<EncryptedPayload>,
    {
        let payload = match &progress.server_data {
            Some(saved) => {
                debug!("reusing payload from saved progress");
                saved.clone()
            }
            None => fetch().context("failed to obtain the test payload")?,
        };
        Ok(Self::initialize(config, payload, host)?)
    }

    /// Deliver a keypad digit to the active cell.
    pub fn on_key_press(&mut self, digit: Digit) -> Result<KeyPress, TestError> {
        if self.torn_down {
            return Ok(KeyPress::Ignored);
        }
        let Some(cell) = self.flow.active_cell() else {
            warn!(%digit, "key press after the test completed");
            return Err(TestError::InvalidState {
                action: "key press",
                status: self.flow.status(),
                active_cell: self.flow.last_cell(),
            });
        };

        match self.flow.submit(cell, digit)? {
            SubmitOutcome::Advanced { next } => {
                self.host.on_cell_activated(next);
                Ok(KeyPress::Recorded { cell, next })
            }
            SubmitOutcome::WarmUpFilled { next } => {
                self.on_first_input_touched()?;
                Ok(KeyPress::Started { cell, next })
            }
            SubmitOutcome::Completed => {
                let result = self.on_last_input_filled()?;
                Ok(KeyPress::Completed { cell, result })
            }
        }
    }

    /// The warm-up cell received a value: open the scored range and start
    /// the countdown. Must be called from within a tokio runtime.
    pub fn on_first_input_touched(&mut self) -> Result<(), TestError> {
        if self.torn_down {
            return Ok(());
        }
        self.flow.start()?;
        self.timer.start(self.config.duration_secs);
        info!(run_id = %self.run_id, duration_secs = self.config.duration_secs, "countdown started");

        let first = self.flow.first_scored_cell();
        self.host.on_cell_activated(first);
        let remaining = self.timer.remaining_seconds();
        let label = self.config.timer_label(remaining);
        self.host.on_timer_tick(remaining, &label);
        Ok(())
    }

    /// The last cell received a value: stop the countdown and finish.
    pub fn on_last_input_filled(&mut self) -> Result<ScoreResult, TestError> {
        if self.flow.status() != FlowStatus::Completed
            || self.flow.last_answered() != Some(self.flow.last_cell())
        {
            warn!(
                status = %self.flow.status(),
                last_answered = ?self.flow.last_answered(),
                "rejecting last input signal before the form is full"
            );
            return Err(TestError::InvalidState {
                action: "last input filled",
                status: self.flow.status(),
                active_cell: self.flow.active_cell().unwrap_or(self.flow.last_cell()),
            });
        }
        self.timer.cancel();
        Ok(self.finish(CompletionReason::AllAnswered))
    }

    /// Handle an event from the countdown. Returns the result if the event
    /// ended the run.
    pub fn on_timer_event(&mut self, event: TimerEvent) -> Option<ScoreResult> {
        if self.torn_down {
            debug!(?event, "timer event after teardown");
            return None;
        }
        match self.timer.observe(event)? {
            TimerEvent::Tick { remaining, .. } => {
                let label = self.config.timer_label(remaining);
                self.host.on_timer_tick(remaining, &label);
                None
            }
            TimerEvent::Expired { .. } => match self.flow.force_finish() {
                Ok(last) => {
                    debug!(last_answered = last, "time is up");
                    let label = self.config.timer_label(0);
                    self.host.on_timer_tick(0, &label);
                    Some(self.finish(CompletionReason::TimerExpired))
                }
                Err(TestError::TimerRace) => {
                    debug!("expiry arrived after completion");
                    None
                }
                Err(e) => {
                    warn!("ignoring expiry: {e}");
                    None
                }
            },
        }
    }

    /// Wait for the next countdown event. Pends forever while no countdown
    /// is running.
    pub async fn next_timer_event(&mut self) -> Option<TimerEvent> {
        self.timer_events.recv().await
    }

    fn finish(&mut self, reason: CompletionReason) -> ScoreResult {
        self.timer.cancel();
        let last_answered = self.flow.last_answered().unwrap_or(0);
        let result = self.scorer.score(self.flow.cells(), last_answered);
        if self.record.is_some() {
            return result;
        }

        info!(run_id = %self.run_id, score = result.score, last_answered, %reason, "encryption test finished");
        self.record = Some(CompletionRecord {
            run_id: self.run_id,
            completed_at: Utc::now(),
            score: result.score,
            last_answered_cell: last_answered,
            reason,
        });
        self.host.finish(result);
        result
    }

    /// Score of the run, once it has completed.
    pub fn get_result(&self) -> Option<ScoreResult> {
        self.flow
            .last_answered()
            .map(|last| self.scorer.score(self.flow.cells(), last))
    }

    pub fn completion(&self) -> Option<&CompletionRecord> {
        self.record.as_ref()
    }

    /// Merge this run into saved progress: keep an existing payload, add
    /// ours if absent, and record the score once finished.
    pub fn current_progress(&self, mut progress: TestProgress) -> TestProgress {
        if progress.server_data.is_none() {
            progress.server_data = Some(self.payload.clone());
        }
        if let Some(record) = &self.record {
            progress.score = Some(record.score);
        }
        progress
    }

    /// Stop the countdown for good; later events become no-ops.
    pub fn teardown(&mut self) {
        self.timer.cancel();
        self.torn_down = true;
        debug!(run_id = %self.run_id, "test torn down");
    }

    pub fn status(&self) -> FlowStatus {
        self.flow.status()
    }

    pub fn cells(&self) -> &[AnswerCell] {
        self.flow.cells()
    }

    pub fn active_cell(&self) -> Option<u32> {
        self.flow.active_cell()
    }

    pub fn is_active(&self, cell_index: u32) -> bool {
        self.flow.is_active(cell_index)
    }

    pub fn key_grid(&self) -> &KeyGrid {
        &self.key
    }

    /// Remaining seconds and whether the countdown is running.
    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn timer_label(&self) -> String {
        self.config.timer_label(self.timer.remaining_seconds())
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}
