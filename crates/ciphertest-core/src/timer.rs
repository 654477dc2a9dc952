//! Countdown timer.
//!
//! A running countdown is two tokio tasks: a ticker that reports the
//! remaining whole seconds once per second, and a deadline that fires a
//! single expiry. Both feed the same channel. [`CountdownTimer::cancel`]
//! stops both and is safe to call any number of times.
//!
//! Aborting a task cannot retract an event it already queued, so every event
//! carries the generation of the countdown that produced it and must be
//! passed through [`CountdownTimer::observe`] before it is acted on.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

/// Notification produced by a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { generation: u64, remaining: u32 },
    Expired { generation: u64 },
}

impl TimerEvent {
    pub fn generation(&self) -> u64 {
        match self {
            TimerEvent::Tick { generation, .. } | TimerEvent::Expired { generation } => *generation,
        }
    }
}

/// Snapshot of the countdown for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub remaining_seconds: u32,
    pub running: bool,
}

/// A cancellable one-second countdown.
#[derive(Debug)]
pub struct CountdownTimer {
    events: UnboundedSender<TimerEvent>,
    state: TimerState,
    generation: u64,
    ticker: Option<JoinHandle<()>>,
    deadline: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    /// Create an idle timer that shows `initial_seconds` until started.
    pub fn new(initial_seconds: u32, events: UnboundedSender<TimerEvent>) -> Self {
        Self {
            events,
            state: TimerState {
                remaining_seconds: initial_seconds,
                running: false,
            },
            generation: 0,
            ticker: None,
            deadline: None,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.state.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Start counting down from `duration_secs`. Must be called from within
    /// a tokio runtime. A countdown already in progress is cancelled first.
    pub fn start(&mut self, duration_secs: u32) {
        self.cancel();
        self.generation += 1;
        self.state = TimerState {
            remaining_seconds: duration_secs,
            running: true,
        };
        let generation = self.generation;
        let period = Duration::from_secs(1);

        let events = self.events.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            for remaining in (1..duration_secs).rev() {
                interval.tick().await;
                if events.send(TimerEvent::Tick { generation, remaining }).is_err() {
                    break;
                }
            }
        }));

        let events = self.events.clone();
        self.deadline = Some(tokio::spawn(async move {
            time::sleep(Duration::from_secs(u64::from(duration_secs))).await;
            let _ = events.send(TimerEvent::Expired { generation });
        }));

        debug!(generation, duration_secs, "countdown started");
    }

    /// Stop ticks and expiry. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if let Some(handle) = self.deadline.take() {
            handle.abort();
        }
        if self.state.running {
            self.state.running = false;
            debug!(generation = self.generation, "countdown cancelled");
        }
    }

    /// Apply an event to the timer state.
    ///
    /// Returns the event if it belongs to the live countdown, or `None` for
    /// events from a cancelled, restarted or already expired countdown.
    pub fn observe(&mut self, event: TimerEvent) -> Option<TimerEvent> {
        if !self.state.running || event.generation() != self.generation {
            debug!(?event, generation = self.generation, "dropping stale timer event");
            return None;
        }
        match event {
            TimerEvent::Tick { remaining, .. } => {
                if remaining >= self.state.remaining_seconds {
                    return None;
                }
                self.state.remaining_seconds = remaining;
            }
            TimerEvent::Expired { .. } => {
                self.state.remaining_seconds = 0;
                self.cancel();
            }
        }
        Some(event)
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
