//! Cancellable periodic schedule driving dashboard refreshes.
//!
//! The poller does not own a thread or a timer. The driver (the controller's
//! event loop, or a test) asks [`Poller::time_until_next`] how long to wait
//! and calls [`Poller::fire_due`] with the current instant. This keeps
//! scheduling deterministic under simulated time.
//!
//! Invariants:
//! - At most one schedule is active; `start` replaces the previous one.
//! - Tick `N` of a schedule started at `t0` is due at `t0 + N * interval`.
//! - A failing callback never cancels the schedule.

use std::time::{Duration, Instant};

use crate::activity;

/// Callback invoked on every tick with the 1-based tick number.
pub type TickCallback = Box<dyn FnMut(u64) -> anyhow::Result<()>>;

/// Outcome of one [`Poller::fire_due`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireReport {
    pub fired: bool,
    pub failed: bool,
    /// Ticks skipped because the driver fell behind by more than one interval.
    pub coalesced: u64,
}

struct Schedule {
    interval: Duration,
    started_at: Instant,
    /// Number of the next tick to fire (1-based).
    next_tick: u64,
    callback: TickCallback,
}

impl Schedule {
    fn due_at(&self, tick: u64) -> Instant {
        self.started_at + self.interval.saturating_mul(tick.min(u32::MAX as u64) as u32)
    }
}

/// Single-schedule periodic poller.
#[derive(Default)]
pub struct Poller {
    schedule: Option<Schedule>,
    next_id: u64,
    failures: u64,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start invoking `callback` every `interval`, first at `now + interval`.
    ///
    /// Any running schedule is stopped first. Returns the schedule id.
    pub fn start(
        &mut self,
        interval: Duration,
        now: Instant,
        callback: impl FnMut(u64) -> anyhow::Result<()> + 'static,
    ) -> u64 {
        self.stop();
        self.next_id += 1;
        let interval = interval.max(Duration::from_millis(1));
        self.schedule = Some(Schedule {
            interval,
            started_at: now,
            next_tick: 1,
            callback: Box::new(callback),
        });
        self.next_id
    }

    /// Cancel the active schedule. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        self.schedule.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.schedule.as_ref().map(|s| s.interval)
    }

    /// Total callback failures since creation.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// When the next tick is due.
    pub fn next_due(&self) -> Option<Instant> {
        self.schedule.as_ref().map(|s| s.due_at(s.next_tick))
    }

    /// Time to wait from `now` until the next tick, zero if already due.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due()
            .map(|due| due.saturating_duration_since(now))
    }

    /// Fire the tick that is due at `now`, if any.
    ///
    /// At most one callback runs per call. Ticks missed entirely (driver
    /// late by more than one interval) are coalesced and the schedule jumps
    /// to the first tick due after `now`.
    pub fn fire_due(&mut self, now: Instant) -> FireReport {
        let Some(schedule) = self.schedule.as_mut() else {
            return FireReport::default();
        };
        if now < schedule.due_at(schedule.next_tick) {
            return FireReport::default();
        }

        let elapsed = now.duration_since(schedule.started_at);
        let latest_due = (elapsed.as_nanos() / schedule.interval.as_nanos().max(1)) as u64;
        let coalesced = latest_due.saturating_sub(schedule.next_tick);
        let tick = latest_due;
        schedule.next_tick = latest_due + 1;

        let failed = match (schedule.callback)(tick) {
            Ok(()) => false,
            Err(e) => {
                activity::warn("poll.tick_failed", &format!("tick {tick}: {e:#}"));
                true
            }
        };
        if failed {
            self.failures += 1;
        }

        FireReport {
            fired: true,
            failed,
            coalesced,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
