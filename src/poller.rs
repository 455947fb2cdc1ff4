//! Poll cycle bookkeeping.
//!
//! Each backend resource is polled on its own fixed cadence.  A cycle
//! tracks when it is next due, counts consecutive failures against the
//! offline ceiling, and can be cancelled permanently (the stale-client
//! path).  Time is supplied by the caller in monotonic milliseconds so
//! the whole module is host-testable.

use log::{info, warn};

/// One-shot connectivity edge reported by a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleHealth {
    /// Consecutive failures exceeded the ceiling.  Emitted once per
    /// outage, on the first failure past the ceiling.
    WentOffline,
    /// First success after an offline period.
    BackOnline,
}

/// A single recurring poll.
#[derive(Debug)]
pub struct PollCycle {
    label: &'static str,
    period_ms: u64,
    next_due_ms: u64,
    error_count: u32,
    max_errors: u32,
    offline: bool,
    cancelled: bool,
}

impl PollCycle {
    pub fn new(label: &'static str, period_ms: u64, max_errors: u32) -> Self {
        Self {
            label,
            period_ms,
            next_due_ms: 0,
            error_count: 0,
            max_errors,
            offline: false,
            cancelled: false,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Whether the cycle should run at `now_ms`.  The first call is
    /// always due so startup does not wait a full period.
    pub fn due(&self, now_ms: u64) -> bool {
        !self.cancelled && now_ms >= self.next_due_ms
    }

    /// Schedule the next run.  Called by the driver once the poll has
    /// been issued, success or not, so a slow backend cannot compress
    /// the cadence.
    pub fn reschedule(&mut self, now_ms: u64) {
        self.next_due_ms = now_ms + self.period_ms;
    }

    /// Adjust the cadence (the timer cycle speeds up while a countdown
    /// is live).  Takes effect from the next reschedule.
    pub fn set_period(&mut self, period_ms: u64) {
        self.period_ms = period_ms;
    }

    /// Pull the next run forward to `due_ms` if it is currently later
    /// (one-shot early re-poll after a manual refresh).  The regular
    /// cadence resumes afterwards.
    pub fn expedite(&mut self, due_ms: u64) {
        if due_ms < self.next_due_ms {
            self.next_due_ms = due_ms;
        }
    }

    pub fn record_success(&mut self) -> Option<CycleHealth> {
        self.error_count = 0;
        if self.offline {
            self.offline = false;
            info!("{} poll recovered", self.label);
            return Some(CycleHealth::BackOnline);
        }
        None
    }

    /// Count one failed poll.  Transient failures below the ceiling are
    /// absorbed silently; the edge past the ceiling is reported exactly
    /// once.
    pub fn record_failure(&mut self) -> Option<CycleHealth> {
        self.error_count += 1;
        if self.error_count > self.max_errors && !self.offline {
            self.offline = true;
            warn!(
                "{} poll offline after {} consecutive failures",
                self.label, self.error_count
            );
            return Some(CycleHealth::WentOffline);
        }
        None
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Stop this cycle permanently.  There is no restart; a cancelled
    /// client is expected to fully reload.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            info!("{} poll cancelled", self.label);
            self.cancelled = true;
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
