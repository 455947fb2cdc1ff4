//! Countdown timer synchronization.
//!
//! The timer's authoritative state lives on the backend as three epoch
//! timestamps (start, paused, end).  This module keeps a local copy,
//! predicts the countdown between polls, applies user actions
//! optimistically, and suppresses the single poll response that races an
//! in-flight write so the optimistic state is not clobbered.

use log::{debug, info};

use crate::config::DashConfig;
use crate::error::{InputError, Result};
use crate::snapshot::TimerRecord;

/// Longest accepted countdown (24 hours).
const MAX_TIMER_SECONDS: u64 = 24 * 60 * 60;

/// What the timer widget shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerUiState {
    Inactive,
    Running,
    Paused,
    /// The countdown has reached zero.  Latched locally until dismissed
    /// or superseded by a new start.
    Finished,
}

/// A timer action to submit to the backend.  Produced by the optimistic
/// mutators below; the caller is responsible for actually sending it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start {
        seconds: u64,
        shutdown: bool,
        keep_warm: bool,
    },
    Pause,
    Unpause,
    Stop,
}

/// Snapshot of the widget for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerView {
    pub state: TimerUiState,
    /// Seconds left on the countdown (frozen while paused, zero once
    /// finished).
    pub remaining: u64,
}

/// Local timer state machine.
#[derive(Debug, Default)]
pub struct TimerSync {
    record: TimerRecord,
    /// Zero-crossing latch.  The backend clears its record shortly after
    /// expiry; without the latch the finished banner would flicker away
    /// on the next poll.
    finished: bool,
    /// The user dismissed the finished banner.  Cleared by a new start.
    user_hidden: bool,
    /// Drop exactly one poll response after an optimistic local write.
    suppress_next: bool,
}

impl TimerSync {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Poll reconciliation ──────────────────────────────────

    /// Reconcile a fresh backend record.  Returns `true` when the local
    /// record was updated (i.e. the response was not suppressed).
    pub fn sync(&mut self, fresh: &TimerRecord) -> bool {
        if self.suppress_next {
            // One in-flight write is assumed; its racing response is
            // dropped, the next poll reflects the committed state.
            self.suppress_next = false;
            debug!("timer poll suppressed after local write");
            return false;
        }

        if fresh.start != 0 && fresh.start != self.record.start {
            // A new timer instance (started from this client's racing
            // write, or from another client).  Reveal it unconditionally.
            info!("new timer instance (start={})", fresh.start);
            self.finished = false;
            self.user_hidden = false;
        }

        self.record = *fresh;
        true
    }

    // ── Local prediction ─────────────────────────────────────

    /// Advance the local countdown to `now`, latching the finished state
    /// if the deadline has passed.  Called from the fast local tick, not
    /// from polls.
    pub fn tick(&mut self, now: u64) -> TimerView {
        if self.record.end != 0 && !self.finished {
            let basis = if self.record.paused != 0 {
                self.record.paused
            } else {
                now
            };
            if basis >= self.record.end {
                info!("timer finished (end={})", self.record.end);
                self.finished = true;
            }
        }
        self.view(now)
    }

    pub fn view(&self, now: u64) -> TimerView {
        let state = self.state();
        let remaining = match state {
            TimerUiState::Inactive | TimerUiState::Finished => 0,
            TimerUiState::Paused => self.record.end.saturating_sub(self.record.paused),
            TimerUiState::Running => self.record.end.saturating_sub(now),
        };
        TimerView { state, remaining }
    }

    pub fn state(&self) -> TimerUiState {
        if self.finished {
            TimerUiState::Finished
        } else if self.record.end == 0 {
            TimerUiState::Inactive
        } else if self.record.paused != 0 {
            TimerUiState::Paused
        } else {
            TimerUiState::Running
        }
    }

    /// Whether the widget should be shown at all.  A dismissed finished
    /// banner stays hidden until a new timer starts.
    pub fn visible(&self) -> bool {
        match self.state() {
            TimerUiState::Inactive => false,
            TimerUiState::Finished => !self.user_hidden,
            TimerUiState::Running | TimerUiState::Paused => true,
        }
    }

    /// Poll faster while a countdown is live so expiry lands on time.
    pub fn poll_interval_ms(&self, config: &DashConfig) -> u64 {
        match self.state() {
            TimerUiState::Running | TimerUiState::Paused => config.timer_active_interval_ms,
            TimerUiState::Inactive | TimerUiState::Finished => config.timer_idle_interval_ms,
        }
    }

    // ── User actions (optimistic) ────────────────────────────

    /// Start a new countdown.  The local record is updated immediately
    /// and the racing poll response is suppressed.
    pub fn start(
        &mut self,
        seconds: u64,
        shutdown: bool,
        keep_warm: bool,
        now: u64,
    ) -> Result<TimerCommand> {
        if seconds == 0 || seconds > MAX_TIMER_SECONDS {
            return Err(InputError::BadTimerDuration.into());
        }
        if shutdown && keep_warm {
            return Err(InputError::ConflictingActions.into());
        }
        self.record = TimerRecord {
            start: now,
            paused: 0,
            end: now + seconds,
            shutdown,
            keep_warm,
        };
        self.finished = false;
        self.user_hidden = false;
        self.suppress_next = true;
        Ok(TimerCommand::Start {
            seconds,
            shutdown,
            keep_warm,
        })
    }

    pub fn pause(&mut self, now: u64) -> TimerCommand {
        if self.state() == TimerUiState::Running {
            self.record.paused = now;
            self.suppress_next = true;
        }
        TimerCommand::Pause
    }

    /// Resume a paused countdown.  The deadline slides by the paused
    /// span so no time is lost.
    pub fn unpause(&mut self, now: u64) -> TimerCommand {
        if self.state() == TimerUiState::Paused {
            let paused_span = now.saturating_sub(self.record.paused);
            self.record.end += paused_span;
            self.record.paused = 0;
            self.suppress_next = true;
        }
        TimerCommand::Unpause
    }

    pub fn stop(&mut self) -> TimerCommand {
        self.record = TimerRecord::default();
        self.finished = false;
        self.suppress_next = true;
        TimerCommand::Stop
    }

    /// Dismiss the finished banner.  Purely local, nothing is sent.
    pub fn hide(&mut self) {
        if self.state() == TimerUiState::Finished {
            self.user_hidden = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(start: u64, end: u64) -> TimerRecord {
        TimerRecord {
            start,
            paused: 0,
            end,
            shutdown: false,
            keep_warm: false,
        }
    }

    #[test]
    fn inactive_by_default() {
        let t = TimerSync::new();
        assert_eq!(t.state(), TimerUiState::Inactive);
        assert!(!t.visible());
    }

    #[test]
    fn running_countdown_predicts_between_polls() {
        let mut t = TimerSync::new();
        t.sync(&running(1_000, 1_060));
        let v = t.tick(1_010);
        assert_eq!(v.state, TimerUiState::Running);
        assert_eq!(v.remaining, 50);
    }

    #[test]
    fn local_tick_finishes_past_deadline() {
        // Deadline passes between polls; the local tick alone must
        // latch the finished state.
        let mut t = TimerSync::new();
        t.sync(&running(1_000, 1_060));
        assert_eq!(t.tick(1_059).state, TimerUiState::Running);
        let v = t.tick(1_070);
        assert_eq!(v.state, TimerUiState::Finished);
        assert_eq!(v.remaining, 0);
        assert!(t.visible());
    }

    #[test]
    fn finished_latch_survives_backend_clearing() {
        let mut t = TimerSync::new();
        t.sync(&running(1_000, 1_060));
        t.tick(1_070);
        // Backend has cleaned up its record; banner must stay up.
        t.sync(&TimerRecord::default());
        assert_eq!(t.state(), TimerUiState::Finished);
        assert!(t.visible());
    }

    #[test]
    fn dismissed_banner_stays_hidden_until_new_start() {
        let mut t = TimerSync::new();
        t.sync(&running(1_000, 1_060));
        t.tick(1_070);
        t.hide();
        assert!(!t.visible());
        t.sync(&TimerRecord::default());
        assert!(!t.visible());

        // New instance reveals unconditionally.
        t.sync(&running(2_000, 2_120));
        assert_eq!(t.state(), TimerUiState::Running);
        assert!(t.visible());
    }

    #[test]
    fn paused_countdown_is_frozen() {
        let mut t = TimerSync::new();
        t.sync(&TimerRecord {
            start: 1_000,
            paused: 1_020,
            end: 1_060,
            shutdown: false,
            keep_warm: false,
        });
        assert_eq!(t.state(), TimerUiState::Paused);
        // Wall clock well past end, but the paused basis holds.
        let v = t.tick(2_000);
        assert_eq!(v.state, TimerUiState::Paused);
        assert_eq!(v.remaining, 40);
    }

    #[test]
    fn pause_past_deadline_finishes() {
        let mut t = TimerSync::new();
        t.sync(&TimerRecord {
            start: 1_000,
            paused: 1_065,
            end: 1_060,
            shutdown: false,
            keep_warm: false,
        });
        assert_eq!(t.tick(1_066).state, TimerUiState::Finished);
    }

    #[test]
    fn start_is_optimistic_and_suppresses_one_poll() {
        let mut t = TimerSync::new();
        let cmd = t.start(60, false, false, 1_000).unwrap();
        assert_eq!(
            cmd,
            TimerCommand::Start {
                seconds: 60,
                shutdown: false,
                keep_warm: false
            }
        );
        assert_eq!(t.state(), TimerUiState::Running);

        // Racing stale poll still shows no timer; it must be dropped.
        assert!(!t.sync(&TimerRecord::default()));
        assert_eq!(t.state(), TimerUiState::Running);

        // Next poll carries the committed record and applies.
        assert!(t.sync(&running(1_000, 1_060)));
        assert_eq!(t.view(1_010).remaining, 50);
    }

    #[test]
    fn suppression_expires_after_one_sync() {
        let mut t = TimerSync::new();
        t.start(60, false, false, 1_000).unwrap();
        t.sync(&TimerRecord::default());
        // Second stale poll is NOT suppressed; local state yields.
        assert!(t.sync(&TimerRecord::default()));
        assert_eq!(t.state(), TimerUiState::Inactive);
    }

    #[test]
    fn unpause_slides_the_deadline() {
        let mut t = TimerSync::new();
        t.sync(&running(1_000, 1_060));
        t.pause(1_020);
        assert_eq!(t.state(), TimerUiState::Paused);
        t.unpause(1_050);
        // 40s remained at pause; still 40s remain after a 30s pause.
        assert_eq!(t.view(1_050).remaining, 40);
        assert_eq!(t.state(), TimerUiState::Running);
    }

    #[test]
    fn stop_clears_everything() {
        let mut t = TimerSync::new();
        t.sync(&running(1_000, 1_060));
        t.stop();
        assert_eq!(t.state(), TimerUiState::Inactive);
        assert!(!t.visible());
    }

    #[test]
    fn zero_duration_rejected() {
        let mut t = TimerSync::new();
        assert!(t.start(0, false, false, 1_000).is_err());
    }

    #[test]
    fn over_day_duration_rejected() {
        let mut t = TimerSync::new();
        assert!(t.start(24 * 60 * 60 + 1, false, false, 1_000).is_err());
        assert!(t.start(24 * 60 * 60, false, false, 1_000).is_ok());
    }

    #[test]
    fn conflicting_end_actions_rejected() {
        let mut t = TimerSync::new();
        assert!(t.start(60, true, true, 1_000).is_err());
        assert_eq!(t.state(), TimerUiState::Inactive);
    }

    #[test]
    fn poll_interval_adapts_to_activity() {
        let config = DashConfig::default();
        let mut t = TimerSync::new();
        assert_eq!(t.poll_interval_ms(&config), config.timer_idle_interval_ms);
        t.start(60, false, false, 1_000).unwrap();
        assert_eq!(t.poll_interval_ms(&config), config.timer_active_interval_ms);
    }

    #[test]
    fn new_instance_from_another_client_revealed() {
        let mut t = TimerSync::new();
        t.sync(&running(1_000, 1_060));
        t.tick(1_070);
        t.hide();
        // A different client started a timer; reveal it.
        t.sync(&running(1_100, 1_200));
        assert!(t.visible());
        assert_eq!(t.state(), TimerUiState::Running);
    }
}
