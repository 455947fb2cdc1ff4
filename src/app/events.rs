//! Outbound render events.
//!
//! The [`DashService`](super::service::DashService) emits these through
//! the [`RenderSink`](super::ports::RenderSink) port.  Each event names
//! a screen region to update; a renderer that ignores an event it does
//! not display loses nothing.

use crate::diff::ChangeEvent;
use crate::hopper::HopperChange;
use crate::mode::ModeTransition;
use crate::notify::ProbeIndicator;
use crate::snapshot::NotifyRecord;
use crate::timer::TimerView;

/// Structured events emitted by the engine core.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A field-level snapshot difference (temperatures, pins, flags).
    Changed(ChangeEvent),

    /// The appliance moved between operating modes; carries the panel
    /// layout for the new mode.
    ModeTransition(ModeTransition),

    /// A notification record changed; carries the replacement record and
    /// the composed bell indicator for its probe.
    Notification {
        record: NotifyRecord,
        indicator: ProbeIndicator,
    },

    /// Local countdown prediction, emitted every engine tick while a
    /// timer is visible.
    TimerTick(TimerView),

    /// Between-poll predictions for the active cook: remaining seconds
    /// in a time-boxed mode, remaining lid-open pause, elapsed cook
    /// time.  Emitted every engine tick while any of them applies.
    CountdownTick {
        mode_remaining: Option<u64>,
        lid_remaining: Option<u64>,
        elapsed: Option<u64>,
    },

    /// Hopper level or pellet selection changed.
    Hopper(HopperChange),

    /// A poll cycle crossed the consecutive-failure ceiling.
    ConnectionLost { resource: &'static str },

    /// The first successful poll after an outage.
    ConnectionRestored { resource: &'static str },

    /// The backend's UI hash moved under us.  All polling has stopped;
    /// the user must be prompted to reload.
    StaleClient,

    /// A control write reached the backend but was rejected, or never
    /// arrived.  Local state is untouched; the next poll re-syncs.
    WriteFailed { action: &'static str },
}
