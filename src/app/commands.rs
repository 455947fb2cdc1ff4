//! Inbound commands to the engine.
//!
//! These represent user actions (button presses, slider commits, form
//! submits) that the [`DashService`](super::service::DashService)
//! validates locally and translates into backend writes.

use crate::snapshot::Mode;

/// User actions the renderer can send into the engine core.
#[derive(Debug, Clone, PartialEq)]
pub enum DashCommand {
    /// Request an operating mode change (the mode button row).
    SetMode(Mode),

    /// Commit a new primary setpoint.  Only honored in Hold.
    SetSetpoint(i32),

    /// Toggle smoke-plus.
    SetSmokePlus(bool),

    /// Arm the target (doneness) rule for a probe.
    ArmTargetNotify {
        label: String,
        target: i32,
        shutdown: bool,
        keep_warm: bool,
    },

    /// Arm the high-limit rule for a probe.
    ArmHighLimit {
        label: String,
        target: i32,
        shutdown: bool,
    },

    /// Arm the low-limit rule for a probe.
    ArmLowLimit {
        label: String,
        target: i32,
        shutdown: bool,
        reignite: bool,
    },

    /// Disarm every rule for a probe (the bell's cancel action).
    CancelNotify { label: String },

    /// Ask the backend to re-measure the hopper level now.
    RequestHopperCheck,

    /// Start the countdown timer.
    TimerStart {
        seconds: u64,
        shutdown: bool,
        keep_warm: bool,
    },

    /// Pause the running timer.
    TimerPause,

    /// Resume a paused timer.
    TimerResume,

    /// Stop and clear the timer.
    TimerStop,

    /// Dismiss the finished-timer banner.  Purely local.
    HideTimer,
}
