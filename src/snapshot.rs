//! Wire data model for the polled backend state.
//!
//! Everything the dashboard core consumes arrives as one of three
//! resources, each polled on its own cadence:
//!
//! - [`Snapshot`] — the full telemetry read (`GET /api/current`), 500 ms
//! - [`HopperStatus`](crate::hopper::HopperStatus) — consumable level, slow
//! - [`TimerRecord`] — the independent countdown timer, 1–5 s
//!
//! All types deserialize with serde so that missing or mistyped fields
//! fail at the boundary instead of propagating `null`-driven branches
//! into the diff engine.  Cross-field constraints that serde cannot
//! express are checked by [`Snapshot::validate`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, SnapshotError};

// ---------------------------------------------------------------------------
// Operating mode
// ---------------------------------------------------------------------------

/// The appliance's high-level operating phase, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Startup,
    Reignite,
    Prime,
    Smoke,
    Hold,
    Shutdown,
    Monitor,
    Stop,
    Error,
    Recipe,
    Manual,
}

impl Mode {
    /// Modes that run against a fixed duration and show a countdown.
    pub fn is_time_boxed(self) -> bool {
        matches!(
            self,
            Self::Startup | Self::Reignite | Self::Prime | Self::Shutdown
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Startup => "Startup",
            Self::Reignite => "Reignite",
            Self::Prime => "Prime",
            Self::Smoke => "Smoke",
            Self::Hold => "Hold",
            Self::Shutdown => "Shutdown",
            Self::Monitor => "Monitor",
            Self::Stop => "Stop",
            Self::Error => "Error",
            Self::Recipe => "Recipe",
            Self::Manual => "Manual",
        }
    }
}

// ---------------------------------------------------------------------------
// Probe readings
// ---------------------------------------------------------------------------

/// One probe's current reading plus connectivity/battery metadata.
///
/// `temp` is `None` when the probe is enabled but not reporting (the
/// dashboard hides the card rather than showing a stale value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReading {
    #[serde(default)]
    pub temp: Option<f64>,
    /// Whether this is the primary (pit) probe.  At most one per snapshot.
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub connected: bool,
    /// Battery percent for wireless probes; `None` for wired.
    #[serde(default)]
    pub battery: Option<u8>,
}

// ---------------------------------------------------------------------------
// Output pins
// ---------------------------------------------------------------------------

/// Discrete output pin states reported each poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutPins {
    pub fan: bool,
    pub auger: bool,
    pub igniter: bool,
}

/// Identity of a single output pin, used in change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutPin {
    Fan,
    Auger,
    Igniter,
}

// ---------------------------------------------------------------------------
// Notification records
// ---------------------------------------------------------------------------

/// Which threshold rule a [`NotifyRecord`] implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Notify when the probe reaches the target (rising to doneness).
    Target,
    /// Notify when the reading exceeds a high limit.
    LimitHigh,
    /// Notify when the reading falls below a low limit.
    LimitLow,
}

/// One armable threshold/target rule bound to a probe.
///
/// The backend owns the set of records; the client holds a cached copy
/// and only ever issues full-replacement writes of the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyRecord {
    /// Probe label this rule is bound to.
    pub label: String,
    pub rule: RuleKind,
    /// Whether the rule is armed (the backend calls this `req`).
    pub armed: bool,
    pub target: i32,
    /// Companion action: shut the appliance down when triggered.
    #[serde(default)]
    pub shutdown: bool,
    /// Companion action: drop to keep-warm when triggered.
    #[serde(default)]
    pub keep_warm: bool,
    /// Companion action: attempt reignition (low-limit rules only).
    #[serde(default)]
    pub reignite: bool,
    /// Latched: the crossing condition has been met since arming.
    #[serde(default)]
    pub triggered: bool,
    /// Estimated seconds to target (target rules only, backend-computed).
    #[serde(default)]
    pub eta: Option<u64>,
}

impl NotifyRecord {
    /// A disarmed record for `label`/`rule` with everything cleared.
    pub fn disarmed(label: &str, rule: RuleKind) -> Self {
        Self {
            label: label.to_string(),
            rule,
            armed: false,
            target: 0,
            shutdown: false,
            keep_warm: false,
            reignite: false,
            triggered: false,
            eta: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Timer record
// ---------------------------------------------------------------------------

/// The independent countdown timer as reported by `GET /api/get/timer`.
///
/// All three timestamps are epoch seconds.  `start == 0` means inactive,
/// `paused == 0` means not paused.  The `finished` latch is client-side
/// state and deliberately not part of the wire record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerRecord {
    pub start: u64,
    pub paused: u64,
    pub end: u64,
    #[serde(default)]
    pub shutdown: bool,
    #[serde(default)]
    pub keep_warm: bool,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One polled, self-consistent read of backend state.
///
/// Immutable once accepted: the diff engine compares the incoming
/// snapshot against the previous one and the service replaces its cache
/// wholesale after the change pass completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: Mode,
    /// Step index inside a Recipe super-mode.  Two consecutive steps may
    /// share an inner mode, so the step index is what detects transitions.
    #[serde(default)]
    pub recipe_step: Option<u32>,
    /// Inner mode while in Recipe (e.g. `Recipe | Hold`).
    #[serde(default)]
    pub recipe_mode: Option<Mode>,

    /// Backend configuration hash.  A change while a client is running
    /// means the client's assumptions are stale and it must fully reload.
    pub ui_hash: String,

    /// Readings keyed by probe label (uniqueness enforced by the backend).
    pub probes: BTreeMap<String, ProbeReading>,
    /// Primary setpoint, meaningful in `Hold`.
    pub setpoint: i32,

    pub outpins: OutPins,
    /// Pellet feed duty mode (0–9).
    #[serde(default)]
    pub p_mode: u8,
    #[serde(default)]
    pub s_plus: bool,

    /// Epoch seconds when the current time-boxed mode began.
    #[serde(default)]
    pub start_time: u64,
    #[serde(default)]
    pub start_duration: u64,
    #[serde(default)]
    pub prime_duration: u64,
    #[serde(default)]
    pub shutdown_duration: u64,
    /// Epoch seconds of cook start; 0 when no cook is running.
    #[serde(default)]
    pub startup_timestamp: u64,

    #[serde(default)]
    pub lid_open: bool,
    /// Epoch seconds when lid-open PID pause auto-resumes.
    #[serde(default)]
    pub lid_open_endtime: u64,

    #[serde(default)]
    pub notify: Vec<NotifyRecord>,
}

impl Snapshot {
    /// Cross-field validation that serde cannot express.
    ///
    /// Rejecting here keeps the diff engine and notification cache free
    /// of defensive branches: once a snapshot is accepted it is known to
    /// be internally consistent.
    pub fn validate(&self) -> Result<()> {
        for record in &self.notify {
            if record.shutdown && record.keep_warm {
                return Err(Error::Snapshot(SnapshotError::ConflictingActions));
            }
            if !self.probes.contains_key(&record.label) {
                return Err(Error::Snapshot(SnapshotError::UnknownProbeLabel));
            }
        }
        let primaries = self.probes.values().filter(|p| p.primary).count();
        if primaries > 1 {
            return Err(Error::Snapshot(SnapshotError::MultiplePrimaryProbes));
        }
        if self.mode == Mode::Recipe && self.recipe_step.is_none() {
            return Err(Error::Snapshot(SnapshotError::RecipeWithoutStep));
        }
        Ok(())
    }

    /// Label of the primary probe, if one is reported.
    pub fn primary_label(&self) -> Option<&str> {
        self.probes
            .iter()
            .find(|(_, p)| p.primary)
            .map(|(label, _)| label.as_str())
    }

    /// Current reading for `label`, if present and reporting.
    pub fn reading(&self, label: &str) -> Option<f64> {
        self.probes.get(label).and_then(|p| p.temp)
    }
}

// ---------------------------------------------------------------------------
// Control update (full-object write)
// ---------------------------------------------------------------------------

/// Body of `POST /api/control`.
///
/// The write contract is full-replace, never partial patch: when the
/// notification list is present it is the *entire* list, built by
/// [`ControlWriteBuilder`](crate::notify::ControlWriteBuilder).  The
/// response is an echo/ack only — the client never merges state back
/// from this call and instead waits for the next poll.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ControlUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_data: Option<Vec<NotifyRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setpoint: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_plus: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pwm_control: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hopper_check: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_snapshot() -> Snapshot {
        crate::test_support::snapshot_with_probe("grill", 165.0)
    }

    #[test]
    fn valid_snapshot_passes() {
        assert!(base_snapshot().validate().is_ok());
    }

    #[test]
    fn conflicting_actions_rejected() {
        let mut snap = base_snapshot();
        let mut rec = NotifyRecord::disarmed("grill", RuleKind::Target);
        rec.shutdown = true;
        rec.keep_warm = true;
        snap.notify.push(rec);
        assert!(matches!(
            snap.validate(),
            Err(Error::Snapshot(SnapshotError::ConflictingActions))
        ));
    }

    #[test]
    fn notify_for_unknown_probe_rejected() {
        let mut snap = base_snapshot();
        snap.notify
            .push(NotifyRecord::disarmed("ghost", RuleKind::LimitHigh));
        assert!(matches!(
            snap.validate(),
            Err(Error::Snapshot(SnapshotError::UnknownProbeLabel))
        ));
    }

    #[test]
    fn recipe_mode_requires_step_index() {
        let mut snap = base_snapshot();
        snap.mode = Mode::Recipe;
        snap.recipe_step = None;
        assert!(snap.validate().is_err());
        snap.recipe_step = Some(0);
        snap.recipe_mode = Some(Mode::Hold);
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn serde_roundtrip() {
        let snap = base_snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }

    #[test]
    fn missing_required_field_fails_fast() {
        // No `mode` — must be a decode error, not a default.
        let json = r#"{"ui_hash":"x","probes":{},"setpoint":0,
                       "outpins":{"fan":false,"auger":false,"igniter":false}}"#;
        assert!(serde_json::from_str::<Snapshot>(json).is_err());
    }

    #[test]
    fn control_update_omits_absent_sections() {
        let update = ControlUpdate {
            s_plus: Some(true),
            ..ControlUpdate::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("s_plus"));
        assert!(!json.contains("notify_data"));
        assert!(!json.contains("setpoint"));
    }
}
