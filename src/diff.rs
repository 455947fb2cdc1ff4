//! Snapshot diff engine.
//!
//! Pure value comparison between the last-accepted snapshot and a fresh
//! one.  The engine holds no state of its own: the service owns the
//! cache and passes it in, which keeps [`reconcile`] trivially testable
//! and lets several dashboard instances coexist without shared globals.
//!
//! ```text
//!   previous ──┐
//!              ├──▶ reconcile() ──▶ ChangeSet | StaleClient
//!   incoming ──┘
//! ```
//!
//! Two comparisons get special treatment:
//!
//! - The UI-version hash is only *baselined* on the first call.  Any
//!   later difference means the backend configuration changed underneath
//!   a running client; localized patching is unsafe, so the outcome is
//!   [`Reconciliation::StaleClient`] instead of a change event.
//! - Notification records use the material-change rule from
//!   [`notify`](crate::notify): only the fields that affect rendering
//!   participate in the comparison, and a changed record is replaced in
//!   the cache wholesale.

use crate::notify::material_change;
use crate::snapshot::{Mode, NotifyRecord, OutPin, Snapshot};

// ---------------------------------------------------------------------------
// Change events
// ---------------------------------------------------------------------------

/// One field-level difference between consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// Operating mode changed.  `from` is `None` on the initial pass.
    ModeChanged { from: Option<Mode>, to: Mode },
    /// Recipe step advanced (or the inner mode of the same step changed).
    RecipeStepChanged {
        step: u32,
        inner: Option<Mode>,
    },
    /// A probe's reported temperature changed (or stopped reporting).
    ProbeTemp { label: String, temp: Option<f64> },
    /// A probe's connectivity flag flipped.
    ProbeConnected { label: String, connected: bool },
    /// A probe's battery percentage changed.
    ProbeBattery { label: String, percent: Option<u8> },
    /// A probe appeared in or vanished from the snapshot.
    ProbeSetChanged,
    /// Primary setpoint changed.
    SetpointChanged(i32),
    /// A discrete output pin flipped.
    OutPinChanged { pin: OutPin, on: bool },
    /// Pellet feed p-mode changed.
    PModeChanged(u8),
    /// Smoke-plus flag flipped.
    SmokePlusChanged(bool),
    /// Lid-open detection flipped (meaningful in Hold).
    LidOpenChanged(bool),
    /// Cook start timestamp changed (0 means no cook running).
    ElapsedBaselineChanged(u64),
    /// A notification record materially changed; carries the replacement.
    NotifyChanged(NotifyRecord),
}

/// Minimal set of change events for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    events: Vec<ChangeEvent>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter()
    }

    fn push(&mut self, event: ChangeEvent) {
        self.events.push(event);
    }
}

impl IntoIterator for ChangeSet {
    type Item = ChangeEvent;
    type IntoIter = std::vec::IntoIter<ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Ordinary pass: zero or more field changes.
    Changes(ChangeSet),
    /// The UI-version hash moved after baseline.  The caller must stop
    /// polling entirely and prompt a full reload.
    StaleClient,
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

/// Compare `incoming` against the previously accepted snapshot.
///
/// With `previous == None` every tracked field is reported changed
/// (initialize semantics) and the UI hash is baselined without
/// comparison.  On later passes only fields that differ by value
/// equality produce events; reconciling an identical snapshot yields an
/// empty set.
pub fn reconcile(previous: Option<&Snapshot>, incoming: &Snapshot) -> Reconciliation {
    let Some(prev) = previous else {
        return Reconciliation::Changes(initialize(incoming));
    };

    if prev.ui_hash != incoming.ui_hash {
        return Reconciliation::StaleClient;
    }

    let mut set = ChangeSet::default();

    // Mode, and Recipe step identity.  Inside Recipe the step index is
    // the transition signal: consecutive steps may share an inner mode.
    if prev.mode != incoming.mode {
        set.push(ChangeEvent::ModeChanged {
            from: Some(prev.mode),
            to: incoming.mode,
        });
    } else if incoming.mode == Mode::Recipe && prev.recipe_step != incoming.recipe_step {
        if let Some(step) = incoming.recipe_step {
            set.push(ChangeEvent::RecipeStepChanged {
                step,
                inner: incoming.recipe_mode,
            });
        }
    }

    // Probe readings and health metadata.
    if prev.probes.len() != incoming.probes.len()
        || !prev.probes.keys().eq(incoming.probes.keys())
    {
        set.push(ChangeEvent::ProbeSetChanged);
    }
    for (label, reading) in &incoming.probes {
        match prev.probes.get(label) {
            Some(old) => {
                if old.temp != reading.temp {
                    set.push(ChangeEvent::ProbeTemp {
                        label: label.clone(),
                        temp: reading.temp,
                    });
                }
                if old.connected != reading.connected {
                    set.push(ChangeEvent::ProbeConnected {
                        label: label.clone(),
                        connected: reading.connected,
                    });
                }
                if old.battery != reading.battery {
                    set.push(ChangeEvent::ProbeBattery {
                        label: label.clone(),
                        percent: reading.battery,
                    });
                }
            }
            None => {
                set.push(ChangeEvent::ProbeTemp {
                    label: label.clone(),
                    temp: reading.temp,
                });
            }
        }
    }

    if prev.setpoint != incoming.setpoint {
        set.push(ChangeEvent::SetpointChanged(incoming.setpoint));
    }

    if prev.outpins.fan != incoming.outpins.fan {
        set.push(ChangeEvent::OutPinChanged {
            pin: OutPin::Fan,
            on: incoming.outpins.fan,
        });
    }
    if prev.outpins.auger != incoming.outpins.auger {
        set.push(ChangeEvent::OutPinChanged {
            pin: OutPin::Auger,
            on: incoming.outpins.auger,
        });
    }
    if prev.outpins.igniter != incoming.outpins.igniter {
        set.push(ChangeEvent::OutPinChanged {
            pin: OutPin::Igniter,
            on: incoming.outpins.igniter,
        });
    }

    if prev.p_mode != incoming.p_mode {
        set.push(ChangeEvent::PModeChanged(incoming.p_mode));
    }
    if prev.s_plus != incoming.s_plus {
        set.push(ChangeEvent::SmokePlusChanged(incoming.s_plus));
    }
    if prev.lid_open != incoming.lid_open {
        set.push(ChangeEvent::LidOpenChanged(incoming.lid_open));
    }
    if prev.startup_timestamp != incoming.startup_timestamp {
        set.push(ChangeEvent::ElapsedBaselineChanged(incoming.startup_timestamp));
    }

    // Notification records: material-change rule, keyed by (label, rule).
    for record in &incoming.notify {
        let old = prev
            .notify
            .iter()
            .find(|r| r.label == record.label && r.rule == record.rule);
        let changed = match old {
            Some(old) => material_change(old, record),
            None => true,
        };
        if changed {
            set.push(ChangeEvent::NotifyChanged(record.clone()));
        }
    }

    Reconciliation::Changes(set)
}

/// First-pass change set: report every tracked field.
fn initialize(incoming: &Snapshot) -> ChangeSet {
    let mut set = ChangeSet::default();

    set.push(ChangeEvent::ModeChanged {
        from: None,
        to: incoming.mode,
    });
    if incoming.mode == Mode::Recipe {
        if let Some(step) = incoming.recipe_step {
            set.push(ChangeEvent::RecipeStepChanged {
                step,
                inner: incoming.recipe_mode,
            });
        }
    }
    for (label, reading) in &incoming.probes {
        set.push(ChangeEvent::ProbeTemp {
            label: label.clone(),
            temp: reading.temp,
        });
        set.push(ChangeEvent::ProbeConnected {
            label: label.clone(),
            connected: reading.connected,
        });
        if reading.battery.is_some() {
            set.push(ChangeEvent::ProbeBattery {
                label: label.clone(),
                percent: reading.battery,
            });
        }
    }
    set.push(ChangeEvent::SetpointChanged(incoming.setpoint));
    set.push(ChangeEvent::OutPinChanged {
        pin: OutPin::Fan,
        on: incoming.outpins.fan,
    });
    set.push(ChangeEvent::OutPinChanged {
        pin: OutPin::Auger,
        on: incoming.outpins.auger,
    });
    set.push(ChangeEvent::OutPinChanged {
        pin: OutPin::Igniter,
        on: incoming.outpins.igniter,
    });
    set.push(ChangeEvent::PModeChanged(incoming.p_mode));
    set.push(ChangeEvent::SmokePlusChanged(incoming.s_plus));
    set.push(ChangeEvent::LidOpenChanged(incoming.lid_open));
    set.push(ChangeEvent::ElapsedBaselineChanged(incoming.startup_timestamp));
    for record in &incoming.notify {
        set.push(ChangeEvent::NotifyChanged(record.clone()));
    }

    set
}
