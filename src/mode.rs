//! Operating-mode state machine.
//!
//! Table-driven, after the classic embedded pattern: one static
//! descriptor row per mode carrying its name and the panel layout the
//! dashboard shows while that mode is active.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  MODE_TABLE                                             │
//! │  ┌──────────┬────────┬───────┬─────┬────────┬───────┐   │
//! │  │ Mode     │ footer │ timer │ lid │ p-mode │ badge │   │
//! │  ├──────────┼────────┼───────┼─────┼────────┼───────┤   │
//! │  │ Startup  │   ✓    │   ✓   │     │   ✓    │   ✓   │   │
//! │  │ Hold     │        │       │  ✓  │        │       │   │
//! │  │ Smoke    │        │       │     │   ✓    │   ✓   │   │
//! │  │ …        │        │       │     │        │       │   │
//! │  └──────────┴────────┴───────┴─────┴────────┴───────┘   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike a controlling FSM, this machine *observes*: the backend owns
//! the real mode and the machine only recognizes transitions in the
//! polled stream.  Recognition is the single point where layout is
//! recomputed and the previous mode is recorded, so the sink can dim
//! the outgoing control before highlighting the incoming one.

use log::info;

use crate::snapshot::{Mode, Snapshot};

// ---------------------------------------------------------------------------
// Panel layout
// ---------------------------------------------------------------------------

/// Which toolbar/footer affordances are visible while a mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    /// Status footer strip (slides down for time-boxed modes).
    pub status_footer: bool,
    /// Mode countdown label.
    pub mode_timer: bool,
    /// Lid-open indicator cluster (Hold only).
    pub lid_indicator: bool,
    /// P-mode selection group.
    pub pmode_group: bool,
    /// P-mode status badge.
    pub pmode_badge: bool,
}

/// Static descriptor for a single mode.
pub struct ModeDescriptor {
    pub mode: Mode,
    pub name: &'static str,
    pub layout: PanelLayout,
}

/// One row per [`Mode`]; order matches the enum.
pub static MODE_TABLE: [ModeDescriptor; 11] = [
    ModeDescriptor {
        mode: Mode::Startup,
        name: "Startup",
        layout: PanelLayout {
            status_footer: true,
            mode_timer: true,
            lid_indicator: false,
            pmode_group: true,
            pmode_badge: true,
        },
    },
    ModeDescriptor {
        mode: Mode::Reignite,
        name: "Reignite",
        layout: PanelLayout {
            status_footer: true,
            mode_timer: true,
            lid_indicator: false,
            pmode_group: true,
            pmode_badge: true,
        },
    },
    ModeDescriptor {
        mode: Mode::Prime,
        name: "Prime",
        layout: PanelLayout {
            status_footer: true,
            mode_timer: true,
            lid_indicator: false,
            pmode_group: true,
            pmode_badge: true,
        },
    },
    ModeDescriptor {
        mode: Mode::Smoke,
        name: "Smoke",
        layout: PanelLayout {
            status_footer: false,
            mode_timer: false,
            lid_indicator: false,
            pmode_group: true,
            pmode_badge: true,
        },
    },
    ModeDescriptor {
        mode: Mode::Hold,
        name: "Hold",
        layout: PanelLayout {
            status_footer: false,
            mode_timer: false,
            lid_indicator: true,
            pmode_group: false,
            pmode_badge: false,
        },
    },
    ModeDescriptor {
        mode: Mode::Shutdown,
        name: "Shutdown",
        layout: PanelLayout {
            status_footer: true,
            mode_timer: true,
            lid_indicator: false,
            pmode_group: true,
            pmode_badge: true,
        },
    },
    ModeDescriptor {
        mode: Mode::Monitor,
        name: "Monitor",
        layout: PanelLayout {
            status_footer: false,
            mode_timer: false,
            lid_indicator: false,
            pmode_group: false,
            pmode_badge: true,
        },
    },
    ModeDescriptor {
        mode: Mode::Stop,
        name: "Stop",
        layout: PanelLayout {
            status_footer: false,
            mode_timer: false,
            lid_indicator: false,
            pmode_group: false,
            pmode_badge: true,
        },
    },
    ModeDescriptor {
        mode: Mode::Error,
        name: "Error",
        layout: PanelLayout {
            status_footer: false,
            mode_timer: false,
            lid_indicator: false,
            pmode_group: false,
            pmode_badge: true,
        },
    },
    ModeDescriptor {
        mode: Mode::Recipe,
        name: "Recipe",
        layout: PanelLayout {
            status_footer: false,
            mode_timer: false,
            lid_indicator: false,
            pmode_group: false,
            pmode_badge: true,
        },
    },
    ModeDescriptor {
        mode: Mode::Manual,
        name: "Manual",
        layout: PanelLayout {
            status_footer: false,
            mode_timer: false,
            lid_indicator: false,
            pmode_group: false,
            pmode_badge: true,
        },
    },
];

/// Look up the static descriptor for `mode`.
pub fn descriptor(mode: Mode) -> &'static ModeDescriptor {
    // Table order matches the enum declaration.
    &MODE_TABLE[mode as usize]
}

// ---------------------------------------------------------------------------
// Transition recognition
// ---------------------------------------------------------------------------

/// A recognized transition, handed to the render sink so it can dim the
/// outgoing mode's control before highlighting the incoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    /// `None` on the first observation after construction.
    pub from: Option<Mode>,
    pub to: Mode,
    /// Step index when `to` is Recipe.
    pub recipe_step: Option<u32>,
    /// Inner mode when `to` is Recipe.
    pub recipe_mode: Option<Mode>,
    pub layout: PanelLayout,
}

/// Observes the polled mode stream and recognizes transitions.
#[derive(Debug, Default)]
pub struct ModeMachine {
    current: Option<Mode>,
    previous: Option<Mode>,
    recipe_step: Option<u32>,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one accepted snapshot.  Returns the transition if the
    /// observed mode (or, inside Recipe, the step index) differs from
    /// the recorded value.
    ///
    /// `previous` is committed here and only here, after the transition
    /// result is fully formed — never optimistically.  After any
    /// recognized transition `previous != current` holds.
    pub fn observe(&mut self, snap: &Snapshot) -> Option<ModeTransition> {
        let moved = match self.current {
            None => true,
            Some(current) => {
                current != snap.mode
                    || (snap.mode == Mode::Recipe && self.recipe_step != snap.recipe_step)
            }
        };
        if !moved {
            return None;
        }

        let transition = ModeTransition {
            from: self.current,
            to: snap.mode,
            recipe_step: snap.recipe_step,
            recipe_mode: snap.recipe_mode,
            layout: descriptor(snap.mode).layout,
        };

        if let Some(from) = self.current {
            if from != snap.mode {
                info!("mode transition: {} -> {}", from.name(), snap.mode.name());
            } else {
                info!(
                    "recipe step change: {:?} -> {:?}",
                    self.recipe_step, snap.recipe_step
                );
            }
        } else {
            info!("initial mode: {}", snap.mode.name());
        }

        if self.current != Some(snap.mode) {
            self.previous = self.current;
        }
        self.current = Some(snap.mode);
        self.recipe_step = snap.recipe_step;

        Some(transition)
    }

    pub fn current(&self) -> Option<Mode> {
        self.current
    }

    /// The mode observed immediately before the most recent recognized
    /// mode change; never equal to `current`.
    pub fn previous(&self) -> Option<Mode> {
        self.previous
    }
}

// ---------------------------------------------------------------------------
// Countdown / elapsed computation
// ---------------------------------------------------------------------------

/// Seconds remaining in the current time-boxed mode, clamped to >= 0.
///
/// This is the one field the core predicts between polls — it is purely
/// cosmetic, and the next authoritative snapshot overwrites it.
pub fn mode_countdown(snap: &Snapshot, now: u64) -> Option<u64> {
    let duration = match snap.mode {
        Mode::Startup | Mode::Reignite => snap.start_duration,
        Mode::Prime => snap.prime_duration,
        Mode::Shutdown => snap.shutdown_duration,
        _ => return None,
    };
    let elapsed = now.saturating_sub(snap.start_time);
    Some(duration.saturating_sub(elapsed))
}

/// Seconds until lid-open PID pause auto-resumes.  Only meaningful in
/// Hold while the lid is detected open; clamped to >= 0.
pub fn lid_countdown(snap: &Snapshot, now: u64) -> Option<u64> {
    if snap.mode != Mode::Hold || !snap.lid_open {
        return None;
    }
    Some(snap.lid_open_endtime.saturating_sub(now))
}

/// Elapsed cook seconds since `startup_timestamp`, or `None` when no
/// cook is running.
pub fn elapsed_seconds(snap: &Snapshot, now: u64) -> Option<u64> {
    if snap.startup_timestamp == 0 {
        return None;
    }
    Some(now.saturating_sub(snap.startup_timestamp))
}

/// Render a duration the way the dashboard shows elapsed time:
/// `HH:MM:SS` with hours, `MM:SS` with minutes, `NNs` below a minute.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else if minutes > 0 {
        format!("{minutes:02}:{seconds:02}")
    } else {
        format!("{seconds:02}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::snapshot_with_probe;

    #[test]
    fn first_observation_is_a_transition() {
        let mut machine = ModeMachine::new();
        let snap = snapshot_with_probe("grill", 165.0);
        let t = machine.observe(&snap).expect("initial transition");
        assert_eq!(t.from, None);
        assert_eq!(t.to, Mode::Smoke);
        assert_eq!(machine.previous(), None);
    }

    #[test]
    fn same_mode_is_not_a_transition() {
        let mut machine = ModeMachine::new();
        let snap = snapshot_with_probe("grill", 165.0);
        machine.observe(&snap);
        assert!(machine.observe(&snap).is_none());
    }

    #[test]
    fn previous_never_equals_current() {
        let mut machine = ModeMachine::new();
        let mut snap = snapshot_with_probe("grill", 165.0);
        for mode in [Mode::Startup, Mode::Smoke, Mode::Hold, Mode::Hold, Mode::Shutdown] {
            snap.mode = mode;
            machine.observe(&snap);
            if let (Some(prev), Some(cur)) = (machine.previous(), machine.current()) {
                assert_ne!(prev, cur);
            }
        }
        assert_eq!(machine.previous(), Some(Mode::Hold));
        assert_eq!(machine.current(), Some(Mode::Shutdown));
    }

    #[test]
    fn recipe_step_alone_recognizes_transition() {
        let mut machine = ModeMachine::new();
        let mut snap = snapshot_with_probe("grill", 165.0);
        snap.mode = Mode::Recipe;
        snap.recipe_step = Some(1);
        snap.recipe_mode = Some(Mode::Hold);
        machine.observe(&snap);

        snap.recipe_step = Some(2); // inner mode unchanged
        let t = machine.observe(&snap).expect("step change transition");
        assert_eq!(t.recipe_step, Some(2));
        // Mode itself did not change, so previous stays put.
        assert_eq!(machine.previous(), None);
    }

    #[test]
    fn hold_layout_shows_lid_hides_pmode() {
        let layout = descriptor(Mode::Hold).layout;
        assert!(layout.lid_indicator);
        assert!(!layout.pmode_group);
        assert!(!layout.status_footer);
    }

    #[test]
    fn time_boxed_layouts_show_footer_and_timer() {
        for mode in [Mode::Startup, Mode::Reignite, Mode::Prime, Mode::Shutdown] {
            let layout = descriptor(mode).layout;
            assert!(layout.status_footer, "{mode:?}");
            assert!(layout.mode_timer, "{mode:?}");
        }
    }

    #[test]
    fn table_order_matches_enum() {
        for (i, row) in MODE_TABLE.iter().enumerate() {
            assert_eq!(row.mode as usize, i, "{} out of order", row.name);
        }
    }

    #[test]
    fn countdown_clamps_to_zero() {
        let mut snap = snapshot_with_probe("grill", 165.0);
        snap.mode = Mode::Startup;
        snap.start_time = 1_000;
        snap.start_duration = 240;
        assert_eq!(mode_countdown(&snap, 1_100), Some(140));
        assert_eq!(mode_countdown(&snap, 2_000), Some(0));
        snap.mode = Mode::Hold;
        assert_eq!(mode_countdown(&snap, 1_100), None);
    }

    #[test]
    fn prime_uses_its_own_duration() {
        let mut snap = snapshot_with_probe("grill", 165.0);
        snap.mode = Mode::Prime;
        snap.start_time = 500;
        snap.prime_duration = 30;
        assert_eq!(mode_countdown(&snap, 510), Some(20));
    }

    #[test]
    fn lid_countdown_only_in_hold_with_lid_open() {
        let mut snap = snapshot_with_probe("grill", 165.0);
        snap.mode = Mode::Hold;
        snap.lid_open = true;
        snap.lid_open_endtime = 1_060;
        assert_eq!(lid_countdown(&snap, 1_000), Some(60));
        assert_eq!(lid_countdown(&snap, 1_100), Some(0));
        snap.lid_open = false;
        assert_eq!(lid_countdown(&snap, 1_000), None);
    }

    #[test]
    fn elapsed_inactive_at_zero_timestamp() {
        let mut snap = snapshot_with_probe("grill", 165.0);
        assert_eq!(elapsed_seconds(&snap, 5_000), None);
        snap.startup_timestamp = 4_000;
        assert_eq!(elapsed_seconds(&snap, 5_000), Some(1_000));
    }

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(5), "05s");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(3_725), "01:02:05");
    }
}
