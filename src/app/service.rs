//! Dashboard service — the engine core.
//!
//! [`DashService`] owns the snapshot cache, mode machine, notification
//! cache, timer sync, and poll cycle bookkeeping.  It exposes a clean,
//! transport-agnostic API.  All I/O flows through port traits injected
//! at call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SnapshotSource ──▶ ┌──────────────────────────┐ ──▶ RenderSink
//!                     │       DashService         │
//!     ControlPort ◀── │  diff · mode · notify ·   │
//!                     │  timer · hopper · poller  │
//!                     └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::DashConfig;
use crate::diff::{reconcile, ChangeEvent, Reconciliation};
use crate::error::{Error, InputError, Result};
use crate::hopper::HopperMonitor;
use crate::mode::{elapsed_seconds, lid_countdown, mode_countdown, ModeMachine};
use crate::notify::{ControlWriteBuilder, NotifyCache};
use crate::poller::{CycleHealth, PollCycle};
use crate::snapshot::{ControlUpdate, Mode, Snapshot};
use crate::timer::{TimerCommand, TimerSync};

use super::commands::DashCommand;
use super::events::UiEvent;
use super::ports::{ControlPort, RenderSink, SnapshotSource};

/// How long after a manual hopper check the level is re-polled; the
/// backend needs a moment to run the measurement.
const HOPPER_RECHECK_DELAY_MS: u64 = 2_500;

// ───────────────────────────────────────────────────────────────
// DashService
// ───────────────────────────────────────────────────────────────

/// The dashboard service orchestrates all reconciliation logic.
pub struct DashService {
    config: DashConfig,
    /// Last accepted snapshot; `None` until the first successful poll.
    cache: Option<Snapshot>,
    modes: ModeMachine,
    notify: NotifyCache,
    timer: TimerSync,
    hopper: HopperMonitor,
    telemetry_cycle: PollCycle,
    hopper_cycle: PollCycle,
    timer_cycle: PollCycle,
    /// Set once the backend's UI hash moves.  Permanent for this
    /// instance; the client is expected to fully reload.
    stale: bool,
}

impl DashService {
    pub fn new(config: DashConfig) -> Self {
        let telemetry_cycle =
            PollCycle::new("telemetry", config.telemetry_interval_ms, config.max_error_count);
        let hopper_cycle =
            PollCycle::new("hopper", config.hopper_interval_ms, config.max_error_count);
        // Timer polling starts idle-slow; it speeds up when a countdown
        // goes live.
        let timer_cycle =
            PollCycle::new("timer", config.timer_idle_interval_ms, config.max_error_count);

        Self {
            config,
            cache: None,
            modes: ModeMachine::new(),
            notify: NotifyCache::new(),
            timer: TimerSync::new(),
            hopper: HopperMonitor::new(),
            telemetry_cycle,
            hopper_cycle,
            timer_cycle,
            stale: false,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one engine tick: poll whichever cycles are due, reconcile,
    /// and advance the local countdown prediction.
    ///
    /// `now_ms` is wall-clock milliseconds since the epoch; the caller
    /// drives this at the local tick cadence (see
    /// [`DashConfig::local_tick_interval_ms`]).
    pub fn run_tick(
        &mut self,
        backend: &mut impl SnapshotSource,
        now_ms: u64,
        sink: &mut impl RenderSink,
    ) {
        if self.stale {
            return;
        }

        // 1. Telemetry snapshot
        if self.telemetry_cycle.due(now_ms) {
            self.telemetry_cycle.reschedule(now_ms);
            let health = match backend.fetch_snapshot() {
                Ok(snap) => match self.accept_snapshot(snap, sink) {
                    Ok(()) => self.telemetry_cycle.record_success(),
                    Err(e) => {
                        warn!("snapshot rejected: {e}");
                        self.telemetry_cycle.record_failure()
                    }
                },
                Err(e) => {
                    warn!("telemetry poll failed: {e:#}");
                    self.telemetry_cycle.record_failure()
                }
            };
            Self::emit_health(health, "telemetry", sink);
            if self.stale {
                return;
            }
        }

        // 2. Hopper level
        if self.hopper_cycle.due(now_ms) {
            self.hopper_cycle.reschedule(now_ms);
            let health = match backend.fetch_hopper() {
                Ok(status) => {
                    if let Some(change) = self.hopper.observe(&status) {
                        sink.emit(&UiEvent::Hopper(change));
                    }
                    self.hopper_cycle.record_success()
                }
                Err(e) => {
                    warn!("hopper poll failed: {e:#}");
                    self.hopper_cycle.record_failure()
                }
            };
            Self::emit_health(health, "hopper", sink);
        }

        // 3. Timer record
        if self.timer_cycle.due(now_ms) {
            self.timer_cycle.reschedule(now_ms);
            let health = match backend.fetch_timer() {
                Ok(record) => {
                    self.timer.sync(&record);
                    self.timer_cycle
                        .set_period(self.timer.poll_interval_ms(&self.config));
                    self.timer_cycle.record_success()
                }
                Err(e) => {
                    warn!("timer poll failed: {e:#}");
                    self.timer_cycle.record_failure()
                }
            };
            Self::emit_health(health, "timer", sink);
        }

        // 4. Local countdown predictions (no network)
        let now_s = now_ms / 1000;
        let view = self.timer.tick(now_s);
        if self.timer.visible() {
            sink.emit(&UiEvent::TimerTick(view));
        }
        if let Some(snap) = self.cache.as_ref() {
            let mode_remaining = mode_countdown(snap, now_s);
            let lid_remaining = lid_countdown(snap, now_s);
            let elapsed = elapsed_seconds(snap, now_s);
            if mode_remaining.is_some() || lid_remaining.is_some() || elapsed.is_some() {
                sink.emit(&UiEvent::CountdownTick {
                    mode_remaining,
                    lid_remaining,
                    elapsed,
                });
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a user action.
    ///
    /// Local validation failures return `Err` without touching the
    /// network.  Transport failures emit [`UiEvent::WriteFailed`] and
    /// return [`Error::WriteRejected`]; local state is never rolled
    /// back, the next poll re-syncs whatever the backend committed.
    pub fn handle_command(
        &mut self,
        cmd: DashCommand,
        backend: &mut impl ControlPort,
        now_ms: u64,
        sink: &mut impl RenderSink,
    ) -> Result<()> {
        let now_s = now_ms / 1000;
        match cmd {
            DashCommand::SetMode(mode) => {
                info!("requesting mode {}", mode.name());
                let update = ControlUpdate {
                    mode: Some(mode),
                    ..ControlUpdate::default()
                };
                self.send_control("set mode", backend, &update, sink)
            }

            DashCommand::SetSetpoint(value) => {
                if self.modes.current() != Some(Mode::Hold) {
                    warn!("setpoint change ignored outside Hold");
                    return Ok(());
                }
                let (lo, hi) = self.config.primary_range();
                if !(lo..=hi).contains(&value) {
                    return Err(InputError::SetpointOutOfRange.into());
                }
                let update = ControlUpdate {
                    setpoint: Some(value),
                    ..ControlUpdate::default()
                };
                self.send_control("set setpoint", backend, &update, sink)
            }

            DashCommand::SetSmokePlus(on) => {
                let update = ControlUpdate {
                    s_plus: Some(on),
                    ..ControlUpdate::default()
                };
                self.send_control("smoke plus", backend, &update, sink)
            }

            DashCommand::ArmTargetNotify {
                label,
                target,
                shutdown,
                keep_warm,
            } => {
                self.check_threshold(&label, target)?;
                let update = ControlWriteBuilder::from_cache(&self.notify)
                    .arm_target(&label, target, shutdown, keep_warm)?
                    .build();
                self.send_control("arm notification", backend, &update, sink)
            }

            DashCommand::ArmHighLimit {
                label,
                target,
                shutdown,
            } => {
                self.check_threshold(&label, target)?;
                let reading = self.probe_reading(&label)?;
                let update = ControlWriteBuilder::from_cache(&self.notify)
                    .arm_high_limit(&label, target, reading, shutdown)?
                    .build();
                self.send_control("arm high limit", backend, &update, sink)
            }

            DashCommand::ArmLowLimit {
                label,
                target,
                shutdown,
                reignite,
            } => {
                self.check_threshold(&label, target)?;
                let reading = self.probe_reading(&label)?;
                let update = ControlWriteBuilder::from_cache(&self.notify)
                    .arm_low_limit(&label, target, reading, shutdown, reignite)?
                    .build();
                self.send_control("arm low limit", backend, &update, sink)
            }

            DashCommand::CancelNotify { label } => {
                let update = ControlWriteBuilder::from_cache(&self.notify)
                    .disarm_all(&label)
                    .build();
                self.send_control("cancel notification", backend, &update, sink)
            }

            DashCommand::RequestHopperCheck => {
                let update = ControlUpdate {
                    hopper_check: Some(true),
                    ..ControlUpdate::default()
                };
                self.send_control("hopper check", backend, &update, sink)?;
                // Re-poll soon so the fresh measurement shows without
                // waiting out the slow cadence.
                self.hopper_cycle.expedite(now_ms + HOPPER_RECHECK_DELAY_MS);
                Ok(())
            }

            DashCommand::TimerStart {
                seconds,
                shutdown,
                keep_warm,
            } => {
                let command = self.timer.start(seconds, shutdown, keep_warm, now_s)?;
                self.timer_cycle
                    .set_period(self.timer.poll_interval_ms(&self.config));
                self.send_timer("start timer", backend, command, sink)
            }

            DashCommand::TimerPause => {
                let command = self.timer.pause(now_s);
                self.send_timer("pause timer", backend, command, sink)
            }

            DashCommand::TimerResume => {
                let command = self.timer.unpause(now_s);
                self.send_timer("resume timer", backend, command, sink)
            }

            DashCommand::TimerStop => {
                let command = self.timer.stop();
                self.timer_cycle
                    .set_period(self.timer.poll_interval_ms(&self.config));
                self.send_timer("stop timer", backend, command, sink)
            }

            DashCommand::HideTimer => {
                self.timer.hide();
                Ok(())
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Last accepted snapshot.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.cache.as_ref()
    }

    /// Current operating mode, if a snapshot has been accepted.
    pub fn mode(&self) -> Option<Mode> {
        self.modes.current()
    }

    /// Mode active before the current one (for button dimming).
    pub fn previous_mode(&self) -> Option<Mode> {
        self.modes.previous()
    }

    /// Whether a stale-client signal has fired.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Whether the telemetry cycle is past the offline ceiling.
    pub fn is_offline(&self) -> bool {
        self.telemetry_cycle.is_offline()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Validate, diff, and distribute one polled snapshot.
    fn accept_snapshot(&mut self, snap: Snapshot, sink: &mut impl RenderSink) -> Result<()> {
        snap.validate()?;

        match reconcile(self.cache.as_ref(), &snap) {
            Reconciliation::StaleClient => {
                warn!("backend UI hash changed; halting all polling");
                self.telemetry_cycle.cancel();
                self.hopper_cycle.cancel();
                self.timer_cycle.cancel();
                self.stale = true;
                sink.emit(&UiEvent::StaleClient);
                Ok(())
            }
            Reconciliation::Changes(set) => {
                if let Some(transition) = self.modes.observe(&snap) {
                    sink.emit(&UiEvent::ModeTransition(transition));
                }

                for event in set {
                    match event {
                        // Elevated to richer events above and below.
                        ChangeEvent::ModeChanged { .. }
                        | ChangeEvent::RecipeStepChanged { .. }
                        | ChangeEvent::NotifyChanged(_) => {}
                        other => sink.emit(&UiEvent::Changed(other)),
                    }
                }

                for record in self.notify.apply(&snap.notify) {
                    let indicator = self.notify.compose(&record.label, record.rule);
                    sink.emit(&UiEvent::Notification { record, indicator });
                }

                self.cache = Some(snap);
                Ok(())
            }
        }
    }

    /// Range-check a notification threshold against the configured
    /// display ranges (primary probes get the wider pit range).
    fn check_threshold(&self, label: &str, target: i32) -> Result<()> {
        let snap = self
            .cache
            .as_ref()
            .ok_or(Error::Input(InputError::UnknownProbe))?;
        if !snap.probes.contains_key(label) {
            return Err(InputError::UnknownProbe.into());
        }
        let (lo, hi) = if snap.primary_label() == Some(label) {
            self.config.primary_range()
        } else {
            self.config.food_range()
        };
        if !(lo..=hi).contains(&target) {
            return Err(InputError::ThresholdOutOfRange.into());
        }
        Ok(())
    }

    /// Current reading for `label`, for the arm-time trigger latch.
    fn probe_reading(&self, label: &str) -> Result<Option<f64>> {
        let snap = self
            .cache
            .as_ref()
            .ok_or(Error::Input(InputError::UnknownProbe))?;
        if !snap.probes.contains_key(label) {
            return Err(InputError::UnknownProbe.into());
        }
        Ok(snap.reading(label))
    }

    fn send_control(
        &mut self,
        action: &'static str,
        backend: &mut impl ControlPort,
        update: &ControlUpdate,
        sink: &mut impl RenderSink,
    ) -> Result<()> {
        match backend.send_control(update) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("{action} write failed: {e:#}");
                sink.emit(&UiEvent::WriteFailed { action });
                Err(Error::WriteRejected)
            }
        }
    }

    fn send_timer(
        &mut self,
        action: &'static str,
        backend: &mut impl ControlPort,
        command: TimerCommand,
        sink: &mut impl RenderSink,
    ) -> Result<()> {
        match backend.send_timer(command) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("{action} write failed: {e:#}");
                sink.emit(&UiEvent::WriteFailed { action });
                Err(Error::WriteRejected)
            }
        }
    }

    fn emit_health(health: Option<CycleHealth>, resource: &'static str, sink: &mut impl RenderSink) {
        match health {
            Some(CycleHealth::WentOffline) => {
                sink.emit(&UiEvent::ConnectionLost { resource });
            }
            Some(CycleHealth::BackOnline) => {
                sink.emit(&UiEvent::ConnectionRestored { resource });
            }
            None => {}
        }
    }
}
