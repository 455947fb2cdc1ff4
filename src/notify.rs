//! Probe notification engine.
//!
//! Owns the cached notification records and the per-probe armed index
//! used for display composition, and builds the full-replacement writes
//! the backend requires.
//!
//! Three rules exist per probe — target, high limit, low limit — each
//! independently armable with companion actions.  Display composition is
//! per *probe*, not per record: a probe shows one bell indicator that
//! summarizes all three rules, with the target rule taking priority.

use std::collections::BTreeMap;

use log::info;

use crate::error::{InputError, Result};
use crate::snapshot::{ControlUpdate, NotifyRecord, RuleKind};

// ---------------------------------------------------------------------------
// Material change
// ---------------------------------------------------------------------------

/// Whether two versions of the same record differ in a way that must
/// re-render: target, armed, any companion action, ETA, or the latched
/// trigger.  A changed record is replaced in the cache wholesale — no
/// partial field patching.
pub fn material_change(old: &NotifyRecord, new: &NotifyRecord) -> bool {
    old.target != new.target
        || old.armed != new.armed
        || old.shutdown != new.shutdown
        || old.keep_warm != new.keep_warm
        || old.reignite != new.reignite
        || old.eta != new.eta
        || old.triggered != new.triggered
}

// ---------------------------------------------------------------------------
// Display composition
// ---------------------------------------------------------------------------

/// What the probe's bell indicator shows, evaluated top-to-bottom with
/// first match winning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BellDisplay {
    /// Target rule armed: bell with target value and ETA.
    /// `eta == None` renders as "calculating".
    Target { target: i32, eta: Option<u64> },
    /// Only a limit rule armed: bell without ETA.
    LimitOnly,
    /// A limit rule was updated (e.g. cancelled) while the target rule
    /// stays armed: the existing target display is preserved untouched.
    TargetHeld,
    /// Nothing armed: bell off.
    Off,
}

/// Composed indicator state for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeIndicator {
    pub display: BellDisplay,
    /// Escalation: some limit rule is armed and has triggered.  Applies
    /// regardless of which display branch won, until the limit is
    /// disarmed or the reading recrosses.
    pub danger: bool,
}

/// Armed flags for one probe's three rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ArmedFlags {
    target: bool,
    limit_high: bool,
    limit_low: bool,
}

// ---------------------------------------------------------------------------
// Notification cache
// ---------------------------------------------------------------------------

/// The engine's private copy of the notification list plus the derived
/// per-probe armed index.
#[derive(Debug, Default)]
pub struct NotifyCache {
    records: Vec<NotifyRecord>,
    armed: BTreeMap<String, ArmedFlags>,
}

impl NotifyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cache has been seeded with a first record list.
    pub fn is_initialized(&self) -> bool {
        !self.records.is_empty()
    }

    /// Seed the cache from the first snapshot's record list.
    pub fn initialize(&mut self, records: &[NotifyRecord]) {
        info!("initializing notification cache ({} records)", records.len());
        self.records = records.to_vec();
        self.rebuild_index();
    }

    /// Reconcile incoming records against the cache.
    ///
    /// Armed flags are refreshed for every record first (the index must
    /// reflect the whole incoming list before any display composition),
    /// then each materially-changed record is replaced and returned for
    /// rendering.
    pub fn apply(&mut self, incoming: &[NotifyRecord]) -> Vec<NotifyRecord> {
        for record in incoming {
            self.armed
                .entry(record.label.clone())
                .or_default()
                .set(record.rule, record.armed);
        }

        let mut changed = Vec::new();
        for record in incoming {
            let slot = self
                .records
                .iter_mut()
                .find(|r| r.label == record.label && r.rule == record.rule);
            match slot {
                Some(slot) => {
                    if material_change(slot, record) {
                        *slot = record.clone();
                        changed.push(record.clone());
                    }
                }
                None => {
                    self.records.push(record.clone());
                    changed.push(record.clone());
                }
            }
        }
        changed
    }

    /// The full cached record list (the basis for full-replace writes).
    pub fn records(&self) -> &[NotifyRecord] {
        &self.records
    }

    /// The cached record for `label`/`rule`.
    pub fn record(&self, label: &str, rule: RuleKind) -> Option<&NotifyRecord> {
        self.records
            .iter()
            .find(|r| r.label == label && r.rule == rule)
    }

    /// Compose the bell indicator for `label`, in the context of an
    /// update to `updated_rule`'s record.
    ///
    /// Priority, first match wins:
    /// 1. target armed → bell with value and ETA;
    /// 2. target disarmed but a limit armed → bell, no ETA;
    /// 3. a limit was updated while the target stays armed → preserve
    ///    the target display (a limit cancellation must not hide an
    ///    unrelated still-armed target notification);
    /// 4. nothing armed → bell off.
    pub fn compose(&self, label: &str, updated_rule: RuleKind) -> ProbeIndicator {
        let flags = self.armed.get(label).copied().unwrap_or_default();

        let display = if updated_rule == RuleKind::Target && flags.target {
            let record = self.record(label, RuleKind::Target);
            BellDisplay::Target {
                target: record.map_or(0, |r| r.target),
                eta: record.and_then(|r| r.eta),
            }
        } else if !flags.target && (flags.limit_high || flags.limit_low) {
            BellDisplay::LimitOnly
        } else if updated_rule != RuleKind::Target && flags.target {
            BellDisplay::TargetHeld
        } else {
            BellDisplay::Off
        };

        let danger = self.limit_triggered(label);

        ProbeIndicator { display, danger }
    }

    /// Whether any armed limit rule for `label` has its trigger latched.
    fn limit_triggered(&self, label: &str) -> bool {
        self.records.iter().any(|r| {
            r.label == label
                && matches!(r.rule, RuleKind::LimitHigh | RuleKind::LimitLow)
                && r.armed
                && r.triggered
        })
    }

    fn rebuild_index(&mut self) {
        self.armed.clear();
        for record in &self.records {
            self.armed
                .entry(record.label.clone())
                .or_default()
                .set(record.rule, record.armed);
        }
    }
}

impl ArmedFlags {
    fn set(&mut self, rule: RuleKind, armed: bool) {
        match rule {
            RuleKind::Target => self.target = armed,
            RuleKind::LimitHigh => self.limit_high = armed,
            RuleKind::LimitLow => self.limit_low = armed,
        }
    }
}

// ---------------------------------------------------------------------------
// Control write builder
// ---------------------------------------------------------------------------

/// Builds a full-replacement notification write.
///
/// Starts from an immutable clone of the cached list, applies one
/// semantic edit per call, and produces the complete list for
/// `POST /api/control` — the client never submits a partial update.
#[derive(Debug, Clone)]
pub struct ControlWriteBuilder {
    records: Vec<NotifyRecord>,
}

impl ControlWriteBuilder {
    pub fn from_cache(cache: &NotifyCache) -> Self {
        Self {
            records: cache.records().to_vec(),
        }
    }

    /// Arm the target rule for `label`.
    pub fn arm_target(
        mut self,
        label: &str,
        target: i32,
        shutdown: bool,
        keep_warm: bool,
    ) -> Result<Self> {
        if shutdown && keep_warm {
            return Err(InputError::ConflictingActions.into());
        }
        let record = self.entry(label, RuleKind::Target);
        record.armed = true;
        record.target = target;
        record.shutdown = shutdown;
        record.keep_warm = keep_warm;
        record.eta = None; // backend recomputes
        Ok(self)
    }

    /// Arm the high-limit rule for `label`.
    ///
    /// If `current_reading` already exceeds the new target the trigger
    /// is latched immediately, so a newly-armed limit does not silently
    /// fail to alert when its condition is already met at arm time.
    /// A probe that is not reporting (`None`) never latches here; the
    /// backend evaluates on its next poll.
    pub fn arm_high_limit(
        mut self,
        label: &str,
        target: i32,
        current_reading: Option<f64>,
        shutdown: bool,
    ) -> Result<Self> {
        let record = self.entry(label, RuleKind::LimitHigh);
        record.armed = true;
        record.target = target;
        record.shutdown = shutdown;
        record.keep_warm = false;
        record.triggered = current_reading.is_some_and(|t| t > f64::from(target));
        Ok(self)
    }

    /// Arm the low-limit rule for `label`; latches immediately if the
    /// reading is already below target.
    pub fn arm_low_limit(
        mut self,
        label: &str,
        target: i32,
        current_reading: Option<f64>,
        shutdown: bool,
        reignite: bool,
    ) -> Result<Self> {
        let record = self.entry(label, RuleKind::LimitLow);
        record.armed = true;
        record.target = target;
        record.shutdown = shutdown;
        record.keep_warm = false;
        record.reignite = reignite;
        record.triggered = current_reading.is_some_and(|t| t < f64::from(target));
        Ok(self)
    }

    /// Disarm one rule.  Target and all companion actions are reset in
    /// the same written object — partial disarm is disallowed.
    pub fn disarm(mut self, label: &str, rule: RuleKind) -> Self {
        let record = self.entry(label, rule);
        *record = NotifyRecord::disarmed(label, rule);
        self
    }

    /// Disarm every rule for `label` (the cancel-all action).
    pub fn disarm_all(mut self, label: &str) -> Self {
        for rule in [RuleKind::Target, RuleKind::LimitHigh, RuleKind::LimitLow] {
            if self
                .records
                .iter()
                .any(|r| r.label == label && r.rule == rule)
            {
                self = self.disarm(label, rule);
            }
        }
        self
    }

    /// Produce the full-object write.
    pub fn build(self) -> ControlUpdate {
        ControlUpdate {
            notify_data: Some(self.records),
            ..ControlUpdate::default()
        }
    }

    fn entry(&mut self, label: &str, rule: RuleKind) -> &mut NotifyRecord {
        let pos = match self
            .records
            .iter()
            .position(|r| r.label == label && r.rule == rule)
        {
            Some(i) => i,
            None => {
                self.records.push(NotifyRecord::disarmed(label, rule));
                self.records.len() - 1
            }
        };
        &mut self.records[pos]
    }
}
