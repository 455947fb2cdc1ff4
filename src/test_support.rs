//! Shared builders for unit tests.  Compiled only under `cfg(test)`.

use std::collections::BTreeMap;

use crate::snapshot::{Mode, OutPins, ProbeReading, Snapshot};

/// A minimal valid snapshot with a single primary probe.
pub(crate) fn snapshot_with_probe(label: &str, temp: f64) -> Snapshot {
    let mut probes = BTreeMap::new();
    probes.insert(
        label.to_string(),
        ProbeReading {
            temp: Some(temp),
            primary: true,
            connected: true,
            battery: None,
        },
    );
    Snapshot {
        mode: Mode::Smoke,
        recipe_step: None,
        recipe_mode: None,
        ui_hash: "abc".to_string(),
        probes,
        setpoint: 0,
        outpins: OutPins::default(),
        p_mode: 2,
        s_plus: false,
        start_time: 0,
        start_duration: 240,
        prime_duration: 30,
        shutdown_duration: 240,
        startup_timestamp: 0,
        lid_open: false,
        lid_open_endtime: 0,
        notify: Vec::new(),
    }
}

/// Add a non-primary food probe to an existing snapshot.
pub(crate) fn add_food_probe(snap: &mut Snapshot, label: &str, temp: f64) {
    snap.probes.insert(
        label.to_string(),
        ProbeReading {
            temp: Some(temp),
            primary: false,
            connected: true,
            battery: Some(80),
        },
    );
}
