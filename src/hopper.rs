//! Pellet hopper level monitoring.
//!
//! Polled on a slow cadence; the monitor maps the raw percentage into a
//! display band and only reports when something actually changed, so the
//! gauge is not re-rendered thirty times a minute for a static level.

use serde::{Deserialize, Serialize};

/// Consumable status as reported by `GET /api/get/hopper`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopperStatus {
    /// Fill level percent, clamped to 0..=100 by the backend.
    pub level: u8,
    /// Loaded pellet description (brand and wood), if configured.
    #[serde(default)]
    pub pellets: Option<String>,
}

/// Display band for the level gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopperBand {
    /// Above 69 percent.
    Ok,
    /// Above 29 percent.
    Low,
    /// 29 percent or below; prompts a refill.
    Critical,
}

impl HopperBand {
    pub fn from_level(level: u8) -> Self {
        if level > 69 {
            Self::Ok
        } else if level > 29 {
            Self::Low
        } else {
            Self::Critical
        }
    }
}

/// Change reported by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopperChange {
    pub level: u8,
    pub band: HopperBand,
    pub pellets: Option<String>,
}

/// Deduplicating observer over hopper polls.
#[derive(Debug, Default)]
pub struct HopperMonitor {
    last: Option<HopperStatus>,
}

impl HopperMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one poll result.  Returns the new display state when the
    /// level or pellet selection changed, `None` otherwise.  The first
    /// observation always reports.
    pub fn observe(&mut self, status: &HopperStatus) -> Option<HopperChange> {
        if self.last.as_ref() == Some(status) {
            return None;
        }
        self.last = Some(status.clone());
        Some(HopperChange {
            level: status.level,
            band: HopperBand::from_level(status.level),
            pellets: status.pellets.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(level: u8) -> HopperStatus {
        HopperStatus {
            level,
            pellets: Some("Hickory".to_string()),
        }
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(HopperBand::from_level(100), HopperBand::Ok);
        assert_eq!(HopperBand::from_level(70), HopperBand::Ok);
        assert_eq!(HopperBand::from_level(69), HopperBand::Low);
        assert_eq!(HopperBand::from_level(30), HopperBand::Low);
        assert_eq!(HopperBand::from_level(29), HopperBand::Critical);
        assert_eq!(HopperBand::from_level(0), HopperBand::Critical);
    }

    #[test]
    fn first_observation_reports() {
        let mut monitor = HopperMonitor::new();
        let change = monitor.observe(&status(80)).unwrap();
        assert_eq!(change.band, HopperBand::Ok);
        assert_eq!(change.level, 80);
    }

    #[test]
    fn unchanged_level_is_silent() {
        let mut monitor = HopperMonitor::new();
        monitor.observe(&status(80));
        assert_eq!(monitor.observe(&status(80)), None);
    }

    #[test]
    fn level_change_within_band_still_reports() {
        let mut monitor = HopperMonitor::new();
        monitor.observe(&status(80));
        let change = monitor.observe(&status(75)).unwrap();
        assert_eq!(change.band, HopperBand::Ok);
        assert_eq!(change.level, 75);
    }

    #[test]
    fn pellet_change_reports_without_level_change() {
        let mut monitor = HopperMonitor::new();
        monitor.observe(&status(80));
        let change = monitor
            .observe(&HopperStatus {
                level: 80,
                pellets: Some("Apple".to_string()),
            })
            .unwrap();
        assert_eq!(change.pellets.as_deref(), Some("Apple"));
    }
}
