//! Dashboard engine configuration
//!
//! All tunable parameters for one dashboard instance.  Values can be
//! overridden from the backend's settings resource at page load.

use serde::{Deserialize, Serialize};

/// Temperature units the backend is configured for.  Display ranges and
/// input validation both depend on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    #[serde(rename = "F")]
    Fahrenheit,
    #[serde(rename = "C")]
    Celsius,
}

/// Core dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashConfig {
    pub units: Units,

    // --- Display ranges ---
    /// Maximum gauge/input value for the primary (pit) probe
    pub max_primary_temp: i32,
    /// Maximum gauge/input value for food probes
    pub max_food_temp: i32,
    /// Minimum gauge/input value
    pub min_temp: i32,

    // --- Poll cadences ---
    /// Telemetry snapshot poll interval (milliseconds)
    pub telemetry_interval_ms: u64,
    /// Hopper/consumable level poll interval (milliseconds)
    pub hopper_interval_ms: u64,
    /// Timer poll interval while a timer is active (milliseconds)
    pub timer_active_interval_ms: u64,
    /// Timer poll interval while no timer is running (milliseconds)
    pub timer_idle_interval_ms: u64,
    /// Local prediction tick for countdowns (milliseconds)
    pub local_tick_interval_ms: u64,

    // --- Failure policy ---
    /// Consecutive poll failures tolerated before signalling offline
    pub max_error_count: u32,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            units: Units::Fahrenheit,

            // Display ranges (Fahrenheit defaults)
            max_primary_temp: 600,
            max_food_temp: 300,
            min_temp: 0,

            // Poll cadences
            telemetry_interval_ms: 500,
            hopper_interval_ms: 30_000,
            timer_active_interval_ms: 1_000,
            timer_idle_interval_ms: 5_000,
            local_tick_interval_ms: 250,

            // Failure policy
            max_error_count: 30,
        }
    }
}

impl DashConfig {
    /// Celsius defaults, for backends configured metric.
    pub fn celsius() -> Self {
        Self {
            units: Units::Celsius,
            max_primary_temp: 300,
            max_food_temp: 150,
            min_temp: -20,
            ..Self::default()
        }
    }

    /// Valid range for the primary setpoint and primary-probe thresholds.
    pub fn primary_range(&self) -> (i32, i32) {
        (self.min_temp, self.max_primary_temp)
    }

    /// Valid range for food-probe notification thresholds.
    pub fn food_range(&self) -> (i32, i32) {
        (self.min_temp, self.max_food_temp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = DashConfig::default();
        assert!(c.max_primary_temp > c.max_food_temp);
        assert!(c.min_temp < c.max_food_temp);
        assert!(c.telemetry_interval_ms > 0);
        assert!(c.max_error_count > 0);
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = DashConfig::default();
        assert!(
            c.local_tick_interval_ms < c.telemetry_interval_ms,
            "local prediction must tick faster than polls to hide jitter"
        );
        assert!(
            c.telemetry_interval_ms < c.hopper_interval_ms,
            "consumable level changes slowly and polls slowly"
        );
        assert!(c.timer_active_interval_ms < c.timer_idle_interval_ms);
    }

    #[test]
    fn celsius_ranges_differ() {
        let c = DashConfig::celsius();
        assert_eq!(c.units, Units::Celsius);
        assert!(c.min_temp < 0);
        assert!(c.max_primary_temp < DashConfig::default().max_primary_temp);
    }

    #[test]
    fn serde_roundtrip() {
        let c = DashConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: DashConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.max_primary_temp, c2.max_primary_temp);
        assert_eq!(c.units, c2.units);
        assert_eq!(c.max_error_count, c2.max_error_count);
    }
}
