use serde::{Deserialize, Serialize};

/// Thresholds the alert rules compare against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// Expiries within this many days (inclusive) are critical.
    pub critical_window_days: i64,
    /// Expiries within this many days (inclusive) raise a warning.
    pub warning_window_days: i64,
    pub fuel_critical_percent: f64,
    pub budget_warning_percent: f64,
    pub budget_critical_percent: f64,
    /// A vehicle without a service in this many trailing days is due.
    pub maintenance_lookback_days: i64,
    /// Fractional drop of the latest fill's mileage against the earlier mean.
    pub efficiency_drop_ratio: f64,
    pub efficiency_min_fills: usize,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            critical_window_days: 7,
            warning_window_days: 30,
            fuel_critical_percent: 5.0,
            budget_warning_percent: 80.0,
            budget_critical_percent: 100.0,
            maintenance_lookback_days: 90,
            efficiency_drop_ratio: 0.2,
            efficiency_min_fills: 3,
        }
    }
}

impl AlertPolicy {
    pub fn with_maintenance_lookback(mut self, days: i64) -> Self {
        self.maintenance_lookback_days = days;
        self
    }
}
