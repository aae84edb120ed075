//! Stateless alert rules recomputed from a fleet snapshot on every call.

mod policy;
mod rules;

pub use policy::AlertPolicy;

use crate::fleet::domain::TenantId;
use crate::fleet::fetch::{EntityKind, FetchError, FleetSnapshot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    /// Sort rank, most urgent first.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::Warning => 1,
            Self::Info => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DocumentExpiry,
    MaintenanceDue,
    FuelLow,
    LicenseExpiry,
    BudgetThreshold,
    EfficiencyDrop,
}

impl AlertKind {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::DocumentExpiry,
            Self::LicenseExpiry,
            Self::FuelLow,
            Self::BudgetThreshold,
            Self::MaintenanceDue,
            Self::EfficiencyDrop,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::DocumentExpiry => "Document expiry",
            Self::MaintenanceDue => "Maintenance due",
            Self::FuelLow => "Fuel low",
            Self::LicenseExpiry => "License expiry",
            Self::BudgetThreshold => "Budget threshold",
            Self::EfficiencyDrop => "Efficiency drop",
        }
    }

    /// Entity slices the rule reads. A failure in any of them degrades the whole category.
    pub const fn depends_on(self) -> &'static [EntityKind] {
        match self {
            Self::DocumentExpiry => &[EntityKind::Vehicles, EntityKind::Documents],
            Self::MaintenanceDue => &[EntityKind::Vehicles, EntityKind::MaintenanceLogs],
            Self::FuelLow => &[EntityKind::FuelTanks],
            Self::LicenseExpiry => &[EntityKind::Drivers],
            Self::BudgetThreshold => &[EntityKind::Budgets],
            Self::EfficiencyDrop => &[EntityKind::FuelLogs],
        }
    }
}

/// Record an alert was raised from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertReference {
    pub entity: EntityKind,
    pub tenant_id: TenantId,
    pub record_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub date: NaiveDate,
    /// `expiry - today` in whole days; negative once expired.
    pub days_until: Option<i64>,
    pub reference: Option<AlertReference>,
    pub action_required: bool,
}

/// Alert category that produced nothing because a slice it reads failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnavailableCategory {
    pub kind: AlertKind,
    pub entity: EntityKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertReport {
    pub alerts: Vec<Alert>,
    pub unavailable: Vec<UnavailableCategory>,
}

impl AlertReport {
    pub fn is_partial(&self) -> bool {
        !self.unavailable.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.alerts
            .iter()
            .filter(|alert| alert.severity == severity)
            .count()
    }
}

pub struct AlertGenerator {
    policy: AlertPolicy,
}

impl Default for AlertGenerator {
    fn default() -> Self {
        Self::new(AlertPolicy::default())
    }
}

impl AlertGenerator {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Run every rule whose inputs loaded; the rest are reported as unavailable.
    pub fn generate(&self, snapshot: &FleetSnapshot, today: NaiveDate) -> AlertReport {
        let mut alerts = Vec::new();
        let mut unavailable = Vec::new();

        for kind in AlertKind::ordered() {
            match self.run(kind, snapshot, today) {
                Ok(mut raised) => {
                    debug!(category = kind.label(), raised = raised.len(), "alert rule ran");
                    alerts.append(&mut raised);
                }
                Err((entity, err)) => {
                    warn!(
                        category = kind.label(),
                        entity = %entity,
                        error = %err,
                        "alert category degraded"
                    );
                    unavailable.push(UnavailableCategory {
                        kind,
                        entity,
                        reason: err.to_string(),
                    });
                }
            }
        }

        sort_alerts(&mut alerts);
        AlertReport {
            alerts,
            unavailable,
        }
    }

    fn run(
        &self,
        kind: AlertKind,
        snapshot: &FleetSnapshot,
        today: NaiveDate,
    ) -> Result<Vec<Alert>, (EntityKind, FetchError)> {
        if let Some((entity, err)) = kind
            .depends_on()
            .iter()
            .find_map(|entity| snapshot.failure(*entity).map(|err| (*entity, err.clone())))
        {
            return Err((entity, err));
        }

        let policy = &self.policy;
        let raised = match kind {
            AlertKind::DocumentExpiry => rules::document_expiry(
                loaded(&snapshot.vehicles),
                loaded(&snapshot.documents),
                today,
                policy,
            ),
            AlertKind::LicenseExpiry => {
                rules::license_expiry(loaded(&snapshot.drivers), today, policy)
            }
            AlertKind::FuelLow => rules::fuel_low(loaded(&snapshot.fuel_tanks), today, policy),
            AlertKind::BudgetThreshold => rules::budget_threshold(loaded(&snapshot.budgets), policy),
            AlertKind::MaintenanceDue => rules::maintenance_due(
                loaded(&snapshot.vehicles),
                loaded(&snapshot.maintenance_logs),
                today,
                policy,
            ),
            AlertKind::EfficiencyDrop => rules::efficiency_drop(
                loaded(&snapshot.fuel_logs),
                loaded(&snapshot.vehicles),
                policy,
            ),
        };
        Ok(raised)
    }
}

// Failed slices read as empty. Rules only see those for display lookups.
fn loaded<T>(slice: &Result<Vec<T>, FetchError>) -> &[T] {
    slice.as_deref().unwrap_or_default()
}

/// Severity rank, then newest date first, then id.
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then(b.date.cmp(&a.date))
            .then_with(|| a.id.cmp(&b.id))
    });
}
