use super::policy::AlertPolicy;
use super::{Alert, AlertKind, AlertReference, Severity};
use crate::fleet::domain::{
    Budget, DocumentKind, Driver, FuelLogEntry, FuelTank, MaintenanceLogEntry, TenantId, Vehicle,
    VehicleDocument, VehicleId,
};
use crate::fleet::fetch::EntityKind;
use crate::fleet::metrics::derive_fill_mileage;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

struct ExpiryVerdict {
    severity: Severity,
    days_until: i64,
    action_required: bool,
}

fn classify_expiry(expiry: NaiveDate, today: NaiveDate, policy: &AlertPolicy) -> Option<ExpiryVerdict> {
    let days_until = (expiry - today).num_days();
    let (severity, action_required) = if days_until <= policy.critical_window_days {
        (Severity::Critical, true)
    } else if days_until <= policy.warning_window_days {
        (Severity::Warning, false)
    } else {
        return None;
    };

    Some(ExpiryVerdict {
        severity,
        days_until,
        action_required,
    })
}

fn expiry_message(subject: &str, days_until: i64) -> String {
    if days_until <= 0 {
        format!("{subject} expired {} day(s) ago", days_until.abs())
    } else {
        format!("{subject} expires in {days_until} day(s)")
    }
}

fn reference(entity: EntityKind, tenant_id: &TenantId, record_id: &str) -> Option<AlertReference> {
    Some(AlertReference {
        entity,
        tenant_id: tenant_id.clone(),
        record_id: record_id.to_string(),
    })
}

pub(crate) fn document_expiry(
    vehicles: &[Vehicle],
    documents: &[VehicleDocument],
    today: NaiveDate,
    policy: &AlertPolicy,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for vehicle in vehicles {
        for kind in DocumentKind::vehicle_columns() {
            let Some(expiry) = vehicle.documents.expiry_for(kind) else {
                continue;
            };
            let Some(verdict) = classify_expiry(expiry, today, policy) else {
                continue;
            };
            let subject = format!("{} for {}", kind.label(), vehicle.display_number);
            alerts.push(Alert {
                id: format!("document_expiry:{}:{}", vehicle.id, kind.key()),
                kind: AlertKind::DocumentExpiry,
                title: format!("{} expiry", kind.label()),
                message: expiry_message(&subject, verdict.days_until),
                severity: verdict.severity,
                date: expiry,
                days_until: Some(verdict.days_until),
                reference: reference(EntityKind::Vehicles, &vehicle.tenant_id, vehicle.id.as_str()),
                action_required: verdict.action_required,
            });
        }
    }

    for document in documents {
        let Some(expiry) = document.expiry else {
            continue;
        };
        let Some(verdict) = classify_expiry(expiry, today, policy) else {
            continue;
        };
        let vehicle_label = vehicles
            .iter()
            .find(|vehicle| vehicle.id == document.vehicle_id)
            .map_or(document.vehicle_id.as_str(), |vehicle| vehicle.display_number.as_str());
        let subject = format!(
            "{} {} for {}",
            document.kind.label(),
            document.reference_number,
            vehicle_label
        );
        alerts.push(Alert {
            id: format!("document_expiry:document:{}", document.id),
            kind: AlertKind::DocumentExpiry,
            title: format!("{} expiry", document.kind.label()),
            message: expiry_message(&subject, verdict.days_until),
            severity: verdict.severity,
            date: expiry,
            days_until: Some(verdict.days_until),
            reference: reference(EntityKind::Documents, &document.tenant_id, &document.id),
            action_required: verdict.action_required,
        });
    }

    alerts
}

/// Inactive drivers are skipped.
pub(crate) fn license_expiry(drivers: &[Driver], today: NaiveDate, policy: &AlertPolicy) -> Vec<Alert> {
    drivers
        .iter()
        .filter(|driver| driver.active)
        .filter_map(|driver| {
            let expiry = driver.license_expiry?;
            let verdict = classify_expiry(expiry, today, policy)?;
            let subject = format!("Driving license {} of {}", driver.license_number, driver.name);
            Some(Alert {
                id: format!("license_expiry:{}", driver.id),
                kind: AlertKind::LicenseExpiry,
                title: "Driving license expiry".to_string(),
                message: expiry_message(&subject, verdict.days_until),
                severity: verdict.severity,
                date: expiry,
                days_until: Some(verdict.days_until),
                reference: reference(EntityKind::Drivers, &driver.tenant_id, driver.id.as_str()),
                action_required: verdict.action_required,
            })
        })
        .collect()
}

/// Tanks without a positive capacity are skipped.
pub(crate) fn fuel_low(tanks: &[FuelTank], today: NaiveDate, policy: &AlertPolicy) -> Vec<Alert> {
    tanks
        .iter()
        .filter(|tank| tank.capacity > 0.0)
        .filter_map(|tank| {
            // Scaled before dividing so exact boundaries compare exactly.
            let percent = tank.current_volume * 100.0 / tank.capacity;
            let threshold_percent = tank.low_threshold * 100.0 / tank.capacity;

            let severity = if percent <= policy.fuel_critical_percent {
                Severity::Critical
            } else if percent <= threshold_percent {
                Severity::Warning
            } else {
                return None;
            };

            Some(Alert {
                id: format!("fuel_low:{}", tank.id),
                kind: AlertKind::FuelLow,
                title: format!("Low fuel in {}", tank.name),
                message: format!(
                    "{} is at {:.1}% ({:.1} of {:.1} {} {})",
                    tank.name,
                    percent,
                    tank.current_volume,
                    tank.capacity,
                    tank.unit,
                    tank.fuel_type.label()
                ),
                severity,
                date: today,
                days_until: None,
                reference: reference(EntityKind::FuelTanks, &tank.tenant_id, &tank.id),
                action_required: severity == Severity::Critical,
            })
        })
        .collect()
}

/// Only budgets with both a positive budgeted and a positive actual amount are checked.
pub(crate) fn budget_threshold(budgets: &[Budget], policy: &AlertPolicy) -> Vec<Alert> {
    budgets
        .iter()
        .filter(|budget| budget.budgeted > 0.0 && budget.actual > 0.0)
        .filter_map(|budget| {
            let utilization = budget.actual * 100.0 / budget.budgeted;

            let (severity, message) = if utilization >= policy.budget_critical_percent {
                (
                    Severity::Critical,
                    format!(
                        "{} budget is {:.1}% over ({:.2} spent of {:.2})",
                        budget.category,
                        utilization - 100.0,
                        budget.actual,
                        budget.budgeted
                    ),
                )
            } else if utilization >= policy.budget_warning_percent {
                (
                    Severity::Warning,
                    format!(
                        "{} budget is {:.1}% utilized ({:.2} spent of {:.2})",
                        budget.category, utilization, budget.actual, budget.budgeted
                    ),
                )
            } else {
                return None;
            };

            Some(Alert {
                id: format!("budget_threshold:{}", budget.id),
                kind: AlertKind::BudgetThreshold,
                title: format!("{} budget", budget.category),
                message,
                severity,
                date: budget.period_end,
                days_until: None,
                reference: reference(EntityKind::Budgets, &budget.tenant_id, &budget.id),
                action_required: severity == Severity::Critical,
            })
        })
        .collect()
}

/// Any vehicle without a service dated inside the trailing lookback window.
pub(crate) fn maintenance_due(
    vehicles: &[Vehicle],
    maintenance: &[MaintenanceLogEntry],
    today: NaiveDate,
    policy: &AlertPolicy,
) -> Vec<Alert> {
    // A window reaching past the calendar's start admits every past service.
    let window_start = Duration::try_days(policy.maintenance_lookback_days)
        .and_then(|lookback| today.checked_sub_signed(lookback));
    let in_window = |date: NaiveDate| {
        date <= today && window_start.map_or(true, |start| date > start)
    };

    vehicles
        .iter()
        .filter(|vehicle| {
            !maintenance
                .iter()
                .any(|log| log.vehicle_id == vehicle.id && in_window(log.date))
        })
        .map(|vehicle| {
            let last_service = maintenance
                .iter()
                .filter(|log| log.vehicle_id == vehicle.id && log.date <= today)
                .map(|log| log.date)
                .max();
            let message = match last_service {
                Some(date) => format!(
                    "{} has not been serviced in the last {} days (last service {date})",
                    vehicle.display_number, policy.maintenance_lookback_days
                ),
                None => format!(
                    "{} has no service recorded in the last {} days",
                    vehicle.display_number, policy.maintenance_lookback_days
                ),
            };

            Alert {
                id: format!("maintenance_due:{}", vehicle.id),
                kind: AlertKind::MaintenanceDue,
                title: "Maintenance due".to_string(),
                message,
                severity: Severity::Info,
                date: today,
                days_until: None,
                reference: reference(EntityKind::Vehicles, &vehicle.tenant_id, vehicle.id.as_str()),
                action_required: false,
            }
        })
        .collect()
}

/// Latest fill's mileage against the mean of the vehicle's earlier fills.
///
/// `vehicles` only supplies display numbers; an empty slice falls back to ids.
pub(crate) fn efficiency_drop(
    fuel_logs: &[FuelLogEntry],
    vehicles: &[Vehicle],
    policy: &AlertPolicy,
) -> Vec<Alert> {
    let derived = derive_fill_mileage(fuel_logs);
    let mut per_vehicle: BTreeMap<&VehicleId, Vec<&FuelLogEntry>> = BTreeMap::new();
    for log in derived.iter().filter(|log| log.mileage.is_some()) {
        per_vehicle.entry(&log.vehicle_id).or_default().push(log);
    }

    let mut alerts = Vec::new();
    for (vehicle_id, mut fills) in per_vehicle {
        if fills.len() < policy.efficiency_min_fills {
            continue;
        }
        fills.sort_by(|a, b| a.date.cmp(&b.date).then(a.odometer.total_cmp(&b.odometer)));

        let Some((latest, earlier)) = fills.split_last() else {
            continue;
        };
        let latest_mileage = latest.mileage.unwrap_or(0.0);
        let baseline =
            earlier.iter().filter_map(|log| log.mileage).sum::<f64>() / earlier.len() as f64;
        if baseline <= 0.0 || latest_mileage >= baseline * (1.0 - policy.efficiency_drop_ratio) {
            continue;
        }

        let label = vehicles
            .iter()
            .find(|vehicle| &vehicle.id == vehicle_id)
            .map_or(vehicle_id.as_str(), |vehicle| vehicle.display_number.as_str());
        let drop = (1.0 - latest_mileage / baseline) * 100.0;

        alerts.push(Alert {
            id: format!("efficiency_drop:{vehicle_id}"),
            kind: AlertKind::EfficiencyDrop,
            title: format!("Fuel efficiency drop for {label}"),
            message: format!(
                "{label} returned {latest_mileage:.2} per unit on the latest fill, {drop:.1}% below its average of {baseline:.2}"
            ),
            severity: Severity::Warning,
            date: latest.date,
            days_until: None,
            reference: reference(EntityKind::FuelLogs, &latest.tenant_id, &latest.id),
            action_required: false,
        });
    }

    alerts
}
