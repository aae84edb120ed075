use super::buckets::{monthly_buckets, MonthlyBucket};
use super::distance::total_distance;
use super::efficiency::{average_mileage, cost_per_distance, derive_fill_mileage, safe_ratio};
use super::ranking::{rank_by, RankDirection};
use super::score::performance_score;
use crate::fleet::domain::{
    Budget, DriverId, FuelLogEntry, MaintenanceKind, MaintenanceLogEntry, TenantId, VehicleId,
    VehicleStatus,
};
use crate::fleet::fetch::{FleetSnapshot, UnavailableSlice};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const RANKING_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleMetrics {
    pub vehicle_id: VehicleId,
    pub tenant_id: Option<TenantId>,
    pub display_number: Option<String>,
    pub status: Option<VehicleStatus>,
    pub distance: f64,
    pub fills: usize,
    pub fuel_volume: f64,
    pub fuel_cost: f64,
    pub services: usize,
    pub maintenance_cost: f64,
    pub average_mileage: f64,
    pub cost_per_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverMetrics {
    pub driver_id: DriverId,
    pub name: Option<String>,
    pub active: bool,
    pub fills: usize,
    pub fuel_volume: f64,
    pub fuel_cost: f64,
    pub last_fill: Option<NaiveDate>,
    pub performance_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorMetrics {
    pub vendor: String,
    pub transactions: usize,
    pub fuel_cost: f64,
    pub maintenance_cost: f64,
    pub total_spend: f64,
    pub last_transaction: Option<NaiveDate>,
    pub performance_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceKindTotal {
    pub kind: MaintenanceKind,
    pub kind_label: &'static str,
    pub services: usize,
    pub total_cost: f64,
    pub labor_cost: f64,
    pub parts_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUtilization {
    pub category: String,
    pub budgeted: f64,
    pub actual: f64,
    /// Percentage of the budgeted amount spent; 0 when nothing was budgeted.
    pub utilization: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FleetTotals {
    pub vehicles: usize,
    pub active_vehicles: usize,
    pub drivers: usize,
    pub active_drivers: usize,
    pub distance: f64,
    pub fuel_volume: f64,
    pub fuel_cost: f64,
    pub maintenance_cost: f64,
    pub average_mileage: f64,
    pub cost_per_distance: f64,
}

/// Display metrics reduced from one [`FleetSnapshot`].
///
/// Failed slices contribute nothing and are listed in `unavailable`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetMetrics {
    pub totals: FleetTotals,
    pub vehicles: Vec<VehicleMetrics>,
    pub drivers: Vec<DriverMetrics>,
    pub vendors: Vec<VendorMetrics>,
    pub monthly_fuel_cost: Vec<MonthlyBucket>,
    pub monthly_maintenance_cost: Vec<MonthlyBucket>,
    pub maintenance_by_kind: Vec<MaintenanceKindTotal>,
    pub budgets: Vec<BudgetUtilization>,
    pub most_efficient_vehicles: Vec<VehicleId>,
    pub top_drivers: Vec<DriverId>,
    pub unavailable: Vec<UnavailableSlice>,
}

impl FleetMetrics {
    pub fn compute(snapshot: &FleetSnapshot, today: NaiveDate) -> Self {
        let vehicles = snapshot.vehicles.as_deref().unwrap_or_default();
        let drivers = snapshot.drivers.as_deref().unwrap_or_default();
        let maintenance = snapshot.maintenance_logs.as_deref().unwrap_or_default();
        let budgets = snapshot.budgets.as_deref().unwrap_or_default();
        let fuel_logs = derive_fill_mileage(snapshot.fuel_logs.as_deref().unwrap_or_default());

        let vehicle_metrics = vehicle_metrics(snapshot, &fuel_logs);
        let driver_metrics = driver_metrics(snapshot, &fuel_logs, today);
        let vendors = vendor_metrics(&fuel_logs, maintenance, today);

        let distance: f64 = vehicle_metrics.iter().map(|metrics| metrics.distance).sum();
        let fuel_cost: f64 = fuel_logs.iter().map(|log| log.total_cost).sum();
        let maintenance_cost: f64 = maintenance.iter().map(|log| log.total_cost).sum();

        let totals = FleetTotals {
            vehicles: vehicles.len(),
            active_vehicles: vehicles
                .iter()
                .filter(|vehicle| vehicle.status == VehicleStatus::Active)
                .count(),
            drivers: drivers.len(),
            active_drivers: drivers.iter().filter(|driver| driver.active).count(),
            distance,
            fuel_volume: fuel_logs.iter().map(|log| log.volume).sum(),
            fuel_cost,
            maintenance_cost,
            average_mileage: average_mileage(&fuel_logs),
            cost_per_distance: cost_per_distance(fuel_cost, maintenance_cost, distance),
        };

        let mut efficient: Vec<&VehicleMetrics> = vehicle_metrics
            .iter()
            .filter(|metrics| metrics.fills > 0)
            .collect();
        rank_by(
            &mut efficient,
            |metrics| metrics.average_mileage,
            RankDirection::Descending,
            |metrics| &metrics.vehicle_id,
        );
        let most_efficient_vehicles = efficient
            .into_iter()
            .take(RANKING_DEPTH)
            .map(|metrics| metrics.vehicle_id.clone())
            .collect();

        let mut ranked_drivers: Vec<&DriverMetrics> = driver_metrics.iter().collect();
        rank_by(
            &mut ranked_drivers,
            |metrics| f64::from(metrics.performance_score),
            RankDirection::Descending,
            |metrics| &metrics.driver_id,
        );
        let top_drivers = ranked_drivers
            .into_iter()
            .take(RANKING_DEPTH)
            .map(|metrics| metrics.driver_id.clone())
            .collect();

        Self {
            totals,
            vehicles: vehicle_metrics,
            drivers: driver_metrics,
            vendors,
            monthly_fuel_cost: monthly_buckets(&fuel_logs, |log| log.date, |log| log.total_cost),
            monthly_maintenance_cost: monthly_buckets(
                maintenance,
                |log| log.date,
                |log| log.total_cost,
            ),
            maintenance_by_kind: maintenance_by_kind(maintenance),
            budgets: budget_utilization(budgets),
            most_efficient_vehicles,
            top_drivers,
            unavailable: snapshot.unavailable(),
        }
    }
}

fn vehicle_metrics(snapshot: &FleetSnapshot, fuel_logs: &[FuelLogEntry]) -> Vec<VehicleMetrics> {
    let vehicles = snapshot.vehicles.as_deref().unwrap_or_default();
    let readings = snapshot.odometer_readings.as_deref().unwrap_or_default();
    let maintenance = snapshot.maintenance_logs.as_deref().unwrap_or_default();

    // Vehicles referenced only by activity rows still get a line.
    let mut ids: BTreeSet<&VehicleId> = vehicles.iter().map(|vehicle| &vehicle.id).collect();
    ids.extend(fuel_logs.iter().map(|log| &log.vehicle_id));
    ids.extend(maintenance.iter().map(|log| &log.vehicle_id));
    ids.extend(readings.iter().map(|reading| &reading.vehicle_id));

    ids.into_iter()
        .map(|vehicle_id| {
            let vehicle = vehicles.iter().find(|vehicle| &vehicle.id == vehicle_id);
            let fills: Vec<FuelLogEntry> = fuel_logs
                .iter()
                .filter(|log| &log.vehicle_id == vehicle_id)
                .cloned()
                .collect();
            let services: Vec<&MaintenanceLogEntry> = maintenance
                .iter()
                .filter(|log| &log.vehicle_id == vehicle_id)
                .collect();

            let distance = total_distance(vehicle_id, readings);
            let fuel_cost: f64 = fills.iter().map(|log| log.total_cost).sum();
            let maintenance_cost: f64 = services.iter().map(|log| log.total_cost).sum();

            VehicleMetrics {
                vehicle_id: vehicle_id.clone(),
                tenant_id: vehicle.map(|vehicle| vehicle.tenant_id.clone()),
                display_number: vehicle.map(|vehicle| vehicle.display_number.clone()),
                status: vehicle.map(|vehicle| vehicle.status),
                distance,
                fills: fills.len(),
                fuel_volume: fills.iter().map(|log| log.volume).sum(),
                fuel_cost,
                services: services.len(),
                maintenance_cost,
                average_mileage: average_mileage(&fills),
                cost_per_distance: cost_per_distance(fuel_cost, maintenance_cost, distance),
            }
        })
        .collect()
}

fn driver_metrics(
    snapshot: &FleetSnapshot,
    fuel_logs: &[FuelLogEntry],
    today: NaiveDate,
) -> Vec<DriverMetrics> {
    let drivers = snapshot.drivers.as_deref().unwrap_or_default();

    let mut ids: BTreeSet<&DriverId> = drivers.iter().map(|driver| &driver.id).collect();
    ids.extend(fuel_logs.iter().filter_map(|log| log.driver_id.as_ref()));

    ids.into_iter()
        .map(|driver_id| {
            let driver = drivers.iter().find(|driver| &driver.id == driver_id);
            let fills: Vec<&FuelLogEntry> = fuel_logs
                .iter()
                .filter(|log| log.driver_id.as_ref() == Some(driver_id))
                .collect();
            let last_fill = fills.iter().map(|log| log.date).max();

            DriverMetrics {
                driver_id: driver_id.clone(),
                name: driver.map(|driver| driver.name.clone()),
                active: driver.map_or(false, |driver| driver.active),
                fills: fills.len(),
                fuel_volume: fills.iter().map(|log| log.volume).sum(),
                fuel_cost: fills.iter().map(|log| log.total_cost).sum(),
                last_fill,
                performance_score: performance_score(fills.len(), last_fill, today),
            }
        })
        .collect()
}

#[derive(Default)]
struct VendorTally {
    transactions: usize,
    fuel_cost: f64,
    maintenance_cost: f64,
    last: Option<NaiveDate>,
}

impl VendorTally {
    fn record(&mut self, date: NaiveDate) {
        self.transactions += 1;
        self.last = self.last.max(Some(date));
    }
}

fn vendor_metrics(
    fuel_logs: &[FuelLogEntry],
    maintenance: &[MaintenanceLogEntry],
    today: NaiveDate,
) -> Vec<VendorMetrics> {
    let mut tallies: BTreeMap<String, VendorTally> = BTreeMap::new();

    for log in fuel_logs {
        if let Some(vendor) = vendor_name(log.vendor.as_deref()) {
            let tally = tallies.entry(vendor).or_default();
            tally.record(log.date);
            tally.fuel_cost += log.total_cost;
        }
    }
    for log in maintenance {
        if let Some(vendor) = vendor_name(log.vendor.as_deref()) {
            let tally = tallies.entry(vendor).or_default();
            tally.record(log.date);
            tally.maintenance_cost += log.total_cost;
        }
    }

    let mut vendors: Vec<VendorMetrics> = tallies
        .into_iter()
        .map(|(vendor, tally)| VendorMetrics {
            vendor,
            transactions: tally.transactions,
            fuel_cost: tally.fuel_cost,
            maintenance_cost: tally.maintenance_cost,
            total_spend: tally.fuel_cost + tally.maintenance_cost,
            last_transaction: tally.last,
            performance_score: performance_score(tally.transactions, tally.last, today),
        })
        .collect();

    rank_by(
        &mut vendors,
        |vendor| f64::from(vendor.performance_score),
        RankDirection::Descending,
        |vendor| &vendor.vendor,
    );
    vendors
}

fn vendor_name(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn maintenance_by_kind(maintenance: &[MaintenanceLogEntry]) -> Vec<MaintenanceKindTotal> {
    MaintenanceKind::ordered()
        .into_iter()
        .filter_map(|kind| {
            let services: Vec<&MaintenanceLogEntry> =
                maintenance.iter().filter(|log| log.kind == kind).collect();
            if services.is_empty() {
                return None;
            }
            Some(MaintenanceKindTotal {
                kind,
                kind_label: kind.label(),
                services: services.len(),
                total_cost: services.iter().map(|log| log.total_cost).sum(),
                labor_cost: services.iter().map(|log| log.labor_cost).sum(),
                parts_cost: services.iter().map(|log| log.parts_cost()).sum(),
            })
        })
        .collect()
}

fn budget_utilization(budgets: &[Budget]) -> Vec<BudgetUtilization> {
    let mut by_category: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for budget in budgets {
        let entry = by_category.entry(budget.category.as_str()).or_default();
        entry.0 += budget.budgeted;
        entry.1 += budget.actual;
    }

    by_category
        .into_iter()
        .map(|(category, (budgeted, actual))| {
            let utilization = safe_ratio(actual * 100.0, budgeted);
            BudgetUtilization {
                category: category.to_string(),
                budgeted,
                actual,
                utilization,
                over_budget: budgeted > 0.0 && actual > budgeted,
            }
        })
        .collect()
}
