use chrono::{Duration, NaiveDate};
use fleet_ops::fleet::domain::{
    Budget, DocumentKind, Driver, DriverId, FuelLogEntry, FuelTank, FuelType, MaintenanceKind,
    MaintenanceLogEntry, OdometerReading, PartUsage, Subsidiary, TenantId, UserId, Vehicle,
    VehicleDocument, VehicleDocumentDates, VehicleId, VehicleStatus,
};
use fleet_ops::fleet::fetch::FleetDataset;
use fleet_ops::fleet::tenancy::{PermissionLevel, TenantGrant, UserAccess};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) const DEMO_TENANTS: [&str; 2] = ["metro", "highway"];

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn tenant(id: &str) -> TenantId {
    TenantId::new(id)
}

fn grant(tenant_id: &str, level: PermissionLevel) -> TenantGrant {
    TenantGrant {
        tenant_id: tenant(tenant_id),
        level,
        active: true,
    }
}

fn demo_users() -> Vec<UserAccess> {
    vec![
        UserAccess {
            user_id: UserId::new("admin"),
            super_admin: true,
            grants: Vec::new(),
        },
        UserAccess {
            user_id: UserId::new("metro-ops"),
            super_admin: false,
            grants: vec![grant("metro", PermissionLevel::OperationalAccess)],
        },
        UserAccess {
            user_id: UserId::new("fuel-desk"),
            super_admin: false,
            grants: vec![
                grant("metro", PermissionLevel::FuelOnlyAccess),
                grant("highway", PermissionLevel::FuelOnlyAccess),
            ],
        },
        UserAccess {
            user_id: UserId::new("auditor"),
            super_admin: false,
            grants: vec![
                grant("metro", PermissionLevel::ReadOnlyAccess),
                grant("highway", PermissionLevel::ReadOnlyAccess),
            ],
        },
    ]
}

fn demo_vehicle(
    id: &str,
    tenant_id: &str,
    number: &str,
    fuel_type: FuelType,
    documents: VehicleDocumentDates,
) -> Vehicle {
    Vehicle {
        id: VehicleId::new(id),
        tenant_id: tenant(tenant_id),
        display_number: number.to_string(),
        make: "Tata".to_string(),
        model: "Signa 4825".to_string(),
        year: 2022,
        fuel_type,
        status: VehicleStatus::Active,
        documents,
    }
}

struct FillPlan<'a> {
    tenant_id: &'a str,
    vehicle_id: &'a str,
    driver_id: &'a str,
    vendor: &'a str,
    rate: f64,
    start_odometer: f64,
    /// `(days before today, volume, distance since previous fill)`.
    fills: &'a [(i64, f64, f64)],
}

impl FillPlan<'_> {
    fn entries(&self, today: NaiveDate) -> Vec<FuelLogEntry> {
        let mut odometer = self.start_odometer;
        self.fills
            .iter()
            .enumerate()
            .map(|(index, (days_ago, volume, distance))| {
                odometer += distance;
                FuelLogEntry {
                    id: format!("{}-fill-{:02}", self.vehicle_id, index + 1),
                    tenant_id: tenant(self.tenant_id),
                    date: today - Duration::days(*days_ago),
                    vehicle_id: VehicleId::new(self.vehicle_id),
                    driver_id: Some(DriverId::new(self.driver_id)),
                    volume: *volume,
                    rate: self.rate,
                    total_cost: volume * self.rate,
                    odometer,
                    distance: None,
                    mileage: None,
                    fuel_type: FuelType::Diesel,
                    vendor: Some(self.vendor.to_string()),
                }
            })
            .collect()
    }
}

#[allow(clippy::too_many_arguments)]
fn service(
    id: &str,
    tenant_id: &str,
    vehicle_id: &str,
    date: NaiveDate,
    kind: MaintenanceKind,
    labor_cost: f64,
    parts: Vec<PartUsage>,
    vendor: &str,
) -> MaintenanceLogEntry {
    let parts_cost: f64 = parts.iter().map(|part| part.cost).sum();
    MaintenanceLogEntry {
        id: id.to_string(),
        tenant_id: tenant(tenant_id),
        date,
        vehicle_id: VehicleId::new(vehicle_id),
        kind,
        total_cost: labor_cost + parts_cost,
        labor_cost,
        parts,
        vendor: Some(vendor.to_string()),
        description: None,
    }
}

fn part(name: &str, quantity: u32, cost: f64) -> PartUsage {
    PartUsage {
        name: name.to_string(),
        quantity,
        cost,
    }
}

fn odometer_trail(fills: &[FuelLogEntry]) -> Vec<OdometerReading> {
    fills
        .iter()
        .map(|fill| OdometerReading {
            id: format!("odo-{}", fill.id),
            tenant_id: fill.tenant_id.clone(),
            date: fill.date,
            vehicle_id: fill.vehicle_id.clone(),
            reading: fill.odometer,
        })
        .collect()
}

/// Two subsidiaries with enough history, expiring paperwork and low stock to light up every
/// alert category relative to `today`.
pub(crate) fn demo_dataset(today: NaiveDate) -> FleetDataset {
    let days = |offset: i64| today + Duration::days(offset);

    let mut fuel_logs = FillPlan {
        tenant_id: "metro",
        vehicle_id: "mt-101",
        driver_id: "drv-anita",
        vendor: "City Fuels",
        rate: 96.4,
        start_odometer: 48_200.0,
        fills: &[(56, 60.0, 0.0), (42, 58.0, 610.0), (28, 62.0, 640.0), (14, 61.0, 630.0), (2, 64.0, 420.0)],
    }
    .entries(today);
    fuel_logs.extend(
        FillPlan {
            tenant_id: "metro",
            vehicle_id: "mt-102",
            driver_id: "drv-jamal",
            vendor: "City Fuels",
            rate: 96.4,
            start_odometer: 12_750.0,
            fills: &[(40, 45.0, 0.0), (20, 44.0, 520.0), (5, 46.0, 540.0)],
        }
        .entries(today),
    );
    fuel_logs.extend(
        FillPlan {
            tenant_id: "highway",
            vehicle_id: "hw-201",
            driver_id: "drv-priya",
            vendor: "NH48 Truck Stop",
            rate: 94.9,
            start_odometer: 131_000.0,
            fills: &[(35, 180.0, 0.0), (24, 175.0, 720.0), (12, 182.0, 750.0), (3, 178.0, 735.0)],
        }
        .entries(today),
    );
    let odometer_readings = odometer_trail(&fuel_logs);

    FleetDataset {
        subsidiaries: vec![
            Subsidiary {
                id: tenant("metro"),
                name: "Metro Distribution".to_string(),
                code: "MD".to_string(),
                business_type: "last-mile".to_string(),
                active: true,
            },
            Subsidiary {
                id: tenant("highway"),
                name: "Highway Haulage".to_string(),
                code: "HH".to_string(),
                business_type: "long-haul".to_string(),
                active: true,
            },
        ],
        users: demo_users(),
        vehicles: vec![
            demo_vehicle(
                "mt-101",
                "metro",
                "MH-01-AB-1011",
                FuelType::Diesel,
                VehicleDocumentDates {
                    insurance_expiry: Some(days(4)),
                    registration_expiry: Some(days(400)),
                    pollution_certificate_expiry: Some(days(21)),
                    permit_expiry: None,
                },
            ),
            demo_vehicle(
                "mt-102",
                "metro",
                "MH-01-AB-1022",
                FuelType::Diesel,
                VehicleDocumentDates {
                    insurance_expiry: Some(days(180)),
                    ..VehicleDocumentDates::default()
                },
            ),
            demo_vehicle(
                "hw-201",
                "highway",
                "GJ-05-CD-2011",
                FuelType::Diesel,
                VehicleDocumentDates {
                    insurance_expiry: Some(days(-3)),
                    permit_expiry: Some(days(12)),
                    ..VehicleDocumentDates::default()
                },
            ),
        ],
        drivers: vec![
            Driver {
                id: DriverId::new("drv-anita"),
                tenant_id: tenant("metro"),
                name: "Anita Desai".to_string(),
                license_number: "MH0120170091".to_string(),
                license_expiry: Some(days(25)),
                active: true,
            },
            Driver {
                id: DriverId::new("drv-jamal"),
                tenant_id: tenant("metro"),
                name: "Jamal Khan".to_string(),
                license_number: "MH0120190433".to_string(),
                license_expiry: Some(days(600)),
                active: true,
            },
            Driver {
                id: DriverId::new("drv-priya"),
                tenant_id: tenant("highway"),
                name: "Priya Nair".to_string(),
                license_number: "GJ0520150012".to_string(),
                license_expiry: Some(days(6)),
                active: true,
            },
        ],
        documents: vec![VehicleDocument {
            id: "doc-hw-201-fitness".to_string(),
            tenant_id: tenant("highway"),
            vehicle_id: VehicleId::new("hw-201"),
            kind: DocumentKind::Fitness,
            reference_number: "FC-2211".to_string(),
            expiry: Some(days(28)),
        }],
        fuel_logs,
        maintenance_logs: vec![
            service(
                "svc-mt-101-1",
                "metro",
                "mt-101",
                days(-30),
                MaintenanceKind::Scheduled,
                2_400.0,
                vec![part("Oil filter", 1, 650.0), part("Engine oil 15W-40", 12, 4_800.0)],
                "Metro Motors",
            ),
            service(
                "svc-hw-201-1",
                "highway",
                "hw-201",
                days(-10),
                MaintenanceKind::Breakdown,
                6_500.0,
                vec![part("Clutch plate", 1, 14_200.0)],
                "NH48 Truck Stop",
            ),
            service(
                "svc-hw-201-0",
                "highway",
                "hw-201",
                days(-150),
                MaintenanceKind::Preventive,
                1_800.0,
                vec![part("Brake pads", 4, 5_600.0)],
                "Highway Auto Works",
            ),
        ],
        odometer_readings,
        fuel_tanks: vec![
            FuelTank {
                id: "tank-metro-yard".to_string(),
                tenant_id: tenant("metro"),
                name: "Metro yard diesel".to_string(),
                fuel_type: FuelType::Diesel,
                current_volume: 420.0,
                capacity: 5_000.0,
                low_threshold: 750.0,
                unit: "L".to_string(),
            },
            FuelTank {
                id: "tank-highway-depot".to_string(),
                tenant_id: tenant("highway"),
                name: "Highway depot diesel".to_string(),
                fuel_type: FuelType::Diesel,
                current_volume: 9_100.0,
                capacity: 12_000.0,
                low_threshold: 2_000.0,
                unit: "L".to_string(),
            },
        ],
        budgets: vec![
            Budget {
                id: "bud-metro-fuel".to_string(),
                tenant_id: tenant("metro"),
                category: "Fuel".to_string(),
                period_start: days(-60),
                period_end: days(30),
                budgeted: 120_000.0,
                actual: 101_500.0,
            },
            Budget {
                id: "bud-highway-maintenance".to_string(),
                tenant_id: tenant("highway"),
                category: "Maintenance".to_string(),
                period_start: days(-60),
                period_end: days(30),
                budgeted: 25_000.0,
                actual: 28_100.0,
            },
        ],
    }
}
