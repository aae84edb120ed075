use std::sync::Arc;

use axum::response::Response;
use chrono::{Duration, NaiveDate};
use serde_json::Value;

use crate::fleet::alerts::AlertPolicy;
use crate::fleet::dashboard::FleetDashboardService;
use crate::fleet::domain::{
    Budget, DocumentKind, Driver, DriverId, FuelLogEntry, FuelTank, FuelType, MaintenanceKind,
    MaintenanceLogEntry, OdometerReading, PartUsage, Subsidiary, TenantId, UserId, Vehicle,
    VehicleDocument, VehicleDocumentDates, VehicleId, VehicleStatus,
};
use crate::fleet::fetch::{
    EntityFetcher, FetchFilter, FleetDataset, FleetSnapshot, InMemoryFleetRepository,
};
use crate::fleet::tenancy::{
    InMemoryScopeStore, PermissionLevel, ResolvedScope, TenantGrant, TenantScope, UserAccess,
};

pub(super) const NORTH: &str = "north";
pub(super) const SOUTH: &str = "south";
pub(super) const LEGACY: &str = "legacy";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 15).expect("valid date")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn days_from_today(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

pub(super) fn tenant(id: &str) -> TenantId {
    TenantId::new(id)
}

pub(super) fn subsidiaries() -> Vec<Subsidiary> {
    vec![
        Subsidiary {
            id: tenant(NORTH),
            name: "North Logistics".to_string(),
            code: "NL".to_string(),
            business_type: "logistics".to_string(),
            active: true,
        },
        Subsidiary {
            id: tenant(SOUTH),
            name: "South Haulage".to_string(),
            code: "SH".to_string(),
            business_type: "haulage".to_string(),
            active: true,
        },
        Subsidiary {
            id: tenant(LEGACY),
            name: "Legacy Carriers".to_string(),
            code: "LC".to_string(),
            business_type: "haulage".to_string(),
            active: false,
        },
    ]
}

fn grant(tenant_id: &str, level: PermissionLevel) -> TenantGrant {
    TenantGrant {
        tenant_id: tenant(tenant_id),
        level,
        active: true,
    }
}

pub(super) fn users() -> Vec<UserAccess> {
    vec![
        UserAccess {
            user_id: UserId::new("admin"),
            super_admin: true,
            grants: Vec::new(),
        },
        UserAccess {
            user_id: UserId::new("ops-north"),
            super_admin: false,
            grants: vec![grant(NORTH, PermissionLevel::OperationalAccess)],
        },
        UserAccess {
            user_id: UserId::new("fuel-clerk"),
            super_admin: false,
            grants: vec![
                grant(NORTH, PermissionLevel::ReadOnlyAccess),
                grant(SOUTH, PermissionLevel::FuelOnlyAccess),
            ],
        },
        UserAccess {
            user_id: UserId::new("revoked"),
            super_admin: false,
            grants: vec![
                TenantGrant {
                    active: false,
                    ..grant(NORTH, PermissionLevel::FullAccess)
                },
                grant(LEGACY, PermissionLevel::FullAccess),
            ],
        },
    ]
}

fn vehicle(
    id: &str,
    tenant_id: &str,
    number: &str,
    status: VehicleStatus,
    documents: VehicleDocumentDates,
) -> Vehicle {
    Vehicle {
        id: VehicleId::new(id),
        tenant_id: tenant(tenant_id),
        display_number: number.to_string(),
        make: "Tata".to_string(),
        model: "Ultra".to_string(),
        year: 2022,
        fuel_type: FuelType::Diesel,
        status,
        documents,
    }
}

pub(super) fn fill(
    id: &str,
    tenant_id: &str,
    vehicle_id: &str,
    driver_id: Option<&str>,
    on: NaiveDate,
    volume: f64,
    odometer: f64,
) -> FuelLogEntry {
    FuelLogEntry {
        id: id.to_string(),
        tenant_id: tenant(tenant_id),
        date: on,
        vehicle_id: VehicleId::new(vehicle_id),
        driver_id: driver_id.map(DriverId::new),
        volume,
        rate: 100.0,
        total_cost: volume * 100.0,
        odometer,
        distance: None,
        mileage: None,
        fuel_type: FuelType::Diesel,
        vendor: Some("Highway Fuels".to_string()),
    }
}

pub(super) fn service(
    id: &str,
    tenant_id: &str,
    vehicle_id: &str,
    on: NaiveDate,
    kind: MaintenanceKind,
    total_cost: f64,
    vendor: &str,
) -> MaintenanceLogEntry {
    MaintenanceLogEntry {
        id: id.to_string(),
        tenant_id: tenant(tenant_id),
        date: on,
        vehicle_id: VehicleId::new(vehicle_id),
        kind,
        total_cost,
        labor_cost: total_cost * 0.4,
        parts: vec![PartUsage {
            name: "Filter kit".to_string(),
            quantity: 1,
            cost: total_cost * 0.6,
        }],
        vendor: Some(vendor.to_string()),
        description: None,
    }
}

fn reading(id: &str, tenant_id: &str, vehicle_id: &str, on: NaiveDate, value: f64) -> OdometerReading {
    OdometerReading {
        id: id.to_string(),
        tenant_id: tenant(tenant_id),
        date: on,
        vehicle_id: VehicleId::new(vehicle_id),
        reading: value,
    }
}

pub(super) fn tank(id: &str, tenant_id: &str, current: f64, capacity: f64, low: f64) -> FuelTank {
    FuelTank {
        id: id.to_string(),
        tenant_id: tenant(tenant_id),
        name: format!("Depot tank {id}"),
        fuel_type: FuelType::Diesel,
        current_volume: current,
        capacity,
        low_threshold: low,
        unit: "L".to_string(),
    }
}

pub(super) fn budget(id: &str, tenant_id: &str, category: &str, budgeted: f64, actual: f64) -> Budget {
    Budget {
        id: id.to_string(),
        tenant_id: tenant(tenant_id),
        category: category.to_string(),
        period_start: date(2026, 4, 1),
        period_end: date(2026, 6, 30),
        budgeted,
        actual,
    }
}

/// Two active subsidiaries whose activity overlaps in time but never shares ids.
pub(super) fn dataset() -> FleetDataset {
    FleetDataset {
        subsidiaries: subsidiaries(),
        users: users(),
        vehicles: vec![
            vehicle(
                "v-n1",
                NORTH,
                "KA-01-1001",
                VehicleStatus::Active,
                VehicleDocumentDates {
                    insurance_expiry: Some(days_from_today(-1)),
                    registration_expiry: Some(days_from_today(10)),
                    pollution_certificate_expiry: Some(days_from_today(45)),
                    permit_expiry: None,
                },
            ),
            vehicle(
                "v-n2",
                NORTH,
                "KA-01-1002",
                VehicleStatus::Active,
                VehicleDocumentDates {
                    insurance_expiry: Some(days_from_today(3)),
                    ..VehicleDocumentDates::default()
                },
            ),
            vehicle(
                "v-s1",
                SOUTH,
                "MH-12-2001",
                VehicleStatus::Maintenance,
                VehicleDocumentDates {
                    permit_expiry: Some(days_from_today(30)),
                    ..VehicleDocumentDates::default()
                },
            ),
        ],
        drivers: vec![
            Driver {
                id: DriverId::new("d-n1"),
                tenant_id: tenant(NORTH),
                name: "Asha Rao".to_string(),
                license_number: "KA0120190001".to_string(),
                license_expiry: Some(days_from_today(5)),
                active: true,
            },
            Driver {
                id: DriverId::new("d-n2"),
                tenant_id: tenant(NORTH),
                name: "Ravi Kumar".to_string(),
                license_number: "KA0120150042".to_string(),
                license_expiry: Some(days_from_today(-2)),
                active: false,
            },
            Driver {
                id: DriverId::new("d-s1"),
                tenant_id: tenant(SOUTH),
                name: "Imran Shaikh".to_string(),
                license_number: "MH1220180007".to_string(),
                license_expiry: Some(days_from_today(20)),
                active: true,
            },
        ],
        documents: vec![
            VehicleDocument {
                id: "doc-n1".to_string(),
                tenant_id: tenant(NORTH),
                vehicle_id: VehicleId::new("v-n2"),
                kind: DocumentKind::Permit,
                reference_number: "PRM-88".to_string(),
                expiry: Some(days_from_today(31)),
            },
            VehicleDocument {
                id: "doc-s1".to_string(),
                tenant_id: tenant(SOUTH),
                vehicle_id: VehicleId::new("v-s1"),
                kind: DocumentKind::Fitness,
                reference_number: "FIT-12".to_string(),
                expiry: Some(days_from_today(60)),
            },
        ],
        fuel_logs: vec![
            fill("f-n1", NORTH, "v-n1", Some("d-n1"), date(2026, 5, 1), 40.0, 10_000.0),
            fill("f-n2", NORTH, "v-n1", Some("d-n1"), date(2026, 5, 10), 40.0, 10_500.0),
            fill("f-n3", NORTH, "v-n1", Some("d-n1"), date(2026, 5, 20), 40.0, 11_000.0),
            fill("f-n4", NORTH, "v-n1", Some("d-n1"), date(2026, 6, 1), 40.0, 11_300.0),
            fill("f-s1", SOUTH, "v-s1", Some("d-s1"), date(2026, 5, 2), 50.0, 5_000.0),
            fill("f-s2", SOUTH, "v-s1", Some("d-s1"), date(2026, 5, 12), 50.0, 5_600.0),
            fill("f-s3", SOUTH, "v-s1", Some("d-s1"), date(2026, 5, 25), 50.0, 6_200.0),
        ],
        maintenance_logs: vec![
            service(
                "m-n1",
                NORTH,
                "v-n1",
                date(2026, 5, 15),
                MaintenanceKind::Scheduled,
                5_000.0,
                "City Garage",
            ),
            service(
                "m-n2",
                NORTH,
                "v-n2",
                date(2026, 2, 1),
                MaintenanceKind::Preventive,
                1_500.0,
                "City Garage",
            ),
            service(
                "m-s1",
                SOUTH,
                "v-s1",
                date(2026, 6, 1),
                MaintenanceKind::Breakdown,
                8_000.0,
                "Highway Motors",
            ),
        ],
        odometer_readings: vec![
            reading("o-n1", NORTH, "v-n1", date(2026, 5, 1), 10_000.0),
            reading("o-n2", NORTH, "v-n1", date(2026, 6, 1), 11_300.0),
            reading("o-s1", SOUTH, "v-s1", date(2026, 5, 2), 5_000.0),
            reading("o-s2", SOUTH, "v-s1", date(2026, 5, 25), 6_200.0),
        ],
        fuel_tanks: vec![
            tank("t-n1", NORTH, 50.0, 1_000.0, 150.0),
            tank("t-s1", SOUTH, 200.0, 2_000.0, 300.0),
            tank("t-s2", SOUTH, 400.0, 500.0, 50.0),
        ],
        budgets: vec![
            budget("b-n1", NORTH, "Fuel", 10_000.0, 8_000.0),
            budget("b-n2", NORTH, "Maintenance", 5_000.0, 5_000.0),
            budget("b-s1", SOUTH, "Fuel", 20_000.0, 3_000.0),
        ],
    }
}

pub(super) fn repository() -> Arc<InMemoryFleetRepository> {
    Arc::new(InMemoryFleetRepository::new(dataset()))
}

pub(super) fn single_scope(tenant_id: &str) -> ResolvedScope {
    ResolvedScope {
        scope: TenantScope::single(tenant_id),
        tenants: vec![tenant(tenant_id)],
    }
}

pub(super) fn consolidated_scope() -> ResolvedScope {
    ResolvedScope {
        scope: TenantScope::All,
        tenants: vec![tenant(NORTH), tenant(SOUTH)],
    }
}

pub(super) async fn snapshot(
    repository: &Arc<InMemoryFleetRepository>,
    scope: &ResolvedScope,
) -> FleetSnapshot {
    EntityFetcher::new(Arc::clone(repository))
        .snapshot(scope, &FetchFilter::default())
        .await
}

pub(super) type TestService = FleetDashboardService<InMemoryFleetRepository, InMemoryScopeStore>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<InMemoryFleetRepository>,
    Arc<InMemoryScopeStore>,
) {
    let repository = repository();
    let store = Arc::new(InMemoryScopeStore::default());
    let service = Arc::new(FleetDashboardService::new(
        Arc::clone(&repository),
        Arc::clone(&store),
        AlertPolicy::default(),
    ));
    (service, repository, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("json body")
}
