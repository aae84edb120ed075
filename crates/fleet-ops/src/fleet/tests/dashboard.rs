use super::common::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::fleet::alerts::{AlertKind, AlertPolicy};
use crate::fleet::dashboard::{DashboardError, FleetDashboardService};
use crate::fleet::domain::{TenantId, UserId};
use crate::fleet::fetch::EntityKind;
use crate::fleet::tenancy::{
    JsonFileScopeStore, Module, ModuleAccess, ScopeError, ScopeStore, SessionError, TenantScope,
};

fn user(id: &str) -> UserId {
    UserId::new(id)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "fleet-ops-dashboard-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[tokio::test]
async fn user_without_active_grant_fails_closed() {
    let (service, _, _) = build_service();

    let err = service
        .dashboard(&user("revoked"), today())
        .await
        .expect_err("revoked user sees nothing");

    assert!(matches!(
        err,
        DashboardError::Session(SessionError::Scope(ScopeError::NoActiveGrant(_)))
    ));
}

#[tokio::test]
async fn unknown_user_is_rejected() {
    let (service, _, _) = build_service();

    let err = service
        .scope(&user("stranger"))
        .await
        .expect_err("unknown user");

    assert!(matches!(err, DashboardError::UnknownUser(ref id) if id == &user("stranger")));
}

#[tokio::test]
async fn first_session_lands_on_first_permitted_subsidiary() {
    let (service, _, store) = build_service();

    let view = service.scope(&user("admin")).await.expect("scope view");

    assert_eq!(view.scope.scope, TenantScope::single(NORTH));
    assert_eq!(view.accessible, vec![tenant(NORTH), tenant(SOUTH)]);
    assert!(!view.read_only);
    // Inactive subsidiaries never appear, even for super admins.
    assert!(!view.accessible.contains(&tenant(LEGACY)));
    assert_eq!(
        store.load(&user("admin")).expect("store readable"),
        Some(TenantScope::single(NORTH))
    );
}

#[tokio::test]
async fn consolidated_scope_is_read_only_and_spans_accessible_tenants() {
    let (service, _, _) = build_service();

    let view = service
        .select_scope(&user("admin"), &TenantScope::All)
        .await
        .expect("switch to all");
    assert!(view.read_only);
    assert_eq!(view.scope.tenants, vec![tenant(NORTH), tenant(SOUTH)]);

    let summary = service
        .dashboard(&user("admin"), today())
        .await
        .expect("consolidated dashboard");
    assert!(summary.read_only);
    assert_eq!(summary.metrics.totals.vehicles, 3);
    assert!(summary
        .alerts
        .alerts
        .iter()
        .any(|alert| alert.id == "fuel_low:t-s1"));
    assert!(summary
        .alerts
        .alerts
        .iter()
        .any(|alert| alert.id == "fuel_low:t-n1"));

    let fuel = service
        .module_access(&user("admin"), Module::Fuel, None)
        .await
        .expect("access check");
    assert_eq!(fuel, ModuleAccess::ReadOnly);
}

#[tokio::test]
async fn switching_to_an_unpermitted_subsidiary_is_refused() {
    let (service, _, store) = build_service();

    let err = service
        .select_scope(&user("ops-north"), &TenantScope::single(SOUTH))
        .await
        .expect_err("south is not granted");

    assert!(matches!(
        err,
        DashboardError::Session(SessionError::Scope(ScopeError::TenantNotPermitted { .. }))
    ));
    assert_eq!(
        store.load(&user("ops-north")).expect("store readable"),
        Some(TenantScope::single(NORTH))
    );
}

#[tokio::test]
async fn selected_scope_survives_a_restart() {
    let dir = scratch_dir("restart");
    let repository = repository();

    let first = FleetDashboardService::new(
        Arc::clone(&repository),
        Arc::new(JsonFileScopeStore::new(&dir)),
        AlertPolicy::default(),
    );
    first
        .select_scope(&user("fuel-clerk"), &TenantScope::single(SOUTH))
        .await
        .expect("switch to south");
    drop(first);

    let second = FleetDashboardService::new(
        Arc::clone(&repository),
        Arc::new(JsonFileScopeStore::new(&dir)),
        AlertPolicy::default(),
    );
    let view = second
        .scope(&user("fuel-clerk"))
        .await
        .expect("scope restored");

    assert_eq!(view.scope.scope, TenantScope::single(SOUTH));
    assert_eq!(view.scope.tenants, vec![tenant(SOUTH)]);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn revoked_subsidiary_falls_back_on_next_session() {
    let (service, repository, _) = build_service();
    service
        .select_scope(&user("fuel-clerk"), &TenantScope::single(SOUTH))
        .await
        .expect("switch to south");

    repository
        .update(|dataset| {
            for subsidiary in &mut dataset.subsidiaries {
                if subsidiary.id == tenant(SOUTH) {
                    subsidiary.active = false;
                }
            }
        })
        .expect("dataset updates");

    let view = service
        .scope(&user("fuel-clerk"))
        .await
        .expect("scope view");
    assert_eq!(view.scope.scope, TenantScope::single(NORTH));
}

async fn clerk_access(
    service: &TestService,
    module: Module,
    tenant: Option<&TenantId>,
) -> ModuleAccess {
    service
        .module_access(&user("fuel-clerk"), module, tenant)
        .await
        .expect("access check")
}

#[tokio::test]
async fn module_access_follows_the_level_held_on_each_subsidiary() {
    let (service, _, _) = build_service();
    let south = tenant(SOUTH);
    let north = tenant(NORTH);
    let legacy = tenant(LEGACY);

    assert_eq!(
        clerk_access(&service, Module::Fuel, Some(&south)).await,
        ModuleAccess::ReadWrite
    );
    assert_eq!(
        clerk_access(&service, Module::Maintenance, Some(&south)).await,
        ModuleAccess::Denied
    );
    assert_eq!(
        clerk_access(&service, Module::Vehicles, Some(&north)).await,
        ModuleAccess::ReadOnly
    );
    assert_eq!(
        clerk_access(&service, Module::Fuel, Some(&north)).await,
        ModuleAccess::Denied
    );
    assert_eq!(
        clerk_access(&service, Module::Settings, Some(&legacy)).await,
        ModuleAccess::Denied
    );
    // No explicit tenant gates against the current scope, which starts on north.
    assert_eq!(
        clerk_access(&service, Module::Vehicles, None).await,
        ModuleAccess::ReadOnly
    );
}

#[tokio::test]
async fn failed_slice_yields_a_partial_dashboard() {
    let (service, repository, _) = build_service();
    repository.fail(EntityKind::FuelTanks, "tank telemetry offline");

    let summary = service
        .dashboard(&user("ops-north"), today())
        .await
        .expect("dashboard still renders");

    assert!(summary.is_partial());
    assert_eq!(summary.unavailable.len(), 1);
    assert_eq!(summary.unavailable[0].entity, EntityKind::FuelTanks);
    assert_eq!(summary.alerts.unavailable[0].kind, AlertKind::FuelLow);
    assert!(summary
        .alerts
        .alerts
        .iter()
        .all(|alert| alert.kind != AlertKind::FuelLow));
    assert_eq!(summary.metrics.totals.fuel_cost, 16_000.0);
    assert!(!summary.read_only);
}

#[tokio::test]
async fn alerts_only_cover_the_current_subsidiary() {
    let (service, _, _) = build_service();

    let report = service
        .alerts(&user("ops-north"), today())
        .await
        .expect("alerts");

    assert!(report.alerts.iter().all(|alert| alert
        .reference
        .as_ref()
        .map_or(true, |reference| reference.tenant_id == tenant(NORTH))));
    assert!(report.alerts.iter().all(|alert| alert.id != "fuel_low:t-s1"));
}
