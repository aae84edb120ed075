use super::common::*;
use crate::fleet::domain::{TenantId, TenantScoped};
use crate::fleet::fetch::{EntityFetcher, EntityKind, FetchError, FetchFilter};
use crate::fleet::tenancy::{ResolvedScope, TenantScope};
use std::collections::BTreeSet;
use std::sync::Arc;

fn keys<T: TenantScoped>(rows: &[T]) -> Vec<(TenantId, String)> {
    rows.iter()
        .map(|row| (row.tenant_id().clone(), row.record_id().to_string()))
        .collect()
}

fn union_of<T: TenantScoped>(left: &[T], right: &[T]) -> BTreeSet<(TenantId, String)> {
    keys(left).into_iter().chain(keys(right)).collect()
}

#[tokio::test]
async fn consolidated_scope_is_the_union_of_single_scopes() {
    let repository = repository();
    let fetcher = EntityFetcher::new(Arc::clone(&repository));
    let filter = FetchFilter::between(date(2026, 5, 1), date(2026, 5, 31));

    let north = fetcher.fuel_logs(&single_scope(NORTH), &filter).await.expect("north fuel");
    let south = fetcher.fuel_logs(&single_scope(SOUTH), &filter).await.expect("south fuel");
    let all = fetcher
        .fuel_logs(&consolidated_scope(), &filter)
        .await
        .expect("consolidated fuel");

    assert!(!north.is_empty() && !south.is_empty());

    let consolidated: Vec<(TenantId, String)> = keys(&all);
    let unique: BTreeSet<(TenantId, String)> = consolidated.iter().cloned().collect();
    assert_eq!(consolidated.len(), unique.len(), "no duplicate rows");
    assert_eq!(unique, union_of(&north, &south));
    assert_eq!(all.len(), north.len() + south.len());
}

#[tokio::test]
async fn consolidated_snapshot_covers_every_slice_of_both_tenants() {
    let repository = repository();
    let north = snapshot(&repository, &single_scope(NORTH)).await;
    let south = snapshot(&repository, &single_scope(SOUTH)).await;
    let all = snapshot(&repository, &consolidated_scope()).await;

    assert!(all.is_complete());
    assert_eq!(
        keys(all.vehicles.as_ref().expect("vehicles")).into_iter().collect::<BTreeSet<_>>(),
        union_of(
            north.vehicles.as_ref().expect("north vehicles"),
            south.vehicles.as_ref().expect("south vehicles")
        )
    );
    assert_eq!(
        keys(all.maintenance_logs.as_ref().expect("maintenance")).into_iter().collect::<BTreeSet<_>>(),
        union_of(
            north.maintenance_logs.as_ref().expect("north maintenance"),
            south.maintenance_logs.as_ref().expect("south maintenance")
        )
    );
    assert_eq!(
        keys(all.budgets.as_ref().expect("budgets")).into_iter().collect::<BTreeSet<_>>(),
        union_of(
            north.budgets.as_ref().expect("north budgets"),
            south.budgets.as_ref().expect("south budgets")
        )
    );
}

#[tokio::test]
async fn single_scope_never_sees_another_tenant() {
    let repository = repository();
    let snapshot = snapshot(&repository, &single_scope(SOUTH)).await;

    let vehicles = snapshot.vehicles.expect("vehicles load");
    assert!(vehicles.iter().all(|vehicle| vehicle.tenant_id == tenant(SOUTH)));
    let tanks = snapshot.fuel_tanks.expect("tanks load");
    assert!(tanks.iter().all(|tank| tank.tenant_id == tenant(SOUTH)));
}

#[tokio::test]
async fn leaked_row_fails_the_slice() {
    let leaking = EntityFetcher::new(Arc::new(LeakyRepository(repository())));

    let err = leaking
        .fuel_tanks(&single_scope(SOUTH), &FetchFilter::default())
        .await
        .expect_err("north row under south scope is rejected");

    match err {
        FetchError::CrossTenantRow {
            kind,
            tenant: leaked,
            ..
        } => {
            assert_eq!(kind, EntityKind::FuelTanks);
            assert_eq!(leaked, tenant(NORTH));
        }
        other => panic!("expected a cross-tenant failure, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_scope_is_rejected_before_querying() {
    let fetcher = EntityFetcher::new(repository());
    let scope = ResolvedScope {
        scope: TenantScope::All,
        tenants: Vec::new(),
    };

    let err = fetcher
        .vehicles(&scope, &FetchFilter::default())
        .await
        .expect_err("empty scope fails closed");
    assert_eq!(err, FetchError::EmptyScope);
}

#[tokio::test]
async fn backend_failure_is_an_error_not_an_empty_slice() {
    let repository = repository();
    repository.fail(EntityKind::Documents, "statement timeout");
    let degraded = snapshot(&repository, &single_scope(NORTH)).await;

    assert!(!degraded.is_complete());
    let unavailable = degraded.unavailable();
    assert_eq!(unavailable.len(), 1);
    assert_eq!(unavailable[0].entity, EntityKind::Documents);
    assert!(unavailable[0].reason.contains("statement timeout"));
    assert!(degraded.vehicles.is_ok());

    repository.recover(EntityKind::Documents);
    assert!(snapshot(&repository, &single_scope(NORTH)).await.is_complete());
}

#[tokio::test]
async fn newest_first_orders_dated_slices() {
    let fetcher = EntityFetcher::new(repository());
    let filter = FetchFilter::default().newest_first();

    let logs = fetcher
        .fuel_logs(&consolidated_scope(), &filter)
        .await
        .expect("fuel logs");

    let dates: Vec<_> = logs.iter().map(|log| log.date).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
    assert_eq!(logs.first().map(|log| log.id.as_str()), Some("f-n4"));
}

#[tokio::test]
async fn budgets_filter_by_period_overlap_and_category() {
    let fetcher = EntityFetcher::new(repository());
    let mut filter = FetchFilter::between(date(2026, 6, 1), date(2026, 6, 30));
    filter.category = Some("fuel".to_string());

    let budgets = fetcher
        .budgets(&consolidated_scope(), &filter)
        .await
        .expect("budgets");
    let ids: BTreeSet<&str> = budgets.iter().map(|budget| budget.id.as_str()).collect();
    assert_eq!(ids, BTreeSet::from(["b-n1", "b-s1"]));

    let outside = FetchFilter::between(date(2026, 7, 1), date(2026, 7, 31));
    let none = fetcher
        .budgets(&consolidated_scope(), &outside)
        .await
        .expect("budgets");
    assert!(none.is_empty());
}

/// Backend double that ignores the tenant predicate.
struct LeakyRepository(Arc<crate::fleet::fetch::InMemoryFleetRepository>);

mod leaky {
    use super::LeakyRepository;
    use crate::fleet::domain::{
        Budget, Driver, FuelLogEntry, FuelTank, MaintenanceLogEntry, OdometerReading, Subsidiary,
        TenantId, UserId, Vehicle, VehicleDocument,
    };
    use crate::fleet::fetch::{EntityQuery, FetchError, FleetRepository};
    use crate::fleet::tenancy::UserAccess;

    impl LeakyRepository {
        fn everything(query: &EntityQuery) -> EntityQuery {
            let mut widened = query.clone();
            widened.tenants = vec![TenantId::new("north"), TenantId::new("south")];
            widened
        }
    }

    impl FleetRepository for LeakyRepository {
        async fn subsidiaries(&self) -> Result<Vec<Subsidiary>, FetchError> {
            self.0.subsidiaries().await
        }

        async fn user_access(&self, user_id: &UserId) -> Result<Option<UserAccess>, FetchError> {
            self.0.user_access(user_id).await
        }

        async fn vehicles(&self, query: &EntityQuery) -> Result<Vec<Vehicle>, FetchError> {
            self.0.vehicles(&Self::everything(query)).await
        }

        async fn drivers(&self, query: &EntityQuery) -> Result<Vec<Driver>, FetchError> {
            self.0.drivers(&Self::everything(query)).await
        }

        async fn documents(&self, query: &EntityQuery) -> Result<Vec<VehicleDocument>, FetchError> {
            self.0.documents(&Self::everything(query)).await
        }

        async fn fuel_logs(&self, query: &EntityQuery) -> Result<Vec<FuelLogEntry>, FetchError> {
            self.0.fuel_logs(&Self::everything(query)).await
        }

        async fn maintenance_logs(
            &self,
            query: &EntityQuery,
        ) -> Result<Vec<MaintenanceLogEntry>, FetchError> {
            self.0.maintenance_logs(&Self::everything(query)).await
        }

        async fn odometer_readings(
            &self,
            query: &EntityQuery,
        ) -> Result<Vec<OdometerReading>, FetchError> {
            self.0.odometer_readings(&Self::everything(query)).await
        }

        async fn fuel_tanks(&self, query: &EntityQuery) -> Result<Vec<FuelTank>, FetchError> {
            self.0.fuel_tanks(&Self::everything(query)).await
        }

        async fn budgets(&self, query: &EntityQuery) -> Result<Vec<Budget>, FetchError> {
            self.0.budgets(&Self::everything(query)).await
        }
    }
}
