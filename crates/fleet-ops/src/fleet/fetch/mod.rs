//! Tenant-scoped retrieval of fleet records from the backing store.

mod memory;
mod snapshot;

pub use memory::{FleetDataset, InMemoryFleetRepository};
pub use snapshot::{FleetSnapshot, UnavailableSlice};

use crate::fleet::domain::{
    Budget, Dated, Driver, FuelLogEntry, FuelTank, MaintenanceLogEntry, OdometerReading,
    Subsidiary, TenantId, TenantScoped, UserId, Vehicle, VehicleDocument,
};
use crate::fleet::tenancy::{ResolvedScope, UserAccess};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Vehicles,
    Drivers,
    Documents,
    FuelLogs,
    MaintenanceLogs,
    OdometerReadings,
    FuelTanks,
    Budgets,
}

impl EntityKind {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Vehicles,
            Self::Drivers,
            Self::Documents,
            Self::FuelLogs,
            Self::MaintenanceLogs,
            Self::OdometerReadings,
            Self::FuelTanks,
            Self::Budgets,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Vehicles => "vehicles",
            Self::Drivers => "drivers",
            Self::Documents => "documents",
            Self::FuelLogs => "fuel logs",
            Self::MaintenanceLogs => "maintenance logs",
            Self::OdometerReadings => "odometer readings",
            Self::FuelTanks => "fuel tanks",
            Self::Budgets => "budgets",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    #[default]
    Unspecified,
    DateAscending,
    DateDescending,
}

/// Optional narrowing applied on top of the tenant predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFilter {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub order: RowOrder,
}

impl FetchFilter {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn newest_first(mut self) -> Self {
        self.order = RowOrder::DateDescending;
        self
    }

    pub fn admits(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Query handed to the backend: an OR-of-tenant-ids predicate plus the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub kind: EntityKind,
    pub tenants: Vec<TenantId>,
    pub filter: FetchFilter,
}

impl EntityQuery {
    pub fn includes(&self, tenant_id: &TenantId) -> bool {
        self.tenants.contains(tenant_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("backend failed to return {kind}: {message}")]
    Backend { kind: EntityKind, message: String },
    #[error("backend returned {kind} row {record} owned by out-of-scope tenant {tenant}")]
    CrossTenantRow {
        kind: EntityKind,
        tenant: TenantId,
        record: String,
    },
    #[error("scope resolves to no subsidiaries")]
    EmptyScope,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    pub fn backend(kind: EntityKind, message: impl Into<String>) -> Self {
        Self::Backend {
            kind,
            message: message.into(),
        }
    }
}

/// Relational backend seam. Implementations apply the tenant predicate and filters.
pub trait FleetRepository: Send + Sync {
    fn subsidiaries(&self) -> impl Future<Output = Result<Vec<Subsidiary>, FetchError>> + Send;
    fn user_access(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<UserAccess>, FetchError>> + Send;
    fn vehicles(
        &self,
        query: &EntityQuery,
    ) -> impl Future<Output = Result<Vec<Vehicle>, FetchError>> + Send;
    fn drivers(
        &self,
        query: &EntityQuery,
    ) -> impl Future<Output = Result<Vec<Driver>, FetchError>> + Send;
    fn documents(
        &self,
        query: &EntityQuery,
    ) -> impl Future<Output = Result<Vec<VehicleDocument>, FetchError>> + Send;
    fn fuel_logs(
        &self,
        query: &EntityQuery,
    ) -> impl Future<Output = Result<Vec<FuelLogEntry>, FetchError>> + Send;
    fn maintenance_logs(
        &self,
        query: &EntityQuery,
    ) -> impl Future<Output = Result<Vec<MaintenanceLogEntry>, FetchError>> + Send;
    fn odometer_readings(
        &self,
        query: &EntityQuery,
    ) -> impl Future<Output = Result<Vec<OdometerReading>, FetchError>> + Send;
    fn fuel_tanks(
        &self,
        query: &EntityQuery,
    ) -> impl Future<Output = Result<Vec<FuelTank>, FetchError>> + Send;
    fn budgets(
        &self,
        query: &EntityQuery,
    ) -> impl Future<Output = Result<Vec<Budget>, FetchError>> + Send;
}

/// Scope-enforcing front of a [`FleetRepository`].
///
/// Every row coming back is checked against the resolved scope. A row owned by any other
/// tenant fails the whole slice rather than being dropped.
pub struct EntityFetcher<R> {
    repository: Arc<R>,
}

impl<R> Clone for EntityFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: FleetRepository> EntityFetcher<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn vehicles(
        &self,
        scope: &ResolvedScope,
        filter: &FetchFilter,
    ) -> Result<Vec<Vehicle>, FetchError> {
        let query = query_for(EntityKind::Vehicles, scope, filter)?;
        let rows = self.repository.vehicles(&query).await;
        settle(&query, scope, rows)
    }

    pub async fn drivers(
        &self,
        scope: &ResolvedScope,
        filter: &FetchFilter,
    ) -> Result<Vec<Driver>, FetchError> {
        let query = query_for(EntityKind::Drivers, scope, filter)?;
        let rows = self.repository.drivers(&query).await;
        settle(&query, scope, rows)
    }

    pub async fn documents(
        &self,
        scope: &ResolvedScope,
        filter: &FetchFilter,
    ) -> Result<Vec<VehicleDocument>, FetchError> {
        let query = query_for(EntityKind::Documents, scope, filter)?;
        let rows = self.repository.documents(&query).await;
        settle(&query, scope, rows)
    }

    pub async fn fuel_logs(
        &self,
        scope: &ResolvedScope,
        filter: &FetchFilter,
    ) -> Result<Vec<FuelLogEntry>, FetchError> {
        let query = query_for(EntityKind::FuelLogs, scope, filter)?;
        let rows = self.repository.fuel_logs(&query).await;
        settle(&query, scope, rows).map(|rows| order_dated(rows, &query.filter))
    }

    pub async fn maintenance_logs(
        &self,
        scope: &ResolvedScope,
        filter: &FetchFilter,
    ) -> Result<Vec<MaintenanceLogEntry>, FetchError> {
        let query = query_for(EntityKind::MaintenanceLogs, scope, filter)?;
        let rows = self.repository.maintenance_logs(&query).await;
        settle(&query, scope, rows).map(|rows| order_dated(rows, &query.filter))
    }

    pub async fn odometer_readings(
        &self,
        scope: &ResolvedScope,
        filter: &FetchFilter,
    ) -> Result<Vec<OdometerReading>, FetchError> {
        let query = query_for(EntityKind::OdometerReadings, scope, filter)?;
        let rows = self.repository.odometer_readings(&query).await;
        settle(&query, scope, rows).map(|rows| order_dated(rows, &query.filter))
    }

    pub async fn fuel_tanks(
        &self,
        scope: &ResolvedScope,
        filter: &FetchFilter,
    ) -> Result<Vec<FuelTank>, FetchError> {
        let query = query_for(EntityKind::FuelTanks, scope, filter)?;
        let rows = self.repository.fuel_tanks(&query).await;
        settle(&query, scope, rows)
    }

    pub async fn budgets(
        &self,
        scope: &ResolvedScope,
        filter: &FetchFilter,
    ) -> Result<Vec<Budget>, FetchError> {
        let query = query_for(EntityKind::Budgets, scope, filter)?;
        let rows = self.repository.budgets(&query).await;
        settle(&query, scope, rows).map(|rows| {
            rows.into_iter()
                .filter(|budget| budget.overlaps(query.filter.from, query.filter.to))
                .collect()
        })
    }

    /// Fire every slice concurrently and wait for all of them.
    pub async fn snapshot(&self, scope: &ResolvedScope, filter: &FetchFilter) -> FleetSnapshot {
        let (
            vehicles,
            drivers,
            documents,
            fuel_logs,
            maintenance_logs,
            odometer_readings,
            fuel_tanks,
            budgets,
        ) = tokio::join!(
            self.vehicles(scope, filter),
            self.drivers(scope, filter),
            self.documents(scope, filter),
            self.fuel_logs(scope, filter),
            self.maintenance_logs(scope, filter),
            self.odometer_readings(scope, filter),
            self.fuel_tanks(scope, filter),
            self.budgets(scope, filter),
        );

        FleetSnapshot {
            scope: scope.clone(),
            vehicles,
            drivers,
            documents,
            fuel_logs,
            maintenance_logs,
            odometer_readings,
            fuel_tanks,
            budgets,
        }
    }
}

fn query_for(
    kind: EntityKind,
    scope: &ResolvedScope,
    filter: &FetchFilter,
) -> Result<EntityQuery, FetchError> {
    if scope.tenants.is_empty() {
        return Err(FetchError::EmptyScope);
    }

    Ok(EntityQuery {
        kind,
        tenants: scope.tenants.clone(),
        filter: filter.clone(),
    })
}

fn settle<T: TenantScoped>(
    query: &EntityQuery,
    scope: &ResolvedScope,
    rows: Result<Vec<T>, FetchError>,
) -> Result<Vec<T>, FetchError> {
    let rows = rows.map_err(|err| {
        warn!(kind = %query.kind, error = %err, "fetch failed");
        err
    })?;

    if let Some(row) = rows.iter().find(|row| !scope.contains(row.tenant_id())) {
        error!(
            kind = %query.kind,
            tenant = %row.tenant_id(),
            record = row.record_id(),
            "backend leaked a row outside the resolved scope"
        );
        return Err(FetchError::CrossTenantRow {
            kind: query.kind,
            tenant: row.tenant_id().clone(),
            record: row.record_id().to_string(),
        });
    }

    let fetched = rows.len();
    let mut seen = HashSet::new();
    let rows: Vec<T> = rows
        .into_iter()
        .filter(|row| seen.insert((row.tenant_id().clone(), row.record_id().to_string())))
        .collect();

    if rows.len() != fetched {
        debug!(kind = %query.kind, dropped = fetched - rows.len(), "dropped duplicate rows");
    }

    Ok(rows)
}

fn order_dated<T: Dated>(rows: Vec<T>, filter: &FetchFilter) -> Vec<T> {
    let mut rows: Vec<T> = rows
        .into_iter()
        .filter(|row| filter.admits(row.date()))
        .collect();

    match filter.order {
        RowOrder::Unspecified => {}
        RowOrder::DateAscending => rows.sort_by_key(|row| row.date()),
        RowOrder::DateDescending => rows.sort_by(|a, b| b.date().cmp(&a.date())),
    }

    rows
}
