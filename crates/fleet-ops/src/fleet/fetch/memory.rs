use super::{EntityKind, EntityQuery, FetchError, FleetRepository};
use crate::fleet::domain::{
    Budget, Dated, Driver, FuelLogEntry, FuelTank, MaintenanceLogEntry, OdometerReading,
    Subsidiary, TenantScoped, UserId, Vehicle, VehicleDocument,
};
use crate::fleet::tenancy::UserAccess;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Plain row collections backing [`InMemoryFleetRepository`].
#[derive(Debug, Clone, Default)]
pub struct FleetDataset {
    pub subsidiaries: Vec<Subsidiary>,
    pub users: Vec<UserAccess>,
    pub vehicles: Vec<Vehicle>,
    pub drivers: Vec<Driver>,
    pub documents: Vec<VehicleDocument>,
    pub fuel_logs: Vec<FuelLogEntry>,
    pub maintenance_logs: Vec<MaintenanceLogEntry>,
    pub odometer_readings: Vec<OdometerReading>,
    pub fuel_tanks: Vec<FuelTank>,
    pub budgets: Vec<Budget>,
}

/// Repository over an in-process dataset, used by the demo service and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFleetRepository {
    dataset: Arc<Mutex<FleetDataset>>,
    failures: Arc<Mutex<HashMap<EntityKind, String>>>,
}

impl InMemoryFleetRepository {
    pub fn new(dataset: FleetDataset) -> Self {
        Self {
            dataset: Arc::new(Mutex::new(dataset)),
            failures: Arc::default(),
        }
    }

    /// Make every subsequent query for `kind` fail with `message`.
    pub fn fail(&self, kind: EntityKind, message: impl Into<String>) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(kind, message.into());
        }
    }

    pub fn recover(&self, kind: EntityKind) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(&kind);
        }
    }

    pub fn update<F: FnOnce(&mut FleetDataset)>(&self, apply: F) -> Result<(), FetchError> {
        let mut dataset = self.dataset.lock().map_err(|_| poisoned())?;
        apply(&mut dataset);
        Ok(())
    }

    fn read(&self, kind: EntityKind) -> Result<MutexGuard<'_, FleetDataset>, FetchError> {
        let failure = self
            .failures
            .lock()
            .map_err(|_| poisoned())?
            .get(&kind)
            .cloned();
        if let Some(message) = failure {
            return Err(FetchError::backend(kind, message));
        }
        self.dataset.lock().map_err(|_| poisoned())
    }

    fn select<T, F>(&self, query: &EntityQuery, rows: F) -> Result<Vec<T>, FetchError>
    where
        T: TenantScoped + Clone,
        F: FnOnce(&FleetDataset) -> &Vec<T>,
    {
        let dataset = self.read(query.kind)?;
        Ok(rows(&dataset)
            .iter()
            .filter(|row| query.includes(row.tenant_id()))
            .cloned()
            .collect())
    }

    fn select_dated<T, F>(&self, query: &EntityQuery, rows: F) -> Result<Vec<T>, FetchError>
    where
        T: TenantScoped + Dated + Clone,
        F: FnOnce(&FleetDataset) -> &Vec<T>,
    {
        let mut selected = self.select(query, rows)?;
        selected.retain(|row| query.filter.admits(row.date()));
        Ok(selected)
    }
}

fn poisoned() -> FetchError {
    FetchError::Unavailable("in-memory dataset mutex poisoned".to_string())
}

impl FleetRepository for InMemoryFleetRepository {
    async fn subsidiaries(&self) -> Result<Vec<Subsidiary>, FetchError> {
        let dataset = self.dataset.lock().map_err(|_| poisoned())?;
        Ok(dataset.subsidiaries.clone())
    }

    async fn user_access(&self, user_id: &UserId) -> Result<Option<UserAccess>, FetchError> {
        let dataset = self.dataset.lock().map_err(|_| poisoned())?;
        Ok(dataset
            .users
            .iter()
            .find(|user| &user.user_id == user_id)
            .cloned())
    }

    async fn vehicles(&self, query: &EntityQuery) -> Result<Vec<Vehicle>, FetchError> {
        self.select(query, |dataset| &dataset.vehicles)
    }

    async fn drivers(&self, query: &EntityQuery) -> Result<Vec<Driver>, FetchError> {
        self.select(query, |dataset| &dataset.drivers)
    }

    async fn documents(&self, query: &EntityQuery) -> Result<Vec<VehicleDocument>, FetchError> {
        self.select(query, |dataset| &dataset.documents)
    }

    async fn fuel_logs(&self, query: &EntityQuery) -> Result<Vec<FuelLogEntry>, FetchError> {
        self.select_dated(query, |dataset| &dataset.fuel_logs)
    }

    async fn maintenance_logs(
        &self,
        query: &EntityQuery,
    ) -> Result<Vec<MaintenanceLogEntry>, FetchError> {
        self.select_dated(query, |dataset| &dataset.maintenance_logs)
    }

    async fn odometer_readings(
        &self,
        query: &EntityQuery,
    ) -> Result<Vec<OdometerReading>, FetchError> {
        self.select_dated(query, |dataset| &dataset.odometer_readings)
    }

    async fn fuel_tanks(&self, query: &EntityQuery) -> Result<Vec<FuelTank>, FetchError> {
        self.select(query, |dataset| &dataset.fuel_tanks)
    }

    async fn budgets(&self, query: &EntityQuery) -> Result<Vec<Budget>, FetchError> {
        let mut budgets = self.select(query, |dataset| &dataset.budgets)?;
        if let Some(category) = &query.filter.category {
            budgets.retain(|budget| budget.category.eq_ignore_ascii_case(category));
        }
        Ok(budgets)
    }
}
