use super::{EntityKind, FetchError};
use crate::fleet::domain::{
    Budget, Driver, FuelLogEntry, FuelTank, MaintenanceLogEntry, OdometerReading, Vehicle,
    VehicleDocument,
};
use crate::fleet::tenancy::ResolvedScope;
use serde::Serialize;

/// In-memory result of one concurrent load, each slice succeeding or failing on its own.
#[derive(Debug)]
pub struct FleetSnapshot {
    pub scope: ResolvedScope,
    pub vehicles: Result<Vec<Vehicle>, FetchError>,
    pub drivers: Result<Vec<Driver>, FetchError>,
    pub documents: Result<Vec<VehicleDocument>, FetchError>,
    pub fuel_logs: Result<Vec<FuelLogEntry>, FetchError>,
    pub maintenance_logs: Result<Vec<MaintenanceLogEntry>, FetchError>,
    pub odometer_readings: Result<Vec<OdometerReading>, FetchError>,
    pub fuel_tanks: Result<Vec<FuelTank>, FetchError>,
    pub budgets: Result<Vec<Budget>, FetchError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnavailableSlice {
    pub entity: EntityKind,
    pub reason: String,
}

impl FleetSnapshot {
    pub fn failure(&self, kind: EntityKind) -> Option<&FetchError> {
        match kind {
            EntityKind::Vehicles => self.vehicles.as_ref().err(),
            EntityKind::Drivers => self.drivers.as_ref().err(),
            EntityKind::Documents => self.documents.as_ref().err(),
            EntityKind::FuelLogs => self.fuel_logs.as_ref().err(),
            EntityKind::MaintenanceLogs => self.maintenance_logs.as_ref().err(),
            EntityKind::OdometerReadings => self.odometer_readings.as_ref().err(),
            EntityKind::FuelTanks => self.fuel_tanks.as_ref().err(),
            EntityKind::Budgets => self.budgets.as_ref().err(),
        }
    }

    pub fn unavailable(&self) -> Vec<UnavailableSlice> {
        EntityKind::ordered()
            .into_iter()
            .filter_map(|entity| {
                self.failure(entity).map(|err| UnavailableSlice {
                    entity,
                    reason: err.to_string(),
                })
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        EntityKind::ordered()
            .into_iter()
            .all(|entity| self.failure(entity).is_none())
    }
}
