use crate::fleet::domain::{OdometerReading, VehicleId};
use std::collections::BTreeMap;

/// Last minus first odometer value for one vehicle, in date order.
///
/// Fewer than two readings yield 0. A rolled-back odometer produces a negative distance;
/// the value is returned as computed.
pub fn total_distance(vehicle_id: &VehicleId, readings: &[OdometerReading]) -> f64 {
    let mut own: Vec<&OdometerReading> = readings
        .iter()
        .filter(|reading| &reading.vehicle_id == vehicle_id)
        .collect();

    if own.len() < 2 {
        return 0.0;
    }

    own.sort_by_key(|reading| reading.date);
    match (own.first(), own.last()) {
        (Some(first), Some(last)) => last.reading - first.reading,
        _ => 0.0,
    }
}

/// [`total_distance`] for every vehicle that appears in `readings`.
pub fn distance_by_vehicle(readings: &[OdometerReading]) -> BTreeMap<VehicleId, f64> {
    let mut vehicles: Vec<&VehicleId> = readings.iter().map(|reading| &reading.vehicle_id).collect();
    vehicles.sort();
    vehicles.dedup();

    vehicles
        .into_iter()
        .map(|vehicle_id| (vehicle_id.clone(), total_distance(vehicle_id, readings)))
        .collect()
}
