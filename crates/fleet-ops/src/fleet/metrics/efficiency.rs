use crate::fleet::domain::{FuelLogEntry, VehicleId};
use std::collections::HashMap;

/// `numerator / denominator`, or 0 when the denominator is zero or not finite.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Distance per unit of fuel across the whole set: Σdistance / Σvolume.
pub fn average_mileage(fuel_logs: &[FuelLogEntry]) -> f64 {
    let (distance, volume) = fuel_logs.iter().fold((0.0, 0.0), |(distance, volume), log| {
        (distance + log.distance.unwrap_or(0.0), volume + log.volume)
    });
    safe_ratio(distance, volume)
}

pub fn cost_per_distance(fuel_cost: f64, maintenance_cost: f64, distance: f64) -> f64 {
    safe_ratio(fuel_cost + maintenance_cost, distance)
}

/// Fill in per-fill distance and mileage from consecutive odometer values.
///
/// Fills are walked per vehicle in date order. The first fill of a vehicle keeps whatever
/// distance it was stored with. Returned rows keep the input order.
pub fn derive_fill_mileage(fuel_logs: &[FuelLogEntry]) -> Vec<FuelLogEntry> {
    let mut order: Vec<usize> = (0..fuel_logs.len()).collect();
    order.sort_by(|&a, &b| {
        let (left, right) = (&fuel_logs[a], &fuel_logs[b]);
        left.vehicle_id
            .cmp(&right.vehicle_id)
            .then(left.date.cmp(&right.date))
            .then(left.odometer.total_cmp(&right.odometer))
    });

    let mut derived = fuel_logs.to_vec();
    let mut previous: HashMap<&VehicleId, f64> = HashMap::new();

    for index in order {
        let source = &fuel_logs[index];
        let distance = match previous.get(&source.vehicle_id) {
            Some(prior) => Some(source.odometer - prior),
            None => source.distance,
        };
        previous.insert(&source.vehicle_id, source.odometer);

        let entry = &mut derived[index];
        entry.distance = distance;
        entry.mileage = distance.map(|distance| safe_ratio(distance, source.volume));
    }

    derived
}
