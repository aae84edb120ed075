//! Pure reductions from fetched rows to display metrics.

mod buckets;
mod distance;
mod efficiency;
mod ranking;
mod report;
mod score;

pub use buckets::{monthly_buckets, pad_months, MonthKey, MonthlyBucket};
pub use distance::{distance_by_vehicle, total_distance};
pub use efficiency::{average_mileage, cost_per_distance, derive_fill_mileage, safe_ratio};
pub use ranking::{rank_by, RankDirection};
pub use report::{
    BudgetUtilization, DriverMetrics, FleetMetrics, FleetTotals, MaintenanceKindTotal,
    VehicleMetrics, VendorMetrics,
};
pub use score::{performance_score, SCORE_CEILING};
