//! Dashboard composition and its HTTP surface.

pub(crate) mod router;
mod service;

pub use router::{current_date, dashboard_router, USER_HEADER};
pub use service::{DashboardError, DashboardSummary, FleetDashboardService, ScopeView};
