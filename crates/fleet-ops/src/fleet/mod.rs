//! Subsidiary-scoped fleet data: scope resolution, fetching, metrics and alerts.

pub mod alerts;
pub mod dashboard;
pub mod domain;
pub mod fetch;
pub mod import;
pub mod metrics;
pub mod tenancy;

#[cfg(test)]
mod tests;
