use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Coarse capability tier a user holds on a subsidiary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    FullAccess,
    OperationalAccess,
    ReadOnlyAccess,
    FuelOnlyAccess,
    MaintenanceOnlyAccess,
}

impl PermissionLevel {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::FullAccess,
            Self::OperationalAccess,
            Self::ReadOnlyAccess,
            Self::FuelOnlyAccess,
            Self::MaintenanceOnlyAccess,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FullAccess => "Full Access",
            Self::OperationalAccess => "Operational Access",
            Self::ReadOnlyAccess => "Read Only",
            Self::FuelOnlyAccess => "Fuel Only",
            Self::MaintenanceOnlyAccess => "Maintenance Only",
        }
    }

    pub const fn can_write(self) -> bool {
        !matches!(self, Self::ReadOnlyAccess)
    }
}

/// Functional areas of the dashboard gated by permission level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Dashboard,
    Alerts,
    Vehicles,
    Drivers,
    Documents,
    Fuel,
    Maintenance,
    Parts,
    Vendors,
    Budgets,
    Reports,
    Settings,
    Users,
}

impl Module {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Alerts => "alerts",
            Self::Vehicles => "vehicles",
            Self::Drivers => "drivers",
            Self::Documents => "documents",
            Self::Fuel => "fuel",
            Self::Maintenance => "maintenance",
            Self::Parts => "parts",
            Self::Vendors => "vendors",
            Self::Budgets => "budgets",
            Self::Reports => "reports",
            Self::Settings => "settings",
            Self::Users => "users",
        }
    }

    /// Permission levels that may open this module.
    pub fn permitted_levels(self) -> &'static [PermissionLevel] {
        MODULE_ACCESS
            .iter()
            .find(|(module, _)| *module == self)
            .map(|(_, levels)| *levels)
            .unwrap_or(&[])
    }
}

impl FromStr for Module {
    type Err = UnknownModule;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        MODULE_ACCESS
            .iter()
            .map(|(module, _)| *module)
            .find(|module| module.key().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownModule(value.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown module '{0}'")]
pub struct UnknownModule(pub String);

use PermissionLevel::{
    FullAccess, FuelOnlyAccess, MaintenanceOnlyAccess, OperationalAccess, ReadOnlyAccess,
};

const EVERY_LEVEL: &[PermissionLevel] = &[
    FullAccess,
    OperationalAccess,
    ReadOnlyAccess,
    FuelOnlyAccess,
    MaintenanceOnlyAccess,
];

/// Module gating policy. Every module the dashboard exposes has exactly one row.
pub const MODULE_ACCESS: &[(Module, &[PermissionLevel])] = &[
    (Module::Dashboard, EVERY_LEVEL),
    (Module::Alerts, EVERY_LEVEL),
    (
        Module::Vehicles,
        &[FullAccess, OperationalAccess, ReadOnlyAccess],
    ),
    (
        Module::Drivers,
        &[FullAccess, OperationalAccess, ReadOnlyAccess],
    ),
    (
        Module::Documents,
        &[FullAccess, OperationalAccess, ReadOnlyAccess],
    ),
    (Module::Fuel, &[FullAccess, OperationalAccess, FuelOnlyAccess]),
    (
        Module::Maintenance,
        &[FullAccess, OperationalAccess, MaintenanceOnlyAccess],
    ),
    (
        Module::Parts,
        &[FullAccess, OperationalAccess, MaintenanceOnlyAccess],
    ),
    (
        Module::Vendors,
        &[FullAccess, OperationalAccess, MaintenanceOnlyAccess],
    ),
    (Module::Budgets, &[FullAccess, OperationalAccess]),
    (
        Module::Reports,
        &[FullAccess, OperationalAccess, ReadOnlyAccess],
    ),
    (Module::Settings, &[FullAccess]),
    (Module::Users, &[FullAccess]),
];

/// Outcome of a module gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleAccess {
    Denied,
    ReadOnly,
    ReadWrite,
}

impl ModuleAccess {
    pub const fn allows_read(self) -> bool {
        !matches!(self, Self::Denied)
    }

    pub const fn allows_write(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// Pure lookup of one level against the module table.
pub fn level_grants(level: PermissionLevel, module: Module) -> bool {
    module.permitted_levels().contains(&level)
}

/// Access a single level yields on a module when a concrete tenant is targeted.
pub fn access_for_level(level: PermissionLevel, module: Module) -> ModuleAccess {
    if !level_grants(level, module) {
        ModuleAccess::Denied
    } else if level.can_write() {
        ModuleAccess::ReadWrite
    } else {
        ModuleAccess::ReadOnly
    }
}
