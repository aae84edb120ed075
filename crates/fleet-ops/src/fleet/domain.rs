use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(TenantId);
string_id!(VehicleId);
string_id!(DriverId);
string_id!(UserId);

/// Row-level tenant tagging shared by every fetched entity.
pub trait TenantScoped {
    fn tenant_id(&self) -> &TenantId;
    fn record_id(&self) -> &str;
}

/// Entities carrying a business date used for range filters and ordering.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Active,
    Inactive,
    Maintenance,
}

impl VehicleStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Maintenance => "In Maintenance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Diesel,
    Petrol,
    Cng,
    Electric,
}

impl FuelType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Diesel => "Diesel",
            Self::Petrol => "Petrol",
            Self::Cng => "CNG",
            Self::Electric => "Electric",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Insurance,
    Registration,
    PollutionCertificate,
    Permit,
    Fitness,
    Other,
}

impl DocumentKind {
    /// Kinds tracked as expiry columns directly on the vehicle row.
    pub const fn vehicle_columns() -> [Self; 4] {
        [
            Self::Insurance,
            Self::Registration,
            Self::PollutionCertificate,
            Self::Permit,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Insurance => "Insurance",
            Self::Registration => "Registration",
            Self::PollutionCertificate => "Pollution Certificate",
            Self::Permit => "Permit",
            Self::Fitness => "Fitness Certificate",
            Self::Other => "Document",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Insurance => "insurance",
            Self::Registration => "registration",
            Self::PollutionCertificate => "pollution_certificate",
            Self::Permit => "permit",
            Self::Fitness => "fitness",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleDocumentDates {
    #[serde(default)]
    pub insurance_expiry: Option<NaiveDate>,
    #[serde(default)]
    pub registration_expiry: Option<NaiveDate>,
    #[serde(default)]
    pub pollution_certificate_expiry: Option<NaiveDate>,
    #[serde(default)]
    pub permit_expiry: Option<NaiveDate>,
}

impl VehicleDocumentDates {
    pub fn expiry_for(&self, kind: DocumentKind) -> Option<NaiveDate> {
        match kind {
            DocumentKind::Insurance => self.insurance_expiry,
            DocumentKind::Registration => self.registration_expiry,
            DocumentKind::PollutionCertificate => self.pollution_certificate_expiry,
            DocumentKind::Permit => self.permit_expiry,
            DocumentKind::Fitness | DocumentKind::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub tenant_id: TenantId,
    pub display_number: String,
    pub make: String,
    pub model: String,
    pub year: u16,
    pub fuel_type: FuelType,
    pub status: VehicleStatus,
    #[serde(default)]
    pub documents: VehicleDocumentDates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub tenant_id: TenantId,
    pub name: String,
    pub license_number: String,
    pub license_expiry: Option<NaiveDate>,
    pub active: bool,
}

/// Uploaded document record tracked separately from the vehicle row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDocument {
    pub id: String,
    pub tenant_id: TenantId,
    pub vehicle_id: VehicleId,
    pub kind: DocumentKind,
    pub reference_number: String,
    pub expiry: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLogEntry {
    pub id: String,
    pub tenant_id: TenantId,
    pub date: NaiveDate,
    pub vehicle_id: VehicleId,
    #[serde(default)]
    pub driver_id: Option<DriverId>,
    pub volume: f64,
    pub rate: f64,
    pub total_cost: f64,
    pub odometer: f64,
    /// Distance covered since the previous fill, when known.
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub mileage: Option<f64>,
    pub fuel_type: FuelType,
    #[serde(default)]
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceKind {
    Breakdown,
    Scheduled,
    Preventive,
}

impl MaintenanceKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::Breakdown, Self::Scheduled, Self::Preventive]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Breakdown => "Breakdown",
            Self::Scheduled => "Scheduled",
            Self::Preventive => "Preventive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartUsage {
    pub name: String,
    pub quantity: u32,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceLogEntry {
    pub id: String,
    pub tenant_id: TenantId,
    pub date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub kind: MaintenanceKind,
    pub total_cost: f64,
    pub labor_cost: f64,
    #[serde(default)]
    pub parts: Vec<PartUsage>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MaintenanceLogEntry {
    pub fn parts_cost(&self) -> f64 {
        self.parts.iter().map(|part| part.cost).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdometerReading {
    pub id: String,
    pub tenant_id: TenantId,
    pub date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub reading: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelTank {
    pub id: String,
    pub tenant_id: TenantId,
    pub name: String,
    pub fuel_type: FuelType,
    pub current_volume: f64,
    pub capacity: f64,
    pub low_threshold: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub tenant_id: TenantId,
    pub category: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub budgeted: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsidiary {
    pub id: TenantId,
    pub name: String,
    pub code: String,
    pub business_type: String,
    pub active: bool,
}

macro_rules! tenant_scoped {
    ($ty:ty, |$row:ident| $id:expr) => {
        impl TenantScoped for $ty {
            fn tenant_id(&self) -> &TenantId {
                &self.tenant_id
            }

            fn record_id(&self) -> &str {
                let $row = self;
                $id
            }
        }
    };
}

tenant_scoped!(Vehicle, |row| row.id.as_str());
tenant_scoped!(Driver, |row| row.id.as_str());
tenant_scoped!(VehicleDocument, |row| &row.id);
tenant_scoped!(FuelLogEntry, |row| &row.id);
tenant_scoped!(MaintenanceLogEntry, |row| &row.id);
tenant_scoped!(OdometerReading, |row| &row.id);
tenant_scoped!(FuelTank, |row| &row.id);
tenant_scoped!(Budget, |row| &row.id);

impl Dated for FuelLogEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for MaintenanceLogEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for OdometerReading {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Budget {
    pub fn overlaps(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
        from.map_or(true, |from| self.period_end >= from)
            && to.map_or(true, |to| self.period_start <= to)
    }
}
