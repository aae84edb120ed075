//! Fuel log CSV import for subsidiaries migrating spreadsheet records.

use crate::fleet::domain::{DriverId, FuelLogEntry, FuelType, TenantId, VehicleId};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read fuel log export {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid fuel log CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: '{value}' is not a date (expected YYYY-MM-DD)")]
    InvalidDate { row: usize, value: String },
    #[error("row {row}: {field} '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("row {row}: {field} must not be negative")]
    NegativeAmount { row: usize, field: &'static str },
    #[error("row {row}: unknown fuel type '{value}'")]
    UnknownFuelType { row: usize, value: String },
    #[error("row {row}: missing vehicle_id")]
    MissingVehicle { row: usize },
}

/// Parses fuel log exports into rows owned by one subsidiary.
#[derive(Debug, Clone)]
pub struct FuelLogImporter {
    tenant_id: TenantId,
}

impl FuelLogImporter {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn import_path(&self, path: impl AsRef<Path>) -> Result<Vec<FuelLogEntry>, ImportError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = self.import_reader(file)?;
        info!(
            path = %path.display(),
            tenant = %self.tenant_id,
            rows = entries.len(),
            "imported fuel log export"
        );
        Ok(entries)
    }

    /// Columns: `date, vehicle_id, volume, rate, odometer, fuel_type` plus optional `id`,
    /// `driver_id`, `total_cost` and `vendor`. A blank `total_cost` is `volume * rate`.
    pub fn import_reader<R: Read>(&self, reader: R) -> Result<Vec<FuelLogEntry>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = Vec::new();

        for (index, record) in csv_reader.deserialize::<FuelLogRow>().enumerate() {
            let row = index + 1;
            entries.push(self.entry_from(row, record?)?);
        }

        Ok(entries)
    }

    fn entry_from(&self, row: usize, raw: FuelLogRow) -> Result<FuelLogEntry, ImportError> {
        let vehicle_id = raw
            .vehicle_id
            .ok_or(ImportError::MissingVehicle { row })?;
        let date = parse_date(&raw.date).ok_or_else(|| ImportError::InvalidDate {
            row,
            value: raw.date.clone(),
        })?;
        let volume = parse_amount(row, "volume", &raw.volume)?;
        let rate = parse_amount(row, "rate", &raw.rate)?;
        let odometer = parse_amount(row, "odometer", &raw.odometer)?;
        let total_cost = match raw.total_cost.as_deref() {
            Some(value) => parse_amount(row, "total_cost", value)?,
            None => volume * rate,
        };
        let fuel_type = parse_fuel_type(&raw.fuel_type).ok_or_else(|| {
            ImportError::UnknownFuelType {
                row,
                value: raw.fuel_type.clone(),
            }
        })?;

        Ok(FuelLogEntry {
            id: raw
                .id
                .unwrap_or_else(|| format!("{}-fuel-{row:05}", self.tenant_id)),
            tenant_id: self.tenant_id.clone(),
            date,
            vehicle_id: VehicleId::new(vehicle_id),
            driver_id: raw.driver_id.map(DriverId::new),
            volume,
            rate,
            total_cost,
            odometer,
            distance: None,
            mileage: None,
            fuel_type,
            vendor: raw.vendor,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FuelLogRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    date: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    vehicle_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    driver_id: Option<String>,
    volume: String,
    rate: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    total_cost: Option<String>,
    odometer: String,
    fuel_type: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    vendor: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

fn parse_amount(row: usize, field: &'static str, value: &str) -> Result<f64, ImportError> {
    let cleaned: String = value.chars().filter(|c| *c != ',').collect();
    let amount = cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| ImportError::InvalidNumber {
            row,
            field,
            value: value.to_string(),
        })?;

    if amount < 0.0 {
        return Err(ImportError::NegativeAmount { row, field });
    }
    Ok(amount)
}

fn parse_fuel_type(value: &str) -> Option<FuelType> {
    match value.trim().to_ascii_lowercase().as_str() {
        "diesel" => Some(FuelType::Diesel),
        "petrol" | "gasoline" => Some(FuelType::Petrol),
        "cng" => Some(FuelType::Cng),
        "electric" | "ev" => Some(FuelType::Electric),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
id,date,vehicle_id,driver_id,volume,rate,total_cost,odometer,fuel_type,vendor
,2026-02-01,v1,d1,40,95.5,,12000,Diesel,Highway Fuels
f-2,2026-02-09,v1,,\"1,020\",95.5,3820,12410,diesel,
";

    #[test]
    fn parses_export_and_fills_defaults() {
        let importer = FuelLogImporter::new(TenantId::new("north"));
        let entries = importer
            .import_reader(EXPORT.as_bytes())
            .expect("export parses");

        assert_eq!(entries.len(), 2);
        let first = &entries[0];
        assert_eq!(first.id, "north-fuel-00001");
        assert_eq!(first.tenant_id, TenantId::new("north"));
        assert_eq!(first.total_cost, 40.0 * 95.5);
        assert_eq!(first.driver_id, Some(DriverId::new("d1")));
        assert_eq!(first.vendor.as_deref(), Some("Highway Fuels"));

        let second = &entries[1];
        assert_eq!(second.id, "f-2");
        assert_eq!(second.volume, 1020.0);
        assert_eq!(second.total_cost, 3820.0);
        assert_eq!(second.driver_id, None);
        assert_eq!(second.vendor, None);
    }

    #[test]
    fn reports_row_of_bad_date() {
        let export = "date,vehicle_id,volume,rate,odometer,fuel_type\n\
                      2026-02-01,v1,10,90,100,diesel\n\
                      01/02/2026,v1,10,90,200,diesel\n";
        let err = FuelLogImporter::new(TenantId::new("north"))
            .import_reader(export.as_bytes())
            .expect_err("second row has a bad date");

        assert!(matches!(err, ImportError::InvalidDate { row: 2, .. }));
    }

    #[test]
    fn rejects_unknown_fuel_type_and_negative_volume() {
        let importer = FuelLogImporter::new(TenantId::new("north"));

        let unknown = "date,vehicle_id,volume,rate,odometer,fuel_type\n2026-02-01,v1,10,90,100,kerosene\n";
        assert!(matches!(
            importer.import_reader(unknown.as_bytes()),
            Err(ImportError::UnknownFuelType { row: 1, .. })
        ));

        let negative = "date,vehicle_id,volume,rate,odometer,fuel_type\n2026-02-01,v1,-4,90,100,cng\n";
        assert!(matches!(
            importer.import_reader(negative.as_bytes()),
            Err(ImportError::NegativeAmount {
                row: 1,
                field: "volume"
            })
        ));
    }
}
