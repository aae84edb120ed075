use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub month: MonthKey,
    pub label: String,
    pub total: f64,
    pub records: usize,
}

/// Sum `cost` per calendar month of `date`, ascending, months without records omitted.
pub fn monthly_buckets<T, D, C>(records: &[T], date: D, cost: C) -> Vec<MonthlyBucket>
where
    D: Fn(&T) -> NaiveDate,
    C: Fn(&T) -> f64,
{
    let mut totals: BTreeMap<MonthKey, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(MonthKey::of(date(record))).or_default();
        entry.0 += cost(record);
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(month, (total, records))| MonthlyBucket {
            month,
            label: month.to_string(),
            total,
            records,
        })
        .collect()
}

/// Densify a sparse series with zero buckets for every month in `from..=to`.
///
/// Buckets outside the window are dropped.
pub fn pad_months(buckets: &[MonthlyBucket], from: NaiveDate, to: NaiveDate) -> Vec<MonthlyBucket> {
    let (start, end) = (MonthKey::of(from), MonthKey::of(to));
    let mut padded = Vec::new();
    let mut month = start;

    while month <= end {
        let bucket = buckets
            .iter()
            .find(|bucket| bucket.month == month)
            .cloned()
            .unwrap_or_else(|| MonthlyBucket {
                month,
                label: month.to_string(),
                total: 0.0,
                records: 0,
            });
        padded.push(bucket);
        month = month.next();
    }

    padded
}
