use chrono::NaiveDate;

pub const SCORE_CEILING: u32 = 100;
const POINTS_PER_TRANSACTION: u32 = 10;
const RECENCY_WINDOW_DAYS: i64 = 30;

/// `min(100, count * 10 + max(0, 30 - days_since_last))`.
///
/// No transactions scores 0. A last transaction dated after `today` counts as same-day.
pub fn performance_score(count: usize, last: Option<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(last) = last else {
        return 0;
    };

    let days_since = (today - last).num_days().max(0);
    let recency = (RECENCY_WINDOW_DAYS - days_since).max(0) as u32;
    let volume = u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(POINTS_PER_TRANSACTION);

    volume.saturating_add(recency).min(SCORE_CEILING)
}
