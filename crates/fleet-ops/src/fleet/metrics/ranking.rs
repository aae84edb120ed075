use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDirection {
    Ascending,
    Descending,
}

/// Stable sort of `items` by `metric`.
///
/// Equal metrics are ordered by `id` ascending regardless of direction, so a ranking never
/// depends on the order rows came back from the backend. Non-finite metrics sort through
/// `f64::total_cmp`.
pub fn rank_by<T, M, K, I>(items: &mut [T], metric: M, direction: RankDirection, id: I)
where
    M: Fn(&T) -> f64,
    I: Fn(&T) -> &K,
    K: Ord + ?Sized,
{
    items.sort_by(|left, right| {
        let by_metric = metric(left).total_cmp(&metric(right));
        let by_metric = match direction {
            RankDirection::Ascending => by_metric,
            RankDirection::Descending => by_metric.reverse(),
        };
        match by_metric {
            Ordering::Equal => id(left).cmp(id(right)),
            other => other,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row {
        id: &'static str,
        value: f64,
    }

    fn ids(rows: &[Row]) -> Vec<&'static str> {
        rows.iter().map(|row| row.id).collect()
    }

    #[test]
    fn descending_breaks_ties_by_id() {
        let mut rows = vec![
            Row { id: "v3", value: 12.5 },
            Row { id: "v1", value: 9.0 },
            Row { id: "v2", value: 12.5 },
        ];

        rank_by(&mut rows, |row| row.value, RankDirection::Descending, |row| row.id);

        assert_eq!(ids(&rows), ["v2", "v3", "v1"]);
    }

    #[test]
    fn ascending_keeps_id_tie_break_ascending() {
        let mut rows = vec![
            Row { id: "b", value: 1.0 },
            Row { id: "a", value: 1.0 },
            Row { id: "c", value: 0.5 },
        ];

        rank_by(&mut rows, |row| row.value, RankDirection::Ascending, |row| row.id);

        assert_eq!(ids(&rows), ["c", "a", "b"]);
    }
}
