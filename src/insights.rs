//! Tabular insight views: shoe totals, activity list and summary tiles

use crate::format::{fmt_date, km_one_decimal};
use crate::schema::{ShoeTotals, StatsSummary};
use crate::time::parse_instant;
use crate::types::Activity;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Placeholder for an activity without a name
pub const UNTITLED: &str = "(untitled)";
/// Placeholder for a missing cell
pub const EMPTY_CELL: &str = "-";

/// One shoe in the totals table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoeRow {
    pub shoe: String,
    /// Km with one decimal
    pub km: String,
    pub runs: u32,
    /// `"YYYY-MM-DD"`, or `"-"` when never recorded
    pub last_used: String,
}

/// Shoe totals, most recently used first; undated shoes keep their order at the end
pub fn shoe_table(by_shoe: &BTreeMap<String, ShoeTotals>) -> Vec<ShoeRow> {
    let mut entries: Vec<(&String, &ShoeTotals)> = by_shoe.iter().collect();
    entries.sort_by(|(_, a), (_, b)| {
        let a = a.last_date.as_deref().and_then(parse_instant);
        let b = b.last_date.as_deref().and_then(parse_instant);
        match (a, b) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });

    entries
        .into_iter()
        .map(|(shoe, totals)| ShoeRow {
            shoe: shoe.clone(),
            km: km_one_decimal(totals.distance_m),
            runs: totals.count,
            last_used: match totals.last_date.as_deref() {
                Some(date) => fmt_date(Some(date)),
                None => EMPTY_CELL.to_string(),
            },
        })
        .collect()
}

/// One row of the activities table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub id: Option<String>,
    /// UTC calendar date of the start, empty when unknown
    pub date: String,
    pub name: String,
    pub activity_type: String,
    pub km: String,
    pub shoe: String,
}

/// Activities newest first by start instant; undated activities last
pub fn activities_table<'a, I>(activities: I) -> Vec<ActivityRow>
where
    I: IntoIterator<Item = &'a Activity>,
{
    let mut dated: Vec<&Activity> = activities.into_iter().collect();
    dated.sort_by(|a, b| b.start.cmp(&a.start));
    dated
        .into_iter()
        .map(|a| ActivityRow {
            id: a.id.clone(),
            date: a
                .start
                .map(|s| s.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            name: a.name.clone().unwrap_or_else(|| UNTITLED.to_string()),
            activity_type: a
                .activity_type
                .clone()
                .unwrap_or_else(|| EMPTY_CELL.to_string()),
            km: km_one_decimal(a.distance_m),
            shoe: a.shoe.clone().unwrap_or_else(|| EMPTY_CELL.to_string()),
        })
        .collect()
}

/// Headline figures from the stats summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTiles {
    /// Year-to-date distance, whole km
    pub ytd_km: String,
    pub ytd_runs: u32,
    pub timezone: String,
    /// Date the summary was generated
    pub generated: String,
}

pub fn summary_tiles(stats: &StatsSummary) -> SummaryTiles {
    SummaryTiles {
        ytd_km: format!("{:.0}", stats.ytd.distance_m / 1000.0),
        ytd_runs: stats.ytd.count,
        timezone: stats.timezone.clone().unwrap_or_default(),
        generated: fmt_date(stats.generated_at.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Totals;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn shoe(distance_m: f64, count: u32, last: Option<&str>) -> ShoeTotals {
        ShoeTotals {
            distance_m,
            count,
            last_date: last.map(str::to_string),
        }
    }

    #[test]
    fn test_shoe_table_most_recent_first() {
        let mut by_shoe = BTreeMap::new();
        by_shoe.insert("Alpha".to_string(), shoe(100_000.0, 10, None));
        by_shoe.insert("Bravo".to_string(), shoe(250_440.0, 25, Some("2024-01-10T06:00:00Z")));
        by_shoe.insert("Charlie".to_string(), shoe(5_000.0, 1, Some("2024-03-01T06:00:00Z")));

        let rows = shoe_table(&by_shoe);
        let order: Vec<&str> = rows.iter().map(|r| r.shoe.as_str()).collect();
        assert_eq!(order, vec!["Charlie", "Bravo", "Alpha"]);
        assert_eq!(rows[1].km, "250.4");
        assert_eq!(rows[1].last_used, "2024-01-10");
        assert_eq!(rows[2].last_used, "-");
    }

    #[test]
    fn test_activities_table_newest_first_with_placeholders() {
        let activities = vec![
            Activity {
                id: Some("1".to_string()),
                name: Some("Tempo".to_string()),
                start: Some("2024-01-01T06:00:00Z".parse::<DateTime<Utc>>().unwrap()),
                activity_type: Some("Run".to_string()),
                distance_m: 8_060.0,
                shoe: Some("Pegasus".to_string()),
                ..Activity::new()
            },
            Activity {
                id: Some("2".to_string()),
                start: Some("2024-02-01T06:00:00Z".parse::<DateTime<Utc>>().unwrap()),
                distance_m: 3_000.0,
                ..Activity::new()
            },
        ];
        let rows = activities_table(&activities);
        assert_eq!(
            rows[0],
            ActivityRow {
                id: Some("2".to_string()),
                date: "2024-02-01".to_string(),
                name: UNTITLED.to_string(),
                activity_type: EMPTY_CELL.to_string(),
                km: "3.0".to_string(),
                shoe: EMPTY_CELL.to_string(),
            }
        );
        assert_eq!(rows[1].name, "Tempo");
        assert_eq!(rows[1].km, "8.1");
    }

    #[test]
    fn test_activities_table_orders_same_day_by_time() {
        let at = |id: &str, start: Option<&str>| Activity {
            id: Some(id.to_string()),
            start: start.map(|s| s.parse::<DateTime<Utc>>().unwrap()),
            ..Activity::new()
        };
        let activities = vec![
            at("morning", Some("2024-03-05T06:00:00Z")),
            at("undated", None),
            at("evening", Some("2024-03-05T18:00:00Z")),
            at("earlier", Some("2024-03-04T12:00:00Z")),
        ];
        let ids: Vec<String> = activities_table(&activities)
            .into_iter()
            .filter_map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["evening", "morning", "earlier", "undated"]);
    }

    #[test]
    fn test_summary_tiles() {
        let stats = StatsSummary {
            ytd: Totals {
                distance_m: 812_645.0,
                count: 97,
            },
            timezone: Some("Pacific/Auckland".to_string()),
            generated_at: Some("2024-02-11T01:02:03Z".to_string()),
            ..Default::default()
        };
        let tiles = summary_tiles(&stats);
        assert_eq!(tiles.ytd_km, "813");
        assert_eq!(tiles.ytd_runs, 97);
        assert_eq!(tiles.timezone, "Pacific/Auckland");
        assert_eq!(tiles.generated, "2024-02-11");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(shoe_table(&BTreeMap::new()).is_empty());
        let none: Vec<Activity> = Vec::new();
        assert!(activities_table(&none).is_empty());
    }
}
