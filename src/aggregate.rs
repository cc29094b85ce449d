//! Daily, monthly and weekly distance aggregation
//!
//! Daily and monthly buckets are derived from activity start instants in
//! the configured zone. Weekly rows come from the pre-aggregated summary
//! mapping; each key is resolved to the Monday that starts its ISO week.

use crate::schema::WeeklyTotals;
use crate::time::{iso_week_start, local_date, month_start, parse_week_key, Timezone};
use crate::types::Activity;
use chrono::{Datelike, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One month of distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRow {
    /// `"YYYY-MM"`
    pub month: String,
    /// First day of the month
    pub start: NaiveDate,
    /// Rounded to 0.1 km
    pub distance_km: f64,
}

/// One week of the pre-aggregated summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRow {
    /// Key as it appears in the summary
    pub week_key: String,
    /// Monday of the ISO week
    pub start: NaiveDate,
    pub distance_km: f64,
    pub count: u32,
}

/// Kilometers per local calendar day. Activities without a start are skipped.
pub fn daily_distance<'a, I>(activities: I, tz: &Timezone) -> BTreeMap<NaiveDate, f64>
where
    I: IntoIterator<Item = &'a Activity>,
{
    let mut daily = BTreeMap::new();
    for activity in activities {
        if let Some(start) = activity.start {
            *daily.entry(local_date(&start, tz)).or_insert(0.0) += activity.distance_km();
        }
    }
    daily
}

/// Distance per local month, ascending.
///
/// Months starting before `cutoff` are dropped; `None` keeps everything.
pub fn monthly_distance<'a, I>(
    activities: I,
    tz: &Timezone,
    cutoff: Option<NaiveDate>,
) -> Vec<MonthlyRow>
where
    I: IntoIterator<Item = &'a Activity>,
{
    let mut months: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for activity in activities {
        let Some(start) = activity.start else {
            continue;
        };
        let day = local_date(&start, tz);
        if let Some(first) = month_start(day.year(), day.month()) {
            *months.entry(first).or_insert(0.0) += activity.distance_km();
        }
    }

    months
        .into_iter()
        .filter(|(start, _)| cutoff.map_or(true, |c| *start >= c))
        .map(|(start, km)| MonthlyRow {
            month: format!("{:04}-{:02}", start.year(), start.month()),
            start,
            distance_km: round_tenth(km),
        })
        .collect()
}

/// Weekly summary rows sorted by week start.
///
/// Keys that do not name a valid ISO week are skipped.
pub fn weekly_mileage(
    weekly: &BTreeMap<String, WeeklyTotals>,
    cutoff: Option<NaiveDate>,
) -> Vec<WeeklyRow> {
    let mut rows: Vec<WeeklyRow> = weekly
        .iter()
        .filter_map(|(key, totals)| {
            let start = parse_week_key(key).and_then(|(year, week)| iso_week_start(year, week));
            if start.is_none() {
                warn!("skipping malformed weekly key {key:?}");
            }
            Some(WeeklyRow {
                week_key: key.clone(),
                start: start?,
                distance_km: totals.distance_m / 1000.0,
                count: totals.count,
            })
        })
        .filter(|row| cutoff.map_or(true, |c| row.start >= c))
        .collect();
    rows.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.week_key.cmp(&b.week_key)));
    rows
}

fn round_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}
