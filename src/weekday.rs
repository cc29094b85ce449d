//! Day-of-week distance profile
//!
//! Groups activities into local Monday-started weeks and lines the weeks up
//! by weekday, so each weekday can be compared across weeks: per-week
//! values plus average, minimum, maximum and the current week's value.

use crate::time::{local_date, Lookback, RangeSelector, Timezone};
use crate::types::Activity;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lookback used when every activity is requested
pub const ALL_TIME_CAP_MONTHS: u32 = 24;

/// Weekday labels, Monday first
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// One weekday across all visible weeks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayRow {
    pub day: String,
    /// Km per week, aligned with [`WeekdayProfile::week_starts`]
    pub values: Vec<f64>,
    /// Mean across visible weeks, zeros included
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Km on this weekday of the current week
    pub current: f64,
}

/// Weekday comparison across weeks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayProfile {
    /// Monday of every visible week, ascending
    pub week_starts: Vec<NaiveDate>,
    /// Monday of the week containing today
    pub current_week: Option<NaiveDate>,
    pub rows: Vec<WeekdayRow>,
    /// Window actually applied
    pub lookback: Lookback,
}

impl WeekdayProfile {
    pub fn week_count(&self) -> usize {
        self.week_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.week_starts.is_empty()
    }
}

/// Window applied for `range`: "all" is capped at [`ALL_TIME_CAP_MONTHS`]
pub fn lookback_for(range: RangeSelector) -> Lookback {
    match range.months() {
        Some(months) => Lookback::Months { months },
        None => Lookback::Capped {
            months: ALL_TIME_CAP_MONTHS,
        },
    }
}

/// Monday of the week containing `day`
pub fn week_monday(day: NaiveDate) -> NaiveDate {
    day - chrono::Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Build the profile for activities on or after the same day `range` months
/// before `today`.
///
/// The current week is always included, even without activity. An empty
/// input produces an empty profile.
pub fn day_of_week_profile<'a, I>(
    activities: I,
    tz: &Timezone,
    range: RangeSelector,
    today: NaiveDate,
) -> WeekdayProfile
where
    I: IntoIterator<Item = &'a Activity>,
{
    let lookback = lookback_for(range);
    let months = match lookback {
        Lookback::Months { months } | Lookback::Capped { months } => Some(months),
        Lookback::Unbounded => None,
    };
    let cutoff = months.and_then(|m| today.checked_sub_months(Months::new(m)));

    let mut weeks: BTreeMap<NaiveDate, [f64; 7]> = BTreeMap::new();
    let mut seen_any = false;
    for activity in activities {
        seen_any = true;
        let Some(start) = activity.start else {
            continue;
        };
        let day = local_date(&start, tz);
        if cutoff.is_some_and(|c| day < c) {
            continue;
        }
        let slot = day.weekday().num_days_from_monday() as usize;
        weeks.entry(week_monday(day)).or_insert([0.0; 7])[slot] += activity.distance_km();
    }

    if !seen_any {
        return WeekdayProfile {
            week_starts: Vec::new(),
            current_week: None,
            rows: Vec::new(),
            lookback,
        };
    }

    let current_week = week_monday(today);
    weeks.entry(current_week).or_insert([0.0; 7]);

    let week_starts: Vec<NaiveDate> = weeks.keys().copied().collect();
    let rows = WEEKDAY_LABELS
        .iter()
        .enumerate()
        .map(|(slot, label)| {
            let values: Vec<f64> = weeks.values().map(|week| week[slot]).collect();
            let count = values.len() as f64;
            WeekdayRow {
                day: label.to_string(),
                average: values.iter().sum::<f64>() / count,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                current: weeks.get(&current_week).map_or(0.0, |week| week[slot]),
                values,
            }
        })
        .collect();

    WeekdayProfile {
        week_starts,
        current_week: Some(current_week),
        rows,
        lookback,
    }
}
