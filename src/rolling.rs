//! Rolling-window distance aggregator
//!
//! Daily kilometers are laid out on a gap-free calendar from the first to
//! the last active local day, then summed over a trailing window that holds
//! the current day plus the `window_days - 1` days before it.

use crate::aggregate::daily_distance;
use crate::time::{format_day, Timezone};
use crate::types::Activity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default trailing window in days
pub const DEFAULT_ROLLING_WINDOW: usize = 7;

/// One day of the rolling series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    /// Local calendar day, `"YYYY-MM-DD"`
    pub day: String,
    /// Sum of the window ending on `day`, in km
    pub rolling_km: f64,
}

/// Trailing 7-day distance series
pub fn rolling_7<'a, I>(activities: I, tz: &Timezone) -> Vec<RollingPoint>
where
    I: IntoIterator<Item = &'a Activity>,
{
    rolling_sum(activities, tz, DEFAULT_ROLLING_WINDOW)
}

/// Trailing `window_days` distance series.
///
/// Emits exactly one point per calendar day between the first and last
/// active day inclusive; days without activity contribute 0. A window of 0
/// is treated as 1.
pub fn rolling_sum<'a, I>(activities: I, tz: &Timezone, window_days: usize) -> Vec<RollingPoint>
where
    I: IntoIterator<Item = &'a Activity>,
{
    let daily = daily_distance(activities, tz);
    let (Some(first), Some(last)) = (
        daily.keys().next().copied(),
        daily.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let window = RollingWindow::new(window_days);
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .scan(window, |window, day| {
            let km = daily.get(&day).copied().unwrap_or(0.0);
            Some(point(day, window.push(km)))
        })
        .collect()
}

fn point(day: NaiveDate, rolling_km: f64) -> RollingPoint {
    RollingPoint {
        day: format_day(day),
        rolling_km,
    }
}

/// Fixed-size trailing sum
#[derive(Debug, Clone)]
struct RollingWindow {
    values: VecDeque<f64>,
    size: usize,
    sum: f64,
}

impl RollingWindow {
    fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            values: VecDeque::with_capacity(size + 1),
            size,
            sum: 0.0,
        }
    }

    /// Add today's value and return the sum of the window
    fn push(&mut self, value: f64) -> f64 {
        self.values.push_back(value);
        self.sum += value;
        while self.values.len() > self.size {
            if let Some(oldest) = self.values.pop_front() {
                self.sum -= oldest;
            }
        }
        self.sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn run(start: &str, km: f64) -> Activity {
        Activity {
            start: Some(start.parse::<DateTime<Utc>>().unwrap()),
            distance_m: km * 1000.0,
            ..Activity::new()
        }
    }

    #[test]
    fn test_window_covers_today_and_six_before() {
        // 1 km on day 1, 5 km on day 8, nothing between
        let activities = vec![
            run("2024-03-01T00:00:00Z", 1.0),
            run("2024-03-08T00:00:00Z", 5.0),
        ];
        let series = rolling_7(&activities, &Timezone::UTC);
        let sums: Vec<f64> = series.iter().map(|p| p.rolling_km).collect();
        assert_eq!(sums, vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 5.0]);
        assert_eq!(series[0].day, "2024-03-01");
        assert_eq!(series[7].day, "2024-03-08");
    }

    #[test]
    fn test_series_has_no_gaps() {
        let activities = vec![
            run("2024-02-27T06:00:00Z", 3.0),
            run("2024-03-02T06:00:00Z", 4.0),
        ];
        let series = rolling_7(&activities, &Timezone::UTC);
        let days: Vec<&str> = series.iter().map(|p| p.day.as_str()).collect();
        // 2024 is a leap year
        assert_eq!(
            days,
            vec!["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01", "2024-03-02"]
        );
        assert_eq!(series[4].rolling_km, 7.0);
    }

    #[test]
    fn test_same_day_activities_are_summed() {
        let activities = vec![
            run("2024-05-01T06:00:00Z", 2.5),
            run("2024-05-01T18:00:00Z", 2.5),
        ];
        let series = rolling_7(&activities, &Timezone::UTC);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].rolling_km, 5.0);
    }

    #[test]
    fn test_days_are_local() {
        let tz = Timezone::parse("Pacific/Auckland").unwrap();
        // 2024-01-15T11:30Z is 00:30 on the 16th in Auckland
        let activities = vec![run("2024-01-15T11:30:00Z", 10.0)];
        let series = rolling_7(&activities, &tz);
        assert_eq!(series[0].day, "2024-01-16");
    }

    #[test]
    fn test_custom_window() {
        let activities = vec![
            run("2024-03-01T00:00:00Z", 1.0),
            run("2024-03-02T00:00:00Z", 2.0),
            run("2024-03-03T00:00:00Z", 4.0),
        ];
        let sums: Vec<f64> = rolling_sum(&activities, &Timezone::UTC, 2)
            .iter()
            .map(|p| p.rolling_km)
            .collect();
        assert_eq!(sums, vec![1.0, 3.0, 6.0]);
    }

    #[test]
    fn test_empty_input() {
        let activities: Vec<Activity> = Vec::new();
        assert!(rolling_7(&activities, &Timezone::UTC).is_empty());
        // activities without a start never produce a day
        let undated = vec![Activity {
            distance_m: 5000.0,
            ..Activity::new()
        }];
        assert!(rolling_7(&undated, &Timezone::UTC).is_empty());
    }
}
