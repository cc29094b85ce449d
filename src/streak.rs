//! Consecutive-day streak detection
//!
//! Works on the set of local calendar days with at least one qualifying
//! activity. The current streak is the run of days ending today; the
//! longest streak is the globally longest run in the set.

use crate::time::{local_date, Timezone};
use crate::types::Activity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Activity type counted by default
pub const DEFAULT_STREAK_TYPE: &str = "Run";

/// A maximal run of consecutive qualifying days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length: u32,
}

/// Current and longest streak for a day set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Consecutive days ending today, 0 when today has no activity
    pub current: u32,
    /// The day the current streak was measured from
    pub current_ends_on: NaiveDate,
    pub longest: u32,
    pub longest_start: Option<NaiveDate>,
    pub longest_end: Option<NaiveDate>,
}

/// Local days on which an activity of `activity_type` started.
///
/// `None` counts every type. Activities without a start are skipped.
pub fn qualifying_days<'a, I>(
    activities: I,
    activity_type: Option<&str>,
    tz: &Timezone,
) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = &'a Activity>,
{
    activities
        .into_iter()
        .filter(|a| activity_type.map_or(true, |t| a.activity_type.as_deref() == Some(t)))
        .filter_map(|a| a.start.as_ref().map(|s| local_date(s, tz)))
        .collect()
}

/// Number of consecutive days in `days` ending on `today`
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

/// Longest run of consecutive days. The earliest window wins ties.
pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> Option<StreakWindow> {
    let mut best: Option<StreakWindow> = None;
    let mut current: Option<StreakWindow> = None;

    for &day in days {
        current = match current {
            Some(window) if window.end.succ_opt() == Some(day) => Some(StreakWindow {
                end: day,
                length: window.length + 1,
                ..window
            }),
            _ => Some(StreakWindow {
                start: day,
                end: day,
                length: 1,
            }),
        };
        if let Some(window) = current {
            if best.map_or(true, |b| window.length > b.length) {
                best = Some(window);
            }
        }
    }
    best
}

/// Streak detector bound to a zone and a qualifying type
#[derive(Debug, Clone)]
pub struct StreakDetector {
    tz: Timezone,
    activity_type: Option<String>,
}

impl Default for StreakDetector {
    fn default() -> Self {
        Self::new(Timezone::default())
    }
}

impl StreakDetector {
    /// Count runs in `tz`
    pub fn new(tz: Timezone) -> Self {
        Self {
            tz,
            activity_type: Some(DEFAULT_STREAK_TYPE.to_string()),
        }
    }

    /// Change the qualifying type; `None` counts every activity
    pub fn with_activity_type(mut self, activity_type: Option<String>) -> Self {
        self.activity_type = activity_type;
        self
    }

    pub fn summarize<'a, I>(&self, activities: I, today: NaiveDate) -> StreakSummary
    where
        I: IntoIterator<Item = &'a Activity>,
    {
        let days = qualifying_days(activities, self.activity_type.as_deref(), &self.tz);
        let longest = longest_streak(&days);
        StreakSummary {
            current: current_streak(&days, today),
            current_ends_on: today,
            longest: longest.map_or(0, |w| w.length),
            longest_start: longest.map(|w| w.start),
            longest_end: longest.map(|w| w.end),
        }
    }
}
