//! Time bucketing
//!
//! Maps instants to calendar buckets (day, ISO week, month) in an explicit
//! IANA timezone, and turns relative range selectors ("last 3 months") into
//! month-start cutoffs. No function here reads an ambient default zone; the
//! only wall-clock access is [`today`].

use crate::error::InsightsError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Zone the dashboard buckets in unless configured otherwise
pub const DEFAULT_TIMEZONE: &str = "Pacific/Auckland";

/// An IANA timezone used for every local-date computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timezone(Tz);

impl Timezone {
    pub const UTC: Timezone = Timezone(Tz::UTC);

    /// Parse an IANA zone name such as `"Pacific/Auckland"`
    pub fn parse(name: &str) -> Result<Self, InsightsError> {
        name.trim()
            .parse::<Tz>()
            .map(Timezone)
            .map_err(|_| InsightsError::InvalidTimezone(name.to_string()))
    }

    /// IANA name of the zone
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn tz(&self) -> Tz {
        self.0
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Timezone(chrono_tz::Pacific::Auckland)
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Timezone {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timezone::parse(s)
    }
}

impl Serialize for Timezone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Timezone::parse(&name).map_err(serde::de::Error::custom)
    }
}

/// Calendar date of `instant` as observed in `tz`
pub fn local_date(instant: &DateTime<Utc>, tz: &Timezone) -> NaiveDate {
    instant.with_timezone(&tz.0).date_naive()
}

/// Today's calendar date in `tz`
pub fn today(tz: &Timezone) -> NaiveDate {
    local_date(&Utc::now(), tz)
}

/// `"YYYY-MM-DD"` key of the local day containing `instant`
pub fn day_key(instant: &DateTime<Utc>, tz: &Timezone) -> String {
    format_day(local_date(instant, tz))
}

/// `"YYYY-Www"` ISO-8601 week key of the local day containing `instant`.
///
/// Uses the ISO week-numbering year, so late-December days can belong to
/// week 1 of the next year and early-January days to week 52/53 of the
/// previous one.
pub fn week_key(instant: &DateTime<Utc>, tz: &Timezone) -> String {
    let week = local_date(instant, tz).iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// `"YYYY-MM"` key of the local month containing `instant`
pub fn month_key(instant: &DateTime<Utc>, tz: &Timezone) -> String {
    local_date(instant, tz).format("%Y-%m").to_string()
}

pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `"YYYY-MM-DD"` day key
pub fn parse_day_key(key: &str) -> Result<NaiveDate, InsightsError> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d")
        .map_err(|e| InsightsError::DateParseError(format!("{key}: {e}")))
}

/// Parse a zone-qualified timestamp (RFC 3339 / ISO 8601 with offset)
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| value.parse::<DateTime<Utc>>().ok())
}

/// Parse a wall-clock timestamp and interpret it in `tz`.
///
/// Local start times are often written with a trailing `Z` even though they
/// carry no offset; the suffix is ignored. Ambiguous times (DST fall-back)
/// resolve to the earlier instant, skipped times yield `None`.
pub fn parse_local_instant(value: &str, tz: &Timezone) -> Option<DateTime<Utc>> {
    let value = value.trim().trim_end_matches('Z');
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()?;
    tz.0.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// First day of the given month
pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Monday that starts ISO week `week` of `iso_year`.
///
/// Week 1 is the week containing January 4th. Weeks past the last week of
/// the year run on into the next year, matching how the weekly summary was
/// keyed.
pub fn iso_week_start(iso_year: i32, week: u32) -> Option<NaiveDate> {
    if week == 0 || week > 53 {
        return None;
    }
    let jan4 = NaiveDate::from_ymd_opt(iso_year, 1, 4)?;
    let monday_week1 =
        jan4 - chrono::Duration::days(jan4.weekday().num_days_from_monday() as i64);
    monday_week1.checked_add_signed(chrono::Duration::days(((week - 1) * 7) as i64))
}

/// Split a weekly summary key (`"2024-05"` or `"2024-W05"`) into ISO year and week
pub fn parse_week_key(key: &str) -> Option<(i32, u32)> {
    let (year, week) = key.trim().split_once('-')?;
    let week = week.trim_start_matches(['W', 'w']);
    Some((year.parse().ok()?, week.parse().ok()?))
}

/// Relative date range offered by the insights views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangeSelector {
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "12m")]
    TwelveMonths,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl RangeSelector {
    pub const ALL_SELECTORS: [RangeSelector; 5] = [
        RangeSelector::All,
        RangeSelector::TwelveMonths,
        RangeSelector::SixMonths,
        RangeSelector::ThreeMonths,
        RangeSelector::OneMonth,
    ];

    /// Whole months covered, `None` for all time
    pub fn months(&self) -> Option<u32> {
        match self {
            RangeSelector::OneMonth => Some(1),
            RangeSelector::ThreeMonths => Some(3),
            RangeSelector::SixMonths => Some(6),
            RangeSelector::TwelveMonths => Some(12),
            RangeSelector::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeSelector::OneMonth => "1m",
            RangeSelector::ThreeMonths => "3m",
            RangeSelector::SixMonths => "6m",
            RangeSelector::TwelveMonths => "12m",
            RangeSelector::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RangeSelector::OneMonth => "Last month",
            RangeSelector::ThreeMonths => "Last 3 months",
            RangeSelector::SixMonths => "Last 6 months",
            RangeSelector::TwelveMonths => "Last 12 months",
            RangeSelector::All => "All time",
        }
    }
}

impl fmt::Display for RangeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeSelector {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(RangeSelector::OneMonth),
            "3m" => Ok(RangeSelector::ThreeMonths),
            "6m" => Ok(RangeSelector::SixMonths),
            "12m" => Ok(RangeSelector::TwelveMonths),
            "all" => Ok(RangeSelector::All),
            other => Err(InsightsError::InvalidRange(other.to_string())),
        }
    }
}

/// How far back a consumer actually looks for a given selector.
///
/// A view that bounds "all time" to a fixed window reports it as `Capped`
/// so callers can label the output accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Lookback {
    Unbounded,
    Months { months: u32 },
    Capped { months: u32 },
}

/// First day of the month `selector` whole months before `today`'s month.
///
/// Returns `None` for [`RangeSelector::All`]. Month arithmetic borrows whole
/// years: one month before January is December of the previous year.
pub fn range_cutoff(selector: RangeSelector, today: NaiveDate) -> Option<NaiveDate> {
    let months = selector.months()? as i32;
    let mut year = today.year();
    let mut month0 = today.month0() as i32 - months;
    while month0 < 0 {
        month0 += 12;
        year -= 1;
    }
    month_start(year, month0 as u32 + 1)
}

/// [`range_cutoff`] anchored at the current date in `tz`
pub fn range_cutoff_now(selector: RangeSelector, tz: &Timezone) -> Option<NaiveDate> {
    range_cutoff(selector, today(tz))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse::<DateTime<Utc>>().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_key_follows_daylight_saving() {
        let tz = Timezone::parse("Pacific/Auckland").unwrap();
        // NZDT (+13): 11:00Z is already midnight of the next day
        assert_eq!(day_key(&utc("2024-01-15T11:00:00Z"), &tz), "2024-01-16");
        // NZST (+12): 11:00Z is still 23:00 the same day
        assert_eq!(day_key(&utc("2024-07-15T11:00:00Z"), &tz), "2024-07-15");
    }

    #[test]
    fn test_day_key_monotonic() {
        let tz = Timezone::default();
        let mut instant = utc("2023-03-20T05:17:00Z");
        let mut previous = day_key(&instant, &tz);
        for _ in 0..400 {
            instant += chrono::Duration::hours(25);
            let key = day_key(&instant, &tz);
            assert!(key > previous, "{key} should sort after {previous}");
            previous = key;
        }
    }

    #[test]
    fn test_week_key_january_fourth_is_week_one() {
        let tz = Timezone::UTC;
        for year in 2015..2035 {
            let jan4 = utc(&format!("{year}-01-04T12:00:00Z"));
            assert_eq!(week_key(&jan4, &tz), format!("{year}-W01"));
            let next = jan4 + chrono::Duration::days(7);
            assert_eq!(week_key(&next, &tz), format!("{year}-W02"));
        }
    }

    #[test]
    fn test_week_key_year_rollover() {
        let tz = Timezone::UTC;
        // 2020 has 53 ISO weeks
        assert_eq!(week_key(&utc("2020-12-28T12:00:00Z"), &tz), "2020-W53");
        assert_eq!(week_key(&utc("2021-01-04T12:00:00Z"), &tz), "2021-W01");
        // 2021-01-01 is a Friday, still in 2020-W53
        assert_eq!(week_key(&utc("2021-01-01T12:00:00Z"), &tz), "2020-W53");
        // 2024-12-30 is a Monday in 2025-W01
        assert_eq!(week_key(&utc("2024-12-30T12:00:00Z"), &tz), "2025-W01");
    }

    #[test]
    fn test_month_key() {
        let tz = Timezone::default();
        assert_eq!(month_key(&utc("2024-01-31T12:00:00Z"), &tz), "2024-02");
        assert_eq!(month_key(&utc("2024-01-31T10:00:00Z"), &tz), "2024-01");
    }

    #[test]
    fn test_range_cutoff_borrows_years() {
        assert_eq!(
            range_cutoff(RangeSelector::OneMonth, date(2024, 3, 17)),
            Some(date(2024, 2, 1))
        );
        assert_eq!(
            range_cutoff(RangeSelector::OneMonth, date(2024, 1, 9)),
            Some(date(2023, 12, 1))
        );
        assert_eq!(
            range_cutoff(RangeSelector::TwelveMonths, date(2024, 1, 9)),
            Some(date(2023, 1, 1))
        );
        assert_eq!(
            range_cutoff(RangeSelector::ThreeMonths, date(2024, 2, 29)),
            Some(date(2023, 11, 1))
        );
        assert_eq!(
            range_cutoff(RangeSelector::SixMonths, date(2024, 6, 1)),
            Some(date(2023, 12, 1))
        );
        assert_eq!(range_cutoff(RangeSelector::All, date(2024, 6, 1)), None);
    }

    #[test]
    fn test_range_selector_parse() {
        assert_eq!("12m".parse::<RangeSelector>().unwrap(), RangeSelector::TwelveMonths);
        assert_eq!("all".parse::<RangeSelector>().unwrap(), RangeSelector::All);
        assert!(matches!(
            "2w".parse::<RangeSelector>(),
            Err(InsightsError::InvalidRange(_))
        ));
        for selector in RangeSelector::ALL_SELECTORS {
            assert_eq!(selector.as_str().parse::<RangeSelector>().unwrap(), selector);
        }
    }

    #[test]
    fn test_iso_week_start() {
        // 2024-01-04 is a Thursday; week 1 starts Monday 2024-01-01
        assert_eq!(iso_week_start(2024, 1), Some(date(2024, 1, 1)));
        assert_eq!(iso_week_start(2024, 10), Some(date(2024, 3, 4)));
        // 2021-01-04 is a Monday
        assert_eq!(iso_week_start(2021, 1), Some(date(2021, 1, 4)));
        // 2026-01-04 is a Sunday; week 1 starts in December
        assert_eq!(iso_week_start(2026, 1), Some(date(2025, 12, 29)));
        assert_eq!(iso_week_start(2024, 0), None);
        assert_eq!(iso_week_start(2024, 54), None);
    }

    #[test]
    fn test_parse_week_key() {
        assert_eq!(parse_week_key("2024-05"), Some((2024, 5)));
        assert_eq!(parse_week_key("2024-W17"), Some((2024, 17)));
        assert_eq!(parse_week_key("garbage"), None);
        assert_eq!(parse_week_key("2024-xx"), None);
    }

    #[test]
    fn test_parse_local_instant_uses_zone() {
        let tz = Timezone::default();
        let instant = parse_local_instant("2024-01-16T06:30:00Z", &tz).unwrap();
        assert_eq!(instant, utc("2024-01-15T17:30:00Z"));
        assert_eq!(day_key(&instant, &tz), "2024-01-16");
    }

    #[test]
    fn test_timezone_rejects_unknown_zone() {
        assert!(matches!(
            Timezone::parse("Mars/Olympus"),
            Err(InsightsError::InvalidTimezone(_))
        ));
        assert_eq!(Timezone::parse("UTC").unwrap(), Timezone::UTC);
    }
}
