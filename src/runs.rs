//! Recent runs list
//!
//! A paged, filterable view over the run index (newest first). Each run is
//! classified from its pace and duration; only runs with a map can be
//! selected for highlighting.

use crate::filter::{Selection, ALL_LABEL};
use crate::format::{format_duration, format_elevation, format_pace, meters_to_km};
use crate::schema::RunIndexEntry;
use crate::time::parse_instant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Runs kept from the index
pub const DEFAULT_RUN_CAP: usize = 300;
/// Runs revealed per page
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Duration at or above which a run counts as long (1h10m)
pub const LONG_RUN_SECONDS: f64 = 70.0 * 60.0;
/// Pace below which a run counts as a workout (4:00/km)
pub const WORKOUT_PACE_S_PER_KM: f64 = 240.0;
/// Label for runs without shoe or gear
pub const NO_SHOE: &str = "(no shoe)";

/// Display kind of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Workout,
    Long,
    Jog,
}

/// Kind dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindFilter {
    #[default]
    All,
    Workout,
    Long,
    Jog,
}

impl KindFilter {
    pub fn accepts(&self, traits: &RunTraits) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Workout => traits.workout,
            KindFilter::Long => traits.long,
            KindFilter::Jog => !traits.workout && !traits.long,
        }
    }
}

/// Derived attributes of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunTraits {
    pub duration_s: f64,
    pub pace_s_per_km: Option<f64>,
    pub workout: bool,
    pub long: bool,
    pub shoe_label: String,
}

impl RunTraits {
    pub fn of(entry: &RunIndexEntry) -> Self {
        let duration_s = entry.moving_time.or(entry.elapsed_time).unwrap_or(0.0);
        let pace_s_per_km = pace(entry);
        Self {
            duration_s,
            pace_s_per_km,
            workout: pace_s_per_km.is_some_and(|p| p < WORKOUT_PACE_S_PER_KM),
            long: duration_s >= LONG_RUN_SECONDS,
            shoe_label: entry.shoe_label().unwrap_or(NO_SHOE).to_string(),
        }
    }

    /// A fast long run shows as a workout
    pub fn kind(&self) -> RunKind {
        if self.workout {
            RunKind::Workout
        } else if self.long {
            RunKind::Long
        } else {
            RunKind::Jog
        }
    }
}

/// Seconds per km from the average speed, else from moving time and distance
fn pace(entry: &RunIndexEntry) -> Option<f64> {
    if let Some(speed) = entry.average_speed.filter(|s| *s > 0.0) {
        return Some(1000.0 / speed);
    }
    match (entry.moving_time, entry.distance) {
        (Some(t), Some(d)) if t > 0.0 && d > 0.0 => Some(t / (d / 1000.0)),
        _ => None,
    }
}

/// One rendered row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRow {
    pub id: String,
    pub name: String,
    pub date: String,
    pub km: String,
    pub duration: String,
    pub pace: String,
    pub elevation: String,
    pub kind: RunKind,
    pub shoe: String,
    pub has_map: bool,
}

impl RunRow {
    pub fn from_entry(entry: &RunIndexEntry) -> Self {
        let traits = RunTraits::of(entry);
        Self {
            id: entry.id.to_string(),
            name: entry
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Run".to_string()),
            date: entry
                .start_date
                .as_deref()
                .and_then(parse_instant)
                .map(|d| d.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
            km: meters_to_km(entry.distance),
            duration: format_duration(entry.moving_time.or(entry.elapsed_time)),
            pace: traits
                .pace_s_per_km
                .map(|p| format_pace(Some(p)))
                .unwrap_or_default(),
            elevation: format_elevation(entry.total_elevation_gain),
            kind: traits.kind(),
            shoe: traits.shoe_label,
            has_map: entry.has_map,
        }
    }
}

/// List state: filters, paging, selection and the expanded row
#[derive(Debug, Clone)]
pub struct RecentRuns {
    items: Vec<RunIndexEntry>,
    page_size: usize,
    visible_count: usize,
    kind_filter: KindFilter,
    shoe_filter: Selection,
    selected: Option<String>,
    expanded: Option<String>,
}

impl RecentRuns {
    pub fn new(items: Vec<RunIndexEntry>) -> Self {
        Self::with_limits(items, DEFAULT_RUN_CAP, DEFAULT_PAGE_SIZE)
    }

    /// Keep the first `cap` runs and reveal `page_size` at a time
    pub fn with_limits(mut items: Vec<RunIndexEntry>, cap: usize, page_size: usize) -> Self {
        items.truncate(cap);
        let page_size = page_size.max(1);
        Self {
            items,
            page_size,
            visible_count: page_size,
            kind_filter: KindFilter::All,
            shoe_filter: Selection::All,
            selected: None,
            expanded: None,
        }
    }

    /// Shoe dropdown: "All" then every label, sorted
    pub fn shoe_options(&self) -> Vec<String> {
        let labels: BTreeSet<String> = self
            .items
            .iter()
            .map(|e| RunTraits::of(e).shoe_label)
            .collect();
        std::iter::once(ALL_LABEL.to_string()).chain(labels).collect()
    }

    pub fn set_kind_filter(&mut self, filter: KindFilter) {
        self.kind_filter = filter;
        self.reset_page();
    }

    pub fn set_shoe_filter(&mut self, filter: Selection) {
        self.shoe_filter = filter;
        self.reset_page();
    }

    fn reset_page(&mut self) {
        self.visible_count = self.page_size;
        self.expanded = None;
    }

    /// Runs passing both filters
    pub fn filtered(&self) -> Vec<&RunIndexEntry> {
        self.items
            .iter()
            .filter(|e| {
                let traits = RunTraits::of(e);
                self.shoe_filter.accepts(Some(traits.shoe_label.as_str()))
                    && self.kind_filter.accepts(&traits)
            })
            .collect()
    }

    /// Rows on the revealed pages
    pub fn visible(&self) -> Vec<RunRow> {
        self.filtered()
            .into_iter()
            .take(self.visible_count)
            .map(RunRow::from_entry)
            .collect()
    }

    pub fn can_load_more(&self) -> bool {
        self.visible_count < self.filtered().len()
    }

    /// Reveal the next page
    pub fn load_more(&mut self) {
        let total = self.filtered().len();
        self.visible_count = (self.visible_count + self.page_size).min(total.max(self.page_size));
    }

    /// Select a run and toggle its details. Runs without a map are ignored.
    pub fn click(&mut self, id: &str) -> bool {
        let Some(entry) = self.items.iter().find(|e| e.id.to_string() == id) else {
            return false;
        };
        if !entry.has_map {
            return false;
        }
        self.selected = Some(id.to_string());
        self.expanded = if self.expanded.as_deref() == Some(id) {
            None
        } else {
            Some(id.to_string())
        };
        true
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.expanded = None;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_run_index, ActivityId};
    use pretty_assertions::assert_eq;

    fn entry(id: u64) -> RunIndexEntry {
        RunIndexEntry {
            id: ActivityId::Number(id),
            name: None,
            activity_type: Some("Run".to_string()),
            start_date: None,
            distance: None,
            moving_time: None,
            elapsed_time: None,
            average_speed: None,
            total_elevation_gain: None,
            shoe_name: None,
            gear_name: None,
            has_map: true,
        }
    }

    fn sample() -> Vec<RunIndexEntry> {
        let json = r#"[
            { "id": 1, "name": "Intervals", "start_date": "2024-03-02T20:00:00Z", "distance": 10000,
              "moving_time": 2300, "average_speed": 4.35, "shoe_name": "Vaporfly", "has_map": true },
            { "id": 2, "name": "Long Sunday", "distance": 25000, "moving_time": 8400,
              "total_elevation_gain": 151.6, "gear_name": "Pegasus", "has_map": true },
            { "id": 3, "distance": 6000, "moving_time": 2100, "has_map": false },
            { "id": 4, "distance": 30000, "elapsed_time": 7000, "average_speed": 4.5 }
        ]"#;
        parse_run_index(json).unwrap()
    }

    #[test]
    fn test_classification() {
        let runs = sample();
        let kinds: Vec<RunKind> = runs.iter().map(|e| RunTraits::of(e).kind()).collect();
        assert_eq!(
            kinds,
            vec![RunKind::Workout, RunKind::Long, RunKind::Jog, RunKind::Workout]
        );
        // 4.5 m/s over 7000 s is both fast and long
        let fast_long = RunTraits::of(&runs[3]);
        assert!(fast_long.workout && fast_long.long);
        // no average speed: 2100 s over 6 km
        assert_eq!(RunTraits::of(&runs[2]).pace_s_per_km, Some(350.0));
    }

    #[test]
    fn test_kind_and_shoe_filters() {
        let mut list = RecentRuns::new(sample());
        assert_eq!(list.shoe_options(), vec!["All", "(no shoe)", "Pegasus", "Vaporfly"]);

        list.set_kind_filter(KindFilter::Long);
        let ids: Vec<String> = list.filtered().iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["2", "4"]);

        list.set_kind_filter(KindFilter::Jog);
        assert_eq!(list.filtered().len(), 1);

        list.set_kind_filter(KindFilter::All);
        list.set_shoe_filter(Selection::from_label(NO_SHOE));
        assert_eq!(list.filtered().len(), 2);
    }

    #[test]
    fn test_rows() {
        let list = RecentRuns::new(sample());
        let rows = list.visible();
        assert_eq!(rows[0].name, "Intervals");
        assert_eq!(rows[0].date, "Mar 2, 2024");
        assert_eq!(rows[0].km, "10.00");
        assert_eq!(rows[0].duration, "38:20");
        assert_eq!(rows[1].elevation, "152 m");
        assert_eq!(rows[1].duration, "2:20:00");
        assert_eq!(rows[2].name, "Run");
        assert_eq!(rows[2].pace, "5:50/km");
        assert_eq!(rows[2].elevation, "");
    }

    #[test]
    fn test_cap_and_paging() {
        let items: Vec<RunIndexEntry> = (0..320).map(entry).collect();
        let mut list = RecentRuns::new(items);
        assert_eq!(list.len(), DEFAULT_RUN_CAP);
        assert_eq!(list.visible().len(), 50);
        assert!(list.can_load_more());
        for _ in 0..5 {
            list.load_more();
        }
        assert_eq!(list.visible().len(), 300);
        assert!(!list.can_load_more());

        // changing a filter returns to the first page
        list.set_kind_filter(KindFilter::Jog);
        assert_eq!(list.visible().len(), 50);
    }

    #[test]
    fn test_selection_requires_map() {
        let mut list = RecentRuns::new(sample());
        assert!(!list.click("3"));
        assert_eq!(list.selected(), None);

        assert!(list.click("1"));
        assert_eq!(list.selected(), Some("1"));
        assert_eq!(list.expanded(), Some("1"));

        assert!(list.click("1"));
        assert_eq!(list.selected(), Some("1"));
        assert_eq!(list.expanded(), None);

        list.click("2");
        list.clear();
        assert_eq!(list.selected(), None);
        assert_eq!(list.expanded(), None);
        assert!(!list.click("999"));
    }

    #[test]
    fn test_empty_index() {
        let list = RecentRuns::new(Vec::new());
        assert!(list.is_empty());
        assert!(list.visible().is_empty());
        assert!(!list.can_load_more());
        assert_eq!(list.shoe_options(), vec!["All"]);
    }
}
