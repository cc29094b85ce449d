//! Dashboard state container
//!
//! [`Dashboard`] owns the four optional resources together with the current
//! filter and range selection, and derives every view from them. Derived
//! views are memoized on the generation of the resources they read plus the
//! selection and the date they were computed for, so repeated reads within
//! one state are free and any change recomputes.
//!
//! Resources arrive either from the automatic loader or from a user-supplied
//! replacement file. A user replacement always wins: once the activities
//! slot holds an override, later automatic loads for it are ignored.

use crate::aggregate::{monthly_distance, weekly_mileage, MonthlyRow, WeeklyRow};
use crate::bests::{cards, BestCard};
use crate::config::DashboardConfig;
use crate::error::InsightsError;
use crate::filter::{ActivityFilter, FilterOptions, Selection};
use crate::geometry::{bounds, heat_points};
use crate::insights::{
    activities_table, shoe_table, summary_tiles, ActivityRow, ShoeRow, SummaryTiles,
};
use crate::rolling::{rolling_7, RollingPoint};
use crate::runs::{RecentRuns, RunRow};
use crate::schema::{parse_run_index, FeatureAdapter, PersonalBests, RunIndexEntry, StatsSummary};
use crate::streak::StreakSummary;
use crate::time::{range_cutoff, today, RangeSelector, Timezone};
use crate::types::{Activity, Bounds, HeatPoint};
use crate::weekday::{day_of_week_profile, WeekdayProfile};
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// The four input resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Activities,
    Stats,
    PersonalBests,
    RunIndex,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Activities,
        ResourceKind::Stats,
        ResourceKind::PersonalBests,
        ResourceKind::RunIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Activities => "activities",
            ResourceKind::Stats => "stats",
            ResourceKind::PersonalBests => "personal_bests",
            ResourceKind::RunIndex => "run_index",
        }
    }
}

/// Where a slot's current value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Automatic,
    UserOverride,
}

/// One optional resource with a replacement counter
#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    generation: u64,
    origin: Option<Origin>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            generation: 0,
            origin: None,
        }
    }
}

impl<T> Slot<T> {
    /// Store `value` unless an automatic load would replace a user override
    fn store(&mut self, value: T, origin: Origin) -> bool {
        if origin == Origin::Automatic && self.origin == Some(Origin::UserOverride) {
            return false;
        }
        self.value = Some(value);
        self.origin = Some(origin);
        self.generation += 1;
        true
    }

    fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

/// Inputs a set of derived views was computed from
#[derive(Debug, Clone, PartialEq)]
struct MemoKey {
    activities: u64,
    stats: u64,
    filter: ActivityFilter,
    range: RangeSelector,
    today: NaiveDate,
}

/// Views derived from the activities and stats slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedViews {
    pub options: FilterOptions,
    /// Indices into the activity list that pass the filter
    pub filtered: Vec<usize>,
    pub bounds: Option<Bounds>,
    pub heat_points: Vec<HeatPoint>,
    pub rolling: Vec<RollingPoint>,
    pub monthly: Vec<MonthlyRow>,
    pub weekly: Vec<WeeklyRow>,
    /// Counted over every activity, regardless of the filter
    pub streaks: StreakSummary,
    pub weekday: WeekdayProfile,
    pub activities: Vec<ActivityRow>,
}

#[derive(Debug, Clone)]
struct Memo {
    key: MemoKey,
    views: DerivedViews,
}

/// Everything the insights screens show, for one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsSnapshot {
    pub today: NaiveDate,
    pub timezone: Timezone,
    pub range: RangeSelector,
    pub filter: ActivityFilter,
    pub activity_count: usize,
    pub filtered_count: usize,
    pub summary: Option<SummaryTiles>,
    pub shoes: Vec<ShoeRow>,
    pub personal_bests: Vec<BestCard>,
    pub recent_runs: Vec<RunRow>,
    #[serde(flatten)]
    pub views: DerivedViews,
}

impl InsightsSnapshot {
    pub fn to_json(&self) -> Result<String, InsightsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, InsightsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Root state for the dashboard
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: DashboardConfig,
    activities: Slot<Vec<Activity>>,
    stats: Slot<StatsSummary>,
    personal_bests: Slot<PersonalBests>,
    run_index: Slot<Vec<RunIndexEntry>>,
    filter: ActivityFilter,
    range: RangeSelector,
    memo: Option<Memo>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    /// Create an empty dashboard with default settings
    pub fn new() -> Self {
        Self::with_config(DashboardConfig::default())
    }

    pub fn with_config(config: DashboardConfig) -> Self {
        Self {
            config,
            activities: Slot::default(),
            stats: Slot::default(),
            personal_bests: Slot::default(),
            run_index: Slot::default(),
            filter: ActivityFilter::default(),
            range: RangeSelector::default(),
            memo: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn timezone(&self) -> &Timezone {
        &self.config.timezone
    }

    // ---- resources ----

    /// Load the activity collection from the automatic source.
    ///
    /// Returns `Ok(false)` when a user override already holds the slot.
    pub fn load_activities(&mut self, json: &str) -> Result<bool, InsightsError> {
        let activities = FeatureAdapter::parse_collection(json, &self.config.timezone)?;
        Ok(self.set_activities(activities, Origin::Automatic))
    }

    /// Replace the activity collection with a user-supplied document.
    ///
    /// Filters reset to "All". On a parse error nothing changes.
    pub fn load_override(&mut self, json: &str) -> Result<(), InsightsError> {
        let activities = FeatureAdapter::parse_collection(json, &self.config.timezone)?;
        info!("user override loaded: {} activities", activities.len());
        self.set_activities(activities, Origin::UserOverride);
        self.filter = ActivityFilter::default();
        Ok(())
    }

    pub fn set_activities(&mut self, activities: Vec<Activity>, origin: Origin) -> bool {
        let stored = self.activities.store(activities, origin);
        if !stored {
            debug!("ignoring automatic activity load: user override in place");
        }
        stored
    }

    pub fn load_stats(&mut self, json: &str) -> Result<bool, InsightsError> {
        let stats = StatsSummary::from_json(json)?;
        Ok(self.stats.store(stats, Origin::Automatic))
    }

    pub fn load_personal_bests(&mut self, json: &str) -> Result<bool, InsightsError> {
        let bests = PersonalBests::from_json(json)?;
        Ok(self.personal_bests.store(bests, Origin::Automatic))
    }

    pub fn load_run_index(&mut self, json: &str) -> Result<bool, InsightsError> {
        let entries = parse_run_index(json)?;
        Ok(self.run_index.store(entries, Origin::Automatic))
    }

    /// Loaded activities; empty when none are loaded
    pub fn activities(&self) -> &[Activity] {
        self.activities.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stats(&self) -> Option<&StatsSummary> {
        self.stats.get()
    }

    pub fn personal_bests(&self) -> Option<&PersonalBests> {
        self.personal_bests.get()
    }

    pub fn run_index(&self) -> &[RunIndexEntry] {
        self.run_index.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_loaded(&self, kind: ResourceKind) -> bool {
        self.generation(kind) > 0
    }

    /// Number of times the slot has been replaced
    pub fn generation(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Activities => self.activities.generation,
            ResourceKind::Stats => self.stats.generation,
            ResourceKind::PersonalBests => self.personal_bests.generation,
            ResourceKind::RunIndex => self.run_index.generation,
        }
    }

    pub fn origin(&self, kind: ResourceKind) -> Option<Origin> {
        match kind {
            ResourceKind::Activities => self.activities.origin,
            ResourceKind::Stats => self.stats.origin,
            ResourceKind::PersonalBests => self.personal_bests.origin,
            ResourceKind::RunIndex => self.run_index.origin,
        }
    }

    // ---- selection ----

    pub fn filter(&self) -> &ActivityFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ActivityFilter) {
        self.filter = filter;
    }

    pub fn set_year(&mut self, year: Selection) {
        self.filter.year = year;
    }

    pub fn set_activity_type(&mut self, activity_type: Selection) {
        self.filter.activity_type = activity_type;
    }

    pub fn set_shoe(&mut self, shoe: Selection) {
        self.filter.shoe = shoe;
    }

    pub fn range(&self) -> RangeSelector {
        self.range
    }

    pub fn set_range(&mut self, range: RangeSelector) {
        self.range = range;
    }

    // ---- derived views ----

    /// Activities passing the current filter
    pub fn filtered(&self) -> Vec<&Activity> {
        self.filter.apply(self.activities())
    }

    /// Derived views for `today`, recomputed only when an input changed
    pub fn views(&mut self, today: NaiveDate) -> &DerivedViews {
        let key = MemoKey {
            activities: self.activities.generation,
            stats: self.stats.generation,
            filter: self.filter.clone(),
            range: self.range,
            today,
        };
        let views = match self.memo.take() {
            Some(memo) if memo.key == key => memo.views,
            _ => {
                debug!(
                    "recomputing views (activities gen {}, stats gen {}, range {})",
                    key.activities, key.stats, key.range
                );
                self.compute_views(today)
            }
        };
        &self.memo.insert(Memo { key, views }).views
    }

    /// Whether views for `today` are already cached
    pub fn is_memoized(&self, today: NaiveDate) -> bool {
        self.memo.as_ref().is_some_and(|m| {
            m.key.activities == self.activities.generation
                && m.key.stats == self.stats.generation
                && m.key.filter == self.filter
                && m.key.range == self.range
                && m.key.today == today
        })
    }

    fn compute_views(&self, today: NaiveDate) -> DerivedViews {
        let tz = &self.config.timezone;
        let all = self.activities();
        let filtered_idx: Vec<usize> = all
            .iter()
            .enumerate()
            .filter(|(_, a)| self.filter.matches(a))
            .map(|(i, _)| i)
            .collect();
        let filtered: Vec<&Activity> = filtered_idx.iter().map(|&i| &all[i]).collect();
        let cutoff = range_cutoff(self.range, today);

        DerivedViews {
            options: FilterOptions::from_activities(all),
            bounds: bounds(filtered.iter().copied()),
            heat_points: heat_points(filtered.iter().copied(), self.config.heat_sample_every),
            rolling: rolling_7(filtered.iter().copied(), tz),
            monthly: monthly_distance(filtered.iter().copied(), tz, cutoff),
            weekly: self
                .stats()
                .map(|s| weekly_mileage(&s.weekly, cutoff))
                .unwrap_or_default(),
            streaks: self.config.streak_detector().summarize(all, today),
            weekday: day_of_week_profile(filtered.iter().copied(), tz, self.range, today),
            activities: activities_table(filtered.iter().copied()),
            filtered: filtered_idx,
        }
    }

    /// Recent runs list configured from the dashboard settings
    pub fn recent_runs(&self) -> RecentRuns {
        RecentRuns::with_limits(
            self.run_index().to_vec(),
            self.config.run_cap,
            self.config.page_size,
        )
    }

    /// Full snapshot for `today`
    pub fn snapshot(&mut self, today: NaiveDate) -> InsightsSnapshot {
        let views = self.views(today).clone();
        InsightsSnapshot {
            today,
            timezone: self.config.timezone,
            range: self.range,
            filter: self.filter.clone(),
            activity_count: self.activities().len(),
            filtered_count: views.filtered.len(),
            summary: self.stats().map(summary_tiles),
            shoes: self
                .stats()
                .map(|s| shoe_table(&s.by_shoe))
                .unwrap_or_default(),
            personal_bests: self.personal_bests().map(cards).unwrap_or_default(),
            recent_runs: self.recent_runs().visible(),
            views,
        }
    }

    /// Snapshot for the current date in the configured zone
    pub fn snapshot_now(&mut self) -> InsightsSnapshot {
        let today = today(&self.config.timezone);
        self.snapshot(today)
    }
}
