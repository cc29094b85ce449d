//! Shapes of the pre-generated JSON resources
//!
//! - `stats.json`: year-to-date totals, weekly and per-shoe mappings
//! - `personal_bests.json`: top efforts per distance class
//! - `runs_index.json`: newest-first list of lightweight activity summaries
//!
//! Every field is optional or defaulted; a partially populated file still
//! loads and simply yields emptier views.

use crate::error::InsightsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Source activity reference, numeric or textual
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityId::Number(n) => write!(f, "{n}"),
            ActivityId::Text(s) => f.write_str(s),
        }
    }
}

/// Distance and count totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(default)]
    pub distance_m: f64,
    #[serde(default)]
    pub count: u32,
}

/// One entry of the weekly mapping
pub type WeeklyTotals = Totals;

/// Per-shoe totals with the last date the shoe was used
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoeTotals {
    #[serde(default)]
    pub distance_m: f64,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub last_date: Option<String>,
}

/// Pre-aggregated summary produced by the sync process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    #[serde(default)]
    pub ytd: Totals,
    /// Keyed by `"<iso-year>-<week>"`
    #[serde(default)]
    pub weekly: BTreeMap<String, WeeklyTotals>,
    #[serde(default, rename = "byShoe", alias = "by_shoe")]
    pub by_shoe: BTreeMap<String, ShoeTotals>,
    /// Zone the summary was generated in
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

impl StatsSummary {
    pub fn from_json(json: &str) -> Result<Self, InsightsError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Map attached to an effort
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffortMap {
    #[serde(default)]
    pub polyline: Option<String>,
}

/// One ranked best effort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestEffort {
    pub activity_id: ActivityId,
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub elapsed_time_s: Option<f64>,
    #[serde(default)]
    pub pace_s_per_km: Option<f64>,
    #[serde(default)]
    pub pr_rank: Option<u32>,
    #[serde(default)]
    pub map: Option<EffortMap>,
}

impl BestEffort {
    pub fn polyline(&self) -> Option<&str> {
        self.map
            .as_ref()
            .and_then(|m| m.polyline.as_deref())
            .filter(|p| !p.is_empty())
    }
}

/// Ranked efforts for one distance class, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBests {
    #[serde(default)]
    pub top: Vec<BestEffort>,
}

/// Personal bests keyed by distance-class key (`"hm"`, `"10k"`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalBests {
    #[serde(default)]
    pub events: BTreeMap<String, EventBests>,
}

impl PersonalBests {
    pub fn from_json(json: &str) -> Result<Self, InsightsError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Lightweight activity summary from the run index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunIndexEntry {
    pub id: ActivityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    /// Meters
    #[serde(default)]
    pub distance: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub moving_time: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    /// Meters per second
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
    #[serde(default)]
    pub shoe_name: Option<String>,
    #[serde(default)]
    pub gear_name: Option<String>,
    /// Whether map geometry exists for this activity
    #[serde(default, alias = "has_geometry")]
    pub has_map: bool,
}

impl RunIndexEntry {
    /// Shoe label with the gear name as fallback
    pub fn shoe_label(&self) -> Option<&str> {
        [self.shoe_name.as_deref(), self.gear_name.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }
}

/// Parse the run index (a JSON array, newest first)
pub fn parse_run_index(json: &str) -> Result<Vec<RunIndexEntry>, InsightsError> {
    Ok(serde_json::from_str(json)?)
}
