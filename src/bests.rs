//! Personal-best views
//!
//! Distance classes are shown half marathon first. Each class has a headline
//! card (the best effort) and a top-N table whose rows can be expanded into
//! an inline map preview.

use crate::format::{fmt_date, format_hms, format_pace, MISSING};
use crate::preview::{MapPreview, Preview};
use crate::schema::{BestEffort, PersonalBests};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base URL of a source activity page
pub const ACTIVITY_URL_BASE: &str = "https://www.strava.com/activities/";

/// Distance classes with tracked personal bests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DistanceClass {
    #[serde(rename = "hm")]
    HalfMarathon,
    #[serde(rename = "10k")]
    TenK,
    #[serde(rename = "5k")]
    FiveK,
    #[serde(rename = "1k")]
    OneK,
}

impl DistanceClass {
    /// Display order
    pub const ALL: [DistanceClass; 4] = [
        DistanceClass::HalfMarathon,
        DistanceClass::TenK,
        DistanceClass::FiveK,
        DistanceClass::OneK,
    ];

    /// Key used in the personal-bests resource
    pub fn key(&self) -> &'static str {
        match self {
            DistanceClass::HalfMarathon => "hm",
            DistanceClass::TenK => "10k",
            DistanceClass::FiveK => "5k",
            DistanceClass::OneK => "1k",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DistanceClass::HalfMarathon => "Half Marathon",
            DistanceClass::TenK => "10K",
            DistanceClass::FiveK => "5K",
            DistanceClass::OneK => "1K",
        }
    }
}

impl fmt::Display for DistanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Link to the source activity of an effort
pub fn activity_url(effort: &BestEffort) -> String {
    format!("{ACTIVITY_URL_BASE}{}", effort.activity_id)
}

/// Ranked efforts for `class`, best first; empty when absent
pub fn top(bests: &PersonalBests, class: DistanceClass) -> &[BestEffort] {
    bests
        .events
        .get(class.key())
        .map(|e| e.top.as_slice())
        .unwrap_or(&[])
}

/// The best effort for `class`
pub fn best(bests: &PersonalBests, class: DistanceClass) -> Option<&BestEffort> {
    top(bests, class).first()
}

/// Headline card for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCard {
    pub class: DistanceClass,
    pub label: String,
    /// Elapsed time, or a placeholder when there is no best yet
    pub time: String,
    /// `"pace • date"`, or a "no PB yet" note
    pub detail: String,
}

/// One row of a top-N table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortRow {
    pub date: String,
    pub time: String,
    pub pace: String,
    pub activity: String,
    pub rank: String,
    pub url: String,
    pub has_map: bool,
}

impl EffortRow {
    pub fn from_effort(effort: &BestEffort) -> Self {
        Self {
            date: fmt_date(effort.start_date.as_deref()),
            time: format_hms(effort.elapsed_time_s),
            pace: format_pace(effort.pace_s_per_km),
            activity: effort
                .activity_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| MISSING.to_string()),
            rank: effort
                .pr_rank
                .filter(|r| *r > 0)
                .map_or_else(|| MISSING.to_string(), |r| format!("#{r}")),
            url: activity_url(effort),
            has_map: effort.polyline().is_some(),
        }
    }
}

pub fn card(bests: &PersonalBests, class: DistanceClass) -> BestCard {
    let label = class.label().to_string();
    match best(bests, class) {
        Some(effort) => BestCard {
            class,
            label,
            time: format_hms(effort.elapsed_time_s),
            detail: format!(
                "{} • {}",
                format_pace(effort.pace_s_per_km),
                fmt_date(effort.start_date.as_deref())
            ),
        },
        None => BestCard {
            class,
            time: MISSING.to_string(),
            detail: format!("No {label} PB yet"),
            label,
        },
    }
}

/// Cards for every class in display order
pub fn cards(bests: &PersonalBests) -> Vec<BestCard> {
    DistanceClass::ALL.iter().map(|c| card(bests, *c)).collect()
}

/// Table rows for `class`
pub fn effort_rows(bests: &PersonalBests, class: DistanceClass) -> Vec<EffortRow> {
    top(bests, class).iter().map(EffortRow::from_effort).collect()
}

/// Expanded-row state for a top-N table: at most one row is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disclosure {
    open: Option<usize>,
}

impl Disclosure {
    /// Open `index`, or close it when it is already open
    pub fn toggle(&mut self, index: usize) {
        self.open = if self.open == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    pub fn open(&self) -> Option<usize> {
        self.open
    }

    /// Preview of the open row, if any
    pub fn preview(&self, efforts: &[BestEffort], renderer: &MapPreview) -> Option<Preview> {
        let effort = efforts.get(self.open?)?;
        Some(renderer.render(effort.polyline()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ActivityId;
    use pretty_assertions::assert_eq;

    const BESTS: &str = r#"{ "events": {
        "5k": { "top": [
            { "activity_id": 111, "activity_name": "Parkrun", "start_date": "2024-03-02T20:00:00Z",
              "elapsed_time_s": 1199, "pace_s_per_km": 239.8, "pr_rank": 1,
              "map": { "polyline": "_p~iF~ps|U_ulLnnqC_mqNvxq`@" } },
            { "activity_id": 222, "elapsed_time_s": 1230, "pace_s_per_km": 246.0 }
        ] },
        "hm": { "top": [] }
    } }"#;

    fn bests() -> PersonalBests {
        PersonalBests::from_json(BESTS).unwrap()
    }

    #[test]
    fn test_class_order_and_keys() {
        let keys: Vec<&str> = DistanceClass::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["hm", "10k", "5k", "1k"]);
        assert_eq!(DistanceClass::HalfMarathon.to_string(), "Half Marathon");
    }

    #[test]
    fn test_cards() {
        let cards = cards(&bests());
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[0].time, MISSING);
        assert_eq!(cards[0].detail, "No Half Marathon PB yet");
        assert_eq!(
            cards[2],
            BestCard {
                class: DistanceClass::FiveK,
                label: "5K".to_string(),
                time: "19:59".to_string(),
                detail: "4:00/km • 2024-03-02".to_string(),
            }
        );
    }

    #[test]
    fn test_effort_rows() {
        let rows = effort_rows(&bests(), DistanceClass::FiveK);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rank, "#1");
        assert_eq!(rows[0].url, "https://www.strava.com/activities/111");
        assert!(rows[0].has_map);
        assert_eq!(rows[1].activity, MISSING);
        assert_eq!(rows[1].rank, MISSING);
        assert!(!rows[1].has_map);
        assert!(effort_rows(&bests(), DistanceClass::OneK).is_empty());
    }

    #[test]
    fn test_best_effort() {
        let bests = bests();
        let effort = best(&bests, DistanceClass::FiveK).unwrap();
        assert_eq!(effort.activity_id, ActivityId::Number(111));
        assert!(best(&bests, DistanceClass::HalfMarathon).is_none());
    }

    #[test]
    fn test_disclosure_toggles_single_row() {
        let bests = bests();
        let efforts = top(&bests, DistanceClass::FiveK);
        let renderer = MapPreview::default();

        let mut disclosure = Disclosure::default();
        assert_eq!(disclosure.preview(efforts, &renderer), None);

        disclosure.toggle(0);
        assert!(matches!(disclosure.preview(efforts, &renderer), Some(Preview::Path(_))));

        disclosure.toggle(1);
        assert_eq!(disclosure.open(), Some(1));
        assert_eq!(disclosure.preview(efforts, &renderer), Some(Preview::NoPolyline));

        disclosure.toggle(1);
        assert_eq!(disclosure.open(), None);
    }
}
