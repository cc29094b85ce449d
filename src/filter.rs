//! Year / type / shoe filtering
//!
//! The map, heat layer, monthly chart and activities table all render the
//! same filtered subset. Filters compose as a conjunction of three
//! independent selections.

use crate::geometry;
use crate::types::Activity;
use serde::{Deserialize, Serialize};

/// Label shown for "no filter" in every dropdown
pub const ALL_LABEL: &str = "All";

/// One dropdown selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Build from a dropdown value; `"All"` means no filter
    pub fn from_label(label: &str) -> Self {
        if label == ALL_LABEL {
            Selection::All
        } else {
            Selection::Only(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Selection::All => ALL_LABEL,
            Selection::Only(value) => value,
        }
    }

    /// Whether `value` passes this selection. A missing value only passes `All`.
    pub fn accepts(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted.as_str()),
        }
    }
}

/// Combined year, type and shoe filter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActivityFilter {
    #[serde(default)]
    pub year: Selection,
    #[serde(default)]
    pub activity_type: Selection,
    #[serde(default)]
    pub shoe: Selection,
}

impl ActivityFilter {
    pub fn new(year: Selection, activity_type: Selection, shoe: Selection) -> Self {
        Self {
            year,
            activity_type,
            shoe,
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        *self == ActivityFilter::default()
    }

    pub fn matches(&self, activity: &Activity) -> bool {
        self.year.accepts(activity.year_label().as_deref())
            && self.activity_type.accepts(activity.activity_type.as_deref())
            && self.shoe.accepts(activity.shoe.as_deref())
    }

    /// Activities passing the filter, in input order
    pub fn apply<'a, I>(&self, activities: I) -> Vec<&'a Activity>
    where
        I: IntoIterator<Item = &'a Activity>,
    {
        activities.into_iter().filter(|a| self.matches(a)).collect()
    }
}

/// Dropdown options for the three filters, each starting with "All"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub years: Vec<String>,
    pub types: Vec<String>,
    pub shoes: Vec<String>,
}

impl FilterOptions {
    pub fn from_activities(activities: &[Activity]) -> Self {
        let with_all = |mut labels: Vec<String>| {
            labels.insert(0, ALL_LABEL.to_string());
            labels
        };
        Self {
            years: with_all(geometry::years(activities)),
            types: with_all(geometry::activity_types(activities)),
            shoes: with_all(geometry::shoes(activities)),
        }
    }
}
