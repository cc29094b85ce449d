//! Dashboard configuration
//!
//! All fields have defaults, so a partial JSON document (or none at all)
//! yields a usable configuration.

use crate::error::InsightsError;
use crate::preview::{Canvas, MapPreview, DEFAULT_PRECISION};
use crate::runs::{DEFAULT_PAGE_SIZE, DEFAULT_RUN_CAP};
use crate::streak::{StreakDetector, DEFAULT_STREAK_TYPE};
use crate::time::Timezone;
use serde::{Deserialize, Serialize};

/// Default heat-layer sampling (every coordinate)
pub const DEFAULT_HEAT_SAMPLE_EVERY: usize = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Zone used for every day, week and month bucket
    pub timezone: Timezone,
    /// Activity type counted toward streaks; `null` counts every type
    pub streak_type: Option<String>,
    /// Keep every n-th coordinate for the heat layer
    pub heat_sample_every: usize,
    /// Runs kept from the run index
    pub run_cap: usize,
    pub page_size: usize,
    /// Personal-best preview canvas
    pub preview: Canvas,
    /// Encoded polyline precision (5 or 6)
    pub polyline_precision: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            timezone: Timezone::default(),
            streak_type: Some(DEFAULT_STREAK_TYPE.to_string()),
            heat_sample_every: DEFAULT_HEAT_SAMPLE_EVERY,
            run_cap: DEFAULT_RUN_CAP,
            page_size: DEFAULT_PAGE_SIZE,
            preview: Canvas::default(),
            polyline_precision: DEFAULT_PRECISION,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(json: &str) -> Result<Self, InsightsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, InsightsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values no view can work with
    pub fn validate(&self) -> Result<(), InsightsError> {
        if !matches!(self.polyline_precision, 5 | 6) {
            return Err(InsightsError::InvalidConfig(format!(
                "polyline_precision must be 5 or 6, got {}",
                self.polyline_precision
            )));
        }
        if self.page_size == 0 {
            return Err(InsightsError::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        let canvas = &self.preview;
        if canvas.width <= 2.0 * canvas.padding || canvas.height <= 2.0 * canvas.padding {
            return Err(InsightsError::InvalidConfig(
                "preview canvas is smaller than its padding".to_string(),
            ));
        }
        Ok(())
    }

    pub fn streak_detector(&self) -> StreakDetector {
        StreakDetector::new(self.timezone).with_activity_type(self.streak_type.clone())
    }

    pub fn map_preview(&self) -> MapPreview {
        MapPreview::new(self.preview, self.polyline_precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.timezone.name(), "Pacific/Auckland");
        assert_eq!(config.streak_type.as_deref(), Some("Run"));
        assert_eq!(config.run_cap, 300);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.polyline_precision, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config =
            DashboardConfig::from_json(r#"{ "timezone": "Europe/London", "streak_type": null }"#)
                .unwrap();
        assert_eq!(config.timezone.name(), "Europe/London");
        assert_eq!(config.streak_type, None);
        assert_eq!(config.heat_sample_every, 1);
    }

    #[test]
    fn test_round_trip() {
        let config = DashboardConfig {
            heat_sample_every: 4,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(DashboardConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            DashboardConfig::from_json(r#"{ "timezone": "Mars/Olympus" }"#),
            Err(InsightsError::JsonError(_))
        ));
        assert!(DashboardConfig::from_json(r#"{ "polyline_precision": 7 }"#).is_err());
        assert!(DashboardConfig::from_json(r#"{ "page_size": 0 }"#).is_err());
        assert!(DashboardConfig::from_json(
            r#"{ "preview": { "width": 10, "height": 10, "padding": 8 } }"#
        )
        .is_err());
    }
}
