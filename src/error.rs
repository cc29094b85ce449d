//! Error types for the heatmap analytics engine

use thiserror::Error;

/// Errors that can occur while loading resources or deriving views
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("Failed to parse resource: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid GeoJSON: {0}")]
    GeoJson(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Unknown range selector: {0}")]
    InvalidRange(String),

    #[error("Polyline decode error: {0}")]
    Polyline(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<geojson::Error> for InsightsError {
    fn from(e: geojson::Error) -> Self {
        InsightsError::GeoJson(e.to_string())
    }
}
