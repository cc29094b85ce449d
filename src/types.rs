//! Core types shared across the analytics modules
//!
//! [`Activity`] is the canonical record every aggregator consumes. It is
//! produced once at the loading boundary by [`crate::schema::FeatureAdapter`],
//! which folds the various property spellings of the source GeoJSON into
//! one typed field each.

use chrono::{DateTime, Datelike, Utc};
use geo::{Coord, MultiLineString};
use serde::{Deserialize, Serialize};

/// One recorded exercise session
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    /// Source activity identifier
    pub id: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Start instant (UTC)
    pub start: Option<DateTime<Utc>>,
    /// Year label supplied by the source, if any
    pub year: Option<String>,
    /// Activity category, e.g. "Run" or "Ride"
    pub activity_type: Option<String>,
    /// Distance in meters
    pub distance_m: f64,
    /// Shoe or gear label
    pub shoe: Option<String>,
    /// Track geometry; x is longitude, y is latitude
    pub track: MultiLineString<f64>,
}

impl Activity {
    /// Create an activity with no metadata and no geometry
    pub fn new() -> Self {
        Self {
            id: None,
            name: None,
            start: None,
            year: None,
            activity_type: None,
            distance_m: 0.0,
            shoe: None,
            track: MultiLineString::new(Vec::new()),
        }
    }

    /// Year used for filtering: the supplied label, else the UTC year of the start
    pub fn year_label(&self) -> Option<String> {
        self.year
            .clone()
            .or_else(|| self.start.map(|s| s.year().to_string()))
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    /// Number of coordinates across all segments
    pub fn point_count(&self) -> usize {
        self.track.0.iter().map(|line| line.0.len()).sum()
    }

    /// All coordinates in track order, segments concatenated
    pub fn coords(&self) -> impl Iterator<Item = &Coord<f64>> + '_ {
        self.track.0.iter().flat_map(|line| line.0.iter())
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Geographic bounding box (south-west / north-east corners)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn south_west(&self) -> LatLng {
        LatLng::new(self.south, self.west)
    }

    pub fn north_east(&self) -> LatLng {
        LatLng::new(self.north, self.east)
    }

    /// Smallest box covering both
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }
}

/// Weighted point fed to the density layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub weight: f64,
}
