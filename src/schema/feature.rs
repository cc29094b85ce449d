//! GeoJSON activity features → canonical [`Activity`] records
//!
//! Source files spell the same concept several ways (`shoe_name`,
//! `gear_name`, `gear_id`; `start_date` vs. a local start). Every variant is
//! resolved here, once, so downstream code only ever reads a single field.

use crate::error::InsightsError;
use crate::time::{parse_instant, parse_local_instant, Timezone};
use crate::types::Activity;
use geo::{Coord, LineString, MultiLineString};
use geojson::{feature::Id, Feature, GeoJson, JsonObject, JsonValue, Value};

/// Zone-qualified start keys, in priority order
const START_KEYS: &[&str] = &["start_date", "start", "date"];
/// Wall-clock start keys interpreted in the configured zone
const LOCAL_START_KEYS: &[&str] = &["start_date_local", "start_local"];
const TYPE_KEYS: &[&str] = &["type", "sport_type"];
const DISTANCE_KEYS: &[&str] = &["distance_m", "distance"];
const SHOE_KEYS: &[&str] = &["shoe_name", "gear_name", "gear_id"];

/// Adapter from GeoJSON documents to canonical activities
pub struct FeatureAdapter;

impl FeatureAdapter {
    /// Parse a GeoJSON document into activities.
    ///
    /// A FeatureCollection yields one activity per feature in source order; a
    /// lone Feature yields one activity. A bare Geometry is rejected.
    pub fn parse_collection(json: &str, tz: &Timezone) -> Result<Vec<Activity>, InsightsError> {
        let geojson: GeoJson = json.parse()?;
        match geojson {
            GeoJson::FeatureCollection(collection) => Ok(collection
                .features
                .iter()
                .map(|f| Self::to_activity(f, tz))
                .collect()),
            GeoJson::Feature(feature) => Ok(vec![Self::to_activity(&feature, tz)]),
            GeoJson::Geometry(_) => Err(InsightsError::GeoJson(
                "expected a FeatureCollection, found a bare geometry".to_string(),
            )),
        }
    }

    /// Normalize a single feature
    pub fn to_activity(feature: &Feature, tz: &Timezone) -> Activity {
        let empty = JsonObject::new();
        let props = feature.properties.as_ref().unwrap_or(&empty);

        let id = first_label(props, &["id"]).or_else(|| feature.id.as_ref().map(id_label));

        let start = first_label(props, START_KEYS)
            .and_then(|s| parse_instant(&s))
            .or_else(|| {
                first_label(props, LOCAL_START_KEYS).and_then(|s| parse_local_instant(&s, tz))
            });

        let distance_m = DISTANCE_KEYS
            .iter()
            .find_map(|key| props.get(*key).and_then(JsonValue::as_f64))
            .filter(|d| d.is_finite())
            .unwrap_or(0.0);

        Activity {
            id,
            name: first_label(props, &["name"]),
            start,
            year: first_label(props, &["year"]),
            activity_type: first_label(props, TYPE_KEYS),
            distance_m,
            shoe: first_label(props, SHOE_KEYS),
            track: track_from_geometry(feature.geometry.as_ref().map(|g| &g.value)),
        }
    }

    /// Check each feature of a collection and report anything the views will
    /// have to skip. Returns an error only when the document itself is unusable.
    pub fn validate(json: &str, tz: &Timezone) -> Result<Vec<FeatureReport>, InsightsError> {
        let geojson: GeoJson = json.parse()?;
        let features = match geojson {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => {
                return Err(InsightsError::GeoJson(
                    "expected a FeatureCollection, found a bare geometry".to_string(),
                ))
            }
        };

        Ok(features
            .iter()
            .enumerate()
            .map(|(index, feature)| {
                let activity = Self::to_activity(feature, tz);
                let mut issues = Vec::new();
                match feature.geometry.as_ref().map(|g| &g.value) {
                    None => issues.push(FeatureIssue::MissingGeometry),
                    Some(Value::LineString(_)) | Some(Value::MultiLineString(_)) => {}
                    Some(other) => issues.push(FeatureIssue::UnsupportedGeometry(
                        geometry_kind(other).to_string(),
                    )),
                }
                if activity.start.is_none() {
                    issues.push(FeatureIssue::MissingStart);
                }
                FeatureReport {
                    index,
                    activity_id: activity.id,
                    issues,
                }
            })
            .collect())
    }
}

/// Validation outcome for one feature
#[derive(Debug, Clone)]
pub struct FeatureReport {
    pub index: usize,
    pub activity_id: Option<String>,
    pub issues: Vec<FeatureIssue>,
}

impl FeatureReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Problems that make a feature invisible to some views
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureIssue {
    #[error("feature has no geometry")]
    MissingGeometry,

    #[error("geometry type {0} is not a line")]
    UnsupportedGeometry(String),

    #[error("no parseable start timestamp")]
    MissingStart,
}

/// First non-empty value among `keys`, rendered as a label
fn first_label(props: &JsonObject, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match props.get(*key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn id_label(id: &Id) -> String {
    match id {
        Id::String(s) => s.clone(),
        Id::Number(n) => n.to_string(),
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Line geometries become a multi-line track; anything else is an empty track
fn track_from_geometry(value: Option<&Value>) -> MultiLineString<f64> {
    let lines = match value {
        Some(Value::LineString(points)) => vec![line_from_positions(points)],
        Some(Value::MultiLineString(parts)) => parts.iter().map(|p| line_from_positions(p)).collect(),
        _ => Vec::new(),
    };
    MultiLineString::new(lines)
}

fn line_from_positions(points: &[Vec<f64>]) -> LineString<f64> {
    points
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect::<Vec<_>>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 42,
                "geometry": { "type": "LineString", "coordinates": [[174.76, -36.85], [174.77, -36.86]] },
                "properties": { "name": "Morning Run", "type": "Run", "start_date": "2024-01-15T18:30:00Z",
                                "distance_m": 5012.3, "gear_name": "Pegasus 40", "year": 2024 }
            },
            {
                "type": "Feature",
                "geometry": { "type": "MultiLineString", "coordinates": [[[174.0, -36.0], [174.1, -36.1]], [[175.0, -37.0]]] },
                "properties": { "id": "abc", "sport_type": "Ride", "start_date_local": "2024-01-16T06:30:00Z",
                                "distance": 20000, "shoe_name": "", "gear_id": "b123" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [174.0, -36.0] },
                "properties": {}
            }
        ]
    }"#;

    #[test]
    fn test_parse_collection_normalizes_keys() {
        let activities = FeatureAdapter::parse_collection(COLLECTION, &Timezone::default()).unwrap();
        assert_eq!(activities.len(), 3);

        let run = &activities[0];
        assert_eq!(run.id.as_deref(), Some("42"));
        assert_eq!(run.name.as_deref(), Some("Morning Run"));
        assert_eq!(run.activity_type.as_deref(), Some("Run"));
        assert_eq!(run.shoe.as_deref(), Some("Pegasus 40"));
        assert_eq!(run.year.as_deref(), Some("2024"));
        assert!((run.distance_m - 5012.3).abs() < 1e-9);
        assert_eq!(
            run.start,
            Some("2024-01-15T18:30:00Z".parse::<DateTime<Utc>>().unwrap())
        );
        assert_eq!(run.point_count(), 2);

        let ride = &activities[1];
        assert_eq!(ride.id.as_deref(), Some("abc"));
        assert_eq!(ride.activity_type.as_deref(), Some("Ride"));
        // empty shoe_name falls through to gear_id
        assert_eq!(ride.shoe.as_deref(), Some("b123"));
        assert_eq!(ride.track.0.len(), 2);
        assert_eq!(ride.point_count(), 3);
        // local 06:30 NZDT
        assert_eq!(
            ride.start,
            Some("2024-01-15T17:30:00Z".parse::<DateTime<Utc>>().unwrap())
        );

        let point = &activities[2];
        assert_eq!(point.point_count(), 0);
        assert_eq!(point.start, None);
        assert_eq!(point.distance_m, 0.0);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let result = FeatureAdapter::parse_collection("{not json", &Timezone::default());
        assert!(matches!(result, Err(InsightsError::GeoJson(_))));
    }

    #[test]
    fn test_bare_geometry_rejected() {
        let json = r#"{"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}"#;
        let result = FeatureAdapter::parse_collection(json, &Timezone::default());
        assert!(matches!(result, Err(InsightsError::GeoJson(_))));
    }

    #[test]
    fn test_validate_reports_issues() {
        let reports = FeatureAdapter::validate(COLLECTION, &Timezone::default()).unwrap();
        assert!(reports[0].is_clean());
        assert!(reports[1].is_clean());
        assert_eq!(
            reports[2].issues,
            vec![
                FeatureIssue::UnsupportedGeometry("Point".to_string()),
                FeatureIssue::MissingStart
            ]
        );
    }
}
