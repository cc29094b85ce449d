//! Geometry utilities
//!
//! Coordinate extraction, map bounds, density-layer points and the
//! categorical filter options (years, types, shoes) derived from a set of
//! activities.

use crate::types::{Activity, Bounds, HeatPoint};
use geo::{BoundingRect, Coord, LineString};
use std::collections::BTreeSet;

/// Weight given to every heat point
pub const HEAT_POINT_WEIGHT: f64 = 0.8;

/// All coordinates of an activity, segments concatenated in order
pub fn flatten_coords(activity: &Activity) -> Vec<Coord<f64>> {
    activity.coords().copied().collect()
}

/// Bounding box covering every coordinate of every activity.
///
/// Non-finite coordinates are ignored. Returns `None` when no activity
/// carries a usable coordinate.
pub fn bounds<'a, I>(activities: I) -> Option<Bounds>
where
    I: IntoIterator<Item = &'a Activity>,
{
    activities
        .into_iter()
        .filter_map(|a| {
            let finite: Vec<Coord<f64>> = a
                .coords()
                .filter(|c| c.x.is_finite() && c.y.is_finite())
                .copied()
                .collect();
            LineString::from(finite).bounding_rect()
        })
        .map(|rect| Bounds {
            south: rect.min().y,
            west: rect.min().x,
            north: rect.max().y,
            east: rect.max().x,
        })
        .reduce(|acc, b| acc.union(&b))
}

/// Density-layer points from every `sample_every`-th coordinate of each track.
///
/// Non-finite coordinates are dropped. A `sample_every` of 0 is treated as 1.
pub fn heat_points<'a, I>(activities: I, sample_every: usize) -> Vec<HeatPoint>
where
    I: IntoIterator<Item = &'a Activity>,
{
    let step = sample_every.max(1);
    let mut points = Vec::new();
    for activity in activities {
        for coord in activity.coords().step_by(step) {
            if coord.x.is_finite() && coord.y.is_finite() {
                points.push(HeatPoint {
                    lat: coord.y,
                    lon: coord.x,
                    weight: HEAT_POINT_WEIGHT,
                });
            }
        }
    }
    points
}

/// Distinct year labels, sorted
pub fn years<'a, I>(activities: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Activity>,
{
    distinct(activities.into_iter().filter_map(|a| a.year_label()))
}

/// Distinct activity types, sorted
pub fn activity_types<'a, I>(activities: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Activity>,
{
    distinct(activities.into_iter().filter_map(|a| a.activity_type.clone()))
}

/// Distinct shoe/gear labels, sorted
pub fn shoes<'a, I>(activities: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Activity>,
{
    distinct(activities.into_iter().filter_map(|a| a.shoe.clone()))
}

fn distinct(labels: impl Iterator<Item = String>) -> Vec<String> {
    labels.collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiLineString};
    use pretty_assertions::assert_eq;

    fn track(points: &[(f64, f64)]) -> MultiLineString<f64> {
        MultiLineString::new(vec![LineString::from(points.to_vec())])
    }

    fn activity(year: &str, kind: &str, shoe: Option<&str>, points: &[(f64, f64)]) -> Activity {
        Activity {
            year: Some(year.to_string()),
            activity_type: Some(kind.to_string()),
            shoe: shoe.map(str::to_string),
            track: track(points),
            ..Activity::new()
        }
    }

    #[test]
    fn test_bounds_span_all_tracks() {
        let activities = vec![
            activity("2023", "Run", None, &[(174.70, -36.90), (174.80, -36.80)]),
            activity("2024", "Run", None, &[(175.00, -37.10)]),
            activity("2024", "Run", None, &[]),
        ];
        let b = bounds(&activities).unwrap();
        assert_eq!(
            b,
            Bounds {
                south: -37.10,
                west: 174.70,
                north: -36.80,
                east: 175.00
            }
        );
    }

    #[test]
    fn test_bounds_empty() {
        assert_eq!(bounds(&Vec::<Activity>::new()), None);
        assert_eq!(bounds(&vec![Activity::new()]), None);
    }

    #[test]
    fn test_bounds_skip_non_finite_coords() {
        let activities = vec![
            activity("2024", "Run", None, &[(174.70, -36.90), (f64::NAN, -80.0)]),
            activity("2024", "Run", None, &[(f64::INFINITY, 10.0), (174.80, -36.80)]),
            activity("2024", "Run", None, &[(f64::NAN, f64::NAN)]),
        ];
        assert_eq!(
            bounds(&activities),
            Some(Bounds {
                south: -36.90,
                west: 174.70,
                north: -36.80,
                east: 174.80
            })
        );
        assert_eq!(bounds(&activities[2..]), None);
    }

    #[test]
    fn test_multi_segment_flatten() {
        let a = Activity {
            track: MultiLineString::new(vec![
                LineString::from(vec![(1.0, 2.0), (3.0, 4.0)]),
                LineString::from(vec![(5.0, 6.0)]),
            ]),
            ..Activity::new()
        };
        let coords = flatten_coords(&a);
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[2], Coord { x: 5.0, y: 6.0 });
    }

    #[test]
    fn test_heat_points_sampling() {
        let a = activity(
            "2024",
            "Run",
            None,
            &[(0.0, 0.0), (1.0, 1.0), (f64::NAN, 2.0), (3.0, 3.0), (4.0, 4.0)],
        );
        let every = heat_points(std::slice::from_ref(&a), 1);
        assert_eq!(every.len(), 4);
        assert_eq!(every[1], HeatPoint { lat: 1.0, lon: 1.0, weight: 0.8 });

        let sampled = heat_points(std::slice::from_ref(&a), 2);
        // indices 0, 2 (NaN, dropped), 4
        assert_eq!(sampled.len(), 2);
        assert_eq!(sampled[1].lat, 4.0);

        assert_eq!(heat_points(std::slice::from_ref(&a), 0).len(), 4);
    }

    #[test]
    fn test_filter_options_sorted_and_distinct() {
        let activities = vec![
            activity("2024", "Run", Some("Pegasus"), &[]),
            activity("2023", "Ride", None, &[]),
            activity("2024", "Run", Some("Clifton"), &[]),
        ];
        assert_eq!(years(&activities), vec!["2023", "2024"]);
        assert_eq!(activity_types(&activities), vec!["Ride", "Run"]);
        assert_eq!(shoes(&activities), vec!["Clifton", "Pegasus"]);
    }
}
