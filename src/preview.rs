//! Encoded-polyline decoding and SVG path projection
//!
//! Best-effort previews are drawn from the compact polyline attached to an
//! effort. Points are projected into a fixed canvas with a uniform scale so
//! the route keeps its aspect ratio, latitude pointing up.

use crate::error::InsightsError;
use crate::types::LatLng;
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Smallest coordinate span used for scaling, in degrees
pub const MIN_SPAN: f64 = 1e-9;

/// Default polyline precision (1e-5 degrees)
pub const DEFAULT_PRECISION: u32 = 5;

fn check_precision(precision: u32) -> Result<(), InsightsError> {
    match precision {
        5 | 6 => Ok(()),
        other => Err(InsightsError::Polyline(format!(
            "unsupported precision {other}, expected 5 or 6"
        ))),
    }
}

/// Decode an encoded polyline into latitude/longitude pairs.
///
/// An empty string decodes to no points.
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<LatLng>, InsightsError> {
    check_precision(precision)?;
    if encoded.is_empty() {
        return Ok(Vec::new());
    }
    // The final chunk must end on a byte without the continuation bit
    if encoded
        .bytes()
        .last()
        .is_some_and(|b| !(b'?'..=b'^').contains(&b))
    {
        return Err(InsightsError::Polyline(
            "truncated polyline: last value never terminates".to_string(),
        ));
    }
    let line = polyline::decode_polyline(encoded, precision)
        .map_err(|e| InsightsError::Polyline(e.to_string()))?;
    Ok(line.0.into_iter().map(|c| LatLng::new(c.y, c.x)).collect())
}

/// Encode latitude/longitude pairs into a polyline
pub fn encode(points: &[LatLng], precision: u32) -> Result<String, InsightsError> {
    check_precision(precision)?;
    let coords = points.iter().map(|p| Coord { x: p.lng, y: p.lat });
    polyline::encode_coordinates(coords, precision)
        .map_err(|e| InsightsError::Polyline(e.to_string()))
}

/// Drawing area for a preview
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 180.0,
            padding: 8.0,
        }
    }
}

/// One drawing instruction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
}

/// Project points into `canvas`.
///
/// The scale is the smaller of the two axis scales so both spans fit inside
/// the padding. Degenerate spans (a single point, a due north-south line)
/// are widened to [`MIN_SPAN`].
pub fn project(points: &[LatLng], canvas: &Canvas) -> Vec<PathCommand> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let (mut min_lat, mut max_lat, mut min_lng, mut max_lng) =
        (first.lat, first.lat, first.lng, first.lng);
    for p in points {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lng = min_lng.min(p.lng);
        max_lng = max_lng.max(p.lng);
    }

    let span_lng = (max_lng - min_lng).max(MIN_SPAN);
    let span_lat = (max_lat - min_lat).max(MIN_SPAN);
    let sx = (canvas.width - 2.0 * canvas.padding) / span_lng;
    let sy = (canvas.height - 2.0 * canvas.padding) / span_lat;
    let scale = sx.min(sy);

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = canvas.padding + (p.lng - min_lng) * scale;
            let y = canvas.padding + (max_lat - p.lat) * scale;
            if i == 0 {
                PathCommand::MoveTo { x, y }
            } else {
                PathCommand::LineTo { x, y }
            }
        })
        .collect()
}

/// Render commands as SVG path data with one decimal per coordinate
pub fn to_svg_path(commands: &[PathCommand]) -> String {
    let mut d = String::new();
    for (i, command) in commands.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        let (op, x, y) = match command {
            PathCommand::MoveTo { x, y } => ('M', x, y),
            PathCommand::LineTo { x, y } => ('L', x, y),
        };
        let _ = write!(d, "{op}{x:.1},{y:.1}");
    }
    d
}

/// Decode and project in one step
pub fn svg_path(encoded: &str, precision: u32, canvas: &Canvas) -> Result<String, InsightsError> {
    let points = decode(encoded, precision)?;
    Ok(to_svg_path(&project(&points, canvas)))
}

/// Outcome of drawing a preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Preview {
    /// The activity has no map yet
    NoPolyline,
    /// SVG path data
    Path(String),
    /// A polyline exists but could not be drawn
    Unavailable(String),
}

/// Inline map preview renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPreview {
    pub canvas: Canvas,
    pub precision: u32,
}

impl Default for MapPreview {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            precision: DEFAULT_PRECISION,
        }
    }
}

impl MapPreview {
    pub fn new(canvas: Canvas, precision: u32) -> Self {
        Self { canvas, precision }
    }

    /// Draw `polyline`; decoding problems stay inside the returned [`Preview`]
    pub fn render(&self, polyline: Option<&str>) -> Preview {
        let Some(encoded) = polyline.filter(|p| !p.is_empty()) else {
            return Preview::NoPolyline;
        };
        match svg_path(encoded, self.precision, &self.canvas) {
            Ok(path) if !path.is_empty() => Preview::Path(path),
            Ok(_) => Preview::Unavailable("polyline has no points".to_string()),
            Err(e) => Preview::Unavailable(e.to_string()),
        }
    }
}
