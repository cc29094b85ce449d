//! Display formatting shared by the insight views

/// Shown when a value is missing or not displayable
pub const MISSING: &str = "—";

/// `h:mm:ss` when an hour or more, else `m:ss`. Seconds are rounded.
pub fn format_hms(total_seconds: Option<f64>) -> String {
    match total_seconds.filter(|s| s.is_finite() && *s >= 0.0) {
        Some(seconds) => clock(seconds.round() as u64),
        None => MISSING.to_string(),
    }
}

/// Pace as `m:ss/km`
pub fn format_pace(seconds_per_km: Option<f64>) -> String {
    match seconds_per_km.filter(|s| s.is_finite() && *s > 0.0) {
        Some(pace) => {
            let total = pace.round() as u64;
            format!("{}:{:02}/km", total / 60, total % 60)
        }
        None => MISSING.to_string(),
    }
}

/// Duration with seconds truncated; empty when unknown
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds.filter(|s| s.is_finite() && *s >= 0.0) {
        Some(seconds) => clock(seconds.floor() as u64),
        None => String::new(),
    }
}

fn clock(total: u64) -> String {
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Meters as kilometers with two decimals; empty when unknown
pub fn meters_to_km(meters: Option<f64>) -> String {
    meters
        .filter(|m| m.is_finite())
        .map(|m| format!("{:.2}", m / 1000.0))
        .unwrap_or_default()
}

/// Meters as kilometers with one decimal
pub fn km_one_decimal(meters: f64) -> String {
    format!("{:.1}", meters / 1000.0)
}

/// Elevation gain as whole meters, e.g. `"152 m"`
pub fn format_elevation(meters: Option<f64>) -> String {
    meters
        .filter(|m| m.is_finite())
        .map(|m| format!("{} m", m.round() as i64))
        .unwrap_or_default()
}

/// Calendar part of an ISO timestamp
pub fn fmt_date(iso: Option<&str>) -> String {
    iso.map(|s| s.chars().take(10).collect()).unwrap_or_default()
}
