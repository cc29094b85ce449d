//! FFI bindings for the heatmap analytics engine
//!
//! C-compatible functions for embedding the engine in other runtimes. All
//! strings are null-terminated UTF-8. Returned strings are allocated here and
//! must be released with `heatmap_free_string`.

use log::warn;
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::error::InsightsError;
use crate::filter::ActivityFilter;
use crate::preview::{svg_path, Canvas, DEFAULT_PRECISION};
use crate::time::{parse_day_key, RangeSelector};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Caller must free
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a result across the boundary: a new string, or NULL with the error recorded
fn result_to_cstr(result: Result<String, InsightsError>) -> *mut c_char {
    match result {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Build a snapshot for `today` (or the current local date when NULL)
fn snapshot_json(dashboard: &mut Dashboard, today: Option<String>) -> Result<String, InsightsError> {
    let snapshot = match today {
        Some(day) => dashboard.snapshot(parse_day_key(&day)?),
        None => dashboard.snapshot_now(),
    };
    snapshot.to_json()
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute the insights snapshot for a GeoJSON collection.
///
/// # Safety
/// - `geojson` must be a valid null-terminated C string.
/// - `stats_json` and `today` may be NULL. `today` is `"YYYY-MM-DD"`.
/// - Malformed `stats_json` is logged and skipped; the snapshot has no summary.
/// - Returns a newly allocated string that must be freed with `heatmap_free_string`.
/// - Returns NULL on error; call `heatmap_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn heatmap_insights_json(
    geojson: *const c_char,
    stats_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let geojson_str = match cstr_to_string(geojson) {
        Some(s) => s,
        None => {
            set_last_error("Invalid GeoJSON string pointer");
            return ptr::null_mut();
        }
    };
    let stats_str = cstr_to_string(stats_json);
    let today_str = cstr_to_string(today);

    let mut dashboard = Dashboard::new();
    if let Err(e) = dashboard.load_activities(&geojson_str) {
        set_last_error(&e.to_string());
        return ptr::null_mut();
    }
    // Stats only feed the summary views; a bad document leaves them empty
    if let Some(stats) = stats_str {
        if let Err(e) = dashboard.load_stats(&stats) {
            warn!("ignoring stats: {e}");
        }
    }
    result_to_cstr(snapshot_json(&mut dashboard, today_str))
}

/// Decode an encoded polyline and project it to SVG path data.
///
/// Non-positive `width`/`height` fall back to the default canvas; a
/// `precision` of 0 means 5.
///
/// # Safety
/// - `encoded` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `heatmap_free_string`.
/// - Returns NULL on error; call `heatmap_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn heatmap_polyline_svg_path(
    encoded: *const c_char,
    width: f64,
    height: f64,
    padding: f64,
    precision: u32,
) -> *mut c_char {
    clear_last_error();

    let encoded_str = match cstr_to_string(encoded) {
        Some(s) => s,
        None => {
            set_last_error("Invalid polyline string pointer");
            return ptr::null_mut();
        }
    };

    let canvas = if width > 0.0 && height > 0.0 {
        Canvas {
            width,
            height,
            padding: padding.max(0.0),
        }
    } else {
        Canvas::default()
    };
    let precision = if precision == 0 {
        DEFAULT_PRECISION
    } else {
        precision
    };

    result_to_cstr(svg_path(&encoded_str, precision, &canvas))
}

// ============================================================================
// Stateful Dashboard API
// ============================================================================

/// Opaque handle to a Dashboard
pub struct DashboardHandle {
    dashboard: Dashboard,
}

/// Create a dashboard from a JSON configuration.
///
/// # Safety
/// - `config_json` may be NULL for the default configuration.
/// - Must be freed with `heatmap_dashboard_free`.
/// - Returns NULL on error; call `heatmap_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn heatmap_dashboard_new(config_json: *const c_char) -> *mut DashboardHandle {
    clear_last_error();

    let config = match cstr_to_string(config_json) {
        Some(json) => match DashboardConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        None => DashboardConfig::default(),
    };

    Box::into_raw(Box::new(DashboardHandle {
        dashboard: Dashboard::with_config(config),
    }))
}

/// Free a dashboard.
///
/// # Safety
/// - `handle` must be a pointer returned by `heatmap_dashboard_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn heatmap_dashboard_free(handle: *mut DashboardHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Load one resource into a dashboard.
///
/// `resource` is one of `"activities"`, `"stats"`, `"personal_bests"`,
/// `"run_index"` or `"override"` (a user-supplied activity file).
///
/// # Safety
/// - `handle` must be a valid pointer returned by `heatmap_dashboard_new`.
/// - `resource` and `json` must be valid null-terminated C strings.
/// - Returns 1 when stored, 0 when ignored in favour of a user override,
///   -1 on error (call `heatmap_last_error`).
#[no_mangle]
pub unsafe extern "C" fn heatmap_dashboard_load(
    handle: *mut DashboardHandle,
    resource: *const c_char,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null dashboard pointer");
        return -1;
    }
    let handle = &mut *handle;

    let (resource_str, json_str) = match (cstr_to_string(resource), cstr_to_string(json)) {
        (Some(r), Some(j)) => (r, j),
        _ => {
            set_last_error("Invalid resource or JSON string pointer");
            return -1;
        }
    };

    let dashboard = &mut handle.dashboard;
    let result = match resource_str.as_str() {
        "activities" => dashboard.load_activities(&json_str),
        "stats" => dashboard.load_stats(&json_str),
        "personal_bests" => dashboard.load_personal_bests(&json_str),
        "run_index" => dashboard.load_run_index(&json_str),
        "override" => dashboard.load_override(&json_str).map(|_| true),
        other => Err(InsightsError::ParseError(format!("unknown resource {other:?}"))),
    };

    match result {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Set the filter and range selection.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `heatmap_dashboard_new`.
/// - `filter_json` may be NULL to keep the current filter.
/// - `range` may be NULL to keep the current range (`"1m"`, `"3m"`, `"6m"`, `"12m"`, `"all"`).
/// - Returns 0 on success, -1 on error (call `heatmap_last_error`).
#[no_mangle]
pub unsafe extern "C" fn heatmap_dashboard_select(
    handle: *mut DashboardHandle,
    filter_json: *const c_char,
    range: *const c_char,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null dashboard pointer");
        return -1;
    }
    let handle = &mut *handle;

    let filter = match cstr_to_string(filter_json)
        .map(|json| serde_json::from_str::<ActivityFilter>(&json))
        .transpose()
    {
        Ok(filter) => filter,
        Err(e) => {
            set_last_error(&InsightsError::from(e).to_string());
            return -1;
        }
    };
    let range = match cstr_to_string(range)
        .map(|r| r.parse::<RangeSelector>())
        .transpose()
    {
        Ok(range) => range,
        Err(e) => {
            set_last_error(&e.to_string());
            return -1;
        }
    };

    if let Some(filter) = filter {
        handle.dashboard.set_filter(filter);
    }
    if let Some(range) = range {
        handle.dashboard.set_range(range);
    }
    0
}

/// Snapshot of every derived view.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `heatmap_dashboard_new`.
/// - `today` may be NULL for the current local date, else `"YYYY-MM-DD"`.
/// - Returns a newly allocated string that must be freed with `heatmap_free_string`.
/// - Returns NULL on error; call `heatmap_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn heatmap_dashboard_snapshot(
    handle: *mut DashboardHandle,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null dashboard pointer");
        return ptr::null_mut();
    }
    let handle = &mut *handle;

    result_to_cstr(snapshot_json(&mut handle.dashboard, cstr_to_string(today)))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by this library.
///
/// # Safety
/// - `ptr` must be a pointer returned by a `heatmap_` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn heatmap_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is valid until the next `heatmap_` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn heatmap_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn heatmap_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn collection() -> CString {
        CString::new(
            r#"{ "type": "FeatureCollection", "features": [
                { "type": "Feature",
                  "geometry": { "type": "LineString", "coordinates": [[174.70, -36.90], [174.80, -36.80]] },
                  "properties": { "id": 1, "type": "Run", "start_date": "2024-03-01T18:00:00Z", "distance_m": 5000 } }
            ] }"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        heatmap_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_insights_json() {
        let geojson = collection();
        let today = CString::new("2024-03-03").unwrap();
        unsafe {
            let result = heatmap_insights_json(geojson.as_ptr(), ptr::null(), today.as_ptr());
            let json: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(json["activity_count"], 1);
            assert_eq!(json["today"], "2024-03-03");
        }
    }

    #[test]
    fn test_ffi_insights_json_skips_bad_stats() {
        let geojson = collection();
        let stats = CString::new("{ broken").unwrap();
        let today = CString::new("2024-03-03").unwrap();
        unsafe {
            let result = heatmap_insights_json(geojson.as_ptr(), stats.as_ptr(), today.as_ptr());
            let json: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(json["activity_count"], 1);
            assert!(json["summary"].is_null());
        }
    }

    #[test]
    fn test_ffi_polyline_svg_path() {
        let encoded = CString::new("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        unsafe {
            let path = take_string(heatmap_polyline_svg_path(encoded.as_ptr(), 0.0, 0.0, 0.0, 0));
            assert!(path.starts_with('M'));

            let bad = CString::new("abc def").unwrap();
            let result = heatmap_polyline_svg_path(bad.as_ptr(), 100.0, 100.0, 5.0, 5);
            assert!(result.is_null());
            assert!(!heatmap_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_dashboard_lifecycle() {
        unsafe {
            let handle = heatmap_dashboard_new(ptr::null());
            assert!(!handle.is_null());

            let resource = CString::new("activities").unwrap();
            let geojson = collection();
            assert_eq!(heatmap_dashboard_load(handle, resource.as_ptr(), geojson.as_ptr()), 1);

            let filter = CString::new(r#"{"activity_type": {"only": "Ride"}}"#).unwrap();
            let range = CString::new("3m").unwrap();
            assert_eq!(heatmap_dashboard_select(handle, filter.as_ptr(), range.as_ptr()), 0);

            let today = CString::new("2024-03-03").unwrap();
            let snapshot = take_string(heatmap_dashboard_snapshot(handle, today.as_ptr()));
            let json: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
            assert_eq!(json["filtered_count"], 0);
            assert_eq!(json["range"], "3m");

            heatmap_dashboard_free(handle);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = heatmap_insights_json(invalid.as_ptr(), ptr::null(), ptr::null());
            assert!(result.is_null());

            let error = heatmap_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());

            let handle = heatmap_dashboard_new(ptr::null());
            let range = CString::new("2w").unwrap();
            assert_eq!(heatmap_dashboard_select(handle, ptr::null(), range.as_ptr()), -1);
            heatmap_dashboard_free(handle);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = heatmap_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
