//! Strava Heatmap - analytics engine for a personal activity dashboard
//!
//! The engine turns static activity exports into the derived views of the
//! dashboard: map bounds and heat points, a rolling 7-day distance series,
//! monthly and weekly totals, streaks, a weekday profile and personal-best
//! route previews.
//!
//! ## Modules
//!
//! - **Inputs**: [`schema`] parses the GeoJSON collection and the stats,
//!   personal-best and run-index documents; [`loader`] reads them from disk
//! - **Time**: [`time`] buckets instants into days, ISO weeks and months in a
//!   named zone and computes range cutoffs
//! - **Views**: [`rolling`], [`aggregate`], [`streak`], [`weekday`],
//!   [`geometry`], [`insights`], [`bests`], [`runs`]
//! - **State**: [`dashboard::Dashboard`] holds the loaded resources, the
//!   filter selection and memoized views

pub mod aggregate;
pub mod bests;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod format;
pub mod geometry;
pub mod insights;
pub mod loader;
pub mod preview;
pub mod rolling;
pub mod runs;
pub mod schema;
pub mod streak;
pub mod time;
pub mod types;
pub mod weekday;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DerivedViews, InsightsSnapshot, Origin, ResourceKind};
pub use error::InsightsError;
pub use filter::{ActivityFilter, FilterOptions, Selection};
pub use loader::{load_into, LoadReport, ResourcePaths};
pub use preview::{svg_path, Canvas, MapPreview, Preview};
pub use streak::{StreakDetector, StreakSummary};
pub use time::{RangeSelector, Timezone};
pub use types::{Activity, Bounds, HeatPoint, LatLng};

// Schema exports
pub use schema::{FeatureAdapter, PersonalBests, RunIndexEntry, StatsSummary};

/// Engine version reported by the CLI and FFI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
