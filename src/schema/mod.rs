//! Input resource schemas
//!
//! This module defines the shapes of the four static resources the dashboard
//! reads and normalizes GeoJSON activity features into canonical records.

mod feature;
mod resources;

pub use feature::*;
pub use resources::*;
