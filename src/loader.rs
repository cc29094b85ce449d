//! Static resource loading
//!
//! Each resource is read and parsed independently. A missing or unreadable
//! file never fails the whole load: the slot stays empty, a warning is
//! logged and the outcome is recorded in the [`LoadReport`].

use crate::dashboard::{Dashboard, ResourceKind};
use crate::error::InsightsError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ACTIVITIES_FILE: &str = "runs.geojson";
pub const STATS_FILE: &str = "stats.json";
pub const PERSONAL_BESTS_FILE: &str = "personal_bests.json";
pub const RUN_INDEX_FILE: &str = "runs_index.json";

/// Locations of the four resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePaths {
    pub activities: PathBuf,
    pub stats: PathBuf,
    pub personal_bests: PathBuf,
    pub run_index: PathBuf,
}

impl ResourcePaths {
    /// Standard file names under `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            activities: dir.join(ACTIVITIES_FILE),
            stats: dir.join(STATS_FILE),
            personal_bests: dir.join(PERSONAL_BESTS_FILE),
            run_index: dir.join(RUN_INDEX_FILE),
        }
    }

    pub fn path(&self, kind: ResourceKind) -> &Path {
        match kind {
            ResourceKind::Activities => &self.activities,
            ResourceKind::Stats => &self.stats,
            ResourceKind::PersonalBests => &self.personal_bests,
            ResourceKind::RunIndex => &self.run_index,
        }
    }
}

/// What happened to one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded,
    /// Parsed, but a user override already holds the slot
    Ignored,
    Missing,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOutcome {
    pub resource: ResourceKind,
    pub path: String,
    #[serde(flatten)]
    pub status: LoadStatus,
}

/// Per-resource outcomes of a load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub outcomes: Vec<ResourceOutcome>,
}

impl LoadReport {
    pub fn loaded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == LoadStatus::Loaded)
            .count()
    }

    /// True when every resource loaded
    pub fn is_complete(&self) -> bool {
        self.loaded_count() == self.outcomes.len()
    }

    pub fn status(&self, kind: ResourceKind) -> Option<&LoadStatus> {
        self.outcomes
            .iter()
            .find(|o| o.resource == kind)
            .map(|o| &o.status)
    }
}

/// Load every resource into `dashboard`
pub fn load_into(dashboard: &mut Dashboard, paths: &ResourcePaths) -> LoadReport {
    let outcomes = ResourceKind::ALL
        .iter()
        .map(|&kind| {
            let path = paths.path(kind);
            let status = load_one(dashboard, kind, path);
            match &status {
                LoadStatus::Loaded => info!("loaded {} from {}", kind.as_str(), path.display()),
                LoadStatus::Ignored => {
                    info!("kept user-supplied {}, skipped {}", kind.as_str(), path.display())
                }
                LoadStatus::Missing => warn!("{} not found at {}", kind.as_str(), path.display()),
                LoadStatus::Failed { reason } => {
                    warn!("failed to load {} from {}: {reason}", kind.as_str(), path.display())
                }
            }
            ResourceOutcome {
                resource: kind,
                path: path.display().to_string(),
                status,
            }
        })
        .collect();
    LoadReport { outcomes }
}

fn load_one(dashboard: &mut Dashboard, kind: ResourceKind, path: &Path) -> LoadStatus {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return LoadStatus::Missing,
        Err(e) => {
            return LoadStatus::Failed {
                reason: InsightsError::from(e).to_string(),
            }
        }
    };
    let stored = match kind {
        ResourceKind::Activities => dashboard.load_activities(&contents),
        ResourceKind::Stats => dashboard.load_stats(&contents),
        ResourceKind::PersonalBests => dashboard.load_personal_bests(&contents),
        ResourceKind::RunIndex => dashboard.load_run_index(&contents),
    };
    match stored {
        Ok(true) => LoadStatus::Loaded,
        Ok(false) => LoadStatus::Ignored,
        Err(e) => LoadStatus::Failed {
            reason: e.to_string(),
        },
    }
}
