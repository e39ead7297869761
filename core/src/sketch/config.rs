use super::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Tunables for planning and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Clip line parameters to the segment's [0,1] domain when intersecting.
    pub clip_segments: bool,
    /// When nothing known touches a free cluster, pin its seed edge at the
    /// current position so the rest of the cluster can still be built.
    pub anchor_floating_clusters: bool,
    /// In a pair composition between two free entities, solve the one that
    /// is not being dragged.
    pub prefer_unmoved_as_unknown: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            clip_segments: true,
            anchor_floating_clusters: true,
            prefer_unmoved_as_unknown: true,
        }
    }
}

impl SolverConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_clip_segments(mut self, clip: bool) -> Self {
        self.clip_segments = clip;
        self
    }

    pub fn with_anchor_floating_clusters(mut self, anchor: bool) -> Self {
        self.anchor_floating_clusters = anchor;
        self
    }
}
