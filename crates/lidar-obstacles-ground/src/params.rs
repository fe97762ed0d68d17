use lidar_obstacles_core::{require_non_negative, ConfigError};
use serde::{Deserialize, Serialize};

/// RANSAC plane fitting parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneSegmentParams {
    /// Number of sampled triples, degenerate ones included.
    pub max_iterations: usize,
    /// Maximum point-to-plane distance (metres) for an inlier.
    pub distance_threshold: f32,
    /// Seed for [`crate::segment_plane_seeded`].
    pub seed: u64,
}

impl Default for PlaneSegmentParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            distance_threshold: 0.2,
            seed: 0x5eed,
        }
    }
}

impl PlaneSegmentParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Zero {
                name: "max_iterations",
            });
        }
        require_non_negative("distance_threshold", self.distance_threshold)
    }
}
