use lidar_obstacles_core::{require_positive, ConfigError};
use serde::{Deserialize, Serialize};

/// Euclidean clustering parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Maximum gap (metres) between neighbouring points of one cluster.
    pub tolerance: f32,
    /// Smallest cluster kept, inclusive.
    pub min_size: usize,
    /// Largest cluster kept, inclusive.
    pub max_size: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            tolerance: 2.0,
            min_size: 10,
            max_size: 2000,
        }
    }
}

impl ClusterParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("tolerance", self.tolerance)?;
        if self.min_size > self.max_size {
            return Err(ConfigError::InvertedSizeRange {
                min: self.min_size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    /// Whether a region of `len` points is kept.
    #[inline]
    pub fn accepts(&self, len: usize) -> bool {
        (self.min_size..=self.max_size).contains(&len)
    }
}
