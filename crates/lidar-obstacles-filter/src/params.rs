use lidar_obstacles_core::{require_positive, Aabb, ConfigError};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Parameters of the region filter stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionFilterParams {
    /// Voxel edge length in metres. Positional error is at most half of it.
    pub voxel_size: f32,
    /// Region of interest; points outside are discarded before voxelization.
    pub crop: Aabb,
    /// Returns from the ego vehicle itself (e.g. the roof around the sensor).
    pub ego_exclusion: Option<Aabb>,
}

impl Default for RegionFilterParams {
    fn default() -> Self {
        Self {
            voxel_size: 0.5,
            crop: Aabb::new(Point3::new(-10.0, -5.0, -3.0), Point3::new(30.0, 5.0, 5.0)),
            ego_exclusion: None,
        }
    }
}

impl RegionFilterParams {
    /// Roof box of a sensor mounted ~1.7 m above the road, in sensor coordinates.
    pub fn ego_roof() -> Aabb {
        Aabb::new(Point3::new(-1.5, -1.7, -1.0), Point3::new(2.6, 1.7, -0.4))
    }

    pub fn with_ego_exclusion(mut self, ego: Aabb) -> Self {
        self.ego_exclusion = Some(ego);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("voxel_size", self.voxel_size)?;
        self.crop.validate("crop")?;
        if let Some(ego) = &self.ego_exclusion {
            ego.validate("ego_exclusion")?;
        }
        Ok(())
    }
}
