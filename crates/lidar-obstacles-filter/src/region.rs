use std::collections::HashMap;

use lidar_obstacles_core::{require_positive, Aabb, ConfigError, Point, PointSet};
use log::debug;
use nalgebra::Point3;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::RegionFilterParams;

/// Crop, voxel-downsample and ego-filter one frame.
///
/// Parameters are validated before any point is read, so an invalid
/// configuration fails even on an empty frame. Output order follows the
/// first point that landed in each voxel.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(input, params), fields(points = input.len(), voxel = params.voxel_size))
)]
pub fn filter_region(
    input: &PointSet,
    params: &RegionFilterParams,
) -> Result<PointSet, ConfigError> {
    params.validate()?;

    let mut grid = VoxelGrid::new(params.voxel_size, input.len());
    let mut in_region = 0usize;
    for p in input.iter().filter(|p| params.crop.contains(&p.position)) {
        grid.insert(p);
        in_region += 1;
    }
    let voxels = grid.len();

    let out: PointSet = match &params.ego_exclusion {
        Some(ego) => grid
            .into_points()
            .filter(|p| !ego.contains(&p.position))
            .collect(),
        None => grid.into_points().collect(),
    };

    debug!(
        "region filter: {} points, {} in region, {} voxels, {} kept",
        input.len(),
        in_region,
        voxels,
        out.len()
    );
    Ok(out)
}

/// Keep the points inside the closed box `region`.
pub fn crop(input: &PointSet, region: &Aabb) -> Result<PointSet, ConfigError> {
    region.validate("crop")?;
    Ok(input
        .iter()
        .filter(|p| region.contains(&p.position))
        .copied()
        .collect())
}

/// Replace the points of every occupied voxel by their centroid.
pub fn voxel_downsample(input: &PointSet, voxel_size: f32) -> Result<PointSet, ConfigError> {
    require_positive("voxel_size", voxel_size)?;
    let mut grid = VoxelGrid::new(voxel_size, input.len());
    for p in input {
        grid.insert(p);
    }
    Ok(grid.into_points().collect())
}

#[derive(Clone, Copy, Debug, Default)]
struct VoxelAccum {
    sum: [f64; 3],
    count: u32,
    intensity_sum: f64,
    intensity_count: u32,
}

impl VoxelAccum {
    fn centroid(&self) -> Point {
        let n = f64::from(self.count);
        let intensity = (self.intensity_count > 0)
            .then(|| (self.intensity_sum / f64::from(self.intensity_count)) as f32);
        Point {
            position: Point3::new(
                (self.sum[0] / n) as f32,
                (self.sum[1] / n) as f32,
                (self.sum[2] / n) as f32,
            ),
            intensity,
        }
    }
}

/// Sparse voxel grid keyed by integer cell coordinates.
struct VoxelGrid {
    voxel_size: f64,
    slots: HashMap<[i64; 3], usize>,
    cells: Vec<VoxelAccum>,
}

impl VoxelGrid {
    fn new(voxel_size: f32, capacity_hint: usize) -> Self {
        // Occupancy is usually a small fraction of the raw point count.
        let capacity = capacity_hint / 4;
        Self {
            voxel_size: f64::from(voxel_size),
            slots: HashMap::with_capacity(capacity),
            cells: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn key(&self, p: &Point3<f32>) -> [i64; 3] {
        [
            (f64::from(p.x) / self.voxel_size).floor() as i64,
            (f64::from(p.y) / self.voxel_size).floor() as i64,
            (f64::from(p.z) / self.voxel_size).floor() as i64,
        ]
    }

    fn insert(&mut self, p: &Point) {
        let key = self.key(&p.position);
        let next = self.cells.len();
        let slot = *self.slots.entry(key).or_insert(next);
        if slot == next {
            self.cells.push(VoxelAccum::default());
        }
        let cell = &mut self.cells[slot];
        cell.sum[0] += f64::from(p.position.x);
        cell.sum[1] += f64::from(p.position.y);
        cell.sum[2] += f64::from(p.position.z);
        cell.count += 1;
        if let Some(i) = p.intensity {
            cell.intensity_sum += f64::from(i);
            cell.intensity_count += 1;
        }
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn into_points(self) -> impl Iterator<Item = Point> {
        self.cells.into_iter().map(|c| c.centroid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn params(voxel_size: f32) -> RegionFilterParams {
        RegionFilterParams {
            voxel_size,
            crop: Aabb::new(Point3::new(-10.0, -5.0, -3.0), Point3::new(30.0, 5.0, 5.0)),
            ego_exclusion: None,
        }
    }

    fn random_scan(n: usize, seed: u64) -> PointSet {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Point::with_intensity(
                    rng.random_range(-15.0..35.0),
                    rng.random_range(-8.0..8.0),
                    rng.random_range(-4.0..6.0),
                    rng.random_range(0.0..1.0),
                )
            })
            .collect()
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let out = filter_region(&PointSet::new(), &params(0.5)).expect("filter");
        assert!(out.is_empty());
    }

    #[test]
    fn invalid_configuration_fails_fast() {
        assert!(matches!(
            filter_region(&PointSet::new(), &params(0.0)),
            Err(ConfigError::NonPositive {
                name: "voxel_size",
                ..
            })
        ));
        assert!(filter_region(&PointSet::new(), &params(-0.5)).is_err());

        let mut inverted = params(0.5);
        inverted.crop.min.x = 40.0;
        assert!(matches!(
            filter_region(&random_scan(10, 1), &inverted),
            Err(ConfigError::InvertedBounds { axis: 'x', .. })
        ));
    }

    #[test]
    fn voxel_emits_centroid_and_mean_intensity() {
        let input: PointSet = vec![
            Point::with_intensity(0.1, 0.1, 0.1, 0.2),
            Point::new(0.3, 0.3, 0.3),
            Point::with_intensity(0.2, 0.4, 0.2, 0.6),
        ]
        .into();
        let out = filter_region(&input, &params(0.5)).expect("filter");
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].position.x, 0.2, epsilon = 1e-6);
        assert_relative_eq!(out[0].position.y, 0.8 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(out[0].intensity.expect("intensity"), 0.4, epsilon = 1e-6);
    }

    #[test]
    fn negative_coordinates_use_floor_cells() {
        let input: PointSet = vec![Point::new(-0.1, 0.0, 0.0), Point::new(0.1, 0.0, 0.0)].into();
        let out = voxel_downsample(&input, 0.5).expect("downsample");
        assert_eq!(out.len(), 2);
        assert!(out[0].intensity.is_none());
    }

    #[test]
    fn output_follows_first_occupancy() {
        let input: PointSet = vec![
            Point::new(5.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(5.1, 0.0, 0.0),
            Point::new(3.0, 0.0, 0.0),
        ]
        .into();
        let out = filter_region(&input, &params(0.5)).expect("filter");
        let xs: Vec<f32> = out.iter().map(|p| p.position.x).collect();
        assert_eq!(xs.len(), 3);
        assert_relative_eq!(xs[0], 5.05, epsilon = 1e-6);
        assert_relative_eq!(xs[1], 1.0);
        assert_relative_eq!(xs[2], 3.0);
    }

    #[test]
    fn crop_is_closed_and_applied_before_voxelization() {
        // 30.0 and 30.2 share the voxel [30, 31); only 30.0 is inside the region.
        let input: PointSet = vec![
            Point::new(29.6, 0.0, 0.0),
            Point::new(30.0, 0.0, 0.0),
            Point::new(30.2, 0.0, 0.0),
        ]
        .into();
        let out = filter_region(&input, &params(1.0)).expect("filter");
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].position.x, 29.6);
        assert_relative_eq!(out[1].position.x, 30.0);

        let cropped = crop(&input, &params(1.0).crop).expect("crop");
        assert_eq!(cropped.len(), 2);
    }

    #[test]
    fn one_point_per_voxel_and_inside_region() {
        let p = params(0.4);
        let out = filter_region(&random_scan(5_000, 3), &p).expect("filter");
        let grid = VoxelGrid::new(p.voxel_size, 0);
        let mut seen = HashSet::new();
        for q in &out {
            assert!(p.crop.contains(&q.position));
            assert!(seen.insert(grid.key(&q.position)), "two points in one voxel");
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let p = params(0.3).with_ego_exclusion(RegionFilterParams::ego_roof());
        let once = filter_region(&random_scan(8_000, 5), &p).expect("filter");
        let twice = filter_region(&once, &p).expect("filter");
        assert_eq!(once, twice);
    }

    #[test]
    fn ego_box_removes_roof_returns() {
        let input: PointSet = vec![
            Point::new(0.0, 0.0, -0.7), // on the roof
            Point::new(8.0, 0.0, -0.7),
        ]
        .into();
        let p = params(0.2).with_ego_exclusion(RegionFilterParams::ego_roof());
        let out = filter_region(&input, &p).expect("filter");
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].position.x, 8.0);
    }
}
