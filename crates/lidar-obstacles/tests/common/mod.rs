#![allow(dead_code)]

use lidar_obstacles::{FrameParams, Point, PointSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const GROUND_POINTS: usize = 1000;
pub const CUBE_POINTS: usize = 50;
pub const CUBE_EDGE: f32 = 0.3;
pub const CUBE_CENTERS: [[f32; 3]; 2] = [[2.0, 1.0, 1.0], [5.0, -1.0, 2.0]];

/// Flat, slightly noisy ground patch with two small cubes floating above it.
///
/// The ground is a 40 x 25 lattice at 0.25 m spacing with +-0.01 m of z noise.
pub fn street_scene(seed: u64) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = PointSet::with_capacity(GROUND_POINTS + 2 * CUBE_POINTS);
    for i in 0..40 {
        for j in 0..25 {
            set.push(Point::new(
                i as f32 * 0.25,
                -3.0 + j as f32 * 0.25,
                rng.random_range(-0.01..0.01),
            ));
        }
    }
    let half = CUBE_EDGE / 2.0;
    for c in CUBE_CENTERS {
        for _ in 0..CUBE_POINTS {
            set.push(Point::with_intensity(
                c[0] + rng.random_range(-half..half),
                c[1] + rng.random_range(-half..half),
                c[2] + rng.random_range(-half..half),
                rng.random_range(0.0..1.0),
            ));
        }
    }
    set
}

/// Parameters tuned for [`street_scene`]: a voxel fine enough to keep every point.
pub fn street_params() -> FrameParams {
    let mut params = FrameParams::default();
    params.filter.voxel_size = 0.001;
    params.ground.max_iterations = 200;
    params.ground.distance_threshold = 0.05;
    params.cluster.tolerance = 0.5;
    params.cluster.min_size = 10;
    params.cluster.max_size = 200;
    params
}
