use lidar_obstacles_core::{ConfigError, PlaneModel, PointSet};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::sampling::{sample_distinct_triple, SampleSource};
use crate::PlaneSegmentParams;

/// Outcome of plane segmentation.
///
/// `inliers` and `outliers` partition the input and both keep input order.
/// `plane` is `None` when the input had fewer than three points or every
/// sampled triple was degenerate; all points are then outliers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneSegmentation {
    pub plane: Option<PlaneModel>,
    pub inliers: PointSet,
    pub outliers: PointSet,
    /// Positions of `inliers` in the input set, ascending.
    pub inlier_indices: Vec<usize>,
}

impl PlaneSegmentation {
    fn no_plane(input: &PointSet) -> Self {
        Self {
            plane: None,
            inliers: PointSet::new(),
            outliers: input.clone(),
            inlier_indices: Vec::new(),
        }
    }
}

/// RANSAC plane segmentation driven by `rng`.
///
/// Runs exactly `max_iterations` samples unless a candidate already explains
/// every point. A candidate replaces the current best only with a strictly
/// larger inlier count, so the earliest plane wins ties.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(input, params, rng), fields(points = input.len()))
)]
pub fn segment_plane<S: SampleSource + ?Sized>(
    input: &PointSet,
    params: &PlaneSegmentParams,
    rng: &mut S,
) -> Result<PlaneSegmentation, ConfigError> {
    params.validate()?;

    let n = input.len();
    if n < 3 {
        warn!("plane segmentation: {n} points, need at least 3; no plane");
        return Ok(PlaneSegmentation::no_plane(input));
    }

    let mut best: Option<(PlaneModel, usize)> = None;
    let mut degenerate = 0usize;
    for _ in 0..params.max_iterations {
        let [i, j, k] = sample_distinct_triple(rng, n);
        let Some(candidate) = PlaneModel::from_points(
            &input[i].position,
            &input[j].position,
            &input[k].position,
            params.distance_threshold,
        ) else {
            degenerate += 1;
            continue;
        };

        let count = count_inliers(input, &candidate);
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((candidate, count));
            if count == n {
                break;
            }
        }
    }

    let Some((plane, count)) = best else {
        warn!(
            "plane segmentation: all {} samples were degenerate; no plane",
            params.max_iterations
        );
        return Ok(PlaneSegmentation::no_plane(input));
    };

    let mut inlier_indices = Vec::with_capacity(count);
    let mut inliers = PointSet::with_capacity(count);
    let mut outliers = PointSet::with_capacity(n - count);
    for (idx, p) in input.iter().enumerate() {
        if plane.is_inlier(&p.position) {
            inlier_indices.push(idx);
            inliers.push(*p);
        } else {
            outliers.push(*p);
        }
    }

    debug!(
        "plane segmentation: {} inliers, {} outliers, {} degenerate samples, plane {:?}",
        inliers.len(),
        outliers.len(),
        degenerate,
        plane.coefficients()
    );

    Ok(PlaneSegmentation {
        plane: Some(plane),
        inliers,
        outliers,
        inlier_indices,
    })
}

/// [`segment_plane`] with a [`StdRng`] seeded from `params.seed`.
pub fn segment_plane_seeded(
    input: &PointSet,
    params: &PlaneSegmentParams,
) -> Result<PlaneSegmentation, ConfigError> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    segment_plane(input, params, &mut rng)
}

#[cfg(not(feature = "rayon"))]
fn count_inliers(input: &PointSet, plane: &PlaneModel) -> usize {
    input
        .iter()
        .filter(|p| plane.is_inlier(&p.position))
        .count()
}

#[cfg(feature = "rayon")]
fn count_inliers(input: &PointSet, plane: &PlaneModel) -> usize {
    input
        .as_slice()
        .par_iter()
        .filter(|p| plane.is_inlier(&p.position))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lidar_obstacles_core::Point;
    use rand::Rng;

    /// Replays a fixed list of draws.
    struct Scripted {
        draws: Vec<usize>,
        next: usize,
    }

    impl Scripted {
        fn new(draws: &[usize]) -> Self {
            Self {
                draws: draws.to_vec(),
                next: 0,
            }
        }
    }

    impl SampleSource for Scripted {
        fn sample_index(&mut self, len: usize) -> usize {
            let v = self.draws[self.next % self.draws.len()];
            self.next += 1;
            assert!(v < len, "scripted draw {v} out of 0..{len}");
            v
        }
    }

    fn params(max_iterations: usize, distance_threshold: f32) -> PlaneSegmentParams {
        PlaneSegmentParams {
            max_iterations,
            distance_threshold,
            seed: 42,
        }
    }

    /// Indices 0..4 lie on z = 0, indices 4..8 on x = 10; each plane holds four points.
    fn ground_and_wall() -> PointSet {
        vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(0.0, 2.0, 0.0),
            Point::new(2.0, 2.0, 0.0),
            Point::new(10.0, 0.0, 1.0),
            Point::new(10.0, 2.0, 1.0),
            Point::new(10.0, 0.0, 3.0),
            Point::new(10.0, 2.0, 3.0),
        ]
        .into()
    }

    fn noisy_scene(seed: u64) -> PointSet {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut set = PointSet::new();
        for _ in 0..600 {
            set.push(Point::new(
                rng.random_range(-10.0..30.0),
                rng.random_range(-5.0..5.0),
                -1.6 + rng.random_range(-0.05..0.05),
            ));
        }
        for _ in 0..120 {
            set.push(Point::new(
                rng.random_range(5.0..7.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..0.5),
            ));
        }
        set
    }

    #[test]
    fn first_plane_wins_a_tie() {
        let input = ground_and_wall();

        // [4, 4, 4] resolves to the triple (4, 5, 6), then [0, 0, 0] to (0, 1, 2).
        let seg = segment_plane(&input, &params(2, 0.1), &mut Scripted::new(&[4, 4, 4, 0, 0, 0]))
            .expect("segment");
        let plane = seg.plane.expect("plane");
        assert_relative_eq!(plane.normal.x.abs(), 1.0, epsilon = 1e-6);
        assert_eq!(seg.inlier_indices, vec![4, 5, 6, 7]);

        let seg = segment_plane(&input, &params(2, 0.1), &mut Scripted::new(&[0, 0, 0, 4, 4, 4]))
            .expect("segment");
        let plane = seg.plane.expect("plane");
        assert_relative_eq!(plane.normal.z.abs(), 1.0, epsilon = 1e-6);
        assert_eq!(seg.inlier_indices, vec![0, 1, 2, 3]);
        assert_eq!(seg.outliers.len(), 4);
    }

    #[test]
    fn collinear_sample_consumes_an_iteration() {
        let input: PointSet = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ]
        .into();

        // A single iteration only sees the collinear triple (0, 1, 2).
        let seg = segment_plane(&input, &params(1, 0.1), &mut Scripted::new(&[0, 0, 0]))
            .expect("segment");
        assert!(seg.plane.is_none());
        assert!(seg.inliers.is_empty());
        assert_eq!(seg.outliers, input);

        // The second draw resolves to (0, 1, 3).
        let seg = segment_plane(&input, &params(2, 0.1), &mut Scripted::new(&[0, 0, 0, 0, 0, 1]))
            .expect("segment");
        assert!(seg.plane.is_some());
        assert_eq!(seg.inliers.len(), 4);
        assert!(seg.outliers.is_empty());
    }

    #[test]
    fn fewer_than_three_points_is_a_valid_empty_result() {
        let input: PointSet = vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0)].into();
        let seg = segment_plane_seeded(&input, &PlaneSegmentParams::default()).expect("segment");
        assert!(seg.plane.is_none());
        assert!(seg.inliers.is_empty());
        assert!(seg.inlier_indices.is_empty());
        assert_eq!(seg.outliers, input);

        let empty = segment_plane_seeded(&PointSet::new(), &PlaneSegmentParams::default())
            .expect("segment");
        assert!(empty.outliers.is_empty());
    }

    #[test]
    fn invalid_parameters_are_rejected_before_sampling() {
        let input = ground_and_wall();
        let mut never = Scripted::new(&[]);
        assert!(matches!(
            segment_plane(&input, &params(0, 0.2), &mut never),
            Err(ConfigError::Zero { .. })
        ));
        assert!(matches!(
            segment_plane(&input, &params(10, -0.2), &mut never),
            Err(ConfigError::Negative { .. })
        ));
        assert!(segment_plane(&input, &params(10, f32::NAN), &mut never).is_err());
    }

    #[test]
    fn partition_is_complete_and_respects_threshold() {
        let input = noisy_scene(7);
        let p = params(100, 0.2);
        let seg = segment_plane_seeded(&input, &p).expect("segment");
        let plane = seg.plane.expect("plane");

        assert_eq!(seg.inliers.len() + seg.outliers.len(), input.len());
        assert_eq!(seg.inlier_indices.len(), seg.inliers.len());
        assert!(seg.inlier_indices.windows(2).all(|w| w[0] < w[1]));
        for (&idx, q) in seg.inlier_indices.iter().zip(&seg.inliers) {
            assert_eq!(&input[idx], q);
            assert!(plane.distance(&q.position) <= p.distance_threshold);
        }
        for q in &seg.outliers {
            assert!(plane.distance(&q.position) > p.distance_threshold);
        }

        assert_relative_eq!(plane.normal.z.abs(), 1.0, epsilon = 0.02);
        assert!(seg.inliers.len() >= 540 && seg.inliers.len() <= 600);
    }

    #[test]
    fn same_seed_same_result() {
        let input = noisy_scene(11);
        let p = params(40, 0.1);
        let a = segment_plane_seeded(&input, &p).expect("segment");
        let b = segment_plane_seeded(&input, &p).expect("segment");
        assert_eq!(a, b);

        let mut rng = StdRng::seed_from_u64(p.seed);
        let c = segment_plane(&input, &p, &mut rng).expect("segment");
        assert_eq!(a, c);
    }

    #[test]
    fn zero_threshold_keeps_exact_plane_points() {
        let input = ground_and_wall();
        let seg = segment_plane(&input, &params(1, 0.0), &mut Scripted::new(&[0, 0, 0]))
            .expect("segment");
        assert_eq!(seg.inlier_indices, vec![0, 1, 2, 3]);
    }
}
