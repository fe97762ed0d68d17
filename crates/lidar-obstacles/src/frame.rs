use std::fmt;
use std::time::{Duration, Instant};

use lidar_obstacles_cluster::{
    extract_clusters, fit_aabb, fit_oriented_box, ClusterError, ClusterParams,
};
use lidar_obstacles_core::{Aabb, Cluster, ConfigError, OrientedBox, PointSet};
use lidar_obstacles_filter::{filter_region, RegionFilterParams};
use lidar_obstacles_ground::{segment_plane, PlaneSegmentParams, PlaneSegmentation, SampleSource};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of every stage, as loaded from a JSON config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameParams {
    pub filter: RegionFilterParams,
    pub ground: PlaneSegmentParams,
    pub cluster: ClusterParams,
    /// Also fit a yaw-aligned box per cluster.
    pub fit_oriented_boxes: bool,
}

impl FrameParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter.validate()?;
        self.ground.validate()?;
        self.cluster.validate()
    }
}

/// Progress of one frame through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameStage {
    Raw,
    Filtered,
    Segmented,
    Clustered,
    Boxed,
    Done,
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameStage::Raw => "raw",
            FrameStage::Filtered => "filtered",
            FrameStage::Segmented => "segmented",
            FrameStage::Clustered => "clustered",
            FrameStage::Boxed => "boxed",
            FrameStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Why a frame was aborted. No partial result is ever returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("invalid configuration before the {stage} stage: {source}")]
    InvalidConfiguration {
        stage: FrameStage,
        #[source]
        source: ConfigError,
    },
    #[error("clustering failed: {0}")]
    Clustering(#[source] ClusterError),
    #[error("box fit failed for cluster {cluster}: {source}")]
    BoundingBox {
        cluster: usize,
        #[source]
        source: ClusterError,
    },
}

impl FrameError {
    /// The stage the frame failed to reach.
    pub fn stage(&self) -> FrameStage {
        match self {
            FrameError::InvalidConfiguration { stage, .. } => *stage,
            FrameError::Clustering(_) => FrameStage::Clustered,
            FrameError::BoundingBox { .. } => FrameStage::Boxed,
        }
    }
}

/// Wall-clock duration of each stage of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub filter: Duration,
    pub segment: Duration,
    pub cluster: Duration,
    pub boxes: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.filter + self.segment + self.cluster + self.boxes
    }
}

/// Everything produced for one frame.
///
/// Cluster indices refer to `segmentation.outliers`; `boxes[i]` (and
/// `oriented_boxes[i]` when requested) belongs to `clusters[i]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameResult {
    pub filtered: PointSet,
    pub segmentation: PlaneSegmentation,
    pub clusters: Vec<Cluster>,
    pub boxes: Vec<Aabb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oriented_boxes: Option<Vec<OrientedBox>>,
    pub timings: StageTimings,
}

impl FrameResult {
    /// The obstacle points, i.e. everything off the ground plane.
    pub fn obstacle_points(&self) -> &PointSet {
        &self.segmentation.outliers
    }

    /// Clusters paired with their boxes.
    pub fn obstacles(&self) -> impl Iterator<Item = (&Cluster, &Aabb)> {
        self.clusters.iter().zip(&self.boxes)
    }

    /// Copy of the points of cluster `index`.
    pub fn cluster_points(&self, index: usize) -> Option<PointSet> {
        self.clusters
            .get(index)
            .map(|c| c.to_point_set(&self.segmentation.outliers))
    }
}

/// Runs the full pipeline on independent frames.
#[derive(Clone, Debug)]
pub struct FrameProcessor {
    params: FrameParams,
}

impl FrameProcessor {
    /// Validate every parameter up front.
    pub fn new(params: FrameParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FrameParams {
        &self.params
    }

    /// Process one frame with a generator seeded from `ground.seed`.
    pub fn process(&self, input: &PointSet) -> Result<FrameResult, FrameError> {
        let mut rng = StdRng::seed_from_u64(self.params.ground.seed);
        self.process_with_rng(input, &mut rng)
    }

    /// Process one frame, drawing RANSAC samples from `rng`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, input, rng), fields(points = input.len()))
    )]
    pub fn process_with_rng<S: SampleSource + ?Sized>(
        &self,
        input: &PointSet,
        rng: &mut S,
    ) -> Result<FrameResult, FrameError> {
        let params = &self.params;
        let mut timings = StageTimings::default();

        let t = Instant::now();
        let filtered = filter_region(input, &params.filter).map_err(|source| {
            FrameError::InvalidConfiguration {
                stage: FrameStage::Filtered,
                source,
            }
        })?;
        timings.filter = t.elapsed();
        log_stage(FrameStage::Filtered, timings.filter, filtered.len());

        let t = Instant::now();
        let segmentation = segment_plane(&filtered, &params.ground, rng).map_err(|source| {
            FrameError::InvalidConfiguration {
                stage: FrameStage::Segmented,
                source,
            }
        })?;
        timings.segment = t.elapsed();
        log_stage(
            FrameStage::Segmented,
            timings.segment,
            segmentation.outliers.len(),
        );

        let t = Instant::now();
        let clusters =
            extract_clusters(&segmentation.outliers, &params.cluster).map_err(FrameError::Clustering)?;
        timings.cluster = t.elapsed();
        log_stage(FrameStage::Clustered, timings.cluster, clusters.len());

        let t = Instant::now();
        let obstacles = &segmentation.outliers;
        let boxes = clusters
            .iter()
            .enumerate()
            .map(|(i, c)| {
                fit_aabb(obstacles, c).map_err(|source| FrameError::BoundingBox { cluster: i, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let oriented_boxes = if params.fit_oriented_boxes {
            let fitted = clusters
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    fit_oriented_box(obstacles, c)
                        .map_err(|source| FrameError::BoundingBox { cluster: i, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(fitted)
        } else {
            None
        };
        timings.boxes = t.elapsed();
        log_stage(FrameStage::Boxed, timings.boxes, boxes.len());

        debug!(
            "frame done: {} points -> {} filtered -> {} ground, {} obstacles in {:?}",
            input.len(),
            filtered.len(),
            segmentation.inliers.len(),
            clusters.len(),
            timings.total()
        );

        Ok(FrameResult {
            filtered,
            segmentation,
            clusters,
            boxes,
            oriented_boxes,
            timings,
        })
    }

    /// Process independent frames; frame `i` is seeded with `ground.seed + i`.
    ///
    /// With the `rayon` feature frames run in parallel. Results keep input order.
    pub fn process_batch(&self, frames: &[PointSet]) -> Vec<Result<FrameResult, FrameError>> {
        let run = |(i, frame): (usize, &PointSet)| {
            let seed = self.params.ground.seed.wrapping_add(i as u64);
            let mut rng = StdRng::seed_from_u64(seed);
            self.process_with_rng(frame, &mut rng)
        };

        #[cfg(feature = "rayon")]
        {
            frames.par_iter().enumerate().map(run).collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            frames.iter().enumerate().map(run).collect()
        }
    }
}

fn log_stage(stage: FrameStage, elapsed: Duration, count: usize) {
    debug!("stage {stage}: {count} items in {elapsed:?}");
}
