//! Facade crate for the `lidar-obstacles-*` workspace.
//!
//! One LiDAR frame goes through four stages:
//!
//! 1. region filter: crop to the area of interest and voxel-downsample
//!    ([`filter`]),
//! 2. ground removal: RANSAC plane fit, inliers are the road ([`ground`]),
//! 3. Euclidean clustering of the remaining points ([`cluster`]),
//! 4. one bounding box per cluster.
//!
//! [`FrameProcessor`] runs them in order and returns a [`FrameResult`].
//!
//! ## Quickstart
//!
//! ```
//! use lidar_obstacles::{FrameParams, FrameProcessor, Point, PointSet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut frame = PointSet::new();
//! for i in 0..60 {
//!     for j in 0..20 {
//!         frame.push(Point::new(i as f32 * 0.5 - 5.0, j as f32 * 0.5 - 4.5, -1.5));
//!     }
//! }
//! for k in 0..27 {
//!     let (a, b, c) = ((k % 3) as f32, ((k / 3) % 3) as f32, (k / 9) as f32);
//!     frame.push(Point::new(8.0 + 0.5 * a, 0.5 * b, -1.0 + 0.5 * c));
//! }
//!
//! let processor = FrameProcessor::new(FrameParams::default())?;
//! let result = processor.process(&frame)?;
//! assert_eq!(result.clusters.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `lidar_obstacles::core`: points, point sets, boxes, planes, logging.
//! - `lidar_obstacles::filter`: cropping and voxel downsampling.
//! - `lidar_obstacles::ground`: RANSAC plane segmentation.
//! - `lidar_obstacles::cluster`: clustering and box fitting.
//! - `lidar_obstacles::kdtree`: the spatial index used for clustering.
//! - `lidar_obstacles::io`: PCD / JSON frame files.

pub use lidar_obstacles_cluster as cluster;
pub use lidar_obstacles_core as core;
pub use lidar_obstacles_filter as filter;
pub use lidar_obstacles_ground as ground;
pub use point_kdtree as kdtree;

pub use lidar_obstacles_cluster::{ClusterError, ClusterParams};
pub use lidar_obstacles_core::{
    Aabb, Cluster, ConfigError, OrientedBox, PlaneModel, Point, PointSet,
};
pub use lidar_obstacles_filter::RegionFilterParams;
pub use lidar_obstacles_ground::{PlaneSegmentParams, PlaneSegmentation, SampleSource};

mod frame;
pub mod io;

pub use frame::{
    FrameError, FrameParams, FrameProcessor, FrameResult, FrameStage, StageTimings,
};
