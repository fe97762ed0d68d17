//! RANSAC ground-plane segmentation.
//!
//! ## Quickstart
//!
//! ```
//! use lidar_obstacles_core::{Point, PointSet};
//! use lidar_obstacles_ground::{segment_plane_seeded, PlaneSegmentParams};
//!
//! let mut frame: PointSet = (0..100)
//!     .map(|i| Point::new((i % 10) as f32, (i / 10) as f32, 0.0))
//!     .collect();
//! frame.push(Point::new(3.0, 3.0, 1.5));
//!
//! let params = PlaneSegmentParams::default();
//! let seg = segment_plane_seeded(&frame, &params).unwrap();
//! assert_eq!(seg.inliers.len(), 100);
//! assert_eq!(seg.outliers.len(), 1);
//! ```

mod params;
mod ransac;
mod sampling;

pub use params::PlaneSegmentParams;
pub use ransac::{segment_plane, segment_plane_seeded, PlaneSegmentation};
pub use sampling::SampleSource;
