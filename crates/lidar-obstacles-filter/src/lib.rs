//! Region-of-interest cropping and voxel-grid downsampling.
//!
//! ## Quickstart
//!
//! ```
//! use lidar_obstacles_core::{Point, PointSet};
//! use lidar_obstacles_filter::{filter_region, RegionFilterParams};
//!
//! let frame: PointSet = vec![
//!     Point::new(1.0, 0.0, 0.0),
//!     Point::new(1.1, 0.1, 0.0),
//!     Point::new(100.0, 0.0, 0.0), // outside the default region
//! ]
//! .into();
//!
//! let filtered = filter_region(&frame, &RegionFilterParams::default()).unwrap();
//! assert_eq!(filtered.len(), 1);
//! ```
//!
//! Steps of [`filter_region`], in one pass over the input:
//! 1. Drop points outside the closed crop box.
//! 2. Accumulate the survivors into cubic voxels of edge `voxel_size`.
//! 3. Emit one centroid per occupied voxel, in order of first occupancy.
//! 4. Drop centroids inside the optional ego-vehicle box.

mod params;
mod region;

pub use params::RegionFilterParams;
pub use region::{crop, filter_region, voxel_downsample};
