//! Euclidean clustering and box fitting.
//!
//! ```
//! use lidar_obstacles_core::{Point, PointSet};
//! use lidar_obstacles_cluster::{extract_clusters, fit_aabb, ClusterParams};
//!
//! let mut obstacles = PointSet::new();
//! for i in 0..12 {
//!     obstacles.push(Point::new(0.1 * i as f32, 0.0, 0.0));
//!     obstacles.push(Point::new(20.0 + 0.1 * i as f32, 0.0, 0.0));
//! }
//!
//! let params = ClusterParams { tolerance: 0.5, min_size: 10, max_size: 100 };
//! let clusters = extract_clusters(&obstacles, &params).unwrap();
//! assert_eq!(clusters.len(), 2);
//!
//! let bbox = fit_aabb(&obstacles, &clusters[1]).unwrap();
//! assert!(bbox.min.x >= 20.0);
//! ```

mod bbox;
mod error;
mod extract;
mod params;

pub use bbox::{fit_aabb, fit_oriented_box};
pub use error::ClusterError;
pub use extract::extract_clusters;
pub use params::ClusterParams;
