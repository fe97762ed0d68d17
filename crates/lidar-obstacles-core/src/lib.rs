//! Core types and utilities for LiDAR obstacle extraction.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! know about any sensor format or any particular pipeline stage.

mod cluster;
mod error;
mod geometry;
mod logger;
mod point;

pub use cluster::Cluster;
pub use error::{require_non_negative, require_positive, ConfigError};
pub use geometry::{Aabb, OrientedBox, PlaneModel, COLLINEARITY_EPS};
pub use point::{Point, PointSet};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
