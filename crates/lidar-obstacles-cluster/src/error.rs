use lidar_obstacles_core::ConfigError;
use point_kdtree::KdTreeError;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("spatial index: {0}")]
    Index(#[from] KdTreeError),
    #[error("cannot fit a box to an empty cluster")]
    EmptyCluster,
}
