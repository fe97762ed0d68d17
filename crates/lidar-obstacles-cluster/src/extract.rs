use lidar_obstacles_core::{Cluster, PointSet};
use log::debug;
use point_kdtree::KdTree;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{ClusterError, ClusterParams};

/// Euclidean cluster extraction by region growing.
///
/// Each unvisited point seeds a region that grows through every point within
/// `tolerance` of a point already in it. Regions whose size falls outside
/// `min_size..=max_size` are discarded, their points stay consumed. Clusters
/// come out in seed order with ascending indices into `points`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(points, params), fields(points = points.len(), tolerance = params.tolerance))
)]
pub fn extract_clusters(
    points: &PointSet,
    params: &ClusterParams,
) -> Result<Vec<Cluster>, ClusterError> {
    params.validate()?;
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let tree = KdTree::build(&points.coords())?;
    let n = points.len();

    let mut visited = vec![false; n];
    let mut clusters = Vec::new();
    let mut stack = Vec::new();
    let mut neighbours = Vec::new();
    let mut rejected = 0usize;

    for seed in 0..n {
        if visited[seed] {
            continue;
        }

        visited[seed] = true;
        stack.push(seed);
        let mut region = Vec::new();

        while let Some(idx) = stack.pop() {
            region.push(idx);
            tree.radius_search_into(points[idx].coords(), params.tolerance, &mut neighbours);
            for &nb in &neighbours {
                if !visited[nb] {
                    visited[nb] = true;
                    stack.push(nb);
                }
            }
        }

        if params.accepts(region.len()) {
            clusters.push(Cluster::new(region));
        } else {
            rejected += 1;
        }
    }

    debug!(
        "clustering: {} points, {} clusters, {} regions rejected by size",
        n,
        clusters.len(),
        rejected
    );
    Ok(clusters)
}
