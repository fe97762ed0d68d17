use lidar_obstacles_core::{Aabb, Cluster, OrientedBox, PointSet};
use nalgebra::{Matrix2, Point3, SymmetricEigen, Vector3};

use crate::ClusterError;

/// Tight axis-aligned box around the points of `cluster` in `points`.
pub fn fit_aabb(points: &PointSet, cluster: &Cluster) -> Result<Aabb, ClusterError> {
    Aabb::from_points(cluster.points(points).map(|p| &p.position)).ok_or(ClusterError::EmptyCluster)
}

/// Yaw-aligned box around the points of `cluster` in `points`.
///
/// The box x axis follows the dominant eigenvector of the XY covariance, with
/// `yaw` in `(-pi/2, pi/2]`. Extents are the exact min/max of the points in
/// that frame; z is taken as is. Clusters with no XY spread get `yaw = 0`.
pub fn fit_oriented_box(points: &PointSet, cluster: &Cluster) -> Result<OrientedBox, ClusterError> {
    let members: Vec<Point3<f64>> = cluster
        .points(points)
        .map(|p| p.position.cast::<f64>())
        .collect();
    if members.is_empty() {
        return Err(ClusterError::EmptyCluster);
    }

    let n = members.len() as f64;
    let (sx, sy) = members
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (mx, my) = (sx / n, sy / n);

    let mut cov = Matrix2::<f64>::zeros();
    for p in &members {
        let (dx, dy) = (p.x - mx, p.y - my);
        cov[(0, 0)] += dx * dx;
        cov[(0, 1)] += dx * dy;
        cov[(1, 1)] += dy * dy;
    }
    cov[(1, 0)] = cov[(0, 1)];
    cov /= n;

    let yaw = principal_yaw(cov);
    let (s, c) = yaw.sin_cos();

    let mut lo = Vector3::repeat(f64::INFINITY);
    let mut hi = Vector3::repeat(f64::NEG_INFINITY);
    for p in &members {
        let (dx, dy) = (p.x - mx, p.y - my);
        let local = Vector3::new(c * dx + s * dy, -s * dx + c * dy, p.z);
        lo = lo.inf(&local);
        hi = hi.sup(&local);
    }

    let mid = (lo + hi) * 0.5;
    let center = Point3::new(mx + c * mid.x - s * mid.y, my + s * mid.x + c * mid.y, mid.z);

    Ok(OrientedBox {
        center: center.cast::<f32>(),
        half_extents: ((hi - lo) * 0.5).cast::<f32>(),
        yaw: yaw as f32,
    })
}

fn principal_yaw(cov: Matrix2<f64>) -> f64 {
    if cov.trace() <= f64::EPSILON {
        return 0.0;
    }
    let eig = SymmetricEigen::new(cov);
    let major = if eig.eigenvalues[0] >= eig.eigenvalues[1] { 0 } else { 1 };
    let axis = eig.eigenvectors.column(major);
    let mut yaw = axis[1].atan2(axis[0]);
    if yaw > std::f64::consts::FRAC_PI_2 {
        yaw -= std::f64::consts::PI;
    } else if yaw <= -std::f64::consts::FRAC_PI_2 {
        yaw += std::f64::consts::PI;
    }
    yaw
}
