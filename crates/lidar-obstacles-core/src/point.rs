use std::ops::Index;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::Aabb;

/// A single range return.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub position: Point3<f32>,
    /// Reflectivity, when the sensor reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f32>,
}

impl Point {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            intensity: None,
        }
    }

    pub fn with_intensity(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            intensity: Some(intensity),
        }
    }

    #[inline]
    pub fn coords(&self) -> [f32; 3] {
        [self.position.x, self.position.y, self.position.z]
    }
}

/// Ordered, exclusively owned sequence of points (one frame or a subset of one).
///
/// Subsets are always new sets; nothing hands out mutable access to points
/// that another set also refers to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointSet {
    points: Vec<Point>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    pub fn into_vec(self) -> Vec<Point> {
        self.points
    }

    /// Coordinates as plain arrays, in point order (input for spatial indexing).
    pub fn coords(&self) -> Vec<[f32; 3]> {
        self.points.iter().map(Point::coords).collect()
    }

    /// Copy the points at `indices` (in the given order) into a new set.
    ///
    /// Indices past the end are skipped.
    pub fn select(&self, indices: &[usize]) -> PointSet {
        indices
            .iter()
            .filter_map(|&i| self.points.get(i).copied())
            .collect()
    }

    /// Split into `(selected, rest)` where `selected[i]` is taken when `mask[i]`.
    ///
    /// Points beyond the mask length go to `rest`. Both halves keep input order.
    pub fn partition_by_mask(&self, mask: &[bool]) -> (PointSet, PointSet) {
        let mut selected = PointSet::new();
        let mut rest = PointSet::new();
        for (i, p) in self.points.iter().enumerate() {
            if mask.get(i).copied().unwrap_or(false) {
                selected.push(*p);
            } else {
                rest.push(*p);
            }
        }
        (selected, rest)
    }

    /// Tight axis-aligned bounds, or `None` for an empty set.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.points.iter().map(|p| &p.position))
    }
}

impl Index<usize> for PointSet {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.points[index]
    }
}

impl From<Vec<Point>> for PointSet {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
