use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Relative tolerance on `|ab x ac| / (|ab| |ac|)` (the sine of the angle at
/// `a`) below which three points are treated as collinear.
pub const COLLINEARITY_EPS: f32 = 1e-6;

/// Axis-aligned box given by its minimum and maximum corners (closed).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Tightest box around `points`, or `None` when there are none.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f32>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        });
        Some(Self { min, max })
    }

    #[inline]
    pub fn contains(&self, p: &Point3<f32>) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Check that the box is usable as a region: finite and `min <= max` per axis.
    ///
    /// `name` identifies the option in the returned error.
    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min.iter().chain(self.max.iter()).any(|c| !c.is_finite()) {
            return Err(ConfigError::NonFiniteBounds { name });
        }
        for (i, axis) in ['x', 'y', 'z'].into_iter().enumerate() {
            if self.min[i] > self.max[i] {
                return Err(ConfigError::InvertedBounds {
                    name,
                    axis,
                    min: self.min[i],
                    max: self.max[i],
                });
            }
        }
        Ok(())
    }
}

/// Box rotated about +z by `yaw` radians around `center`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: Point3<f32>,
    pub half_extents: Vector3<f32>,
    pub yaw: f32,
}

impl OrientedBox {
    /// Express `p` in the box frame (origin at `center`, x along `yaw`).
    pub fn to_local(&self, p: &Point3<f32>) -> Vector3<f32> {
        let d = *p - self.center;
        let (s, c) = self.yaw.sin_cos();
        Vector3::new(c * d.x + s * d.y, -s * d.x + c * d.y, d.z)
    }

    /// Containment test with an absolute slack `eps` on every face.
    pub fn contains(&self, p: &Point3<f32>, eps: f32) -> bool {
        let local = self.to_local(p);
        (0..3).all(|i| local[i].abs() <= self.half_extents[i] + eps)
    }

    pub fn volume(&self) -> f32 {
        8.0 * self.half_extents.x * self.half_extents.y * self.half_extents.z
    }
}

/// Plane `normal . p + d = 0` with a unit normal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneModel {
    pub normal: Vector3<f32>,
    pub d: f32,
    /// Inlier distance the plane was fit with.
    pub distance_threshold: f32,
}

impl PlaneModel {
    /// Plane through three points, `None` if they are (nearly) collinear.
    pub fn from_points(
        a: &Point3<f32>,
        b: &Point3<f32>,
        c: &Point3<f32>,
        distance_threshold: f32,
    ) -> Option<Self> {
        let ab = b - a;
        let ac = c - a;
        let cross = ab.cross(&ac);
        let norm = cross.norm();
        if norm <= COLLINEARITY_EPS * ab.norm() * ac.norm() {
            return None;
        }
        let normal = cross / norm;
        Some(Self {
            normal,
            d: -normal.dot(&a.coords),
            distance_threshold,
        })
    }

    /// Perpendicular distance from `p` to the plane.
    #[inline]
    pub fn distance(&self, p: &Point3<f32>) -> f32 {
        (self.normal.dot(&p.coords) + self.d).abs()
    }

    #[inline]
    pub fn is_inlier(&self, p: &Point3<f32>) -> bool {
        self.distance(p) <= self.distance_threshold
    }

    /// `[a, b, c, d]` with `a² + b² + c² = 1`.
    pub fn coefficients(&self) -> [f32; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.d]
    }
}
