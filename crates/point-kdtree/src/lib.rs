//! Bucketed 3D kd-tree for fixed-radius neighbour queries.
//!
//! The tree is stored arena-style: one contiguous coordinate array, one
//! permutation of point ids, and a flat node vector whose children are
//! referenced by index. Point ids are positions in the slice the tree was
//! built from, so callers can keep their own point storage and treat query
//! results as indices into it.
//!
//! ## Quickstart
//!
//! ```
//! use point_kdtree::KdTree;
//!
//! let points = [[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [4.0, 4.0, 4.0]];
//! let tree = KdTree::build(&points).expect("finite coordinates");
//!
//! let mut hits = tree.radius_search([0.0, 0.0, 0.0], 1.0);
//! hits.sort_unstable();
//! assert_eq!(hits, vec![0, 1]);
//! ```
//!
//! Construction splits each node at the median of its widest axis, so the
//! tree is balanced regardless of input order: `O(n log n)` build and
//! `O(log n + k)` average radius queries.

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Leaf capacity used by [`KdTree::build`].
pub const DEFAULT_BUCKET_SIZE: usize = 16;

/// Construction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdTreeParams {
    /// Maximum number of points stored in a leaf before it is split.
    pub bucket_size: usize,
}

impl Default for KdTreeParams {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

/// Errors returned while building a tree.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdTreeError {
    #[error("point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Bounds {
    min: [f32; 3],
    max: [f32; 3],
}

impl Bounds {
    fn of(coords: &[[f32; 3]], ids: &[usize]) -> Self {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for &id in ids {
            let p = coords[id];
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Self { min, max }
    }

    fn widest_axis(&self) -> (usize, f32) {
        (0..3)
            .map(|axis| (axis, self.max[axis] - self.min[axis]))
            .fold((0, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            })
    }

    /// Squared distance from `q` to the closest point of the box (0 inside).
    #[inline]
    fn distance_sq(&self, q: &[f32; 3]) -> f32 {
        let mut acc = 0.0;
        for axis in 0..3 {
            let d = if q[axis] < self.min[axis] {
                self.min[axis] - q[axis]
            } else if q[axis] > self.max[axis] {
                q[axis] - self.max[axis]
            } else {
                0.0
            };
            acc += d * d;
        }
        acc
    }
}

#[derive(Clone, Copy, Debug)]
enum NodeKind {
    /// Range into `KdTree::ids`.
    Leaf { start: usize, end: usize },
    Split { left: usize, right: usize },
}

#[derive(Clone, Debug)]
struct Node {
    bounds: Bounds,
    kind: NodeKind,
}

/// Balanced kd-tree over 3D points.
#[derive(Clone, Debug)]
pub struct KdTree {
    coords: Vec<[f32; 3]>,
    ids: Vec<usize>,
    nodes: Vec<Node>,
}

impl KdTree {
    /// Build a tree with [`KdTreeParams::default`].
    pub fn build(points: &[[f32; 3]]) -> Result<Self, KdTreeError> {
        Self::build_with(points, KdTreeParams::default())
    }

    /// Build a tree over `points`. Ids returned by queries index into `points`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(points, params), fields(points = points.len()))
    )]
    pub fn build_with(points: &[[f32; 3]], params: KdTreeParams) -> Result<Self, KdTreeError> {
        if let Some(index) = points
            .iter()
            .position(|p| p.iter().any(|c| !c.is_finite()))
        {
            return Err(KdTreeError::NonFiniteCoordinate { index });
        }

        let coords = points.to_vec();
        let mut ids: Vec<usize> = (0..coords.len()).collect();
        let mut nodes = Vec::new();
        if !coords.is_empty() {
            // A balanced tree over n points with b-point leaves has < 2n/b + 1 nodes.
            let bucket = params.bucket_size.max(1);
            nodes.reserve(2 * coords.len() / bucket + 1);
            build_node(&mut nodes, &coords, &mut ids, 0, bucket);
        }

        Ok(Self { coords, ids, nodes })
    }

    /// Number of indexed points.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinates of point `id`.
    #[inline]
    pub fn point(&self, id: usize) -> Option<[f32; 3]> {
        self.coords.get(id).copied()
    }

    /// Number of node levels on the longest root-to-leaf path (0 for an empty tree).
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let NodeKind::Split { left, right } = self.nodes[node].kind {
                stack.push((left, level + 1));
                stack.push((right, level + 1));
            }
        }
        deepest
    }

    /// Ids of all points within `radius` (inclusive) of `query`, in no particular order.
    ///
    /// A negative or NaN radius yields no results.
    pub fn radius_search(&self, query: [f32; 3], radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        self.radius_search_into(query, radius, &mut out);
        out
    }

    /// Like [`KdTree::radius_search`], but clears and fills `out` so a single
    /// buffer can be reused across many queries.
    pub fn radius_search_into(&self, query: [f32; 3], radius: f32, out: &mut Vec<usize>) {
        out.clear();
        if self.nodes.is_empty() || radius.is_nan() || radius < 0.0 {
            return;
        }
        let radius_sq = radius * radius;

        let mut stack = Vec::with_capacity(64);
        stack.push(0usize);
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.bounds.distance_sq(&query) > radius_sq {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, end } => {
                    out.extend(
                        self.ids[start..end]
                            .iter()
                            .copied()
                            .filter(|&id| distance_sq(&self.coords[id], &query) <= radius_sq),
                    );
                }
                NodeKind::Split { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }
}

fn build_node(
    nodes: &mut Vec<Node>,
    coords: &[[f32; 3]],
    ids: &mut [usize],
    start: usize,
    bucket: usize,
) -> usize {
    let bounds = Bounds::of(coords, ids);
    let index = nodes.len();
    nodes.push(Node {
        bounds,
        kind: NodeKind::Leaf {
            start,
            end: start + ids.len(),
        },
    });

    // Coincident points cannot be separated; keep them in one leaf.
    let (axis, spread) = bounds.widest_axis();
    if ids.len() <= bucket || spread <= 0.0 {
        return index;
    }

    let mid = ids.len() / 2;
    ids.select_nth_unstable_by(mid, |&a, &b| coords[a][axis].total_cmp(&coords[b][axis]));
    let (lo, hi) = ids.split_at_mut(mid);
    let left = build_node(nodes, coords, lo, start, bucket);
    let right = build_node(nodes, coords, hi, start + mid, bucket);
    nodes[index].kind = NodeKind::Split { left, right };
    index
}

#[inline]
fn distance_sq(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}
