use serde::{Deserialize, Serialize};

use crate::{Point, PointSet};

/// A group of points identified by indices into the set it was extracted from.
///
/// The cluster never copies points; use [`Cluster::points`] with the source
/// set to reach them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cluster {
    indices: Vec<usize>,
}

impl Cluster {
    /// Build from arbitrary indices; they are sorted and deduplicated.
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Points of this cluster in `source`. Indices outside `source` are skipped.
    pub fn points<'a>(&'a self, source: &'a PointSet) -> impl Iterator<Item = &'a Point> + 'a {
        self.indices.iter().filter_map(move |&i| source.get(i))
    }

    /// Copy the cluster's points out of `source`.
    pub fn to_point_set(&self, source: &PointSet) -> PointSet {
        source.select(&self.indices)
    }
}
