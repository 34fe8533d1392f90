use super::DimensionSpacePoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A set of dimension space points
///
/// Iteration and serialization are sorted, so events carrying sets replay identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionSpacePointSet {
    points: BTreeSet<DimensionSpacePoint>,
}

impl DimensionSpacePointSet {
    pub fn new(points: impl IntoIterator<Item = DimensionSpacePoint>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, point: &DimensionSpacePoint) -> bool {
        self.points.contains(point)
    }

    pub fn intersection(&self, other: &DimensionSpacePointSet) -> DimensionSpacePointSet {
        Self {
            points: self.points.intersection(&other.points).cloned().collect(),
        }
    }

    pub fn union(&self, other: &DimensionSpacePointSet) -> DimensionSpacePointSet {
        Self {
            points: self.points.union(&other.points).cloned().collect(),
        }
    }

    pub fn difference(&self, other: &DimensionSpacePointSet) -> DimensionSpacePointSet {
        Self {
            points: self.points.difference(&other.points).cloned().collect(),
        }
    }

    /// Whether every point of `other` is part of this set
    pub fn is_superset_of(&self, other: &DimensionSpacePointSet) -> bool {
        self.points.is_superset(&other.points)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionSpacePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<DimensionSpacePoint> for DimensionSpacePointSet {
    fn from_iter<T: IntoIterator<Item = DimensionSpacePoint>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl IntoIterator for DimensionSpacePointSet {
    type Item = DimensionSpacePoint;
    type IntoIter = std::collections::btree_set::IntoIter<DimensionSpacePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a DimensionSpacePointSet {
    type Item = &'a DimensionSpacePoint;
    type IntoIter = std::collections::btree_set::Iter<'a, DimensionSpacePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl fmt::Display for DimensionSpacePointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{point}")?;
        }
        write!(f, "]")
    }
}
