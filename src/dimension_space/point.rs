use crate::dimension::ContentDimensionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A coordinate in dimension space: one value per dimension
///
/// Equality, ordering and hashing use the sorted coordinate tuple, so points compare
/// equal across recreation.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionSpacePoint {
    coordinates: BTreeMap<ContentDimensionId, String>,
}

impl DimensionSpacePoint {
    pub fn new<I, K, V>(coordinates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ContentDimensionId>,
        V: Into<String>,
    {
        Self {
            coordinates: coordinates
                .into_iter()
                .map(|(dimension, value)| (dimension.into(), value.into()))
                .collect(),
        }
    }

    /// The point of a repository without dimensions
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn coordinate(&self, dimension_id: &ContentDimensionId) -> Option<&str> {
        self.coordinates.get(dimension_id).map(String::as_str)
    }

    /// Coordinates sorted by dimension id
    pub fn coordinates(&self) -> impl Iterator<Item = (&ContentDimensionId, &str)> {
        self.coordinates
            .iter()
            .map(|(dimension, value)| (dimension, value.as_str()))
    }

    /// A copy of this point with one coordinate replaced
    pub fn vary(&self, dimension_id: &ContentDimensionId, value: impl Into<String>) -> Self {
        let mut coordinates = self.coordinates.clone();
        coordinates.insert(dimension_id.clone(), value.into());
        Self { coordinates }
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// BLAKE3 hash of the sorted `dimension=value` pairs
    pub fn identity_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (dimension, value) in &self.coordinates {
            hasher.update(dimension.as_str().as_bytes());
            hasher.update(&[0x1f]);
            hasher.update(value.as_bytes());
            hasher.update(&[0x1e]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl fmt::Display for DimensionSpacePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (dimension, value)) in self.coordinates.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{dimension}:{value}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_is_independent_of_construction_order() {
        let a = DimensionSpacePoint::new([("language", "de"), ("market", "CH")]);
        let b = DimensionSpacePoint::new([("market", "CH"), ("language", "de")]);
        assert_eq!(a, b);
        assert_eq!(a.identity_hash(), b.identity_hash());

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_identity_hash_distinguishes_points() {
        let a = DimensionSpacePoint::new([("language", "de")]);
        let b = DimensionSpacePoint::new([("language", "en")]);
        assert_ne!(a.identity_hash(), b.identity_hash());
    }

    #[test]
    fn test_vary() {
        let point = DimensionSpacePoint::new([("language", "de"), ("market", "CH")]);
        let varied = point.vary(&"language".into(), "gsw");
        assert_eq!(varied.coordinate(&"language".into()), Some("gsw"));
        assert_eq!(varied.coordinate(&"market".into()), Some("CH"));
        assert_eq!(point.coordinate(&"language".into()), Some("de"));
    }

    #[test]
    fn test_serialization_is_a_sorted_map() {
        let point = DimensionSpacePoint::new([("market", "CH"), ("language", "de")]);
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"language":"de","market":"CH"}"#);
        let back: DimensionSpacePoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, point);
        assert_eq!(point.to_string(), "{language:de,market:CH}");
    }
}
