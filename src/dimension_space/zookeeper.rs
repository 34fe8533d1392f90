use super::{DimensionSpacePoint, DimensionSpacePointSet};
use crate::dimension::{ContentDimension, ContentDimensionSource};

/// Computes the legal combinations of dimension values
///
/// A combination is legal if every value in it allows the values chosen for all other
/// dimensions. The result is computed once and is read-only afterward.
#[derive(Debug, Clone)]
pub struct ContentDimensionZookeeper {
    allowed_subspace: DimensionSpacePointSet,
}

impl ContentDimensionZookeeper {
    pub fn new(source: &ContentDimensionSource) -> Self {
        let dimensions: Vec<&ContentDimension> = source.dimensions_ordered_by_priority().collect();
        let mut combinations: Vec<Vec<(&ContentDimension, &str)>> = vec![Vec::new()];

        for dimension in dimensions.iter().copied() {
            let mut extended = Vec::new();
            for combination in &combinations {
                for value in dimension.values() {
                    if is_compatible(combination, dimension, &value.value) {
                        let mut next = combination.clone();
                        next.push((dimension, value.value.as_str()));
                        extended.push(next);
                    }
                }
            }
            combinations = extended;
        }

        let allowed_subspace: DimensionSpacePointSet = combinations
            .into_iter()
            .map(|combination| {
                DimensionSpacePoint::new(
                    combination
                        .into_iter()
                        .map(|(dimension, value)| (dimension.id().clone(), value.to_string())),
                )
            })
            .collect();

        tracing::debug!(
            points = allowed_subspace.len(),
            "Allowed dimension subspace computed"
        );
        Self { allowed_subspace }
    }

    /// Every legal dimension space point
    pub fn allowed_subspace(&self) -> &DimensionSpacePointSet {
        &self.allowed_subspace
    }

    pub fn is_allowed(&self, point: &DimensionSpacePoint) -> bool {
        self.allowed_subspace.contains(point)
    }
}

fn is_compatible(
    combination: &[(&ContentDimension, &str)],
    dimension: &ContentDimension,
    value: &str,
) -> bool {
    let Some(candidate) = dimension.value(value) else {
        return false;
    };
    combination.iter().all(|(chosen_dimension, chosen_value)| {
        let chosen_allows = chosen_dimension
            .value(chosen_value)
            .map(|chosen| chosen.can_be_combined_with(dimension.id(), value))
            .unwrap_or(false);
        chosen_allows && candidate.can_be_combined_with(chosen_dimension.id(), chosen_value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     Z[Zookeeper] --> E[Empty Configuration]
    ///     Z --> U[Unconstrained Product]
    ///     Z --> W[Wildcard Deny]
    ///     Z --> X[Explicit Deny]
    /// ```

    #[test]
    fn test_no_dimensions_yield_the_empty_point() {
        let source = ContentDimensionSource::default();
        let zookeeper = ContentDimensionZookeeper::new(&source);
        assert_eq!(zookeeper.allowed_subspace().len(), 1);
        assert!(zookeeper.is_allowed(&DimensionSpacePoint::empty()));
    }

    #[test]
    fn test_unconstrained_dimensions_form_the_full_product() {
        let source = ContentDimensionSource::from_json_value(json!({
            "language": {"defaultValue": "de", "values": {"de": {"specializations": {"gsw": {}}}, "en": {}}},
            "market": {"defaultValue": "DE", "values": {"DE": {}, "CH": {}}}
        }))
        .unwrap();
        let zookeeper = ContentDimensionZookeeper::new(&source);
        assert_eq!(zookeeper.allowed_subspace().len(), 6);
    }

    #[test]
    fn test_constraints_restrict_the_subspace_in_both_directions() {
        let source = ContentDimensionSource::from_json_value(json!({
            "dimensionA": {
                "defaultValue": "valueA1",
                "values": {
                    "valueA1": {"constraints": {"dimensionB": {"*": false, "valueB1": true}}},
                    "valueA2": {"constraints": {"dimensionB": {"valueB2": false}}}
                }
            },
            "dimensionB": {
                "defaultValue": "valueB1",
                "values": {
                    "valueB1": {},
                    "valueB2": {},
                    "valueB3": {"constraints": {"dimensionA": {"valueA2": false}}}
                }
            }
        }))
        .unwrap();
        let zookeeper = ContentDimensionZookeeper::new(&source);

        let allowed: Vec<_> = zookeeper
            .allowed_subspace()
            .iter()
            .map(|point| point.to_string())
            .collect();
        assert_eq!(
            allowed,
            vec![
                "{dimensionA:valueA1,dimensionB:valueB1}",
                "{dimensionA:valueA2,dimensionB:valueB1}",
            ]
        );
    }
}
