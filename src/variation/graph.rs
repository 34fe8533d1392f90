use super::{VariationGraphError, VariationGraphResult, VariationWeight};
use crate::dimension::ContentDimensionSource;
use crate::dimension_space::{ContentDimensionZookeeper, DimensionSpacePoint, DimensionSpacePointSet};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One legal combination of dimension values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSubgraph {
    /// The combination itself
    pub dimension_space_point: DimensionSpacePoint,
    /// Specialization depth of each value, in dimension priority order
    pub weight: VariationWeight,
    /// Hash of the sorted dimension/value pairs
    pub identity_hash: String,
}

/// Directed fallback relation from a variant to one of its fallbacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationEdge {
    /// Depth delta between variant and fallback per dimension
    pub weight: VariationWeight,
}

/// Relation of one dimension space point to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantType {
    Same,
    Specialization,
    Generalization,
    Peer,
}

/// The fallback graph over all content subgraphs
///
/// Built once from a dimension source and immutable afterwards; share it through an
/// `Arc` and rebuild it wholesale when the dimension configuration changes.
#[derive(Debug, Clone)]
pub struct InterDimensionalVariationGraph {
    source: Arc<ContentDimensionSource>,
    allowed_subspace: DimensionSpacePointSet,
    graph: DiGraph<ContentSubgraph, VariationEdge>,
    subgraph_index: HashMap<DimensionSpacePoint, NodeIndex>,
    weight_normalization_base: u64,
}

impl InterDimensionalVariationGraph {
    /// Build the complete graph: every legal subgraph, connected to every legal fallback
    pub fn new(source: Arc<ContentDimensionSource>) -> VariationGraphResult<Self> {
        let mut graph = Self::disconnected(source)?;

        let points: Vec<DimensionSpacePoint> = graph.allowed_subspace.iter().cloned().collect();
        for variant in &points {
            for fallback in &points {
                if variant != fallback && graph.generalizes(variant, fallback)? {
                    graph.connect_subgraphs(variant, fallback)?;
                }
            }
        }

        tracing::info!(
            subgraphs = graph.graph.node_count(),
            variation_edges = graph.graph.edge_count(),
            weight_normalization_base = graph.weight_normalization_base,
            "Inter-dimensional variation graph built"
        );
        Ok(graph)
    }

    /// Register a subgraph for every legal combination without connecting any of them
    pub fn disconnected(source: Arc<ContentDimensionSource>) -> VariationGraphResult<Self> {
        let allowed_subspace = ContentDimensionZookeeper::new(&source)
            .allowed_subspace()
            .clone();
        let weight_normalization_base = source
            .dimensions_ordered_by_priority()
            .map(|dimension| u64::from(dimension.maximum_depth()) + 1)
            .max()
            .unwrap_or(1);

        let mut graph = Self {
            source,
            allowed_subspace: DimensionSpacePointSet::empty(),
            graph: DiGraph::new(),
            subgraph_index: HashMap::new(),
            weight_normalization_base,
        };
        for point in &allowed_subspace {
            graph.create_content_subgraph(point.clone())?;
        }
        graph.allowed_subspace = allowed_subspace;
        Ok(graph)
    }

    /// Register a subgraph for a point; registering a point twice returns the existing one
    pub fn create_content_subgraph(
        &mut self,
        point: DimensionSpacePoint,
    ) -> VariationGraphResult<&ContentSubgraph> {
        if let Some(index) = self.subgraph_index.get(&point) {
            return Ok(&self.graph[*index]);
        }

        let weight = self.depth_weight(&point)?;
        let subgraph = ContentSubgraph {
            identity_hash: point.identity_hash(),
            dimension_space_point: point.clone(),
            weight,
        };
        let index = self.graph.add_node(subgraph);
        self.subgraph_index.insert(point, index);
        Ok(&self.graph[index])
    }

    /// Connect a variant to one of its fallbacks, registering the edge on both ends
    pub fn connect_subgraphs(
        &mut self,
        variant: &DimensionSpacePoint,
        fallback: &DimensionSpacePoint,
    ) -> VariationGraphResult<&VariationEdge> {
        if variant == fallback {
            return Err(VariationGraphError::SelfFallback(variant.clone()));
        }
        let variant_index = self.require_index(variant)?;
        let fallback_index = self.require_index(fallback)?;
        if self.graph.find_edge(variant_index, fallback_index).is_some() {
            return Err(VariationGraphError::DuplicateVariationEdge {
                variant: variant.clone(),
                fallback: fallback.clone(),
            });
        }

        let weight = self.calculate_fallback_weight(variant, fallback)?;
        let edge = self.insert_edge(variant_index, fallback_index, weight);
        Ok(&self.graph[edge])
    }

    pub(crate) fn insert_edge(
        &mut self,
        variant: NodeIndex,
        fallback: NodeIndex,
        weight: VariationWeight,
    ) -> EdgeIndex {
        self.graph.add_edge(variant, fallback, VariationEdge { weight })
    }

    /// Depth of the variant's value minus depth of the fallback's value, per dimension
    pub fn calculate_fallback_weight(
        &self,
        variant: &DimensionSpacePoint,
        fallback: &DimensionSpacePoint,
    ) -> VariationGraphResult<VariationWeight> {
        let mut weights = Vec::with_capacity(self.source.len());
        for dimension in self.source.dimensions_ordered_by_priority() {
            let variant_value = self.require_coordinate(variant, dimension.id())?;
            let fallback_value = self.require_coordinate(fallback, dimension.id())?;
            if !dimension.is_generalization_or_same(fallback_value, variant_value)? {
                return Err(VariationGraphError::NotAFallback {
                    variant: variant.clone(),
                    fallback: fallback.clone(),
                });
            }
            let delta = dimension.depth_of(variant_value)? - dimension.depth_of(fallback_value)?;
            weights.push((dimension.id().clone(), delta));
        }
        Ok(VariationWeight::new(weights))
    }

    /// `1 + max(maximum depth)` over all dimensions
    pub fn weight_normalization_base(&self) -> u64 {
        self.weight_normalization_base
    }

    pub fn normalize_weight(&self, weight: &VariationWeight) -> u64 {
        weight.normalize(self.weight_normalization_base)
    }

    /// The fallback reached through the edge with the smallest normalized weight
    pub fn primary_fallback(
        &self,
        variant: &DimensionSpacePoint,
    ) -> VariationGraphResult<Option<&DimensionSpacePoint>> {
        let index = self.require_index(variant)?;
        let mut primary: Option<(u64, NodeIndex)> = None;
        let mut ambiguous = false;
        for edge in self.graph.edges_directed(index, Direction::Outgoing) {
            let normalized = self.normalize_weight(&edge.weight().weight);
            match primary {
                Some((lowest, _)) if normalized == lowest => ambiguous = true,
                Some((lowest, _)) if normalized > lowest => {}
                _ => {
                    primary = Some((normalized, edge.target()));
                    ambiguous = false;
                }
            }
        }

        match primary {
            Some((weight, _)) if ambiguous => Err(VariationGraphError::AmbiguousFallback {
                variant: variant.clone(),
                weight,
            }),
            Some((_, fallback)) => Ok(Some(&self.graph[fallback].dimension_space_point)),
            None => Ok(None),
        }
    }

    /// All fallbacks of a variant, most preferred first
    pub fn fallback_order(
        &self,
        variant: &DimensionSpacePoint,
    ) -> VariationGraphResult<Vec<&DimensionSpacePoint>> {
        let index = self.require_index(variant)?;
        let mut fallbacks: Vec<(u64, &DimensionSpacePoint)> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| {
                (
                    self.normalize_weight(&edge.weight().weight),
                    &self.graph[edge.target()].dimension_space_point,
                )
            })
            .collect();
        fallbacks.sort();
        Ok(fallbacks.into_iter().map(|(_, point)| point).collect())
    }

    /// Edges leading from a variant to its fallbacks
    pub fn fallback_edges(
        &self,
        variant: &DimensionSpacePoint,
    ) -> VariationGraphResult<Vec<(&ContentSubgraph, &VariationEdge)>> {
        let index = self.require_index(variant)?;
        Ok(self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (&self.graph[edge.target()], edge.weight()))
            .collect())
    }

    /// Edges leading from variants to the given fallback
    pub fn variant_edges(
        &self,
        fallback: &DimensionSpacePoint,
    ) -> VariationGraphResult<Vec<(&ContentSubgraph, &VariationEdge)>> {
        let index = self.require_index(fallback)?;
        Ok(self
            .graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| (&self.graph[edge.source()], edge.weight()))
            .collect())
    }

    /// The transitive closure of specializations of `origin`
    pub fn specialization_set(
        &self,
        origin: &DimensionSpacePoint,
        include_origin: bool,
        excluded: Option<&DimensionSpacePointSet>,
    ) -> VariationGraphResult<DimensionSpacePointSet> {
        let index = self.require_index(origin)?;
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, index);
        let mut specializations = Vec::new();
        while let Some(next) = dfs.next(reversed) {
            let point = &self.graph[next].dimension_space_point;
            if next == index && !include_origin {
                continue;
            }
            if excluded.is_some_and(|excluded| next != index && excluded.contains(point)) {
                continue;
            }
            specializations.push(point.clone());
        }
        Ok(DimensionSpacePointSet::new(specializations))
    }

    /// The transitive closure of generalizations of `origin`
    pub fn generalization_set(
        &self,
        origin: &DimensionSpacePoint,
        include_origin: bool,
    ) -> VariationGraphResult<DimensionSpacePointSet> {
        let index = self.require_index(origin)?;
        let mut dfs = Dfs::new(&self.graph, index);
        let mut generalizations = Vec::new();
        while let Some(next) = dfs.next(&self.graph) {
            if next == index && !include_origin {
                continue;
            }
            generalizations.push(self.graph[next].dimension_space_point.clone());
        }
        Ok(DimensionSpacePointSet::new(generalizations))
    }

    /// Subgraphs without any fallback
    pub fn root_generalizations(&self) -> DimensionSpacePointSet {
        self.graph
            .node_indices()
            .filter(|index| {
                self.graph
                    .edges_directed(*index, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|index| self.graph[index].dimension_space_point.clone())
            .collect()
    }

    /// How `subject` relates to `object`
    pub fn variant_type(
        &self,
        subject: &DimensionSpacePoint,
        object: &DimensionSpacePoint,
    ) -> VariationGraphResult<VariantType> {
        if subject == object {
            return Ok(VariantType::Same);
        }
        if self.generalization_set(object, false)?.contains(subject) {
            return Ok(VariantType::Generalization);
        }
        if self.specialization_set(object, false, None)?.contains(subject) {
            return Ok(VariantType::Specialization);
        }
        Ok(VariantType::Peer)
    }

    pub fn subgraph(&self, point: &DimensionSpacePoint) -> Option<&ContentSubgraph> {
        self.subgraph_index.get(point).map(|index| &self.graph[*index])
    }

    pub fn subgraphs(&self) -> impl Iterator<Item = &ContentSubgraph> {
        self.graph.node_weights()
    }

    /// Every edge as `(variant, fallback, edge)`
    pub fn variation_edges(
        &self,
    ) -> impl Iterator<Item = (&ContentSubgraph, &ContentSubgraph, &VariationEdge)> {
        self.graph.edge_references().map(|edge| {
            (
                &self.graph[edge.source()],
                &self.graph[edge.target()],
                edge.weight(),
            )
        })
    }

    pub fn subgraph_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The legal coordinate space this graph was built for
    pub fn allowed_subspace(&self) -> &DimensionSpacePointSet {
        &self.allowed_subspace
    }

    pub fn content_dimension_source(&self) -> &ContentDimensionSource {
        &self.source
    }

    pub(crate) fn index_of(&self, point: &DimensionSpacePoint) -> Option<NodeIndex> {
        self.subgraph_index.get(point).copied()
    }

    fn require_index(&self, point: &DimensionSpacePoint) -> VariationGraphResult<NodeIndex> {
        self.index_of(point)
            .ok_or_else(|| VariationGraphError::SubgraphNotRegistered(point.clone()))
    }

    fn require_coordinate<'a>(
        &self,
        point: &'a DimensionSpacePoint,
        dimension_id: &crate::dimension::ContentDimensionId,
    ) -> VariationGraphResult<&'a str> {
        point.coordinate(dimension_id).ok_or_else(|| {
            VariationGraphError::IncompleteDimensionSpacePoint {
                point: point.clone(),
                dimension: dimension_id.clone(),
            }
        })
    }

    fn generalizes(
        &self,
        variant: &DimensionSpacePoint,
        fallback: &DimensionSpacePoint,
    ) -> VariationGraphResult<bool> {
        for dimension in self.source.dimensions_ordered_by_priority() {
            let variant_value = self.require_coordinate(variant, dimension.id())?;
            let fallback_value = self.require_coordinate(fallback, dimension.id())?;
            if !dimension.is_generalization_or_same(fallback_value, variant_value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn depth_weight(&self, point: &DimensionSpacePoint) -> VariationGraphResult<VariationWeight> {
        for (dimension_id, _) in point.coordinates() {
            self.source.require_dimension(dimension_id)?;
        }
        let mut weights = Vec::with_capacity(self.source.len());
        for dimension in self.source.dimensions_ordered_by_priority() {
            let value = self.require_coordinate(point, dimension.id())?;
            weights.push((dimension.id().clone(), dimension.depth_of(value)?));
        }
        Ok(VariationWeight::new(weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{ContentDimension, ContentDimensionId};
    use serde_json::json;

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     VG[Variation Graph] --> SG[Subgraph Registration]
    ///     VG --> C[Connecting Subgraphs]
    ///     C --> W[Fallback Weight]
    ///     W --> N[Normalization]
    ///     N --> PF[Primary Fallback]
    ///     VG --> SS[Specialization Set]
    ///     VG --> VT[Variant Type]
    /// ```

    fn point(pairs: &[(&str, &str)]) -> DimensionSpacePoint {
        DimensionSpacePoint::new(pairs.iter().copied())
    }

    fn chain(id: &str, depth: u32) -> ContentDimension {
        let mut builder = ContentDimension::builder(id).value("0");
        for level in 1..=depth {
            builder = builder.specialization(level.to_string(), (level - 1).to_string());
        }
        builder.default_value("0").build().unwrap()
    }

    fn fixture_source() -> Arc<ContentDimensionSource> {
        let primary = ContentDimension::builder("primary")
            .value("0")
            .specialization("1", "0")
            .specialization("2", "1")
            .default_value("0")
            .build()
            .unwrap();
        let secondary = ContentDimension::builder("secondary")
            .value("0a")
            .value("0b")
            .default_value("0a")
            .build()
            .unwrap();
        let tertiary = ContentDimension::builder("tertiary")
            .value("0")
            .specialization("1a", "0")
            .specialization("1b", "0")
            .default_value("0")
            .build()
            .unwrap();
        Arc::new(ContentDimensionSource::new([primary, secondary, tertiary]))
    }

    fn language_market_source() -> Arc<ContentDimensionSource> {
        Arc::new(
            ContentDimensionSource::from_json_value(json!({
                "language": {
                    "defaultValue": "mul",
                    "values": {"mul": {"specializations": {"de": {"specializations": {"gsw": {}}}, "en": {}}}}
                },
                "market": {
                    "defaultValue": "EU",
                    "values": {"EU": {"specializations": {"CH": {}}}}
                }
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_create_content_subgraph_registers_subgraph() {
        let mut graph = InterDimensionalVariationGraph::disconnected(Arc::new(
            ContentDimensionSource::new([ContentDimension::builder("test")
                .value("a")
                .default_value("a")
                .build()
                .unwrap()]),
        ))
        .unwrap();

        let subgraph = graph
            .create_content_subgraph(point(&[("test", "a")]))
            .unwrap()
            .clone();
        assert_eq!(graph.subgraph(&point(&[("test", "a")])), Some(&subgraph));
        assert_eq!(subgraph.identity_hash, point(&[("test", "a")]).identity_hash());
        assert_eq!(graph.subgraph_count(), 1);
    }

    #[test]
    fn test_create_content_subgraph_rejects_unknown_coordinates() {
        let mut graph = InterDimensionalVariationGraph::disconnected(fixture_source()).unwrap();
        assert!(matches!(
            graph.create_content_subgraph(point(&[
                ("primary", "0"),
                ("secondary", "0a"),
                ("tertiary", "0"),
                ("quaternary", "x")
            ])),
            Err(VariationGraphError::UnknownDimensionIdentifier(_))
        ));
        assert!(matches!(
            graph.create_content_subgraph(point(&[
                ("primary", "9"),
                ("secondary", "0a"),
                ("tertiary", "0")
            ])),
            Err(VariationGraphError::UnknownDimensionValue { .. })
        ));
    }

    #[test]
    fn test_connect_subgraphs_registers_both_directions() {
        let source = Arc::new(ContentDimensionSource::new([ContentDimension::builder("test")
            .value("a")
            .specialization("b", "a")
            .default_value("a")
            .build()
            .unwrap()]));
        let mut graph = InterDimensionalVariationGraph::disconnected(source).unwrap();
        let fallback = point(&[("test", "a")]);
        let variant = point(&[("test", "b")]);

        graph.connect_subgraphs(&variant, &fallback).unwrap();

        let fallbacks = graph.fallback_edges(&variant).unwrap();
        assert_eq!(fallbacks.len(), 1);
        assert_eq!(fallbacks[0].0.dimension_space_point, fallback);
        let variants = graph.variant_edges(&fallback).unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].0.dimension_space_point, variant);
    }

    #[test]
    fn test_connect_subgraphs_rejects_invalid_edges() {
        let source = Arc::new(ContentDimensionSource::new([ContentDimension::builder("test")
            .value("a")
            .specialization("b", "a")
            .default_value("a")
            .build()
            .unwrap()]));
        let mut graph = InterDimensionalVariationGraph::disconnected(source).unwrap();
        let fallback = point(&[("test", "a")]);
        let variant = point(&[("test", "b")]);

        assert!(matches!(
            graph.connect_subgraphs(&variant, &variant),
            Err(VariationGraphError::SelfFallback(_))
        ));
        assert!(matches!(
            graph.connect_subgraphs(&fallback, &variant),
            Err(VariationGraphError::NotAFallback { .. })
        ));
        graph.connect_subgraphs(&variant, &fallback).unwrap();
        assert!(matches!(
            graph.connect_subgraphs(&variant, &fallback),
            Err(VariationGraphError::DuplicateVariationEdge { .. })
        ));
        assert!(matches!(
            graph.connect_subgraphs(&point(&[("test", "c")]), &fallback),
            Err(VariationGraphError::SubgraphNotRegistered(_))
        ));
    }

    #[test]
    fn test_calculate_fallback_weight_per_dimension() {
        let graph = InterDimensionalVariationGraph::disconnected(fixture_source()).unwrap();
        let cases = [
            (
                [("primary", "2"), ("secondary", "0a"), ("tertiary", "1a")],
                [("primary", "0"), ("secondary", "0a"), ("tertiary", "0")],
                [2, 0, 1],
            ),
            (
                [("primary", "1"), ("secondary", "0b"), ("tertiary", "0")],
                [("primary", "0"), ("secondary", "0b"), ("tertiary", "0")],
                [1, 0, 0],
            ),
            (
                [("primary", "0"), ("secondary", "0b"), ("tertiary", "1b")],
                [("primary", "0"), ("secondary", "0b"), ("tertiary", "0")],
                [0, 0, 1],
            ),
        ];
        for (variant, fallback, expected) in cases {
            let weight = graph
                .calculate_fallback_weight(&point(&variant), &point(&fallback))
                .unwrap();
            assert_eq!(
                weight,
                VariationWeight::new([
                    ("primary", expected[0]),
                    ("secondary", expected[1]),
                    ("tertiary", expected[2]),
                ])
            );
        }
    }

    #[test]
    fn test_weight_normalization_base_is_maximum_depth_plus_one() {
        let source = Arc::new(ContentDimensionSource::new([chain("first", 4), chain("second", 7)]));
        let graph = InterDimensionalVariationGraph::disconnected(source).unwrap();
        assert_eq!(graph.weight_normalization_base(), 8);
    }

    #[test]
    fn test_normalize_weight_fixtures() {
        let cases = [
            (5, [5, 4, 0], 204),
            (6, [0, 3, 6], 27),
            (3, [1, 3, 0], 28),
        ];
        for (depth, weights, expected) in cases {
            let source = Arc::new(ContentDimensionSource::new([
                chain("primary", depth),
                chain("secondary", depth),
                chain("tertiary", depth),
            ]));
            let graph = InterDimensionalVariationGraph::disconnected(source).unwrap();
            let weight = VariationWeight::new([
                ("primary", weights[0]),
                ("secondary", weights[1]),
                ("tertiary", weights[2]),
            ]);
            assert_eq!(graph.normalize_weight(&weight), expected);
        }
    }

    #[test]
    fn test_full_graph_connects_every_generalization() {
        let graph = InterDimensionalVariationGraph::new(language_market_source()).unwrap();
        assert_eq!(graph.subgraph_count(), 8);

        let gsw_ch = point(&[("language", "gsw"), ("market", "CH")]);
        // {gsw, de, mul} x {CH, EU} minus the variant itself
        assert_eq!(graph.fallback_edges(&gsw_ch).unwrap().len(), 5);
        assert_eq!(
            graph.root_generalizations(),
            DimensionSpacePointSet::new([point(&[("language", "mul"), ("market", "EU")])])
        );
    }

    #[test]
    fn test_primary_fallback_prefers_higher_priority_dimension() {
        let graph = InterDimensionalVariationGraph::new(language_market_source()).unwrap();
        let gsw_ch = point(&[("language", "gsw"), ("market", "CH")]);

        assert_eq!(
            graph.primary_fallback(&gsw_ch).unwrap(),
            Some(&point(&[("language", "gsw"), ("market", "EU")]))
        );

        let order: Vec<String> = graph
            .fallback_order(&gsw_ch)
            .unwrap()
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            order,
            vec![
                "{language:gsw,market:EU}",
                "{language:de,market:CH}",
                "{language:de,market:EU}",
                "{language:mul,market:CH}",
                "{language:mul,market:EU}",
            ]
        );

        let root = point(&[("language", "mul"), ("market", "EU")]);
        assert_eq!(graph.primary_fallback(&root).unwrap(), None);
    }

    #[test]
    fn test_primary_fallback_has_smallest_normalized_weight() {
        let graph = InterDimensionalVariationGraph::new(language_market_source()).unwrap();
        for subgraph in graph.subgraphs() {
            let variant = &subgraph.dimension_space_point;
            let edges = graph.fallback_edges(variant).unwrap();
            let Some(primary) = graph.primary_fallback(variant).unwrap() else {
                assert!(edges.is_empty());
                continue;
            };
            let primary_weight = edges
                .iter()
                .find(|(fallback, _)| &fallback.dimension_space_point == primary)
                .map(|(_, edge)| graph.normalize_weight(&edge.weight))
                .unwrap();
            for (_, edge) in &edges {
                assert!(primary_weight <= graph.normalize_weight(&edge.weight));
            }
        }
    }

    #[test]
    fn test_equal_normalized_weights_are_ambiguous() {
        let source = Arc::new(ContentDimensionSource::new([ContentDimension::builder("test")
            .value("a")
            .value("b")
            .value("c")
            .default_value("a")
            .build()
            .unwrap()]));
        let mut graph = InterDimensionalVariationGraph::disconnected(source).unwrap();
        let variant = graph.index_of(&point(&[("test", "a")])).unwrap();
        let first = graph.index_of(&point(&[("test", "b")])).unwrap();
        let second = graph.index_of(&point(&[("test", "c")])).unwrap();
        let weight = VariationWeight::new([(ContentDimensionId::new("test"), 1)]);
        graph.insert_edge(variant, first, weight.clone());
        graph.insert_edge(variant, second, weight);

        assert!(matches!(
            graph.primary_fallback(&point(&[("test", "a")])),
            Err(VariationGraphError::AmbiguousFallback { weight: 1, .. })
        ));
    }

    #[test]
    fn test_specialization_set_is_transitive_and_includes_origin() {
        let graph = InterDimensionalVariationGraph::new(language_market_source()).unwrap();
        let de_eu = point(&[("language", "de"), ("market", "EU")]);

        let specializations = graph.specialization_set(&de_eu, true, None).unwrap();
        assert_eq!(
            specializations,
            DimensionSpacePointSet::new([
                point(&[("language", "de"), ("market", "EU")]),
                point(&[("language", "de"), ("market", "CH")]),
                point(&[("language", "gsw"), ("market", "EU")]),
                point(&[("language", "gsw"), ("market", "CH")]),
            ])
        );

        let without_origin = graph.specialization_set(&de_eu, false, None).unwrap();
        assert!(!without_origin.contains(&de_eu));
        assert_eq!(without_origin.len(), 3);

        let excluded = DimensionSpacePointSet::new([point(&[("language", "gsw"), ("market", "CH")])]);
        assert_eq!(
            graph
                .specialization_set(&de_eu, true, Some(&excluded))
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn test_specialization_set_of_unregistered_point_fails() {
        let graph = InterDimensionalVariationGraph::new(language_market_source()).unwrap();
        assert!(matches!(
            graph.specialization_set(&point(&[("language", "fr"), ("market", "EU")]), true, None),
            Err(VariationGraphError::SubgraphNotRegistered(_))
        ));
    }

    #[test]
    fn test_variant_type() {
        let graph = InterDimensionalVariationGraph::new(language_market_source()).unwrap();
        let de = point(&[("language", "de"), ("market", "EU")]);
        let gsw = point(&[("language", "gsw"), ("market", "EU")]);
        let en = point(&[("language", "en"), ("market", "EU")]);

        assert_eq!(graph.variant_type(&de, &de).unwrap(), VariantType::Same);
        assert_eq!(graph.variant_type(&de, &gsw).unwrap(), VariantType::Generalization);
        assert_eq!(graph.variant_type(&gsw, &de).unwrap(), VariantType::Specialization);
        assert_eq!(graph.variant_type(&en, &de).unwrap(), VariantType::Peer);
    }

    #[test]
    fn test_no_dimensions_yield_a_single_subgraph() {
        let graph = InterDimensionalVariationGraph::new(Arc::new(ContentDimensionSource::default())).unwrap();
        assert_eq!(graph.subgraph_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.weight_normalization_base(), 1);
        assert_eq!(
            graph
                .specialization_set(&DimensionSpacePoint::empty(), true, None)
                .unwrap()
                .len(),
            1
        );
    }
}
