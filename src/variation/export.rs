//! Text renderings of the variation graph

use super::InterDimensionalVariationGraph;
use std::collections::HashMap;
use std::fmt::{self, Write};

impl InterDimensionalVariationGraph {
    /// Render as a Mermaid flowchart; edges are labelled with their normalized weight
    pub fn to_mermaid(&self) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_mermaid(&mut output);
        output
    }

    /// Render as a GraphViz digraph; primary fallback edges are drawn bold
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        let _ = self.write_dot(&mut output);
        output
    }

    fn write_mermaid(&self, output: &mut String) -> fmt::Result {
        writeln!(output, "graph BT")?;
        writeln!(output, "    %% Inter-dimensional variation graph")?;
        writeln!(
            output,
            "    %% weight normalization base: {}",
            self.weight_normalization_base()
        )?;
        writeln!(output)?;

        let ids = self.node_ids();
        for subgraph in self.subgraphs() {
            let point = &subgraph.dimension_space_point;
            writeln!(
                output,
                "    {}[\"{}\"]",
                ids[&subgraph.identity_hash],
                escape(&point.to_string())
            )?;
        }
        writeln!(output)?;

        for (variant, fallback, edge) in self.variation_edges() {
            let arrow = if self.is_primary_fallback(variant, fallback) {
                "==>"
            } else {
                "-->"
            };
            writeln!(
                output,
                "    {} {}|{}| {}",
                ids[&variant.identity_hash],
                arrow,
                self.normalize_weight(&edge.weight),
                ids[&fallback.identity_hash]
            )?;
        }
        Ok(())
    }

    fn write_dot(&self, output: &mut String) -> fmt::Result {
        writeln!(output, "digraph VariationGraph {{")?;
        writeln!(output, "    rankdir=BT;")?;
        writeln!(output, "    node [shape=box, style=rounded];")?;
        writeln!(output)?;

        let ids = self.node_ids();
        for subgraph in self.subgraphs() {
            let fill = if subgraph.weight.is_zero() {
                "lightgrey"
            } else {
                "white"
            };
            writeln!(
                output,
                "    {} [label=\"{}\", style=\"rounded,filled\", fillcolor={}];",
                ids[&subgraph.identity_hash],
                escape(&subgraph.dimension_space_point.to_string()),
                fill
            )?;
        }
        writeln!(output)?;

        for (variant, fallback, edge) in self.variation_edges() {
            let style = if self.is_primary_fallback(variant, fallback) {
                ", style=bold"
            } else {
                ""
            };
            writeln!(
                output,
                "    {} -> {} [label=\"{} {}\"{}];",
                ids[&variant.identity_hash],
                ids[&fallback.identity_hash],
                self.normalize_weight(&edge.weight),
                escape(&edge.weight.to_string()),
                style
            )?;
        }
        writeln!(output, "}}")
    }

    fn node_ids(&self) -> HashMap<String, String> {
        self.subgraphs()
            .enumerate()
            .map(|(i, subgraph)| (subgraph.identity_hash.clone(), format!("sg{i}")))
            .collect()
    }

    fn is_primary_fallback(
        &self,
        variant: &super::ContentSubgraph,
        fallback: &super::ContentSubgraph,
    ) -> bool {
        matches!(
            self.primary_fallback(&variant.dimension_space_point),
            Ok(Some(primary)) if primary == &fallback.dimension_space_point
        )
    }
}

fn escape(label: &str) -> String {
    label.replace('"', "\\\"")
}
