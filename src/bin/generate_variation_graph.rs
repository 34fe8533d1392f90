//! Generate variation graph visualizations
//!
//! Loads a content repository configuration, builds the inter-dimensional variation
//! graph and writes it in both Mermaid and GraphViz DOT formats, together with a short
//! markdown report.
//!
//! Usage: `generate-variation-graph <configuration.yaml> [output-dir]`

use anyhow::{bail, Context};
use cim_content_graph::{ContentRepositoryConfiguration, InterDimensionalVariationGraph};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(configuration_path) = args.next().map(PathBuf::from) else {
        bail!("usage: generate-variation-graph <configuration.yaml> [output-dir]");
    };
    let output_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("variation-graphs"));

    println!("Loading configuration from {}...", configuration_path.display());
    let configuration = ContentRepositoryConfiguration::from_path(&configuration_path)
        .with_context(|| format!("loading {}", configuration_path.display()))?;
    let graph = configuration
        .variation_graph()
        .context("building the variation graph")?;

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mermaid_path = output_dir.join("variation-graph.mmd");
    fs::write(&mermaid_path, graph.to_mermaid())?;
    println!("Generated Mermaid diagram: {}", mermaid_path.display());

    let dot_path = output_dir.join("variation-graph.dot");
    fs::write(&dot_path, graph.to_dot())?;
    println!("Generated DOT diagram: {}", dot_path.display());

    let report_path = output_dir.join("variation-report.md");
    fs::write(&report_path, generate_report(&graph))?;
    println!("Generated report: {}", report_path.display());

    println!("\nTo view the Mermaid diagram, paste the contents of {} into:", mermaid_path.display());
    println!("  https://mermaid.live/");
    println!("\nTo generate a PNG from the DOT file, run:");
    println!("  dot -Tpng {} -o variation-graph.png", dot_path.display());

    Ok(())
}

fn generate_report(graph: &InterDimensionalVariationGraph) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "# Variation Graph Report\n");

    let _ = writeln!(report, "## Dimensions\n");
    let _ = writeln!(report, "| Priority | Dimension | Values | Default | Maximum Depth |");
    let _ = writeln!(report, "|----------|-----------|--------|---------|---------------|");
    let source = graph.content_dimension_source();
    for (priority, dimension) in source.dimensions_ordered_by_priority().enumerate() {
        let _ = writeln!(
            report,
            "| {} | {} | {} | {} | {} |",
            priority + 1,
            dimension.id(),
            dimension.values().count(),
            dimension.default_value().value,
            dimension.maximum_depth()
        );
    }

    let _ = writeln!(report, "\n## Summary\n");
    let _ = writeln!(report, "- Subgraphs: {}", graph.subgraph_count());
    let _ = writeln!(report, "- Variation edges: {}", graph.edge_count());
    let _ = writeln!(report, "- Weight normalization base: {}", graph.weight_normalization_base());
    let _ = writeln!(report, "- Root generalizations: {}", graph.root_generalizations());

    let _ = writeln!(report, "\n## Subgraphs\n");
    let _ = writeln!(report, "| Dimension Space Point | Weight | Primary Fallback | Specializations |");
    let _ = writeln!(report, "|-----------------------|--------|------------------|-----------------|");
    for subgraph in graph.subgraphs() {
        let point = &subgraph.dimension_space_point;
        let primary = match graph.primary_fallback(point) {
            Ok(Some(fallback)) => fallback.to_string(),
            Ok(None) => "-".to_string(),
            Err(error) => format!("**{error}**"),
        };
        let specializations = graph
            .specialization_set(point, false, None)
            .map(|set| set.len().to_string())
            .unwrap_or_else(|error| error.to_string());
        let _ = writeln!(
            report,
            "| {point} | {} | {primary} | {specializations} |",
            subgraph.weight
        );
    }

    report
}
