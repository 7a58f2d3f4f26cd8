//! Year-stable author extraction.
//!
//! 1. [`stable_authors`]: authors with a paper in every configured year.
//! 2. [`extract_full_graph`]: the subgraph they span, with synthesized
//!    features and recovered labels.
//! 3. [`slice_years`]: one subgraph of stage 2's output per year.

mod extract;
pub use extract::*;

mod slice;
pub use slice::*;

mod stable_authors;
pub use stable_authors::*;

use candle_core::Tensor;
use tracing::{info, info_span, warn};

use crate::error::{Error, Result};
use crate::graph::{io, HeteroGraph, LabelDict, NodeType};
use crate::settings::ExtractConfig;

#[derive(Debug, Clone)]
pub struct ExtractOutput {
    pub full_graph: HeteroGraph,
    /// Label of every paper of `full_graph`, by its id there
    pub labels: Tensor,
    /// One graph per configured year, same order
    pub yearly: Vec<HeteroGraph>,
}

/// Runs the three stages and writes their artifacts to `config.output`.
///
/// The full graph and labels are written once stage 2 succeeds, the yearly
/// sequence once stage 3 does.
pub fn run(config: &ExtractConfig, graph: &HeteroGraph, labels: &LabelDict) -> Result<ExtractOutput> {
    let selection = &config.selection;
    let output = &config.output;

    let authors = info_span!("stable_authors").in_scope(|| {
        stable_authors(graph, &selection.years, selection.author_degree_threshold)
    })?;
    info!(
        authors = authors.len(),
        of = graph.num_nodes(NodeType::Author),
        years = ?selection.years,
        "selected stable authors"
    );
    if authors.is_empty() {
        if selection.fail_on_empty {
            return Err(Error::EmptySelection(selection.years.clone()));
        }
        warn!("no author is active in every year; the extracted graphs will be empty");
    }

    let (full_graph, paper_labels) = info_span!("extract")
        .in_scope(|| extract_full_graph(graph, &authors, labels))?;
    info!("extracted graph\n{full_graph}");
    io::save_graph(&output.full_graph, &full_graph)?;
    io::save_labels(&output.labels, &paper_labels)?;
    info!(
        graph = %output.full_graph.display(),
        labels = %output.labels.display(),
        "saved full graph"
    );

    let yearly = info_span!("slice").in_scope(|| slice_years(&full_graph, &selection.years))?;
    io::save_graphs(&output.sub_graphs, &yearly)?;
    info!(
        graphs = yearly.len(),
        path = %output.sub_graphs.display(),
        "saved yearly graphs"
    );

    Ok(ExtractOutput {
        full_graph,
        labels: paper_labels,
        yearly,
    })
}
