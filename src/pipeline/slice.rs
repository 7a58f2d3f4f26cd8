use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::graph::{
    Direction, HeteroGraph, NodeType, AFFILIATED_WITH, HAS_TOPIC, WRITES,
};

/// One subgraph of `full` per year, in the order of `years`.
///
/// Each holds the papers of that year, their fields of study, their authors
/// and those authors' institutions. `full` must come out of
/// [`extract_full_graph`](super::extract_full_graph), so that every year
/// reaches the whole author set; anything else is reported as
/// [`Error::AuthorSetMismatch`].
pub fn slice_years(full: &HeteroGraph, years: &[i64]) -> Result<Vec<HeteroGraph>> {
    let all_authors = full.nodes(NodeType::Author);
    let mut graphs = Vec::with_capacity(years.len());
    for &year in years {
        let papers = full.nodes_with_year(NodeType::Paper, year)?;
        let fields = full.typed_neighbors(&papers, HAS_TOPIC, Direction::Forward)?;
        let authors = full.typed_neighbors(&papers, WRITES, Direction::Reverse)?;
        if authors != all_authors {
            return Err(Error::AuthorSetMismatch {
                year,
                expected: all_authors.len(),
                found: authors.len(),
            });
        }
        let institutions = full.typed_neighbors(&authors, AFFILIATED_WITH, Direction::Forward)?;
        tracing::debug!(
            year,
            papers = papers.len(),
            fields = fields.len(),
            institutions = institutions.len(),
            "sliced year"
        );
        graphs.push(full.induced_subgraph(&HashMap::from([
            (NodeType::Paper, papers),
            (NodeType::FieldOfStudy, fields),
            (NodeType::Author, authors),
            (NodeType::Institution, institutions),
        ]))?);
    }
    Ok(graphs)
}
