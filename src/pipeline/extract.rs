use std::collections::HashMap;

use candle_core::Tensor;

use crate::error::{Error, Result};
use crate::graph::{
    aggregate::mean_features, Direction, HeteroGraph, LabelDict, NodeSet, NodeType,
    AFFILIATED_WITH, HAS_TOPIC, WRITES,
};

/// Subgraph spanned by `authors`, with synthesized features and recovered
/// paper labels (aligned with the new paper ids).
///
/// Kept nodes: the authors, every paper they wrote, every institution they
/// are affiliated with and every field of study of a kept paper.
pub fn extract_full_graph(
    graph: &HeteroGraph,
    authors: &NodeSet,
    labels: &LabelDict,
) -> Result<(HeteroGraph, Tensor)> {
    let papers = graph.typed_neighbors(authors, WRITES, Direction::Forward)?;
    let institutions = graph.typed_neighbors(authors, AFFILIATED_WITH, Direction::Forward)?;
    let fields = graph.typed_neighbors(&papers, HAS_TOPIC, Direction::Forward)?;
    tracing::info!(
        authors = authors.len(),
        papers = papers.len(),
        institutions = institutions.len(),
        fields = fields.len(),
        "selected nodes"
    );

    let mut sub = graph.induced_subgraph(&HashMap::from([
        (NodeType::Author, authors.clone()),
        (NodeType::Paper, papers),
        (NodeType::Institution, institutions),
        (NodeType::FieldOfStudy, fields),
    ]))?;
    synthesize_features(&mut sub)?;
    let labels = recover_labels(&sub, labels)?;
    Ok((sub, labels))
}

/// Replaces author, institution and field-of-study features with the mean
/// feature of their papers inside `graph`.
pub fn synthesize_features(graph: &mut HeteroGraph) -> Result<()> {
    let paper_feat = graph
        .feat(NodeType::Paper)
        .ok_or(Error::MissingNodeData {
            ntype: NodeType::Paper,
            field: "feat",
        })?
        .clone();

    let (writers, written) = graph.edges(WRITES)?;
    let author_pairs: Vec<(u32, u32)> = writers.iter().copied().zip(written.iter().copied()).collect();

    // institution -> papers of its affiliated authors
    let mut papers_of = vec![Vec::new(); graph.num_nodes(NodeType::Author)];
    for &(author, paper) in &author_pairs {
        papers_of[author as usize].push(paper);
    }
    let (members, institutions) = graph.edges(AFFILIATED_WITH)?;
    let institution_pairs: Vec<(u32, u32)> = members
        .into_iter()
        .zip(institutions)
        .flat_map(|(author, inst)| papers_of[author as usize].iter().map(move |&p| (inst, p)))
        .collect();

    let (topic_papers, topics) = graph.edges(HAS_TOPIC)?;
    let field_pairs: Vec<(u32, u32)> = topics.into_iter().zip(topic_papers).collect();

    for (ntype, pairs) in [
        (NodeType::Author, author_pairs),
        (NodeType::Institution, institution_pairs),
        (NodeType::FieldOfStudy, field_pairs),
    ] {
        let feat = mean_features(&paper_feat, graph.num_nodes(ntype), &pairs)?;
        graph.set_feat(ntype, feat)?;
    }
    Ok(())
}

/// Label of every paper of `graph`, looked up through its `_ID`.
pub fn recover_labels(graph: &HeteroGraph, labels: &LabelDict) -> Result<Tensor> {
    let missing_labels = || Error::MissingNodeData {
        ntype: NodeType::Paper,
        field: "label",
    };
    let source = labels
        .get(&NodeType::Paper)
        .ok_or_else(missing_labels)?
        .to_dtype(candle_core::DType::I64)?
        .to_vec1::<i64>()?;
    let orig_ids = graph
        .orig_ids(NodeType::Paper)
        .ok_or(Error::MissingNodeData {
            ntype: NodeType::Paper,
            field: "_ID",
        })?
        .to_vec1::<u32>()?;

    let mut recovered = vec![-1i64; orig_ids.len()];
    for (new, &orig) in orig_ids.iter().enumerate() {
        if let Some(&label) = source.get(orig as usize) {
            recovered[new] = label;
        }
    }
    if let Some(paper) = recovered.iter().position(|&l| l == -1) {
        return Err(Error::UnresolvedLabel {
            paper,
            original: orig_ids[paper],
        });
    }
    let n = recovered.len();
    Ok(Tensor::from_vec(recovered, n, graph.device())?)
}
