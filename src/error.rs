use crate::graph::{CanonicalEdgeType, NodeType};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    #[error("unknown edge type `{0}`")]
    UnknownEdgeType(String),

    #[error("graph has no relation {0:?}")]
    MissingRelation(CanonicalEdgeType),

    #[error("node type {ntype} has no `{field}` data")]
    MissingNodeData { ntype: NodeType, field: &'static str },

    #[error("{ntype} id {id} is out of range (num_nodes = {num_nodes})")]
    NodeOutOfRange {
        ntype: NodeType,
        id: u32,
        num_nodes: usize,
    },

    /// A retained paper could not be mapped back to a label.
    #[error("paper {paper} (original id {original}) has no label")]
    UnresolvedLabel { paper: usize, original: u32 },

    /// The authors of a year's papers differ from the retained author set.
    #[error("year {year}: derived {found} authors, expected all {expected} retained authors")]
    AuthorSetMismatch {
        year: i64,
        expected: usize,
        found: usize,
    },

    #[error("no author is active in every year of {0:?}")]
    EmptySelection(Vec<i64>),

    #[error("malformed archive entry: {0}")]
    Format(String),
}
