mod types;
pub use types::*;

mod hetero;
pub use hetero::*;

mod subgraph;

pub mod aggregate;
pub mod io;

/// Label tensor (i64, one entry per node) for each labelled node type.
pub type LabelDict = std::collections::HashMap<NodeType, candle_core::Tensor>;
