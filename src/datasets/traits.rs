use anyhow::Result;

use crate::graph::{HeteroGraph, LabelDict};

pub trait Dataset {
    /// Repeated calls with unchanged inputs must not redo expensive work.
    fn load(&self) -> Result<(HeteroGraph, LabelDict)>;
}
