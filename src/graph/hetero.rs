use std::collections::{BTreeMap, HashMap};

use candle_core::{DType, Device, IndexOp, Tensor};
use itertools::Itertools;

use super::{CanonicalEdgeType, Direction, NodeSet, NodeType};
use crate::error::{Error, Result};
use crate::utils::{index_to_set, mask_to_index};

/// Per-type node attributes. Every present tensor has one row per node.
#[derive(Clone, Debug, Default)]
pub struct NodeData {
    pub feat: Option<Tensor>,
    pub year: Option<Tensor>,
    /// u32 (n,) id of the node in the graph this one was extracted from (`_ID`)
    pub orig_id: Option<Tensor>,
}

/// Typed multigraph with one contiguous id space per node type and a
/// `(2, E)` u32 edge index per relation (row 0 sources, row 1 destinations).
#[derive(Clone, Debug)]
pub struct HeteroGraph {
    num_nodes: BTreeMap<NodeType, usize>,
    ndata: HashMap<NodeType, NodeData>,
    edge_index: BTreeMap<CanonicalEdgeType, Tensor>,
    device: Device,
}
impl HeteroGraph {
    pub fn new<I>(num_nodes: I, device: &Device) -> Self
    where
        I: IntoIterator<Item = (NodeType, usize)>,
    {
        let mut counts: BTreeMap<NodeType, usize> =
            NodeType::ALL.into_iter().map(|t| (t, 0)).collect();
        counts.extend(num_nodes);
        Self {
            num_nodes: counts,
            ndata: HashMap::new(),
            edge_index: BTreeMap::new(),
            device: device.clone(),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
    pub fn num_nodes(&self, ntype: NodeType) -> usize {
        self.num_nodes.get(&ntype).copied().unwrap_or(0)
    }
    pub fn num_edges(&self, etype: CanonicalEdgeType) -> usize {
        self.edge_index
            .get(&etype)
            .map(|ei| ei.dims()[1])
            .unwrap_or(0)
    }
    pub fn relations(&self) -> impl Iterator<Item = CanonicalEdgeType> + '_ {
        self.edge_index.keys().copied()
    }
    pub fn has_relation(&self, etype: CanonicalEdgeType) -> bool {
        self.edge_index.contains_key(&etype)
    }

    pub fn ndata(&self, ntype: NodeType) -> Option<&NodeData> {
        self.ndata.get(&ntype)
    }
    pub fn feat(&self, ntype: NodeType) -> Option<&Tensor> {
        self.ndata.get(&ntype).and_then(|d| d.feat.as_ref())
    }
    pub fn year(&self, ntype: NodeType) -> Option<&Tensor> {
        self.ndata.get(&ntype).and_then(|d| d.year.as_ref())
    }
    pub fn orig_ids(&self, ntype: NodeType) -> Option<&Tensor> {
        self.ndata.get(&ntype).and_then(|d| d.orig_id.as_ref())
    }

    pub fn set_feat(&mut self, ntype: NodeType, feat: Tensor) -> Result<()> {
        let (n, _) = feat.dims2()?;
        self.check_rows(ntype, n)?;
        self.ndata.entry(ntype).or_default().feat = Some(feat.to_dtype(DType::F32)?);
        Ok(())
    }
    pub fn set_year(&mut self, ntype: NodeType, year: Tensor) -> Result<()> {
        self.check_rows(ntype, year.dims1()?)?;
        self.ndata.entry(ntype).or_default().year = Some(year.to_dtype(DType::I64)?);
        Ok(())
    }
    pub fn set_orig_ids(&mut self, ntype: NodeType, ids: Tensor) -> Result<()> {
        self.check_rows(ntype, ids.dims1()?)?;
        self.ndata.entry(ntype).or_default().orig_id = Some(ids.to_dtype(DType::U32)?);
        Ok(())
    }

    pub fn add_edges(&mut self, etype: CanonicalEdgeType, src: Vec<u32>, dst: Vec<u32>) -> Result<()> {
        if src.len() != dst.len() {
            return Err(Error::Format(format!(
                "{etype:?}: {} sources but {} destinations",
                src.len(),
                dst.len()
            )));
        }
        self.check_ids(etype.0, src.iter())?;
        self.check_ids(etype.2, dst.iter())?;
        let num_edges = src.len();
        let mut edge_index = src;
        edge_index.extend(dst);
        let edge_index = Tensor::from_vec(edge_index, (2, num_edges), &self.device)?;
        self.edge_index.insert(etype, edge_index);
        Ok(())
    }
    pub fn with_edges(mut self, etype: CanonicalEdgeType, src: Vec<u32>, dst: Vec<u32>) -> Result<Self> {
        self.add_edges(etype, src, dst)?;
        Ok(self)
    }

    pub fn edge_index(&self, etype: CanonicalEdgeType) -> Result<&Tensor> {
        self.edge_index
            .get(&etype)
            .ok_or(Error::MissingRelation(etype))
    }
    pub fn edges(&self, etype: CanonicalEdgeType) -> Result<(Vec<u32>, Vec<u32>)> {
        let edge_index = self.edge_index(etype)?;
        Ok((
            edge_index.i((0, ..))?.to_vec1::<u32>()?,
            edge_index.i((1, ..))?.to_vec1::<u32>()?,
        ))
    }

    pub fn nodes(&self, ntype: NodeType) -> NodeSet {
        (0..self.num_nodes(ntype) as u32).collect()
    }

    pub fn nodes_with_year(&self, ntype: NodeType, year: i64) -> Result<NodeSet> {
        let years = self.year(ntype).ok_or(Error::MissingNodeData {
            ntype,
            field: "year",
        })?;
        let target = Tensor::full(year, years.dims1()?, years.device())?;
        let index = mask_to_index(&years.eq(&target)?)?;
        Ok(index_to_set(&index)?)
    }

    /// Unique neighbors of `ids` through one relation.
    pub fn typed_neighbors(
        &self,
        ids: &NodeSet,
        etype: CanonicalEdgeType,
        direction: Direction,
    ) -> Result<NodeSet> {
        let (from_type, from_row, to_row) = match direction {
            Direction::Forward => (etype.0, 0, 1),
            Direction::Reverse => (etype.2, 1, 0),
        };
        self.check_ids(from_type, ids.iter())?;
        if ids.is_empty() {
            return Ok(NodeSet::new());
        }
        let edge_index = self.edge_index(etype)?;
        let from = edge_index.i((from_row, ..))?.to_vec1::<u32>()?;
        let to = edge_index.i((to_row, ..))?.to_vec1::<u32>()?;
        Ok(from
            .into_iter()
            .zip(to)
            .filter_map(|(u, v)| ids.contains(&u).then_some(v))
            .collect())
    }

    pub fn out_degrees(&self, etype: CanonicalEdgeType) -> Result<Vec<u32>> {
        let mut degrees = vec![0u32; self.num_nodes(etype.0)];
        for u in self.edge_index(etype)?.i((0, ..))?.to_vec1::<u32>()? {
            degrees[u as usize] += 1;
        }
        Ok(degrees)
    }

    fn check_rows(&self, ntype: NodeType, rows: usize) -> Result<()> {
        let num_nodes = self.num_nodes(ntype);
        if rows != num_nodes {
            return Err(Error::Format(format!(
                "{ntype}: {rows} rows for {num_nodes} nodes"
            )));
        }
        Ok(())
    }
    pub(crate) fn check_ids<'a>(&self, ntype: NodeType, ids: impl Iterator<Item = &'a u32>) -> Result<()> {
        let num_nodes = self.num_nodes(ntype);
        for &id in ids {
            if id as usize >= num_nodes {
                return Err(Error::NodeOutOfRange {
                    ntype,
                    id,
                    num_nodes,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for HeteroGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "HeteroGraph(")?;
        for (&ntype, &n) in &self.num_nodes {
            let mut attrs = Vec::new();
            if let Some(data) = self.ndata.get(&ntype) {
                for (name, t) in [("feat", &data.feat), ("year", &data.year), ("_ID", &data.orig_id)] {
                    if let Some(t) = t {
                        attrs.push(format!("{name}: {:?} {:?}", t.dtype(), t.dims()));
                    }
                }
            }
            writeln!(f, "  {ntype}: {n} nodes [{}]", attrs.iter().join(", "))?;
        }
        for (etype, ei) in &self.edge_index {
            writeln!(f, "  ({}, {}, {}): {} edges", etype.0, etype.1, etype.2, ei.dims()[1])?;
        }
        write!(f, ")")
    }
}
