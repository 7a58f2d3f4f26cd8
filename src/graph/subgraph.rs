use std::collections::HashMap;

use super::{HeteroGraph, NodeData, NodeSet, NodeType};
use crate::error::Result;
use crate::utils::{select_rows, set_to_index};

impl HeteroGraph {
    /// Restricts the graph to the given ids per node type.
    ///
    /// Kept nodes are renumbered `0..k` in ascending order of their current id
    /// and carry that id as `_ID`. Node types missing from `nodes` end up
    /// empty, and an edge survives only if both endpoints are kept.
    pub fn induced_subgraph(&self, nodes: &HashMap<NodeType, NodeSet>) -> Result<HeteroGraph> {
        let empty = NodeSet::new();
        let mut remap: HashMap<NodeType, Vec<Option<u32>>> = HashMap::new();
        let mut sub = HeteroGraph::new(
            NodeType::ALL.map(|t| (t, nodes.get(&t).map_or(0, |ids| ids.len()))),
            self.device(),
        );

        for ntype in NodeType::ALL {
            let ids = nodes.get(&ntype).unwrap_or(&empty);
            self.check_ids(ntype, ids.iter())?;

            let mut new_ids = vec![None; self.num_nodes(ntype)];
            for (new, &old) in ids.iter().enumerate() {
                new_ids[old as usize] = Some(new as u32);
            }
            remap.insert(ntype, new_ids);

            if let Some(NodeData { feat, year, .. }) = self.ndata(ntype) {
                if let Some(feat) = feat {
                    sub.set_feat(ntype, select_rows(feat, ids)?)?;
                }
                if let Some(year) = year {
                    sub.set_year(ntype, select_rows(year, ids)?)?;
                }
            }
            sub.set_orig_ids(ntype, set_to_index(ids, self.device())?)?;
        }

        for etype in self.relations() {
            let (src, dst) = self.edges(etype)?;
            let (src_map, dst_map) = (&remap[&etype.0], &remap[&etype.2]);
            let (src, dst): (Vec<u32>, Vec<u32>) = src
                .into_iter()
                .zip(dst)
                .filter_map(|(u, v)| Some((src_map[u as usize]?, dst_map[v as usize]?)))
                .unzip();
            sub.add_edges(etype, src, dst)?;
        }
        Ok(sub)
    }
}
