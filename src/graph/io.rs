//! `.npz` persistence for graphs, graph sequences and label arrays.
//!
//! A graph is stored as flat named arrays:
//! `num_nodes/<ntype>`, `feat/<ntype>`, `year/<ntype>`, `_ID/<ntype>` and
//! `edge_index/<src>/<etype>/<dst>`. A sequence stores `len` and prefixes the
//! keys of graph `i` with `<i>/`.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{Device, Tensor};

use super::{HeteroGraph, LabelDict, NodeType};
use crate::error::{Error, Result};

type Named = HashMap<String, Tensor>;

pub fn save_graph<P: AsRef<Path>>(path: P, graph: &HeteroGraph) -> Result<()> {
    write_atomically(path.as_ref(), &encode_graph(graph, "")?)
}

pub fn load_graph<P: AsRef<Path>>(path: P, device: &Device) -> Result<HeteroGraph> {
    decode_graph(&mut read(path.as_ref(), device)?, "", device)
}

pub fn save_graphs<P: AsRef<Path>>(path: P, graphs: &[HeteroGraph]) -> Result<()> {
    let mut tensors = vec![(
        "len".to_owned(),
        Tensor::new(&[graphs.len() as u32], &Device::Cpu)?,
    )];
    for (i, graph) in graphs.iter().enumerate() {
        tensors.extend(encode_graph(graph, &format!("{i}/"))?);
    }
    write_atomically(path.as_ref(), &tensors)
}

pub fn load_graphs<P: AsRef<Path>>(path: P, device: &Device) -> Result<Vec<HeteroGraph>> {
    let mut named = read(path.as_ref(), device)?;
    let len = take_count(&mut named, "len")?;
    (0..len)
        .map(|i| decode_graph(&mut named, &format!("{i}/"), device))
        .collect()
}

/// Writes a single label array under the key `labels`.
pub fn save_labels<P: AsRef<Path>>(path: P, labels: &Tensor) -> Result<()> {
    write_atomically(path.as_ref(), &[("labels".to_owned(), labels.clone())])
}

pub fn load_labels<P: AsRef<Path>>(path: P, device: &Device) -> Result<Tensor> {
    take(&mut read(path.as_ref(), device)?, "labels")
}

pub fn save_label_dict<P: AsRef<Path>>(path: P, labels: &LabelDict) -> Result<()> {
    let tensors: Vec<(String, Tensor)> = labels
        .iter()
        .map(|(ntype, t)| (format!("label/{ntype}"), t.clone()))
        .collect();
    write_atomically(path.as_ref(), &tensors)
}

pub fn load_label_dict<P: AsRef<Path>>(path: P, device: &Device) -> Result<LabelDict> {
    read(path.as_ref(), device)?
        .into_iter()
        .map(|(key, t)| {
            let ntype = key
                .strip_prefix("label/")
                .ok_or_else(|| Error::Format(key.clone()))?
                .parse::<NodeType>()?;
            Ok((ntype, t))
        })
        .collect()
}

fn encode_graph(graph: &HeteroGraph, prefix: &str) -> Result<Vec<(String, Tensor)>> {
    let device = &Device::Cpu;
    let mut tensors = Vec::new();
    for ntype in NodeType::ALL {
        tensors.push((
            format!("{prefix}num_nodes/{ntype}"),
            Tensor::new(&[graph.num_nodes(ntype) as u32], device)?,
        ));
        let Some(data) = graph.ndata(ntype) else {
            continue;
        };
        for (name, t) in [("feat", &data.feat), ("year", &data.year), ("_ID", &data.orig_id)] {
            if let Some(t) = t {
                tensors.push((format!("{prefix}{name}/{ntype}"), t.to_device(device)?.contiguous()?));
            }
        }
    }
    for etype in graph.relations() {
        let (src, rel, dst) = etype;
        tensors.push((
            format!("{prefix}edge_index/{src}/{rel}/{dst}"),
            graph.edge_index(etype)?.to_device(device)?.contiguous()?,
        ));
    }
    Ok(tensors)
}

fn decode_graph(named: &mut Named, prefix: &str, device: &Device) -> Result<HeteroGraph> {
    let mut num_nodes = Vec::new();
    for ntype in NodeType::ALL {
        num_nodes.push((ntype, take_count(named, &format!("{prefix}num_nodes/{ntype}"))?));
    }
    let mut graph = HeteroGraph::new(num_nodes, device);
    for ntype in NodeType::ALL {
        if let Some(feat) = named.remove(&format!("{prefix}feat/{ntype}")) {
            graph.set_feat(ntype, feat)?;
        }
        if let Some(year) = named.remove(&format!("{prefix}year/{ntype}")) {
            graph.set_year(ntype, year)?;
        }
        if let Some(ids) = named.remove(&format!("{prefix}_ID/{ntype}")) {
            graph.set_orig_ids(ntype, ids)?;
        }
    }

    let edge_prefix = format!("{prefix}edge_index/");
    let keys: Vec<String> = named
        .keys()
        .filter(|k| k.starts_with(&edge_prefix))
        .cloned()
        .collect();
    for key in keys {
        let parts: Vec<&str> = key[edge_prefix.len()..].split('/').collect();
        let [src, rel, dst] = parts[..] else {
            return Err(Error::Format(key.clone()));
        };
        let etype = (src.parse()?, rel.parse()?, dst.parse()?);
        let edge_index = take(named, &key)?;
        let src = edge_index.get(0)?.to_vec1::<u32>()?;
        let dst = edge_index.get(1)?.to_vec1::<u32>()?;
        graph.add_edges(etype, src, dst)?;
    }
    Ok(graph)
}

fn read(path: &Path, device: &Device) -> Result<Named> {
    Tensor::read_npz(path)?
        .into_iter()
        .map(|(name, t)| Ok((name, t.to_device(device)?)))
        .collect()
}

fn take(named: &mut Named, key: &str) -> Result<Tensor> {
    named
        .remove(key)
        .ok_or_else(|| Error::Format(format!("missing array `{key}`")))
}

fn take_count(named: &mut Named, key: &str) -> Result<usize> {
    let values = take(named, key)?.to_vec1::<u32>()?;
    match values[..] {
        [n] => Ok(n as usize),
        _ => Err(Error::Format(format!("`{key}` is not a count"))),
    }
}

/// Writes next to `path` and renames into place, creating parent directories.
fn write_atomically(path: &Path, tensors: &[(String, Tensor)]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let tmp = tempfile::Builder::new().suffix(".npz").tempfile_in(dir)?;
    Tensor::write_npz(tensors, tmp.path())?;
    tmp.persist(path).map_err(|e| e.error)?;
    tracing::debug!(path = %path.display(), arrays = tensors.len(), "saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{HAS_TOPIC, WRITES};

    fn sample() -> Result<HeteroGraph> {
        let device = Device::Cpu;
        let mut g = HeteroGraph::new(
            [(NodeType::Author, 2), (NodeType::Paper, 2), (NodeType::FieldOfStudy, 1)],
            &device,
        )
        .with_edges(WRITES, vec![0, 1], vec![1, 0])?
        .with_edges(HAS_TOPIC, vec![], vec![])?;
        g.set_feat(NodeType::Paper, Tensor::new(&[[0.5f32, 1.5], [2., 3.]], &device)?)?;
        g.set_year(NodeType::Paper, Tensor::new(&[2011i64, 2012], &device)?)?;
        g.set_orig_ids(NodeType::Author, Tensor::new(&[4u32, 9], &device)?)?;
        Ok(g)
    }

    #[test]
    fn graph_survives_a_save_load_cycle() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested/graph.npz");
        save_graph(&path, &sample()?)?;

        let g = load_graph(&path, &Device::Cpu)?;
        assert_eq!(g.num_nodes(NodeType::Author), 2);
        assert_eq!(g.num_nodes(NodeType::Institution), 0);
        assert_eq!(g.edges(WRITES)?, (vec![0, 1], vec![1, 0]));
        assert_eq!(g.num_edges(HAS_TOPIC), 0);
        assert_eq!(g.year(NodeType::Paper).unwrap().to_vec1::<i64>()?, vec![2011, 2012]);
        assert_eq!(g.orig_ids(NodeType::Author).unwrap().to_vec1::<u32>()?, vec![4, 9]);
        assert!(g.feat(NodeType::Author).is_none());
        Ok(())
    }

    #[test]
    fn sequence_keeps_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("seq.npz");
        let first = sample()?;
        let second = HeteroGraph::new([(NodeType::Paper, 5)], &Device::Cpu);
        save_graphs(&path, &[first, second])?;

        let graphs = load_graphs(&path, &Device::Cpu)?;
        assert_eq!(graphs.len(), 2);
        assert_eq!(graphs[0].num_nodes(NodeType::Paper), 2);
        assert_eq!(graphs[1].num_nodes(NodeType::Paper), 5);
        assert!(!graphs[1].has_relation(WRITES));
        Ok(())
    }

    #[test]
    fn labels_and_label_dicts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let labels = Tensor::new(&[3i64, 0, 7], &Device::Cpu)?;
        save_labels(dir.path().join("labels.npz"), &labels)?;
        let loaded = load_labels(dir.path().join("labels.npz"), &Device::Cpu)?;
        assert_eq!(loaded.to_vec1::<i64>()?, vec![3, 0, 7]);

        let dict = LabelDict::from([(NodeType::Paper, labels)]);
        save_label_dict(dir.path().join("dict.npz"), &dict)?;
        let dict = load_label_dict(dir.path().join("dict.npz"), &Device::Cpu)?;
        assert_eq!(dict[&NodeType::Paper].to_vec1::<i64>()?, vec![3, 0, 7]);
        Ok(())
    }
}
