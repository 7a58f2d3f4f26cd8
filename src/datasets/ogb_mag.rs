use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use candle_core::{Device, Tensor};
use flate2::read::GzDecoder;
use regex::Regex;

use super::traits::Dataset;
use super::utils::{column_f32, column_i64, column_u32, download, extract_zip, read_csv_gz};
use crate::graph::{io, HeteroGraph, LabelDict, NodeType};
use crate::settings::DatasetConfig;

#[derive(Debug, Clone)]
pub struct SplitIdx {
    pub train: HashMap<NodeType, Tensor>,
    pub valid: HashMap<NodeType, Tensor>,
    pub test: HashMap<NodeType, Tensor>,
}

/// The OGB `ogbn-mag` node property prediction dataset.
///
/// Layout under `<data_root>/ogbn_mag`:
/// - `RELEASE_v<version>.txt`
/// - `raw/`: the gzip CSV files shipped in the OGB archive
/// - `processed/graph.npz`, `processed/labels.npz`: parsed cache
/// - `split/<split>/<ntype>/{train,valid,test}.csv.gz`
#[derive(Debug, Clone)]
pub struct OgbMag {
    config: DatasetConfig,
    device: Device,
}
impl OgbMag {
    const GRAPH_FILE: &'static str = "graph.npz";
    const LABEL_FILE: &'static str = "labels.npz";

    pub fn new(config: &DatasetConfig, device: &Device) -> Self {
        Self {
            config: config.clone(),
            device: device.clone(),
        }
    }
    pub fn root(&self) -> PathBuf {
        self.config.root()
    }
    fn raw_dir(&self) -> PathBuf {
        self.root().join("raw")
    }
    fn processed_dir(&self) -> PathBuf {
        self.root().join("processed")
    }

    /// Fails if an existing dataset directory is not the configured release.
    pub fn check_version(&self) -> Result<()> {
        let root = self.root();
        let expected = format!("RELEASE_v{}.txt", self.config.version);
        if !root.is_dir() || root.join(&expected).exists() {
            return Ok(());
        }
        let regex = Regex::new(r"^RELEASE_v(\d+)\.txt$")?;
        let mut found = Vec::new();
        for entry in std::fs::read_dir(&root)? {
            let name = entry?.file_name();
            if let Some(c) = regex.captures(&name.to_string_lossy()) {
                found.push(c[1].to_owned());
            }
        }
        bail!(
            "{} at {} is release {:?}, expected v{}; remove the directory to rebuild it",
            self.config.name,
            root.display(),
            found,
            self.config.version
        )
    }

    pub fn prepare_data(&self) -> Result<()> {
        if self.raw_dir().join("triplet-type-list.csv.gz").exists() {
            return Ok(());
        }
        let archive = &self.config.raw_archive;
        if !archive.exists() {
            tracing::info!(url = %self.config.url, path = %archive.display(), "downloading archive");
            download(&self.config.url, archive, self.config.download_timeout_secs)?;
        }
        tracing::info!(path = %archive.display(), "extracting archive");
        extract_zip(archive, &self.config.data_root)?;

        let root = self.root();
        if root.exists() {
            std::fs::remove_dir_all(&root)?;
        }
        let extracted = self.config.data_root.join(&self.config.download_name);
        std::fs::rename(&extracted, &root).with_context(|| {
            format!("failed to move {} to {}", extracted.display(), root.display())
        })?;
        Ok(())
    }

    pub fn from_raw(&self) -> Result<(HeteroGraph, LabelDict)> {
        let raw = self.raw_dir();

        let num_node_df = read_csv_gz(raw.join("num-node-dict.csv.gz"), true)?;
        let mut num_nodes = BTreeMap::new();
        for (idx, col) in num_node_df.get_columns().iter().enumerate() {
            let ntype: NodeType = col.name().parse()?;
            let count = column_u32(&num_node_df, idx)?
                .first()
                .copied()
                .ok_or_else(|| anyhow!("no node count for {ntype}"))?;
            num_nodes.insert(ntype, count as usize);
        }
        let mut graph = HeteroGraph::new(num_nodes, &self.device);

        for line in read_gz_lines(raw.join("triplet-type-list.csv.gz"))? {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            let [src, rel, dst] = parts[..] else {
                bail!("malformed triplet `{line}`");
            };
            let etype = (src.parse()?, rel.parse()?, dst.parse()?);
            let path = raw
                .join("relations")
                .join(format!("{src}___{rel}___{dst}"))
                .join("edge.csv.gz");
            let edge_df = read_csv_gz(&path, false)?;
            let (source, target) = if edge_df.width() == 0 {
                (Vec::new(), Vec::new())
            } else {
                (column_u32(&edge_df, 0)?, column_u32(&edge_df, 1)?)
            };
            tracing::debug!(relation = %line, edges = source.len(), "read relation");
            graph.add_edges(etype, source, target)?;
        }

        let mut labels = LabelDict::new();
        for ntype in NodeType::ALL {
            let feat_dir = raw.join("node-feat").join(ntype.to_string());
            let path = feat_dir.join("node-feat.csv.gz");
            if path.exists() {
                graph.set_feat(ntype, read_features(&path, &self.device)?)?;
            }
            let path = feat_dir.join("node_year.csv.gz");
            if path.exists() {
                let year = column_i64(&read_csv_gz(&path, false)?, 0)?;
                let n = year.len();
                graph.set_year(ntype, Tensor::from_vec(year, n, &self.device)?)?;
            }
            let path = raw
                .join("node-label")
                .join(ntype.to_string())
                .join("node-label.csv.gz");
            if path.exists() {
                let label = column_i64(&read_csv_gz(&path, false)?, 0)?;
                let n = label.len();
                labels.insert(ntype, Tensor::from_vec(label, n, &self.device)?);
            }
        }
        Ok((graph, labels))
    }

    pub fn from_processed(&self) -> Result<(HeteroGraph, LabelDict)> {
        let path = self.processed_dir();
        let graph = io::load_graph(path.join(Self::GRAPH_FILE), &self.device)?;
        let labels = io::load_label_dict(path.join(Self::LABEL_FILE), &self.device)?;
        Ok((graph, labels))
    }

    pub fn split_idx(&self) -> Result<SplitIdx> {
        let path = self.root().join("split").join(&self.config.split);
        let mut parts: [HashMap<NodeType, Tensor>; 3] = Default::default();
        for ntype in NodeType::ALL {
            let dir = path.join(ntype.to_string());
            if !dir.is_dir() {
                continue;
            }
            for (part, name) in parts.iter_mut().zip(["train", "valid", "test"]) {
                let df = read_csv_gz(dir.join(format!("{name}.csv.gz")), false)?;
                let idx = if df.width() == 0 { Vec::new() } else { column_u32(&df, 0)? };
                let n = idx.len();
                part.insert(ntype, Tensor::from_vec(idx, n, &self.device)?);
            }
        }
        let [train, valid, test] = parts;
        Ok(SplitIdx { train, valid, test })
    }
}

impl Dataset for OgbMag {
    fn load(&self) -> Result<(HeteroGraph, LabelDict)> {
        self.check_version()?;
        let processed = self.processed_dir();
        if processed.join(Self::GRAPH_FILE).exists() && processed.join(Self::LABEL_FILE).exists() {
            tracing::info!(path = %processed.display(), "loading processed dataset");
            return self.from_processed();
        }
        self.prepare_data()?;
        tracing::info!(path = %self.raw_dir().display(), "processing raw dataset");
        let (graph, labels) = self.from_raw()?;
        io::save_graph(processed.join(Self::GRAPH_FILE), &graph)?;
        io::save_label_dict(processed.join(Self::LABEL_FILE), &labels)?;
        Ok((graph, labels))
    }
}

fn read_gz_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let reader = BufReader::new(GzDecoder::new(
        File::open(path).with_context(|| format!("missing {}", path.display()))?,
    ));
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Row-major (n, d) feature matrix from a header-less CSV with d columns.
fn read_features(path: &Path, device: &Device) -> Result<Tensor> {
    let df = read_csv_gz(path, false)?;
    let (n, d) = (df.height(), df.width());
    let mut xs = Vec::with_capacity(n * d);
    for idx in 0..d {
        xs.extend(column_f32(&df, idx)?);
    }
    Ok(Tensor::from_vec(xs, (d, n), device)?.t()?.contiguous()?)
}
