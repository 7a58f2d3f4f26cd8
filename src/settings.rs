//! Run configuration.
//!
//! Every field has a default, so a bare run needs no file. Values can be
//! overridden from a TOML file and from `MAG__`-prefixed environment variables,
//! e.g. `MAG__SELECTION__YEARS=2015,2016`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    /// Zip archive extracted when the raw files are missing
    #[serde(default = "default_raw_archive")]
    pub raw_archive: PathBuf,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_download_name")]
    pub download_name: String,
    #[serde(default = "default_split")]
    pub split: String,
    #[serde(default = "default_timeout")]
    pub download_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectionConfig {
    /// Years an author must have published in, every one of them
    #[serde(default = "default_years", deserialize_with = "deserialize_years")]
    pub years: Vec<i64>,
    /// Authors must have more `writes` edges than this; 0 disables the filter
    #[serde(default)]
    pub author_degree_threshold: u32,
    #[serde(default)]
    pub fail_on_empty: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_full_graph")]
    pub full_graph: PathBuf,
    #[serde(default = "default_sub_graphs")]
    pub sub_graphs: PathBuf,
    #[serde(default = "default_labels")]
    pub labels: PathBuf,
}

fn default_name() -> String { "ogbn-mag".to_string() }
fn default_data_root() -> PathBuf { PathBuf::from("data") }
fn default_raw_archive() -> PathBuf { PathBuf::from("data/ogb_raw/mag.zip") }
fn default_url() -> String { "https://snap.stanford.edu/ogb/data/nodeproppred/mag.zip".to_string() }
fn default_version() -> u32 { 2 }
fn default_download_name() -> String { "mag".to_string() }
fn default_split() -> String { "time".to_string() }
fn default_timeout() -> u64 { 3600 }
fn default_years() -> Vec<i64> { (2010..=2019).collect() }
fn default_full_graph() -> PathBuf { PathBuf::from("data/ogb_processed/full_graph.npz") }
fn default_sub_graphs() -> PathBuf { PathBuf::from("data/ogb_processed/sub_graphs.npz") }
fn default_labels() -> PathBuf { PathBuf::from("data/ogb_processed/labels.npz") }

/// Accepts `[2015, 2016]`, `2015` and `"2015,2016"`.
fn deserialize_years<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Item {
        Year(i64),
        Text(String),
    }
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Years {
        Many(Vec<Item>),
        One(Item),
    }

    let items = match Years::deserialize(deserializer)? {
        Years::Many(items) => items,
        Years::One(item) => vec![item],
    };
    let mut years = Vec::new();
    for item in items {
        match item {
            Item::Year(year) => years.push(year),
            Item::Text(text) => {
                for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    years.push(part.parse().map_err(serde::de::Error::custom)?);
                }
            }
        }
    }
    Ok(years)
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_root: default_data_root(),
            raw_archive: default_raw_archive(),
            url: default_url(),
            version: default_version(),
            download_name: default_download_name(),
            split: default_split(),
            download_timeout_secs: default_timeout(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            years: default_years(),
            author_degree_threshold: 0,
            fail_on_empty: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            full_graph: default_full_graph(),
            sub_graphs: default_sub_graphs(),
            labels: default_labels(),
        }
    }
}

impl ExtractConfig {
    /// Defaults, then the optional TOML file, then `MAG__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("MAG")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("selection.years")
            .try_parsing(true)
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder.add_source(env).build()?.try_deserialize()
    }
}

impl DatasetConfig {
    /// `<data_root>/<name with '-' as '_'>`, or its `_dgl` variant when a
    /// previous download left one behind.
    pub fn root(&self) -> PathBuf {
        let dir = self.name.replace('-', "_");
        let previous = self.data_root.join(format!("{dir}_dgl"));
        if previous.is_dir() {
            previous
        } else {
            self.data_root.join(dir)
        }
    }
}
