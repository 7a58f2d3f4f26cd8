use std::{fs::File, io::Write, path::Path};

use anyhow::Result;
use candle_core::Device;
use flate2::{write::GzEncoder, Compression};
use mag_longitudinal::datasets::{Dataset, OgbMag};
use mag_longitudinal::graph::{NodeType, AFFILIATED_WITH, CITES, HAS_TOPIC, WRITES};
use mag_longitudinal::settings::DatasetConfig;

fn gz(text: &str) -> Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(text.as_bytes())?;
    Ok(enc.finish()?)
}

/// A three-paper MAG in the OGB raw layout, paths relative to the dataset dir.
fn mag_files(release: u32) -> Result<Vec<(String, Vec<u8>)>> {
    let rel = |name: &str| format!("raw/relations/{name}/edge.csv.gz");
    Ok(vec![
        (format!("RELEASE_v{release}.txt"), Vec::new()),
        (
            "raw/num-node-dict.csv.gz".to_owned(),
            gz("author,field_of_study,institution,paper\n2,3,2,3\n")?,
        ),
        (
            "raw/triplet-type-list.csv.gz".to_owned(),
            gz("author,affiliated_with,institution\nauthor,writes,paper\npaper,cites,paper\npaper,has_topic,field_of_study\n")?,
        ),
        (rel("author___affiliated_with___institution"), gz("0,0\n1,1\n")?),
        (rel("author___writes___paper"), gz("0,0\n0,1\n1,2\n")?),
        (rel("paper___cites___paper"), gz("2,0\n1,0\n")?),
        (rel("paper___has_topic___field_of_study"), gz("0,0\n2,1\n1,2\n0,2\n")?),
        (
            "raw/node-feat/paper/node-feat.csv.gz".to_owned(),
            gz("1.0,0.0\n3.0,2.0\n5.0,5.0\n")?,
        ),
        (
            "raw/node-feat/paper/node_year.csv.gz".to_owned(),
            gz("2010\n2011\n2010\n")?,
        ),
        (
            "raw/node-label/paper/node-label.csv.gz".to_owned(),
            gz("10\n11\n12\n")?,
        ),
        ("split/time/paper/train.csv.gz".to_owned(), gz("0\n1\n")?),
        ("split/time/paper/valid.csv.gz".to_owned(), gz("2\n")?),
        ("split/time/paper/test.csv.gz".to_owned(), gz("")?),
    ])
}

fn write_tree(dir: &Path, files: &[(String, Vec<u8>)]) -> Result<()> {
    for (name, bytes) in files {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap())?;
        std::fs::write(path, bytes)?;
    }
    Ok(())
}

fn config(data_root: &Path) -> DatasetConfig {
    DatasetConfig {
        data_root: data_root.to_path_buf(),
        raw_archive: data_root.join("ogb_raw/mag.zip"),
        url: "http://127.0.0.1:9/unreachable.zip".to_owned(),
        ..DatasetConfig::default()
    }
}

#[test]
fn parses_raw_files_and_caches_them() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(dir.path());
    write_tree(&config.root(), &mag_files(2)?)?;
    let dataset = OgbMag::new(&config, &Device::Cpu);

    let (graph, labels) = dataset.load()?;
    assert_eq!(graph.num_nodes(NodeType::Author), 2);
    assert_eq!(graph.num_nodes(NodeType::FieldOfStudy), 3);
    assert_eq!(graph.edges(WRITES)?, (vec![0, 0, 1], vec![0, 1, 2]));
    assert_eq!(graph.num_edges(AFFILIATED_WITH), 2);
    assert_eq!(graph.num_edges(CITES), 2);
    assert_eq!(graph.num_edges(HAS_TOPIC), 4);
    assert_eq!(
        graph.feat(NodeType::Paper).unwrap().to_vec2::<f32>()?,
        vec![vec![1., 0.], vec![3., 2.], vec![5., 5.]]
    );
    assert_eq!(
        graph.year(NodeType::Paper).unwrap().to_vec1::<i64>()?,
        vec![2010, 2011, 2010]
    );
    assert_eq!(labels[&NodeType::Paper].to_vec1::<i64>()?, vec![10, 11, 12]);
    assert!(config.root().join("processed/graph.npz").exists());

    // second load must come from the processed cache
    std::fs::remove_dir_all(config.root().join("raw"))?;
    let (graph, labels) = dataset.load()?;
    assert_eq!(graph.edges(WRITES)?, (vec![0, 0, 1], vec![0, 1, 2]));
    assert_eq!(labels[&NodeType::Paper].to_vec1::<i64>()?, vec![10, 11, 12]);
    Ok(())
}

#[test]
fn extracts_the_archive_when_raw_files_are_missing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(dir.path());
    std::fs::create_dir_all(config.raw_archive.parent().unwrap())?;
    let mut zip = zip::ZipWriter::new(File::create(&config.raw_archive)?);
    for (name, bytes) in mag_files(2)? {
        zip.start_file(format!("mag/{name}"), zip::write::FileOptions::default())?;
        zip.write_all(&bytes)?;
    }
    zip.finish()?;

    let (graph, _) = OgbMag::new(&config, &Device::Cpu).load()?;
    assert_eq!(graph.num_nodes(NodeType::Paper), 3);
    assert!(config.root().join("RELEASE_v2.txt").exists());
    assert!(!dir.path().join("mag").exists());
    assert!(config.raw_archive.exists());
    Ok(())
}

#[test]
fn stale_release_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(dir.path());
    write_tree(&config.root(), &mag_files(1)?)?;

    let err = OgbMag::new(&config, &Device::Cpu).load().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("[\"1\"]"), "{message}");
    assert!(message.contains("expected v2"), "{message}");
    Ok(())
}

#[test]
fn reads_the_time_split() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config(dir.path());
    write_tree(&config.root(), &mag_files(2)?)?;

    let split = OgbMag::new(&config, &Device::Cpu).split_idx()?;
    assert_eq!(split.train[&NodeType::Paper].to_vec1::<u32>()?, vec![0, 1]);
    assert_eq!(split.valid[&NodeType::Paper].to_vec1::<u32>()?, vec![2]);
    assert_eq!(split.test[&NodeType::Paper].dims(), &[0]);
    assert!(!split.train.contains_key(&NodeType::Author));
    Ok(())
}
