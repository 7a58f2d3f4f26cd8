use std::{
    fs::File,
    io::{Cursor, Read},
    path::Path,
};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use polars::{
    io::SerReader,
    prelude::{CsvReader, DataFrame, DataType},
};
use zip::ZipArchive;

pub struct RemoteFile {
    response: reqwest::blocking::Response,
    current_size: usize,
    pbar: Option<ProgressBar>,
}
impl RemoteFile {
    pub fn with_pbar(url: &str, timeout: u64) -> Result<Self> {
        Self::with_config(url, timeout, true)
    }
    pub fn with_config(url: &str, timeout: u64, pbar: bool) -> Result<Self> {
        let client = reqwest::blocking::Client::new();
        let response = client
            .get(url)
            .timeout(std::time::Duration::from_secs(timeout))
            .send()?
            .error_for_status()?;
        let total_size = response.content_length();

        let pbar = if pbar {
            let pbar = match total_size {
                Some(total_size) => {
                    let pbar = ProgressBar::new(total_size);
                    pbar.set_style(ProgressStyle::default_bar()
                        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
                        .progress_chars("#>-"));
                    pbar
                }
                None => ProgressBar::new_spinner(),
            };
            pbar.set_message(format!("Downloading {}", url));
            Some(pbar)
        } else {
            None
        };
        Ok(Self {
            response,
            current_size: 0,
            pbar,
        })
    }
    fn update(&mut self, size: usize) {
        self.current_size += size;
        if let Some(pbar) = &self.pbar {
            pbar.set_position(self.current_size as u64);
        }
    }
}

impl std::io::Read for RemoteFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let size = self.response.read(buf)?;
        self.update(size);
        if size == 0 {
            if let Some(pbar) = &self.pbar {
                pbar.finish();
            }
        }
        Ok(size)
    }
}

pub fn download<P: AsRef<Path>>(url: &str, path: P, timeout: u64) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut remote_file = RemoteFile::with_pbar(url, timeout)?;
    let mut local_file = tempfile::NamedTempFile::new_in(path.parent().unwrap_or(Path::new(".")))?;
    std::io::copy(&mut remote_file, &mut local_file)?;
    local_file.persist(path)?;
    Ok(())
}

pub fn extract_zip<P: AsRef<Path>, Q: AsRef<Path>>(archive: P, dest: Q) -> Result<()> {
    let file = File::open(archive.as_ref())
        .with_context(|| format!("failed to open {}", archive.as_ref().display()))?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(dest)?;
    Ok(())
}

pub fn read_csv_gz<P: AsRef<Path>>(path: P, has_header: bool) -> Result<DataFrame> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    GzDecoder::new(File::open(path).with_context(|| format!("missing {}", path.display()))?)
        .read_to_end(&mut buf)?;
    if buf.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(DataFrame::empty());
    }
    let df = CsvReader::new(Cursor::new(buf))
        .has_header(has_header)
        .finish()
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(df)
}

pub fn column_u32(df: &DataFrame, idx: usize) -> Result<Vec<u32>> {
    let col = df.select_at_idx(idx).context("column out of range")?;
    let values = col.cast(&DataType::UInt32)?;
    let values = values.u32()?;
    anyhow::ensure!(values.null_count() == 0, "column {} has nulls", col.name());
    Ok(values.into_no_null_iter().collect())
}

pub fn column_i64(df: &DataFrame, idx: usize) -> Result<Vec<i64>> {
    let col = df.select_at_idx(idx).context("column out of range")?;
    let values = col.cast(&DataType::Int64)?;
    let values = values.i64()?;
    anyhow::ensure!(values.null_count() == 0, "column {} has nulls", col.name());
    Ok(values.into_no_null_iter().collect())
}

pub fn column_f32(df: &DataFrame, idx: usize) -> Result<Vec<f32>> {
    let col = df.select_at_idx(idx).context("column out of range")?;
    let values = col.cast(&DataType::Float32)?;
    let values = values.f32()?;
    anyhow::ensure!(values.null_count() == 0, "column {} has nulls", col.name());
    Ok(values.into_no_null_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    #[test]
    fn gz_csv_columns() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("edge.csv.gz");
        let mut enc = GzEncoder::new(File::create(&path)?, Compression::default());
        enc.write_all(b"0,1\n2,3\n4,5\n")?;
        enc.finish()?;

        let df = read_csv_gz(&path, false)?;
        assert_eq!(df.height(), 3);
        assert_eq!(column_u32(&df, 0)?, vec![0, 2, 4]);
        assert_eq!(column_f32(&df, 1)?, vec![1., 3., 5.]);
        Ok(())
    }
}
