//! Local filesystem record sink.
//!
//! Destinations are paths relative to the sink's root directory (absolute
//! paths are used as given). Rows are CSV-encoded in memory per call, then
//! appended and synced before the call returns.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::RecordSink;

/// CSV files under a root directory.
#[derive(Debug, Clone)]
pub struct CsvSink {
    root_dir: PathBuf,
}

impl CsvSink {
    /// Create a new CsvSink rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a destination.
    pub fn path(&self, destination: &Path) -> PathBuf {
        self.root_dir.join(destination)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Append bytes to an existing file and sync them to disk.
    async fn append_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(path).await?;
        file.write_all(bytes).await?;
        file.sync_data().await?;
        Ok(())
    }

    /// Read every row of a destination, header first.
    pub async fn read_rows(&self, destination: &Path) -> Result<Vec<Vec<String>>> {
        let bytes = tokio::fs::read(self.path(destination)).await?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}

/// CSV-encode rows into one buffer.
fn encode_rows(rows: &[Vec<String>]) -> std::result::Result<Vec<u8>, String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).map_err(|e| e.to_string())?;
    }
    writer.into_inner().map_err(|e| e.error().to_string())
}

#[async_trait]
impl RecordSink for CsvSink {
    async fn initialize(&self, destination: &Path, header: &[String]) -> Result<()> {
        let path = self.path(destination);
        let bytes = encode_rows(&[header.to_vec()])
            .map_err(|e| AppError::persistence(path.display().to_string(), e))?;

        self.write_bytes(&path, &bytes)
            .await
            .map_err(|e| AppError::persistence(path.display().to_string(), e))
    }

    async fn append(&self, destination: &Path, rows: &[Vec<String>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let path = self.path(destination);
        let bytes =
            encode_rows(rows).map_err(|e| AppError::persistence(path.display().to_string(), e))?;

        self.append_bytes(&path, &bytes)
            .await
            .map_err(|e| AppError::persistence(path.display().to_string(), e))
    }

    async fn exists(&self, destination: &Path) -> bool {
        tokio::fs::try_exists(self.path(destination))
            .await
            .unwrap_or(false)
    }
}
