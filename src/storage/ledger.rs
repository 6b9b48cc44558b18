//! Completion ledger: the record of targets already crawled to the end.
//!
//! One tab-separated line per completed target:
//!
//! ```text
//! {objectId}\t{threadKindCode}\t{kindLabel}\t{RFC 3339 timestamp}
//! ```
//!
//! Only the first two fields are interpreted. The file is opened in append
//! mode only and never rewritten.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Target;

#[derive(Debug)]
pub struct CompletionLedger {
    path: PathBuf,
    completed: HashSet<(String, u32)>,
}

impl CompletionLedger {
    /// Load the ledger at `path`; a missing file is an empty ledger.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(AppError::Io(e)),
        };

        let completed = content.lines().filter_map(parse_line).collect();
        Ok(Self { path, completed })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, target: &Target) -> bool {
        self.completed
            .contains(&(target.object_id.clone(), target.kind.code()))
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Append a completion line for `target` and sync it.
    pub async fn record(&mut self, target: &Target) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let line = format!(
            "{}\t{}\t{}\t{}\n",
            target.object_id,
            target.kind.code(),
            target.kind.label(),
            Utc::now().to_rfc3339()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;

        self.completed
            .insert((target.object_id.clone(), target.kind.code()));
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<(String, u32)> {
    let mut fields = line.split('\t');
    let object_id = fields.next()?.trim();
    let code = fields.next()?.trim().parse().ok()?;
    if object_id.is_empty() {
        return None;
    }
    Some((object_id.to_string(), code))
}
