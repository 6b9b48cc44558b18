//! Target descriptor files.
//!
//! Two-column CSV tables with the header `commentId,threadKindCode`, one
//! target per row. Rows with an unknown kind code are skipped at this
//! boundary, never defaulted.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{AppError, Result};
use crate::models::{Target, ThreadKind};

/// Load every `*.csv` descriptor file in `dir`, in file-name order.
///
/// A missing directory yields no targets. An unreadable file is logged and
/// skipped so one bad file does not hide the others.
pub async fn load_descriptors(dir: &Path) -> Result<Vec<Target>> {
    let files = descriptor_files(dir).await?;
    let mut targets = Vec::new();

    for file in files {
        match load_file(&file).await {
            Ok(mut loaded) => targets.append(&mut loaded),
            Err(e) => warn!(file = %file.display(), error = %e, "skipping descriptor file"),
        }
    }
    Ok(targets)
}

/// Sorted `*.csv` files directly inside `dir`.
pub async fn descriptor_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::Io(e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn load_file(path: &Path) -> Result<Vec<Target>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(parse_descriptors(&bytes, &path.display().to_string()))
}

/// Parse descriptor rows, skipping the header and any invalid row.
pub fn parse_descriptors(bytes: &[u8], source: &str) -> Vec<Target> {
    // Excel-saved files may carry a UTF-8 BOM.
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut targets = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(source, line, error = %e, "unreadable descriptor row");
                continue;
            }
        };

        let (Some(object_id), Some(code)) = (record.get(0), record.get(1)) else {
            warn!(source, line, "descriptor row has fewer than two columns");
            continue;
        };
        if object_id.is_empty() {
            warn!(source, line, "descriptor row has an empty id");
            continue;
        }

        let kind = code
            .parse::<u32>()
            .map_err(|e| AppError::validation(format!("kind code '{code}': {e}")))
            .and_then(ThreadKind::from_code);
        match kind {
            Ok(kind) => targets.push(Target::new(object_id, kind)),
            Err(e) => warn!(source, line, error = %e, "rejecting descriptor row"),
        }
    }
    targets
}
