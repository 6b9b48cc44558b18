//! Storage abstractions for crawl output.
//!
//! - Comment tables: `{comments_dir}/{base}.csv`, header written once, rows appended
//! - Target descriptors: `{targets_dir}/*.csv`, read by `batch`, written by `discover`
//! - Completion ledger: `{ledger_file}`, one line per finished target
//!
//! ## Directory Structure
//!
//! ```text
//! data/
//! ├── config.toml           # Crawler configuration
//! ├── completed.log         # Completion ledger (append-only)
//! ├── targets/              # Descriptor files: commentId,threadKindCode
//! │   └── 12345.csv
//! └── comments/             # One table per target
//!     ├── some video title.csv
//!     └── dynamic_9876.csv
//! ```

pub mod descriptors;
pub mod ledger;
pub mod local;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use descriptors::load_descriptors;
pub use ledger::CompletionLedger;
pub use local::CsvSink;

/// Append-only persistence of flat rows to named destinations.
///
/// Each `append` call is durable on return: a crash afterwards keeps every
/// row written so far and the header intact.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Create or truncate `destination` and write `header` as its only row.
    async fn initialize(&self, destination: &Path, header: &[String]) -> Result<()>;

    /// Add `rows` after the existing content without touching the header.
    async fn append(&self, destination: &Path, rows: &[Vec<String>]) -> Result<()>;

    /// Whether `destination` already holds a table.
    async fn exists(&self, destination: &Path) -> bool;
}
