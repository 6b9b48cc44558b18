//! Writes comment records of one target to its destination.

use std::path::PathBuf;

use tracing::error;

use crate::error::Result;
use crate::models::{CommentRecord, RecordLayout};
use crate::storage::RecordSink;

/// Record writer bound to one destination.
///
/// Failed writes are counted and logged. They only propagate when
/// `strict` is set.
pub struct CommentWriter<'a> {
    sink: &'a dyn RecordSink,
    destination: PathBuf,
    layout: RecordLayout,
    strict: bool,
    written: usize,
    failures: usize,
}

impl<'a> CommentWriter<'a> {
    pub fn new(
        sink: &'a dyn RecordSink,
        destination: impl Into<PathBuf>,
        layout: RecordLayout,
        strict: bool,
    ) -> Self {
        Self {
            sink,
            destination: destination.into(),
            layout,
            strict,
            written: 0,
            failures: 0,
        }
    }

    /// Create the destination with this layout's header.
    pub async fn initialize(&self) -> Result<()> {
        self.sink
            .initialize(&self.destination, &self.layout.header())
            .await
    }

    /// Append `records` in order as one batch.
    pub async fn write(&mut self, records: &[CommentRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let rows: Vec<Vec<String>> = records.iter().map(|r| r.to_row(self.layout)).collect();
        match self.sink.append(&self.destination, &rows).await {
            Ok(()) => {
                self.written += records.len();
                Ok(())
            }
            Err(e) => {
                self.failures += 1;
                error!(
                    destination = %self.destination.display(),
                    records = records.len(),
                    error = %e,
                    kind = "persistence",
                    "failed to write records"
                );
                if self.strict { Err(e) } else { Ok(()) }
            }
        }
    }

    /// Records successfully appended so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Append calls that failed so far.
    pub fn failures(&self) -> usize {
        self.failures
    }
}
