// src/pipeline/batch.rs

//! Batch crawling over target descriptor files.
//!
//! Targets are processed strictly one after another. A target already in
//! the completion ledger is skipped before any request is made, so an
//! interrupted batch can simply be run again.

use std::path::Path;

use tracing::{error, info, warn};

use crate::error::Result;
use crate::models::{Config, Target};
use crate::services::{RateLimitedFetcher, ThreadTraverser, TraversalOptions};
use crate::storage::{CompletionLedger, CsvSink, RecordSink, load_descriptors};
use crate::utils::log;

/// Aggregate result of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total: usize,
    /// Targets found in the ledger and not attempted
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: Vec<Target>,
}

impl BatchReport {
    /// True when no attempted target failed.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

/// Runs a list of targets through the thread traverser, recording every
/// completed one in the ledger.
pub struct BatchCoordinator<'a> {
    fetcher: &'a RateLimitedFetcher,
    traverser: ThreadTraverser<'a>,
    ledger: CompletionLedger,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(
        fetcher: &'a RateLimitedFetcher,
        sink: &'a dyn RecordSink,
        options: TraversalOptions,
        ledger: CompletionLedger,
    ) -> Self {
        Self {
            fetcher,
            traverser: ThreadTraverser::new(fetcher, sink, options),
            ledger,
        }
    }

    /// Process `targets` in order. One target's failure never stops the
    /// batch.
    pub async fn run(&mut self, targets: &[Target]) -> BatchReport {
        let mut report = BatchReport {
            total: targets.len(),
            ..Default::default()
        };

        for (index, target) in targets.iter().enumerate() {
            if self.ledger.contains(target) {
                info!(thread = %target, "already completed, skipping");
                report.skipped += 1;
                continue;
            }

            if report.attempted() > 0 {
                self.fetcher.pause().await;
            }
            info!(
                thread = %target,
                position = index + 1,
                total = report.total,
                "starting target"
            );

            let outcome = self.traverser.crawl(target).await;
            if !outcome.succeeded() {
                report.failed.push(target.clone());
                continue;
            }

            report.succeeded += 1;
            if let Err(e) = self.ledger.record(target).await {
                // The target's records are complete; it will be crawled
                // again on the next run.
                error!(
                    thread = %target,
                    ledger = %self.ledger.path().display(),
                    error = %e,
                    kind = "persistence",
                    "cannot record completion"
                );
            }
        }

        log::summary(
            "Batch",
            &[
                ("Targets", report.total.to_string()),
                ("Skipped", report.skipped.to_string()),
                ("Succeeded", report.succeeded.to_string()),
                ("Failed", report.failed.len().to_string()),
            ],
        );
        for target in &report.failed {
            warn!(thread = %target, "target failed, rerun the batch to retry it");
        }
        report
    }
}

/// Load descriptors and ledger from `data_dir` and run the batch.
pub async fn run_batch(config: &Config, data_dir: &Path) -> Result<BatchReport> {
    config.validate()?;

    let targets_dir = config.output.targets_path(data_dir);
    let targets = load_descriptors(&targets_dir).await?;
    let ledger = CompletionLedger::open(config.output.ledger_path(data_dir)).await?;

    log::header("Batch crawl");
    info!(
        targets = targets.len(),
        completed = ledger.len(),
        source = %targets_dir.display(),
        "descriptors loaded"
    );

    let fetcher = RateLimitedFetcher::new(config)?;
    let sink = CsvSink::new(data_dir);
    let mut coordinator = BatchCoordinator::new(
        &fetcher,
        &sink,
        TraversalOptions::from_config(config),
        ledger,
    );
    Ok(coordinator.run(&targets).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThreadKind;

    #[test]
    fn all_succeeded_ignores_skipped() {
        let report = BatchReport {
            total: 3,
            skipped: 2,
            succeeded: 1,
            failed: Vec::new(),
        };
        assert!(report.all_succeeded());
        assert_eq!(report.attempted(), 1);
    }

    #[test]
    fn any_failure_fails_batch() {
        let report = BatchReport {
            total: 2,
            skipped: 0,
            succeeded: 1,
            failed: vec![Target::new("5", ThreadKind::TextFeed)],
        };
        assert!(!report.all_succeeded());
        assert_eq!(report.attempted(), 2);
    }
}
