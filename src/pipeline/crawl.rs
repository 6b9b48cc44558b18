// src/pipeline/crawl.rs

//! Single-target crawl pipeline.

use std::path::Path;

use crate::error::Result;
use crate::models::{Config, Target};
use crate::services::{RateLimitedFetcher, TargetReport, ThreadTraverser, TraversalOptions};
use crate::storage::CsvSink;
use crate::utils::log;

/// Crawl one target into `{data_dir}/{comments_dir}`.
///
/// The completion ledger is neither consulted nor updated.
pub async fn run_single(config: &Config, data_dir: &Path, target: &Target) -> Result<TargetReport> {
    config.validate()?;

    let fetcher = RateLimitedFetcher::new(config)?;
    let sink = CsvSink::new(data_dir);
    let traverser = ThreadTraverser::new(&fetcher, &sink, TraversalOptions::from_config(config));

    log::header(&format!("Crawling {target}"));
    let report = traverser.crawl(target).await;

    log::summary(
        "Crawl",
        &[
            ("Target", report.target.to_string()),
            ("Output", sink.path(&report.destination).display().to_string()),
            ("Pages", report.pages.to_string()),
            ("Root comments", report.roots.to_string()),
            ("Replies", report.replies.to_string()),
            ("Write failures", report.write_failures.to_string()),
            ("Outcome", report.outcome.to_string()),
        ],
    );
    Ok(report)
}
