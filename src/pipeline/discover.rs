// src/pipeline/discover.rs

//! Target discovery pipeline.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::{DiscoveryReport, FeedWalker, RateLimitedFetcher};
use crate::storage::CsvSink;
use crate::utils::{log, sanitize_file_name};

/// Walk the feed of `user_id` into `{data_dir}/{targets_dir}/{user_id}.csv`.
pub async fn run_discovery(config: &Config, data_dir: &Path, user_id: &str) -> Result<DiscoveryReport> {
    config.validate()?;
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::validation("user id is empty"));
    }

    let fetcher = RateLimitedFetcher::new(config)?;
    let sink = CsvSink::new(data_dir);
    let destination = config
        .output
        .targets_dir
        .join(format!("{}.csv", sanitize_file_name(user_id)));

    log::header(&format!("Discovering targets of user {user_id}"));
    let report = FeedWalker::new(&fetcher, &sink)
        .walk(user_id, &destination)
        .await?;

    log::summary(
        "Discovery",
        &[
            ("Output", sink.path(&report.destination).display().to_string()),
            ("Pages", report.pages.to_string()),
            ("Targets", report.written.to_string()),
            ("Skipped items", report.skipped.to_string()),
        ],
    );
    Ok(report)
}
