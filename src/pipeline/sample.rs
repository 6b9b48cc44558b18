// src/pipeline/sample.rs

//! Random target sampling pipeline.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{Config, DESCRIPTOR_HEADER, Target};
use crate::services::{RateLimitedFetcher, VideoSampler, sampling};
use crate::storage::{CsvSink, RecordSink};
use crate::utils::log;

/// Result of one sampling run.
#[derive(Debug, Clone)]
pub struct SampleReport {
    pub destination: PathBuf,
    pub candidates: usize,
    pub chosen: Vec<Target>,
}

/// Pick `count` random videos from the first `pages` pages of the popular
/// list and write them as a descriptor file.
///
/// The default output is `{targets_dir}/random_{n}.csv`, `n` being the
/// number actually chosen. `out` is relative to `data_dir`.
pub async fn run_sample(
    config: &Config,
    data_dir: &Path,
    count: usize,
    pages: u32,
    out: Option<&Path>,
) -> Result<SampleReport> {
    config.validate()?;
    if count == 0 {
        return Err(AppError::validation("sample count must be at least 1"));
    }
    if pages == 0 {
        return Err(AppError::validation("sample pages must be at least 1"));
    }

    let mut rng = match config.crawler.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let fetcher = RateLimitedFetcher::new(config)?;
    let sink = CsvSink::new(data_dir);

    log::header(&format!("Sampling {count} popular videos"));
    let pool = VideoSampler::new(&fetcher).collect(pages).await;
    if pool.videos.is_empty() {
        return Err(AppError::crawl(
            "popular videos",
            format!("no candidates from {pages} pages"),
        ));
    }

    let chosen = sampling::choose(&pool.videos, count, &mut rng);
    let destination = match out {
        Some(path) => path.to_path_buf(),
        None => config
            .output
            .targets_dir
            .join(format!("random_{}.csv", chosen.len())),
    };

    write_descriptors(&sink, &destination, &chosen.iter().map(sampling::target_of).collect::<Vec<_>>())
        .await?;

    for video in chosen.iter().take(3) {
        let owner = video.owner.as_ref().map(|o| o.name.as_str()).unwrap_or("");
        info!(aid = %video.aid, bvid = %video.bvid, title = %video.title, owner, "sampled");
    }

    let report = SampleReport {
        destination,
        candidates: pool.videos.len(),
        chosen: chosen.iter().map(sampling::target_of).collect(),
    };
    log::summary(
        "Sample",
        &[
            ("Output", sink.path(&report.destination).display().to_string()),
            ("Candidates", report.candidates.to_string()),
            ("Chosen", report.chosen.len().to_string()),
        ],
    );
    Ok(report)
}

async fn write_descriptors(sink: &dyn RecordSink, destination: &Path, targets: &[Target]) -> Result<()> {
    let header: Vec<String> = DESCRIPTOR_HEADER.iter().map(|h| h.to_string()).collect();
    sink.initialize(destination, &header).await?;
    let rows: Vec<Vec<String>> = targets.iter().map(Target::to_descriptor_row).collect();
    sink.append(destination, &rows).await
}
