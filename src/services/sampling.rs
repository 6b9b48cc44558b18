// src/services/sampling.rs

//! Random target selection from the popular-videos list.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::models::api::PopularVideo;
use crate::models::{Target, ThreadKind};
use crate::services::RateLimitedFetcher;

/// Candidates gathered from the popular list.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    pub videos: Vec<PopularVideo>,
    pub pages_fetched: u32,
    pub pages_failed: u32,
}

/// Collects popular videos and draws a random subset of them.
pub struct VideoSampler<'a> {
    fetcher: &'a RateLimitedFetcher,
}

impl<'a> VideoSampler<'a> {
    pub fn new(fetcher: &'a RateLimitedFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch pages `1..=pages`. A failed page is logged and skipped.
    pub async fn collect(&self, pages: u32) -> CandidatePool {
        self.run(pages).instrument(info_span!("popular", pages)).await
    }

    async fn run(&self, pages: u32) -> CandidatePool {
        let mut pool = CandidatePool::default();
        let mut seen = HashSet::new();

        for page in 1..=pages {
            match self.fetcher.popular_page(page).await {
                Ok(data) => {
                    pool.pages_fetched += 1;
                    let list = data.map(|d| d.list).unwrap_or_default();
                    let before = pool.videos.len();
                    for video in list {
                        if is_complete(&video) && seen.insert(video.aid.clone()) {
                            pool.videos.push(video);
                        }
                    }
                    debug!(page, added = pool.videos.len() - before, "popular page done");
                }
                Err(e) => {
                    pool.pages_failed += 1;
                    warn!(page, error = %e, kind = e.kind(), "popular page failed, skipping");
                }
            }
            self.fetcher.pause().await;
        }

        info!(
            candidates = pool.videos.len(),
            failed_pages = pool.pages_failed,
            "candidate pool collected"
        );
        pool
    }
}

fn is_complete(video: &PopularVideo) -> bool {
    !video.aid.is_empty() && !video.bvid.is_empty() && !video.title.is_empty()
}

/// Draw `count` distinct videos, or all of them when the pool is smaller.
pub fn choose<R: Rng + ?Sized>(pool: &[PopularVideo], count: usize, rng: &mut R) -> Vec<PopularVideo> {
    if pool.len() <= count {
        if pool.len() < count {
            warn!(available = pool.len(), requested = count, "pool smaller than requested, using all");
        }
        return pool.to_vec();
    }
    pool.choose_multiple(rng, count).cloned().collect()
}

/// Descriptor target for a sampled video.
pub fn target_of(video: &PopularVideo) -> Target {
    Target::new(video.aid.clone(), ThreadKind::Primary)
}
