// src/services/discovery.rs

//! Target discovery from a user's activity feed.

use std::path::{Path, PathBuf};

use tracing::{Instrument, info, info_span, warn};

use crate::error::{AppError, Result};
use crate::models::api::FeedItem;
use crate::models::{DESCRIPTOR_HEADER, FeedCursor, Target, ThreadKind};
use crate::services::RateLimitedFetcher;
use crate::storage::RecordSink;

/// Result of one feed walk.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub destination: PathBuf,
    pub pages: u32,
    pub written: usize,
    pub skipped: usize,
}

/// Walks a user's feed and writes every commentable item as a target
/// descriptor row.
pub struct FeedWalker<'a> {
    fetcher: &'a RateLimitedFetcher,
    sink: &'a dyn RecordSink,
}

impl<'a> FeedWalker<'a> {
    pub fn new(fetcher: &'a RateLimitedFetcher, sink: &'a dyn RecordSink) -> Self {
        Self { fetcher, sink }
    }

    /// Walk the feed of `user_id` into the descriptor file `destination`.
    ///
    /// Fails only if the destination cannot be created or the first page
    /// cannot be fetched. A later page failure ends the walk early.
    pub async fn walk(&self, user_id: &str, destination: &Path) -> Result<DiscoveryReport> {
        let span = info_span!("discover", user = %user_id);
        self.run(user_id, destination).instrument(span).await
    }

    async fn run(&self, user_id: &str, destination: &Path) -> Result<DiscoveryReport> {
        let header: Vec<String> = DESCRIPTOR_HEADER.iter().map(|h| h.to_string()).collect();
        self.sink.initialize(destination, &header).await?;

        let mut report = DiscoveryReport {
            destination: destination.to_path_buf(),
            ..Default::default()
        };
        let mut cursor = FeedCursor::default();

        loop {
            let offset = cursor.next_token().map(str::to_string);
            let fetched = self.fetcher.feed_page(user_id, offset.as_deref()).await;

            let page = match fetched {
                Ok(Some(page)) => page,
                Ok(None) => {
                    info!(page = report.pages + 1, "feed returned no data, stopping");
                    break;
                }
                Err(e) if report.pages == 0 => {
                    return Err(AppError::crawl(format!("feed of user {user_id}"), e));
                }
                Err(e) => {
                    warn!(page = report.pages + 1, error = %e, kind = e.kind(), "feed page failed, stopping");
                    break;
                }
            };
            report.pages += 1;

            let mut rows = Vec::with_capacity(page.items.len());
            for item in &page.items {
                match target_of(item) {
                    Some(target) => rows.push(target.to_descriptor_row()),
                    None => report.skipped += 1,
                }
            }
            self.sink.append(destination, &rows).await?;
            report.written += rows.len();
            info!(page = report.pages, found = rows.len(), "feed page done");

            cursor = FeedCursor::new(page.offset, page.has_more);
            if cursor.next_token().is_none() {
                break;
            }
            self.fetcher.pause().await;
        }

        info!(
            pages = report.pages,
            written = report.written,
            skipped = report.skipped,
            "feed walk finished"
        );
        Ok(report)
    }
}

fn target_of(item: &FeedItem) -> Option<Target> {
    let basic = &item.basic;
    if basic.comment_id_str.is_empty() || basic.comment_type == 0 {
        warn!("feed item has no comment thread");
        return None;
    }
    match ThreadKind::from_code(basic.comment_type) {
        Ok(kind) => Some(Target::new(basic.comment_id_str.clone(), kind)),
        Err(e) => {
            warn!(id = %basic.comment_id_str, error = %e, "skipping feed item");
            None
        }
    }
}
