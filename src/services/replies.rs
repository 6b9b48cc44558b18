// src/services/replies.rs

//! Nested-reply traversal under one root comment.
//!
//! The page count comes from the root's declared reply total and every page
//! in `1..=ceil(total / page_size)` is attempted. Declared totals can be
//! stale, so an empty or failed page is skipped rather than ending the walk.

use chrono::FixedOffset;
use tracing::{Instrument, debug, info_span, warn};

use crate::error::Result;
use crate::models::{CommentRecord, Target, reply_page_count};
use crate::services::RateLimitedFetcher;
use crate::services::CommentWriter;

/// Counters for one reply traversal.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplyOutcome {
    pub pages_attempted: u32,
    pub pages_empty: u32,
    pub pages_failed: u32,
    pub replies: usize,
}

pub struct ReplyTraverser<'a> {
    fetcher: &'a RateLimitedFetcher,
    offset: FixedOffset,
}

impl<'a> ReplyTraverser<'a> {
    pub fn new(fetcher: &'a RateLimitedFetcher, offset: FixedOffset) -> Self {
        Self { fetcher, offset }
    }

    /// Fetch and write every reply page of `root_id`.
    ///
    /// Only a strict write failure is returned as an error.
    pub async fn traverse(
        &self,
        target: &Target,
        root_id: &str,
        declared_total: u64,
        writer: &mut CommentWriter<'_>,
    ) -> Result<ReplyOutcome> {
        let span = info_span!("replies", root = %root_id, declared = declared_total);
        self.run(target, root_id, declared_total, writer)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        target: &Target,
        root_id: &str,
        declared_total: u64,
        writer: &mut CommentWriter<'_>,
    ) -> Result<ReplyOutcome> {
        let total_pages = reply_page_count(declared_total, self.fetcher.page_size());
        let mut outcome = ReplyOutcome::default();
        debug!(total_pages, "fetching replies");

        for page in 1..=total_pages {
            outcome.pages_attempted += 1;
            let fetched = self.fetcher.reply_page(target, root_id, page).await;

            match fetched {
                Ok(Some(data)) => match data.replies {
                    Some(replies) if !replies.is_empty() => {
                        let records: Vec<CommentRecord> = replies
                            .iter()
                            .map(|raw| CommentRecord::reply(raw, self.offset, root_id))
                            .collect();
                        writer.write(&records).await?;
                        outcome.replies += records.len();
                    }
                    _ => {
                        outcome.pages_empty += 1;
                        debug!(page, "reply page has no replies");
                    }
                },
                Ok(None) => {
                    outcome.pages_empty += 1;
                    debug!(page, "reply page returned no data");
                }
                Err(e) => {
                    outcome.pages_failed += 1;
                    warn!(page, error = %e, kind = e.kind(), "reply page failed, skipping");
                }
            }

            self.fetcher.pause().await;
        }

        debug!(
            replies = outcome.replies,
            empty = outcome.pages_empty,
            failed = outcome.pages_failed,
            "replies done"
        );
        Ok(outcome)
    }
}
