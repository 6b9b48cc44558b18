// src/services/threads.rs

//! Root-comment traversal for one target.
//!
//! The traversal is an explicit state machine:
//!
//! ```text
//! Init ─▶ FetchingPinned ─▶ FetchingPage(start) ─▶ … ─▶ FetchingPage(n) ─▶ Done
//!   │                                                        │
//!   └──────────────────────────▶ Failed ◀────────────────────┘
//! ```
//!
//! Records are written as each page arrives, so a failure or crash keeps
//! everything written before it. The page number only advances after the
//! page's roots and their replies have been handed to the sink.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::FixedOffset;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::error::Result;
use crate::models::api::RawComment;
use crate::models::{CommentRecord, Config, RecordLayout, Target, ThreadKind, offset_from_hours};
use crate::services::ReplyTraverser;
use crate::services::CommentWriter;
use crate::services::RateLimitedFetcher;
use crate::storage::RecordSink;
use crate::utils::{bvid, sanitize_file_name};

/// Settings a traversal needs from the configuration.
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    pub start_page: u32,
    pub end_page: u32,
    pub layout: RecordLayout,
    pub offset: FixedOffset,
    pub strict_writes: bool,
    /// Directory of the per-target tables, relative to the sink root
    pub comments_dir: PathBuf,
}

impl TraversalOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_page: config.crawler.start_page,
            end_page: config.crawler.end_page,
            layout: RecordLayout::from_extended(config.output.extended),
            offset: offset_from_hours(config.output.utc_offset_hours),
            strict_writes: config.output.strict_writes,
            comments_dir: config.output.comments_dir.clone(),
        }
    }
}

/// Traversal states.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ThreadState {
    Init,
    FetchingPinned,
    FetchingPage(u32),
    Done,
    Failed(String),
}

/// How a target's traversal ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Done,
    Failed(String),
}

impl fmt::Display for TargetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOutcome::Done => f.write_str("done"),
            TargetOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of crawling one target.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: Target,
    pub base_name: String,
    pub destination: PathBuf,
    /// Root-comment pages that delivered comments
    pub pages: u32,
    /// Root comments written, pinned ones included
    pub roots: usize,
    pub replies: usize,
    /// Records the sink accepted
    pub records_written: usize,
    pub write_failures: usize,
    pub outcome: TargetOutcome,
}

impl TargetReport {
    fn new(target: &Target) -> Self {
        Self {
            target: target.clone(),
            base_name: String::new(),
            destination: PathBuf::new(),
            pages: 0,
            roots: 0,
            replies: 0,
            records_written: 0,
            write_failures: 0,
            outcome: TargetOutcome::Done,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == TargetOutcome::Done
    }
}

/// Walks root comments page by page, descending into replies.
///
/// Destinations are claimed per traverser: a second target resolving to a
/// name already used in this session gets its object id appended.
pub struct ThreadTraverser<'a> {
    fetcher: &'a RateLimitedFetcher,
    sink: &'a dyn RecordSink,
    options: TraversalOptions,
    claimed: Mutex<HashMap<PathBuf, Target>>,
}

impl<'a> ThreadTraverser<'a> {
    pub fn new(
        fetcher: &'a RateLimitedFetcher,
        sink: &'a dyn RecordSink,
        options: TraversalOptions,
    ) -> Self {
        Self {
            fetcher,
            sink,
            options,
            claimed: Mutex::new(HashMap::new()),
        }
    }

    /// Crawl one target to completion or failure. Never panics on remote
    /// errors; the outcome is reported instead.
    pub async fn crawl(&self, target: &Target) -> TargetReport {
        let span = info_span!("target", object_id = %target.object_id, kind = %target.kind);
        self.run(target).instrument(span).await
    }

    async fn run(&self, target: &Target) -> TargetReport {
        let mut report = TargetReport::new(target);
        let mut writer: Option<CommentWriter<'_>> = None;
        let mut state = ThreadState::Init;

        loop {
            state = match state {
                ThreadState::Init => {
                    let base_name = self.resolve_base_name(target).await;
                    let (base_name, destination) = self.claim_destination(target, base_name).await;
                    info!(destination = %destination.display(), "crawl starting");

                    let w = CommentWriter::new(
                        self.sink,
                        destination.clone(),
                        self.options.layout,
                        self.options.strict_writes,
                    );
                    report.base_name = base_name;
                    report.destination = destination;

                    match w.initialize().await {
                        Ok(()) => {
                            writer = Some(w);
                            ThreadState::FetchingPinned
                        }
                        Err(e) => {
                            error!(error = %e, kind = "persistence", "cannot create destination");
                            ThreadState::Failed(e.to_string())
                        }
                    }
                }

                ThreadState::FetchingPinned => {
                    let Some(w) = writer.as_mut() else {
                        break;
                    };
                    match self.crawl_pinned(target, w, &mut report).await {
                        Ok(()) => ThreadState::FetchingPage(self.options.start_page),
                        Err(e) => ThreadState::Failed(e.to_string()),
                    }
                }

                ThreadState::FetchingPage(page) if page > self.options.end_page => {
                    debug!(page, end_page = self.options.end_page, "page range exhausted");
                    ThreadState::Done
                }

                ThreadState::FetchingPage(page) => {
                    let Some(w) = writer.as_mut() else {
                        break;
                    };
                    self.crawl_page(target, page, w, &mut report).await
                }

                ThreadState::Done => {
                    report.outcome = TargetOutcome::Done;
                    break;
                }

                ThreadState::Failed(reason) => {
                    report.outcome = TargetOutcome::Failed(reason);
                    break;
                }
            };
        }

        if let Some(w) = &writer {
            report.records_written = w.written();
            report.write_failures = w.failures();
        }
        match &report.outcome {
            TargetOutcome::Done => info!(
                pages = report.pages,
                roots = report.roots,
                replies = report.replies,
                written = report.records_written,
                write_failures = report.write_failures,
                "crawl finished"
            ),
            TargetOutcome::Failed(reason) => error!(
                pages = report.pages,
                roots = report.roots,
                replies = report.replies,
                reason = %reason,
                "crawl failed, records written so far are kept"
            ),
        }
        report
    }

    /// Page 1's pinned set, written before the main sequence. A failed
    /// fetch here is logged and the traversal moves on.
    async fn crawl_pinned(
        &self,
        target: &Target,
        writer: &mut CommentWriter<'_>,
        report: &mut TargetReport,
    ) -> Result<()> {
        let fetched = self.fetcher.root_page(target, 1).await;
        let pinned = match fetched {
            Ok(Some(page)) => page.top_replies.unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(page = 1, error = %e, kind = e.kind(), "pinned comments unavailable");
                Vec::new()
            }
        };

        if pinned.is_empty() {
            debug!("no pinned comments");
        } else {
            info!(count = pinned.len(), "pinned comments found");
            self.write_roots(target, &pinned, true, writer, report)
                .await?;
        }

        self.fetcher.pause().await;
        Ok(())
    }

    /// Fetch page `page` and return the next state.
    async fn crawl_page(
        &self,
        target: &Target,
        page: u32,
        writer: &mut CommentWriter<'_>,
        report: &mut TargetReport,
    ) -> ThreadState {
        let data = match self.fetcher.root_page(target, page).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                info!(page, "page returned no data, stopping");
                return ThreadState::Done;
            }
            Err(e) => {
                error!(page, error = %e, kind = e.kind(), "page fetch failed");
                return ThreadState::Failed(format!("page {page}: {e}"));
            }
        };

        let comments = data.replies.unwrap_or_default();
        if comments.is_empty() {
            info!(page, "page has no comments, stopping");
            return ThreadState::Done;
        }

        if let Err(e) = self
            .write_roots(target, &comments, false, writer, report)
            .await
        {
            return ThreadState::Failed(format!("page {page}: {e}"));
        }
        report.pages += 1;
        info!(page, comments = comments.len(), "page done");

        self.fetcher.pause().await;
        match page.checked_add(1) {
            Some(next) => ThreadState::FetchingPage(next),
            None => ThreadState::Done,
        }
    }

    /// Write each root in order, descending into its replies right after it.
    async fn write_roots(
        &self,
        target: &Target,
        comments: &[RawComment],
        pinned: bool,
        writer: &mut CommentWriter<'_>,
        report: &mut TargetReport,
    ) -> Result<()> {
        let replies = ReplyTraverser::new(self.fetcher, self.options.offset);

        for raw in comments {
            let record = CommentRecord::root(raw, self.options.offset, pinned);
            writer.write(std::slice::from_ref(&record)).await?;
            report.roots += 1;

            if record.reply_count > 0 {
                let outcome = replies
                    .traverse(target, &record.comment_id, record.reply_count, writer)
                    .await?;
                report.replies += outcome.replies;
            }
        }
        Ok(())
    }

    /// Human-readable base name for the target's output file.
    ///
    /// Videos use their title; the lookup may fail without aborting the
    /// crawl, in which case a name derived from the id is used.
    async fn resolve_base_name(&self, target: &Target) -> String {
        match target.kind {
            ThreadKind::Primary => match self.video_title(target).await {
                Some(title) => sanitize_file_name(&title),
                None => format!("video_{}", target.object_id),
            },
            ThreadKind::ImageFeed | ThreadKind::TextFeed => {
                format!("dynamic_{}", target.object_id)
            }
        }
    }

    async fn video_title(&self, target: &Target) -> Option<String> {
        let aid = match target.object_id.parse::<u64>() {
            Ok(aid) => aid,
            Err(e) => {
                warn!(error = %e, "object id is not numeric, using fallback name");
                return None;
            }
        };
        let code = match bvid::av_to_bv(aid) {
            Ok(code) => code,
            Err(e) => {
                warn!(error = %e, "cannot derive BV code, using fallback name");
                return None;
            }
        };

        let title = match self.fetcher.video_title(&code).await {
            Ok(Some(title)) => Some(title),
            Ok(None) => {
                warn!(bvid = %code, "video has no title, using fallback name");
                None
            }
            Err(e) => {
                warn!(bvid = %code, error = %e, kind = e.kind(), "title lookup failed, using fallback name");
                None
            }
        };
        self.fetcher.pause().await;
        title
    }

    /// Reserve the output table for `target`.
    ///
    /// Names taken by another target earlier in this session are made unique
    /// with the object id. A table left by an earlier run is overwritten.
    async fn claim_destination(&self, target: &Target, base_name: String) -> (String, PathBuf) {
        let mut base_name = base_name;
        let mut destination = self.destination_for(&base_name);

        let taken_by_other = {
            let claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
            claimed.get(&destination).is_some_and(|owner| owner != target)
        };
        if taken_by_other {
            let unique = format!("{base_name}_{}", target.object_id);
            warn!(
                name = %base_name,
                renamed = %unique,
                "output name already used by another target"
            );
            base_name = unique;
            destination = self.destination_for(&base_name);
        }

        if self.sink.exists(&destination).await {
            warn!(destination = %destination.display(), "destination exists and will be overwritten");
        }

        self.claimed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(destination.clone(), target.clone());
        (base_name, destination)
    }

    fn destination_for(&self, base_name: &str) -> PathBuf {
        self.options
            .comments_dir
            .join(Path::new(&format!("{base_name}.csv")))
    }
}
