//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Rate-limited remote access (`RateLimitedFetcher`)
//! - Root-comment traversal of one target (`ThreadTraverser`)
//! - Nested-reply traversal under one root (`ReplyTraverser`)
//! - Target discovery from a user's feed (`FeedWalker`)
//! - Random target selection from the popular list (`VideoSampler`)

mod discovery;
mod fetcher;
mod replies;
pub mod sampling;
mod threads;
mod writer;

pub use discovery::{DiscoveryReport, FeedWalker};
pub use fetcher::{Pacer, RateLimitedFetcher, RetryPolicy};
pub use replies::{ReplyOutcome, ReplyTraverser};
pub use sampling::{CandidatePool, VideoSampler};
pub use threads::{TargetOutcome, TargetReport, ThreadTraverser, TraversalOptions};
pub use writer::CommentWriter;
