// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

pub mod api;
mod comment;
mod config;
mod cursor;
mod target;

// Re-export all public types
pub use comment::{CommentRecord, RecordLayout, format_local_time, offset_from_hours};
pub use config::{AuthConfig, Config, CrawlerConfig, LoggingConfig, MAX_PAGE_SIZE, OutputConfig};
pub use cursor::{FeedCursor, reply_page_count};
pub use target::{DESCRIPTOR_HEADER, Target, ThreadKind};
