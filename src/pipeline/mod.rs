//! Pipeline entry points for crawler operations.
//!
//! - `run_single`: Crawl one target, ignoring the completion ledger
//! - `run_batch`: Crawl every described target not yet completed
//! - `run_discovery`: Collect a user's targets into a descriptor file
//! - `run_sample`: Draw random popular videos into a descriptor file
//! - `run_convert_file`: Convert a file of video ids between forms

pub mod batch;
pub mod convert;
pub mod crawl;
pub mod discover;
pub mod sample;

pub use batch::{BatchCoordinator, BatchReport, run_batch};
pub use convert::{ConvertReport, run_convert_file};
pub use crawl::run_single;
pub use discover::run_discovery;
pub use sample::{SampleReport, run_sample};
