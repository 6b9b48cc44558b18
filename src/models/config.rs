//! Application configuration structures.

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Largest page size the comment endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 20;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Opaque authentication token
    #[serde(default)]
    pub auth: AuthConfig,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Output locations and record layout
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values before any network call is issued.
    ///
    /// Every problem found is reported in a single `Config` error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if is_placeholder(&self.auth.cookie, defaults::COOKIE_PLACEHOLDER) {
            problems.push("auth.cookie is missing or still the placeholder".to_string());
        }
        if is_placeholder(&self.auth.csrf, defaults::CSRF_PLACEHOLDER) {
            problems.push("auth.csrf is missing or still the placeholder".to_string());
        }

        let c = &self.crawler;
        if !(1..=MAX_PAGE_SIZE).contains(&c.page_size) {
            problems.push(format!(
                "crawler.page_size must be within 1-{MAX_PAGE_SIZE}, got {}",
                c.page_size
            ));
        }
        if c.start_page < 1 {
            problems.push("crawler.start_page must be >= 1".to_string());
        }
        if c.end_page < c.start_page {
            problems.push(format!(
                "crawler.end_page ({}) must be >= crawler.start_page ({})",
                c.end_page, c.start_page
            ));
        }
        if c.delay_min_ms > c.delay_max_ms {
            problems.push(format!(
                "crawler.delay_min_ms ({}) must be <= crawler.delay_max_ms ({})",
                c.delay_min_ms, c.delay_max_ms
            ));
        }
        if c.timeout_secs == 0 {
            problems.push("crawler.timeout_secs must be > 0".to_string());
        }
        if let Some(agent) = &c.user_agent {
            if agent.trim().is_empty() {
                problems.push("crawler.user_agent is empty".to_string());
            }
        }
        if let Err(e) = url::Url::parse(&c.base_url) {
            problems.push(format!("crawler.base_url is invalid: {e}"));
        }
        if self.output.utc_offset_hours.abs() > 14 {
            problems.push("output.utc_offset_hours must be within -14..=14".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::config(problems.join("; ")))
        }
    }

    /// Replace the page range, keeping whichever bound was not given.
    pub fn with_page_range(mut self, start: Option<u32>, end: Option<u32>) -> Self {
        if let Some(start) = start {
            self.crawler.start_page = start;
        }
        if let Some(end) = end {
            self.crawler.end_page = end;
        }
        self
    }
}

fn is_placeholder(value: &str, placeholder: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == placeholder
}

/// Credentials produced by an external login step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Full cookie header value
    #[serde(default = "defaults::cookie")]
    pub cookie: String,

    /// CSRF token paired with the cookie
    #[serde(default = "defaults::csrf")]
    pub csrf: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie: defaults::cookie(),
            csrf: defaults::csrf(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Remote API origin
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Fixed User-Agent; generated per session when absent
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Comments requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// First root-comment page to fetch
    #[serde(default = "defaults::start_page")]
    pub start_page: u32,

    /// Last root-comment page to fetch (inclusive)
    #[serde(default = "defaults::end_page")]
    pub end_page: u32,

    /// Lower bound of the random delay between requests
    #[serde(default = "defaults::delay_min")]
    pub delay_min_ms: u64,

    /// Upper bound of the random delay between requests
    #[serde(default = "defaults::delay_max")]
    pub delay_max_ms: u64,

    /// Retries granted to a transient failure
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Backoff factor; retry `n` waits `backoff_ms * 2^(n-1)`
    #[serde(default = "defaults::backoff")]
    pub backoff_ms: u64,

    /// Per-call timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Seed for the pacing RNG; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl CrawlerConfig {
    /// Inclusive delay interval in milliseconds.
    pub fn delay_range(&self) -> RangeInclusive<u64> {
        self.delay_min_ms..=self.delay_max_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: None,
            page_size: defaults::page_size(),
            start_page: defaults::start_page(),
            end_page: defaults::end_page(),
            delay_min_ms: defaults::delay_min(),
            delay_max_ms: defaults::delay_max(),
            max_retries: defaults::max_retries(),
            backoff_ms: defaults::backoff(),
            timeout_secs: defaults::timeout(),
            seed: None,
        }
    }
}

/// Output locations, relative to the data directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Per-target comment tables
    #[serde(default = "defaults::comments_dir")]
    pub comments_dir: PathBuf,

    /// Descriptor files consumed by `batch` and produced by `discover`
    #[serde(default = "defaults::targets_dir")]
    pub targets_dir: PathBuf,

    /// Append-only log of completed targets
    #[serde(default = "defaults::ledger_file")]
    pub ledger_file: PathBuf,

    /// Append unix time, reply count, pinned flag and parent id columns
    #[serde(default)]
    pub extended: bool,

    /// Treat a failed write as a target failure instead of logging it
    #[serde(default)]
    pub strict_writes: bool,

    /// Offset used for the formatted local time column
    #[serde(default = "defaults::utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl OutputConfig {
    pub fn comments_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.comments_dir)
    }

    pub fn targets_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.targets_dir)
    }

    pub fn ledger_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.ledger_file)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            comments_dir: defaults::comments_dir(),
            targets_dir: defaults::targets_dir(),
            ledger_file: defaults::ledger_file(),
            extended: false,
            strict_writes: false,
            utc_offset_hours: defaults::utc_offset_hours(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub const COOKIE_PLACEHOLDER: &str = "<your cookie>";
    pub const CSRF_PLACEHOLDER: &str = "<csrf token>";

    // Auth defaults
    pub fn cookie() -> String {
        COOKIE_PLACEHOLDER.into()
    }
    pub fn csrf() -> String {
        CSRF_PLACEHOLDER.into()
    }

    // Crawler defaults
    pub fn base_url() -> String {
        "https://api.bilibili.com".into()
    }
    pub fn page_size() -> u32 {
        20
    }
    pub fn start_page() -> u32 {
        1
    }
    pub fn end_page() -> u32 {
        99999
    }
    pub fn delay_min() -> u64 {
        200
    }
    pub fn delay_max() -> u64 {
        400
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn backoff() -> u64 {
        100
    }
    pub fn timeout() -> u64 {
        10
    }

    // Output defaults
    pub fn comments_dir() -> PathBuf {
        "comments".into()
    }
    pub fn targets_dir() -> PathBuf {
        "targets".into()
    }
    pub fn ledger_file() -> PathBuf {
        "completed.log".into()
    }
    pub fn utc_offset_hours() -> i32 {
        8
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
