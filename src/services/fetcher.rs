// src/services/fetcher.rs

//! Rate-limited access to the remote comment API.
//!
//! Every network call in the crate goes through `RateLimitedFetcher`. Callers
//! decide when to pay the random inter-request delay by awaiting `pause`;
//! the fetcher itself only retries transient failures.

use std::ops::RangeInclusive;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, IsRetryable, Result, is_transient_status};
use crate::models::api::{Envelope, FeedPage, MainPage, PopularPage, ReplyPage, VideoView};
use crate::models::{Config, Target};
use crate::utils::http;

const ROOT_COMMENTS_PATH: &str = "/x/v2/reply/main";
const REPLIES_PATH: &str = "/x/v2/reply/reply";
const VIDEO_VIEW_PATH: &str = "/x/web-interface/view";
const USER_FEED_PATH: &str = "/x/polymer/web-dynamic/v1/feed/space";
const POPULAR_PATH: &str = "/x/web-interface/popular";

/// Sort mode requested for root comments.
const ROOT_SORT_MODE: &str = "3";
/// `next` value that switches the feed endpoint to offset continuation.
const FEED_CONTINUATION_MODE: &str = "2";

/// Bounded retry with a fixed backoff factor.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Wait before retry number `retry` (1-based): `backoff * 2^(retry-1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

/// Session-scoped source of randomized request spacing.
#[derive(Debug)]
pub struct Pacer {
    range_ms: RangeInclusive<u64>,
    rng: Mutex<StdRng>,
}

impl Pacer {
    pub fn new(range_ms: RangeInclusive<u64>, rng: StdRng) -> Self {
        Self {
            range_ms,
            rng: Mutex::new(rng),
        }
    }

    /// Draw the next delay uniformly from the configured interval.
    pub fn next_delay(&self) -> Duration {
        let (min, max) = (*self.range_ms.start(), *self.range_ms.end());
        if max <= min {
            return Duration::from_millis(min);
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Duration::from_millis(rng.gen_range(min..=max))
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// The sole point of contact with the network.
#[derive(Debug)]
pub struct RateLimitedFetcher {
    client: reqwest::Client,
    base_url: Url,
    page_size: u32,
    retry: RetryPolicy,
    pacer: Pacer,
}

impl RateLimitedFetcher {
    /// Build the session from validated configuration.
    ///
    /// The RNG seeded here drives both the generated User-Agent and the
    /// request spacing.
    pub fn new(config: &Config) -> Result<Self> {
        let mut rng = match config.crawler.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let user_agent = match &config.crawler.user_agent {
            Some(agent) => agent.clone(),
            None => http::generate_user_agent(&mut rng),
        };
        debug!(user_agent = %user_agent, "HTTP session created");

        let client = http::create_client(config, &user_agent)?;
        let base_url = Url::parse(&config.crawler.base_url)?;

        Ok(Self {
            client,
            base_url,
            page_size: config.crawler.page_size,
            retry: RetryPolicy {
                max_retries: config.crawler.max_retries,
                backoff: Duration::from_millis(config.crawler.backoff_ms),
            },
            pacer: Pacer::new(config.crawler.delay_range(), rng),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Sleep for a random delay drawn from the configured interval.
    pub async fn pause(&self) {
        self.pacer.pause().await;
    }

    /// GET `path` with `query`, retrying transient failures.
    ///
    /// Returns the envelope's `data`, `None` when the server sent none.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<Option<T>, FetchError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::Decode(format!("bad endpoint {path}: {e}")))?;

        let mut retries = 0;
        loop {
            match self.fetch_once(&url, query).await {
                Ok(data) => {
                    if retries > 0 {
                        debug!(path, retries, "request succeeded after retry");
                    }
                    return Ok(data);
                }
                Err(e) if e.is_retryable() && retries < self.retry.max_retries => {
                    retries += 1;
                    let delay = self.retry.delay_for(retries);
                    warn!(
                        path,
                        error = %e,
                        retry = retries,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    return Err(FetchError::Exhausted {
                        attempts: retries + 1,
                        last: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, String)],
    ) -> std::result::Result<Option<T>, FetchError> {
        let response = self.client.get(url.clone()).query(query).send().await?;

        let status = response.status();
        if is_transient_status(status.as_u16()) {
            return Err(FetchError::Transient(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        if envelope.code != 0 {
            return Err(FetchError::Application {
                code: envelope.code,
                message: envelope.message,
            });
        }
        Ok(envelope.data)
    }

    /// One page of root comments (page 1 also carries the pinned set).
    pub async fn root_page(
        &self,
        target: &Target,
        page: u32,
    ) -> std::result::Result<Option<MainPage>, FetchError> {
        let query = [
            ("next", page.to_string()),
            ("type", target.kind.code().to_string()),
            ("oid", target.object_id.clone()),
            ("ps", self.page_size.to_string()),
            ("mode", ROOT_SORT_MODE.to_string()),
        ];
        self.fetch(ROOT_COMMENTS_PATH, &query).await
    }

    /// One page of nested replies under `root`.
    pub async fn reply_page(
        &self,
        target: &Target,
        root: &str,
        page: u32,
    ) -> std::result::Result<Option<ReplyPage>, FetchError> {
        let query = [
            ("type", target.kind.code().to_string()),
            ("oid", target.object_id.clone()),
            ("ps", self.page_size.to_string()),
            ("pn", page.to_string()),
            ("root", root.to_string()),
        ];
        self.fetch(REPLIES_PATH, &query).await
    }

    /// Title of a video, looked up by BV code.
    pub async fn video_title(
        &self,
        bvid: &str,
    ) -> std::result::Result<Option<String>, FetchError> {
        let view: Option<VideoView> = self
            .fetch(VIDEO_VIEW_PATH, &[("bvid", bvid.to_string())])
            .await?;
        Ok(view.and_then(|v| v.title).filter(|t| !t.trim().is_empty()))
    }

    /// One page of a user's activity feed.
    pub async fn feed_page(
        &self,
        user_id: &str,
        offset: Option<&str>,
    ) -> std::result::Result<Option<FeedPage>, FetchError> {
        let mut query = vec![("host_mid", user_id.to_string())];
        if let Some(offset) = offset {
            query.push(("next", FEED_CONTINUATION_MODE.to_string()));
            query.push(("offset", offset.to_string()));
        }
        self.fetch(USER_FEED_PATH, &query).await
    }

    /// One page of the public popular-videos list.
    pub async fn popular_page(
        &self,
        page: u32,
    ) -> std::result::Result<Option<PopularPage>, FetchError> {
        let query = [
            ("pn", page.to_string()),
            ("ps", self.page_size.to_string()),
        ];
        self.fetch(POPULAR_PATH, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_retry() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn pacer_stays_within_range() {
        let pacer = Pacer::new(200..=400, StdRng::seed_from_u64(1));
        for _ in 0..100 {
            let delay = pacer.next_delay().as_millis();
            assert!((200..=400).contains(&delay));
        }
    }

    #[test]
    fn pacer_with_degenerate_range_is_fixed() {
        let pacer = Pacer::new(0..=0, StdRng::seed_from_u64(1));
        assert!(pacer.next_delay().is_zero());
    }

    #[test]
    fn seeded_pacers_agree() {
        let a = Pacer::new(0..=1000, StdRng::seed_from_u64(9));
        let b = Pacer::new(0..=1000, StdRng::seed_from_u64(9));
        for _ in 0..10 {
            assert_eq!(a.next_delay(), b.next_delay());
        }
    }
}
