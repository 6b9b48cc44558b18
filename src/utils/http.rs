// src/utils/http.rs

//! HTTP client utilities.

use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, REFERER};

use crate::error::{AppError, Result};
use crate::models::Config;

const PLATFORMS: [&str; 4] = [
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "Windows NT 11.0; Win64; x64",
];

const REFERRER: &str = "https://www.bilibili.com/";

/// Build a browser-like User-Agent from an explicit randomness source.
pub fn generate_user_agent<R: Rng + ?Sized>(rng: &mut R) -> String {
    let platform = PLATFORMS.choose(rng).copied().unwrap_or(PLATFORMS[0]);
    let major = rng.gen_range(118..=126);
    let build = rng.gen_range(5000..=6500);
    format!(
        "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/{major}.0.{build}.0 Safari/537.36"
    )
}

/// Create the session client: auth headers, User-Agent and per-call timeout.
pub fn create_client(config: &Config, user_agent: &str) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, header_value("auth.cookie", &config.auth.cookie)?);
    headers.insert(
        HeaderName::from_static("csrf"),
        header_value("auth.csrf", &config.auth.csrf)?,
    );
    headers.insert(REFERER, HeaderValue::from_static(REFERRER));

    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(config.crawler.timeout())
        .build()?;
    Ok(client)
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value.trim())
        .map_err(|e| AppError::config(format!("{field} is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn user_agent_is_deterministic_per_seed() {
        let a = generate_user_agent(&mut StdRng::seed_from_u64(7));
        let b = generate_user_agent(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.starts_with("Mozilla/5.0 ("));
        assert!(a.contains("Chrome/"));
    }

    #[test]
    fn rejects_header_breaking_cookie() {
        let mut config = Config::default();
        config.auth.cookie = "a=1\nb=2".to_string();
        config.auth.csrf = "x".to_string();
        assert!(create_client(&config, "agent").is_err());
    }
}
