//! Shared fixtures for the mock-server tests.

#![allow(dead_code)]

use comment_crawler::models::Config;
use serde_json::{Value, json};
use wiremock::MockServer;

/// Valid configuration pointed at `server`, with no pacing or backoff.
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.auth.cookie = "SESSDATA=test; bili_jct=token".to_string();
    config.auth.csrf = "token".to_string();
    config.crawler.base_url = server.uri();
    config.crawler.delay_min_ms = 0;
    config.crawler.delay_max_ms = 0;
    config.crawler.backoff_ms = 0;
    config.crawler.seed = Some(7);
    config
}

/// Successful API envelope around `data`.
pub fn envelope(data: Value) -> Value {
    json!({ "code": 0, "message": "0", "data": data })
}

/// A comment payload with `rcount` declared replies.
pub fn comment(rpid: u64, rcount: u64) -> Value {
    json!({
        "rpid": rpid,
        "ctime": 1_700_000_000,
        "like": 3,
        "rcount": rcount,
        "member": {
            "uname": "tester",
            "sex": "男",
            "mid": 42,
            "level_info": { "current_level": 5 }
        },
        "content": { "message": "hello\nworld" },
        "reply_control": { "location": "IP属地：上海" }
    })
}

/// Root-comment page payload.
pub fn root_page(replies: Vec<Value>) -> Value {
    envelope(json!({ "top_replies": null, "replies": replies }))
}

/// Reply page payload.
pub fn reply_page(replies: Vec<Value>) -> Value {
    envelope(json!({ "replies": replies }))
}
