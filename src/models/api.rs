//! Wire payloads returned by the remote comment API.
//!
//! Only the fields the crawler reads are modelled; everything else in the
//! response is ignored by serde.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// Envelope wrapped around every response body.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// One page of root comments.
#[derive(Debug, Default, Deserialize)]
pub struct MainPage {
    /// Pinned comments, delivered alongside page 1
    #[serde(default)]
    pub top_replies: Option<Vec<RawComment>>,

    #[serde(default)]
    pub replies: Option<Vec<RawComment>>,
}

/// One page of nested replies under a root comment.
#[derive(Debug, Default, Deserialize)]
pub struct ReplyPage {
    #[serde(default)]
    pub replies: Option<Vec<RawComment>>,
}

/// Video metadata; only the title is used.
#[derive(Debug, Deserialize)]
pub struct VideoView {
    #[serde(default)]
    pub title: Option<String>,
}

/// One page of a user's activity feed.
#[derive(Debug, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub offset: Option<String>,

    #[serde(default)]
    pub has_more: bool,

    #[serde(default)]
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub basic: FeedBasic,
}

/// Comment-section pointer of a feed item.
#[derive(Debug, Default, Deserialize)]
pub struct FeedBasic {
    #[serde(default, deserialize_with = "id_string")]
    pub comment_id_str: String,

    #[serde(default)]
    pub comment_type: u32,
}

/// A comment as delivered by the API.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawComment {
    #[serde(default, deserialize_with = "id_string")]
    pub rpid: String,

    /// Unix seconds
    #[serde(default)]
    pub ctime: i64,

    #[serde(default)]
    pub like: u64,

    /// Declared nested-reply total
    #[serde(default)]
    pub rcount: u64,

    #[serde(default)]
    pub member: Member,

    #[serde(default)]
    pub content: Content,

    #[serde(default)]
    pub reply_control: ReplyControl,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub uname: Option<String>,

    #[serde(default)]
    pub sex: Option<String>,

    #[serde(default, deserialize_with = "id_string")]
    pub mid: String,

    #[serde(default)]
    pub level_info: LevelInfo,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LevelInfo {
    #[serde(default)]
    pub current_level: u8,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReplyControl {
    #[serde(default)]
    pub location: Option<String>,
}

/// One page of the popular-videos list.
#[derive(Debug, Default, Deserialize)]
pub struct PopularPage {
    #[serde(default)]
    pub list: Vec<PopularVideo>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PopularVideo {
    #[serde(default, deserialize_with = "id_string")]
    pub aid: String,

    #[serde(default)]
    pub bvid: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub owner: Option<Owner>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub name: String,
}

/// Accept ids sent either as JSON numbers or strings.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl Visitor<'_> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or integer id")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_ids_decode() {
        let raw: RawComment = serde_json::from_str(
            r#"{"rpid": 123456789012, "member": {"mid": "42", "uname": "a"}}"#,
        )
        .unwrap();
        assert_eq!(raw.rpid, "123456789012");
        assert_eq!(raw.member.mid, "42");
        assert_eq!(raw.rcount, 0);
    }

    #[test]
    fn null_data_is_none() {
        let env: Envelope<MainPage> =
            serde_json::from_str(r#"{"code": 0, "message": "0", "data": null}"#).unwrap();
        assert!(env.data.is_none());
    }

    #[test]
    fn missing_replies_is_none() {
        let env: Envelope<MainPage> =
            serde_json::from_str(r#"{"code": 0, "data": {"cursor": {}}}"#).unwrap();
        let page = env.data.unwrap();
        assert!(page.replies.is_none());
        assert!(page.top_replies.is_none());
    }

    #[test]
    fn feed_page_decodes() {
        let env: Envelope<FeedPage> = serde_json::from_str(
            r#"{"code": 0, "data": {"offset": "991", "has_more": true,
                "items": [{"basic": {"comment_id_str": "1001", "comment_type": 11}}]}}"#,
        )
        .unwrap();
        let page = env.data.unwrap();
        assert!(page.has_more);
        assert_eq!(page.items[0].basic.comment_type, 11);
    }

    #[test]
    fn popular_page_decodes() {
        let env: Envelope<PopularPage> = serde_json::from_str(
            r#"{"code": 0, "data": {"list": [
                {"aid": 170001, "bvid": "BV17x411w7KC", "title": "t", "owner": {"name": "o"}},
                {"title": "no ids"}
            ]}}"#,
        )
        .unwrap();
        let page = env.data.unwrap();
        assert_eq!(page.list[0].aid, "170001");
        assert_eq!(page.list[0].owner.as_ref().unwrap().name, "o");
        assert!(page.list[1].aid.is_empty());
    }
}
