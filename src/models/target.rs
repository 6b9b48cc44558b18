//! Crawl targets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Kind of discussion thread a target points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ThreadKind {
    /// Video comment section
    Primary,
    /// Image post in the activity feed
    ImageFeed,
    /// Text or repost entry in the activity feed
    TextFeed,
}

impl ThreadKind {
    /// Wire code sent as the `type` query parameter.
    pub fn code(self) -> u32 {
        match self {
            ThreadKind::Primary => 1,
            ThreadKind::ImageFeed => 11,
            ThreadKind::TextFeed => 17,
        }
    }

    /// Parse a wire code, rejecting anything outside the three known kinds.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            1 => Ok(ThreadKind::Primary),
            11 => Ok(ThreadKind::ImageFeed),
            17 => Ok(ThreadKind::TextFeed),
            other => Err(AppError::validation(format!(
                "unknown thread kind code {other}"
            ))),
        }
    }

    /// Short label used in file names and the ledger.
    pub fn label(self) -> &'static str {
        match self {
            ThreadKind::Primary => "video",
            ThreadKind::ImageFeed => "image",
            ThreadKind::TextFeed => "text",
        }
    }
}

impl fmt::Display for ThreadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u32> for ThreadKind {
    type Error = AppError;

    fn try_from(code: u32) -> Result<Self> {
        Self::from_code(code)
    }
}

impl From<ThreadKind> for u32 {
    fn from(kind: ThreadKind) -> Self {
        kind.code()
    }
}

impl FromStr for ThreadKind {
    type Err = AppError;

    /// Accepts a wire code or one of `primary`, `video`, `image`, `text`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u32>() {
            return Self::from_code(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "primary" | "video" => Ok(ThreadKind::Primary),
            "image" => Ok(ThreadKind::ImageFeed),
            "text" => Ok(ThreadKind::TextFeed),
            other => Err(AppError::validation(format!("unknown thread kind '{other}'"))),
        }
    }
}

/// Header row of a target descriptor file.
pub const DESCRIPTOR_HEADER: [&str; 2] = ["commentId", "threadKindCode"];

/// One discussion thread to crawl.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub object_id: String,
    pub kind: ThreadKind,
}

impl Target {
    pub fn new(object_id: impl Into<String>, kind: ThreadKind) -> Self {
        Self {
            object_id: object_id.into(),
            kind,
        }
    }

    /// Row in a descriptor file.
    pub fn to_descriptor_row(&self) -> Vec<String> {
        vec![self.object_id.clone(), self.kind.code().to_string()]
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for kind in [ThreadKind::Primary, ThreadKind::ImageFeed, ThreadKind::TextFeed] {
            assert_eq!(ThreadKind::from_code(kind.code()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(ThreadKind::from_code(0).is_err());
        assert!(ThreadKind::from_code(12).is_err());
    }

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("video".parse::<ThreadKind>().unwrap(), ThreadKind::Primary);
        assert_eq!("Image".parse::<ThreadKind>().unwrap(), ThreadKind::ImageFeed);
        assert_eq!("17".parse::<ThreadKind>().unwrap(), ThreadKind::TextFeed);
        assert!("audio".parse::<ThreadKind>().is_err());
    }

    #[test]
    fn serde_uses_wire_code() {
        let json = serde_json::to_string(&Target::new("42", ThreadKind::ImageFeed)).unwrap();
        assert_eq!(json, r#"{"object_id":"42","kind":11}"#);
        assert!(serde_json::from_str::<Target>(r#"{"object_id":"1","kind":3}"#).is_err());
    }
}
