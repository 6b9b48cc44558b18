//! Comment record written to the output tables.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::models::api::RawComment;

const UNKNOWN_NICKNAME: &str = "未知用户";
const UNKNOWN_GENDER: &str = "保密";
const UNKNOWN_LOCATION: &str = "未知";
const LOCATION_PREFIX: &str = "IP属地：";

/// Columns of the standard layout.
pub const STANDARD_HEADER: [&str; 9] = [
    "nickname",
    "gender",
    "time",
    "likes",
    "body",
    "location",
    "level",
    "userId",
    "commentId",
];

/// Columns appended by the extended layout.
pub const EXTENDED_COLUMNS: [&str; 4] = ["unixTime", "replyCount", "isPinned", "parentCommentId"];

/// Which columns a comment table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordLayout {
    #[default]
    Standard,
    /// Standard columns plus the tree metadata
    Extended,
}

impl RecordLayout {
    pub fn from_extended(extended: bool) -> Self {
        if extended {
            RecordLayout::Extended
        } else {
            RecordLayout::Standard
        }
    }

    pub fn header(self) -> Vec<String> {
        let mut header: Vec<String> = STANDARD_HEADER.iter().map(|s| s.to_string()).collect();
        if self == RecordLayout::Extended {
            header.extend(EXTENDED_COLUMNS.iter().map(|s| s.to_string()));
        }
        header
    }
}

/// One comment, root or nested.
///
/// `parent_comment_id` is set exactly when the record is a nested reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub nickname: String,
    pub gender: String,
    /// Unix seconds
    pub created_at: i64,
    /// `created_at` rendered at the configured offset
    pub created_at_local: String,
    pub like_count: u64,
    pub body: String,
    pub location: String,
    pub level: u8,
    pub user_id: String,
    pub comment_id: String,
    pub reply_count: u64,
    pub is_pinned: bool,
    pub parent_comment_id: Option<String>,
}

impl CommentRecord {
    /// Build a root comment record.
    pub fn root(raw: &RawComment, offset: FixedOffset, is_pinned: bool) -> Self {
        Self::from_raw(raw, offset, is_pinned, None)
    }

    /// Build a nested reply record under `parent`.
    pub fn reply(raw: &RawComment, offset: FixedOffset, parent: &str) -> Self {
        let mut record = Self::from_raw(raw, offset, false, Some(parent.to_string()));
        record.reply_count = 0;
        record
    }

    fn from_raw(
        raw: &RawComment,
        offset: FixedOffset,
        is_pinned: bool,
        parent_comment_id: Option<String>,
    ) -> Self {
        let member = &raw.member;

        Self {
            nickname: member
                .uname
                .clone()
                .unwrap_or_else(|| UNKNOWN_NICKNAME.to_string()),
            gender: member
                .sex
                .clone()
                .unwrap_or_else(|| UNKNOWN_GENDER.to_string()),
            created_at: raw.ctime,
            created_at_local: format_local_time(raw.ctime, offset),
            like_count: raw.like,
            body: raw.content.message.replace('\n', ","),
            location: normalize_location(raw.reply_control.location.as_deref()),
            level: member.level_info.current_level,
            user_id: member.mid.clone(),
            comment_id: raw.rpid.clone(),
            reply_count: raw.rcount,
            is_pinned,
            parent_comment_id,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }

    /// Render the record as one table row.
    pub fn to_row(&self, layout: RecordLayout) -> Vec<String> {
        let mut row = vec![
            self.nickname.clone(),
            self.gender.clone(),
            self.created_at_local.clone(),
            self.like_count.to_string(),
            self.body.clone(),
            self.location.clone(),
            self.level.to_string(),
            self.user_id.clone(),
            self.comment_id.clone(),
        ];
        if layout == RecordLayout::Extended {
            row.push(self.created_at.to_string());
            row.push(self.reply_count.to_string());
            row.push(self.is_pinned.to_string());
            row.push(self.parent_comment_id.clone().unwrap_or_default());
        }
        row
    }
}

fn normalize_location(location: Option<&str>) -> String {
    match location {
        Some(loc) if !loc.is_empty() => loc
            .strip_prefix(LOCATION_PREFIX)
            .unwrap_or(loc)
            .to_string(),
        _ => UNKNOWN_LOCATION.to_string(),
    }
}

/// Format unix seconds as `%Y-%m-%d %H:%M:%S` at a fixed offset.
pub fn format_local_time(unix: i64, offset: FixedOffset) -> String {
    match DateTime::from_timestamp(unix, 0) {
        Some(utc) => utc
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => format!("invalid timestamp {unix}"),
    }
}

/// Fixed offset for a whole number of hours east of UTC.
pub fn offset_from_hours(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}
