//! Traversal positions for paginated lists.

/// Continuation state of a token-paged feed.
///
/// The walk may continue only while the server reports more items and
/// hands back a non-empty token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedCursor {
    pub offset: Option<String>,
    pub has_more: bool,
}

impl FeedCursor {
    pub fn new(offset: Option<String>, has_more: bool) -> Self {
        Self {
            offset: offset.filter(|o| !o.is_empty()),
            has_more,
        }
    }

    /// Token for the next request, if the walk should continue.
    pub fn next_token(&self) -> Option<&str> {
        if self.has_more {
            self.offset.as_deref()
        } else {
            None
        }
    }
}

/// Number of reply pages implied by a declared total.
pub fn reply_page_count(declared_total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    declared_total.div_ceil(u64::from(page_size)) as u32
}
