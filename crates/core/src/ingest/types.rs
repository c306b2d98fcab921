use crate::domain::contract::FeedRatingItem;
use serde::{Deserialize, Serialize};

/// One page of the external ratings feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingsPage {
    #[serde(default)]
    pub items: Vec<FeedRatingItem>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl RatingsPage {
    /// Cursor for the following page, if any. Blank cursors end pagination.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_page
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
