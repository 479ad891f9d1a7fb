use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub about_me: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub followers_count: i64,
    pub following_count: i64,
    /// Whether the requesting user follows this profile.
    pub is_following: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePage {
    pub user: Profile,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub sender_username: String,
    pub recipient_id: i64,
    pub recipient_username: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub peer: String,
    pub messages: Vec<Message>,
}

/// Wire contract for notification polling: `{name, data, timestamp}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub name: String,
    pub data: serde_json::Value,
    pub timestamp: f64,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub pages: u32,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: i64) -> Self {
        let per_page = per_page.max(1);
        let pages = ((total.max(0) as u64).div_ceil(per_page as u64)) as u32;
        Self {
            items,
            page,
            per_page,
            pages,
            total,
            has_next: page < pages,
            has_prev: page > 1 && pages > 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            pages: self.pages,
            total: self.total,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }

    /// The requested page lies past the last one.
    pub fn is_past_end(&self) -> bool {
        self.page > self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math_for_partial_last_page() {
        let page: Page<i32> = Page::new(vec![1, 2], 3, 5, 12);
        assert_eq!(page.pages, 3);
        assert!(!page.has_next);
        assert!(page.has_prev);
        assert!(!page.is_past_end());
    }

    #[test]
    fn page_past_end_is_flagged() {
        let page: Page<i32> = Page::new(vec![], 4, 5, 10);
        assert_eq!(page.pages, 2);
        assert!(page.is_past_end());
        assert!(!page.has_next);
    }

    #[test]
    fn empty_listing_has_no_pages() {
        let page: Page<i32> = Page::new(vec![], 1, 5, 0);
        assert_eq!(page.pages, 0);
        assert!(!page.has_prev);
        assert!(!page.has_next);
    }
}
