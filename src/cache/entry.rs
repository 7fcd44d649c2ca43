use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::Article;

/// The articles cached for one feed URL
///
/// Stored on disk as `{"Expire": "<RFC 3339>", "Items": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// When the entry stops being served from cache
    #[serde(rename = "Expire")]
    pub expire: DateTime<Utc>,
    /// Articles in feed order
    #[serde(rename = "Items")]
    pub items: Vec<Article>,
}

impl Entry {
    /// Creates an entry expiring `ttl` after `now`
    pub fn new(items: Vec<Article>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            expire: now + ttl,
            items,
        }
    }

    /// An entry is fresh only while `expire` is strictly after `now`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expire > now
    }

    /// Load-time pruning drops entries that expired strictly before `now`
    pub(crate) fn is_prunable(&self, now: DateTime<Utc>) -> bool {
        self.expire < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_sets_expire_from_ttl() {
        let now = Utc::now();
        let entry = Entry::new(vec![article("a")], now, Duration::hours(24));

        assert_eq!(entry.expire, now + Duration::hours(24));
        assert_eq!(entry.items.len(), 1);
    }

    #[test]
    fn test_entry_expiring_at_now_is_stale_but_not_prunable() {
        let now = Utc::now();
        let entry = Entry {
            expire: now,
            items: vec![],
        };

        assert!(!entry.is_fresh(now));
        assert!(!entry.is_prunable(now));
    }

    #[test]
    fn test_entry_expired_one_second_ago_is_prunable() {
        let now = Utc::now();
        let entry = Entry {
            expire: now - Duration::seconds(1),
            items: vec![],
        };

        assert!(!entry.is_fresh(now));
        assert!(entry.is_prunable(now));
    }

    #[test]
    fn test_entry_uses_capitalized_field_names_on_disk() {
        let entry = Entry::new(vec![article("first")], Utc::now(), Duration::hours(1));

        let json = serde_json::to_value(&entry).expect("Failed to serialize Entry");

        assert!(json.get("Expire").is_some());
        assert_eq!(json["Items"][0]["title"], "first");
    }

    #[test]
    fn test_entry_reads_rfc3339_expire() {
        let json = r#"{"Expire":"2030-01-02T03:04:05Z","Items":[{"title":"x"}]}"#;

        let entry: Entry = serde_json::from_str(json).expect("Should deserialize");

        assert_eq!(entry.expire.to_rfc3339(), "2030-01-02T03:04:05+00:00");
        assert_eq!(entry.items[0].title, "x");
    }
}
