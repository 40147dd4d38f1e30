//! Serde models of the Twitter/X API v2 payloads.
//!
//! Only the fields requested through `tweet.fields` and `user.fields` are
//! modeled. Conversion into [`Author`] and [`Message`] happens here so that
//! the rest of the crate never sees raw API shapes.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{Author, Message};

/// A tweet object as found in `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireTweet {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A user object as found in `includes.users`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireIncludes {
    #[serde(default)]
    pub users: Option<Vec<WireUser>>,
}

/// Body of `GET /2/tweets/search/recent`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentSearchBody {
    #[serde(default)]
    pub data: Option<Vec<WireTweet>>,
    #[serde(default)]
    pub includes: Option<WireIncludes>,
}

/// One line of `GET /2/tweets/search/stream`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamLine {
    #[serde(default)]
    pub data: Option<WireTweet>,
    #[serde(default)]
    pub includes: Option<WireIncludes>,
    #[serde(default)]
    pub matching_rules: Option<Vec<MatchingRule>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingRule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

/// Missing timestamps fall back to the current time.
fn epoch_millis_or_now(created_at: Option<DateTime<Utc>>) -> i64 {
    created_at.unwrap_or_else(Utc::now).timestamp_millis()
}

impl From<WireTweet> for Message {
    fn from(tweet: WireTweet) -> Self {
        Message {
            created_at_epoch_millis: epoch_millis_or_now(tweet.created_at),
            id: tweet.id,
            text: tweet.text.unwrap_or_default(),
            author_id: tweet.author_id.unwrap_or_default(),
        }
    }
}

impl From<WireUser> for Author {
    fn from(user: WireUser) -> Self {
        Author {
            created_at_epoch_millis: epoch_millis_or_now(user.created_at),
            id: user.id,
            display_name: user.name.unwrap_or_default(),
            handle: user.username.unwrap_or_default(),
        }
    }
}

impl RecentSearchBody {
    /// Splits the body into authors and messages.
    ///
    /// A body without `data` or without `includes.users` yields two empty
    /// lists.
    pub fn into_parts(self) -> (Vec<Author>, Vec<Message>) {
        let users = self.includes.and_then(|includes| includes.users);
        match (self.data, users) {
            (Some(tweets), Some(users)) => (
                users.into_iter().map(Author::from).collect(),
                tweets.into_iter().map(Message::from).collect(),
            ),
            _ => (Vec::new(), Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_search_body_into_parts() {
        let body: RecentSearchBody = serde_json::from_str(
            r#"{
                "data": [
                    {"id": "t1", "text": "hello", "author_id": "u1", "created_at": "2024-01-02T03:04:05.000Z"}
                ],
                "includes": {
                    "users": [
                        {"id": "u1", "name": "Alice", "username": "alice", "created_at": "2010-01-01T00:00:00.000Z"}
                    ]
                },
                "meta": {"result_count": 1}
            }"#,
        )
        .unwrap();

        let (authors, messages) = body.into_parts();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].display_name, "Alice");
        assert_eq!(authors[0].handle, "alice");
        assert_eq!(authors[0].created_at_epoch_millis, 1_262_304_000_000);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].author_id, "u1");
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[0].created_at_epoch_millis, 1_704_164_645_000);
    }

    #[test]
    fn test_body_without_users_is_empty() {
        let body: RecentSearchBody = serde_json::from_str(
            r#"{"data": [{"id": "t1", "text": "hello", "author_id": "u1"}]}"#,
        )
        .unwrap();
        let (authors, messages) = body.into_parts();
        assert!(authors.is_empty());
        assert!(messages.is_empty());

        let (authors, messages) = RecentSearchBody::default().into_parts();
        assert!(authors.is_empty());
        assert!(messages.is_empty());
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let before = Utc::now().timestamp_millis();
        let message = Message::from(WireTweet {
            id: "t1".to_string(),
            text: None,
            author_id: None,
            created_at: None,
        });
        let after = Utc::now().timestamp_millis();

        assert!(message.created_at_epoch_millis >= before);
        assert!(message.created_at_epoch_millis <= after);
        assert_eq!(message.text, "");
        assert_eq!(message.author_id, "");
    }
}
