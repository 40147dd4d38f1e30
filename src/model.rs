//! Entity model for search and stream results.
//!
//! [`Author`] and [`Message`] are immutable records normalized from the
//! Twitter/X API payloads. [`AggregatedResult`] groups messages under their
//! authors; it is only built by the functions in [`crate::aggregate`].

use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A tweet author.
///
/// Equality and hashing consider `id` only, so two records of the same
/// account always land on the same group key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub created_at_epoch_millis: i64,
    pub display_name: String,
    pub handle: String,
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(f, self)
    }
}

/// A tweet. `author_id` refers to [`Author::id`] and may dangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub created_at_epoch_millis: i64,
    pub text: String,
    pub author_id: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(f, self)
    }
}

/// Messages grouped by author.
///
/// Authors are ordered by ascending creation time and each author's
/// messages are ordered by ascending creation time. Ties keep first-seen
/// order. Authors without messages are kept with an empty group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedResult {
    entries: Vec<(Author, Vec<Message>)>,
}

impl AggregatedResult {
    /// The empty result returned on transport failures and empty input.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Entries must already satisfy the ordering invariants.
    pub(crate) fn from_sorted_entries(entries: Vec<(Author, Vec<Message>)>) -> Self {
        Self { entries }
    }

    /// Number of distinct authors. Messages are not counted.
    pub fn hit_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Author, Vec<Message>)] {
        &self.entries
    }

    pub fn authors(&self) -> impl Iterator<Item = &Author> {
        self.entries.iter().map(|(author, _)| author)
    }

    /// Messages for the author with the given id, if that author is a key.
    pub fn messages_for(&self, author_id: &str) -> Option<&[Message]> {
        self.entries
            .iter()
            .find(|(author, _)| author.id == author_id)
            .map(|(_, messages)| messages.as_slice())
    }

    /// Total number of grouped messages across all authors.
    pub fn message_count(&self) -> usize {
        self.entries.iter().map(|(_, messages)| messages.len()).sum()
    }
}

/// Serializes as `{ "<author-json>": [ message, ... ], ... }` in group order.
impl Serialize for AggregatedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (author, messages) in &self.entries {
            let key = serde_json::to_string(author).map_err(S::Error::custom)?;
            map.serialize_entry(&key, messages)?;
        }
        map.end()
    }
}

impl fmt::Display for AggregatedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(f, self)
    }
}

fn write_json<T: Serialize>(f: &mut fmt::Formatter<'_>, value: &T) -> fmt::Result {
    let json = serde_json::to_string(value).map_err(|_| fmt::Error)?;
    f.write_str(&json)
}
