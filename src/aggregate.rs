//! Grouping of authors and messages into an [`AggregatedResult`].
//!
//! Both entry points share the same output rules: authors deduplicated by id
//! (first occurrence wins) and sorted by creation time, each author's
//! messages sorted by creation time, ties kept in input order.

use log::{debug, trace};
use std::collections::{HashMap, HashSet};

use crate::model::{AggregatedResult, Author, Message};
use crate::twitter::StreamEvent;

/// Groups the messages of a single bulk search response under their authors.
///
/// Messages whose `author_id` matches none of `authors` are dropped.
pub fn aggregate_bulk(authors: Vec<Author>, messages: Vec<Message>) -> AggregatedResult {
    if authors.is_empty() {
        if !messages.is_empty() {
            debug!("Dropping {} messages: no authors to group under", messages.len());
        }
        return AggregatedResult::empty();
    }

    let mut seen = HashSet::with_capacity(authors.len());
    let mut unique_authors: Vec<Author> = authors
        .into_iter()
        .filter(|author| seen.insert(author.id.clone()))
        .collect();
    // sort_by_key is stable, so equal timestamps keep first-seen order
    unique_authors.sort_by_key(|author| author.created_at_epoch_millis);

    let message_total = messages.len();
    let mut by_author: HashMap<String, Vec<Message>> = HashMap::new();
    for message in messages {
        by_author
            .entry(message.author_id.clone())
            .or_default()
            .push(message);
    }

    let entries: Vec<(Author, Vec<Message>)> = unique_authors
        .into_iter()
        .map(|author| {
            let mut group = by_author.remove(&author.id).unwrap_or_default();
            group.sort_by_key(|message| message.created_at_epoch_millis);
            (author, group)
        })
        .collect();

    let dangling: usize = by_author.values().map(Vec::len).sum();
    if dangling > 0 {
        debug!(
            "Dropped {} of {} messages with unresolved authors",
            dangling, message_total
        );
    }

    AggregatedResult::from_sorted_entries(entries)
}

/// Groups decoded stream events under their authors.
///
/// A message is attributed only to an author listed in the same event.
/// Authors seen in other events are never consulted, and a message with no
/// matching candidate is dropped.
pub fn aggregate_stream(events: Vec<StreamEvent>) -> AggregatedResult {
    let mut authors = Vec::new();
    let mut messages = Vec::new();

    for event in events {
        let StreamEvent {
            message,
            candidate_authors,
        } = event;
        let Some(message) = message else {
            trace!("Skipping stream event without a message");
            continue;
        };

        match candidate_authors
            .into_iter()
            .find(|candidate| candidate.id == message.author_id)
        {
            Some(author) => {
                authors.push(author);
                messages.push(message);
            }
            None => {
                debug!(
                    "Dropping message {}: author {} not included in its event",
                    message.id, message.author_id
                );
            }
        }
    }

    aggregate_bulk(authors, messages)
}
