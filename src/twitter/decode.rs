//! Decoding of single lines from the filtered stream.

use log::{debug, trace, warn};

use super::api::sanitize_for_logging;
use super::wire::StreamLine;
use crate::model::{Author, Message};

/// One decoded stream line: an optional tweet plus the authors the API
/// included alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub message: Option<Message>,
    pub candidate_authors: Vec<Author>,
}

/// Decodes one line of the stream.
///
/// Blank lines (the stream sends `\r\n` keep-alives) and lines that fail to
/// parse yield `None`. Parse failures are logged and never returned, so the
/// stream keeps flowing. A line is either decoded completely or not at all.
pub fn decode(line: &str) -> Option<StreamEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        trace!("Skipping keep-alive line");
        return None;
    }

    let parsed: StreamLine = match serde_json::from_str(trimmed) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(
                "msg=[Failed to parse response stream line], error=[{}], line=[{}]",
                e,
                sanitize_for_logging(trimmed, 200)
            );
            return None;
        }
    };

    if let Some(rules) = &parsed.matching_rules {
        debug!(
            "Stream line matched rules: {:?}",
            rules.iter().filter_map(|r| r.tag.as_deref()).collect::<Vec<_>>()
        );
    }

    let candidate_authors = parsed
        .includes
        .and_then(|includes| includes.users)
        .unwrap_or_default()
        .into_iter()
        .map(Author::from)
        .collect();

    Some(StreamEvent {
        message: parsed.data.map(Message::from),
        candidate_authors,
    })
}

/// Decodes one raw line of the stream.
///
/// Bytes that are not valid UTF-8 make the line undecodable; they are
/// reported like any other malformed line and yield `None`.
pub fn decode_bytes(line: &[u8]) -> Option<StreamEvent> {
    match std::str::from_utf8(line) {
        Ok(line) => decode(line),
        Err(e) => {
            warn!(
                "msg=[Failed to parse response stream line], error=[{}], line=[{}]",
                e,
                sanitize_for_logging(&String::from_utf8_lossy(line), 200)
            );
            None
        }
    }
}
