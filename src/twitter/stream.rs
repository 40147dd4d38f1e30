//! Bounded consumption of the filtered stream.
//!
//! The consumer reads one line at a time and stops at the first of: the
//! source running dry, the hit budget being reached, or the wait budget
//! running out. Read failures end consumption early with whatever was
//! decoded so far. Undecodable lines are logged and skipped.

use futures::FutureExt;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{timeout_at, Instant};

use super::decode::{decode_bytes, StreamEvent};
use crate::error::SearchError;

/// The dual stop condition for one stream consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamBudget {
    max_wait: Duration,
    max_hits: usize,
}

impl StreamBudget {
    /// Builds a budget, rejecting zero values instead of clamping them.
    pub fn new(max_wait_seconds: u64, max_hits: usize) -> Result<Self, SearchError> {
        if max_wait_seconds < 1 {
            return Err(SearchError::InvalidArgument(
                "max_wait_seconds cannot be < 1".to_string(),
            ));
        }
        if max_hits < 1 {
            return Err(SearchError::InvalidArgument(
                "max_hits cannot be < 1".to_string(),
            ));
        }
        Ok(Self {
            max_wait: Duration::from_secs(max_wait_seconds),
            max_hits,
        })
    }

    /// Longest time consumption may run.
    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Number of decoded events after which consumption stops.
    pub fn max_hits(&self) -> usize {
        self.max_hits
    }
}

/// Why consumption ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Exhausted,
    HitLimit,
    TimeLimit,
    ReadError,
}

/// Decoded events in source order, plus how and when consumption ended.
#[derive(Debug, Clone)]
pub struct ConsumedStream {
    pub events: Vec<StreamEvent>,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Consumes `source` until the budget is spent or the source ends.
///
/// Both budget checks run before every read, and each pending read is cut
/// off at the wait deadline. Blank and malformed lines (including lines that
/// are not valid UTF-8) do not count as hits. The source is dropped before
/// returning on every path.
///
/// # Parameters
///
/// - `source`: Buffered line source, usually the body of the filtered stream
/// - `budget`: Wait and hit limits for this consumption
///
/// # Returns
///
/// The decoded events in source order and the reason consumption ended
pub async fn consume<R>(mut source: R, budget: StreamBudget) -> ConsumedStream
where
    R: AsyncBufRead + Unpin,
{
    let started = Instant::now();
    // None when the wait budget is too large to be represented as an instant
    let deadline = started.checked_add(budget.max_wait());
    let mut events = Vec::new();
    let mut lines_read: u64 = 0;
    let mut buf = Vec::new();

    let stop_reason = loop {
        if events.len() >= budget.max_hits() {
            if is_drained(&mut source) {
                break StopReason::Exhausted;
            }
            break StopReason::HitLimit;
        }
        if started.elapsed() >= budget.max_wait() {
            break StopReason::TimeLimit;
        }

        buf.clear();
        let read = source.read_until(b'\n', &mut buf);
        let outcome = match deadline {
            Some(deadline) => timeout_at(deadline, read).await,
            None => Ok(read.await),
        };

        match outcome {
            Err(_) => break StopReason::TimeLimit,
            Ok(Ok(0)) => break StopReason::Exhausted,
            Ok(Ok(_)) => {
                lines_read += 1;
                if let Some(event) = decode_bytes(&buf) {
                    events.push(event);
                }
            }
            Ok(Err(e)) => {
                warn!("msg=[Failed to read response stream line], error=[{}]", e);
                break StopReason::ReadError;
            }
        }
    };
    drop(source);

    let elapsed = started.elapsed();
    info!(
        "Stream consumption stopped: reason={:?}, hits={}, lines={}, elapsed={:.3}s",
        stop_reason,
        events.len(),
        lines_read,
        elapsed.as_secs_f64()
    );
    debug!(
        "Stream budget was {}s / {} hits",
        budget.max_wait().as_secs(),
        budget.max_hits()
    );

    ConsumedStream {
        events,
        stop_reason,
        elapsed,
    }
}

/// Reports whether `source` is already known to be at end of input.
///
/// Polls the source exactly once and never waits: a source with no data
/// ready yet counts as not drained.
fn is_drained<R>(source: &mut R) -> bool
where
    R: AsyncBufRead + Unpin,
{
    matches!(source.fill_buf().now_or_never(), Some(Ok(buf)) if buf.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tokio::io::{AsyncWriteExt, BufReader};

    fn line(id: &str) -> String {
        format!(
            r#"{{"data":{{"id":"{id}","text":"t","author_id":"u1","created_at":"2024-01-01T00:00:00.000Z"}},"includes":{{"users":[{{"id":"u1","created_at":"2010-01-01T00:00:00.000Z"}}]}}}}"#
        )
    }

    fn ids(consumed: &ConsumedStream) -> Vec<String> {
        consumed
            .events
            .iter()
            .map(|e| e.message.as_ref().unwrap().id.clone())
            .collect()
    }

    #[test]
    fn test_budget_rejects_zero_values() {
        assert!(matches!(
            StreamBudget::new(0, 10),
            Err(SearchError::InvalidArgument(_))
        ));
        assert!(matches!(
            StreamBudget::new(10, 0),
            Err(SearchError::InvalidArgument(_))
        ));
        let budget = StreamBudget::new(1, 1).unwrap();
        assert_eq!(budget.max_wait(), Duration::from_secs(1));
        assert_eq!(budget.max_hits(), 1);
    }

    #[tokio::test]
    async fn test_consume_skips_blank_lines() {
        let input = format!("{}\n\n{}\r\n\r\n{}\n", line("a"), line("b"), line("c"));
        let budget = StreamBudget::new(60, 3).unwrap();

        let consumed = consume(input.as_bytes(), budget).await;

        // the last hit coincides with the end of the source
        assert_eq!(ids(&consumed), vec!["a", "b", "c"]);
        assert_eq!(consumed.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_hit_limit_on_live_source_does_not_wait_for_more() {
        let (reader, mut writer) = tokio::io::duplex(4096);
        writer
            .write_all(format!("{}\n{}\n", line("a"), line("b")).as_bytes())
            .await
            .unwrap();
        let budget = StreamBudget::new(60, 2).unwrap();

        let consumed = consume(BufReader::new(reader), budget).await;

        assert_eq!(ids(&consumed), vec!["a", "b"]);
        assert_eq!(consumed.stop_reason, StopReason::HitLimit);
        assert!(consumed.elapsed < Duration::from_secs(1));
        drop(writer);
    }

    #[tokio::test]
    async fn test_consume_with_unrepresentable_deadline() {
        let budget = StreamBudget::new(u64::MAX, 1).unwrap();

        let consumed = consume(&b""[..], budget).await;
        assert!(consumed.events.is_empty());
        assert_eq!(consumed.stop_reason, StopReason::Exhausted);

        let input = format!("{}\n{}\n", line("a"), line("b"));
        let consumed = consume(input.as_bytes(), budget).await;
        assert_eq!(ids(&consumed), vec!["a"]);
        assert_eq!(consumed.stop_reason, StopReason::HitLimit);
    }

    #[tokio::test]
    async fn test_consume_stops_at_hit_limit() {
        let input = format!("{}\n\n{}\n\n{}\n", line("a"), line("b"), line("c"));
        let budget = StreamBudget::new(60, 2).unwrap();

        let consumed = consume(input.as_bytes(), budget).await;

        assert_eq!(ids(&consumed), vec!["a", "b"]);
        assert_eq!(consumed.stop_reason, StopReason::HitLimit);
    }

    #[tokio::test]
    async fn test_consume_ends_on_exhaustion_below_hit_limit() {
        let input = format!("{}\n\n{}\n{}\n\n", line("a"), line("b"), line("c"));
        let budget = StreamBudget::new(60, 10).unwrap();

        let consumed = consume(input.as_bytes(), budget).await;

        assert_eq!(consumed.events.len(), 3);
        assert_eq!(consumed.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_malformed_lines_do_not_count_as_hits() {
        let input = format!(
            "garbage\n{}\n{{\"data\":\n{}\n[1,2]\n{}\n",
            line("a"),
            line("b"),
            line("c")
        );
        let budget = StreamBudget::new(60, 3).unwrap();

        let consumed = consume(input.as_bytes(), budget).await;

        assert_eq!(ids(&consumed), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_consume_empty_source() {
        let budget = StreamBudget::new(5, 5).unwrap();
        let consumed = consume(&b""[..], budget).await;
        assert!(consumed.events.is_empty());
        assert_eq!(consumed.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn test_read_error_returns_partial_result() {
        let first = format!("{}\n", line("a"));
        let mock = tokio_test::io::Builder::new()
            .read(first.as_bytes())
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let budget = StreamBudget::new(60, 10).unwrap();

        let consumed = consume(BufReader::new(mock), budget).await;

        assert_eq!(ids(&consumed), vec!["a"]);
        assert_eq!(consumed.stop_reason, StopReason::ReadError);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let mut input = format!("{}\n", line("a")).into_bytes();
        input.extend_from_slice(b"\xff\xfe\n");
        input.extend_from_slice(format!("{}\n", line("b")).as_bytes());
        let budget = StreamBudget::new(60, 10).unwrap();

        let consumed = consume(&input[..], budget).await;

        assert_eq!(ids(&consumed), vec!["a", "b"]);
        assert_eq!(consumed.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_read_is_cut_off_at_deadline() {
        let first = format!("{}\n", line("a"));
        let mock = tokio_test::io::Builder::new()
            .read(first.as_bytes())
            .wait(Duration::from_secs(600))
            .build();
        let budget = StreamBudget::new(60, 10).unwrap();

        let consumed = consume(BufReader::new(mock), budget).await;

        assert_eq!(ids(&consumed), vec!["a"]);
        assert_eq!(consumed.stop_reason, StopReason::TimeLimit);
        assert!(consumed.elapsed >= Duration::from_secs(60));
        assert!(consumed.elapsed < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_stops_on_time_budget() {
        let (reader, mut writer) = tokio::io::duplex(4096);
        let producer = tokio::spawn(async move {
            for id in ["a", "b", "c", "d"] {
                let payload = format!("{}\n", line(id));
                if writer.write_all(payload.as_bytes()).await.is_err() {
                    return;
                }
                tokio::time::sleep(Duration::from_secs(25)).await;
            }
        });
        let budget = StreamBudget::new(60, 100).unwrap();

        let consumed = consume(BufReader::new(reader), budget).await;

        // lines arrive at 0s, 25s and 50s; the 75s line is past the deadline
        assert_eq!(ids(&consumed), vec!["a", "b", "c"]);
        assert_eq!(consumed.stop_reason, StopReason::TimeLimit);
        assert!(consumed.elapsed <= Duration::from_secs(61));
        producer.abort();
    }
}
