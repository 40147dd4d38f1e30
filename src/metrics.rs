//! Throughput metrics for completed requests.
//!
//! One line per request is written to the [`ResultSink`] and logged. Any
//! failure along the way degrades to an alternate line and is never
//! returned to the caller.

use chrono::Utc;
use log::{info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::MetricError;
use crate::model::AggregatedResult;
use crate::sink::ResultSink;

/// Which entry point produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Search,
    Stream,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Search => f.write_str("search"),
            RequestKind::Stream => f.write_str("stream"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub elapsed_secs: f64,
    pub hit_count: usize,
    pub hits_per_sec: f64,
}

/// Computes the hit rate for `hit_count` hits over `elapsed`.
pub fn compute_metric(elapsed: Duration, hit_count: usize) -> Result<MetricPoint, MetricError> {
    let elapsed_secs = elapsed.as_secs_f64();
    if elapsed_secs <= 0.0 {
        return Err(MetricError::ZeroElapsed);
    }
    let hits_per_sec = hit_count as f64 / elapsed_secs;
    if !hits_per_sec.is_finite() {
        return Err(MetricError::NonFiniteRate(hits_per_sec));
    }
    Ok(MetricPoint {
        elapsed_secs,
        hit_count,
        hits_per_sec,
    })
}

/// Formats the metric line for a successful request.
pub fn format_metric_line(kind: RequestKind, timestamp_millis: i64, point: &MetricPoint) -> String {
    format!(
        "msg=[Successful API response], kind=[{}], timestamp=[{}], timeTakenSecs=[{:.3}], hitCount=[{}], avgHitsPerSec=[{:.3}]",
        kind, timestamp_millis, point.elapsed_secs, point.hit_count, point.hits_per_sec
    )
}

/// Turns completed requests into metric lines on a shared [`ResultSink`].
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    sink: Arc<ResultSink>,
}

impl MetricsRecorder {
    /// Creates a recorder writing to `sink`.
    pub fn new(sink: Arc<ResultSink>) -> Self {
        Self { sink }
    }

    /// Emits one metric line for `result`, measured from `started`.
    pub fn record(&self, kind: RequestKind, started: Instant, result: &AggregatedResult) {
        let line = match compute_metric(started.elapsed(), result.hit_count()) {
            Ok(point) => format_metric_line(kind, Utc::now().timestamp_millis(), &point),
            Err(e) => format!(
                "msg=[Failed to compute metric], kind=[{}], error=[{}]",
                kind, e
            ),
        };

        info!("{}", line);
        if let Err(e) = self.sink.write_line(&line) {
            warn!("Failed to write metric line to output sink: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_bulk;
    use crate::model::Author;
    use crate::sink::{FailingWriter, SharedBuffer};

    fn result_with_authors(count: usize) -> AggregatedResult {
        let authors = (0..count)
            .map(|i| Author {
                id: format!("u{}", i),
                created_at_epoch_millis: i as i64,
                display_name: String::new(),
                handle: String::new(),
            })
            .collect();
        aggregate_bulk(authors, vec![])
    }

    #[test]
    fn test_compute_metric() {
        let point = compute_metric(Duration::from_secs(4), 10).unwrap();
        assert_eq!(point.hit_count, 10);
        assert_eq!(point.elapsed_secs, 4.0);
        assert_eq!(point.hits_per_sec, 2.5);
    }

    #[test]
    fn test_compute_metric_zero_elapsed() {
        assert_eq!(
            compute_metric(Duration::ZERO, 3),
            Err(MetricError::ZeroElapsed)
        );
    }

    #[test]
    fn test_format_metric_line() {
        let point = compute_metric(Duration::from_millis(1500), 3).unwrap();
        assert_eq!(
            format_metric_line(RequestKind::Stream, 42, &point),
            "msg=[Successful API response], kind=[stream], timestamp=[42], timeTakenSecs=[1.500], hitCount=[3], avgHitsPerSec=[2.000]"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_writes_line_to_sink() {
        let buffer = SharedBuffer::default();
        let recorder = MetricsRecorder::new(Arc::new(ResultSink::from_writer(buffer.clone())));
        let started = Instant::now();
        tokio::time::advance(Duration::from_secs(2)).await;

        recorder.record(RequestKind::Search, started, &result_with_authors(3));

        let contents = buffer.contents();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("kind=[search]"));
        assert!(contents.contains("hitCount=[3]"));
        assert!(contents.contains("avgHitsPerSec=[1.500]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_degrades_on_zero_elapsed() {
        let buffer = SharedBuffer::default();
        let recorder = MetricsRecorder::new(Arc::new(ResultSink::from_writer(buffer.clone())));

        recorder.record(RequestKind::Stream, Instant::now(), &result_with_authors(1));

        let contents = buffer.contents();
        assert!(contents.starts_with("msg=[Failed to compute metric], kind=[stream]"));
        assert!(contents.contains("elapsed time is zero"));
    }

    #[tokio::test]
    async fn test_record_survives_sink_failure() {
        let recorder = MetricsRecorder::new(Arc::new(ResultSink::from_writer(FailingWriter)));
        recorder.record(RequestKind::Search, Instant::now(), &AggregatedResult::empty());
    }
}
