//! Bounded-concurrency batch pipeline.
//!
//! Fans a record stream out to at most `workers` in-flight operations and
//! collects outcomes in completion order. Success payloads are folded into
//! the caller's accumulator on the collecting side only, so the accumulator
//! needs no synchronization even though operations run concurrently.

use std::future::Future;
use std::time::{Duration, Instant};

use futures::{pin_mut, Stream, StreamExt};
use indicatif::ProgressBar;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Result of one per-record operation.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The record was processed; the payload goes to the accumulator.
    Success(T),
    /// The record was not eligible for this phase. Not a failure.
    Skip,
    /// The record could not be processed. The pipeline keeps going; failures
    /// are independent across records.
    Failure { id: String, reason: String },
}

/// Counts and timing for one pipeline run.
#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    pub total: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Ids of the records that failed, for the end-of-phase summary.
    pub failed_ids: Vec<String>,
    pub elapsed: Duration,
}

pub struct BatchPipeline {
    workers: usize,
}

impl Default for BatchPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl BatchPipeline {
    /// `workers` is clamped to at least one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Drive every record through `op`, with at most `workers` operations in
    /// flight. `accumulate` receives each success payload as its outcome
    /// arrives; completion order is scheduler-determined, not submission
    /// order. The progress bar ticks once per completed record.
    pub async fn run<R, T, Op, Fut, Acc>(
        &self,
        records: impl Stream<Item = R>,
        op: Op,
        mut accumulate: Acc,
        progress: &ProgressBar,
    ) -> BatchReport
    where
        Op: Fn(R) -> Fut,
        Fut: Future<Output = Outcome<T>>,
        Acc: FnMut(T),
    {
        let start = Instant::now();
        let mut report = BatchReport::default();

        let outcomes = records.map(op).buffer_unordered(self.workers);
        pin_mut!(outcomes);

        while let Some(outcome) = outcomes.next().await {
            report.total += 1;
            match outcome {
                Outcome::Success(payload) => {
                    report.succeeded += 1;
                    accumulate(payload);
                }
                Outcome::Skip => report.skipped += 1,
                Outcome::Failure { id, .. } => {
                    report.failed += 1;
                    report.failed_ids.push(id);
                }
            }
            progress.inc(1);
        }

        report.elapsed = start.elapsed();
        report
    }
}
