//! Batch coordinator — fans independent image tasks over a bounded worker
//! pool and aggregates partial success.
//!
//! Each task runs the strict chain mask → extract → normalize on its own
//! worker thread; the only shared state is the task queue and the outcome
//! channel. Per-task errors are downgraded to failure entries inside the
//! outcome — one unreadable photo never costs the rest of the batch. The
//! call returns only after every task reached a terminal state; there is no
//! mid-batch cancellation and no timeout budget beyond the HTTP client's
//! own request timeout.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use super::error::{BatchError, TaskError};
use super::gemini::TableExtractor;
use super::masking::mask_regions;
use super::normalize::normalize_extraction;
use super::types::{BatchOutcome, ImageTask, NormalizedRecord, TaskFailure};

/// Coordinates batch runs against an injected extraction collaborator.
///
/// The extractor is an explicit handle, not a module-level singleton, so
/// tests swap in mocks and the coordinator stays free of hidden state.
pub struct BatchCoordinator {
    extractor: Arc<dyn TableExtractor>,
}

impl BatchCoordinator {
    pub fn new(extractor: Arc<dyn TableExtractor>) -> Self {
        Self { extractor }
    }

    /// Run every task to a terminal state and aggregate the outcome.
    ///
    /// Worker pool size is `min(max_concurrency, tasks.len())`. Validation
    /// failures (empty batch, zero concurrency) are returned before any
    /// worker thread is spawned.
    pub fn run_batch(
        &self,
        tasks: Vec<ImageTask>,
        max_concurrency: usize,
    ) -> Result<BatchOutcome, BatchError> {
        if tasks.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        if max_concurrency == 0 {
            return Err(BatchError::Config("max_concurrency must be at least 1".into()));
        }

        let start = Instant::now();
        let total = tasks.len();
        let workers = max_concurrency.min(total);
        tracing::info!(total, workers, "starting extraction batch");

        let queue = Mutex::new(tasks.into_iter());
        let (tx, rx) = mpsc::channel::<Result<Vec<NormalizedRecord>, TaskFailure>>();

        let mut records = Vec::new();
        let mut failures = Vec::new();

        thread::scope(|scope| {
            let extractor: &dyn TableExtractor = self.extractor.as_ref();
            for _ in 0..workers {
                let tx = tx.clone();
                let queue = &queue;
                scope.spawn(move || loop {
                    let task = match queue.lock() {
                        Ok(mut iter) => iter.next(),
                        // A sibling worker panicked while holding the queue;
                        // nothing sane left to pull.
                        Err(_) => None,
                    };
                    let Some(task) = task else { break };
                    if tx.send(run_task(extractor, task)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            // Fan-in: outcomes arrive in completion order, not submission
            // order. The receiving end is the only writer of the accumulator.
            for outcome in rx {
                match outcome {
                    Ok(task_records) => records.extend(task_records),
                    Err(failure) => failures.push(failure),
                }
            }
        });

        let failed = failures.len();
        let outcome = BatchOutcome {
            total,
            succeeded: total - failed,
            failed,
            records,
            failures,
        };
        tracing::info!(
            total = outcome.total,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            records = outcome.records.len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "extraction batch complete"
        );
        Ok(outcome)
    }
}

/// Run one task to its terminal state, converting any error into a failure
/// entry keyed by filename.
fn run_task(
    extractor: &dyn TableExtractor,
    task: ImageTask,
) -> Result<Vec<NormalizedRecord>, TaskFailure> {
    let _span = tracing::info_span!("ledger_task", filename = %task.filename).entered();
    match process_task(extractor, &task) {
        Ok(records) => {
            tracing::debug!(records = records.len(), "task complete");
            Ok(records)
        }
        Err(e) => {
            tracing::warn!(error = %e, "task failed");
            Err(TaskFailure {
                filename: task.filename,
                error: e.to_string(),
            })
        }
    }
}

/// The strict per-task chain: mask → extract → normalize.
///
/// Also the single-image entry point for boundary layers that process one
/// upload at a time instead of a batch.
pub fn process_task(
    extractor: &dyn TableExtractor,
    task: &ImageTask,
) -> Result<Vec<NormalizedRecord>, TaskError> {
    let masked = mask_regions(&task.image_bytes, &task.regions)?;
    let extraction = extractor.extract(&masked)?;
    Ok(normalize_extraction(&task.filename, &extraction.rows))
}
