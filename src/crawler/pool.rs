//! Bounded worker pool with shared cancellation
//!
//! One producer feeds a bounded task channel, a fixed set of workers pull from
//! it and push results onto a bounded result channel, and a collector drains
//! the results. All of them share one [`CancellationToken`]: the first error
//! cancels it, every other participant stops taking work, and the stage
//! returns that error alone. Result order is completion order.

use crate::HarvestError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A fixed-size pool of concurrent workers
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool with `workers` workers (at least one)
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `work` over every task and blocks until the stage finishes
    ///
    /// Returns all results in completion order, or the first error observed;
    /// on error no partial results are returned.
    pub async fn run<T, R, F, Fut>(
        &self,
        stage: &'static str,
        tasks: Vec<T>,
        work: F,
    ) -> Result<Vec<R>, HarvestError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HarvestError>> + Send + 'static,
    {
        let total = tasks.len();
        tracing::debug!("{}: {} tasks on {} workers", stage, total, self.workers);

        let cancel = CancellationToken::new();
        let (task_tx, task_rx) = mpsc::channel::<T>(self.workers);
        let task_rx = Arc::new(Mutex::new(task_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<R>(self.workers);
        let work = Arc::new(work);

        let mut set: JoinSet<Result<(), HarvestError>> = JoinSet::new();

        set.spawn(produce(tasks, task_tx, cancel.clone()));

        for _ in 0..self.workers {
            set.spawn(worker(
                Arc::clone(&task_rx),
                result_tx.clone(),
                Arc::clone(&work),
                cancel.clone(),
            ));
        }
        // Only workers hold senders now; the collector ends when they all exit
        drop(result_tx);

        let collect = async {
            let mut results = Vec::with_capacity(total);
            while let Some(result) = result_rx.recv().await {
                results.push(result);
            }
            results
        };

        let supervise = async {
            let mut first_error = None;
            while let Some(joined) = set.join_next().await {
                let outcome = joined.unwrap_or_else(|e| Err(HarvestError::Worker(e.to_string())));
                if let Err(e) = outcome {
                    if first_error.is_none() {
                        tracing::warn!("{}: cancelling after error: {}", stage, e);
                        cancel.cancel();
                        first_error = Some(e);
                    }
                }
            }
            first_error
        };

        let (results, first_error) = tokio::join!(collect, supervise);

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::debug!("{}: {} results collected", stage, results.len());
                Ok(results)
            }
        }
    }
}

/// Emits every task, stopping as soon as the stage is cancelled
async fn produce<T>(
    tasks: Vec<T>,
    task_tx: mpsc::Sender<T>,
    cancel: CancellationToken,
) -> Result<(), HarvestError> {
    for task in tasks {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            sent = task_tx.send(task) => {
                if sent.is_err() {
                    // Every worker is gone
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

/// Pulls tasks until the channel closes or the stage is cancelled
async fn worker<T, R, F, Fut>(
    task_rx: Arc<Mutex<mpsc::Receiver<T>>>,
    result_tx: mpsc::Sender<R>,
    work: Arc<F>,
    cancel: CancellationToken,
) -> Result<(), HarvestError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, HarvestError>>,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            next = async { task_rx.lock().await.recv().await } => next,
        };

        let Some(task) = next else {
            return Ok(());
        };

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            output = work(task) => output,
        };

        match output {
            Ok(result) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(()),
                    sent = result_tx.send(result) => {
                        if sent.is_err() {
                            return Ok(());
                        }
                    }
                }
            }
            Err(e) => {
                cancel.cancel();
                return Err(e);
            }
        }
    }
}
