//! Fixed pool of background workers that performs every database write.
//!
//! Callers hand an async operation to [`WriteExecutor::submit`] and either
//! await the returned [`Pending`] or attach a callback with
//! [`WriteExecutor::submit_with`]. Jobs are pulled from one shared queue, so
//! at most `workers` writes run at the same time.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::error::{ServiceError, ServiceResult};

pub const DEFAULT_WORKERS: usize = 4;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub struct WriteExecutor {
    sender: mpsc::UnboundedSender<Job>,
    workers: Vec<JoinHandle<()>>,
}

/// Result of a submitted write, delivered once the worker finishes.
pub struct Pending<T> {
    receiver: oneshot::Receiver<ServiceResult<T>>,
}

impl<T> Pending<T> {
    pub async fn wait(self) -> ServiceResult<T> {
        self.receiver
            .await
            .unwrap_or(Err(ServiceError::WorkerUnavailable))
    }
}

impl WriteExecutor {
    /// Spawn `workers` tasks on the current tokio runtime.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    tracing::debug!(worker = index, "write worker started");
                    loop {
                        // Hold the lock only while waiting for the next job
                        let job = receiver.lock().await.recv().await;
                        match job {
                            Some(job) => job.await,
                            None => break,
                        }
                    }
                    tracing::debug!(worker = index, "write worker stopped");
                })
            })
            .collect();

        Self {
            sender,
            workers: handles,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue `operation` and return a handle to its result.
    pub fn submit<T, F>(&self, operation: F) -> Pending<T>
    where
        T: Send + 'static,
        F: Future<Output = ServiceResult<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let result = operation.await;
            if let Err(e) = &result {
                tracing::warn!("write rejected: {}", e);
            }
            // The caller may have stopped waiting
            let _ = tx.send(result);
        });

        // A closed queue drops the job and its sender, which `wait` reports
        // as WorkerUnavailable
        let _ = self.sender.send(job);
        Pending { receiver: rx }
    }

    /// Queue `operation` and invoke `callback` with its outcome on the worker.
    pub fn submit_with<T, F, C>(&self, operation: F, callback: C)
    where
        T: Send + 'static,
        F: Future<Output = ServiceResult<T>> + Send + 'static,
        C: FnOnce(ServiceResult<T>) + Send + 'static,
    {
        let job: Job = Box::pin(async move {
            callback(operation.await);
        });

        if self.sender.send(job).is_err() {
            tracing::error!("write submitted after executor shutdown");
        }
    }

    /// Stop accepting work and wait for queued jobs to drain.
    pub async fn shutdown(self) {
        drop(self.sender);
        for handle in self.workers {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_submit_returns_result() {
        let executor = WriteExecutor::new(DEFAULT_WORKERS);
        assert_eq!(executor.worker_count(), 4);

        let value = executor.submit(async { Ok(21 * 2) }).wait().await.unwrap();
        assert_eq!(value, 42);

        let err = executor
            .submit(async { Err::<(), _>(ServiceError::PatientNotFound) })
            .wait()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Patient not found");
    }

    #[tokio::test]
    async fn test_submit_with_posts_to_callback() {
        let executor = WriteExecutor::new(2);
        let (tx, rx) = oneshot::channel();

        executor.submit_with(async { Ok("saved") }, move |result| {
            let _ = tx.send(result.map_err(|e| e.to_string()));
        });

        assert_eq!(rx.await.unwrap(), Ok("saved"));
    }

    #[tokio::test]
    async fn test_at_most_worker_count_jobs_run_concurrently() {
        let executor = WriteExecutor::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let pending: Vec<_> = (0..6)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                executor.submit(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        for p in pending {
            p.wait().await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let executor = WriteExecutor::new(1);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = Arc::clone(&done);
            executor.submit_with(
                async move {
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                |_: ServiceResult<()>| {},
            );
        }

        executor.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }
}
