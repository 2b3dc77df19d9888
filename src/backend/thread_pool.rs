//! Persistent worker pool for pooled context binders
//!
//! Workers stay alive and read jobs from a bounded channel, so a pooled binder
//! does not pay a thread spawn per top-level call. Each job brings its own
//! execution context; nothing survives on a worker between jobs.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       WorkerPool                         │
//! │                                                          │
//! │  ┌─────────┐    ┌───────────────────────────────────┐    │
//! │  │ Sender  │───>│ Bounded Channel (num_threads * 4) │    │
//! │  └─────────┘    └───────────────────────────────────┘    │
//! │                          │                               │
//! │         ┌────────────────┼────────────────┐              │
//! │         ▼                ▼                ▼              │
//! │   ┌──────────┐     ┌──────────┐     ┌──────────┐         │
//! │   │ Worker 1 │     │ Worker 2 │     │ Worker N │         │
//! │   └──────────┘     └──────────┘     └──────────┘         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A job that binds again on the pool it runs on waits for a free worker; if
//! every worker does that at once the pool deadlocks. Use a thread binder for
//! nested entry calls.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::backend::errors::{Result, TrapError};
use crate::config::TrapConfig;

/// A boxed job that can be sent across threads
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of named worker threads
pub struct WorkerPool {
    sender: RwLock<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown: Arc<AtomicBool>,
    num_threads: usize,
}

impl WorkerPool {
    /// Spawn `config.worker_threads` workers, named `<prefix>-pool-<n>`
    pub fn new(config: &TrapConfig) -> Result<Self> {
        let num_threads = config.worker_threads.max(1);
        let (sender, receiver) = bounded::<Job>(num_threads * 4);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(num_threads);
        for id in 0..num_threads {
            let rx = receiver.clone();
            let shutdown = Arc::clone(&shutdown);
            let mut builder = thread::Builder::new().name(format!("{}-pool-{}", config.thread_prefix, id));
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }
            let handle = builder
                .spawn(move || worker_loop(rx, shutdown))
                .map_err(|e| TrapError::Dispatch(format!("failed to spawn pool worker: {}", e)))?;
            workers.push(handle);
        }
        debug!(target: "tailtrap::pool", num_threads, "worker pool started");

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
            shutdown,
            num_threads,
        })
    }

    /// Get the number of worker threads in the pool
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Queue a job; blocks while the queue is full.
    ///
    /// Fails with [`TrapError::Dispatch`] once the pool has been shut down.
    pub fn execute(&self, job: Job) -> Result<()> {
        let sender = self.sender.read();
        let sender = sender
            .as_ref()
            .ok_or_else(|| TrapError::Dispatch("worker pool has been shut down".to_string()))?;
        sender
            .send(job)
            .map_err(|_| TrapError::Dispatch("worker pool has been shut down".to_string()))
    }

    /// True once `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Stop accepting jobs and wait for the workers to exit.
    ///
    /// Jobs still queued are dropped; their callers observe
    /// [`TrapError::WorkerLost`].
    pub fn shutdown(&self) {
        // Close the channel first so blocked senders finish while workers still drain
        drop(self.sender.write().take());

        // Signal shutdown
        self.shutdown.store(true, Ordering::SeqCst);

        let current = thread::current().id();
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            // A worker shutting down its own pool cannot join itself
            if worker.thread().id() != current {
                let _ = worker.join();
            }
        }
        debug!(target: "tailtrap::pool", "worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Worker thread main loop
fn worker_loop(receiver: Receiver<Job>, shutdown: Arc<AtomicBool>) {
    loop {
        // Check for shutdown
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        // Block on receiving a job; a closed channel ends the worker
        let Ok(job) = receiver.recv() else {
            break;
        };

        // Binder jobs catch their own panics; this keeps raw jobs from killing the worker
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            warn!(target: "tailtrap::pool", "pool job panicked");
        }
    }
}
