//! Context binders: run a top-level entry call inside a fresh execution context.
//!
//! A [`ContextBinder`] only decides *where* a job runs. The generic
//! [`bind_with`] template builds that job: it provisions a fresh context, runs
//! the entry call in it, tears the context down on every exit path, and hands
//! the outcome back to the caller through a capacity-one channel. The caller
//! blocks on that handoff, so every binder is observably synchronous.
//!
//! Strategies:
//! - [`ThreadBinder`] - a dedicated thread per call (the default)
//! - [`InlineBinder`] - the caller's own thread
//! - [`PoolBinder`] - a persistent [`WorkerPool`]
//!
//! Errors returned by the entry call come back unchanged. Panics are caught on
//! the worker and resumed on the caller with their original payload.
//!
//! There is no timeout: a non-terminating entry call blocks its caller forever.

mod registry;

#[cfg(feature = "async")]
mod async_bind;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::bounded;
use tracing::{debug, warn};

use crate::backend::context::ExecutionContext;
use crate::backend::errors::{Result, TrapError};
use crate::backend::thread_pool::{Job, WorkerPool};
use crate::config::TrapConfig;

pub use registry::{global_registry, BinderRegistry};

#[cfg(feature = "async")]
pub use async_bind::bind_async;

/// Execution strategy for entry calls
pub trait ContextBinder: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run `job` on the worker this binder stands for.
    ///
    /// Must either arrange for `job` to run exactly once or drop it and
    /// return an error.
    fn dispatch(&self, job: Job) -> Result<()>;
}

impl<'a> dyn ContextBinder + 'a {
    /// Shorthand for [`bind_with`] on a binder trait object
    pub fn bind<R, E, F>(&self, entry: F) -> std::result::Result<R, E>
    where
        R: Send + 'static,
        E: From<TrapError> + Send + 'static,
        F: FnOnce(&ExecutionContext) -> std::result::Result<R, E> + Send + 'static,
    {
        bind_with(self, entry)
    }
}

/// Run `entry` in a fresh execution context on the worker chosen by `binder`.
pub fn bind_with<R, E, F>(binder: &dyn ContextBinder, entry: F) -> std::result::Result<R, E>
where
    R: Send + 'static,
    E: From<TrapError> + Send + 'static,
    F: FnOnce(&ExecutionContext) -> std::result::Result<R, E> + Send + 'static,
{
    let (handoff, outcome) = bounded::<thread::Result<std::result::Result<R, E>>>(1);

    let job: Job = Box::new(move || {
        // The context is torn down inside `scope`, before the handoff
        let result = panic::catch_unwind(AssertUnwindSafe(|| ExecutionContext::scope(entry)));
        let _ = handoff.send(result);
    });

    debug!(target: "tailtrap::binder", binder = binder.name(), "dispatching entry call");
    binder.dispatch(job)?;

    match outcome.recv() {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => panic::resume_unwind(payload),
        Err(_) => {
            warn!(target: "tailtrap::binder", binder = binder.name(), "worker dropped the entry call");
            Err(TrapError::WorkerLost.into())
        }
    }
}

/// Run `entry` with the default binder of the global registry
pub fn bind<R, E, F>(entry: F) -> std::result::Result<R, E>
where
    R: Send + 'static,
    E: From<TrapError> + Send + 'static,
    F: FnOnce(&ExecutionContext) -> std::result::Result<R, E> + Send + 'static,
{
    let binder = global_registry().default_binder();
    bind_with(&*binder, entry)
}

/// Run `entry` with the binder registered under `key` in the global registry,
/// falling back to the default binder when the key is absent or unknown
pub fn bind_keyed<R, E, F>(key: Option<&str>, entry: F) -> std::result::Result<R, E>
where
    R: Send + 'static,
    E: From<TrapError> + Send + 'static,
    F: FnOnce(&ExecutionContext) -> std::result::Result<R, E> + Send + 'static,
{
    let binder = global_registry().lookup(key);
    bind_with(&*binder, entry)
}

/// Runs entry calls on the caller's own thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineBinder;

impl ContextBinder for InlineBinder {
    fn name(&self) -> &str {
        "inline"
    }

    fn dispatch(&self, job: Job) -> Result<()> {
        job();
        Ok(())
    }
}

/// Spawns one dedicated thread per entry call; the thread ends with the call
#[derive(Debug)]
pub struct ThreadBinder {
    prefix: String,
    stack_size: Option<usize>,
    spawned: AtomicU64,
}

impl ThreadBinder {
    pub fn new() -> Self {
        Self::from_config(&TrapConfig::default())
    }

    pub fn from_config(config: &TrapConfig) -> Self {
        Self {
            prefix: config.thread_prefix.clone(),
            stack_size: config.stack_size,
            spawned: AtomicU64::new(0),
        }
    }

    /// Number of threads spawned so far
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl Default for ThreadBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBinder for ThreadBinder {
    fn name(&self) -> &str {
        "thread"
    }

    fn dispatch(&self, job: Job) -> Result<()> {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        let mut builder = thread::Builder::new().name(format!("{}-{}", self.prefix, n));
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }
        builder
            .spawn(job)
            .map(|_| ())
            .map_err(|e| TrapError::Dispatch(format!("failed to spawn context thread: {}", e)))
    }
}

/// Runs entry calls on a persistent worker pool
#[derive(Debug)]
pub struct PoolBinder {
    pool: WorkerPool,
}

impl PoolBinder {
    pub fn new(config: &TrapConfig) -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::new(config)?,
        })
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

impl ContextBinder for PoolBinder {
    fn name(&self) -> &str {
        "pool"
    }

    fn dispatch(&self, job: Job) -> Result<()> {
        self.pool.execute(job)
    }
}
