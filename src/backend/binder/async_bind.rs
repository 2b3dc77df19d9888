//! Async entry point for binders
//!
//! The binder handoff blocks, so it runs on tokio's blocking pool and the
//! calling task awaits it without stalling the runtime.

use std::panic;
use std::sync::Arc;

use tokio::task;
use tracing::warn;

use super::{bind_with, ContextBinder};
use crate::backend::context::ExecutionContext;
use crate::backend::errors::TrapError;

/// Run `entry` in a fresh execution context on `binder` from async code.
///
/// A panic in `entry` is resumed in the awaiting task. A cancelled blocking
/// task is reported as [`TrapError::WorkerLost`].
pub async fn bind_async<R, E, F>(binder: Arc<dyn ContextBinder>, entry: F) -> Result<R, E>
where
    R: Send + 'static,
    E: From<TrapError> + Send + 'static,
    F: FnOnce(&ExecutionContext) -> Result<R, E> + Send + 'static,
{
    match task::spawn_blocking(move || bind_with(&*binder, entry)).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
        Err(e) => {
            warn!(target: "tailtrap::binder", error = %e, "blocking bind task cancelled");
            Err(TrapError::WorkerLost.into())
        }
    }
}
