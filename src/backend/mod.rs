// Backend of the tail-call trampoline
//
// This module provides the runtime pieces:
// - `slot`: one pending argument bundle per context
// - `context`: execution contexts and the per-worker current binding
// - `trampoline`: the depth-1 loop that replaces recursion
// - `binder`: entry points that run a call chain in a fresh context

pub mod binder;
pub mod context;
pub mod errors;
pub mod slot;
pub mod thread_pool;
pub mod trampoline;

pub use binder::{
    bind, bind_keyed, bind_with, global_registry, BinderRegistry, ContextBinder, InlineBinder,
    PoolBinder, ThreadBinder,
};
#[cfg(feature = "async")]
pub use binder::bind_async;
pub use context::{has_current, ExecutionContext};
pub use errors::{Result, TrapError};
pub use slot::ArgumentSlot;
pub use thread_pool::{Job, WorkerPool};
pub use trampoline::{trap, trap_current, Sentinel, Tail, Trampoline};
