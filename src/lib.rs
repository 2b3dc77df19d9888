//! Tailtrap - Tail Call Elimination Library
//!
//! Deep tail recursion in constant stack space. A tail-recursive operation
//! routes each call through [`trap`] (or [`trap_current`]) together with a
//! closure holding its one-step body. The first call in an execution context
//! drives a loop; every recursive call made while the loop runs only rebinds
//! the pending arguments and returns a bounce marker, so at most one frame of
//! the operation is live no matter how deep the logical recursion goes.
//!
//! # Architecture
//!
//! 1. **Argument Slot** (`backend::slot`)
//!    - Holds the arguments for the next body invocation
//!    - Empty exactly when no loop is running
//!
//! 2. **Execution Context** (`backend::context`)
//!    - One slot per logical call chain
//!    - Optionally bound as the current context of a worker
//!
//! 3. **Trampoline Engine** (`backend::trampoline`)
//!    - Outer call drives the loop, inner calls bounce
//!
//! 4. **Context Binders** (`backend::binder`)
//!    - Run a top-level call in a fresh context on a thread, pool or inline
//!    - Keyed registry with a configurable default
//!
//! # Example
//!
//! ```rust
//! use tailtrap::{bind, trap_current, Tail, TrapError};
//!
//! fn steps_to_one(n: u64, steps: u64) -> Result<Tail<u64>, TrapError> {
//!     trap_current(|(n, steps): (u64, u64)| {
//!         if n == 1 {
//!             return Ok(Tail::done(steps));
//!         }
//!         let next = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
//!         steps_to_one(next, steps + 1)
//!     }, (n, steps))
//! }
//!
//! let steps = bind(|_| steps_to_one(27, 0)?.into_value()).unwrap();
//! assert_eq!(steps, 111);
//! ```
//!
//! # Failure Semantics
//!
//! - **Errors**: the first error returned by a body stops the loop and is
//!   returned unchanged
//! - **Panics**: unwind through the loop, which still clears its slot; binders
//!   resume them on the caller
//! - **Misuse**: calling `trap_current` outside a binder scope fails with
//!   [`TrapError::NoContext`]

pub mod backend;
pub mod config;

pub use backend::{
    bind, bind_keyed, bind_with, global_registry, has_current, trap, trap_current, ArgumentSlot,
    BinderRegistry, ContextBinder, ExecutionContext, InlineBinder, PoolBinder, Result, Sentinel,
    Tail, ThreadBinder, Trampoline, TrapError, WorkerPool,
};
#[cfg(feature = "async")]
pub use backend::bind_async;
pub use config::{BinderKind, TrapConfig};
