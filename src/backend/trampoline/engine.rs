//! Trampoline Engine - Depth-1 Tail Call Elimination
//!
//! `trap` is called by a tail-recursive operation with its one-step body and
//! the arguments of the current call. The first (outer) call in a context
//! drives a loop; every recursive call made by the body while that loop is
//! running only rebinds the arguments and returns the sentinel, which unwinds
//! the body's frame. Only one frame of the recursive operation is alive at any
//! time, whatever the logical recursion depth.
//!
//! ```text
//! outer trap(args0)          slot: Pending(args0)
//!   loop:
//!     call(args0)            slot: Armed
//!       op(args1) -> trap    slot: Pending(args1), returns Bounce
//!     <- Bounce              continue
//!     call(args1)            slot: Armed
//!     <- Done(r)             slot cleared, return Done(r)
//! ```

use tracing::trace;

use crate::backend::context::ExecutionContext;
use crate::backend::errors::TrapError;
use crate::backend::slot::ArgumentSlot;

use super::types::{Sentinel, Tail};

/// Engine shared by the free `trap` functions
static ENGINE: Trampoline = Trampoline::new();

/// A trampoline engine.
///
/// Bounce markers cannot be created outside this crate, but they carry no
/// engine identity: which loop a bounce belongs to is decided by the context.
#[derive(Debug)]
pub struct Trampoline {
    sentinel: Sentinel,
}

impl Trampoline {
    pub const fn new() -> Self {
        Trampoline {
            sentinel: Sentinel::new(),
        }
    }

    /// Intercept one invocation of a tail-recursive operation.
    ///
    /// If a loop is already running for `ctx` (non-empty slot) this is a
    /// recursive call: the slot is overwritten with `args` and a bounce is
    /// returned without invoking `call`. Otherwise the loop is started and
    /// driven until `call` produces a terminal result or fails. The slot is
    /// cleared on every exit path before the result or error is returned.
    pub fn trap<A, R, E, F>(&self, ctx: &ExecutionContext, mut call: F, args: A) -> Result<Tail<R>, E>
    where
        A: 'static,
        F: FnMut(A) -> Result<Tail<R>, E>,
        E: From<TrapError>,
    {
        let slot = ctx.slot::<A>()?;
        if !slot.is_empty() {
            slot.set_args(args);
            return Ok(Tail::bounce(self.sentinel));
        }

        slot.set_args(args);
        let mut guard = LoopGuard {
            ctx,
            slot: &slot,
            rounds: 0,
        };
        trace!(target: "tailtrap::trampoline", ctx = ctx.id(), "loop started");

        loop {
            let args = slot.take_args().ok_or(TrapError::MissingArguments)?;
            guard.rounds += 1;
            let step = call(args)?;
            if step.is_done() {
                trace!(target: "tailtrap::trampoline", ctx = ctx.id(), rounds = guard.rounds, "loop finished");
                return Ok(step);
            }
        }
    }
}

impl Default for Trampoline {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the slot and records statistics when the driving loop exits
struct LoopGuard<'a, A> {
    ctx: &'a ExecutionContext,
    slot: &'a ArgumentSlot<A>,
    rounds: u64,
}

impl<A> Drop for LoopGuard<'_, A> {
    fn drop(&mut self) {
        self.slot.clear();
        self.ctx.record_rounds(self.rounds);
    }
}

/// Run one invocation of a tail-recursive operation in an explicit context.
///
/// This is the reference form: the operation threads `ctx` to itself.
///
/// ```
/// use tailtrap::{trap, ExecutionContext, Tail, TrapError};
///
/// fn sum_to(ctx: &ExecutionContext, n: u64, acc: u64) -> Result<Tail<u64>, TrapError> {
///     trap(ctx, |(n, acc)| {
///         if n == 0 {
///             return Ok(Tail::done(acc));
///         }
///         sum_to(ctx, n - 1, acc + n)
///     }, (n, acc))
/// }
///
/// let total = ExecutionContext::scope(|ctx| sum_to(ctx, 100_000, 0)?.into_value()).unwrap();
/// assert_eq!(total, 5_000_050_000);
/// ```
pub fn trap<A, R, E, F>(ctx: &ExecutionContext, call: F, args: A) -> Result<Tail<R>, E>
where
    A: 'static,
    F: FnMut(A) -> Result<Tail<R>, E>,
    E: From<TrapError>,
{
    ENGINE.trap(ctx, call, args)
}

/// Run one invocation of a tail-recursive operation in the worker's current context.
///
/// Lets the operation keep its original signature. Fails with
/// [`TrapError::NoContext`] when called outside a binder scope.
pub fn trap_current<A, R, E, F>(call: F, args: A) -> Result<Tail<R>, E>
where
    A: 'static,
    F: FnMut(A) -> Result<Tail<R>, E>,
    E: From<TrapError>,
{
    let ctx = ExecutionContext::current()?;
    ENGINE.trap(&ctx, call, args)
}
