//! Execution contexts and the per-worker "current context" binding.
//!
//! An [`ExecutionContext`] belongs to exactly one logical call chain and owns
//! one [`ArgumentSlot`] at a time. The slot is typed by the trampoline that
//! uses it; an idle slot of another type is replaced, while an access with
//! another type during a running loop fails with
//! [`TrapError::ContextTypeMismatch`].
//!
//! Contexts are normally passed explicitly to
//! [`trap`](crate::backend::trampoline::trap). For tail operations that keep
//! their original signature, [`ExecutionContext::scope`] also installs the
//! context as the worker's current one so that
//! [`trap_current`](crate::backend::trampoline::trap_current) can find it.

use std::any::{type_name, Any};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::errors::{Result, TrapError};
use super::slot::ArgumentSlot;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: RefCell<Option<Rc<ExecutionContext>>> = const { RefCell::new(None) };
}

/// Type-erased view of a slot, enough for teardown
trait ErasedSlot {
    fn clear(&self);
    fn is_empty(&self) -> bool;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<A: 'static> ErasedSlot for ArgumentSlot<A> {
    fn clear(&self) {
        ArgumentSlot::clear(self)
    }

    fn is_empty(&self) -> bool {
        ArgumentSlot::is_empty(self)
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Scope of one logical call chain: one argument slot plus loop statistics
pub struct ExecutionContext {
    id: u64,
    slot: RefCell<Option<Rc<dyn ErasedSlot>>>,
    rounds: Cell<u64>,
}

impl ExecutionContext {
    /// Create a detached context with an empty slot
    pub fn new() -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            slot: RefCell::new(None),
            rounds: Cell::new(0),
        }
    }

    /// Process-unique id, used in trace output
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The argument slot of this context for arguments of type `A`.
    ///
    /// An idle slot of another type is replaced by a fresh one. Fails with
    /// [`TrapError::ContextTypeMismatch`] while a loop of another type runs.
    pub fn slot<A: 'static>(&self) -> Result<Rc<ArgumentSlot<A>>> {
        let mut current = self.slot.borrow_mut();
        if let Some(slot) = current.as_ref() {
            if let Ok(typed) = Rc::clone(slot).into_any().downcast::<ArgumentSlot<A>>() {
                return Ok(typed);
            }
            if !slot.is_empty() {
                return Err(TrapError::ContextTypeMismatch {
                    expected: type_name::<A>(),
                });
            }
        }

        let typed = Rc::new(ArgumentSlot::<A>::new());
        *current = Some(Rc::clone(&typed) as Rc<dyn ErasedSlot>);
        Ok(typed)
    }

    /// True when no trampoline loop is running in this context
    pub fn is_idle(&self) -> bool {
        self.slot.borrow().as_ref().map_or(true, |slot| slot.is_empty())
    }

    /// Total number of body invocations driven by trampoline loops in this context
    pub fn rounds(&self) -> u64 {
        self.rounds.get()
    }

    pub(crate) fn record_rounds(&self, rounds: u64) {
        self.rounds.set(self.rounds.get() + rounds);
    }

    fn clear(&self) {
        if let Some(slot) = self.slot.borrow().as_ref() {
            slot.clear();
        }
    }

    /// Run `f` inside a fresh context that is current for this worker.
    ///
    /// The previous current context (if any) is restored and the fresh slot is
    /// cleared when `f` returns or unwinds.
    pub fn scope<R>(f: impl FnOnce(&ExecutionContext) -> R) -> R {
        let guard = ContextGuard::install(Rc::new(ExecutionContext::new()));
        f(&guard.ctx)
    }

    /// Look up the context bound to the current worker
    pub fn current() -> Result<Rc<ExecutionContext>> {
        CURRENT
            .with(|current| current.borrow().clone())
            .ok_or(TrapError::NoContext)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("idle", &self.is_idle())
            .field("rounds", &self.rounds.get())
            .finish()
    }
}

/// True if some execution context is bound to the current worker
pub fn has_current() -> bool {
    CURRENT.with(|current| current.borrow().is_some())
}

/// Binds a context as current for its lifetime; tears it down on drop
struct ContextGuard {
    ctx: Rc<ExecutionContext>,
    previous: Option<Rc<ExecutionContext>>,
}

impl ContextGuard {
    fn install(ctx: Rc<ExecutionContext>) -> Self {
        let previous = CURRENT.with(|current| current.borrow_mut().replace(Rc::clone(&ctx)));
        debug!(target: "tailtrap::context", id = ctx.id, nested = previous.is_some(), "context bound");
        Self { ctx, previous }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.ctx.clear();
        let previous = self.previous.take();
        // TLS may already be gone when a worker thread is exiting
        let _ = CURRENT.try_with(|current| *current.borrow_mut() = previous);
        debug!(target: "tailtrap::context", id = self.ctx.id, rounds = self.ctx.rounds.get(), "context released");
    }
}
