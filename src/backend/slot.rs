//! Argument slot: the per-context holder for the next round's arguments.
//!
//! The slot doubles as the reentrancy detector for the trampoline:
//!
//! ```text
//! Idle ──set_args──> Pending(args) ──take_args──> Armed
//!                        ^                          │
//!                        └────────set_args──────────┘
//! any ──clear──> Idle
//! ```
//!
//! A slot is non-empty (`Pending` or `Armed`) exactly while a trampoline loop
//! for its context is running. `Armed` means the arguments were handed to the
//! body by move and the loop is waiting for the body to bounce or finish.

use std::cell::RefCell;
use std::fmt;

enum SlotState<A> {
    Idle,
    Pending(A),
    Armed,
}

/// Single-writer/single-reader storage for the arguments of the next step.
///
/// Not `Sync`: only code running inside the owning execution context touches
/// it, so no locking is needed.
pub struct ArgumentSlot<A> {
    state: RefCell<SlotState<A>>,
}

impl<A> ArgumentSlot<A> {
    /// Create an idle slot
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SlotState::Idle),
        }
    }

    /// Store the arguments for the next round, replacing any pending ones
    pub fn set_args(&self, args: A) {
        *self.state.borrow_mut() = SlotState::Pending(args);
    }

    /// Hand the pending arguments to the caller, leaving the slot armed.
    ///
    /// Returns `None` when nothing is pending; the slot is left untouched.
    pub fn take_args(&self) -> Option<A> {
        let mut state = self.state.borrow_mut();
        match std::mem::replace(&mut *state, SlotState::Armed) {
            SlotState::Pending(args) => Some(args),
            other => {
                *state = other;
                None
            }
        }
    }

    /// True when no loop is running for this slot
    pub fn is_empty(&self) -> bool {
        matches!(*self.state.borrow(), SlotState::Idle)
    }

    #[cfg(test)]
    fn has_pending(&self) -> bool {
        matches!(*self.state.borrow(), SlotState::Pending(_))
    }

    /// Reset to idle, dropping any pending arguments
    pub fn clear(&self) {
        *self.state.borrow_mut() = SlotState::Idle;
    }
}

impl<A> Default for ArgumentSlot<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for ArgumentSlot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.state.borrow() {
            SlotState::Idle => "idle",
            SlotState::Pending(_) => "pending",
            SlotState::Armed => "armed",
        };
        f.debug_struct("ArgumentSlot").field("state", &state).finish()
    }
}
