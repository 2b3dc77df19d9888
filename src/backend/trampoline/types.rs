//! Trampoline Types
//!
//! A tail-recursive operation returns [`Tail<R>`] instead of `R`. The value is
//! either the terminal result of the operation or the bounce marker
//! ([`Sentinel`]) that tells the driving loop "arguments were rebound, run
//! another round". The marker lives in a private variant and can only be
//! created by the engine, so no domain value can ever be mistaken for it.
//! Markers carry no identity of their own; every `Sentinel` compares equal.

use std::fmt;

use crate::backend::errors::TrapError;

/// Opaque bounce marker owned by a trampoline engine
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Sentinel {
    _private: (),
}

impl Sentinel {
    pub(crate) const fn new() -> Self {
        Sentinel { _private: () }
    }
}

impl fmt::Debug for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sentinel")
    }
}

enum Step<R> {
    Done(R),
    Bounce(Sentinel),
}

/// Outcome of one invocation of a tail-recursive operation
pub struct Tail<R>(Step<R>);

impl<R> Tail<R> {
    /// Terminal (base case) result
    pub fn done(value: R) -> Self {
        Tail(Step::Done(value))
    }

    pub(crate) fn bounce(sentinel: Sentinel) -> Self {
        Tail(Step::Bounce(sentinel))
    }

    /// True for a terminal result, false for a bounce
    pub fn is_done(&self) -> bool {
        matches!(self.0, Step::Done(_))
    }

    /// Extract the terminal result.
    ///
    /// The outermost call of a tail operation always yields a terminal result.
    /// Unwrapping a bounce means a recursive call was used in non-tail position.
    pub fn into_value(self) -> Result<R, TrapError> {
        match self.0 {
            Step::Done(value) => Ok(value),
            Step::Bounce(_) => Err(TrapError::NonTailCall),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for Tail<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Step::Done(value) => f.debug_tuple("Tail::Done").field(value).finish(),
            Step::Bounce(_) => f.write_str("Tail::Bounce"),
        }
    }
}
