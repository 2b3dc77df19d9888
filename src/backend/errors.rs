//! Error type shared by the trampoline engine and the context binders.
//!
//! Domain errors raised by a one-step body never pass through `TrapError`:
//! bodies use their own error type `E` and only require `E: From<TrapError>`,
//! so misuse reports and domain failures travel through the same `?` while the
//! domain error keeps its identity.

use thiserror::Error;

/// Result alias for operations whose only failure mode is a [`TrapError`]
pub type Result<T> = std::result::Result<T, TrapError>;

/// Failures raised by the tail-call machinery itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrapError {
    /// A tail-recursive operation was invoked with no execution context bound
    /// to the current worker (called directly instead of through a binder)
    #[error("unable to run a tail-recursive operation without an execution context")]
    NoContext,

    /// A loop with a different argument type is running in the context
    #[error("execution context is busy with a loop that does not take arguments of type {expected}")]
    ContextTypeMismatch { expected: &'static str },

    /// The loop resumed after a bounce but found no pending arguments
    #[error("trampoline resumed without pending arguments")]
    MissingArguments,

    /// A bounce marker was unwrapped as if it were a result
    #[error("recursive call result was inspected instead of being returned in tail position")]
    NonTailCall,

    /// The worker hosting an entry call went away without handing off a result
    #[error("worker terminated before delivering a result")]
    WorkerLost,

    /// The binder could not start the entry call
    #[error("failed to dispatch entry call: {0}")]
    Dispatch(String),

    /// A binder key was registered twice
    #[error("a context binder is already registered under key '{0}'")]
    DuplicateBinder(String),
}

impl TrapError {
    /// True for misuse of the API, as opposed to runtime failures of a worker
    pub fn is_illegal_state(&self) -> bool {
        matches!(
            self,
            TrapError::NoContext
                | TrapError::ContextTypeMismatch { .. }
                | TrapError::MissingArguments
                | TrapError::NonTailCall
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_context_message() {
        let msg = TrapError::NoContext.to_string();
        assert!(msg.contains("without an execution context"));
    }

    #[test]
    fn test_type_mismatch_names_expected_type() {
        let err = TrapError::ContextTypeMismatch {
            expected: std::any::type_name::<(u64, u64)>(),
        };
        assert!(err.to_string().contains("(u64, u64)"));
    }

    #[test]
    fn test_illegal_state_classification() {
        assert!(TrapError::NoContext.is_illegal_state());
        assert!(TrapError::NonTailCall.is_illegal_state());
        assert!(!TrapError::WorkerLost.is_illegal_state());
        assert!(!TrapError::Dispatch("spawn failed".to_string()).is_illegal_state());
        assert!(!TrapError::DuplicateBinder("pool".to_string()).is_illegal_state());
    }
}
