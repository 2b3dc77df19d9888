//! Shared collaborators for integration tests
//!
//! This module provides the tail-recursive operations the tests drive through
//! the public API:
//! - Fibonacci over `BigUint` (seeded with 1, 1)
//! - Factorial over `i64` with overflow detection
//! - Naive (non-tail) reference implementations
//! - A per-thread depth probe recorded by the one-step bodies

#![allow(dead_code)]

use std::cell::Cell;

use num_bigint::BigUint;
use tailtrap::{trap_current, Tail, TrapError};
use thiserror::Error;

/// Domain errors of the test operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("{0} is negative; the operation is not defined there")]
    Negative(i64),

    #[error("result overflows at {0}")]
    Overflow(i64),

    #[error(transparent)]
    Trap(#[from] TrapError),
}

// ============================================================================
// Depth probe
// ============================================================================

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static MAX_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts nested body frames on the current thread while alive
pub struct DepthProbe;

impl DepthProbe {
    pub fn enter() -> Self {
        let depth = DEPTH.with(|d| {
            d.set(d.get() + 1);
            d.get()
        });
        MAX_DEPTH.with(|m| m.set(m.get().max(depth)));
        DepthProbe
    }
}

impl Drop for DepthProbe {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get() - 1));
    }
}

pub fn reset_depth() {
    DEPTH.with(|d| d.set(0));
    MAX_DEPTH.with(|m| m.set(0));
}

/// Deepest nesting of body frames seen on this thread since the last reset
pub fn max_depth() -> usize {
    MAX_DEPTH.with(|m| m.get())
}

// ============================================================================
// Fibonacci
// ============================================================================

/// Entry wrapper: `fib(0) = fib(1) = 1`, otherwise the standard `F(n)`.
///
/// Must run inside a bound context.
pub fn fibonacci(n: i64) -> Result<BigUint, MathError> {
    if n < 0 {
        return Err(MathError::Negative(n));
    }
    if n < 2 {
        return Ok(BigUint::from(1u32));
    }
    Ok(fib_step(BigUint::from(1u32), BigUint::from(1u32), (n - 2) as u64)?.into_value()?)
}

fn fib_step(prev: BigUint, current: BigUint, remaining: u64) -> Result<Tail<BigUint>, MathError> {
    trap_current(
        |(prev, current, remaining): (BigUint, BigUint, u64)| {
            let _probe = DepthProbe::enter();
            if remaining == 0 {
                return Ok(Tail::done(current));
            }
            let next = &prev + &current;
            fib_step(current, next, remaining - 1)
        },
        (prev, current, remaining),
    )
}

/// Naive recursive reference with the same seeding
pub fn reference_fibonacci(n: u64) -> BigUint {
    fn standard(n: u64) -> BigUint {
        if n <= 2 {
            return BigUint::from(1u32);
        }
        standard(n - 1) + standard(n - 2)
    }

    if n == 0 {
        BigUint::from(1u32)
    } else {
        standard(n)
    }
}

// ============================================================================
// Factorial
// ============================================================================

/// Entry wrapper: `factorial(0) = factorial(1) = 1`.
///
/// Must run inside a bound context.
pub fn factorial(n: i64) -> Result<i64, MathError> {
    if n < 0 {
        return Err(MathError::Negative(n));
    }
    if n < 2 {
        return Ok(1);
    }
    Ok(factorial_step(n, n - 1)?.into_value()?)
}

fn factorial_step(current: i64, remaining: i64) -> Result<Tail<i64>, MathError> {
    trap_current(
        |(current, remaining): (i64, i64)| {
            let _probe = DepthProbe::enter();
            if remaining == 1 {
                return Ok(Tail::done(current));
            }
            let next = current.checked_mul(remaining).ok_or(MathError::Overflow(remaining))?;
            factorial_step(next, remaining - 1)
        },
        (current, remaining),
    )
}

pub fn reference_factorial(n: i64) -> i64 {
    (1..=n).product()
}

/// Install a fmt subscriber writing through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
