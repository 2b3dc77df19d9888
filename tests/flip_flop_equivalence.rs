//! The slot-emptiness engine behaves like a flip-flop engine that tracks
//! "loop running" in a separate boolean.

use std::cell::{Cell, RefCell};

use proptest::prelude::*;
use tailtrap::{trap, ExecutionContext, Tail, TrapError};

#[derive(Debug, Clone, PartialEq)]
enum WalkError {
    Tripped { step: u64 },
    Trap(TrapError),
}

impl From<TrapError> for WalkError {
    fn from(e: TrapError) -> Self {
        WalkError::Trap(e)
    }
}

// ============================================================================
// Flip-flop reference engine
// ============================================================================

enum Step<R> {
    Done(R),
    Rebind,
}

struct FlipFlop<A> {
    looping: Cell<bool>,
    pending: RefCell<Option<A>>,
}

impl<A> FlipFlop<A> {
    fn new() -> Self {
        Self {
            looping: Cell::new(false),
            pending: RefCell::new(None),
        }
    }

    fn trap<R, E>(&self, mut call: impl FnMut(A) -> Result<Step<R>, E>, args: A) -> Result<Step<R>, E> {
        *self.pending.borrow_mut() = Some(args);
        if self.looping.get() {
            return Ok(Step::Rebind);
        }

        self.looping.set(true);
        let result = loop {
            let args = self.pending.borrow_mut().take().expect("loop round without arguments");
            match call(args) {
                Ok(Step::Rebind) => continue,
                other => break other,
            }
        };
        self.looping.set(false);
        result
    }
}

// ============================================================================
// The same walk on both engines
// ============================================================================

/// Collatz walk from `n`, failing when the step count reaches `trip`
fn collatz_slot(
    ctx: &ExecutionContext,
    calls: &Cell<u64>,
    trip: u64,
    n: u64,
    step: u64,
) -> Result<Tail<u64>, WalkError> {
    trap(
        ctx,
        |(n, step): (u64, u64)| {
            calls.set(calls.get() + 1);
            if step == trip {
                return Err(WalkError::Tripped { step });
            }
            if n == 1 {
                return Ok(Tail::done(step));
            }
            let next = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
            collatz_slot(ctx, calls, trip, next, step + 1)
        },
        (n, step),
    )
}

fn collatz_flip_flop(
    engine: &FlipFlop<(u64, u64)>,
    calls: &Cell<u64>,
    trip: u64,
    n: u64,
    step: u64,
) -> Result<Step<u64>, WalkError> {
    engine.trap(
        |(n, step)| {
            calls.set(calls.get() + 1);
            if step == trip {
                return Err(WalkError::Tripped { step });
            }
            if n == 1 {
                return Ok(Step::Done(step));
            }
            let next = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
            collatz_flip_flop(engine, calls, trip, next, step + 1)
        },
        (n, step),
    )
}

fn run_slot(n: u64, trip: u64) -> (Result<u64, WalkError>, u64) {
    let ctx = ExecutionContext::new();
    let calls = Cell::new(0);
    let result = collatz_slot(&ctx, &calls, trip, n, 0).and_then(|tail| Ok(tail.into_value()?));
    assert!(ctx.is_idle());
    (result, calls.get())
}

fn run_flip_flop(n: u64, trip: u64) -> (Result<u64, WalkError>, u64) {
    let engine = FlipFlop::new();
    let calls = Cell::new(0);
    let result = collatz_flip_flop(&engine, &calls, trip, n, 0).map(|step| match step {
        Step::Done(steps) => steps,
        Step::Rebind => unreachable!("outer call returned a rebind"),
    });
    assert!(!engine.looping.get());
    (result, calls.get())
}

proptest! {
    /// Same result and the same number of body invocations on both engines
    #[test]
    fn engines_agree(n in 1u64..20_000, trip in 0u64..300) {
        prop_assert_eq!(run_slot(n, trip), run_flip_flop(n, trip));
    }

    /// Contexts are reusable across walks exactly like flip-flop engines
    #[test]
    fn engines_agree_on_reuse(walks in prop::collection::vec((1u64..5_000, 0u64..200), 1..8)) {
        let ctx = ExecutionContext::new();
        let engine = FlipFlop::new();
        for (n, trip) in walks {
            let slot_calls = Cell::new(0);
            let flip_calls = Cell::new(0);
            let slot = collatz_slot(&ctx, &slot_calls, trip, n, 0).and_then(|tail| Ok(tail.into_value()?));
            let flip = collatz_flip_flop(&engine, &flip_calls, trip, n, 0).map(|step| match step {
                Step::Done(steps) => steps,
                Step::Rebind => unreachable!("outer call returned a rebind"),
            });
            prop_assert_eq!(slot, flip);
            prop_assert_eq!(slot_calls.get(), flip_calls.get());
        }
    }
}

#[test]
fn test_known_walk() {
    assert_eq!(run_slot(27, u64::MAX), (Ok(111), 112));
    assert_eq!(run_flip_flop(27, 5), (Err(WalkError::Tripped { step: 5 }), 6));
}
