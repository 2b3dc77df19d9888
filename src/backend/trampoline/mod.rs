//! Trampoline-based tail call elimination
//!
//! This module provides the bounce-marker types and the engine that flattens
//! self-recursive tail calls into a loop running in constant stack space.

mod engine;
mod types;

pub use engine::{trap, trap_current, Trampoline};
pub use types::{Sentinel, Tail};
