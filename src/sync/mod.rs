//! Synchronization primitives for the parallel strategies

pub mod idle;

pub use idle::{IdleBarrier, WaitOutcome};
