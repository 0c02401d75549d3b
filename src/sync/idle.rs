//! Idle-detection barrier
//!
//! N workers share one barrier. A worker that runs out of work calls
//! `wait()`; a worker that produces new work calls `reset()`, which sends
//! every current waiter back to look for it. Only when all N are waiting at
//! once is the search really out of work, and every waiter learns so.
//! `destroy()` releases everyone for good, for when a worker has already
//! finished the search.
//!
//! Each `reset()` starts a new generation. A waiter compares generations
//! rather than counts, so it cannot miss a release even if other
//! participants re-enter `wait()` before it wakes up.

use parking_lot::{Condvar, Mutex};

/// How a `wait()` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Released by `reset()`: new work may exist
    Resumed,
    /// Every participant was waiting at once
    Idle,
    /// The barrier was destroyed
    Broken,
}

#[derive(Debug)]
struct BarrierState {
    broken: bool,
    waiting: usize,
    generation: u64,
}

/// Barrier that detects when all participants are idle simultaneously
#[derive(Debug)]
pub struct IdleBarrier {
    limit: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
}

impl IdleBarrier {
    /// Create a barrier for `limit` participants (at least one)
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            state: Mutex::new(BarrierState {
                broken: false,
                waiting: 0,
                generation: 0,
            }),
            released: Condvar::new(),
        }
    }

    /// Declare this participant idle and block until something changes
    ///
    /// The last of the `limit` participants to arrive does not block: it
    /// releases everyone with `Idle`. Once idle or broken, every further
    /// call returns at once.
    pub fn wait(&self) -> WaitOutcome {
        let mut state = self.state.lock();
        if state.broken {
            return WaitOutcome::Broken;
        }
        if state.waiting >= self.limit {
            return WaitOutcome::Idle;
        }

        state.waiting += 1;
        if state.waiting == self.limit {
            self.released.notify_all();
            return WaitOutcome::Idle;
        }

        let generation = state.generation;
        while !state.broken && state.generation == generation && state.waiting < self.limit {
            self.released.wait(&mut state);
        }

        if state.broken {
            WaitOutcome::Broken
        } else if state.generation != generation {
            WaitOutcome::Resumed
        } else {
            WaitOutcome::Idle
        }
    }

    /// Release every current waiter because new work appeared
    ///
    /// Returns false if the barrier is already broken or idle, in which case
    /// nothing changes.
    pub fn reset(&self) -> bool {
        let mut state = self.state.lock();
        if state.broken || state.waiting >= self.limit {
            return false;
        }
        if state.waiting > 0 {
            state.waiting = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
        }
        true
    }

    /// Break the barrier, releasing all current and future waiters
    ///
    /// Returns true for the call that actually broke it.
    pub fn destroy(&self) -> bool {
        let mut state = self.state.lock();
        if state.broken {
            return false;
        }
        state.broken = true;
        self.released.notify_all();
        true
    }

    /// Neither broken nor idle
    pub fn intact(&self) -> bool {
        let state = self.state.lock();
        !state.broken && state.waiting < self.limit
    }

    /// Participants currently waiting
    pub fn waiting(&self) -> usize {
        self.state.lock().waiting
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
