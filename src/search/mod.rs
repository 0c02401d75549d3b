//! Best-first (A*) search over caller-supplied state spaces
//!
//! The engine never inspects a state. It only needs:
//! - a goal predicate
//! - a heuristic (admissible, i.e. never overestimating the remaining cost,
//!   for the returned path to be cost-optimal)
//! - an expander producing successor states with incremental costs
//!
//! Four interchangeable strategies run the search:
//! - Sequential: the single-threaded A* loop
//! - Symmetric: batches of expansions handed to a worker pool, in lockstep
//! - Served: the coordinator refills each worker as soon as it answers
//! - Pulled: workers step the driver directly against a shared storage proxy
//!
//! An admissible heuristic is a precondition the engine cannot check. A
//! heuristic that overestimates yields a valid but possibly more expensive
//! path, never a crash. The deduplicating `Unique` storage expands each state
//! once, which is only cost-optimal when the heuristic is also consistent
//! (`h(a) <= cost(a, b) + h(b)` along every edge); `Layered` storage only
//! needs admissibility.

pub mod astar;
pub mod config;
pub mod engine;
pub mod parallel;
pub mod progress;
pub mod result;
pub mod storage;
pub mod transition;

pub use astar::{AStar, AStarCore, Expansion, StepOutcome};
pub use config::{Algorithm, SearchConfig};
pub use engine::Search;
pub use parallel::{PulledAStar, ServedAStar, SymmetricAStar};
pub use progress::Progress;
pub use result::SearchStatistics;
pub use storage::{
    Checkout, Frontier, FrontierItem, LayeredStorage, ParentRecord, RemoteStorage, Storage,
    StorageKind, UniqueStorage,
};
pub use transition::{Move, TransitionAStar, TransitionProblem, transition_fn};

use crate::error::Result;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// Path and heuristic costs
pub type Cost = u64;

/// Anything the engine can search over
///
/// Equality and hashing define state identity for the parent map and the
/// deduplicating storage.
pub trait State: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> State for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// A state space to search
pub trait SearchProblem: Send + Sync + 'static {
    type State: State;

    /// Whether `state` satisfies the goal
    fn is_goal(&self, state: &Self::State) -> bool;

    /// Estimated remaining cost from `state` to the nearest goal
    fn heuristic(&self, state: &Self::State) -> Cost;

    /// Successor states paired with the cost of the transition
    fn expand(&self, state: &Self::State) -> Vec<(Self::State, Cost)>;

    /// States that can never reach a goal
    ///
    /// Dead ends are recorded with no estimate: they appear in the parent map
    /// but are never queued for expansion. The initial state is exempt.
    fn is_dead_end(&self, _state: &Self::State) -> bool {
        false
    }
}

/// Trait for the search strategies
pub trait SearchAlgorithm {
    type State: State;

    /// Run the search to completion
    ///
    /// # Returns
    /// The states from the initial state to a goal, `None` when the frontier
    /// was exhausted without reaching one.
    fn solve(&mut self) -> Result<Option<Vec<Self::State>>>;

    /// Get statistics from the most recent search
    fn statistics(&self) -> SearchStatistics;

    /// The strategy this solver runs
    fn algorithm(&self) -> Algorithm;
}

/// A search problem assembled from three closures
pub struct FnProblem<S, G, H, E> {
    goal: G,
    heuristic: H,
    expander: E,
    _state: PhantomData<fn() -> S>,
}

/// Build a problem from a goal predicate, heuristic and expander
pub fn problem_fn<S, G, H, E>(goal: G, heuristic: H, expander: E) -> FnProblem<S, G, H, E>
where
    S: State,
    G: Fn(&S) -> bool + Send + Sync + 'static,
    H: Fn(&S) -> Cost + Send + Sync + 'static,
    E: Fn(&S) -> Vec<(S, Cost)> + Send + Sync + 'static,
{
    FnProblem {
        goal,
        heuristic,
        expander,
        _state: PhantomData,
    }
}

impl<S, G, H, E> SearchProblem for FnProblem<S, G, H, E>
where
    S: State,
    G: Fn(&S) -> bool + Send + Sync + 'static,
    H: Fn(&S) -> Cost + Send + Sync + 'static,
    E: Fn(&S) -> Vec<(S, Cost)> + Send + Sync + 'static,
{
    type State = S;

    fn is_goal(&self, state: &S) -> bool {
        (self.goal)(state)
    }

    fn heuristic(&self, state: &S) -> Cost {
        (self.heuristic)(state)
    }

    fn expand(&self, state: &S) -> Vec<(S, Cost)> {
        (self.expander)(state)
    }
}
