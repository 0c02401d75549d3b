//! Searches that report the actions taken rather than the states visited

use crate::error::Result;
use crate::search::config::{Algorithm, SearchConfig};
use crate::search::engine::Search;
use crate::search::progress::Progress;
use crate::search::result::SearchStatistics;
use crate::search::{Cost, SearchAlgorithm, SearchProblem, State};
use crossbeam_channel::Sender;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A state space whose edges are labelled with actions
pub trait TransitionProblem: Send + Sync + 'static {
    type State: State;
    type Action: Clone + Debug + Send + Sync + 'static;

    fn is_goal(&self, state: &Self::State) -> bool;

    fn heuristic(&self, state: &Self::State) -> Cost;

    /// Successors paired with the action leading to them and its cost
    fn transitions(&self, state: &Self::State) -> Vec<(Self::State, Self::Action, Cost)>;

    fn is_dead_end(&self, _state: &Self::State) -> bool {
        false
    }
}

/// A state together with the action that produced it
///
/// Identity is the state alone, so two moves reaching the same state with
/// different actions collapse to one entry in the parent map.
#[derive(Debug, Clone)]
pub struct Move<S, A> {
    pub state: S,
    /// `None` for the initial state
    pub action: Option<A>,
}

impl<S: PartialEq, A> PartialEq for Move<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl<S: Eq, A> Eq for Move<S, A> {}

impl<S: Hash, A> Hash for Move<S, A> {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.state.hash(hasher);
    }
}

/// Runs a `TransitionProblem` through the state-based engine
struct Labelled<P>(P);

impl<P: TransitionProblem> SearchProblem for Labelled<P> {
    type State = Move<P::State, P::Action>;

    fn is_goal(&self, mv: &Self::State) -> bool {
        self.0.is_goal(&mv.state)
    }

    fn heuristic(&self, mv: &Self::State) -> Cost {
        self.0.heuristic(&mv.state)
    }

    fn expand(&self, mv: &Self::State) -> Vec<(Self::State, Cost)> {
        self.0
            .transitions(&mv.state)
            .into_iter()
            .map(|(state, action, cost)| {
                let next = Move {
                    state,
                    action: Some(action),
                };
                (next, cost)
            })
            .collect()
    }

    fn is_dead_end(&self, mv: &Self::State) -> bool {
        self.0.is_dead_end(&mv.state)
    }
}

/// Solves a `TransitionProblem` and returns the action sequence
pub struct TransitionAStar<P: TransitionProblem> {
    search: Search<Labelled<P>>,
}

impl<P: TransitionProblem> TransitionAStar<P> {
    pub fn new(initial: P::State, problem: P, config: SearchConfig) -> Self {
        let start = Move {
            state: initial,
            action: None,
        };
        Self {
            search: Search::new(start, Labelled(problem), config),
        }
    }

    pub fn with_reporting(self, sender: Sender<Progress>) -> Self {
        Self {
            search: self.search.with_reporting(sender),
        }
    }

    /// Run the search
    ///
    /// # Returns
    /// The actions from the initial state to a goal, empty when the initial
    /// state already is one, `None` when no goal is reachable.
    pub fn solve(&mut self) -> Result<Option<Vec<P::Action>>> {
        let path = self.search.solve()?;
        Ok(path.map(|moves| {
            moves
                .into_iter()
                .skip(1)
                .filter_map(|mv| mv.action)
                .collect()
        }))
    }

    pub fn statistics(&self) -> SearchStatistics {
        self.search.statistics()
    }

    pub fn algorithm(&self) -> Algorithm {
        self.search.algorithm()
    }
}

/// A transition problem assembled from closures
pub struct FnTransitionProblem<S, A, G, H, T> {
    goal: G,
    heuristic: H,
    transitions: T,
    _marker: PhantomData<fn() -> (S, A)>,
}

/// Build a transition problem from a goal predicate, heuristic and
/// transition function
pub fn transition_fn<S, A, G, H, T>(
    goal: G,
    heuristic: H,
    transitions: T,
) -> FnTransitionProblem<S, A, G, H, T>
where
    S: State,
    A: Clone + Debug + Send + Sync + 'static,
    G: Fn(&S) -> bool + Send + Sync + 'static,
    H: Fn(&S) -> Cost + Send + Sync + 'static,
    T: Fn(&S) -> Vec<(S, A, Cost)> + Send + Sync + 'static,
{
    FnTransitionProblem {
        goal,
        heuristic,
        transitions,
        _marker: PhantomData,
    }
}

impl<S, A, G, H, T> TransitionProblem for FnTransitionProblem<S, A, G, H, T>
where
    S: State,
    A: Clone + Debug + Send + Sync + 'static,
    G: Fn(&S) -> bool + Send + Sync + 'static,
    H: Fn(&S) -> Cost + Send + Sync + 'static,
    T: Fn(&S) -> Vec<(S, A, Cost)> + Send + Sync + 'static,
{
    type State = S;
    type Action = A;

    fn is_goal(&self, state: &S) -> bool {
        (self.goal)(state)
    }

    fn heuristic(&self, state: &S) -> Cost {
        (self.heuristic)(state)
    }

    fn transitions(&self, state: &S) -> Vec<(S, A, Cost)> {
        (self.transitions)(state)
    }
}
