//! The search entry point: one constructor, one `solve()`

use crate::error::Result;
use crate::search::astar::{AStar, AStarCore};
use crate::search::config::{Algorithm, SearchConfig};
use crate::search::parallel::{PulledAStar, ServedAStar, SymmetricAStar};
use crate::search::progress::Progress;
use crate::search::result::SearchStatistics;
use crate::search::{SearchAlgorithm, SearchProblem};
use crossbeam_channel::Sender;
use std::sync::Arc;

/// A search request bound to a start state and a configuration
///
/// Each `solve()` builds a fresh solver for the configured strategy, so
/// repeated calls search from scratch.
///
/// # Example
///
/// ```ignore
/// use parallel_astar::search::{Algorithm, Search, SearchConfig, problem_fn};
///
/// let problem = problem_fn(|n: &u32| *n == 10, |n| 10 - *n as u64, |n| vec![(n + 1, 1)]);
/// let config = SearchConfig::default().with_algorithm(Algorithm::Served);
/// let path = Search::new(0, problem, config).solve()?;
/// ```
pub struct Search<P: SearchProblem> {
    initial: P::State,
    problem: Arc<P>,
    config: SearchConfig,
    reporting: Option<Sender<Progress>>,
    statistics: SearchStatistics,
}

impl<P: SearchProblem> Search<P> {
    pub fn new(initial: P::State, problem: P, config: SearchConfig) -> Self {
        Self::shared(initial, Arc::new(problem), config)
    }

    /// Build around a problem that is already shared
    pub fn shared(initial: P::State, problem: Arc<P>, config: SearchConfig) -> Self {
        let statistics =
            SearchStatistics::new(config.algorithm, config.storage, config.effective_workers());
        Self {
            initial,
            problem,
            config,
            reporting: None,
            statistics,
        }
    }

    /// Emit a progress sample on every take from the frontier
    pub fn with_reporting(mut self, sender: Sender<Progress>) -> Self {
        self.reporting = Some(sender);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn core(&self) -> AStarCore<P> {
        let core = AStarCore::shared(Arc::clone(&self.problem));
        match &self.reporting {
            Some(sender) => core.with_reporting(sender.clone()),
            None => core,
        }
    }

    fn run<A>(&mut self, mut solver: A) -> Result<Option<Vec<P::State>>>
    where
        A: SearchAlgorithm<State = P::State>,
    {
        let result = solver.solve();
        self.statistics = solver.statistics();
        result
    }
}

impl<P: SearchProblem> SearchAlgorithm for Search<P> {
    type State = P::State;

    fn solve(&mut self) -> Result<Option<Vec<P::State>>> {
        let initial = self.initial.clone();
        let core = self.core();
        match self.config.algorithm {
            Algorithm::Sequential => {
                let solver = AStar::new(initial, core, self.config.storage);
                self.run(solver)
            }
            Algorithm::Symmetric => {
                let solver = SymmetricAStar::new(initial, core, &self.config);
                self.run(solver)
            }
            Algorithm::Served => {
                let solver = ServedAStar::new(initial, core, &self.config);
                self.run(solver)
            }
            Algorithm::Pulled => {
                let solver = PulledAStar::new(initial, core, &self.config);
                self.run(solver)
            }
        }
    }

    fn statistics(&self) -> SearchStatistics {
        self.statistics.clone()
    }

    fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }
}
