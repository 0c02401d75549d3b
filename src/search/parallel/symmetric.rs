//! Synchronous batch strategy: one round of expansions at a time

use crate::error::Result;
use crate::search::astar::AStarCore;
use crate::search::config::{Algorithm, SearchConfig};
use crate::search::parallel::conclude;
use crate::search::parallel::coordinator::{ExpanderPool, absorb_response};
use crate::search::result::SearchStatistics;
use crate::search::storage::{FrontierItem, Storage};
use crate::search::{SearchAlgorithm, SearchProblem};
use std::time::Instant;
use tracing::{debug, info};

/// Lockstep parallel A*
///
/// Each round takes up to `group_size` items sharing the lowest estimate,
/// hands one to each worker and waits for the whole batch. A round that
/// dispatches nothing ends the search; a round that reaches a goal ends it
/// with that goal.
pub struct SymmetricAStar<P: SearchProblem> {
    core: AStarCore<P>,
    storage: Box<dyn Storage<P::State>>,
    group_size: usize,
    statistics: SearchStatistics,
}

impl<P: SearchProblem> SymmetricAStar<P> {
    pub fn new(initial: P::State, core: AStarCore<P>, config: &SearchConfig) -> Self {
        let mut storage = config.storage.build();
        storage.record(core.initial_item(initial), None);
        let group_size = config.group_size.max(1);
        Self {
            core,
            storage,
            group_size,
            statistics: SearchStatistics::new(Algorithm::Symmetric, config.storage, group_size),
        }
    }

    fn run_rounds(&mut self, pool: &mut ExpanderPool<P>) -> Result<Option<FrontierItem<P::State>>> {
        let mut round = 0u64;

        loop {
            let mut dispatched = 0;
            while dispatched < self.group_size {
                let Some(item) = self.storage.take() else {
                    break;
                };
                if !pool.admits(&item) {
                    self.storage.reinsert(item);
                    break;
                }
                self.core.note_taken(&item);
                pool.dispatch(item)?;
                dispatched += 1;
            }

            if dispatched == 0 {
                return Ok(None);
            }

            round += 1;
            debug!(round, dispatched, open = self.storage.len(), "Round dispatched");

            let mut goal = None;
            for _ in 0..dispatched {
                let response = pool.receive()?;
                if let Some(found) = absorb_response(self.storage.as_mut(), response) {
                    goal.get_or_insert(found);
                }
            }
            if goal.is_some() {
                return Ok(goal);
            }
        }
    }
}

impl<P: SearchProblem> SearchAlgorithm for SymmetricAStar<P> {
    type State = P::State;

    fn solve(&mut self) -> Result<Option<Vec<P::State>>> {
        let start = Instant::now();
        info!(
            workers = self.group_size,
            storage = %self.statistics.storage,
            "Starting symmetric search"
        );

        let mut pool = ExpanderPool::spawn(&self.core, self.group_size)?;
        let goal = self.run_rounds(&mut pool);
        let stopped = pool.shutdown();
        let goal = goal?;
        stopped?;

        let storage = &self.storage;
        conclude(
            &self.core,
            goal,
            |state| Ok(storage.parent(state)),
            &mut self.statistics,
            start,
        )
    }

    fn statistics(&self) -> SearchStatistics {
        self.statistics.clone()
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Symmetric
    }
}
