//! Server-push strategy: refill each worker as soon as it answers

use crate::error::Result;
use crate::search::astar::AStarCore;
use crate::search::config::{Algorithm, SearchConfig};
use crate::search::parallel::conclude;
use crate::search::parallel::coordinator::{ExpanderPool, absorb_response};
use crate::search::result::SearchStatistics;
use crate::search::storage::{FrontierItem, Storage};
use crate::search::{SearchAlgorithm, SearchProblem};
use std::time::Instant;
use tracing::{info, trace};

/// Continuously saturated parallel A*
///
/// The coordinator records each response the moment it arrives and hands
/// the freed worker the next admissible item. The search fails once every
/// worker is idle with nothing left to hand out, and succeeds with the first
/// goal any worker reports.
pub struct ServedAStar<P: SearchProblem> {
    core: AStarCore<P>,
    storage: Box<dyn Storage<P::State>>,
    group_size: usize,
    statistics: SearchStatistics,
}

impl<P: SearchProblem> ServedAStar<P> {
    pub fn new(initial: P::State, core: AStarCore<P>, config: &SearchConfig) -> Self {
        let mut storage = config.storage.build();
        storage.record(core.initial_item(initial), None);
        let group_size = config.group_size.max(1);
        Self {
            core,
            storage,
            group_size,
            statistics: SearchStatistics::new(Algorithm::Served, config.storage, group_size),
        }
    }

    /// Dispatch to idle workers until none is idle or nothing is admissible
    fn saturate(&mut self, pool: &mut ExpanderPool<P>) -> Result<()> {
        while pool.idle() > 0 {
            let Some(item) = self.storage.take() else {
                break;
            };
            if !pool.admits(&item) {
                self.storage.reinsert(item);
                break;
            }
            self.core.note_taken(&item);
            pool.dispatch(item)?;
        }
        Ok(())
    }

    fn serve(&mut self, pool: &mut ExpanderPool<P>) -> Result<Option<FrontierItem<P::State>>> {
        loop {
            self.saturate(pool)?;

            if pool.idle() == pool.size() {
                return Ok(None);
            }

            let response = pool.receive()?;
            trace!(
                worker_id = response.worker_id,
                idle = pool.idle(),
                "Response received"
            );
            if let Some(goal) = absorb_response(self.storage.as_mut(), response) {
                return Ok(Some(goal));
            }
        }
    }
}

impl<P: SearchProblem> SearchAlgorithm for ServedAStar<P> {
    type State = P::State;

    fn solve(&mut self) -> Result<Option<Vec<P::State>>> {
        let start = Instant::now();
        info!(
            workers = self.group_size,
            storage = %self.statistics.storage,
            "Starting served search"
        );

        let mut pool = ExpanderPool::spawn(&self.core, self.group_size)?;
        let goal = self.serve(&mut pool);
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
        Algorithm::Served
    }
}
