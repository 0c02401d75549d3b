//! Pull strategy: workers step the driver against a shared storage proxy

use crate::error::{Result, SearchError};
use crate::search::astar::{AStarCore, StepOutcome};
use crate::search::config::{Algorithm, SearchConfig};
use crate::search::parallel::conclude;
use crate::search::result::SearchStatistics;
use crate::search::storage::{FrontierItem, RemoteStorage, StorageKind};
use crate::search::{SearchAlgorithm, SearchProblem};
use crate::sync::{IdleBarrier, WaitOutcome};
use crossbeam_channel::{Sender, unbounded};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Parallel A* without a dispatching coordinator
///
/// Every worker loops `single_step` against one `RemoteStorage`. A worker
/// that records new work resets the idle barrier; a worker that finds
/// nothing to take waits on it. The first goal breaks the barrier so all
/// workers exit. When every worker is waiting at once, the frontier is
/// truly exhausted.
pub struct PulledAStar<P: SearchProblem> {
    core: AStarCore<P>,
    initial: P::State,
    storage: StorageKind,
    group_size: usize,
    prepared: bool,
    statistics: SearchStatistics,
}

impl<P: SearchProblem> PulledAStar<P> {
    pub fn new(initial: P::State, core: AStarCore<P>, config: &SearchConfig) -> Self {
        let group_size = config.group_size.max(1);
        Self {
            core,
            initial,
            storage: config.storage,
            group_size,
            prepared: config.prepared,
            statistics: SearchStatistics::new(Algorithm::Pulled, config.storage, group_size),
        }
    }

    fn spawn_workers(
        &self,
        remote: &Arc<RemoteStorage<P::State>>,
        barrier: &Arc<IdleBarrier>,
        goals: &Sender<FrontierItem<P::State>>,
    ) -> Result<Vec<JoinHandle<Result<()>>>> {
        let mut handles = Vec::with_capacity(self.group_size);
        for worker_id in 0..self.group_size {
            let core = self.core.clone();
            let shared = Arc::clone(remote);
            let idle = Arc::clone(barrier);
            let found = goals.clone();
            let spawned = thread::Builder::new()
                .name(format!("astar-worker-{}", worker_id))
                .spawn(move || run_puller(worker_id, core, &shared, &idle, &found));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Release whoever already started before bailing out
                    barrier.destroy();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(SearchError::Spawn(e));
                }
            }
        }
        Ok(handles)
    }
}

impl<P: SearchProblem> SearchAlgorithm for PulledAStar<P> {
    type State = P::State;

    fn solve(&mut self) -> Result<Option<Vec<P::State>>> {
        let start = Instant::now();
        info!(
            workers = self.group_size,
            storage = %self.storage,
            prepared = self.prepared,
            "Starting pulled search"
        );

        let mut storage = self.storage.build();
        storage.record(self.core.initial_item(self.initial.clone()), None);
        let remote = Arc::new(if self.prepared {
            RemoteStorage::spawn_prepared(storage)?
        } else {
            RemoteStorage::spawn(storage)?
        });
        let barrier = Arc::new(IdleBarrier::new(self.group_size));
        let (goal_tx, goal_rx) = unbounded();

        let handles = self.spawn_workers(&remote, &barrier, &goal_tx)?;
        drop(goal_tx);

        let mut outcome = Ok(());
        for (worker_id, handle) in handles.into_iter().enumerate() {
            let joined = match handle.join() {
                Ok(result) => result,
                Err(_) => Err(SearchError::WorkerPanicked { worker_id }),
            };
            if let Err(e) = joined {
                warn!(worker_id, error = %e, "Worker failed");
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }
        outcome?;

        // Workers in the same estimate layer may each report a goal
        let goal = goal_rx.try_iter().min_by_key(|goal| goal.cost);
        remote.finish()?;

        conclude(
            &self.core,
            goal,
            |state| remote.parent(state),
            &mut self.statistics,
            start,
        )
    }

    fn statistics(&self) -> SearchStatistics {
        self.statistics.clone()
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Pulled
    }
}

/// Breaks the barrier if the worker unwinds, so the others do not wait forever
struct BreakOnPanic<'a>(&'a IdleBarrier);

impl Drop for BreakOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.destroy();
        }
    }
}

fn run_puller<P: SearchProblem>(
    worker_id: usize,
    core: AStarCore<P>,
    remote: &RemoteStorage<P::State>,
    barrier: &IdleBarrier,
    goals: &Sender<FrontierItem<P::State>>,
) -> Result<()> {
    let _guard = BreakOnPanic(barrier);
    debug!(worker_id, "Puller started");

    let result = pull_until_done(worker_id, &core, remote, barrier, goals);
    if result.is_err() {
        barrier.destroy();
    }

    debug!(worker_id, "Puller stopped");
    result
}

fn pull_until_done<P: SearchProblem>(
    worker_id: usize,
    core: &AStarCore<P>,
    remote: &RemoteStorage<P::State>,
    barrier: &IdleBarrier,
    goals: &Sender<FrontierItem<P::State>>,
) -> Result<()> {
    let mut frontier = remote;

    while barrier.intact() {
        match core.single_step(&mut frontier)? {
            // A check-in can also lift another worker's deferral
            StepOutcome::Expanded { .. } => {
                barrier.reset();
            }
            StepOutcome::Exhausted | StepOutcome::Deferred => match barrier.wait() {
                WaitOutcome::Resumed => {}
                WaitOutcome::Idle => {
                    debug!(worker_id, "All workers idle");
                    break;
                }
                WaitOutcome::Broken => break,
            },
            StepOutcome::Goal(item) => {
                debug!(worker_id, cost = item.cost, "Goal found");
                let _ = goals.send(item);
                barrier.destroy();
                break;
            }
        }
    }
    Ok(())
}
