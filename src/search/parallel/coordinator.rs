//! Expander worker pool shared by the request/response strategies

use crate::error::{Result, SearchError};
use crate::search::astar::{AStarCore, Expansion};
use crate::search::{SearchProblem, State};
use crate::search::parallel::channel::{
    CoordinatorChannels, WorkRequest, WorkResponse, WorkerChannels, create_channels,
};
use crate::search::storage::{FrontierItem, Storage};
use crate::search::Cost;
use crossbeam_channel::RecvTimeoutError;
use std::collections::BTreeMap;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// How long the coordinator blocks before checking on its workers
const WATCHDOG_INTERVAL: Duration = Duration::from_millis(100);

/// A fixed group of threads expanding items sent by the coordinator
///
/// The pool only admits an item whose estimate is no higher than every
/// estimate still in flight. An in-flight item with a lower estimate could
/// reach the same states more cheaply, so expanding a costlier item beside
/// it would break the at-most-once expansion of the deduplicating storage.
pub struct ExpanderPool<P: SearchProblem> {
    channels: CoordinatorChannels<P::State>,
    handles: Vec<Option<JoinHandle<()>>>,
    outstanding: usize,
    /// Estimates of the items in flight
    in_flight: BTreeMap<Cost, usize>,
    /// A worker died, so some outstanding requests will never be answered
    failed: bool,
    stopped: bool,
}

impl<P: SearchProblem> ExpanderPool<P> {
    /// Spawn `workers` expander threads running `core`
    pub fn spawn(core: &AStarCore<P>, workers: usize) -> Result<Self> {
        let (coordinator, worker_channels) = create_channels();
        let mut pool = Self {
            channels: coordinator,
            handles: Vec::with_capacity(workers),
            outstanding: 0,
            in_flight: BTreeMap::new(),
            failed: false,
            stopped: false,
        };

        for worker_id in 0..workers {
            let core = core.clone();
            let channels = worker_channels.clone();
            // On failure the pool's Drop stops the threads already started
            let handle = thread::Builder::new()
                .name(format!("astar-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, core, channels))?;
            pool.handles.push(Some(handle));
        }

        debug!(workers, "Expander pool started");
        Ok(pool)
    }

    /// Worker threads in the pool
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Requests sent and not yet answered
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Workers with no request in flight
    pub fn idle(&self) -> usize {
        self.size().saturating_sub(self.outstanding)
    }

    /// Whether `item` may be expanded alongside the items in flight
    pub fn admits(&self, item: &FrontierItem<P::State>) -> bool {
        match self.in_flight.keys().next() {
            Some(&lowest) => item.priority() <= lowest,
            None => true,
        }
    }

    /// Hand an item to whichever worker is free
    pub fn dispatch(&mut self, item: FrontierItem<P::State>) -> Result<()> {
        let priority = item.priority();
        self.channels
            .requests
            .send(WorkRequest::Expand(item))
            .map_err(|_| SearchError::ChannelClosed)?;
        self.outstanding += 1;
        *self.in_flight.entry(priority).or_insert(0) += 1;
        Ok(())
    }

    /// Block for the next response
    ///
    /// Fails instead of blocking forever if a worker thread has died.
    pub fn receive(&mut self) -> Result<WorkResponse<P::State>> {
        loop {
            match self.channels.responses.recv_timeout(WATCHDOG_INTERVAL) {
                Ok(response) => {
                    self.outstanding = self.outstanding.saturating_sub(1);
                    let priority = response.item.priority();
                    if let Some(count) = self.in_flight.get_mut(&priority) {
                        *count -= 1;
                        if *count == 0 {
                            self.in_flight.remove(&priority);
                        }
                    }
                    return Ok(response);
                }
                Err(RecvTimeoutError::Timeout) => self.check_workers()?,
                Err(RecvTimeoutError::Disconnected) => return Err(self.reap_workers()),
            }
        }
    }

    /// Explain a closed response channel by joining the workers
    ///
    /// Every worker has dropped its sender, so every join returns promptly.
    fn reap_workers(&mut self) -> SearchError {
        self.failed = true;
        let mut lost = None;
        for (worker_id, slot) in self.handles.iter_mut().enumerate() {
            if let Some(handle) = slot.take() {
                if handle.join().is_err() {
                    return SearchError::WorkerPanicked { worker_id };
                }
                lost.get_or_insert(worker_id);
            }
        }
        match lost {
            Some(worker_id) => SearchError::WorkerLost { worker_id },
            None => SearchError::ChannelClosed,
        }
    }

    /// Fail if any worker exited before being told to stop
    fn check_workers(&mut self) -> Result<()> {
        for (worker_id, slot) in self.handles.iter_mut().enumerate() {
            let finished = slot.as_ref().is_some_and(|h| h.is_finished());
            if !finished {
                continue;
            }
            if let Some(handle) = slot.take() {
                self.failed = true;
                return match handle.join() {
                    Err(_) => Err(SearchError::WorkerPanicked { worker_id }),
                    Ok(()) => Err(SearchError::WorkerLost { worker_id }),
                };
            }
        }
        Ok(())
    }

    /// Drain in-flight responses, send one sentinel per worker and join
    pub fn shutdown(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        while self.outstanding > 0 && !self.failed {
            if let Err(e) = self.receive() {
                warn!(error = %e, outstanding = self.outstanding, "Abandoning in-flight responses");
                break;
            }
        }

        for _ in 0..self.handles.len() {
            let _ = self.channels.requests.send(WorkRequest::Stop);
        }

        let mut result = Ok(());
        for (worker_id, slot) in self.handles.iter_mut().enumerate() {
            if let Some(handle) = slot.take() {
                if handle.join().is_err() && result.is_ok() {
                    result = Err(SearchError::WorkerPanicked { worker_id });
                }
            }
        }

        debug!("Expander pool stopped");
        result
    }
}

impl<P: SearchProblem> Drop for ExpanderPool<P> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "Expander pool shut down with an error");
        }
    }
}

/// Record one response in the coordinator's frontier
///
/// Returns the goal item if the response reached one.
pub fn absorb_response<S: State>(
    storage: &mut dyn Storage<S>,
    response: WorkResponse<S>,
) -> Option<FrontierItem<S>> {
    match response.expansion {
        Expansion::Goal(item) => {
            debug!(worker_id = response.worker_id, cost = item.cost, "Worker reached goal");
            Some(item)
        }
        Expansion::Successors(items) => {
            storage.record_all(items, Some(response.item.state));
            None
        }
    }
}

/// Worker loop: expand items until the sentinel arrives
fn run_worker<P: SearchProblem>(
    worker_id: usize,
    core: AStarCore<P>,
    channels: WorkerChannels<P::State>,
) {
    debug!(worker_id, "Expander started");

    while let Ok(request) = channels.requests.recv() {
        let item = match request {
            WorkRequest::Expand(item) => item,
            WorkRequest::Stop => break,
        };

        let expansion = core.next_states(&item);
        let response = WorkResponse {
            worker_id,
            item,
            expansion,
        };
        if channels.responses.send(response).is_err() {
            break;
        }
    }

    debug!(worker_id, "Expander stopped");
}
