//! Messages and channels for the expander pool

use crate::search::astar::Expansion;
use crate::search::storage::FrontierItem;
use crate::search::State;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// Message sent from the coordinator to the expander workers
#[derive(Debug, Clone)]
pub enum WorkRequest<S> {
    /// Expand this item and answer with the result
    Expand(FrontierItem<S>),
    /// Sentinel: exit the worker loop
    Stop,
}

/// Message sent from an expander worker back to the coordinator
#[derive(Debug, Clone)]
pub struct WorkResponse<S> {
    pub worker_id: usize,
    /// The item that was expanded, parent of every successor
    pub item: FrontierItem<S>,
    pub expansion: Expansion<S>,
}

/// Channel endpoints for one expander worker
#[derive(Clone)]
pub struct WorkerChannels<S: State> {
    pub requests: Receiver<WorkRequest<S>>,
    pub responses: Sender<WorkResponse<S>>,
}

/// Channel endpoints for the coordinator
///
/// The coordinator holds no response sender, so the response channel
/// disconnects once every worker is gone.
pub struct CoordinatorChannels<S: State> {
    pub requests: Sender<WorkRequest<S>>,
    pub responses: Receiver<WorkResponse<S>>,
}

/// Create the shared work channel and the response channel
///
/// Every worker receives from the same request queue, so whichever worker
/// is idle picks up the next item.
pub fn create_channels<S: State>() -> (CoordinatorChannels<S>, WorkerChannels<S>) {
    let (request_tx, request_rx) = unbounded();
    let (response_tx, response_rx) = unbounded();

    (
        CoordinatorChannels {
            requests: request_tx,
            responses: response_rx,
        },
        WorkerChannels {
            requests: request_rx,
            responses: response_tx,
        },
    )
}
