//! Progress samples for external monitoring
//!
//! Every take from the frontier can emit a `(cost, estimate)` sample. The
//! channel is a pure side channel: samples are dropped when the receiver is
//! full or gone, and the search never blocks on it.

use crate::search::storage::FrontierItem;
use crate::search::Cost;
use crossbeam_channel::{Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// One progress sample, taken when an item leaves the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Cost so far of the taken item
    pub cost: Cost,
    /// Estimated total cost of the taken item
    pub estimate: Cost,
}

/// Sends progress samples if a reporting channel was supplied
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<Sender<Progress>>,
    disconnected: Arc<AtomicBool>,
}

impl ProgressReporter {
    pub fn new(sender: Option<Sender<Progress>>) -> Self {
        Self {
            sender,
            disconnected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether samples are being sent anywhere
    pub fn is_enabled(&self) -> bool {
        self.sender.is_some() && !self.disconnected.load(Ordering::Relaxed)
    }

    /// Emit a sample for a taken item
    pub fn report<S>(&self, item: &FrontierItem<S>) {
        let Some(ref sender) = self.sender else {
            return;
        };
        if self.disconnected.load(Ordering::Relaxed) {
            return;
        }

        let sample = Progress {
            cost: item.cost,
            estimate: item.estimate.unwrap_or(item.cost),
        };
        match sender.try_send(sample) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                if !self.disconnected.swap(true, Ordering::Relaxed) {
                    debug!("Progress receiver dropped, no further samples will be sent");
                }
            }
        }
    }
}
