//! Error types for parallel_astar
//!
//! "Frontier empty" is not an error: it is how every strategy learns that no
//! solution is reachable, and it surfaces as `Ok(None)` from `solve()`.
//! The variants here cover the plumbing that can actually break: worker
//! threads, the channels between them, and a corrupt parent map.

use thiserror::Error;

/// Errors raised by the search engine
#[derive(Error, Debug)]
pub enum SearchError {
    /// A worker thread panicked (usually inside the expander or heuristic)
    #[error("Worker {worker_id} panicked")]
    WorkerPanicked { worker_id: usize },

    /// A worker thread exited before it was sent a stop sentinel
    #[error("Worker {worker_id} exited while work was outstanding")]
    WorkerLost { worker_id: usize },

    /// Every worker dropped its end of a channel
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    /// The storage server thread is gone or answered out of protocol
    #[error("Storage server closed unexpectedly")]
    StorageClosed,

    /// Path reconstruction reached a state with no parent record
    #[error("No parent record for state {state}")]
    MissingParent { state: String },

    /// Path reconstruction visited the same state twice
    #[error("Parent links form a cycle at state {state}")]
    ParentCycle { state: String },

    /// Failed to spawn a worker or storage thread
    #[error("Failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type alias using SearchError
pub type Result<T> = std::result::Result<T, SearchError>;
