//! Parallel A* strategies
//!
//! Three protocols spread expansions across worker threads while reusing
//! the sequential driver's expansion logic:
//! - **Symmetric**: the coordinator takes up to one item per worker, sends
//!   the batch out and waits for every answer before the next round
//! - **Served**: the coordinator refills a worker as soon as it answers,
//!   keeping the pool saturated
//! - **Pulled**: every worker steps the driver itself against a shared
//!   storage proxy, and an idle barrier detects global exhaustion
//!
//! # Architecture
//!
//! Symmetric and Served share an expander pool (`coordinator`): one work
//! queue feeding all workers, one response queue back, and a watchdog that
//! turns a dead worker into an error instead of a hang. Pulled shares a
//! `RemoteStorage` and an `IdleBarrier`.
//!
//! All three gate expansion on the estimate: an item leaves the frontier
//! only while its estimate does not exceed the lowest one still in flight.
//! With a consistent heuristic every expanded item therefore already carries
//! its optimal cost, so the first goal reported is optimal and the strategies
//! return the same cost as the sequential driver.
//!
//! # Example
//!
//! ```ignore
//! use parallel_astar::search::{AStarCore, SearchAlgorithm, SearchConfig, ServedAStar};
//!
//! let config = SearchConfig::default().with_workers(4);
//! let mut solver = ServedAStar::new(start, AStarCore::new(problem), &config);
//! let path = solver.solve()?;
//! ```

pub mod channel;
pub mod coordinator;
pub mod pulled;
pub mod served;
pub mod symmetric;

pub use pulled::PulledAStar;
pub use served::ServedAStar;
pub use symmetric::SymmetricAStar;

use crate::error::Result;
use crate::search::SearchProblem;
use crate::search::astar::AStarCore;
use crate::search::result::SearchStatistics;
use crate::search::storage::{FrontierItem, ParentRecord};
use std::time::Instant;
use tracing::info;

/// Rebuild the path for the chosen goal and close the statistics
fn conclude<P, L>(
    core: &AStarCore<P>,
    goal: Option<FrontierItem<P::State>>,
    lookup: L,
    statistics: &mut SearchStatistics,
    start: Instant,
) -> Result<Option<Vec<P::State>>>
where
    P: SearchProblem,
    L: FnMut(&P::State) -> Result<Option<ParentRecord<P::State>>>,
{
    let path = match goal {
        Some(item) => {
            let (path, cost) = core.generate_path(&item.state, lookup)?;
            statistics.record_solution(cost, path.len());
            Some(path)
        }
        None => None,
    };

    statistics.absorb(core.counters(), start.elapsed());
    info!(
        algorithm = %statistics.algorithm,
        workers = statistics.workers,
        expansions = statistics.expansions,
        cost = ?statistics.solution_cost,
        elapsed = ?statistics.elapsed_time,
        "Parallel search finished"
    );
    Ok(path)
}
