//! Search statistics

use crate::search::config::Algorithm;
use crate::search::storage::StorageKind;
use crate::search::Cost;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by every thread taking part in one search
#[derive(Debug, Default)]
pub struct SearchCounters {
    /// Calls to the expander
    pub expansions: AtomicU64,
    /// Items removed from the frontier
    pub items_taken: AtomicU64,
    /// Goal items reached (including ones later beaten by a cheaper goal)
    pub goals_found: AtomicU64,
}

impl SearchCounters {
    pub fn add_expansion(&self) {
        self.expansions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_taken(&self) {
        self.items_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_goal(&self) {
        self.goals_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn expansions(&self) -> u64 {
        self.expansions.load(Ordering::Relaxed)
    }

    pub fn items_taken(&self) -> u64 {
        self.items_taken.load(Ordering::Relaxed)
    }

    pub fn goals_found(&self) -> u64 {
        self.goals_found.load(Ordering::Relaxed)
    }
}

/// Statistics from a search operation
#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Strategy used for the search
    pub algorithm: Algorithm,
    /// Frontier implementation used
    pub storage: StorageKind,
    /// Worker threads used (1 for the sequential strategy)
    pub workers: usize,
    /// Total time spent searching
    pub elapsed_time: Duration,
    /// Number of states passed to the expander
    pub expansions: u64,
    /// Number of items removed from the frontier
    pub items_taken: u64,
    /// Number of goal items reached
    pub goals_found: u64,
    /// Cost of the returned path, if any
    pub solution_cost: Option<Cost>,
    /// Number of states in the returned path, if any
    pub path_length: Option<usize>,
}

impl SearchStatistics {
    pub fn new(algorithm: Algorithm, storage: StorageKind, workers: usize) -> Self {
        Self {
            algorithm,
            storage,
            workers,
            ..Default::default()
        }
    }

    /// Copy the shared counters into this snapshot
    pub fn absorb(&mut self, counters: &SearchCounters, elapsed: Duration) {
        self.expansions = counters.expansions();
        self.items_taken = counters.items_taken();
        self.goals_found = counters.goals_found();
        self.elapsed_time = elapsed;
    }

    /// Record the returned path
    pub fn record_solution(&mut self, cost: Cost, path_length: usize) {
        self.solution_cost = Some(cost);
        self.path_length = Some(path_length);
    }

    /// Get expansions per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.expansions as f64 / secs
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Algorithm: {}\n", self.algorithm));
        s.push_str(&format!("Storage: {}\n", self.storage));
        s.push_str(&format!("Workers: {}\n", self.workers));
        s.push_str(&format!("Time: {:.2?}\n", self.elapsed_time));
        s.push_str(&format!("Expansions: {}\n", self.expansions));
        s.push_str(&format!("Items taken: {}\n", self.items_taken));
        s.push_str(&format!(
            "Throughput: {:.0} expansions/sec\n",
            self.throughput()
        ));

        if self.goals_found > 1 {
            s.push_str(&format!("Goal candidates: {}\n", self.goals_found));
        }

        match (self.solution_cost, self.path_length) {
            (Some(cost), Some(len)) => {
                s.push_str(&format!("Solution cost: {}\n", cost));
                s.push_str(&format!("Path length: {} states\n", len));
            }
            _ => s.push_str("Solution: none\n"),
        }

        s
    }
}
