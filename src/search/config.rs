//! Configuration types for the search strategies

use crate::search::storage::StorageKind;

/// Search strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Single-threaded A* loop
    #[default]
    Sequential,
    /// Worker pool expanding one batch at a time, waiting for the whole batch
    Symmetric,
    /// Worker pool refilled as soon as any worker answers
    Served,
    /// Workers pulling from a shared storage proxy, idle barrier termination
    Pulled,
}

impl Algorithm {
    /// Whether this strategy spawns worker threads
    pub fn is_parallel(&self) -> bool {
        !matches!(self, Algorithm::Sequential)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Sequential => write!(f, "sequential"),
            Algorithm::Symmetric => write!(f, "symmetric"),
            Algorithm::Served => write!(f, "served"),
            Algorithm::Pulled => write!(f, "pulled"),
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "astar" | "basic" => Ok(Algorithm::Sequential),
            "symmetric" | "batch" | "sync" => Ok(Algorithm::Symmetric),
            "served" | "push" => Ok(Algorithm::Served),
            "pulled" | "pull" => Ok(Algorithm::Pulled),
            _ => Err(format!(
                "Unknown algorithm: '{}'. Valid options: sequential, symmetric, served, pulled",
                s
            )),
        }
    }
}

/// Main search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Strategy to run
    pub algorithm: Algorithm,
    /// Frontier implementation
    pub storage: StorageKind,
    /// Number of worker threads (ignored by the sequential strategy)
    pub group_size: usize,
    /// Use the prefetching storage proxy for the pulled strategy
    pub prepared: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            storage: StorageKind::default(),
            group_size: num_cpus::get().max(1),
            prepared: true,
        }
    }
}

impl SearchConfig {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    /// Set the worker count, clamped to at least one
    pub fn with_workers(mut self, group_size: usize) -> Self {
        self.group_size = group_size.max(1);
        self
    }

    /// Set the worker count from an Option, keeping the default on None
    pub fn with_workers_option(self, group_size: Option<usize>) -> Self {
        match group_size {
            Some(n) => self.with_workers(n),
            None => self,
        }
    }

    pub fn with_prepared(mut self, prepared: bool) -> Self {
        self.prepared = prepared;
        self
    }

    /// Worker threads the configured strategy actually uses
    pub fn effective_workers(&self) -> usize {
        if self.algorithm.is_parallel() {
            self.group_size
        } else {
            1
        }
    }
}
