//! Frontier storage: the open set plus the parent map
//!
//! A storage orders candidate items by estimated total cost (ascending),
//! then by cost so far (descending), and remembers for every state the
//! cheapest `(parent, cost)` link seen so far. The parent map is the only
//! source of truth for path reconstruction.

pub mod layered;
pub mod remote;

pub use layered::{LayeredStorage, UniqueStorage};
pub use remote::RemoteStorage;

use crate::error::Result;
use crate::search::{Cost, State};

/// A candidate waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem<S> {
    /// The state reached
    pub state: S,
    /// Cost of the path that reached it
    pub cost: Cost,
    /// `cost + heuristic(state)`, or `None` for a terminal item that must not
    /// be queued
    pub estimate: Option<Cost>,
}

impl<S> FrontierItem<S> {
    pub fn new(state: S, cost: Cost, estimate: Cost) -> Self {
        Self {
            state,
            cost,
            estimate: Some(estimate),
        }
    }

    /// An item recorded for its parent link only
    pub fn terminal(state: S, cost: Cost) -> Self {
        Self {
            state,
            cost,
            estimate: None,
        }
    }

    /// Whether this item may be queued for expansion
    pub fn is_queueable(&self) -> bool {
        self.estimate.is_some()
    }

    /// Ordering key: the estimate, or the cost for a terminal item
    pub fn priority(&self) -> Cost {
        self.estimate.unwrap_or(self.cost)
    }
}

/// The cheapest known link into a state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRecord<S> {
    /// The state value that established this link
    pub state: S,
    /// Predecessor, `None` for the initial state
    pub parent: Option<S>,
    /// Cost of the path through this link
    pub cost: Cost,
}

/// Open set plus parent map
pub trait Storage<S: State>: Send {
    /// Insert or update one item and its parent link
    fn record(&mut self, item: FrontierItem<S>, parent: Option<S>);

    /// Record many items sharing one parent
    fn record_all(&mut self, items: Vec<FrontierItem<S>>, parent: Option<S>) {
        for item in items {
            self.record(item, parent.clone());
        }
    }

    /// Remove the best item, `None` when the frontier is empty
    fn take(&mut self) -> Option<FrontierItem<S>>;

    /// Return a taken item to the open set, leaving the parent map untouched
    fn reinsert(&mut self, item: FrontierItem<S>);

    /// The recorded link into `state`
    fn parent(&self, state: &S) -> Option<ParentRecord<S>>;

    /// Items waiting in the open set
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// States with a parent record
    fn recorded(&self) -> usize;
}

/// Frontier implementation selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// Duplicates allowed in the open set
    Layered,
    /// A state with a parent record is never queued again
    #[default]
    Unique,
}

impl StorageKind {
    /// Create an empty storage of this kind
    pub fn build<S: State>(&self) -> Box<dyn Storage<S>> {
        match self {
            StorageKind::Layered => Box::new(LayeredStorage::new()),
            StorageKind::Unique => Box::new(UniqueStorage::new()),
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKind::Layered => write!(f, "layered"),
            StorageKind::Unique => write!(f, "unique"),
        }
    }
}

impl std::str::FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "layered" | "plain" | "basic" => Ok(StorageKind::Layered),
            "unique" | "dedup" | "best" => Ok(StorageKind::Unique),
            _ => Err(format!(
                "Unknown storage: '{}'. Valid options: layered, unique",
                s
            )),
        }
    }
}

/// Result of asking a frontier for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkout<S> {
    /// The best item, now checked out to the caller
    Item(FrontierItem<S>),
    /// Work exists but must wait for cheaper items still being expanded
    Deferred,
    /// Nothing to hand out
    Empty,
}

/// Fallible access to a storage that may live behind a channel
///
/// This is what the driver steps against: a local boxed storage for the
/// sequential strategy, a shared `&RemoteStorage` for the pulled one.
pub trait Frontier<S: State> {
    fn take(&mut self) -> Result<Checkout<S>>;

    /// Record the successors of the checked out `parent`
    fn record_all(&mut self, items: Vec<FrontierItem<S>>, parent: FrontierItem<S>) -> Result<()>;

    /// Give a checked out item back without expanding it
    fn reinsert(&mut self, item: FrontierItem<S>) -> Result<()>;
}

impl<S: State> Frontier<S> for Box<dyn Storage<S>> {
    fn take(&mut self) -> Result<Checkout<S>> {
        Ok(match Storage::take(self.as_mut()) {
            Some(item) => Checkout::Item(item),
            None => Checkout::Empty,
        })
    }

    fn record_all(&mut self, items: Vec<FrontierItem<S>>, parent: FrontierItem<S>) -> Result<()> {
        Storage::record_all(self.as_mut(), items, Some(parent.state));
        Ok(())
    }

    fn reinsert(&mut self, item: FrontierItem<S>) -> Result<()> {
        Storage::reinsert(self.as_mut(), item);
        Ok(())
    }
}
