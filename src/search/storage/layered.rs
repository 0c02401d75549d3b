//! Heap-ordered frontier storages
//!
//! Items are layered by estimated total cost (smallest first) and, within
//! one estimate, by cost so far (largest first) so that equally promising
//! items favour depth. Remaining ties resolve in insertion order.

use crate::search::storage::{FrontierItem, ParentRecord, Storage};
use crate::search::{Cost, State};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Heap entry with the ordering keys pulled out of the item
#[derive(Debug)]
struct Queued<S> {
    estimate: Cost,
    cost: Cost,
    sequence: u64,
    item: FrontierItem<S>,
}

impl<S> PartialEq for Queued<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S> Eq for Queued<S> {}

impl<S> PartialOrd for Queued<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Queued<S> {
    // BinaryHeap pops the greatest entry
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| self.cost.cmp(&other.cost))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Frontier that accepts duplicate states
///
/// Only the parent map is single-entry-per-state, so a state reached along
/// several paths may be expanded more than once.
#[derive(Debug)]
pub struct LayeredStorage<S> {
    open: BinaryHeap<Queued<S>>,
    parents: HashMap<S, ParentRecord<S>>,
    sequence: u64,
}

impl<S: State> LayeredStorage<S> {
    pub fn new() -> Self {
        Self {
            open: BinaryHeap::new(),
            parents: HashMap::new(),
            sequence: 0,
        }
    }

    /// Whether `state` has a parent record
    pub fn contains(&self, state: &S) -> bool {
        self.parents.contains_key(state)
    }

    /// Keep the link only if it is strictly cheaper than the recorded one
    fn add_parent(&mut self, item: &FrontierItem<S>, parent: Option<S>) -> bool {
        if let Some(existing) = self.parents.get(&item.state) {
            if item.cost >= existing.cost {
                return false;
            }
        }
        self.parents.insert(
            item.state.clone(),
            ParentRecord {
                state: item.state.clone(),
                parent,
                cost: item.cost,
            },
        );
        true
    }

    /// Whether a cheaper link to the item's state was recorded after it was queued
    fn is_stale(&self, item: &FrontierItem<S>) -> bool {
        self.parents
            .get(&item.state)
            .is_some_and(|record| record.cost < item.cost)
    }

    fn add_state(&mut self, item: FrontierItem<S>) {
        let Some(estimate) = item.estimate else {
            return;
        };
        self.sequence += 1;
        self.open.push(Queued {
            estimate,
            cost: item.cost,
            sequence: self.sequence,
            item,
        });
    }
}

impl<S: State> Default for LayeredStorage<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> Storage<S> for LayeredStorage<S> {
    fn record(&mut self, item: FrontierItem<S>, parent: Option<S>) {
        self.add_parent(&item, parent);
        self.add_state(item);
    }

    fn take(&mut self) -> Option<FrontierItem<S>> {
        self.open.pop().map(|queued| queued.item)
    }

    fn reinsert(&mut self, item: FrontierItem<S>) {
        self.add_state(item);
    }

    fn parent(&self, state: &S) -> Option<ParentRecord<S>> {
        self.parents.get(state).cloned()
    }

    fn len(&self) -> usize {
        self.open.len()
    }

    fn recorded(&self) -> usize {
        self.parents.len()
    }
}

/// Frontier that queues each state once per improvement and expands it once
///
/// A state that already has a parent record is not queued again unless the
/// new link is strictly cheaper and the state has not been taken yet. The
/// superseded entry stays in the heap and is dropped when it surfaces.
/// Taken states are closed: a later cheaper link still replaces the parent
/// record but never queues the state again.
#[derive(Debug)]
pub struct UniqueStorage<S> {
    inner: LayeredStorage<S>,
    closed: HashSet<S>,
}

impl<S: State> UniqueStorage<S> {
    pub fn new() -> Self {
        Self {
            inner: LayeredStorage::new(),
            closed: HashSet::new(),
        }
    }

    pub fn contains(&self, state: &S) -> bool {
        self.inner.contains(state)
    }

    /// Whether `state` has been handed out for expansion
    pub fn is_closed(&self, state: &S) -> bool {
        self.closed.contains(state)
    }
}

impl<S: State> Default for UniqueStorage<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> Storage<S> for UniqueStorage<S> {
    fn record(&mut self, item: FrontierItem<S>, parent: Option<S>) {
        let seen = self.inner.contains(&item.state);
        let improved = self.inner.add_parent(&item, parent);
        if !seen || (improved && !self.closed.contains(&item.state)) {
            self.inner.add_state(item);
        }
    }

    fn take(&mut self) -> Option<FrontierItem<S>> {
        while let Some(item) = self.inner.take() {
            if self.inner.is_stale(&item) || self.closed.contains(&item.state) {
                continue;
            }
            self.closed.insert(item.state.clone());
            return Some(item);
        }
        None
    }

    /// Return an unexpanded item, carrying over any cheaper link recorded
    /// while it was out
    fn reinsert(&mut self, mut item: FrontierItem<S>) {
        self.closed.remove(&item.state);
        if let Some(record) = self.inner.parents.get(&item.state) {
            if record.cost < item.cost {
                let remaining = item.estimate.map(|e| e.saturating_sub(item.cost));
                item.estimate = remaining.map(|h| record.cost.saturating_add(h));
                item.cost = record.cost;
            }
        }
        self.inner.reinsert(item);
    }

    fn parent(&self, state: &S) -> Option<ParentRecord<S>> {
        self.inner.parent(state)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn recorded(&self) -> usize {
        self.inner.recorded()
    }
}
