//! The A* driver and the expansion logic every strategy shares

use crate::error::{Result, SearchError};
use crate::search::config::Algorithm;
use crate::search::progress::{Progress, ProgressReporter};
use crate::search::result::{SearchCounters, SearchStatistics};
use crate::search::storage::{Checkout, Frontier, FrontierItem, ParentRecord, Storage, StorageKind};
use crate::search::{Cost, SearchAlgorithm, SearchProblem};
use crossbeam_channel::Sender;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// What expanding one frontier item produced
#[derive(Debug, Clone)]
pub enum Expansion<S> {
    /// The item's state satisfies the goal; it is not expanded
    Goal(FrontierItem<S>),
    /// Successor items, promoted with cost and estimate
    Successors(Vec<FrontierItem<S>>),
}

/// Result of one driver step
#[derive(Debug, Clone)]
pub enum StepOutcome<S> {
    /// The frontier was empty
    Exhausted,
    /// The frontier held work that must wait for cheaper in-flight items
    Deferred,
    /// The item was expanded and its successors recorded
    Expanded {
        /// At least one successor was queueable
        added: bool,
    },
    /// The item reached a goal
    Goal(FrontierItem<S>),
}

/// Expansion logic, cheap to clone into worker threads
pub struct AStarCore<P: SearchProblem> {
    problem: Arc<P>,
    counters: Arc<SearchCounters>,
    reporter: ProgressReporter,
}

impl<P: SearchProblem> Clone for AStarCore<P> {
    fn clone(&self) -> Self {
        Self {
            problem: Arc::clone(&self.problem),
            counters: Arc::clone(&self.counters),
            reporter: self.reporter.clone(),
        }
    }
}

impl<P: SearchProblem> AStarCore<P> {
    pub fn new(problem: P) -> Self {
        Self::shared(Arc::new(problem))
    }

    /// Build around a problem that is already shared
    pub fn shared(problem: Arc<P>) -> Self {
        Self {
            problem,
            counters: Arc::new(SearchCounters::default()),
            reporter: ProgressReporter::default(),
        }
    }

    /// Send a progress sample on every take
    pub fn with_reporting(mut self, sender: Sender<Progress>) -> Self {
        self.reporter = ProgressReporter::new(Some(sender));
        self
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn counters(&self) -> &SearchCounters {
        &self.counters
    }

    /// The item the search starts from, at cost zero
    ///
    /// Always queued, even when the problem calls it a dead end, so an
    /// initial goal is still found.
    pub fn initial_item(&self, state: P::State) -> FrontierItem<P::State> {
        self.estimated(state, 0)
    }

    /// Attach the estimate to a state reached at `cost`
    pub fn promote(&self, state: P::State, cost: Cost) -> FrontierItem<P::State> {
        if self.problem.is_dead_end(&state) {
            return FrontierItem::terminal(state, cost);
        }
        self.estimated(state, cost)
    }

    fn estimated(&self, state: P::State, cost: Cost) -> FrontierItem<P::State> {
        let estimate = cost.saturating_add(self.problem.heuristic(&state));
        FrontierItem::new(state, cost, estimate)
    }

    /// Goal check, then expansion
    pub fn next_states(&self, item: &FrontierItem<P::State>) -> Expansion<P::State> {
        if self.problem.is_goal(&item.state) {
            self.counters.add_goal();
            debug!(cost = item.cost, state = ?item.state, "Goal reached");
            return Expansion::Goal(item.clone());
        }

        self.counters.add_expansion();
        let successors: Vec<_> = self
            .problem
            .expand(&item.state)
            .into_iter()
            .map(|(state, step)| self.promote(state, item.cost.saturating_add(step)))
            .collect();
        trace!(
            state = ?item.state,
            cost = item.cost,
            successors = successors.len(),
            "Expanded"
        );
        Expansion::Successors(successors)
    }

    /// Bookkeeping for an item leaving the frontier
    pub fn note_taken(&self, item: &FrontierItem<P::State>) {
        self.counters.add_taken();
        self.reporter.report(item);
    }

    /// Take the best item and expand it
    pub fn single_step<F>(&self, frontier: &mut F) -> Result<StepOutcome<P::State>>
    where
        F: Frontier<P::State> + ?Sized,
    {
        let item = match frontier.take()? {
            Checkout::Item(item) => item,
            Checkout::Deferred => return Ok(StepOutcome::Deferred),
            Checkout::Empty => return Ok(StepOutcome::Exhausted),
        };
        self.note_taken(&item);

        match self.next_states(&item) {
            Expansion::Goal(goal) => Ok(StepOutcome::Goal(goal)),
            Expansion::Successors(items) => {
                let added = items.iter().any(FrontierItem::is_queueable);
                frontier.record_all(items, item)?;
                Ok(StepOutcome::Expanded { added })
            }
        }
    }

    /// Walk parent links back from `goal`
    ///
    /// Returns the states from the initial state to the goal, together with
    /// the cost recorded for the goal's surviving link.
    pub fn generate_path<L>(&self, goal: &P::State, mut lookup: L) -> Result<(Vec<P::State>, Cost)>
    where
        L: FnMut(&P::State) -> Result<Option<ParentRecord<P::State>>>,
    {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut cost = None;
        let mut current = goal.clone();

        loop {
            if !seen.insert(current.clone()) {
                return Err(SearchError::ParentCycle {
                    state: format!("{:?}", current),
                });
            }
            let record = lookup(&current)?.ok_or_else(|| SearchError::MissingParent {
                state: format!("{:?}", current),
            })?;
            cost.get_or_insert(record.cost);
            path.push(record.state);
            match record.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        path.reverse();
        Ok((path, cost.unwrap_or(0)))
    }
}

/// Sequential A*
///
/// The initial state is recorded when the driver is built. `solve` runs
/// until the frontier is empty or a goal is taken; calling it again
/// continues from where the previous call stopped.
pub struct AStar<P: SearchProblem> {
    core: AStarCore<P>,
    storage: Box<dyn Storage<P::State>>,
    statistics: SearchStatistics,
}

impl<P: SearchProblem> AStar<P> {
    pub fn new(initial: P::State, core: AStarCore<P>, kind: StorageKind) -> Self {
        let mut storage = kind.build();
        storage.record(core.initial_item(initial), None);
        Self {
            core,
            storage,
            statistics: SearchStatistics::new(Algorithm::Sequential, kind, 1),
        }
    }

    pub fn single_step(&mut self) -> Result<StepOutcome<P::State>> {
        self.core.single_step(&mut self.storage)
    }

    pub fn storage(&self) -> &dyn Storage<P::State> {
        self.storage.as_ref()
    }
}

impl<P: SearchProblem> SearchAlgorithm for AStar<P> {
    type State = P::State;

    fn solve(&mut self) -> Result<Option<Vec<P::State>>> {
        let start = Instant::now();
        info!(storage = %self.statistics.storage, "Starting sequential search");

        let goal = loop {
            match self.single_step()? {
                StepOutcome::Exhausted => break None,
                StepOutcome::Goal(item) => break Some(item),
                StepOutcome::Expanded { .. } | StepOutcome::Deferred => {}
            }
        };

        let path = match goal {
            Some(item) => {
                let storage = &self.storage;
                let (path, cost) = self
                    .core
                    .generate_path(&item.state, |state| Ok(storage.parent(state)))?;
                self.statistics.record_solution(cost, path.len());
                Some(path)
            }
            None => None,
        };

        self.statistics.absorb(self.core.counters(), start.elapsed());
        info!(
            expansions = self.statistics.expansions,
            cost = ?self.statistics.solution_cost,
            elapsed = ?self.statistics.elapsed_time,
            "Sequential search finished"
        );
        Ok(path)
    }

    fn statistics(&self) -> SearchStatistics {
        self.statistics.clone()
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Sequential
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::problem_fn;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Line 0..=n, goal at n, steps of cost 1 in both directions
    fn line(n: i32) -> impl SearchProblem<State = i32> {
        problem_fn(
            move |x: &i32| *x == n,
            move |x: &i32| (n - *x).unsigned_abs() as Cost,
            move |x: &i32| {
                [*x - 1, *x + 1]
                    .into_iter()
                    .filter(|y| (0..=n).contains(y))
                    .map(|y| (y, 1))
                    .collect()
            },
        )
    }

    #[test]
    fn test_promote_adds_heuristic() {
        let core = AStarCore::new(line(5));
        let item = core.promote(2, 4);
        assert_eq!(item.cost, 4);
        assert_eq!(item.estimate, Some(7));
    }

    #[test]
    fn test_next_states_goal_is_not_expanded() {
        let core = AStarCore::new(line(3));
        match core.next_states(&FrontierItem::new(3, 3, 3)) {
            Expansion::Goal(item) => assert_eq!(item.state, 3),
            other => panic!("Expected goal, got {:?}", other),
        }
        assert_eq!(core.counters().expansions(), 0);
        assert_eq!(core.counters().goals_found(), 1);
    }

    #[test]
    fn test_next_states_promotes_successors() {
        let core = AStarCore::new(line(3));
        match core.next_states(&FrontierItem::new(1, 1, 3)) {
            Expansion::Successors(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], FrontierItem::new(0, 2, 5));
                assert_eq!(items[1], FrontierItem::new(2, 2, 3));
            }
            other => panic!("Expected successors, got {:?}", other),
        }
    }

    #[test]
    fn test_single_step_sequence() {
        let mut astar = AStar::new(0, AStarCore::new(line(1)), StorageKind::Unique);

        assert!(matches!(
            astar.single_step().unwrap(),
            StepOutcome::Expanded { added: true }
        ));
        match astar.single_step().unwrap() {
            StepOutcome::Goal(item) => assert_eq!(item.state, 1),
            other => panic!("Expected goal, got {:?}", other),
        }
        assert!(matches!(
            astar.single_step().unwrap(),
            StepOutcome::Exhausted
        ));
    }

    #[test]
    fn test_single_step_against_shared_proxy() {
        use crate::search::storage::RemoteStorage;

        let core = AStarCore::new(line(2));
        let mut storage = StorageKind::Unique.build();
        storage.record(core.initial_item(0), None);
        let remote = RemoteStorage::spawn(storage).unwrap();
        let mut frontier = &remote;

        assert!(matches!(
            core.single_step(&mut frontier).unwrap(),
            StepOutcome::Expanded { added: true }
        ));
        assert_eq!(remote.checked_out(), 0);
        assert!(matches!(
            core.single_step(&mut frontier).unwrap(),
            StepOutcome::Expanded { .. }
        ));
        assert!(matches!(
            core.single_step(&mut frontier).unwrap(),
            StepOutcome::Goal(_)
        ));
    }

    #[test]
    fn test_solve_line() {
        let mut astar = AStar::new(0, AStarCore::new(line(4)), StorageKind::Unique);
        let path = astar.solve().unwrap().unwrap();
        assert_eq!(path, vec![0, 1, 2, 3, 4]);

        let stats = astar.statistics();
        assert_eq!(stats.solution_cost, Some(4));
        assert_eq!(stats.path_length, Some(5));
        assert_eq!(stats.expansions, 4);
        assert_eq!(astar.algorithm(), Algorithm::Sequential);
    }

    #[test]
    fn test_initial_goal_yields_single_state_path() {
        let mut astar = AStar::new(2, AStarCore::new(line(2)), StorageKind::Layered);
        assert_eq!(astar.solve().unwrap(), Some(vec![2]));
        assert_eq!(astar.statistics().solution_cost, Some(0));
    }

    #[test]
    fn test_unreachable_goal_returns_none() {
        let problem = problem_fn(
            |_: &u8| false,
            |_: &u8| 0,
            |n: &u8| if *n < 5 { vec![(n + 1, 1)] } else { Vec::new() },
        );
        let mut astar = AStar::new(0u8, AStarCore::new(problem), StorageKind::Unique);
        assert_eq!(astar.solve().unwrap(), None);
        assert_eq!(astar.statistics().expansions, 6);
    }

    #[test]
    fn test_prefers_cheaper_path_over_fewer_steps() {
        // a -> d costs 10 directly, a -> b -> c -> d costs 3
        let problem = problem_fn(
            |s: &char| *s == 'd',
            |_: &char| 0,
            |s: &char| match s {
                'a' => vec![('d', 10), ('b', 1)],
                'b' => vec![('c', 1)],
                'c' => vec![('d', 1)],
                _ => Vec::new(),
            },
        );
        let problem = Arc::new(problem);
        for kind in [StorageKind::Layered, StorageKind::Unique] {
            let core = AStarCore::shared(Arc::clone(&problem));
            let mut astar = AStar::new('a', core, kind);
            assert_eq!(astar.solve().unwrap(), Some(vec!['a', 'b', 'c', 'd']), "{}", kind);
            assert_eq!(astar.statistics().solution_cost, Some(3));
        }
    }

    #[test]
    fn test_dead_ends_are_never_expanded() {
        struct Pruning;
        impl SearchProblem for Pruning {
            type State = u8;
            fn is_goal(&self, s: &u8) -> bool {
                *s == 9
            }
            fn heuristic(&self, _: &u8) -> Cost {
                0
            }
            fn expand(&self, s: &u8) -> Vec<(u8, Cost)> {
                assert_ne!(*s, 1, "dead end was expanded");
                match s {
                    0 => vec![(1, 1), (2, 5)],
                    2 => vec![(9, 1)],
                    _ => Vec::new(),
                }
            }
            fn is_dead_end(&self, s: &u8) -> bool {
                *s == 1
            }
        }

        let mut astar = AStar::new(0, AStarCore::new(Pruning), StorageKind::Unique);
        assert_eq!(astar.solve().unwrap(), Some(vec![0, 2, 9]));
        assert!(astar.storage().parent(&1).is_some());
    }

    #[test]
    fn test_initial_dead_end_goal_is_found() {
        struct Stuck;
        impl SearchProblem for Stuck {
            type State = u8;
            fn is_goal(&self, s: &u8) -> bool {
                *s == 0
            }
            fn heuristic(&self, _: &u8) -> Cost {
                0
            }
            fn expand(&self, _: &u8) -> Vec<(u8, Cost)> {
                Vec::new()
            }
            fn is_dead_end(&self, _: &u8) -> bool {
                true
            }
        }

        let core = AStarCore::new(Stuck);
        assert!(core.initial_item(0).is_queueable());
        assert!(!core.promote(0, 0).is_queueable());

        let mut astar = AStar::new(0, core, StorageKind::Unique);
        assert_eq!(astar.solve().unwrap(), Some(vec![0]));
        assert_eq!(astar.statistics().solution_cost, Some(0));
    }

    #[test]
    fn test_unique_storage_expands_each_state_once() {
        let seen = Arc::new(Mutex::new(HashMap::new()));
        let counter = Arc::clone(&seen);
        // Fully connected 6-node graph, no goal
        let problem = problem_fn(
            |_: &u8| false,
            |_: &u8| 0,
            move |s: &u8| {
                *counter.lock().unwrap().entry(*s).or_insert(0) += 1;
                (0..6u8).filter(|t| t != s).map(|t| (t, 1)).collect()
            },
        );

        let mut astar = AStar::new(0u8, AStarCore::new(problem), StorageKind::Unique);
        assert_eq!(astar.solve().unwrap(), None);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|&n| n == 1));
    }

    #[test]
    fn test_generate_path_detects_corruption() {
        let core = AStarCore::new(line(3));
        let err = core
            .generate_path(&3, |_| Ok(None))
            .unwrap_err();
        assert!(matches!(err, SearchError::MissingParent { .. }));

        let err = core
            .generate_path(&3, |s| {
                Ok(Some(ParentRecord {
                    state: *s,
                    parent: Some(if *s == 3 { 2 } else { 3 }),
                    cost: 1,
                }))
            })
            .unwrap_err();
        assert!(matches!(err, SearchError::ParentCycle { .. }));
    }

    #[test]
    fn test_progress_reported_per_take() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let core = AStarCore::new(line(2)).with_reporting(tx);
        let mut astar = AStar::new(0, core, StorageKind::Unique);
        astar.solve().unwrap();

        let samples: Vec<Progress> = rx.try_iter().collect();
        assert_eq!(samples.len() as u64, astar.statistics().items_taken);
        assert_eq!(samples.last().map(|p| p.cost), Some(2));
    }
}
