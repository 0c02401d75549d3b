//! parallel_astar - pluggable best-first search with parallel strategies
//!
//! A caller supplies a state type, a goal predicate, a heuristic and an
//! expander; the engine returns the cheapest path from a start state to a
//! goal. The same problem runs unchanged on the sequential driver or on any
//! of three thread-parallel strategies, selected through `SearchConfig`.
//!
//! ```ignore
//! use parallel_astar::search::{Algorithm, Search, SearchAlgorithm, SearchConfig};
//! use parallel_astar::problems::{GridProblem, Position};
//!
//! let problem = GridProblem::new(3, 3, Position::new(2, 2));
//! let config = SearchConfig::default().with_algorithm(Algorithm::Pulled);
//! let path = Search::new(Position::new(0, 0), problem, config).solve()?;
//! ```

pub mod error;
pub mod problems;
pub mod search;
pub mod sync;

pub use error::{Result, SearchError};
pub use search::{
    Algorithm, Cost, Search, SearchAlgorithm, SearchConfig, SearchProblem, SearchStatistics,
    State, StorageKind, TransitionAStar, TransitionProblem, problem_fn, transition_fn,
};
