use parallel_astar::problems::{Direction, GridProblem, Position, SlidingPuzzle};
use parallel_astar::search::progress::Progress;
use parallel_astar::{
    Algorithm, Cost, Search, SearchAlgorithm, SearchConfig, SearchError, SearchProblem,
    StorageKind, TransitionAStar, problem_fn,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const ALGORITHMS: [Algorithm; 4] = [
    Algorithm::Sequential,
    Algorithm::Symmetric,
    Algorithm::Served,
    Algorithm::Pulled,
];

fn config(algorithm: Algorithm, storage: StorageKind, workers: usize) -> SearchConfig {
    SearchConfig::default()
        .with_algorithm(algorithm)
        .with_storage(storage)
        .with_workers(workers)
}

fn path_cost(problem: &impl SearchProblem<State = Position>, path: &[Position]) -> Cost {
    path.windows(2)
        .map(|pair| {
            problem
                .expand(&pair[0])
                .into_iter()
                .find(|(next, _)| *next == pair[1])
                .map(|(_, cost)| cost)
                .expect("consecutive path states must be linked")
        })
        .sum()
}

#[test]
fn test_open_grid_every_strategy() {
    for algorithm in ALGORITHMS {
        for storage in [StorageKind::Layered, StorageKind::Unique] {
            let problem = GridProblem::new(3, 3, Position::new(2, 2));
            let mut search = Search::new(
                Position::new(0, 0),
                problem.clone(),
                config(algorithm, storage, 4),
            );
            let path = search.solve().unwrap().expect("grid is connected");

            assert_eq!(path.len(), 5, "{} / {}", algorithm, storage);
            assert_eq!(path.first(), Some(&Position::new(0, 0)));
            assert_eq!(path.last(), Some(&Position::new(2, 2)));
            assert_eq!(path_cost(&problem, &path), 4);
            assert_eq!(search.statistics().solution_cost, Some(4));
        }
    }
}

#[test]
fn test_walled_grid_costs_match_sequential() {
    let map = "\
S....#....
.###.#.##.
...#...#..
##.#####.#
...#.....G
.#...###..
";
    let (problem, start) = GridProblem::parse(map).unwrap();

    let mut sequential = Search::new(
        start,
        problem.clone(),
        config(Algorithm::Sequential, StorageKind::Unique, 1),
    );
    let expected = sequential.solve().unwrap().expect("goal is reachable");
    let expected_cost = path_cost(&problem, &expected);

    for algorithm in ALGORITHMS {
        for workers in [1, 3, 8] {
            let mut search = Search::new(
                start,
                problem.clone(),
                config(algorithm, StorageKind::Unique, workers),
            );
            let path = search.solve().unwrap().expect("goal is reachable");
            assert_eq!(
                path_cost(&problem, &path),
                expected_cost,
                "{} with {} workers",
                algorithm,
                workers
            );
        }
    }
}

#[test]
fn test_no_solution_every_strategy() {
    for algorithm in ALGORITHMS {
        // Finite chain with no goal on it
        let problem = problem_fn(
            |_: &u32| false,
            |_: &u32| 0,
            |n: &u32| if *n < 40 { vec![(n + 1, 1), (n + 2, 2)] } else { Vec::new() },
        );
        let mut search = Search::new(0, problem, config(algorithm, StorageKind::Unique, 3));
        assert_eq!(search.solve().unwrap(), None, "{}", algorithm);
        assert_eq!(search.statistics().solution_cost, None);
    }
}

#[test]
fn test_walled_off_goal_has_no_path() {
    let problem = GridProblem::new(4, 4, Position::new(3, 3)).with_walls([
        Position::new(2, 3),
        Position::new(3, 2),
    ]);
    for algorithm in ALGORITHMS {
        let mut search = Search::new(
            Position::new(0, 0),
            problem.clone(),
            config(algorithm, StorageKind::Unique, 2),
        );
        assert_eq!(search.solve().unwrap(), None, "{}", algorithm);
        // Every reachable cell was expanded exactly once
        assert_eq!(search.statistics().expansions, 13);
    }
}

#[test]
fn test_unique_storage_expands_each_state_once() {
    for algorithm in ALGORITHMS {
        let expansions: Arc<Mutex<HashMap<Position, usize>>> = Arc::default();
        let counter = Arc::clone(&expansions);
        let grid = GridProblem::new(7, 7, Position::new(6, 6))
            .with_walls([Position::new(3, 2), Position::new(3, 3), Position::new(3, 4)]);
        let problem = problem_fn(
            |_: &Position| false,
            |_: &Position| 0,
            move |p: &Position| {
                *counter.lock().entry(*p).or_insert(0) += 1;
                grid.expand(p)
            },
        );

        let mut search = Search::new(
            Position::new(0, 0),
            problem,
            config(algorithm, StorageKind::Unique, 4),
        );
        assert_eq!(search.solve().unwrap(), None);

        let expansions = expansions.lock();
        assert_eq!(expansions.len(), 46, "{}", algorithm);
        assert!(
            expansions.values().all(|&n| n == 1),
            "{} expanded a state twice",
            algorithm
        );
    }
}

#[test]
fn test_unique_storage_finds_cheaper_late_link() {
    // 'a' is discovered first through the expensive edge from 's'
    let problem = problem_fn(
        |s: &char| *s == 'g',
        |_: &char| 0,
        |s: &char| match s {
            's' => vec![('a', 5), ('b', 1)],
            'b' => vec![('a', 1)],
            'a' => vec![('g', 1)],
            _ => Vec::new(),
        },
    );
    let problem = Arc::new(problem);
    for algorithm in ALGORITHMS {
        let mut search = Search::shared('s', Arc::clone(&problem), config(algorithm, StorageKind::Unique, 2));
        assert_eq!(search.solve().unwrap(), Some(vec!['s', 'b', 'a', 'g']));
        assert_eq!(search.statistics().solution_cost, Some(3), "{}", algorithm);
    }
}

#[test]
fn test_pulled_single_worker_matches_sequential() {
    let board = "4 1 3 7 2 6 0 5 8".parse().unwrap();
    let puzzle = Arc::new(SlidingPuzzle::new(3).unwrap());

    let mut sequential = Search::shared(
        board,
        Arc::clone(&puzzle),
        config(Algorithm::Sequential, StorageKind::Unique, 1),
    );
    let expected = sequential.solve().unwrap().unwrap();

    for prepared in [true, false] {
        let mut pulled = Search::shared(
            "4 1 3 7 2 6 0 5 8".parse().unwrap(),
            Arc::clone(&puzzle),
            config(Algorithm::Pulled, StorageKind::Unique, 1).with_prepared(prepared),
        );
        let path = pulled.solve().unwrap().unwrap();
        assert_eq!(path.len(), expected.len());
        assert_eq!(pulled.statistics().workers, 1);
    }
}

#[test]
fn test_sliding_puzzle_every_strategy() {
    let puzzle = Arc::new(SlidingPuzzle::new(3).unwrap());
    let mut lengths = Vec::new();
    for algorithm in ALGORITHMS {
        let mut search = Search::shared(
            "8 6 7 2 5 4 3 0 1".parse().unwrap(),
            Arc::clone(&puzzle),
            config(algorithm, StorageKind::Unique, 4),
        );
        let path = search.solve().unwrap().expect("board is solvable");
        lengths.push(path.len());
    }
    // One of the hardest 8-puzzle positions: 31 moves
    assert!(lengths.iter().all(|&n| n == 32), "{:?}", lengths);
}

#[test]
fn test_transition_adapter_on_grid() {
    for algorithm in ALGORITHMS {
        let problem = GridProblem::new(3, 3, Position::new(2, 2));
        let mut solver =
            TransitionAStar::new(Position::new(0, 0), problem, config(algorithm, StorageKind::Unique, 2));
        let actions = solver.solve().unwrap().expect("grid is connected");

        assert_eq!(actions.len(), 4, "{}", algorithm);
        let end = actions.iter().try_fold(Position::new(0, 0), |at, &direction: &Direction| {
            at.step(direction)
        });
        assert_eq!(end, Some(Position::new(2, 2)));
    }
}

#[test]
fn test_progress_estimates_never_decrease_sequentially() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut search = Search::new(
        Position::new(0, 0),
        GridProblem::new(6, 6, Position::new(5, 5)).with_walls([Position::new(1, 1), Position::new(2, 2)]),
        config(Algorithm::Sequential, StorageKind::Unique, 1),
    )
    .with_reporting(tx);
    search.solve().unwrap();
    drop(search);

    let samples: Vec<Progress> = rx.iter().collect();
    assert!(!samples.is_empty());
    assert!(samples.windows(2).all(|w| w[0].estimate <= w[1].estimate));
    assert_eq!(samples.first().map(|p| p.cost), Some(0));
}

#[test]
fn test_dropped_progress_receiver_is_harmless() {
    let (tx, rx) = crossbeam_channel::bounded(1);
    drop(rx);
    for algorithm in ALGORITHMS {
        let mut search = Search::new(
            Position::new(0, 0),
            GridProblem::new(4, 4, Position::new(3, 3)),
            config(algorithm, StorageKind::Unique, 2),
        )
        .with_reporting(tx.clone());
        assert!(search.solve().unwrap().is_some());
    }
}

#[test]
fn test_single_worker_panic_is_reported() {
    for algorithm in [Algorithm::Symmetric, Algorithm::Served, Algorithm::Pulled] {
        let problem = problem_fn(
            |n: &u32| *n == 10,
            |_: &u32| 0,
            |n: &u32| {
                if *n == 3 {
                    panic!("cannot expand 3");
                }
                vec![(n + 1, 1)]
            },
        );
        let mut search = Search::new(0u32, problem, config(algorithm, StorageKind::Unique, 1));
        let err = search.solve().unwrap_err();
        assert!(
            matches!(err, SearchError::WorkerPanicked { worker_id: 0 }),
            "{}: {:?}",
            algorithm,
            err
        );
    }
}
