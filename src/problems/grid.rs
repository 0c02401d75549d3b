//! Shortest paths on a bounded 4-connected grid

use crate::problems::{Direction, ParseError};
use crate::search::{Cost, SearchProblem, TransitionProblem};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A grid cell, column first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Position) -> Cost {
        (self.x.abs_diff(other.x) + self.y.abs_diff(other.y)) as Cost
    }

    /// The neighbouring cell, or `None` when it would leave the positive quadrant
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Position { x, y })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Position {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidPosition(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse().map_err(|_| invalid())?;
        let y = y.trim().parse().map_err(|_| invalid())?;
        Ok(Position { x, y })
    }
}

/// Walk from cell to cell at unit cost, avoiding walls
///
/// The Manhattan heuristic is consistent on a unit-cost 4-connected grid,
/// so every strategy and storage returns a shortest path.
#[derive(Debug, Clone)]
pub struct GridProblem {
    width: usize,
    height: usize,
    walls: HashSet<Position>,
    goal: Position,
}

impl GridProblem {
    pub fn new(width: usize, height: usize, goal: Position) -> Self {
        Self {
            width,
            height,
            walls: HashSet::new(),
            goal,
        }
    }

    pub fn with_walls(mut self, walls: impl IntoIterator<Item = Position>) -> Self {
        self.walls.extend(walls);
        self
    }

    /// Parse a text map and return the problem with its start cell
    ///
    /// `#` is a wall, `.` or a space is open, `S` marks the start and `G`
    /// the goal. Blank lines are ignored.
    pub fn parse(map: &str) -> Result<(Self, Position), ParseError> {
        let rows: Vec<&str> = map
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let width = rows.first().map(|row| row.chars().count()).ok_or(ParseError::EmptyMap)?;

        let mut walls = HashSet::new();
        let mut starts = Vec::new();
        let mut goals = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(ParseError::RaggedMap {
                    row: y,
                    found,
                    expected: width,
                });
            }
            for (x, cell) in row.chars().enumerate() {
                let here = Position::new(x, y);
                match cell {
                    '#' => {
                        walls.insert(here);
                    }
                    '.' | ' ' => {}
                    'S' => starts.push(here),
                    'G' => goals.push(here),
                    _ => {
                        return Err(ParseError::InvalidCell {
                            cell,
                            row: y,
                            column: x,
                        });
                    }
                }
            }
        }

        let start = single(starts, 'S')?;
        let goal = single(goals, 'G')?;
        let problem = GridProblem::new(width, rows.len(), goal).with_walls(walls);
        Ok((problem, start))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    pub fn is_open(&self, position: Position) -> bool {
        self.contains(position) && !self.walls.contains(&position)
    }

    fn neighbours(&self, from: Position) -> impl Iterator<Item = (Position, Direction)> + '_ {
        Direction::ALL.into_iter().filter_map(move |direction| {
            from.step(direction)
                .filter(|next| self.is_open(*next))
                .map(|next| (next, direction))
        })
    }

    /// Render the map with `path` drawn as `*`
    pub fn render(&self, start: Position, path: &[Position]) -> String {
        let on_path: HashSet<&Position> = path.iter().collect();
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let here = Position::new(x, y);
                let cell = if here == start {
                    'S'
                } else if here == self.goal {
                    'G'
                } else if self.walls.contains(&here) {
                    '#'
                } else if on_path.contains(&here) {
                    '*'
                } else {
                    '.'
                };
                out.push(cell);
            }
            out.push('\n');
        }
        out
    }
}

fn single(mut found: Vec<Position>, marker: char) -> Result<Position, ParseError> {
    match found.len() {
        1 => found.pop().ok_or(ParseError::MarkerCount(marker)),
        _ => Err(ParseError::MarkerCount(marker)),
    }
}

impl SearchProblem for GridProblem {
    type State = Position;

    fn is_goal(&self, state: &Position) -> bool {
        *state == self.goal
    }

    fn heuristic(&self, state: &Position) -> Cost {
        state.manhattan(self.goal)
    }

    fn expand(&self, state: &Position) -> Vec<(Position, Cost)> {
        self.neighbours(*state).map(|(next, _)| (next, 1)).collect()
    }
}

impl TransitionProblem for GridProblem {
    type State = Position;
    type Action = Direction;

    fn is_goal(&self, state: &Position) -> bool {
        *state == self.goal
    }

    fn heuristic(&self, state: &Position) -> Cost {
        state.manhattan(self.goal)
    }

    fn transitions(&self, state: &Position) -> Vec<(Position, Direction, Cost)> {
        self.neighbours(*state)
            .map(|(next, direction)| (next, direction, 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = "\
S..#....
.#.#.##.
.#...#..
.####.#.
......#G
";

    #[test]
    fn test_position_parse_and_display() {
        let position: Position = " 3, 4".parse().unwrap();
        assert_eq!(position, Position::new(3, 4));
        assert_eq!(position.to_string(), "3,4");
        assert!("3;4".parse::<Position>().is_err());
        assert!("-1,2".parse::<Position>().is_err());
    }

    #[test]
    fn test_step_stays_in_quadrant() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.step(Direction::Up), None);
        assert_eq!(origin.step(Direction::Left), None);
        assert_eq!(origin.step(Direction::Right), Some(Position::new(1, 0)));
        assert_eq!(origin.step(Direction::Down), Some(Position::new(0, 1)));
    }

    #[test]
    fn test_expand_respects_bounds_and_walls() {
        let problem = GridProblem::new(3, 3, Position::new(2, 2))
            .with_walls([Position::new(1, 0)]);
        let mut next: Vec<Position> = SearchProblem::expand(&problem, &Position::new(0, 0))
            .into_iter()
            .map(|(position, cost)| {
                assert_eq!(cost, 1);
                position
            })
            .collect();
        next.sort();
        assert_eq!(next, vec![Position::new(0, 1)]);
    }

    #[test]
    fn test_transitions_carry_direction() {
        let problem = GridProblem::new(3, 3, Position::new(2, 2));
        let moves = problem.transitions(&Position::new(1, 1));
        assert_eq!(moves.len(), 4);
        for (next, direction, _) in moves {
            assert_eq!(Position::new(1, 1).step(direction), Some(next));
        }
    }

    #[test]
    fn test_heuristic_is_manhattan() {
        let problem = GridProblem::new(5, 5, Position::new(4, 1));
        assert_eq!(SearchProblem::heuristic(&problem, &Position::new(0, 3)), 6);
        assert!(SearchProblem::is_goal(&problem, &Position::new(4, 1)));
    }

    #[test]
    fn test_parse_map() {
        let (problem, start) = GridProblem::parse(MAP).unwrap();
        assert_eq!(start, Position::new(0, 0));
        assert_eq!(problem.goal(), Position::new(7, 4));
        assert_eq!((problem.width(), problem.height()), (8, 5));
        assert!(!problem.is_open(Position::new(3, 0)));
        assert!(problem.is_open(Position::new(2, 2)));
        assert!(!problem.is_open(Position::new(8, 0)));
    }

    #[test]
    fn test_parse_rejects_bad_maps() {
        assert_eq!(GridProblem::parse("\n\n").unwrap_err(), ParseError::EmptyMap);
        assert_eq!(
            GridProblem::parse("S..\n..\n..G").unwrap_err(),
            ParseError::RaggedMap {
                row: 1,
                found: 2,
                expected: 3
            }
        );
        assert_eq!(
            GridProblem::parse("S.x\n..G").unwrap_err(),
            ParseError::InvalidCell {
                cell: 'x',
                row: 0,
                column: 2
            }
        );
        assert_eq!(
            GridProblem::parse("S.S\n..G").unwrap_err(),
            ParseError::MarkerCount('S')
        );
        assert_eq!(
            GridProblem::parse("S..\n...").unwrap_err(),
            ParseError::MarkerCount('G')
        );
    }

    #[test]
    fn test_render_marks_path() {
        let problem = GridProblem::new(3, 2, Position::new(2, 1)).with_walls([Position::new(1, 1)]);
        let path = [
            Position::new(0, 0),
            Position::new(1, 0),
            Position::new(2, 0),
            Position::new(2, 1),
        ];
        assert_eq!(problem.render(Position::new(0, 0), &path), "S**\n.#G\n");
    }
}
