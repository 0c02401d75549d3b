//! The n×n sliding tile puzzle (8-puzzle, 15-puzzle, ...)

use crate::problems::{Direction, ParseError};
use crate::search::{Cost, SearchProblem, TransitionProblem};
use std::fmt;
use std::str::FromStr;

/// Largest side whose tiles all fit in a `u8`
pub const MAX_SIDE: usize = 16;

/// Tiles in row-major order, `0` for the blank
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    side: usize,
    tiles: Vec<u8>,
}

impl Board {
    /// The solved board: tiles in order with the blank last
    pub fn solved(side: usize) -> Result<Self, ParseError> {
        if !(2..=MAX_SIDE).contains(&side) {
            return Err(ParseError::UnsupportedSide(side));
        }
        Ok(Self::ordered(side))
    }

    /// `side` must be at most `MAX_SIDE`
    fn ordered(side: usize) -> Self {
        let cells = side * side;
        let tiles = (1..cells).chain(std::iter::once(0)).map(|t| t as u8).collect();
        Self { side, tiles }
    }

    pub fn from_tiles(tiles: Vec<u8>) -> Result<Self, ParseError> {
        let cells = tiles.len();
        let side = (1..=cells).find(|s| s * s >= cells).unwrap_or(0);
        if side < 2 || side * side != cells {
            return Err(ParseError::NotSquare(cells));
        }
        let mut seen = vec![false; cells];
        for &tile in &tiles {
            let tile = tile as usize;
            if tile >= cells || seen[tile] {
                return Err(ParseError::NotPermutation(cells));
            }
            seen[tile] = true;
        }
        Ok(Self { side, tiles })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }

    fn blank(&self) -> usize {
        self.tiles.iter().position(|&t| t == 0).unwrap_or(0)
    }

    /// Slide the blank one cell in `direction`
    pub fn slide(&self, direction: Direction) -> Option<Board> {
        let blank = self.blank();
        let (col, row) = (blank % self.side, blank / self.side);
        let (dx, dy) = direction.delta();
        let col = col.checked_add_signed(dx).filter(|c| *c < self.side)?;
        let row = row.checked_add_signed(dy).filter(|r| *r < self.side)?;

        let mut tiles = self.tiles.clone();
        tiles.swap(blank, row * self.side + col);
        Some(Board {
            side: self.side,
            tiles,
        })
    }

    /// Sum over tiles of the distance to their solved cell
    pub fn manhattan(&self) -> Cost {
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(_, &tile)| tile != 0)
            .map(|(index, &tile)| {
                let home = tile as usize - 1;
                let dx = (index % self.side).abs_diff(home % self.side);
                let dy = (index / self.side).abs_diff(home / self.side);
                (dx + dy) as Cost
            })
            .sum()
    }

    /// Whether the solved board is reachable
    ///
    /// Odd sides need an even inversion count. Even sides need the
    /// inversion count plus the blank's row (from the top) to be odd.
    pub fn is_solvable(&self) -> bool {
        let numbered: Vec<u8> = self.tiles.iter().copied().filter(|&t| t != 0).collect();
        let inversions = numbered
            .iter()
            .enumerate()
            .map(|(i, a)| numbered[i + 1..].iter().filter(|&&b| *a > b).count())
            .sum::<usize>();

        if self.side % 2 == 1 {
            inversions % 2 == 0
        } else {
            (inversions + self.blank() / self.side) % 2 == 1
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = (self.tiles.len() - 1).to_string().len();
        for row in self.tiles.chunks(self.side) {
            let cells: Vec<String> = row
                .iter()
                .map(|&t| match t {
                    0 => format!("{:>width$}", "_"),
                    t => format!("{:>width$}", t),
                })
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = ParseError;

    /// Tiles separated by whitespace or commas; `0`, `_` or `.` is the blank
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tiles = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| match token {
                "_" | "." => Ok(0),
                _ => token
                    .parse::<u8>()
                    .map_err(|_| ParseError::InvalidTile(token.to_string())),
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Board::from_tiles(tiles)
    }
}

/// Reach the solved board with unit-cost slides of the blank
#[derive(Debug, Clone)]
pub struct SlidingPuzzle {
    goal: Board,
}

impl SlidingPuzzle {
    pub fn new(side: usize) -> Result<Self, ParseError> {
        Ok(Self {
            goal: Board::solved(side)?,
        })
    }

    /// The puzzle of solving `board`, whose side is always supported
    pub fn for_board(board: &Board) -> Self {
        Self {
            goal: Board::ordered(board.side()),
        }
    }

    fn moves(board: &Board) -> impl Iterator<Item = (Board, Direction)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| board.slide(direction).map(|next| (next, direction)))
    }
}

impl SearchProblem for SlidingPuzzle {
    type State = Board;

    fn is_goal(&self, board: &Board) -> bool {
        *board == self.goal
    }

    fn heuristic(&self, board: &Board) -> Cost {
        board.manhattan()
    }

    fn expand(&self, board: &Board) -> Vec<(Board, Cost)> {
        Self::moves(board).map(|(next, _)| (next, 1)).collect()
    }
}

impl TransitionProblem for SlidingPuzzle {
    type State = Board;
    /// The direction the blank moves
    type Action = Direction;

    fn is_goal(&self, board: &Board) -> bool {
        *board == self.goal
    }

    fn heuristic(&self, board: &Board) -> Cost {
        board.manhattan()
    }

    fn transitions(&self, board: &Board) -> Vec<(Board, Direction, Cost)> {
        Self::moves(board)
            .map(|(next, direction)| (next, direction, 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_solved_board() {
        let solved = Board::solved(3).unwrap();
        assert_eq!(solved.tiles(), &[1, 2, 3, 4, 5, 6, 7, 8, 0]);
        assert_eq!(solved.manhattan(), 0);
        assert!(solved.is_solvable());
        assert!(SearchProblem::is_goal(&SlidingPuzzle::new(3).unwrap(), &solved));
    }

    #[test]
    fn test_parse_accepts_blank_markers() {
        assert_eq!(board("1 2 3\n4 5 6\n7 8 _"), Board::solved(3).unwrap());
        assert_eq!(board("1,2,3,4,5,6,7,8,."), Board::solved(3).unwrap());
        assert_eq!(board("1 2 3 0").side(), 2);
    }

    #[test]
    fn test_parse_rejects_invalid_boards() {
        assert_eq!("1 2 3 4 5".parse::<Board>(), Err(ParseError::NotSquare(5)));
        assert_eq!("1".parse::<Board>(), Err(ParseError::NotSquare(1)));
        assert_eq!("1 1 2 0".parse::<Board>(), Err(ParseError::NotPermutation(4)));
        assert_eq!("1 2 3 9".parse::<Board>(), Err(ParseError::NotPermutation(4)));
        assert_eq!(
            "1 2 x 0".parse::<Board>(),
            Err(ParseError::InvalidTile("x".to_string()))
        );
    }

    #[test]
    fn test_solved_rejects_unsupported_sides() {
        assert_eq!(Board::solved(1), Err(ParseError::UnsupportedSide(1)));
        assert_eq!(Board::solved(17), Err(ParseError::UnsupportedSide(17)));
        assert!(SlidingPuzzle::new(17).is_err());

        let largest = Board::solved(MAX_SIDE).unwrap();
        assert_eq!(largest.tiles().iter().copied().max(), Some(255));
        assert_eq!(largest.manhattan(), 0);
    }

    #[test]
    fn test_slide_moves_blank() {
        let solved = Board::solved(3).unwrap();
        assert_eq!(solved.slide(Direction::Down), None);
        assert_eq!(solved.slide(Direction::Right), None);
        assert_eq!(solved.slide(Direction::Left), Some(board("1 2 3 4 5 6 7 0 8")));
        assert_eq!(solved.slide(Direction::Up), Some(board("1 2 3 4 5 0 7 8 6")));
    }

    #[test]
    fn test_manhattan_counts_every_tile() {
        // 8 and 6 each one away from home
        assert_eq!(board("1 2 3 4 5 0 7 8 6").manhattan(), 1);
        assert_eq!(board("8 2 3 4 5 6 7 1 0").manhattan(), 6);
    }

    #[test]
    fn test_solvability_parity() {
        // Swapping two tiles flips parity
        assert!(!board("2 1 3 4 5 6 7 8 0").is_solvable());
        assert!(board("1 2 3 4 5 6 0 7 8").is_solvable());
        assert!(Board::solved(4).unwrap().is_solvable());
        assert!(!board("1 2 3 4 5 6 7 8 9 10 11 12 13 15 14 0").is_solvable());
        assert!(board("1 2 3 4 5 6 7 8 9 10 11 0 13 14 15 12").is_solvable());
    }

    #[test]
    fn test_transitions_report_blank_direction() {
        let puzzle = SlidingPuzzle::new(3).unwrap();
        let start = board("1 2 3 4 0 5 7 8 6");
        let moves = puzzle.transitions(&start);
        assert_eq!(moves.len(), 4);
        for (next, direction, cost) in moves {
            assert_eq!(cost, 1);
            assert_eq!(start.slide(direction), Some(next));
        }
    }

    #[test]
    fn test_display_aligns_tiles() {
        let rendered = Board::solved(2).unwrap().to_string();
        assert_eq!(rendered, "1 2\n3 _\n");
    }
}
