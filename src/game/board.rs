use std::fmt;

use crate::game::{Stone, Vertex};

/// Letters used for GTP/ASCII column labels. `I` is skipped to avoid
/// confusion with `1`, the traditional Go notation convention.
const GOBAN_LETTERS: &str = "ABCDEFGHJKLMNOPQRST";

/// Returns the star points (hoshi) traditionally marked on a board of the
/// given side, used only for cosmetic `Display` rendering.
fn star_points(side: usize) -> Vec<Vertex> {
    if side < 7 {
        return Vec::new();
    }
    let min_line = if side > 12 { 3 } else { 2 };
    let max_line = side - min_line - 1;
    let mut points = vec![
        Vertex::new(min_line, min_line),
        Vertex::new(max_line, max_line),
        Vertex::new(min_line, max_line),
        Vertex::new(max_line, min_line),
    ];
    if side % 2 == 1 {
        let center = side / 2;
        points.extend([
            Vertex::new(min_line, center),
            Vertex::new(max_line, center),
            Vertex::new(center, min_line),
            Vertex::new(center, max_line),
        ]);
    }
    points
}

/// A dense `side x side` grid of [`Stone`]. Rendering flags
/// (`ascii_mode`, `lower_left_origin`) affect only `Display`, never the
/// semantics of any rules operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    side: usize,
    cells: Vec<Stone>,
    pub ascii_mode: bool,
    pub lower_left_origin: bool,
}

impl Board {
    /// Board sizes accepted anywhere in this crate.
    pub const VALID_SIDES: [usize; 3] = [9, 13, 19];

    pub fn new(side: usize) -> Self {
        Board {
            side,
            cells: vec![Stone::Empty; side * side],
            ascii_mode: false,
            lower_left_origin: false,
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    fn index(&self, v: Vertex) -> usize {
        v.y * self.side + v.x
    }

    pub fn is_on_board(&self, v: Vertex) -> bool {
        v.on_board(self.side)
    }

    pub fn get(&self, v: Vertex) -> Stone {
        self.cells[self.index(v)]
    }

    pub fn set(&mut self, v: Vertex, stone: Stone) {
        let idx = self.index(v);
        self.cells[idx] = stone;
    }

    pub fn is_empty_at(&self, v: Vertex) -> bool {
        self.get(v) == Stone::Empty
    }

    /// Every vertex currently holding a stone.
    pub fn stones(&self) -> impl Iterator<Item = (Vertex, Stone)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, &stone)| {
            if stone == Stone::Empty {
                None
            } else {
                Some((Vertex::new(i % self.side, i / self.side), stone))
            }
        })
    }

    /// Every empty vertex.
    pub fn empty_vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, &stone)| {
            if stone == Stone::Empty {
                Some(Vertex::new(i % self.side, i / self.side))
            } else {
                None
            }
        })
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = Stone::Empty);
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stars = star_points(self.side);
        let letters: Vec<char> = GOBAN_LETTERS.chars().take(self.side).collect();

        let write_letters = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            write!(f, "   ")?;
            for c in &letters {
                write!(f, " {c}")?;
            }
            writeln!(f)
        };

        write_letters(f)?;

        let rows: Vec<usize> = if self.lower_left_origin {
            (0..self.side).rev().collect()
        } else {
            (0..self.side).collect()
        };

        for y in rows {
            let label = self.side - y;
            write!(f, "{label:2} ")?;
            for x in 0..self.side {
                let v = Vertex::new(x, y);
                let c = match self.get(v) {
                    Stone::Empty if stars.contains(&v) => '+',
                    Stone::Empty => '.',
                    Stone::Black if self.ascii_mode => 'X',
                    Stone::Black => '#',
                    Stone::White => 'O',
                };
                write!(f, " {c}")?;
            }
            writeln!(f, " {label:2}")?;
        }

        write_letters(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_board_is_all_empty() {
        let board = Board::new(9);
        assert!(board.stones().next().is_none());
        assert_eq!(board.empty_vertices().count(), 81);
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut board = Board::new(9);
        let v = Vertex::new(3, 4);
        board.set(v, Stone::Black);
        assert_eq!(board.get(v), Stone::Black);
        assert!(!board.is_empty_at(v));
    }

    #[test]
    fn clear_empties_every_point() {
        let mut board = Board::new(9);
        board.set(Vertex::new(0, 0), Stone::White);
        board.clear();
        assert!(board.stones().next().is_none());
    }

    #[test]
    fn display_does_not_panic() {
        let mut board = Board::new(9);
        board.set(Vertex::new(4, 4), Stone::Black);
        let text = board.to_string();
        assert!(text.contains('#'));
    }
}
