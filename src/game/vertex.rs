/// Column letters used by GTP vertex text. `I` is skipped per the protocol,
/// so the sequence runs `A`..`H`, `J`..`T`.
const GTP_LETTERS: &str = "ABCDEFGHJKLMNOPQRST";

/// A 0-indexed board coordinate. `(0, 0)` is the top-left corner, `x` is the
/// column and `y` is the row, matching the SGF coordinate convention used
/// throughout `sgf::GoCoord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vertex {
    pub x: usize,
    pub y: usize,
}

impl Vertex {
    pub fn new(x: usize, y: usize) -> Self {
        Vertex { x, y }
    }

    /// True iff both coordinates fall within a board of the given side.
    pub fn on_board(self, side: usize) -> bool {
        self.x < side && self.y < side
    }

    /// The in-bounds 4-neighbors of this vertex on a board of the given side.
    pub fn neighbors(self, side: usize) -> impl Iterator<Item = Vertex> {
        let Vertex { x, y } = self;
        [
            (x.checked_sub(1), Some(y)),
            (Some(x + 1), Some(y)),
            (Some(x), y.checked_sub(1)),
            (Some(x), Some(y + 1)),
        ]
        .into_iter()
        .filter_map(move |(nx, ny)| match (nx, ny) {
            (Some(nx), Some(ny)) if nx < side && ny < side => Some(Vertex::new(nx, ny)),
            _ => None,
        })
    }

    /// Formats this vertex as GTP coordinate text (e.g. `"D4"`), counting
    /// rows from `1` at the bottom of the board, the conventional GTP
    /// orientation regardless of `Board`'s own `lower_left_origin` display
    /// flag (see `DESIGN.md`).
    pub fn to_gtp(self, side: usize) -> String {
        let letter = GTP_LETTERS.as_bytes()[self.x] as char;
        let row = side - self.y;
        format!("{letter}{row}")
    }

    /// Parses GTP coordinate text such as `"D4"` or `"j10"` into a vertex on
    /// a board of the given side. Case-insensitive; rejects `I`/`i` and
    /// out-of-range rows/columns.
    pub fn from_gtp(s: &str, side: usize) -> Option<Self> {
        let mut chars = s.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let col = GTP_LETTERS.find(letter)?;
        let row: usize = chars.as_str().parse().ok()?;
        if row == 0 || row > side || col >= side {
            return None;
        }
        Some(Vertex::new(col, side - row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_has_two_neighbors() {
        let v = Vertex::new(0, 0);
        let ns: Vec<_> = v.neighbors(9).collect();
        assert_eq!(ns.len(), 2);
        assert!(ns.contains(&Vertex::new(1, 0)));
        assert!(ns.contains(&Vertex::new(0, 1)));
    }

    #[test]
    fn center_has_four_neighbors() {
        let v = Vertex::new(4, 4);
        let ns: Vec<_> = v.neighbors(9).collect();
        assert_eq!(ns.len(), 4);
    }

    #[test]
    fn on_board_respects_side() {
        assert!(Vertex::new(8, 8).on_board(9));
        assert!(!Vertex::new(9, 0).on_board(9));
    }

    #[test]
    fn gtp_text_round_trips() {
        let v = Vertex::new(3, 4);
        let text = v.to_gtp(9);
        assert_eq!(Vertex::from_gtp(&text, 9), Some(v));
    }

    #[test]
    fn gtp_skips_the_letter_i() {
        // column index 8 is the 9th column, which is "J" (I is skipped).
        assert_eq!(Vertex::new(8, 0).to_gtp(9), "J9");
        assert_eq!(Vertex::from_gtp("J9", 9), Some(Vertex::new(8, 0)));
        assert_eq!(Vertex::from_gtp("I9", 9), None);
    }

    #[test]
    fn gtp_top_left_is_a_and_max_row() {
        assert_eq!(Vertex::new(0, 0).to_gtp(9), "A9");
        assert_eq!(Vertex::new(0, 8).to_gtp(9), "A1");
    }

    #[test]
    fn gtp_is_case_insensitive_and_rejects_out_of_range() {
        assert_eq!(Vertex::from_gtp("d4", 9), Vertex::from_gtp("D4", 9));
        assert_eq!(Vertex::from_gtp("D10", 9), None);
        assert_eq!(Vertex::from_gtp("D0", 9), None);
    }
}
