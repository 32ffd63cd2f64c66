//! `GoGame`: composes the rules engine with the SGF game tree, keeping the
//! two in lockstep so the board always reflects the tree's root-to-cursor
//! path (data model invariant 7).

use log::debug;

use crate::error::{RulesError, SgfError, TreeError};
use crate::game::{Board, Move, Results, Rules, RulesEngine, Stone, Vertex};
use crate::sgf::{GameTree, GoCoord, NodeId, PropertyTag, RESIGN_SENTINEL, SGFNode};

fn move_tag_for(color: Stone) -> PropertyTag {
    match color {
        Stone::Black => PropertyTag::B,
        Stone::White => PropertyTag::W,
        Stone::Empty => unreachable!("a move's color is never Empty"),
    }
}

/// Reads the move (if any) a node carries out of its `B`/`W` property,
/// decoding the resignation sentinel, an empty value (pass), or an SGF
/// coordinate pair.
fn node_move(node: &SGFNode) -> Option<Move> {
    let (tag, color) = match node.move_tag()? {
        PropertyTag::B => (PropertyTag::B, Stone::Black),
        PropertyTag::W => (PropertyTag::W, Stone::White),
        _ => return None,
    };
    let raw = node.get_property(tag)?.first().map(String::as_str).unwrap_or("");
    if raw == RESIGN_SENTINEL {
        Some(Move::Resign { color })
    } else if raw.is_empty() {
        Some(Move::Pass { color })
    } else {
        let coord: GoCoord = raw.parse().ok()?;
        Some(Move::play(coord.col(), coord.row(), color))
    }
}

/// Writes a move onto a node's `B`/`W` property, the inverse of
/// [`node_move`]. `Null` is a no-op: the root carries no move.
fn set_move(node: &mut SGFNode, mv: Move) {
    let value = match mv {
        Move::Play { x, y, .. } => GoCoord::from_colrow(x, y).to_string(),
        Move::Pass { .. } => String::new(),
        Move::Resign { .. } => RESIGN_SENTINEL.to_string(),
        Move::Null => return,
    };
    let Some(color) = mv.color() else { return };
    node.set_property(move_tag_for(color), vec![value]);
}

fn resign_result(color: Stone) -> String {
    match color {
        Stone::Black => "W+R".to_string(),
        Stone::White => "B+R".to_string(),
        Stone::Empty => String::new(),
    }
}

/// Builds the root node for a fresh game: `FF[4]GM[1]SZ[side]RU[rules]KM[komi]`.
fn fresh_root(side: usize, rules: Rules, komi: f64) -> SGFNode {
    let mut root = SGFNode::new();
    root.set_property(PropertyTag::FF, vec!["4".to_string()]);
    root.set_property(PropertyTag::GM, vec!["1".to_string()]);
    root.set_property(PropertyTag::SZ, vec![side.to_string()]);
    root.set_property(PropertyTag::RU, vec![rules.to_string()]);
    root.set_property(PropertyTag::KM, vec![komi.to_string()]);
    root
}

/// Applies one node's setup properties (`AB`/`AW`/`AE`) and move, in that
/// order, to an engine already positioned at the node's parent. Malformed
/// coordinates are silently skipped rather than failing the whole replay:
/// by the time a node reaches this function it has already been accepted
/// once (by `play`/`add`), so a failure here would mean the stored SGF
/// text itself is corrupt, not that the move is illegal.
fn apply_node(engine: &mut RulesEngine, node: &SGFNode) {
    for (tag, color) in [(PropertyTag::AB, Stone::Black), (PropertyTag::AW, Stone::White)] {
        if let Some(values) = node.get_property(tag) {
            for raw in values {
                if let Ok(coord) = raw.parse::<GoCoord>() {
                    let _ = engine.add(Move::play(coord.col(), coord.row(), color));
                }
            }
        }
    }
    if let Some(values) = node.get_property(PropertyTag::AE) {
        for raw in values {
            if let Ok(coord) = raw.parse::<GoCoord>() {
                let v = Vertex::new(coord.col(), coord.row());
                if engine.board().is_on_board(v) {
                    engine.remove(v);
                }
            }
        }
    }
    if let Some(mv) = node_move(node) {
        let _ = engine.play(mv);
    }
}

/// A playable game: a [`RulesEngine`] and the [`GameTree`] recording it,
/// mutated together so the board always matches the cursor's position in
/// the record.
#[derive(Debug, Clone)]
pub struct GoGame {
    tree: GameTree,
    engine: RulesEngine,
}

impl GoGame {
    /// A fresh game on an empty board, with a single-root tree carrying
    /// `FF[4]GM[1]SZ[side]RU[rules]KM[komi]`.
    pub fn new(side: usize, rules: Rules, komi: f64) -> Self {
        GoGame {
            tree: GameTree::new(fresh_root(side, rules, komi)),
            engine: RulesEngine::new(side, rules, komi),
        }
    }

    /// Builds a game from an existing tree, seeding side/rules/komi from
    /// its root metadata and replaying the root-to-cursor path to bring the
    /// rules engine in sync. `RU`/`KM` default to Japanese/`0.0` when
    /// absent (see `DESIGN.md`); a missing or non-{9,13,19} `SZ` is
    /// rejected as `SgfError::NotAGoGame`.
    pub fn from_tree(tree: GameTree) -> Result<Self, SgfError> {
        let root = tree.value(tree.root());
        let side = root
            .get_property(PropertyTag::SZ)
            .and_then(|v| v.first())
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|side| Board::VALID_SIDES.contains(side))
            .ok_or(SgfError::NotAGoGame)?;
        let rules = root
            .get_property(PropertyTag::RU)
            .and_then(|v| v.first())
            .map(|s| s.parse::<Rules>().unwrap_or(Rules::Other))
            .unwrap_or(Rules::Japanese);
        let komi = root
            .get_property(PropertyTag::KM)
            .and_then(|v| v.first())
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        let mut engine = RulesEngine::new(side, rules, komi);
        for node in &tree.sequence_from_root()[1..] {
            apply_node(&mut engine, node);
        }

        Ok(GoGame { tree, engine })
    }

    /// Restores the root and clears all derived structures, preserving
    /// side/rules/komi.
    pub fn reset(&mut self) {
        let (side, rules, komi) = (self.engine.side(), self.engine.rules, self.engine.komi);
        self.tree = GameTree::new(fresh_root(side, rules, komi));
        self.engine = RulesEngine::new(side, rules, komi);
    }

    fn rebuild_engine_from_cursor(&mut self) {
        let (side, rules, komi) = (self.engine.side(), self.engine.rules, self.engine.komi);
        self.engine = RulesEngine::new(side, rules, komi);
        for node in &self.tree.sequence_from_root()[1..] {
            apply_node(&mut self.engine, node);
        }
    }

    fn set_root_property(&mut self, tag: PropertyTag, values: Vec<String>) {
        let root = self.tree.root();
        self.tree.value_mut(root).set_property(tag, values);
    }

    /// Validates and applies `mv` under the rules engine, recording it as a
    /// new child node under the cursor and stepping into it. A resignation
    /// additionally sets `RE` on the root; the second of two consecutive
    /// passes sets `RE` to empty.
    pub fn play(&mut self, mv: Move) -> Result<(), RulesError> {
        self.engine.play(mv)?;

        match mv {
            Move::Resign { color } => self.set_root_property(PropertyTag::RE, vec![resign_result(color)]),
            Move::Pass { .. } if self.engine.is_over() => {
                self.set_root_property(PropertyTag::RE, vec![String::new()])
            }
            _ => {}
        }

        let mut node = SGFNode::new();
        set_move(&mut node, mv);
        self.tree.insert_as_child(node);
        debug!("played {mv:?}, active is now {:?}", self.engine.active_color());
        Ok(())
    }

    /// As [`Self::play`] but never changes the active player, and records
    /// into the *current* node's `AB`/`AW` rather than inserting a child.
    pub fn add(&mut self, mv: Move) -> Result<(), RulesError> {
        self.engine.add(mv)?;
        if let (Some(v), Some(color)) = (mv.vertex(), mv.color()) {
            let tag = match color {
                Stone::Black => PropertyTag::AB,
                Stone::White => PropertyTag::AW,
                Stone::Empty => return Ok(()),
            };
            let coord = GoCoord::from_colrow(v.x, v.y).to_string();
            self.tree.current_value_mut().append_property(tag, coord);
        }
        Ok(())
    }

    /// Removes a stone from the board (an `AE` setup edit), recording the
    /// coordinate into the current node's `AE` property.
    pub fn remove(&mut self, v: Vertex) {
        self.engine.remove(v);
        let coord = GoCoord::from_colrow(v.x, v.y).to_string();
        self.tree.current_value_mut().append_property(PropertyTag::AE, coord);
    }

    /// Steps the cursor up `n` levels and rebuilds the engine by replaying
    /// the new root-to-cursor path from scratch. Idempotent at `n == 0`;
    /// fails with [`TreeError::AtRoot`] if `n` exceeds the current depth.
    pub fn step_up(&mut self, n: usize) -> Result<(), TreeError> {
        let depth = self.tree.depth();
        if n > depth {
            return Err(TreeError::AtRoot);
        }
        let mut id = self.tree.current();
        for _ in 0..n {
            id = self.tree.parent_of(id).expect("depth accounting guarantees a parent");
        }
        self.tree.set_cursor(id);
        self.rebuild_engine_from_cursor();
        Ok(())
    }

    /// From the cursor, repeatedly steps into child index 0 and applies its
    /// recorded move/setup properties to the engine, until reaching a leaf.
    pub fn play_default_sequence(&mut self) {
        while !self.tree.is_leaf() {
            self.tree.step_down(0).expect("just checked this is not a leaf");
            let node = self.tree.current_value().clone();
            apply_node(&mut self.engine, &node);
        }
    }

    /// Attempts each move in order via [`Self::play`]; on the first
    /// illegal move, rolls the whole game back to its pre-call state and
    /// re-raises that error.
    pub fn play_move_sequence(&mut self, moves: &[Move]) -> Result<(), RulesError> {
        let backup = self.clone();
        for &mv in moves {
            if let Err(err) = self.play(mv) {
                *self = backup;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Every root-to-leaf... more precisely cursor-to-leaf line of moves
    /// reachable from the current node, one `Vec<Move>` per leaf. Walked
    /// iteratively (an explicit stack) so a deep record cannot overflow the
    /// call stack, per the design note on recursive tree walks.
    pub fn get_sequences(&self) -> Vec<Vec<Move>> {
        let mut results = Vec::new();
        let mut stack: Vec<(NodeId, Vec<Move>)> = vec![(self.tree.current(), Vec::new())];
        while let Some((id, mut path)) = stack.pop() {
            if let Some(mv) = node_move(self.tree.value(id)) {
                path.push(mv);
            }
            let children = self.tree.children_of(id);
            if children.is_empty() {
                results.push(path);
            } else {
                for &child in children {
                    stack.push((child, path.clone()));
                }
            }
        }
        results
    }

    /// Merges root-level and current-node properties; on a colliding tag,
    /// the current node's value wins.
    pub fn get_properties(&self) -> SGFNode {
        let mut merged = self.tree.value(self.tree.root()).clone();
        for (tag, values) in self.tree.current_value().properties() {
            merged.set_property(tag, values.to_vec());
        }
        merged
    }

    fn ff_version(&self) -> u8 {
        self.tree
            .value(self.tree.root())
            .get_property(PropertyTag::FF)
            .and_then(|v| v.first())
            .and_then(|s| s.parse().ok())
            .unwrap_or(1)
    }

    /// Sets a property, rejecting edits to `SZ` and routing root-only tags
    /// (`FF`/`SZ`/`GM`/`RU`/`KM`/`RE`) to the root regardless of cursor
    /// position. Fails if `tag` was introduced in a later FF version than
    /// the record declares.
    pub fn set_property(&mut self, tag: PropertyTag, values: Vec<String>) -> Result<(), SgfError> {
        let ff = self.ff_version();
        if tag == PropertyTag::SZ || tag.min_ff() > ff {
            return Err(SgfError::PropertyNotValidInFF(tag.to_string(), ff));
        }
        if tag.is_root_only() {
            let root = self.tree.root();
            self.tree.value_mut(root).set_property(tag, values);
        } else {
            self.tree.current_value_mut().set_property(tag, values);
        }
        Ok(())
    }

    /// Places fixed handicap stones for Black via [`Self::add`]. A thin
    /// helper over the setup API, not its own GTP command (see
    /// `DESIGN.md`).
    pub fn place_handicap(&mut self, vertices: &[Vertex]) -> Result<(), RulesError> {
        for &v in vertices {
            self.add(Move::play(v.x, v.y, Stone::Black))?;
        }
        Ok(())
    }

    pub fn board(&self) -> &Board {
        self.engine.board()
    }

    pub fn side(&self) -> usize {
        self.engine.side()
    }

    pub fn rules(&self) -> Rules {
        self.engine.rules
    }

    pub fn komi(&self) -> f64 {
        self.engine.komi
    }

    /// Updates komi in place, mirroring the new value onto the root's `KM`
    /// property. Unlike [`Self::play`]/[`Self::add`] this never touches the
    /// tree's shape.
    pub fn set_komi(&mut self, komi: f64) {
        self.engine.komi = komi;
        self.set_root_property(PropertyTag::KM, vec![komi.to_string()]);
    }

    /// The moves along the "default" line from the cursor: repeatedly
    /// taking child index 0, collecting each node's move (setup-only nodes
    /// along the way contribute nothing). Does not mutate the engine or
    /// move the cursor; used by `loadsgf`'s move-count form, which replays
    /// a prefix of this sequence through [`Self::play_move_sequence`].
    pub fn default_sequence(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut id = self.tree.current();
        loop {
            let Some(&child) = self.tree.children_of(id).first() else { break };
            id = child;
            if let Some(mv) = node_move(self.tree.value(id)) {
                moves.push(mv);
            }
        }
        moves
    }

    pub fn active_color(&self) -> Stone {
        self.engine.active_color()
    }

    pub fn pass_count(&self) -> u32 {
        self.engine.pass_count()
    }

    pub fn is_over(&self) -> bool {
        self.engine.is_over()
    }

    pub fn ko_point(&self) -> Option<Vertex> {
        self.engine.ko_point()
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.engine.is_legal(mv)
    }

    pub fn is_add_legal(&self, mv: Move) -> bool {
        self.engine.is_add_legal(mv)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.engine.legal_moves()
    }

    pub fn score(&self) -> Result<Results, RulesError> {
        self.engine.score()
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sgf::{parse_sgf, write_sgf};

    #[test]
    fn simple_capture_records_nodes_and_clears_the_board() {
        let mut game = GoGame::new(9, Rules::Chinese, 7.5);
        game.play(Move::play(1, 0, Stone::Black)).unwrap();
        game.play(Move::play(0, 0, Stone::White)).unwrap();
        game.play(Move::play(0, 1, Stone::Black)).unwrap();

        assert_eq!(game.board().get(Vertex::new(0, 0)), Stone::Empty);
        assert_eq!(game.tree().depth(), 3);
    }

    #[test]
    fn ko_forbids_immediate_recapture() {
        let mut game = GoGame::new(9, Rules::Chinese, 7.5);
        // a White stone at (1,0) sits in atari with its only liberty at the
        // corner (0,0); a second White stone at (0,1) keeps a spare liberty
        // so only the one-stone group is captured.
        game.add(Move::play(2, 0, Stone::Black)).unwrap();
        game.add(Move::play(1, 1, Stone::Black)).unwrap();
        game.add(Move::play(1, 0, Stone::White)).unwrap();
        game.add(Move::play(0, 1, Stone::White)).unwrap();

        game.play(Move::play(0, 0, Stone::Black)).unwrap();
        assert_eq!(game.ko_point(), Some(Vertex::new(1, 0)));
        assert!(!game.is_legal(Move::play(1, 0, Stone::White)));
    }

    #[test]
    fn self_capture_is_rejected_and_leaves_the_tree_unchanged() {
        let mut game = GoGame::new(9, Rules::Chinese, 7.5);
        game.add(Move::play(1, 0, Stone::White)).unwrap();
        game.add(Move::play(0, 1, Stone::White)).unwrap();
        let depth_before = game.tree().depth();

        let err = game.play(Move::play(0, 0, Stone::Black)).unwrap_err();
        assert_eq!(err, RulesError::SelfCapture(Move::play(0, 0, Stone::Black)));
        assert_eq!(game.tree().depth(), depth_before);
    }

    #[test]
    fn two_passes_end_the_game_and_set_re_to_empty() {
        let mut game = GoGame::new(9, Rules::Chinese, 7.5);
        game.play(Move::Pass { color: Stone::Black }).unwrap();
        game.play(Move::Pass { color: Stone::White }).unwrap();

        assert!(game.is_over());
        let root = game.tree().value(game.tree().root());
        assert_eq!(root.get_property(PropertyTag::RE), Some(&[String::new()][..]));
        assert!(game.score().is_ok());
    }

    #[test]
    fn resigning_sets_re_on_the_root_and_is_omitted_by_the_writer() {
        let mut game = GoGame::new(9, Rules::Chinese, 7.5);
        game.play(Move::Resign { color: Stone::Black }).unwrap();

        let root = game.tree().value(game.tree().root());
        assert_eq!(root.get_property(PropertyTag::RE), Some(&["W+R".to_string()][..]));
        let written = write_sgf(game.tree());
        assert!(written.ends_with(')'));
        assert!(!written.contains("W["));
    }

    #[test]
    fn sgf_round_trip_through_gogame() {
        let mut game = GoGame::new(9, Rules::Japanese, 6.5);
        game.play(Move::play(4, 4, Stone::Black)).unwrap();
        game.play(Move::play(3, 4, Stone::White)).unwrap();
        game.play(Move::play(4, 3, Stone::Black)).unwrap();

        let written = write_sgf(game.tree());
        let reparsed = parse_sgf(&written).unwrap().remove(0);
        let replayed = GoGame::from_tree(reparsed).unwrap();

        // `from_tree` seeds the engine from a freshly-parsed tree whose
        // cursor sits at the root, so its board is the empty starting
        // position; what matters is that the metadata survived the
        // round-trip and the record re-parses without error.
        assert_eq!(replayed.side(), 9);
        assert_eq!(replayed.rules(), Rules::Japanese);
        assert_eq!(replayed.komi(), 6.5);
    }

    #[test]
    fn play_move_sequence_rolls_back_on_the_first_illegal_move() {
        let mut game = GoGame::new(9, Rules::Chinese, 7.5);
        let moves = [
            Move::play(2, 2, Stone::Black),
            Move::play(2, 2, Stone::White), // occupied: illegal
            Move::play(3, 3, Stone::White),
        ];

        let err = game.play_move_sequence(&moves).unwrap_err();
        assert_eq!(err, RulesError::OccupiedPoint(Move::play(2, 2, Stone::White)));
        assert!(game.tree().is_root());
        assert_eq!(game.board().get(Vertex::new(2, 2)), Stone::Empty);
    }

    #[test]
    fn play_default_sequence_walks_every_node_to_a_leaf() {
        let sgf = "(;GM[1]FF[4]SZ[9];B[ee];W[ef];B[ff])";
        let tree = parse_sgf(sgf).unwrap().remove(0);
        let mut game = GoGame::from_tree(tree).unwrap();
        game.play_default_sequence();

        assert!(game.tree().is_leaf());
        assert_eq!(game.board().get(Vertex::new(4, 4)), Stone::Black);
        assert_eq!(game.board().get(Vertex::new(4, 5)), Stone::White);
        assert_eq!(game.board().get(Vertex::new(5, 5)), Stone::Black);
    }

    #[test]
    fn get_sequences_enumerates_every_leaf_from_the_cursor() {
        let sgf = "(;GM[1]FF[4]SZ[9];B[dd](;W[pd])(;W[dp]))";
        let tree = parse_sgf(sgf).unwrap().remove(0);
        let game = GoGame::from_tree(tree).unwrap();
        let sequences = game.get_sequences();
        assert_eq!(sequences.len(), 2);
        assert!(sequences.iter().all(|s| s.len() == 2));
    }

    #[test]
    fn set_property_rejects_sz_and_routes_re_to_the_root() {
        let mut game = GoGame::new(9, Rules::Chinese, 7.5);
        assert!(game.set_property(PropertyTag::SZ, vec!["13".to_string()]).is_err());

        game.play(Move::play(2, 2, Stone::Black)).unwrap();
        game.set_property(PropertyTag::RE, vec!["B+3.5".to_string()]).unwrap();
        let root = game.tree().value(game.tree().root());
        assert_eq!(root.get_property(PropertyTag::RE), Some(&["B+3.5".to_string()][..]));
    }
}
