use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::RulesError;
use crate::game::group::{Group, GroupArena, GroupId};
use crate::game::{Board, Move, Stone, Vertex};

/// A scoring convention. `Other` covers house rules not distinguished from
/// Japanese scoring by this engine (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rules {
    Chinese,
    Japanese,
    Korean,
    Other,
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rules::Chinese => "Chinese",
            Rules::Japanese => "Japanese",
            Rules::Korean => "Korean",
            Rules::Other => "Other",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Rules {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chinese" => Ok(Rules::Chinese),
            "japanese" => Ok(Rules::Japanese),
            "korean" => Ok(Rules::Korean),
            _ => Ok(Rules::Other),
        }
    }
}

/// The outcome of a scored game. `*_territory` is signed because Japanese
/// and Korean scoring subtracts captured-stone counts, which can drive a
/// side's running total negative in an unusual game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Results {
    pub rules: Rules,
    pub komi: f64,
    pub black_territory: i64,
    pub white_territory: i64,
    pub black_stones: u32,
    pub white_stones: u32,
}

impl Results {
    pub fn black_score(&self) -> f64 {
        (self.black_territory + self.black_stones as i64) as f64
    }

    pub fn white_score(&self) -> f64 {
        (self.white_territory + self.white_stones as i64) as f64 + self.komi
    }

    /// `None` on a tie.
    pub fn winner(&self) -> Option<Stone> {
        match self.black_score().partial_cmp(&self.white_score()) {
            Some(Ordering::Greater) => Some(Stone::Black),
            Some(Ordering::Less) => Some(Stone::White),
            _ => None,
        }
    }
}

/// The rules engine's mutable state: the board, the group index, the ko
/// point, and the bookkeeping scoring needs. Owned by [`RulesEngine`].
#[derive(Debug, Clone)]
struct RulesState {
    board: Board,
    arena: GroupArena,
    groups: HashMap<Vertex, GroupId>,
    captured_by_ply: HashMap<u32, HashSet<(Vertex, Stone)>>,
    ko_point: Option<Vertex>,
    pass_count: u32,
    ply: u32,
    active: Stone,
    over: bool,
}

/// Implements Go's legality and capture rules over a single board, exposing
/// the placement algorithm and scoring described for this engine.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    state: RulesState,
    pub rules: Rules,
    pub komi: f64,
}

impl RulesEngine {
    pub fn new(side: usize, rules: Rules, komi: f64) -> Self {
        RulesEngine {
            state: RulesState {
                board: Board::new(side),
                arena: GroupArena::new(),
                groups: HashMap::new(),
                captured_by_ply: HashMap::new(),
                ko_point: None,
                pass_count: 0,
                ply: 0,
                active: Stone::Black,
                over: false,
            },
            rules,
            komi,
        }
    }

    pub fn board(&self) -> &Board {
        &self.state.board
    }

    pub fn side(&self) -> usize {
        self.state.board.side()
    }

    pub fn active_color(&self) -> Stone {
        self.state.active
    }

    pub fn pass_count(&self) -> u32 {
        self.state.pass_count
    }

    pub fn is_over(&self) -> bool {
        self.state.over
    }

    pub fn ko_point(&self) -> Option<Vertex> {
        self.state.ko_point
    }

    fn neighbor_groups(&self, v: Vertex, color: Stone) -> (HashSet<GroupId>, HashSet<GroupId>) {
        let mut friend = HashSet::new();
        let mut enemy = HashSet::new();
        for n in v.neighbors(self.side()) {
            if let Some(&id) = self.state.groups.get(&n) {
                if self.state.arena.get(id).color() == color {
                    friend.insert(id);
                } else {
                    enemy.insert(id);
                }
            }
        }
        (friend, enemy)
    }

    /// The self-capture half of legality, stated without mutating anything.
    fn is_not_self_capture(&self, v: Vertex, color: Stone) -> bool {
        let (friend, enemy) = self.neighbor_groups(v, color);

        for id in &enemy {
            if self.state.arena.get(*id).liberties(&self.state.board).len() == 1 {
                return true;
            }
        }

        let mut merged: HashSet<Vertex> = HashSet::from([v]);
        for id in &friend {
            merged.extend(self.state.arena.get(*id).stones());
        }

        let mut liberties = HashSet::new();
        for &stone in &merged {
            for n in stone.neighbors(self.side()) {
                if n != v && self.state.board.is_empty_at(n) {
                    liberties.insert(n);
                }
            }
        }
        !liberties.is_empty()
    }

    fn is_not_ko_point(&self, v: Vertex) -> bool {
        self.state.ko_point != Some(v)
    }

    fn correct_color(&self, color: Stone) -> bool {
        color == self.state.active
    }

    /// True iff all of: on-board, empty, correct color, not ko, not
    /// self-capture.
    pub fn is_legal(&self, mv: Move) -> bool {
        let Some(v) = mv.vertex() else { return false };
        let Some(color) = mv.color() else { return false };
        v.on_board(self.side())
            && self.state.board.is_empty_at(v)
            && self.correct_color(color)
            && self.is_not_ko_point(v)
            && self.is_not_self_capture(v, color)
    }

    /// As [`Self::is_legal`] but omits the active-color check.
    pub fn is_add_legal(&self, mv: Move) -> bool {
        let Some(v) = mv.vertex() else { return false };
        let Some(color) = mv.color() else { return false };
        v.on_board(self.side())
            && self.state.board.is_empty_at(v)
            && self.is_not_ko_point(v)
            && self.is_not_self_capture(v, color)
    }

    fn reason(&self, mv: Move, check_color: bool) -> RulesError {
        let v = mv.vertex();
        let color = mv.color();
        if v.is_none_or(|v| !v.on_board(self.side())) {
            return RulesError::OffBoard(mv);
        }
        let v = v.unwrap();
        if !self.state.board.is_empty_at(v) {
            return RulesError::OccupiedPoint(mv);
        }
        if check_color {
            if let Some(color) = color {
                if !self.correct_color(color) {
                    return RulesError::WrongColor(mv);
                }
            }
        }
        if let Some(color) = color {
            if !self.is_not_self_capture(v, color) {
                return RulesError::SelfCapture(mv);
            }
        }
        RulesError::KoPoint(mv)
    }

    /// Places a stone (or records a pass/resignation) under the rules
    /// described for this engine, mutating the active player on success.
    pub fn play(&mut self, mv: Move) -> Result<(), RulesError> {
        match mv {
            Move::Pass { .. } => {
                self.state.pass_count += 1;
                self.state.ply += 1;
                if self.state.pass_count >= 2 {
                    self.state.over = true;
                }
                self.state.active = self.state.active.opponent();
                Ok(())
            }
            Move::Resign { color } => {
                if self.state.over {
                    return Err(RulesError::GameAlreadyOver);
                }
                self.state.over = true;
                let _ = color;
                Ok(())
            }
            Move::Null => Ok(()),
            Move::Play { color, .. } => {
                if self.state.over {
                    return Err(RulesError::GameAlreadyOver);
                }
                if !self.is_legal(mv) {
                    return Err(self.reason(mv, true));
                }
                self.place(mv);
                self.state.active = color.opponent();
                Ok(())
            }
        }
    }

    /// As [`Self::play`] but never changes the active player and is
    /// callable for either color regardless of whose turn it is.
    pub fn add(&mut self, mv: Move) -> Result<(), RulesError> {
        match mv {
            Move::Play { .. } => {
                if !self.is_add_legal(mv) {
                    return Err(self.reason(mv, false));
                }
                self.place(mv);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Step d-g of the placement algorithm: board mutation, group merge, ko
    /// reset, capture sweep, and ko detection. Assumes legality has already
    /// been checked.
    fn place(&mut self, mv: Move) {
        let v = mv.vertex().expect("place called with a non-Play move");
        let color = mv.color().expect("place called with a non-Play move");

        self.state.pass_count = 0;
        self.state.ply += 1;

        let (friend, enemy) = self.neighbor_groups(v, color);

        let all_enemy_before_capture = v
            .neighbors(self.side())
            .all(|n| self.state.board.get(n) == color.opponent());

        self.state.board.set(v, color);

        let mut merged: HashSet<Vertex> = HashSet::from([v]);
        for &id in &friend {
            let removed = self.state.arena.remove(id);
            merged.extend(removed.stones());
        }
        let new_id = self.state.arena.insert(color, merged.clone());
        for &stone in &merged {
            self.state.groups.insert(stone, new_id);
        }

        self.state.ko_point = None;

        let mut total_captured = 0usize;
        let mut single_captured_vertex = None;
        for &id in &enemy {
            let liberties = self.state.arena.get(id).liberties(&self.state.board);
            if liberties.is_empty() {
                let group = self.state.arena.remove(id);
                for &stone in group.stones() {
                    self.state.board.set(stone, Stone::Empty);
                    self.state.groups.remove(&stone);
                    self.state
                        .captured_by_ply
                        .entry(self.state.ply)
                        .or_default()
                        .insert((stone, group.color()));
                }
                total_captured += group.size();
                if group.size() == 1 {
                    single_captured_vertex = group.stones().iter().next().copied();
                }
            }
        }

        if friend.is_empty() && total_captured == 1 && all_enemy_before_capture {
            self.state.ko_point = single_captured_vertex;
        }
    }

    /// Removes a stone from the board outside the normal placement
    /// algorithm (an `AE` setup property), rebuilding the group index from
    /// scratch since clearing one stone can split its former group into
    /// several disconnected remnants. Cheap enough for the setup-only rate
    /// this is used at; unlike [`Self::place`] it never touches `ko_point`
    /// or `pass_count`, since setup is not a ply.
    pub fn remove(&mut self, v: Vertex) {
        self.state.board.set(v, Stone::Empty);
        self.rebuild_groups();
    }

    fn rebuild_groups(&mut self) {
        let side = self.side();
        self.state.arena = GroupArena::new();
        self.state.groups.clear();

        let mut seen: HashSet<Vertex> = HashSet::new();
        for y in 0..side {
            for x in 0..side {
                let start = Vertex::new(x, y);
                let color = self.state.board.get(start);
                if color == Stone::Empty || seen.contains(&start) {
                    continue;
                }

                let mut stones = HashSet::new();
                let mut stack = vec![start];
                seen.insert(start);
                while let Some(v) = stack.pop() {
                    stones.insert(v);
                    for n in v.neighbors(side) {
                        if self.state.board.get(n) == color && seen.insert(n) {
                            stack.push(n);
                        }
                    }
                }

                let id = self.state.arena.insert(color, stones.clone());
                for stone in stones {
                    self.state.groups.insert(stone, id);
                }
            }
        }
    }

    /// Replays the engine back `n` plies by rebuilding from an empty board
    /// and replaying the prefix, given the full move sequence from root.
    pub fn undo(&mut self, sequence: &[Move], n: usize) {
        let side = self.side();
        let rules = self.rules;
        let komi = self.komi;
        *self = RulesEngine::new(side, rules, komi);
        let prefix_len = sequence.len().saturating_sub(n);
        for &mv in &sequence[..prefix_len] {
            let _ = self.play(mv);
        }
    }

    /// Every legal [`Move::Play`] for the active player, plus `Pass` and
    /// `Resign`.
    pub fn legal_moves(&self) -> Vec<Move> {
        let side = self.side();
        let active = self.state.active;
        let mut moves: Vec<Move> = (0..side)
            .flat_map(|y| (0..side).map(move |x| Vertex::new(x, y)))
            .map(|v| Move::play(v.x, v.y, active))
            .filter(|&mv| self.is_legal(mv))
            .collect();
        moves.push(Move::Pass { color: active });
        moves.push(Move::Resign { color: active });
        moves
    }

    /// Flood-fills empty regions to find territory, adding the Chinese
    /// stone-area bonus or subtracting Japanese/Korean captures as
    /// appropriate. Requires two consecutive passes.
    pub fn score(&self) -> Result<Results, RulesError> {
        if self.state.pass_count < 2 {
            return Err(RulesError::NotScoreable);
        }

        let side = self.side();
        let mut visited: HashSet<Vertex> = HashSet::new();
        let mut black_territory: i64 = 0;
        let mut white_territory: i64 = 0;

        for y in 0..side {
            for x in 0..side {
                let start = Vertex::new(x, y);
                if visited.contains(&start) || !self.state.board.is_empty_at(start) {
                    continue;
                }

                let mut region = Vec::new();
                let mut borders: HashSet<Stone> = HashSet::new();
                let mut stack = vec![start];
                visited.insert(start);

                while let Some(v) = stack.pop() {
                    region.push(v);
                    for n in v.neighbors(side) {
                        let stone = self.state.board.get(n);
                        if stone == Stone::Empty {
                            if visited.insert(n) {
                                stack.push(n);
                            }
                        } else {
                            borders.insert(stone);
                        }
                    }
                }

                if borders.len() == 1 {
                    match borders.iter().next().unwrap() {
                        Stone::Black => black_territory += region.len() as i64,
                        Stone::White => white_territory += region.len() as i64,
                        Stone::Empty => unreachable!(),
                    }
                }
            }
        }

        let mut black_stones = 0u32;
        let mut white_stones = 0u32;

        if self.rules == Rules::Chinese {
            for (_, stone) in self.state.board.stones() {
                match stone {
                    Stone::Black => black_stones += 1,
                    Stone::White => white_stones += 1,
                    Stone::Empty => {}
                }
            }
        } else {
            for captures in self.state.captured_by_ply.values() {
                for &(_, color) in captures {
                    match color {
                        Stone::Black => black_territory -= 1,
                        Stone::White => white_territory -= 1,
                        Stone::Empty => {}
                    }
                }
            }
        }

        Ok(Results {
            rules: self.rules,
            komi: self.komi,
            black_territory,
            white_territory,
            black_stones,
            white_stones,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_plays_first() {
        let engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        assert_eq!(engine.active_color(), Stone::Black);
    }

    #[test]
    fn legal_play_flips_active_player() {
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        engine.play(Move::play(2, 2, Stone::Black)).unwrap();
        assert_eq!(engine.active_color(), Stone::White);
        assert_eq!(engine.board().get(Vertex::new(2, 2)), Stone::Black);
    }

    #[test]
    fn wrong_color_is_rejected() {
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        let err = engine.play(Move::play(2, 2, Stone::White)).unwrap_err();
        assert_eq!(err, RulesError::WrongColor(Move::play(2, 2, Stone::White)));
    }

    #[test]
    fn occupied_point_is_rejected() {
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        engine.play(Move::play(2, 2, Stone::Black)).unwrap();
        let err = engine.play(Move::play(2, 2, Stone::White)).unwrap_err();
        assert_eq!(err, RulesError::OccupiedPoint(Move::play(2, 2, Stone::White)));
    }

    #[test]
    fn off_board_is_rejected() {
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        let err = engine.play(Move::play(9, 0, Stone::Black)).unwrap_err();
        assert_eq!(err, RulesError::OffBoard(Move::play(9, 0, Stone::Black)));
    }

    #[test]
    fn lone_stone_self_capture_is_rejected() {
        // surround (0, 0) with White, then Black tries to play into it.
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        engine.add(Move::play(1, 0, Stone::White)).unwrap();
        engine.add(Move::play(0, 1, Stone::White)).unwrap();
        let err = engine.play(Move::play(0, 0, Stone::Black)).unwrap_err();
        assert_eq!(err, RulesError::SelfCapture(Move::play(0, 0, Stone::Black)));
    }

    #[test]
    fn capturing_move_is_always_legal_even_into_an_apparent_self_capture() {
        // Black surrounds a lone White stone at (0,0), playing the last
        // liberty. This captures, so it must not be rejected as suicide.
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        engine.add(Move::play(0, 0, Stone::White)).unwrap();
        engine.add(Move::play(1, 0, Stone::Black)).unwrap();
        engine.play(Move::play(0, 1, Stone::Black)).unwrap();
        assert_eq!(engine.board().get(Vertex::new(0, 0)), Stone::Empty);
    }

    #[test]
    fn corner_ko_sets_ko_point_and_forbids_immediate_recapture() {
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        // A White stone at (1,0) sits in atari with its only liberty at the
        // corner (0,0); a second White stone at (0,1) keeps a spare
        // liberty so only the one-stone group is captured.
        engine.add(Move::play(2, 0, Stone::Black)).unwrap();
        engine.add(Move::play(1, 1, Stone::Black)).unwrap();
        engine.add(Move::play(1, 0, Stone::White)).unwrap();
        engine.add(Move::play(0, 1, Stone::White)).unwrap();

        engine.play(Move::play(0, 0, Stone::Black)).unwrap();

        assert_eq!(engine.ko_point(), Some(Vertex::new(1, 0)));
        assert!(!engine.is_legal(Move::play(1, 0, Stone::White)));
    }

    #[test]
    fn two_passes_end_the_game() {
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        engine.play(Move::Pass { color: Stone::Black }).unwrap();
        engine.play(Move::Pass { color: Stone::White }).unwrap();
        assert!(engine.is_over());
        assert_eq!(engine.pass_count(), 2);
    }

    #[test]
    fn score_fails_before_two_passes() {
        let engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        assert_eq!(engine.score().unwrap_err(), RulesError::NotScoreable);
    }

    #[test]
    fn empty_board_chinese_score_is_komi_only_difference() {
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        engine.play(Move::Pass { color: Stone::Black }).unwrap();
        engine.play(Move::Pass { color: Stone::White }).unwrap();
        let results = engine.score().unwrap();
        assert_eq!(results.winner(), Some(Stone::White));
    }

    #[test]
    fn legal_moves_includes_pass_and_resign() {
        let engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        let moves = engine.legal_moves();
        assert!(moves.iter().any(|m| m.is_pass()));
        assert!(moves.iter().any(|m| m.is_resign()));
        assert_eq!(moves.iter().filter(|m| m.is_play()).count(), 81);
    }

    #[test]
    fn undo_restores_earlier_board_state() {
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        let sequence = vec![
            Move::play(2, 2, Stone::Black),
            Move::play(3, 3, Stone::White),
        ];
        for &mv in &sequence {
            engine.play(mv).unwrap();
        }
        engine.undo(&sequence, 1);
        assert_eq!(engine.board().get(Vertex::new(3, 3)), Stone::Empty);
        assert_eq!(engine.board().get(Vertex::new(2, 2)), Stone::Black);
        assert_eq!(engine.active_color(), Stone::White);
    }

    #[test]
    fn remove_splits_a_group_whose_bridge_stone_is_cleared() {
        let mut engine = RulesEngine::new(9, Rules::Chinese, 7.5);
        // three in a row at (2,2)-(4,2); removing the middle stone should
        // leave two separate one-stone groups, not one two-stone group.
        engine.add(Move::play(2, 2, Stone::Black)).unwrap();
        engine.add(Move::play(3, 2, Stone::Black)).unwrap();
        engine.add(Move::play(4, 2, Stone::Black)).unwrap();
        engine.remove(Vertex::new(3, 2));

        assert_eq!(engine.board().get(Vertex::new(3, 2)), Stone::Empty);
        assert_eq!(engine.board().get(Vertex::new(2, 2)), Stone::Black);
        assert_eq!(engine.board().get(Vertex::new(4, 2)), Stone::Black);

        // surround only (2,2); it must capture alone, which is only
        // possible if it is no longer joined to (4,2) in one group.
        engine.add(Move::play(1, 2, Stone::White)).unwrap();
        engine.add(Move::play(2, 1, Stone::White)).unwrap();
        engine.add(Move::play(3, 2, Stone::White)).unwrap();
        engine.add(Move::play(2, 3, Stone::White)).unwrap();

        assert_eq!(engine.board().get(Vertex::new(2, 2)), Stone::Empty);
        assert_eq!(engine.board().get(Vertex::new(4, 2)), Stone::Black);
    }

    #[test]
    fn rules_round_trip_through_display_and_from_str() {
        for r in [Rules::Chinese, Rules::Japanese, Rules::Korean] {
            let parsed: Rules = r.to_string().parse().unwrap();
            assert_eq!(parsed, r);
        }
    }
}
