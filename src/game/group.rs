use std::collections::HashSet;

use crate::game::{Board, Stone, Vertex};

/// Identifies a [`Group`] in a [`GroupArena`]. Indices are reused once a
/// group is removed, so a stale `GroupId` from a previous board state must
/// never be dereferenced against a later arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// A maximally-connected set of same-colored stones. Two groups are equal
/// iff their vertex sets are equal; color is implied by membership in the
/// arena and does not participate in the comparison performed here, since a
/// `Group` never changes color over its lifetime.
#[derive(Debug, Clone)]
pub struct Group {
    color: Stone,
    stones: HashSet<Vertex>,
}

impl Group {
    pub fn color(&self) -> Stone {
        self.color
    }

    pub fn stones(&self) -> &HashSet<Vertex> {
        &self.stones
    }

    pub fn size(&self) -> usize {
        self.stones.len()
    }

    /// The liberties of this group: empty vertices adjacent to any of its
    /// stones, on a board of the given side.
    pub fn liberties(&self, board: &Board) -> HashSet<Vertex> {
        let mut libs = HashSet::new();
        for &v in &self.stones {
            for n in v.neighbors(board.side()) {
                if board.is_empty_at(n) {
                    libs.insert(n);
                }
            }
        }
        libs
    }
}

/// An arena of same-colored stone groups addressed by small integer ids,
/// avoiding the reference cycles a pointer-linked group graph would need.
/// Freed slots are reused via a free-list so ids stay dense while the board
/// is heavily contested.
#[derive(Debug, Clone, Default)]
pub struct GroupArena {
    slots: Vec<Option<Group>>,
    free: Vec<usize>,
}

impl GroupArena {
    pub fn new() -> Self {
        GroupArena::default()
    }

    pub fn insert(&mut self, color: Stone, stones: HashSet<Vertex>) -> GroupId {
        let group = Group { color, stones };
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(group);
            GroupId(idx)
        } else {
            self.slots.push(Some(group));
            GroupId(self.slots.len() - 1)
        }
    }

    pub fn get(&self, id: GroupId) -> &Group {
        self.slots[id.0]
            .as_ref()
            .expect("GroupId dereferenced after removal")
    }

    pub fn remove(&mut self, id: GroupId) -> Group {
        let group = self.slots[id.0].take().expect("GroupId removed twice");
        self.free.push(id.0);
        group
    }

    /// The id of the group occupying `v`, if any.
    pub fn group_at(&self, v: Vertex) -> Option<GroupId> {
        self.slots.iter().enumerate().find_map(|(idx, slot)| {
            slot.as_ref()
                .filter(|g| g.stones.contains(&v))
                .map(|_| GroupId(idx))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|g| (GroupId(idx), g)))
    }
}
