//! The board, stones, and rules engine: everything needed to legally play
//! and score a game, independent of how it is recorded or dispatched.

mod board;
mod group;
mod mv;
mod rules;
mod stone;
mod vertex;

pub use board::Board;
pub use group::{Group, GroupArena, GroupId};
pub use mv::Move;
pub use rules::{Results, Rules, RulesEngine};
pub use stone::Stone;
pub use vertex::Vertex;
