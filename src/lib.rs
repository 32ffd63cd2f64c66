pub mod error;
pub mod game;
pub mod goban;
pub mod gtp;
pub mod sgf;

pub use goban::GoGame;
pub use sgf::{GameTree, parse_sgf, write_sgf};
