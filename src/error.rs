//! Closed error-kind enums for the three subsystems.
//!
//! These are kept separate from the `anyhow::Error` used at the SGF/CLI
//! boundary: callers that need to `match` on the exact rule violated (a GTP
//! dispatcher deciding which diagnostic to print, a test asserting which
//! invariant failed) get a typed reason instead of a formatted string.

use thiserror::Error;

use crate::game::Move;

/// Failure reasons from the rules engine, in priority order (see
/// [`crate::game::RulesEngine::play`]).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RulesError {
    #[error("{0:?} is off the board")]
    OffBoard(Move),

    #[error("{0:?} is already occupied")]
    OccupiedPoint(Move),

    #[error("{0:?} plays out of turn")]
    WrongColor(Move),

    #[error("{0:?} is a self-capture")]
    SelfCapture(Move),

    #[error("{0:?} is forbidden by the ko rule")]
    KoPoint(Move),

    #[error("the game cannot be scored before two consecutive passes")]
    NotScoreable,

    #[error("the game is already over")]
    GameAlreadyOver,
}

/// Failure reasons from the SGF parser/editor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SgfError {
    #[error("the input is empty")]
    Empty,

    #[error("extra closing bracket")]
    ExtraBracket,

    #[error("extra closing parenthesis")]
    ExtraParen,

    #[error("missing closing parenthesis")]
    MissingParen,

    #[error("unknown property {0:?}")]
    UnknownProperty(String),

    #[error("property {0:?} is not valid in FF[{1}]")]
    PropertyNotValidInFF(String, u8),

    #[error("not a go game")]
    NotAGoGame,

    #[error("malformed coordinate {0:?}")]
    MalformedCoordinate(String),
}

/// Failure reasons surfaced by the GTP dispatcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GtpError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("bad arguments, expected one of: {0:?}")]
    BadArguments(Vec<String>),

    #[error("illegal move")]
    IllegalMove,

    #[error("unacceptable size")]
    UnacceptableSize,

    #[error("cannot undo")]
    CannotUndo,

    #[error("cannot load file")]
    CannotLoadFile,
}

/// Failure reasons from [`crate::sgf::GameTree`] cursor navigation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("no such child")]
    NoSuchChild,

    #[error("already at root")]
    AtRoot,
}
