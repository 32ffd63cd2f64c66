//! Go Text Protocol: a line-oriented command dispatcher over [`GoGame`],
//! plus the typed tokenizer its overload resolution is built on.
//!
//! [`GoGame`]: crate::goban::GoGame

mod dispatcher;
mod token;

pub use dispatcher::{Dispatcher, MoveGenerator, UserCommand, PROTOCOL_VERSION};
pub use token::{ArgKind, Command, Literal};
