pub mod node;
mod parser;
mod serializer;
pub mod tree;

pub use node::{GoCoord, PropertyTag, SGFNode};
pub use parser::parse_sgf;
pub(crate) use serializer::RESIGN_SENTINEL;
pub use serializer::write_sgf;
pub use tree::{GameTree, NodeId, Tree};
