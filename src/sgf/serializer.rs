use std::fmt::Write as _;

use crate::sgf::node::{PropertyTag, SGFNode};
use crate::sgf::tree::{GameTree, NodeId};

/// The value `GoGame` stores on a `B`/`W` property to mark a node as a
/// resignation rather than a move or pass (see `DESIGN.md`). Never written
/// out: the writer drops resignation nodes and their subtrees entirely, per
/// the writer contract ("Resign nodes are omitted from output subtrees").
pub(crate) const RESIGN_SENTINEL: &str = "resign";

fn is_resignation(node: &SGFNode) -> bool {
    let values = match node.move_tag() {
        Some(PropertyTag::B) => node.get_property(PropertyTag::B),
        Some(PropertyTag::W) => node.get_property(PropertyTag::W),
        _ => None,
    };
    matches!(values, Some([v]) if v == RESIGN_SENTINEL)
}

/// Serializes a [`GameTree`] back to SGF FF[4] text, starting from the
/// tree's root regardless of where its cursor currently sits.
///
/// The writer is the inverse of [`crate::sgf::parse_sgf`]: `parse_sgf(&write_sgf(tree))`
/// always succeeds and yields a tree with the same node set, modulo any
/// resignation nodes (see [`is_resignation`]), which this writer omits.
pub fn write_sgf(tree: &GameTree) -> String {
    let mut out = String::new();
    out.push('(');
    write_node(tree, tree.root(), &mut out);
    out.push(')');
    out
}

/// A pending step in [`write_node`]'s explicit stack: open a branch's
/// parenthesis, emit a node's own `;`-properties, or close a branch's
/// parenthesis once its subtree is done.
enum Step {
    OpenParen,
    Node(NodeId),
    CloseParen,
}

/// Writes a node (`;` followed by its properties) and its subtree,
/// iteratively with an explicit stack so record depth never grows the call
/// stack (see spec's "deep tree recursion" design note).
fn write_node(tree: &GameTree, id: NodeId, out: &mut String) {
    let mut stack = vec![Step::Node(id)];
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::OpenParen => {
                out.push('(');
                continue;
            }
            Step::CloseParen => {
                out.push(')');
                continue;
            }
            Step::Node(id) => id,
        };

        out.push(';');
        for (tag, values) in tree.value(id).properties() {
            write_property(tag, values, out);
        }

        let children: Vec<NodeId> = tree
            .children_of(id)
            .iter()
            .copied()
            .filter(|&c| !is_resignation(tree.value(c)))
            .collect();

        match children.as_slice() {
            [] => {}
            [only] => stack.push(Step::Node(*only)),
            many => {
                // Push in reverse so the first child is processed first.
                for &child in many.iter().rev() {
                    stack.push(Step::CloseParen);
                    stack.push(Step::Node(child));
                    stack.push(Step::OpenParen);
                }
            }
        }
    }
}

fn write_property(tag: PropertyTag, values: &[String], out: &mut String) {
    write!(out, "{tag}").unwrap();
    for value in values {
        out.push('[');
        out.push_str(value);
        out.push(']');
    }
}
