use pest_consume::{Parser, match_nodes};

use crate::error::SgfError;
use crate::sgf::node::{PropertyTag, SGFNode};
use crate::sgf::tree::{GameTree, NodeId};

type Node<'i> = pest_consume::Node<'i, Rule, ()>;
type ParseResult<T> = std::result::Result<T, pest_consume::Error<Rule>>;

/// One `(identifier, values)` pair as read straight off the wire, before the
/// identifier has been resolved against the closed tag set.
type RawProperty = (String, Vec<String>);

/// Recursive intermediate representation that mirrors the SGF grammar.
/// Private to this module — callers only ever see a resolved [`GameTree`].
struct ParsedObject {
    nodes: Vec<Vec<RawProperty>>,
    children: Vec<ParsedObject>,
}

#[derive(Parser)]
#[grammar = "sgf.pest"]
struct SGFParser;

#[pest_consume::parser]
impl SGFParser {
    fn EOI(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn node_value(input: Node) -> ParseResult<String> {
        Ok(input.as_str().to_string())
    }

    fn prop_ident(input: Node) -> ParseResult<String> {
        Ok(input.as_str().to_string())
    }

    fn property(input: Node) -> ParseResult<RawProperty> {
        let mut children = input.into_children();
        let ident_node = children.next().expect("property must have prop_ident");
        let ident = Self::prop_ident(ident_node)?;
        let values: Vec<String> = children
            .map(Self::node_value)
            .collect::<ParseResult<Vec<_>>>()?;
        Ok((ident, values))
    }

    fn node(input: Node) -> ParseResult<Vec<RawProperty>> {
        match_nodes!(input.into_children();
            [property(props)..] => Ok(props.collect())
        )
    }

    fn object(input: Node) -> ParseResult<ParsedObject> {
        let mut nodes = Vec::new();
        let mut children = Vec::new();

        for child in input.into_children() {
            match child.as_rule() {
                Rule::node => nodes.push(Self::node(child)?),
                Rule::object => children.push(Self::object(child)?),
                _ => {}
            }
        }

        Ok(ParsedObject { nodes, children })
    }

    fn file(input: Node) -> ParseResult<Vec<ParsedObject>> {
        match_nodes!(input.into_children();
            [object(trees).., EOI(_)] => Ok(trees.collect())
        )
    }
}

/// The file-format version declared by a record's root node, defaulting to
/// 1 when absent, per the parser contract.
fn declared_ff(root_props: &[RawProperty]) -> u8 {
    root_props
        .iter()
        .find(|(ident, _)| ident == "FF")
        .and_then(|(_, values)| values.first())
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
}

/// Resolves one node's raw properties against the closed tag set, checking
/// each against the record's declared file format.
fn resolve_node(raw: Vec<RawProperty>, ff: u8) -> Result<SGFNode, SgfError> {
    let mut node = SGFNode::new();
    for (ident, values) in raw {
        let tag: PropertyTag = ident
            .parse()
            .map_err(|()| SgfError::UnknownProperty(ident.clone()))?;
        if tag.min_ff() > ff {
            return Err(SgfError::PropertyNotValidInFF(ident, ff));
        }
        node.set_property(tag, values);
    }
    Ok(node)
}

/// Checks the root's `GM` property, if present, is `1` (Go).
fn check_is_go_game(root_props: &[RawProperty]) -> Result<(), SgfError> {
    if let Some((_, values)) = root_props.iter().find(|(ident, _)| ident == "GM") {
        if values.first().map(String::as_str) != Some("1") {
            return Err(SgfError::NotAGoGame);
        }
    }
    Ok(())
}

/// Builds one [`GameTree`] per top-level `(...)` record, resolving and
/// validating every property along the way.
fn ingest(parsed: ParsedObject) -> Result<Option<GameTree>, SgfError> {
    let Some(first_node_props) = parsed.nodes.first() else {
        return Ok(None);
    };

    check_is_go_game(first_node_props)?;
    let ff = declared_ff(first_node_props);

    let mut nodes = parsed.nodes.into_iter();
    let root_value = resolve_node(nodes.next().unwrap(), ff)?;
    let mut tree = GameTree::new(root_value);

    for raw in nodes {
        tree.insert_as_child(resolve_node(raw, ff)?);
    }

    ingest_children(&mut tree, parsed.children, ff)?;
    tree.advance_to_root();
    Ok(Some(tree))
}

fn ingest_children(tree: &mut GameTree, children: Vec<ParsedObject>, ff: u8) -> Result<(), SgfError> {
    let base_cursor = tree.current();
    for child in children {
        let mut nodes = child.nodes.into_iter();
        let Some(first) = nodes.next() else { continue };
        tree.insert_as_child(resolve_node(first, ff)?);
        for raw in nodes {
            tree.insert_as_child(resolve_node(raw, ff)?);
        }
        ingest_children(tree, child.children, ff)?;
        rewind_to(tree, base_cursor);
    }
    Ok(())
}

fn rewind_to(tree: &mut GameTree, cursor: NodeId) {
    while tree.current() != cursor {
        if tree.step_up().is_err() {
            break;
        }
    }
}

/// Parses SGF text into one [`GameTree`] per top-level game record.
pub fn parse_sgf(input: &str) -> Result<Vec<GameTree>, SgfError> {
    if input.trim().is_empty() {
        return Err(SgfError::Empty);
    }

    let inputs = SGFParser::parse(Rule::file, input).map_err(classify_pest_error)?;
    let root = inputs.single().map_err(classify_pest_error)?;
    let parsed_objects = SGFParser::file(root).map_err(classify_pest_error)?;

    let mut trees = Vec::with_capacity(parsed_objects.len());
    for parsed in parsed_objects {
        if let Some(tree) = ingest(parsed)? {
            trees.push(tree);
        }
    }
    Ok(trees)
}

fn classify_pest_error(e: pest_consume::Error<Rule>) -> SgfError {
    use pest::error::InputLocation;
    match e.location {
        InputLocation::Pos(pos) if pos == 0 => SgfError::ExtraBracket,
        _ => SgfError::MissingParen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(parse_sgf("").unwrap_err(), SgfError::Empty);
    }

    #[test]
    fn minimal_game_parses_to_a_single_tree() {
        let trees = parse_sgf("(;GM[1]FF[4]SZ[9];B[dd];W[pd])").unwrap();
        assert_eq!(trees.len(), 1);
        let tree = &trees[0];
        assert_eq!(
            tree.value(tree.root()).get_property(PropertyTag::SZ),
            Some(&["9".to_string()][..])
        );
    }

    #[test]
    fn non_go_game_is_rejected() {
        let err = parse_sgf("(;GM[2]FF[4])").unwrap_err();
        assert_eq!(err, SgfError::NotAGoGame);
    }

    #[test]
    fn unknown_property_is_rejected() {
        let err = parse_sgf("(;GM[1]FF[4]ZZ[x])").unwrap_err();
        assert_eq!(err, SgfError::UnknownProperty("ZZ".to_string()));
    }

    #[test]
    fn ru_property_requires_ff_four() {
        let err = parse_sgf("(;GM[1]FF[1]RU[Chinese])").unwrap_err();
        assert_eq!(err, SgfError::PropertyNotValidInFF("RU".to_string(), 1));
    }

    #[test]
    fn branching_game_tree_parses_both_variations() {
        let trees = parse_sgf("(;GM[1]FF[4]SZ[19];B[dd](;W[pd])(;W[dp]))").unwrap();
        let tree = &trees[0];
        // root -> B[dd] -> two children
        assert_eq!(tree.children().len(), 1);
    }

    #[test]
    fn escaped_bracket_does_not_end_the_value_early() {
        let trees = parse_sgf(r"(;GM[1]FF[4]C[a \] b])").unwrap();
        let tree = &trees[0];
        let c = tree.value(tree.root()).get_property(PropertyTag::C).unwrap();
        assert_eq!(c[0], r"a \] b");
    }
}
