use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

use anyhow::{Context, Result, bail, ensure};

/// Encodes Go board coordinates as two lowercase letters from a-s.
/// Stored as two 5-bit values packed into a u16:
/// bits [4:0] = first (column), bits [9:5] = second (row).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GoCoord(u16);

impl GoCoord {
    pub fn new(a: char, b: char) -> Result<Self> {
        let encode = |c: char| -> Option<u16> {
            if c.is_ascii_lowercase() {
                let v = c as u16 - b'a' as u16;
                if v < 19 { Some(v) } else { None }
            } else {
                None
            }
        };

        let a = encode(a).context(format!("Invalid Go coordinate: first char {:?}", a))?;
        let b = encode(b).context(format!("Invalid Go coordinate: second char {:?}", b))?;

        Ok(Self(a | (b << 5)))
    }

    /// Construct a GoCoord from (col, row) 0-based indices.
    /// `col` maps to the first SGF character, `row` to the second.
    pub fn from_colrow(col: usize, row: usize) -> Self {
        Self(col as u16 | ((row as u16) << 5))
    }

    /// The conventional SGF pass coordinate `tt` (index 19 in each axis).
    pub fn pass() -> Self {
        Self(19 | (19 << 5))
    }

    pub fn is_pass(self) -> bool {
        (self.0 & 0b11111) == 19
    }

    pub fn col(self) -> usize {
        (self.0 & 0b11111) as usize
    }

    pub fn row(self) -> usize {
        ((self.0 >> 5) & 0b11111) as usize
    }

    pub fn first(self) -> char {
        (b'a' + (self.0 & 0b11111) as u8) as char
    }

    pub fn second(self) -> char {
        (b'a' + ((self.0 >> 5) & 0b11111) as u8) as char
    }
}

impl Display for GoCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.first(), self.second())
    }
}

impl FromStr for GoCoord {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let a = chars
            .next()
            .context(format!("Invalid Go coordinate {:?}: too short", s))?;
        let b = chars
            .next()
            .context(format!("Invalid Go coordinate {:?}: too short", s))?;

        ensure!(
            chars.next().is_none(),
            format!("Invalid Go coordinate {:?}: too long", s)
        );

        Self::new(a, b)
    }
}

/// The closed set of SGF property identifiers this crate understands.
/// Anything else is rejected by the parser as `SgfError::UnknownProperty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyTag {
    /// File format version (root only).
    FF,
    /// Game type; must be `1` (Go) for this crate to accept the record.
    GM,
    /// Board side length.
    SZ,
    /// Scoring ruleset name (root only). Not part of the original FF[4]
    /// property set; see `DESIGN.md` for why this crate adds it.
    RU,
    /// Komi, in points.
    KM,
    /// Game result, e.g. `B+3.5`, `W+R`.
    RE,
    /// Black player name.
    PB,
    /// White player name.
    PW,
    /// Creation date.
    DT,
    /// Application that produced the record.
    AP,
    /// Text encoding of property values.
    CA,
    /// Add black stones (setup, does not advance the move count).
    AB,
    /// Add white stones (setup).
    AW,
    /// Add empty (remove stones, setup).
    AE,
    /// Black move.
    B,
    /// White move.
    W,
    /// Node comment.
    C,
    /// Node name.
    N,
}

impl PropertyTag {
    /// Every tag this crate recognizes, in a stable order used for writing.
    pub const ALL: [PropertyTag; 18] = [
        PropertyTag::FF,
        PropertyTag::GM,
        PropertyTag::SZ,
        PropertyTag::RU,
        PropertyTag::KM,
        PropertyTag::RE,
        PropertyTag::PB,
        PropertyTag::PW,
        PropertyTag::DT,
        PropertyTag::AP,
        PropertyTag::CA,
        PropertyTag::AB,
        PropertyTag::AW,
        PropertyTag::AE,
        PropertyTag::B,
        PropertyTag::W,
        PropertyTag::C,
        PropertyTag::N,
    ];

    /// True for properties only meaningful (and only emitted) on the root
    /// node: game-level metadata rather than per-move data.
    pub fn is_root_only(self) -> bool {
        matches!(
            self,
            PropertyTag::FF
                | PropertyTag::GM
                | PropertyTag::SZ
                | PropertyTag::RU
                | PropertyTag::KM
                | PropertyTag::RE
                | PropertyTag::PB
                | PropertyTag::PW
                | PropertyTag::DT
                | PropertyTag::AP
                | PropertyTag::CA
        )
    }

    /// True for `B`/`W`: a node may carry at most one of these.
    pub fn is_move(self) -> bool {
        matches!(self, PropertyTag::B | PropertyTag::W)
    }

    /// The file-format version in which this property was introduced.
    /// Used to validate a node's properties against the record's FF value.
    pub fn min_ff(self) -> u8 {
        match self {
            PropertyTag::RU | PropertyTag::AE => 4,
            _ => 1,
        }
    }
}

impl Display for PropertyTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PropertyTag::FF => "FF",
            PropertyTag::GM => "GM",
            PropertyTag::SZ => "SZ",
            PropertyTag::RU => "RU",
            PropertyTag::KM => "KM",
            PropertyTag::RE => "RE",
            PropertyTag::PB => "PB",
            PropertyTag::PW => "PW",
            PropertyTag::DT => "DT",
            PropertyTag::AP => "AP",
            PropertyTag::CA => "CA",
            PropertyTag::AB => "AB",
            PropertyTag::AW => "AW",
            PropertyTag::AE => "AE",
            PropertyTag::B => "B",
            PropertyTag::W => "W",
            PropertyTag::C => "C",
            PropertyTag::N => "N",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PropertyTag {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        Ok(match s {
            "FF" => PropertyTag::FF,
            "GM" => PropertyTag::GM,
            "SZ" => PropertyTag::SZ,
            "RU" => PropertyTag::RU,
            "KM" => PropertyTag::KM,
            "RE" => PropertyTag::RE,
            "PB" => PropertyTag::PB,
            "PW" => PropertyTag::PW,
            "DT" => PropertyTag::DT,
            "AP" => PropertyTag::AP,
            "CA" => PropertyTag::CA,
            "AB" => PropertyTag::AB,
            "AW" => PropertyTag::AW,
            "AE" => PropertyTag::AE,
            "B" => PropertyTag::B,
            "W" => PropertyTag::W,
            "C" => PropertyTag::C,
            "N" => PropertyTag::N,
            _ => return Err(()),
        })
    }
}

/// A single node of an SGF game tree: an unordered bag of properties, each
/// mapping to one or more raw values. A node carries at most one move
/// property (`B` or `W`); everything else is just data the caller
/// interprets (`GoGame` is the caller that gives these values meaning).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SGFNode {
    properties: BTreeMap<PropertyTag, Vec<String>>,
}

impl SGFNode {
    pub fn new() -> Self {
        SGFNode::default()
    }

    pub fn has_property(&self, tag: PropertyTag) -> bool {
        self.properties.contains_key(&tag)
    }

    pub fn get_property(&self, tag: PropertyTag) -> Option<&[String]> {
        self.properties.get(&tag).map(Vec::as_slice)
    }

    pub fn set_property(&mut self, tag: PropertyTag, values: Vec<String>) {
        self.properties.insert(tag, values);
    }

    pub fn append_property(&mut self, tag: PropertyTag, value: String) {
        self.properties.entry(tag).or_default().push(value);
    }

    pub fn remove_property(&mut self, tag: PropertyTag) -> Option<Vec<String>> {
        self.properties.remove(&tag)
    }

    /// Iterates properties in a stable, writer-friendly order.
    pub fn properties(&self) -> impl Iterator<Item = (PropertyTag, &[String])> {
        self.properties.iter().map(|(&tag, values)| (tag, values.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The move carried by this node, if any. Fails if both `B` and `W` are
    /// present (malformed) by preferring `B`, matching the "at most one
    /// move" invariant callers are expected to uphold.
    pub fn move_tag(&self) -> Option<PropertyTag> {
        if self.has_property(PropertyTag::B) {
            Some(PropertyTag::B)
        } else if self.has_property(PropertyTag::W) {
            Some(PropertyTag::W)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gocoord_round_trips_through_display_and_from_str() {
        let coord = GoCoord::from_colrow(3, 4);
        let text = coord.to_string();
        let parsed: GoCoord = text.parse().unwrap();
        assert_eq!(coord, parsed);
    }

    #[test]
    fn gocoord_pass_is_tt() {
        assert_eq!(GoCoord::pass().to_string(), "tt");
        assert!(GoCoord::pass().is_pass());
    }

    #[test]
    fn property_tag_round_trips_through_display_and_from_str() {
        for tag in PropertyTag::ALL {
            let parsed: PropertyTag = tag.to_string().parse().unwrap();
            assert_eq!(parsed, tag);
        }
    }

    #[test]
    fn unknown_tag_text_fails_to_parse() {
        assert!("ZZ".parse::<PropertyTag>().is_err());
    }

    #[test]
    fn node_tracks_properties_and_move_tag() {
        let mut node = SGFNode::new();
        assert!(node.is_empty());
        node.set_property(PropertyTag::B, vec!["pd".to_string()]);
        assert_eq!(node.move_tag(), Some(PropertyTag::B));
        assert!(node.has_property(PropertyTag::B));
        assert_eq!(node.get_property(PropertyTag::B), Some(&["pd".to_string()][..]));
    }

    #[test]
    fn append_property_accumulates_values() {
        let mut node = SGFNode::new();
        node.append_property(PropertyTag::AB, "pd".to_string());
        node.append_property(PropertyTag::AB, "dp".to_string());
        assert_eq!(node.get_property(PropertyTag::AB).unwrap().len(), 2);
    }
}
