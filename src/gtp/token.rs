//! Tokenizes one GTP input line into a command name, optional leading id,
//! and raw argument words. Typed literal parsing is deferred until a
//! candidate signature is known (see `dispatcher::match_signature`), since
//! a bare digit string is ambiguous between `Integer`, `Float`, and
//! `String` until the command table says which one it should be.

use crate::game::{Move, Stone, Vertex};

/// One GTP input line, split into words with any `#` comment and leading
/// id already peeled off.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: Option<u32>,
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    /// Parses a line per spec §6: text from `#` onward is a comment;
    /// blank or comment-only lines yield `None`; an optional leading
    /// integer is consumed as the response id rather than the name.
    pub fn parse_line(line: &str) -> Option<Self> {
        let without_comment = line.split('#').next().unwrap_or("");
        let mut words = without_comment.split_whitespace();
        let first = words.next()?;

        let (id, name) = match first.parse::<u32>() {
            Ok(id) => (Some(id), words.next()?.to_string()),
            Err(_) => (None, first.to_string()),
        };

        Some(Command { id, name, args: words.map(str::to_string).collect() })
    }
}

/// The closed set of literal kinds a command signature may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Integer,
    Float,
    Color,
    Vertex,
    String,
    /// A `Color` word immediately followed by a vertex/`pass`/`resign`
    /// word, coalesced into one [`Move`]. Grounded in the reference
    /// implementation's GTP tokenizer, which hands `play`'s handler a
    /// single already-built `Move` token rather than two positional ones.
    Move,
}

/// A parsed command argument, typed against the `ArgKind` of the
/// signature slot it matched.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Color(Stone),
    Vertex(Vertex),
    String(String),
    Move(Move),
}

pub fn parse_color(word: &str) -> Option<Stone> {
    match word.to_ascii_lowercase().as_str() {
        "b" | "black" => Some(Stone::Black),
        "w" | "white" => Some(Stone::White),
        _ => None,
    }
}

/// Parses a vertex token (`<letter><digits>`, letter skipping `I`) on a
/// board of the given side.
pub fn parse_vertex(word: &str, side: usize) -> Option<Vertex> {
    Vertex::from_gtp(word, side)
}

/// Reads one literal of `kind` starting at `words[*pos]`, advancing `pos`
/// past it (by 2 words for `Move`, 1 otherwise) on success. Leaves `pos`
/// untouched on a mismatch.
pub fn read_literal(words: &[String], pos: &mut usize, kind: ArgKind, side: usize) -> Option<Literal> {
    match kind {
        ArgKind::Integer => {
            let v = words.get(*pos)?.parse().ok()?;
            *pos += 1;
            Some(Literal::Integer(v))
        }
        ArgKind::Float => {
            let v = words.get(*pos)?.parse().ok()?;
            *pos += 1;
            Some(Literal::Float(v))
        }
        ArgKind::Color => {
            let v = parse_color(words.get(*pos)?)?;
            *pos += 1;
            Some(Literal::Color(v))
        }
        ArgKind::Vertex => {
            let v = parse_vertex(words.get(*pos)?, side)?;
            *pos += 1;
            Some(Literal::Vertex(v))
        }
        ArgKind::String => {
            let v = words.get(*pos)?.clone();
            *pos += 1;
            Some(Literal::String(v))
        }
        ArgKind::Move => {
            let color = parse_color(words.get(*pos)?)?;
            let vertex_word = words.get(*pos + 1)?;
            let mv = if vertex_word.eq_ignore_ascii_case("pass") {
                Move::Pass { color }
            } else if vertex_word.eq_ignore_ascii_case("resign") {
                Move::Resign { color }
            } else {
                let v = parse_vertex(vertex_word, side)?;
                Move::play(v.x, v.y, color)
            };
            *pos += 2;
            Some(Literal::Move(mv))
        }
    }
}

/// Matches `words` exactly against `signature`: every slot must parse and
/// no words may be left over. Used for both built-in argument checking and
/// user-registered command overload resolution.
pub fn match_signature(words: &[String], signature: &[ArgKind], side: usize) -> Option<Vec<Literal>> {
    let mut pos = 0;
    let mut out = Vec::with_capacity(signature.len());
    for &kind in signature {
        out.push(read_literal(words, &mut pos, kind, side)?);
    }
    (pos == words.len()).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_splits_id_name_and_args() {
        let cmd = Command::parse_line("17 play B D4").unwrap();
        assert_eq!(cmd.id, Some(17));
        assert_eq!(cmd.name, "play");
        assert_eq!(cmd.args, vec!["B".to_string(), "D4".to_string()]);
    }

    #[test]
    fn parse_line_without_id() {
        let cmd = Command::parse_line("boardsize 9").unwrap();
        assert_eq!(cmd.id, None);
        assert_eq!(cmd.name, "boardsize");
        assert_eq!(cmd.args, vec!["9".to_string()]);
    }

    #[test]
    fn parse_line_strips_comments_and_ignores_blank_lines() {
        assert_eq!(Command::parse_line("# just a comment"), None);
        assert_eq!(Command::parse_line("   "), None);
        let cmd = Command::parse_line("quit # bye").unwrap();
        assert_eq!(cmd.name, "quit");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn move_literal_coalesces_color_and_vertex() {
        let words = vec!["B".to_string(), "D4".to_string()];
        let mut pos = 0;
        let lit = read_literal(&words, &mut pos, ArgKind::Move, 9).unwrap();
        assert_eq!(pos, 2);
        assert_eq!(lit, Literal::Move(Move::play(3, 5, Stone::Black)));
    }

    #[test]
    fn move_literal_accepts_pass_and_resign_keywords() {
        let words = vec!["w".to_string(), "pass".to_string()];
        let mut pos = 0;
        assert_eq!(
            read_literal(&words, &mut pos, ArgKind::Move, 9),
            Some(Literal::Move(Move::Pass { color: Stone::White }))
        );
    }

    #[test]
    fn match_signature_rejects_trailing_words() {
        let words = vec!["9".to_string(), "extra".to_string()];
        assert_eq!(match_signature(&words, &[ArgKind::Integer], 9), None);
    }
}
