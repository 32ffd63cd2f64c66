//! The GTP command dispatcher: a line in, a framed response out. Built-in
//! commands are matched directly by name; anything else falls through to
//! the user-registered extension table, which resolves overloads by
//! argument-shape signature the way the built-ins are specified in the
//! design (one name can have several accepted shapes).

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::GtpError;
use crate::game::{Board, Move, Rules, Stone, Vertex};
use crate::goban::GoGame;
use crate::gtp::token::{ArgKind, Command, Literal, match_signature, read_literal};
use crate::sgf::parse_sgf;

pub const PROTOCOL_VERSION: &str = "2";

/// A pluggable move generator, consulted by `genmove`. An engine with none
/// registered reports `genmove` as unimplemented, matching the reference
/// engine's behavior rather than guessing at a move.
pub trait MoveGenerator {
    fn generate(&mut self, game: &GoGame, color: Stone) -> Move;
}

/// A user-registered custom command. Receives the arguments already typed
/// against the signature it was registered under.
pub trait UserCommand {
    fn invoke(&mut self, game: &mut GoGame, args: &[Literal]) -> Result<String, String>;
}

type CustomEntry = (Vec<ArgKind>, Box<dyn UserCommand>);

const BUILTIN_NAMES: &[&str] = &[
    "protocol_version",
    "name",
    "version",
    "known_command",
    "list_commands",
    "quit",
    "boardsize",
    "clear_board",
    "komi",
    "play",
    "genmove",
    "showboard",
    "undo",
    "gg-undo",
    "loadsgf",
];

/// Owns the live game plus the dispatcher lifecycle flag and extension
/// surface. One instance serves one GTP session.
pub struct Dispatcher {
    game: GoGame,
    active: bool,
    engine_name: String,
    engine_version: String,
    generator: Option<Box<dyn MoveGenerator>>,
    custom: HashMap<String, Vec<CustomEntry>>,
}

impl Dispatcher {
    pub fn new(
        engine_name: impl Into<String>,
        engine_version: impl Into<String>,
        side: usize,
        rules: Rules,
        komi: f64,
    ) -> Self {
        Dispatcher {
            game: GoGame::new(side, rules, komi),
            active: true,
            engine_name: engine_name.into(),
            engine_version: engine_version.into(),
            generator: None,
            custom: HashMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn game(&self) -> &GoGame {
        &self.game
    }

    pub fn set_move_generator(&mut self, generator: impl MoveGenerator + 'static) {
        self.generator = Some(Box::new(generator));
    }

    /// Registers a user-defined command under `name`/`signature`. Fails if
    /// `name` names one of the required built-ins, which cannot be
    /// shadowed.
    pub fn register_command(
        &mut self,
        name: &str,
        signature: Vec<ArgKind>,
        handler: impl UserCommand + 'static,
    ) -> Result<(), GtpError> {
        if BUILTIN_NAMES.contains(&name) {
            return Err(GtpError::BadArguments(vec![format!("{name:?} is a built-in command")]));
        }
        self.custom.entry(name.to_string()).or_default().push((signature, Box::new(handler)));
        Ok(())
    }

    fn known_commands(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN_NAMES.iter().map(|s| s.to_string()).collect();
        names.extend(self.custom.keys().cloned());
        names.sort();
        names
    }

    /// Runs one line of input, returning the framed response text. Blank
    /// and comment-only lines produce no output at all, per spec §6.
    pub fn execute_line(&mut self, line: &str) -> String {
        let Some(command) = Command::parse_line(line) else {
            return String::new();
        };
        debug!("dispatching {command:?}");
        let result = self.dispatch(&command);
        if let Err(err) = &result {
            warn!("command {:?} failed: {err}", command.name);
        }
        frame_response(command.id, result)
    }

    fn dispatch(&mut self, command: &Command) -> Result<String, GtpError> {
        match command.name.as_str() {
            "protocol_version" => Ok(PROTOCOL_VERSION.to_string()),
            "name" => Ok(self.engine_name.clone()),
            "version" => Ok(self.engine_version.clone()),
            "known_command" => self.known_command(command),
            "list_commands" => Ok(self.known_commands().join("\n")),
            "quit" => {
                self.active = false;
                Ok(String::new())
            }
            "boardsize" => self.boardsize(command),
            "clear_board" => {
                self.game.reset();
                Ok(String::new())
            }
            "komi" => self.komi(command),
            "play" => self.play(command),
            "genmove" => self.genmove(command),
            "showboard" => Ok(format!("\n{}", self.game.board())),
            "undo" => {
                self.game.step_up(1).map_err(|_| GtpError::CannotUndo)?;
                Ok(String::new())
            }
            "gg-undo" => self.gg_undo(command),
            "loadsgf" => self.loadsgf(command),
            name => self.dispatch_custom(name, command),
        }
    }

    fn known_command(&self, command: &Command) -> Result<String, GtpError> {
        let [name] = command.args.as_slice() else {
            return Err(GtpError::BadArguments(vec!["string".to_string()]));
        };
        Ok(self.known_commands().contains(name).to_string())
    }

    fn boardsize(&mut self, command: &Command) -> Result<String, GtpError> {
        let mut pos = 0;
        let side = match read_literal(&command.args, &mut pos, ArgKind::Integer, self.game.side()) {
            Some(Literal::Integer(v)) if pos == command.args.len() => v,
            _ => return Err(GtpError::BadArguments(vec!["integer".to_string()])),
        };
        let side = usize::try_from(side).ok().filter(|s| Board::VALID_SIDES.contains(s));
        let Some(side) = side else { return Err(GtpError::UnacceptableSize) };
        self.game = GoGame::new(side, self.game.rules(), self.game.komi());
        Ok(String::new())
    }

    fn komi(&mut self, command: &Command) -> Result<String, GtpError> {
        let mut pos = 0;
        match read_literal(&command.args, &mut pos, ArgKind::Float, self.game.side()) {
            Some(Literal::Float(v)) if pos == command.args.len() => {
                self.game.set_komi(v);
                Ok(String::new())
            }
            _ => Err(GtpError::BadArguments(vec!["float".to_string()])),
        }
    }

    fn play(&mut self, command: &Command) -> Result<String, GtpError> {
        let side = self.game.side();
        let mut pos = 0;
        let mv = match read_literal(&command.args, &mut pos, ArgKind::Move, side) {
            Some(Literal::Move(mv)) if pos == command.args.len() => mv,
            _ => return Err(GtpError::BadArguments(vec!["color vertex".to_string()])),
        };

        match mv {
            // per spec: try as a play first, fall back to a setup add, and
            // only then report the move as illegal.
            Move::Play { .. } if self.game.is_legal(mv) => {
                self.game.play(mv).map_err(|_| GtpError::IllegalMove)?;
            }
            Move::Play { .. } if self.game.is_add_legal(mv) => {
                self.game.add(mv).map_err(|_| GtpError::IllegalMove)?;
            }
            Move::Pass { .. } | Move::Resign { .. } => {
                self.game.play(mv).map_err(|_| GtpError::IllegalMove)?;
            }
            _ => return Err(GtpError::IllegalMove),
        }
        Ok(String::new())
    }

    fn genmove(&mut self, command: &Command) -> Result<String, GtpError> {
        let mut pos = 0;
        let color = match read_literal(&command.args, &mut pos, ArgKind::Color, self.game.side()) {
            Some(Literal::Color(color)) if pos == command.args.len() => color,
            _ => return Err(GtpError::BadArguments(vec!["color".to_string()])),
        };
        let Some(generator) = self.generator.as_mut() else {
            return Err(GtpError::BadArguments(vec!["genmove is not implemented by this engine".to_string()]));
        };
        let mv = generator.generate(&self.game, color);
        self.game.play(mv).map_err(|_| GtpError::IllegalMove)?;
        Ok(move_text(mv, self.game.side()))
    }

    fn gg_undo(&mut self, command: &Command) -> Result<String, GtpError> {
        let mut pos = 0;
        let steps = match read_literal(&command.args, &mut pos, ArgKind::Integer, self.game.side()) {
            Some(Literal::Integer(v)) if pos == command.args.len() && v >= 0 => v as usize,
            _ => return Err(GtpError::BadArguments(vec!["integer".to_string()])),
        };
        self.game.step_up(steps).map_err(|_| GtpError::CannotUndo)?;
        Ok(String::new())
    }

    /// Loads SGF text, parses it into a fresh [`GoGame`], and replays
    /// either the whole default line (`loadsgf <text>`) or a prefix of it
    /// (`loadsgf <text> <count>`). The original engine this is grounded on
    /// reads `<text>` as a file path; per this crate's scope (see
    /// `DESIGN.md`) it is the SGF content itself.
    fn loadsgf(&mut self, command: &Command) -> Result<String, GtpError> {
        let Some(text) = command.args.first() else {
            return Err(GtpError::BadArguments(vec!["string".to_string(), "string integer".to_string()]));
        };
        let tree = parse_sgf(text)
            .ok()
            .and_then(|mut trees| (!trees.is_empty()).then(|| trees.remove(0)))
            .ok_or(GtpError::CannotLoadFile)?;
        let mut game = GoGame::from_tree(tree).map_err(|_| GtpError::CannotLoadFile)?;

        match command.args.get(1) {
            None => game.play_default_sequence(),
            Some(raw) => {
                let count: usize = raw.parse().map_err(|_| GtpError::BadArguments(vec!["integer".to_string()]))?;
                let prefix: Vec<Move> = game.default_sequence().into_iter().take(count).collect();
                game.play_move_sequence(&prefix).map_err(|_| GtpError::CannotLoadFile)?;
            }
        }

        self.game = game;
        Ok(String::new())
    }

    fn dispatch_custom(&mut self, name: &str, command: &Command) -> Result<String, GtpError> {
        let side = self.game.side();
        let Some(entries) = self.custom.get(name) else {
            return Err(GtpError::UnknownCommand(name.to_string()));
        };

        let matched = entries
            .iter()
            .enumerate()
            .find_map(|(i, (sig, _))| match_signature(&command.args, sig, side).map(|args| (i, args)));

        let Some((index, args)) = matched else {
            let accepted: Vec<String> = entries.iter().map(|(sig, _)| format!("{sig:?}")).collect();
            return Err(GtpError::BadArguments(accepted));
        };

        let handler = &mut self.custom.get_mut(name).expect("just looked this name up")[index].1;
        handler.invoke(&mut self.game, &args).map_err(|msg| GtpError::BadArguments(vec![msg]))
    }
}

/// Formats a move the way `genmove`'s response reports it: GTP vertex text
/// for a play, or the bare keyword for a pass/resignation.
fn move_text(mv: Move, side: usize) -> String {
    match mv {
        Move::Play { x, y, .. } => Vertex::new(x, y).to_gtp(side),
        Move::Pass { .. } => "pass".to_string(),
        Move::Resign { .. } => "resign".to_string(),
        Move::Null => String::new(),
    }
}

/// Frames a command's outcome per spec §8 scenario 6: `=<id><payload>\n\n`
/// on success, `?<id><message>\n\n` on failure. Commands whose payload is
/// naturally empty (most setup/lifecycle commands) produce `=\n\n`
/// unadorned; `showboard`'s payload supplies its own leading newline.
fn frame_response(id: Option<u32>, result: Result<String, GtpError>) -> String {
    let id_str = id.map(|n| n.to_string()).unwrap_or_default();
    match result {
        Ok(payload) => format!("={id_str}{payload}\n\n"),
        Err(err) => format!("?{id_str}{err}\n\n"),
    }
}
