//! Administrative command surface.
//!
//! Parses operator text (`start`, `stop`, `track-movement <bool>`,
//! `debug <bool>`) into [`AdminCommand`] and turns the outcome of running
//! it into the reply shown to the operator. Authorization is the host's
//! job and happens before a command reaches this module.

use std::fmt;

use crate::engine::GameSession;
use crate::error::{CommandError, GameError};
use crate::host::Host;

/// One-line usage summary.
pub const USAGE: &str = "usage: <start|stop|track-movement <true|false>|debug <true|false>>";

const VERBS: [&str; 4] = ["start", "stop", "track-movement", "debug"];

/// A parsed administrative command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Start a game
    Start,
    /// Stop the running game
    Stop,
    /// Manually enable or disable movement tracking
    TrackMovement(bool),
    /// Enable or disable debug mode
    Debug(bool),
}

impl AdminCommand {
    /// Parses one command line.
    ///
    /// Verbs are case-insensitive; arguments follow shell quoting rules.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing why the line is not a command.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let tokens = shlex::split(line).ok_or(CommandError::Unbalanced)?;
        let Some((verb, args)) = tokens.split_first() else {
            return Err(CommandError::Empty);
        };
        let normalized = verb.to_ascii_lowercase();

        match (normalized.as_str(), args) {
            ("start", []) => Ok(Self::Start),
            ("stop", []) => Ok(Self::Stop),
            ("track-movement", [value]) => parse_bool(value).map(Self::TrackMovement),
            ("debug", [value]) => parse_bool(value).map(Self::Debug),
            ("start" | "stop", _) => Err(CommandError::WrongArity {
                verb: verb.clone(),
                expected: "no arguments",
            }),
            ("track-movement" | "debug", _) => Err(CommandError::WrongArity {
                verb: verb.clone(),
                expected: "exactly one argument: true or false",
            }),
            _ => Err(CommandError::Unknown {
                verb: verb.clone(),
                suggestion: suggest_verb(&normalized),
            }),
        }
    }

    /// Runs the command against `session` and renders the reply.
    pub fn execute<H: Host>(self, session: &mut GameSession<H>) -> Reply {
        match self {
            Self::Start => match session.start() {
                Ok(world) => Reply::ok(format!(
                    "Red Light, Green Light game started in world '{world}'!"
                )),
                Err(err) => Reply::rejected(&err),
            },
            Self::Stop => match session.stop() {
                Ok(()) => Reply::ok("Red Light, Green Light game stopped!"),
                Err(err) => Reply::rejected(&err),
            },
            Self::TrackMovement(enabled) => match session.set_tracking(enabled) {
                Ok(_) if enabled => Reply::ok("Movement tracking enabled."),
                Ok(_) => Reply::ok("Movement tracking disabled."),
                Err(err) => Reply::rejected(&err),
            },
            Self::Debug(enabled) => {
                session.set_debug(enabled);
                Reply::ok(if enabled { "Debug enabled." } else { "Debug disabled." })
            }
        }
    }
}

/// Text shown to the operator after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Whether the command took effect
    pub success: bool,
    /// Message body
    pub text: String,
}

impl Reply {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    /// Renders a rejection in operator wording.
    #[must_use]
    pub fn rejected(err: &GameError) -> Self {
        let text = match err {
            GameError::AlreadyRunning => {
                "The game is already running. Use stop first.".to_string()
            }
            GameError::NotRunning => "The game is not currently running.".to_string(),
            GameError::ControlledByGameLoop => {
                "This command is controlled by the game loop. Use stop to manage tracking manually."
                    .to_string()
            }
            GameError::ConfigurationInvalid { reason } => {
                format!("Configuration invalid: {reason}.")
            }
            other => format!("Rejected: {other}."),
        };
        Self {
            success: false,
            text,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn parse_bool(value: &str) -> Result<bool, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => Ok(true),
        "false" | "off" | "no" => Ok(false),
        _ => Err(CommandError::InvalidBool {
            value: value.to_string(),
        }),
    }
}

/// Closest known verb within a Damerau-Levenshtein distance of 3.
fn suggest_verb(input: &str) -> Option<String> {
    VERBS
        .iter()
        .map(|verb| (*verb, strsim::damerau_levenshtein(input, verb)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(verb, _)| verb.to_string())
}
