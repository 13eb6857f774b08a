//! Error types for `redlight`
//!
//! The hierarchy separates caller-visible game rejections ([`GameError`])
//! from configuration loading failures ([`ConfigError`]) and maps both onto
//! process exit codes for the CLI.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `redlight` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Game operation rejected (already running, region not set)
    pub const GAME_ERROR: i32 = 5;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `redlight` operations.
///
/// Aggregates all domain-specific errors and provides a unified
/// interface for exit code mapping.
#[derive(Debug, Error)]
pub enum RedlightError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Game operation rejected
    #[error(transparent)]
    Game(#[from] GameError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RedlightError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Game(GameError::Config(_)) => ExitCode::CONFIG_ERROR,
            Self::Game(_) => ExitCode::GAME_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Game Errors
// ============================================================================

/// Rejections reported to the caller of an administrative entry point.
///
/// None of these are fatal: the session is left unchanged and the
/// operation can simply be retried once the condition is resolved.
#[derive(Debug, Error)]
pub enum GameError {
    /// The region is unset or degenerate, or no world could be resolved
    #[error("configuration invalid: {reason}")]
    ConfigurationInvalid {
        /// Why the configuration was rejected
        reason: String,
    },

    /// The configuration could not be loaded at all
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `start` was called while a game is running
    #[error("the game is already running")]
    AlreadyRunning,

    /// `stop` was called while no game is running
    #[error("the game is not currently running")]
    NotRunning,

    /// Manual tracking was toggled while the game loop owns the sampler
    #[error("movement tracking is controlled by the running game loop")]
    ControlledByGameLoop,

    /// The driver task owning the session has exited
    #[error("the game loop has shut down")]
    DriverStopped,
}

impl GameError {
    /// Short, stable label used for metrics and event payloads.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationInvalid { .. } | Self::Config(_) => "configuration_invalid",
            Self::AlreadyRunning => "already_running",
            Self::NotRunning => "not_running",
            Self::ControlledByGameLoop => "controlled_by_game_loop",
            Self::DriverStopped => "driver_stopped",
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Location in the configuration where it was referenced
        location: String,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "region.first")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Validation failure that prevents configuration from being used
    Error,
    /// Potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Command Errors
// ============================================================================

/// Administrative command text that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Nothing was typed
    #[error("no command given")]
    Empty,

    /// Quotes were not balanced
    #[error("unbalanced quotes in command")]
    Unbalanced,

    /// The verb is not a known command
    #[error("unknown command '{verb}'{}", suggestion_hint(.suggestion.as_deref()))]
    Unknown {
        /// Verb as typed
        verb: String,
        /// Closest known verb, if any is near
        suggestion: Option<String>,
    },

    /// The command takes an argument that was not given, or got extra ones
    #[error("'{verb}' expects {expected}")]
    WrongArity {
        /// Verb as typed
        verb: String,
        /// Argument description
        expected: &'static str,
    },

    /// A boolean argument was not recognized
    #[error("'{value}' is not a boolean (use true or false)")]
    InvalidBool {
        /// Value as typed
        value: String,
    },
}

fn suggestion_hint(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(", did you mean '{s}'?"))
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `redlight` operations.
pub type Result<T> = std::result::Result<T, RedlightError>;

// ============================================================================
// Tests
// ============================================================================
