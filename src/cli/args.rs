//! CLI argument definitions
//!
//! All Clap derive structs for `redlight` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Stop-on-red elimination game engine.
#[derive(Parser, Debug)]
#[command(name = "redlight", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "REDLIGHT_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(long, default_value = "human", global = true, env = "REDLIGHT_LOG_FORMAT")]
    pub log_format: OutputFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a game against a simulated world of bots.
    Simulate(SimulateArgs),

    /// Validate configuration files without running a game.
    Validate(ValidateArgs),

    /// Display version and build information.
    Version(VersionArgs),
}

// ============================================================================
// Simulate / Validate
// ============================================================================

/// Arguments for `simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the YAML game configuration (re-read at every start).
    #[arg(short, long, env = "REDLIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of bots to spawn inside the region.
    #[arg(short, long, default_value_t = 12)]
    pub bots: usize,

    /// How long to play, in seconds (0 runs until interrupted).
    #[arg(short, long, default_value_t = 30)]
    pub seconds: u64,

    /// RNG seed for the simulated world.
    #[arg(long, env = "REDLIGHT_SEED")]
    pub seed: Option<u64>,

    /// Fraction of bots that twitch during red.
    #[arg(long, default_value_t = 0.1, value_parser = parse_ratio)]
    pub careless: f64,

    /// Start in debug mode (nobody is actually eliminated).
    #[arg(long)]
    pub debug: bool,

    /// Read admin commands (start, stop, debug, track-movement, status) from stdin.
    #[arg(short, long)]
    pub interactive: bool,

    /// Write structured events as JSONL to this file.
    #[arg(long, env = "REDLIGHT_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "REDLIGHT_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Summary output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

fn parse_ratio(value: &str) -> Result<f64, String> {
    let ratio: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("{ratio} is not between 0 and 1"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_defaults() {
        let cli = Cli::try_parse_from(["redlight", "simulate"]).unwrap();
        let Commands::Simulate(args) = cli.command else {
            panic!("Expected SimulateArgs");
        };
        assert_eq!(args.bots, 12);
        assert_eq!(args.seconds, 30);
        assert!(!args.debug);
        assert!(!args.interactive);
        assert_eq!(args.format, OutputFormat::Human);
    }

    #[test]
    fn test_simulate_with_config_and_seed() {
        let cli = Cli::try_parse_from([
            "redlight", "simulate", "--config", "game.yaml", "--seed", "42", "--debug",
        ])
        .unwrap();
        let Commands::Simulate(args) = cli.command else {
            panic!("Expected SimulateArgs");
        };
        assert_eq!(args.config, Some(PathBuf::from("game.yaml")));
        assert_eq!(args.seed, Some(42));
        assert!(args.debug);
    }

    #[test]
    fn test_careless_ratio_bounds() {
        assert!(Cli::try_parse_from(["redlight", "simulate", "--careless", "0.5"]).is_ok());
        assert!(Cli::try_parse_from(["redlight", "simulate", "--careless", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["redlight", "simulate", "--careless", "lots"]).is_err());
    }

    #[test]
    fn test_validate_requires_files() {
        assert!(Cli::try_parse_from(["redlight", "validate"]).is_err());
        let cli = Cli::try_parse_from(["redlight", "validate", "a.yaml", "b.yaml", "--strict"])
            .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("Expected ValidateArgs");
        };
        assert_eq!(args.files.len(), 2);
        assert!(args.strict);
    }

    #[test]
    fn test_global_verbosity() {
        let cli = Cli::try_parse_from(["redlight", "-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Auto);
    }

    #[test]
    fn test_help_output() {
        let result = Cli::try_parse_from(["redlight", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let result = Cli::try_parse_from(["redlight", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
