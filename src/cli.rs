//! Command-line interface for voicedj
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Hotword-gated voice commands driving a music queue
#[derive(Parser, Debug)]
#[command(
    name = "voicedj",
    version,
    about = "Hotword-gated voice commands driving a music queue"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the voice command table
    Commands,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Run utterances through the full pipeline with scripted engines
    Simulate {
        /// What the speaker says after the hotword, one argument per utterance
        #[arg(required = true, value_name = "UTTERANCE")]
        utterances: Vec<String>,
        /// Do not fill an empty queue with related tracks
        #[arg(long)]
        no_autoplay: bool,
        /// Print one JSON object per event
        #[arg(long)]
        json: bool,
        /// Override the early cutoff window (e.g., 500ms, 1s)
        #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
        early_cutoff: Option<Duration>,
        /// Override the no-match timeout (e.g., 3s)
        #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
        no_match: Option<Duration>,
        /// Delay between scripted transcript updates
        #[arg(long, value_name = "DURATION", default_value = "80ms", value_parser = parse_duration)]
        step: Duration,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration (file plus environment overrides)
    Show,
    /// Write the default configuration to the configuration file path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse a duration string.
///
/// Supports any duration format accepted by `humantime` (`250ms`, `1s`,
/// `1m30s`); a bare number is taken as milliseconds.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let duration = match s.parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => humantime::parse_duration(s).map_err(|e| e.to_string())?,
    };
    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["voicedj"]).is_err());
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["voicedj", "commands"]).unwrap();
        assert!(matches!(cli.command, Commands::Commands));
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_verbose_repeated_flags() {
        let cli = Cli::try_parse_from(["voicedj", "-v", "-v", "commands"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["voicedj", "commands", "-vvv"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["voicedj", "config", "show", "--config", "/tmp/dj.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/dj.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn test_parse_config_init_force() {
        let cli = Cli::try_parse_from(["voicedj", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Init { force },
            } => assert!(force),
            other => panic!("Expected config init, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::try_parse_from(["voicedj", "simulate", "play daft punk", "pause"]).unwrap();
        match cli.command {
            Commands::Simulate {
                utterances,
                no_autoplay,
                json,
                early_cutoff,
                no_match,
                step,
            } => {
                assert_eq!(utterances, vec!["play daft punk", "pause"]);
                assert!(!no_autoplay);
                assert!(!json);
                assert!(early_cutoff.is_none());
                assert!(no_match.is_none());
                assert_eq!(step, Duration::from_millis(80));
            }
            other => panic!("Expected simulate, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simulate_requires_utterance() {
        assert!(Cli::try_parse_from(["voicedj", "simulate"]).is_err());
    }

    #[test]
    fn test_parse_simulate_durations() {
        let cli = Cli::try_parse_from([
            "voicedj",
            "simulate",
            "--early-cutoff",
            "1s",
            "--no-match",
            "2500",
            "--json",
            "--no-autoplay",
            "skip",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate {
                early_cutoff,
                no_match,
                json,
                no_autoplay,
                ..
            } => {
                assert_eq!(early_cutoff, Some(Duration::from_secs(1)));
                assert_eq!(no_match, Some(Duration::from_millis(2500)));
                assert!(json);
                assert!(no_autoplay);
            }
            other => panic!("Expected simulate, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_duration_formats() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration(" 100 "), Ok(Duration::from_millis(100)));
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["voicedj", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }
}
