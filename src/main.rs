use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use voicedj::cli::{Cli, Commands, ConfigAction};
use voicedj::config::Config;
use voicedj::dispatch::Cue;
use voicedj::player::controller::PlaybackEvent;
use voicedj::recognition::listener::RecognitionEvent;
use voicedj::simulate::{self, SimulationEvent, SimulationOptions, SimulationReport};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Commands => {
            let config = load_config(cli.config.as_deref())?;
            print_commands(&config);
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Simulate {
            utterances,
            no_autoplay,
            json,
            early_cutoff,
            no_match,
            step,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if no_autoplay {
                config.playback.autoplay = false;
            }
            if let Some(cutoff) = early_cutoff {
                config.recognition.early_cutoff_ms = millis(cutoff);
            }
            if let Some(timeout) = no_match {
                config.recognition.no_match_ms = millis(timeout);
            }
            let options = SimulationOptions {
                utterances,
                step,
            };
            let report = simulate::run(&config, options)
                .await
                .context("Simulation failed")?;
            if json {
                print_report_json(&report)?;
            } else {
                print_report(&report);
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "voicedj", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over the verbosity flags.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Load config from custom path or default location.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        // Missing default file falls back to defaults
        Config::load_or_default(&Config::default_path()?)?
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn config_path(custom_path: Option<&Path>) -> Result<PathBuf> {
    match custom_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Config::default_path()?),
    }
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    let path = config_path(custom_path)?;

    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            let toml = toml::to_string_pretty(&config).context("Failed to render config")?;
            print!("{}", toml);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            println!("{} {}", "Wrote".green(), path.display());
        }
    }
    Ok(())
}

fn print_commands(config: &Config) {
    println!("Commands (say the hotword first):");
    for command in &config.commands {
        let words = match (command.min_words, command.max_words) {
            (0, 0) => "no argument".to_string(),
            (min, max) if min == max => format!("{} words", min),
            (min, max) => format!("{}-{} words", min, max),
        };
        println!("  {:<14} {}", command.name().green(), words.dimmed());
    }
}

fn print_report(report: &SimulationReport) {
    for event in &report.events {
        match event {
            SimulationEvent::Recognition(RecognitionEvent::Hotword { speaker }) => {
                println!("{} {}", "hotword".cyan(), speaker.dimmed());
            }
            SimulationEvent::Recognition(RecognitionEvent::Command { name, argument, .. }) => {
                if argument.is_empty() {
                    println!("{} {}", "command".green(), name);
                } else {
                    println!("{} {} {}", "command".green(), name, argument.dimmed());
                }
            }
            SimulationEvent::Recognition(RecognitionEvent::BadCommand { text, .. }) => {
                println!("{} {:?}", "bad command".red(), text);
            }
            SimulationEvent::Playback(PlaybackEvent::Song { track }) => {
                println!("  {} {}", "▶".green(), track);
            }
            SimulationEvent::Playback(PlaybackEvent::End) => {
                println!("  {}", "queue finished".dimmed());
            }
            SimulationEvent::Playback(PlaybackEvent::Error { message, query }) => match query {
                Some(query) => println!("  {} {} ({})", "error".red(), message, query),
                None => println!("  {} {}", "error".red(), message),
            },
            SimulationEvent::Cue { cue } => {
                let name = match cue {
                    Cue::Wake => "wake",
                    Cue::Success => "success",
                    Cue::Failure => "failure",
                };
                println!("  {} {}", "cue".dimmed(), name.dimmed());
            }
        }
    }

    let state = &report.final_state;
    println!();
    println!("  {}    {:?}", "Status:".dimmed(), state.status);
    match &state.current {
        Some(track) => println!("  {}   {}", "Current:".dimmed(), track),
        None => println!("  {}   -", "Current:".dimmed()),
    }
    if !state.queue.is_empty() {
        println!("  {}     {}", "Queue:".dimmed(), state.queue.join(", "));
    }
    if report.left {
        println!("  {}", "(left the voice channel)".yellow());
    }
}

fn print_report_json(report: &SimulationReport) -> Result<()> {
    for event in &report.events {
        println!("{}", serde_json::to_string(event)?);
    }
    println!(
        "{}",
        serde_json::to_string(&serde_json::json!({
            "source": "final",
            "state": report.final_state,
            "left": report.left,
        }))?
    );
    Ok(())
}
