use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use voicedj::cli::{Cli, Commands, ConfigAction, replay_wav};
use voicedj::config::Config;
use voicedj::filter::Verdict;
use voicedj::media::ranking::augment_variations;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Filter { query } => {
            let config = load_config(cli.config.as_deref())?;
            handle_filter(&config, &query, cli.quiet);
        }
        Commands::Correct { query } => {
            let config = load_config(cli.config.as_deref())?;
            handle_correct(&config, &query);
        }
        Commands::Segment {
            wav,
            speaker,
            frame,
            scan_interval,
            silence,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let mut ingest = config.ingest();
            if let Some(silence) = silence {
                ingest.silence_threshold = silence;
            }
            let scan_interval = scan_interval.unwrap_or_else(|| config.scan_interval());
            let report = replay_wav(&wav, speaker, frame, scan_interval, ingest)
                .with_context(|| format!("failed to replay {}", wav.display()))?;

            if !cli.quiet {
                println!(
                    "{} frames, {} utterances, {} discarded as too short",
                    report.frames,
                    report.segments.len(),
                    report.discarded_short
                );
            }
            for (idx, segment) in report.segments.iter().enumerate() {
                println!(
                    "  [{}] speaker {} flushed at {:>6}ms, {}ms of audio",
                    idx, segment.speaker, segment.flushed_at_ms, segment.duration_ms
                );
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "voicedj", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration.
///
/// Priority:
/// 1. Custom path from --config (must exist)
/// 2. Default config path (~/.config/voicedj/config.toml)
/// 3. Built-in defaults
///
/// Environment variable overrides apply on top of all three.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()?)?,
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

fn handle_filter(config: &Config, query: &str, quiet: bool) {
    let request = config.phrase_tables().strip_triggers(query);
    let verdict = config.content_filter().check(&request);
    match verdict {
        Verdict::Allowed => {
            if quiet {
                return;
            }
            println!("{} {}", "allowed:".green().bold(), request);
        }
        Verdict::Rejected(rejection) => {
            eprintln!("{} {} ({})", "rejected:".red().bold(), request, rejection);
            std::process::exit(1);
        }
    }
}

fn handle_correct(config: &Config, query: &str) {
    let corrector = config.query_corrector();
    let correction = corrector.correct(query);

    println!("{:<12} {}", "original:".dimmed(), correction.original);
    println!("{:<12} {}", "phonetic:".dimmed(), correction.phonetic);
    println!("{:<12} {}", "fixed:".dimmed(), correction.fixed);
    match &correction.catalog_match {
        Some((title, score)) => {
            println!("{:<12} {} ({:.2})", "catalog:".dimmed(), title.green(), score)
        }
        None => println!("{:<12} {}", "catalog:".dimmed(), "no match".yellow()),
    }

    println!("{}", "search variations:".bold());
    for (idx, variation) in augment_variations(&corrector.variations(query))
        .iter()
        .enumerate()
    {
        println!("  {}. {}", idx + 1, variation);
    }
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", config_path(custom_path)?.display());
        }
        ConfigAction::Init { force } => {
            let path = config_path(custom_path)?;
            if path.exists() && !force {
                eprintln!(
                    "{} {} already exists (use --force to overwrite)",
                    "Error:".red(),
                    path.display()
                );
                std::process::exit(1);
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, Config::default().to_toml()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
