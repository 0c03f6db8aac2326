//! CLI binary for parley: inspect and maintain learned patterns.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use parley::ParleyConfig;
use parley::learning::{FsPatternStore, FsTranscriptStore, LearningManager, PatternStore, SaveOutcome};
use tracing::info;

/// Parley: conversational state tracking and response-pattern learning.
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Show what has been learned so far.
    Stats,

    /// Rebuild learned patterns by replaying every stored session transcript.
    Relearn,

    /// Forget every learned pattern.
    Reset {
        /// Skip the safety check.
        #[arg(long)]
        yes: bool,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ParleyConfig::from_file(path)?,
        None => ParleyConfig::load_or_default(&ParleyConfig::default_config_path())?,
    };
    let _log_guard = parley::logging::init(&config.logging);

    match cli.command.unwrap_or(Command::Stats) {
        Command::Stats => stats(&config).await,
        Command::Relearn => relearn(&config).await,
        Command::Reset { yes } => reset(&config, yes).await,
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn open_learning(config: &ParleyConfig) -> LearningManager {
    let primary: Arc<dyn PatternStore> = Arc::new(FsPatternStore::new(config.learning.patterns_path()));
    let fallback = config
        .learning
        .fallback_patterns_file
        .clone()
        .map(|path| Arc::new(FsPatternStore::new(path)) as Arc<dyn PatternStore>);
    LearningManager::load(primary, fallback).await
}

async fn stats(config: &ParleyConfig) -> anyhow::Result<()> {
    let stats = open_learning(config).await.stats().await;
    println!("patterns file:               {}", config.learning.patterns_path().display());
    println!("topics learned:              {}", stats.topics_learned);
    println!("questions learned:           {}", stats.questions_learned);
    println!("users tracked:               {}", stats.users_tracked);
    println!("response types with emojis:  {}", stats.response_types_with_emojis);
    println!("responses remembered:        {}", stats.total_responses);
    Ok(())
}

async fn relearn(config: &ParleyConfig) -> anyhow::Result<()> {
    let transcripts = FsTranscriptStore::new(config.learning.transcripts_path())?;
    let learning = open_learning(config).await;
    let report = learning.relearn_from_transcripts(&transcripts).await?;
    info!(?report, "relearn finished");
    println!(
        "replayed {} sessions, {} patterns learned",
        report.sessions, report.patterns_learned
    );
    check_saved(report.saved)
}

async fn reset(config: &ParleyConfig, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!(
            "refusing to erase {} without --yes",
            config.learning.patterns_path().display()
        );
    }
    let learning = open_learning(config).await;
    check_saved(learning.reset().await)?;
    println!("learned patterns cleared");
    Ok(())
}

fn check_saved(outcome: SaveOutcome) -> anyhow::Result<()> {
    match outcome {
        SaveOutcome::Primary => Ok(()),
        SaveOutcome::Fallback => {
            eprintln!("warning: primary patterns file not writable; saved to fallback");
            Ok(())
        }
        SaveOutcome::Lost => anyhow::bail!("learned patterns could not be saved"),
    }
}
