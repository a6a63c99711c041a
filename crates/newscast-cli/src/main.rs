//! Newscast command-line entry point.

mod pipeline;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use newscast_core::{NewsDigest, NewscastConfig, ScriptHistory, export_markdown};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "newscast", version, about = "Automated spoken news bulletin pipeline")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "newscast.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for a news digest JSON file.
    Run {
        /// Aggregated news statistics (JSON).
        digest: PathBuf,
    },
    /// Export a script file as Markdown.
    Export {
        script: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show recent bulletin history.
    History {
        #[arg(default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { digest } => {
            let config = NewscastConfig::load(&cli.config)
                .with_context(|| format!("failed to load {}", cli.config.display()))?;
            let raw = std::fs::read_to_string(&digest)
                .with_context(|| format!("failed to read {}", digest.display()))?;
            let digest: NewsDigest =
                serde_json::from_str(&raw).context("failed to parse news digest JSON")?;

            info!(
                keyword_groups = digest.stats.len(),
                total_titles = digest.total_titles(),
                "starting bulletin run"
            );
            let report = Pipeline::new(config).run(&digest).await;

            match &report.script_path {
                Some(path) => println!("script: {}", path.display()),
                None => println!("script: skipped"),
            }
            match &report.audio {
                Some(artifact) if artifact.truncated => {
                    println!("audio:  {} (truncated)", artifact.path.display());
                }
                Some(artifact) => println!("audio:  {}", artifact.path.display()),
                None => println!("audio:  skipped"),
            }
            match &report.video_path {
                Some(path) => println!("video:  {}", path.display()),
                None => println!("video:  skipped"),
            }
            println!("delivered: {}", if report.delivered { "yes" } else { "no" });
        }
        Commands::Export { script, output } => {
            let path = export_markdown(&script, output)?;
            println!("{}", path.display());
        }
        Commands::History { limit } => {
            let config = NewscastConfig::load(&cli.config)
                .with_context(|| format!("failed to load {}", cli.config.display()))?;
            let history = ScriptHistory::new(config.output_dir.join("script_history.json"));
            let entries = history.recent(limit)?;
            if entries.is_empty() {
                println!("no history yet");
            }
            for (i, entry) in entries.iter().enumerate() {
                println!("{}. {} {}", i + 1, entry.date, entry.time);
                println!("   字数: {} 字", entry.word_count);
                println!(
                    "   关键词组: {} 个，标题: {} 条",
                    entry.keyword_groups, entry.total_titles
                );
                println!("   预览: {}", entry.preview);
                println!();
            }
        }
    }
    Ok(())
}
