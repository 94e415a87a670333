mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "trailguide", version, about = "Guided tour tooling")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a trail against a page snapshot
    Validate {
        #[arg(long)]
        trail: PathBuf,
        #[arg(long)]
        page: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a durable selector for an element
    Generate {
        #[arg(long)]
        page: PathBuf,
        /// Selector picking the element (first match is used)
        #[arg(long)]
        select: String,
    },
    /// Suggest replacements for a selector that no longer resolves
    Repair {
        #[arg(long)]
        page: PathBuf,
        #[arg(long)]
        selector: String,
        /// Text the element used to show
        #[arg(long)]
        text: Option<String>,
    },
    /// Play a trail on a page snapshot
    Play {
        #[arg(long)]
        trail: PathBuf,
        #[arg(long)]
        page: PathBuf,
        /// Comma separated keys, e.g. right,right,left,esc
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
        /// Continue from the last saved step
        #[arg(long)]
        resume: bool,
        /// Progress file (defaults to ~/.trailguide/progress/progress.json)
        #[arg(long)]
        progress: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Validate { trail, page, json } => commands::validate(&trail, &page, json),
        Command::Generate { page, select } => commands::generate(&page, &select),
        Command::Repair {
            page,
            selector,
            text,
        } => commands::repair(&page, &selector, text.as_deref()).await,
        Command::Play {
            trail,
            page,
            keys,
            resume,
            progress,
        } => commands::play(&trail, &page, &keys, resume, progress).await,
    }
}
