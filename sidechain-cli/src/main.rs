use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sidechain_core::{
    TranscriptRoots, load_transcript, render_transcript_changes_markdown,
    render_transcript_markdown, render_transcript_raw_json, resolve_transcript_path,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SIDECHAIN_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "sidechain",
    version,
    about = "Group agent transcripts into messages, subagent runs and technical steps"
)]
struct Cli {
    /// Transcript file path, or claude://<session_id> / agents://claude/<session_id>
    source: String,

    /// Output the grouped transcript as JSON instead of markdown
    #[arg(long)]
    raw: bool,

    /// Earlier snapshot of the same transcript; only changed groups are rendered
    #[arg(long, value_name = "PATH", conflicts_with = "raw")]
    since: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> sidechain_core::Result<()> {
    let path = if cli.source.contains("://") {
        let roots = TranscriptRoots::from_env_or_home()?;
        resolve_transcript_path(&cli.source, &roots)?
    } else {
        PathBuf::from(&cli.source)
    };
    let messages = load_transcript(&path)?;

    if cli.raw {
        let raw_json = render_transcript_raw_json(&messages)?;
        print!("{raw_json}");
        return Ok(());
    }

    let markdown = match &cli.since {
        Some(previous_path) => {
            let previous = load_transcript(previous_path)?;
            render_transcript_changes_markdown(&path, &previous, &messages)
        }
        None => render_transcript_markdown(&path, &messages),
    };
    print!("{markdown}");

    Ok(())
}
