mod cli;
mod config;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use logscope_logs::{FrameReader, LineEmitter, Pipeline};

use cli::Args;
use config::{FileConfig, Input, Settings};

fn main() -> ExitCode {
    let args = Args::parse();

    // stdout carries the records, so diagnostics go to stderr
    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(args, file_config)?;
    debug!(?settings, "resolved settings");

    let input: Box<dyn Read> = match &settings.input {
        Input::Stdin => Box::new(io::stdin().lock()),
        Input::Path(path) => Box::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        ),
    };

    let mut source = FrameReader::new(BufReader::new(input));
    let mut sink = LineEmitter::new(BufWriter::new(io::stdout().lock()));

    let result = Pipeline::new(&settings.criteria, settings.options).run(&mut source, &mut sink);
    debug!(
        frames = source.frames_read(),
        bytes = source.bytes_read(),
        "container bytes consumed"
    );
    result.context("scan aborted")?;

    Ok(())
}
