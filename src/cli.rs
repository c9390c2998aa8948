use std::path::PathBuf;

use clap::Parser;

use logscope_logs::Strategy;

/// Logscope - print Kubernetes log records from zstd-framed OTLP log archives
#[derive(Parser, Debug, Default)]
#[command(name = "logscope")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Container file to scan ("-" reads standard input)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Only records whose namespace starts with this prefix
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Only records whose pod name starts with this prefix
    #[arg(short, long)]
    pub pod: Option<String>,

    /// Only records whose container name starts with this prefix
    #[arg(short, long)]
    pub container: Option<String>,

    /// Only records newer than this (e.g. 30s, 5m, 1h30m; 0 disables)
    #[arg(short, long, value_name = "DURATION")]
    pub since: Option<String>,

    /// Record encoding to read: auto, attributes or kubernetes
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Drop records without a usable timestamp even when no time window is set
    #[arg(long)]
    pub require_time: bool,

    /// TOML file with default values for the options above
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug diagnostics (including skipped records) to stderr
    #[arg(short, long)]
    pub verbose: bool,
}
