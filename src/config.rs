//! Run settings
//!
//! Values come from the command line, falling back to an optional TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use logscope_logs::{MatchCriteria, PipelineOptions, Strategy, TimePolicy, parse_duration};

use crate::cli::Args;

/// Contents of the `--config` file
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub file: Option<PathBuf>,
    pub namespace: Option<String>,
    pub pod: Option<String>,
    pub container: Option<String>,
    pub since: Option<String>,
    pub strategy: Option<Strategy>,
    pub require_time: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Where the container is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    Path(PathBuf),
}

/// Fully resolved, immutable settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: Input,
    pub criteria: MatchCriteria,
    pub options: PipelineOptions,
}

impl Settings {
    /// Merge command-line arguments over the config file
    pub fn resolve(args: &Args, file: FileConfig) -> Result<Self> {
        let input = match args.file.clone().or(file.file) {
            Some(path) if path.as_os_str() == "-" => Input::Stdin,
            Some(path) => Input::Path(path),
            None => bail!("file path not provided (use --file)"),
        };

        let since = match args.since.as_deref().or(file.since.as_deref()) {
            Some(raw) => Some(parse_duration(raw).with_context(|| "invalid --since value")?),
            None => None,
        };

        let criteria = MatchCriteria::new()
            .with_namespace(args.namespace.clone().or(file.namespace).unwrap_or_default())
            .with_pod(args.pod.clone().or(file.pod).unwrap_or_default())
            .with_container(args.container.clone().or(file.container).unwrap_or_default())
            .with_since(since);

        let time_policy = if args.require_time || file.require_time.unwrap_or(false) {
            TimePolicy::Always
        } else {
            TimePolicy::WhenFiltering
        };

        let options = PipelineOptions {
            strategy: args.strategy.or(file.strategy).unwrap_or_default(),
            time_policy,
        };

        Ok(Self {
            input,
            criteria,
            options,
        })
    }
}
