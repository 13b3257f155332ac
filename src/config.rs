use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::layout::LayoutConfig;
use crate::model::{DIM_CATEGORY, DIM_ISSUER};

/// Application settings, read from an optional TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Snapshot file; the command line argument wins over this
    pub data_path: Option<PathBuf>,
    pub default_dimension: String,
    /// Dimensions cycled with Tab, in order
    pub dimensions: Vec<String>,
    pub refresh_interval_secs: u64,
    pub retry_delay_secs: u64,
    pub debounce_ms: u64,
    pub show_labels: bool,
    pub label_font_path: Option<PathBuf>,
    pub layout: LayoutConfig,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            default_dimension: DIM_CATEGORY.to_string(),
            dimensions: vec![DIM_CATEGORY.to_string(), DIM_ISSUER.to_string()],
            refresh_interval_secs: 3600,
            retry_delay_secs: 5,
            debounce_ms: 250,
            show_labels: true,
            label_font_path: None,
            layout: LayoutConfig::default(),
        }
    }
}

impl HeatmapConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text)?;
        if config.dimensions.is_empty() {
            config.dimensions.push(config.default_dimension.clone());
        }
        if !config.dimensions.contains(&config.default_dimension) {
            tracing::warn!(
                "Default dimension '{}' not in dimension list, adding it",
                config.default_dimension
            );
            config.dimensions.insert(0, config.default_dimension.clone());
        }
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Dimension following `current` in the Tab cycle.
    pub fn next_dimension(&self, current: &str) -> &str {
        let next = self
            .dimensions
            .iter()
            .position(|d| d == current)
            .map_or(0, |i| (i + 1) % self.dimensions.len());
        self.dimensions
            .get(next)
            .map_or(self.default_dimension.as_str(), String::as_str)
    }
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliArgs {
    pub snapshot: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Parse `<snapshot.json> [--config <file.toml>]` (program name excluded).
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => match args.next() {
                Some(path) => parsed.config = Some(PathBuf::from(path)),
                None => bail!("--config needs a file path"),
            },
            flag if flag.starts_with('-') => bail!("unknown option '{flag}'"),
            _ if parsed.snapshot.is_none() => parsed.snapshot = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument '{arg}'"),
        }
    }
    Ok(parsed)
}

/// Resolve the final config and snapshot path from the command line.
pub fn resolve(cli: &CliArgs) -> Result<(HeatmapConfig, PathBuf)> {
    let config = match &cli.config {
        Some(path) => HeatmapConfig::load(path)?,
        None => HeatmapConfig::default(),
    };
    let snapshot = cli
        .snapshot
        .clone()
        .or_else(|| config.data_path.clone())
        .context("usage: EtfView-rs <snapshot.json> [--config <file.toml>]")?;
    Ok((config, snapshot))
}
