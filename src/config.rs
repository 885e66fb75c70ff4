//! User configuration
//!
//! Settings are layered, later sources winning:
//! 1. Built-in defaults
//! 2. TOML config file (`--config`, `MEMPLOT_CONFIG_PATH`, or the platform config dir)
//! 3. `MEMPLOT_*` environment variables, with `__` between nested keys
//!    (e.g. `MEMPLOT_CHART__WIDTH=1600`, `MEMPLOT_PARSER__START_KEYS=heuristics,flow`)
//!
//! Command-line flags override all of these.
//!
//! ```toml
//! viewer = "feh"
//!
//! [parser]
//! prefix = "TrajLNS"
//! start_keys = ["heuristics"]
//! terminator = "total"
//!
//! [chart]
//! width = 1600
//! height = 1000
//! title = "Nightly run"
//! ```

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};
use serde::Deserialize;

use crate::chart::ChartStyle;
use crate::memlog::{DEFAULT_PREFIX, DEFAULT_START_KEY, DEFAULT_TERMINATOR, ParseOptions};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "MEMPLOT_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemplotConfig {
    pub parser: ParserConfig,
    pub chart: ChartConfig,
    /// Command used to open rendered charts (e.g. "feh" or "eog --fullscreen")
    pub viewer: Option<String>,
}

/// Line format and section boundaries
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Tag before `:<key>_mem_GB`
    pub prefix: String,
    /// Keys that open a new section when seen again
    pub start_keys: Vec<String>,
    /// Key that closes a section
    pub terminator: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            start_keys: vec![DEFAULT_START_KEY.to_string()],
            terminator: DEFAULT_TERMINATOR.to_string(),
        }
    }
}

/// Chart appearance
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// Defaults to "<prefix> Memory Usage Over Sections"
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        let style = ChartStyle::default();
        Self {
            width: style.width,
            height: style.height,
            title: None,
            x_label: style.x_label,
            y_label: style.y_label,
        }
    }
}

impl MemplotConfig {
    /// Load configuration from the config file and environment.
    ///
    /// An explicit `path` must exist; the environment-variable and platform
    /// default locations are optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some((path, required)) = config_path(path) {
            log::debug!("Loading config from {}", path.display());
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        builder
            .add_source(
                Environment::with_prefix("MEMPLOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("parser.start_keys"),
            )
            .build()?
            .try_deserialize()
    }

    /// Parser settings, with `prefix` taking precedence over the config.
    pub fn parse_options(&self, prefix: Option<&str>) -> ParseOptions {
        ParseOptions::new(
            prefix.unwrap_or(&self.parser.prefix),
            self.parser.start_keys.iter().map(String::as_str),
            self.parser.terminator.as_str(),
        )
    }

    /// Chart settings for logs tagged with `prefix`.
    pub fn chart_style(&self, prefix: &str) -> ChartStyle {
        ChartStyle {
            width: self.chart.width,
            height: self.chart.height,
            title: self
                .chart
                .title
                .clone()
                .unwrap_or_else(|| ChartStyle::default_title(prefix)),
            x_label: self.chart.x_label.clone(),
            y_label: self.chart.y_label.clone(),
        }
    }
}

/// Resolve the config file location and whether it must exist.
///
/// Priority:
/// 1. `--config` flag (required)
/// 2. `MEMPLOT_CONFIG_PATH` environment variable
/// 3. Platform-specific default location
pub fn config_path(explicit: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), true));
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some((PathBuf::from(path), false));
    }

    // choose_base_strategy uses XDG on Linux and macOS, %APPDATA% on Windows
    let strategy = choose_base_strategy().ok()?;
    Some((strategy.config_dir().join("memplot").join("config.toml"), false))
}
