use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::prelude::*;

static TRACING_INIT: Once = Once::new();

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_owned())
    }
}

/// User-facing decompiler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecompilerConfig {
    /// When disabled, requests are answered with a placeholder without running the engine.
    #[serde(default = "DecompilerConfig::default_enabled")]
    pub enabled: bool,

    /// Raw engine options keyed by their short names (`dgs`, `rsy`, ...).
    #[serde(default)]
    pub settings: BTreeMap<String, String>,

    #[serde(default = "DecompilerConfig::default_indent_size")]
    pub indent_size: usize,

    /// Ask the engine for a bytecode -> source line mapping.
    #[serde(default = "DecompilerConfig::default_use_line_mapping")]
    pub use_line_mapping: bool,

    #[serde(default)]
    pub dump_original_lines: bool,

    /// Surface decompilation failures as errors instead of commented fallbacks.
    #[serde(default)]
    pub unit_test_mode: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DecompilerConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_indent_size() -> usize {
        4
    }

    fn default_use_line_mapping() -> bool {
        true
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

impl Default for DecompilerConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            settings: BTreeMap::new(),
            indent_size: Self::default_indent_size(),
            use_line_mapping: Self::default_use_line_mapping(),
            dump_original_lines: false,
            unit_test_mode: false,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A simple level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    /// `level` as filter directives; `warning` is accepted for `warn`.
    pub(crate) fn directives(&self) -> String {
        match self.level.trim() {
            "" => Self::default_level(),
            level if level.eq_ignore_ascii_case("warning") => "warn".to_owned(),
            level => level.to_owned(),
        }
    }

    /// The configured level followed by `RUST_LOG`, if set. Invalid directives are dropped.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let mut directives = self.directives();
        if let Ok(env) = std::env::var("RUST_LOG") {
            if !env.trim().is_empty() {
                directives.push(',');
                directives.push_str(env.trim());
            }
        }
        tracing_subscriber::EnvFilter::new(directives)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

/// Installs a global `tracing` subscriber writing to stderr.
///
/// Only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry()
            .with(config.env_filter())
            .with(layer);
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
