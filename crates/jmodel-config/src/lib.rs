//! Configuration for building a code model, loaded from TOML.
//!
//! ```toml
//! [resolution]
//! allow_create_missing = true
//! omit_standard_packages = true
//!
//! [parse]
//! freeze_after_parse = false
//!
//! [classpath]
//! minimal_jdk = true
//! mirrors = ["mirrors/app.json"]
//!
//! [logging]
//! level = "info"
//! json = false
//! ```
//!
//! Every section and key is optional. Unknown keys are rejected.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use jmodel_classpath::{ChainLoader, ClasspathError, MirrorIndex};
use jmodel_syntax::ParseOptions;
use jmodel_types::{CodeModel, ResolutionOptions, TypeLoader};

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
    #[error(transparent)]
    Classpath(#[from] ClasspathError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The `Display` form quotes a snippet of the input; the message alone is enough.
        ConfigError::Toml(err.message().to_owned())
    }
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// How names resolve and print.
    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub parse: ParseConfig,

    /// Where reflective type metadata comes from.
    #[serde(default)]
    pub classpath: ClasspathConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolutionConfig {
    /// Unknown names become placeholder types instead of resolution misses.
    #[serde(default = "default_true")]
    pub allow_create_missing: bool,

    /// Print `java.lang` types unqualified even in qualified output.
    #[serde(default = "default_true")]
    pub omit_standard_packages: bool,

    #[serde(default = "ResolutionConfig::default_root_type")]
    pub root_type: String,

    #[serde(default = "ResolutionConfig::default_root_exception_type")]
    pub root_exception_type: String,
}

impl ResolutionConfig {
    fn default_root_type() -> String {
        ResolutionOptions::default().root_type
    }

    fn default_root_exception_type() -> String {
        ResolutionOptions::default().root_exception_type
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            allow_create_missing: true,
            omit_standard_packages: true,
            root_type: Self::default_root_type(),
            root_exception_type: Self::default_root_exception_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseConfig {
    /// Freeze each compilation unit's types once it is parsed.
    #[serde(default)]
    pub freeze_after_parse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClasspathConfig {
    /// Fall back to the built-in platform mirrors.
    #[serde(default = "default_true")]
    pub minimal_jdk: bool,

    /// JSON mirror files, consulted before the built-in mirrors. Relative paths are resolved
    /// against the directory of the config file.
    #[serde(default)]
    pub mirrors: Vec<PathBuf>,
}

impl Default for ClasspathConfig {
    fn default() -> Self {
        Self {
            minimal_jdk: true,
            mirrors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

fn default_true() -> bool {
    true
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            "off" | "none" => "off".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective filter: the configured level, with `RUST_LOG` directives layered on top
    /// when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        match env_directives {
            Some(env_directives) => {
                let config_directives = Self::normalize_level_directives(&self.level);
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
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

impl ModelConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::load_from_str(&text)?;
        if let Some(base) = path.parent() {
            config.classpath.resolve_relative_to(base);
        }
        tracing::debug!(target: "jmodel.config", path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn load_from_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn resolution_options(&self) -> ResolutionOptions {
        let resolution = &self.resolution;
        ResolutionOptions {
            allow_create_missing: resolution.allow_create_missing,
            omit_standard_packages: resolution.omit_standard_packages,
            root_type: resolution.root_type.clone(),
            root_exception_type: resolution.root_exception_type.clone(),
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            freeze_after_parse: self.parse.freeze_after_parse,
        }
    }

    /// The loader described by `[classpath]`, or `None` when it names no metadata at all.
    pub fn type_loader(&self) -> Result<Option<Box<dyn TypeLoader>>> {
        let mut indexes = Vec::new();
        if !self.classpath.mirrors.is_empty() {
            let mut index = MirrorIndex::new();
            for path in &self.classpath.mirrors {
                let count = index.load_json_file(path)?;
                tracing::debug!(
                    target: "jmodel.config",
                    path = %path.display(),
                    count,
                    "loaded mirrors"
                );
            }
            indexes.push(Arc::new(index));
        }
        if self.classpath.minimal_jdk {
            indexes.push(Arc::new(MirrorIndex::minimal_jdk()));
        }
        if indexes.is_empty() {
            return Ok(None);
        }
        let loader: Box<dyn TypeLoader> = Box::new(ChainLoader::new(indexes));
        Ok(Some(loader))
    }

    /// A fresh model with this configuration's resolution options and loader.
    pub fn create_model(&self) -> Result<CodeModel> {
        let loader = self.type_loader()?;
        Ok(CodeModel::new(self.resolution_options(), loader))
    }
}

impl ClasspathConfig {
    fn resolve_relative_to(&mut self, base: &Path) {
        for path in &mut self.mirrors {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a global `tracing` subscriber writing to stderr.
///
/// Safe to call more than once: only the first call has any effect, and an already installed
/// subscriber is left in place.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(config.env_filter())
            .with_target(true);
        // `TestWriter` keeps `cargo test` output capture working in debug builds.
        let installed = if config.json {
            if cfg!(debug_assertions) {
                builder
                    .json()
                    .with_writer(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
                    .try_init()
            } else {
                builder.json().with_writer(std::io::stderr).try_init()
            }
        } else if cfg!(debug_assertions) {
            builder
                .with_writer(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
                .try_init()
        } else {
            builder.with_writer(std::io::stderr).try_init()
        };

        match installed {
            Ok(()) => tracing::debug!(target: "jmodel.config", level = %config.level, "tracing initialized"),
            Err(err) => tracing::debug!(target: "jmodel.config", error = %err, "subscriber already installed"),
        }
    });
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn level_directives_accept_common_spellings() {
        assert_eq!(LoggingConfig::normalize_level_directives(" WARNING "), "warn");
        assert_eq!(LoggingConfig::normalize_level_directives(""), "info");
        assert_eq!(LoggingConfig::normalize_level_directives("None"), "off");
        assert_eq!(
            LoggingConfig::normalize_level_directives("jmodel.syntax=debug,info"),
            "jmodel.syntax=debug,info"
        );
    }

    #[test]
    fn relative_mirror_paths_resolve_against_the_config_directory() {
        let mut classpath = ClasspathConfig {
            minimal_jdk: false,
            mirrors: vec![PathBuf::from("mirrors/app.json"), PathBuf::from("/abs/lib.json")],
        };
        classpath.resolve_relative_to(Path::new("/work"));
        assert_eq!(
            classpath.mirrors,
            vec![PathBuf::from("/work/mirrors/app.json"), PathBuf::from("/abs/lib.json")]
        );
    }
}
