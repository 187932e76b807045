//! Layered configuration loading.
//!
//! The gateway reads its settings from up to three layers, later layers
//! overriding earlier ones:
//!
//! 1. compiled-in defaults (any `Serialize` value),
//! 2. an optional configuration file in YAML, TOML, JSON, INI, RON or JSON5,
//!    with `${VAR}` / `$VAR` references substituted from the environment,
//! 3. prefixed environment variables, `__` separating nested keys
//!    (`EDGE_GATEWAY_SERVER__PORT=9000` → `server.port`).
//!
//! Command-line flags are applied by the binary on top of the result.

use config::{Config as Cfg, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

pub use config::FileFormat as Format;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect configuration format from file extension
///
/// | Extension | Format |
/// |-----------|--------|
/// | `.yaml`, `.yml` | YAML |
/// | `.toml` | TOML |
/// | `.json` | JSON |
/// | `.ini` | INI |
/// | `.ron` | RON |
/// | `.json5` | JSON5 |
pub fn detect_format(path: impl AsRef<Path>) -> ConfigResult<FileFormat> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string.
///
/// `${VAR_NAME}` is replaced first, then bare `$VAR_NAME`. References to
/// unset variables are left as written.
///
/// ```rust
/// use edge_kernel::config::substitute_env_vars;
///
/// let out = substitute_env_vars("root = \"${EDGE_DOC_SURELY_UNSET}\"").unwrap();
/// assert_eq!(out, "root = \"${EDGE_DOC_SURELY_UNSET}\"");
/// ```
pub fn substitute_env_vars(content: &str) -> ConfigResult<String> {
    let braced = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    let result = braced.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    let simple = Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b")
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    let result = simple.replace_all(&result, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    Ok(result.into_owned())
}

/// Load configuration from a single file, detecting its format from the
/// extension.
pub fn load_config<T>(path: impl AsRef<Path>) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    ConfigLoader::new().with_file(path)?.load()
}

/// Load configuration from a string with an explicit format.
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    ConfigLoader::new().with_str(content, format)?.load()
}

/// Builder that stacks configuration sources; later sources win.
///
/// ```rust
/// use edge_kernel::config::{ConfigLoader, Format};
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Server { host: String, port: u16 }
///
/// let server: Server = ConfigLoader::new()
///     .with_defaults(&Server { host: "127.0.0.1".into(), port: 8082 })?
///     .with_str("port = 9000", Format::Toml)?
///     .load()?;
/// assert_eq!(server.host, "127.0.0.1");
/// assert_eq!(server.port, 9000);
/// # Ok::<(), edge_kernel::config::ConfigError>(())
/// ```
pub struct ConfigLoader {
    builder: ConfigBuilder<DefaultState>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            builder: Cfg::builder(),
        }
    }

    /// Seed the stack with a serialized defaults value.
    pub fn with_defaults<S: Serialize>(self, defaults: &S) -> ConfigResult<Self> {
        let defaults = Cfg::try_from(defaults).map_err(|e| ConfigError::Serialization(e.to_string()))?;
        Ok(Self {
            builder: self.builder.add_source(defaults),
        })
    }

    /// Add a configuration file. A missing file is an error.
    pub fn with_file(self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        self.with_str(&content, format)
    }

    /// Add configuration text in the given format.
    pub fn with_str(self, content: &str, format: FileFormat) -> ConfigResult<Self> {
        let substituted = substitute_env_vars(content)?;
        Ok(Self {
            builder: self.builder.add_source(File::from_str(&substituted, format)),
        })
    }

    /// Add environment variables named `{prefix}_{KEY}`, with `__`
    /// separating nested keys.
    pub fn with_env(self, prefix: &str) -> Self {
        Self {
            builder: self.builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__"),
            ),
        }
    }

    /// Build the stack and deserialize it.
    pub fn load<T: DeserializeOwned>(self) -> ConfigResult<T> {
        let config = self
            .builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ConfigError::Serialization(e.to_string()))
    }
}


#[cfg(test)]
mod tests;
