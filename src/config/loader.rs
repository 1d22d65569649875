use crate::config::schema::{CanopyConfig, ValidationError, ValidationIssue};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_FILE_NAME: &str = "canopy.toml";

/// Why a configuration document could not be used. Documents parsed from
/// a file carry its path; documents parsed from a string do not.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("malformed config{}: {source}", origin(.path))]
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("invalid config{}: {source}", origin(.path))]
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    /// The file the document came from, if it came from one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }

    /// Every validation issue, empty for read and syntax errors.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ConfigError::Validation { source, .. } => &source.issues,
            _ => &[],
        }
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" in {}", path.display()))
        .unwrap_or_default()
}

fn parse_document(input: &str, path: Option<&Path>) -> Result<CanopyConfig, ConfigError> {
    let owned = || path.map(Path::to_path_buf);
    let config: CanopyConfig = toml_edit::de::from_str(input).map_err(|source| {
        ConfigError::Toml {
            path: owned(),
            source,
        }
    })?;
    config.validate().map_err(|source| ConfigError::Validation {
        path: owned(),
        source,
    })?;
    Ok(config)
}

/// Parse and validate a configuration document.
pub fn load_from_str(input: &str) -> Result<CanopyConfig, ConfigError> {
    parse_document(input, None)
}

/// Read, parse and validate the configuration file at `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<CanopyConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&contents, Some(path))
}

/// Load `canopy.toml` from `dir` if it exists, defaults otherwise.
pub fn discover(dir: impl AsRef<Path>) -> Result<CanopyConfig, ConfigError> {
    let path = dir.as_ref().join(DEFAULT_FILE_NAME);
    if path.is_file() {
        load_from_path(path)
    } else {
        Ok(CanopyConfig::default())
    }
}
