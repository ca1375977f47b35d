//! Shared CLI plumbing: error type, exit codes and input loading.

use crate::config::DeckConfig;
use crate::error::ConfigError;
use crate::models::{EntitySnapshot, KeySize};
use anyhow::Context;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// The configuration or an argument is invalid
    Validation = 1,
    /// A file could not be read or written
    Io = 2,
}

/// A failed command.
#[derive(Debug)]
pub struct CliError {
    /// Exit code to terminate with
    pub code: ExitCode,
    /// Message for stderr
    pub message: String,
}

impl CliError {
    /// An invalid configuration or argument.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::Validation,
            message: message.into(),
        }
    }

    /// A filesystem or I/O failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::Io,
            message: message.into(),
        }
    }

    /// Classifies a config loading failure: a [`ConfigError`] anywhere in
    /// the chain, or a YAML problem, is a validation error.
    pub fn from_config_load(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        let is_config = err.chain().any(|cause| {
            cause.downcast_ref::<ConfigError>().is_some()
                || cause.downcast_ref::<serde_yml::Error>().is_some()
        });
        if is_config {
            Self::validation(message)
        } else {
            Self::io(message)
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// Result of a CLI command.
pub type CliResult<T> = Result<T, CliError>;

/// The `--config` argument or the platform default path.
pub fn config_path(explicit: Option<&Path>) -> CliResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => DeckConfig::config_file_path().map_err(|e| CliError::io(format!("{e:#}"))),
    }
}

/// Loads and validates the configuration.
pub fn load_config(explicit: Option<&Path>) -> CliResult<DeckConfig> {
    let path = config_path(explicit)?;
    DeckConfig::load(&path).map_err(|e| CliError::from_config_load(&e))
}

/// Loads a snapshot file, or an empty snapshot when none is given.
pub fn load_snapshot(path: Option<&Path>) -> CliResult<EntitySnapshot> {
    let Some(path) = path else {
        return Ok(EntitySnapshot::new());
    };
    fs::read_to_string(path)
        .context(format!("Failed to read snapshot file: {}", path.display()))
        .and_then(|json| EntitySnapshot::from_json(&json).context("Invalid snapshot file"))
        .map_err(|e| CliError::validation(format!("{e:#}")))
}

/// Parses `WxH` (or a single number for square keys).
pub fn parse_key_size(text: &str) -> Result<KeySize, String> {
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .ok()
            .filter(|v| (1..=1024).contains(v))
            .ok_or_else(|| format!("invalid key size '{text}', expected e.g. 96x96"))
    };
    match text.split_once(['x', 'X']) {
        Some((w, h)) => Ok(KeySize::new(parse(w)?, parse(h)?)),
        None => {
            let side = parse(text)?;
            Ok(KeySize::new(side, side))
        }
    }
}
