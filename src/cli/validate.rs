//! Validation command for configuration files.

use crate::cli::common::{config_path, CliError, CliResult};
use crate::config::DeckConfig;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Validate a configuration file
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Path to the configuration file (defaults to the user config)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output of `validate`.
#[derive(Debug, Serialize)]
struct ValidationResponse {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    pages: Vec<String>,
    presets: Vec<String>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> CliResult<()> {
        let path = config_path(self.config.as_deref())?;
        let loaded = DeckConfig::load(&path);

        let response = match &loaded {
            Ok(config) => ValidationResponse {
                valid: true,
                error: None,
                pages: config.pages.keys().cloned().collect(),
                presets: config.presets.keys().cloned().collect(),
            },
            Err(err) => ValidationResponse {
                valid: false,
                error: Some(format!("{err:#}")),
                pages: Vec::new(),
                presets: Vec::new(),
            },
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&response)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
        } else if response.valid {
            println!("✓ Validation passed: {}", path.display());
            println!("  Pages:   {}", response.pages.join(", "));
            println!("  Presets: {}", response.presets.join(", "));
        } else {
            println!("✗ Validation failed: {}", path.display());
        }

        match loaded {
            Ok(_) => Ok(()),
            Err(err) => Err(CliError::from_config_load(&err)),
        }
    }
}
