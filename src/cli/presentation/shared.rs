//! Shared presentation: colors, skipped-path warnings, configuration.

use crate::config::DirsnapConfig;
use crate::error::{AccessError, ApiError, ArgumentError};
use owo_colors::OwoColorize;

/// Applies terminal colors only when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn green(&self, s: &str) -> String {
        if self.enabled {
            s.green().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn red(&self, s: &str) -> String {
        if self.enabled {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn yellow(&self, s: &str) -> String {
        if self.enabled {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn cyan(&self, s: &str) -> String {
        if self.enabled {
            s.cyan().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn bold(&self, s: &str) -> String {
        if self.enabled {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn dimmed(&self, s: &str) -> String {
        if self.enabled {
            s.dimmed().to_string()
        } else {
            s.to_string()
        }
    }
}

/// One warning line per skipped path.
pub fn format_skipped_warnings(skipped: &[AccessError]) -> Vec<String> {
    skipped.iter().map(|e| format!("warning: {}", e)).collect()
}

pub fn format_config(config: &DirsnapConfig, format: &str) -> Result<String, ApiError> {
    match format {
        "toml" => config
            .to_toml()
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        "json" => serde_json::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        other => Err(ArgumentError::InvalidOption {
            option: "--format".to_string(),
            reason: format!("expected 'toml' or 'json', found {:?}", other),
        }
        .into()),
    }
}
