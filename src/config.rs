//! Configuration System
//!
//! Layered configuration built with the `config` crate. Precedence, lowest
//! first: built-in defaults, the global file, `dirsnap.toml` and
//! `dirsnap.<DIRSNAP_ENV>.toml` in the working directory,
//! `DIRSNAP__SECTION__KEY` environment variables, then CLI flags applied by
//! the caller. `--config <file>` replaces both file layers.

use crate::artifact::format::EncodingPolicy;
use crate::compare::CompareOptions;
use crate::ignore::ExcludeRules;
use crate::logging::LoggingConfig;
use crate::tree::walker::WalkConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::local_file::LOCAL_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirsnapConfig {
    /// Tree walking: exclusions, symlinks, limits
    #[serde(default)]
    pub walk: WalkConfig,

    /// Artifact generation
    #[serde(default)]
    pub artifact: ArtifactConfig,

    /// Tree comparison
    #[serde(default)]
    pub compare: CompareOptions,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Artifact generation settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// `auto` (TEXT where possible) or `base64`
    #[serde(default)]
    pub encoding: EncodingPolicy,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Walk(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Walk(msg) => write!(f, "walk: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl DirsnapConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = ExcludeRules::new(self.walk.exclude.as_slice()) {
            errors.push(ValidationError::Walk(e.to_string()));
        }
        if self.walk.max_depth == Some(0) {
            errors.push(ValidationError::Walk(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
