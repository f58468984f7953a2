//! Global config file source: $XDG_CONFIG_HOME/dirsnap/config.toml or the
//! platform equivalent.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path to global config file.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dirsnap").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the global config file to the builder if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    path: Option<&Path>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if let Some(config_path) = path {
        if config_path.exists() {
            let canonical = dunce::canonicalize(config_path)
                .unwrap_or_else(|_| config_path.to_path_buf());
            builder = builder.add_source(File::from(canonical.as_path()).required(false));
        } else {
            debug!(
                config_path = %config_path.display(),
                "No global configuration file"
            );
        }
    }
    Ok(builder)
}
