//! Config loading facade: assembles the layers and deserializes the result.

use super::merge::merge_policy;
use super::sources::{global_file, local_file};
use super::DirsnapConfig;
use crate::error::ApiError;
use config::{Environment, File, Map};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`DirsnapConfig`] from defaults, files and the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

/// Which layers one load uses.
#[derive(Debug, Default)]
pub(crate) struct Layers<'a> {
    pub global: Option<&'a Path>,
    pub local_dir: Option<&'a Path>,
    pub env_name: Option<&'a str>,
    pub explicit: Option<&'a Path>,
    /// Replacement for the process environment.
    pub env_vars: Option<Map<String, String>>,
}

impl ConfigLoader {
    /// Defaults, global file, `dirsnap.toml` and `dirsnap.<DIRSNAP_ENV>.toml`
    /// in `dir`, then `DIRSNAP__SECTION__KEY` environment variables.
    pub fn load(dir: &Path) -> Result<DirsnapConfig, ApiError> {
        let global = Self::xdg_config_path();
        let env_name = std::env::var("DIRSNAP_ENV").ok();
        Self::load_layers(Layers {
            global: global.as_deref(),
            local_dir: Some(dir),
            env_name: env_name.as_deref(),
            ..Layers::default()
        })
    }

    /// Defaults, the given file (which must exist), then the environment.
    /// Global and working-directory files are not read.
    pub fn load_from_file(path: &Path) -> Result<DirsnapConfig, ApiError> {
        Self::load_layers(Layers {
            explicit: Some(path),
            ..Layers::default()
        })
    }

    /// Location of the user-level config file.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    pub(crate) fn load_layers(layers: Layers<'_>) -> Result<DirsnapConfig, ApiError> {
        let mut builder = merge_policy::builder_with_defaults()?;

        if let Some(path) = layers.explicit {
            if !path.is_file() {
                return Err(ApiError::ConfigError(format!(
                    "Config file {} does not exist",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).required(true));
        } else {
            builder = global_file::add_to_builder(builder, layers.global)?;
            if let Some(dir) = layers.local_dir {
                builder = local_file::add_to_builder(builder, dir, layers.env_name)?;
            }
        }

        let environment = Environment::with_prefix("DIRSNAP")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("walk.exclude")
            .try_parsing(true)
            .source(layers.env_vars);
        builder = builder.add_source(environment);

        let config: DirsnapConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }
}
