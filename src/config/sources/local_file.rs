//! Working-directory config file source: dirsnap.toml and dirsnap.{env}.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

pub const LOCAL_CONFIG_FILE: &str = "dirsnap.toml";

/// Add working-directory config files to builder.
/// Precedence: dirsnap.toml (base) then dirsnap.{DIRSNAP_ENV}.toml when an
/// environment name is set.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    dir: &Path,
    env_name: Option<&str>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder;

    let base_config_path = dir.join(LOCAL_CONFIG_FILE);
    if base_config_path.exists() {
        builder = builder.add_source(File::from(base_config_path.as_path()).required(false));
    }

    if let Some(env_name) = env_name {
        let env_config_path = dir.join(format!("dirsnap.{}.toml", env_name));
        if env_config_path.exists() {
            builder = builder.add_source(File::from(env_config_path.as_path()).required(false));
        }
    }

    Ok(builder)
}
