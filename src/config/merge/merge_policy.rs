//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later layers override earlier ones key by key: defaults, global file,
/// working-directory files, environment.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("walk.use_gitignore", true)?
        .set_default("walk.follow_symlinks", false)?
        .set_default("artifact.encoding", "auto")?
        .set_default("compare.normalize_unicode", true)?
        .set_default("compare.unified_diff", false)?
        .set_default("compare.context_lines", 3_i64)?
        .set_default("logging.enabled", true)?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
