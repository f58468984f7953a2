//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::artifact::{
    default_output_name, generate_to_path, recreate_from_path, EncodingPolicy, RecreateOptions,
};
use crate::compare::{compare_sources, CompareOptions};
use crate::config::{ConfigLoader, DirsnapConfig};
use crate::error::{ApiError, ArgumentError};
use crate::ignore::ExcludeRules;
use crate::tree::render::render_structure;
use crate::tree::snapshot::Source;
use crate::tree::walker::{PathWalker, WalkConfig};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info_span};

use crate::cli::command_name;
use crate::cli::output::{CommandOutput, CommandStatus};
use crate::cli::parse::{Commands, WalkArgs};
use crate::cli::presentation::{
    format_compare_json, format_compare_text, format_config, format_generate_result,
    format_recreate_result, format_skipped_warnings, Palette,
};

/// Runtime context for CLI execution: effective configuration and the
/// directory relative outputs are resolved against.
pub struct RunContext {
    config: DirsnapConfig,
    cwd: PathBuf,
    palette: Palette,
}

impl RunContext {
    /// Load configuration for the current directory, or from `config_path`
    /// when given. Uses ConfigLoader only.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let cwd = std::env::current_dir()?;
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&cwd)?,
        };
        Ok(Self::from_config(config, cwd))
    }

    /// Context over an already loaded configuration.
    pub fn from_config(config: DirsnapConfig, cwd: PathBuf) -> Self {
        Self {
            config,
            cwd,
            palette: Palette::new(false),
        }
    }

    /// Enable or disable colored stdout.
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.palette = Palette::new(enabled);
        self
    }

    pub fn config(&self) -> &DirsnapConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let span = info_span!("command", name = command_name(command));
        let _enter = span.enter();
        debug!("Executing command");

        match command {
            Commands::Generate {
                root,
                output,
                strict,
                base64,
                walk,
            } => self.handle_generate(root, output.as_deref(), *strict, *base64, walk),
            Commands::Recreate {
                artifact,
                target,
                force,
            } => self.handle_recreate(artifact, target, *force),
            Commands::Compare {
                left,
                right,
                format,
                no_normalize,
                diff,
                context,
                walk,
            } => {
                let mut options = self.config.compare;
                options.normalize_unicode &= !*no_normalize;
                if *diff || context.is_some() {
                    options.unified_diff = true;
                }
                if let Some(lines) = context {
                    options.context_lines = *lines;
                }
                self.handle_compare(left, right, format, options, walk)
            }
            Commands::Tree { source, walk } => self.handle_tree(source, walk),
            Commands::Config { format } => {
                Ok(CommandOutput::success(format_config(&self.config, format)?))
            }
        }
    }

    /// Configured walk settings with command-line flags applied on top.
    fn walk_config(&self, args: &WalkArgs) -> Result<WalkConfig, ApiError> {
        if args.max_depth == Some(0) {
            return Err(ArgumentError::InvalidOption {
                option: "--max-depth".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        let mut walk = self.config.walk.clone();
        walk.exclude.extend(args.exclude.iter().cloned());
        if args.no_gitignore {
            walk.use_gitignore = false;
        }
        if args.follow_symlinks {
            walk.follow_symlinks = true;
        }
        if args.max_file_size.is_some() {
            walk.max_file_size = args.max_file_size;
        }
        if args.max_depth.is_some() {
            walk.max_depth = args.max_depth;
        }
        Ok(walk)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    fn handle_generate(
        &self,
        root: &Path,
        output: Option<&Path>,
        strict: bool,
        base64: bool,
        args: &WalkArgs,
    ) -> Result<CommandOutput, ApiError> {
        let walker = PathWalker::new(&self.resolve(root), self.walk_config(args)?)?;
        let output = match output {
            Some(path) => self.resolve(path),
            None => self
                .cwd
                .join(default_output_name(&walker.root_name(), Local::now())),
        };
        let policy = if base64 {
            EncodingPolicy::Base64
        } else {
            self.config.artifact.encoding
        };

        let report = generate_to_path(walker, &output, policy, strict)?;
        let text = format_generate_result(&report, &output, self.palette);
        Ok(CommandOutput::success(text).with_warnings(format_skipped_warnings(&report.skipped)))
    }

    fn handle_recreate(
        &self,
        artifact: &Path,
        target: &Path,
        force: bool,
    ) -> Result<CommandOutput, ApiError> {
        let options = RecreateOptions {
            allow_existing: force,
        };
        let report = recreate_from_path(&self.resolve(artifact), &self.resolve(target), options)?;
        Ok(CommandOutput::success(format_recreate_result(
            &report,
            self.palette,
        )))
    }

    fn handle_compare(
        &self,
        left: &Path,
        right: &Path,
        format: &str,
        options: CompareOptions,
        args: &WalkArgs,
    ) -> Result<CommandOutput, ApiError> {
        if format != "text" && format != "json" {
            return Err(ArgumentError::InvalidOption {
                option: "--format".to_string(),
                reason: format!("expected 'text' or 'json', found {:?}", format),
            }
            .into());
        }
        let walk = self.walk_config(args)?;
        let rules = ExcludeRules::new(walk.exclude.as_slice())?;

        let report = compare_sources(
            &self.resolve(left),
            &self.resolve(right),
            &walk,
            &rules,
            options,
        )?;

        let text = if format == "json" {
            format_compare_json(&report)?
        } else {
            format_compare_text(&report, self.palette)
        };
        let status = if report.is_identical() {
            CommandStatus::Success
        } else {
            CommandStatus::Differences
        };
        Ok(CommandOutput {
            text,
            warnings: format_skipped_warnings(&report.skipped),
            status,
        })
    }

    fn handle_tree(&self, source: &Path, args: &WalkArgs) -> Result<CommandOutput, ApiError> {
        let walk = self.walk_config(args)?;
        let rules = ExcludeRules::new(walk.exclude.as_slice())?;
        let snapshot = Source::resolve(&self.resolve(source))?
            .load_snapshot(&walk)?
            .filtered(&rules);
        Ok(CommandOutput::success(render_structure(&snapshot))
            .with_warnings(format_skipped_warnings(snapshot.skipped())))
    }
}
