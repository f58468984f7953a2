//! dirsnap CLI Binary
//!
//! Command-line interface for generating, recreating and comparing directory
//! snapshots.

use clap::Parser;
use dirsnap::cli::{exit_code_for_error, map_error, Cli, RunContext, EXIT_ERROR};
use dirsnap::config::ConfigLoader;
use dirsnap::logging::{init_logging, resolve_log_file_path, LoggingConfig};
use std::io::IsTerminal;
use std::process;
use tracing::{error, info};

fn main() {
    // Usage errors exit with clap's code 2, matching EXIT_ERROR.
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(EXIT_ERROR);
    }

    info!("dirsnap starting");

    let color = !cli.no_color && logging_config.color && std::io::stdout().is_terminal();
    let context = match RunContext::new(cli.config.clone()) {
        Ok(ctx) => ctx.with_color(color),
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(exit_code_for_error(&e));
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!(exit_code = output.exit_code(), "Command completed");
            for warning in &output.warnings {
                eprintln!("{}", warning);
            }
            if !output.text.is_empty() {
                println!("{}", output.text);
            }
            process::exit(output.exit_code());
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(exit_code_for_error(&e));
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let loaded = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path),
        None => std::env::current_dir()
            .map_err(Into::into)
            .and_then(|cwd| ConfigLoader::load(&cwd)),
    };
    let mut config = loaded.map(|c| c.logging).unwrap_or_default();

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
        // An explicit --log-output value still takes precedence below.
        if config.output == "file" {
            config.output = "file+stderr".to_string();
        }
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if cli.no_color {
        config.color = false;
    }

    let output_uses_file = config.output == "file" || config.output == "file+stderr";
    if config.enabled && output_uses_file {
        if let Ok(path) = resolve_log_file_path(cli.log_file.clone(), config.file.clone()) {
            config.file = Some(path);
        }
    } else if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}
