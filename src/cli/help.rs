//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name recorded on the command span (e.g. "generate", "compare").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate { .. } => "generate",
        Commands::Recreate { .. } => "recreate",
        Commands::Compare { .. } => "compare",
        Commands::Tree { .. } => "tree",
        Commands::Config { .. } => "config",
    }
}
