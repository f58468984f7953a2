//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{
    exit_code_for_error, map_error, CommandOutput, CommandStatus, EXIT_DIFFERENCES, EXIT_ERROR,
    EXIT_SUCCESS,
};
pub use parse::{Cli, Commands, WalkArgs};
pub use route::RunContext;
