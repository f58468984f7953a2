//! CLI output: error mapping and exit codes.

use crate::error::ApiError;

/// Success, or identical trees for `compare`.
pub const EXIT_SUCCESS: i32 = 0;
/// `compare` found differences.
pub const EXIT_DIFFERENCES: i32 = 1;
/// Any error: bad arguments, malformed artifact, write failure, strict mode.
pub const EXIT_ERROR: i32 = 2;

/// Outcome of a successful command that the exit code reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Differences,
}

/// Rendered result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Printed to stdout.
    pub text: String,
    /// Printed to stderr, one per line.
    pub warnings: Vec<String>,
    pub status: CommandStatus,
}

impl CommandOutput {
    pub fn success(text: String) -> Self {
        Self {
            text,
            warnings: Vec::new(),
            status: CommandStatus::Success,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            CommandStatus::Success => EXIT_SUCCESS,
            CommandStatus::Differences => EXIT_DIFFERENCES,
        }
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    format!("Error: {}", e)
}

/// Every error exits with the same code.
pub fn exit_code_for_error(_e: &ApiError) -> i32 {
    EXIT_ERROR
}
