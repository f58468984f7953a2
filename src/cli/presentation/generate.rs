//! Generate and recreate presentation: run summaries.

use super::shared::Palette;
use crate::artifact::{GenerateReport, RecreateReport};
use comfy_table::Table;
use std::path::Path;

pub fn format_generate_result(report: &GenerateReport, output: &Path, palette: Palette) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Entries", "Count"]);
    table.add_row(vec!["Directories".to_string(), report.directories.to_string()]);
    table.add_row(vec![
        "Files".to_string(),
        format!(
            "{} ({} text, {} base64)",
            report.files, report.text_files, report.base64_files
        ),
    ]);
    table.add_row(vec!["Bytes".to_string(), report.bytes.to_string()]);
    table.add_row(vec!["Skipped".to_string(), report.skipped.len().to_string()]);

    format!(
        "{} {}\n{}",
        palette.green("Wrote"),
        output.display(),
        table
    )
}

pub fn format_recreate_result(report: &RecreateReport, palette: Palette) -> String {
    format!(
        "{} {}\n  Directories created: {}\n  Files written: {}",
        palette.green("Recreated"),
        report.target.display(),
        report.directories_created,
        report.files_written
    )
}
