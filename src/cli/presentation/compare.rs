//! Compare presentation: added / removed / modified listings.

use super::shared::Palette;
use crate::compare::ComparisonReport;
use crate::error::ApiError;
use serde_json::json;

pub fn format_compare_text(report: &ComparisonReport, palette: Palette) -> String {
    let diff = &report.diff;
    let mut lines = vec![format!(
        "{} {} -> {}",
        palette.bold("Comparing"),
        report.left,
        report.right
    )];

    if diff.is_empty() {
        lines.push(palette.dimmed("No differences"));
        return lines.join("\n");
    }

    if !diff.added.is_empty() {
        lines.push(String::new());
        lines.push(format!("{} ({})", palette.green("Added"), diff.added.len()));
        for path in &diff.added {
            lines.push(format!("  {} {}", palette.green("+"), path));
        }
    }

    if !diff.removed.is_empty() {
        lines.push(String::new());
        lines.push(format!("{} ({})", palette.red("Removed"), diff.removed.len()));
        for path in &diff.removed {
            lines.push(format!("  {} {}", palette.red("-"), path));
        }
    }

    if !diff.modified.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{} ({})",
            palette.yellow("Modified"),
            diff.modified.len()
        ));
        for (path, modification) in &diff.modified {
            lines.push(format!(
                "  {} {} {}",
                palette.yellow("~"),
                path,
                palette.dimmed(&format!("({})", modification))
            ));
            let hunks = modification
                .line_diff()
                .and_then(|text| text.unified.as_deref());
            if let Some(hunks) = hunks {
                lines.extend(
                    hunks
                        .lines()
                        .map(|line| format!("      {}", diff_line(line, palette))),
                );
            }
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Total: {} added, {} removed, {} modified",
        diff.added.len(),
        diff.removed.len(),
        diff.modified.len()
    ));
    lines.join("\n")
}

fn diff_line(line: &str, palette: Palette) -> String {
    if line.starts_with("@@") {
        palette.cyan(line)
    } else if line.starts_with('+') {
        palette.green(line)
    } else if line.starts_with('-') {
        palette.red(line)
    } else {
        palette.dimmed(line)
    }
}

pub fn format_compare_json(report: &ComparisonReport) -> Result<String, ApiError> {
    let skipped: Vec<String> = report.skipped.iter().map(ToString::to_string).collect();
    let out = json!({
        "left": report.left,
        "right": report.right,
        "identical": report.is_identical(),
        "added": report.diff.added,
        "removed": report.diff.removed,
        "modified": report.diff.modified,
        "skipped": skipped,
    });
    serde_json::to_string_pretty(&out).map_err(|e| ApiError::Io(e.into()))
}
