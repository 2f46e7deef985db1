//! CLI output: error mapping and report formatting.

use crate::cli::route::CheckReport;
use crate::error::ApiError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Mount { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
            format!(
                "Mount failed at {}: {} (is fusermount3 installed and the mountpoint present?)",
                path.display(),
                source
            )
        }
        other => other.to_string(),
    }
}

/// Text summary of a `--check` run
pub fn format_check_report(report: &CheckReport) -> String {
    let mut lines = Vec::new();
    for (name, bytes) in &report.rendered {
        lines.push(format!("ok        {} ({} bytes)", name, bytes));
    }
    for error in &report.malformed {
        lines.push(format!("malformed {}", error));
    }
    lines.push(format!(
        "{} entries, {} ok, {} malformed",
        report.rendered.len() + report.malformed.len(),
        report.rendered.len(),
        report.malformed.len()
    ));
    lines.join("\n")
}
