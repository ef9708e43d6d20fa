//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and the binary prints the lines. Format functions are pure:
//! no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! 001 beach.png
//!     4000x3000 → 1920x1440
//!     2.4 MB → 412.0 KB (83% smaller)
//!     Output: compressed/beach.jpg
//! 002 notes.png
//!     Error: Failed to load image: format could not be determined
//!
//! Compressed 1 of 2 images
//! ```
//!
//! ## Dimensions
//!
//! ```text
//! 001 beach.png 4000x3000 (image/png)
//! ```
//!
//! With `--json` the same records are printed as a JSON array instead.

use crate::types::Dimensions;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of compressing one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressReport {
    pub source: PathBuf,
    #[serde(flatten)]
    pub outcome: CompressOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompressOutcome {
    Compressed {
        output: PathBuf,
        original: Dimensions,
        compressed: Dimensions,
        original_bytes: u64,
        compressed_bytes: u64,
    },
    Failed {
        error: String,
    },
}

/// Dimensions probe result for one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionsReport {
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte count using 1024-based units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Size change as a phrase: `83% smaller`, `12% larger`, `same size`.
pub fn format_savings(original: u64, compressed: u64) -> String {
    if original == 0 || original == compressed {
        return "same size".to_string();
    }
    let ratio = compressed as f64 / original as f64;
    let percent = ((1.0 - ratio) * 100.0).round().abs() as u64;
    if compressed < original {
        format!("{percent}% smaller")
    } else {
        format!("{percent}% larger")
    }
}

pub fn format_compress_output(reports: &[CompressReport]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut succeeded = 0;

    for (i, report) in reports.iter().enumerate() {
        lines.push(format!(
            "{} {}",
            format_index(i + 1),
            display_name(&report.source)
        ));
        match &report.outcome {
            CompressOutcome::Compressed {
                output,
                original,
                compressed,
                original_bytes,
                compressed_bytes,
            } => {
                succeeded += 1;
                lines.push(format!("{}{original} → {compressed}", indent(1)));
                lines.push(format!(
                    "{}{} → {} ({})",
                    indent(1),
                    format_bytes(*original_bytes),
                    format_bytes(*compressed_bytes),
                    format_savings(*original_bytes, *compressed_bytes)
                ));
                lines.push(format!("{}Output: {}", indent(1), output.display()));
            }
            CompressOutcome::Failed { error } => {
                lines.push(format!("{}Error: {error}", indent(1)));
            }
        }
    }

    if !reports.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Compressed {succeeded} of {} images",
        reports.len()
    ));
    lines
}

pub fn format_dimensions_output(reports: &[DimensionsReport]) -> Vec<String> {
    reports
        .iter()
        .enumerate()
        .map(|(i, report)| {
            let name = display_name(&report.source);
            match (&report.dimensions, &report.error) {
                (Some(dims), _) => match report.mime_type {
                    Some(mime) => format!("{} {name} {dims} ({mime})", format_index(i + 1)),
                    None => format!("{} {name} {dims}", format_index(i + 1)),
                },
                (None, Some(err)) => format!("{} {name} Error: {err}", format_index(i + 1)),
                (None, None) => format!("{} {name}", format_index(i + 1)),
            }
        })
        .collect()
}
