//! CLI output formatting for the build pipeline and the image job.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! clean
//!     0 files (1 ms)
//! markup
//!     3 files, 14.2 KB (4 ms)
//! styles
//!     FAILED: missing partial src/assets/css/layout.css: No such file or directory
//!
//! Build failed in styles stage
//!     Skipped: scripts, assets, templates, sitemap
//! ```
//!
//! ## Optimize
//!
//! Every original is listed first. Variant lines follow in completion order,
//! interleaved across images.
//!
//! ```text
//! 001 hero.jpg (4000x3000)
//! 002 team.png (unreadable)
//!     hero-large.webp 1920x1440, 210.4 KB (71.3% smaller)
//!     team-large.webp FAILED (1920w-large webp@80): Failed to read dimensions: ...
//!     hero-large.avif 1920x1440, 150.2 KB (79.4% smaller)
//!     ...
//!
//! Generated 12 of 24 variants from 2 images
//! 12 variants failed:
//!     team-large.webp FAILED (1920w-large webp@80): Failed to read dimensions: ...
//!     ...
//! ```
//!
//! # Architecture
//!
//! Each event or report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::optimize::{OptimizeEvent, OptimizeReport, VariantOutcome};
use crate::pipeline::{BuildReport, PipelineEvent, StageOutcome};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count.
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{} ms", elapsed.as_millis())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Build pipeline
// ============================================================================

/// Format a single pipeline progress event as display lines.
pub fn format_pipeline_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::StageStarted(stage) => vec![stage.to_string()],
        PipelineEvent::StageFinished {
            artifacts,
            bytes,
            elapsed,
            ..
        } => {
            let detail = if *artifacts == 0 {
                format!("0 files ({})", format_elapsed(*elapsed))
            } else {
                format!(
                    "{}, {} ({})",
                    plural(*artifacts, "file"),
                    format_bytes(*bytes),
                    format_elapsed(*elapsed)
                )
            };
            vec![format!("{}{}", indent(1), detail)]
        }
        PipelineEvent::StageFailed { error, .. } => {
            vec![format!("{}FAILED: {}", indent(1), error)]
        }
    }
}

pub fn print_pipeline_event(event: &PipelineEvent) {
    for line in format_pipeline_event(event) {
        println!("{}", line);
    }
}

/// Format the closing summary of a build.
pub fn format_build_summary(report: &BuildReport, output_root: &Path) -> Vec<String> {
    let mut lines = vec![String::new()];
    match report.failure() {
        None => {
            let count = report.artifacts().count();
            let bytes: u64 = report.artifacts().map(|a| a.bytes).sum();
            lines.push(format!(
                "Built {}, {} into {}",
                plural(count, "file"),
                format_bytes(bytes),
                output_root.display()
            ));
        }
        Some((stage, _)) => {
            lines.push(format!("Build failed in {} stage", stage));
            let skipped: Vec<String> = report
                .stages
                .iter()
                .filter(|r| matches!(r.outcome, StageOutcome::Skipped))
                .map(|r| r.stage.to_string())
                .collect();
            if !skipped.is_empty() {
                lines.push(format!("{}Skipped: {}", indent(1), skipped.join(", ")));
            }
        }
    }
    lines
}

pub fn print_build_summary(report: &BuildReport, output_root: &Path) {
    for line in format_build_summary(report, output_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Image job
// ============================================================================

fn format_reduction(percent: f64) -> String {
    if percent >= 0.0 {
        format!("{:.1}% smaller", percent)
    } else {
        format!("{:.1}% larger", -percent)
    }
}

/// Format a single variant outcome as one indented line.
pub fn format_variant_outcome(outcome: &VariantOutcome) -> String {
    match outcome {
        VariantOutcome::Succeeded {
            artifact,
            width,
            height,
            reduction_percent,
            ..
        } => format!(
            "{}{} {}x{}, {} ({})",
            indent(1),
            file_name(&artifact.path),
            width,
            height,
            format_bytes(artifact.bytes),
            format_reduction(*reduction_percent)
        ),
        VariantOutcome::Failed {
            image,
            variant,
            reason,
        } => {
            let stem = image
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!(
                "{}{} FAILED ({}): {}",
                indent(1),
                variant.file_name(&stem),
                variant,
                reason
            )
        }
    }
}

/// Format a single image job progress event as display lines.
pub fn format_optimize_event(event: &OptimizeEvent) -> Vec<String> {
    match event {
        OptimizeEvent::ImageFound {
            index,
            source,
            dimensions,
        } => {
            let detail = match dimensions {
                Some((w, h)) => format!("{}x{}", w, h),
                None => "unreadable".to_string(),
            };
            vec![format!(
                "{} {} ({})",
                format_index(*index),
                file_name(source),
                detail
            )]
        }
        OptimizeEvent::VariantFinished(outcome) => vec![format_variant_outcome(outcome)],
    }
}

pub fn print_optimize_event(event: &OptimizeEvent) {
    for line in format_optimize_event(event) {
        println!("{}", line);
    }
}

/// Format the closing summary of the image job. Failures are listed again
/// in combination order.
pub fn format_optimize_summary(report: &OptimizeReport) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Generated {} of {} from {}",
            report.succeeded(),
            plural(report.attempted(), "variant"),
            plural(report.originals, "image")
        ),
    ];
    if report.failed() > 0 {
        lines.push(format!("{} failed:", plural(report.failed(), "variant")));
        lines.extend(report.failures().map(format_variant_outcome));
    }
    lines
}

pub fn print_optimize_summary(report: &OptimizeReport) {
    for line in format_optimize_summary(report) {
        println!("{}", line);
    }
}
