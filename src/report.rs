// Result renderer and CI gate.
//
// `render_report` writes the human summary; `Outcome::exit_code` is the
// single place that decides pass/fail. Silent mode skips the former and
// never the latter.

use crossterm::style::Color;
use std::error::Error as _;
use std::io::Write;

use crate::error::AliceError;
use crate::model::{AnalysisResult, DeploymentStatus, Severity};
use crate::ui::Palette;

/// Maximum number of critical/high bugs listed individually.
pub const MAX_LISTED_BUGS: usize = 10;

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// What an `analyze` run ended with.
#[derive(Debug)]
pub enum Outcome {
    /// The service returned a verdict (any status, including BLOCKED).
    Completed(AnalysisResult),
    /// The pipeline stopped before a verdict was obtained.
    Failed(AliceError),
}

impl Outcome {
    /// 1 for BLOCKED or any failure, 0 for APPROVED and CAUTION.
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Completed(result) => gate(result.deployment_status),
            Outcome::Failed(err) => err.exit_code(),
        }
    }
}

pub fn gate(status: DeploymentStatus) -> u8 {
    match status {
        DeploymentStatus::Approved | DeploymentStatus::Caution => 0,
        DeploymentStatus::Blocked => 1,
    }
}

fn score_color(score: u8) -> Color {
    match score {
        75..=u8::MAX => Color::Green,
        60..=74 => Color::Yellow,
        _ => Color::Red,
    }
}

fn status_color(status: DeploymentStatus) -> Color {
    match status {
        DeploymentStatus::Approved => Color::Green,
        DeploymentStatus::Caution => Color::Yellow,
        DeploymentStatus::Blocked => Color::Red,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::High => Color::Yellow,
        Severity::Medium | Severity::Low => Color::Blue,
    }
}

/// Write the full human-readable report for `result`.
pub fn render_report<W: Write>(
    out: &mut W,
    result: &AnalysisResult,
    palette: &Palette,
) -> std::io::Result<()> {
    writeln!(out, "{}", palette.bold_color(format!("\n{RULE}\n"), Color::Cyan))?;
    writeln!(out, "{}", palette.bold("  ALICE Analysis Results\n"))?;
    writeln!(out, "{}", palette.bold_color(format!("{RULE}\n"), Color::Cyan))?;

    writeln!(
        out,
        "{} {}",
        palette.bold("Quality Score:"),
        palette.paint(format!("{}%", result.quality_score), score_color(result.quality_score))
    )?;
    writeln!(
        out,
        "{} {}",
        palette.bold("Deployment Status:"),
        palette.paint(result.deployment_status, status_color(result.deployment_status))
    )?;

    if result.is_blocked() {
        writeln!(out, "{}", palette.bold_color("\n⚠️  DEPLOYMENT BLOCKED ⚠️", Color::Red))?;
        writeln!(
            out,
            "{}",
            palette.paint(
                "Critical issues must be resolved before production deployment.\n",
                Color::Red
            )
        )?;
    }

    let issues = &result.issues;
    writeln!(out, "{}", palette.bold("\nSummary:"))?;
    writeln!(out, "  Files Analyzed: {}", result.total_files)?;
    writeln!(out, "  Critical Issues: {}", palette.paint(issues.critical, Color::Red))?;
    writeln!(out, "  High Priority: {}", palette.paint(issues.high, Color::Yellow))?;
    writeln!(out, "  Medium Priority: {}", issues.medium)?;
    writeln!(out, "  Low Priority: {}", issues.low)?;

    let important: Vec<_> = result.important_bugs().collect();
    if important.is_empty() {
        writeln!(out, "{}", palette.paint("\n✓ No critical issues found!\n", Color::Green))?;
    } else {
        writeln!(out, "{}", palette.bold("\nIssues Found:\n"))?;
        for (index, bug) in important.iter().take(MAX_LISTED_BUGS).enumerate() {
            writeln!(
                out,
                "{}. {} {}",
                index + 1,
                palette.paint(format!("[{}]", bug.severity), severity_color(bug.severity)),
                palette.bold(&bug.category)
            )?;
            writeln!(
                out,
                "   {} {}:{}",
                palette.dim("Location:"),
                bug.file_path,
                bug.line_number
            )?;
            writeln!(out, "   {} {}", palette.dim("Description:"), bug.description)?;
            if let Some(fix) = bug.fix_suggestion.as_deref().filter(|f| !f.is_empty()) {
                writeln!(out, "   {} {}", palette.dim("Fix:"), fix)?;
            }
            writeln!(out)?;
        }
        let remaining = important.len().saturating_sub(MAX_LISTED_BUGS);
        if remaining > 0 {
            writeln!(
                out,
                "{}",
                palette.dim(format!("... and {remaining} more critical/high issues\n"))
            )?;
        }
    }

    writeln!(out, "{}", palette.bold_color(format!("{RULE}\n"), Color::Cyan))?;
    writeln!(out, "{}", palette.dim(format!("Analysis ID: {}", result.analysis_id)))?;
    writeln!(out, "{}", palette.dim("Technical report sent to your email.\n"))?;
    Ok(())
}

/// Describe a pipeline failure with enough context to act on it.
pub fn render_failure<W: Write>(
    out: &mut W,
    err: &AliceError,
    palette: &Palette,
) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {}",
        palette.bold_color(format!("\n{}:", err.kind()), Color::Red),
        err
    )?;
    let mut source = err.source();
    while let Some(cause) = source {
        writeln!(out, "  {} {}", palette.dim("caused by:"), cause)?;
        source = cause.source();
    }
    match err {
        AliceError::Transport {
            payload: Some(payload),
            ..
        } => {
            writeln!(out, "{} {}", palette.paint("Server response:", Color::Red), payload)?;
        }
        AliceError::Format { preview, .. } => {
            writeln!(out, "{}", palette.paint("Raw response preview:", Color::Red))?;
            writeln!(out, "{preview}")?;
        }
        _ => {}
    }
    Ok(())
}
