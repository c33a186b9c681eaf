// Data shapes returned by the analysis service. Field names mirror the
// JSON emitted by `POST /api/analyze`.

use serde::Deserialize;
use std::fmt;

/// Verdict from the analysis service.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeploymentStatus {
    Approved,
    Caution,
    Blocked,
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Approved => "APPROVED",
            Self::Caution => "CAUTION",
            Self::Blocked => "BLOCKED",
        };
        f.write_str(s)
    }
}

/// Bug priority tier. Declaration order is display order.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        };
        f.write_str(s)
    }
}

/// Issue counts per severity, as summarised by the server.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueCounts {
    #[serde(default)]
    pub critical: u32,
    #[serde(default)]
    pub high: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub low: u32,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Bug {
    pub severity: Severity,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub line_number: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fix_suggestion: Option<String>,
}

/// Parsed body of a successful analysis.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub quality_score: u8,
    pub deployment_status: DeploymentStatus,
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub issues: IssueCounts,
    #[serde(default)]
    pub bugs: Vec<Bug>,
    pub analysis_id: String,
    #[serde(default)]
    pub analyzed_at: Option<String>,
}

impl AnalysisResult {
    /// Critical bugs first, then high, in server order within each tier.
    pub fn important_bugs(&self) -> impl Iterator<Item = &Bug> {
        let critical = self.bugs.iter().filter(|b| b.severity == Severity::Critical);
        let high = self.bugs.iter().filter(|b| b.severity == Severity::High);
        critical.chain(high)
    }

    pub fn is_blocked(&self) -> bool {
        self.deployment_status == DeploymentStatus::Blocked
    }
}
