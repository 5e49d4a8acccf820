//! # Report Generation Module
//!
//! @title Security Report Generator
//! @author Ramprasad
//!
//! Generates security reports in multiple formats including terminal output,
//! Markdown documents, JSON, SARIF and GitHub annotations for CI/CD
//! integration.
//!
//! ## Key Types
//!
//! - [`Report`] - Complete security analysis report
//! - [`Finding`] - Individual insecure-configuration finding
//! - [`Severity`] - Severity classification for findings

mod finding;
mod formatter;

pub use finding::{Finding, Location, Severity};
pub use formatter::*;

use colored::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete security analysis report.
///
/// Contains metadata about the scan, all findings, and summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the scan operation.
    pub metadata: ReportMetadata,

    /// All findings from the analysis.
    pub findings: Vec<Finding>,

    /// Summary statistics by severity.
    pub summary: ReportSummary,
}

/// Metadata about the scan operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Tool version used for the scan.
    pub version: String,

    /// Timestamp when the scan was performed.
    pub timestamp: String,

    /// Path that was scanned.
    pub scanned_path: String,

    /// Number of compilation dumps analyzed.
    pub files_analyzed: usize,
}

/// Summary of findings by severity level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Count of critical severity findings.
    pub critical: usize,

    /// Count of high severity findings.
    pub high: usize,

    /// Count of medium severity findings.
    pub medium: usize,

    /// Count of low severity findings.
    pub low: usize,

    /// Count of informational findings.
    pub info: usize,

    /// Total count of all findings.
    pub total: usize,
}

impl Report {
    /// Creates a new report from a collection of findings.
    ///
    /// Automatically calculates summary statistics from the findings.
    ///
    /// # Arguments
    ///
    /// * `findings` - Vector of security findings
    /// * `scanned_path` - Path that was analyzed
    /// * `files_analyzed` - Number of compilation dumps that were loaded
    ///
    /// # Returns
    ///
    /// A fully populated `Report` instance.
    pub fn new(findings: Vec<Finding>, scanned_path: PathBuf, files_analyzed: usize) -> Self {
        let summary = ReportSummary::from_findings(&findings);

        let metadata = ReportMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono_lite_timestamp(),
            scanned_path: scanned_path.display().to_string(),
            files_analyzed,
        };

        Self {
            metadata,
            findings,
            summary,
        }
    }

    /// Prints colorized output to the terminal.
    ///
    /// Displays each finding with appropriate color coding based on severity.
    pub fn print_terminal(&self) {
        if self.findings.is_empty() {
            println!("\n{}", "[+] No insecure XML configurations found.".green().bold());
            return;
        }

        println!("\n{}", "[!] Security Findings:".red().bold());
        println!("{}", "=".repeat(60).cyan());

        for (i, finding) in self.findings.iter().enumerate() {
            finding.print_terminal(i + 1);
        }
    }

    /// Prints summary statistics to the terminal.
    pub fn print_summary(&self) {
        println!(
            "{}",
            format!(
                "[*] Summary: {} Critical | {} High | {} Medium | {} Low | {} Info ({} compilation(s))",
                self.summary.critical,
                self.summary.high,
                self.summary.medium,
                self.summary.low,
                self.summary.info,
                self.metadata.files_analyzed
            )
            .bold()
        );

        if self.summary.total == 0 {
            println!("{}", "[+] No issues found.".green().bold());
            return;
        }

        let message = format!("[!] Total: {} issue(s) found", self.summary.total);
        if self.summary.critical > 0 {
            println!("{}", message.red().bold());
        } else if self.summary.high > 0 {
            println!("{}", message.yellow().bold());
        } else {
            println!("{}", message.blue().bold());
        }
    }

    /// Converts the report to Markdown format.
    pub fn to_markdown(&self) -> String {
        formatter::to_markdown(self)
    }

    /// Converts the report to a pretty-printed SARIF 2.1.0 document.
    pub fn to_sarif(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&formatter::to_sarif(self))
    }

    /// Converts the report to GitHub Actions annotations.
    pub fn to_github(&self) -> String {
        formatter::to_github(self)
    }

    /// Returns `true` if any finding is at or above `severity`.
    pub fn has_findings_at_or_above(&self, severity: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= severity)
    }
}

impl ReportSummary {
    /// Creates a summary from a collection of findings.
    fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = ReportSummary {
            total: findings.len(),
            ..Default::default()
        };

        for finding in findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
        }

        summary
    }
}

/// Generates a simple timestamp without external dependencies.
fn chrono_lite_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            id: "CA3077-00000001".to_string(),
            detector_id: "CA3077".to_string(),
            title: "Test Finding".to_string(),
            description: "Test description".to_string(),
            message_args: vec![],
            severity,
            file_path: "Doc.cs".to_string(),
            line: 10,
            column: 5,
            location: "App.Doc..ctor".to_string(),
            additional_locations: vec![],
            remediation: "Fix it".to_string(),
            cwe: Some("CWE-611".to_string()),
        }
    }

    #[test]
    fn test_report_creation() {
        let report = Report::new(
            vec![finding(Severity::High), finding(Severity::Medium)],
            PathBuf::from("./dumps"),
            3,
        );

        assert_eq!(report.summary.high, 1);
        assert_eq!(report.summary.medium, 1);
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.metadata.files_analyzed, 3);
        assert!(report.has_findings_at_or_above(Severity::High));
        assert!(!report.has_findings_at_or_above(Severity::Critical));
    }

    #[test]
    fn test_json_round_trip_keeps_findings() {
        let report = Report::new(vec![finding(Severity::Medium)], PathBuf::from("."), 1);
        let json = serde_json::to_string(&report).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.findings, report.findings);
    }
}
