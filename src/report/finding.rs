//! # Finding and Severity Definitions
//!
//! @title Security Finding Data Structures
//! @author Ramprasad
//!
//! Defines the core data structures for representing security findings
//! and their severity classification.

use colored::*;
use serde::{Deserialize, Serialize};

/// Severity level classification for security findings.
///
/// Ordered from lowest to highest severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding, no direct security impact.
    Info = 0,

    /// Low severity, minimal security impact.
    Low = 1,

    /// Medium severity, moderate security impact.
    Medium = 2,

    /// High severity, significant security impact.
    High = 3,

    /// Critical severity, severe security impact.
    Critical = 4,
}

impl Severity {
    /// Parses a severity level from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of severity
    ///
    /// # Returns
    ///
    /// The corresponding `Severity` variant, defaulting to `Info` for unknown values.
    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or(Severity::Info)
    }

    /// Strict variant of [`Severity::from_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }

    /// Returns a colored label for terminal output.
    pub fn colored_label(&self) -> ColoredString {
        match self {
            Severity::Critical => "CRITICAL".white().on_red().bold(),
            Severity::High => "HIGH".black().on_yellow().bold(),
            Severity::Medium => "MEDIUM".white().on_bright_blue().bold(),
            Severity::Low => "LOW".black().on_white().bold(),
            Severity::Info => "INFO".black().on_bright_white(),
        }
    }

    /// Returns a Markdown badge for the severity.
    pub fn markdown_badge(&self) -> &'static str {
        match self {
            Severity::Critical => {
                "![Critical](https://img.shields.io/badge/severity-CRITICAL-red)"
            }
            Severity::High => "![High](https://img.shields.io/badge/severity-HIGH-orange)",
            Severity::Medium => "![Medium](https://img.shields.io/badge/severity-MEDIUM-yellow)",
            Severity::Low => "![Low](https://img.shields.io/badge/severity-LOW-blue)",
            Severity::Info => "![Info](https://img.shields.io/badge/severity-INFO-lightgrey)",
        }
    }

    /// SARIF `level` for the severity.
    pub fn sarif_level(&self) -> &'static str {
        match self {
            Severity::Critical | Severity::High => "error",
            Severity::Medium => "warning",
            Severity::Low | Severity::Info => "note",
        }
    }

    /// GitHub workflow command for the severity.
    pub fn github_command(&self) -> &'static str {
        match self {
            Severity::Critical | Severity::High => "error",
            Severity::Medium => "warning",
            Severity::Low | Severity::Info => "notice",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::High => write!(f, "High"),
            Severity::Medium => write!(f, "Medium"),
            Severity::Low => write!(f, "Low"),
            Severity::Info => write!(f, "Info"),
        }
    }
}

/// A source position attached to a finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file_path: String,
    pub line: usize,
    pub column: usize,
}

/// Represents a security finding from static analysis.
///
/// Contains all information needed to understand, locate, and remediate
/// a detected insecure configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier derived from the rule, location and message; stable across
    /// runs over the same input.
    pub id: String,

    /// ID of the detector that produced this finding (e.g., "CA3077").
    pub detector_id: String,

    /// Short, descriptive title of the finding.
    pub title: String,

    /// Detailed description of the insecure configuration.
    pub description: String,

    /// Arguments the description was rendered from (member, type, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub message_args: Vec<String>,

    /// Severity classification.
    pub severity: Severity,

    /// Path to the source file of the primary location.
    pub file_path: String,

    /// Line number of the primary location.
    pub line: usize,

    /// Column number of the primary location.
    #[serde(default)]
    pub column: usize,

    /// Scope the finding belongs to (e.g., "App.SafeDoc..ctor").
    pub location: String,

    /// Further offending locations, e.g. every insecure assignment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_locations: Vec<Location>,

    /// Remediation guidance for fixing the configuration.
    pub remediation: String,

    /// CWE (Common Weakness Enumeration) identifier if applicable.
    pub cwe: Option<String>,
}

impl Finding {
    /// Prints the finding to terminal with color formatting.
    ///
    /// # Arguments
    ///
    /// * `index` - The finding number for display.
    pub fn print_terminal(&self, index: usize) {
        println!();
        println!(
            "{} {} [{}] {}",
            format!("#{}", index).cyan().bold(),
            self.severity.colored_label(),
            self.detector_id.yellow(),
            self.title.white().bold()
        );

        println!(
            "   {} {}:{} ({})",
            "Location:".dimmed(),
            self.file_path.blue(),
            self.line.to_string().cyan(),
            self.location.dimmed()
        );

        for extra in &self.additional_locations {
            println!(
                "   {} {}:{}",
                "Also at:".dimmed(),
                extra.file_path.blue(),
                extra.line.to_string().cyan()
            );
        }

        for line in self.description.lines() {
            println!("   {}", line.dimmed());
        }

        if let Some(ref cwe) = self.cwe {
            println!("   {} {}", "Reference:".dimmed(), cwe.blue());
        }

        println!("\n   {}", "Remediation:".green());
        for line in self.remediation.lines().take(3) {
            println!("   {}", line.green().dimmed());
        }

        println!("{}", "-".repeat(60).dimmed());
    }
}
