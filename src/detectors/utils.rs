//! # Detector Utilities
//!
//! @title Finding Post-Processing Utilities
//! @author Ramprasad
//!
//! Shared helpers for ordering and filtering findings after detection.

use crate::report::{Finding, Severity};
use std::collections::HashSet;

/// Deduplicates findings based on rule, location and message.
///
/// The same rule may reach one location through two paths (for example a
/// nested function analyzed as its own scope); only the first is kept.
///
/// # Arguments
///
/// * `findings` - Vector of findings to deduplicate
///
/// # Returns
///
/// A new vector with duplicates removed.
pub fn deduplicate_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|f| {
            let key = format!(
                "{}:{}:{}:{}:{}",
                f.detector_id, f.file_path, f.line, f.column, f.description
            );
            seen.insert(key)
        })
        .collect()
}

/// Sorts findings by severity (Critical first), then by location and rule.
pub fn sort_findings(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.file_path.cmp(&b.file_path))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.column.cmp(&b.column))
            .then_with(|| a.detector_id.cmp(&b.detector_id))
            .then_with(|| a.description.cmp(&b.description))
    });
    findings
}

/// Keeps findings at or above `min`.
pub fn filter_by_severity(findings: Vec<Finding>, min: Severity) -> Vec<Finding> {
    findings.into_iter().filter(|f| f.severity >= min).collect()
}

/// Applies `--only` and `--exclude` rule lists (case-insensitive).
pub fn filter_by_rules(findings: Vec<Finding>, only: &[String], exclude: &[String]) -> Vec<Finding> {
    let matches = |list: &[String], id: &str| list.iter().any(|r| r.eq_ignore_ascii_case(id));

    findings
        .into_iter()
        .filter(|f| only.is_empty() || matches(only, &f.detector_id))
        .filter(|f| !matches(exclude, &f.detector_id))
        .collect()
}
