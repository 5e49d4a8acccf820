//! # Report Formatters
//!
//! @title Markdown, SARIF and GitHub Renderers
//! @author Ramprasad
//!
//! Renders a [`Report`] for humans (Markdown) and for CI systems (SARIF 2.1.0
//! for code scanning, workflow commands for GitHub Actions annotations).

use super::{Finding, Report};
use serde_json::{json, Value};
use std::collections::BTreeMap;

const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";

/// Renders the report as a Markdown document.
pub fn to_markdown(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# XML-Sentinel Security Report\n\n");
    md.push_str(&format!(
        "- **Version:** {}\n- **Scanned path:** `{}`\n- **Compilations analyzed:** {}\n\n",
        report.metadata.version, report.metadata.scanned_path, report.metadata.files_analyzed
    ));

    md.push_str("## Summary\n\n");
    md.push_str("| Severity | Count |\n|----------|-------|\n");
    for (label, count) in [
        ("Critical", report.summary.critical),
        ("High", report.summary.high),
        ("Medium", report.summary.medium),
        ("Low", report.summary.low),
        ("Info", report.summary.info),
    ] {
        md.push_str(&format!("| {} | {} |\n", label, count));
    }
    md.push_str(&format!("| **Total** | **{}** |\n\n", report.summary.total));

    if report.findings.is_empty() {
        md.push_str("No insecure XML configurations found.\n");
        return md;
    }

    md.push_str("## Findings\n\n");
    for (i, finding) in report.findings.iter().enumerate() {
        md.push_str(&format!(
            "### {}. [{}] {}\n\n{}\n\n",
            i + 1,
            finding.detector_id,
            finding.title,
            finding.severity.markdown_badge()
        ));
        md.push_str(&format!(
            "**Location:** `{}:{}` in `{}`\n\n",
            finding.file_path, finding.line, finding.location
        ));
        for extra in &finding.additional_locations {
            md.push_str(&format!("- also at `{}:{}`\n", extra.file_path, extra.line));
        }
        if !finding.additional_locations.is_empty() {
            md.push('\n');
        }

        md.push_str(&format!("{}\n\n", finding.description));
        if let Some(ref cwe) = finding.cwe {
            md.push_str(&format!("**Reference:** {}\n\n", cwe));
        }
        md.push_str("**Remediation:**\n\n");
        for line in finding.remediation.lines() {
            md.push_str(&format!("> {}\n", line));
        }
        md.push_str("\n---\n\n");
    }

    md
}

/// Renders the report as a SARIF 2.1.0 log.
pub fn to_sarif(report: &Report) -> Value {
    json!({
        "$schema": SARIF_SCHEMA,
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": report.metadata.version,
                    "informationUri": env!("CARGO_PKG_REPOSITORY"),
                    "rules": sarif_rules(&report.findings)
                }
            },
            "results": report.findings.iter().map(sarif_result).collect::<Vec<_>>()
        }]
    })
}

fn sarif_rules(findings: &[Finding]) -> Vec<Value> {
    let mut rules: BTreeMap<&str, Value> = BTreeMap::new();

    for finding in findings {
        rules.entry(finding.detector_id.as_str()).or_insert_with(|| {
            let mut rule = json!({
                "id": finding.detector_id,
                "shortDescription": { "text": finding.title },
                "help": { "text": finding.remediation },
                "defaultConfiguration": { "level": finding.severity.sarif_level() }
            });
            if let Some(ref cwe) = finding.cwe {
                rule["properties"] = json!({ "tags": ["security", cwe] });
            }
            rule
        });
    }

    rules.into_values().collect()
}

fn sarif_result(finding: &Finding) -> Value {
    let location = |file: &str, line: usize, column: usize| {
        let mut region = json!({ "startLine": line.max(1) });
        if column > 0 {
            region["startColumn"] = json!(column);
        }
        json!({
            "physicalLocation": {
                "artifactLocation": { "uri": file, "uriBaseId": "%SRCROOT%" },
                "region": region
            }
        })
    };

    let mut result = json!({
        "ruleId": finding.detector_id,
        "level": finding.severity.sarif_level(),
        "message": { "text": finding.description },
        "locations": [location(&finding.file_path, finding.line, finding.column)],
        "partialFingerprints": { "primaryLocationLineHash": finding.id }
    });

    if !finding.additional_locations.is_empty() {
        result["relatedLocations"] = Value::Array(
            finding
                .additional_locations
                .iter()
                .map(|l| location(&l.file_path, l.line, l.column))
                .collect(),
        );
    }
    if !finding.message_args.is_empty() {
        result["properties"] = json!({ "messageArguments": finding.message_args });
    }

    result
}

/// Renders the findings as GitHub Actions workflow commands, one per line.
///
/// Format: `::error file={path},line={line},title={title}::{message}`
pub fn to_github(report: &Report) -> String {
    report
        .findings
        .iter()
        .map(|f| {
            format!(
                "::{} file={},line={},col={},title={}::{}",
                f.severity.github_command(),
                escape_property(&f.file_path),
                f.line,
                f.column,
                escape_property(&format!("{} {}", f.detector_id, f.title)),
                escape_data(&f.description)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Location, Severity};
    use std::path::PathBuf;

    fn report() -> Report {
        let finding = Finding {
            id: "CA3075-0000beef".to_string(),
            detector_id: "CA3075".to_string(),
            title: "Insecure DTD processing in `doc.Load`".to_string(),
            description: "'App.Loader.Run' calls 'Load', see docs".to_string(),
            message_args: vec!["doc".to_string(), "Load".to_string()],
            severity: Severity::High,
            file_path: "Loader.cs".to_string(),
            line: 4,
            column: 9,
            location: "App.Loader.Run".to_string(),
            additional_locations: vec![Location {
                file_path: "Loader.cs".to_string(),
                line: 3,
                column: 0,
            }],
            remediation: "Set XmlResolver = null".to_string(),
            cwe: Some("CWE-611".to_string()),
        };
        Report::new(vec![finding], PathBuf::from("dumps"), 1)
    }

    #[test]
    fn test_markdown_lists_findings() {
        let md = to_markdown(&report());
        assert!(md.contains("| High | 1 |"));
        assert!(md.contains("### 1. [CA3075]"));
        assert!(md.contains("also at `Loader.cs:3`"));
    }

    #[test]
    fn test_sarif_shape() {
        let sarif = to_sarif(&report());
        assert_eq!(sarif["version"], "2.1.0");

        let run = &sarif["runs"][0];
        assert_eq!(run["tool"]["driver"]["rules"][0]["id"], "CA3075");

        let result = &run["results"][0];
        assert_eq!(result["level"], "error");
        assert_eq!(result["locations"][0]["physicalLocation"]["region"]["startLine"], 4);
        assert_eq!(result["relatedLocations"][0]["physicalLocation"]["region"]["startLine"], 3);
    }

    #[test]
    fn test_github_annotations_escaped() {
        let output = to_github(&report());
        assert!(output.starts_with("::error file=Loader.cs,line=4,col=9,"));
        assert!(output.contains("title=CA3075 Insecure DTD processing in `doc.Load`::"));
        // Commas are only escaped in properties, not in the message.
        assert!(output.ends_with("calls 'Load', see docs"));
    }
}
