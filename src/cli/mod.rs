//! # CLI Module
//!
//! @title Command Line Interface
//! @author Ramprasad
//!
//! This module defines the command-line interface for XML-Sentinel using
//! the `clap` derive macros for declarative argument parsing.
//!
//! ## Commands
//!
//! - `scan` - Analyze compilation dumps for insecure XML configuration
//! - `diff` - Compare the findings of two scans
//! - `init` - Write a default `sentinel.json`
//! - `list` - Display available detectors
//! - `version` - Show version information

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// XML-Sentinel command-line interface.
///
/// A static analysis security scanner for .NET compilations. Detects XML
/// parsers and XSLT processors configured to resolve external entities,
/// process DTDs or run embedded script.
#[derive(Parser, Debug)]
#[command(name = "xml-sentinel")]
#[command(author = "Ramprasad")]
#[command(version)]
#[command(about = "Static analysis scanner for insecure XML and XSLT configuration in .NET code")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format of a scan.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colorized console output.
    Terminal,
    /// The full report as JSON.
    Json,
    /// Human-readable Markdown report.
    Markdown,
    /// SARIF 2.1.0 for code scanning.
    Sarif,
    /// GitHub Actions workflow annotations.
    Github,
}

impl OutputFormat {
    /// File name used when the report is written to `--output`.
    pub fn report_file_name(&self) -> &'static str {
        match self {
            OutputFormat::Terminal => "security_report.txt",
            OutputFormat::Json => "security_report.json",
            OutputFormat::Markdown => "security_report.md",
            OutputFormat::Sarif => "security_report.sarif",
            OutputFormat::Github => "annotations.txt",
        }
    }

    /// Whether the output is meant for people rather than tools.
    pub fn is_interactive(&self) -> bool {
        matches!(self, OutputFormat::Terminal)
    }
}

/// Available subcommands for the XML-Sentinel CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan compilation dumps for insecure XML configuration.
    ///
    /// Analyzes every `*.json` compilation dump for XmlDocument/XmlTextReader
    /// subclasses with insecure defaults, parsers loading input insecurely,
    /// and XSLT loaded with script enabled.
    Scan {
        /// Path to a compilation dump or a directory of dumps.
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Scan directories recursively.
        #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
        recursive: bool,

        /// Output format for the security report.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
        format: OutputFormat,

        /// Output directory for the report.
        ///
        /// If not specified, the report is printed to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum severity level to include in results.
        ///
        /// Valid values: critical, high, medium, low, info
        #[arg(short, long)]
        severity: Option<String>,

        /// Exclude specific detectors from the scan.
        ///
        /// Comma-separated list of rule IDs to skip.
        /// Example: --exclude CA3076,CA3077
        #[arg(short = 'x', long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Include only specific detectors in the scan.
        ///
        /// Comma-separated list of rule IDs to run.
        /// Example: --only CA3075
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Rule configuration file (defaults to ./sentinel.json if present).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Target framework moniker overriding the one each dump declares.
        ///
        /// Example: --target-framework net451
        #[arg(long)]
        target_framework: Option<String>,

        /// Glob patterns of type names to exclude from analysis.
        ///
        /// Example: --skip-types 'MyApp.Generated.*'
        #[arg(long, value_delimiter = ',')]
        skip_types: Vec<String>,

        /// Exit with status 1 when a finding at or above this severity remains.
        #[arg(long)]
        fail_on: Option<String>,
    },

    /// Compare security findings between two versions.
    ///
    /// Runs a full scan on both paths and reports:
    /// - New findings (regressions)
    /// - Fixed findings
    Diff {
        /// Path to the old version (base).
        #[arg(value_name = "OLD_PATH")]
        old_path: PathBuf,

        /// Path to the new version (target).
        #[arg(value_name = "NEW_PATH")]
        new_path: PathBuf,

        /// Rule configuration file applied to both scans.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize XML-Sentinel configuration.
    ///
    /// Writes `sentinel.json` listing every rule with its defaults.
    Init {
        /// Directory to write the configuration into.
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Overwrite an existing configuration.
        #[arg(long)]
        force: bool,

        /// Also generate a GitHub Actions workflow running the scan.
        #[arg(long)]
        workflow: bool,
    },

    /// List all available detectors.
    ///
    /// Displays the ID, name, severity, and description of each
    /// registered detector.
    List,

    /// Print version information.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Verify that the CLI definition is valid.
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_arguments() {
        let cli = Cli::parse_from([
            "xml-sentinel",
            "scan",
            "dumps",
            "--format",
            "sarif",
            "--only",
            "CA3075,CA3077",
            "--skip-types",
            "App.Generated.*",
            "--target-framework",
            "net451",
        ]);

        match cli.command {
            Commands::Scan {
                format,
                only,
                skip_types,
                target_framework,
                recursive,
                ..
            } => {
                assert_eq!(format, OutputFormat::Sarif);
                assert_eq!(only, vec!["CA3075", "CA3077"]);
                assert_eq!(skip_types, vec!["App.Generated.*"]);
                assert_eq!(target_framework.as_deref(), Some("net451"));
                assert!(recursive);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
