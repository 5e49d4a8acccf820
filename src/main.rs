//! # XML-Sentinel CLI Entry Point
//!
//! @title XML-Sentinel CLI
//! @author Ramprasad
//!
//! This module provides the main entry point for the XML-Sentinel
//! command-line security scanner.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use xml_sentinel::cli::{Commands, OutputFormat};
use xml_sentinel::config::{CliOverrides, CONFIG_FILE_NAME};
use xml_sentinel::detectors::utils;
use xml_sentinel::host::load_compilation;
use xml_sentinel::{AnalysisContext, AnalysisError, Cli, DetectorRegistry, Finding, Report};
use xml_sentinel::{SentinelConfig, Severity};

/// ASCII art banner displayed at startup.
const BANNER: &str = r#"
 __  __ __  __ _        ____             _   _            _
 \ \/ /|  \/  | |      / ___|  ___ _ __ | |_(_)_ __   ___| |
  \  / | |\/| | |      \___ \ / _ \ '_ \| __| | '_ \ / _ \ |
  /  \ | |  | | |___    ___) |  __/ | | | |_| | | | |  __/ |
 /_/\_\|_|  |_|_____|  |____/ \___|_| |_|\__|_|_| |_|\___|_|

        Insecure XML / XSLT Configuration Scanner for .NET
"#;

/// Options of one `scan` invocation.
struct ScanRequest {
    path: PathBuf,
    recursive: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
    min_severity: Option<String>,
    exclude: Vec<String>,
    only: Vec<String>,
    config: Option<PathBuf>,
    overrides: CliOverrides,
    fail_on: Option<String>,
}

/// Findings of one scan and the number of dumps that were analyzed.
struct ScanOutcome {
    findings: Vec<Finding>,
    files_analyzed: usize,
}

/// Application entry point.
///
/// Initializes the logging system, parses command-line arguments, and
/// dispatches to the appropriate command handler.
///
/// # Returns
///
/// Returns `Ok(())` on successful execution, or an error if any operation fails.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            path,
            recursive,
            format,
            output,
            severity,
            exclude,
            only,
            config,
            target_framework,
            skip_types,
            fail_on,
        } => {
            if format.is_interactive() {
                println!("{}", BANNER.cyan().bold());
            }
            let failed = run_scan(ScanRequest {
                path,
                recursive,
                format,
                output,
                min_severity: severity,
                exclude,
                only,
                config,
                overrides: CliOverrides {
                    target_framework,
                    skip_types,
                },
                fail_on,
            })?;
            if failed {
                std::process::exit(1);
            }
        }
        Commands::List => {
            list_detectors();
        }
        Commands::Version => {
            println!(
                "{} {}",
                "XML-Sentinel version:".green(),
                env!("CARGO_PKG_VERSION").yellow()
            );
        }
        Commands::Diff {
            old_path,
            new_path,
            config,
        } => {
            run_diff(old_path, new_path, config)?;
        }
        Commands::Init {
            dir,
            force,
            workflow,
        } => {
            run_init(&dir, force, workflow)?;
        }
    }

    Ok(())
}

/// Writes the default rule configuration (and optionally a CI workflow).
fn run_init(dir: &Path, force: bool, workflow: bool) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create {}", dir.display()))?;

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        println!(
            "{} {}",
            "[!] Configuration already exists:".yellow(),
            config_path.display()
        );
    } else {
        let config = SentinelConfig::default_for(&DetectorRegistry::new());
        std::fs::write(&config_path, config.to_json()?)
            .with_context(|| format!("cannot write {}", config_path.display()))?;
        println!(
            "{} {}",
            "[+] Wrote configuration:".green().bold(),
            config_path.display().to_string().yellow()
        );
    }

    if workflow {
        write_workflow(dir)?;
    }

    Ok(())
}

fn write_workflow(dir: &Path) -> Result<()> {
    let workflow_dir = dir.join(".github").join("workflows");
    let workflow_path = workflow_dir.join("xml-sentinel.yml");

    if workflow_path.exists() {
        println!(
            "{} {}",
            "[!] Workflow file already exists:".yellow(),
            workflow_path.display()
        );
        return Ok(());
    }

    std::fs::create_dir_all(&workflow_dir)?;

    let workflow_content = r#"name: XML-Sentinel Security Scan

on:
  pull_request:
    branches: [ "master", "main" ]
  push:
    branches: [ "master", "main" ]

jobs:
  xml_scan:
    name: XML-Sentinel Scan
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4

      - name: Install Rust
        uses: dtolnay/rust-toolchain@stable

      - name: Install XML-Sentinel
        run: cargo install --git https://github.com/Ramprasad4121/xml-sentinel --branch main

      # Compilation dumps are produced by the build's front-end step.
      - name: Run Security Scan
        run: xml-sentinel scan ./compilation-dumps --format github --fail-on high
"#;

    std::fs::write(&workflow_path, workflow_content)?;

    println!(
        "{} {}",
        "[+] Generated GitHub Actions workflow:".green().bold(),
        workflow_path.display().to_string().yellow()
    );
    Ok(())
}

/// Executes the security scan operation.
///
/// This function orchestrates the complete scanning workflow:
/// 1. Loads the rule configuration and applies CLI overrides
/// 2. Loads every compilation dump under the path
/// 3. Runs all enabled detectors
/// 4. Filters and renders the report in the requested format
///
/// # Returns
///
/// `true` when `--fail-on` is set and a finding at or above it remains.
fn run_scan(request: ScanRequest) -> Result<bool> {
    let mut config = SentinelConfig::load_or_default(request.config.as_deref())?;
    config.apply_cli_overrides(&request.overrides);

    if request.format.is_interactive() {
        println!(
            "{} {}",
            "[*] Scanning:".green().bold(),
            request.path.display().to_string().yellow()
        );
    }

    let outcome = perform_scan(&request.path, request.recursive, &config)?;

    let mut findings = outcome.findings;
    if let Some(ref min_sev) = request.min_severity {
        findings = utils::filter_by_severity(findings, Severity::from_str(min_sev));
    }
    findings = utils::filter_by_rules(findings, &request.only, &request.exclude);

    let report = Report::new(findings, request.path.clone(), outcome.files_analyzed);

    let rendered = match request.format {
        OutputFormat::Json => Some(serde_json::to_string_pretty(&report)?),
        OutputFormat::Markdown => Some(report.to_markdown()),
        OutputFormat::Sarif => Some(report.to_sarif()?),
        OutputFormat::Github => Some(report.to_github()),
        OutputFormat::Terminal => None,
    };

    match (rendered, &request.output) {
        (Some(content), Some(out_dir)) => {
            let report_path = write_report(out_dir, request.format, &content)?;
            eprintln!(
                "{} {}",
                "[+] Report saved to:".green(),
                report_path.display().to_string().yellow()
            );
        }
        (Some(content), None) => println!("{}", content),
        (None, output) => {
            report.print_terminal();
            if let Some(out_dir) = output {
                let json = serde_json::to_string_pretty(&report)?;
                let report_path = write_report(out_dir, OutputFormat::Json, &json)?;
                println!(
                    "\n{} {}",
                    "[+] Report saved to:".green(),
                    report_path.display().to_string().yellow()
                );
            }
            println!("\n{}", "=".repeat(60).cyan());
            report.print_summary();
        }
    }

    Ok(match request.fail_on {
        Some(ref level) => match Severity::parse(level) {
            Some(threshold) => report.has_findings_at_or_above(threshold),
            None => bail!("invalid --fail-on severity `{}`", level),
        },
        None => false,
    })
}

fn write_report(out_dir: &Path, format: OutputFormat, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;
    let report_path = out_dir.join(format.report_file_name());
    std::fs::write(&report_path, content)
        .with_context(|| format!("cannot write {}", report_path.display()))?;
    Ok(report_path)
}

/// Loads and analyzes every compilation dump under `path`.
///
/// A dump that fails to load is logged and skipped; it never aborts the
/// others.
fn perform_scan(path: &Path, recursive: bool, config: &SentinelConfig) -> Result<ScanOutcome> {
    use indicatif::{ProgressBar, ProgressStyle};

    if !path.exists() {
        bail!("path does not exist: {}", path.display());
    }

    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        collect_dump_files(path, recursive)
    };

    let options = config.analysis_options()?;
    let registry = DetectorRegistry::with_config(config);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut all_findings = Vec::new();
    let mut files_analyzed = 0;

    for file_path in &files {
        pb.set_message(format!(
            "Analyzing {}",
            file_path.file_name().unwrap_or_default().to_string_lossy()
        ));

        match load_compilation(file_path) {
            Ok(compilation) => {
                let display = file_path.display().to_string();
                let context = AnalysisContext::with_options(&compilation, &display, &options);
                match registry.run_all(&context) {
                    Ok(findings) => {
                        log::info!(
                            "{}: {} finding(s) in compilation `{}`",
                            display,
                            findings.len(),
                            compilation.name
                        );
                        all_findings.extend(findings);
                        files_analyzed += 1;
                    }
                    Err(AnalysisError::Cancelled) => {
                        log::warn!("Analysis of {} was cancelled", display);
                    }
                }
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", file_path.display(), e);
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(ScanOutcome {
        findings: utils::sort_findings(utils::deduplicate_findings(all_findings)),
        files_analyzed,
    })
}

fn run_diff(old_path: PathBuf, new_path: PathBuf, config: Option<PathBuf>) -> Result<()> {
    println!("{}", "[*] Running Differential Analysis...".blue().bold());

    let config = SentinelConfig::load_or_default(config.as_deref())?;

    // Canonicalize paths to ensure consistent diffs
    let old_abs = std::fs::canonicalize(&old_path).unwrap_or_else(|_| old_path.clone());
    let new_abs = std::fs::canonicalize(&new_path).unwrap_or_else(|_| new_path.clone());

    println!("{} {}", "[base]".dimmed(), old_abs.display());
    let old_findings = perform_scan(&old_abs, true, &config)?.findings;

    println!("{} {}", "[target]".dimmed(), new_abs.display());
    let new_findings = perform_scan(&new_abs, true, &config)?.findings;

    // Keyed by rule, path relative to the scan root and line.
    let key_of = |f: &Finding, base: &Path| -> String {
        let file = PathBuf::from(&f.file_path);
        let relative = pathdiff::diff_paths(&file, base).unwrap_or(file);
        format!("{}:{}:{}", f.detector_id, relative.display(), f.line)
    };

    let old_map: HashMap<String, &Finding> =
        old_findings.iter().map(|f| (key_of(f, &old_abs), f)).collect();
    let new_map: HashMap<String, &Finding> =
        new_findings.iter().map(|f| (key_of(f, &new_abs), f)).collect();

    let mut new_risks: Vec<&Finding> = new_map
        .iter()
        .filter(|(key, _)| !old_map.contains_key(*key))
        .map(|(_, f)| *f)
        .collect();
    let mut fixed_issues: Vec<&Finding> = old_map
        .iter()
        .filter(|(key, _)| !new_map.contains_key(*key))
        .map(|(_, f)| *f)
        .collect();
    new_risks.sort_by(|a, b| (&a.file_path, a.line).cmp(&(&b.file_path, b.line)));
    fixed_issues.sort_by(|a, b| (&a.file_path, a.line).cmp(&(&b.file_path, b.line)));

    println!("\n{}", "=== Differential Analysis Results ===".white().bold());

    if new_risks.is_empty() && fixed_issues.is_empty() {
        println!("{}", "No security changes detected.".green());
        return Ok(());
    }

    if !new_risks.is_empty() {
        println!("\n{}", "[NEW RISKS DETECTED]".red().bold());
        for f in new_risks {
            println!("  [{}] {} ({})", f.detector_id.red(), f.title, f.location);
        }
    }

    if !fixed_issues.is_empty() {
        println!("\n{}", "[ISSUES FIXED]".green().bold());
        for f in fixed_issues {
            println!("  [{}] {} ({})", f.detector_id.green(), f.title, f.location);
        }
    }

    Ok(())
}

/// Collects compilation dumps (`*.json`) from a directory.
///
/// The rule configuration file and hidden directories are skipped.
fn collect_dump_files(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    use walkdir::WalkDir;

    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path().extension().map_or(false, |ext| ext == "json")
                && e.file_name() != CONFIG_FILE_NAME
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    files
}

/// Displays all available detectors.
///
/// Prints a formatted list of registered detectors including their
/// IDs, names, severity levels, and descriptions.
fn list_detectors() {
    let registry = DetectorRegistry::new();

    println!("{}", "[*] Available Detectors:".green().bold());
    println!("{}", "-".repeat(60).cyan());

    for detector in registry.detectors() {
        println!(
            "  {} {} [{}] {}",
            detector.id().cyan().bold(),
            detector.name().white(),
            detector.severity().to_string().yellow(),
            detector.cwe().unwrap_or_default().dimmed()
        );
        println!("     {}", detector.description().dimmed());
        println!();
    }
}
