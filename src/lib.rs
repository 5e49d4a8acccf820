//! # XML-Sentinel Library
//!
//! @title XML-Sentinel - Insecure XML Configuration Analyzer
//! @author Ramprasad
//!
//! A static analysis library for .NET compilations that finds XML parsers and
//! XSLT processors left open to external entity resolution, DTD processing
//! or embedded script execution.
//!
//! The host compiler is external: front ends export each compilation as a
//! JSON dump (syntax trees annotated with symbols, types and constants),
//! which [`host::load_compilation`] loads behind the [`host::SemanticModel`]
//! trait.
//!
//! ## Modules
//!
//! - [`host`] - Compilation dumps, symbols and the semantic model
//! - [`language`] - C# and Visual Basic syntax adapters
//! - [`analysis`] - Catalog, classifier and per-scope state tracking
//! - [`detectors`] - Rule implementations and the registry
//! - [`report`] - Report generation in multiple formats
//! - [`config`] - Rule configuration
//! - [`cli`] - Command-line interface definitions and argument parsing
//!
//! ## Example
//!
//! ```rust,ignore
//! use xml_sentinel::{AnalysisContext, DetectorRegistry, Report};
//! use xml_sentinel::host::load_compilation;
//!
//! let compilation = load_compilation(Path::new("./app.json"))?;
//! let context = AnalysisContext::new(&compilation, "app.json");
//! let registry = DetectorRegistry::new();
//! let findings = registry.run_all(&context)?;
//! let report = Report::new(findings, path, 1);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detectors;
pub mod host;
pub mod language;
pub mod report;

pub use analysis::{AnalysisContext, AnalysisError, CancellationToken};
pub use cli::Cli;
pub use config::SentinelConfig;
pub use detectors::DetectorRegistry;
pub use host::{Compilation, HostError, SemanticModel};
pub use report::{Finding, Report, Severity};
