//! # Insecure XML Configuration Detector Module
//!
//! @title Detection Framework
//! @author Ramprasad
//!
//! This module provides the framework for detection and contains the rules
//! built on the configuration state engine in [`crate::analysis`].
//!
//! ## Architecture
//!
//! All detectors implement the [`VulnerabilityDetector`] trait, which provides
//! a consistent interface for detection, severity classification, and remediation
//! guidance. Findings are handed to a [`DiagnosticSink`] as soon as they are
//! known.
//!
//! ## Available Detectors
//!
//! | ID | Name | Severity |
//! |----|------|----------|
//! | CA3075 | Insecure DTD Processing | High |
//! | CA3076 | Insecure XSLT Script Execution | High |
//! | CA3077 | Insecure Processing in API Design | Medium |

mod derived_types;
mod dtd_processing;
pub mod utils;
mod xslt_script;

pub use derived_types::DerivedTypeDetector;
pub use dtd_processing::DtdProcessingDetector;
pub use xslt_script::XsltScriptDetector;

use crate::analysis::classifier::ClassifiedAssignment;
use crate::analysis::state::{LocalEvent, StateTracker};
use crate::analysis::{AnalysisContext, AnalysisError};
use crate::config::{RuleOverride, SentinelConfig};
use crate::host::{short_name, MethodSymbol, Span, TypeSymbol};
use crate::report::{Finding, Location, Severity};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Receives findings as detectors produce them.
pub trait DiagnosticSink {
    fn report(&mut self, finding: Finding);
}

impl DiagnosticSink for Vec<Finding> {
    fn report(&mut self, finding: Finding) {
        self.push(finding);
    }
}

/// Trait for implementing detectors.
///
/// All detectors must implement this trait to be registered with the
/// [`DetectorRegistry`]. The trait provides a consistent interface for
/// detection, classification, and remediation guidance.
///
/// # Example Implementation
///
/// ```rust,ignore
/// pub struct MyDetector;
///
/// impl VulnerabilityDetector for MyDetector {
///     fn id(&self) -> &'static str { "CA9999" }
///     fn name(&self) -> &'static str { "My Rule" }
///     fn description(&self) -> &'static str { "Detects my pattern" }
///     fn severity(&self) -> Severity { Severity::High }
///     fn remediation(&self) -> &'static str { "Fix the issue" }
///
///     fn detect(&self, context: &AnalysisContext, sink: &mut dyn DiagnosticSink)
///         -> Result<(), AnalysisError> {
///         Ok(())
///     }
/// }
/// ```
pub trait VulnerabilityDetector: Send + Sync {
    /// Returns the unique rule identifier for this detector (e.g., "CA3075").
    fn id(&self) -> &'static str;

    /// Returns the human-readable name of the rule.
    fn name(&self) -> &'static str;

    /// Returns a detailed description of what this detector looks for.
    fn description(&self) -> &'static str;

    /// Returns the default severity level for findings from this detector.
    fn severity(&self) -> Severity;

    /// Whether the rule runs when the configuration does not mention it.
    fn enabled_by_default(&self) -> bool {
        true
    }

    /// Runs the detector against one compilation.
    ///
    /// # Arguments
    ///
    /// * `context` - The analysis context of the compilation
    /// * `sink` - Receives every finding
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Cancelled`] when the walk was cancelled.
    /// Findings already reported stay valid.
    fn detect(
        &self,
        context: &AnalysisContext,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), AnalysisError>;

    /// Returns the CWE (Common Weakness Enumeration) ID if applicable.
    ///
    /// # Returns
    ///
    /// An optional CWE identifier string (e.g., "CWE-611").
    fn cwe(&self) -> Option<&'static str> {
        None
    }

    /// Returns remediation advice for addressing this finding.
    fn remediation(&self) -> &'static str;
}

/// Registry containing all available detectors.
///
/// The registry manages the collection of detectors, applies the rule
/// configuration and provides methods to run them against analysis contexts.
///
/// # Example
///
/// ```rust,ignore
/// let registry = DetectorRegistry::with_config(&config);
/// let findings = registry.run_all(&context)?;
/// ```
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn VulnerabilityDetector>>,
    overrides: BTreeMap<String, RuleOverride>,
}

impl DetectorRegistry {
    /// Creates a new registry with all default detectors and no overrides.
    pub fn new() -> Self {
        let detectors: Vec<Box<dyn VulnerabilityDetector>> = vec![
            Box::new(DtdProcessingDetector),
            Box::new(XsltScriptDetector),
            Box::new(DerivedTypeDetector),
        ];

        Self {
            detectors,
            overrides: BTreeMap::new(),
        }
    }

    /// Creates a registry honoring the per-rule overrides of `config`.
    pub fn with_config(config: &SentinelConfig) -> Self {
        let overrides = config
            .rules
            .iter()
            .map(|(id, rule)| (id.to_uppercase(), rule.clone()))
            .collect();
        Self {
            overrides,
            ..Self::new()
        }
    }

    /// Returns a reference to all registered detectors.
    pub fn detectors(&self) -> &[Box<dyn VulnerabilityDetector>] {
        &self.detectors
    }

    /// Returns `true` if the detector runs under the current configuration.
    pub fn is_enabled(&self, detector: &dyn VulnerabilityDetector) -> bool {
        self.overrides
            .get(detector.id())
            .and_then(|o| o.enabled)
            .unwrap_or_else(|| detector.enabled_by_default())
    }

    /// Severity findings of the detector are reported with.
    pub fn effective_severity(&self, detector: &dyn VulnerabilityDetector) -> Severity {
        self.overrides
            .get(detector.id())
            .and_then(|o| o.severity)
            .unwrap_or_else(|| detector.severity())
    }

    /// Runs all enabled detectors against the given context.
    ///
    /// Executes each enabled detector and aggregates findings, deduplicated
    /// and sorted by severity in descending order (Critical first), then by
    /// location.
    ///
    /// # Errors
    ///
    /// Propagates [`AnalysisError::Cancelled`].
    pub fn run_all(&self, context: &AnalysisContext) -> Result<Vec<Finding>, AnalysisError> {
        let mut all_findings = Vec::new();

        for detector in self.detectors.iter().filter(|d| self.is_enabled(d.as_ref())) {
            all_findings.extend(self.run_detector(detector.as_ref(), context)?);
        }

        Ok(utils::sort_findings(utils::deduplicate_findings(all_findings)))
    }

    /// Runs a specific detector by its ID, regardless of enablement.
    ///
    /// # Returns
    ///
    /// Findings from the specified detector, or empty if not found.
    pub fn run_by_id(
        &self,
        id: &str,
        context: &AnalysisContext,
    ) -> Result<Vec<Finding>, AnalysisError> {
        match self.get_detector(id) {
            Some(detector) => Ok(utils::sort_findings(utils::deduplicate_findings(
                self.run_detector(detector, context)?,
            ))),
            None => Ok(Vec::new()),
        }
    }

    /// Retrieves a detector by its ID (case-insensitive).
    pub fn get_detector(&self, id: &str) -> Option<&dyn VulnerabilityDetector> {
        self.detectors
            .iter()
            .find(|d| d.id().eq_ignore_ascii_case(id))
            .map(|d| d.as_ref())
    }

    fn run_detector(
        &self,
        detector: &dyn VulnerabilityDetector,
        context: &AnalysisContext,
    ) -> Result<Vec<Finding>, AnalysisError> {
        let mut findings: Vec<Finding> = Vec::new();
        detector.detect(context, &mut findings)?;

        let severity = self.effective_severity(detector);
        for finding in &mut findings {
            finding.severity = severity;
        }
        log::debug!(
            "{}: {} finding(s) in {}",
            detector.id(),
            findings.len(),
            context.file_path
        );
        Ok(findings)
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper function to create a finding from a detector.
///
/// Standardizes the creation of findings with consistent formatting. The id
/// is derived from the rule, the locations and the message, so analyzing an
/// unchanged compilation twice yields identical findings.
///
/// # Arguments
///
/// * `detector` - The detector creating the finding
/// * `context` - The analysis context
/// * `title` - Short title describing the finding
/// * `description` - Rendered message
/// * `message_args` - Arguments the message was rendered from
/// * `scope` - Type or member the finding belongs to
/// * `spans` - Primary location first, then additional locations
///
/// # Returns
///
/// A fully populated [`Finding`] instance.
pub fn create_finding(
    detector: &dyn VulnerabilityDetector,
    context: &AnalysisContext,
    title: String,
    description: String,
    message_args: Vec<String>,
    scope: String,
    spans: &[Span],
) -> Finding {
    let mut locations = spans.iter().map(|span| Location {
        file_path: context.source_file(span),
        line: span.line,
        column: span.column,
    });
    let primary = locations.next().unwrap_or_else(|| Location {
        file_path: context.file_path.clone(),
        line: 0,
        column: 0,
    });
    let additional_locations: Vec<Location> = locations.collect();

    Finding {
        id: finding_id(detector.id(), &primary, &scope, &description),
        detector_id: detector.id().to_string(),
        title,
        description,
        message_args,
        severity: detector.severity(),
        file_path: primary.file_path,
        line: primary.line,
        column: primary.column,
        location: scope,
        additional_locations,
        remediation: detector.remediation().to_string(),
        cwe: detector.cwe().map(|s| s.to_string()),
    }
}

/// Stable identifier for a finding.
fn finding_id(rule: &str, primary: &Location, scope: &str, description: &str) -> String {
    let mut hasher = DefaultHasher::new();
    rule.hash(&mut hasher);
    primary.hash(&mut hasher);
    scope.hash(&mut hasher);
    description.hash(&mut hasher);
    format!("{}-{:08x}", rule, hasher.finish() & 0xFFFF_FFFF)
}

/// Tracks local instances through every method body of every candidate
/// type. Nested functions are analyzed as scopes of their own.
pub(crate) fn track_locals_in_bodies(
    context: &AnalysisContext,
    tracker: &StateTracker,
    on_event: &mut dyn FnMut(&TypeSymbol, &MethodSymbol, LocalEvent<'_, '_>) -> Result<(), AnalysisError>,
) -> Result<(), AnalysisError> {
    for ty in context.candidate_types() {
        for method in &ty.methods {
            let body = match &method.body {
                Some(body) => body,
                None => continue,
            };

            let mut pending = vec![body];
            while let Some(scope) = pending.pop() {
                let nested = tracker.track_local_instances(scope, &method.name, &ty.name, &mut |event| {
                    on_event(ty, method, event)
                })?;
                pending.extend(nested.into_iter().flat_map(|n| n.children.iter()));
            }
        }
    }
    Ok(())
}

/// Finding for an insecure resolver constructed inline, reported as soon as
/// the assignment is seen.
pub(crate) fn inline_resolver_finding(
    detector: &dyn VulnerabilityDetector,
    context: &AnalysisContext,
    scope: &str,
    assignment: &ClassifiedAssignment,
) -> Finding {
    let created = assignment
        .created_type
        .as_deref()
        .map(short_name)
        .unwrap_or("XmlResolver");

    create_finding(
        detector,
        context,
        format!("Insecure `{}` assigned to `{}`", created, assignment.member),
        format!(
            "'{}' assigns a new '{}' to '{}' of '{}'. It resolves external entities \
             without restriction, so any document processed afterwards can read local \
             files or reach network resources.",
            scope,
            created,
            assignment.member,
            assignment.tracked.short_name()
        ),
        vec![
            created.to_string(),
            assignment.member.to_string(),
            assignment.tracked.short_name().to_string(),
        ],
        scope.to_string(),
        std::slice::from_ref(&assignment.span),
    )
}

/// Display name of a member, e.g. `Doc..ctor` or `Doc.Configure`.
pub(crate) fn scope_name(ty: &TypeSymbol, method: &MethodSymbol) -> String {
    format!("{}.{}", ty.name, method.name)
}

/// Joins slot names for messages: `'A'`, `'A' and 'B'`.
pub(crate) fn join_slots<'s>(slots: impl IntoIterator<Item = &'s str>) -> String {
    let quoted: Vec<String> = slots.into_iter().map(|s| format!("'{}'", s)).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CompilationBuilder;

    #[test]
    fn test_registry_creation() {
        let registry = DetectorRegistry::new();
        assert_eq!(registry.detectors().len(), 3);
    }

    #[test]
    fn test_detector_ids_unique() {
        let registry = DetectorRegistry::new();
        let mut ids: Vec<_> = registry.detectors().iter().map(|d| d.id()).collect();
        let len_before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), len_before, "Detector IDs must be unique");
    }

    #[test]
    fn test_config_overrides() {
        let mut config = SentinelConfig::default();
        config.rules.insert(
            "ca3077".to_string(),
            RuleOverride {
                enabled: Some(false),
                severity: None,
            },
        );
        config.rules.insert(
            "CA3075".to_string(),
            RuleOverride {
                enabled: None,
                severity: Some(Severity::Critical),
            },
        );
        let registry = DetectorRegistry::with_config(&config);

        let derived = registry.get_detector("CA3077").unwrap();
        assert!(!registry.is_enabled(derived));

        let dtd = registry.get_detector("ca3075").unwrap();
        assert!(registry.is_enabled(dtd));
        assert_eq!(registry.effective_severity(dtd), Severity::Critical);
    }

    #[test]
    fn test_finding_ids_are_stable() {
        let compilation = CompilationBuilder::new("App").build();
        let context = AnalysisContext::new(&compilation, "app.json");
        let make = || {
            create_finding(
                &DerivedTypeDetector,
                &context,
                "Title".to_string(),
                "Message".to_string(),
                vec![],
                "App.Doc..ctor".to_string(),
                &[Span::new("Doc.cs", 4), Span::new("Doc.cs", 9)],
            )
        };

        let first = make();
        assert_eq!(first.id, make().id);
        assert!(first.id.starts_with("CA3077-"));
        assert_eq!(first.line, 4);
        assert_eq!(first.additional_locations.len(), 1);
    }

    #[test]
    fn test_run_by_id_ignores_enablement() {
        use crate::language::csharp::syntax::block;

        let unsafe_doc =
            TypeSymbol::source("App.Doc", "System.Xml.XmlDocument", Span::new("Doc.cs", 1))
                .with_method(MethodSymbol::constructor(block(vec![]).at("Doc.cs", 3)));
        let compilation = CompilationBuilder::new("App")
            .target_framework("net45")
            .xml_framework()
            .with_type(unsafe_doc)
            .build();
        let context = AnalysisContext::new(&compilation, "app.json");

        let mut config = SentinelConfig::default();
        config.rules.insert(
            "CA3077".to_string(),
            RuleOverride {
                enabled: Some(false),
                severity: None,
            },
        );
        let registry = DetectorRegistry::with_config(&config);

        assert!(registry.run_all(&context).unwrap().is_empty());
        let findings = registry.run_by_id("ca3077", &context).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
        assert!(registry.run_by_id("CA9999", &context).unwrap().is_empty());
    }

    #[test]
    fn test_join_slots() {
        assert_eq!(join_slots(["A"]), "'A'");
        assert_eq!(join_slots(["A", "B"]), "'A' and 'B'");
        assert_eq!(join_slots(["A", "B", "C"]), "'A', 'B' and 'C'");
    }
}
