//! # CA3076: Insecure XSLT Script Execution
//!
//! @title CA3076 - Insecure XSLT Script Processing
//! @author Ramprasad
//!
//! Checks the `XsltSettings` handed to `XslCompiledTransform.Load`.
//!
//! ## Vulnerability Description
//!
//! With `EnableScript` a style sheet may embed script blocks that run with
//! the full trust of the application. With `EnableDocumentFunction` it may
//! read arbitrary documents through `document()`. Loading an untrusted style
//! sheet under such settings is code execution or information disclosure.
//!
//! ```csharp
//! xslt.Load(path, XsltSettings.TrustedXslt, resolver);      // flagged
//! xslt.Load(path, new XsltSettings(false, true), resolver); // flagged
//! xslt.Load(path, XsltSettings.Default, resolver);          // ok
//! ```
//!
//! Settings whose origin is unknown (parameters, call results) are not
//! reported.
//!
//! ## CWE Reference
//!
//! - CWE-94: Improper Control of Generation of Code

use super::{create_finding, join_slots, scope_name, track_locals_in_bodies};
use super::{DiagnosticSink, VulnerabilityDetector};
use crate::analysis::catalog::{TrackedKind, TrackedType, TRANSFORM_TYPE};
use crate::analysis::state::{LocalEvent, LocalInstances, ScopeRecord, StateTracker};
use crate::analysis::{AnalysisContext, AnalysisError};
use crate::host::{MethodSymbol, Span, SyntaxNode, TypeSymbol};
use crate::language::Invocation;
use crate::report::Severity;
use std::borrow::Cow;

/// Detector for style sheets loaded with script or `document()` enabled.
pub struct XsltScriptDetector;

impl VulnerabilityDetector for XsltScriptDetector {
    fn id(&self) -> &'static str {
        "CA3076"
    }

    fn name(&self) -> &'static str {
        "Insecure XSLT Script Execution"
    }

    fn description(&self) -> &'static str {
        "Detects XslCompiledTransform.Load calls whose XsltSettings enable \
         embedded script or the document() function."
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn cwe(&self) -> Option<&'static str> {
        Some("CWE-94")
    }

    fn remediation(&self) -> &'static str {
        "Load untrusted style sheets with restricted settings:\n\
         - Pass `XsltSettings.Default` or `new XsltSettings(false, false)`\n\
         - Never set `EnableScript = true` for untrusted input\n\
         - Avoid `XsltSettings.TrustedXslt` unless the style sheet is trusted"
    }

    fn detect(
        &self,
        context: &AnalysisContext,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), AnalysisError> {
        let catalog = match &context.catalog {
            Some(catalog) => catalog,
            None => return Ok(()),
        };
        let settings = match catalog.get(TrackedKind::TransformSettings) {
            Some(settings) => settings,
            None => return Ok(()),
        };
        if context.model.find_type(TRANSFORM_TYPE).is_none() {
            log::debug!("{}: {} not referenced", context.file_path, TRANSFORM_TYPE);
            return Ok(());
        }

        let tracker = StateTracker::new(context, catalog);
        track_locals_in_bodies(context, &tracker, &mut |ty, method, event| match event {
            LocalEvent::Invocation {
                node,
                invocation,
                locals,
            } => self.check_load(
                context,
                &tracker,
                settings,
                (ty, method),
                node,
                &invocation,
                locals,
                sink,
            ),
            // Resolver short-circuits belong to the DTD rule.
            LocalEvent::ShortCircuit(_) => Ok(()),
        })
    }
}

impl XsltScriptDetector {
    #[allow(clippy::too_many_arguments)]
    fn check_load(
        &self,
        context: &AnalysisContext,
        tracker: &StateTracker,
        settings: &'static TrackedType,
        (ty, method): (&TypeSymbol, &MethodSymbol),
        node: &SyntaxNode,
        invocation: &Invocation,
        locals: &LocalInstances,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), AnalysisError> {
        if !self.is_transform_load(context, node, invocation) {
            return Ok(());
        }

        let scope = scope_name(ty, method);
        for argument in &invocation.arguments {
            let argument = context.adapter.unwrap_parentheses(argument);
            let local = context.adapter.identifier(argument);

            let record: Cow<ScopeRecord> = match local.and_then(|name| locals.get(name)) {
                Some(record) if record.tracked.kind == TrackedKind::TransformSettings => {
                    Cow::Borrowed(record)
                }
                _ => {
                    let is_settings = context
                        .model
                        .type_of(argument)
                        .map_or(false, |t| context.model.derives_from(t, settings.type_name, false));
                    if !is_settings {
                        continue;
                    }
                    match tracker.instance_record(&scope, &ty.name, argument, &mut |_| Ok(()))? {
                        Some(record) => Cow::Owned(record),
                        None => {
                            log::debug!("{}: settings argument of unknown origin", scope);
                            continue;
                        }
                    }
                }
            };

            let failing = record.insecure_slots(&context.framework);
            if failing.is_empty() {
                continue;
            }

            let slots = join_slots(failing.iter().map(|v| v.property.slot));
            let source = local.unwrap_or("the settings argument").to_string();

            let mut spans: Vec<Span> = vec![node.span.clone()];
            spans.extend(failing.iter().flat_map(|v| v.locations.iter().cloned()));

            sink.report(create_finding(
                self,
                context,
                format!("XSLT loaded with {} enabled", slots),
                format!(
                    "'{}' loads a style sheet with {} enabled through {}. A malicious \
                     style sheet can run code or read arbitrary documents.",
                    scope,
                    slots,
                    if local.is_some() {
                        format!("'{}'", source)
                    } else {
                        source.clone()
                    }
                ),
                vec![slots, source],
                scope.clone(),
                &spans,
            ));
        }

        Ok(())
    }

    /// `Load` on an `XslCompiledTransform`, judged by the receiver's type or
    /// the bound method.
    fn is_transform_load(
        &self,
        context: &AnalysisContext,
        node: &SyntaxNode,
        invocation: &Invocation,
    ) -> bool {
        let model = context.model;
        let receiver = match context.adapter.member_access(invocation.callee) {
            Some((receiver, "Load")) => receiver,
            _ => return false,
        };

        let declaring = model
            .type_of(receiver)
            .or_else(|| model.symbol_of(node).and_then(|s| s.containing_type.as_deref()));
        declaring.map_or(false, |t| model.derives_from(t, TRANSFORM_TYPE, false))
    }
}
