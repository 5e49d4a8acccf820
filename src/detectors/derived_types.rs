//! # CA3077: Insecure Processing in API Design
//!
//! @title CA3077 - Insecure XmlDocument / XmlTextReader Subclasses
//! @author Ramprasad
//!
//! Detects types derived from `XmlDocument` or `XmlTextReader` whose
//! constructors leave the inherited XML configuration insecure, or whose
//! methods switch it to an insecure value.
//!
//! ## Vulnerability Description
//!
//! A derived type inherits the base type's defaults. On targets before
//! .NET Framework 4.5.2 those defaults resolve external entities, so every
//! instance of the derived type is exposed to XXE unless a constructor sets
//! a secure resolver. A method that assigns an insecure value reopens the
//! hole for every instance it is called on.
//!
//! ## Detection Strategy
//!
//! 1. Find source types deriving (directly or transitively) from a tracked base
//! 2. A type with only a compiler-generated constructor is insecure when the
//!    inherited defaults are
//! 3. Each explicit constructor is folded with the OR-policy
//! 4. Each other method is folded with the AND-policy
//!
//! ## CWE Reference
//!
//! - CWE-611: Improper Restriction of XML External Entity Reference

use super::{create_finding, inline_resolver_finding, join_slots, scope_name};
use super::{DiagnosticSink, VulnerabilityDetector};
use crate::analysis::catalog::TrackedType;
use crate::analysis::state::StateTracker;
use crate::analysis::{AnalysisContext, AnalysisError, FoldPolicy, PropertyState};
use crate::host::{Span, TypeSymbol};
use crate::report::Severity;

/// Detector for insecure subclasses of XML parser types.
pub struct DerivedTypeDetector;

impl VulnerabilityDetector for DerivedTypeDetector {
    fn id(&self) -> &'static str {
        "CA3077"
    }

    fn name(&self) -> &'static str {
        "Insecure Processing in API Design, XML Document and XML Text Reader"
    }

    fn description(&self) -> &'static str {
        "Detects types derived from XmlDocument or XmlTextReader that keep an \
         insecure inherited configuration, either because no constructor sets \
         secure values or because a method assigns insecure ones."
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn cwe(&self) -> Option<&'static str> {
        Some("CWE-611")
    }

    fn remediation(&self) -> &'static str {
        "Secure the inherited configuration in every constructor:\n\
         - Set `XmlResolver = null` or assign an `XmlSecureResolver`\n\
         - Set `DtdProcessing = DtdProcessing.Prohibit` on readers\n\
         - Never assign an unrestricted resolver in a method"
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
        let tracker = StateTracker::new(context, catalog);

        for ty in context.candidate_types() {
            context.cancel.check()?;

            for tracked in catalog.types().iter().copied().filter(|t| t.inheritable) {
                if context.model.derives_from(&ty.name, tracked.type_name, true) {
                    self.audit_type(context, &tracker, ty, tracked, sink)?;
                }
            }
        }

        Ok(())
    }
}

impl DerivedTypeDetector {
    fn audit_type(
        &self,
        context: &AnalysisContext,
        tracker: &StateTracker,
        ty: &TypeSymbol,
        tracked: &'static TrackedType,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), AnalysisError> {
        let framework = &context.framework;
        let base = tracked.short_name();

        if ty.has_only_implicit_constructor() && !tracked.defaults_secure(framework) {
            let slots = join_slots(
                tracked
                    .properties
                    .iter()
                    .filter(|p| !p.default_secure(framework))
                    .map(|p| p.slot),
            );
            let location = ty
                .constructors()
                .next()
                .map(|c| c.location.clone())
                .unwrap_or_else(|| ty.location.clone());

            sink.report(create_finding(
                self,
                context,
                format!("`{}` has no explicit constructor", ty.short_name()),
                format!(
                    "'{}' derives from '{}' but declares no constructor. The inherited \
                     default of {} is not secure on this target framework, and the \
                     compiler-generated constructor cannot change it.",
                    ty.short_name(),
                    base,
                    slots
                ),
                vec![ty.short_name().to_string(), base.to_string(), slots],
                ty.name.clone(),
                &[location],
            ));
        }

        for ctor in ty.constructors().filter(|c| !c.is_implicit) {
            let scope = scope_name(ty, ctor);
            let record = tracker.track_instance_scope(ctor, ty, tracked, FoldPolicy::Or, &mut |a| {
                sink.report(inline_resolver_finding(self, context, &scope, a))
            })?;

            let failing = record.insecure_slots(framework);
            if failing.is_empty() {
                continue;
            }

            let slots = join_slots(failing.iter().map(|v| v.property.slot));
            let description = if failing.iter().all(|v| v.state == PropertyState::Unknown) {
                format!(
                    "The constructor of '{}' leaves {} at the default inherited from '{}', \
                     which is not secure on this target framework.",
                    ty.short_name(),
                    slots,
                    base
                )
            } else {
                format!(
                    "The constructor of '{}' assigns {} but never to a secure value.",
                    ty.short_name(),
                    slots
                )
            };

            let mut spans: Vec<Span> = vec![ctor.location.clone()];
            spans.extend(failing.iter().flat_map(|v| v.locations.iter().cloned()));

            sink.report(create_finding(
                self,
                context,
                format!(
                    "Constructor of `{}` does not set secure XML settings",
                    ty.short_name()
                ),
                description,
                vec![ty.short_name().to_string(), base.to_string(), slots],
                scope,
                &spans,
            ));
        }

        // Every member except explicit constructors, including the
        // synthesized constructor when there is one.
        for method in ty.methods.iter().filter(|m| !m.is_constructor() || m.is_implicit) {
            if framework.is_default_configuration_secure() && method.is_implicit {
                log::debug!("{}: implicit member exempt on a secure target", ty.name);
                continue;
            }

            let scope = scope_name(ty, method);
            let record = tracker.track_instance_scope(method, ty, tracked, FoldPolicy::And, &mut |a| {
                sink.report(inline_resolver_finding(self, context, &scope, a))
            })?;

            for verdict in record.insecure_slots(framework) {
                sink.report(create_finding(
                    self,
                    context,
                    format!("`{}` sets insecure XML settings", scope),
                    format!(
                        "'{}' assigns only insecure values to '{}', so every '{}' it is \
                         called on processes XML insecurely afterwards.",
                        scope,
                        verdict.property.slot,
                        ty.short_name()
                    ),
                    vec![
                        method.name.clone(),
                        verdict.property.slot.to_string(),
                        ty.short_name().to_string(),
                    ],
                    scope.clone(),
                    &verdict.locations,
                ));
            }
        }

        Ok(())
    }
}
