//! # CA3075: Insecure DTD Processing
//!
//! @title CA3075 - Insecure DTD Processing in XML
//! @author Ramprasad
//!
//! Follows `XmlDocument` and `XmlTextReader` instances created in a method
//! body and checks their configuration at the point they parse input.
//!
//! ## Vulnerability Description
//!
//! A parser that processes DTDs with an unrestricted resolver expands
//! external entities. An attacker who controls the document can read local
//! files, reach internal network resources or exhaust memory.
//!
//! ```csharp
//! var doc = new XmlDocument();       // resolver defaults to XmlUrlResolver before 4.5.2
//! doc.Load(path);                    // flagged
//!
//! var safe = new XmlDocument { XmlResolver = null };
//! safe.Load(path);                   // ok
//! ```
//!
//! ## Detection Strategy
//!
//! 1. Give every local initialized with a new tracked instance a record
//! 2. Fold `local.Prop = value` into it in program order; a later write
//!    replaces an earlier one
//! 3. At `Load`/`LoadXml` (documents) and `Read*` (readers) check the record
//!
//! ## CWE Reference
//!
//! - CWE-611: Improper Restriction of XML External Entity Reference

use super::{create_finding, inline_resolver_finding, join_slots, scope_name, track_locals_in_bodies};
use super::{DiagnosticSink, VulnerabilityDetector};
use crate::analysis::catalog::TrackedKind;
use crate::analysis::state::{LocalEvent, LocalInstances, ScopeRecord, StateTracker};
use crate::analysis::{AnalysisContext, AnalysisError};
use crate::host::{MethodSymbol, Span, SyntaxNode, TypeSymbol};
use crate::language::Invocation;
use crate::report::Severity;

/// Detector for parsers used with an insecure configuration.
pub struct DtdProcessingDetector;

impl VulnerabilityDetector for DtdProcessingDetector {
    fn id(&self) -> &'static str {
        "CA3075"
    }

    fn name(&self) -> &'static str {
        "Insecure DTD Processing in XML"
    }

    fn description(&self) -> &'static str {
        "Detects XmlDocument and XmlTextReader instances that load input while \
         DTD processing or an unrestricted XmlResolver is enabled."
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn cwe(&self) -> Option<&'static str> {
        Some("CWE-611")
    }

    fn remediation(&self) -> &'static str {
        "Configure the parser before it reads input:\n\
         - Set `XmlResolver = null` or use an `XmlSecureResolver`\n\
         - Set `DtdProcessing = DtdProcessing.Prohibit` on readers\n\
         - Prefer `XmlReader.Create` with secure `XmlReaderSettings`"
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
        if catalog.get(TrackedKind::DocumentParser).is_none()
            && catalog.get(TrackedKind::StreamingReader).is_none()
        {
            return Ok(());
        }

        let tracker = StateTracker::new(context, catalog);
        track_locals_in_bodies(context, &tracker, &mut |ty, method, event| {
            match event {
                LocalEvent::ShortCircuit(assignment) => {
                    if is_parser(assignment.tracked.kind) {
                        let scope = scope_name(ty, method);
                        sink.report(inline_resolver_finding(self, context, &scope, &assignment));
                    }
                }
                LocalEvent::Invocation {
                    node,
                    invocation,
                    locals,
                } => self.check_sink(context, ty, method, node, &invocation, locals, sink),
            }
            Ok(())
        })
    }
}

impl DtdProcessingDetector {
    #[allow(clippy::too_many_arguments)]
    fn check_sink(
        &self,
        context: &AnalysisContext,
        ty: &TypeSymbol,
        method: &MethodSymbol,
        node: &SyntaxNode,
        invocation: &Invocation,
        locals: &LocalInstances,
        sink: &mut dyn DiagnosticSink,
    ) {
        let adapter = context.adapter;
        let (receiver, called) = match adapter.member_access(invocation.callee) {
            Some(access) => access,
            None => return,
        };
        let local = match adapter.identifier(adapter.unwrap_parentheses(receiver)) {
            Some(name) => name,
            None => return,
        };
        let record = match locals.get(local) {
            Some(record) if is_sink(record, called) => record,
            _ => return,
        };

        let failing = record.insecure_slots(&context.framework);
        if failing.is_empty() {
            return;
        }

        let slots = join_slots(failing.iter().map(|v| v.property.slot));
        let parser = record.tracked.short_name();
        let scope = scope_name(ty, method);

        let mut spans: Vec<Span> = vec![node.span.clone()];
        spans.extend(failing.iter().flat_map(|v| v.locations.iter().cloned()));

        sink.report(create_finding(
            self,
            context,
            format!("Insecure DTD processing in `{}.{}`", local, called),
            format!(
                "'{}' calls '{}' on the {} '{}' while {} is not secure. Set a secure \
                 value before the {} reads any input.",
                scope, called, parser, local, slots, parser
            ),
            vec![local.to_string(), called.to_string(), parser.to_string(), slots],
            scope,
            &spans,
        ));
    }
}

fn is_parser(kind: TrackedKind) -> bool {
    matches!(kind, TrackedKind::DocumentParser | TrackedKind::StreamingReader)
}

/// Members through which a parser consumes input.
fn is_sink(record: &ScopeRecord, member: &str) -> bool {
    match record.tracked.kind {
        TrackedKind::DocumentParser => member == "Load" || member == "LoadXml",
        TrackedKind::StreamingReader => member.starts_with("Read"),
        TrackedKind::TransformSettings => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::context::AnalysisOptions;
    use crate::analysis::CancellationToken;
    use crate::host::{CompilationBuilder, Language, SymbolRef};
    use crate::language::csharp::syntax::*;
    use crate::report::Finding;

    const DOC: &str = "System.Xml.XmlDocument";
    const READER: &str = "System.Xml.XmlTextReader";

    fn scan_body(framework: &str, body: SyntaxNode) -> Result<Vec<Finding>, AnalysisError> {
        scan_with(framework, body, Language::CSharp, &AnalysisOptions::default())
    }

    fn scan_with(
        framework: &str,
        body: SyntaxNode,
        language: Language,
        options: &AnalysisOptions,
    ) -> Result<Vec<Finding>, AnalysisError> {
        let ty = TypeSymbol::source("App.Loader", "System.Object", Span::new("Loader.cs", 1))
            .with_method(MethodSymbol::method("Run", body.at("Loader.cs", 2)));
        let compilation = CompilationBuilder::new("App")
            .language(language)
            .target_framework(framework)
            .xml_framework()
            .with_type(ty)
            .build();
        let context = AnalysisContext::with_options(&compilation, "app.json", options);

        let mut findings = Vec::new();
        DtdProcessingDetector.detect(&context, &mut findings)?;
        Ok(findings)
    }

    fn path() -> SyntaxNode {
        parameter("path", "System.String")
    }

    fn doc() -> SyntaxNode {
        local("doc", DOC)
    }

    #[test]
    fn test_default_document_flagged_before_452() {
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            invoke(doc(), DOC, "Load", vec![path()]).at("Loader.cs", 4),
        ]);
        let findings = scan_body("net45", body).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 4);
        assert_eq!(findings[0].location, "App.Loader.Run");
        assert_eq!(findings[0].message_args[0], "doc");
        assert_eq!(findings[0].message_args[1], "Load");
    }

    #[test]
    fn test_default_document_secure_after_452() {
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            invoke(doc(), DOC, "LoadXml", vec![path()]),
        ]);
        assert!(scan_body("net452", body).unwrap().is_empty());
    }

    #[test]
    fn test_null_resolver_before_load() {
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            assign(member_property(doc(), DOC, "XmlResolver"), null()),
            invoke(doc(), DOC, "Load", vec![path()]),
        ]);
        assert!(scan_body("net40", body).unwrap().is_empty());
    }

    #[test]
    fn test_state_checked_at_each_sink() {
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            invoke(doc(), DOC, "Load", vec![path()]).at("Loader.cs", 4),
            assign(member_property(doc(), DOC, "XmlResolver"), null()),
            invoke(doc(), DOC, "Load", vec![path()]).at("Loader.cs", 6),
        ]);
        let findings = scan_body("net40", body).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 4);
    }

    #[test]
    fn test_later_unresolved_resolver_overrides_null() {
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            assign(member_property(doc(), DOC, "XmlResolver"), null()),
            assign(
                member_property(doc(), DOC, "XmlResolver"),
                parameter("resolver", "System.Xml.XmlResolver"),
            )
            .at("Loader.cs", 5),
            invoke(doc(), DOC, "Load", vec![path()]).at("Loader.cs", 6),
        ]);
        let findings = scan_body("net40", body).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 6);
        assert_eq!(findings[0].additional_locations.len(), 1);
        assert_eq!(findings[0].additional_locations[0].line, 5);
    }

    #[test]
    fn test_initializer_configures_instance() {
        let body = block(vec![
            declare_local(
                "doc",
                DOC,
                new_object(DOC, vec![], vec![("XmlResolver", null())]),
            ),
            invoke(doc(), DOC, "Load", vec![path()]),
        ]);
        assert!(scan_body("net40", body).unwrap().is_empty());
    }

    #[test]
    fn test_reader_needs_dtd_processing_prohibited() {
        let reader = || local("reader", READER);
        let unsafe_body = block(vec![
            declare_local("reader", READER, new_object(READER, vec![path()], vec![])),
            invoke(reader(), READER, "Read", vec![]).at("Loader.cs", 3),
        ]);
        let findings = scan_body("net48", unsafe_body).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message_args[3], "'DtdProcessing'");

        let safe_body = block(vec![
            declare_local(
                "reader",
                READER,
                new_object(
                    READER,
                    vec![path()],
                    vec![(
                        "DtdProcessing",
                        named_value("System.Xml.DtdProcessing", "Prohibit"),
                    )],
                ),
            ),
            invoke(reader(), READER, "ReadToEnd", vec![]),
        ]);
        assert!(scan_body("net48", safe_body).unwrap().is_empty());
    }

    #[test]
    fn test_prohibit_dtd_inverted_flag() {
        let reader = || local("reader", READER);
        let body = block(vec![
            declare_local("reader", READER, new_object(READER, vec![path()], vec![])),
            assign(member_property(reader(), READER, "ProhibitDtd"), boolean(true)),
            invoke(reader(), READER, "Read", vec![]),
        ]);
        assert!(scan_body("net48", body).unwrap().is_empty());
    }

    #[test]
    fn test_non_sink_calls_ignored() {
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            invoke(doc(), DOC, "CreateElement", vec![path()]),
        ]);
        assert!(scan_body("net40", body).unwrap().is_empty());
    }

    #[test]
    fn test_inline_url_resolver_reported_once() {
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            assign(
                member_property(doc(), DOC, "XmlResolver"),
                new_object("System.Xml.XmlUrlResolver", vec![], vec![]),
            )
            .at("Loader.cs", 3),
            invoke(doc(), DOC, "Load", vec![path()]),
        ]);
        let findings = scan_body("net48", body).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
        assert!(findings[0].title.contains("XmlUrlResolver"));
    }

    #[test]
    fn test_unknown_provenance_not_reported() {
        let body = block(vec![
            declare_local(
                "doc",
                DOC,
                identifier("source").with_symbol(SymbolRef::parameter("source", DOC)),
            ),
            invoke(doc(), DOC, "Load", vec![path()]),
        ]);
        assert!(scan_body("net40", body).unwrap().is_empty());
    }

    #[test]
    fn test_reassignment_restarts_record() {
        let body = block(vec![
            declare_local(
                "doc",
                DOC,
                new_object(DOC, vec![], vec![("XmlResolver", null())]),
            ),
            assign(doc(), new_object(DOC, vec![], vec![])),
            invoke(doc(), DOC, "Load", vec![path()]).at("Loader.cs", 5),
        ]);
        let findings = scan_body("net40", body).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 5);
    }

    #[test]
    fn test_lambda_analyzed_as_own_scope() {
        let body = block(vec![
            declare_local(
                "doc",
                DOC,
                new_object(DOC, vec![], vec![("XmlResolver", null())]),
            ),
            statement(lambda(block(vec![
                declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
                invoke(doc(), DOC, "Load", vec![path()]).at("Loader.cs", 7),
            ]))),
            invoke(doc(), DOC, "Load", vec![path()]).at("Loader.cs", 9),
        ]);
        let findings = scan_body("net40", body).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 7);
    }

    #[test]
    fn test_visual_basic_as_new_local() {
        use crate::language::visual_basic::syntax as vb;

        let body = vb::block(vec![
            vb::declare_local("doc", DOC, vb::new_object(DOC, vec![], vec![])),
            vb::invoke(vb::local("doc", DOC), DOC, "Load", vec![]).at("Loader.vb", 3),
        ]);
        let findings =
            scan_with("net40", body, Language::VisualBasic, &AnalysisOptions::default()).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
    }

    #[test]
    fn test_cancellation_abandons_walk() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let options = AnalysisOptions {
            cancel,
            ..Default::default()
        };
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            invoke(doc(), DOC, "Load", vec![path()]),
        ]);
        let result = scan_with("net40", body, Language::CSharp, &options);
        assert!(matches!(result, Err(AnalysisError::Cancelled)));
    }
}
