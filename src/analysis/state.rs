//! # Per-Scope State Tracker
//!
//! @title Flow-Sensitive Configuration State
//! @author Ramprasad
//!
//! Walks one constructor or method body in program order and folds every
//! relevant assignment into a [`ScopeRecord`]. A record lives exactly as long
//! as one walk; nothing is carried between scopes.
//!
//! ## Fold Policies
//!
//! | Policy | Used for | Slot is insecure when | Never assigned |
//! |--------|----------|-----------------------|----------------|
//! | [`FoldPolicy::Or`] | constructors | no assignment was secure | safe default |
//! | [`FoldPolicy::And`] | methods | every assignment was insecure | not blamed |
//! | [`FoldPolicy::LastWrite`] | local instances | the latest assignment was insecure | safe default |
//!
//! ## Walk Rules
//!
//! - Lambdas, anonymous methods and local functions are not entered; their
//!   assignments do not affect the enclosing scope.
//! - Object initializers are entered through their values only. The
//!   initializer assignments configure the new object, not the scope's
//!   instance.
//! - The cancellation token is checked at every node.

use super::cancellation::CancellationToken;
use super::catalog::{ResolvedCatalog, TrackedProperty, TrackedType};
use super::classifier::{
    AssignmentClassifier, AssignmentTarget, Classification, ClassifiedAssignment, InstanceValue,
    ValueClass,
};
use super::context::AnalysisContext;
use super::framework::FrameworkVersionContext;
use super::AnalysisError;
use crate::host::{MethodSymbol, Span, SymbolKind, SyntaxNode, TypeSymbol};
use crate::language::{Invocation, LocalDeclarator, SyntaxAdapter};
use std::collections::BTreeMap;

/// Folded state of one tracked property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyState {
    /// No relevant assignment seen.
    Unknown,
    ConfirmedSecure,
    ConfirmedInsecure,
}

/// Conflict resolution between several assignments to the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldPolicy {
    /// Any secure assignment confirms the slot secure.
    Or,

    /// The slot is insecure only if every assignment is insecure.
    And,

    /// Each assignment replaces the slot's state. Records checked at a
    /// point in a straight walk, such as a local at its sink, use this.
    LastWrite,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct SlotRecord {
    has_any_assignment: bool,
    secure_assignments: usize,
    insecure_locations: Vec<Span>,
    /// Already reported when it was assigned.
    short_circuited: bool,
}

/// A slot that did not fold to secure.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotVerdict {
    pub property: &'static TrackedProperty,
    pub state: PropertyState,

    /// Insecure assignments, in program order. Empty when the slot failed on
    /// its default.
    pub locations: Vec<Span>,
}

/// Tracked-property state for the instance under analysis in one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeRecord {
    /// Method or variable the record belongs to.
    pub scope: String,

    /// Enclosing type.
    pub containing_type: String,

    pub tracked: &'static TrackedType,
    pub policy: FoldPolicy,

    slots: BTreeMap<&'static str, SlotRecord>,
}

impl ScopeRecord {
    pub fn new(
        scope: &str,
        containing_type: &str,
        tracked: &'static TrackedType,
        policy: FoldPolicy,
    ) -> Self {
        Self {
            scope: scope.to_string(),
            containing_type: containing_type.to_string(),
            tracked,
            policy,
            slots: tracked
                .properties
                .iter()
                .map(|p| (p.slot, SlotRecord::default()))
                .collect(),
        }
    }

    /// Folds a classified assignment. The caller decides whether its target
    /// is the instance this record describes.
    pub fn fold(&mut self, assignment: &ClassifiedAssignment) {
        self.fold_value(assignment.property.slot, assignment.value, &assignment.span);
    }

    /// Folds a value written to `slot` at `span`.
    pub fn fold_value(&mut self, slot: &str, value: ValueClass, span: &Span) {
        if let Some(record) = self.slots.get_mut(slot) {
            record.has_any_assignment = true;
            if self.policy == FoldPolicy::LastWrite {
                record.short_circuited = false;
                if value.is_secure() {
                    record.insecure_locations.clear();
                }
            }
            if value.is_secure() {
                record.secure_assignments += 1;
            } else {
                record.insecure_locations.push(span.clone());
            }
        }
    }

    /// Folds one value into every slot, as a whole-instance assignment does.
    pub fn fold_all(&mut self, secure: bool, span: &Span) {
        let value = if secure {
            ValueClass::Secure
        } else {
            ValueClass::Insecure
        };
        let slots: Vec<_> = self.slots.keys().copied().collect();
        for slot in slots {
            self.fold_value(slot, value, span);
        }
    }

    /// Marks a slot as reported at its assignment.
    pub fn mark_short_circuited(&mut self, slot: &str) {
        if let Some(record) = self.slots.get_mut(slot) {
            record.short_circuited = true;
        }
    }

    pub fn has_any_assignment(&self, slot: &str) -> bool {
        self.slots.get(slot).map_or(false, |r| r.has_any_assignment)
    }

    /// Folded state of a slot under this record's policy.
    pub fn state(&self, slot: &str) -> PropertyState {
        match self.slots.get(slot) {
            Some(record) => match self.policy {
                FoldPolicy::Or => fold_or(record),
                FoldPolicy::And => fold_and(record),
                FoldPolicy::LastWrite => fold_last_write(record),
            },
            None => PropertyState::Unknown,
        }
    }

    /// Returns `true` if the slot is secure once the scope is complete.
    pub fn is_slot_secure(
        &self,
        property: &TrackedProperty,
        framework: &FrameworkVersionContext,
    ) -> bool {
        if self.slots.get(property.slot).map_or(false, |r| r.short_circuited) {
            return true;
        }
        match self.state(property.slot) {
            PropertyState::ConfirmedSecure => true,
            PropertyState::ConfirmedInsecure => false,
            PropertyState::Unknown => match self.policy {
                FoldPolicy::Or | FoldPolicy::LastWrite => property.default_secure(framework),
                FoldPolicy::And => true,
            },
        }
    }

    /// Slots that fail, in catalog order.
    pub fn insecure_slots(&self, framework: &FrameworkVersionContext) -> Vec<SlotVerdict> {
        self.tracked
            .properties
            .iter()
            .filter(|p| !self.is_slot_secure(p, framework))
            .map(|p| SlotVerdict {
                property: p,
                state: self.state(p.slot),
                locations: self
                    .slots
                    .get(p.slot)
                    .map(|r| r.insecure_locations.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Returns `true` if every slot folds to secure.
    pub fn is_secure(&self, framework: &FrameworkVersionContext) -> bool {
        self.tracked
            .properties
            .iter()
            .all(|p| self.is_slot_secure(p, framework))
    }
}

fn fold_or(record: &SlotRecord) -> PropertyState {
    if record.secure_assignments > 0 {
        PropertyState::ConfirmedSecure
    } else if record.has_any_assignment {
        PropertyState::ConfirmedInsecure
    } else {
        PropertyState::Unknown
    }
}

fn fold_and(record: &SlotRecord) -> PropertyState {
    if !record.has_any_assignment {
        PropertyState::Unknown
    } else if !record.insecure_locations.is_empty() && record.secure_assignments == 0 {
        PropertyState::ConfirmedInsecure
    } else {
        PropertyState::ConfirmedSecure
    }
}

/// Insecure locations are cleared by every secure write, so any left over
/// follow the latest secure one.
fn fold_last_write(record: &SlotRecord) -> PropertyState {
    if !record.insecure_locations.is_empty() {
        PropertyState::ConfirmedInsecure
    } else if record.has_any_assignment {
        PropertyState::ConfirmedSecure
    } else {
        PropertyState::Unknown
    }
}

/// A construct of interest met while walking a body.
#[derive(Debug, Clone)]
pub enum BodyEvent<'n> {
    Assignment {
        node: &'n SyntaxNode,
        left: &'n SyntaxNode,
        right: &'n SyntaxNode,
    },
    LocalDeclaration(LocalDeclarator<'n>),
    Invocation {
        node: &'n SyntaxNode,
        invocation: Invocation<'n>,
    },
    /// A lambda or local function; not entered.
    NestedFunction(&'n SyntaxNode),
}

/// Walks `node` in program order, reporting events to `visit`.
///
/// # Errors
///
/// Returns [`AnalysisError::Cancelled`] as soon as `cancel` is set, or any
/// error `visit` returns.
pub fn walk_body<'n, F>(
    adapter: &dyn SyntaxAdapter,
    node: &'n SyntaxNode,
    cancel: &CancellationToken,
    visit: &mut F,
) -> Result<(), AnalysisError>
where
    F: FnMut(BodyEvent<'n>) -> Result<(), AnalysisError>,
{
    cancel.check()?;

    if adapter.is_nested_function(node) {
        return visit(BodyEvent::NestedFunction(node));
    }

    if let Some(creation) = adapter.object_creation(node) {
        for argument in creation.arguments {
            walk_body(adapter, argument, cancel, visit)?;
        }
        for (_, value) in creation.initializers {
            walk_body(adapter, value, cancel, visit)?;
        }
        return Ok(());
    }

    if let Some((left, right)) = adapter.assignment(node) {
        visit(BodyEvent::Assignment { node, left, right })?;
    } else if let Some(declarator) = adapter.local_declarator(node) {
        visit(BodyEvent::LocalDeclaration(declarator))?;
    } else if let Some(invocation) = adapter.invocation(node) {
        visit(BodyEvent::Invocation { node, invocation })?;
    }

    for child in &node.children {
        walk_body(adapter, child, cancel, visit)?;
    }
    Ok(())
}

/// Locals holding a tracked instance whose provenance is known.
#[derive(Debug, Clone, Default)]
pub struct LocalInstances {
    records: BTreeMap<String, ScopeRecord>,
}

impl LocalInstances {
    pub fn get(&self, name: &str) -> Option<&ScopeRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn track(&mut self, name: &str, record: ScopeRecord) {
        self.records.insert(name.to_string(), record);
    }

    fn forget(&mut self, name: &str) {
        self.records.remove(name);
    }
}

/// Event reported while tracking local instances.
pub enum LocalEvent<'n, 'r> {
    /// An insecure resolver was constructed inline for a tracked instance.
    ShortCircuit(ClassifiedAssignment),

    /// An invocation, with the state of every tracked local at that point.
    Invocation {
        node: &'n SyntaxNode,
        invocation: Invocation<'n>,
        locals: &'r LocalInstances,
    },
}

/// Drives the walker, the classifier and scope records for one compilation.
pub struct StateTracker<'a> {
    ctx: &'a AnalysisContext<'a>,
    catalog: &'a ResolvedCatalog,
    classifier: AssignmentClassifier<'a>,
}

impl<'a> StateTracker<'a> {
    pub fn new(ctx: &'a AnalysisContext<'a>, catalog: &'a ResolvedCatalog) -> Self {
        Self {
            ctx,
            catalog,
            classifier: AssignmentClassifier::new(ctx.model, ctx.adapter, catalog),
        }
    }

    pub fn classifier(&self) -> &AssignmentClassifier<'a> {
        &self.classifier
    }

    /// Folds every assignment to the current instance in `method` into a
    /// fresh record.
    ///
    /// Only `Prop = v` and `this.Prop = v` (and the Visual Basic forms) write
    /// the current instance; assignments through other variables or through
    /// more than one member access are skipped.
    ///
    /// # Arguments
    ///
    /// * `method` - Constructor or method to walk
    /// * `ty` - Type declaring `method`
    /// * `tracked` - Tracked base type of `ty`
    /// * `policy` - Fold policy for the scope
    /// * `on_short_circuit` - Called at once for inline insecure resolvers
    pub fn track_instance_scope(
        &self,
        method: &MethodSymbol,
        ty: &TypeSymbol,
        tracked: &'static TrackedType,
        policy: FoldPolicy,
        on_short_circuit: &mut dyn FnMut(&ClassifiedAssignment),
    ) -> Result<ScopeRecord, AnalysisError> {
        let mut record = ScopeRecord::new(&method.name, &ty.name, tracked, policy);
        let body = match &method.body {
            Some(body) => body,
            None => return Ok(record),
        };

        walk_body(self.ctx.adapter, body, &self.ctx.cancel, &mut |event| {
            if let BodyEvent::Assignment { node, left, right } = event {
                let assignment = match self.classifier.classify_for(tracked, left, right, &node.span)
                {
                    Classification::Relevant(a) => a,
                    Classification::NotRelevant => return Ok(()),
                };
                if assignment.target != AssignmentTarget::CurrentInstance {
                    log::debug!(
                        "{}.{}: skipping {} assignment through {:?}",
                        ty.name,
                        method.name,
                        assignment.member,
                        assignment.target
                    );
                    return Ok(());
                }

                record.fold(&assignment);
                if assignment.inline_insecure_creation {
                    record.mark_short_circuited(assignment.property.slot);
                    on_short_circuit(&assignment);
                }
            }
            Ok(())
        })?;

        Ok(record)
    }

    /// Starts a record for a new tracked instance produced by `expr`.
    ///
    /// # Returns
    ///
    /// `None` when `expr` is not a tracked type or its provenance is unknown
    /// (parameters, call results), which are never reported.
    pub fn instance_record(
        &self,
        scope: &str,
        containing_type: &str,
        expr: &SyntaxNode,
        on_event: &mut dyn FnMut(LocalEvent<'_, '_>) -> Result<(), AnalysisError>,
    ) -> Result<Option<ScopeRecord>, AnalysisError> {
        let tracked = match self
            .ctx
            .model
            .type_of(expr)
            .and_then(|t| self.catalog.lookup(self.ctx.model, t))
        {
            Some(tracked) => tracked,
            None => return Ok(None),
        };

        match self.classifier.classify_instance(tracked, expr) {
            InstanceValue::Named { secure } => {
                let mut record =
                    ScopeRecord::new(scope, containing_type, tracked, FoldPolicy::LastWrite);
                record.fold_all(secure, &expr.span);
                Ok(Some(record))
            }
            InstanceValue::Created {
                arguments,
                initializers,
            } => {
                let mut record =
                    ScopeRecord::new(scope, containing_type, tracked, FoldPolicy::LastWrite);

                if !tracked.creation_arguments.is_empty()
                    && arguments.len() == tracked.creation_arguments.len()
                {
                    for (slot, argument) in tracked.creation_arguments.iter().zip(arguments) {
                        if let Some((_, accessor)) = tracked.accessor(slot) {
                            let value = self.classifier.classify_value(accessor.rule, argument);
                            record.fold_value(slot, value, &argument.span);
                        }
                    }
                }

                for (member, value) in initializers {
                    if let Some(assignment) =
                        self.classifier.classify_initializer(tracked, member, value)
                    {
                        record.fold(&assignment);
                        if assignment.inline_insecure_creation {
                            record.mark_short_circuited(assignment.property.slot);
                            on_event(LocalEvent::ShortCircuit(assignment))?;
                        }
                    }
                }
                Ok(Some(record))
            }
            InstanceValue::Unknown => Ok(None),
        }
    }

    /// Tracks locals initialized with tracked instances through one body.
    ///
    /// Each local gets a record when it is declared or re-assigned from a
    /// known value; `local.Prop = v` folds into it. Invocations are handed to
    /// `on_event` together with the current records, so sinks can be checked
    /// against the state at the call.
    ///
    /// # Returns
    ///
    /// The nested functions met in the body, which the caller may analyze as
    /// scopes of their own.
    pub fn track_local_instances<'n>(
        &self,
        body: &'n SyntaxNode,
        scope: &str,
        containing_type: &str,
        on_event: &mut dyn FnMut(LocalEvent<'_, '_>) -> Result<(), AnalysisError>,
    ) -> Result<Vec<&'n SyntaxNode>, AnalysisError> {
        let mut locals = LocalInstances::default();
        let mut nested = Vec::new();

        walk_body(self.ctx.adapter, body, &self.ctx.cancel, &mut |event| match event {
            BodyEvent::NestedFunction(node) => {
                nested.push(node);
                Ok(())
            }
            BodyEvent::LocalDeclaration(declarator) => {
                locals.forget(declarator.name);
                if let Some(initializer) = declarator.initializer {
                    let record =
                        self.instance_record(declarator.name, containing_type, initializer, on_event)?;
                    if let Some(record) = record {
                        locals.track(declarator.name, record);
                    }
                }
                Ok(())
            }
            BodyEvent::Assignment { node, left, right } => {
                self.fold_local_assignment(&mut locals, node, left, right, containing_type, on_event)
            }
            BodyEvent::Invocation { node, invocation } => on_event(LocalEvent::Invocation {
                node,
                invocation,
                locals: &locals,
            }),
        })?;

        log::debug!("{}.{}: walked with {} tracked locals", containing_type, scope, locals.len());
        Ok(nested)
    }

    fn fold_local_assignment(
        &self,
        locals: &mut LocalInstances,
        node: &SyntaxNode,
        left: &SyntaxNode,
        right: &SyntaxNode,
        containing_type: &str,
        on_event: &mut dyn FnMut(LocalEvent<'_, '_>) -> Result<(), AnalysisError>,
    ) -> Result<(), AnalysisError> {
        let adapter = self.ctx.adapter;
        let left = adapter.unwrap_parentheses(left);

        // `local = <value>` restarts the local's record.
        if let Some(name) = adapter.identifier(left) {
            let is_local = self
                .ctx
                .model
                .symbol_of(left)
                .map_or(false, |s| s.kind == SymbolKind::Local);
            if is_local {
                locals.forget(name);
                if let Some(record) = self.instance_record(name, containing_type, right, on_event)? {
                    locals.track(name, record);
                }
            }
            return Ok(());
        }

        let name = match self.classifier.target(left) {
            AssignmentTarget::Variable(name) => name,
            _ => return Ok(()),
        };
        let tracked = match locals.get(&name) {
            Some(record) => record.tracked,
            None => return Ok(()),
        };

        let assignment = match self.classifier.classify_for(tracked, left, right, &node.span) {
            Classification::Relevant(a) => a,
            Classification::NotRelevant => return Ok(()),
        };

        if let Some(record) = locals.records.get_mut(&name) {
            record.fold(&assignment);
            if assignment.inline_insecure_creation {
                record.mark_short_circuited(assignment.property.slot);
                on_event(LocalEvent::ShortCircuit(assignment))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::catalog::{TrackedKind, TRACKED_TYPES};
    use crate::host::{Compilation, CompilationBuilder, Span, SymbolRef};
    use crate::language::csharp::syntax::*;

    const DOC: &str = "System.Xml.XmlDocument";
    const READER: &str = "System.Xml.XmlTextReader";

    fn tracked(kind: TrackedKind) -> &'static TrackedType {
        TRACKED_TYPES.iter().find(|t| t.kind == kind).unwrap()
    }

    fn compilation(ty: TypeSymbol) -> Compilation {
        CompilationBuilder::new("App")
            .xml_framework()
            .with_type(ty)
            .build()
    }

    fn track(
        body: SyntaxNode,
        base: &str,
        policy: FoldPolicy,
    ) -> (ScopeRecord, Vec<ClassifiedAssignment>) {
        let method = MethodSymbol::method("Configure", body);
        let ty = TypeSymbol::source("App.T", base, Span::new("T.cs", 1)).with_method(method.clone());
        let compilation = compilation(ty.clone());
        let ctx = AnalysisContext::new(&compilation, "app.json");
        let catalog = ctx.catalog.clone().unwrap();
        let tracker = StateTracker::new(&ctx, &catalog);
        let kind = catalog.lookup(&compilation, base).unwrap();

        let mut short_circuits = Vec::new();
        let record = tracker
            .track_instance_scope(&method, &ty, kind, policy, &mut |a| short_circuits.push(a.clone()))
            .unwrap();
        (record, short_circuits)
    }

    #[test]
    fn test_or_policy_secure_wins() {
        let document = tracked(TrackedKind::DocumentParser);
        let mut record = ScopeRecord::new(".ctor", "App.T", document, FoldPolicy::Or);
        record.fold_value("XmlResolver", ValueClass::Secure, &Span::new("T.cs", 2));
        record.fold_value("XmlResolver", ValueClass::Insecure, &Span::new("T.cs", 3));

        assert_eq!(record.state("XmlResolver"), PropertyState::ConfirmedSecure);
        assert!(record.is_secure(&FrameworkVersionContext::fixed(false)));
    }

    #[test]
    fn test_and_policy_requires_every_assignment_insecure() {
        let document = tracked(TrackedKind::DocumentParser);
        let mut record = ScopeRecord::new("M", "App.T", document, FoldPolicy::And);
        record.fold_value("XmlResolver", ValueClass::Unresolved, &Span::new("T.cs", 2));
        assert_eq!(record.state("XmlResolver"), PropertyState::ConfirmedInsecure);

        record.fold_value("XmlResolver", ValueClass::Secure, &Span::new("T.cs", 3));
        assert_eq!(record.state("XmlResolver"), PropertyState::ConfirmedSecure);
    }

    #[test]
    fn test_last_write_policy_follows_order() {
        let document = tracked(TrackedKind::DocumentParser);
        let framework = FrameworkVersionContext::fixed(false);
        let mut record = ScopeRecord::new("doc", "App.T", document, FoldPolicy::LastWrite);

        record.fold_value("XmlResolver", ValueClass::Secure, &Span::new("T.cs", 2));
        assert!(record.is_secure(&framework));

        record.fold_value("XmlResolver", ValueClass::Unresolved, &Span::new("T.cs", 3));
        assert_eq!(record.state("XmlResolver"), PropertyState::ConfirmedInsecure);
        let failing = record.insecure_slots(&framework);
        assert_eq!(failing[0].locations, vec![Span::new("T.cs", 3)]);

        record.fold_value("XmlResolver", ValueClass::Secure, &Span::new("T.cs", 4));
        assert_eq!(record.state("XmlResolver"), PropertyState::ConfirmedSecure);
    }

    #[test]
    fn test_last_write_clears_short_circuit() {
        let document = tracked(TrackedKind::DocumentParser);
        let mut record = ScopeRecord::new("doc", "App.T", document, FoldPolicy::LastWrite);
        record.fold_value("XmlResolver", ValueClass::Insecure, &Span::new("T.cs", 2));
        record.mark_short_circuited("XmlResolver");
        record.fold_value("XmlResolver", ValueClass::Unresolved, &Span::new("T.cs", 3));

        assert_eq!(record.insecure_slots(&FrameworkVersionContext::fixed(false)).len(), 1);
    }

    #[test]
    fn test_unassigned_slots_per_policy() {
        let document = tracked(TrackedKind::DocumentParser);
        let insecure_target = FrameworkVersionContext::fixed(false);

        let ctor = ScopeRecord::new(".ctor", "App.T", document, FoldPolicy::Or);
        assert_eq!(ctor.state("XmlResolver"), PropertyState::Unknown);
        assert!(!ctor.is_secure(&insecure_target));
        assert!(ctor.is_secure(&FrameworkVersionContext::fixed(true)));

        let method = ScopeRecord::new("M", "App.T", document, FoldPolicy::And);
        assert!(method.is_secure(&insecure_target));
        assert!(!method.has_any_assignment("XmlResolver"));
    }

    #[test]
    fn test_short_circuited_slot_passes() {
        let document = tracked(TrackedKind::DocumentParser);
        let mut record = ScopeRecord::new("M", "App.T", document, FoldPolicy::And);
        record.fold_value("XmlResolver", ValueClass::Insecure, &Span::new("T.cs", 2));
        record.mark_short_circuited("XmlResolver");
        assert!(record.insecure_slots(&FrameworkVersionContext::fixed(false)).is_empty());
    }

    #[test]
    fn test_tracks_current_instance_assignments() {
        let body = block(vec![
            assign(this_property(DOC, "XmlResolver"), null()).at("T.cs", 4),
        ]);
        let (record, short_circuits) = track(body, DOC, FoldPolicy::Or);

        assert_eq!(record.state("XmlResolver"), PropertyState::ConfirmedSecure);
        assert!(short_circuits.is_empty());
    }

    #[test]
    fn test_skips_other_targets_and_lambdas() {
        let body = block(vec![
            assign(
                member_property(local("other", DOC), DOC, "XmlResolver"),
                parameter("resolver", "System.Xml.XmlResolver"),
            ),
            assign(
                member_property(member(SyntaxNode::new("ThisExpression"), "inner"), DOC, "XmlResolver"),
                parameter("resolver", "System.Xml.XmlResolver"),
            ),
            statement(lambda(block(vec![assign(
                property(DOC, "XmlResolver"),
                parameter("resolver", "System.Xml.XmlResolver"),
            )]))),
        ]);
        let (record, _) = track(body, DOC, FoldPolicy::And);
        assert!(!record.has_any_assignment("XmlResolver"));
    }

    #[test]
    fn test_inline_insecure_resolver_short_circuits() {
        let body = block(vec![assign(
            property(DOC, "XmlResolver"),
            new_object("System.Xml.XmlUrlResolver", vec![], vec![]),
        )
        .at("T.cs", 9)]);
        let (record, short_circuits) = track(body, DOC, FoldPolicy::And);

        assert_eq!(short_circuits.len(), 1);
        assert_eq!(short_circuits[0].span.line, 9);
        assert!(record.insecure_slots(&FrameworkVersionContext::fixed(false)).is_empty());
    }

    #[test]
    fn test_initializer_assignments_do_not_touch_instance() {
        let body = block(vec![declare_local(
            "settings",
            READER,
            new_object(READER, vec![], vec![("DtdProcessing", boolean(true))]),
        )]);
        let (record, _) = track(body, READER, FoldPolicy::And);
        assert!(!record.has_any_assignment("DtdProcessing"));
    }

    #[test]
    fn test_cancelled_walk_reports_nothing() {
        let body = block(vec![assign(property(DOC, "XmlResolver"), null())]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut events = 0;
        let result = walk_body(&crate::language::CSharpAdapter, &body, &cancel, &mut |_| {
            events += 1;
            Ok(())
        });
        assert!(matches!(result, Err(AnalysisError::Cancelled)));
        assert_eq!(events, 0);
    }

    #[test]
    fn test_walk_order_and_nested_functions() {
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            assign(member_property(local("doc", DOC), DOC, "XmlResolver"), null()),
            local_function("Helper", block(vec![assign(property(DOC, "XmlResolver"), null())])),
            invoke(local("doc", DOC), DOC, "Load", vec![parameter("path", "System.String")]),
        ]);

        let mut kinds = Vec::new();
        walk_body(
            &crate::language::CSharpAdapter,
            &body,
            &CancellationToken::new(),
            &mut |event| {
                kinds.push(match event {
                    BodyEvent::Assignment { .. } => "assignment",
                    BodyEvent::LocalDeclaration(_) => "local",
                    BodyEvent::Invocation { .. } => "invocation",
                    BodyEvent::NestedFunction(_) => "nested",
                });
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(kinds, vec!["local", "assignment", "nested", "invocation"]);
    }

    #[test]
    fn test_local_records_follow_program_order() {
        let body = block(vec![
            declare_local("doc", DOC, new_object(DOC, vec![], vec![])),
            invoke(local("doc", DOC), DOC, "Load", vec![]),
            assign(member_property(local("doc", DOC), DOC, "XmlResolver"), null()),
            invoke(local("doc", DOC), DOC, "Load", vec![]),
        ]);
        let compilation = compilation(TypeSymbol::source("App.T", "System.Object", Span::default()));
        let ctx = AnalysisContext::new(&compilation, "app.json");
        let catalog = ctx.catalog.clone().unwrap();
        let tracker = StateTracker::new(&ctx, &catalog);
        let framework = FrameworkVersionContext::fixed(false);

        let mut verdicts = Vec::new();
        tracker
            .track_local_instances(&body, "Run", "App.T", &mut |event| {
                if let LocalEvent::Invocation { locals, .. } = event {
                    verdicts.push(locals.get("doc").map(|r| r.is_secure(&framework)));
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(verdicts, vec![Some(false), Some(true)]);
    }

    #[test]
    fn test_unknown_provenance_is_not_tracked() {
        let body = block(vec![
            declare_local(
                "doc",
                DOC,
                identifier("source").with_symbol(SymbolRef::parameter("source", DOC)),
            ),
            invoke(local("doc", DOC), DOC, "Load", vec![]),
        ]);
        let compilation = compilation(TypeSymbol::source("App.T", "System.Object", Span::default()));
        let ctx = AnalysisContext::new(&compilation, "app.json");
        let catalog = ctx.catalog.clone().unwrap();
        let tracker = StateTracker::new(&ctx, &catalog);

        let mut seen = Vec::new();
        tracker
            .track_local_instances(&body, "Run", "App.T", &mut |event| {
                if let LocalEvent::Invocation { locals, .. } = event {
                    seen.push(locals.is_empty());
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![true]);
    }
}
