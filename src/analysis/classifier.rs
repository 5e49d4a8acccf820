//! # Assignment Classifier
//!
//! @title Tracked Property Assignment Classification
//! @author Ramprasad
//!
//! Decides, for one `left = right` assignment, whether `left` writes a
//! tracked property slot, whose instance it writes, and whether `right` is a
//! statically known secure value.
//!
//! ## Value Classification
//!
//! 1. Constant value from the host (`null`, `true`/`false`, enum ordinal)
//! 2. Syntax literal (`null`/`Nothing`, `true`/`false`)
//! 3. Named value (`DtdProcessing.Prohibit`, `XmlResolver.ThrowingResolver`)
//! 4. Object creation of a resolver type
//! 5. Expression statically typed as a resolver
//! 6. Anything else is [`ValueClass::Unresolved`] and folds as insecure
//!
//! The classifier is pure: it never mutates scope state.

use super::catalog::{PropertyAccessor, ResolvedCatalog, TrackedProperty, TrackedType, ValueRule};
use crate::host::{ConstantValue, SemanticModel, Span, SymbolKind, SyntaxNode};
use crate::language::SyntaxAdapter;

/// `DtdProcessing` ordinals: `Prohibit = 0`, `Ignore = 1`, `Parse = 2`.
const DTD_PROCESSING_PARSE: i64 = 2;

/// Security classification of an assigned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// Disables the risky capability.
    Secure,

    /// Statically known to enable the risky capability.
    Insecure,

    /// Not statically known; folds as insecure.
    Unresolved,
}

impl ValueClass {
    pub fn is_secure(self) -> bool {
        self == ValueClass::Secure
    }

    fn from_secure(secure: bool) -> Self {
        if secure {
            ValueClass::Secure
        } else {
            ValueClass::Insecure
        }
    }
}

/// Whose configuration an assignment writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentTarget {
    /// `Prop = v`, `this.Prop = v`, `Me.Prop = v`, `base.Prop = v`.
    CurrentInstance,

    /// `name.Prop = v` through a local, parameter or field.
    Variable(String),

    /// Anything further away, e.g. `this.reader.Prop = v`. Assumed not to
    /// mutate the instance under analysis.
    Ambiguous,
}

/// A relevant assignment.
#[derive(Debug, Clone)]
pub struct ClassifiedAssignment {
    pub tracked: &'static TrackedType,
    pub property: &'static TrackedProperty,

    /// Member written (`ProhibitDtd` for the `DtdProcessing` slot, ...).
    pub member: &'static str,

    pub value: ValueClass,
    pub target: AssignmentTarget,

    /// The right side constructs an insecure resolver inline.
    pub inline_insecure_creation: bool,

    /// Type constructed inline, for messages.
    pub created_type: Option<String>,

    pub span: Span,
}

/// Classifier verdict for one assignment.
#[derive(Debug, Clone)]
pub enum Classification {
    NotRelevant,
    Relevant(ClassifiedAssignment),
}

/// Classification of an expression producing a whole tracked-type value.
#[derive(Debug, Clone)]
pub enum InstanceValue<'a> {
    /// A well-known static instance (`XsltSettings.Default`).
    Named { secure: bool },

    /// A new instance: constructor arguments and initializer assignments.
    Created {
        arguments: Vec<&'a SyntaxNode>,
        initializers: Vec<(&'a SyntaxNode, &'a SyntaxNode)>,
    },

    /// Provenance unknown.
    Unknown,
}

/// Stateless classifier over one compilation.
pub struct AssignmentClassifier<'a> {
    model: &'a dyn SemanticModel,
    adapter: &'a dyn SyntaxAdapter,
    catalog: &'a ResolvedCatalog,
}

impl<'a> AssignmentClassifier<'a> {
    pub fn new(
        model: &'a dyn SemanticModel,
        adapter: &'a dyn SyntaxAdapter,
        catalog: &'a ResolvedCatalog,
    ) -> Self {
        Self {
            model,
            adapter,
            catalog,
        }
    }

    /// Classifies `left = right` against a single tracked type.
    ///
    /// # Arguments
    ///
    /// * `tracked` - Type whose configuration the assignment may write
    /// * `left` - Assignment target expression
    /// * `right` - Assigned value expression
    /// * `span` - Location reported for the assignment
    pub fn classify_for(
        &self,
        tracked: &'static TrackedType,
        left: &SyntaxNode,
        right: &SyntaxNode,
        span: &Span,
    ) -> Classification {
        let left = self.adapter.unwrap_parentheses(left);
        let symbol = match self.model.symbol_of(left) {
            Some(symbol) => symbol,
            None => return Classification::NotRelevant,
        };

        match self.catalog.tracked_property(self.model, symbol, tracked) {
            Some((property, accessor)) => Classification::Relevant(
                self.build(tracked, property, accessor, left, right, span),
            ),
            None => Classification::NotRelevant,
        }
    }

    /// Classifies a member initializer (`new T { Prop = v }`) of a tracked
    /// instance. The member is matched by name against `tracked`.
    pub fn classify_initializer(
        &self,
        tracked: &'static TrackedType,
        member: &SyntaxNode,
        value: &SyntaxNode,
    ) -> Option<ClassifiedAssignment> {
        let name = self
            .model
            .symbol_of(member)
            .map(|s| s.name.as_str())
            .or_else(|| self.adapter.identifier(member))?;
        let (property, accessor) = tracked.accessor(name)?;

        let mut assignment = self.build(tracked, property, accessor, member, value, &member.span);
        assignment.target = AssignmentTarget::Ambiguous;
        Some(assignment)
    }

    fn build(
        &self,
        tracked: &'static TrackedType,
        property: &'static TrackedProperty,
        accessor: &'static PropertyAccessor,
        left: &SyntaxNode,
        right: &SyntaxNode,
        span: &Span,
    ) -> ClassifiedAssignment {
        let right = self.adapter.unwrap_parentheses(right);
        let value = self.classify_value(accessor.rule, right);

        let created_type = self
            .adapter
            .object_creation(right)
            .and(self.model.type_of(right))
            .map(str::to_string);
        let inline_insecure_creation = accessor.rule == ValueRule::Resolver
            && value == ValueClass::Insecure
            && created_type.is_some();

        ClassifiedAssignment {
            tracked,
            property,
            member: accessor.member,
            value,
            target: self.target(left),
            inline_insecure_creation,
            created_type,
            span: span.clone(),
        }
    }

    /// Determines whose configuration `left` writes.
    pub fn target(&self, left: &SyntaxNode) -> AssignmentTarget {
        let left = self.adapter.unwrap_parentheses(left);
        if self.adapter.identifier(left).is_some() {
            return AssignmentTarget::CurrentInstance;
        }

        let receiver = match self.adapter.member_access(left) {
            Some((receiver, _)) => self.adapter.unwrap_parentheses(receiver),
            None => return AssignmentTarget::Ambiguous,
        };

        if self.adapter.is_instance_reference(receiver) {
            return AssignmentTarget::CurrentInstance;
        }

        match self.adapter.identifier(receiver) {
            Some(name) => match self.model.symbol_of(receiver).map(|s| s.kind) {
                Some(SymbolKind::Local | SymbolKind::Parameter | SymbolKind::Field) | None => {
                    AssignmentTarget::Variable(name.to_string())
                }
                Some(_) => AssignmentTarget::Ambiguous,
            },
            None => AssignmentTarget::Ambiguous,
        }
    }

    /// Classifies a value assigned through an accessor with the given rule.
    pub fn classify_value(&self, rule: ValueRule, expr: &SyntaxNode) -> ValueClass {
        let expr = self.adapter.unwrap_parentheses(expr);

        if let Some(constant) = self.model.constant_value(expr) {
            if let Some(class) = classify_constant(rule, constant) {
                return class;
            }
        }

        if self.adapter.is_null_literal(expr) {
            return match rule {
                ValueRule::Resolver => ValueClass::Secure,
                _ => ValueClass::Unresolved,
            };
        }

        if let Some(flag) = self.adapter.boolean_literal(expr) {
            return classify_constant(rule, &ConstantValue::Bool(flag))
                .unwrap_or(ValueClass::Unresolved);
        }

        if let Some(symbol) = self.model.symbol_of(expr) {
            if let Some(named) = self.catalog.named_value(symbol, rule) {
                return ValueClass::from_secure(named.secure);
            }
        }

        if rule == ValueRule::Resolver {
            if let Some(type_name) = self.model.type_of(expr) {
                if self.catalog.is_secure_resolver_type(self.model, type_name) {
                    return ValueClass::Secure;
                }
                if self.catalog.is_resolver_type(self.model, type_name) {
                    return ValueClass::Insecure;
                }
            }
        }

        ValueClass::Unresolved
    }

    /// Classifies an expression producing a whole instance of `tracked`.
    pub fn classify_instance<'n>(
        &self,
        tracked: &TrackedType,
        expr: &'n SyntaxNode,
    ) -> InstanceValue<'n> {
        let expr = self.adapter.unwrap_parentheses(expr);

        if let Some(creation) = self.adapter.object_creation(expr) {
            let created = self.model.type_of(expr);
            if created.map_or(false, |t| self.model.derives_from(t, tracked.type_name, false)) {
                return InstanceValue::Created {
                    arguments: creation.arguments,
                    initializers: creation.initializers,
                };
            }
            return InstanceValue::Unknown;
        }

        if let Some(symbol) = self.model.symbol_of(expr) {
            let on_tracked = symbol
                .containing_type
                .as_deref()
                .map_or(false, |t| self.model.derives_from(t, tracked.type_name, false));
            if on_tracked {
                if let Some(named) = tracked.named_instance(&symbol.name) {
                    return InstanceValue::Named {
                        secure: named.secure,
                    };
                }
            }
        }

        InstanceValue::Unknown
    }
}

fn classify_constant(rule: ValueRule, constant: &ConstantValue) -> Option<ValueClass> {
    match (rule, constant) {
        (ValueRule::Resolver, ConstantValue::Null) => Some(ValueClass::Secure),
        (ValueRule::EnableFlag | ValueRule::DtdProcessingMode, ConstantValue::Bool(enabled)) => {
            Some(ValueClass::from_secure(!enabled))
        }
        (ValueRule::ProhibitFlag, ConstantValue::Bool(prohibited)) => {
            Some(ValueClass::from_secure(*prohibited))
        }
        (ValueRule::DtdProcessingMode, ConstantValue::Int(mode)) => {
            Some(ValueClass::from_secure(*mode != DTD_PROCESSING_PARSE))
        }
        _ => None,
    }
}
