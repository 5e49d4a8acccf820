//! # Visual Basic Syntax Adapter
//!
//! @title Visual Basic Node Shapes
//! @author Ramprasad
//!
//! Node kinds follow the Roslyn Visual Basic syntax kind names:
//!
//! | Shape | Kind | Children |
//! |-------|------|----------|
//! | assignment | `SimpleAssignmentStatement` | left, right |
//! | member access | `SimpleMemberAccessExpression` | receiver, `IdentifierName` |
//! | object creation | `ObjectCreationExpression` | type?, `ArgumentList`?, `ObjectMemberInitializer`? |
//! | invocation | `InvocationExpression` | callee, `ArgumentList` |
//! | local | `VariableDeclarator` | `ModifiedIdentifier`, `EqualsValue` or `AsNewClause` |

use super::{argument_expressions, Invocation, LocalDeclarator, ObjectCreation, SyntaxAdapter};
use crate::host::{Language, SyntaxNode};

/// Adapter for Visual Basic syntax trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualBasicAdapter;

impl SyntaxAdapter for VisualBasicAdapter {
    fn language(&self) -> Language {
        Language::VisualBasic
    }

    fn assignment<'a>(&self, node: &'a SyntaxNode) -> Option<(&'a SyntaxNode, &'a SyntaxNode)> {
        if !node.is("SimpleAssignmentStatement") {
            return None;
        }
        match node.children.as_slice() {
            [left, right] => Some((left, right)),
            _ => None,
        }
    }

    fn member_access<'a>(&self, node: &'a SyntaxNode) -> Option<(&'a SyntaxNode, &'a str)> {
        if !node.is("SimpleMemberAccessExpression") {
            return None;
        }
        match node.children.as_slice() {
            [receiver, name] => Some((receiver, self.identifier(name)?)),
            _ => None,
        }
    }

    fn identifier<'a>(&self, node: &'a SyntaxNode) -> Option<&'a str> {
        if node.is("IdentifierName") || node.is("ModifiedIdentifier") {
            node.text.as_deref()
        } else {
            None
        }
    }

    fn is_instance_reference(&self, node: &SyntaxNode) -> bool {
        matches!(
            node.kind.as_str(),
            "MeExpression" | "MyBaseExpression" | "MyClassExpression"
        )
    }

    fn is_null_literal(&self, node: &SyntaxNode) -> bool {
        node.is("NothingLiteralExpression")
    }

    fn boolean_literal(&self, node: &SyntaxNode) -> Option<bool> {
        match node.kind.as_str() {
            "TrueLiteralExpression" => Some(true),
            "FalseLiteralExpression" => Some(false),
            _ => None,
        }
    }

    fn object_creation<'a>(&self, node: &'a SyntaxNode) -> Option<ObjectCreation<'a>> {
        if !node.is("ObjectCreationExpression") {
            return None;
        }

        let arguments = argument_expressions(node.child("ArgumentList"), "SimpleArgument");
        // `With { .XmlResolver = Nothing }`
        let initializers = node
            .child("ObjectMemberInitializer")
            .map(|init| {
                init.children
                    .iter()
                    .filter(|member| member.is("NamedFieldInitializer"))
                    .filter_map(|member| match member.children.as_slice() {
                        [name, value] => Some((name, value)),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(ObjectCreation {
            arguments,
            initializers,
        })
    }

    fn invocation<'a>(&self, node: &'a SyntaxNode) -> Option<Invocation<'a>> {
        if !node.is("InvocationExpression") {
            return None;
        }
        let callee = node.children.first()?;
        Some(Invocation {
            callee,
            arguments: argument_expressions(node.child("ArgumentList"), "SimpleArgument"),
        })
    }

    fn local_declarator<'a>(&self, node: &'a SyntaxNode) -> Option<LocalDeclarator<'a>> {
        if !node.is("VariableDeclarator") {
            return None;
        }
        let declaration = node.child("ModifiedIdentifier")?;
        // `Dim d = New XmlDocument()` or `Dim d As New XmlDocument()`
        let initializer = node
            .child("EqualsValue")
            .or_else(|| node.child("AsNewClause"))
            .and_then(|clause| clause.children.last());

        Some(LocalDeclarator {
            name: declaration.text.as_deref()?,
            declaration,
            initializer,
        })
    }

    fn is_nested_function(&self, node: &SyntaxNode) -> bool {
        matches!(
            node.kind.as_str(),
            "SingleLineSubLambdaExpression"
                | "SingleLineFunctionLambdaExpression"
                | "MultiLineSubLambdaExpression"
                | "MultiLineFunctionLambdaExpression"
        )
    }

    fn is_parenthesized(&self, node: &SyntaxNode) -> bool {
        node.is("ParenthesizedExpression")
    }
}

/// Constructors for Visual Basic syntax trees in the shapes
/// [`VisualBasicAdapter`] reads.
pub mod syntax {
    use crate::host::{short_name, SymbolKind, SymbolRef, SyntaxNode};

    pub fn block(statements: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::new("SubBlock").with_children(statements)
    }

    pub fn assign(left: SyntaxNode, right: SyntaxNode) -> SyntaxNode {
        SyntaxNode::new("SimpleAssignmentStatement")
            .with_child(left)
            .with_child(right)
    }

    pub fn identifier(name: &str) -> SyntaxNode {
        SyntaxNode::new("IdentifierName").with_text(name)
    }

    /// Bare reference to a property of the current instance: `Name`.
    pub fn property(containing_type: &str, name: &str) -> SyntaxNode {
        identifier(name).with_symbol(SymbolRef::property(containing_type, name))
    }

    /// `Me.Name`
    pub fn me_property(containing_type: &str, name: &str) -> SyntaxNode {
        member(SyntaxNode::new("MeExpression"), name)
            .with_symbol(SymbolRef::property(containing_type, name))
    }

    pub fn member(receiver: SyntaxNode, name: &str) -> SyntaxNode {
        SyntaxNode::new("SimpleMemberAccessExpression")
            .with_child(receiver)
            .with_child(identifier(name))
    }

    pub fn member_property(receiver: SyntaxNode, containing_type: &str, name: &str) -> SyntaxNode {
        member(receiver, name).with_symbol(SymbolRef::property(containing_type, name))
    }

    pub fn local(name: &str, type_name: &str) -> SyntaxNode {
        identifier(name)
            .with_symbol(SymbolRef::local(name, type_name))
            .with_type(type_name)
    }

    pub fn nothing() -> SyntaxNode {
        SyntaxNode::new("NothingLiteralExpression")
    }

    pub fn boolean(value: bool) -> SyntaxNode {
        if value {
            SyntaxNode::new("TrueLiteralExpression")
        } else {
            SyntaxNode::new("FalseLiteralExpression")
        }
    }

    pub fn named_value(type_name: &str, member_name: &str) -> SyntaxNode {
        member(identifier(short_name(type_name)), member_name)
            .with_symbol(SymbolRef::member(SymbolKind::Field, type_name, member_name))
            .with_type(type_name)
    }

    /// `New Type(args) With { .Member = value, ... }`
    pub fn new_object(
        type_name: &str,
        arguments: Vec<SyntaxNode>,
        initializers: Vec<(&str, SyntaxNode)>,
    ) -> SyntaxNode {
        let mut node = SyntaxNode::new("ObjectCreationExpression")
            .with_type(type_name)
            .with_child(identifier(short_name(type_name)))
            .with_child(argument_list(arguments));

        if !initializers.is_empty() {
            let init = SyntaxNode::new("ObjectMemberInitializer").with_children(
                initializers.into_iter().map(|(name, value)| {
                    SyntaxNode::new("NamedFieldInitializer")
                        .with_child(property(type_name, name))
                        .with_child(value)
                }),
            );
            node = node.with_child(init);
        }
        node
    }

    /// `Dim name As New Type(...)` when `initializer` is a creation,
    /// `Dim name = initializer` otherwise.
    pub fn declare_local(name: &str, type_name: &str, initializer: SyntaxNode) -> SyntaxNode {
        let clause = if initializer.is("ObjectCreationExpression") {
            "AsNewClause"
        } else {
            "EqualsValue"
        };
        let declarator = SyntaxNode::new("VariableDeclarator")
            .with_child(
                SyntaxNode::new("ModifiedIdentifier")
                    .with_text(name)
                    .with_symbol(SymbolRef::local(name, type_name)),
            )
            .with_child(SyntaxNode::new(clause).with_child(initializer));

        SyntaxNode::new("LocalDeclarationStatement").with_child(declarator)
    }

    pub fn invoke(
        receiver: SyntaxNode,
        containing_type: &str,
        method: &str,
        arguments: Vec<SyntaxNode>,
    ) -> SyntaxNode {
        SyntaxNode::new("ExpressionStatement").with_child(
            SyntaxNode::new("InvocationExpression")
                .with_symbol(SymbolRef::member(SymbolKind::Method, containing_type, method))
                .with_child(member(receiver, method))
                .with_child(argument_list(arguments)),
        )
    }

    /// `Sub() ... End Sub`
    pub fn lambda(body: SyntaxNode) -> SyntaxNode {
        SyntaxNode::new("MultiLineSubLambdaExpression").with_child(body)
    }

    fn argument_list(arguments: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::new("ArgumentList").with_children(
            arguments
                .into_iter()
                .map(|arg| SyntaxNode::new("SimpleArgument").with_child(arg)),
        )
    }
}
