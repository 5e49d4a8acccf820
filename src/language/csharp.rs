//! # C# Syntax Adapter
//!
//! @title C# Node Shapes
//! @author Ramprasad
//!
//! Node kinds follow the Roslyn C# syntax kind names:
//!
//! | Shape | Kind | Children |
//! |-------|------|----------|
//! | assignment | `SimpleAssignmentExpression` | left, right |
//! | member access | `SimpleMemberAccessExpression` | receiver, `IdentifierName` |
//! | object creation | `ObjectCreationExpression` | type?, `ArgumentList`?, `ObjectInitializerExpression`? |
//! | invocation | `InvocationExpression` | callee, `ArgumentList` |
//! | local | `VariableDeclarator` (text = name) | `EqualsValueClause`? |

use super::{argument_expressions, Invocation, LocalDeclarator, ObjectCreation, SyntaxAdapter};
use crate::host::{Language, SyntaxNode};

/// Adapter for C# syntax trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpAdapter;

impl SyntaxAdapter for CSharpAdapter {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn assignment<'a>(&self, node: &'a SyntaxNode) -> Option<(&'a SyntaxNode, &'a SyntaxNode)> {
        if !node.is("SimpleAssignmentExpression") {
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
        if node.is("IdentifierName") {
            node.text.as_deref()
        } else {
            None
        }
    }

    fn is_instance_reference(&self, node: &SyntaxNode) -> bool {
        node.is("ThisExpression") || node.is("BaseExpression")
    }

    fn is_null_literal(&self, node: &SyntaxNode) -> bool {
        node.is("NullLiteralExpression")
    }

    fn boolean_literal(&self, node: &SyntaxNode) -> Option<bool> {
        match node.kind.as_str() {
            "TrueLiteralExpression" => Some(true),
            "FalseLiteralExpression" => Some(false),
            _ => None,
        }
    }

    fn object_creation<'a>(&self, node: &'a SyntaxNode) -> Option<ObjectCreation<'a>> {
        if !node.is("ObjectCreationExpression") && !node.is("ImplicitObjectCreationExpression") {
            return None;
        }

        let arguments = argument_expressions(node.child("ArgumentList"), "Argument");
        let initializers = node
            .child("ObjectInitializerExpression")
            .map(|init| {
                init.children
                    .iter()
                    .filter_map(|member| self.assignment(member))
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
            arguments: argument_expressions(node.child("ArgumentList"), "Argument"),
        })
    }

    fn local_declarator<'a>(&self, node: &'a SyntaxNode) -> Option<LocalDeclarator<'a>> {
        if !node.is("VariableDeclarator") {
            return None;
        }
        Some(LocalDeclarator {
            name: node.text.as_deref()?,
            declaration: node,
            initializer: node
                .child("EqualsValueClause")
                .and_then(|clause| clause.children.last()),
        })
    }

    fn is_nested_function(&self, node: &SyntaxNode) -> bool {
        matches!(
            node.kind.as_str(),
            "ParenthesizedLambdaExpression"
                | "SimpleLambdaExpression"
                | "AnonymousMethodExpression"
                | "LocalFunctionStatement"
        )
    }

    fn is_parenthesized(&self, node: &SyntaxNode) -> bool {
        node.is("ParenthesizedExpression")
    }
}

/// Constructors for C# syntax trees in the shapes [`CSharpAdapter`] reads.
pub mod syntax {
    use crate::host::{short_name, SymbolKind, SymbolRef, SyntaxNode};

    pub fn block(statements: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::new("Block").with_children(statements)
    }

    pub fn statement(expression: SyntaxNode) -> SyntaxNode {
        SyntaxNode::new("ExpressionStatement").with_child(expression)
    }

    pub fn assign(left: SyntaxNode, right: SyntaxNode) -> SyntaxNode {
        statement(
            SyntaxNode::new("SimpleAssignmentExpression")
                .with_child(left)
                .with_child(right),
        )
    }

    pub fn identifier(name: &str) -> SyntaxNode {
        SyntaxNode::new("IdentifierName").with_text(name)
    }

    /// Bare reference to a property of the current instance: `Name`.
    pub fn property(containing_type: &str, name: &str) -> SyntaxNode {
        identifier(name).with_symbol(SymbolRef::property(containing_type, name))
    }

    /// `this.Name`
    pub fn this_property(containing_type: &str, name: &str) -> SyntaxNode {
        member(SyntaxNode::new("ThisExpression"), name)
            .with_symbol(SymbolRef::property(containing_type, name))
    }

    /// `receiver.Name`, unbound.
    pub fn member(receiver: SyntaxNode, name: &str) -> SyntaxNode {
        SyntaxNode::new("SimpleMemberAccessExpression")
            .with_child(receiver)
            .with_child(identifier(name))
    }

    /// `receiver.Name` bound to a property of `containing_type`.
    pub fn member_property(receiver: SyntaxNode, containing_type: &str, name: &str) -> SyntaxNode {
        member(receiver, name).with_symbol(SymbolRef::property(containing_type, name))
    }

    pub fn local(name: &str, type_name: &str) -> SyntaxNode {
        identifier(name)
            .with_symbol(SymbolRef::local(name, type_name))
            .with_type(type_name)
    }

    pub fn parameter(name: &str, type_name: &str) -> SyntaxNode {
        identifier(name)
            .with_symbol(SymbolRef::parameter(name, type_name))
            .with_type(type_name)
    }

    pub fn null() -> SyntaxNode {
        SyntaxNode::new("NullLiteralExpression")
    }

    pub fn boolean(value: bool) -> SyntaxNode {
        if value {
            SyntaxNode::new("TrueLiteralExpression")
        } else {
            SyntaxNode::new("FalseLiteralExpression")
        }
    }

    /// `Type.Member` bound to a static field of `type_name`.
    pub fn named_value(type_name: &str, member_name: &str) -> SyntaxNode {
        let type_ref = identifier(short_name(type_name)).with_symbol(SymbolRef {
            kind: SymbolKind::Type,
            name: type_name.to_string(),
            containing_type: None,
            type_name: None,
        });
        member(type_ref, member_name)
            .with_symbol(SymbolRef::member(SymbolKind::Field, type_name, member_name))
            .with_type(type_name)
    }

    /// `new Type(args) { Member = value, ... }`
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
            let init = SyntaxNode::new("ObjectInitializerExpression").with_children(
                initializers.into_iter().map(|(name, value)| {
                    SyntaxNode::new("SimpleAssignmentExpression")
                        .with_child(property(type_name, name))
                        .with_child(value)
                }),
            );
            node = node.with_child(init);
        }
        node
    }

    /// `var name = initializer;`
    pub fn declare_local(name: &str, type_name: &str, initializer: SyntaxNode) -> SyntaxNode {
        let declarator = SyntaxNode::new("VariableDeclarator")
            .with_text(name)
            .with_symbol(SymbolRef::local(name, type_name))
            .with_child(SyntaxNode::new("EqualsValueClause").with_child(initializer));

        SyntaxNode::new("LocalDeclarationStatement")
            .with_child(SyntaxNode::new("VariableDeclaration").with_child(declarator))
    }

    /// `receiver.Method(args)` bound to a method of `containing_type`.
    pub fn invoke(
        receiver: SyntaxNode,
        containing_type: &str,
        method: &str,
        arguments: Vec<SyntaxNode>,
    ) -> SyntaxNode {
        statement(
            SyntaxNode::new("InvocationExpression")
                .with_symbol(SymbolRef::member(SymbolKind::Method, containing_type, method))
                .with_child(member(receiver, method))
                .with_child(argument_list(arguments)),
        )
    }

    /// `() => { body }`
    pub fn lambda(body: SyntaxNode) -> SyntaxNode {
        SyntaxNode::new("ParenthesizedLambdaExpression").with_child(body)
    }

    /// `void name() { body }` nested in a method.
    pub fn local_function(name: &str, body: SyntaxNode) -> SyntaxNode {
        SyntaxNode::new("LocalFunctionStatement")
            .with_text(name)
            .with_child(body)
    }

    fn argument_list(arguments: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::new("ArgumentList").with_children(
            arguments
                .into_iter()
                .map(|arg| SyntaxNode::new("Argument").with_child(arg)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::syntax::*;
    use super::*;

    #[test]
    fn test_assignment_shape() {
        let stmt = assign(this_property("System.Xml.XmlDocument", "XmlResolver"), null());
        let expr = &stmt.children[0];
        let (left, right) = CSharpAdapter.assignment(expr).unwrap();

        let (receiver, name) = CSharpAdapter.member_access(left).unwrap();
        assert!(CSharpAdapter.is_instance_reference(receiver));
        assert_eq!(name, "XmlResolver");
        assert!(CSharpAdapter.is_null_literal(right));
    }

    #[test]
    fn test_object_creation_shape() {
        let creation = new_object(
            "System.Xml.XmlDocument",
            vec![],
            vec![("XmlResolver", null())],
        );
        let shape = CSharpAdapter.object_creation(&creation).unwrap();
        assert!(shape.arguments.is_empty());
        assert_eq!(shape.initializers.len(), 1);
        assert_eq!(CSharpAdapter.identifier(shape.initializers[0].0), Some("XmlResolver"));
    }

    #[test]
    fn test_local_declarator_shape() {
        let decl = declare_local("doc", "System.Xml.XmlDocument", null());
        let declarator = decl
            .descendants()
            .find_map(|n| CSharpAdapter.local_declarator(n))
            .unwrap();
        assert_eq!(declarator.name, "doc");
        assert!(CSharpAdapter.is_null_literal(declarator.initializer.unwrap()));
    }

    #[test]
    fn test_nested_functions() {
        assert!(CSharpAdapter.is_nested_function(&lambda(block(vec![]))));
        assert!(CSharpAdapter.is_nested_function(&local_function("f", block(vec![]))));
        assert!(!CSharpAdapter.is_nested_function(&block(vec![])));
    }
}
