//! # Language Module
//!
//! @title Surface Syntax Adapters
//! @author Ramprasad
//!
//! The engine is generic over the grammar of the analyzed language. Every
//! question about the *shape* of a syntax node goes through a
//! [`SyntaxAdapter`]; one implementation exists per supported surface syntax.
//!
//! ## Submodules
//!
//! - [`csharp`] - C# node kinds
//! - [`visual_basic`] - Visual Basic node kinds

pub mod csharp;
pub mod visual_basic;

pub use csharp::CSharpAdapter;
pub use visual_basic::VisualBasicAdapter;

use crate::host::{Language, SyntaxNode};

/// An object creation expression.
#[derive(Debug, Clone)]
pub struct ObjectCreation<'a> {
    /// Constructor arguments, unwrapped from their argument nodes.
    pub arguments: Vec<&'a SyntaxNode>,

    /// Member initializers as `(member, value)` pairs.
    pub initializers: Vec<(&'a SyntaxNode, &'a SyntaxNode)>,
}

/// A method invocation.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    /// The invoked expression (usually a member access).
    pub callee: &'a SyntaxNode,

    /// Arguments, unwrapped from their argument nodes.
    pub arguments: Vec<&'a SyntaxNode>,
}

/// A local variable declarator.
#[derive(Debug, Clone)]
pub struct LocalDeclarator<'a> {
    /// Declared variable name.
    pub name: &'a str,

    /// Node carrying the declared local symbol.
    pub declaration: &'a SyntaxNode,

    /// Initializer expression, if any.
    pub initializer: Option<&'a SyntaxNode>,
}

/// Grammar capability the engine is written against.
///
/// Implementations only describe node shapes; they never consult symbols.
pub trait SyntaxAdapter: Send + Sync {
    /// Language this adapter understands.
    fn language(&self) -> Language;

    /// Splits a simple assignment into `(left, right)`.
    fn assignment<'a>(&self, node: &'a SyntaxNode) -> Option<(&'a SyntaxNode, &'a SyntaxNode)>;

    /// Splits a member access into `(receiver, member name)`.
    fn member_access<'a>(&self, node: &'a SyntaxNode) -> Option<(&'a SyntaxNode, &'a str)>;

    /// Returns the identifier of a simple name node.
    fn identifier<'a>(&self, node: &'a SyntaxNode) -> Option<&'a str>;

    /// Returns `true` for references to the current instance
    /// (`this`, `base`, `Me`, `MyBase`, `MyClass`).
    fn is_instance_reference(&self, node: &SyntaxNode) -> bool;

    /// Returns `true` for the null literal of the language.
    fn is_null_literal(&self, node: &SyntaxNode) -> bool;

    /// Value of a boolean literal.
    fn boolean_literal(&self, node: &SyntaxNode) -> Option<bool>;

    /// Returns the shape of an object creation expression.
    fn object_creation<'a>(&self, node: &'a SyntaxNode) -> Option<ObjectCreation<'a>>;

    /// Returns the shape of an invocation expression.
    fn invocation<'a>(&self, node: &'a SyntaxNode) -> Option<Invocation<'a>>;

    /// Returns the shape of a local variable declarator.
    fn local_declarator<'a>(&self, node: &'a SyntaxNode) -> Option<LocalDeclarator<'a>>;

    /// Returns `true` for lambdas, anonymous methods and local functions.
    fn is_nested_function(&self, node: &SyntaxNode) -> bool;

    /// Returns `true` for a parenthesized expression.
    fn is_parenthesized(&self, node: &SyntaxNode) -> bool;

    /// Strips any number of enclosing parentheses.
    fn unwrap_parentheses<'a>(&self, node: &'a SyntaxNode) -> &'a SyntaxNode {
        let mut current = node;
        while self.is_parenthesized(current) {
            match current.children.first() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }
}

static CSHARP: CSharpAdapter = CSharpAdapter;
static VISUAL_BASIC: VisualBasicAdapter = VisualBasicAdapter;

/// Selects the adapter for a language.
pub fn adapter_for(language: Language) -> &'static dyn SyntaxAdapter {
    match language {
        Language::CSharp => &CSHARP,
        Language::VisualBasic => &VISUAL_BASIC,
    }
}

/// Returns the children of an argument list, unwrapping each argument node to
/// its expression.
pub(crate) fn argument_expressions<'a>(
    list: Option<&'a SyntaxNode>,
    argument_kind: &str,
) -> Vec<&'a SyntaxNode> {
    list.map(|list| {
        list.children
            .iter()
            .filter_map(|arg| {
                if arg.is(argument_kind) {
                    arg.children.last()
                } else {
                    Some(arg)
                }
            })
            .collect()
    })
    .unwrap_or_default()
}
