//! # Syntax Tree
//!
//! @title Host Syntax Tree
//! @author Ramprasad
//!
//! Language-neutral syntax nodes as exported by the host compiler. Node kinds
//! keep the host's own names (`SimpleAssignmentExpression`,
//! `MeExpression`, ...); only a [`crate::language::SyntaxAdapter`] interprets
//! them. Each node also carries the semantic annotations the host computed for
//! it: the referenced symbol, the static type and the constant value.

use serde::{Deserialize, Serialize};

/// Source position of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Source file the node was declared in.
    #[serde(default)]
    pub file: String,

    /// 1-indexed line number.
    pub line: usize,

    /// 1-indexed column number.
    #[serde(default)]
    pub column: usize,
}

impl Span {
    /// Creates a span at the given file and line, column 1.
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column: 1,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Kind of symbol a node refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Property,
    Field,
    Local,
    Parameter,
    Method,
    Type,
}

/// A reference from a syntax node to the symbol the host bound it to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRef {
    /// Kind of the referenced symbol.
    pub kind: SymbolKind,

    /// Simple name of the symbol (e.g. `XmlResolver`).
    pub name: String,

    /// Full name of the type declaring the symbol, for members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_type: Option<String>,

    /// Full name of the symbol's own type (property type, local type, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl SymbolRef {
    /// Creates a member symbol (property, field or method) of `containing_type`.
    pub fn member(kind: SymbolKind, containing_type: &str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            containing_type: Some(containing_type.to_string()),
            type_name: None,
        }
    }

    /// Creates a property symbol declared on `containing_type`.
    pub fn property(containing_type: &str, name: &str) -> Self {
        Self::member(SymbolKind::Property, containing_type, name)
    }

    /// Creates a local variable symbol of the given type.
    pub fn local(name: &str, type_name: &str) -> Self {
        Self {
            kind: SymbolKind::Local,
            name: name.to_string(),
            containing_type: None,
            type_name: Some(type_name.to_string()),
        }
    }

    /// Creates a parameter symbol of the given type.
    pub fn parameter(name: &str, type_name: &str) -> Self {
        Self {
            kind: SymbolKind::Parameter,
            ..Self::local(name, type_name)
        }
    }
}

/// Compile-time constant value computed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ConstantValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

/// A syntax node with its host annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// Host node kind name.
    pub kind: String,

    /// Position of the node.
    #[serde(default)]
    pub span: Span,

    /// Token text for identifiers and literals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Child nodes in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,

    /// Symbol the host bound this node to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolRef>,

    /// Static type of the expression.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Constant value of the expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<ConstantValue>,
}

impl SyntaxNode {
    /// Creates a bare node of the given kind.
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            span: Span::default(),
            text: None,
            children: Vec::new(),
            symbol: None,
            type_name: None,
            constant: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SyntaxNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_symbol(mut self, symbol: SymbolRef) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_type(mut self, type_name: &str) -> Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    pub fn with_constant(mut self, constant: ConstantValue) -> Self {
        self.constant = Some(constant);
        self
    }

    /// Places the node (and every child still at the default position) at
    /// `line` of `file`.
    pub fn at(mut self, file: &str, line: usize) -> Self {
        self.place(&Span::new(file, line));
        self
    }

    fn place(&mut self, span: &Span) {
        if self.span == Span::default() {
            self.span = span.clone();
        }
        for child in &mut self.children {
            child.place(span);
        }
    }

    /// Returns `true` if the node has the given kind.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Returns the first child of the given kind.
    pub fn child(&self, kind: &str) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.is(kind))
    }

    /// Iterates over the node and all its descendants in pre-order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendants_pre_order() {
        let tree = SyntaxNode::new("Block")
            .with_child(SyntaxNode::new("A").with_child(SyntaxNode::new("A1")))
            .with_child(SyntaxNode::new("B"));

        let kinds: Vec<_> = tree.descendants().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Block", "A", "A1", "B"]);
    }

    #[test]
    fn test_at_keeps_explicit_spans() {
        let tree = SyntaxNode::new("Block")
            .with_child(SyntaxNode::new("A").at("a.cs", 7))
            .at("a.cs", 3);

        assert_eq!(tree.span.line, 3);
        assert_eq!(tree.children[0].span.line, 7);
    }

    #[test]
    fn test_node_deserializes_annotations() {
        let json = r#"{
            "kind": "IdentifierName",
            "span": { "file": "Doc.cs", "line": 12, "column": 9 },
            "text": "XmlResolver",
            "symbol": { "kind": "property", "name": "XmlResolver", "containing_type": "System.Xml.XmlDocument" },
            "constant": { "kind": "null" }
        }"#;

        let node: SyntaxNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.span.line, 12);
        assert_eq!(node.symbol.unwrap().kind, SymbolKind::Property);
        assert_eq!(node.constant, Some(ConstantValue::Null));
    }
}
