//! # Symbol Table Entries
//!
//! @title Host Symbols
//! @author Ramprasad
//!
//! Named types and their members as declared by the host compiler.

use super::syntax::{Span, SyntaxNode};
use serde::{Deserialize, Serialize};

/// Kind of a method symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// Instance constructor.
    Constructor,

    /// Type initializer (`static` / `Shared Sub New`).
    StaticConstructor,

    /// Ordinary method.
    Method,

    /// Property or event accessor.
    Accessor,
}

/// A constructor, method or accessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSymbol {
    /// Method name (`.ctor` for constructors).
    pub name: String,

    /// Kind of method.
    pub kind: MethodKind,

    /// Whether the compiler synthesized this member.
    #[serde(default)]
    pub is_implicit: bool,

    /// Declaration location.
    #[serde(default)]
    pub location: Span,

    /// Body syntax, absent for abstract, extern and synthesized members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<SyntaxNode>,
}

impl MethodSymbol {
    /// Creates an explicit constructor with the given body.
    pub fn constructor(body: SyntaxNode) -> Self {
        Self {
            name: ".ctor".to_string(),
            kind: MethodKind::Constructor,
            is_implicit: false,
            location: body.span.clone(),
            body: Some(body),
        }
    }

    /// Creates the compiler-synthesized parameterless constructor.
    pub fn implicit_constructor(location: Span) -> Self {
        Self {
            name: ".ctor".to_string(),
            kind: MethodKind::Constructor,
            is_implicit: true,
            location,
            body: None,
        }
    }

    /// Creates an ordinary method with the given body.
    pub fn method(name: &str, body: SyntaxNode) -> Self {
        Self {
            name: name.to_string(),
            kind: MethodKind::Method,
            is_implicit: false,
            location: body.span.clone(),
            body: Some(body),
        }
    }

    /// Returns `true` for instance constructors.
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }
}

/// A property declared on a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySymbol {
    pub name: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// A named type (class, struct, ...) visible to the compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSymbol {
    /// Fully qualified name (e.g. `System.Xml.XmlDocument`).
    pub name: String,

    /// Fully qualified name of the direct base type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,

    /// Whether the type is declared in source of this compilation, as opposed
    /// to a referenced assembly.
    #[serde(default)]
    pub is_source: bool,

    /// Declaration location.
    #[serde(default)]
    pub location: Span,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertySymbol>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodSymbol>,
}

impl TypeSymbol {
    /// Creates a referenced (metadata) type.
    pub fn external(name: &str, base_type: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            base_type: base_type.map(str::to_string),
            is_source: false,
            location: Span::default(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Creates a type declared in source.
    pub fn source(name: &str, base_type: &str, location: Span) -> Self {
        Self {
            is_source: true,
            location,
            ..Self::external(name, Some(base_type))
        }
    }

    pub fn with_method(mut self, method: MethodSymbol) -> Self {
        self.methods.push(method);
        self
    }

    /// Simple name without namespace.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// Instance constructors, explicit and synthesized.
    pub fn constructors(&self) -> impl Iterator<Item = &MethodSymbol> {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    /// Returns `true` when the only instance constructor is compiler-synthesized.
    ///
    /// A type without any constructor entry is treated the same way, since the
    /// compiler always provides one.
    pub fn has_only_implicit_constructor(&self) -> bool {
        let mut ctors = self.constructors();
        match (ctors.next(), ctors.next()) {
            (None, _) => true,
            (Some(ctor), None) => ctor.is_implicit,
            _ => false,
        }
    }
}

/// Strips the namespace from a fully qualified type name.
pub fn short_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}
