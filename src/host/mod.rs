//! # Host Compiler Module
//!
//! @title Host Compiler Surface
//! @author Ramprasad
//!
//! The analyzers never parse source themselves. A compiler front end exports
//! each compilation as a JSON *compilation dump*: every named type it can see,
//! member bodies as syntax trees, and the semantic annotations (bound symbol,
//! static type, constant value) for each node. This module loads those dumps
//! and exposes them through the narrow [`SemanticModel`] trait the engine is
//! written against.
//!
//! ## Key Types
//!
//! - [`SemanticModel`] - Symbol table and type hierarchy queries
//! - [`Compilation`] - A loaded compilation dump
//! - [`CompilationBuilder`] - Programmatic construction of compilations
//! - [`SyntaxNode`] - Annotated syntax node

mod builder;
mod symbols;
mod syntax;

pub use builder::CompilationBuilder;
pub use symbols::*;
pub use syntax::*;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Surface syntax a compilation was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[serde(rename = "csharp", alias = "c#", alias = "cs")]
    CSharp,

    #[serde(alias = "vb")]
    VisualBasic,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::CSharp => write!(f, "C#"),
            Language::VisualBasic => write!(f, "Visual Basic"),
        }
    }
}

/// Errors raised while loading a compilation dump.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read compilation dump {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed compilation dump {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("type `{0}` is declared more than once in the compilation dump")]
    DuplicateType(String),
}

/// Read-only queries the analyzers make against the host compiler.
///
/// Every query answers `None`/`false` when the host could not resolve
/// something; callers fold that conservatively instead of failing.
pub trait SemanticModel: Send + Sync {
    /// Surface syntax of the compilation.
    fn language(&self) -> Language;

    /// Target framework moniker declared for the compilation.
    fn target_framework(&self) -> Option<&str>;

    /// All named types visible to the compilation.
    fn named_types(&self) -> Vec<&TypeSymbol>;

    /// Looks a type up by fully qualified name.
    fn find_type(&self, name: &str) -> Option<&TypeSymbol>;

    /// Returns `true` if `ty` derives (directly or transitively) from `base`.
    ///
    /// With `base_types_only` the type itself does not count as deriving from
    /// itself.
    fn derives_from(&self, ty: &str, base: &str, base_types_only: bool) -> bool;

    /// Symbol the node is bound to.
    fn symbol_of<'n>(&self, node: &'n SyntaxNode) -> Option<&'n SymbolRef> {
        node.symbol.as_ref()
    }

    /// Static type of an expression node.
    fn type_of<'n>(&self, node: &'n SyntaxNode) -> Option<&'n str> {
        node.type_name
            .as_deref()
            .or_else(|| node.symbol.as_ref().and_then(|s| s.type_name.as_deref()))
    }

    /// Constant value of an expression node.
    fn constant_value<'n>(&self, node: &'n SyntaxNode) -> Option<&'n ConstantValue> {
        node.constant.as_ref()
    }
}

/// On-disk shape of a compilation dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CompilationDump {
    name: String,
    language: Language,
    #[serde(default)]
    target_framework: Option<String>,
    #[serde(default)]
    types: Vec<TypeSymbol>,
}

/// A compilation loaded from a dump, indexed for symbol lookups.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Assembly / project name.
    pub name: String,

    /// Surface syntax.
    pub language: Language,

    /// Declared target framework moniker.
    pub target_framework: Option<String>,

    /// Path of the dump this compilation was loaded from.
    pub source_path: String,

    types: Vec<TypeSymbol>,
    index: HashMap<String, usize>,
}

impl Compilation {
    /// Creates a compilation from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::DuplicateType`] if two types share a full name.
    pub fn new(
        name: &str,
        language: Language,
        target_framework: Option<String>,
        types: Vec<TypeSymbol>,
    ) -> Result<Self, HostError> {
        let mut seen = HashSet::with_capacity(types.len());
        if let Some(dup) = types.iter().find(|t| !seen.insert(t.name.as_str())) {
            return Err(HostError::DuplicateType(dup.name.clone()));
        }

        Ok(Self::assemble(name, language, target_framework, types))
    }

    /// Indexes `types` by name; a later duplicate shadows an earlier one.
    fn assemble(
        name: &str,
        language: Language,
        target_framework: Option<String>,
        types: Vec<TypeSymbol>,
    ) -> Self {
        let index = types
            .iter()
            .enumerate()
            .map(|(i, ty)| (ty.name.clone(), i))
            .collect();

        Self {
            name: name.to_string(),
            language,
            target_framework,
            source_path: String::new(),
            types,
            index,
        }
    }

    /// Parses a compilation dump from JSON text.
    pub fn from_json(path: &str, json: &str) -> Result<Self, HostError> {
        let dump: CompilationDump =
            serde_json::from_str(json).map_err(|source| HostError::Decode {
                path: path.to_string(),
                source,
            })?;

        let mut compilation =
            Self::new(&dump.name, dump.language, dump.target_framework, dump.types)?;
        compilation.source_path = path.to_string();
        Ok(compilation)
    }

    /// Serializes the compilation back into dump form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let dump = CompilationDump {
            name: self.name.clone(),
            language: self.language,
            target_framework: self.target_framework.clone(),
            types: self.types.clone(),
        };
        serde_json::to_string_pretty(&dump)
    }

    /// Types declared in source of this compilation.
    pub fn source_types(&self) -> impl Iterator<Item = &TypeSymbol> {
        self.types.iter().filter(|t| t.is_source)
    }
}

impl SemanticModel for Compilation {
    fn language(&self) -> Language {
        self.language
    }

    fn target_framework(&self) -> Option<&str> {
        self.target_framework.as_deref()
    }

    fn named_types(&self) -> Vec<&TypeSymbol> {
        self.types.iter().collect()
    }

    fn find_type(&self, name: &str) -> Option<&TypeSymbol> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    fn derives_from(&self, ty: &str, base: &str, base_types_only: bool) -> bool {
        if !base_types_only && ty == base {
            return true;
        }

        let mut visited = HashSet::new();
        let mut current = self.find_type(ty).and_then(|t| t.base_type.as_deref());

        while let Some(name) = current {
            if name == base {
                return true;
            }
            if !visited.insert(name) {
                log::debug!("Cyclic base type chain through {}", name);
                return false;
            }
            current = self.find_type(name).and_then(|t| t.base_type.as_deref());
        }

        false
    }
}

/// Loads a compilation dump from a filesystem path.
///
/// # Arguments
///
/// * `path` - Path to the JSON dump
///
/// # Returns
///
/// The loaded [`Compilation`], or a [`HostError`] if the file cannot be read
/// or decoded.
pub fn load_compilation(path: &Path) -> Result<Compilation, HostError> {
    let display = path.to_string_lossy().to_string();
    let json = std::fs::read_to_string(path).map_err(|source| HostError::Io {
        path: display.clone(),
        source,
    })?;
    Compilation::from_json(&display, &json)
}
