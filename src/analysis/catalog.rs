//! # Sensitive-Type Catalog
//!
//! @title Tracked XML Types
//! @author Ramprasad
//!
//! Static registry of the types whose instances carry security-relevant XML
//! configuration, the properties on them that matter, and the values known
//! to be secure or insecure.
//!
//! | Tracked type | Slots | Default |
//! |--------------|-------|---------|
//! | `System.Xml.XmlDocument` | `XmlResolver` | framework dependent |
//! | `System.Xml.XmlTextReader` | `XmlResolver`, `DtdProcessing` (`ProhibitDtd`) | framework dependent, insecure |
//! | `System.Xml.Xsl.XsltSettings` | `EnableScript`, `EnableDocumentFunction` | secure |
//!
//! The catalog is resolved once per compilation: a tracked type absent from
//! the compilation's symbol table is dropped, and every check keyed on it is
//! skipped.

use super::framework::FrameworkVersionContext;
use crate::host::{SemanticModel, SymbolKind, SymbolRef};

/// Full name of the resolver base type.
pub const RESOLVER_TYPE: &str = "System.Xml.XmlResolver";

/// Resolvers that restrict what external resources may be loaded.
pub const SECURE_RESOLVER_TYPES: &[&str] = &["System.Xml.XmlSecureResolver"];

/// Compiles style sheets under an `XsltSettings` configuration.
pub const TRANSFORM_TYPE: &str = "System.Xml.Xsl.XslCompiledTransform";

/// Role of a tracked type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackedKind {
    /// `XmlDocument`
    DocumentParser,

    /// `XmlTextReader`
    StreamingReader,

    /// `XsltSettings`
    TransformSettings,
}

/// How the right side of an assignment to a tracked property is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    /// `null` or a secure resolver is secure; any other resolver is not.
    Resolver,

    /// `false` disables the capability.
    EnableFlag,

    /// `true` disables the capability (`ProhibitDtd`).
    ProhibitFlag,

    /// `DtdProcessing.Prohibit`/`Ignore` are secure, `Parse` is not. Boolean
    /// literals read with enable sense.
    DtdProcessingMode,
}

/// Value a tracked property has when it is never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeDefault {
    Secure,
    Insecure,
    /// Secure exactly when the target framework's defaults are secure.
    FrameworkDependent,
}

/// A member through which a tracked property slot is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyAccessor {
    pub member: &'static str,
    pub rule: ValueRule,
}

/// One security-relevant configuration slot of a tracked type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedProperty {
    /// Slot name used in diagnostics.
    pub slot: &'static str,

    /// Members that write the slot.
    pub accessors: &'static [PropertyAccessor],

    /// Value when never assigned.
    pub default: SafeDefault,
}

impl TrackedProperty {
    /// Returns `true` if the unassigned slot is secure on this target.
    pub fn default_secure(&self, framework: &FrameworkVersionContext) -> bool {
        match self.default {
            SafeDefault::Secure => true,
            SafeDefault::Insecure => false,
            SafeDefault::FrameworkDependent => framework.is_default_configuration_secure(),
        }
    }

    /// Finds the accessor for a member name.
    pub fn accessor(&self, member: &str) -> Option<&'static PropertyAccessor> {
        self.accessors.iter().find(|a| a.member == member)
    }
}

/// A static member of a tracked type holding a complete, well-known
/// configuration (e.g. `XsltSettings.Default`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedInstance {
    pub member: &'static str,
    pub secure: bool,
}

/// A sensitive base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedType {
    pub kind: TrackedKind,

    /// Fully qualified name.
    pub type_name: &'static str,

    pub properties: &'static [TrackedProperty],

    pub named_instances: &'static [NamedInstance],

    /// Slots set positionally by constructor arguments, when the argument
    /// count matches exactly.
    pub creation_arguments: &'static [&'static str],

    /// Whether source types may derive from it (sealed types are never
    /// audited as base types).
    pub inheritable: bool,
}

impl TrackedType {
    pub fn short_name(&self) -> &'static str {
        crate::host::short_name(self.type_name)
    }

    /// Finds the slot and accessor written through `member`.
    pub fn accessor(
        &self,
        member: &str,
    ) -> Option<(&'static TrackedProperty, &'static PropertyAccessor)> {
        self.properties
            .iter()
            .find_map(|p| p.accessor(member).map(|a| (p, a)))
    }

    pub fn named_instance(&self, member: &str) -> Option<&'static NamedInstance> {
        self.named_instances.iter().find(|n| n.member == member)
    }

    /// Returns `true` if every slot is secure when never assigned.
    pub fn defaults_secure(&self, framework: &FrameworkVersionContext) -> bool {
        self.properties.iter().all(|p| p.default_secure(framework))
    }
}

/// A static member of a non-tracked type with a known classification
/// (e.g. `DtdProcessing.Prohibit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedValue {
    pub type_name: &'static str,
    pub member: &'static str,
    pub rule: ValueRule,
    pub secure: bool,
}

const RESOLVER: PropertyAccessor = PropertyAccessor {
    member: "XmlResolver",
    rule: ValueRule::Resolver,
};

/// Every type the analyzers track.
pub static TRACKED_TYPES: &[TrackedType] = &[
    TrackedType {
        kind: TrackedKind::DocumentParser,
        type_name: "System.Xml.XmlDocument",
        properties: &[TrackedProperty {
            slot: "XmlResolver",
            accessors: &[RESOLVER],
            default: SafeDefault::FrameworkDependent,
        }],
        named_instances: &[],
        creation_arguments: &[],
        inheritable: true,
    },
    TrackedType {
        kind: TrackedKind::StreamingReader,
        type_name: "System.Xml.XmlTextReader",
        properties: &[
            TrackedProperty {
                slot: "XmlResolver",
                accessors: &[RESOLVER],
                default: SafeDefault::FrameworkDependent,
            },
            TrackedProperty {
                slot: "DtdProcessing",
                accessors: &[
                    PropertyAccessor {
                        member: "DtdProcessing",
                        rule: ValueRule::DtdProcessingMode,
                    },
                    PropertyAccessor {
                        member: "ProhibitDtd",
                        rule: ValueRule::ProhibitFlag,
                    },
                ],
                default: SafeDefault::Insecure,
            },
        ],
        named_instances: &[],
        creation_arguments: &[],
        inheritable: true,
    },
    TrackedType {
        kind: TrackedKind::TransformSettings,
        type_name: "System.Xml.Xsl.XsltSettings",
        properties: &[
            TrackedProperty {
                slot: "EnableDocumentFunction",
                accessors: &[PropertyAccessor {
                    member: "EnableDocumentFunction",
                    rule: ValueRule::EnableFlag,
                }],
                default: SafeDefault::Secure,
            },
            TrackedProperty {
                slot: "EnableScript",
                accessors: &[PropertyAccessor {
                    member: "EnableScript",
                    rule: ValueRule::EnableFlag,
                }],
                default: SafeDefault::Secure,
            },
        ],
        named_instances: &[
            NamedInstance {
                member: "Default",
                secure: true,
            },
            NamedInstance {
                member: "TrustedXslt",
                secure: false,
            },
        ],
        creation_arguments: &["EnableDocumentFunction", "EnableScript"],
        inheritable: false,
    },
];

/// Static members of non-tracked types with a known classification.
pub static NAMED_VALUES: &[NamedValue] = &[
    NamedValue {
        type_name: "System.Xml.DtdProcessing",
        member: "Prohibit",
        rule: ValueRule::DtdProcessingMode,
        secure: true,
    },
    NamedValue {
        type_name: "System.Xml.DtdProcessing",
        member: "Ignore",
        rule: ValueRule::DtdProcessingMode,
        secure: true,
    },
    NamedValue {
        type_name: "System.Xml.DtdProcessing",
        member: "Parse",
        rule: ValueRule::DtdProcessingMode,
        secure: false,
    },
    NamedValue {
        type_name: RESOLVER_TYPE,
        member: "ThrowingResolver",
        rule: ValueRule::Resolver,
        secure: true,
    },
];

/// The catalog entries present in one compilation.
#[derive(Debug, Clone)]
pub struct ResolvedCatalog {
    types: Vec<&'static TrackedType>,
}

impl ResolvedCatalog {
    /// Resolves the catalog against a compilation's symbol table.
    ///
    /// # Returns
    ///
    /// `None` when the compilation references none of the tracked types, so
    /// the whole family of checks can be skipped.
    pub fn resolve(model: &dyn SemanticModel) -> Option<Self> {
        let types: Vec<_> = TRACKED_TYPES
            .iter()
            .filter(|t| model.find_type(t.type_name).is_some())
            .collect();

        if types.is_empty() {
            None
        } else {
            Some(Self { types })
        }
    }

    /// Tracked types present in the compilation.
    pub fn types(&self) -> &[&'static TrackedType] {
        &self.types
    }

    /// Entry for a role, if the compilation references that type.
    pub fn get(&self, kind: TrackedKind) -> Option<&'static TrackedType> {
        self.types.iter().copied().find(|t| t.kind == kind)
    }

    /// The tracked type that `type_name` is, or derives from.
    pub fn lookup(&self, model: &dyn SemanticModel, type_name: &str) -> Option<&'static TrackedType> {
        self.types
            .iter()
            .copied()
            .find(|t| model.derives_from(type_name, t.type_name, false))
    }

    /// Slot and accessor written through `symbol`, if it is a tracked property
    /// of `tracked`.
    ///
    /// Matches by member name and declaring-type compatibility rather than
    /// symbol identity, so properties re-declared on derived types still count.
    pub fn tracked_property(
        &self,
        model: &dyn SemanticModel,
        symbol: &SymbolRef,
        tracked: &TrackedType,
    ) -> Option<(&'static TrackedProperty, &'static PropertyAccessor)> {
        if symbol.kind != SymbolKind::Property {
            return None;
        }
        let declaring = symbol.containing_type.as_deref()?;
        if !model.derives_from(declaring, tracked.type_name, false) {
            return None;
        }
        tracked.accessor(&symbol.name)
    }

    /// Returns `true` if values of `type_name` restrict resolution.
    pub fn is_secure_resolver_type(&self, model: &dyn SemanticModel, type_name: &str) -> bool {
        SECURE_RESOLVER_TYPES
            .iter()
            .any(|secure| model.derives_from(type_name, secure, false))
    }

    /// Returns `true` if values of `type_name` are resolvers.
    pub fn is_resolver_type(&self, model: &dyn SemanticModel, type_name: &str) -> bool {
        model.derives_from(type_name, RESOLVER_TYPE, false)
    }

    /// Looks up a named value on a non-tracked type.
    pub fn named_value(&self, symbol: &SymbolRef, rule: ValueRule) -> Option<&'static NamedValue> {
        let declaring = symbol.containing_type.as_deref()?;
        NAMED_VALUES
            .iter()
            .find(|v| v.rule == rule && v.type_name == declaring && v.member == symbol.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CompilationBuilder, Span, TypeSymbol};

    #[test]
    fn test_resolve_skips_unreferenced_types() {
        let compilation = CompilationBuilder::new("App")
            .external_type("System.Xml.XmlDocument", None)
            .build();
        let catalog = ResolvedCatalog::resolve(&compilation).unwrap();

        assert!(catalog.get(TrackedKind::DocumentParser).is_some());
        assert!(catalog.get(TrackedKind::TransformSettings).is_none());
    }

    #[test]
    fn test_resolve_none_without_xml_types() {
        let compilation = CompilationBuilder::new("App")
            .external_type("System.Object", None)
            .build();
        assert!(ResolvedCatalog::resolve(&compilation).is_none());
    }

    #[test]
    fn test_tracked_property_through_derived_declaration() {
        let compilation = CompilationBuilder::new("App")
            .xml_framework()
            .with_type(TypeSymbol::source("App.Doc", "System.Xml.XmlDocument", Span::default()))
            .build();
        let catalog = ResolvedCatalog::resolve(&compilation).unwrap();
        let document = catalog.get(TrackedKind::DocumentParser).unwrap();

        let shadowed = SymbolRef::property("App.Doc", "XmlResolver");
        assert!(catalog.tracked_property(&compilation, &shadowed, document).is_some());

        let unrelated = SymbolRef::property("System.Xml.Xsl.XsltSettings", "XmlResolver");
        assert!(catalog.tracked_property(&compilation, &unrelated, document).is_none());

        let other_name = SymbolRef::property("App.Doc", "PreserveWhitespace");
        assert!(catalog.tracked_property(&compilation, &other_name, document).is_none());
    }

    #[test]
    fn test_prohibit_dtd_writes_dtd_slot() {
        let reader = TRACKED_TYPES
            .iter()
            .find(|t| t.kind == TrackedKind::StreamingReader)
            .unwrap();
        let (slot, accessor) = reader.accessor("ProhibitDtd").unwrap();
        assert_eq!(slot.slot, "DtdProcessing");
        assert_eq!(accessor.rule, ValueRule::ProhibitFlag);
    }

    #[test]
    fn test_defaults_follow_framework() {
        let document = &TRACKED_TYPES[0];
        assert!(document.defaults_secure(&FrameworkVersionContext::fixed(true)));
        assert!(!document.defaults_secure(&FrameworkVersionContext::fixed(false)));

        let reader = &TRACKED_TYPES[1];
        assert!(!reader.defaults_secure(&FrameworkVersionContext::fixed(true)));
    }
}
