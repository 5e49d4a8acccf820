//! # Compilation Builder
//!
//! @title Programmatic Compilation Construction
//! @author Ramprasad
//!
//! Builds [`Compilation`] values in code, for front ends that link the library
//! directly and for tests.

use super::{Compilation, Language, TypeSymbol};

/// Full names of the framework types the XML analyzers reason about, with
/// their base types.
const XML_FRAMEWORK_TYPES: &[(&str, Option<&str>)] = &[
    ("System.Object", None),
    ("System.Xml.XmlNode", Some("System.Object")),
    ("System.Xml.XmlDocument", Some("System.Xml.XmlNode")),
    ("System.Xml.XmlReader", Some("System.Object")),
    ("System.Xml.XmlTextReader", Some("System.Xml.XmlReader")),
    ("System.Xml.XmlResolver", Some("System.Object")),
    ("System.Xml.XmlUrlResolver", Some("System.Xml.XmlResolver")),
    ("System.Xml.XmlSecureResolver", Some("System.Xml.XmlResolver")),
    ("System.Xml.DtdProcessing", Some("System.Object")),
    ("System.Xml.Xsl.XsltSettings", Some("System.Object")),
    ("System.Xml.Xsl.XslCompiledTransform", Some("System.Object")),
];

/// Builder for [`Compilation`].
///
/// # Example
///
/// ```rust,ignore
/// let compilation = CompilationBuilder::new("App")
///     .target_framework("net451")
///     .xml_framework()
///     .with_type(my_type)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CompilationBuilder {
    name: String,
    language: Language,
    target_framework: Option<String>,
    types: Vec<TypeSymbol>,
}

impl CompilationBuilder {
    /// Starts a C# compilation with no types and no target framework.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            language: Language::CSharp,
            target_framework: None,
            types: Vec::new(),
        }
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn target_framework(mut self, moniker: &str) -> Self {
        self.target_framework = Some(moniker.to_string());
        self
    }

    /// Adds a referenced (metadata) type.
    pub fn external_type(self, name: &str, base_type: Option<&str>) -> Self {
        self.with_type(TypeSymbol::external(name, base_type))
    }

    /// Adds the `System.Xml` types the XML analyzers know about.
    pub fn xml_framework(self) -> Self {
        XML_FRAMEWORK_TYPES
            .iter()
            .fold(self, |builder, (name, base)| builder.external_type(name, *base))
    }

    /// Adds a type; a type with the same name replaces the earlier one.
    pub fn with_type(mut self, ty: TypeSymbol) -> Self {
        self.types.retain(|t| t.name != ty.name);
        self.types.push(ty);
        self
    }

    pub fn build(self) -> Compilation {
        Compilation::assemble(
            &self.name,
            self.language,
            self.target_framework,
            self.types,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SemanticModel;

    #[test]
    fn test_xml_framework_hierarchy() {
        let compilation = CompilationBuilder::new("App").xml_framework().build();
        assert!(compilation.derives_from(
            "System.Xml.XmlSecureResolver",
            "System.Xml.XmlResolver",
            true
        ));
        assert!(compilation.source_types().next().is_none());
    }

    #[test]
    fn test_with_type_replaces_duplicate() {
        let compilation = CompilationBuilder::new("App")
            .external_type("A", None)
            .external_type("A", Some("B"))
            .build();
        assert_eq!(compilation.named_types().len(), 1);
        assert_eq!(
            compilation.find_type("A").and_then(|t| t.base_type.as_deref()),
            Some("B")
        );
    }
}
