//! # Analysis Context
//!
//! @title Per-Compilation Analysis Context
//! @author Ramprasad
//!
//! Everything the detectors need to analyze one compilation, computed once
//! before any detector runs:
//!
//! 1. The [`FrameworkVersionContext`] for the compilation's target framework
//! 2. The [`ResolvedCatalog`] of tracked types the compilation references
//! 3. The [`SyntaxAdapter`] for the compilation's language
//!
//! The context is immutable once built, so detectors may share it freely.

use super::cancellation::CancellationToken;
use super::catalog::ResolvedCatalog;
use super::framework::FrameworkVersionContext;
use crate::host::{SemanticModel, Span, TypeSymbol};
use crate::language::{adapter_for, SyntaxAdapter};
use glob::Pattern;

/// Caller-supplied knobs for building an [`AnalysisContext`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Moniker overriding the compilation's declared target framework.
    pub target_framework: Option<String>,

    /// Types matching any pattern are excluded from analysis.
    pub skip_types: Vec<Pattern>,

    /// Cancellation signal shared with the caller.
    pub cancel: CancellationToken,
}

/// Analysis context for one compilation.
pub struct AnalysisContext<'a> {
    /// Host compiler queries.
    pub model: &'a dyn SemanticModel,

    /// Grammar adapter for the compilation's language.
    pub adapter: &'static dyn SyntaxAdapter,

    /// Target framework defaults, fixed for the whole compilation.
    pub framework: FrameworkVersionContext,

    /// Tracked types present in the compilation; `None` skips every check.
    pub catalog: Option<ResolvedCatalog>,

    /// Cooperative cancellation signal.
    pub cancel: CancellationToken,

    /// Path of the compilation dump, used when a node has no source file.
    pub file_path: String,

    skip_types: Vec<Pattern>,
}

impl<'a> AnalysisContext<'a> {
    /// Builds a context with default options.
    pub fn new(model: &'a dyn SemanticModel, file_path: &str) -> Self {
        Self::with_options(model, file_path, &AnalysisOptions::default())
    }

    /// Builds a context, resolving the framework context and the catalog.
    pub fn with_options(
        model: &'a dyn SemanticModel,
        file_path: &str,
        options: &AnalysisOptions,
    ) -> Self {
        let framework =
            FrameworkVersionContext::for_compilation(model, options.target_framework.as_deref());
        let catalog = ResolvedCatalog::resolve(model);

        log::debug!(
            "{}: target framework {:?}, secure XML defaults: {}",
            file_path,
            framework.version(),
            framework.is_default_configuration_secure()
        );
        if catalog.is_none() {
            log::debug!("{}: no tracked XML types referenced, skipping", file_path);
        }

        Self {
            model,
            adapter: adapter_for(model.language()),
            framework,
            catalog,
            cancel: options.cancel.clone(),
            file_path: file_path.to_string(),
            skip_types: options.skip_types.clone(),
        }
    }

    /// Returns `true` if the type is excluded by a skip pattern.
    pub fn is_skipped(&self, type_name: &str) -> bool {
        self.skip_types.iter().any(|p| p.matches(type_name))
    }

    /// Source types eligible for analysis.
    pub fn candidate_types(&self) -> Vec<&'a TypeSymbol> {
        self.model
            .named_types()
            .into_iter()
            .filter(|t| t.is_source && !self.is_skipped(&t.name))
            .collect()
    }

    /// File a span belongs to, falling back to the dump path.
    pub fn source_file(&self, span: &Span) -> String {
        if span.file.is_empty() {
            self.file_path.clone()
        } else {
            span.file.clone()
        }
    }
}
