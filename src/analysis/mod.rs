//! # Analysis Module
//!
//! @title Configuration State Analysis Engine
//! @author Ramprasad
//!
//! This module reconstructs, per constructor or method body, the security
//! posture of XML processing objects: which tracked properties were assigned,
//! to what, and whether the resulting configuration is secure.
//!
//! ## Components
//!
//! - **Framework Context**: Are the target framework's XML defaults secure?
//! - **Catalog**: Tracked types, their properties and known values
//! - **Classifier**: Classifies one assignment
//! - **State Tracker**: Folds assignments of one body into a verdict
//! - **Analysis Context**: Per-compilation bundle handed to detectors

pub mod cancellation;
pub mod catalog;
pub mod classifier;
pub mod context;
pub mod framework;
pub mod state;

pub use cancellation::CancellationToken;
pub use catalog::{ResolvedCatalog, TrackedKind, TrackedProperty, TrackedType};
pub use classifier::{AssignmentClassifier, AssignmentTarget, Classification, ValueClass};
pub use context::{AnalysisContext, AnalysisOptions};
pub use framework::FrameworkVersionContext;
pub use state::{FoldPolicy, PropertyState, ScopeRecord, StateTracker};

use thiserror::Error;

/// Errors that abort an analysis pass.
///
/// Unresolved symbols are never errors; they fold conservatively instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis cancelled")]
    Cancelled,
}
