//! # codelink
//!
//! Cross-file symbol resolution and dependency graph linking for source trees.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! pipeline  → Collect ∥ → Link → Extract ∥ → Filter
//!   ↓
//! lang      → Language registry, Collector/Extractor traits, Java plug-in
//!   ↓
//! link      → Namespace/file containment edges
//! filter    → Raw / Balanced / Pure noise filtering
//!   ↓
//! symbols   → FileContext, GlobalContext, SymbolResolver
//!   ↓
//! model     → CodeElement, DependencyRelation
//!   ↓
//! base      → Location, LineIndex, constants
//! ```
//!
//! ## Example
//!
//! ```
//! use codelink::{LanguageRegistry, Pipeline, PipelineConfig, SourceFile};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default(), &LanguageRegistry::with_builtin())?;
//! let output = pipeline.run_sources(vec![
//!     SourceFile::new("p/Base.java", "package p; class Base { int size; }"),
//!     SourceFile::new("p/Derived.java", "package p; class Derived extends Base { int get() { return size; } }"),
//! ])?;
//! assert!(output.relations.iter().any(|r| r.target.qualified_name == "p.Base.size"));
//! # Ok::<(), codelink::AnalysisError>(())
//! ```

// ============================================================================
// MODULES (dependency order: base → model → symbols → link/filter → lang → pipeline)
// ============================================================================

/// Foundation types: Location, LineIndex, constants
pub mod base;

/// Error type and Result alias
pub mod error;

/// Entity model: elements and typed relations
pub mod model;

/// Symbol tables and the resolver seam
pub mod symbols;

/// Containment edges between namespaces, files and definitions
pub mod link;

/// Tiered noise filtering
pub mod filter;

/// Language capabilities and the Java plug-in
pub mod lang;

/// Multi-phase concurrent analysis
pub mod pipeline;

// Re-export commonly needed items
pub use base::Location;
pub use error::{AnalysisError, Result};
pub use filter::{FilterLevel, NoiseFilter, TieredNoiseFilter};
pub use lang::{Collector, Extractor, Language, LanguageRegistry, LanguageSupport};
pub use link::{HierarchyLinker, Linker};
pub use model::{CodeElement, DependencyRelation, DependencyType, ElementKind, Extra};
pub use pipeline::{AnalysisOutput, Pipeline, PipelineConfig, SourceFile};
pub use symbols::{DefinitionEntry, FileContext, GlobalContext, ImportEntry, SymbolIndex, SymbolResolver};
