//! Entity model: code elements and the typed relations between them.
//!
//! - [`CodeElement`] - a definition or referenced entity, addressed by QN
//! - [`ElementKind`] - the closed set of element kinds
//! - [`Extra`] - language-specific attributes (modifiers, supertypes, signature parts)
//! - [`DependencyRelation`], [`DependencyType`] - typed edges of the output graph

mod element;
mod relation;

pub use element::{CodeElement, ElementKind, Extra};
pub use relation::{DependencyRelation, DependencyType};
