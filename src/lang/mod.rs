//! Per-language capabilities.
//!
//! A language plugs into the pipeline through a closed set of capability
//! traits: a [`SymbolResolver`](crate::symbols::SymbolResolver), a
//! [`Collector`], a [`Linker`](crate::link::Linker), an [`Extractor`] and a
//! [`NoiseFilter`](crate::filter::NoiseFilter). [`LanguageRegistry`] maps each
//! [`Language`] to its bundle; the pipeline picks one bundle when it is built.

pub mod java;
mod registry;

use std::sync::Arc;

pub use registry::{Language, LanguageRegistry, LanguageSupport};

use crate::error::Result;
use crate::model::DependencyRelation;
use crate::symbols::{FileContext, GlobalContext};

/// Turns one source file into its definitions and imports.
///
/// Parent QNs handed to [`FileContext::add_definition`] are file-relative
/// fragments; the global table qualifies them on registration.
pub trait Collector: Send + Sync {
    fn collect(&self, path: &str, source: Arc<str>) -> Result<FileContext>;
}

/// Emits the typed relations of one registered file.
///
/// Runs after every file is registered, so every name in the tree can be resolved.
pub trait Extractor: Send + Sync {
    fn extract(&self, file: &FileContext, global: &GlobalContext) -> Result<Vec<DependencyRelation>>;
}
