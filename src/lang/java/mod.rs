//! Java reference plug-in.
//!
//! ```text
//! lexer      → logos tokens (comments kept for Javadoc)
//!   ↓
//! collector  → outline parse: package, imports, types, members, locals
//!   ↓
//! resolver   → dotted QNs, import/package/wildcard lookup, inheritance walk
//!   ↓
//! extractor  → declaration and body relations
//! ```

mod builtins;
mod collector;
mod extractor;
pub mod lexer;
mod resolver;

use std::sync::Arc;

pub use builtins::{builtin, is_keyword, is_primitive};
pub use collector::JavaCollector;
pub use extractor::JavaExtractor;
pub use resolver::JavaSymbolResolver;

use super::LanguageSupport;
use crate::filter::TieredNoiseFilter;
use crate::link::HierarchyLinker;

/// The capability bundle for Java.
pub fn support() -> LanguageSupport {
    LanguageSupport {
        resolver: Arc::new(JavaSymbolResolver::new()),
        collector: Arc::new(JavaCollector::new()),
        linker: Arc::new(HierarchyLinker::new()),
        extractor: Arc::new(JavaExtractor::new()),
        noise_filter: Arc::new(TieredNoiseFilter::new()),
    }
}
