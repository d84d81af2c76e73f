//! Symbol tables and the resolver seam.
//!
//! - [`FileContext`] - per-file definitions and imports, filled during collection
//! - [`GlobalContext`] - the shared QN-keyed index behind one `RwLock`
//! - [`SymbolIndex`] - the index itself, read under a single guard by workers
//! - [`SymbolResolver`] - the pluggable resolution algorithm

mod file;
mod global;
mod resolver;

pub use file::{DefinitionEntry, FileContext, ImportEntry};
pub use global::{GlobalContext, SymbolIndex};
pub use resolver::{SymbolResolver, strip_generics};
