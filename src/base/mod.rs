//! Foundation types shared by every other module.
//!
//! - [`Location`] - 1-based line/column ranges attached to elements and relations
//! - [`LineIndex`], [`LineCol`] - byte offset to line/column conversion
//! - [`constants`] - separators, modifier names and pipeline defaults
//!
//! This module has NO dependencies on other codelink modules.

pub mod constants;
mod line_index;
mod location;

pub use line_index::{LineCol, LineIndex};
pub use location::Location;

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
