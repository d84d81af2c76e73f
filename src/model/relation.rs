//! Typed relations between code elements.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::CodeElement;
use crate::base::Location;

/// The kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DependencyType {
    Import,
    Export,
    /// Structural nesting (namespace → file → type → member)
    Contain,
    Extend,
    Implement,
    Override,
    Annotation,
    Parameter,
    Return,
    Throw,
    /// A type used as a generic argument
    TypeArg,
    Call,
    Create,
    Cast,
    Use,
    Assign,
    Capture,
    ImplLink,
    Mixin,
}

impl DependencyType {
    pub fn display(&self) -> &'static str {
        match self {
            DependencyType::Import => "import",
            DependencyType::Export => "export",
            DependencyType::Contain => "contain",
            DependencyType::Extend => "extend",
            DependencyType::Implement => "implement",
            DependencyType::Override => "override",
            DependencyType::Annotation => "annotation",
            DependencyType::Parameter => "parameter",
            DependencyType::Return => "return",
            DependencyType::Throw => "throw",
            DependencyType::TypeArg => "type-arg",
            DependencyType::Call => "call",
            DependencyType::Create => "create",
            DependencyType::Cast => "cast",
            DependencyType::Use => "use",
            DependencyType::Assign => "assign",
            DependencyType::Capture => "capture",
            DependencyType::ImplLink => "impl-link",
            DependencyType::Mixin => "mixin",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// A typed edge from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DependencyRelation {
    pub kind: DependencyType,
    pub source: Arc<CodeElement>,
    /// A resolved definition or an external stand-in
    pub target: Arc<CodeElement>,
    pub location: Option<Location>,
    pub details: Option<String>,
    pub mores: BTreeMap<String, String>,
}

impl DependencyRelation {
    pub fn new(kind: DependencyType, source: Arc<CodeElement>, target: Arc<CodeElement>) -> Self {
        Self {
            kind,
            source,
            target,
            location: None,
            details: None,
            mores: BTreeMap::new(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// `(kind, source QN, target QN)` - identifies the edge regardless of location.
    pub fn key(&self) -> (DependencyType, &str, &str) {
        (
            self.kind,
            self.source.qualified_name.as_str(),
            self.target.qualified_name.as_str(),
        )
    }
}

impl fmt::Display for DependencyRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} --{}--> {}",
            self.source.qualified_name, self.kind, self.target.qualified_name
        )
    }
}
