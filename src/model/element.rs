//! Code elements.

use std::collections::BTreeMap;
use std::fmt;

use smol_str::SmolStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::base::Location;
use crate::base::constants::MOD_STATIC;

// ============================================================================
// ELEMENT KIND
// ============================================================================

/// The kind of a code element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ElementKind {
    /// A source file (synthesized at registration)
    File,
    /// A package / namespace segment
    Namespace,
    Class,
    Interface,
    Struct,
    Enum,
    EnumConstant,
    AnnotationType,
    Trait,
    /// A class body attached to an instance creation
    AnonymousClass,
    Lambda,
    MethodReference,
    /// An anonymous block such as an initializer
    ScopeBlock,
    Function,
    Method,
    Macro,
    /// Parameters and locals
    Variable,
    Constant,
    Field,
    TypeAlias,
    #[default]
    Unknown,
}

impl ElementKind {
    /// Types that carry an inheritance chain.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            ElementKind::Class
                | ElementKind::Interface
                | ElementKind::Struct
                | ElementKind::Enum
                | ElementKind::AnnotationType
                | ElementKind::Trait
                | ElementKind::AnonymousClass
        )
    }

    /// Kinds whose bodies contain executable code.
    pub fn is_executable(&self) -> bool {
        matches!(
            self,
            ElementKind::Method
                | ElementKind::Function
                | ElementKind::ScopeBlock
                | ElementKind::Lambda
                | ElementKind::Macro
        )
    }

    /// Kinds that can contain other definitions.
    pub fn is_container(&self) -> bool {
        self.is_type() || self.is_executable() || *self == ElementKind::Namespace
    }

    pub fn display(&self) -> &'static str {
        match self {
            ElementKind::File => "file",
            ElementKind::Namespace => "namespace",
            ElementKind::Class => "class",
            ElementKind::Interface => "interface",
            ElementKind::Struct => "struct",
            ElementKind::Enum => "enum",
            ElementKind::EnumConstant => "enum-constant",
            ElementKind::AnnotationType => "annotation-type",
            ElementKind::Trait => "trait",
            ElementKind::AnonymousClass => "anonymous-class",
            ElementKind::Lambda => "lambda",
            ElementKind::MethodReference => "method-reference",
            ElementKind::ScopeBlock => "scope-block",
            ElementKind::Function => "function",
            ElementKind::Method => "method",
            ElementKind::Macro => "macro",
            ElementKind::Variable => "variable",
            ElementKind::Constant => "constant",
            ElementKind::Field => "field",
            ElementKind::TypeAlias => "type-alias",
            ElementKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

// ============================================================================
// EXTRA ATTRIBUTES
// ============================================================================

/// Language-specific attributes of an element.
///
/// Type texts are kept as written in the source (`List<String>`); they are
/// resolved lazily by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Extra {
    pub modifiers: Vec<SmolStr>,
    /// Annotation names without the leading `@`
    pub annotations: Vec<SmolStr>,
    pub super_class: Option<String>,
    /// Implemented interfaces (classes) or extended interfaces (interfaces)
    pub interfaces: Vec<String>,
    /// Parameter type texts in declaration order
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub throws: Vec<String>,
    /// Declared type of a field, constant or variable
    pub value_type: Option<String>,
    /// Open key/value attributes
    pub mores: BTreeMap<String, String>,
}

impl Extra {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier(MOD_STATIC)
    }

    /// Super class first, then interfaces, in declaration order.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        self.super_class
            .iter()
            .chain(self.interfaces.iter())
            .map(String::as_str)
    }
}

// ============================================================================
// CODE ELEMENT
// ============================================================================

/// A definition, or an entity a relation points at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CodeElement {
    pub kind: ElementKind,
    /// Short name (`Foo`, `bar`)
    pub name: SmolStr,
    /// Fully qualified name; empty until the file is registered
    pub qualified_name: String,
    /// Defining file; empty for pure references
    pub path: String,
    pub signature: Option<String>,
    pub location: Option<Location>,
    pub doc: Option<String>,
    pub comment: Option<String>,
    pub extra: Extra,
    pub is_from_source: bool,
    /// Synthesized by the system (file and namespace nodes)
    pub is_from_sugar: bool,
    /// A stand-in for something outside the analyzed tree
    pub is_from_external: bool,
}

impl CodeElement {
    /// Create an element found in the analyzed source.
    pub fn new(kind: ElementKind, name: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            name: name.into(),
            is_from_source: true,
            ..Self::default()
        }
    }

    /// Create a synthesized element with a known QN.
    pub fn sugar(kind: ElementKind, name: impl Into<SmolStr>, qualified_name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            qualified_name: qualified_name.into(),
            is_from_sugar: true,
            ..Self::default()
        }
    }

    /// Create a stand-in for an entity outside the analyzed tree.
    pub fn external(kind: ElementKind, name: impl Into<SmolStr>, qualified_name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            qualified_name: qualified_name.into(),
            is_from_external: true,
            ..Self::default()
        }
    }

    pub fn with_qualified_name(mut self, qualified_name: impl Into<String>) -> Self {
        self.qualified_name = qualified_name.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_modifiers<I, S>(mut self, modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.extra.modifiers = modifiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_super_class(mut self, super_class: impl Into<String>) -> Self {
        self.extra.super_class = Some(super_class.into());
        self
    }

    pub fn with_interfaces<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra.interfaces = interfaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_static(&self) -> bool {
        self.extra.is_static()
    }

    /// Whether the element belongs to the analyzed tree (source or synthesized).
    pub fn is_internal(&self) -> bool {
        self.is_from_source || self.is_from_sugar
    }
}
