//! File symbol table.
//!
//! Collectors add definitions with a *file-relative* parent fragment
//! (`""` for top-level, `"Outer.Inner"` for a member of a nested type) and an
//! optional local segment. The file is qualified against its package once, when
//! it is registered with the [`GlobalContext`](super::GlobalContext).

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::SymbolResolver;
use crate::base::Location;
use crate::base::constants::{QN_SEPARATOR, WILDCARD_ALIAS};
use crate::model::{CodeElement, ElementKind};

// ============================================================================
// ENTRIES
// ============================================================================

/// A definition and the QN of its enclosing scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionEntry {
    pub element: Arc<CodeElement>,
    pub parent_qn: String,
    /// Local identity under the parent (`run(int)` for an overload)
    pub segment: SmolStr,
}

impl DefinitionEntry {
    pub fn new(element: CodeElement, parent_qn: impl Into<String>) -> Self {
        let segment = element.name.clone();
        Self {
            element: Arc::new(element),
            parent_qn: parent_qn.into(),
            segment,
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.element.qualified_name
    }

    pub fn kind(&self) -> ElementKind {
        self.element.kind
    }
}

/// One import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    /// Imported path as written (`java.util.List`, `java.util.*`)
    pub raw_path: String,
    pub alias: SmolStr,
    pub kind: ElementKind,
    pub is_wildcard: bool,
    pub is_static: bool,
    pub location: Option<Location>,
}

impl ImportEntry {
    /// A single-name import; the alias is the last path segment.
    pub fn single(raw_path: impl Into<String>) -> Self {
        let raw_path = raw_path.into();
        let alias = SmolStr::new(last_segment(&raw_path));
        Self {
            raw_path,
            alias,
            kind: ElementKind::Class,
            is_wildcard: false,
            is_static: false,
            location: None,
        }
    }

    /// A wildcard import (`a.b.*`), stored under the `*` alias.
    pub fn wildcard(raw_path: impl Into<String>) -> Self {
        Self {
            raw_path: raw_path.into(),
            alias: SmolStr::new_static(WILDCARD_ALIAS),
            kind: ElementKind::Namespace,
            is_wildcard: true,
            is_static: false,
            location: None,
        }
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// The import path with a trailing `.*` / `*` removed.
    pub fn prefix(&self) -> &str {
        let trimmed = self.raw_path.trim_end_matches('*');
        trimmed.strip_suffix(QN_SEPARATOR).unwrap_or(trimmed)
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit(QN_SEPARATOR).next().unwrap_or(path)
}

// ============================================================================
// FILE CONTEXT
// ============================================================================

#[derive(Debug, Default)]
struct FileSymbols {
    definitions: Vec<Arc<DefinitionEntry>>,
    by_short_name: FxHashMap<SmolStr, Vec<usize>>,
    by_kind: FxHashMap<ElementKind, Vec<usize>>,
    /// Imports in registration order
    imports: Vec<ImportEntry>,
    /// Alias -> indexes into `imports`, in first-seen alias order
    imports_by_alias: IndexMap<SmolStr, Vec<usize>>,
    qualified: bool,
}

impl FileSymbols {
    fn push(&mut self, entry: Arc<DefinitionEntry>) {
        let idx = self.definitions.len();
        self.by_short_name
            .entry(entry.element.name.clone())
            .or_default()
            .push(idx);
        self.by_kind.entry(entry.element.kind).or_default().push(idx);
        self.definitions.push(entry);
    }

    fn collect(&self, indexes: Option<&Vec<usize>>) -> Vec<Arc<DefinitionEntry>> {
        indexes
            .map(|ids| ids.iter().map(|&i| self.definitions[i].clone()).collect())
            .unwrap_or_default()
    }
}

/// Per-file symbol table.
///
/// Writes go through an internal lock so a collector may add definitions from
/// several threads; after registration the context is only read.
#[derive(Debug)]
pub struct FileContext {
    path: String,
    package_name: String,
    source: Option<Arc<str>>,
    symbols: RwLock<FileSymbols>,
}

impl FileContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package_name: String::new(),
            source: None,
            symbols: RwLock::new(FileSymbols::default()),
        }
    }

    pub fn with_package(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    /// Keep the source text for the extraction phase.
    pub fn with_source(mut self, source: Arc<str>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn set_package_name(&mut self, package_name: impl Into<String>) {
        self.package_name = package_name.into();
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn source(&self) -> Option<&Arc<str>> {
        self.source.as_ref()
    }

    // ------------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------------

    /// Register a definition under `parent_qn`; its segment is its short name.
    pub fn add_definition(&self, element: CodeElement, parent_qn: impl Into<String>) -> Arc<DefinitionEntry> {
        let entry = Arc::new(DefinitionEntry::new(element, parent_qn));
        self.symbols.write().push(entry.clone());
        entry
    }

    /// Register a definition with an explicit local segment.
    pub fn add_definition_with_segment(
        &self,
        element: CodeElement,
        parent_qn: impl Into<String>,
        segment: impl Into<SmolStr>,
    ) -> Arc<DefinitionEntry> {
        let mut entry = DefinitionEntry::new(element, parent_qn);
        entry.segment = segment.into();
        let entry = Arc::new(entry);
        self.symbols.write().push(entry.clone());
        entry
    }

    /// All definitions in insertion order.
    pub fn definitions(&self) -> Vec<Arc<DefinitionEntry>> {
        self.symbols.read().definitions.clone()
    }

    pub fn definition_count(&self) -> usize {
        self.symbols.read().definitions.len()
    }

    pub fn find_by_short_name(&self, name: &str) -> Vec<Arc<DefinitionEntry>> {
        let symbols = self.symbols.read();
        symbols.collect(symbols.by_short_name.get(name))
    }

    pub fn find_by_kind(&self, kind: ElementKind) -> Vec<Arc<DefinitionEntry>> {
        let symbols = self.symbols.read();
        symbols.collect(symbols.by_kind.get(&kind))
    }

    // ------------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------------

    /// Record an import under `alias`. Several imports may share an alias.
    pub fn add_import(&self, alias: impl Into<SmolStr>, mut entry: ImportEntry) {
        let alias = alias.into();
        entry.alias = alias.clone();
        let mut symbols = self.symbols.write();
        let idx = symbols.imports.len();
        symbols.imports.push(entry);
        symbols.imports_by_alias.entry(alias).or_default().push(idx);
    }

    /// All imports in registration order.
    pub fn imports(&self) -> Vec<ImportEntry> {
        self.symbols.read().imports.clone()
    }

    pub fn imports_for_alias(&self, alias: &str) -> Vec<ImportEntry> {
        let symbols = self.symbols.read();
        symbols
            .imports_by_alias
            .get(alias)
            .map(|ids| ids.iter().map(|&i| symbols.imports[i].clone()).collect())
            .unwrap_or_default()
    }

    /// Wildcard imports in registration order.
    pub fn wildcard_imports(&self) -> Vec<ImportEntry> {
        self.symbols
            .read()
            .imports
            .iter()
            .filter(|i| i.is_wildcard)
            .cloned()
            .collect()
    }

    /// Aliases in the order they were first imported.
    pub fn import_aliases(&self) -> Vec<SmolStr> {
        self.symbols.read().imports_by_alias.keys().cloned().collect()
    }

    // ------------------------------------------------------------------------
    // Qualification
    // ------------------------------------------------------------------------

    /// Turn file-relative parents into absolute QNs.
    ///
    /// Entries whose element already has a QN are left as they are. Runs once;
    /// later calls are no-ops.
    pub(crate) fn qualify(&mut self, resolver: &dyn SymbolResolver) {
        let path = self.path.clone();
        let package = self.package_name.clone();
        let symbols = self.symbols.get_mut();
        if symbols.qualified {
            return;
        }

        let entries = std::mem::take(&mut symbols.definitions);
        symbols.by_short_name.clear();
        symbols.by_kind.clear();

        for entry in entries {
            let needs_qn = entry.element.qualified_name.is_empty();
            let needs_path = entry.element.path.is_empty();
            if !needs_qn && !needs_path {
                symbols.push(entry);
                continue;
            }

            let mut entry = Arc::unwrap_or_clone(entry);
            let element = Arc::make_mut(&mut entry.element);
            if needs_path {
                element.path = path.clone();
            }
            if let Some(location) = element.location.as_mut() {
                if location.path.is_empty() {
                    location.path = path.clone();
                }
            }
            if needs_qn {
                let parent = absolute_parent(resolver, &package, &entry.parent_qn);
                element.qualified_name = resolver.build_qualified_name(&parent, &entry.segment);
                entry.parent_qn = parent;
            }
            symbols.push(Arc::new(entry));
        }
        symbols.qualified = true;
    }
}

fn absolute_parent(resolver: &dyn SymbolResolver, package: &str, fragment: &str) -> String {
    if fragment.is_empty() {
        package.to_string()
    } else if package.is_empty() {
        fragment.to_string()
    } else {
        resolver.build_qualified_name(package, fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::java::JavaSymbolResolver;

    #[test]
    fn test_short_name_and_kind_lookups_keep_insertion_order() {
        let fc = FileContext::new("A.java");
        fc.add_definition(CodeElement::new(ElementKind::Class, "A"), "");
        fc.add_definition(CodeElement::new(ElementKind::Field, "x"), "A");
        fc.add_definition(CodeElement::new(ElementKind::Variable, "x"), "A.run()");

        let xs = fc.find_by_short_name("x");
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0].kind(), ElementKind::Field);
        assert_eq!(xs[1].kind(), ElementKind::Variable);
        assert_eq!(fc.find_by_kind(ElementKind::Class).len(), 1);
        assert!(fc.find_by_short_name("missing").is_empty());
    }

    #[test]
    fn test_imports_share_alias_and_keep_order() {
        let fc = FileContext::new("A.java");
        fc.add_import("List", ImportEntry::single("java.util.List"));
        fc.add_import("*", ImportEntry::wildcard("a.*"));
        fc.add_import("List", ImportEntry::single("java.awt.List"));
        fc.add_import("*", ImportEntry::wildcard("b.*"));

        let lists = fc.imports_for_alias("List");
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[1].raw_path, "java.awt.List");

        let wildcards: Vec<_> = fc.wildcard_imports().into_iter().map(|i| i.raw_path).collect();
        assert_eq!(wildcards, vec!["a.*", "b.*"]);
        assert_eq!(fc.import_aliases(), vec![SmolStr::new("List"), SmolStr::new("*")]);
    }

    #[test]
    fn test_import_prefix() {
        assert_eq!(ImportEntry::wildcard("com.acme.*").prefix(), "com.acme");
        assert_eq!(ImportEntry::single("com.acme.Foo").prefix(), "com.acme.Foo");
        assert_eq!(ImportEntry::single("com.acme.Foo").alias, "Foo");
    }

    #[test]
    fn test_qualify_uses_package_and_segment() {
        let mut fc = FileContext::new("com/acme/A.java").with_package("com.acme");
        fc.add_definition(CodeElement::new(ElementKind::Class, "A"), "");
        fc.add_definition_with_segment(CodeElement::new(ElementKind::Method, "run"), "A", "run(int)");
        fc.add_definition(
            CodeElement::new(ElementKind::Class, "Pre").with_qualified_name("x.Pre"),
            "x",
        );

        fc.qualify(&JavaSymbolResolver::new());
        fc.qualify(&JavaSymbolResolver::new());

        let defs = fc.definitions();
        assert_eq!(defs[0].qualified_name(), "com.acme.A");
        assert_eq!(defs[0].parent_qn, "com.acme");
        assert_eq!(defs[0].element.path, "com/acme/A.java");
        assert_eq!(defs[1].qualified_name(), "com.acme.A.run(int)");
        assert_eq!(defs[1].parent_qn, "com.acme.A");
        assert_eq!(defs[2].qualified_name(), "x.Pre");
        assert_eq!(defs[2].parent_qn, "x");
        assert_eq!(fc.find_by_short_name("run").len(), 1);
    }

    #[test]
    fn test_concurrent_adds_all_land() {
        let fc = Arc::new(FileContext::new("A.java"));
        std::thread::scope(|s| {
            for t in 0..4 {
                let fc = fc.clone();
                s.spawn(move || {
                    for i in 0..50 {
                        fc.add_definition(CodeElement::new(ElementKind::Field, format!("f{t}_{i}")), "A");
                    }
                });
            }
        });
        assert_eq!(fc.definition_count(), 200);
        assert_eq!(fc.find_by_kind(ElementKind::Field).len(), 200);
    }
}
