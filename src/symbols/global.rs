//! Global symbol table.
//!
//! One [`SymbolIndex`] per run behind a `parking_lot::RwLock`. Collect and Link
//! take the write lock; Extract workers take one read guard per file and pass
//! `&SymbolIndex` down to the resolver so no lookup re-locks.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use super::{DefinitionEntry, FileContext, SymbolResolver};
use crate::model::{CodeElement, ElementKind};

// ============================================================================
// SYMBOL INDEX
// ============================================================================

/// QN-keyed index over every registered definition.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    files: FxHashMap<String, Arc<FileContext>>,
    /// Every definition, including synthesized nodes, in insertion order
    definitions: Vec<Arc<DefinitionEntry>>,
    by_qualified_name: FxHashMap<String, Arc<DefinitionEntry>>,
    /// Owner QN -> direct members
    members: FxHashMap<String, Vec<Arc<DefinitionEntry>>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any entry at the same QN.
    pub fn insert(&mut self, entry: Arc<DefinitionEntry>) {
        let qn = entry.qualified_name().to_string();
        if let Some(previous) = self.by_qualified_name.insert(qn, entry.clone()) {
            if let Some(members) = self.members.get_mut(&previous.parent_qn) {
                members.retain(|m| !Arc::ptr_eq(m, &previous));
            }
        }
        self.members
            .entry(entry.parent_qn.clone())
            .or_default()
            .push(entry.clone());
        self.definitions.push(entry);
    }

    /// Insert an entry only if its QN is unknown. Returns whether it was added.
    pub fn insert_if_absent(&mut self, entry: Arc<DefinitionEntry>) -> bool {
        if self.by_qualified_name.contains_key(entry.qualified_name()) {
            return false;
        }
        self.insert(entry);
        true
    }

    /// Drop everything a file contributed.
    pub fn remove_file(&mut self, path: &str) -> bool {
        if self.files.remove(path).is_none() {
            return false;
        }
        let from_file = |e: &Arc<DefinitionEntry>| e.element.path == path;
        self.definitions.retain(|e| !from_file(e));
        self.by_qualified_name.retain(|_, e| !from_file(e));
        for members in self.members.values_mut() {
            members.retain(|e| !from_file(e));
        }
        true
    }

    pub(crate) fn insert_file(&mut self, file: Arc<FileContext>) {
        self.files.insert(file.path().to_string(), file);
    }

    pub fn find_by_qualified_name(&self, qualified_name: &str) -> Option<&Arc<DefinitionEntry>> {
        self.by_qualified_name.get(qualified_name)
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.by_qualified_name.contains_key(qualified_name)
    }

    /// Direct members of `owner_qn` with the given short name.
    ///
    /// Finds overloads whose segment carries a parameter suffix.
    pub fn find_members(&self, owner_qn: &str, name: &str) -> Vec<Arc<DefinitionEntry>> {
        self.members
            .get(owner_qn)
            .map(|members| {
                members
                    .iter()
                    .filter(|m| m.element.name == name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn file_context(&self, path: &str) -> Option<&Arc<FileContext>> {
        self.files.get(path)
    }

    /// File contexts sorted by path.
    pub fn file_contexts(&self) -> Vec<Arc<FileContext>> {
        let mut files: Vec<_> = self.files.values().cloned().collect();
        files.sort_by(|a, b| a.path().cmp(b.path()));
        files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn definitions(&self) -> &[Arc<DefinitionEntry>] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.by_qualified_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_qualified_name.is_empty()
    }
}

// ============================================================================
// GLOBAL CONTEXT
// ============================================================================

/// The run-wide symbol table and the resolver that interprets it.
#[derive(Debug)]
pub struct GlobalContext {
    index: RwLock<SymbolIndex>,
    resolver: Arc<dyn SymbolResolver>,
}

impl GlobalContext {
    pub fn new(resolver: Arc<dyn SymbolResolver>) -> Self {
        Self {
            index: RwLock::new(SymbolIndex::new()),
            resolver,
        }
    }

    pub fn resolver(&self) -> &dyn SymbolResolver {
        self.resolver.as_ref()
    }

    /// Read guard for a batch of lookups.
    pub fn read(&self) -> RwLockReadGuard<'_, SymbolIndex> {
        self.index.read()
    }

    /// Merge a collected file into the table.
    ///
    /// Re-registering a path first drops what it contributed before. Entries
    /// overwrite any existing entry at the same QN (last registration wins).
    pub fn register_file_context(&self, mut file: FileContext) -> Arc<FileContext> {
        file.qualify(self.resolver.as_ref());
        let file = Arc::new(file);
        let path = file.path().to_string();
        let package = file.package_name().to_string();

        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(&path);
        let file_element = CodeElement::sugar(ElementKind::File, file_name, path.clone()).with_path(path.clone());
        let mut file_entry = DefinitionEntry::new(file_element, package.clone());
        file_entry.segment = SmolStr::new(&path);

        let definitions = file.definitions();
        let mut index = self.index.write();
        if index.remove_file(&path) {
            debug!("re-registering {}", path);
        }
        self.resolver.register_package(&mut index, &package);
        index.insert(Arc::new(file_entry));
        for entry in &definitions {
            index.insert(entry.clone());
        }
        index.insert_file(file.clone());
        debug!(
            "registered {} ({} definitions, package '{}')",
            path,
            definitions.len(),
            package
        );
        file
    }

    /// Insert a synthesized entry unless its QN already exists.
    pub fn add_definition(&self, entry: DefinitionEntry) -> bool {
        self.index.write().insert_if_absent(Arc::new(entry))
    }

    pub fn find_by_qualified_name(&self, qualified_name: &str) -> Option<Arc<DefinitionEntry>> {
        self.index.read().find_by_qualified_name(qualified_name).cloned()
    }

    pub fn file_context(&self, path: &str) -> Option<Arc<FileContext>> {
        self.index.read().file_context(path).cloned()
    }

    /// Flat resolution of `symbol` as seen from `file`.
    pub fn resolve_symbol(&self, file: &FileContext, symbol: &str) -> Vec<Arc<DefinitionEntry>> {
        let index = self.index.read();
        self.resolver.resolve(&index, file, symbol)
    }

    /// Scope-hierarchy resolution of `symbol` from inside `container_qn`.
    pub fn resolve_in_scope_hierarchy(
        &self,
        file: &FileContext,
        container_qn: &str,
        symbol: &str,
        is_static: bool,
    ) -> Option<Arc<DefinitionEntry>> {
        let index = self.index.read();
        self.resolver
            .resolve_in_scope_hierarchy(&index, file, container_qn, symbol, is_static)
    }

    pub fn build_qualified_name(&self, parent_qn: &str, name: &str) -> String {
        self.resolver.build_qualified_name(parent_qn, name)
    }

    /// Every definition in the table.
    pub fn definitions(&self) -> Vec<Arc<DefinitionEntry>> {
        self.index.read().definitions().to_vec()
    }

    /// Every element in the table.
    pub fn elements(&self) -> Vec<Arc<CodeElement>> {
        self.index
            .read()
            .definitions()
            .iter()
            .map(|e| e.element.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::java::JavaSymbolResolver;

    fn global() -> GlobalContext {
        GlobalContext::new(Arc::new(JavaSymbolResolver::new()))
    }

    fn file_with_class(path: &str, package: &str, class: &str) -> FileContext {
        let fc = FileContext::new(path).with_package(package);
        fc.add_definition(CodeElement::new(ElementKind::Class, class), "");
        fc
    }

    #[test]
    fn test_register_synthesizes_file_and_namespaces() {
        let g = global();
        g.register_file_context(file_with_class("a/b/C.java", "a.b", "C"));

        let file = g.find_by_qualified_name("a/b/C.java").unwrap();
        assert_eq!(file.kind(), ElementKind::File);
        assert!(file.element.is_from_sugar);
        assert_eq!(g.find_by_qualified_name("a").unwrap().kind(), ElementKind::Namespace);
        assert_eq!(g.find_by_qualified_name("a.b").unwrap().parent_qn, "a");
        assert_eq!(g.find_by_qualified_name("a.b.C").unwrap().parent_qn, "a.b");
    }

    #[test]
    fn test_last_registration_wins_on_collision() {
        let g = global();
        g.register_file_context(file_with_class("one/C.java", "p", "C"));
        g.register_file_context(file_with_class("two/C.java", "p", "C"));
        assert_eq!(g.find_by_qualified_name("p.C").unwrap().element.path, "two/C.java");
    }

    #[test]
    fn test_reregistration_replaces_previous_entries() {
        let g = global();
        g.register_file_context(file_with_class("C.java", "p", "Old"));
        g.register_file_context(file_with_class("C.java", "p", "New"));
        assert!(g.find_by_qualified_name("p.Old").is_none());
        assert!(g.find_by_qualified_name("p.New").is_some());
        let files = g.read().file_count();
        assert_eq!(files, 1);
    }

    #[test]
    fn test_add_definition_never_overwrites() {
        let g = global();
        g.register_file_context(file_with_class("C.java", "p", "C"));
        let stand_in = DefinitionEntry::new(CodeElement::sugar(ElementKind::Class, "C", "p.C"), "p");
        assert!(!g.add_definition(stand_in));
        assert!(g.find_by_qualified_name("p.C").unwrap().element.is_from_source);

        let fresh = DefinitionEntry::new(CodeElement::sugar(ElementKind::Namespace, "q", "q"), "");
        assert!(g.add_definition(fresh));
    }

    #[test]
    fn test_find_members_sees_overloads() {
        let g = global();
        let fc = file_with_class("C.java", "p", "C");
        fc.add_definition_with_segment(CodeElement::new(ElementKind::Method, "run"), "C", "run()");
        fc.add_definition_with_segment(CodeElement::new(ElementKind::Method, "run"), "C", "run(int)");
        g.register_file_context(fc);

        let index = g.read();
        assert_eq!(index.find_members("p.C", "run").len(), 2);
        assert!(index.find_by_qualified_name("p.C.run(int)").is_some());
    }
}
