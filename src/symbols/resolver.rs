//! The resolver seam.
//!
//! A [`SymbolResolver`] owns the naming rules of one language family: how QNs
//! are joined, which namespace nodes a package implies, and the ordered search
//! that maps a name used in a file to the definition it denotes. Methods take
//! `&SymbolIndex` so callers control locking.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use super::{DefinitionEntry, FileContext, SymbolIndex};
use crate::model::{CodeElement, ElementKind};

pub trait SymbolResolver: fmt::Debug + Send + Sync {
    /// Join a parent QN and a name. An empty or sentinel parent yields the bare name.
    fn build_qualified_name(&self, parent_qn: &str, name: &str) -> String;

    /// `(segment, QN)` for each namespace a package implies, outermost first.
    fn namespace_chain(&self, package: &str) -> Vec<(SmolStr, String)>;

    /// Make sure a namespace node exists for every segment of `package`.
    fn register_package(&self, index: &mut SymbolIndex, package: &str) {
        let mut parent = String::new();
        for (segment, qn) in self.namespace_chain(package) {
            let element = CodeElement::sugar(ElementKind::Namespace, segment.clone(), qn.clone());
            let mut entry = DefinitionEntry::new(element, parent.clone());
            entry.segment = segment;
            index.insert_if_absent(Arc::new(entry));
            parent = qn;
        }
    }

    /// Flat resolution: local names, imports, package, wildcards, literal QN.
    fn resolve(&self, index: &SymbolIndex, file: &FileContext, symbol: &str) -> Vec<Arc<DefinitionEntry>>;

    /// Flat resolution without the short-name lookup in `file`'s own definitions.
    ///
    /// Used for bare names that missed the scope walk, where a same-file match
    /// would be another scope's local or a member the walk already rejected.
    fn resolve_imported(&self, index: &SymbolIndex, file: &FileContext, symbol: &str) -> Vec<Arc<DefinitionEntry>> {
        self.resolve(index, file, symbol)
            .into_iter()
            .filter(|entry| entry.element.path != file.path())
            .collect()
    }

    /// Walk outward from `container_qn`, through inheritance where the container is a type.
    fn resolve_in_scope_hierarchy(
        &self,
        index: &SymbolIndex,
        file: &FileContext,
        container_qn: &str,
        symbol: &str,
        is_static: bool,
    ) -> Option<Arc<DefinitionEntry>>;

    /// Search only the supertypes of `type_qn`.
    fn resolve_in_ancestors(
        &self,
        index: &SymbolIndex,
        file: &FileContext,
        type_qn: &str,
        symbol: &str,
        is_static: bool,
    ) -> Option<Arc<DefinitionEntry>>;

    /// Stand-in for a name that did not resolve inside the tree.
    ///
    /// Uses the first import under the name when there is one, else the bare name.
    fn external_stand_in(&self, file: &FileContext, symbol: &str, kind: ElementKind) -> CodeElement {
        let qualified_name = file
            .imports_for_alias(symbol)
            .first()
            .map(|import| import.raw_path.clone())
            .unwrap_or_else(|| symbol.to_string());
        let name = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(symbol)
            .to_string();
        CodeElement::external(kind, name, qualified_name)
    }

    /// Resolve a name to an element, falling back to an external stand-in.
    fn resolve_element(
        &self,
        index: &SymbolIndex,
        file: &FileContext,
        symbol: &str,
        fallback_kind: ElementKind,
    ) -> Arc<CodeElement> {
        match self.resolve(index, file, symbol).first() {
            Some(entry) => entry.element.clone(),
            None => Arc::new(self.external_stand_in(file, symbol, fallback_kind)),
        }
    }
}

/// Drop a generic argument list: `Bar<Baz>` -> `Bar`.
pub fn strip_generics(name: &str) -> &str {
    match name.find('<') {
        Some(idx) => name[..idx].trim(),
        None => name.trim(),
    }
}
