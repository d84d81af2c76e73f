//! Name resolution for Java-style dotted namespaces.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tracing::trace;

use super::builtins::builtin;
use crate::base::constants::{MOD_PROTECTED, MOD_PUBLIC, QN_SEPARATOR, ROOT_SENTINEL};
use crate::model::{CodeElement, ElementKind};
use crate::symbols::{DefinitionEntry, FileContext, SymbolIndex, SymbolResolver, strip_generics};

/// Resolver for languages with `.`-separated packages, imports and single
/// inheritance plus interfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaSymbolResolver;

impl JavaSymbolResolver {
    pub fn new() -> Self {
        Self
    }

    // ========================================================================
    // SCOPE WALK
    // ========================================================================

    fn scope_walk(
        &self,
        ctx: &Lookup<'_>,
        container_qn: &str,
        symbol: &str,
        is_static: bool,
        visited: &mut FxHashSet<String>,
    ) -> Option<Arc<DefinitionEntry>> {
        let mut current = container_qn.to_string();
        while !current.is_empty() {
            trace!("[SCOPE] looking for '{}' in '{}'", symbol, current);
            if let Some(hit) = self.member_hit(ctx, &current, symbol, is_static) {
                return Some(hit);
            }

            let Some(container) = ctx.index.find_by_qualified_name(&current) else {
                return None;
            };
            if container.kind().is_type() {
                if let Some(hit) = self.inheritance_walk(ctx, container, symbol, is_static, visited) {
                    return Some(hit);
                }
            }
            current = container.parent_qn.clone();
        }
        None
    }

    /// Depth-first search of supertypes: super class first, then interfaces.
    fn inheritance_walk(
        &self,
        ctx: &Lookup<'_>,
        type_entry: &Arc<DefinitionEntry>,
        symbol: &str,
        is_static: bool,
        visited: &mut FxHashSet<String>,
    ) -> Option<Arc<DefinitionEntry>> {
        if !visited.insert(type_entry.qualified_name().to_string()) {
            return None;
        }
        let declaring_file = ctx.declaring_file(&type_entry.element);

        for raw in type_entry.element.extra.ancestors() {
            let name = strip_generics(raw);
            let Some(ancestor) = self.resolve(ctx.index, declaring_file, name).into_iter().next() else {
                trace!("[SCOPE] ancestor '{}' of '{}' not in tree", name, type_entry.qualified_name());
                continue;
            };
            if visited.contains(ancestor.qualified_name()) {
                continue;
            }
            if let Some(hit) = self.member_hit(ctx, ancestor.qualified_name(), symbol, is_static) {
                return Some(hit);
            }
            if let Some(hit) = self.inheritance_walk(ctx, &ancestor, symbol, is_static, visited) {
                return Some(hit);
            }
        }
        None
    }

    /// `owner.symbol`, or a member of `owner` named `symbol` (overloads).
    fn member_hit(
        &self,
        ctx: &Lookup<'_>,
        owner_qn: &str,
        symbol: &str,
        is_static: bool,
    ) -> Option<Arc<DefinitionEntry>> {
        let candidate_qn = self.build_qualified_name(owner_qn, symbol);
        let candidates = match ctx.index.find_by_qualified_name(&candidate_qn) {
            Some(entry) => vec![entry.clone()],
            None => ctx.index.find_members(owner_qn, symbol),
        };

        candidates.into_iter().find(|entry| {
            if entry.kind() != ElementKind::Field {
                return true;
            }
            if is_static && !entry.element.is_static() {
                trace!("[SCOPE] skipping instance field '{}' in static context", entry.qualified_name());
                return false;
            }
            self.is_visible(ctx, entry)
        })
    }

    // ========================================================================
    // VISIBILITY
    // ========================================================================

    /// Public, same package, or protected from a subtype.
    fn is_visible(&self, ctx: &Lookup<'_>, target: &Arc<DefinitionEntry>) -> bool {
        let extra = &target.element.extra;
        if extra.has_modifier(MOD_PUBLIC) {
            return true;
        }
        let target_package = ctx
            .index
            .file_context(&target.element.path)
            .map(|fc| fc.package_name().to_string())
            .unwrap_or_else(|| self.enclosing_namespace(ctx.index, &target.parent_qn));
        if target_package == ctx.file.package_name() {
            return true;
        }
        if extra.has_modifier(MOD_PROTECTED) {
            let owner = self.owner_type(ctx.index, ctx.container_qn);
            return self.is_subtype_of(ctx, &owner, &target.parent_qn, &mut FxHashSet::default());
        }
        false
    }

    /// The nearest enclosing type of a scope.
    fn owner_type(&self, index: &SymbolIndex, scope_qn: &str) -> String {
        let mut current = scope_qn.to_string();
        while let Some(entry) = index.find_by_qualified_name(&current) {
            if entry.kind().is_type() {
                return current;
            }
            current = entry.parent_qn.clone();
        }
        String::new()
    }

    fn enclosing_namespace(&self, index: &SymbolIndex, scope_qn: &str) -> String {
        let mut current = scope_qn.to_string();
        while let Some(entry) = index.find_by_qualified_name(&current) {
            if entry.kind() == ElementKind::Namespace {
                return current;
            }
            current = entry.parent_qn.clone();
        }
        String::new()
    }

    fn is_subtype_of(&self, ctx: &Lookup<'_>, sub: &str, sup: &str, visited: &mut FxHashSet<String>) -> bool {
        if sub.is_empty() || sup.is_empty() {
            return false;
        }
        if sub == sup {
            return true;
        }
        if !visited.insert(sub.to_string()) {
            return false;
        }
        let Some(entry) = ctx.index.find_by_qualified_name(sub) else {
            return false;
        };
        let declaring_file = ctx.declaring_file(&entry.element);
        entry.element.extra.ancestors().any(|raw| {
            self.resolve(ctx.index, declaring_file, strip_generics(raw))
                .first()
                .is_some_and(|parent| self.is_subtype_of(ctx, parent.qualified_name(), sup, visited))
        })
    }
}

/// Everything a scope walk needs besides the symbol.
struct Lookup<'a> {
    index: &'a SymbolIndex,
    file: &'a FileContext,
    /// The scope the reference was made from
    container_qn: &'a str,
}

impl<'a> Lookup<'a> {
    /// The file that declares `element`, so its supertypes resolve against its own imports.
    fn declaring_file(&self, element: &CodeElement) -> &'a FileContext {
        self.index
            .file_context(&element.path)
            .map(|fc| fc.as_ref())
            .unwrap_or(self.file)
    }
}

impl SymbolResolver for JavaSymbolResolver {
    fn build_qualified_name(&self, parent_qn: &str, name: &str) -> String {
        if parent_qn.is_empty() || parent_qn == ROOT_SENTINEL {
            return name.to_string();
        }
        format!("{parent_qn}{QN_SEPARATOR}{name}")
    }

    fn namespace_chain(&self, package: &str) -> Vec<(SmolStr, String)> {
        let mut chain = Vec::new();
        let mut current = String::new();
        for segment in package.split(QN_SEPARATOR).filter(|s| !s.is_empty()) {
            current = self.build_qualified_name(&current, segment);
            chain.push((SmolStr::new(segment), current.clone()));
        }
        chain
    }

    fn resolve(&self, index: &SymbolIndex, file: &FileContext, symbol: &str) -> Vec<Arc<DefinitionEntry>> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Vec::new();
        }

        // 1. Definitions in this file
        let local = file.find_by_short_name(symbol);
        if !local.is_empty() {
            trace!("[RESOLVE] '{}' -> {} local definition(s)", symbol, local.len());
            return local;
        }
        self.resolve_imported(index, file, symbol)
    }

    fn resolve_imported(&self, index: &SymbolIndex, file: &FileContext, symbol: &str) -> Vec<Arc<DefinitionEntry>> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Vec::new();
        }

        // 2. Exact import alias; an alias pointing outside the tree ends the search
        let imports = file.imports_for_alias(symbol);
        if !imports.is_empty() {
            for import in &imports {
                if let Some(entry) = index.find_by_qualified_name(&import.raw_path) {
                    trace!("[RESOLVE] '{}' -> import {}", symbol, import.raw_path);
                    return vec![entry.clone()];
                }
                if import.is_static {
                    if let Some((owner, member)) = import.raw_path.rsplit_once(QN_SEPARATOR) {
                        let members = index.find_members(owner, member);
                        if !members.is_empty() {
                            return members;
                        }
                    }
                }
            }
            trace!("[RESOLVE] '{}' imported from outside the tree", symbol);
            return Vec::new();
        }

        // 3. Same package
        let package_qn = self.build_qualified_name(file.package_name(), symbol);
        if let Some(entry) = index.find_by_qualified_name(&package_qn) {
            return vec![entry.clone()];
        }

        // 4. Wildcard imports in registration order
        for import in file.wildcard_imports() {
            let candidate = self.build_qualified_name(import.prefix(), symbol);
            if let Some(entry) = index.find_by_qualified_name(&candidate) {
                trace!("[RESOLVE] '{}' -> wildcard {}", symbol, import.raw_path);
                return vec![entry.clone()];
            }
            // Static wildcard members carry an overload suffix
            let members = index.find_members(import.prefix(), symbol);
            if !members.is_empty() {
                trace!("[RESOLVE] '{}' -> {} member(s) of {}", symbol, members.len(), import.prefix());
                return members;
            }
        }

        // 5. Already qualified
        if let Some(entry) = index.find_by_qualified_name(symbol) {
            return vec![entry.clone()];
        }
        if let Some((owner, member)) = symbol.rsplit_once(QN_SEPARATOR) {
            let members = index.find_members(owner, member);
            if !members.is_empty() {
                return members;
            }
        }

        trace!("[RESOLVE] '{}' not found from {}", symbol, file.path());
        Vec::new()
    }

    fn resolve_in_scope_hierarchy(
        &self,
        index: &SymbolIndex,
        file: &FileContext,
        container_qn: &str,
        symbol: &str,
        is_static: bool,
    ) -> Option<Arc<DefinitionEntry>> {
        let ctx = Lookup {
            index,
            file,
            container_qn,
        };
        self.scope_walk(&ctx, container_qn, symbol.trim(), is_static, &mut FxHashSet::default())
    }

    fn resolve_in_ancestors(
        &self,
        index: &SymbolIndex,
        file: &FileContext,
        type_qn: &str,
        symbol: &str,
        is_static: bool,
    ) -> Option<Arc<DefinitionEntry>> {
        let ctx = Lookup {
            index,
            file,
            container_qn: type_qn,
        };
        let type_entry = index.find_by_qualified_name(type_qn)?;
        self.inheritance_walk(&ctx, type_entry, symbol.trim(), is_static, &mut FxHashSet::default())
    }

    fn external_stand_in(&self, file: &FileContext, symbol: &str, kind: ElementKind) -> CodeElement {
        if let Some(import) = file.imports_for_alias(symbol).first() {
            return CodeElement::external(kind, symbol, import.raw_path.clone());
        }
        if let Some((qn, builtin_kind)) = builtin(symbol) {
            return CodeElement::external(builtin_kind, symbol, qn);
        }
        let name = symbol.rsplit(QN_SEPARATOR).next().unwrap_or(symbol);
        CodeElement::external(kind, name, symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{GlobalContext, ImportEntry};

    fn global() -> GlobalContext {
        GlobalContext::new(Arc::new(JavaSymbolResolver::new()))
    }

    #[test]
    fn test_build_qualified_name() {
        let r = JavaSymbolResolver::new();
        assert_eq!(r.build_qualified_name("", "Foo"), "Foo");
        assert_eq!(r.build_qualified_name(".", "Foo"), "Foo");
        assert_eq!(r.build_qualified_name("a.b", "Foo"), "a.b.Foo");
    }

    #[test]
    fn test_namespace_chain() {
        let chain = JavaSymbolResolver::new().namespace_chain("a.b.c");
        let qns: Vec<_> = chain.iter().map(|(_, qn)| qn.as_str()).collect();
        assert_eq!(qns, vec!["a", "a.b", "a.b.c"]);
        assert!(JavaSymbolResolver::new().namespace_chain("").is_empty());
    }

    #[test]
    fn test_import_outside_tree_stops_search() {
        let g = global();
        let other = FileContext::new("p/List.java").with_package("p");
        other.add_definition(CodeElement::new(ElementKind::Class, "List"), "");
        g.register_file_context(other);

        let fc = FileContext::new("p/Main.java").with_package("p");
        fc.add_import("List", ImportEntry::single("java.util.List"));
        let fc = g.register_file_context(fc);

        // Same-package `p.List` exists, but the import shadows it.
        assert!(g.resolve_symbol(&fc, "List").is_empty());
    }

    #[test]
    fn test_static_import_finds_member() {
        let g = global();
        let util = FileContext::new("u/Util.java").with_package("u");
        util.add_definition(CodeElement::new(ElementKind::Class, "Util"), "");
        util.add_definition_with_segment(CodeElement::new(ElementKind::Method, "max"), "Util", "max(int,int)");
        g.register_file_context(util);

        let fc = FileContext::new("Main.java");
        fc.add_import("max", ImportEntry::single("u.Util.max").with_static(true));
        let fc = g.register_file_context(fc);

        let found = g.resolve_symbol(&fc, "max");
        assert_eq!(found[0].qualified_name(), "u.Util.max(int,int)");
    }

    #[test]
    fn test_static_wildcard_and_literal_find_overloaded_member() {
        let g = global();
        let util = FileContext::new("u/Util.java").with_package("u");
        util.add_definition(CodeElement::new(ElementKind::Class, "Util"), "");
        util.add_definition_with_segment(CodeElement::new(ElementKind::Method, "max"), "Util", "max(int,int)");
        util.add_definition_with_segment(CodeElement::new(ElementKind::Method, "max"), "Util", "max(long,long)");
        g.register_file_context(util);

        let fc = FileContext::new("Main.java");
        let import = ImportEntry::wildcard("u.Util.*").with_static(true);
        fc.add_import(import.alias.clone(), import);
        let fc = g.register_file_context(fc);

        let found: Vec<_> = g.resolve_symbol(&fc, "max").iter().map(|e| e.qualified_name().to_string()).collect();
        assert_eq!(found, vec!["u.Util.max(int,int)", "u.Util.max(long,long)"]);

        let literal = g.resolve_symbol(&fc, "u.Util.max");
        assert_eq!(literal.len(), 2);
        assert!(g.resolve_symbol(&fc, "u.Util.min").is_empty());
    }

    #[test]
    fn test_imported_lookup_skips_file_definitions() {
        let g = global();
        let fc = FileContext::new("A.java");
        fc.add_definition(CodeElement::new(ElementKind::Class, "A"), "");
        fc.add_definition_with_segment(CodeElement::new(ElementKind::Method, "a"), "A", "a()");
        fc.add_definition(CodeElement::new(ElementKind::Variable, "tmp"), "A.a()");
        let fc = g.register_file_context(fc);

        assert_eq!(g.resolve_symbol(&fc, "tmp").len(), 1);
        let index = g.read();
        assert!(JavaSymbolResolver::new().resolve_imported(&index, &fc, "tmp").is_empty());
        // Top-level types stay reachable through the package step
        assert_eq!(JavaSymbolResolver::new().resolve_imported(&index, &fc, "A").len(), 1);
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let g = global();
        let fc = FileContext::new("Cycle.java");
        fc.add_definition(CodeElement::new(ElementKind::Class, "A").with_super_class("B"), "");
        fc.add_definition(CodeElement::new(ElementKind::Class, "B").with_super_class("A"), "");
        let fc = g.register_file_context(fc);

        assert!(g.resolve_in_scope_hierarchy(&fc, "A", "missing", false).is_none());
    }

    #[test]
    fn test_builtin_stand_in() {
        let fc = FileContext::new("A.java");
        let el = JavaSymbolResolver::new().external_stand_in(&fc, "String", ElementKind::Unknown);
        assert_eq!(el.qualified_name, "java.lang.String");
        assert_eq!(el.kind, ElementKind::Class);
        assert!(el.is_from_external);

        let el = JavaSymbolResolver::new().external_stand_in(&fc, "Widget", ElementKind::Class);
        assert_eq!(el.qualified_name, "Widget");
    }
}
