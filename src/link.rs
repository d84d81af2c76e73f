//! Structural containment edges.
//!
//! The [`HierarchyLinker`] runs once, after every file is registered and before
//! extraction. It makes sure each package segment has a namespace node, then
//! derives `Contain` edges:
//!
//! ```text
//! a ──▶ a.b ──▶ a.b.c ──▶ a/b/c/Foo.java ──▶ a.b.c.Foo
//!   (namespace chain)  (namespace → file)  (file → top-level definitions)
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::model::{CodeElement, DependencyRelation, DependencyType, ElementKind};
use crate::symbols::{DefinitionEntry, GlobalContext};

/// Derives containment edges from the registered symbol table.
pub trait Linker: Send + Sync {
    fn link_hierarchy(&self, global: &GlobalContext) -> Vec<DependencyRelation>;
}

/// Namespace chain, namespace → file and file → top-level definition edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyLinker;

type EdgeKey = (ElementKind, String, String);

impl HierarchyLinker {
    pub fn new() -> Self {
        Self
    }

    /// Synthesize namespace nodes a package implies; existing nodes are kept.
    fn ensure_namespaces(&self, global: &GlobalContext, package: &str) {
        let mut parent = String::new();
        for (segment, qn) in global.resolver().namespace_chain(package) {
            let element = CodeElement::sugar(ElementKind::Namespace, segment.clone(), qn.clone());
            let mut entry = DefinitionEntry::new(element, parent.clone());
            entry.segment = segment;
            if global.add_definition(entry) {
                trace!("[LINK] synthesized namespace {}", qn);
            }
            parent = qn;
        }
    }
}

impl Linker for HierarchyLinker {
    fn link_hierarchy(&self, global: &GlobalContext) -> Vec<DependencyRelation> {
        let files = global.read().file_contexts();
        for file in &files {
            self.ensure_namespaces(global, file.package_name());
        }

        let index = global.read();
        let resolver = global.resolver();
        let mut edges: IndexMap<EdgeKey, DependencyRelation> = IndexMap::new();
        let mut add = |source: &Arc<CodeElement>, target: &Arc<CodeElement>| {
            let key = (source.kind, source.qualified_name.clone(), target.qualified_name.clone());
            edges.entry(key).or_insert_with(|| {
                trace!("[LINK] {} contains {}", source.qualified_name, target.qualified_name);
                DependencyRelation::new(DependencyType::Contain, source.clone(), target.clone())
            });
        };

        for file in &files {
            let package = file.package_name();

            let chain = resolver.namespace_chain(package);
            let namespaces: Vec<_> = chain
                .iter()
                .filter_map(|(_, qn)| index.find_by_qualified_name(qn))
                .map(|entry| entry.element.clone())
                .collect();
            for pair in namespaces.windows(2) {
                add(&pair[0], &pair[1]);
            }

            let Some(file_element) = index.find_by_qualified_name(file.path()).map(|e| e.element.clone()) else {
                debug!("no file node for {}", file.path());
                continue;
            };
            if let Some(namespace) = namespaces.last() {
                add(namespace, &file_element);
            }

            for definition in file.definitions() {
                if definition.parent_qn.is_empty() || definition.parent_qn == package {
                    add(&file_element, &definition.element);
                }
            }
        }

        debug!("linked {} containment edges across {} files", edges.len(), files.len());
        edges.into_values().collect()
    }
}
