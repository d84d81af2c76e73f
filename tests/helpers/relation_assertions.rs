//! Relation assertion helpers.

use codelink::{DependencyRelation, DependencyType};

/// Find the first relation of `kind` from `source` to `target` (by QN).
pub fn find_relation<'a>(
    relations: &'a [DependencyRelation],
    kind: DependencyType,
    source: &str,
    target: &str,
) -> Option<&'a DependencyRelation> {
    relations
        .iter()
        .find(|r| r.kind == kind && r.source.qualified_name == source && r.target.qualified_name == target)
}

/// Assert a relation exists and return it.
pub fn assert_relation<'a>(
    relations: &'a [DependencyRelation],
    kind: DependencyType,
    source: &str,
    target: &str,
) -> &'a DependencyRelation {
    find_relation(relations, kind, source, target).unwrap_or_else(|| {
        let known: Vec<String> = relations.iter().map(|r| r.to_string()).collect();
        panic!(
            "Expected {} --{}--> {}, relations were:\n{}",
            source,
            kind,
            target,
            known.join("\n")
        )
    })
}

/// Assert no two relations share `(kind, source QN, target QN)`.
pub fn assert_no_duplicate_edges(relations: &[DependencyRelation]) {
    let mut seen = std::collections::HashSet::new();
    for relation in relations {
        if !seen.insert((relation.source.kind, relation.key())) {
            panic!("Duplicate edge found: {}", relation);
        }
    }
}
