//! Hierarchy linker and noise filter tests.

use std::collections::BTreeSet;

use codelink::{DependencyType, FilterLevel, HierarchyLinker, Linker, PipelineConfig};
use rstest::rstest;

use crate::helpers::fixtures::*;
use crate::helpers::relation_assertions::*;

const TREE: &[(&str, &str)] = &[
    ("com/acme/core/Engine.java", "package com.acme.core; public class Engine { }"),
    ("com/acme/core/Part.java", "package com.acme.core; public class Part { }"),
    ("com/acme/app/Main.java", "package com.acme.app; class Main { }"),
    ("Loose.java", "class Loose { }"),
];

fn edge_set(files: &[(&str, &str)]) -> BTreeSet<(String, String)> {
    let (global, _) = register_all(files);
    let relations = HierarchyLinker::new().link_hierarchy(&global);
    assert_no_duplicate_edges(&relations);
    relations
        .iter()
        .map(|r| (r.source.qualified_name.clone(), r.target.qualified_name.clone()))
        .collect()
}

#[test]
fn test_linker_edges_independent_of_order() {
    let forward = edge_set(TREE);
    let mut reversed = TREE.to_vec();
    reversed.reverse();
    assert_eq!(forward, edge_set(&reversed));

    assert!(forward.contains(&("com".into(), "com.acme".into())));
    assert!(forward.contains(&("com.acme".into(), "com.acme.core".into())));
    assert!(forward.contains(&("com.acme".into(), "com.acme.app".into())));
    assert!(forward.contains(&("com.acme.core".into(), "com/acme/core/Engine.java".into())));
    assert!(forward.contains(&("com/acme/app/Main.java".into(), "com.acme.app.Main".into())));
    assert!(forward.contains(&("Loose.java".into(), "Loose".into())));
}

#[test]
fn test_namespace_node_per_segment() {
    let (global, _) = register_all(TREE);
    HierarchyLinker::new().link_hierarchy(&global);
    for qn in ["com", "com.acme", "com.acme.core", "com.acme.app"] {
        let entry = global.find_by_qualified_name(qn).unwrap_or_else(|| panic!("missing {qn}"));
        assert!(entry.element.is_from_sugar);
    }
}

#[test]
fn test_pipeline_links_once() {
    let output = analyze(PipelineConfig::default(), TREE);
    let contains: Vec<_> = output
        .relations
        .iter()
        .filter(|r| r.kind == DependencyType::Contain)
        .cloned()
        .collect();
    assert_no_duplicate_edges(&contains);
}

const CALLS_OUT: &[(&str, &str)] = &[(
    "p/Client.java",
    r#"package p;
import java.util.List;
class Client {
    List<String> items;
    void run() {
        items.clear();
    }
}
"#,
)];

#[rstest]
#[case(FilterLevel::Raw, true, true)]
#[case(FilterLevel::Balanced, false, true)]
#[case(FilterLevel::Pure, false, false)]
fn test_filter_levels(#[case] level: FilterLevel, #[case] keeps_call: bool, #[case] keeps_import: bool) {
    let output = analyze(PipelineConfig::default().with_filter_level(level), CALLS_OUT);
    let relations = &output.relations;

    let call = find_relation(relations, DependencyType::Call, "p.Client.run()", "java.util.List.clear");
    assert_eq!(call.is_some(), keeps_call, "call at {level}");
    if let Some(call) = call {
        assert!(call.target.is_from_external);
    }

    let import = find_relation(relations, DependencyType::Import, "p/Client.java", "java.util.List");
    assert_eq!(import.is_some(), keeps_import, "import at {level}");

    // Containment survives every level
    assert_relation(relations, DependencyType::Contain, "p/Client.java", "p.Client");
    assert_relation(relations, DependencyType::Contain, "p.Client", "p.Client.run()");
}
