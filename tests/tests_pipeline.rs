//! End-to-end pipeline tests.

use std::fs;

use codelink::{AnalysisError, DependencyType, LanguageRegistry, Pipeline, PipelineConfig, SourceFile};

use crate::helpers::fixtures::*;
use crate::helpers::relation_assertions::*;

#[test]
fn test_inherited_field_resolves_to_base() {
    let output = analyze(
        PipelineConfig::default(),
        &[("Base.java", BASE_WITH_FIELD), ("Derived.java", DERIVED_USES_FIELD)],
    );
    let relation = assert_relation(&output.relations, DependencyType::Use, "Derived.touch()", "Base.field");
    assert!(!relation.target.is_from_external);
    assert_eq!(relation.target.qualified_name, "Base.field");

    let location = relation.location.as_ref().expect("use has a location");
    assert_eq!(location.path, "Derived.java");
    assert_eq!((location.start_line, location.start_column), (4, 20));
    assert_eq!(location.end_column, 24);
}

#[test]
fn test_concurrency_does_not_change_output() {
    let files: Vec<(String, String)> = (0..24)
        .map(|i| {
            let next = (i + 1) % 24;
            (
                format!("p/C{i}.java"),
                format!("package p; class C{i} {{ C{next} next; void go() {{ next.go(); new C{next}(); }} }}"),
            )
        })
        .collect();
    let files: Vec<(&str, &str)> = files.iter().map(|(p, s)| (p.as_str(), s.as_str())).collect();

    let keys = |concurrency: usize| {
        let output = analyze(PipelineConfig::default().with_concurrency(concurrency), &files);
        let mut keys: Vec<String> = output.relations.iter().map(|r| r.to_string()).collect();
        keys.sort();
        keys
    };
    let serial = keys(1);
    assert_eq!(serial, keys(8));
    assert!(serial.contains(&"p.C3.go() --call--> p.C4.go()".to_string()));
    assert!(serial.contains(&"p.C3.go() --create--> p.C4".to_string()));
}

#[test]
fn test_malformed_file_fails_run() {
    let pipeline = Pipeline::new(PipelineConfig::default(), &LanguageRegistry::with_builtin()).unwrap();
    let err = pipeline
        .run_sources(vec![
            SourceFile::new("Good.java", BASE_WITH_FIELD),
            SourceFile::new("Broken.java", "class Broken { void m() { if (x) { }"),
        ])
        .unwrap_err();
    match err {
        AnalysisError::Collect { path, .. } => assert_eq!(path, "Broken.java"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_language_is_config_error() {
    let err = PipelineConfig::for_tag("klingon").unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_run_from_disk_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("shop");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("Item.java"), "package shop;\npublic class Item { public int price; }\n").unwrap();
    fs::write(
        pkg.join("Cart.java"),
        "package shop;\nclass Cart {\n  int total(Item item) {\n    return item.price;\n  }\n}\n",
    )
    .unwrap();

    let config = PipelineConfig::default().with_root(dir.path());
    let pipeline = Pipeline::new(config, &LanguageRegistry::with_builtin()).unwrap();
    let output = pipeline
        .run(&[pkg.join("Item.java"), pkg.join("Cart.java")])
        .unwrap();

    let relation = assert_relation(&output.relations, DependencyType::Use, "shop.Cart.total(Item)", "shop.Item.price");
    let location = relation.location.as_ref().unwrap();
    assert_eq!(location.path, "shop/Cart.java");
    assert_eq!(location.start_line, 4);
    assert_relation(&output.relations, DependencyType::Parameter, "shop.Cart.total(Item)", "shop.Item");
    assert_relation(&output.relations, DependencyType::Contain, "shop", "shop/Cart.java");

    let cart = output
        .elements()
        .into_iter()
        .find(|e| e.qualified_name == "shop.Cart")
        .expect("Cart element");
    assert_eq!(cart.path, "shop/Cart.java");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(PipelineConfig::default(), &LanguageRegistry::with_builtin()).unwrap();
    let err = pipeline.run(&[dir.path().join("Nope.java")]).unwrap_err();
    assert!(matches!(err, AnalysisError::Io { .. }));
}
