//! Serialization of the model and configuration.

use codelink::{DependencyType, FilterLevel, PipelineConfig};

use crate::helpers::fixtures::*;

#[test]
fn test_relations_serialize() {
    let output = analyze(
        PipelineConfig::default(),
        &[("Base.java", BASE_WITH_FIELD), ("Derived.java", DERIVED_USES_FIELD)],
    );
    let relation = output
        .relations
        .iter()
        .find(|r| r.kind == DependencyType::Extend)
        .expect("extend relation");
    let json = serde_json::to_value(relation).unwrap();
    assert_eq!(json["kind"], "extend");
    assert_eq!(json["source"]["qualified_name"], "Derived");
    assert_eq!(json["target"]["kind"], "class");
}

#[test]
fn test_config_round_trip() {
    let config = PipelineConfig::default().with_filter_level(FilterLevel::Balanced);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"balanced\""));
    let back: PipelineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let partial: PipelineConfig = serde_json::from_str(r#"{"filter_level":"pure"}"#).unwrap();
    assert_eq!(partial.filter_level, FilterLevel::Pure);
    assert_eq!(partial.concurrency, PipelineConfig::default().concurrency);
}
