//! Source fixtures and table builders.

use std::sync::Arc;

use codelink::lang::java::{JavaCollector, JavaSymbolResolver};
use codelink::{
    AnalysisOutput, Collector, FileContext, GlobalContext, LanguageRegistry, Pipeline, PipelineConfig, SourceFile,
};

pub const BASE_WITH_FIELD: &str = "class Base { int field; }";

pub const DERIVED_USES_FIELD: &str = r#"
class Derived extends Base {
    void touch() {
        int copy = field;
    }
}
"#;

/// Collect and register every `(path, source)` pair into a fresh table.
pub fn register_all(files: &[(&str, &str)]) -> (GlobalContext, Vec<Arc<FileContext>>) {
    let global = GlobalContext::new(Arc::new(JavaSymbolResolver::new()));
    let registered = files
        .iter()
        .map(|(path, source)| {
            let file = JavaCollector::new()
                .collect(path, Arc::from(*source))
                .unwrap_or_else(|e| panic!("collect {path}: {e}"));
            global.register_file_context(file)
        })
        .collect();
    (global, registered)
}

/// Run the whole pipeline over in-memory sources.
pub fn analyze(config: PipelineConfig, files: &[(&str, &str)]) -> AnalysisOutput {
    let pipeline = Pipeline::new(config, &LanguageRegistry::with_builtin()).expect("pipeline");
    let sources = files.iter().map(|(p, s)| SourceFile::new(*p, *s)).collect();
    pipeline.run_sources(sources).expect("analysis run")
}
