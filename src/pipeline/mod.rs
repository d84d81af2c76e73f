//! Multi-phase analysis pipeline.
//!
//! ```text
//! Collect (parallel)  read + collect + register every file
//!        │ barrier
//! Link    (serial)    namespace/file containment edges
//!        │
//! Extract (parallel)  per-file relations, merged under one mutex
//!        │ barrier
//! Filter  (serial)    drop noise at the configured level
//! ```
//!
//! The first per-file error aborts the run; no partial output is returned.

mod config;
mod workers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

pub use config::PipelineConfig;
use workers::WorkerPool;

use crate::error::{AnalysisError, Result};
use crate::lang::{LanguageRegistry, LanguageSupport};
use crate::model::{CodeElement, DependencyRelation};
use crate::symbols::{FileContext, GlobalContext};

/// A file handed to the pipeline with its text already loaded.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path used as the file's identity in the output
    pub path: String,
    pub text: Arc<str>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Everything a run produces.
#[derive(Debug)]
pub struct AnalysisOutput {
    pub relations: Vec<DependencyRelation>,
    pub global: GlobalContext,
}

impl AnalysisOutput {
    /// Every definition in the symbol table, including synthesized nodes.
    pub fn elements(&self) -> Vec<Arc<CodeElement>> {
        self.global.elements()
    }
}

/// A configured pipeline for one language.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    support: LanguageSupport,
}

impl Pipeline {
    /// Validate the configuration and pick the language's capabilities.
    ///
    /// Fails before any file is touched when the language has no support.
    pub fn new(config: PipelineConfig, registry: &LanguageRegistry) -> Result<Self> {
        let config = config.validate()?;
        let support = registry.get(config.language)?.clone();
        debug!(
            "pipeline for {} with {} workers, filter {}",
            config.language, config.concurrency, config.filter_level
        );
        Ok(Self { config, support })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read and analyze files from disk.
    ///
    /// Output paths are relative to the configured root when one is set.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Result<AnalysisOutput> {
        let pool = WorkerPool::new(self.config.effective_concurrency())?;
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let sources = pool.run(&paths, |path| {
            let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
            Ok(SourceFile::new(self.display_path(path)?, text))
        })?;
        self.run_with_pool(&pool, sources)
    }

    /// Analyze files whose text is already in memory.
    pub fn run_sources(&self, sources: Vec<SourceFile>) -> Result<AnalysisOutput> {
        let pool = WorkerPool::new(self.config.effective_concurrency())?;
        self.run_with_pool(&pool, sources)
    }

    fn run_with_pool(&self, pool: &WorkerPool, sources: Vec<SourceFile>) -> Result<AnalysisOutput> {
        let global = GlobalContext::new(self.support.resolver.clone());
        info!("analyzing {} files with {} workers", sources.len(), pool.workers());

        // Phase 1: collect and register
        let files = pool.run(&sources, |source| {
            let file = self.support.collector.collect(&source.path, source.text.clone())?;
            debug!("collected {}", source.path);
            Ok(global.register_file_context(file))
        })?;
        info!("collect: {} files, {} definitions", files.len(), global.read().len());

        // Phase 2: hierarchy
        let mut relations = self.support.linker.link_hierarchy(&global);
        info!("link: {} containment edges", relations.len());

        // Phase 3: behavior
        let merged: Mutex<Vec<DependencyRelation>> = Mutex::new(Vec::new());
        pool.run(&files, |file: &Arc<FileContext>| {
            let mut extracted = self.support.extractor.extract(file, &global)?;
            self.relativize(&mut extracted);
            debug!("extracted {} relations from {}", extracted.len(), file.path());
            merged.lock().extend(extracted);
            Ok(())
        })?;
        let mut merged = merged.into_inner();
        merged.sort_by(|a, b| location_order(a).cmp(&location_order(b)));
        info!("extract: {} relations", merged.len());
        relations.extend(merged);

        // Phase 4: noise
        let relations = self
            .support
            .noise_filter
            .filter(relations, self.config.filter_level);
        info!("filter {}: {} relations", self.config.filter_level, relations.len());

        Ok(AnalysisOutput { relations, global })
    }

    /// The identity of a file on disk: relative to the root when under it.
    fn display_path(&self, path: &Path) -> Result<String> {
        let Some(root) = &self.config.root else {
            return Ok(path.to_string_lossy().into_owned());
        };
        let absolute = config::absolute(path)?;
        let shown = absolute.strip_prefix(root).unwrap_or(&absolute);
        Ok(shown.to_string_lossy().replace('\\', "/"))
    }

    fn relativize(&self, relations: &mut [DependencyRelation]) {
        let Some(root) = &self.config.root else {
            return;
        };
        for location in relations.iter_mut().filter_map(|r| r.location.as_mut()) {
            let path = Path::new(&location.path);
            if path.is_absolute() {
                if let Ok(relative) = path.strip_prefix(root) {
                    location.path = relative.to_string_lossy().replace('\\', "/");
                }
            }
        }
    }
}

/// Worker scheduling decides merge order; sort so runs are repeatable.
fn location_order(relation: &DependencyRelation) -> (&str, u32, u32) {
    match &relation.location {
        Some(l) => (l.path.as_str(), l.start_line, l.start_column),
        None => (relation.source.path.as_str(), 0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DependencyType;

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default().with_concurrency(2), &LanguageRegistry::with_builtin()).unwrap()
    }

    #[test]
    fn test_run_sources() {
        let output = pipeline()
            .run_sources(vec![
                SourceFile::new("p/A.java", "package p; class A { B b = new B(); }"),
                SourceFile::new("p/B.java", "package p; class B { }"),
            ])
            .unwrap();
        assert!(output.relations.iter().any(|r| r.kind == DependencyType::Create
            && r.source.qualified_name == "p.A"
            && r.target.qualified_name == "p.B"));
        assert!(output.relations.iter().any(|r| r.kind == DependencyType::Contain
            && r.source.qualified_name == "p"
            && r.target.qualified_name == "p/A.java"));
        assert!(output.elements().iter().any(|e| e.qualified_name == "p.B"));
    }

    #[test]
    fn test_missing_support_fails_early() {
        let err = Pipeline::new(PipelineConfig::default(), &LanguageRegistry::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCapability { .. }));
    }

    #[test]
    fn test_malformed_file_aborts() {
        let err = pipeline()
            .run_sources(vec![
                SourceFile::new("Ok.java", "class Ok { }"),
                SourceFile::new("Bad.java", "class Bad { void m() { "),
            ])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Collect { ref path, .. } if path == "Bad.java"));
    }
}
