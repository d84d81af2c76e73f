use std::path::{Path, PathBuf};

use tracing::debug;

use crate::base::constants::DEFAULT_CONCURRENCY;
use crate::error::{AnalysisError, Result};
use crate::filter::FilterLevel;
use crate::lang::Language;

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    pub language: Language,
    /// Worker threads for collect and extract; `0` means the default
    pub concurrency: usize,
    pub filter_level: FilterLevel,
    /// Paths in the output are made relative to this directory
    pub root: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            concurrency: DEFAULT_CONCURRENCY,
            filter_level: FilterLevel::default(),
            root: None,
        }
    }
}

impl PipelineConfig {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    /// Parse the language from its tag.
    pub fn for_tag(tag: &str) -> Result<Self> {
        Ok(Self::new(tag.parse()?))
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_filter_level(mut self, filter_level: FilterLevel) -> Self {
        self.filter_level = filter_level;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Worker count with `0` mapped to the default.
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency == 0 {
            DEFAULT_CONCURRENCY
        } else {
            self.concurrency
        }
    }

    /// Normalize and check the settings before a run.
    pub fn validate(mut self) -> Result<Self> {
        if self.concurrency == 0 {
            debug!("concurrency 0 normalized to {}", DEFAULT_CONCURRENCY);
            self.concurrency = DEFAULT_CONCURRENCY;
        }
        if let Some(root) = &self.root {
            if root.as_os_str().is_empty() {
                return Err(AnalysisError::InvalidConfig("scan root is empty".into()));
            }
            self.root = Some(absolute(root)?);
        }
        Ok(self)
    }
}

pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| AnalysisError::io(path, e))
}
