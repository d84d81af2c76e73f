use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{Collector, Extractor};
use crate::error::{AnalysisError, Result};
use crate::filter::NoiseFilter;
use crate::link::Linker;
use crate::symbols::SymbolResolver;

/// Languages with a plug-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Language {
    #[default]
    Java,
}

impl Language {
    pub const ALL: &'static [Language] = &[Language::Java];

    pub fn tag(&self) -> &'static str {
        match self {
            Language::Java => "java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AnalysisError::UnsupportedLanguage(s.to_string()))
    }
}

/// Capability objects for one language.
#[derive(Clone)]
pub struct LanguageSupport {
    pub resolver: Arc<dyn SymbolResolver>,
    pub collector: Arc<dyn Collector>,
    pub linker: Arc<dyn Linker>,
    pub extractor: Arc<dyn Extractor>,
    pub noise_filter: Arc<dyn NoiseFilter>,
}

impl fmt::Debug for LanguageSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageSupport")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Language → capability bundle.
#[derive(Debug, Default)]
pub struct LanguageRegistry {
    languages: FxHashMap<Language, LanguageSupport>,
}

impl LanguageRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in plug-in.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Language::Java, super::java::support());
        registry
    }

    /// Add or replace the bundle for a language.
    pub fn register(&mut self, language: Language, support: LanguageSupport) {
        debug!("registering language support for {}", language);
        self.languages.insert(language, support);
    }

    pub fn get(&self, language: Language) -> Result<&LanguageSupport> {
        self.languages
            .get(&language)
            .ok_or_else(|| AnalysisError::MissingCapability {
                capability: "language support",
                language: language.to_string(),
            })
    }

    /// Look up a bundle by tag.
    pub fn get_by_tag(&self, tag: &str) -> Result<&LanguageSupport> {
        self.get(tag.parse()?)
    }
}
