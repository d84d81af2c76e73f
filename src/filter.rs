//! Tiered noise filtering of the final relation set.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::model::{DependencyRelation, DependencyType};

/// How aggressively relations to external targets are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FilterLevel {
    /// Keep everything
    #[default]
    Raw,
    /// Drop external targets of reference-like relations
    Balanced,
    /// Drop every external target
    Pure,
}

impl FilterLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterLevel::Raw => "raw",
            FilterLevel::Balanced => "balanced",
            FilterLevel::Pure => "pure",
        }
    }
}

impl fmt::Display for FilterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterLevel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(FilterLevel::Raw),
            "balanced" => Ok(FilterLevel::Balanced),
            "pure" => Ok(FilterLevel::Pure),
            other => Err(AnalysisError::InvalidConfig(format!("unknown filter level `{other}`"))),
        }
    }
}

/// Decides which relations are noise at a given level.
pub trait NoiseFilter: Send + Sync {
    fn is_noise(&self, relation: &DependencyRelation, level: FilterLevel) -> bool;

    /// Keep the relations that are not noise, in order.
    fn filter(&self, relations: Vec<DependencyRelation>, level: FilterLevel) -> Vec<DependencyRelation> {
        if level == FilterLevel::Raw {
            return relations;
        }
        let before = relations.len();
        let kept: Vec<_> = relations
            .into_iter()
            .filter(|r| !self.is_noise(r, level))
            .collect();
        debug!("filter {}: kept {} of {} relations", level, kept.len(), before);
        kept
    }
}

/// Relation kinds whose external targets are dropped at [`FilterLevel::Balanced`].
const BALANCED_NOISE: &[DependencyType] = &[
    DependencyType::Extend,
    DependencyType::Implement,
    DependencyType::Annotation,
    DependencyType::Parameter,
    DependencyType::Return,
    DependencyType::TypeArg,
    DependencyType::Call,
    DependencyType::Create,
    DependencyType::Cast,
    DependencyType::Use,
    DependencyType::Assign,
];

/// Raw / Balanced / Pure filtering on the target's provenance.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredNoiseFilter;

impl TieredNoiseFilter {
    pub fn new() -> Self {
        Self
    }
}

impl NoiseFilter for TieredNoiseFilter {
    fn is_noise(&self, relation: &DependencyRelation, level: FilterLevel) -> bool {
        if relation.kind == DependencyType::Contain {
            return false;
        }
        let target = &relation.target;
        if target.is_from_source || target.is_from_sugar || !target.is_from_external {
            return false;
        }
        match level {
            FilterLevel::Raw => false,
            FilterLevel::Balanced => BALANCED_NOISE.contains(&relation.kind),
            FilterLevel::Pure => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::model::{CodeElement, ElementKind};

    fn relation(kind: DependencyType, external: bool) -> DependencyRelation {
        let source = Arc::new(CodeElement::new(ElementKind::Method, "m").with_qualified_name("A.m()"));
        let target = if external {
            CodeElement::external(ElementKind::Class, "List", "java.util.List")
        } else {
            CodeElement::new(ElementKind::Class, "B").with_qualified_name("B")
        };
        DependencyRelation::new(kind, source, Arc::new(target))
    }

    #[rstest]
    #[case(DependencyType::Call, true, FilterLevel::Raw, false)]
    #[case(DependencyType::Call, true, FilterLevel::Balanced, true)]
    #[case(DependencyType::Call, false, FilterLevel::Balanced, false)]
    #[case(DependencyType::Import, true, FilterLevel::Balanced, false)]
    #[case(DependencyType::Throw, true, FilterLevel::Balanced, false)]
    #[case(DependencyType::Import, true, FilterLevel::Pure, true)]
    #[case(DependencyType::Use, false, FilterLevel::Pure, false)]
    #[case(DependencyType::Contain, true, FilterLevel::Pure, false)]
    fn test_is_noise(
        #[case] kind: DependencyType,
        #[case] external: bool,
        #[case] level: FilterLevel,
        #[case] expected: bool,
    ) {
        assert_eq!(TieredNoiseFilter.is_noise(&relation(kind, external), level), expected);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("Balanced".parse::<FilterLevel>().unwrap(), FilterLevel::Balanced);
        assert_eq!(FilterLevel::default(), FilterLevel::Raw);
        assert!("loud".parse::<FilterLevel>().unwrap_err().is_config());
    }

    #[test]
    fn test_filter_keeps_order() {
        let relations = vec![
            relation(DependencyType::Use, false),
            relation(DependencyType::Call, true),
            relation(DependencyType::Create, false),
        ];
        let kept = TieredNoiseFilter.filter(relations, FilterLevel::Balanced);
        let kinds: Vec<_> = kept.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![DependencyType::Use, DependencyType::Create]);
    }
}
