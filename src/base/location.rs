//! Source locations (1-based lines and columns).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A range in a source file.
///
/// Lines and columns are 1-based. Columns count bytes from the start of the line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    pub path: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Location {
    pub fn new(
        path: impl Into<String>,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            path: path.into(),
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Check whether `(line, column)` falls within this range (inclusive).
    pub fn contains(&self, line: u32, column: u32) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }
        if line == self.start_line && column < self.start_column {
            return false;
        }
        if line == self.end_line && column > self.end_column {
            return false;
        }
        true
    }

    /// Check whether `other` lies entirely inside this range.
    pub fn encloses(&self, other: &Location) -> bool {
        self.contains(other.start_line, other.start_column)
            && self.contains(other.end_line, other.end_column)
    }

    /// Number of lines spanned, used to pick the innermost of nested ranges.
    pub fn line_span(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line)
    }

    /// Whether the location starts at the given position.
    pub fn starts_at(&self, line: u32, column: u32) -> bool {
        self.start_line == line && self.start_column == column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_respects_columns_on_boundary_lines() {
        let loc = Location::new("A.java", 2, 5, 4, 1);
        assert!(loc.contains(2, 5));
        assert!(!loc.contains(2, 4));
        assert!(loc.contains(3, 100));
        assert!(loc.contains(4, 1));
        assert!(!loc.contains(4, 2));
        assert!(!loc.contains(5, 1));
    }

    #[test]
    fn test_encloses() {
        let outer = Location::new("A.java", 1, 1, 10, 2);
        let inner = Location::new("A.java", 3, 4, 5, 6);
        assert!(outer.encloses(&inner));
        assert!(!inner.encloses(&outer));
    }
}
