//! Byte offset to line/column conversion.

use text_size::TextSize;

/// A zero-based line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    /// Convert to the 1-based convention used by [`Location`](super::Location).
    pub fn one_based(self) -> (u32, u32) {
        (self.line + 1, self.col + 1)
    }
}

/// Maps byte offsets in a text to line/column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Offset of the first byte of each line.
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::new(offset as u32 + 1));
            }
        }
        Self { line_starts }
    }

    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let col = offset - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_across_lines() {
        let index = LineIndex::new("ab\ncd\n\nx");
        assert_eq!(index.line_col(TextSize::new(0)), LineCol { line: 0, col: 0 });
        assert_eq!(index.line_col(TextSize::new(1)), LineCol { line: 0, col: 1 });
        assert_eq!(index.line_col(TextSize::new(3)), LineCol { line: 1, col: 0 });
        assert_eq!(index.line_col(TextSize::new(7)), LineCol { line: 3, col: 0 });
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_one_based() {
        assert_eq!(LineCol { line: 0, col: 4 }.one_based(), (1, 5));
    }
}
