//! Logos-based lexer for Java.
//!
//! Comments are kept as tokens so Javadoc can be attached to declarations;
//! whitespace is dropped. `>>` is never produced as one token so nested
//! generic argument lists close one level per `>`.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind, text and byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub range: TextRange,
}

impl Token<'_> {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// An identifier with exactly this text (keywords lex as identifiers).
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?[lLfFdD]?")]
    #[regex(r"0[xX][0-9a-fA-F_]+[lL]?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[token("\"\"\"", text_block)]
    String,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    Char,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("...")]
    Ellipsis,

    #[token("::")]
    ColonColon,

    #[token("->")]
    Arrow,

    #[token("==")]
    EqEq,

    #[token("!=")]
    BangEq,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    #[token("&&")]
    AmpAmp,

    #[token("||")]
    PipePipe,

    #[token("++")]
    PlusPlus,

    #[token("--")]
    MinusMinus,

    /// `+=`, `-=`, `*=`, `/=` and friends
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token(">>>=")]
    CompoundAssign,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
    #[token("=")]
    Eq,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,

    /// Remaining operators: `+ - * / % ! ~ & | ^`
    #[regex(r"[+\-*/%!~&|^]")]
    Operator,

    /// Characters that never appear in valid Java outside literals
    #[regex(r"[#`\\]")]
    Error,
}

/// Consume up to and including the closing `*/`; unterminated comments are errors.
fn block_comment(lex: &mut logos::Lexer<'_, TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Consume a text block body up to the closing `"""`, honoring `\` escapes.
fn text_block(lex: &mut logos::Lexer<'_, TokenKind>) -> bool {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' if rest[i..].starts_with("\"\"\"") => {
                lex.bump(i + 3);
                return true;
            }
            _ => i += 1,
        }
    }
    lex.bump(rest.len());
    false
}

/// Tokenize a whole source text, dropping nothing but whitespace.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        tokens.push(Token {
            kind: result.unwrap_or(TokenKind::Error),
            text: lexer.slice(),
            range: TextRange::new(TextSize::new(span.start as u32), TextSize::new(span.end as u32)),
        });
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_declaration() {
        use TokenKind::*;
        assert_eq!(
            kinds("public class Foo extends Bar<Baz> {}"),
            vec![Ident, Ident, Ident, Ident, Ident, Lt, Ident, Gt, LBrace, RBrace]
        );
    }

    #[test]
    fn test_nested_generics_close_one_level_at_a_time() {
        use TokenKind::*;
        assert_eq!(
            kinds("Map<K, List<V>> m;"),
            vec![Ident, Lt, Ident, Comma, Ident, Lt, Ident, Gt, Gt, Ident, Semicolon]
        );
    }

    #[test]
    fn test_comments_and_literals() {
        let tokens = tokenize("/** doc */ int x = 0x1F; // tail\nString s = \"a\\\"b\";");
        assert_eq!(tokens[0].kind, TokenKind::BlockComment);
        assert_eq!(tokens[0].text, "/** doc */");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Number && t.text == "0x1F"));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::LineComment));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::String && t.text == "\"a\\\"b\""));
    }

    #[test]
    fn test_block_comments() {
        use TokenKind::*;
        assert_eq!(kinds("/** a * b **/ int x;"), vec![BlockComment, Ident, Ident, Semicolon]);
        assert_eq!(kinds("a /* x */ / b"), vec![Ident, BlockComment, Operator, Ident]);
        assert_eq!(kinds("/* open"), vec![Error]);
    }

    #[test]
    fn test_text_block() {
        let tokens = tokenize("s = \"\"\"\n  say \"hi\" \\\"\"\"\n  \"\"\"; t");
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert!(tokens[2].text.ends_with("\"\"\""));
        assert_eq!(tokens[3].kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_assignment_operators() {
        use TokenKind::*;
        assert_eq!(kinds("a = b == c"), vec![Ident, Eq, Ident, EqEq, Ident]);
        assert_eq!(kinds("a += 1; a++"), vec![Ident, CompoundAssign, Number, Semicolon, Ident, PlusPlus]);
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("a  bc");
        assert_eq!(tokens[1].range, TextRange::new(TextSize::new(3), TextSize::new(5)));
    }
}
