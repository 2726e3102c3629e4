//! Lexer
//!
//! Tokenization of grammar source text is done through the logos lexer library.
//! Comments (`#` to end of line) and horizontal whitespace are skipped here, so
//! the compiler only ever sees structural tokens, words and string literals.
//!
//! Statements are line oriented: both `\n` and `;` terminate a rule statement and
//! are emitted as [`Token::Newline`] and [`Token::Semicolon`].
//!
//! Words
//!
//!     A word is any run of characters that are not whitespace or punctuation used
//!     by the grammar syntax. Hyphens are allowed between word characters
//!     (`pick-up`), which keeps `A->B` lexing as `A`, `->`, `B`.

use logos::Logos;
use std::ops::Range;

/// All possible tokens in grammar source text
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    #[token("->")]
    Arrow,

    #[token("|")]
    Pipe,

    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("<")]
    OpenAngle,
    #[token(">")]
    CloseAngle,

    #[token(":")]
    Colon,
    #[token(",")]
    Comma,

    #[token("\n")]
    Newline,
    #[token(";")]
    Semicolon,

    /// Double-quoted string literal, escapes allowed
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    #[regex(r#"[^\s\[\]{}<>|:,;#"\-]+(-[^\s\[\]{}<>|:,;#"\-]+)*"#)]
    Word,
}

impl Token {
    /// Check if this token ends a rule statement
    pub fn is_terminator(&self) -> bool {
        matches!(self, Token::Newline | Token::Semicolon)
    }

    /// Check if this token opens a nested structure
    pub fn is_opening(&self) -> bool {
        matches!(
            self,
            Token::OpenBracket | Token::OpenBrace | Token::OpenAngle
        )
    }

    /// The closing counterpart of an opening token
    pub fn closing(&self) -> Option<Token> {
        match self {
            Token::OpenBracket => Some(Token::CloseBracket),
            Token::OpenBrace => Some(Token::CloseBrace),
            Token::OpenAngle => Some(Token::CloseAngle),
            _ => None,
        }
    }

    /// Human readable description used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Token::Arrow => "'->'",
            Token::Pipe => "'|'",
            Token::OpenBracket => "'['",
            Token::CloseBracket => "']'",
            Token::OpenBrace => "'{'",
            Token::CloseBrace => "'}'",
            Token::OpenAngle => "'<'",
            Token::CloseAngle => "'>'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::Newline => "end of line",
            Token::Semicolon => "';'",
            Token::Str => "string literal",
            Token::Word => "word",
        }
    }
}

/// A token together with the source text it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<'src> {
    pub token: Token,
    pub text: &'src str,
    pub span: Range<usize>,
}

/// A span logos could not turn into a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexFailure {
    pub span: Range<usize>,
    pub unterminated_string: bool,
}

/// Tokenize grammar source text.
///
/// Returns every lexeme with its byte span, or the first span logos rejected.
pub fn tokenize(source: &str) -> Result<Vec<Lexeme<'_>>, LexFailure> {
    let mut lexer = Token::lexer(source);
    let mut lexemes = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => lexemes.push(Lexeme {
                token,
                text: lexer.slice(),
                span,
            }),
            Err(()) => {
                let unterminated_string = source[span.start..].starts_with('"');
                return Err(LexFailure {
                    span,
                    unterminated_string,
                });
            }
        }
    }

    Ok(lexemes)
}

/// Remove the quotes and resolve escapes of a [`Token::Str`] slice.
pub fn unquote(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Maps byte offsets to 1-based line and column numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    /// Line and column (both 1-based, column counted in chars) of a byte offset
    pub fn position(&self, source: &str, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let end = offset.min(source.len());
        let column = source.get(start..end).map_or(0, |s| s.chars().count()) + 1;
        (line + 1, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("source should tokenize")
            .into_iter()
            .map(|l| l.token)
            .collect()
    }

    #[test]
    fn test_rule_statement() {
        assert_eq!(
            tokens("T[X] -> A[X] | b"),
            vec![
                Token::Word,
                Token::OpenBracket,
                Token::Word,
                Token::CloseBracket,
                Token::Arrow,
                Token::Word,
                Token::OpenBracket,
                Token::Word,
                Token::CloseBracket,
                Token::Pipe,
                Token::Word,
            ]
        );
    }

    #[test]
    fn test_arrow_without_spaces() {
        let lexemes = tokenize("A->b").unwrap();
        let texts: Vec<&str> = lexemes.iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["A", "->", "b"]);
    }

    #[test]
    fn test_hyphenated_word() {
        let lexemes = tokenize("V[\"pick-up\"] -> pick-up").unwrap();
        assert_eq!(lexemes.last().unwrap().token, Token::Word);
        assert_eq!(lexemes.last().unwrap().text, "pick-up");
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokens("# a comment\nA -> b # trailing"),
            vec![Token::Newline, Token::Word, Token::Arrow, Token::Word]
        );
    }

    #[test]
    fn test_hash_inside_string_is_not_a_comment() {
        let lexemes = tokenize(r##"A["#1"] -> b"##).unwrap();
        assert_eq!(lexemes[2].token, Token::Str);
        assert_eq!(unquote(lexemes[2].text), "#1");
    }

    #[test]
    fn test_unterminated_string() {
        let failure = tokenize("A[\"oops] -> b").unwrap_err();
        assert!(failure.unterminated_string);
        assert_eq!(failure.span.start, 2);
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r#""say \"hi\"""#), "say \"hi\"");
    }

    #[test]
    fn test_line_index() {
        let source = "A -> b\nB -> c\n";
        let index = LineIndex::new(source);
        assert_eq!(index.position(source, 0), (1, 1));
        assert_eq!(index.position(source, 7), (2, 1));
        assert_eq!(index.position(source, 12), (2, 6));
    }
}
