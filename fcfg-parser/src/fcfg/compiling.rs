//! Grammar Compiler
//!
//!     Turns grammar text into a [`Grammar`]. The source is tokenized once with the
//!     logos lexer, split into statements on newlines and `;`, and every statement
//!     is parsed by a small recursive descent parser:
//!
//!         statement   := NAME ('[' template ']')? '->' alternative ('|' alternative)*
//!         alternative := conjunct+
//!         conjunct    := WORD ('[' template ']')? | STRING
//!         template    := value | key ':' value (',' key ':' value)*
//!         value       := STRING | WORD | '{' entries '}' | '<' values '>'
//!
//!     Words starting with an uppercase letter, or marked with `$`, are references to
//!     other rules; every other word (and any quoted string) is a terminal.
//!
//!     After all statements parsed, the static checks in [`checks`] run over the
//!     whole grammar. Any failure aborts compilation; no partial grammar escapes.

use crate::fcfg::error::{GrammarSyntaxError, SyntaxErrorKind};
use crate::fcfg::grammar::{Alternative, Conjunct, Grammar, RuleEntry};
use crate::fcfg::lexing::{tokenize, unquote, LexFailure, Lexeme, LineIndex, Token};
use crate::fcfg::template::{template_from_word, Template};

pub mod checks;

/// Compile grammar source text.
pub fn compile(source: &str) -> Result<Grammar, GrammarSyntaxError> {
    let index = LineIndex::new(source);
    let lexemes = tokenize(source).map_err(|failure| lex_error(source, &index, failure))?;

    let mut grammar = Grammar::new();
    for statement in lexemes.split(|lexeme| lexeme.token.is_terminator()) {
        if statement.is_empty() {
            continue;
        }
        let entry = StatementParser::new(statement, source, &index).parse()?;
        grammar.push(entry);
    }

    checks::check(&grammar)?;

    tracing::debug!(
        rules = grammar.len(),
        entries = grammar.entry_count(),
        "compiled grammar"
    );
    Ok(grammar)
}

fn lex_error(source: &str, index: &LineIndex, failure: LexFailure) -> GrammarSyntaxError {
    let (line, column) = index.position(source, failure.span.start);
    let kind = if failure.unterminated_string {
        SyntaxErrorKind::UnterminatedString
    } else {
        let c = source[failure.span.start..].chars().next().unwrap_or('\0');
        SyntaxErrorKind::InvalidCharacter(c)
    };
    GrammarSyntaxError::new(line, column, kind)
}

/// Recursive descent parser over the lexemes of a single statement
struct StatementParser<'a> {
    lexemes: &'a [Lexeme<'a>],
    pos: usize,
    source: &'a str,
    index: &'a LineIndex,
    end_offset: usize,
    rule: Option<&'a str>,
}

impl<'a> StatementParser<'a> {
    fn new(lexemes: &'a [Lexeme<'a>], source: &'a str, index: &'a LineIndex) -> Self {
        let end_offset = lexemes.last().map_or(source.len(), |l| l.span.end);
        let rule = lexemes
            .first()
            .filter(|l| l.token == Token::Word)
            .map(|l| l.text);
        Self {
            lexemes,
            pos: 0,
            source,
            index,
            end_offset,
            rule,
        }
    }

    fn parse(mut self) -> Result<RuleEntry, GrammarSyntaxError> {
        self.check_brackets()?;

        if !self.lexemes.iter().any(|l| l.token == Token::Arrow) {
            let start = self.lexemes.first().map_or(self.end_offset, |l| l.span.start);
            return Err(self.error_at(start, SyntaxErrorKind::MissingArrow));
        }

        let head = self.expect(Token::Word, "rule name")?;
        if !head.text.starts_with(|c: char| c.is_ascii_uppercase()) {
            return Err(self.error_at(
                head.span.start,
                SyntaxErrorKind::InvalidRuleName(head.text.to_string()),
            ));
        }
        let (line, _) = self.index.position(self.source, head.span.start);

        let template = if self.eat(Token::OpenBracket) {
            Some(self.parse_bracket_body()?)
        } else {
            None
        };

        self.expect(Token::Arrow, "'->'")?;

        let mut alternatives = vec![self.parse_alternative()?];
        while self.eat(Token::Pipe) {
            alternatives.push(self.parse_alternative()?);
        }
        if let Some(extra) = self.peek() {
            return Err(self.unexpected(extra, "'|' or end of line"));
        }

        let mut entry = RuleEntry::new(head.text, template, alternatives);
        entry.line = line;
        Ok(entry)
    }

    /// Report unclosed or unmatched brackets before anything else is parsed.
    fn check_brackets(&self) -> Result<(), GrammarSyntaxError> {
        let mut open: Vec<&Lexeme> = Vec::new();
        for lexeme in self.lexemes {
            match lexeme.token {
                t if t.is_opening() => open.push(lexeme),
                Token::CloseBracket | Token::CloseBrace | Token::CloseAngle => {
                    let matches = open
                        .pop()
                        .is_some_and(|o| o.token.closing() == Some(lexeme.token));
                    if !matches {
                        return Err(self.error_at(
                            lexeme.span.start,
                            SyntaxErrorKind::UnmatchedBracket(first_char(lexeme.text)),
                        ));
                    }
                }
                _ => {}
            }
        }
        match open.last() {
            Some(unclosed) => Err(self.error_at(
                unclosed.span.start,
                SyntaxErrorKind::UnclosedBracket(first_char(unclosed.text)),
            )),
            None => Ok(()),
        }
    }

    fn parse_alternative(&mut self) -> Result<Alternative, GrammarSyntaxError> {
        let start = self.current_offset();
        let mut conjuncts = Vec::new();

        while let Some(lexeme) = self.peek() {
            match lexeme.token {
                Token::Pipe => break,
                Token::Word => {
                    self.pos += 1;
                    conjuncts.push(self.parse_word_conjunct(lexeme)?);
                }
                Token::Str => {
                    self.pos += 1;
                    let text = unquote(lexeme.text);
                    if text.trim().is_empty() {
                        return Err(self.unexpected(lexeme, "terminal or rule reference"));
                    }
                    conjuncts.extend(text.split_whitespace().map(Conjunct::terminal));
                }
                _ => return Err(self.unexpected(lexeme, "terminal or rule reference")),
            }
        }

        if conjuncts.is_empty() {
            return Err(self.error_at(start, SyntaxErrorKind::EmptyAlternative));
        }
        Ok(Alternative::new(conjuncts))
    }

    fn parse_word_conjunct(&mut self, lexeme: &'a Lexeme<'a>) -> Result<Conjunct, GrammarSyntaxError> {
        let (name, is_reference) = match lexeme.text.strip_prefix('$') {
            Some(rest) => (rest, true),
            None => (
                lexeme.text,
                lexeme.text.starts_with(|c: char| c.is_ascii_uppercase()),
            ),
        };
        if name.is_empty() {
            return Err(self.unexpected(lexeme, "rule name after '$'"));
        }

        if !self.peek_is(Token::OpenBracket) {
            return Ok(if is_reference {
                Conjunct::reference(name, None)
            } else {
                Conjunct::terminal(name)
            });
        }

        if !is_reference {
            return Err(self.error_at(
                lexeme.span.start,
                SyntaxErrorKind::TerminalWithArgument(name.to_string()),
            ));
        }
        self.pos += 1;
        let pattern = self.parse_bracket_body()?;
        Ok(Conjunct::Reference {
            name: name.to_string(),
            pattern: Some(pattern),
        })
    }

    /// Parse the inside of `[...]`; the opening bracket is already consumed.
    fn parse_bracket_body(&mut self) -> Result<Template, GrammarSyntaxError> {
        if let Some(close) = self.peek().filter(|l| l.token == Token::CloseBracket) {
            return Err(self.unexpected(close, "template"));
        }

        let template = if self.starts_bare_dict() {
            Template::Dict(self.parse_dict_entries(Token::CloseBracket)?)
        } else {
            self.parse_value()?
        };

        self.expect(Token::CloseBracket, "']'")?;
        Ok(template)
    }

    /// `"key": value, ...` written directly inside the brackets
    fn starts_bare_dict(&self) -> bool {
        let key = self.lexemes.get(self.pos).map(|l| l.token);
        let colon = self.lexemes.get(self.pos + 1).map(|l| l.token);
        matches!(key, Some(Token::Word | Token::Str)) && colon == Some(Token::Colon)
    }

    fn parse_value(&mut self) -> Result<Template, GrammarSyntaxError> {
        let lexeme = self.next_or_end("template value")?;
        match lexeme.token {
            Token::Str => Ok(Template::string(unquote(lexeme.text))),
            Token::Word => Ok(template_from_word(lexeme.text)),
            Token::OpenBrace => {
                let entries = self.parse_dict_entries(Token::CloseBrace)?;
                self.expect(Token::CloseBrace, "'}'")?;
                Ok(Template::Dict(entries))
            }
            Token::OpenAngle => self.parse_list(lexeme),
            _ => Err(self.unexpected(lexeme, "template value")),
        }
    }

    /// Parse `key: value` pairs up to (not including) `close`.
    fn parse_dict_entries(&mut self, close: Token) -> Result<Vec<(String, Template)>, GrammarSyntaxError> {
        let mut entries = Vec::new();
        while !self.peek_is(close) {
            let key = self.next_or_end("dict key")?;
            let key = match key.token {
                Token::Str => unquote(key.text),
                Token::Word => key.text.to_string(),
                _ => return Err(self.unexpected(key, "dict key")),
            };
            self.expect(Token::Colon, "':'")?;
            let value = self.parse_value()?;
            entries.push((key, value));

            if !self.eat(Token::Comma) {
                break;
            }
        }
        Ok(entries)
    }

    /// Parse `<v1, v2, ...>`; the opening angle is already consumed.
    fn parse_list(&mut self, open: &Lexeme) -> Result<Template, GrammarSyntaxError> {
        let mut items: Vec<Template> = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        while !self.peek_is(Token::CloseAngle) {
            let item = self.parse_value()?;
            for variable in item.variables() {
                if seen.iter().any(|s| s == variable) {
                    return Err(self.error_at(
                        open.span.start,
                        SyntaxErrorKind::DuplicateListVariable(variable.to_string()),
                    ));
                }
                seen.push(variable.to_string());
            }
            items.push(item);

            if !self.eat(Token::Comma) {
                break;
            }
        }

        self.expect(Token::CloseAngle, "'>'")?;
        Ok(Template::List(items))
    }

    fn peek(&self) -> Option<&'a Lexeme<'a>> {
        self.lexemes.get(self.pos)
    }

    fn peek_is(&self, token: Token) -> bool {
        self.peek().is_some_and(|l| l.token == token)
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.peek_is(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next_or_end(&mut self, expected: &str) -> Result<&'a Lexeme<'a>, GrammarSyntaxError> {
        match self.lexemes.get(self.pos) {
            Some(lexeme) => {
                self.pos += 1;
                Ok(lexeme)
            }
            None => Err(self.error_at(
                self.end_offset,
                SyntaxErrorKind::UnexpectedToken {
                    expected: expected.to_string(),
                    found: "end of line".to_string(),
                },
            )),
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<&'a Lexeme<'a>, GrammarSyntaxError> {
        let lexeme = self.next_or_end(expected)?;
        if lexeme.token == token {
            Ok(lexeme)
        } else {
            Err(self.unexpected(lexeme, expected))
        }
    }

    fn current_offset(&self) -> usize {
        self.peek().map_or(self.end_offset, |l| l.span.start)
    }

    fn unexpected(&self, lexeme: &Lexeme, expected: &str) -> GrammarSyntaxError {
        let found = match lexeme.token {
            Token::Word => format!("word {:?}", lexeme.text),
            Token::Str => format!("string {}", lexeme.text),
            other => other.describe().to_string(),
        };
        self.error_at(
            lexeme.span.start,
            SyntaxErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found,
            },
        )
    }

    fn error_at(&self, offset: usize, kind: SyntaxErrorKind) -> GrammarSyntaxError {
        let (line, column) = self.index.position(self.source, offset);
        let error = GrammarSyntaxError::new(line, column, kind);
        match self.rule {
            Some(rule) => error.in_rule(rule),
            None => error,
        }
    }
}

fn first_char(text: &str) -> char {
    text.chars().next().unwrap_or('\0')
}
