//! Indentation-sensitive lexer.
//!
//! Converts source text into a flat token stream. Indentation is tracked with
//! a stack of column positions starting at `[0]`; entering a deeper column
//! emits `Indent`, returning to a shallower one emits one `Dedent` per popped
//! level. While a bracket group is open, newlines and indentation changes are
//! absorbed so expressions can span physical lines. Blank lines and
//! comment-only lines emit nothing.

use std::sync::Arc;

use crate::exception::ParseError;
use crate::token::{Keyword, Token, TokenKind};

/// Tab stops expand to the next multiple of 8 columns when measuring
/// indentation, matching CPython's tokenizer default.
const TAB_SIZE: usize = 8;

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    indents: Vec<usize>,
    bracket_depth: usize,
    line_has_tokens: bool,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            indents: vec![0],
            bracket_depth: 0,
            line_has_tokens: false,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        self.handle_line_start()?;
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.pos += 1;
                }
                '\n' => {
                    self.pos += 1;
                    self.line += 1;
                    if self.bracket_depth == 0 {
                        if self.line_has_tokens {
                            self.tokens.push(Token::new(TokenKind::Newline, self.line - 1));
                            self.line_has_tokens = false;
                        }
                        self.handle_line_start()?;
                    }
                }
                '#' => self.skip_comment(),
                '\\' if self.peek_at(1) == Some('\n') => {
                    // Explicit line continuation: joins physical lines.
                    self.pos += 2;
                    self.line += 1;
                }
                '"' | '\'' => {
                    let s = self.read_string(c, false)?;
                    self.push(TokenKind::Str(s));
                }
                'f' | 'F' if matches!(self.peek_at(1), Some('"' | '\'')) => {
                    self.pos += 1;
                    let quote = self.peek().unwrap_or('"');
                    let s = self.read_string(quote, true)?;
                    self.push(TokenKind::FStr(s));
                }
                c if c.is_ascii_digit() => self.read_number()?,
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.read_number()?,
                c if c.is_alphabetic() || c == '_' => self.read_name(),
                _ => self.read_operator(c)?,
            }
        }
        if self.line_has_tokens {
            self.tokens.push(Token::new(TokenKind::Newline, self.line));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, self.line));
        }
        self.tokens.push(Token::new(TokenKind::Eof, self.line));
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind) {
        self.line_has_tokens = true;
        self.tokens.push(Token::new(kind, self.line));
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.line)
    }

    /// Measures the indentation of the next non-blank, non-comment line and
    /// emits `Indent`/`Dedent` markers against the indent stack.
    fn handle_line_start(&mut self) -> Result<(), ParseError> {
        self.line_has_tokens = false;
        loop {
            let mut column = 0;
            loop {
                match self.peek() {
                    Some(' ') => {
                        column += 1;
                        self.pos += 1;
                    }
                    Some('\t') => {
                        column = (column / TAB_SIZE + 1) * TAB_SIZE;
                        self.pos += 1;
                    }
                    Some('\r') => {
                        self.pos += 1;
                    }
                    _ => break,
                }
            }
            match self.peek() {
                // Blank line: no layout effect.
                Some('\n') => {
                    self.pos += 1;
                    self.line += 1;
                }
                // Comment-only line: skip and retry on the next line.
                Some('#') => {
                    self.skip_comment();
                    if self.peek() == Some('\n') {
                        self.pos += 1;
                        self.line += 1;
                    }
                }
                None => return Ok(()),
                Some(_) => {
                    let top = *self.indents.last().unwrap_or(&0);
                    if column > top {
                        self.indents.push(column);
                        self.tokens.push(Token::new(TokenKind::Indent, self.line));
                    } else if column < top {
                        while *self.indents.last().unwrap_or(&0) > column {
                            self.indents.pop();
                            self.tokens.push(Token::new(TokenKind::Dedent, self.line));
                        }
                        if *self.indents.last().unwrap_or(&0) != column {
                            return Err(self.error("unindent does not match any outer indentation level"));
                        }
                    }
                    return Ok(());
                }
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn read_name(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        match name.parse::<Keyword>() {
            Ok(kw) => self.push(TokenKind::Keyword(kw)),
            Err(_) => self.push(TokenKind::Ident(Arc::from(name.as_str()))),
        }
    }

    fn read_number(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => self.pos += 1,
                '.' if !is_float && self.peek_at(1) != Some('.') => {
                    // A digit run followed by `.` is a float unless the dot
                    // starts an attribute access on an integer literal.
                    if self.peek_at(1).is_some_and(|d| d.is_alphabetic() || d == '_') {
                        break;
                    }
                    is_float = true;
                    self.pos += 1;
                }
                'e' | 'E' => {
                    let mut ahead = 1;
                    if matches!(self.peek_at(1), Some('+' | '-')) {
                        ahead = 2;
                    }
                    if self.peek_at(ahead).is_some_and(|d| d.is_ascii_digit()) {
                        is_float = true;
                        self.pos += ahead + 1;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if is_float {
            let value: f64 = text.parse().map_err(|_| self.error(format!("invalid float literal: {text}")))?;
            self.push(TokenKind::Float(value));
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| self.error(format!("invalid integer literal: {text}")))?;
            self.push(TokenKind::Int(value));
        }
        Ok(())
    }

    /// Reads a string literal starting at the opening quote.
    ///
    /// Handles both single-quoted and triple-quoted forms. When `keep_braces`
    /// is set (f-strings) backslash escapes are decoded but `{`/`}` pass
    /// through untouched for the parser to interpret.
    fn read_string(&mut self, quote: char, keep_braces: bool) -> Result<Arc<str>, ParseError> {
        let _ = keep_braces;
        self.pos += 1;
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated string literal"));
            };
            match c {
                '\\' => {
                    self.pos += 1;
                    let Some(esc) = self.peek() else {
                        return Err(self.error("unterminated string literal"));
                    };
                    self.pos += 1;
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' => out.push('\\'),
                        '\'' => out.push('\''),
                        '"' => out.push('"'),
                        '\n' => self.line += 1,
                        'x' => {
                            let hi = self.peek();
                            let lo = self.peek_at(1);
                            let (Some(hi), Some(lo)) = (hi, lo) else {
                                return Err(self.error("truncated \\x escape"));
                            };
                            let code = u32::from_str_radix(&format!("{hi}{lo}"), 16)
                                .map_err(|_| self.error("invalid \\x escape"))?;
                            self.pos += 2;
                            out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                        }
                        other => {
                            // Unknown escapes keep the backslash, as Python does.
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                '\n' => {
                    if !triple {
                        return Err(self.error("unterminated string literal"));
                    }
                    out.push('\n');
                    self.pos += 1;
                    self.line += 1;
                }
                c if c == quote => {
                    if triple {
                        if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                            self.pos += 3;
                            break;
                        }
                        out.push(c);
                        self.pos += 1;
                    } else {
                        self.pos += 1;
                        break;
                    }
                }
                c => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(Arc::from(out.as_str()))
    }

    fn read_operator(&mut self, c: char) -> Result<(), ParseError> {
        let two = self.peek_at(1);
        let three = self.peek_at(2);
        let (kind, len) = match (c, two, three) {
            ('*', Some('*'), Some('=')) => (TokenKind::DoubleStarAssign, 3),
            ('/', Some('/'), Some('=')) => (TokenKind::DoubleSlashAssign, 3),
            ('<', Some('<'), Some('=')) => (TokenKind::ShlAssign, 3),
            ('>', Some('>'), Some('=')) => (TokenKind::ShrAssign, 3),
            ('*', Some('*'), _) => (TokenKind::DoubleStar, 2),
            ('/', Some('/'), _) => (TokenKind::DoubleSlash, 2),
            ('<', Some('<'), _) => (TokenKind::Shl, 2),
            ('>', Some('>'), _) => (TokenKind::Shr, 2),
            ('<', Some('='), _) => (TokenKind::Le, 2),
            ('>', Some('='), _) => (TokenKind::Ge, 2),
            ('=', Some('='), _) => (TokenKind::EqEq, 2),
            ('!', Some('='), _) => (TokenKind::NotEq, 2),
            ('+', Some('='), _) => (TokenKind::PlusAssign, 2),
            ('-', Some('='), _) => (TokenKind::MinusAssign, 2),
            ('*', Some('='), _) => (TokenKind::StarAssign, 2),
            ('/', Some('='), _) => (TokenKind::SlashAssign, 2),
            ('%', Some('='), _) => (TokenKind::PercentAssign, 2),
            ('&', Some('='), _) => (TokenKind::AmpAssign, 2),
            ('|', Some('='), _) => (TokenKind::PipeAssign, 2),
            ('^', Some('='), _) => (TokenKind::CaretAssign, 2),
            ('+', _, _) => (TokenKind::Plus, 1),
            ('-', _, _) => (TokenKind::Minus, 1),
            ('*', _, _) => (TokenKind::Star, 1),
            ('/', _, _) => (TokenKind::Slash, 1),
            ('%', _, _) => (TokenKind::Percent, 1),
            ('&', _, _) => (TokenKind::Amp, 1),
            ('|', _, _) => (TokenKind::Pipe, 1),
            ('^', _, _) => (TokenKind::Caret, 1),
            ('~', _, _) => (TokenKind::Tilde, 1),
            ('<', _, _) => (TokenKind::Lt, 1),
            ('>', _, _) => (TokenKind::Gt, 1),
            ('=', _, _) => (TokenKind::Assign, 1),
            ('(', _, _) => (TokenKind::LParen, 1),
            (')', _, _) => (TokenKind::RParen, 1),
            ('[', _, _) => (TokenKind::LBracket, 1),
            (']', _, _) => (TokenKind::RBracket, 1),
            ('{', _, _) => (TokenKind::LBrace, 1),
            ('}', _, _) => (TokenKind::RBrace, 1),
            (',', _, _) => (TokenKind::Comma, 1),
            (':', _, _) => (TokenKind::Colon, 1),
            ('.', _, _) => (TokenKind::Dot, 1),
            (';', _, _) => (TokenKind::Semicolon, 1),
            _ => return Err(self.error(format!("unexpected character: {c:?}"))),
        };
        match kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => self.bracket_depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
            }
            _ => {}
        }
        self.pos += len;
        self.push(kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn layout_markers_balance() {
        let tokens = kinds("if x:\n    y = 1\n    z = 2\nw = 3\n");
        let indents = tokens.iter().filter(|t| **t == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| **t == TokenKind::Dedent).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn nested_blocks_dedent_to_zero() {
        let tokens = kinds("def f():\n    if x:\n        a = 1\n");
        let indents = tokens.iter().filter(|t| **t == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| **t == TokenKind::Dedent).count();
        assert_eq!(indents, dedents);
    }

    #[test]
    fn brackets_absorb_newlines() {
        let tokens = kinds("x = [\n    1,\n    2,\n]\n");
        assert!(!tokens.contains(&TokenKind::Indent));
        assert_eq!(tokens.iter().filter(|t| **t == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn blank_and_comment_lines_emit_nothing() {
        let tokens = kinds("a = 1\n\n# comment\n   # indented comment\nb = 2\n");
        assert!(!tokens.contains(&TokenKind::Indent));
        assert!(!tokens.contains(&TokenKind::Dedent));
    }

    #[test]
    fn fstring_keeps_raw_body() {
        let tokens = kinds("f\"{x:2d} ok\"\n");
        assert!(matches!(&tokens[0], TokenKind::FStr(s) if s.as_ref() == "{x:2d} ok"));
    }

    #[test]
    fn float_and_int_literals() {
        let tokens = kinds("1 2.5 1e3 7\n");
        assert_eq!(tokens[0], TokenKind::Int(1));
        assert_eq!(tokens[1], TokenKind::Float(2.5));
        assert_eq!(tokens[2], TokenKind::Float(1000.0));
        assert_eq!(tokens[3], TokenKind::Int(7));
    }

    #[test]
    fn unterminated_string_reports_line() {
        let err = tokenize("x = 1\ny = 'oops\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn bad_indent_is_an_error() {
        let err = tokenize("if x:\n        a = 1\n    b = 2\n").unwrap_err();
        assert!(err.message.contains("unindent"));
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = kinds("def foo(): return None\n");
        assert_eq!(tokens[0], TokenKind::Keyword(Keyword::Def));
        assert!(matches!(&tokens[1], TokenKind::Ident(n) if n.as_ref() == "foo"));
    }
}
