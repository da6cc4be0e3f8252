//! Token model produced by the lexer.
//!
//! Layout markers (`Newline`, `Indent`, `Dedent`, `Semicolon`, `Eof`) are
//! synthetic tokens standing in for significant whitespace, so the parser
//! never has to reason about columns.

use std::fmt;
use std::sync::Arc;

use strum::{Display, EnumString, IntoStaticStr};

/// Reserved words of the language.
///
/// Uses strum derives so keyword recognition in the lexer is a `FromStr` call
/// and error messages can render the keyword back without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Keyword {
    Def,
    Class,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Return,
    Break,
    Continue,
    Pass,
    Try,
    Except,
    Finally,
    Raise,
    Import,
    From,
    As,
    Global,
    Nonlocal,
    Lambda,
    Assert,
    Match,
    Case,
    And,
    Or,
    Not,
    Is,
    #[strum(serialize = "True")]
    True,
    #[strum(serialize = "False")]
    False,
    #[strum(serialize = "None")]
    None,
}

/// One lexical token. Payload-bearing variants carry the literal text already
/// decoded (escapes processed, numbers parsed).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    // Literals and names
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// Raw f-string body; braces and format specs are parsed by the parser.
    FStr(Arc<str>),
    Ident(Arc<str>),
    Keyword(Keyword),

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,

    // Assignment operators
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    DoubleSlashAssign,
    PercentAssign,
    DoubleStarAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,

    // Layout markers
    Newline,
    Indent,
    Dedent,
    Semicolon,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) | Self::FStr(s) => write!(f, "{s:?}"),
            Self::Ident(name) => f.write_str(name),
            Self::Keyword(kw) => write!(f, "{kw}"),
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
            Self::Star => f.write_str("*"),
            Self::DoubleStar => f.write_str("**"),
            Self::Slash => f.write_str("/"),
            Self::DoubleSlash => f.write_str("//"),
            Self::Percent => f.write_str("%"),
            Self::Amp => f.write_str("&"),
            Self::Pipe => f.write_str("|"),
            Self::Caret => f.write_str("^"),
            Self::Tilde => f.write_str("~"),
            Self::Shl => f.write_str("<<"),
            Self::Shr => f.write_str(">>"),
            Self::Lt => f.write_str("<"),
            Self::Gt => f.write_str(">"),
            Self::Le => f.write_str("<="),
            Self::Ge => f.write_str(">="),
            Self::EqEq => f.write_str("=="),
            Self::NotEq => f.write_str("!="),
            Self::Assign => f.write_str("="),
            Self::PlusAssign => f.write_str("+="),
            Self::MinusAssign => f.write_str("-="),
            Self::StarAssign => f.write_str("*="),
            Self::SlashAssign => f.write_str("/="),
            Self::DoubleSlashAssign => f.write_str("//="),
            Self::PercentAssign => f.write_str("%="),
            Self::DoubleStarAssign => f.write_str("**="),
            Self::AmpAssign => f.write_str("&="),
            Self::PipeAssign => f.write_str("|="),
            Self::CaretAssign => f.write_str("^="),
            Self::ShlAssign => f.write_str("<<="),
            Self::ShrAssign => f.write_str(">>="),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::LBracket => f.write_str("["),
            Self::RBracket => f.write_str("]"),
            Self::LBrace => f.write_str("{"),
            Self::RBrace => f.write_str("}"),
            Self::Comma => f.write_str(","),
            Self::Colon => f.write_str(":"),
            Self::Dot => f.write_str("."),
            Self::Newline => f.write_str("newline"),
            Self::Indent => f.write_str("indent"),
            Self::Dedent => f.write_str("dedent"),
            Self::Semicolon => f.write_str(";"),
            Self::Eof => f.write_str("end of file"),
        }
    }
}

/// A token together with the 1-based source line it started on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, line: u32) -> Self {
        Self { kind, line }
    }
}
