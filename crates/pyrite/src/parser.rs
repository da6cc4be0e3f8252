//! Recursive-descent parser with a Pratt precedence table.
//!
//! Parses the token stream into [`Stmt`]/[`Expr`] trees. Precedence, low to
//! high: conditional (`x if c else y`), `or`, `|`, `^`, `&`, `and`,
//! equality-level (`==`, `!=`, `in`, `not in`, `is`, `is not`), ordering,
//! shifts, additive, multiplicative, power (right-associative), unary
//! prefix, then call/index/attribute. Chained comparisons desugar to
//! `and`-joined pairs. On a mismatch the parser records the error and skips
//! to the next statement boundary, so several syntax errors are reported in
//! one pass.

use std::sync::Arc;

use crate::ast::{
    BinOp, BoolOpKind, CallArg, CompClause, Comprehension, ExceptHandler, Expr, ExprKind, FStringPart, FunctionDef,
    ImportItem, LambdaDef, MatchCase, Param, PrefixOp, Stmt,
};
use crate::exception::ParseError;
use crate::fstring::{split_fstring, FormatSpec, RawPart};
use crate::lexer::tokenize;
use crate::token::{Keyword, Token, TokenKind};

/// Maximum expression nesting before the parser refuses, preventing stack
/// overflow on pathological input like `((((((x))))))`.
const MAX_NESTING_DEPTH: u32 = 200;

/// Parses a complete source text into statements, or all the syntax errors
/// found.
pub(crate) fn parse(source: &str) -> Result<Vec<Stmt>, Vec<ParseError>> {
    let tokens = tokenize(source).map_err(|e| vec![e])?;
    Parser::new(tokens).parse_program()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Lowest,
    Conditional,
    Or,
    BitOr,
    BitXor,
    BitAnd,
    And,
    Equality,
    Ordering,
    Shift,
    Additive,
    Multiplicative,
    Power,
    Prefix,
    Call,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    depth: u32,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            depth: 0,
        }
    }

    fn parse_program(mut self) -> Result<Vec<Stmt>, Vec<ParseError>> {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            if self.at(&TokenKind::Eof) {
                break;
            }
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        if self.errors.is_empty() { Ok(stmts) } else { Err(self.errors) }
    }

    // -- token plumbing -----------------------------------------------------

    fn peek(&self) -> &TokenKind {
        self.tokens.get(self.pos).map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens.get(self.pos + offset).map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn line(&self) -> u32 {
        self.tokens.get(self.pos).map_or(0, |t| t.line)
    }

    fn prev_line(&self) -> u32 {
        if self.pos == 0 {
            return 0;
        }
        self.tokens.get(self.pos - 1).map_or(0, |t| t.line)
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek(), TokenKind::Keyword(k) if *k == kw)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{kind}', found '{}'", self.peek())))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{kw}', found '{}'", self.peek())))
        }
    }

    fn expect_ident(&mut self) -> Result<Arc<str>, ParseError> {
        match self.peek() {
            TokenKind::Ident(name) => {
                let name = Arc::clone(name);
                self.pos += 1;
                Ok(name)
            }
            other => Err(self.error(format!("expected identifier, found '{other}'"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.line())
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), TokenKind::Newline | TokenKind::Semicolon) {
            self.pos += 1;
        }
    }

    /// Skips forward to the next statement boundary after an error.
    fn synchronize(&mut self) {
        loop {
            match self.peek() {
                TokenKind::Eof => return,
                TokenKind::Newline | TokenKind::Semicolon | TokenKind::Dedent => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Dedent | TokenKind::Eof
        )
    }

    fn end_simple_statement(&mut self) -> Result<(), ParseError> {
        if self.at_statement_end() {
            Ok(())
        } else {
            Err(self.error(format!("unexpected '{}' after statement", self.peek())))
        }
    }

    // -- statements ---------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        match self.peek() {
            TokenKind::Keyword(Keyword::Def) => self.parse_function_def(),
            TokenKind::Keyword(Keyword::Class) => self.parse_class_def(),
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::Try) => self.parse_try(),
            TokenKind::Keyword(Keyword::Match) => self.parse_match(),
            TokenKind::Keyword(Keyword::Return) => {
                self.pos += 1;
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_tuple_expr()?)
                };
                self.end_simple_statement()?;
                Ok(Stmt::Return { value, line })
            }
            TokenKind::Keyword(Keyword::Raise) => {
                self.pos += 1;
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expr(Prec::Lowest)?)
                };
                self.end_simple_statement()?;
                Ok(Stmt::Raise { value, line })
            }
            TokenKind::Keyword(Keyword::Break) => {
                self.pos += 1;
                self.end_simple_statement()?;
                Ok(Stmt::Break { line })
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.pos += 1;
                self.end_simple_statement()?;
                Ok(Stmt::Continue { line })
            }
            TokenKind::Keyword(Keyword::Pass) => {
                self.pos += 1;
                self.end_simple_statement()?;
                Ok(Stmt::Pass { line })
            }
            TokenKind::Keyword(Keyword::Import) => self.parse_import(),
            TokenKind::Keyword(Keyword::From) => self.parse_from_import(),
            TokenKind::Keyword(Keyword::Global) => {
                self.pos += 1;
                let names = self.parse_name_list()?;
                self.end_simple_statement()?;
                Ok(Stmt::Global { names, line })
            }
            TokenKind::Keyword(Keyword::Nonlocal) => {
                self.pos += 1;
                let names = self.parse_name_list()?;
                self.end_simple_statement()?;
                Ok(Stmt::Nonlocal { names, line })
            }
            TokenKind::Keyword(Keyword::Assert) => {
                self.pos += 1;
                let cond = self.parse_expr(Prec::Lowest)?;
                let message = if self.eat(&TokenKind::Comma) {
                    Some(self.parse_expr(Prec::Lowest)?)
                } else {
                    None
                };
                self.end_simple_statement()?;
                Ok(Stmt::Assert { cond, message, line })
            }
            _ => self.parse_expr_statement(),
        }
    }

    /// Expression statement, assignment, or augmented assignment.
    fn parse_expr_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        let target = self.parse_tuple_expr()?;

        let aug_op = match self.peek() {
            TokenKind::PlusAssign => Some(BinOp::Add),
            TokenKind::MinusAssign => Some(BinOp::Sub),
            TokenKind::StarAssign => Some(BinOp::Mul),
            TokenKind::SlashAssign => Some(BinOp::Div),
            TokenKind::DoubleSlashAssign => Some(BinOp::FloorDiv),
            TokenKind::PercentAssign => Some(BinOp::Mod),
            TokenKind::DoubleStarAssign => Some(BinOp::Pow),
            TokenKind::AmpAssign => Some(BinOp::BitAnd),
            TokenKind::PipeAssign => Some(BinOp::BitOr),
            TokenKind::CaretAssign => Some(BinOp::BitXor),
            TokenKind::ShlAssign => Some(BinOp::Shl),
            TokenKind::ShrAssign => Some(BinOp::Shr),
            _ => None,
        };
        if let Some(op) = aug_op {
            self.pos += 1;
            let value = self.parse_tuple_expr()?;
            self.end_simple_statement()?;
            return Ok(Stmt::AugAssign { target, op, value, line });
        }

        if self.eat(&TokenKind::Assign) {
            let value = self.parse_tuple_expr()?;
            self.validate_target(&target)?;
            self.end_simple_statement()?;
            return Ok(Stmt::Assign { target, value, line });
        }

        self.end_simple_statement()?;
        Ok(Stmt::Expr { expr: target, line })
    }

    fn parse_maybe_starred(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        if self.eat(&TokenKind::Star) {
            let inner = self.parse_expr(Prec::Conditional)?;
            return Ok(Expr::new(ExprKind::Starred(Box::new(inner)), line));
        }
        self.parse_expr(Prec::Lowest)
    }

    /// A possibly bare-comma-packed expression, used for both sides of
    /// assignment: `a, b = 1, 2`.
    fn parse_tuple_expr(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let first = self.parse_maybe_starred()?;
        if !self.at(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.at_statement_end() || self.at(&TokenKind::Assign) {
                break;
            }
            items.push(self.parse_maybe_starred()?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), line))
    }

    /// Checks an assignment target is assignable and has at most one star.
    fn validate_target(&self, target: &Expr) -> Result<(), ParseError> {
        match &target.kind {
            ExprKind::Ident(_) | ExprKind::Attr { .. } | ExprKind::Index { .. } | ExprKind::Slice { .. } => Ok(()),
            ExprKind::Starred(inner) => self.validate_target(inner),
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                let mut starred = 0;
                for item in items {
                    if matches!(item.kind, ExprKind::Starred(_)) {
                        starred += 1;
                    }
                    self.validate_target(item)?;
                }
                if starred > 1 {
                    Err(ParseError::new(
                        "multiple starred targets in assignment",
                        target.line,
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Err(ParseError::new("cannot assign to this expression", target.line)),
        }
    }

    fn parse_name_list(&mut self) -> Result<Vec<Arc<str>>, ParseError> {
        let mut names = vec![self.expect_ident()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    // -- compound statements ------------------------------------------------

    /// A suite: `:` followed by an indented block or an inline statement
    /// list on the same line.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::Colon)?;
        if self.eat(&TokenKind::Newline) {
            self.expect(&TokenKind::Indent)?;
            let mut stmts = Vec::new();
            loop {
                self.skip_separators();
                if self.eat(&TokenKind::Dedent) {
                    break;
                }
                if self.at(&TokenKind::Eof) {
                    return Err(self.error("unexpected end of file in block"));
                }
                stmts.push(self.parse_statement()?);
            }
            if stmts.is_empty() {
                return Err(self.error("expected an indented block"));
            }
            Ok(stmts)
        } else {
            // Inline suite: simple statements separated by semicolons.
            let mut stmts = vec![self.parse_statement()?];
            while self.eat(&TokenKind::Semicolon) {
                if self.at_statement_end() {
                    break;
                }
                stmts.push(self.parse_statement()?);
            }
            Ok(stmts)
        }
    }

    fn parse_function_def(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword(Keyword::Def)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let (params, var_args, var_kwargs) = self.parse_params()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::FunctionDef(Arc::new(FunctionDef {
            name,
            params,
            var_args,
            var_kwargs,
            body,
            line,
        })))
    }

    /// Parameter list for `def` and `lambda`: positional names with optional
    /// defaults, then optional `*variadic`, then optional `**kwargs`.
    fn parse_params(&mut self) -> Result<(Vec<Param>, Option<Arc<str>>, Option<Arc<str>>), ParseError> {
        let mut params = Vec::new();
        let mut var_args = None;
        let mut var_kwargs = None;
        let mut seen_default = false;
        loop {
            match self.peek() {
                TokenKind::RParen | TokenKind::Colon => break,
                TokenKind::Star => {
                    self.pos += 1;
                    if var_args.is_some() || var_kwargs.is_some() {
                        return Err(self.error("duplicate *args parameter"));
                    }
                    var_args = Some(self.expect_ident()?);
                }
                TokenKind::DoubleStar => {
                    self.pos += 1;
                    if var_kwargs.is_some() {
                        return Err(self.error("duplicate **kwargs parameter"));
                    }
                    var_kwargs = Some(self.expect_ident()?);
                }
                _ => {
                    if var_args.is_some() || var_kwargs.is_some() {
                        return Err(self.error("positional parameter after * parameter"));
                    }
                    let name = self.expect_ident()?;
                    let default = if self.eat(&TokenKind::Assign) {
                        seen_default = true;
                        Some(self.parse_expr(Prec::Lowest)?)
                    } else {
                        if seen_default {
                            return Err(self.error("parameter without default follows parameter with default"));
                        }
                        None
                    };
                    params.push(Param { name, default });
                }
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok((params, var_args, var_kwargs))
    }

    fn parse_class_def(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword(Keyword::Class)?;
        let name = self.expect_ident()?;
        let base = if self.eat(&TokenKind::LParen) {
            if self.eat(&TokenKind::RParen) {
                None
            } else {
                let base = self.parse_expr(Prec::Lowest)?;
                if self.at(&TokenKind::Comma) {
                    return Err(self.error("multiple inheritance is not supported"));
                }
                self.expect(&TokenKind::RParen)?;
                Some(base)
            }
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(Stmt::ClassDef { name, base, body, line })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword(Keyword::If)?;
        let mut branches = Vec::new();
        let cond = self.parse_expr(Prec::Lowest)?;
        branches.push((cond, self.parse_block()?));
        let mut orelse = None;
        loop {
            self.skip_blank_lines();
            if self.eat_keyword(Keyword::Elif) {
                let cond = self.parse_expr(Prec::Lowest)?;
                branches.push((cond, self.parse_block()?));
            } else if self.eat_keyword(Keyword::Else) {
                orelse = Some(self.parse_block()?);
                break;
            } else {
                break;
            }
        }
        Ok(Stmt::If { branches, orelse, line })
    }

    /// `elif`/`else`/`except` may be separated from the preceding block by
    /// blank lines; dedents were already consumed by the block.
    fn skip_blank_lines(&mut self) {
        while self.at(&TokenKind::Newline) {
            self.pos += 1;
        }
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword(Keyword::While)?;
        let cond = self.parse_expr(Prec::Lowest)?;
        let body = self.parse_block()?;
        Ok(Stmt::While { cond, body, line })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword(Keyword::For)?;
        let target = self.parse_for_target()?;
        self.expect_keyword(Keyword::In)?;
        let iterable = self.parse_tuple_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            target,
            iterable,
            body,
            line,
        })
    }

    /// A `for` target list: one or more names/attributes/indexes, packed
    /// into a tuple when comma-separated. Parsed below equality level so
    /// the `in` keyword is never consumed.
    fn parse_for_target(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let first = self.parse_expr(Prec::Equality)?;
        if !self.at(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.at_keyword(Keyword::In) {
                break;
            }
            items.push(self.parse_expr(Prec::Equality)?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), line))
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword(Keyword::Try)?;
        let body = self.parse_block()?;
        let mut handlers = Vec::new();
        loop {
            self.skip_blank_lines();
            if !self.at_keyword(Keyword::Except) {
                break;
            }
            let handler_line = self.line();
            self.pos += 1;
            let exc_type = match self.peek() {
                TokenKind::Colon => None,
                TokenKind::Ident(name) => {
                    let name = Arc::clone(name);
                    self.pos += 1;
                    Some(name)
                }
                other => return Err(self.error(format!("expected exception name or ':', found '{other}'"))),
            };
            let bind = if self.eat_keyword(Keyword::As) {
                Some(self.expect_ident()?)
            } else {
                None
            };
            let handler_body = self.parse_block()?;
            handlers.push(ExceptHandler {
                exc_type,
                bind,
                body: handler_body,
                line: handler_line,
            });
        }
        self.skip_blank_lines();
        let finally = if self.eat_keyword(Keyword::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handlers.is_empty() && finally.is_none() {
            return Err(self.error("expected 'except' or 'finally' after try block"));
        }
        Ok(Stmt::Try {
            body,
            handlers,
            finally,
            line,
        })
    }

    fn parse_import(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword(Keyword::Import)?;
        let mut items = Vec::new();
        loop {
            let path = self.parse_dotted_name()?;
            let alias = if self.eat_keyword(Keyword::As) {
                Some(self.expect_ident()?)
            } else {
                None
            };
            items.push(ImportItem { path, alias });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.end_simple_statement()?;
        Ok(Stmt::Import { items, line })
    }

    fn parse_from_import(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword(Keyword::From)?;
        let module = self.parse_dotted_name()?;
        self.expect_keyword(Keyword::Import)?;
        let mut names = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let alias = if self.eat_keyword(Keyword::As) {
                Some(self.expect_ident()?)
            } else {
                None
            };
            names.push((name, alias));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.end_simple_statement()?;
        Ok(Stmt::FromImport { module, names, line })
    }

    fn parse_dotted_name(&mut self) -> Result<Vec<Arc<str>>, ParseError> {
        let mut path = vec![self.expect_ident()?];
        while self.eat(&TokenKind::Dot) {
            path.push(self.expect_ident()?);
        }
        Ok(path)
    }

    fn parse_match(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect_keyword(Keyword::Match)?;
        let subject = self.parse_tuple_expr()?;
        self.expect(&TokenKind::Colon)?;
        self.expect(&TokenKind::Newline)?;
        self.expect(&TokenKind::Indent)?;
        let mut cases = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(&TokenKind::Dedent) {
                break;
            }
            self.expect_keyword(Keyword::Case)?;
            let pattern = self.parse_case_pattern()?;
            let capture = if self.eat_keyword(Keyword::As) {
                Some(self.expect_ident()?)
            } else {
                None
            };
            let guard = if self.eat_keyword(Keyword::If) {
                Some(self.parse_expr(Prec::Lowest)?)
            } else {
                None
            };
            let body = self.parse_block()?;
            cases.push(MatchCase {
                pattern,
                capture,
                guard,
                body,
            });
        }
        if cases.is_empty() {
            return Err(self.error("expected at least one 'case' clause"));
        }
        Ok(Stmt::Match { subject, cases, line })
    }

    /// A case pattern is an ordinary expression parsed below the conditional
    /// level (so the guard's `if` is left alone), with bare commas packing a
    /// tuple pattern.
    fn parse_case_pattern(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let first = self.parse_expr(Prec::Conditional)?;
        if !self.at(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.at(&TokenKind::Colon) || self.at_keyword(Keyword::If) || self.at_keyword(Keyword::As) {
                break;
            }
            items.push(self.parse_expr(Prec::Conditional)?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), line))
    }

    // -- expressions --------------------------------------------------------

    fn parse_expr(&mut self, min_prec: Prec) -> Result<Expr, ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.depth -= 1;
            return Err(self.error("expression is too deeply nested"));
        }
        let result = self.parse_expr_inner(min_prec);
        self.depth -= 1;
        result
    }

    fn parse_expr_inner(&mut self, min_prec: Prec) -> Result<Expr, ParseError> {
        let mut left = self.parse_prefix()?;
        loop {
            let prec = self.peek_infix_prec();
            if prec <= min_prec {
                break;
            }
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    /// Infix precedence of the upcoming token, or `Lowest` when it cannot
    /// continue an expression.
    fn peek_infix_prec(&self) -> Prec {
        match self.peek() {
            // The conditional operator only applies on the same line, so a
            // comprehension's `if` filter on a continuation line is not
            // misread as a conditional.
            TokenKind::Keyword(Keyword::If) if self.line() == self.prev_line() => Prec::Conditional,
            TokenKind::Keyword(Keyword::Or) => Prec::Or,
            TokenKind::Pipe => Prec::BitOr,
            TokenKind::Caret => Prec::BitXor,
            TokenKind::Amp => Prec::BitAnd,
            TokenKind::Keyword(Keyword::And) => Prec::And,
            TokenKind::EqEq | TokenKind::NotEq | TokenKind::Keyword(Keyword::In | Keyword::Is) => Prec::Equality,
            TokenKind::Keyword(Keyword::Not) if matches!(self.peek_at(1), TokenKind::Keyword(Keyword::In)) => {
                Prec::Equality
            }
            TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge => Prec::Ordering,
            TokenKind::Shl | TokenKind::Shr => Prec::Shift,
            TokenKind::Plus | TokenKind::Minus => Prec::Additive,
            TokenKind::Star | TokenKind::Slash | TokenKind::DoubleSlash | TokenKind::Percent => Prec::Multiplicative,
            TokenKind::DoubleStar => Prec::Power,
            TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot => Prec::Call,
            _ => Prec::Lowest,
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        match self.advance() {
            TokenKind::Int(value) => Ok(Expr::new(ExprKind::Int(value), line)),
            TokenKind::Float(value) => Ok(Expr::new(ExprKind::Float(value), line)),
            TokenKind::Str(s) => Ok(Expr::new(ExprKind::Str(s), line)),
            TokenKind::FStr(body) => self.parse_fstring(&body, line),
            TokenKind::Ident(name) => Ok(Expr::new(ExprKind::Ident(name), line)),
            TokenKind::Keyword(Keyword::True) => Ok(Expr::new(ExprKind::Bool(true), line)),
            TokenKind::Keyword(Keyword::False) => Ok(Expr::new(ExprKind::Bool(false), line)),
            TokenKind::Keyword(Keyword::None) => Ok(Expr::new(ExprKind::NoneLit, line)),
            TokenKind::Keyword(Keyword::Not) => {
                // `not` binds looser than comparisons: `not a == b` negates
                // the comparison.
                let operand = self.parse_expr(Prec::And)?;
                Ok(Expr::new(
                    ExprKind::Prefix {
                        op: PrefixOp::Not,
                        operand: Box::new(operand),
                    },
                    line,
                ))
            }
            TokenKind::Minus => {
                let operand = self.parse_expr(Prec::Prefix)?;
                Ok(Expr::new(
                    ExprKind::Prefix {
                        op: PrefixOp::Neg,
                        operand: Box::new(operand),
                    },
                    line,
                ))
            }
            TokenKind::Plus => {
                let operand = self.parse_expr(Prec::Prefix)?;
                Ok(Expr::new(
                    ExprKind::Prefix {
                        op: PrefixOp::Pos,
                        operand: Box::new(operand),
                    },
                    line,
                ))
            }
            TokenKind::Tilde => {
                let operand = self.parse_expr(Prec::Prefix)?;
                Ok(Expr::new(
                    ExprKind::Prefix {
                        op: PrefixOp::Invert,
                        operand: Box::new(operand),
                    },
                    line,
                ))
            }
            TokenKind::Keyword(Keyword::Lambda) => {
                let (params, var_args, var_kwargs) = self.parse_params()?;
                self.expect(&TokenKind::Colon)?;
                let body = self.parse_expr(Prec::Lowest)?;
                Ok(Expr::new(
                    ExprKind::Lambda(Arc::new(LambdaDef {
                        params,
                        var_args,
                        var_kwargs,
                        body,
                        line,
                    })),
                    line,
                ))
            }
            TokenKind::LParen => self.parse_paren(line),
            TokenKind::LBracket => self.parse_list(line),
            TokenKind::LBrace => self.parse_brace(line),
            other => Err(ParseError::new(format!("unexpected '{other}'"), line)),
        }
    }

    fn parse_paren(&mut self, line: u32) -> Result<Expr, ParseError> {
        if self.eat(&TokenKind::RParen) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), line));
        }
        let first = self.parse_maybe_starred_in_seq()?;
        if self.at_keyword(Keyword::For) {
            let comp = self.parse_comprehension_clauses(None, first)?;
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr::new(ExprKind::Generator(Box::new(comp)), line));
        }
        if self.at(&TokenKind::Comma) {
            let mut items = vec![first];
            while self.eat(&TokenKind::Comma) {
                if self.at(&TokenKind::RParen) {
                    break;
                }
                items.push(self.parse_maybe_starred_in_seq()?);
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr::new(ExprKind::Tuple(items), line));
        }
        self.expect(&TokenKind::RParen)?;
        Ok(first)
    }

    fn parse_maybe_starred_in_seq(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        if self.eat(&TokenKind::Star) {
            let inner = self.parse_expr(Prec::Conditional)?;
            return Ok(Expr::new(ExprKind::Starred(Box::new(inner)), line));
        }
        self.parse_expr(Prec::Lowest)
    }

    fn parse_list(&mut self, line: u32) -> Result<Expr, ParseError> {
        if self.eat(&TokenKind::RBracket) {
            return Ok(Expr::new(ExprKind::List(Vec::new()), line));
        }
        let first = self.parse_maybe_starred_in_seq()?;
        if self.at_keyword(Keyword::For) {
            let comp = self.parse_comprehension_clauses(None, first)?;
            self.expect(&TokenKind::RBracket)?;
            return Ok(Expr::new(ExprKind::ListComp(Box::new(comp)), line));
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.at(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_maybe_starred_in_seq()?);
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(ExprKind::List(items), line))
    }

    fn parse_brace(&mut self, line: u32) -> Result<Expr, ParseError> {
        if self.eat(&TokenKind::RBrace) {
            return Ok(Expr::new(ExprKind::Dict(Vec::new()), line));
        }
        let first = self.parse_expr(Prec::Lowest)?;
        if self.eat(&TokenKind::Colon) {
            let value = self.parse_expr(Prec::Lowest)?;
            if self.at_keyword(Keyword::For) {
                let comp = self.parse_comprehension_clauses(Some(first), value)?;
                self.expect(&TokenKind::RBrace)?;
                return Ok(Expr::new(ExprKind::DictComp(Box::new(comp)), line));
            }
            let mut entries = vec![(first, value)];
            while self.eat(&TokenKind::Comma) {
                if self.at(&TokenKind::RBrace) {
                    break;
                }
                let key = self.parse_expr(Prec::Lowest)?;
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_expr(Prec::Lowest)?;
                entries.push((key, value));
            }
            self.expect(&TokenKind::RBrace)?;
            return Ok(Expr::new(ExprKind::Dict(entries), line));
        }
        if self.at_keyword(Keyword::For) {
            let comp = self.parse_comprehension_clauses(None, first)?;
            self.expect(&TokenKind::RBrace)?;
            return Ok(Expr::new(ExprKind::SetComp(Box::new(comp)), line));
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.at(&TokenKind::RBrace) {
                break;
            }
            items.push(self.parse_expr(Prec::Lowest)?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(ExprKind::Set(items), line))
    }

    /// One or more `for target in iterable [if cond]*` clauses.
    fn parse_comprehension_clauses(&mut self, key: Option<Expr>, element: Expr) -> Result<Comprehension, ParseError> {
        let mut clauses = Vec::new();
        while self.eat_keyword(Keyword::For) {
            let target = self.parse_for_target()?;
            self.expect_keyword(Keyword::In)?;
            // Parsed below the conditional level so a trailing `if` reads as
            // a filter, not a conditional expression.
            let iterable = self.parse_expr(Prec::Conditional)?;
            let mut conds = Vec::new();
            while self.eat_keyword(Keyword::If) {
                conds.push(self.parse_expr(Prec::Conditional)?);
            }
            clauses.push(CompClause {
                target,
                iterable,
                conds,
            });
        }
        Ok(Comprehension { key, element, clauses })
    }

    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ParseError> {
        let line = self.line();
        match self.peek().clone() {
            TokenKind::LParen => {
                self.pos += 1;
                let args = self.parse_call_args()?;
                Ok(Expr::new(
                    ExprKind::Call {
                        callee: Box::new(left),
                        args,
                    },
                    line,
                ))
            }
            TokenKind::LBracket => {
                self.pos += 1;
                self.parse_subscript(left, line)
            }
            TokenKind::Dot => {
                self.pos += 1;
                let name = self.parse_attr_name()?;
                Ok(Expr::new(
                    ExprKind::Attr {
                        obj: Box::new(left),
                        name,
                    },
                    line,
                ))
            }
            TokenKind::Keyword(Keyword::If) => {
                self.pos += 1;
                let cond = self.parse_expr(Prec::Conditional)?;
                self.expect_keyword(Keyword::Else)?;
                let orelse = self.parse_expr(Prec::Lowest)?;
                Ok(Expr::new(
                    ExprKind::Conditional {
                        cond: Box::new(cond),
                        then: Box::new(left),
                        orelse: Box::new(orelse),
                    },
                    line,
                ))
            }
            TokenKind::Keyword(Keyword::And) => {
                self.pos += 1;
                let right = self.parse_expr(Prec::And)?;
                Ok(Expr::new(
                    ExprKind::BoolOp {
                        op: BoolOpKind::And,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    line,
                ))
            }
            TokenKind::Keyword(Keyword::Or) => {
                self.pos += 1;
                let right = self.parse_expr(Prec::Or)?;
                Ok(Expr::new(
                    ExprKind::BoolOp {
                        op: BoolOpKind::Or,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    line,
                ))
            }
            TokenKind::DoubleStar => {
                self.pos += 1;
                // Right-associative: parse the right side at one level down.
                let right = self.parse_expr(Prec::Multiplicative)?;
                Ok(Expr::new(
                    ExprKind::Binary {
                        op: BinOp::Pow,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    line,
                ))
            }
            kind => {
                if let Some(op) = comparison_op(&kind, self.peek_at(1)) {
                    return self.parse_comparison_chain(left, op, line);
                }
                let op = match kind {
                    TokenKind::Pipe => BinOp::BitOr,
                    TokenKind::Caret => BinOp::BitXor,
                    TokenKind::Amp => BinOp::BitAnd,
                    TokenKind::Shl => BinOp::Shl,
                    TokenKind::Shr => BinOp::Shr,
                    TokenKind::Plus => BinOp::Add,
                    TokenKind::Minus => BinOp::Sub,
                    TokenKind::Star => BinOp::Mul,
                    TokenKind::Slash => BinOp::Div,
                    TokenKind::DoubleSlash => BinOp::FloorDiv,
                    TokenKind::Percent => BinOp::Mod,
                    other => return Err(self.error(format!("unexpected '{other}' in expression"))),
                };
                self.pos += 1;
                let right = self.parse_expr(binop_prec(op))?;
                Ok(Expr::new(
                    ExprKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    line,
                ))
            }
        }
    }

    /// Parses `a < b < c`-style chains, folding them into
    /// `(a < b) and (b < c)`.
    fn parse_comparison_chain(&mut self, first: Expr, first_op: BinOp, line: u32) -> Result<Expr, ParseError> {
        self.consume_comparison_op(first_op);
        let mut prev = self.parse_expr(Prec::Ordering)?;
        let mut result = Expr::new(
            ExprKind::Binary {
                op: first_op,
                left: Box::new(first),
                right: Box::new(prev.clone()),
            },
            line,
        );
        while let Some(op) = comparison_op(self.peek(), self.peek_at(1)) {
            self.consume_comparison_op(op);
            let next = self.parse_expr(Prec::Ordering)?;
            let pair = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(prev),
                    right: Box::new(next.clone()),
                },
                line,
            );
            result = Expr::new(
                ExprKind::BoolOp {
                    op: BoolOpKind::And,
                    left: Box::new(result),
                    right: Box::new(pair),
                },
                line,
            );
            prev = next;
        }
        Ok(result)
    }

    /// Consumes the one or two tokens of a comparison operator.
    fn consume_comparison_op(&mut self, op: BinOp) {
        self.pos += 1;
        if matches!(op, BinOp::NotIn | BinOp::IsNot) {
            self.pos += 1;
        }
    }

    /// Attribute names may be any identifier or keyword (`re.match`).
    fn parse_attr_name(&mut self) -> Result<Arc<str>, ParseError> {
        match self.advance() {
            TokenKind::Ident(name) => Ok(name),
            TokenKind::Keyword(kw) => Ok(Arc::from(kw.to_string().as_str())),
            other => Err(self.error(format!("expected attribute name, found '{other}'"))),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<CallArg>, ParseError> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            match self.peek().clone() {
                TokenKind::Star => {
                    self.pos += 1;
                    args.push(CallArg::Star(self.parse_expr(Prec::Lowest)?));
                }
                TokenKind::DoubleStar => {
                    self.pos += 1;
                    args.push(CallArg::KwStar(self.parse_expr(Prec::Lowest)?));
                }
                TokenKind::Ident(name) if *self.peek_at(1) == TokenKind::Assign => {
                    self.pos += 2;
                    args.push(CallArg::Kw(name, self.parse_expr(Prec::Lowest)?));
                }
                _ => {
                    let expr = self.parse_expr(Prec::Lowest)?;
                    // A generator expression as the sole argument needs no
                    // extra parentheses: f(x for x in xs).
                    if self.at_keyword(Keyword::For) && args.is_empty() {
                        let comp = self.parse_comprehension_clauses(None, expr)?;
                        args.push(CallArg::Pos(Expr::new(
                            ExprKind::Generator(Box::new(comp)),
                            self.line(),
                        )));
                        self.expect(&TokenKind::RParen)?;
                        return Ok(args);
                    }
                    args.push(CallArg::Pos(expr));
                }
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            if self.at(&TokenKind::RParen) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_subscript(&mut self, obj: Expr, line: u32) -> Result<Expr, ParseError> {
        let start = if self.at(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expr(Prec::Lowest)?))
        };
        if !self.at(&TokenKind::Colon) {
            self.expect(&TokenKind::RBracket)?;
            let Some(index) = start else {
                return Err(self.error("expected index expression"));
            };
            return Ok(Expr::new(
                ExprKind::Index {
                    obj: Box::new(obj),
                    index,
                },
                line,
            ));
        }
        self.expect(&TokenKind::Colon)?;
        let stop = if self.at(&TokenKind::Colon) || self.at(&TokenKind::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_expr(Prec::Lowest)?))
        };
        let step = if self.eat(&TokenKind::Colon) {
            if self.at(&TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expr(Prec::Lowest)?))
            }
        } else {
            None
        };
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::Slice {
                obj: Box::new(obj),
                start,
                stop,
                step,
            },
            line,
        ))
    }

    /// Parses an f-string body into literal and interpolated parts; each
    /// expression slot runs through the full expression grammar.
    fn parse_fstring(&mut self, body: &str, line: u32) -> Result<Expr, ParseError> {
        let raw_parts = split_fstring(body).map_err(|message| ParseError::new(message, line))?;
        let mut parts = Vec::with_capacity(raw_parts.len());
        for part in raw_parts {
            match part {
                RawPart::Literal(text) => parts.push(FStringPart::Literal(Arc::from(text.as_str()))),
                RawPart::Interp { expr_src, spec } => {
                    let expr = parse_embedded_expr(&expr_src, line)?;
                    let spec = spec
                        .map(|s| FormatSpec::parse(&s).map_err(|message| ParseError::new(message, line)))
                        .transpose()?;
                    parts.push(FStringPart::Interp { expr, spec });
                }
            }
        }
        Ok(Expr::new(ExprKind::FString(parts), line))
    }
}

/// Parses one expression lifted out of an f-string slot.
fn parse_embedded_expr(source: &str, line: u32) -> Result<Expr, ParseError> {
    let tokens = tokenize(source).map_err(|e| ParseError::new(e.message, line))?;
    let mut parser = Parser::new(tokens);
    let mut expr = parser
        .parse_expr(Prec::Lowest)
        .map_err(|e| ParseError::new(e.message, line))?;
    if !parser.at_statement_end() {
        return Err(ParseError::new(
            format!("unexpected '{}' in f-string expression", parser.peek()),
            line,
        ));
    }
    relocate(&mut expr, line);
    Ok(expr)
}

/// Rewrites line numbers of an embedded expression to the f-string's line.
fn relocate(expr: &mut Expr, line: u32) {
    expr.line = line;
    match &mut expr.kind {
        ExprKind::List(items) | ExprKind::Tuple(items) | ExprKind::Set(items) => {
            for item in items {
                relocate(item, line);
            }
        }
        ExprKind::Dict(entries) => {
            for (k, v) in entries {
                relocate(k, line);
                relocate(v, line);
            }
        }
        ExprKind::Starred(inner) | ExprKind::Prefix { operand: inner, .. } => relocate(inner, line),
        ExprKind::Binary { left, right, .. } | ExprKind::BoolOp { left, right, .. } => {
            relocate(left, line);
            relocate(right, line);
        }
        ExprKind::Conditional { cond, then, orelse } => {
            relocate(cond, line);
            relocate(then, line);
            relocate(orelse, line);
        }
        ExprKind::Call { callee, args } => {
            relocate(callee, line);
            for arg in args {
                match arg {
                    CallArg::Pos(e) | CallArg::Star(e) | CallArg::Kw(_, e) | CallArg::KwStar(e) => relocate(e, line),
                }
            }
        }
        ExprKind::Attr { obj, .. } => relocate(obj, line),
        ExprKind::Index { obj, index } => {
            relocate(obj, line);
            relocate(index, line);
        }
        ExprKind::Slice { obj, start, stop, step } => {
            relocate(obj, line);
            for bound in [start, stop, step].into_iter().flatten() {
                relocate(bound, line);
            }
        }
        _ => {}
    }
}

/// Recognizes a comparison operator at the given token (with one lookahead
/// for the two-token forms `not in` and `is not`).
fn comparison_op(kind: &TokenKind, next: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::EqEq => Some(BinOp::Eq),
        TokenKind::NotEq => Some(BinOp::NotEq),
        TokenKind::Lt => Some(BinOp::Lt),
        TokenKind::Gt => Some(BinOp::Gt),
        TokenKind::Le => Some(BinOp::Le),
        TokenKind::Ge => Some(BinOp::Ge),
        TokenKind::Keyword(Keyword::In) => Some(BinOp::In),
        TokenKind::Keyword(Keyword::Not) if matches!(next, TokenKind::Keyword(Keyword::In)) => Some(BinOp::NotIn),
        TokenKind::Keyword(Keyword::Is) => {
            if matches!(next, TokenKind::Keyword(Keyword::Not)) {
                Some(BinOp::IsNot)
            } else {
                Some(BinOp::Is)
            }
        }
        _ => None,
    }
}

/// The precedence at which a binary operator's right operand parses
/// (left-associative: one level up).
fn binop_prec(op: BinOp) -> Prec {
    match op {
        BinOp::BitOr => Prec::BitOr,
        BinOp::BitXor => Prec::BitXor,
        BinOp::BitAnd => Prec::BitAnd,
        BinOp::Shl | BinOp::Shr => Prec::Shift,
        BinOp::Add | BinOp::Sub => Prec::Additive,
        BinOp::Mul | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => Prec::Multiplicative,
        BinOp::Pow => Prec::Power,
        _ => Prec::Equality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Vec<Stmt> {
        parse(source).expect("parse should succeed")
    }

    #[test]
    fn precedence_of_arithmetic() {
        let stmts = parse_ok("x = 1 + 2 * 3\n");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        let ExprKind::Binary { op: BinOp::Add, right, .. } = &value.kind else {
            panic!("expected + at the top");
        };
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn power_is_right_associative() {
        let stmts = parse_ok("x = 2 ** 3 ** 2\n");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        let ExprKind::Binary { op: BinOp::Pow, right, .. } = &value.kind else {
            panic!()
        };
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Pow, .. }));
    }

    #[test]
    fn chained_comparison_desugars_to_and() {
        let stmts = parse_ok("x = 1 < y < 10\n");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        assert!(matches!(
            value.kind,
            ExprKind::BoolOp {
                op: BoolOpKind::And,
                ..
            }
        ));
    }

    #[test]
    fn tuple_packing_both_sides() {
        let stmts = parse_ok("a, b = 1, 2\n");
        let Stmt::Assign { target, value, .. } = &stmts[0] else { panic!() };
        assert!(matches!(&target.kind, ExprKind::Tuple(items) if items.len() == 2));
        assert!(matches!(&value.kind, ExprKind::Tuple(items) if items.len() == 2));
    }

    #[test]
    fn star_target() {
        let stmts = parse_ok("*rest, a = seq\n");
        let Stmt::Assign { target, .. } = &stmts[0] else { panic!() };
        let ExprKind::Tuple(items) = &target.kind else { panic!() };
        assert!(matches!(items[0].kind, ExprKind::Starred(_)));
    }

    #[test]
    fn two_starred_targets_rejected() {
        assert!(parse("*a, *b = seq\n").is_err());
    }

    #[test]
    fn conditional_expression() {
        let stmts = parse_ok("x = a if c else b\n");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        assert!(matches!(value.kind, ExprKind::Conditional { .. }));
    }

    #[test]
    fn comprehension_with_filter() {
        let stmts = parse_ok("xs = [x * x for x in ys if x > 0]\n");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        let ExprKind::ListComp(comp) = &value.kind else { panic!() };
        assert_eq!(comp.clauses.len(), 1);
        assert_eq!(comp.clauses[0].conds.len(), 1);
    }

    #[test]
    fn generator_as_sole_call_argument() {
        let stmts = parse_ok("total = sum(x for x in xs)\n");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        let ExprKind::Call { args, .. } = &value.kind else { panic!() };
        assert!(matches!(&args[0], CallArg::Pos(e) if matches!(e.kind, ExprKind::Generator(_))));
    }

    #[test]
    fn keyword_attribute_names() {
        let stmts = parse_ok("m = re.match\n");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        let ExprKind::Attr { name, .. } = &value.kind else { panic!() };
        assert_eq!(name.as_ref(), "match");
    }

    #[test]
    fn match_statement_with_guard_and_capture() {
        let source = "match x:\n    case 0: pass\n    case n if n < 0: pass\n    case [a, b] as pair: pass\n";
        let stmts = parse_ok(source);
        let Stmt::Match { cases, .. } = &stmts[0] else { panic!() };
        assert_eq!(cases.len(), 3);
        assert!(cases[1].guard.is_some());
        assert_eq!(cases[2].capture.as_deref(), Some("pair"));
    }

    #[test]
    fn import_forms() {
        let stmts = parse_ok("import a.b.c as n, d\nfrom x.y import p, q as r\n");
        let Stmt::Import { items, .. } = &stmts[0] else { panic!() };
        assert_eq!(items[0].path.len(), 3);
        assert_eq!(items[0].alias.as_deref(), Some("n"));
        assert_eq!(items[1].path.len(), 1);
        let Stmt::FromImport { module, names, .. } = &stmts[1] else { panic!() };
        assert_eq!(module.len(), 2);
        assert_eq!(names[1].1.as_deref(), Some("r"));
    }

    #[test]
    fn multiple_errors_are_collected() {
        let errors = parse("x = = 1\ny = 2\nz = ) 3\n").unwrap_err();
        assert!(errors.len() >= 2);
    }

    #[test]
    fn bare_return_does_not_eat_dedent() {
        let stmts = parse_ok("def f():\n    return\nx = 1\n");
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn slice_forms() {
        let stmts = parse_ok("a = xs[1:2:3]\nb = xs[:2]\nc = xs[::2]\nd = xs[1]\n");
        assert!(matches!(
            &stmts[0],
            Stmt::Assign { value, .. } if matches!(value.kind, ExprKind::Slice { .. })
        ));
        assert!(matches!(
            &stmts[3],
            Stmt::Assign { value, .. } if matches!(value.kind, ExprKind::Index { .. })
        ));
    }

    #[test]
    fn fstring_parts_parse() {
        let stmts = parse_ok("s = f\"{k:2d} -> {v}\"\n");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        let ExprKind::FString(parts) = &value.kind else { panic!() };
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn lambda_with_defaults() {
        let stmts = parse_ok("f = lambda a, b=2: a + b\n");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        let ExprKind::Lambda(def) = &value.kind else { panic!() };
        assert_eq!(def.params.len(), 2);
        assert!(def.params[1].default.is_some());
    }
}
