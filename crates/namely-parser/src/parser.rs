//! JavaScript parser.
//!
//! Recursive descent with precedence climbing for expressions. Covers the
//! ES5-era subset minified bundles are written in, plus arrows, `let`/`const`,
//! substitution-free template literals, and `for..of`.

use crate::ast::*;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parse error.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}

/// The parser.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Current token.
    current: Token,
    /// Source code (kept on the produced AST).
    source: &'a str,
    /// When false, `in` is not parsed as a binary operator (for-in init).
    allow_in: bool,
}

impl<'a> Parser<'a> {
    /// Create a new parser.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            source,
            allow_in: true,
        }
    }

    /// Parse the entire source into an AST.
    pub fn parse(mut self) -> Result<Ast, ParseError> {
        let mut stmts = Vec::new();
        while !self.is_eof() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Ast::new(stmts, self.source.to_string()))
    }

    // =========================================================================
    // Token Handling
    // =========================================================================

    fn peek(&self) -> &TokenKind {
        &self.current.kind
    }

    /// Advance to the next token and return the previous.
    fn advance(&mut self) -> Token {
        std::mem::replace(&mut self.current, self.lexer.next_token())
    }

    /// Check if the current token matches the given kind (by discriminant).
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn is_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    /// Consume a token if it matches, otherwise return an error.
    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                format!("Expected {:?}, got {:?}", kind, self.peek()),
                self.current.span,
            ))
        }
    }

    /// Consume a token if it matches, returning true if consumed.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume an identifier, returning it with its span.
    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let token = self.advance();
                Ok(Ident::new(name, token.span))
            }
            other => Err(ParseError::new(
                format!("Expected identifier, got {:?}", other),
                self.current.span,
            )),
        }
    }

    /// Whether the current token is the contextual keyword `of`.
    fn check_of(&self) -> bool {
        matches!(self.peek(), TokenKind::Identifier(name) if name == "of")
    }

    /// Consume a semicolon (with ASI support).
    fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        // Automatic Semicolon Insertion (ASI) rules:
        // 1. Explicit semicolon
        if self.eat(&TokenKind::Semicolon) {
            return Ok(());
        }
        // 2. Before closing brace
        if self.check(&TokenKind::RBrace) {
            return Ok(());
        }
        // 3. At end of file
        if self.is_eof() {
            return Ok(());
        }
        // 4. After newline - the current token was preceded by a line terminator
        if self.current.had_newline_before {
            return Ok(());
        }
        Err(ParseError::new("Expected semicolon", self.current.span))
    }

    // =========================================================================
    // Statement Parsing
    // =========================================================================

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.parse_var_stmt(),
            TokenKind::Function => self.parse_function_decl(),
            TokenKind::LBrace => self.parse_block_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::Switch => self.parse_switch_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::Break => self.parse_break_continue(true),
            TokenKind::Continue => self.parse_break_continue(false),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Throw => self.parse_throw_stmt(),
            TokenKind::Try => self.parse_try_stmt(),
            TokenKind::With => self.parse_with_stmt(),
            TokenKind::Debugger => {
                let token = self.advance();
                self.expect_semicolon()?;
                Ok(Stmt::new(StmtKind::Debugger, token.span))
            }
            TokenKind::Semicolon => {
                let token = self.advance();
                Ok(Stmt::new(StmtKind::Empty, token.span))
            }
            TokenKind::Identifier(_) => {
                // Could be a labeled statement: `name: stmt`
                if matches!(self.lexer.peek().kind, TokenKind::Colon) {
                    let label = self.expect_ident()?;
                    self.advance(); // :
                    let body = self.parse_stmt()?;
                    let span = label.span.merge(body.span);
                    return Ok(Stmt::new(
                        StmtKind::Labeled {
                            label: label.name,
                            body: Box::new(body),
                        },
                        span,
                    ));
                }
                self.parse_expr_stmt()
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        self.expect_semicolon()?;
        let span = expr.span;
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    fn parse_block_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::LBrace)?.span;
        let stmts = self.parse_stmt_list_until_rbrace()?;
        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok(Stmt::new(StmtKind::Block(stmts), start.merge(end)))
    }

    fn parse_stmt_list_until_rbrace(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_var_stmt(&mut self) -> Result<Stmt, ParseError> {
        let (kind, start) = self.parse_var_kind();
        let decls = self.parse_var_declarators()?;
        self.expect_semicolon()?;
        let end = decls.last().map(|d| d.span).unwrap_or(start);
        Ok(Stmt::new(StmtKind::Var { kind, decls }, start.merge(end)))
    }

    fn parse_var_kind(&mut self) -> (VarKind, Span) {
        let kind = match self.peek() {
            TokenKind::Let => VarKind::Let,
            TokenKind::Const => VarKind::Const,
            _ => VarKind::Var,
        };
        let token = self.advance();
        (kind, token.span)
    }

    fn parse_var_declarators(&mut self) -> Result<Vec<VarDeclarator>, ParseError> {
        let mut decls = Vec::new();
        loop {
            decls.push(self.parse_var_declarator()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(decls)
    }

    fn parse_var_declarator(&mut self) -> Result<VarDeclarator, ParseError> {
        let name = self.expect_ident()?;
        let mut span = name.span;
        let init = if self.eat(&TokenKind::Eq) {
            let expr = self.parse_assignment()?;
            span = span.merge(expr.span);
            Some(expr)
        } else {
            None
        };
        Ok(VarDeclarator { name, init, span })
    }

    fn parse_function_decl(&mut self) -> Result<Stmt, ParseError> {
        let func = self.parse_function(true)?;
        let span = func.span;
        Ok(Stmt::new(StmtKind::Function(Box::new(func)), span))
    }

    /// Parse a function (after deciding declaration vs. expression).
    /// Declarations require a name; expressions may omit it.
    fn parse_function(&mut self, require_name: bool) -> Result<Function, ParseError> {
        let start = self.expect(&TokenKind::Function)?.span;
        let name = if self.check(&TokenKind::Identifier(String::new())) {
            Some(self.expect_ident()?)
        } else if require_name {
            return Err(ParseError::new(
                "Expected function name",
                self.current.span,
            ));
        } else {
            None
        };
        let params = self.parse_params()?;
        self.expect(&TokenKind::LBrace)?;
        let body = self.parse_stmt_list_until_rbrace()?;
        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok(Function {
            name,
            params,
            body,
            span: start.merge(end),
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Ident>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.expect_ident()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::If)?.span;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let consequent = Box::new(self.parse_stmt()?);
        let (alternate, end) = if self.eat(&TokenKind::Else) {
            let alt = self.parse_stmt()?;
            let span = alt.span;
            (Some(Box::new(alt)), span)
        } else {
            (None, consequent.span)
        };
        Ok(Stmt::new(
            StmtKind::If {
                test,
                consequent,
                alternate,
            },
            start.merge(end),
        ))
    }

    fn parse_switch_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Switch)?.span;
        self.expect(&TokenKind::LParen)?;
        let discriminant = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::LBrace)?;

        let mut cases = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            let case_start = self.current.span;
            let test = if self.eat(&TokenKind::Case) {
                let expr = self.parse_expr()?;
                Some(expr)
            } else {
                self.expect(&TokenKind::Default)?;
                None
            };
            self.expect(&TokenKind::Colon)?;
            let mut consequent = Vec::new();
            while !matches!(
                self.peek(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                consequent.push(self.parse_stmt()?);
            }
            let case_end = consequent.last().map(|s| s.span).unwrap_or(case_start);
            cases.push(SwitchCase {
                test,
                consequent,
                span: case_start.merge(case_end),
            });
        }

        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok(Stmt::new(
            StmtKind::Switch {
                discriminant,
                cases,
            },
            start.merge(end),
        ))
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::For)?.span;
        self.expect(&TokenKind::LParen)?;

        // No initializer: `for (;;)`
        if self.eat(&TokenKind::Semicolon) {
            return self.parse_for_rest(start, None);
        }

        let init = if matches!(
            self.peek(),
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            let (kind, _) = self.parse_var_kind();
            self.allow_in = false;
            let decls = self.parse_var_declarators();
            self.allow_in = true;
            ForInit::Var {
                kind,
                decls: decls?,
            }
        } else {
            self.allow_in = false;
            let expr = self.parse_expr();
            self.allow_in = true;
            ForInit::Expr(expr?)
        };

        if self.eat(&TokenKind::In) {
            let right = self.parse_expr()?;
            self.expect(&TokenKind::RParen)?;
            let body = self.parse_stmt()?;
            let span = start.merge(body.span);
            return Ok(Stmt::new(
                StmtKind::ForIn {
                    left: init,
                    right,
                    body: Box::new(body),
                },
                span,
            ));
        }
        if self.check_of() {
            self.advance(); // of
            let right = self.parse_assignment()?;
            self.expect(&TokenKind::RParen)?;
            let body = self.parse_stmt()?;
            let span = start.merge(body.span);
            return Ok(Stmt::new(
                StmtKind::ForOf {
                    left: init,
                    right,
                    body: Box::new(body),
                },
                span,
            ));
        }

        self.expect(&TokenKind::Semicolon)?;
        self.parse_for_rest(start, Some(init))
    }

    /// Parse the rest of a C-style for loop after `init;`.
    fn parse_for_rest(&mut self, start: Span, init: Option<ForInit>) -> Result<Stmt, ParseError> {
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_stmt()?;
        let span = start.merge(body.span);
        Ok(Stmt::new(
            StmtKind::For {
                init,
                test,
                update,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::While)?.span;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_stmt()?;
        let span = start.merge(body.span);
        Ok(Stmt::new(
            StmtKind::While {
                test,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_do_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Do)?.span;
        let body = self.parse_stmt()?;
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expr()?;
        let end = self.expect(&TokenKind::RParen)?.span;
        // `do..while` allows a missing trailing semicolon everywhere
        self.eat(&TokenKind::Semicolon);
        Ok(Stmt::new(
            StmtKind::DoWhile {
                body: Box::new(body),
                test,
            },
            start.merge(end),
        ))
    }

    fn parse_break_continue(&mut self, is_break: bool) -> Result<Stmt, ParseError> {
        let token = self.advance();
        let mut span = token.span;
        // Restricted production: no label after a newline.
        let label = if !self.current.had_newline_before {
            if let TokenKind::Identifier(name) = self.peek() {
                let name = name.clone();
                span = span.merge(self.advance().span);
                Some(name)
            } else {
                None
            }
        } else {
            None
        };
        self.expect_semicolon()?;
        let kind = if is_break {
            StmtKind::Break { label }
        } else {
            StmtKind::Continue { label }
        };
        Ok(Stmt::new(kind, span))
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Return)?.span;
        // Restricted production: `return \n expr` returns undefined.
        let arg = if self.current.had_newline_before
            || matches!(
                self.peek(),
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
            ) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_semicolon()?;
        let span = arg.as_ref().map(|e| start.merge(e.span)).unwrap_or(start);
        Ok(Stmt::new(StmtKind::Return { arg }, span))
    }

    fn parse_throw_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Throw)?.span;
        if self.current.had_newline_before {
            return Err(ParseError::new(
                "Illegal newline after throw",
                self.current.span,
            ));
        }
        let arg = self.parse_expr()?;
        self.expect_semicolon()?;
        let span = start.merge(arg.span);
        Ok(Stmt::new(StmtKind::Throw { arg }, span))
    }

    fn parse_try_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Try)?.span;
        self.expect(&TokenKind::LBrace)?;
        let block = self.parse_stmt_list_until_rbrace()?;
        let mut end = self.expect(&TokenKind::RBrace)?.span;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.advance().span;
            let param = if self.eat(&TokenKind::LParen) {
                let ident = self.expect_ident()?;
                self.expect(&TokenKind::RParen)?;
                Some(ident)
            } else {
                None
            };
            self.expect(&TokenKind::LBrace)?;
            let body = self.parse_stmt_list_until_rbrace()?;
            let catch_end = self.expect(&TokenKind::RBrace)?.span;
            end = catch_end;
            Some(CatchClause {
                param,
                body,
                span: catch_start.merge(catch_end),
            })
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            self.expect(&TokenKind::LBrace)?;
            let stmts = self.parse_stmt_list_until_rbrace()?;
            end = self.expect(&TokenKind::RBrace)?.span;
            Some(stmts)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(ParseError::new(
                "Missing catch or finally after try",
                self.current.span,
            ));
        }

        Ok(Stmt::new(
            StmtKind::Try {
                block,
                handler,
                finalizer,
            },
            start.merge(end),
        ))
    }

    fn parse_with_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::With)?.span;
        self.expect(&TokenKind::LParen)?;
        let object = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_stmt()?;
        let span = start.merge(body.span);
        Ok(Stmt::new(
            StmtKind::With {
                object,
                body: Box::new(body),
            },
            span,
        ))
    }

    // =========================================================================
    // Expression Parsing
    // =========================================================================

    /// Parse a full expression (including the comma operator).
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_assignment()?);
        }
        let span = exprs[0].span.merge(exprs[exprs.len() - 1].span);
        Ok(Expr::new(ExprKind::Sequence(exprs), span))
    }

    /// Parse an assignment expression (no comma operator).
    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }

        let left = self.parse_conditional()?;

        if self.peek().is_assignment() {
            let op = match self.peek() {
                TokenKind::Eq => AssignOp::Assign,
                TokenKind::PlusEq => AssignOp::AddAssign,
                TokenKind::MinusEq => AssignOp::SubAssign,
                TokenKind::StarEq => AssignOp::MulAssign,
                TokenKind::SlashEq => AssignOp::DivAssign,
                TokenKind::PercentEq => AssignOp::ModAssign,
                TokenKind::LtLtEq => AssignOp::ShlAssign,
                TokenKind::GtGtEq => AssignOp::ShrAssign,
                TokenKind::GtGtGtEq => AssignOp::UShrAssign,
                TokenKind::AmpEq => AssignOp::BitAndAssign,
                TokenKind::PipeEq => AssignOp::BitOrAssign,
                _ => AssignOp::BitXorAssign,
            };
            self.advance();
            let right = self.parse_assignment()?;
            let span = left.span.merge(right.span);
            return Ok(Expr::new(
                ExprKind::Assign {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            ));
        }

        Ok(left)
    }

    /// Try to parse an arrow function at the current position.
    ///
    /// Arrows cannot be committed to until `=>` is seen, so this speculatively
    /// scans the parameter list on a cloned lexer and only consumes input when
    /// the arrow is confirmed.
    fn try_parse_arrow(&mut self) -> Result<Option<Expr>, ParseError> {
        match self.peek() {
            // `x => ...`
            TokenKind::Identifier(_) => {
                if !matches!(self.lexer.peek().kind, TokenKind::Arrow) {
                    return Ok(None);
                }
                let param = self.expect_ident()?;
                let start = param.span;
                self.expect(&TokenKind::Arrow)?;
                self.parse_arrow_body(vec![param], start).map(Some)
            }
            // `(a, b) => ...`
            TokenKind::LParen => {
                if !self.scan_ahead_is_arrow() {
                    return Ok(None);
                }
                let start = self.current.span;
                let params = self.parse_params()?;
                self.expect(&TokenKind::Arrow)?;
                self.parse_arrow_body(params, start).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Scan forward on a cloned lexer to see if a `(` begins arrow parameters.
    /// Only simple identifier parameter lists are recognized, which matches
    /// the binding forms the rest of the parser supports.
    fn scan_ahead_is_arrow(&self) -> bool {
        let mut lexer = self.lexer.clone();
        // current is `(`; the cloned lexer's next token is the one after it
        let mut token = lexer.next_token();
        if !matches!(token.kind, TokenKind::RParen) {
            loop {
                if !matches!(token.kind, TokenKind::Identifier(_)) {
                    return false;
                }
                token = lexer.next_token();
                match token.kind {
                    TokenKind::Comma => token = lexer.next_token(),
                    TokenKind::RParen => break,
                    _ => return false,
                }
            }
        }
        matches!(lexer.next_token().kind, TokenKind::Arrow)
    }

    fn parse_arrow_body(&mut self, params: Vec<Ident>, start: Span) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::LBrace) {
            self.advance();
            let stmts = self.parse_stmt_list_until_rbrace()?;
            let end = self.expect(&TokenKind::RBrace)?.span;
            let span = start.merge(end);
            Ok(Expr::new(
                ExprKind::Arrow(Box::new(ArrowFunction {
                    params,
                    body: ArrowBody::Block(stmts),
                    span,
                })),
                span,
            ))
        } else {
            let expr = self.parse_assignment()?;
            let span = start.merge(expr.span);
            Ok(Expr::new(
                ExprKind::Arrow(Box::new(ArrowFunction {
                    params,
                    body: ArrowBody::Expr(Box::new(expr)),
                    span,
                })),
                span,
            ))
        }
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let saved = self.allow_in;
        self.allow_in = true;
        let consequent = self.parse_assignment();
        self.allow_in = saved;
        let consequent = consequent?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        let span = test.span.merge(alternate.span);
        Ok(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span,
        ))
    }

    /// Precedence-climbing binary expression parser.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let Some(prec) = self.peek().binary_precedence() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            if matches!(self.peek(), TokenKind::In) && !self.allow_in {
                break;
            }
            let op = Self::binary_op_for(self.peek());
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn binary_op_for(kind: &TokenKind) -> BinaryOp {
        match kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::BangEq => BinaryOp::NotEq,
            TokenKind::EqEqEq => BinaryOp::StrictEq,
            TokenKind::BangEqEq => BinaryOp::StrictNotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::LtLt => BinaryOp::Shl,
            TokenKind::GtGt => BinaryOp::Shr,
            TokenKind::GtGtGt => BinaryOp::UShr,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::PipePipe => BinaryOp::Or,
            TokenKind::In => BinaryOp::In,
            _ => BinaryOp::Instanceof,
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let arg = self.parse_unary()?;
            let span = start.merge(arg.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    arg: Box::new(arg),
                },
                span,
            ));
        }

        // Prefix update
        if matches!(self.peek(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let op = if matches!(self.peek(), TokenKind::PlusPlus) {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            let start = self.advance().span;
            let arg = self.parse_unary()?;
            let span = start.merge(arg.span);
            return Ok(Expr::new(
                ExprKind::Update {
                    op,
                    prefix: true,
                    arg: Box::new(arg),
                },
                span,
            ));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_call_chain()?;

        // Restricted production: no newline before postfix ++/--.
        if matches!(self.peek(), TokenKind::PlusPlus | TokenKind::MinusMinus)
            && !self.current.had_newline_before
        {
            let op = if matches!(self.peek(), TokenKind::PlusPlus) {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            let end = self.advance().span;
            let span = expr.span.merge(end);
            return Ok(Expr::new(
                ExprKind::Update {
                    op,
                    prefix: false,
                    arg: Box::new(expr),
                },
                span,
            ));
        }

        Ok(expr)
    }

    /// Parse member access and call chains: `a.b[c](d).e(f)` and `new`.
    fn parse_call_chain(&mut self) -> Result<Expr, ParseError> {
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new_expr()?
        } else {
            self.parse_primary()?
        };

        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let prop = self.expect_ident_or_keyword_name()?;
                    let span = expr.span.merge(prop.1);
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property: MemberProp::Ident(prop.0),
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let end = self.expect(&TokenKind::RBracket)?.span;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property: MemberProp::Computed(Box::new(index)),
                        },
                        span,
                    );
                }
                TokenKind::LParen => {
                    let (args, end) = self.parse_args()?;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse a `new` expression. `new a.b(c)` binds the argument list to the
    /// constructor, and `new new a()()` nests.
    fn parse_new_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(&TokenKind::New)?.span;
        let mut callee = if self.check(&TokenKind::New) {
            self.parse_new_expr()?
        } else {
            self.parse_primary()?
        };

        // Member accesses bind to the callee before the argument list.
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let prop = self.expect_ident_or_keyword_name()?;
                    let span = callee.span.merge(prop.1);
                    callee = Expr::new(
                        ExprKind::Member {
                            object: Box::new(callee),
                            property: MemberProp::Ident(prop.0),
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let end = self.expect(&TokenKind::RBracket)?.span;
                    let span = callee.span.merge(end);
                    callee = Expr::new(
                        ExprKind::Member {
                            object: Box::new(callee),
                            property: MemberProp::Computed(Box::new(index)),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        let (args, end) = if self.check(&TokenKind::LParen) {
            self.parse_args()?
        } else {
            (Vec::new(), callee.span)
        };
        let span = start.merge(end);
        Ok(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    fn parse_args(&mut self) -> Result<(Vec<Expr>, Span), ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_assignment()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.expect(&TokenKind::RParen)?.span;
        Ok((args, end))
    }

    /// Property names after `.` may be keywords (`a.delete`, `a.in`).
    fn expect_ident_or_keyword_name(&mut self) -> Result<(String, Span), ParseError> {
        let token = self.advance();
        let name = match &token.kind {
            TokenKind::Identifier(name) => name.clone(),
            kind if keyword_text(kind).is_some() => keyword_text(kind).unwrap_or("").to_string(),
            other => {
                return Err(ParseError::new(
                    format!("Expected property name, got {:?}", other),
                    token.span,
                ))
            }
        };
        Ok((name, token.span))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.current.span;
        match self.peek() {
            TokenKind::Number(value) => {
                let value = *value;
                self.advance();
                Ok(Expr::new(ExprKind::Number(value), span))
            }
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(Expr::new(ExprKind::Str(value), span))
            }
            TokenKind::TemplateNoSub(value) => {
                let value = value.clone();
                self.advance();
                Ok(Expr::new(ExprKind::Template(value), span))
            }
            TokenKind::Regex { pattern, flags } => {
                let pattern = pattern.clone();
                let flags = flags.clone();
                self.advance();
                Ok(Expr::new(ExprKind::Regex { pattern, flags }, span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), span))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::new(ExprKind::Null, span))
            }
            TokenKind::This => {
                self.advance();
                Ok(Expr::new(ExprKind::This, span))
            }
            TokenKind::Identifier(_) => {
                let ident = self.expect_ident()?;
                let span = ident.span;
                Ok(Expr::new(ExprKind::Ident(ident), span))
            }
            TokenKind::LParen => {
                self.advance();
                let saved = self.allow_in;
                self.allow_in = true;
                let expr = self.parse_expr();
                self.allow_in = saved;
                let expr = expr?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::Function => {
                let func = self.parse_function(false)?;
                let span = func.span;
                Ok(Expr::new(ExprKind::Function(Box::new(func)), span))
            }
            other => Err(ParseError::new(
                format!("Unexpected token {:?}", other),
                span,
            )),
        }
    }

    fn parse_array(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(&TokenKind::LBracket)?.span;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            if self.check(&TokenKind::Comma) {
                // Elision: `[, , x]`
                self.advance();
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_assignment()?));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.expect(&TokenKind::RBracket)?.span;
        Ok(Expr::new(ExprKind::Array(elements), start.merge(end)))
    }

    fn parse_object(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(&TokenKind::LBrace)?.span;
        let mut props = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            props.push(self.parse_property()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok(Expr::new(ExprKind::Object(props), start.merge(end)))
    }

    fn parse_property(&mut self) -> Result<Property, ParseError> {
        let start = self.current.span;

        // `get name() {}` / `set name(v) {}` accessors. `get`/`set` followed
        // by `:`, `,`, `(` or `}` is an ordinary key of that name.
        if let TokenKind::Identifier(name) = self.peek() {
            let accessor = match name.as_str() {
                "get" => Some(PropertyKind::Get),
                "set" => Some(PropertyKind::Set),
                _ => None,
            };
            if let Some(kind) = accessor {
                if !matches!(
                    self.lexer.peek().kind,
                    TokenKind::Colon
                        | TokenKind::Comma
                        | TokenKind::LParen
                        | TokenKind::RBrace
                ) {
                    self.advance(); // get/set
                    let key = self.parse_property_key()?;
                    let params = self.parse_params()?;
                    self.expect(&TokenKind::LBrace)?;
                    let body = self.parse_stmt_list_until_rbrace()?;
                    let end = self.expect(&TokenKind::RBrace)?.span;
                    let span = start.merge(end);
                    let func = Function {
                        name: None,
                        params,
                        body,
                        span,
                    };
                    return Ok(Property {
                        key,
                        value: Expr::new(ExprKind::Function(Box::new(func)), span),
                        kind,
                        shorthand: false,
                        span,
                    });
                }
            }
        }

        let key = self.parse_property_key()?;

        // Shorthand: `{a}` — the value is an identifier occurrence of the key.
        if matches!(self.peek(), TokenKind::Comma | TokenKind::RBrace) {
            if let PropertyKey::Ident(name) = &key {
                let ident = Ident::new(name.clone(), start);
                return Ok(Property {
                    value: Expr::new(ExprKind::Ident(ident), start),
                    key,
                    kind: PropertyKind::Init,
                    shorthand: true,
                    span: start,
                });
            }
            return Err(ParseError::new(
                "Expected ':' after property key",
                self.current.span,
            ));
        }

        // Concise method: `{a() {}}` — normalized to a function-valued entry.
        if self.check(&TokenKind::LParen) {
            let params = self.parse_params()?;
            self.expect(&TokenKind::LBrace)?;
            let body = self.parse_stmt_list_until_rbrace()?;
            let end = self.expect(&TokenKind::RBrace)?.span;
            let span = start.merge(end);
            let func = Function {
                name: None,
                params,
                body,
                span,
            };
            return Ok(Property {
                key,
                value: Expr::new(ExprKind::Function(Box::new(func)), span),
                kind: PropertyKind::Init,
                shorthand: false,
                span,
            });
        }

        self.expect(&TokenKind::Colon)?;
        let value = self.parse_assignment()?;
        let span = start.merge(value.span);
        Ok(Property {
            key,
            value,
            kind: PropertyKind::Init,
            shorthand: false,
            span,
        })
    }

    fn parse_property_key(&mut self) -> Result<PropertyKey, ParseError> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(PropertyKey::Ident(name))
            }
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(PropertyKey::Str(value))
            }
            TokenKind::Number(value) => {
                let value = *value;
                self.advance();
                Ok(PropertyKey::Number(value))
            }
            TokenKind::LBracket => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.expect(&TokenKind::RBracket)?;
                Ok(PropertyKey::Computed(Box::new(expr)))
            }
            kind if keyword_text(kind).is_some() => {
                let name = keyword_text(kind).unwrap_or("").to_string();
                self.advance();
                Ok(PropertyKey::Ident(name))
            }
            other => Err(ParseError::new(
                format!("Expected property key, got {:?}", other),
                self.current.span,
            )),
        }
    }
}

/// Source text for keyword tokens (used where keywords act as plain names).
fn keyword_text(kind: &TokenKind) -> Option<&'static str> {
    Some(match kind {
        TokenKind::Var => "var",
        TokenKind::Let => "let",
        TokenKind::Const => "const",
        TokenKind::Function => "function",
        TokenKind::If => "if",
        TokenKind::Else => "else",
        TokenKind::Switch => "switch",
        TokenKind::Case => "case",
        TokenKind::Default => "default",
        TokenKind::For => "for",
        TokenKind::While => "while",
        TokenKind::Do => "do",
        TokenKind::Break => "break",
        TokenKind::Continue => "continue",
        TokenKind::Return => "return",
        TokenKind::Try => "try",
        TokenKind::Catch => "catch",
        TokenKind::Finally => "finally",
        TokenKind::Throw => "throw",
        TokenKind::New => "new",
        TokenKind::Delete => "delete",
        TokenKind::Typeof => "typeof",
        TokenKind::Void => "void",
        TokenKind::In => "in",
        TokenKind::Instanceof => "instanceof",
        TokenKind::This => "this",
        TokenKind::Null => "null",
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::With => "with",
        TokenKind::Debugger => "debugger",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Ast {
        match Parser::new(source).parse() {
            Ok(ast) => ast,
            Err(err) => panic!("parse failed for {source:?}: {err}"),
        }
    }

    #[test]
    fn test_var_decl() {
        let ast = parse("var a = 1, b;");
        assert_eq!(ast.stmts.len(), 1);
        match &ast.stmts[0].kind {
            StmtKind::Var { kind, decls } => {
                assert_eq!(*kind, VarKind::Var);
                assert_eq!(decls.len(), 2);
                assert_eq!(decls[0].name.name, "a");
                assert!(decls[0].init.is_some());
                assert_eq!(decls[1].name.name, "b");
                assert!(decls[1].init.is_none());
            }
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn test_function_decl_and_call() {
        let ast = parse("function f(a, b) { return a + b; } f(1, 2);");
        assert_eq!(ast.stmts.len(), 2);
        match &ast.stmts[0].kind {
            StmtKind::Function(func) => {
                assert_eq!(func.name.as_ref().map(|n| n.name.as_str()), Some("f"));
                assert_eq!(func.params.len(), 2);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_member_vs_computed() {
        let ast = parse("a.b[c];");
        match &ast.stmts[0].kind {
            StmtKind::Expr(expr) => match &expr.kind {
                ExprKind::Member { object, property } => {
                    assert!(matches!(property, MemberProp::Computed(_)));
                    assert!(matches!(
                        object.kind,
                        ExprKind::Member {
                            property: MemberProp::Ident(_),
                            ..
                        }
                    ));
                }
                other => panic!("expected member, got {other:?}"),
            },
            other => panic!("expected expr stmt, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        let ast = parse("x = 1 + 2 * 3;");
        match &ast.stmts[0].kind {
            StmtKind::Expr(expr) => match &expr.kind {
                ExprKind::Assign { right, .. } => match &right.kind {
                    ExprKind::Binary { op, right, .. } => {
                        assert_eq!(*op, BinaryOp::Add);
                        assert!(matches!(
                            right.kind,
                            ExprKind::Binary {
                                op: BinaryOp::Mul,
                                ..
                            }
                        ));
                    }
                    other => panic!("expected binary, got {other:?}"),
                },
                other => panic!("expected assign, got {other:?}"),
            },
            other => panic!("expected expr stmt, got {other:?}"),
        }
    }

    #[test]
    fn test_arrow_functions() {
        let ast = parse("var f = x => x * 2; var g = (a, b) => { return a; };");
        match &ast.stmts[0].kind {
            StmtKind::Var { decls, .. } => {
                let init = decls[0].init.as_ref().unwrap();
                match &init.kind {
                    ExprKind::Arrow(arrow) => {
                        assert_eq!(arrow.params.len(), 1);
                        assert!(matches!(arrow.body, ArrowBody::Expr(_)));
                    }
                    other => panic!("expected arrow, got {other:?}"),
                }
            }
            other => panic!("expected var, got {other:?}"),
        }
        match &ast.stmts[1].kind {
            StmtKind::Var { decls, .. } => {
                let init = decls[0].init.as_ref().unwrap();
                match &init.kind {
                    ExprKind::Arrow(arrow) => {
                        assert_eq!(arrow.params.len(), 2);
                        assert!(matches!(arrow.body, ArrowBody::Block(_)));
                    }
                    other => panic!("expected arrow, got {other:?}"),
                }
            }
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn test_parenthesized_expr_not_arrow() {
        let ast = parse("(a + b) * c;");
        match &ast.stmts[0].kind {
            StmtKind::Expr(expr) => assert!(matches!(
                expr.kind,
                ExprKind::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            )),
            other => panic!("expected expr, got {other:?}"),
        }
    }

    #[test]
    fn test_for_variants() {
        let ast = parse("for (var i = 0; i < n; i++) {} for (var k in o) {} for (var v of xs) {}");
        assert!(matches!(ast.stmts[0].kind, StmtKind::For { .. }));
        assert!(matches!(ast.stmts[1].kind, StmtKind::ForIn { .. }));
        assert!(matches!(ast.stmts[2].kind, StmtKind::ForOf { .. }));
    }

    #[test]
    fn test_in_operator_allowed_outside_for_head() {
        let ast = parse("if ('x' in o) {}");
        match &ast.stmts[0].kind {
            StmtKind::If { test, .. } => assert!(matches!(
                test.kind,
                ExprKind::Binary {
                    op: BinaryOp::In,
                    ..
                }
            )),
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_try_catch_optional_param() {
        let ast = parse("try { f(); } catch (e) { g(e); } finally { h(); } try { f(); } catch {}");
        match &ast.stmts[0].kind {
            StmtKind::Try {
                handler, finalizer, ..
            } => {
                assert!(handler.as_ref().and_then(|h| h.param.as_ref()).is_some());
                assert!(finalizer.is_some());
            }
            other => panic!("expected try, got {other:?}"),
        }
        match &ast.stmts[1].kind {
            StmtKind::Try { handler, .. } => {
                assert!(handler.as_ref().map(|h| h.param.is_none()).unwrap_or(false));
            }
            other => panic!("expected try, got {other:?}"),
        }
    }

    #[test]
    fn test_object_literal_forms() {
        let ast = parse("var o = { a: 1, 'b': 2, 3: x, c, d() { return 1; }, get e() { return 2; } };");
        match &ast.stmts[0].kind {
            StmtKind::Var { decls, .. } => {
                let init = decls[0].init.as_ref().unwrap();
                match &init.kind {
                    ExprKind::Object(props) => {
                        assert_eq!(props.len(), 6);
                        assert!(props[3].shorthand);
                        assert!(matches!(props[4].kind, PropertyKind::Init));
                        assert!(matches!(props[5].kind, PropertyKind::Get));
                    }
                    other => panic!("expected object, got {other:?}"),
                }
            }
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn test_asi_return() {
        // `return \n x` returns undefined; x becomes its own statement.
        let ast = parse("function f() { return\nx; }");
        match &ast.stmts[0].kind {
            StmtKind::Function(func) => {
                assert_eq!(func.body.len(), 2);
                assert!(matches!(func.body[0].kind, StmtKind::Return { arg: None }));
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_labeled_break() {
        let ast = parse("outer: for (;;) { break outer; }");
        match &ast.stmts[0].kind {
            StmtKind::Labeled { label, .. } => assert_eq!(label, "outer"),
            other => panic!("expected labeled, got {other:?}"),
        }
    }

    #[test]
    fn test_new_expressions() {
        let ast = parse("var a = new Foo(1); var b = new Bar; var c = new ns.Baz(2);");
        for stmt in &ast.stmts {
            match &stmt.kind {
                StmtKind::Var { decls, .. } => {
                    let init = decls[0].init.as_ref().unwrap();
                    assert!(matches!(init.kind, ExprKind::New { .. }));
                }
                other => panic!("expected var, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_keyword_property_names() {
        parse("a.delete(); a.new = 1; var o = { in: 1, for: 2 };");
    }

    #[test]
    fn test_use_strict_directive() {
        assert!(parse("'use strict'; var a;").has_use_strict_directive());
        assert!(!parse("var a; 'use strict';").has_use_strict_directive());
        assert!(!parse("f(); 'use strict';").has_use_strict_directive());
    }

    #[test]
    fn test_minified_input() {
        // Typical minifier output: single line, no spaces
        parse("var t=function(n){return n&&n.__esModule?n:{default:n}};for(var e=0;e<10;e++)t(e);");
    }

    #[test]
    fn test_conditional_and_sequence() {
        let ast = parse("a ? b : c, d;");
        match &ast.stmts[0].kind {
            StmtKind::Expr(expr) => assert!(matches!(expr.kind, ExprKind::Sequence(_))),
            other => panic!("expected expr, got {other:?}"),
        }
    }
}
