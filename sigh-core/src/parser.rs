//! Recursive-descent parser for Sigh.

use crate::ast::{
    BinaryOp, Expr, ExprKind, FieldDecl, FunDecl, Ident, Param, Program, SizedArrayDecl,
    Stmt, StmtKind, StructDecl, TypeExpr, TypeExprKind, UnaryOp, VarDecl,
};
use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::lexer::{Token, TokenKind, lex, unescape};
use crate::span::Span;

type ParseResult<T> = Result<T, Diagnostic>;

/// Upper bound on the element count of a sized array declaration.
pub const MAX_ARRAY_ELEMENTS: usize = 1 << 24;

/// Lex and parse a whole program.
pub fn parse(source: &str) -> Result<Program, CoreError> {
    let lexed = lex(source);
    if !lexed.diagnostics.is_empty() {
        return Err(CoreError::LexErrors(lexed.diagnostics));
    }
    let mut parser = Parser::new(source, &lexed.tokens);
    let program = parser.program().map_err(CoreError::ParseError)?;
    log::debug!("parsed {} top-level statement(s)", program.statements.len());
    Ok(program)
}

/// Parse a single expression, e.g. for tests or tooling.
pub fn parse_expression(source: &str) -> Result<Expr, CoreError> {
    let lexed = lex(source);
    if !lexed.diagnostics.is_empty() {
        return Err(CoreError::LexErrors(lexed.diagnostics));
    }
    let mut parser = Parser::new(source, &lexed.tokens);
    let expr = parser.expression().map_err(CoreError::ParseError)?;
    parser.expect(TokenKind::Eof).map_err(CoreError::ParseError)?;
    Ok(expr)
}

struct Parser<'src> {
    source: &'src str,
    tokens: &'src [Token],
    position: usize,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, tokens: &'src [Token]) -> Self {
        Parser {
            source,
            tokens,
            position: 0,
        }
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    fn peek(&self) -> &'src Token {
        // The lexer always terminates the stream with Eof.
        let index = self.position.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        self.tokens[index].kind
    }

    fn advance(&mut self) -> &'src Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<&'src Token> {
        if self.peek_kind() == kind {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<&'src Token> {
        match self.eat(kind) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(kind.describe())),
        }
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Ident => format!("identifier '{}'", token.text(self.source)),
            kind => kind.describe().to_string(),
        };
        Diagnostic::error(format!("expected {expected}, found {found}"), token.span)
            .with_code("E0100")
    }

    fn ident(&mut self) -> ParseResult<Ident> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident {
            name: token.text(self.source).to_string(),
            span: token.span,
        })
    }

    fn previous_end(&self) -> u32 {
        match self.position.checked_sub(1) {
            Some(index) => self.tokens[index].span.end,
            None => 0,
        }
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.previous_end().max(start))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn program(&mut self) -> ParseResult<Program> {
        let start = self.peek().span.start;
        let mut statements = vec![self.statement()?];
        while self.peek_kind() != TokenKind::Eof {
            statements.push(self.statement()?);
        }
        Ok(Program {
            statements,
            span: self.span_from(start),
        })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span.start;
        let kind = match self.peek_kind() {
            TokenKind::LBrace => StmtKind::Block(self.block()?.0),
            TokenKind::Var => self.var_decl()?,
            TokenKind::Fun => StmtKind::Fun(self.fun_decl()?),
            TokenKind::Struct => StmtKind::Struct(self.struct_decl()?),
            TokenKind::If => self.if_stmt()?,
            TokenKind::While => self.while_stmt()?,
            TokenKind::Return => self.return_stmt()?,
            kind if can_start_expression(kind) => StmtKind::Expr(self.expression()?),
            _ => return Err(self.unexpected("statement")),
        };
        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    fn block(&mut self) -> ParseResult<(Vec<Stmt>, Span)> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            statements.push(self.statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok((statements, self.span_from(open.span.start)))
    }

    fn var_decl(&mut self) -> ParseResult<StmtKind> {
        self.expect(TokenKind::Var)?;
        let name = self.ident()?;
        self.expect(TokenKind::Colon)?;

        let base = self.simple_type()?;
        let mut ty = base.clone();
        let mut dimensions = Vec::new();
        let mut unsized_dimensions = 0;
        while self.peek_kind() == TokenKind::LBracket {
            self.advance();
            if let Some(size) = self.eat(TokenKind::IntLiteral) {
                let text = size.text(self.source);
                let length = text.parse::<usize>().map_err(|_| {
                    Diagnostic::error(format!("array size out of range: {text}"), size.span)
                        .with_code("E0101")
                })?;
                dimensions.push(length);
            } else {
                unsized_dimensions += 1;
            }
            self.expect(TokenKind::RBracket)?;
            ty = TypeExpr {
                span: self.span_from(base.span.start),
                kind: TypeExprKind::Array(Box::new(ty)),
            };
        }

        if dimensions.is_empty() {
            self.expect(TokenKind::Equal)?;
            let initializer = self.expression()?;
            return Ok(StmtKind::Var(VarDecl {
                name,
                ty,
                initializer,
            }));
        }

        if unsized_dimensions > 0 {
            return Err(Diagnostic::error(
                "cannot mix sized and unsized array dimensions",
                ty.span,
            )
            .with_code("E0100"));
        }
        let elements = dimensions
            .iter()
            .try_fold(1usize, |total, length| total.checked_mul(*length))
            .filter(|total| *total <= MAX_ARRAY_ELEMENTS);
        if elements.is_none() {
            return Err(Diagnostic::error(
                format!("array size out of range: more than {MAX_ARRAY_ELEMENTS} elements"),
                ty.span,
            )
            .with_code("E0101"));
        }
        if self.peek_kind() == TokenKind::Equal {
            return Err(Diagnostic::error(
                "a sized array declaration cannot have an initializer",
                self.peek().span,
            )
            .with_code("E0100"));
        }
        Ok(StmtKind::SizedArray(SizedArrayDecl {
            name,
            element: base,
            dimensions,
        }))
    }

    fn fun_decl(&mut self) -> ParseResult<FunDecl> {
        self.expect(TokenKind::Fun)?;
        let name = self.ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.peek_kind() != TokenKind::RParen {
            loop {
                let param_name = self.ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.type_expr()?;
                params.push(Param {
                    name: param_name,
                    ty,
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let return_type = if self.eat(TokenKind::Colon).is_some() {
            Some(self.type_expr()?)
        } else {
            None
        };
        let (body, body_span) = self.block()?;
        Ok(FunDecl {
            name,
            params,
            return_type,
            body,
            body_span,
        })
    }

    fn struct_decl(&mut self) -> ParseResult<StructDecl> {
        self.expect(TokenKind::Struct)?;
        let name = self.ident()?;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Var => {
                    self.advance();
                    let field_name = self.ident()?;
                    self.expect(TokenKind::Colon)?;
                    let ty = self.type_expr()?;
                    fields.push(FieldDecl {
                        name: field_name,
                        ty,
                    });
                }
                TokenKind::Fun => methods.push(self.fun_decl()?),
                TokenKind::RBrace => break,
                _ => return Err(self.unexpected("field or method declaration")),
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(StructDecl {
            name,
            fields,
            methods,
        })
    }

    fn if_stmt(&mut self) -> ParseResult<StmtKind> {
        self.expect(TokenKind::If)?;
        let condition = self.expression()?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_stmt(&mut self) -> ParseResult<StmtKind> {
        self.expect(TokenKind::While)?;
        let condition = self.expression()?;
        let body = Box::new(self.statement()?);
        Ok(StmtKind::While { condition, body })
    }

    fn return_stmt(&mut self) -> ParseResult<StmtKind> {
        self.expect(TokenKind::Return)?;
        let value = if can_start_expression(self.peek_kind()) {
            Some(self.expression()?)
        } else {
            None
        };
        Ok(StmtKind::Return(value))
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn simple_type(&mut self) -> ParseResult<TypeExpr> {
        let name = self.ident()?;
        Ok(TypeExpr {
            kind: TypeExprKind::Simple(name.name),
            span: name.span,
        })
    }

    fn type_expr(&mut self) -> ParseResult<TypeExpr> {
        let mut ty = self.simple_type()?;
        let start = ty.span.start;
        while self.peek_kind() == TokenKind::LBracket {
            self.advance();
            self.expect(TokenKind::RBracket)?;
            ty = TypeExpr {
                kind: TypeExprKind::Array(Box::new(ty)),
                span: self.span_from(start),
            };
        }
        Ok(ty)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expression(&mut self) -> ParseResult<Expr> {
        let target = self.or_expr()?;
        if self.eat(TokenKind::Equal).is_none() {
            return Ok(target);
        }
        // right-associative
        let value = self.expression()?;
        let span = target.span.merge(value.span);
        Ok(Expr {
            kind: ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        })
    }

    fn or_expr(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::and_expr, |kind| match kind {
            TokenKind::BarBar => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn and_expr(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::order_expr, |kind| match kind {
            TokenKind::AmpAmp => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn order_expr(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::add_expr, |kind| match kind {
            TokenKind::EqualEqual => Some(BinaryOp::Equality),
            TokenKind::BangEqual => Some(BinaryOp::NotEquals),
            TokenKind::LessEqual => Some(BinaryOp::LowerEqual),
            TokenKind::GreaterEqual => Some(BinaryOp::GreaterEqual),
            TokenKind::Less => Some(BinaryOp::Lower),
            TokenKind::Greater => Some(BinaryOp::Greater),
            _ => None,
        })
    }

    fn add_expr(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::mult_expr, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Subtract),
            _ => None,
        })
    }

    fn mult_expr(&mut self) -> ParseResult<Expr> {
        self.left_assoc(Self::prefix_expr, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Multiply),
            TokenKind::Slash => Some(BinaryOp::Divide),
            TokenKind::Percent => Some(BinaryOp::Remainder),
            TokenKind::At => Some(BinaryOp::DotProduct),
            _ => None,
        })
    }

    fn left_assoc(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expr>,
        operator: fn(TokenKind) -> Option<BinaryOp>,
    ) -> ParseResult<Expr> {
        let mut left = operand(self)?;
        while let Some(op) = operator(self.peek_kind()) {
            self.advance();
            let right = operand(self)?;
            let span = left.span.merge(right.span);
            left = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            };
        }
        Ok(left)
    }

    fn prefix_expr(&mut self) -> ParseResult<Expr> {
        if let Some(bang) = self.eat(TokenKind::Bang) {
            let operand = self.prefix_expr()?;
            let span = bang.span.merge(operand.span);
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            });
        }
        self.suffix_expr()
    }

    fn suffix_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.basic_expr()?;
        loop {
            let start = expr.span.start;
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.ident()?;
                    expr = Expr {
                        kind: ExprKind::Field {
                            stem: Box::new(expr),
                            name,
                        },
                        span: self.span_from(start),
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr {
                        kind: ExprKind::Index {
                            array: Box::new(expr),
                            index: Box::new(index),
                        },
                        span: self.span_from(start),
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.expressions(TokenKind::RParen)?;
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span: self.span_from(start),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma-separated expressions up to and including `close`.
    fn expressions(&mut self, close: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.eat(close).is_some() {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    fn basic_expr(&mut self) -> ParseResult<Expr> {
        let token = self.peek();
        let start = token.span.start;
        let kind = match token.kind {
            TokenKind::Dollar => {
                self.advance();
                ExprKind::Constructor(self.ident()?)
            }
            TokenKind::Ident => {
                self.advance();
                ExprKind::Reference(token.text(self.source).to_string())
            }
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                self.advance();
                self.number(token, false)?
            }
            TokenKind::Minus
                if matches!(
                    self.peek_kind_at(1),
                    TokenKind::IntLiteral | TokenKind::FloatLiteral
                ) =>
            {
                self.advance();
                let literal = self.advance();
                self.number(literal, true)?
            }
            TokenKind::StringLiteral => {
                self.advance();
                ExprKind::Str(unescape(token.text(self.source)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen)?;
                ExprKind::Paren(Box::new(inner))
            }
            TokenKind::LBracket => {
                self.advance();
                ExprKind::Array(self.expressions(TokenKind::RBracket)?)
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(Expr {
            kind,
            span: self.span_from(start),
        })
    }

    fn number(&self, token: &Token, negative: bool) -> ParseResult<ExprKind> {
        let digits = token.text(self.source);
        let text = if negative {
            format!("-{digits}")
        } else {
            digits.to_string()
        };
        if token.kind == TokenKind::FloatLiteral {
            return text
                .parse::<f64>()
                .map(ExprKind::Float)
                .map_err(|_| invalid_literal(&text, token.span));
        }
        text.parse::<i64>()
            .map(ExprKind::Int)
            .map_err(|_| invalid_literal(&text, token.span))
    }
}

fn invalid_literal(text: &str, span: Span) -> Diagnostic {
    Diagnostic::error(format!("integer literal out of range: {text}"), span).with_code("E0101")
}

fn can_start_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Dollar
            | TokenKind::Bang
            | TokenKind::Minus
    )
}
