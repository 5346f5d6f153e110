// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Recursive-descent parser.
//!
//! Operator precedence, loosest first: `||`, `&&`, equality, comparison,
//! additive, multiplicative, unary, postfix (call and index).

use std::collections::HashSet;

use super::ast::{BinaryOp, Block, Expr, Function, Module, Stmt, StmtKind, UnaryOp};
use super::token::{tokenize, Span, Token, TokenKind};
use super::ParseError;

/// Deepest nesting of blocks and sub-expressions a source may use.
pub const MAX_NESTING: usize = 128;

/// Parse a whole plugin source unit.
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    let mut parser = Parser::new(tokenize(source)?);
    let mut functions = Vec::new();
    let mut seen = HashSet::new();
    while !parser.at(&TokenKind::Eof) {
        let function = parser.function()?;
        if !seen.insert(function.name.clone()) {
            return Err(ParseError::new(
                format!("duplicate function '{}'", function.name),
                function.span.start,
            ));
        }
        functions.push(function);
    }
    Ok(Module { functions })
}

/// Parse a standalone expression such as a task requirement.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(tokenize(source)?);
    let expr = parser.expr()?;
    parser.expect(&TokenKind::Eof)?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(
                format!("nesting deeper than {} levels", MAX_NESTING),
                self.peek().span.start,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> &Token {
        // tokenize always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &TokenKind {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Span, ParseError> {
        if self.at(kind) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    fn ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unexpected(&self, wanted: &str) -> ParseError {
        let token = self.peek();
        ParseError::new(
            format!("expected {}, found {}", wanted, token.kind.describe()),
            token.span.start,
        )
    }

    fn function(&mut self) -> Result<Function, ParseError> {
        let start = self.expect(&TokenKind::Fn)?;
        let (name, _) = self.ident()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let (param, span) = self.ident()?;
                if params.contains(&param) {
                    return Err(ParseError::new(
                        format!("duplicate parameter '{}'", param),
                        span.start,
                    ));
                }
                params.push(param);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.block()?;
        let span = start.to(body.span);
        Ok(Function {
            name,
            params,
            body,
            span,
        })
    }

    fn block(&mut self) -> Result<Block, ParseError> {
        self.nested(Self::block_inner)
    }

    fn block_inner(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected("'}'"));
            }
            stmts.push(self.stmt()?);
        }
        let close = self.expect(&TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: open.to(close),
        })
    }

    fn stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().span;
        match self.peek().kind.clone() {
            TokenKind::Let => {
                self.advance();
                let (name, _) = self.ident()?;
                self.expect(&TokenKind::Assign)?;
                let value = self.expr()?;
                let end = self.expect(&TokenKind::Semi)?;
                Ok(Stmt {
                    kind: StmtKind::Let { name, value },
                    span: start.to(end),
                })
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.at(&TokenKind::Semi) {
                    None
                } else {
                    Some(self.expr()?)
                };
                let end = self.expect(&TokenKind::Semi)?;
                Ok(Stmt {
                    kind: StmtKind::Return(value),
                    span: start.to(end),
                })
            }
            TokenKind::If => self.if_stmt(),
            TokenKind::For => {
                self.advance();
                let (var, _) = self.ident()?;
                self.expect(&TokenKind::In)?;
                let iter = self.expr()?;
                let body = self.block()?;
                let span = start.to(body.span);
                Ok(Stmt {
                    kind: StmtKind::For { var, iter, body },
                    span,
                })
            }
            TokenKind::While => {
                self.advance();
                let cond = self.expr()?;
                let body = self.block()?;
                let span = start.to(body.span);
                Ok(Stmt {
                    kind: StmtKind::While { cond, body },
                    span,
                })
            }
            TokenKind::Ident(name) if self.peek_next() == &TokenKind::Assign => {
                self.advance();
                self.advance();
                let value = self.expr()?;
                let end = self.expect(&TokenKind::Semi)?;
                Ok(Stmt {
                    kind: StmtKind::Assign { name, value },
                    span: start.to(end),
                })
            }
            _ => {
                let expr = self.expr()?;
                let end = self.expect(&TokenKind::Semi)?;
                Ok(Stmt {
                    kind: StmtKind::Expr(expr),
                    span: start.to(end),
                })
            }
        }
    }

    fn if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::If)?;
        let cond = self.expr()?;
        let then = self.block()?;
        let mut end = then.span;
        let otherwise = if self.eat(&TokenKind::Else) {
            if self.at(&TokenKind::If) {
                let nested = self.nested(Self::if_stmt)?;
                end = nested.span;
                Some(Block {
                    span: nested.span,
                    stmts: vec![nested],
                })
            } else {
                let block = self.block()?;
                end = block.span;
                Some(block)
            }
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If {
                cond,
                then,
                otherwise,
            },
            span: start.to(end),
        })
    }

    pub(crate) fn expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(|p| p.binary(0))
    }

    fn binary(&mut self, level: usize) -> Result<Expr, ParseError> {
        const LEVELS: usize = 6;
        if level == LEVELS {
            return self.unary();
        }
        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = binary_op(&self.peek().kind, level) {
            self.advance();
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.advance();
        let expr = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        while self.eat(&TokenKind::LBracket) {
            let index = self.expr()?;
            self.expect(&TokenKind::RBracket)?;
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Int(v) => Ok(Expr::Int(v)),
            TokenKind::Float(v) => Ok(Expr::Float(v)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::None => Ok(Expr::None),
            TokenKind::LParen => {
                let expr = self.expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                let items = self.list(&TokenKind::RBracket)?;
                Ok(Expr::List(items))
            }
            TokenKind::Ident(name) => {
                if self.eat(&TokenKind::LParen) {
                    let args = self.list(&TokenKind::RParen)?;
                    Ok(Expr::Call { callee: name, args })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            other => Err(ParseError::new(
                format!("expected expression, found {}", other.describe()),
                token.span.start,
            )),
        }
    }

    /// Comma-separated expressions up to and including `close`. Trailing
    /// commas are accepted.
    fn list(&mut self, close: &TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.at(close) {
            items.push(self.expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }
}

fn binary_op(kind: &TokenKind, level: usize) -> Option<BinaryOp> {
    let op = match (level, kind) {
        (0, TokenKind::OrOr) => BinaryOp::Or,
        (1, TokenKind::AndAnd) => BinaryOp::And,
        (2, TokenKind::Eq) => BinaryOp::Eq,
        (2, TokenKind::Ne) => BinaryOp::Ne,
        (3, TokenKind::Lt) => BinaryOp::Lt,
        (3, TokenKind::Le) => BinaryOp::Le,
        (3, TokenKind::Gt) => BinaryOp::Gt,
        (3, TokenKind::Ge) => BinaryOp::Ge,
        (4, TokenKind::Plus) => BinaryOp::Add,
        (4, TokenKind::Minus) => BinaryOp::Sub,
        (5, TokenKind::Star) => BinaryOp::Mul,
        (5, TokenKind::Slash) => BinaryOp::Div,
        (5, TokenKind::Percent) => BinaryOp::Rem,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "// sums values\nfn process(values) {\n    let total = 0;\n    for v in values {\n        total = total + v;\n    }\n    return total;\n}\n";

    #[test]
    fn test_parse_module_spans() {
        let module = parse_module(SAMPLE).unwrap();
        assert_eq!(module.functions.len(), 1);
        let f = &module.functions[0];
        assert_eq!(f.name, "process");
        assert_eq!(f.params, vec!["values".to_string()]);
        assert_eq!(f.body.stmts.len(), 3);
        assert_eq!(&SAMPLE[f.body.span.start..f.body.span.start + 1], "{");
        assert_eq!(&SAMPLE[f.body.span.end - 1..f.body.span.end], "}");
        let first = &f.body.stmts[0];
        assert_eq!(&SAMPLE[first.span.start..first.span.end], "let total = 0;");
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("1 + 2 * 3 == 7 && !false").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::And,
                lhs,
                ..
            } => match *lhs {
                Expr::Binary {
                    op: BinaryOp::Eq,
                    lhs,
                    ..
                } => assert!(matches!(
                    *lhs,
                    Expr::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                )),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_else_if_chain() {
        let module =
            parse_module("fn f(x) { if x < 0 { return -1; } else if x == 0 { return 0; } else { return 1; } }")
                .unwrap();
        let stmt = &module.functions[0].body.stmts[0];
        match &stmt.kind {
            StmtKind::If {
                otherwise: Some(block),
                ..
            } => assert!(matches!(block.stmts[0].kind, StmtKind::If { .. })),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_requirement_expression() {
        let expr = parse_expression("process([1, 2, 3]) == 6").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Eq,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_semicolon_is_rejected() {
        let err = parse_module("fn f() { return 1 }").unwrap_err();
        assert!(err.message.contains("semi"));
    }

    #[test]
    fn test_duplicate_function_is_rejected() {
        assert!(parse_module("fn f() { } fn f() { }").is_err());
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let depth = 1000;
        let source = format!(
            "fn process(values) {{ return {}1{}; }}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let err = parse_module(&source).unwrap_err();
        assert!(err.message.contains("nesting"));

        let requirement = format!("{}process([]){} == 0", "(".repeat(8000), ")".repeat(8000));
        assert!(parse_expression(&requirement).unwrap_err().message.contains("nesting"));
    }

    #[test]
    fn test_deep_blocks_and_unary_chains_are_rejected() {
        let blocks = format!("fn f() {{ {}{} }}", "if true { ".repeat(500), "} ".repeat(500));
        assert!(parse_module(&blocks).unwrap_err().message.contains("nesting"));
        assert!(parse_expression(&format!("{}1", "-".repeat(5000))).is_err());
    }

    #[test]
    fn test_moderate_nesting_is_accepted() {
        let expr = format!("{}1{} == 1", "(".repeat(40), ")".repeat(40));
        assert!(parse_expression(&expr).is_ok());
    }

    #[test]
    fn test_unclosed_block() {
        assert!(parse_module("fn f() { return 1;").is_err());
    }

    #[test]
    fn test_trailing_tokens_in_expression() {
        assert!(parse_expression("1 + 2 3").is_err());
    }

    #[test]
    fn test_node_count_grows_with_body() {
        let small = parse_module("fn f(x) { return x; }").unwrap();
        let large = parse_module("fn f(x) { let y = x + 1; return y * 2; }").unwrap();
        assert!(large.node_count() > small.node_count());
    }
}
