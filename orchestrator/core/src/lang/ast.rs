// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Syntax tree for plugin source units.
//!
//! Every function, block and statement keeps the byte span it was parsed
//! from. Mutation patterns use those spans as legal insertion and
//! replacement points, so patches stay exact byte splices of the pre-image.

use serde::{Deserialize, Serialize};

use super::token::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Total syntax node count, used as a growth cap by the safety gate.
    pub fn node_count(&self) -> usize {
        self.functions
            .iter()
            .map(|f| 1 + f.params.len() + f.body.node_count())
            .sum()
    }

    pub fn summary(&self) -> Vec<FunctionSummary> {
        self.functions
            .iter()
            .map(|f| FunctionSummary {
                name: f.name.clone(),
                params: f.params.len(),
                statements: f.body.statement_count(),
                is_stub: f.body.stmts.is_empty(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSummary {
    pub name: String,
    pub params: usize,
    pub statements: usize,
    pub is_stub: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

impl Function {
    /// Byte offset just after the opening brace of the body.
    pub fn body_insertion_point(&self) -> usize {
        self.body.span.start + 1
    }

    /// Span strictly between the braces of the body.
    pub fn body_interior(&self) -> Span {
        Span::new(self.body.span.start + 1, self.body.span.end.saturating_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Includes both braces.
    pub span: Span,
}

impl Block {
    fn node_count(&self) -> usize {
        1 + self.stmts.iter().map(Stmt::node_count).sum::<usize>()
    }

    fn statement_count(&self) -> usize {
        self.stmts.iter().map(Stmt::statement_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let { name: String, value: Expr },
    Assign { name: String, value: Expr },
    Return(Option<Expr>),
    If {
        cond: Expr,
        then: Block,
        otherwise: Option<Block>,
    },
    For { var: String, iter: Expr, body: Block },
    While { cond: Expr, body: Block },
    Expr(Expr),
}

impl Stmt {
    fn node_count(&self) -> usize {
        1 + match &self.kind {
            StmtKind::Let { value, .. } | StmtKind::Assign { value, .. } => value.node_count(),
            StmtKind::Return(value) => value.as_ref().map(Expr::node_count).unwrap_or(0),
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                cond.node_count()
                    + then.node_count()
                    + otherwise.as_ref().map(Block::node_count).unwrap_or(0)
            }
            StmtKind::For { iter, body, .. } => iter.node_count() + body.node_count(),
            StmtKind::While { cond, body } => cond.node_count() + body.node_count(),
            StmtKind::Expr(expr) => expr.node_count(),
        }
    }

    fn statement_count(&self) -> usize {
        1 + match &self.kind {
            StmtKind::If {
                then, otherwise, ..
            } => then.statement_count() + otherwise.as_ref().map(Block::statement_count).unwrap_or(0),
            StmtKind::For { body, .. } | StmtKind::While { body, .. } => body.statement_count(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Expr>),
    Var(String),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
}

impl Expr {
    pub fn node_count(&self) -> usize {
        1 + match self {
            Expr::List(items) => items.iter().map(Expr::node_count).sum(),
            Expr::Unary { expr, .. } => expr.node_count(),
            Expr::Binary { lhs, rhs, .. } => lhs.node_count() + rhs.node_count(),
            Expr::Call { args, .. } => args.iter().map(Expr::node_count).sum(),
            Expr::Index { target, index } => target.node_count() + index.node_count(),
            _ => 0,
        }
    }
}
