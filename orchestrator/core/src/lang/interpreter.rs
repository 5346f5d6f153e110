// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fuel-bounded tree-walking evaluator.
//!
//! Every evaluated expression and executed statement consumes one unit of
//! fuel; builtins that produce or walk a list consume one unit per element.
//! Reading a variable copies its value and concatenation builds a new one,
//! so both are charged by the size of the value. Running dry yields
//! [`EvalError::FuelExhausted`], which the harness classifies as a timeout.
//! Values are immutable: `push` returns a new list.
//!
//! Division of two integers yields an integer when exact and a float
//! otherwise, so `sum(xs) / len(xs)` behaves like an arithmetic mean.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::ast::{BinaryOp, Block, Expr, Module, StmtKind, UnaryOp};
use super::value::Value;
use super::EvalError;

/// Largest value, by [`Value::weight`], a program may build.
pub const MAX_VALUE_WEIGHT: usize = 1 << 18;

/// Deepest expression nesting across all active calls.
pub const MAX_EVAL_NESTING: usize = 512;

pub const BUILTINS: &[&str] = &[
    "len", "sum", "min", "max", "abs", "reverse", "range", "push", "sorted",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub fuel: u64,
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            fuel: 100_000,
            max_depth: 64,
        }
    }
}

enum Flow {
    Normal,
    Return(Value),
}

type Frame = HashMap<String, Value>;

pub struct Interpreter<'m> {
    module: &'m Module,
    limits: Limits,
    fuel: u64,
    depth: usize,
    nesting: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module, limits: Limits) -> Self {
        Self {
            module,
            limits,
            fuel: limits.fuel,
            depth: 0,
            nesting: 0,
        }
    }

    pub fn fuel_used(&self) -> u64 {
        self.limits.fuel - self.fuel
    }

    /// Evaluate a free-standing expression (no local bindings) against the
    /// module's functions.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        let mut frame = Frame::new();
        self.eval(expr, &mut frame)
    }

    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let module = self.module;
        let Some(function) = module.function(name) else {
            return builtin(self, name, args);
        };
        if function.params.len() != args.len() {
            return Err(EvalError::ArityMismatch {
                name: name.to_string(),
                expected: function.params.len(),
                got: args.len(),
            });
        }
        if self.depth >= self.limits.max_depth {
            return Err(EvalError::RecursionLimit(self.limits.max_depth));
        }
        let mut frame: Frame = function.params.iter().cloned().zip(args).collect();
        self.depth += 1;
        let flow = self.block(&function.body, &mut frame);
        self.depth -= 1;
        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
        }
    }

    fn consume(&mut self, amount: u64) -> Result<(), EvalError> {
        if self.fuel < amount {
            self.fuel = 0;
            return Err(EvalError::FuelExhausted);
        }
        self.fuel -= amount;
        Ok(())
    }

    /// Charge for a freshly built or copied value.
    fn charge_size(&mut self, value: &Value) -> Result<(), EvalError> {
        let weight = value.weight();
        if weight > MAX_VALUE_WEIGHT {
            return Err(EvalError::ValueTooLarge(MAX_VALUE_WEIGHT));
        }
        self.consume(weight as u64)
    }

    fn block(&mut self, block: &Block, frame: &mut Frame) -> Result<Flow, EvalError> {
        for stmt in &block.stmts {
            self.consume(1)?;
            match &stmt.kind {
                StmtKind::Let { name, value } => {
                    let value = self.eval(value, frame)?;
                    frame.insert(name.clone(), value);
                }
                StmtKind::Assign { name, value } => {
                    let value = self.eval(value, frame)?;
                    match frame.get_mut(name) {
                        Some(slot) => *slot = value,
                        None => return Err(EvalError::UnknownName(name.clone())),
                    }
                }
                StmtKind::Return(value) => {
                    let value = match value {
                        Some(expr) => self.eval(expr, frame)?,
                        None => Value::None,
                    };
                    return Ok(Flow::Return(value));
                }
                StmtKind::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    let flow = if self.eval(cond, frame)?.is_truthy() {
                        self.block(then, frame)?
                    } else if let Some(otherwise) = otherwise {
                        self.block(otherwise, frame)?
                    } else {
                        Flow::Normal
                    };
                    if let Flow::Return(v) = flow {
                        return Ok(Flow::Return(v));
                    }
                }
                StmtKind::For { var, iter, body } => {
                    let items = match self.eval(iter, frame)? {
                        Value::List(items) => items,
                        other => {
                            return Err(EvalError::TypeMismatch(format!(
                                "cannot iterate over {}",
                                other.type_name()
                            )))
                        }
                    };
                    for item in items {
                        self.consume(1)?;
                        frame.insert(var.clone(), item);
                        if let Flow::Return(v) = self.block(body, frame)? {
                            return Ok(Flow::Return(v));
                        }
                    }
                }
                StmtKind::While { cond, body } => {
                    while self.eval(cond, frame)?.is_truthy() {
                        self.consume(1)?;
                        if let Flow::Return(v) = self.block(body, frame)? {
                            return Ok(Flow::Return(v));
                        }
                    }
                }
                StmtKind::Expr(expr) => {
                    self.eval(expr, frame)?;
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn eval(&mut self, expr: &Expr, frame: &mut Frame) -> Result<Value, EvalError> {
        if self.nesting >= MAX_EVAL_NESTING {
            return Err(EvalError::NestingLimit(MAX_EVAL_NESTING));
        }
        self.nesting += 1;
        let result = self.eval_inner(expr, frame);
        self.nesting -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &Expr, frame: &mut Frame) -> Result<Value, EvalError> {
        self.consume(1)?;
        match expr {
            Expr::Int(v) => Ok(Value::Int(*v)),
            Expr::Float(v) => Ok(Value::Float(*v)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item, frame))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Var(name) => {
                let value = frame
                    .get(name)
                    .ok_or_else(|| EvalError::UnknownName(name.clone()))?;
                if matches!(value, Value::Str(_) | Value::List(_)) {
                    self.charge_size(value)?;
                }
                Ok(value.clone())
            }
            Expr::Unary { op, expr } => {
                let value = self.eval(expr, frame)?;
                unary(*op, value)
            }
            Expr::Binary {
                op: BinaryOp::And,
                lhs,
                rhs,
            } => {
                let result = self.eval(lhs, frame)?.is_truthy() && self.eval(rhs, frame)?.is_truthy();
                Ok(Value::Bool(result))
            }
            Expr::Binary {
                op: BinaryOp::Or,
                lhs,
                rhs,
            } => {
                let result = self.eval(lhs, frame)?.is_truthy() || self.eval(rhs, frame)?.is_truthy();
                Ok(Value::Bool(result))
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs, frame)?;
                let rhs = self.eval(rhs, frame)?;
                let value = binary(*op, lhs, rhs)?;
                if matches!(value, Value::Str(_) | Value::List(_)) {
                    self.charge_size(&value)?;
                }
                Ok(value)
            }
            Expr::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, frame))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(callee, args)
            }
            Expr::Index { target, index } => {
                let target = self.eval(target, frame)?;
                let index = self.eval(index, frame)?;
                index_into(target, index)
            }
        }
    }
}

fn mismatch(op: &str, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "unsupported operands for {}: {} and {}",
        op,
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, other) => Err(EvalError::TypeMismatch(format!(
            "cannot negate {}",
            other.type_name()
        ))),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    use Value::{Float, Int, List, Str};
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(lhs.loosely_equals(&rhs))),
        BinaryOp::Ne => return Ok(Value::Bool(!lhs.loosely_equals(&rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&lhs, &rhs).ok_or_else(|| mismatch("comparison", &lhs, &rhs))?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    match (op, lhs, rhs) {
        (BinaryOp::Add, Str(a), Str(b)) => Ok(Str(a + &b)),
        (BinaryOp::Add, List(mut a), List(b)) => {
            a.extend(b);
            Ok(List(a))
        }
        (BinaryOp::Add, Int(a), Int(b)) => a.checked_add(b).map(Int).ok_or(EvalError::Overflow),
        (BinaryOp::Sub, Int(a), Int(b)) => a.checked_sub(b).map(Int).ok_or(EvalError::Overflow),
        (BinaryOp::Mul, Int(a), Int(b)) => a.checked_mul(b).map(Int).ok_or(EvalError::Overflow),
        (BinaryOp::Div, Int(_), Int(0)) | (BinaryOp::Rem, Int(_), Int(0)) => {
            Err(EvalError::DivisionByZero)
        }
        (BinaryOp::Div, Int(a), Int(b)) => {
            if a.checked_rem(b) == Some(0) {
                a.checked_div(b).map(Int).ok_or(EvalError::Overflow)
            } else {
                Ok(Float(a as f64 / b as f64))
            }
        }
        (BinaryOp::Rem, Int(a), Int(b)) => a.checked_rem_euclid(b).map(Int).ok_or(EvalError::Overflow),
        (op, lhs, rhs) => {
            let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
                return Err(mismatch(&format!("{:?}", op).to_lowercase(), &lhs, &rhs));
            };
            match op {
                BinaryOp::Add => Ok(Float(a + b)),
                BinaryOp::Sub => Ok(Float(a - b)),
                BinaryOp::Mul => Ok(Float(a * b)),
                BinaryOp::Div | BinaryOp::Rem if b == 0.0 => Err(EvalError::DivisionByZero),
                BinaryOp::Div => Ok(Float(a / b)),
                BinaryOp::Rem => Ok(Float(a.rem_euclid(b))),
                _ => Err(mismatch("operator", &lhs, &rhs)),
            }
        }
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
    }
}

fn index_into(target: Value, index: Value) -> Result<Value, EvalError> {
    let Value::Int(i) = index else {
        return Err(EvalError::TypeMismatch(format!(
            "index must be int, got {}",
            index.type_name()
        )));
    };
    match target {
        Value::List(items) => {
            let len = items.len();
            usize::try_from(i)
                .ok()
                .and_then(|idx| items.into_iter().nth(idx))
                .ok_or(EvalError::IndexOutOfRange { index: i, len })
        }
        Value::Str(s) => {
            let len = s.chars().count();
            usize::try_from(i)
                .ok()
                .and_then(|idx| s.chars().nth(idx))
                .map(|c| Value::Str(c.to_string()))
                .ok_or(EvalError::IndexOutOfRange { index: i, len })
        }
        other => Err(EvalError::TypeMismatch(format!(
            "cannot index into {}",
            other.type_name()
        ))),
    }
}

fn arity(name: &str, expected: usize, args: &[Value]) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::ArityMismatch {
            name: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn list_arg(name: &str, value: Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(EvalError::TypeMismatch(format!(
            "{} expects a list, got {}",
            name,
            other.type_name()
        ))),
    }
}

fn builtin(interp: &mut Interpreter<'_>, name: &str, mut args: Vec<Value>) -> Result<Value, EvalError> {
    match name {
        "len" => {
            arity(name, 1, &args)?;
            match &args[0] {
                Value::List(items) => Ok(Value::Int(items.len() as i64)),
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                other => Err(EvalError::TypeMismatch(format!(
                    "len expects a list or str, got {}",
                    other.type_name()
                ))),
            }
        }
        "sum" => {
            arity(name, 1, &args)?;
            let items = list_arg(name, args.remove(0))?;
            interp.consume(items.len() as u64)?;
            items
                .into_iter()
                .try_fold(Value::Int(0), |acc, item| binary(BinaryOp::Add, acc, item))
        }
        "min" | "max" => {
            let items = match args.len() {
                0 => {
                    return Err(EvalError::ArityMismatch {
                        name: name.to_string(),
                        expected: 1,
                        got: 0,
                    })
                }
                1 => list_arg(name, args.remove(0))?,
                _ => args,
            };
            interp.consume(items.len() as u64)?;
            let wanted = if name == "min" {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut best: Option<Value> = None;
            for item in items {
                best = match best {
                    None => Some(item),
                    Some(current) => {
                        let ordering = compare(&item, &current)
                            .ok_or_else(|| mismatch(name, &item, &current))?;
                        Some(if ordering == wanted { item } else { current })
                    }
                };
            }
            Ok(best.unwrap_or(Value::None))
        }
        "abs" => {
            arity(name, 1, &args)?;
            match args.remove(0) {
                Value::Int(i) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(EvalError::TypeMismatch(format!(
                    "abs expects a number, got {}",
                    other.type_name()
                ))),
            }
        }
        "reverse" => {
            arity(name, 1, &args)?;
            match args.remove(0) {
                Value::List(mut items) => {
                    interp.consume(items.len() as u64)?;
                    items.reverse();
                    Ok(Value::List(items))
                }
                Value::Str(s) => Ok(Value::Str(s.chars().rev().collect())),
                other => Err(EvalError::TypeMismatch(format!(
                    "reverse expects a list or str, got {}",
                    other.type_name()
                ))),
            }
        }
        "range" => {
            let (start, end) = match args.as_slice() {
                [Value::Int(end)] => (0, *end),
                [Value::Int(start), Value::Int(end)] => (*start, *end),
                [_] | [_, _] => {
                    return Err(EvalError::TypeMismatch("range expects int bounds".into()))
                }
                _ => {
                    return Err(EvalError::ArityMismatch {
                        name: name.to_string(),
                        expected: 2,
                        got: args.len(),
                    })
                }
            };
            let count = end.saturating_sub(start).max(0) as u64;
            interp.consume(count)?;
            Ok(Value::List((start..end).map(Value::Int).collect()))
        }
        "push" => {
            arity(name, 2, &args)?;
            let item = args.remove(1);
            let mut items = list_arg(name, args.remove(0))?;
            interp.consume(items.len() as u64)?;
            items.push(item);
            Ok(Value::List(items))
        }
        "sorted" => {
            arity(name, 1, &args)?;
            let mut items = list_arg(name, args.remove(0))?;
            interp.consume(items.len() as u64)?;
            for pair in items.windows(2) {
                compare(&pair[0], &pair[1]).ok_or_else(|| mismatch(name, &pair[0], &pair[1]))?;
            }
            items.sort_by(|a, b| compare(a, b).unwrap_or(Ordering::Equal));
            Ok(Value::List(items))
        }
        _ => Err(EvalError::UnknownName(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parser::{parse_expression, parse_module};

    fn run(source: &str, expr: &str) -> Result<Value, EvalError> {
        let module = parse_module(source).unwrap();
        let expr = parse_expression(expr).unwrap();
        Interpreter::new(&module, Limits::default()).evaluate(&expr)
    }

    const SUM: &str = "fn process(values) { let total = 0; for v in values { total = total + v; } return total; }";

    #[test]
    fn test_sum_loop() {
        assert_eq!(run(SUM, "process([1, 2, 3])").unwrap(), Value::Int(6));
        assert_eq!(run(SUM, "process([]) == 0").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_division_semantics() {
        assert_eq!(run("", "6 / 3").unwrap(), Value::Int(2));
        assert_eq!(run("", "3 / 2").unwrap(), Value::Float(1.5));
        assert_eq!(run("", "1 / 0").unwrap_err(), EvalError::DivisionByZero);
        assert_eq!(run("", "-3 % 2").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_builtins() {
        assert_eq!(run("", "min([])").unwrap(), Value::None);
        assert_eq!(run("", "max([3, 9, 2])").unwrap(), Value::Int(9));
        assert_eq!(run("", "min(4, 1)").unwrap(), Value::Int(1));
        assert_eq!(
            run("", "sorted([3, 1, 2]) == [1, 2, 3]").unwrap(),
            Value::Bool(true)
        );
        assert_eq!(run("", "reverse(\"ab\")").unwrap(), Value::Str("ba".into()));
        assert_eq!(run("", "len(push([1], 2))").unwrap(), Value::Int(2));
        assert_eq!(run("", "sum(range(1, 5))").unwrap(), Value::Int(10));
        assert_eq!(run("", "abs(-4)").unwrap(), Value::Int(4));
    }

    #[test]
    fn test_errors_are_classified() {
        assert!(matches!(
            run("", "missing(1)").unwrap_err(),
            EvalError::UnknownName(_)
        ));
        assert!(matches!(
            run("", "[1][5]").unwrap_err(),
            EvalError::IndexOutOfRange { index: 5, len: 1 }
        ));
        assert!(matches!(
            run("", "1 + \"a\"").unwrap_err(),
            EvalError::TypeMismatch(_)
        ));
        assert!(matches!(
            run("fn f(a) { return a; }", "f()").unwrap_err(),
            EvalError::ArityMismatch { expected: 1, got: 0, .. }
        ));
    }

    #[test]
    fn test_infinite_loop_runs_out_of_fuel() {
        let err = run("fn spin() { while true { } }", "spin()").unwrap_err();
        assert_eq!(err, EvalError::FuelExhausted);
    }

    #[test]
    fn test_unbounded_recursion_hits_depth_limit() {
        let err = run("fn down(n) { return down(n + 1); }", "down(0)").unwrap_err();
        assert_eq!(err, EvalError::RecursionLimit(64));
    }

    #[test]
    fn test_huge_range_is_charged() {
        assert_eq!(
            run("", "len(range(100000000))").unwrap_err(),
            EvalError::FuelExhausted
        );
    }

    #[test]
    fn test_doubling_string_is_bounded_by_fuel() {
        let err = run(
            "fn grow() { let s = \"ab\"; while true { s = s + s; } }",
            "grow()",
        )
        .unwrap_err();
        assert_eq!(err, EvalError::FuelExhausted);
    }

    #[test]
    fn test_copying_lists_is_charged() {
        let err = run(
            "fn grow() { let xs = [1]; while true { xs = [xs, xs]; } }",
            "grow()",
        )
        .unwrap_err();
        assert_eq!(err, EvalError::FuelExhausted);
    }

    #[test]
    fn test_value_size_is_capped_with_large_fuel() {
        let module = parse_module("fn grow() { let xs = [1]; while true { xs = xs + xs; } }").unwrap();
        let expr = parse_expression("grow()").unwrap();
        let limits = Limits {
            fuel: u64::MAX,
            max_depth: 64,
        };
        let err = Interpreter::new(&module, limits).evaluate(&expr).unwrap_err();
        assert_eq!(err, EvalError::ValueTooLarge(MAX_VALUE_WEIGHT));
        assert_eq!(err.signature(), crate::domain::outcome::ErrorSignature::Timeout);
    }

    #[test]
    fn test_deep_expression_nesting_is_bounded() {
        let mut expr = Expr::Int(1);
        for _ in 0..(MAX_EVAL_NESTING + 10) {
            expr = Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            };
        }
        let module = Module { functions: vec![] };
        let err = Interpreter::new(&module, Limits::default())
            .evaluate(&expr)
            .unwrap_err();
        assert_eq!(err, EvalError::NestingLimit(MAX_EVAL_NESTING));
    }

    #[test]
    fn test_user_function_shadows_builtin() {
        assert_eq!(
            run("fn len(x) { return 42; }", "len([1])").unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn test_missing_return_yields_none() {
        assert_eq!(run("fn f() { }", "f()").unwrap(), Value::None);
    }
}
