// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Test outcomes and error signatures.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a requirement failure. Used as the key for error
/// streaks, learned pattern statistics and external knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSignature {
    SyntaxError,
    UnknownName,
    TypeMismatch,
    DivisionByZero,
    ArithmeticOverflow,
    IndexOutOfRange,
    ArityMismatch,
    RecursionLimit,
    AssertionFailed,
    Timeout,
    HarnessError,
}

impl ErrorSignature {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSignature::SyntaxError => "syntax_error",
            ErrorSignature::UnknownName => "unknown_name",
            ErrorSignature::TypeMismatch => "type_mismatch",
            ErrorSignature::DivisionByZero => "division_by_zero",
            ErrorSignature::ArithmeticOverflow => "arithmetic_overflow",
            ErrorSignature::IndexOutOfRange => "index_out_of_range",
            ErrorSignature::ArityMismatch => "arity_mismatch",
            ErrorSignature::RecursionLimit => "recursion_limit",
            ErrorSignature::AssertionFailed => "assertion_failed",
            ErrorSignature::Timeout => "timeout",
            ErrorSignature::HarnessError => "harness_error",
        }
    }

    /// Infrastructure failures say nothing about the candidate itself.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, ErrorSignature::HarnessError)
    }
}

impl fmt::Display for ErrorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one requirement expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub task: String,
    pub index: usize,
    pub expression: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<ErrorSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TestOutcome {
    pub fn pass(task: &str, index: usize, expression: &str) -> Self {
        Self {
            task: task.to_string(),
            index,
            expression: expression.to_string(),
            passed: true,
            signature: None,
            detail: None,
        }
    }

    pub fn fail(
        task: &str,
        index: usize,
        expression: &str,
        signature: ErrorSignature,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            task: task.to_string(),
            index,
            expression: expression.to_string(),
            passed: false,
            signature: Some(signature),
            detail: Some(detail.into()),
        }
    }
}

/// Aggregate view over the outcomes of one harness run.
pub trait OutcomeSet {
    fn all_passed(&self) -> bool;
    fn pass_count(&self) -> usize;
    fn failure_count(&self) -> usize;
    fn task_passed(&self, task: &str) -> bool;
    /// Most frequent failure signature; ties go to the earliest occurrence.
    fn dominant_signature(&self) -> Option<ErrorSignature>;
    fn is_harness_failure(&self) -> bool;
}

impl OutcomeSet for [TestOutcome] {
    fn all_passed(&self) -> bool {
        self.iter().all(|o| o.passed)
    }

    fn pass_count(&self) -> usize {
        self.iter().filter(|o| o.passed).count()
    }

    fn failure_count(&self) -> usize {
        self.len() - self.pass_count()
    }

    fn task_passed(&self, task: &str) -> bool {
        let mut seen = false;
        for outcome in self.iter().filter(|o| o.task == task) {
            if !outcome.passed {
                return false;
            }
            seen = true;
        }
        seen
    }

    fn dominant_signature(&self) -> Option<ErrorSignature> {
        let mut counts: HashMap<ErrorSignature, (usize, usize)> = HashMap::new();
        for (position, signature) in self.iter().filter_map(|o| o.signature).enumerate() {
            counts.entry(signature).or_insert((0, position)).0 += 1;
        }
        counts
            .into_iter()
            .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            })
            .map(|(signature, _)| signature)
    }

    fn is_harness_failure(&self) -> bool {
        !self.is_empty()
            && self
                .iter()
                .all(|o| o.signature == Some(ErrorSignature::HarnessError))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fail(sig: ErrorSignature) -> TestOutcome {
        TestOutcome::fail("t", 0, "x", sig, "boom")
    }

    #[test]
    fn test_dominant_signature_prefers_frequency() {
        let outcomes = vec![
            fail(ErrorSignature::TypeMismatch),
            fail(ErrorSignature::AssertionFailed),
            fail(ErrorSignature::AssertionFailed),
            TestOutcome::pass("t", 3, "true"),
        ];
        assert_eq!(
            outcomes.dominant_signature(),
            Some(ErrorSignature::AssertionFailed)
        );
    }

    #[test]
    fn test_dominant_signature_tie_goes_to_first() {
        let outcomes = vec![
            fail(ErrorSignature::IndexOutOfRange),
            fail(ErrorSignature::TypeMismatch),
        ];
        assert_eq!(
            outcomes.dominant_signature(),
            Some(ErrorSignature::IndexOutOfRange)
        );
    }

    #[test]
    fn test_task_passed_requires_every_requirement() {
        let outcomes = vec![
            TestOutcome::pass("a", 0, "true"),
            fail(ErrorSignature::AssertionFailed),
            TestOutcome::pass("t", 1, "true"),
        ];
        assert!(outcomes.task_passed("a"));
        assert!(!outcomes.task_passed("t"));
        assert!(!outcomes.task_passed("missing"));
    }

    #[test]
    fn test_signature_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorSignature::DivisionByZero).unwrap();
        assert_eq!(json, "\"division_by_zero\"");
    }
}
