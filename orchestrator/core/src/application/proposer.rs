// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mutation Proposer
//!
//! Generates a finite, deterministic list of candidates for one target
//! from the closed pattern library. Every pattern is a pure function of
//! the live source and its parameters producing a byte-range patch.
//! Candidates whose post-image does not parse, or that leave the source
//! unchanged, are dropped before they are returned.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Candidate generation ranked by learned pattern statistics

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::application::recipes::{recipe_for, render, DEFAULT_PARAMS};
use crate::domain::brain::BrainMemory;
use crate::domain::mind_config::ProposerConfig;
use crate::domain::mutation::{MutationCandidate, Patch, PatternKind};
use crate::domain::outcome::ErrorSignature;
use crate::domain::plugin::Plugin;
use crate::domain::stage::Stage;
use crate::domain::task::Task;
use crate::lang::ast::{BinaryOp, Expr, Function, Module, StmtKind};
use crate::lang::parse_module;

const INDENT: &str = "    ";

impl PatternKind {
    pub fn min_stage(&self) -> Stage {
        match self {
            PatternKind::KnownRecipe | PatternKind::FillStub | PatternKind::Annotate => Stage(0),
            PatternKind::NoneGuard | PatternKind::EmptyGuard => Stage(1),
            PatternKind::AccumulateLoop => Stage(2),
        }
    }
}

/// Output of one pattern: the patch and the parameters that produced it.
struct Proposal {
    pattern: PatternKind,
    patch: Patch,
    params: BTreeMap<String, String>,
}

pub struct MutationProposer {
    config: ProposerConfig,
}

impl MutationProposer {
    pub fn new(config: ProposerConfig) -> Self {
        Self { config }
    }

    pub fn propose(
        &self,
        plugin: &Plugin,
        task: &Task,
        stage: Stage,
        memory: &BrainMemory,
    ) -> Vec<MutationCandidate> {
        let module = match parse_module(&plugin.source) {
            Ok(module) => module,
            Err(e) => {
                warn!(plugin = %plugin.id, error = %e, "Live source does not parse; no candidates");
                return vec![];
            }
        };
        let context = memory.last_signature.get(&plugin.id).copied();

        let mut proposals: Vec<Proposal> = PatternKind::ALL
            .iter()
            .filter(|p| p.min_stage() <= stage)
            .filter_map(|p| self.apply_pattern(*p, &plugin.source, &module, task, memory))
            .collect();

        proposals.sort_by(|a, b| rank(memory, context, a.pattern, b.pattern));

        let mut seen = BTreeSet::new();
        let limit = self.config.max_candidates_for(stage.index());
        let candidates: Vec<MutationCandidate> = proposals
            .into_iter()
            .filter_map(|proposal| {
                let post = proposal.patch.apply(&plugin.source).ok()?;
                if post == plugin.source || !seen.insert(post.clone()) {
                    return None;
                }
                if let Err(e) = parse_module(&post) {
                    debug!(pattern = %proposal.pattern, error = %e, "Dropping unparsable candidate");
                    return None;
                }
                Some(MutationCandidate::new(
                    plugin.id.clone(),
                    proposal.patch,
                    proposal.pattern,
                    proposal.params,
                    plugin.checksum.clone(),
                    task.name.clone(),
                ))
            })
            .take(limit)
            .collect();

        debug!(
            plugin = %plugin.id,
            task = %task.name,
            count = candidates.len(),
            "Proposed candidates"
        );
        candidates
    }

    fn apply_pattern(
        &self,
        pattern: PatternKind,
        source: &str,
        module: &Module,
        task: &Task,
        memory: &BrainMemory,
    ) -> Option<Proposal> {
        let function = module.function(&task.function);
        match pattern {
            PatternKind::KnownRecipe => known_recipe(source, function, task),
            PatternKind::FillStub => fill_stub(function?),
            PatternKind::NoneGuard => guard(
                function?,
                PatternKind::NoneGuard,
                |p| format!("if {} == none {{ return none; }}", p),
                |expr, p| is_none_check(expr, p),
            ),
            PatternKind::EmptyGuard => guard(
                function?,
                PatternKind::EmptyGuard,
                |p| format!("if len({}) == 0 {{ return 0; }}", p),
                |expr, p| is_empty_check(expr, p),
            ),
            PatternKind::AccumulateLoop => accumulate_loop(function?),
            PatternKind::Annotate => Some(self.annotate(source, task, memory)),
        }
    }

    fn annotate(&self, source: &str, task: &Task, memory: &BrainMemory) -> Proposal {
        let note = memory
            .last_signature
            .get(&task.plugin)
            .map(|s| s.as_str())
            .unwrap_or("exploring");
        let mut line = format!("// step {}: {} ({})", memory.age, task.name, note);
        line = line
            .chars()
            .filter(|c| *c != '\n' && *c != '\r')
            .take(self.config.annotate_max_chars.max(3))
            .collect();
        let prefix = if source.is_empty() || source.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        Proposal {
            pattern: PatternKind::Annotate,
            patch: Patch::insert(source.len(), format!("{}{}\n", prefix, line)),
            params: BTreeMap::from([("note".to_string(), note.to_string())]),
        }
    }
}

fn rank(
    memory: &BrainMemory,
    context: Option<ErrorSignature>,
    a: PatternKind,
    b: PatternKind,
) -> Ordering {
    let by_signature = match context {
        Some(sig) => memory
            .signature_rate(sig, b)
            .partial_cmp(&memory.signature_rate(sig, a))
            .unwrap_or(Ordering::Equal),
        None => Ordering::Equal,
    };
    by_signature
        .then_with(|| {
            memory
                .pattern_rate(b)
                .partial_cmp(&memory.pattern_rate(a))
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.library_index().cmp(&b.library_index()))
}

fn known_recipe(source: &str, function: Option<&Function>, task: &Task) -> Option<Proposal> {
    let recipe = recipe_for(task)?;
    let mut params = BTreeMap::from([
        ("recipe".to_string(), recipe.key.to_string()),
        ("function".to_string(), task.function.clone()),
    ]);
    match function {
        Some(f) => {
            if f.params.len() < recipe.arity {
                return None;
            }
            let body = render(recipe, &f.params, INDENT);
            Some(Proposal {
                pattern: PatternKind::KnownRecipe,
                patch: Patch::replace(f.body_interior(), body),
                params,
            })
        }
        None => {
            // Target function is missing: append it.
            let names: Vec<String> = DEFAULT_PARAMS
                .iter()
                .take(recipe.arity.max(1))
                .map(|s| s.to_string())
                .collect();
            let body = render(recipe, &names, INDENT);
            let prefix = if source.is_empty() || source.ends_with('\n') {
                ""
            } else {
                "\n"
            };
            params.insert("created".to_string(), "true".to_string());
            Some(Proposal {
                pattern: PatternKind::KnownRecipe,
                patch: Patch::insert(
                    source.len(),
                    format!("{}fn {}({}) {{{}}}\n", prefix, task.function, names.join(", "), body),
                ),
                params,
            })
        }
    }
}

fn fill_stub(function: &Function) -> Option<Proposal> {
    if !function.body.stmts.is_empty() {
        return None;
    }
    Some(Proposal {
        pattern: PatternKind::FillStub,
        patch: Patch::replace(
            function.body_interior(),
            format!("\n{}return none;\n", INDENT),
        ),
        params: BTreeMap::from([("function".to_string(), function.name.clone())]),
    })
}

fn guard(
    function: &Function,
    pattern: PatternKind,
    text: impl Fn(&str) -> String,
    already: impl Fn(&Expr, &str) -> bool,
) -> Option<Proposal> {
    let param = function.params.first()?;
    let present = function.body.stmts.iter().any(|stmt| match &stmt.kind {
        StmtKind::If { cond, .. } => already(cond, param),
        _ => false,
    });
    if present {
        return None;
    }
    Some(Proposal {
        pattern,
        patch: Patch::insert(
            function.body_insertion_point(),
            format!("\n{}{}", INDENT, text(param)),
        ),
        params: BTreeMap::from([
            ("function".to_string(), function.name.clone()),
            ("param".to_string(), param.clone()),
        ]),
    })
}

fn is_none_check(expr: &Expr, param: &str) -> bool {
    matches!(
        expr,
        Expr::Binary { op: BinaryOp::Eq, lhs, rhs }
            if matches!(lhs.as_ref(), Expr::Var(v) if v == param)
                && matches!(rhs.as_ref(), Expr::None)
    )
}

fn is_empty_check(expr: &Expr, param: &str) -> bool {
    matches!(
        expr,
        Expr::Binary { op: BinaryOp::Eq, lhs, rhs }
            if matches!(lhs.as_ref(), Expr::Call { callee, args }
                if callee == "len" && matches!(args.as_slice(), [Expr::Var(v)] if v == param))
                && matches!(rhs.as_ref(), Expr::Int(0))
    )
}

fn accumulate_loop(function: &Function) -> Option<Proposal> {
    let param = function.params.first()?;
    let body = format!(
        "\n{i}let acc = 0;\n{i}for item in {p} {{\n{i}{i}acc = acc + item;\n{i}}}\n{i}return acc;\n",
        i = INDENT,
        p = param
    );
    Some(Proposal {
        pattern: PatternKind::AccumulateLoop,
        patch: Patch::replace(function.body_interior(), body),
        params: BTreeMap::from([
            ("function".to_string(), function.name.clone()),
            ("param".to_string(), param.clone()),
        ]),
    })
}
