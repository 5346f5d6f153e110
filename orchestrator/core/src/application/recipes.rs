// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Known recipes used by the `known_recipe` pattern.
//!
//! A recipe is picked by task name first (the longest recipe key contained
//! in the name) and by task category second.

use crate::domain::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe {
    pub key: &'static str,
    /// Parameters the recipe body refers to, in order.
    pub arity: usize,
    /// Body statements; `{0}` and `{1}` stand for parameter names.
    pub body: &'static [&'static str],
}

pub const RECIPES: &[Recipe] = &[
    Recipe {
        key: "sum",
        arity: 1,
        body: &[
            "let total = 0;",
            "for v in {0} {",
            "    total = total + v;",
            "}",
            "return total;",
        ],
    },
    Recipe {
        key: "min",
        arity: 1,
        body: &[
            "if len({0}) == 0 {",
            "    return none;",
            "}",
            "let best = {0}[0];",
            "for v in {0} {",
            "    if v < best {",
            "        best = v;",
            "    }",
            "}",
            "return best;",
        ],
    },
    Recipe {
        key: "max",
        arity: 1,
        body: &[
            "if len({0}) == 0 {",
            "    return none;",
            "}",
            "let best = {0}[0];",
            "for v in {0} {",
            "    if v > best {",
            "        best = v;",
            "    }",
            "}",
            "return best;",
        ],
    },
    Recipe {
        key: "abs",
        arity: 1,
        body: &["if {0} < 0 {", "    return -{0};", "}", "return {0};"],
    },
    Recipe {
        key: "reverse",
        arity: 1,
        body: &[
            "let out = [];",
            "let i = len({0}) - 1;",
            "while i >= 0 {",
            "    out = push(out, {0}[i]);",
            "    i = i - 1;",
            "}",
            "return out;",
        ],
    },
    Recipe {
        key: "len",
        arity: 1,
        body: &[
            "let n = 0;",
            "for v in {0} {",
            "    n = n + 1;",
            "}",
            "return n;",
        ],
    },
    Recipe {
        key: "add",
        arity: 2,
        body: &["return {0} + {1};"],
    },
    Recipe {
        key: "average",
        arity: 1,
        body: &[
            "if len({0}) == 0 {",
            "    return 0;",
            "}",
            "return sum({0}) / len({0});",
        ],
    },
    Recipe {
        key: "filter_even",
        arity: 1,
        body: &[
            "let out = [];",
            "for v in {0} {",
            "    if v % 2 == 0 {",
            "        out = push(out, v);",
            "    }",
            "}",
            "return out;",
        ],
    },
    Recipe {
        key: "map_square",
        arity: 1,
        body: &[
            "let out = [];",
            "for v in {0} {",
            "    out = push(out, v * v);",
            "}",
            "return out;",
        ],
    },
    Recipe {
        key: "constant_true",
        arity: 0,
        body: &["return true;"],
    },
];

/// Default parameter names for a function the recipe has to create.
pub const DEFAULT_PARAMS: [&str; 2] = ["values", "other"];

pub fn recipe_for(task: &Task) -> Option<&'static Recipe> {
    let by_name = RECIPES
        .iter()
        .filter(|r| task.name.contains(r.key))
        .max_by_key(|r| r.key.len());
    by_name.or_else(|| {
        let category = task.category.trim();
        RECIPES
            .iter()
            .find(|r| r.key == category || r.key.split('_').next() == Some(category))
    })
}

/// Render the recipe body with the given parameters at `indent`.
pub fn render(recipe: &Recipe, params: &[String], indent: &str) -> String {
    let mut out = String::from("\n");
    for line in recipe.body {
        let mut rendered = line.to_string();
        for (i, param) in params.iter().enumerate().take(recipe.arity) {
            rendered = rendered.replace(&format!("{{{}}}", i), param);
        }
        out.push_str(indent);
        out.push_str(&rendered);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plugin::PluginId;
    use crate::lang::parse_module;

    fn task(name: &str, category: &str) -> Task {
        Task {
            name: name.into(),
            plugin: PluginId::new("p").unwrap(),
            function: "process".into(),
            phase: 0,
            difficulty: 1,
            category: category.into(),
            description: String::new(),
            requirements: vec![],
            prerequisites: vec![],
        }
    }

    #[test]
    fn test_lookup_by_name_then_category() {
        assert_eq!(recipe_for(&task("list_sum", "")).unwrap().key, "sum");
        assert_eq!(recipe_for(&task("evens", "filter_even")).unwrap().key, "filter_even");
        assert_eq!(recipe_for(&task("always", "constant")).unwrap().key, "constant_true");
        assert!(recipe_for(&task("mystery", "")).is_none());
    }

    #[test]
    fn test_every_recipe_parses() {
        let params = vec!["a".to_string(), "b".to_string()];
        for recipe in RECIPES {
            let body = render(recipe, &params, "    ");
            let source = format!("fn f(a, b) {{{}}}", body);
            assert!(parse_module(&source).is_ok(), "recipe {} failed", recipe.key);
        }
    }
}
