// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Process-wide maturity stage.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Stage(pub u8);

impl Stage {
    pub const ZERO: Stage = Stage(0);

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Stage implied by accumulated skill against ascending thresholds:
    /// the number of thresholds reached.
    pub fn from_skill(skill: u64, thresholds: &[u64]) -> Stage {
        let reached = thresholds.iter().take_while(|t| skill >= **t).count();
        Stage(reached.min(u8::MAX as usize) as u8)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
