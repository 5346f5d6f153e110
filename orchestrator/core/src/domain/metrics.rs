// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Persisted run counters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsCounters {
    pub steps: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub safety_rejections: u64,
    pub harness_errors: u64,
    pub timeouts: u64,
    pub consults: u64,
    pub practice_successes: u64,
    pub tasks_mastered: u64,
}
