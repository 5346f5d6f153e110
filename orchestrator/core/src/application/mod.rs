// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! The mutation loop: target selection, candidate generation, safety
//! gating, sandboxed evaluation, accept/rollback, escalation, curriculum
//! and the step driver that sequences them.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Use cases over the domain ports

pub mod acceptance;
pub mod curriculum;
pub mod drive_scorer;
pub mod escalation;
pub mod factory;
pub mod harness;
pub mod life_loop;
pub mod locks;
pub mod pipeline;
pub mod proposer;
pub mod recipes;
pub mod reset;
pub mod safety_validator;
pub mod telemetry;

pub use factory::{build_components, build_life_loop, build_reset_service};
pub use life_loop::{LifeLoop, LoopComponents};
pub use reset::{ResetReport, ResetService};
