// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Plugins, tasks, mutation candidates and the learning state of the
//! agent, plus the ports its adapters implement.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and trait seams; no IO

pub mod brain;
pub mod curriculum;
pub mod events;
pub mod harness;
pub mod knowledge;
pub mod metrics;
pub mod mind_config;
pub mod mutation;
pub mod outcome;
pub mod plugin;
pub mod repository;
pub mod safety;
pub mod stage;
pub mod state;
pub mod task;
pub mod workspace;
