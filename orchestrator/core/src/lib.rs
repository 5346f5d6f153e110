// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! mindloop core
//!
//! An agent that improves a directory of small plugin units by proposing
//! source mutations, gating them, testing them in a sandbox and keeping
//! only the ones that make task requirements pass.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Plugin language, domain model, mutation loop and adapters

pub mod lang;
pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
