// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! Adapters behind the domain ports: the plugin directory, YAML tasks,
//! JSON state documents, test runners, knowledge sources and reflection.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Filesystem, process and HTTP implementations of domain traits

pub mod event_bus;
pub mod knowledge;
pub mod reflection;
pub mod runners;
pub mod state_store;
pub mod task_loader;
pub mod workspace;
