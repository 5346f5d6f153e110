// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the mindloop CLI

pub mod config;
pub mod reset;
pub mod run;
pub mod status;
pub mod worker;

pub use self::config::ConfigCommand;
pub use self::run::RunArgs;

use anyhow::{Context, Result};
use std::path::PathBuf;

use mindloop_core::domain::mind_config::MindConfigManifest;

/// Discover and load the configuration manifest.
pub fn load_config(config_override: Option<PathBuf>) -> Result<MindConfigManifest> {
    MindConfigManifest::load_or_default(config_override).context("Failed to load configuration")
}

/// Invalid configuration is fatal for every command that touches the
/// workspace.
pub fn require_valid(config: &MindConfigManifest) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")
}
