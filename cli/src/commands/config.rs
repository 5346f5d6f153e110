// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use mindloop_core::domain::mind_config::{GraphConfig, MindConfigManifest, WebConfig};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./mindloop.yaml")]
        output: PathBuf,

        /// Include knowledge and reflection sections
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config: MindConfigManifest,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(&config, config_override, paths),
        ConfigCommand::Validate { file } => validate(config, file),
        ConfigCommand::Generate { output, examples } => generate(output, examples),
    }
}

fn show(
    config: &MindConfigManifest,
    config_override: Option<PathBuf>,
    show_paths: bool,
) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. MINDLOOP_CONFIG_PATH: {}",
            std::env::var("MINDLOOP_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./mindloop.yaml");
        match dirs_next::home_dir() {
            Some(home) => println!("  4. {}", home.join(".mindloop/config.yaml").display()),
            None => println!("  4. ~/.mindloop/config.yaml"),
        }
        println!(
            "  In use: {}",
            config_override
                .or_else(MindConfigManifest::discover_config)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(defaults)".to_string())
        );
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();
    print!(
        "{}",
        serde_yaml::to_string(config).context("Failed to render configuration")?
    );
    Ok(())
}

fn validate(config: MindConfigManifest, file: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = match file {
        Some(path) => MindConfigManifest::from_yaml_file(&path)
            .with_context(|| format!("Failed to load config at {:?}", path))?,
        None => config,
    };

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());
    Ok(())
}

fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = sample_manifest(with_examples);
    sample
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );
    Ok(())
}

fn sample_manifest(with_examples: bool) -> MindConfigManifest {
    let mut manifest = MindConfigManifest::default();
    if with_examples {
        let spec = &mut manifest.spec;
        spec.knowledge.graph = Some(GraphConfig {
            endpoint: "http://localhost:7878".to_string(),
            timeout: Duration::from_secs(10),
            neighbor_limit: 8,
        });
        spec.knowledge.web = Some(WebConfig::default());
        spec.reflection.enabled = true;
        spec.reflection.api_key = Some("env:OPENAI_API_KEY".to_string());
    }
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_round_trips_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mindloop.yaml");

        generate(path.clone(), true).unwrap();
        let loaded = MindConfigManifest::from_yaml_file(&path).unwrap();

        loaded.validate().unwrap();
        assert!(loaded.spec.knowledge.graph.is_some());
        assert!(loaded.spec.reflection.enabled);
    }

    #[test]
    fn test_minimal_sample_has_no_knowledge_sources() {
        let sample = sample_manifest(false);
        assert!(sample.spec.knowledge.graph.is_none());
        assert!(sample.spec.knowledge.web.is_none());
    }
}
