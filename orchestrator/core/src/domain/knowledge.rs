// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Knowledge
//!
//! Ports for the external collaborators consulted on sustained failure
//! (knowledge graph, allow-listed web pages) and for the reflection
//! service that narrates a step.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption interfaces; implementations live in
//!   `infrastructure::knowledge` and `infrastructure::reflection`

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::outcome::ErrorSignature;
use crate::domain::plugin::PluginId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultSource {
    #[default]
    Graph,
    Web,
}

impl ConsultSource {
    pub fn other(&self) -> ConsultSource {
        match self {
            ConsultSource::Graph => ConsultSource::Web,
            ConsultSource::Web => ConsultSource::Graph,
        }
    }
}

impl fmt::Display for ConsultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultSource::Graph => f.write_str("graph"),
            ConsultSource::Web => f.write_str("web"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultRequest {
    pub plugin: PluginId,
    pub signature: ErrorSignature,
    pub streak: u32,
    pub source: ConsultSource,
}

impl ConsultRequest {
    /// Query text in the knowledge graph's node vocabulary.
    pub fn query(&self) -> String {
        format!("error:{} plugin:{}", self.signature, self.plugin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub source: ConsultSource,
    pub text: String,
    pub step: u64,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge source not configured: {0}")]
    NotConfigured(ConsultSource),

    #[error("host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected response: {0}")]
    Response(String),
}

/// One outbound knowledge consult.
#[async_trait]
pub trait KnowledgeClient: Send + Sync {
    fn source(&self) -> ConsultSource;

    async fn consult(&self, request: &ConsultRequest) -> Result<String, KnowledgeError>;
}

/// Free-text narration of a step. Implementations degrade to an empty
/// string rather than fail.
#[async_trait]
pub trait Reflector: Send + Sync {
    async fn reflect(&self, step_summary: &str, knowledge: Option<&str>) -> String;
}

/// Reflector used when no reflection service is configured.
pub struct SilentReflector;

#[async_trait]
impl Reflector for SilentReflector {
    async fn reflect(&self, _step_summary: &str, _knowledge: Option<&str>) -> String {
        String::new()
    }
}
