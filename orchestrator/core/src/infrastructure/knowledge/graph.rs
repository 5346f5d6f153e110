// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Knowledge graph client.
//!
//! `GET {endpoint}/ask?text=<query>` returns, per matched query node, the
//! node and its strongest neighbours:
//!
//! ```json
//! [{"query_node": "error:type_mismatch",
//!   "neighbors": [{"id": "pattern:none_guard", "weight": 0.8, "type": "pattern"}]}]
//! ```
//!
//! or `{"error": "..."}`. The matches are flattened into a few lines of
//! text.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::knowledge::{ConsultRequest, ConsultSource, KnowledgeClient, KnowledgeError};
use crate::domain::mind_config::GraphConfig;

pub struct GraphKnowledgeClient {
    client: reqwest::Client,
    endpoint: String,
    neighbor_limit: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AskResponse {
    Matches(Vec<AskMatch>),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct AskMatch {
    query_node: String,
    #[serde(default)]
    neighbors: Vec<Neighbor>,
}

#[derive(Debug, Deserialize)]
struct Neighbor {
    id: String,
    #[serde(default)]
    weight: f64,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl GraphKnowledgeClient {
    pub fn new(config: &GraphConfig) -> Result<Self, KnowledgeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| KnowledgeError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            neighbor_limit: config.neighbor_limit,
        })
    }

    fn render(&self, matches: &[AskMatch]) -> String {
        let mut out = String::new();
        for m in matches {
            let _ = write!(out, "{}:", m.query_node);
            for n in m.neighbors.iter().take(self.neighbor_limit) {
                match &n.kind {
                    Some(kind) => {
                        let _ = write!(out, " {} [{}] ({:.2});", n.id, kind, n.weight);
                    }
                    None => {
                        let _ = write!(out, " {} ({:.2});", n.id, n.weight);
                    }
                }
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}

#[async_trait]
impl KnowledgeClient for GraphKnowledgeClient {
    fn source(&self) -> ConsultSource {
        ConsultSource::Graph
    }

    async fn consult(&self, request: &ConsultRequest) -> Result<String, KnowledgeError> {
        let url = format!("{}/ask", self.endpoint.trim_end_matches('/'));
        let query = request.query();
        let response = self
            .client
            .get(&url)
            .query(&[("text", query.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    KnowledgeError::Timeout
                } else {
                    KnowledgeError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(KnowledgeError::Response(format!("HTTP {}", response.status())));
        }

        let body: AskResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeError::Response(format!("Failed to parse response: {}", e)))?;

        match body {
            AskResponse::Error { error } => Err(KnowledgeError::Response(error)),
            AskResponse::Matches(matches) if matches.is_empty() => Err(KnowledgeError::Response(
                format!("no graph nodes for '{}'", query),
            )),
            AskResponse::Matches(matches) => {
                debug!(query = %query, matches = matches.len(), "Graph consult answered");
                Ok(self.render(&matches))
            }
        }
    }
}
