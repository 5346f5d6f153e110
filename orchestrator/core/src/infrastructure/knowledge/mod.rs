// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Knowledge source adapters.

pub mod graph;
pub mod web;

use std::sync::Arc;

use crate::domain::knowledge::{KnowledgeClient, KnowledgeError};
use crate::domain::mind_config::KnowledgeConfig;

pub use graph::GraphKnowledgeClient;
pub use web::WebKnowledgeClient;

/// Clients for every configured knowledge source, graph first.
pub fn build_clients(config: &KnowledgeConfig) -> Result<Vec<Arc<dyn KnowledgeClient>>, KnowledgeError> {
    let mut clients: Vec<Arc<dyn KnowledgeClient>> = Vec::new();
    if let Some(graph) = &config.graph {
        clients.push(Arc::new(GraphKnowledgeClient::new(graph)?));
    }
    if let Some(web) = &config.web {
        clients.push(Arc::new(WebKnowledgeClient::new(web.clone())?));
    }
    Ok(clients)
}
