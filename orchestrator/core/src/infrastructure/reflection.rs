// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
// Reflection Client
//
// Anti-Corruption Layer for an OpenAI-compatible chat-completions endpoint
// (Ollama, LM Studio, vLLM, ...). Any failure degrades to an empty
// reflection.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::knowledge::Reflector;
use crate::domain::mind_config::ReflectionConfig;

const SYSTEM_PROMPT: &str = "You are the inner voice of a small self-improving code agent. \
You see a summary of one step of its life: age, stage, skill, the plugins it selected, \
the mutations it tried and whether they were committed, rolled back or rejected, and the \
status of its tasks. You may also see notes gathered from an external knowledge source. \
Describe in two or three sentences what the agent is doing now and what it should try \
next. Do not invent details that are not in the summary.";

pub struct ChatReflector {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatReflector {
    pub fn new(config: &ReflectionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5).min(config.timeout))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.resolved_api_key(),
            max_tokens: config.max_tokens,
        })
    }

    async fn complete(&self, prompt: String) -> Result<String, String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: 0.3,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;
        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        Ok(text)
    }
}

#[async_trait]
impl Reflector for ChatReflector {
    async fn reflect(&self, step_summary: &str, knowledge: Option<&str>) -> String {
        let prompt = match knowledge {
            Some(notes) if !notes.is_empty() => {
                format!("{}\n\nExternal knowledge:\n{}", step_summary, notes)
            }
            _ => step_summary.to_string(),
        };
        match self.complete(prompt).await {
            Ok(text) => {
                debug!(chars = text.len(), "Reflection received");
                text
            }
            Err(e) => {
                warn!(kind = "knowledge_unavailable", error = %e, "Reflection service unavailable");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: String) -> ReflectionConfig {
        ReflectionConfig {
            enabled: true,
            endpoint,
            api_key: Some("secret".into()),
            timeout: Duration::from_secs(2),
            ..ReflectionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_reflection_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  Summing lists now. "}}]}"#)
            .create_async()
            .await;

        let reflector = ChatReflector::new(&config(format!("{}/v1", server.url()))).unwrap();
        let text = reflector.reflect("age 3, stage 0", Some("sum folds")).await;

        assert_eq!(text, "Summing lists now.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reflection_degrades_to_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .create_async()
            .await;

        let reflector = ChatReflector::new(&config(format!("{}/v1", server.url()))).unwrap();
        assert_eq!(reflector.reflect("age 3", None).await, "");
    }
}
