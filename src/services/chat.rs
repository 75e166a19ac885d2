// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat-completion client for the local LLM proxy.
//!
//! The proxy holds the provider credentials, so requests carry no auth
//! header. Calls are made once: no retries and no timeout.

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Sends a conversation and returns the first reply's text.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError>;
}

/// Client for `POST /api/groq-chat` on the local proxy.
#[derive(Clone)]
pub struct GroqProxyClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

impl GroqProxyClient {
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatClient for GroqProxyClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        let payload = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::AiProxy(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Chat proxy returned an error");
            return Err(AppError::AiProxy(format!("{} - {}", status, body)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiProxy(format!("JSON parse error: {}", e)))?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
