// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Email provider collaborators.
//!
//! The gateway needs a single transactional `send` primitive. The
//! [`ResendProvider`] talks to a Resend-compatible JSON API; the
//! [`ConsoleProvider`] logs messages for local development.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// An outbound HTML email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

/// Provider acknowledgement of a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SentEmail {
    /// Provider-assigned message id
    pub id: String,
}

/// Email provider errors.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("provider rejected message with status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("provider transport failed: {0}")]
    Transport(String),

    #[error("message cannot be sent: {0}")]
    InvalidMessage(String),
}

/// Transactional email sending.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<SentEmail, EmailError>;
}

/// Resend-compatible HTTP email provider.
pub struct ResendProvider {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ResendProvider {
    /// Create a provider posting to `api_url` with a bearer `api_key`.
    ///
    /// `timeout` bounds the HTTP exchange; the dispatcher applies its own
    /// per-send timeout on top.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl EmailProvider for ResendProvider {
    async fn send(&self, message: &EmailMessage) -> Result<SentEmail, EmailError> {
        if message.to.is_empty() {
            return Err(EmailError::InvalidMessage("no recipients".to_string()));
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<SentEmail>()
            .await
            .map_err(|e| EmailError::Transport(format!("unreadable provider response: {e}")))
    }
}

/// Development provider that logs emails to tracing output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProvider;

#[async_trait]
impl EmailProvider for ConsoleProvider {
    async fn send(&self, message: &EmailMessage) -> Result<SentEmail, EmailError> {
        if message.to.is_empty() {
            return Err(EmailError::InvalidMessage("no recipients".to_string()));
        }

        info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            html_bytes = message.html.len(),
            "Email (console provider)"
        );

        Ok(SentEmail {
            id: format!("console-{}", chrono::Utc::now().timestamp_millis()),
        })
    }
}
