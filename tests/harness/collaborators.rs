// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scripted email providers and stores.

use async_trait::async_trait;
use inquiry_gateway::email::{EmailError, EmailMessage, EmailProvider, SentEmail};
use inquiry_gateway::store::{RateLimitKey, RateLimitRecord, RateLimitStore, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Records every delivered message. Sends addressed to `stall_for` hang
/// past any timeout; sends addressed to `fail_for` error.
#[derive(Default)]
pub struct RecordingProvider {
    sent: Mutex<Vec<EmailMessage>>,
    pub stall_for: Option<String>,
    pub fail_for: Vec<String>,
}

impl RecordingProvider {
    pub fn stalling_for(recipient: &str) -> Self {
        Self {
            stall_for: Some(recipient.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            fail_for: recipients.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl EmailProvider for RecordingProvider {
    async fn send(&self, message: &EmailMessage) -> Result<SentEmail, EmailError> {
        if self.stall_for.as_ref().is_some_and(|r| message.to.contains(r)) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if message.to.iter().any(|r| self.fail_for.contains(r)) {
            return Err(EmailError::Provider {
                status: 503,
                body: "provider maintenance window".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap_or_else(|p| p.into_inner());
        sent.push(message.clone());
        Ok(SentEmail {
            id: format!("test-{}", sent.len()),
        })
    }
}

/// Rate-limit store that can be switched between failing and empty.
#[derive(Default)]
pub struct ScriptedStore {
    pub unavailable: bool,
    pub writes: AtomicUsize,
}

impl ScriptedStore {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLimitStore for ScriptedStore {
    async fn fetch(&self, _: &RateLimitKey) -> Result<Option<RateLimitRecord>, StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable("connection reset by peer".to_string()))
        } else {
            Ok(None)
        }
    }

    async fn insert(&self, _: &RateLimitRecord) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, _: &RateLimitRecord) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
