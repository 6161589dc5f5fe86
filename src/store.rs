// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Backing-store collaborators.
//!
//! The gateway needs three narrow capabilities from its data store:
//! point lookup / insert / single-row update of rate-limit counters, an
//! append-only generation log, and a read of published site content for
//! the sitemap. Each is a trait so the process-local [`MemoryStore`] and
//! the HTTP-backed [`RestStore`](crate::rest_store::RestStore) are
//! interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Backing store failure. "No record" is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store rejected request with status {status}")]
    Rejected { status: u16 },

    #[error("store returned an unreadable response: {0}")]
    Decode(String),
}

/// Lookup key for a rate-limit counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    /// Client identity, usually the forwarded address
    pub identity: String,
    /// Endpoint name the request targeted
    pub endpoint: String,
}

impl RateLimitKey {
    pub fn new(identity: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Persisted request counter for one (identity, endpoint) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    #[serde(rename = "identifier")]
    pub identity: String,
    pub endpoint: String,
    #[serde(rename = "request_count")]
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

impl RateLimitRecord {
    /// A fresh record opening a window at `now`.
    pub fn opened(key: &RateLimitKey, now: DateTime<Utc>) -> Self {
        Self {
            identity: key.identity.clone(),
            endpoint: key.endpoint.clone(),
            count: 1,
            window_start: now,
        }
    }

    pub fn key(&self) -> RateLimitKey {
        RateLimitKey::new(self.identity.clone(), self.endpoint.clone())
    }
}

/// Outcome recorded for a sitemap generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Error,
}

/// One immutable row per sitemap generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationLogEntry {
    pub url_count: usize,
    pub status: GenerationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Kinds of published content that get their own sitemap URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Project,
    BlogPost,
    Service,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [Self::Project, Self::BlogPost, Self::Service];
}

/// A published piece of site content.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub kind: ContentKind,
    pub slug: String,
    pub updated_at: DateTime<Utc>,
}

/// Rate-limit counter persistence.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Look up the counter for `key`; `Ok(None)` when none exists yet.
    async fn fetch(&self, key: &RateLimitKey) -> Result<Option<RateLimitRecord>, StoreError>;

    /// Create the counter for a key seen for the first time.
    async fn insert(&self, record: &RateLimitRecord) -> Result<(), StoreError>;

    /// Overwrite count and window start of an existing counter.
    async fn update(&self, record: &RateLimitRecord) -> Result<(), StoreError>;
}

/// Append-only sitemap generation log.
#[async_trait]
pub trait GenerationLogStore: Send + Sync {
    async fn append(&self, entry: &GenerationLogEntry) -> Result<(), StoreError>;
}

/// Read access to published content.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn published_content(&self) -> Result<Vec<ContentItem>, StoreError>;
}

/// Process-local store backed by hash maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    rate_limits: Arc<RwLock<HashMap<RateLimitKey, RateLimitRecord>>>,
    generation_log: Arc<RwLock<Vec<GenerationLogEntry>>>,
    content: Arc<RwLock<Vec<ContentItem>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose content table starts with `items`.
    pub fn with_content(items: Vec<ContentItem>) -> Self {
        Self {
            content: Arc::new(RwLock::new(items)),
            ..Self::default()
        }
    }

    /// Publish a content item.
    pub async fn publish(&self, item: ContentItem) {
        self.content.write().await.push(item);
    }

    /// Snapshot of the generation log, oldest first.
    pub async fn generation_log(&self) -> Vec<GenerationLogEntry> {
        self.generation_log.read().await.clone()
    }

    /// Current counter for a key, if any.
    pub async fn record(&self, key: &RateLimitKey) -> Option<RateLimitRecord> {
        self.rate_limits.read().await.get(key).cloned()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn fetch(&self, key: &RateLimitKey) -> Result<Option<RateLimitRecord>, StoreError> {
        Ok(self.rate_limits.read().await.get(key).cloned())
    }

    async fn insert(&self, record: &RateLimitRecord) -> Result<(), StoreError> {
        let mut table = self.rate_limits.write().await;
        debug!(identity = %record.identity, endpoint = %record.endpoint, "Inserting rate limit record");
        table.insert(record.key(), record.clone());
        Ok(())
    }

    async fn update(&self, record: &RateLimitRecord) -> Result<(), StoreError> {
        let mut table = self.rate_limits.write().await;
        // Last write wins, matching a single-row UPDATE.
        table.insert(record.key(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl GenerationLogStore for MemoryStore {
    async fn append(&self, entry: &GenerationLogEntry) -> Result<(), StoreError> {
        self.generation_log.write().await.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl ContentSource for MemoryStore {
    async fn published_content(&self) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self.content.read().await.clone())
    }
}
