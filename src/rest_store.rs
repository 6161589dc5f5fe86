// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! PostgREST-compatible backing store.
//!
//! Talks to `/rest/v1/<table>` with the service key sent both as `apikey`
//! and as a bearer token. Only point lookups, inserts and single-row
//! updates are issued.

use crate::store::{
    ContentItem, ContentKind, ContentSource, GenerationLogEntry, GenerationLogStore,
    RateLimitKey, RateLimitRecord, RateLimitStore, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const RATE_LIMIT_TABLE: &str = "rate_limits";
const GENERATION_LOG_TABLE: &str = "sitemap_generation_logs";

/// HTTP client for a PostgREST API.
pub struct RestStore {
    base_url: String,
    service_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ContentRow {
    slug: String,
    updated_at: DateTime<Utc>,
}

impl RestStore {
    /// Create a client for the API at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn key_filter(key: &RateLimitKey) -> [(&'static str, String); 2] {
        [
            ("identifier", format!("eq.{}", key.identity)),
            ("endpoint", format!("eq.{}", key.endpoint)),
        ]
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(StoreError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }

    async fn content_of(&self, kind: ContentKind) -> Result<Vec<ContentItem>, StoreError> {
        let (table, published_filter) = match kind {
            ContentKind::Project => ("projects", ("published", "eq.true")),
            ContentKind::BlogPost => ("blog_posts", ("status", "eq.published")),
            ContentKind::Service => ("services", ("active", "eq.true")),
        };

        let response = self
            .send(
                self.client
                    .get(self.table_url(table))
                    .query(&[("select", "slug,updated_at"), published_filter]),
            )
            .await?;

        let rows: Vec<ContentRow> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| ContentItem {
                kind,
                slug: row.slug,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

#[async_trait]
impl RateLimitStore for RestStore {
    async fn fetch(&self, key: &RateLimitKey) -> Result<Option<RateLimitRecord>, StoreError> {
        let response = self
            .send(
                self.client
                    .get(self.table_url(RATE_LIMIT_TABLE))
                    .query(&Self::key_filter(key))
                    .query(&[("select", "*"), ("limit", "1")]),
            )
            .await?;

        let mut rows: Vec<RateLimitRecord> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        debug!(identity = %key.identity, endpoint = %key.endpoint, found = !rows.is_empty(), "Fetched rate limit record");
        Ok(rows.pop())
    }

    async fn insert(&self, record: &RateLimitRecord) -> Result<(), StoreError> {
        self.send(
            self.client
                .post(self.table_url(RATE_LIMIT_TABLE))
                .header("Prefer", "return=minimal")
                .json(record),
        )
        .await?;
        Ok(())
    }

    async fn update(&self, record: &RateLimitRecord) -> Result<(), StoreError> {
        self.send(
            self.client
                .patch(self.table_url(RATE_LIMIT_TABLE))
                .query(&Self::key_filter(&record.key()))
                .header("Prefer", "return=minimal")
                .json(&serde_json::json!({
                    "request_count": record.count,
                    "window_start": record.window_start,
                })),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl GenerationLogStore for RestStore {
    async fn append(&self, entry: &GenerationLogEntry) -> Result<(), StoreError> {
        self.send(
            self.client
                .post(self.table_url(GENERATION_LOG_TABLE))
                .header("Prefer", "return=minimal")
                .json(entry),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentSource for RestStore {
    async fn published_content(&self) -> Result<Vec<ContentItem>, StoreError> {
        let mut items = Vec::new();
        for kind in ContentKind::ALL {
            items.extend(self.content_of(kind).await?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let store = RestStore::new("https://db.example.com/", "key", Duration::from_secs(1)).unwrap();
        assert_eq!(
            store.table_url(RATE_LIMIT_TABLE),
            "https://db.example.com/rest/v1/rate_limits"
        );
    }

    #[test]
    fn test_key_filter_uses_equality_operators() {
        let key = RateLimitKey::new("198.51.100.4", "contact-notification");
        let filter = RestStore::key_filter(&key);
        assert_eq!(filter[0], ("identifier", "eq.198.51.100.4".to_string()));
        assert_eq!(filter[1], ("endpoint", "eq.contact-notification".to_string()));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        // Port 9 on localhost is reserved (discard) and refuses connections.
        let store = RestStore::new("http://127.0.0.1:9", "key", Duration::from_millis(500)).unwrap();
        let key = RateLimitKey::new("unknown", "contact-notification");

        let result = store.fetch(&key).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
