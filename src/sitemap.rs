// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sitemap generation.
//!
//! Lists the configured static pages followed by every published project,
//! blog post and service, and appends one [`GenerationLogEntry`] per
//! attempt. The log write is best effort: its failure is logged and never
//! changes the generation result.

use crate::clock::Clock;
use crate::config::SitemapConfig;
use crate::store::{
    ContentItem, ContentKind, ContentSource, GenerationLogEntry, GenerationLogStore,
    GenerationStatus, StoreError,
};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

/// Sitemap generation errors.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("failed to read published content: {0}")]
    Content(#[from] StoreError),

    #[error("invalid sitemap URL: {0}")]
    Url(#[from] url::ParseError),
}

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: Url,
    pub lastmod: DateTime<Utc>,
    pub changefreq: String,
    pub priority: f32,
}

/// A rendered sitemap document.
#[derive(Debug, Clone)]
pub struct SitemapDocument {
    pub xml: String,
    pub url_count: usize,
}

impl ContentKind {
    fn path_prefix(&self) -> &'static str {
        match self {
            ContentKind::Project => "projects",
            ContentKind::BlogPost => "blog",
            ContentKind::Service => "services",
        }
    }

    fn changefreq(&self) -> &'static str {
        match self {
            ContentKind::Project => "monthly",
            ContentKind::BlogPost => "weekly",
            ContentKind::Service => "monthly",
        }
    }

    fn priority(&self) -> f32 {
        match self {
            ContentKind::Project => 0.7,
            ContentKind::BlogPost => 0.6,
            ContentKind::Service => 0.8,
        }
    }
}

/// Builds sitemaps and records each attempt.
pub struct SitemapGenerator {
    config: SitemapConfig,
    content: Arc<dyn ContentSource>,
    log: Arc<dyn GenerationLogStore>,
    clock: Arc<dyn Clock>,
}

impl SitemapGenerator {
    pub fn new(
        config: SitemapConfig,
        content: Arc<dyn ContentSource>,
        log: Arc<dyn GenerationLogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            content,
            log,
            clock,
        }
    }

    /// Whether `token` may trigger generation.
    pub fn authorizes(&self, token: &str) -> bool {
        !token.is_empty() && self.config.tokens.iter().any(|t| t == token)
    }

    /// Generate the sitemap and append one log entry describing the attempt.
    pub async fn generate(&self) -> Result<SitemapDocument, SitemapError> {
        let now = self.clock.now();
        let result = self.build(now).await;

        let entry = match &result {
            Ok(doc) => {
                info!(url_count = doc.url_count, "Sitemap generated");
                GenerationLogEntry {
                    url_count: doc.url_count,
                    status: GenerationStatus::Success,
                    error_message: None,
                    created_at: now,
                }
            }
            Err(err) => {
                error!(error = %err, "Sitemap generation failed");
                GenerationLogEntry {
                    url_count: 0,
                    status: GenerationStatus::Error,
                    error_message: Some(err.to_string()),
                    created_at: now,
                }
            }
        };

        if let Err(err) = self.log.append(&entry).await {
            warn!(error = %err, "Failed to record sitemap generation");
        }

        result
    }

    async fn build(&self, now: DateTime<Utc>) -> Result<SitemapDocument, SitemapError> {
        let base = Url::parse(&self.config.base_url)?;
        let mut entries = Vec::new();

        for page in &self.config.static_pages {
            entries.push(SitemapEntry {
                loc: site_url(&base, page.path.split('/'))?,
                lastmod: now,
                changefreq: page.changefreq.clone(),
                priority: page.priority,
            });
        }

        let mut items = self.content.published_content().await?;
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        for item in &items {
            entries.push(content_entry(&base, item)?);
        }

        Ok(SitemapDocument {
            url_count: entries.len(),
            xml: render(&entries),
        })
    }
}

/// Append path segments to `base`, keeping any path prefix it carries.
fn site_url<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, url::ParseError> {
    let mut loc = base.clone();
    loc.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments.into_iter().filter(|s| !s.is_empty()));
    Ok(loc)
}

fn content_entry(base: &Url, item: &ContentItem) -> Result<SitemapEntry, url::ParseError> {
    Ok(SitemapEntry {
        loc: site_url(base, [item.kind.path_prefix(), item.slug.as_str()])?,
        lastmod: item.updated_at,
        changefreq: item.kind.changefreq().to_string(),
        priority: item.kind.priority(),
    })
}

/// Render entries as a sitemaps.org `<urlset>` document.
pub fn render(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        // Writing into a String cannot fail.
        let _ = write!(
            xml,
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    \
             <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>\n",
            xml_escape(entry.loc.as_str()),
            entry.lastmod.format("%Y-%m-%d"),
            xml_escape(&entry.changefreq),
            entry.priority,
        );
    }
    xml.push_str("</urlset>\n");
    xml
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::StaticPage;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct Unreachable;

    #[async_trait]
    impl ContentSource for Unreachable {
        async fn published_content(&self) -> Result<Vec<ContentItem>, StoreError> {
            Err(StoreError::Unavailable("timed out".to_string()))
        }
    }

    #[async_trait]
    impl GenerationLogStore for Unreachable {
        async fn append(&self, _: &GenerationLogEntry) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("timed out".to_string()))
        }
    }

    fn config() -> SitemapConfig {
        SitemapConfig {
            base_url: "https://harbor.example".to_string(),
            tokens: vec!["s3cret".to_string()],
            static_pages: vec![StaticPage {
                path: "/".to_string(),
                changefreq: "weekly".to_string(),
                priority: 1.0,
            }],
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_base_path_prefix_is_kept() {
        let store = MemoryStore::new();
        store
            .publish(ContentItem {
                kind: ContentKind::Service,
                slug: "design-build".to_string(),
                updated_at: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
            })
            .await;
        let mut config = config();
        config.base_url = "https://x.example/site".to_string();
        config.static_pages.push(StaticPage {
            path: "/about".to_string(),
            changefreq: "monthly".to_string(),
            priority: 0.8,
        });
        let generator =
            SitemapGenerator::new(config, Arc::new(store.clone()), Arc::new(store), clock());

        let doc = generator.generate().await.unwrap();
        assert!(doc.xml.contains("<loc>https://x.example/site</loc>"));
        assert!(doc.xml.contains("<loc>https://x.example/site/about</loc>"));
        assert!(doc.xml.contains("<loc>https://x.example/site/services/design-build</loc>"));
    }

    #[tokio::test]
    async fn test_generates_static_and_content_urls() {
        let store = MemoryStore::with_content(vec![ContentItem {
            kind: ContentKind::Project,
            slug: "harbor-warehouse".to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
        }]);
        let generator =
            SitemapGenerator::new(config(), Arc::new(store.clone()), Arc::new(store.clone()), clock());

        let doc = generator.generate().await.unwrap();
        assert_eq!(doc.url_count, 2);
        assert!(doc.xml.contains("<loc>https://harbor.example/</loc>"));
        assert!(doc.xml.contains("<loc>https://harbor.example/projects/harbor-warehouse</loc>"));
        assert!(doc.xml.contains("<lastmod>2026-01-02</lastmod>"));
        assert!(doc.xml.contains("<lastmod>2026-03-14</lastmod>"));
        assert!(doc.xml.contains("<priority>0.7</priority>"));

        let log = store.generation_log().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, GenerationStatus::Success);
        assert_eq!(log[0].url_count, 2);
    }

    #[tokio::test]
    async fn test_content_failure_logs_error_entry() {
        let log = MemoryStore::new();
        let generator =
            SitemapGenerator::new(config(), Arc::new(Unreachable), Arc::new(log.clone()), clock());

        assert!(matches!(generator.generate().await, Err(SitemapError::Content(_))));

        let entries = log.generation_log().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, GenerationStatus::Error);
        assert!(entries[0].error_message.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_log_failure_is_not_fatal() {
        let store = MemoryStore::new();
        let generator =
            SitemapGenerator::new(config(), Arc::new(store), Arc::new(Unreachable), clock());

        assert!(generator.generate().await.is_ok());
    }

    #[test]
    fn test_slug_is_path_encoded() {
        let base = Url::parse("https://harbor.example").unwrap();
        let entry = content_entry(
            &base,
            &ContentItem {
                kind: ContentKind::BlogPost,
                slug: "roofs & <gutters>".to_string(),
                updated_at: Utc::now(),
            },
        )
        .unwrap();
        assert_eq!(entry.loc.path(), "/blog/roofs%20&%20%3Cgutters%3E");
        assert!(render(&[entry]).contains("roofs%20&amp;%20%3Cgutters%3E"));
    }

    #[test]
    fn test_authorizes_configured_tokens_only() {
        let store = Arc::new(MemoryStore::new());
        let generator = SitemapGenerator::new(config(), store.clone(), store, clock());
        assert!(generator.authorizes("s3cret"));
        assert!(!generator.authorizes("guess"));
        assert!(!generator.authorizes(""));
    }
}
