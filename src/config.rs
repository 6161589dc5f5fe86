// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the inquiry gateway.
//!
//! Every field has a default so the service starts with an in-memory store
//! and a console email provider. Production deployments override values
//! through environment variables prefixed with `GATEWAY` (nested keys are
//! separated by `__`), or through a file named by `GATEWAY_CONFIG`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Top-level configuration for the inquiry gateway service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Admission control configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Submission validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Notification addressing and timeouts
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Email provider selection
    #[serde(default)]
    pub email: EmailConfig,

    /// Backing store selection
    #[serde(default)]
    pub store: StoreConfig,

    /// Sitemap generation
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// A fixed-window quota: at most `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPolicy {
    /// Maximum admitted requests per window (default: 50)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Admission control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window per identity (default: 50)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Per-endpoint overrides keyed by endpoint name
    #[serde(default)]
    pub endpoints: HashMap<String, WindowPolicy>,
}

/// Validation configuration for inquiry submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Accepted `submissionType` tags on contact submissions
    #[serde(default = "default_submission_types")]
    pub submission_types: Vec<String>,
}

/// Notification addressing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Sender address for every outbound message
    #[serde(default = "default_from")]
    pub from: String,

    /// Staff mailboxes that receive new-inquiry notices
    #[serde(default = "default_staff_recipients")]
    pub staff_recipients: Vec<String>,

    /// Company name used in confirmation copy
    #[serde(default = "default_company_name")]
    pub company_name: String,

    /// Public site URL linked from confirmation copy
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Upper bound for a single provider send in milliseconds (default: 10000)
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

/// Which email provider implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderKind {
    /// Log messages instead of sending them
    Console,
    /// Resend-compatible HTTP API
    Resend,
}

/// Email provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_provider")]
    pub provider: EmailProviderKind,

    #[serde(default = "default_email_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

/// Which backing store implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local tables, lost on restart
    Memory,
    /// PostgREST-compatible HTTP API
    Rest,
}

/// Backing store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,

    /// Base URL of the REST API (required for `rest`)
    #[serde(default)]
    pub url: Option<String>,

    /// Service key sent as `apikey` and bearer token (required for `rest`)
    #[serde(default)]
    pub service_key: Option<String>,

    /// Per-request timeout in milliseconds (default: 5000)
    #[serde(default = "default_store_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// A fixed page listed in every sitemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticPage {
    pub path: String,
    pub changefreq: String,
    pub priority: f32,
}

/// Sitemap generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Absolute site origin that `<loc>` values are built from
    #[serde(default = "default_site_url")]
    pub base_url: String,

    /// Bearer tokens allowed to trigger generation
    #[serde(default)]
    pub tokens: Vec<String>,

    /// Fixed pages, listed before published content
    #[serde(default = "default_static_pages")]
    pub static_pages: Vec<StaticPage>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

/// Errors raised while loading or checking configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Longest accepted rate-limit window (one day).
pub const MAX_WINDOW_SECS: u64 = 86_400;

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    50
}

fn default_window_secs() -> u64 {
    60
}

fn default_submission_types() -> Vec<String> {
    ["general", "quote", "project", "careers", "support"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_from() -> String {
    "Website <noreply@example.com>".to_string()
}

fn default_staff_recipients() -> Vec<String> {
    vec!["office@example.com".to_string()]
}

fn default_company_name() -> String {
    "Our team".to_string()
}

fn default_site_url() -> String {
    "https://www.example.com".to_string()
}

fn default_send_timeout_ms() -> u64 {
    10_000
}

fn default_email_provider() -> EmailProviderKind {
    EmailProviderKind::Console
}

fn default_email_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_static_pages() -> Vec<StaticPage> {
    [
        ("/", "weekly", 1.0),
        ("/about", "monthly", 0.8),
        ("/services", "monthly", 0.9),
        ("/projects", "weekly", 0.9),
        ("/blog", "weekly", 0.8),
        ("/contact", "monthly", 0.7),
        ("/rfp", "monthly", 0.7),
    ]
    .iter()
    .map(|(path, changefreq, priority)| StaticPage {
        path: path.to_string(),
        changefreq: changefreq.to_string(),
        priority: *priority,
    })
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            notify: NotifyConfig::default(),
            email: EmailConfig::default(),
            store: StoreConfig::default(),
            sitemap: SitemapConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            endpoints: HashMap::new(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            submission_types: default_submission_types(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            staff_recipients: default_staff_recipients(),
            company_name: default_company_name(),
            site_url: default_site_url(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: default_email_provider(),
            api_url: default_email_api_url(),
            api_key: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: None,
            service_key: None,
            request_timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            base_url: default_site_url(),
            tokens: Vec::new(),
            static_pages: default_static_pages(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl WindowPolicy {
    /// Get the window length as a chrono duration, capped at [`MAX_WINDOW_SECS`].
    pub fn window(&self) -> chrono::Duration {
        let secs = self.window_secs.min(MAX_WINDOW_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(0))
    }
}

impl RateLimitConfig {
    /// Resolve the policy for an endpoint, falling back to the default quota.
    pub fn policy_for(&self, endpoint: &str) -> WindowPolicy {
        self.endpoints
            .get(endpoint)
            .copied()
            .unwrap_or_else(|| self.default_policy())
    }

    /// The quota applied to endpoints without an override.
    pub fn default_policy(&self) -> WindowPolicy {
        WindowPolicy {
            max_requests: self.max_requests,
            window_secs: self.window_secs,
        }
    }
}

impl NotifyConfig {
    /// Get the per-send timeout
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl StoreConfig {
    /// Get the per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Config {
    /// Load configuration from `.env`, an optional file, and `GATEWAY_*`
    /// environment variables, in increasing order of precedence.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var("GATEWAY_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }

        let loaded: Config = builder
            .add_source(
                config::Environment::with_prefix("GATEWAY")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("notify.staff_recipients")
                    .with_list_parse_key("sitemap.tokens")
                    .with_list_parse_key("validation.submission_types")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut policies = vec![("default".to_string(), self.rate_limit.default_policy())];
        policies.extend(
            self.rate_limit
                .endpoints
                .iter()
                .map(|(name, policy)| (name.clone(), *policy)),
        );
        for (name, policy) in policies {
            if policy.max_requests == 0 || policy.window_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "rate limit policy `{name}` must have a non-zero quota and window"
                )));
            }
            if policy.window_secs > MAX_WINDOW_SECS {
                return Err(ConfigError::Invalid(format!(
                    "rate limit policy `{name}` window exceeds {MAX_WINDOW_SECS} seconds"
                )));
            }
        }

        if self.notify.staff_recipients.is_empty() {
            return Err(ConfigError::Invalid(
                "notify.staff_recipients must list at least one address".to_string(),
            ));
        }

        if self.email.provider == EmailProviderKind::Resend && self.email.api_key.is_none() {
            return Err(ConfigError::Invalid(
                "email.api_key is required for the resend provider".to_string(),
            ));
        }

        if self.store.backend == StoreBackend::Rest
            && (self.store.url.is_none() || self.store.service_key.is_none())
        {
            return Err(ConfigError::Invalid(
                "store.url and store.service_key are required for the rest backend".to_string(),
            ));
        }

        url::Url::parse(&self.sitemap.base_url).map_err(|e| {
            ConfigError::Invalid(format!("sitemap.base_url is not a valid URL: {e}"))
        })?;

        Ok(())
    }
}
