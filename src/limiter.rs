// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window admission control for inquiry endpoints.
//!
//! Each (identity, endpoint) pair owns one persisted counter. The first
//! request opens a window; requests inside the window are admitted while
//! the counter is below the quota; the first request after the window
//! has elapsed opens a new one.
//!
//! The read-then-write sequence is not atomic. Two concurrent requests
//! may both observe `count < max` and both be admitted, so the quota is
//! an approximate upper bound under bursts.
//!
//! A store that cannot be read fails open: the request is admitted and
//! reported as [`Admission::StoreUnavailable`].

use crate::clock::Clock;
use crate::config::{RateLimitConfig, WindowPolicy};
use crate::store::{RateLimitKey, RateLimitRecord, RateLimitStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Identity used when a request carries no forwarded address.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Request is within quota
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Quota for the current window is spent
    Denied {
        /// Time until the window rolls over
        retry_after: Duration,
    },
    /// Store could not be read; request admitted anyway
    StoreUnavailable,
}

impl Admission {
    /// Whether the request may proceed.
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Admission::Denied { .. })
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            Admission::Allowed { .. } => "allowed",
            Admission::Denied { .. } => "denied",
            Admission::StoreUnavailable => "fail_open",
        }
    }
}

/// Derive the client identity from an `x-forwarded-for` value.
///
/// Uses the first (client-most) hop; falls back to [`UNKNOWN_IDENTITY`].
pub fn identity_from_forwarded(header: Option<&str>) -> String {
    header
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .unwrap_or(UNKNOWN_IDENTITY)
        .to_string()
}

/// Decides accept/reject for incoming requests.
pub struct AdmissionController {
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    /// Create a new controller with the given configuration.
    pub fn new(
        config: RateLimitConfig,
        store: Arc<dyn RateLimitStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    /// Check and count one request from `identity` against `endpoint`.
    pub async fn admit(&self, identity: &str, endpoint: &str) -> Admission {
        let policy = self.config.policy_for(endpoint);
        let key = RateLimitKey::new(identity, endpoint);
        let now = self.clock.now();

        let existing = match self.store.fetch(&key).await {
            Ok(existing) => existing,
            Err(err) => {
                warn!(%identity, %endpoint, error = %err, "Rate limit store unavailable, failing open");
                return Admission::StoreUnavailable;
            }
        };

        let (record, is_new) = match existing {
            None => (RateLimitRecord::opened(&key, now), true),
            Some(record) if now - record.window_start >= policy.window() => {
                debug!(%identity, %endpoint, "Window elapsed, opening a new one");
                (RateLimitRecord::opened(&key, now), false)
            }
            Some(record) if record.count >= policy.max_requests => {
                let retry_after = time_left(&record, &policy, now);
                debug!(%identity, %endpoint, count = record.count, ?retry_after, "Rate limit exceeded");
                return Admission::Denied { retry_after };
            }
            Some(mut record) => {
                record.count += 1;
                (record, false)
            }
        };

        let write = if is_new {
            self.store.insert(&record).await
        } else {
            self.store.update(&record).await
        };
        if let Err(err) = write {
            // The decision was made on a successful read; losing the
            // increment only loosens the quota.
            warn!(%identity, %endpoint, error = %err, "Failed to persist rate limit counter");
        }

        Admission::Allowed {
            remaining: policy.max_requests.saturating_sub(record.count),
            reset_in: time_left(&record, &policy, now),
        }
    }
}

fn time_left(record: &RateLimitRecord, policy: &WindowPolicy, now: DateTime<Utc>) -> Duration {
    (record.window_start + policy.window() - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;

    struct Harness {
        controller: AdmissionController,
        store: MemoryStore,
        clock: Arc<ManualClock>,
    }

    fn harness(max_requests: u32, window_secs: u64) -> Harness {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let controller = AdmissionController::new(
            RateLimitConfig {
                max_requests,
                window_secs,
                ..Default::default()
            },
            Arc::new(store.clone()),
            clock.clone(),
        );
        Harness {
            controller,
            store,
            clock,
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RateLimitStore for BrokenStore {
        async fn fetch(&self, _: &RateLimitKey) -> Result<Option<RateLimitRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn insert(&self, _: &RateLimitRecord) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn update(&self, _: &RateLimitRecord) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_window_admits_first_n_then_rolls_over() {
        let h = harness(3, 1);
        let ms = chrono::Duration::milliseconds;

        // t = 0.0, 0.1, 0.2
        for i in 0..3 {
            if i > 0 {
                h.clock.advance(ms(100));
            }
            let result = h.controller.admit("10.0.0.1", "contact-notification").await;
            assert!(
                matches!(result, Admission::Allowed { .. }),
                "request {} should be admitted",
                i + 1
            );
        }

        // t = 0.3
        h.clock.advance(ms(100));
        let result = h.controller.admit("10.0.0.1", "contact-notification").await;
        assert!(matches!(result, Admission::Denied { .. }));

        // t = 1.1, new window
        h.clock.advance(ms(800));
        let result = h.controller.admit("10.0.0.1", "contact-notification").await;
        assert!(matches!(result, Admission::Allowed { remaining: 2, .. }));

        let key = RateLimitKey::new("10.0.0.1", "contact-notification");
        assert_eq!(h.store.record(&key).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_denial_does_not_increment() {
        let h = harness(2, 60);
        for _ in 0..5 {
            h.controller.admit("10.0.0.2", "rfp-notification").await;
        }

        let key = RateLimitKey::new("10.0.0.2", "rfp-notification");
        assert_eq!(h.store.record(&key).await.unwrap().count, 2);
    }

    #[tokio::test]
    async fn test_retry_after_counts_down_to_window_end() {
        let h = harness(1, 60);
        h.controller.admit("10.0.0.3", "contact-notification").await;
        h.clock.advance(chrono::Duration::seconds(45));

        match h.controller.admit("10.0.0.3", "contact-notification").await {
            Admission::Denied { retry_after } => assert_eq!(retry_after, Duration::from_secs(15)),
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_window_boundary_is_exclusive() {
        let h = harness(1, 1);
        h.controller.admit("10.0.0.4", "contact-notification").await;

        // now - window_start == W opens a new window
        h.clock.advance(chrono::Duration::seconds(1));
        let result = h.controller.admit("10.0.0.4", "contact-notification").await;
        assert!(result.is_admitted());
    }

    #[tokio::test]
    async fn test_identities_and_endpoints_are_independent() {
        let h = harness(1, 60);
        assert!(h.controller.admit("10.0.0.5", "contact-notification").await.is_admitted());
        assert!(!h.controller.admit("10.0.0.5", "contact-notification").await.is_admitted());

        assert!(h.controller.admit("10.0.0.6", "contact-notification").await.is_admitted());
        assert!(h.controller.admit("10.0.0.5", "rfp-notification").await.is_admitted());
    }

    #[tokio::test]
    async fn test_store_failure_fails_open() {
        let controller = AdmissionController::new(
            RateLimitConfig::default(),
            Arc::new(BrokenStore),
            Arc::new(ManualClock::new(Utc::now())),
        );

        for _ in 0..100 {
            let result = controller.admit("10.0.0.7", "contact-notification").await;
            assert_eq!(result, Admission::StoreUnavailable);
            assert!(result.is_admitted());
        }
    }

    #[test]
    fn test_identity_from_forwarded() {
        assert_eq!(identity_from_forwarded(Some("203.0.113.1")), "203.0.113.1");
        assert_eq!(
            identity_from_forwarded(Some(" 203.0.113.1 , 10.0.0.1")),
            "203.0.113.1"
        );
        assert_eq!(identity_from_forwarded(Some("")), UNKNOWN_IDENTITY);
        assert_eq!(identity_from_forwarded(None), UNKNOWN_IDENTITY);
    }
}
