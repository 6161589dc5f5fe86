// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the inquiry gateway.
//!
//! Scripted collaborators, payload generators, an outcome tally for
//! flood runs, and helpers for driving the router in-process.

#![allow(dead_code)]

pub mod collaborators;
pub mod generators;
pub mod tally;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use chrono::Utc;
use collaborators::{RecordingProvider, ScriptedStore};
use inquiry_gateway::{
    clock::ManualClock, handlers::router, store::MemoryStore, AppState, Collaborators, Config,
};
use std::sync::Arc;
use tower::ServiceExt;

/// A router plus handles on every collaborator behind it.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub email: Arc<RecordingProvider>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// Default config with fast sends and a known sitemap token.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, RecordingProvider::default(), None)
    }

    pub fn with_email(email: RecordingProvider) -> Self {
        Self::build(test_config(), email, None)
    }

    /// Route rate-limit reads and writes through `store` instead of memory.
    pub fn with_rate_limit_store(store: Arc<ScriptedStore>) -> Self {
        Self::build(test_config(), RecordingProvider::default(), Some(store))
    }

    fn build(
        config: Config,
        email: RecordingProvider,
        rate_limits: Option<Arc<ScriptedStore>>,
    ) -> Self {
        let store = MemoryStore::with_content(generators::published_content());
        let email = Arc::new(email);
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let mut collaborators = Collaborators::in_memory(store.clone());
        collaborators.email = email.clone();
        collaborators.clock = clock.clone();
        if let Some(scripted) = rate_limits {
            collaborators.rate_limits = scripted;
        }

        let state = AppState::new(config, collaborators).expect("state builds");
        Self {
            router: router(Arc::new(state)),
            store,
            email,
            clock,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.notify.send_timeout_ms = 200;
    config.notify.staff_recipients = vec!["office@harbor.example".to_string()];
    config.sitemap.base_url = "https://harbor.example".to_string();
    config.sitemap.tokens = vec![generators::SITEMAP_TOKEN.to_string()];
    config
}

/// POST a JSON body as if forwarded for `ip`.
pub fn post_json(path: &str, ip: &str, body: &serde_json::Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}
