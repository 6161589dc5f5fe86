// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Shared application state and its construction from configuration.

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, EmailProviderKind, StoreBackend};
use crate::dispatcher::NotificationDispatcher;
use crate::email::{ConsoleProvider, EmailError, EmailProvider, ResendProvider};
use crate::limiter::AdmissionController;
use crate::metrics::Metrics;
use crate::rest_store::RestStore;
use crate::sitemap::SitemapGenerator;
use crate::store::{ContentSource, GenerationLogStore, MemoryStore, RateLimitStore, StoreError};
use crate::validator::SubmissionValidator;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while wiring the service together.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("missing setting: {0}")]
    Missing(&'static str),

    #[error("failed to build store client: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build email client: {0}")]
    Email(#[from] EmailError),

    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// External collaborators the gateway talks to.
pub struct Collaborators {
    pub rate_limits: Arc<dyn RateLimitStore>,
    pub generation_log: Arc<dyn GenerationLogStore>,
    pub content: Arc<dyn ContentSource>,
    pub email: Arc<dyn EmailProvider>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Everything in process: memory store, console email, system clock.
    pub fn in_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            rate_limits: store.clone(),
            generation_log: store.clone(),
            content: store,
            email: Arc::new(ConsoleProvider),
            clock: Arc::new(SystemClock),
        }
    }

    /// Build the collaborators named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let mut collaborators = match config.store.backend {
            StoreBackend::Memory => Self::in_memory(MemoryStore::new()),
            StoreBackend::Rest => {
                let url = config.store.url.as_deref().ok_or(StateError::Missing("store.url"))?;
                let key = config
                    .store
                    .service_key
                    .as_deref()
                    .ok_or(StateError::Missing("store.service_key"))?;
                let store = Arc::new(RestStore::new(url, key, config.store.request_timeout())?);
                Self {
                    rate_limits: store.clone(),
                    generation_log: store.clone(),
                    content: store,
                    email: Arc::new(ConsoleProvider),
                    clock: Arc::new(SystemClock),
                }
            }
        };

        if config.email.provider == EmailProviderKind::Resend {
            let key = config
                .email
                .api_key
                .as_deref()
                .ok_or(StateError::Missing("email.api_key"))?;
            collaborators.email = Arc::new(ResendProvider::new(
                config.email.api_url.clone(),
                key,
                config.notify.send_timeout(),
            )?);
        }

        Ok(collaborators)
    }
}

/// Shared application state.
pub struct AppState {
    pub controller: AdmissionController,
    pub validator: SubmissionValidator,
    pub dispatcher: NotificationDispatcher,
    pub sitemap: SitemapGenerator,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, collaborators: Collaborators) -> Result<Self, StateError> {
        Ok(Self {
            controller: AdmissionController::new(
                config.rate_limit.clone(),
                collaborators.rate_limits,
                collaborators.clock.clone(),
            ),
            validator: SubmissionValidator::new(config.validation.clone()),
            dispatcher: NotificationDispatcher::new(collaborators.email, config.notify.clone()),
            sitemap: SitemapGenerator::new(
                config.sitemap.clone(),
                collaborators.content,
                collaborators.generation_log,
                collaborators.clock,
            ),
            metrics: Metrics::new()?,
            config,
        })
    }

    /// Build state with the collaborators `config` names.
    pub fn from_config(config: Config) -> Result<Self, StateError> {
        let collaborators = Collaborators::from_config(&config)?;
        Self::new(config, collaborators)
    }
}
