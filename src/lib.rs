// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Inquiry Gateway
//!
//! Admission control and notification dispatch for public inquiry forms:
//!
//! - Per-identity, per-endpoint fixed-window rate limiting (50 per 60s default)
//! - Fail-open admission when the counter store is unreachable
//! - Field validation with field-identifying rejection reasons
//! - HTML escaping of every free-text field before it reaches a template
//! - Staff notice plus submitter confirmation, each sent independently
//!   under its own timeout
//! - Authenticated sitemap generation with a per-attempt generation log

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod email;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod rest_store;
pub mod sanitizer;
pub mod sitemap;
pub mod state;
pub mod store;
pub mod templates;
pub mod validator;

pub use config::Config;
pub use dispatcher::{DispatchResult, NotificationDispatcher};
pub use limiter::{Admission, AdmissionController};
pub use sanitizer::sanitize;
pub use state::{AppState, Collaborators};
pub use validator::{SubmissionValidator, ValidationResult};
