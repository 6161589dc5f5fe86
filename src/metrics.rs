// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for admission, validation, dispatch and sitemap runs.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Per-process metric set with its own registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    admissions: IntCounterVec,
    validation_failures: IntCounterVec,
    dispatches: IntCounterVec,
    sitemap_generations: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let admissions = IntCounterVec::new(
            Opts::new("gateway_admissions_total", "Admission decisions"),
            &["endpoint", "outcome"],
        )?;
        let validation_failures = IntCounterVec::new(
            Opts::new("gateway_validation_failures_total", "Rejected submissions"),
            &["endpoint", "field"],
        )?;
        let dispatches = IntCounterVec::new(
            Opts::new("gateway_dispatches_total", "Notification send attempts"),
            &["audience", "outcome"],
        )?;
        let sitemap_generations = IntCounterVec::new(
            Opts::new("gateway_sitemap_generations_total", "Sitemap generation attempts"),
            &["status"],
        )?;

        registry.register(Box::new(admissions.clone()))?;
        registry.register(Box::new(validation_failures.clone()))?;
        registry.register(Box::new(dispatches.clone()))?;
        registry.register(Box::new(sitemap_generations.clone()))?;

        Ok(Self {
            registry,
            admissions,
            validation_failures,
            dispatches,
            sitemap_generations,
        })
    }

    pub fn admission(&self, endpoint: &str, outcome: &str) {
        self.admissions.with_label_values(&[endpoint, outcome]).inc();
    }

    pub fn validation_failure(&self, endpoint: &str, field: &str) {
        self.validation_failures
            .with_label_values(&[endpoint, field])
            .inc();
    }

    pub fn dispatch(&self, audience: &str, success: bool) {
        let outcome = if success { "sent" } else { "failed" };
        self.dispatches.with_label_values(&[audience, outcome]).inc();
    }

    pub fn sitemap_generation(&self, status: &str) {
        self.sitemap_generations.with_label_values(&[status]).inc();
    }

    /// Render all metrics in the text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
