// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome tally for flood simulations.

use axum::http::StatusCode;
use std::collections::HashMap;

/// How the gateway answered one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Accepted,
    Rejected,
    RateLimited,
    Unauthorized,
    Failed,
}

impl From<StatusCode> for Outcome {
    fn from(status: StatusCode) -> Self {
        match status {
            StatusCode::OK => Outcome::Accepted,
            StatusCode::BAD_REQUEST => Outcome::Rejected,
            StatusCode::TOO_MANY_REQUESTS => Outcome::RateLimited,
            StatusCode::UNAUTHORIZED => Outcome::Unauthorized,
            _ => Outcome::Failed,
        }
    }
}

/// Counts outcomes overall and per identity.
#[derive(Debug, Default)]
pub struct Tally {
    outcomes: HashMap<Outcome, usize>,
    per_identity: HashMap<String, HashMap<Outcome, usize>>,
    /// Index (0-based) of the first rate-limited request, if any
    first_limited: Option<usize>,
    seen: usize,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, identity: &str, status: StatusCode) {
        let outcome = Outcome::from(status);
        if outcome == Outcome::RateLimited && self.first_limited.is_none() {
            self.first_limited = Some(self.seen);
        }
        self.seen += 1;
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self
            .per_identity
            .entry(identity.to_string())
            .or_default()
            .entry(outcome)
            .or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.seen
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    pub fn count_for(&self, identity: &str, outcome: Outcome) -> usize {
        self.per_identity
            .get(identity)
            .and_then(|m| m.get(&outcome))
            .copied()
            .unwrap_or(0)
    }

    pub fn first_limited(&self) -> Option<usize> {
        self.first_limited
    }

    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total requests: {}", self.total());
        println!("Accepted: {}", self.count(Outcome::Accepted));
        println!("Rejected: {}", self.count(Outcome::Rejected));
        println!("Rate limited: {}", self.count(Outcome::RateLimited));
        println!("Failed: {}", self.count(Outcome::Failed));
        if let Some(i) = self.first_limited {
            println!("First limited at request #{}", i + 1);
        }
    }
}
