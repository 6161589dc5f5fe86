// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Notification dispatch for validated, sanitized inquiries.
//!
//! Every inquiry produces two sends: a notice to staff and a confirmation
//! to the submitter. Sends are attempted one after another, each under its
//! own timeout, and a failure never prevents the next attempt. One
//! [`DispatchResult`] is returned per attempted send.

use crate::config::NotifyConfig;
use crate::email::{EmailError, EmailMessage, EmailProvider};
use crate::sanitizer::{SanitizedContact, SanitizedRfp};
use crate::templates::{self, Rendered};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, warn};

/// Who a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Internal staff mailboxes
    Staff,
    /// The person who submitted the form
    Submitter,
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::Staff => write!(f, "staff"),
            Audience::Submitter => write!(f, "submitter"),
        }
    }
}

/// Caller-safe classification of a failed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchFailure {
    /// Provider did not answer within the send timeout
    Timeout,
    /// Provider or transport reported an error
    Provider,
    /// Message was refused before sending
    Rejected,
}

/// Outcome of one attempted send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub audience: Audience,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DispatchFailure>,
}

impl DispatchResult {
    fn sent(audience: Audience, id: String) -> Self {
        Self {
            audience,
            success: true,
            message_id: Some(id),
            error: None,
        }
    }

    fn failed(audience: Audience, failure: DispatchFailure) -> Self {
        Self {
            audience,
            success: false,
            message_id: None,
            error: Some(failure),
        }
    }
}

/// How a set of sends turned out as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    Partial,
    Failed,
}

/// Classify a batch of results.
pub fn outcome_of(results: &[DispatchResult]) -> DispatchOutcome {
    let sent = results.iter().filter(|r| r.success).count();
    if sent == results.len() {
        DispatchOutcome::Completed
    } else if sent == 0 {
        DispatchOutcome::Failed
    } else {
        DispatchOutcome::Partial
    }
}

/// Formats and sends inquiry notifications.
pub struct NotificationDispatcher {
    provider: Arc<dyn EmailProvider>,
    config: NotifyConfig,
}

impl NotificationDispatcher {
    pub fn new(provider: Arc<dyn EmailProvider>, config: NotifyConfig) -> Self {
        Self { provider, config }
    }

    /// Notify staff of a contact submission and confirm receipt to the submitter.
    pub async fn dispatch_contact(&self, contact: &SanitizedContact) -> Vec<DispatchResult> {
        let plan = [
            (
                Audience::Staff,
                templates::contact_staff_notice(contact),
            ),
            (
                Audience::Submitter,
                templates::contact_confirmation(
                    contact,
                    &self.config.company_name,
                    &self.config.site_url,
                ),
            ),
        ];
        self.run(plan, &contact.reply_address).await
    }

    /// Notify staff of an RFP submission and confirm receipt to the submitter.
    pub async fn dispatch_rfp(&self, rfp: &SanitizedRfp) -> Vec<DispatchResult> {
        let plan = [
            (Audience::Staff, templates::rfp_staff_notice(rfp)),
            (
                Audience::Submitter,
                templates::rfp_confirmation(rfp, &self.config.company_name, &self.config.site_url),
            ),
        ];
        self.run(plan, &rfp.reply_address).await
    }

    async fn run<const N: usize>(
        &self,
        plan: [(Audience, Rendered); N],
        submitter: &str,
    ) -> Vec<DispatchResult> {
        let mut results = Vec::with_capacity(N);
        for (audience, rendered) in plan {
            let message = self.address(audience, rendered, submitter);
            results.push(self.deliver(audience, &message).await);
        }
        results
    }

    fn address(&self, audience: Audience, rendered: Rendered, submitter: &str) -> EmailMessage {
        let (to, reply_to) = match audience {
            Audience::Staff => (
                self.config.staff_recipients.clone(),
                Some(submitter.to_string()),
            ),
            Audience::Submitter => (vec![submitter.to_string()], None),
        };
        EmailMessage {
            from: self.config.from.clone(),
            to,
            reply_to,
            subject: rendered.subject,
            html: rendered.html,
        }
    }

    async fn deliver(&self, audience: Audience, message: &EmailMessage) -> DispatchResult {
        match timeout(self.config.send_timeout(), self.provider.send(message)).await {
            Ok(Ok(sent)) => {
                info!(%audience, message_id = %sent.id, "Notification sent");
                DispatchResult::sent(audience, sent.id)
            }
            Ok(Err(err)) => {
                warn!(%audience, error = %err, "Notification send failed");
                let failure = match err {
                    EmailError::InvalidMessage(_) => DispatchFailure::Rejected,
                    EmailError::Provider { .. } | EmailError::Transport(_) => {
                        DispatchFailure::Provider
                    }
                };
                DispatchResult::failed(audience, failure)
            }
            Err(_) => {
                warn!(%audience, timeout_ms = self.config.send_timeout_ms, "Notification send timed out");
                DispatchResult::failed(audience, DispatchFailure::Timeout)
            }
        }
    }
}
