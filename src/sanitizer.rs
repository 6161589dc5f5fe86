// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTML escaping for untrusted submission text.
//!
//! `sanitize` is applied exactly once per field per request. It is not
//! idempotent: a second pass escapes the `&` of every entity produced by
//! the first.

use crate::validator::{ContactSubmission, RfpSubmission};

/// Escape `&`, `<`, `>`, `"`, `'` and `/` as character references.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

/// A validated contact submission with every free-text field escaped.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: String,
    pub submission_type: String,
    /// Unescaped address, used only as an envelope recipient
    pub reply_address: String,
}

/// A validated RFP submission with every free-text field escaped.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedRfp {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub project_name: String,
    pub project_type: String,
    pub estimated_value_range: String,
    pub submission_id: String,
    /// Unescaped project name on one line, for plain-text subjects only
    pub project_title: String,
    /// Unescaped address, used only as an envelope recipient
    pub reply_address: String,
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(sanitize)
}

fn field(value: &str) -> String {
    sanitize(value.trim())
}

/// Trimmed text with line breaks flattened, for single-line headers.
fn single_line(value: &str) -> String {
    value.trim().replace(['\r', '\n'], " ")
}

impl From<&ContactSubmission> for SanitizedContact {
    fn from(s: &ContactSubmission) -> Self {
        Self {
            name: field(&s.name),
            email: field(&s.email),
            phone: optional(s.phone.as_deref()),
            company: optional(s.company.as_deref()),
            message: field(&s.message),
            submission_type: field(s.submission_type()),
            reply_address: s.email.trim().to_string(),
        }
    }
}

impl From<&RfpSubmission> for SanitizedRfp {
    fn from(s: &RfpSubmission) -> Self {
        Self {
            company_name: field(&s.company_name),
            contact_name: field(&s.contact_name),
            email: field(&s.email),
            phone: field(&s.phone),
            project_name: field(&s.project_name),
            project_type: field(&s.project_type),
            estimated_value_range: field(&s.estimated_value_range),
            submission_id: field(&s.submission_id),
            project_title: single_line(&s.project_name),
            reply_address: s.email.trim().to_string(),
        }
    }
}
