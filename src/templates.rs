// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTML bodies for outbound inquiry emails.
//!
//! Every value interpolated into HTML must already be sanitized. Subjects
//! are plain text and use the unescaped single-line title instead.

use crate::sanitizer::{SanitizedContact, SanitizedRfp};

/// Rendered subject and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub subject: String,
    pub html: String,
}

fn row(label: &str, value: &str) -> String {
    format!("<tr><td style=\"padding:4px 12px 4px 0;font-weight:bold\">{label}</td><td>{value}</td></tr>")
}

fn optional_row(label: &str, value: Option<&str>) -> String {
    value.map(|v| row(label, v)).unwrap_or_default()
}

fn layout(heading: &str, inner: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#222\">\
         <h2>{heading}</h2>{inner}</body></html>"
    )
}

/// Staff notice for a new contact submission.
pub fn contact_staff_notice(c: &SanitizedContact) -> Rendered {
    let table = [
        row("Name", &c.name),
        row("Email", &c.email),
        optional_row("Phone", c.phone.as_deref()),
        optional_row("Company", c.company.as_deref()),
        row("Type", &c.submission_type),
    ]
    .concat();

    Rendered {
        subject: format!("New contact form submission ({})", c.submission_type),
        html: layout(
            "New contact form submission",
            &format!(
                "<table>{table}</table><h3>Message</h3><p style=\"white-space:pre-wrap\">{}</p>",
                c.message
            ),
        ),
    }
}

/// Confirmation sent back to the person who filled in the contact form.
pub fn contact_confirmation(c: &SanitizedContact, company: &str, site_url: &str) -> Rendered {
    Rendered {
        subject: format!("We received your message - {company}"),
        html: layout(
            &format!("Thank you, {}", c.name),
            &format!(
                "<p>Thanks for reaching out to {company}. A member of our team will \
                 review your message and get back to you within one business day.</p>\
                 <p>For reference, here is what you sent:</p>\
                 <blockquote style=\"white-space:pre-wrap\">{}</blockquote>\
                 <p><a href=\"{site_url}\">{company}</a></p>",
                c.message
            ),
        ),
    }
}

/// Staff notice for a new request for proposal.
pub fn rfp_staff_notice(r: &SanitizedRfp) -> Rendered {
    let table = [
        row("Company", &r.company_name),
        row("Contact", &r.contact_name),
        row("Email", &r.email),
        row("Phone", &r.phone),
        row("Project", &r.project_name),
        row("Project type", &r.project_type),
        row("Estimated value", &r.estimated_value_range),
        row("Submission ID", &r.submission_id),
    ]
    .concat();

    Rendered {
        subject: format!("New RFP submission: {}", r.project_title),
        html: layout("New request for proposal", &format!("<table>{table}</table>")),
    }
}

/// Confirmation sent back to the RFP submitter.
pub fn rfp_confirmation(r: &SanitizedRfp, company: &str, site_url: &str) -> Rendered {
    Rendered {
        subject: format!("RFP received: {} - {company}", r.project_title),
        html: layout(
            &format!("Thank you, {}", r.contact_name),
            &format!(
                "<p>We have received the request for proposal for <strong>{}</strong> \
                 on behalf of {}. Our estimating team will review it and contact you \
                 about next steps.</p><p>Reference: {}</p>\
                 <p><a href=\"{site_url}\">{company}</a></p>",
                r.project_name, r.company_name, r.submission_id
            ),
        ),
    }
}
