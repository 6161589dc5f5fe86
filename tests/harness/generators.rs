// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators.

use chrono::{TimeZone, Utc};
use inquiry_gateway::store::{ContentItem, ContentKind};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr};

pub const SITEMAP_TOKEN: &str = "sitemap-test-token";

/// Generate a pool of client addresses.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A contact payload that passes validation.
pub fn valid_contact() -> Value {
    json!({
        "name": "Dana O'Neil",
        "email": "dana@client.example",
        "phone": "+1 (555) 010-2030",
        "company": "Northside Storage",
        "message": "We would like a quote for a 2,000 m² warehouse extension.",
        "submissionType": "quote"
    })
}

/// An RFP payload that passes validation.
pub fn valid_rfp() -> Value {
    json!({
        "company_name": "Northside Storage",
        "contact_name": "Dana O'Neil",
        "email": "dana@client.example",
        "phone": "555-010-2030",
        "project_name": "Warehouse extension phase 2",
        "project_type": "Commercial",
        "estimated_value_range": "$1M - $5M",
        "submission_id": "8c1d7a52-0b3e-4f7a-a6a1-93f0c2b7e4d1"
    })
}

/// `valid_contact` with one field replaced.
pub fn contact_with(field: &str, value: Value) -> Value {
    let mut payload = valid_contact();
    payload[field] = value;
    payload
}

/// Markup-bearing strings an attacker might put in free text.
pub fn injection_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script> please call back",
        "<img src=x onerror=alert(1)> about my roof",
        "\"><svg onload=alert(1)> quote needed",
        "'; DROP TABLE contacts; -- thanks",
        "<a href=\"javascript:alert(1)\">click</a> here",
    ]
}

/// Names that must be rejected on character class.
pub fn hostile_names() -> Vec<&'static str> {
    vec!["<b>Bob</b>", "Robert\"); --", "Eve{{7*7}}", "Mallory\u{0000}", "admin@site"]
}

pub fn published_content() -> Vec<ContentItem> {
    vec![
        ContentItem {
            kind: ContentKind::Project,
            slug: "riverside-warehouse".to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap(),
        },
        ContentItem {
            kind: ContentKind::BlogPost,
            slug: "choosing-a-general-contractor".to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 4, 9, 8, 30, 0).unwrap(),
        },
        ContentItem {
            kind: ContentKind::Service,
            slug: "design-build".to_string(),
            updated_at: Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap(),
        },
    ]
}
