// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Inquiry submission validator.
//!
//! Checks shape, length and character class of untrusted form fields.
//! Rules run in field order and the first failure wins. Lengths are
//! counted in characters after trimming.
//!
//! No markup detection happens here; escaping is the sanitizer's job.

use crate::config::ValidationConfig;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Contact form payload as posted by the site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: String,
    pub submission_type: Option<String>,
    /// Hidden form field; humans leave it empty
    pub honeypot: Option<String>,
}

/// Request-for-proposal payload as posted by the site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RfpSubmission {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub project_name: String,
    pub project_type: String,
    pub estimated_value_range: String,
    pub submission_id: String,
    /// Hidden form field; humans leave it empty
    pub honeypot: Option<String>,
}

impl ContactSubmission {
    /// Whether the honeypot field was filled in.
    pub fn is_bot(&self) -> bool {
        honeypot_filled(self.honeypot.as_deref())
    }

    /// The submission type tag, `general` when omitted.
    pub fn submission_type(&self) -> &str {
        self.submission_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("general")
    }
}

impl RfpSubmission {
    /// Whether the honeypot field was filled in.
    pub fn is_bot(&self) -> bool {
        honeypot_filled(self.honeypot.as_deref())
    }
}

fn honeypot_filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Form field a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Phone,
    Company,
    Message,
    SubmissionType,
    ProjectName,
    ProjectType,
    ValueRange,
    SubmissionId,
}

impl Field {
    /// Payload-facing field name.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Company => "company",
            Field::Message => "message",
            Field::SubmissionType => "submissionType",
            Field::ProjectName => "project_name",
            Field::ProjectType => "project_type",
            Field::ValueRange => "estimated_value_range",
            Field::SubmissionId => "submission_id",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Phone => "Phone number",
            Field::Company => "Company name",
            Field::Message => "Message",
            Field::SubmissionType => "Submission type",
            Field::ProjectName => "Project name",
            Field::ProjectType => "Project type",
            Field::ValueRange => "Estimated value range",
            Field::SubmissionId => "Submission ID",
        }
    }

    fn noun(&self) -> String {
        self.label().to_lowercase()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validation error types. The message identifies the failing field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(Field),

    #[error("{field} must be between {min} and {max} characters")]
    Length { field: Field, min: usize, max: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: Field, max: usize },

    #[error("Invalid {} characters", .0.noun())]
    Characters(Field),

    #[error("Invalid email format")]
    EmailFormat,

    #[error("Invalid submission type")]
    UnsupportedType,
}

impl ValidationError {
    /// The field that failed.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Required(field)
            | ValidationError::Characters(field)
            | ValidationError::Length { field, .. }
            | ValidationError::TooLong { field, .. } => *field,
            ValidationError::EmailFormat => Field::Email,
            ValidationError::UnsupportedType => Field::SubmissionType,
        }
    }
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Submission is valid
    Valid,
    /// Submission is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

impl From<Result<(), ValidationError>> for ValidationResult {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => ValidationResult::Valid,
            Err(e) => ValidationResult::Invalid(e),
        }
    }
}

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 255;
const PHONE_MAX: usize = 20;
const COMPANY_MAX: usize = 100;
const MESSAGE_MIN: usize = 10;
const MESSAGE_MAX: usize = 2000;
const PROJECT_NAME_MAX: usize = 200;
const PROJECT_TYPE_MAX: usize = 100;
const VALUE_RANGE_MAX: usize = 50;
const SUBMISSION_ID_MAX: usize = 64;

/// Inquiry submission validator.
pub struct SubmissionValidator {
    config: ValidationConfig,
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a contact form submission.
    pub fn validate_contact(&self, submission: &ContactSubmission) -> ValidationResult {
        let result = self.check_contact(submission);
        if let Err(err) = &result {
            debug!(field = err.field().key(), error = %err, "Contact submission invalid");
        }
        result.into()
    }

    /// Validate a request-for-proposal submission.
    pub fn validate_rfp(&self, submission: &RfpSubmission) -> ValidationResult {
        let result = check_rfp(submission);
        if let Err(err) = &result {
            debug!(field = err.field().key(), error = %err, "RFP submission invalid");
        }
        result.into()
    }

    fn check_contact(&self, submission: &ContactSubmission) -> Result<(), ValidationError> {
        validate_name(&submission.name)?;
        validate_email(&submission.email)?;
        if let Some(phone) = present(submission.phone.as_deref()) {
            validate_phone(phone)?;
        }
        if let Some(company) = present(submission.company.as_deref()) {
            max_len(Field::Company, company, COMPANY_MAX)?;
        }
        bounded(Field::Message, &submission.message, MESSAGE_MIN, MESSAGE_MAX)?;
        self.validate_submission_type(submission.submission_type())
    }

    fn validate_submission_type(&self, tag: &str) -> Result<(), ValidationError> {
        if self.config.submission_types.iter().any(|t| t == tag) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedType)
        }
    }
}

fn check_rfp(submission: &RfpSubmission) -> Result<(), ValidationError> {
    validate_name(&submission.contact_name)?;
    validate_email(&submission.email)?;
    required(Field::Phone, &submission.phone)?;
    validate_phone(&submission.phone)?;
    bounded(Field::Company, &submission.company_name, NAME_MIN, COMPANY_MAX)?;
    bounded(Field::ProjectName, &submission.project_name, NAME_MIN, PROJECT_NAME_MAX)?;
    required(Field::ProjectType, &submission.project_type)?;
    max_len(Field::ProjectType, &submission.project_type, PROJECT_TYPE_MAX)?;
    required(Field::ValueRange, &submission.estimated_value_range)?;
    max_len(Field::ValueRange, &submission.estimated_value_range, VALUE_RANGE_MAX)?;
    validate_submission_id(&submission.submission_id)
}

/// Name: 2..=100 characters of letters, spaces, apostrophes and hyphens.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    required(Field::Name, name)?;
    bounded(Field::Name, name, NAME_MIN, NAME_MAX)?;
    if !name
        .trim()
        .chars()
        .all(|c| c.is_alphabetic() || matches!(c, ' ' | '\'' | '-'))
    {
        return Err(ValidationError::Characters(Field::Name));
    }
    Ok(())
}

/// Email: at most 255 characters shaped like `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    required(Field::Email, email)?;
    max_len(Field::Email, email, EMAIL_MAX)?;
    if !is_email_shaped(email.trim()) {
        return Err(ValidationError::EmailFormat);
    }
    Ok(())
}

/// Phone: at most 20 characters of digits, spaces, `-`, `(`, `)` and `+`.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.chars().count() > PHONE_MAX {
        return Err(ValidationError::TooLong {
            field: Field::Phone,
            max: PHONE_MAX,
        });
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '+'))
    {
        return Err(ValidationError::Characters(Field::Phone));
    }
    Ok(())
}

fn validate_submission_id(id: &str) -> Result<(), ValidationError> {
    required(Field::SubmissionId, id)?;
    max_len(Field::SubmissionId, id, SUBMISSION_ID_MAX)?;
    if !id.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::Characters(Field::SubmissionId));
    }
    Ok(())
}

/// One `@`, a non-empty local part, and a domain containing an inner dot.
/// No whitespace anywhere.
fn is_email_shaped(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.chars().any(char::is_whitespace);
    if !clean(local) || !clean(domain) {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(field: Field, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

fn max_len(field: Field, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().chars().count() > max {
        Err(ValidationError::TooLong { field, max })
    } else {
        Ok(())
    }
}

fn bounded(field: Field, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::Required(field));
    }
    if len < min || len > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}
