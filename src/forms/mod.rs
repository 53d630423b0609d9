//! Form submissions.
//!
//! Each form is a typed request variant with explicit required and optional
//! fields. Unknown fields are rejected at deserialization. Validation turns a
//! request into the record that is persisted and the email that is sent.

pub mod distributor;
pub mod feedback;
pub mod general;

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::config::{DatabaseConfig, Endpoint};
use crate::error::{ApiError, FieldErrors};
use crate::http::ClientIdentity;
use crate::services::EmailMessage;

pub use distributor::DistributorEnquiryRequest;
pub use feedback::CustomerFeedbackRequest;
pub use general::GeneralEnquiryRequest;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Request metadata available while building a record.
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub reference: String,
    pub identity: ClientIdentity,
    pub received_at: DateTime<Utc>,
}

/// A form endpoint: how its body is validated, stored and announced.
pub trait FormSubmission: DeserializeOwned + Send + 'static {
    type Record: Serialize + Send + Sync;

    const ENDPOINT: Endpoint;
    const ID_PREFIX: &'static str;
    const SUCCESS_MESSAGE: &'static str;

    /// Table the record is inserted into.
    fn table(config: &DatabaseConfig) -> &str;

    fn validate(self, ctx: &SubmissionContext) -> Result<Self::Record, ApiError>;

    fn notification(record: &Self::Record) -> EmailMessage;
}

/// Collects field problems; missing fields are reported ahead of format errors.
#[derive(Debug, Default)]
pub(crate) struct FieldCheck {
    missing: FieldErrors,
    invalid: FieldErrors,
}

impl FieldCheck {
    /// Trimmed value, or `""` after recording the field as missing.
    pub fn require(&mut self, field: &'static str, label: &str, value: Option<String>) -> String {
        match optional(value) {
            Some(value) => value,
            None => {
                self.missing.insert(field, format!("{label} is required"));
                String::new()
            }
        }
    }

    pub fn invalid(&mut self, field: &'static str, reason: impl Into<String>) {
        self.invalid.entry(field).or_insert_with(|| reason.into());
    }

    pub fn min_chars(&mut self, field: &'static str, value: &str, min: usize, reason: &str) {
        if !value.is_empty() && value.chars().count() < min {
            self.invalid(field, reason);
        }
    }

    pub fn max_chars(&mut self, field: &'static str, value: &str, max: usize, reason: &str) {
        if value.chars().count() > max {
            self.invalid(field, reason);
        }
    }

    /// Lowercased address, checked against the email pattern.
    pub fn email(&mut self, field: &'static str, value: &str, reason: &str) -> String {
        if !value.is_empty() && !EMAIL.is_match(value) {
            self.invalid(field, reason);
        }
        value.to_lowercase()
    }

    /// Digits only; exactly ten are required.
    pub fn mobile(&mut self, field: &'static str, value: &str, reason: &str) -> String {
        let digits = digits(value);
        if !value.is_empty() && digits.len() != 10 {
            self.invalid(field, reason);
        }
        digits
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if !self.missing.is_empty() {
            return Err(ApiError::ValidationFailed {
                message: "Missing required fields",
                details: self.missing,
            });
        }
        if !self.invalid.is_empty() {
            return Err(ApiError::ValidationFailed {
                message: "Validation failed",
                details: self.invalid,
            });
        }
        Ok(())
    }
}

/// Trimmed value, `None` when absent or blank.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Accepts a JSON string or number as text. Forms send numeric inputs both ways.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Lenient>::deserialize(deserializer)?.map(|value| match value {
        Lenient::Text(text) => text,
        Lenient::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(EMAIL.is_match("asha@example.com"));
        assert!(!EMAIL.is_match("asha@example"));
        assert!(!EMAIL.is_match("asha example@x.com"));
        assert!(!EMAIL.is_match("@example.com"));
    }

    #[test]
    fn test_missing_reported_before_format() {
        let mut check = FieldCheck::default();
        let name = check.require("name", "Name", Some("   ".to_string()));
        assert_eq!(name, "");
        check.email("email", "bad", "Invalid email");

        match check.finish() {
            Err(ApiError::ValidationFailed { message, details }) => {
                assert_eq!(message, "Missing required fields");
                assert_eq!(details["name"], "Name is required");
                assert!(!details.contains_key("email"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_mobile_strips_formatting() {
        let mut check = FieldCheck::default();
        assert_eq!(check.mobile("mobile", "+91 98470-12345", "bad"), "919847012345");
        assert_eq!(check.mobile("mobile", "98470 12345", "bad"), "9847012345");
        match check.finish() {
            Err(ApiError::ValidationFailed { details, .. }) => assert_eq!(details.len(), 1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_min_chars_counts_characters() {
        let mut check = FieldCheck::default();
        check.min_chars("name", "അ", 2, "too short");
        check.min_chars("firm", "അആ", 2, "too short");
        match check.finish() {
            Err(ApiError::ValidationFailed { details, .. }) => {
                assert!(details.contains_key("name"));
                assert!(!details.contains_key("firm"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
