//! General enquiry form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_string, FieldCheck, FormSubmission, SubmissionContext};
use crate::config::{DatabaseConfig, Endpoint};
use crate::error::ApiError;
use crate::services::{email::escape_html, EmailMessage};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralEnquiryRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneralRecord {
    pub reference: String,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub message: String,
    pub ip: String,
    pub created_at: DateTime<Utc>,
}

impl FormSubmission for GeneralEnquiryRequest {
    type Record = GeneralRecord;

    const ENDPOINT: Endpoint = Endpoint::GeneralEnquiry;
    const ID_PREFIX: &'static str = "ENQ-";
    const SUCCESS_MESSAGE: &'static str = "Enquiry submitted successfully!";

    fn table(config: &DatabaseConfig) -> &str {
        &config.general_table
    }

    fn validate(self, ctx: &SubmissionContext) -> Result<GeneralRecord, ApiError> {
        let mut check = FieldCheck::default();

        let full_name = check.require("full_name", "Full name", self.full_name);
        let email = check.require("email", "Email", self.email);
        let mobile = check.require("mobile", "Mobile", self.mobile);
        let message = check.require("message", "Message", self.message);

        check.min_chars(
            "full_name",
            &full_name,
            2,
            "Full name must be at least 2 characters",
        );
        let email = check.email("email", &email, "Invalid email address");
        let mobile = check.mobile("mobile", &mobile, "Mobile number must be 10 digits");
        check.min_chars(
            "message",
            &message,
            10,
            "Message must be at least 10 characters",
        );
        check.max_chars(
            "message",
            &message,
            1000,
            "Message must be at most 1000 characters",
        );

        check.finish()?;

        Ok(GeneralRecord {
            reference: ctx.reference.clone(),
            full_name,
            email,
            mobile,
            message,
            ip: ctx.identity.to_string(),
            created_at: ctx.received_at,
        })
    }

    fn notification(record: &GeneralRecord) -> EmailMessage {
        let email = escape_html(&record.email);
        let html = format!(
            r#"<h2>New General Enquiry Received</h2>
<hr />
<p><strong>Name:</strong> {full_name}</p>
<p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
<p><strong>Mobile:</strong> {mobile}</p>
<p><strong>Message:</strong></p>
<p>{message}</p>
<hr />
<p><strong>Reference:</strong> {reference}</p>
<p style="color: #666; font-size: 12px;">Submitted via RIS Foods General Enquiry Form</p>
"#,
            full_name = escape_html(&record.full_name),
            mobile = escape_html(&record.mobile),
            message = escape_html(&record.message),
            reference = escape_html(&record.reference),
        );

        EmailMessage {
            subject: format!("New General Enquiry from {}", record.full_name),
            html,
            reply_to: Some(record.email.clone()),
        }
    }
}
