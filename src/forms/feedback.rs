//! Customer feedback form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_string, FieldCheck, FormSubmission, SubmissionContext};
use crate::config::{DatabaseConfig, Endpoint};
use crate::error::ApiError;
use crate::services::{email::escape_html, EmailMessage};

const MAX_FEEDBACK_CHARS: usize = 2000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerFeedbackRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rating: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    pub reference: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub feedback: String,
    pub rating: u8,
    pub submitted_at: DateTime<Utc>,
}

impl FormSubmission for CustomerFeedbackRequest {
    type Record = FeedbackRecord;

    const ENDPOINT: Endpoint = Endpoint::CustomerFeedback;
    const ID_PREFIX: &'static str = "FB-";
    const SUCCESS_MESSAGE: &'static str = "Thank you for your feedback!";

    fn table(config: &DatabaseConfig) -> &str {
        &config.feedback_table
    }

    fn validate(self, ctx: &SubmissionContext) -> Result<FeedbackRecord, ApiError> {
        let mut check = FieldCheck::default();

        let name = check.require("name", "Name", self.name);
        let email = check.require("email", "Email", self.email);
        let mobile = check.require("mobile", "Mobile", self.mobile);
        let feedback = check.require("feedback", "Feedback", self.feedback);
        let rating = check.require("rating", "Rating", self.rating);

        let email = check.email("email", &email, "Invalid email address");
        let mobile = check.mobile("mobile", &mobile, "Invalid mobile number");
        check.max_chars(
            "feedback",
            &feedback,
            MAX_FEEDBACK_CHARS,
            "Feedback must be at most 2000 characters",
        );

        let rating = match rating.parse::<u8>() {
            Ok(value @ 1..=5) => value,
            _ => {
                if !rating.is_empty() {
                    check.invalid("rating", "Rating must be between 1 and 5");
                }
                0
            }
        };

        check.finish()?;

        Ok(FeedbackRecord {
            reference: ctx.reference.clone(),
            name,
            email,
            mobile,
            feedback,
            rating,
            submitted_at: ctx.received_at,
        })
    }

    fn notification(record: &FeedbackRecord) -> EmailMessage {
        let stars = "⭐".repeat(usize::from(record.rating));
        let email = escape_html(&record.email);

        let html = format!(
            r#"<h2>New Customer Feedback Received</h2>
<p><strong>Rating:</strong> {stars} ({rating}/5)</p>
<hr />
<p><strong>Name:</strong> {name}</p>
<p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
<p><strong>Mobile:</strong> {mobile}</p>
<p><strong>Feedback:</strong></p>
<p>{feedback}</p>
<hr />
<p><strong>Reference:</strong> {reference}</p>
<p style="color: #666; font-size: 12px;">Submitted via RIS Foods Customer Feedback Form</p>
"#,
            rating = record.rating,
            name = escape_html(&record.name),
            mobile = escape_html(&record.mobile),
            feedback = escape_html(&record.feedback),
            reference = escape_html(&record.reference),
        );

        EmailMessage {
            subject: format!("New Customer Feedback - {} Stars", record.rating),
            html,
            reply_to: Some(record.email.clone()),
        }
    }
}
