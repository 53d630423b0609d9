//! Distributor enquiry form.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_string, optional, FieldCheck, FormSubmission, SubmissionContext};
use crate::config::{DatabaseConfig, Endpoint};
use crate::error::ApiError;
use crate::services::{email::escape_html, EmailMessage};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributorEnquiryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub firm_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub telephone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "type")]
    pub firm_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year_of_establishment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub turnover: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub warehouse_area: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributorRecord {
    pub reference: String,
    pub name: String,
    pub firm_name: String,
    pub address: String,
    pub telephone: Option<String>,
    pub mobile: String,
    pub email: String,
    #[serde(rename = "type")]
    pub firm_type: String,
    pub year_of_establishment: Option<String>,
    pub turnover: Option<String>,
    pub warehouse_area: Option<String>,
    pub comments: Option<String>,
    pub ip: String,
    pub created_at: DateTime<Utc>,
}

impl FormSubmission for DistributorEnquiryRequest {
    type Record = DistributorRecord;

    const ENDPOINT: Endpoint = Endpoint::DistributorEnquiry;
    const ID_PREFIX: &'static str = "DIST-";
    const SUCCESS_MESSAGE: &'static str = "Distributor enquiry submitted successfully!";

    fn table(config: &DatabaseConfig) -> &str {
        &config.distributor_table
    }

    fn validate(self, ctx: &SubmissionContext) -> Result<DistributorRecord, ApiError> {
        let mut check = FieldCheck::default();

        let name = check.require("name", "Name", self.name);
        let firm_name = check.require("firm_name", "Firm name", self.firm_name);
        let address = check.require("address", "Address", self.address);
        let mobile = check.require("mobile", "Mobile", self.mobile);
        let email = check.require("email", "Email", self.email);
        let firm_type = check.require("type", "Firm type", self.firm_type);

        check.min_chars("name", &name, 2, "Name too short");
        check.min_chars("firm_name", &firm_name, 2, "Firm name too short");
        let email = check.email("email", &email, "Invalid email");
        let mobile = check.mobile("mobile", &mobile, "Invalid mobile number");

        check.finish()?;

        Ok(DistributorRecord {
            reference: ctx.reference.clone(),
            name,
            firm_name,
            address,
            telephone: optional(self.telephone),
            mobile,
            email,
            firm_type,
            year_of_establishment: optional(self.year_of_establishment),
            turnover: optional(self.turnover),
            warehouse_area: optional(self.warehouse_area),
            comments: optional(self.comments),
            ip: ctx.identity.to_string(),
            created_at: ctx.received_at,
        })
    }

    fn notification(record: &DistributorRecord) -> EmailMessage {
        let email = escape_html(&record.email);
        let mut html = String::new();

        html.push_str("<h2>New Distributor Enquiry Received</h2>\n<hr />\n");
        html.push_str("<h3>Contact Information</h3>\n");
        let _ = writeln!(html, "<p><strong>Name:</strong> {}</p>", escape_html(&record.name));
        let _ = writeln!(
            html,
            "<p><strong>Company:</strong> {}</p>",
            escape_html(&record.firm_name)
        );
        let _ = writeln!(
            html,
            r#"<p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>"#
        );
        let _ = writeln!(html, "<p><strong>Mobile:</strong> {}</p>", escape_html(&record.mobile));
        if let Some(telephone) = &record.telephone {
            let _ = writeln!(html, "<p><strong>Telephone:</strong> {}</p>", escape_html(telephone));
        }
        let _ = writeln!(html, "<p><strong>Address:</strong> {}</p>", escape_html(&record.address));

        html.push_str("<h3>Business Details</h3>\n");
        let _ = writeln!(
            html,
            "<p><strong>Firm Type:</strong> {}</p>",
            escape_html(&record.firm_type)
        );
        if let Some(year) = &record.year_of_establishment {
            let _ = writeln!(
                html,
                "<p><strong>Year of Establishment:</strong> {}</p>",
                escape_html(year)
            );
        }
        if let Some(turnover) = &record.turnover {
            let _ = writeln!(
                html,
                "<p><strong>Turnover (Last FY):</strong> {}</p>",
                escape_html(turnover)
            );
        }
        if let Some(area) = &record.warehouse_area {
            let _ = writeln!(
                html,
                "<p><strong>Warehouse Area:</strong> {} sq.ft.</p>",
                escape_html(area)
            );
        }
        if let Some(comments) = &record.comments {
            let _ = writeln!(
                html,
                "<h3>Additional Comments</h3>\n<p>{}</p>",
                escape_html(comments)
            );
        }

        html.push_str("<hr />\n");
        let _ = writeln!(
            html,
            "<p><strong>Reference:</strong> {}</p>",
            escape_html(&record.reference)
        );
        html.push_str(
            r#"<p style="color: #666; font-size: 12px;">Submitted via RIS Foods Distributor Enquiry Form</p>"#,
        );

        EmailMessage {
            subject: format!("New Distributor Enquiry - {}", record.firm_name),
            html,
            reply_to: Some(record.email.clone()),
        }
    }
}
