//! Transactional email notifications.

use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::config::EmailConfig;
use crate::services::{check_status, UpstreamError};

/// A notification ready to send to the site administrators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

/// Delivers a notification email.
pub trait Notifier: Send + Sync {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), UpstreamError>>;
}

#[derive(Serialize)]
struct SendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Client for the Resend email API.
#[derive(Clone)]
pub struct ResendNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
    to: String,
}

impl ResendNotifier {
    /// `None` when email is disabled or has no key.
    pub fn from_config(config: &EmailConfig, client: reqwest::Client) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let api_key = config.api_key.clone().filter(|k| !k.is_empty())?;
        Some(Self {
            client,
            endpoint: format!("{}/emails", config.api_url.trim_end_matches('/')),
            api_key,
            from: config.from.clone(),
            to: config.admin_email.clone(),
        })
    }
}

impl Notifier for ResendNotifier {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), UpstreamError>> {
        Box::pin(async move {
            let body = SendEmail {
                from: &self.from,
                to: [&self.to],
                subject: &message.subject,
                html: &message.html,
                reply_to: message.reply_to.as_deref(),
            };
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;
            check_status(response).await?;
            Ok(())
        })
    }
}

/// Escape text for interpolation into an HTML email body.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
        assert_eq!(escape_html("Naadan ruchi"), "Naadan ruchi");
    }

    #[test]
    fn test_disabled_email_has_no_notifier() {
        let config = EmailConfig {
            api_key: Some("re_123".to_string()),
            ..EmailConfig::default()
        };
        assert!(ResendNotifier::from_config(&config, reqwest::Client::new()).is_none());
    }

    #[test]
    fn test_payload_shape() {
        let body = SendEmail {
            from: "RIS Foods <onboarding@resend.dev>",
            to: ["admin@ris-foods.com"],
            subject: "Hi",
            html: "<p>x</p>",
            reply_to: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["to"][0], "admin@ris-foods.com");
        assert!(value.get("reply_to").is_none());
    }
}
