//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Returns every problem found,
//! not just the first, so a broken deployment is fixed in one pass.

use std::net::SocketAddr;

use regex::Regex;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid bind address '{value}' for {field}")]
    BindAddress { field: &'static str, value: String },

    #[error("preview_origin_pattern does not compile: {0}")]
    PreviewPattern(String),

    #[error("wildcard origin '*' cannot be combined with credentials")]
    WildcardOrigin,

    #[error("invalid URL '{value}' for {field}")]
    Url { field: &'static str, value: String },

    #[error("chat.temperature {0} is outside 0.0..=2.0")]
    Temperature(f32),

    #[error("email is enabled but {0} is not set")]
    EmailIncomplete(&'static str),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BindAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let cors = &config.cors;
    if let Err(e) = Regex::new(&cors.preview_origin_pattern) {
        errors.push(ValidationError::PreviewPattern(e.to_string()));
    }
    if cors
        .allowed_origins
        .iter()
        .chain(cors.extra_origins.iter())
        .any(|o| o.trim() == "*")
    {
        errors.push(ValidationError::WildcardOrigin);
    }

    let zero_checks = [
        ("rate_limit.window_ms", config.rate_limit.window_ms == 0),
        ("rate_limit.max_requests", config.rate_limit.max_requests == 0),
        ("rate_limit.eviction_multiplier", config.rate_limit.eviction_multiplier == 0),
        ("timeouts.request_secs", config.timeouts.request_secs == 0),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs == 0),
        ("security.max_body_size", config.security.max_body_size == 0),
        ("email.queue_capacity", config.email.queue_capacity == 0),
        ("email.max_attempts", config.email.max_attempts == 0),
    ];
    for (field, is_zero) in zero_checks {
        if is_zero {
            errors.push(ValidationError::Zero { field });
        }
    }
    if config.rate_limit.sweep_interval_ms == Some(0) {
        errors.push(ValidationError::Zero {
            field: "rate_limit.sweep_interval_ms",
        });
    }

    check_url(&mut errors, "chat.api_url", Some(&config.chat.api_url));
    check_url(&mut errors, "database.url", config.database.url.as_ref());
    check_url(&mut errors, "email.api_url", Some(&config.email.api_url));

    if !(0.0..=2.0).contains(&config.chat.temperature) {
        errors.push(ValidationError::Temperature(config.chat.temperature));
    }

    if config.email.enabled {
        if config.email.api_key.as_deref().unwrap_or("").is_empty() {
            errors.push(ValidationError::EmailIncomplete("email.api_key"));
        }
        if config.email.admin_email.trim().is_empty() {
            errors.push(ValidationError::EmailIncomplete("email.admin_email"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: Option<&String>) {
    if let Some(value) = value {
        if url::Url::parse(value).is_err() {
            errors.push(ValidationError::Url {
                field,
                value: value.clone(),
            });
        }
    }
}
