//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the API.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the site API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Origin authorization gate.
    pub cors: CorsConfig,

    /// Per-endpoint admission control.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Generative-language API used by the chat endpoint.
    pub chat: ChatConfig,

    /// Managed database API for form rows.
    pub database: DatabaseConfig,

    /// Transactional email notifications.
    pub email: EmailConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Public endpoints served by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    Chat,
    CustomerFeedback,
    DistributorEnquiry,
    GeneralEnquiry,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::Chat,
        Endpoint::CustomerFeedback,
        Endpoint::DistributorEnquiry,
        Endpoint::GeneralEnquiry,
    ];

    /// Route path the endpoint is mounted on.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Chat => "/api/chat",
            Endpoint::CustomerFeedback => "/api/customer-feedback",
            Endpoint::DistributorEnquiry => "/api/distributor-enquiry",
            Endpoint::GeneralEnquiry => "/api/general-enquiry",
        }
    }

    /// Stable name used in config, logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Chat => "chat",
            Endpoint::CustomerFeedback => "customer-feedback",
            Endpoint::DistributorEnquiry => "distributor-enquiry",
            Endpoint::GeneralEnquiry => "general-enquiry",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Origin authorization gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed by exact match.
    pub allowed_origins: Vec<String>,

    /// Regex matching preview-deployment origins.
    pub preview_origin_pattern: String,

    /// Additional origins supplied by the deployment (also `ALLOWED_ORIGINS`).
    pub extra_origins: Vec<String>,

    /// Preflight cache lifetime advertised to browsers.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "https://ris-foods.vercel.app".to_string(),
                "https://www.ris-foods.vercel.app".to_string(),
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            preview_origin_pattern: r"^https://ris-foods(?:-[\w-]+)*\.vercel\.app$".to_string(),
            extra_origins: Vec::new(),
            max_age_secs: 86_400,
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Fixed window length in milliseconds.
    pub window_ms: u64,

    /// Maximum requests per identity per window (inclusive).
    pub max_requests: u32,

    /// Endpoints guarded by the limiter. Each gets its own counters.
    pub endpoints: Vec<Endpoint>,

    /// Run the background sweep of expired entries.
    pub sweep_enabled: bool,

    /// Sweep interval in milliseconds. Defaults to ten windows when unset.
    pub sweep_interval_ms: Option<u64>,

    /// Entries idle for this many windows are evicted by the sweep.
    pub eviction_multiplier: u32,
}

impl RateLimitConfig {
    pub fn window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.window_ms)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        let ms = self
            .sweep_interval_ms
            .unwrap_or_else(|| self.window_ms.saturating_mul(10));
        std::time::Duration::from_millis(ms)
    }

    /// Whether `endpoint` is guarded.
    pub fn protects(&self, endpoint: Endpoint) -> bool {
        self.enabled && self.endpoints.contains(&endpoint)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            max_requests: 5,
            endpoints: vec![Endpoint::DistributorEnquiry, Endpoint::GeneralEnquiry],
            sweep_enabled: true,
            sweep_interval_ms: None,
            eviction_multiplier: 10,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Deadline for each call to an upstream service in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 15,
        }
    }
}

impl TimeoutConfig {
    pub fn request(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_secs)
    }

    pub fn upstream(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.upstream_secs)
    }
}

/// Generative-language API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of the generative-language API.
    pub api_url: String,

    /// Model name.
    pub model: String,

    /// API key. Usually supplied through `API_KEY`.
    pub api_key: Option<String>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Longest accepted prompt, in characters.
    pub max_prompt_chars: usize,

    /// History turns forwarded upstream (most recent kept).
    pub max_history_turns: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key: None,
            temperature: 0.6,
            max_prompt_chars: 4000,
            max_history_turns: 20,
        }
    }
}

/// Managed database API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Base URL of the database REST API. `None` logs rows instead.
    pub url: Option<String>,

    /// Service key sent as `apikey` and bearer token.
    pub api_key: Option<String>,

    pub feedback_table: String,
    pub distributor_table: String,
    pub general_table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            feedback_table: "customer_feedback".to_string(),
            distributor_table: "distributor_enquiries".to_string(),
            general_table: "general_enquiries".to_string(),
        }
    }
}

/// Notification email configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Send notification emails.
    pub enabled: bool,

    /// Email API base URL.
    pub api_url: String,

    /// Email API key. Usually supplied through `RESEND_API_KEY`.
    pub api_key: Option<String>,

    /// Sender mailbox.
    pub from: String,

    /// Recipient of every notification.
    pub admin_email: String,

    /// Pending notifications held in memory.
    pub queue_capacity: usize,

    /// Send attempts per notification.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.resend.com".to_string(),
            api_key: None,
            from: "RIS Foods <onboarding@resend.dev>".to_string(),
            admin_email: "admin@ris-foods.com".to_string(),
            queue_capacity: 256,
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Echo internal error detail to clients. Development only.
    pub diagnostics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            diagnostics: false,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Derive client identity from the forwarded header set by the platform proxy.
    pub trust_forwarded_header: bool,
    /// Name of that header.
    pub forwarded_header: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
            trust_forwarded_header: true,
            forwarded_header: "x-forwarded-for".to_string(),
        }
    }
}
