//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with one route per public endpoint
//! - Wire up middleware (origin gate, admission control, limits, request id, tracing)
//! - Build the external collaborators from configuration
//! - Run background tasks (limiter sweep, notification delivery)
//! - Serve until shutdown, then drain background work
//!
//! # Layer order (outermost first)
//! ```text
//! request id → trace → propagate id → nosniff → timeout → body limit
//!     → [diagnostics] → route: origin gate → method: admission → handler
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware,
    routing::{post, MethodRouter},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, Endpoint};
use crate::forms::{CustomerFeedbackRequest, DistributorEnquiryRequest, GeneralEnquiryRequest};
use crate::handlers;
use crate::http::request::IdentityResolver;
use crate::http::response::diagnostics_middleware;
use crate::lifecycle::Shutdown;
use crate::security::{
    cors_middleware, rate_limit_middleware, AdmissionStore, FixedWindowLimiter, OriginPolicy,
    RateLimitState, Sweeper,
};
use crate::services::{
    GeminiClient, LogRowStore, Outbox, OutboxWorker, ResendNotifier, RestRowStore, RowStore,
    TextGenerator,
};

/// Failure assembling the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid preview origin pattern: {0}")]
    OriginPattern(#[from] regex::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RowStore>,
    pub outbox: Outbox,
    pub generator: Arc<dyn TextGenerator>,
    pub identity: IdentityResolver,
}

/// External collaborators used by the handlers.
pub struct Services {
    pub store: Arc<dyn RowStore>,
    pub outbox: Outbox,
    pub generator: Arc<dyn TextGenerator>,
    /// Delivery task for `outbox`, spawned when the server runs.
    pub outbox_worker: Option<OutboxWorker>,
}

impl Services {
    /// Real clients for every configured service; fallbacks for the rest.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeouts.upstream())
            .build()?;

        let store: Arc<dyn RowStore> =
            match RestRowStore::from_config(&config.database, client.clone()) {
                Some(store) => Arc::new(store),
                None => {
                    tracing::warn!("No database configured, submissions will only be logged");
                    Arc::new(LogRowStore)
                }
            };

        let (outbox, outbox_worker) =
            match ResendNotifier::from_config(&config.email, client.clone()) {
                Some(notifier) => {
                    let (outbox, worker) = Outbox::new(Arc::new(notifier), &config.email);
                    (outbox, Some(worker))
                }
                None => {
                    tracing::info!("Email notifications disabled");
                    (Outbox::disabled(), None)
                }
            };

        if config.chat.api_key.is_none() {
            tracing::warn!("No generative API key configured, chat will answer 503");
        }
        let generator = Arc::new(GeminiClient::from_config(&config.chat, client));

        Ok(Self {
            store,
            outbox,
            generator,
            outbox_worker,
        })
    }
}

/// HTTP server for the site API.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
    limiters: Vec<(Endpoint, Arc<dyn AdmissionStore>)>,
    outbox_worker: Option<OutboxWorker>,
}

impl HttpServer {
    /// Create a server backed by the collaborators named in `config`.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let services = Services::from_config(&config)?;
        Self::with_services(config, services)
    }

    /// Create a server around caller-supplied collaborators.
    pub fn with_services(config: AppConfig, services: Services) -> Result<Self, ServerError> {
        let config = Arc::new(config);
        let policy = Arc::new(OriginPolicy::from_config(&config.cors)?);
        let identity = IdentityResolver::from_config(&config.security);

        let limiters: Vec<(Endpoint, Arc<dyn AdmissionStore>)> = Endpoint::ALL
            .into_iter()
            .filter(|endpoint| config.rate_limit.protects(*endpoint))
            .map(|endpoint| {
                let store: Arc<dyn AdmissionStore> =
                    Arc::new(FixedWindowLimiter::from_config(&config.rate_limit));
                (endpoint, store)
            })
            .collect();

        let state = AppState {
            config: Arc::clone(&config),
            store: services.store,
            outbox: services.outbox,
            generator: services.generator,
            identity,
        };

        let router = Self::build_router(&config, state, policy, &limiters);

        Ok(Self {
            router,
            config,
            limiters,
            outbox_worker: services.outbox_worker,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &AppConfig,
        state: AppState,
        policy: Arc<OriginPolicy>,
        limiters: &[(Endpoint, Arc<dyn AdmissionStore>)],
    ) -> Router {
        let limiters: HashMap<Endpoint, Arc<dyn AdmissionStore>> =
            limiters.iter().cloned().collect();

        let mut router = Router::new();
        for endpoint in Endpoint::ALL {
            let mut route: MethodRouter<AppState> = match endpoint {
                Endpoint::Chat => post(handlers::chat),
                Endpoint::CustomerFeedback => {
                    post(handlers::submit_form::<CustomerFeedbackRequest>)
                }
                Endpoint::DistributorEnquiry => {
                    post(handlers::submit_form::<DistributorEnquiryRequest>)
                }
                Endpoint::GeneralEnquiry => post(handlers::submit_form::<GeneralEnquiryRequest>),
            };

            if let Some(store) = limiters.get(&endpoint) {
                let limit = RateLimitState {
                    endpoint,
                    store: Arc::clone(store),
                    identity: state.identity.clone(),
                };
                route = route.route_layer(middleware::from_fn_with_state(
                    limit,
                    rate_limit_middleware,
                ));
            }

            router = router.route(endpoint.path(), route.fallback(handlers::method_not_allowed));
        }

        let mut router = router
            .route_layer(middleware::from_fn_with_state(policy, cors_middleware))
            .fallback(handlers::not_found)
            .with_state(state);

        if config.observability.diagnostics {
            tracing::warn!("Diagnostics enabled, error details will be returned to clients");
            router = router.layer(middleware::from_fn(diagnostics_middleware));
        }

        router = router
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(config.timeouts.request()));

        if config.security.enable_headers {
            router = router.layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ));
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The assembled router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain background tasks.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut tasks = Vec::new();

        if self.config.rate_limit.sweep_enabled && !self.limiters.is_empty() {
            let sweeper = Sweeper::new(self.limiters, self.config.rate_limit.sweep_interval());
            tasks.push(tokio::spawn(sweeper.run(shutdown.subscribe())));
        }

        if let Some(worker) = self.outbox_worker {
            tasks.push(tokio::spawn(worker.run(shutdown.subscribe())));
        }

        let mut stop = shutdown.subscribe();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Background task failed");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
