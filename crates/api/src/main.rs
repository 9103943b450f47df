//! # Investigation API Server
//!
//! HTTP front door for the background-screening investigation core, built
//! with Axum. Provides:
//!
//! - **Screening REST API** (§6.1): enqueue, poll, cooperatively cancel
//! - **HRIS webhook intake** (§6.3): hire/rehire/consent/position/
//!   termination events from tenant HR systems
//! - **Interactive API docs**: Swagger UI with the OpenAPI schema
//! - **Security middleware**: CORS, security headers, request ID tracking
//! - **Health monitoring**: liveness, database, and readiness probes
//!
//! ## Middleware Stack
//!
//! Requests flow through middleware in this order:
//! 1. **Security Headers**: HSTS, CSP, X-Frame-Options
//! 2. **Request ID**: unique tracking for request tracing
//! 3. **Tenant context**: `X-Tenant-ID` extraction
//! 4. **Tracing**: structured logging with correlation IDs
//! 5. **Compression**: gzip/brotli response compression
//! 6. **CORS**: cross-origin resource sharing policies
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin investigation-server
//! ```

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use investigation_compliance::{ComplianceEvaluator, ConsentStore};
use investigation_core::{Config, CorsConfig};
use investigation_orchestrator::{OrchestratorConfig, ScreeningOrchestrator};
use investigation_routing::{BackoffConfig, CacheStore, PriorityDispatcher, RequestRouter};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use axum::http::{HeaderName, HeaderValue, Method};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api_middleware;
mod error;
mod handlers;
mod health;
mod providers;
mod repository;
mod state;

use crate::{
    handlers::{screenings, webhooks},
    repository::PgScreeningRepository,
    state::AppState,
};

/// Builds a CORS layer from configuration settings.
fn build_cors_layer(cors_config: &CorsConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let mut cors = CorsLayer::new();

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Result<Vec<HeaderValue>, _> = cors_config.allowed_origins.iter().map(|origin| origin.parse()).collect();
        cors = cors.allow_origin(origins?);
    }

    if cors_config.allowed_methods.contains(&"*".to_string()) {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Result<Vec<Method>, _> = cors_config.allowed_methods.iter().map(|method| method.parse()).collect();
        cors = cors.allow_methods(methods?);
    }

    if cors_config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Result<Vec<HeaderName>, _> = cors_config.allowed_headers.iter().map(|header| header.parse()).collect();
        cors = cors.allow_headers(headers?);
    }

    if !cors_config.expose_headers.is_empty() {
        let expose_headers: Result<Vec<HeaderName>, _> = cors_config.expose_headers.iter().map(|header| header.parse()).collect();
        cors = cors.expose_headers(expose_headers?);
    }

    cors = cors.allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting investigation server...");

    // `Config::load` validates itself (threshold ranges, production-secret
    // checks, CORS wildcard rejection in production) before returning.
    let config = Config::load()?;
    info!("Configuration loaded and validated");

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;
    info!("Database pool initialized");

    let repository: Arc<dyn investigation_orchestrator::ScreeningRepository> = {
        let repo = PgScreeningRepository::new(db_pool.clone());
        repo.ensure_schema().await?;
        Arc::new(repo)
    };
    info!("Screening repository schema ready");

    let cache = Arc::new(CacheStore::new());
    let router = Arc::new(RequestRouter::new(
        cache,
        BackoffConfig::default(),
        config.circuit_breaker.failure_threshold,
        config.circuit_breaker.open_for_seconds,
        config.rate_limit.default_provider_requests_per_minute,
    ));
    // Operators register real provider adapters per check-type at startup,
    // e.g.: router.register_provider("CRIMINAL_NATIONAL", Arc::new(HttpProviderAdapter::new(...)));
    let dispatcher = Arc::new(PriorityDispatcher::new(router, config.rate_limit.global_requests_per_minute));

    // `ComplianceEvaluator::new` already loads the built-in default rule
    // table; tenant-specific overrides would be layered on via `with_overrides`.
    let evaluator = Arc::new(ComplianceEvaluator::new());
    let consent_store = Arc::new(ConsentStore::new());

    let orchestrator_config = OrchestratorConfig {
        standard_tier_deadline: std::time::Duration::from_secs(config.screening.standard_tier_deadline_seconds),
        enhanced_tier_deadline: std::time::Duration::from_secs(config.screening.enhanced_tier_deadline_seconds),
        foundation_confidence_threshold: config.sar.foundation_confidence_threshold,
        standard_confidence_threshold: config.sar.standard_confidence_threshold,
        foundation_max_iterations: config.sar.foundation_max_iterations,
        standard_max_iterations: config.sar.standard_max_iterations,
        diminishing_returns_info_gain_rate: config.sar.diminishing_returns_info_gain_rate,
        diminishing_returns_confidence_delta: config.sar.diminishing_returns_confidence_delta,
        ..OrchestratorConfig::default()
    };

    let orchestrator = Arc::new(ScreeningOrchestrator::new(
        dispatcher,
        evaluator,
        consent_store.clone(),
        repository.clone(),
        orchestrator_config,
    ));
    info!("Screening orchestrator initialized");

    let app_state = AppState::new(config.clone(), orchestrator, repository, consent_store, db_pool);

    let app = create_app(app_state)?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(state: AppState) -> Result<Router, Box<dyn std::error::Error>> {
    #[derive(OpenApi)]
    #[openapi(
        paths(
            health::health_check,
            health::db_health_check,
            health::readiness_check,
            screenings::create_screening,
            screenings::get_screening,
            screenings::cancel_screening,
        ),
        components(schemas()),
        tags(
            (name = "health", description = "Health check endpoints"),
            (name = "screenings", description = "Screening lifecycle"),
        )
    )]
    struct ApiDoc;

    let cors_layer = build_cors_layer(&state.config.cors)?;

    let router = Router::new()
        .nest("/v1/screenings", screenings::screening_routes())
        .nest("/v1/hris/webhooks", webhooks::webhook_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", axum::routing::get(health::health_check))
        .route("/health/db", axum::routing::get(health::db_health_check))
        .route("/health/ready", axum::routing::get(health::readiness_check))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(api_middleware::security_headers::security_headers_middleware))
                .layer(axum::middleware::from_fn(api_middleware::request_id::request_id_middleware))
                .layer(axum::middleware::from_fn(api_middleware::tenant_context::tenant_context_middleware))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(cors_layer),
        )
        .with_state(state)
        .fallback(handler_404);

    Ok(router)
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "Resource not found" })))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "investigation_api=debug,investigation_orchestrator=debug,investigation_core=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
