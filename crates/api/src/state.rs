//! Shared application state handed to every Axum handler.

use dashmap::DashMap;
use investigation_compliance::ConsentStore;
use investigation_core::{Config, ScreeningId};
use investigation_orchestrator::{CancellationToken, ScreeningOrchestrator, ScreeningRepository};
use sqlx::PgPool;
use std::sync::Arc;

/// Status of a screening whose background task is still running. Entries
/// are removed once the task finishes and writes its outcome through the
/// repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlightStatus {
    Running,
    Cancelling,
}

#[derive(Clone)]
pub struct InFlightScreening {
    pub status: InFlightStatus,
    pub cancellation: CancellationToken,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<ScreeningOrchestrator>,
    pub repository: Arc<dyn ScreeningRepository>,
    /// Shared with the orchestrator at construction time; the webhook
    /// handler grants/revokes consent here directly rather than through the
    /// orchestrator, which only reads it.
    pub consent_store: Arc<ConsentStore>,
    /// Held separately from `repository` so `/health/db` can probe the raw
    /// pool without routing through the `ScreeningRepository` abstraction.
    pub db_pool: PgPool,
    pub in_flight: Arc<DashMap<ScreeningId, InFlightScreening>>,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<ScreeningOrchestrator>,
        repository: Arc<dyn ScreeningRepository>,
        consent_store: Arc<ConsentStore>,
        db_pool: PgPool,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            repository,
            consent_store,
            db_pool,
            in_flight: Arc::new(DashMap::new()),
        }
    }
}
