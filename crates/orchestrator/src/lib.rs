//! Wires compliance, consent, the SAR engine, and risk scoring into one
//! screening driver with cancellation and per-tier deadlines.

pub mod orchestrator;
pub mod repository;
pub mod types;

pub use orchestrator::ScreeningOrchestrator;
pub use repository::{ScreeningRepository, Tenant};
pub use types::{OrchestratorConfig, ScreeningOutcome, ScreeningRequest, SubjectInput, TypeOutcome};
pub use tokio_util::sync::CancellationToken;
