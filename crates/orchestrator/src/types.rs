//! Request/outcome shapes and configuration for `ScreeningOrchestrator`.

use investigation_core::{ScreeningId, SubjectId, TenantId, Tier};
use investigation_engine::InformationType;
use investigation_risk::RiskScore;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectInput {
    pub full_name: String,
    pub date_of_birth: Option<String>,
    pub ssn_last4: Option<String>,
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningRequest {
    pub tenant_id: TenantId,
    pub subject_id: SubjectId,
    pub subject: SubjectInput,
    pub tier: Tier,
    pub role: Option<String>,
    pub locale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeOutcome {
    pub info_type: InformationType,
    pub facts: Vec<investigation_engine::Fact>,
    pub final_confidence: f64,
    pub completion_reason: Option<investigation_engine::CompletionReason>,
    /// Set when the type's SAR loop was cut short by `SarStateMachine::skip`
    /// rather than reaching a normal completion state (confidence threshold,
    /// iteration cap, diminishing returns). Carries the skip reason string
    /// (e.g. `"screening_deadline_exceeded"`, `"no_queries_available"`).
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningOutcome {
    pub screening_id: ScreeningId,
    pub type_outcomes: Vec<TypeOutcome>,
    pub blocked_types: Vec<(InformationType, String)>,
    /// Non-fatal per-type failures that did not abort the screening: a type
    /// whose SAR loop hit the deadline before producing any result. Surfaced
    /// so a caller can flag a screening as "complete with caveats" rather
    /// than either failing it outright or reporting it as fully clean.
    pub partial_failures: Vec<(InformationType, String)>,
    pub risk_score: RiskScore,
    pub cancelled: bool,
}

/// Tuning knobs for phase fan-out concurrency and per-screening deadlines.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_concurrent_types_per_phase: usize,
    pub standard_tier_deadline: Duration,
    pub enhanced_tier_deadline: Duration,
    pub foundation_confidence_threshold: f64,
    pub standard_confidence_threshold: f64,
    pub foundation_max_iterations: u32,
    pub standard_max_iterations: u32,
    pub diminishing_returns_info_gain_rate: f64,
    pub diminishing_returns_confidence_delta: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_types_per_phase: 4,
            standard_tier_deadline: Duration::from_secs(10 * 60),
            enhanced_tier_deadline: Duration::from_secs(30 * 60),
            foundation_confidence_threshold: 0.90,
            standard_confidence_threshold: 0.85,
            foundation_max_iterations: 4,
            standard_max_iterations: 3,
            diminishing_returns_info_gain_rate: 0.1,
            diminishing_returns_confidence_delta: 0.05,
        }
    }
}

impl OrchestratorConfig {
    pub fn deadline_for(&self, tier: Tier) -> Duration {
        match tier {
            Tier::Standard => self.standard_tier_deadline,
            Tier::Enhanced => self.enhanced_tier_deadline,
        }
    }
}
