//! Shared data model for the SAR (Search-Assess-Refine) loop: information
//! types, phases, facts, gaps, inconsistencies, and the knowledge base.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Closed set of information types scheduled across a screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InformationType {
    Identity,
    Employment,
    Education,
    Criminal,
    Civil,
    Financial,
    Licenses,
    Sanctions,
    Regulatory,
    AdverseMedia,
    DigitalFootprint,
    NetworkD2,
    NetworkD3,
    Reconciliation,
}

impl InformationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InformationType::Identity => "IDENTITY",
            InformationType::Employment => "EMPLOYMENT",
            InformationType::Education => "EDUCATION",
            InformationType::Criminal => "CRIMINAL",
            InformationType::Civil => "CIVIL",
            InformationType::Financial => "FINANCIAL",
            InformationType::Licenses => "LICENSES",
            InformationType::Sanctions => "SANCTIONS",
            InformationType::Regulatory => "REGULATORY",
            InformationType::AdverseMedia => "ADVERSE_MEDIA",
            InformationType::DigitalFootprint => "DIGITAL_FOOTPRINT",
            InformationType::NetworkD2 => "NETWORK_D2",
            InformationType::NetworkD3 => "NETWORK_D3",
            InformationType::Reconciliation => "RECONCILIATION",
        }
    }

    /// Foundation types get the 0.90 confidence threshold and 4 max iterations.
    pub fn is_foundation(&self) -> bool {
        matches!(self, InformationType::Identity | InformationType::Employment | InformationType::Education)
    }

    pub fn is_enhanced_only(&self) -> bool {
        matches!(self, InformationType::DigitalFootprint | InformationType::NetworkD3)
    }

    /// `expected_facts` table used by `ConfidenceScorer::completeness`.
    pub fn expected_facts(&self) -> usize {
        match self {
            InformationType::Identity => 5,
            InformationType::Employment => 3,
            InformationType::Education => 3,
            InformationType::Licenses => 2,
            InformationType::Criminal => 1,
            InformationType::Civil => 1,
            InformationType::Financial => 2,
            InformationType::Sanctions => 1,
            InformationType::Regulatory => 1,
            InformationType::AdverseMedia => 1,
            InformationType::DigitalFootprint => 2,
            InformationType::NetworkD2 => 2,
            InformationType::NetworkD3 => 3,
            InformationType::Reconciliation => 5,
        }
    }
}

impl std::fmt::Display for InformationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strict phase ordering: FOUNDATION → RECORDS → INTELLIGENCE → NETWORK → RECONCILIATION.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Foundation,
    Records,
    Intelligence,
    Network,
    Reconciliation,
}

impl Phase {
    pub const ORDER: [Phase; 5] = [
        Phase::Foundation,
        Phase::Records,
        Phase::Intelligence,
        Phase::Network,
        Phase::Reconciliation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Foundation => "FOUNDATION",
            Phase::Records => "RECORDS",
            Phase::Intelligence => "INTELLIGENCE",
            Phase::Network => "NETWORK",
            Phase::Reconciliation => "RECONCILIATION",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-type lifecycle phase within the SAR loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SarPhase {
    Idle,
    Search,
    Assess,
    Refine,
    Complete,
    Capped,
    Diminished,
    Skipped,
}

/// Why a type's SAR loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    ConfidenceThresholdMet,
    MaxIterationsReached,
    DiminishingReturns,
    Skipped,
}

/// (fact-id, fact-type, value, source-provider, confidence, discovered-at).
/// Facts are immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub fact_id: Uuid,
    pub fact_type: String,
    pub value: serde_json::Value,
    pub source_provider: String,
    pub confidence: f64,
    pub discovered_at: DateTime<Utc>,
}

impl Fact {
    /// Default confidence applied when a provider adapter supplies none.
    pub const DEFAULT_CONFIDENCE: f64 = 0.85;

    pub fn new(fact_type: impl Into<String>, value: serde_json::Value, source_provider: impl Into<String>) -> Self {
        Self {
            fact_id: Uuid::new_v4(),
            fact_type: fact_type.into(),
            value,
            source_provider: source_provider.into(),
            confidence: Self::DEFAULT_CONFIDENCE,
            discovered_at: Utc::now(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarIterationState {
    pub iteration_number: u32,
    pub confidence: f64,
    pub info_gain_rate: f64,
    pub facts_extracted: usize,
    pub new_facts: usize,
    pub queries_executed: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SarIterationState {
    pub fn new(iteration_number: u32) -> Self {
        Self {
            iteration_number,
            confidence: 0.0,
            info_gain_rate: 0.0,
            facts_extracted: 0,
            new_facts: 0,
            queries_executed: 0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarTypeState {
    pub info_type: InformationType,
    pub phase: SarPhase,
    pub iterations: Vec<SarIterationState>,
    pub total_facts: usize,
    pub total_queries: usize,
    pub completion_reason: Option<CompletionReason>,
    pub final_confidence: f64,
}

impl SarTypeState {
    pub fn new(info_type: InformationType) -> Self {
        Self {
            info_type,
            phase: SarPhase::Idle,
            iterations: Vec::new(),
            total_facts: 0,
            total_queries: 0,
            completion_reason: None,
            final_confidence: 0.0,
        }
    }
}

/// Transient per-iteration data gap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub gap_type: String,
    pub description: String,
    pub info_type: InformationType,
    pub priority: u8,
    pub can_query: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InconsistencySeverity {
    Minor,
    Major,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InconsistencyType {
    SpellingVariant,
    DateDiscrepancy,
    MaterialConflict,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inconsistency {
    pub field: String,
    pub source_a_value: serde_json::Value,
    pub source_b_value: serde_json::Value,
    pub severity: InconsistencySeverity,
    pub kind: InconsistencyType,
    pub deception_score: f64,
}

/// Default deception-score heuristic: `0.1` minor, `0.6` major. Pluggable —
/// callers may substitute their own scorer.
pub fn default_deception_score(severity: InconsistencySeverity) -> f64 {
    match severity {
        InconsistencySeverity::Minor => 0.1,
        InconsistencySeverity::Major => 0.6,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveredEntityType {
    Person,
    Organization,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredEntity {
    pub entity_type: DiscoveredEntityType,
    pub name: String,
    pub discovered_from: String,
    pub source_provider: String,
    pub relationship_to_subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employer {
    pub name: String,
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub name: String,
    pub degree: Option<String>,
    pub graduation_year: Option<u32>,
}

/// Confirmed names, DOB, SSN-last-4, addresses, known states/counties,
/// employers, schools, licenses, discovered entities accumulated during one
/// screening. Monotonic: never deletes, never overwrites on conflict
/// (conflicts are recorded as `Inconsistency` instead).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub confirmed_names: HashSet<String>,
    pub confirmed_dob: Option<String>,
    pub confirmed_ssn_last4: Option<String>,
    pub confirmed_addresses: HashSet<String>,
    pub known_states: HashSet<String>,
    pub known_counties: HashSet<String>,
    pub confirmed_employers: Vec<Employer>,
    pub confirmed_schools: Vec<School>,
    pub licenses: Vec<serde_json::Value>,
    pub discovered_entities: Vec<DiscoveredEntity>,
    /// All facts seen this screening, keyed by (fact_type, normalized value, source) for dedup.
    pub seen_fact_signatures: HashSet<String>,
}

impl KnowledgeBase {
    pub fn canonicalize(value: &str) -> String {
        value.trim().to_lowercase()
    }

    pub fn add_name(&mut self, name: &str) {
        self.confirmed_names.insert(Self::canonicalize(name));
    }

    pub fn add_address(&mut self, address: &str) {
        self.confirmed_addresses.insert(Self::canonicalize(address));
    }

    pub fn fact_signature(fact_type: &str, value: &serde_json::Value, source_provider: &str) -> String {
        format!("{}|{}|{}", fact_type, value, source_provider)
    }

    /// Returns true if this is the first time this (fact_type, value, source)
    /// triple has been seen this screening, recording it as seen either way.
    pub fn observe_fact(&mut self, fact_type: &str, value: &serde_json::Value, source_provider: &str) -> bool {
        let signature = Self::fact_signature(fact_type, value, source_provider);
        self.seen_fact_signatures.insert(signature)
    }
}

/// (query-id, info-type, query-type, provider-id, check-type, search-params,
/// iteration-number, priority).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Initial,
    Enriched,
    GapFill,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query_id: Uuid,
    pub info_type: InformationType,
    pub query_type: QueryType,
    pub provider_id: String,
    pub check_type: String,
    pub search_params: HashMap<String, serde_json::Value>,
    pub iteration_number: u32,
    pub priority: i32,
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub query: SearchQuery,
    pub success: bool,
    pub payload: Option<serde_json::Value>,
}

/// Output of `ResultAssessor::assess` for one iteration.
#[derive(Debug, Clone)]
pub struct AssessmentResult {
    pub info_type: InformationType,
    pub facts: Vec<Fact>,
    pub new_facts_count: usize,
    pub gaps: Vec<Gap>,
    pub inconsistencies: Vec<Inconsistency>,
    pub confidence_factors: HashMap<String, f64>,
    pub confidence_score: f64,
    pub info_gain_rate: f64,
    pub iteration_number: u32,
}

impl AssessmentResult {
    /// Secondary observability signal; the authoritative stop decision is
    /// always `IterationController::should_continue`.
    pub fn should_continue(&self) -> bool {
        if self.confidence_score >= 0.85 {
            return false;
        }
        let queryable_gaps = self.gaps.iter().filter(|g| g.can_query).count();
        if queryable_gaps == 0 {
            return false;
        }
        if self.iteration_number > 1 && self.info_gain_rate < 0.1 {
            return false;
        }
        true
    }
}
