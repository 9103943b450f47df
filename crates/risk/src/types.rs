//! Shared data model for `FindingClassifier`, `RiskScorer`, and
//! `CrossScreeningIndex`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Criminal,
    Regulatory,
    Verification,
    Financial,
    Behavioral,
    Network,
    Reputation,
}

impl FindingCategory {
    /// Category weight used by `RiskScorer::overall_score`'s weighted average.
    pub fn weight(&self) -> f64 {
        match self {
            FindingCategory::Criminal => 1.5,
            FindingCategory::Regulatory => 1.3,
            FindingCategory::Verification => 1.2,
            FindingCategory::Financial => 1.0,
            FindingCategory::Behavioral => 1.0,
            FindingCategory::Network => 0.9,
            FindingCategory::Reputation => 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn base(&self) -> f64 {
        match self {
            Severity::Low => 10.0,
            Severity::Medium => 25.0,
            Severity::High => 50.0,
            Severity::Critical => 75.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub finding_id: Uuid,
    pub category: FindingCategory,
    pub severity: Severity,
    pub confidence: f64,
    pub corroborated: bool,
    pub relevance: f64,
    pub occurred_at: Option<DateTime<Utc>>,
    pub source_fact_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_overall(overall: i32) -> Self {
        match overall {
            0..=25 => RiskLevel::Low,
            26..=50 => RiskLevel::Moderate,
            51..=75 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Proceed,
    ProceedWithCaution,
    ReviewRequired,
    DoNotProceed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    pub overall: i32,
    pub level: RiskLevel,
    pub recommendation: Recommendation,
    pub category_scores: std::collections::HashMap<FindingCategory, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Employer,
    Colleague,
    BusinessPartner,
    Director,
    Address,
    Family,
    Associate,
    SharedFinding,
    SharedSource,
    NetworkNeighbor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStrength {
    Weak,
    Moderate,
    Strong,
    Verified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from_subject: Uuid,
    pub to_subject: Uuid,
    pub connection_type: ConnectionType,
    pub strength: EdgeStrength,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub subject_id: Uuid,
    pub connection_type: ConnectionType,
    pub strength: EdgeStrength,
    pub degree: u32,
}
