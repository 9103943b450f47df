//! Final-stage risk scoring: maps facts and inconsistencies to findings,
//! weighs them into an overall risk score, and maintains the cross-screening
//! subject graph used for network-connection findings.

pub mod classifier;
pub mod graph;
pub mod scorer;
pub mod types;

pub use classifier::{ClassifiableFact, FindingClassifier};
pub use graph::CrossScreeningIndex;
pub use scorer::RiskScorer;
pub use types::{
    Connection, ConnectionType, EdgeStrength, Finding, FindingCategory, GraphEdge, Recommendation, RiskLevel, RiskScore, Severity,
};
