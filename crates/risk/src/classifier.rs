//! `FindingClassifier`: maps facts (and detected inconsistencies) produced
//! by the investigation engine into risk `Finding`s, independent of the
//! engine's own `Fact`/`Inconsistency` types so this crate stays a pure
//! consumer of whatever shape the orchestrator hands it.

use crate::types::{Finding, FindingCategory, Severity};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Minimal fact shape the classifier needs — the orchestrator maps
/// `investigation_engine::Fact` into this.
#[derive(Debug, Clone)]
pub struct ClassifiableFact {
    pub fact_type: String,
    pub value: serde_json::Value,
    pub confidence: f64,
    pub corroborated: bool,
    pub occurred_at: Option<DateTime<Utc>>,
    /// Provider-supplied severity override, consumed verbatim when present.
    pub severity_hint: Option<Severity>,
}

fn relevance_for(category: FindingCategory, role: Option<&str>) -> f64 {
    match (category, role) {
        (FindingCategory::Criminal, Some("financial") | Some("executive")) => 0.9,
        (FindingCategory::Criminal, Some("standard")) => 0.7,
        (FindingCategory::Financial, Some("financial")) => 0.9,
        (_, None) => {
            tracing::warn!("relevance-to-role lookup with no role supplied, defaulting to 0.5");
            0.5
        }
        (_, Some(other)) => {
            tracing::warn!(role = other, "no relevance-to-role entry for this (category, role) pair, defaulting to 0.5");
            0.5
        }
    }
}

pub struct FindingClassifier;

impl FindingClassifier {
    pub fn classify_facts(facts: &[ClassifiableFact], role: Option<&str>) -> Vec<Finding> {
        facts.iter().filter_map(|fact| Self::classify_one(fact, role)).collect()
    }

    fn classify_one(fact: &ClassifiableFact, role: Option<&str>) -> Option<Finding> {
        let (category, severity, description) = if fact.fact_type.starts_with("criminal") {
            let case_type = fact.value.get("case_type").and_then(|v| v.as_str());
            let severity = match case_type {
                Some("felony") => Severity::High,
                Some("misdemeanor") => Severity::Medium,
                Some("clear") | None => return None,
                _ => Severity::Medium,
            };
            (FindingCategory::Criminal, severity, "criminal record".to_string())
        } else if fact.fact_type.starts_with("financial") {
            (FindingCategory::Financial, Severity::Medium, "financial record".to_string())
        } else if fact.fact_type.starts_with("sanctions") {
            (FindingCategory::Regulatory, Severity::Critical, "sanctions list match".to_string())
        } else if fact.fact_type.starts_with("adverse_media") {
            let severity = fact.severity_hint.unwrap_or(Severity::Medium);
            (FindingCategory::Reputation, severity, "adverse media item".to_string())
        } else if fact.fact_type.starts_with("digital") {
            (FindingCategory::Behavioral, Severity::Medium, "digital footprint signal".to_string())
        } else if fact.fact_type.starts_with("network") {
            (FindingCategory::Network, Severity::Medium, "network connection signal".to_string())
        } else {
            return None;
        };

        let severity = fact.severity_hint.unwrap_or(severity);
        Some(Finding {
            finding_id: Uuid::new_v4(),
            category,
            severity,
            confidence: fact.confidence,
            corroborated: fact.corroborated,
            relevance: relevance_for(category, role),
            occurred_at: fact.occurred_at,
            source_fact_type: fact.fact_type.clone(),
            description,
        })
    }

    /// A major inconsistency also raises a `verification` finding of medium
    /// severity, independent of whatever finding the underlying fact raised.
    pub fn classify_major_inconsistency(role: Option<&str>) -> Finding {
        Finding {
            finding_id: Uuid::new_v4(),
            category: FindingCategory::Verification,
            severity: Severity::Medium,
            confidence: 1.0,
            corroborated: true,
            relevance: relevance_for(FindingCategory::Verification, role),
            occurred_at: Some(Utc::now()),
            source_fact_type: "inconsistency.major".to_string(),
            description: "material conflict between sources".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(fact_type: &str, value: serde_json::Value) -> ClassifiableFact {
        ClassifiableFact {
            fact_type: fact_type.to_string(),
            value,
            confidence: 0.9,
            corroborated: false,
            occurred_at: None,
            severity_hint: None,
        }
    }

    #[test]
    fn felony_criminal_record_is_high_severity() {
        let f = fact("criminal.record", serde_json::json!({"case_type": "felony"}));
        let findings = FindingClassifier::classify_facts(&[f], Some("standard"));
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].category, FindingCategory::Criminal);
    }

    #[test]
    fn clear_criminal_record_emits_no_finding() {
        let f = fact("criminal.record", serde_json::json!({"case_type": "clear"}));
        let findings = FindingClassifier::classify_facts(&[f], None);
        assert!(findings.is_empty());
    }

    #[test]
    fn sanctions_match_is_critical_regulatory() {
        let f = fact("sanctions.match", serde_json::json!(true));
        let findings = FindingClassifier::classify_facts(&[f], None);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].category, FindingCategory::Regulatory);
    }

    #[test]
    fn criminal_relevance_boosted_for_financial_role() {
        let f = fact("criminal.record", serde_json::json!({"case_type": "misdemeanor"}));
        let findings = FindingClassifier::classify_facts(&[f], Some("financial"));
        assert_eq!(findings[0].relevance, 0.9);
    }

    #[test]
    fn unknown_role_defaults_relevance_to_half() {
        let f = fact("financial.credit_score", serde_json::json!(550));
        let findings = FindingClassifier::classify_facts(&[f], None);
        assert_eq!(findings[0].relevance, 0.5);
    }

    #[test]
    fn adverse_media_severity_hint_is_consumed_verbatim() {
        let mut f = fact("adverse_media.hit", serde_json::json!({}));
        f.severity_hint = Some(Severity::High);
        let findings = FindingClassifier::classify_facts(&[f], None);
        assert_eq!(findings[0].severity, Severity::High);
    }
}
