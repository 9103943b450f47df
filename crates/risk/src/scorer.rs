//! `RiskScorer`: per-category weighted sums, an overall weighted average,
//! and the level/recommendation derived from it.

use crate::types::{Finding, FindingCategory, Recommendation, RiskLevel, RiskScore, Severity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

fn recency_factor(occurred_at: Option<DateTime<Utc>>) -> f64 {
    let Some(occurred_at) = occurred_at else {
        return 0.8;
    };
    let age_days = (Utc::now() - occurred_at).num_days();
    match age_days {
        d if d <= 365 => 1.0,
        d if d <= 3 * 365 => 0.9,
        d if d <= 7 * 365 => 0.7,
        _ => 0.5,
    }
}

fn corroboration_bonus(corroborated: bool) -> f64 {
    if corroborated {
        1.2
    } else {
        1.0
    }
}

pub struct RiskScorer;

impl RiskScorer {
    pub fn score(findings: &[Finding]) -> RiskScore {
        let mut by_category: HashMap<FindingCategory, Vec<&Finding>> = HashMap::new();
        for finding in findings {
            by_category.entry(finding.category).or_default().push(finding);
        }

        let category_scores: HashMap<FindingCategory, f64> = by_category
            .iter()
            .map(|(&category, findings)| (category, Self::category_score(findings)))
            .collect();

        let overall = Self::overall_score(&category_scores);
        let level = RiskLevel::from_overall(overall);

        let any_critical = findings.iter().any(|f| f.severity == Severity::Critical);
        let recommendation = if any_critical || level == RiskLevel::Critical {
            Recommendation::DoNotProceed
        } else if level == RiskLevel::High {
            Recommendation::ReviewRequired
        } else if level == RiskLevel::Moderate {
            Recommendation::ProceedWithCaution
        } else {
            Recommendation::Proceed
        };

        RiskScore {
            overall,
            level,
            recommendation,
            category_scores,
        }
    }

    fn category_score(findings: &[&Finding]) -> f64 {
        let sum: f64 = findings
            .iter()
            .map(|f| f.severity.base() * recency_factor(f.occurred_at) * f.confidence * corroboration_bonus(f.corroborated) * f.relevance)
            .sum();
        sum.clamp(0.0, 100.0)
    }

    fn overall_score(category_scores: &HashMap<FindingCategory, f64>) -> i32 {
        if category_scores.is_empty() {
            return 0;
        }
        let weighted_sum: f64 = category_scores.iter().map(|(category, score)| score * category.weight()).sum();
        let weight_total: f64 = category_scores.keys().map(|c| c.weight()).sum();
        ((weighted_sum / weight_total) as i32).clamp(0, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn finding(category: FindingCategory, severity: Severity, relevance: f64) -> Finding {
        Finding {
            finding_id: Uuid::new_v4(),
            category,
            severity,
            confidence: 1.0,
            corroborated: false,
            relevance,
            occurred_at: None,
            source_fact_type: "test".to_string(),
            description: "test".to_string(),
        }
    }

    #[test]
    fn no_findings_yields_zero_score_and_low_level() {
        let score = RiskScorer::score(&[]);
        assert_eq!(score.overall, 0);
        assert_eq!(score.level, RiskLevel::Low);
        assert_eq!(score.recommendation, Recommendation::Proceed);
    }

    #[test]
    fn critical_finding_forces_do_not_proceed() {
        let findings = vec![finding(FindingCategory::Regulatory, Severity::Critical, 1.0)];
        let score = RiskScorer::score(&findings);
        assert_eq!(score.recommendation, Recommendation::DoNotProceed);
    }

    #[test]
    fn high_severity_findings_drive_high_level() {
        let findings = vec![
            finding(FindingCategory::Criminal, Severity::High, 1.0),
            finding(FindingCategory::Criminal, Severity::High, 1.0),
        ];
        let score = RiskScorer::score(&findings);
        assert!(score.overall >= 51);
        assert_eq!(score.recommendation, Recommendation::ReviewRequired);
    }

    #[test]
    fn unknown_recency_uses_point_eight_factor() {
        let findings = vec![finding(FindingCategory::Financial, Severity::Medium, 1.0)];
        let score = RiskScorer::score(&findings);
        // 25 base * 0.8 recency * 1.0 confidence * 1.0 bonus * 1.0 relevance = 20
        assert_eq!(*score.category_scores.get(&FindingCategory::Financial).unwrap(), 20.0);
    }
}
