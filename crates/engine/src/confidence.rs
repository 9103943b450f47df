//! `ConfidenceScorer`: weighted sum over five factors per information type,
//! plus an aggregate across types weighting foundation types 1.5×.

use crate::types::InformationType;
use std::collections::HashMap;

pub const WEIGHT_COMPLETENESS: f64 = 0.30;
pub const WEIGHT_CORROBORATION: f64 = 0.25;
pub const WEIGHT_QUERY_SUCCESS: f64 = 0.20;
pub const WEIGHT_FACT_CONFIDENCE: f64 = 0.15;
pub const WEIGHT_SOURCE_DIVERSITY: f64 = 0.10;

pub struct ConfidenceFactors {
    pub completeness: f64,
    pub corroboration: f64,
    pub query_success: f64,
    pub fact_confidence: f64,
    pub source_diversity: f64,
}

impl ConfidenceFactors {
    pub fn as_map(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("completeness".to_string(), self.completeness),
            ("corroboration".to_string(), self.corroboration),
            ("query_success".to_string(), self.query_success),
            ("fact_confidence".to_string(), self.fact_confidence),
            ("source_diversity".to_string(), self.source_diversity),
        ])
    }

    pub fn weighted_score(&self) -> f64 {
        self.completeness * WEIGHT_COMPLETENESS
            + self.corroboration * WEIGHT_CORROBORATION
            + self.query_success * WEIGHT_QUERY_SUCCESS
            + self.fact_confidence * WEIGHT_FACT_CONFIDENCE
            + self.source_diversity * WEIGHT_SOURCE_DIVERSITY
    }
}

pub struct ConfidenceScorer;

impl ConfidenceScorer {
    /// `fact_types_with_multiple_sources` is the count of distinct
    /// fact-types that have corroborating facts from ≥2 distinct sources;
    /// `total_fact_types` is the count of distinct fact-types observed.
    #[allow(clippy::too_many_arguments)]
    pub fn score(
        info_type: InformationType,
        total_facts: usize,
        fact_types_with_multiple_sources: usize,
        total_fact_types: usize,
        successful_queries: usize,
        total_queries: usize,
        fact_confidences: &[f64],
        distinct_sources: usize,
    ) -> ConfidenceFactors {
        let expected = info_type.expected_facts().max(1) as f64;
        let completeness = (total_facts as f64 / expected).min(1.0);

        let corroboration = if total_fact_types == 0 {
            0.0
        } else {
            fact_types_with_multiple_sources as f64 / total_fact_types as f64
        };

        let query_success = if total_queries == 0 {
            0.0
        } else {
            successful_queries as f64 / total_queries as f64
        };

        let fact_confidence = if fact_confidences.is_empty() {
            0.0
        } else {
            fact_confidences.iter().sum::<f64>() / fact_confidences.len() as f64
        };

        let source_diversity = (distinct_sources as f64 / 3.0).min(1.0);

        ConfidenceFactors {
            completeness,
            corroboration,
            query_success,
            fact_confidence,
            source_diversity,
        }
    }

    /// Aggregate confidence across types, weighting foundation types 1.5×.
    pub fn aggregate(type_scores: &[(InformationType, f64)]) -> f64 {
        if type_scores.is_empty() {
            return 0.0;
        }
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for (info_type, score) in type_scores {
            let weight = if info_type.is_foundation() { 1.5 } else { 1.0 };
            weighted_sum += score * weight;
            weight_total += weight;
        }
        weighted_sum / weight_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total = WEIGHT_COMPLETENESS + WEIGHT_CORROBORATION + WEIGHT_QUERY_SUCCESS + WEIGHT_FACT_CONFIDENCE + WEIGHT_SOURCE_DIVERSITY;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn completeness_caps_at_one() {
        let factors = ConfidenceScorer::score(InformationType::Criminal, 10, 1, 1, 1, 1, &[0.9], 1);
        assert_eq!(factors.completeness, 1.0);
    }

    #[test]
    fn foundation_types_weighted_higher_in_aggregate() {
        let foundation_heavy = ConfidenceScorer::aggregate(&[(InformationType::Identity, 1.0), (InformationType::Criminal, 0.0)]);
        let non_foundation_heavy = ConfidenceScorer::aggregate(&[(InformationType::Criminal, 1.0), (InformationType::Identity, 0.0)]);
        assert!(foundation_heavy > non_foundation_heavy);
    }
}
