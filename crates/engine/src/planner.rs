//! `QueryPlanner`: given (info-type, subject, KB, locale, tier, available
//! providers), generates the cross-product of applicable check-types and
//! providers, enriched with knowledge-base facts.

use crate::types::{InformationType, KnowledgeBase, QueryType, SearchQuery};
use investigation_core::Tier;
use std::collections::HashMap;
use uuid::Uuid;

/// Minimal subject identifiers needed to build query parameters. The full
/// `Subject` entity (with audit-relevant fields) is an orchestrator/
/// repository concern; the planner only needs what feeds provider queries.
#[derive(Debug, Clone, Default)]
pub struct SubjectProfile {
    pub full_name: String,
    pub name_variants: Vec<String>,
    pub dob: Option<String>,
    pub ssn_last4: Option<String>,
    pub addresses: Vec<String>,
}

/// Applicable check-types per information type. `Reconciliation` queries no
/// provider — it synthesizes from the knowledge base instead.
pub(crate) fn check_types_for(info_type: InformationType) -> &'static [&'static str] {
    match info_type {
        InformationType::Identity => &["IDENTITY_VERIFICATION"],
        InformationType::Employment => &["EMPLOYMENT_VERIFICATION"],
        InformationType::Education => &["EDUCATION_VERIFICATION"],
        InformationType::Criminal => &["CRIMINAL_NATIONAL", "CRIMINAL_COUNTY", "CRIMINAL_FEDERAL"],
        InformationType::Civil => &["CIVIL_RECORDS"],
        InformationType::Financial => &["CREDIT_REPORT"],
        InformationType::Licenses => &["LICENSE_VERIFICATION"],
        InformationType::Sanctions => &["SANCTIONS_OFAC", "SANCTIONS_GLOBAL"],
        InformationType::Regulatory => &["REGULATORY_RECORDS"],
        InformationType::AdverseMedia => &["ADVERSE_MEDIA_SEARCH"],
        InformationType::DigitalFootprint => &["DIGITAL_FOOTPRINT"],
        InformationType::NetworkD2 => &["NETWORK_D2"],
        InformationType::NetworkD3 => &["NETWORK_D3"],
        InformationType::Reconciliation => &[],
    }
}

pub struct QueryPlanner;

impl QueryPlanner {
    #[allow(clippy::too_many_arguments)]
    pub fn plan(
        info_type: InformationType,
        subject: &SubjectProfile,
        kb: &KnowledgeBase,
        _locale: &str,
        tier: Tier,
        available_providers: &[&str],
        iteration_number: u32,
        query_type: QueryType,
        priority: i32,
    ) -> Vec<SearchQuery> {
        if tier == Tier::Standard && info_type.is_enhanced_only() {
            return Vec::new();
        }

        let mut queries = Vec::new();
        for &check_type in check_types_for(info_type) {
            for &provider_id in available_providers {
                let params = Self::build_params(info_type, subject, kb, check_type);
                queries.push(SearchQuery {
                    query_id: Uuid::new_v4(),
                    info_type,
                    query_type,
                    provider_id: provider_id.to_string(),
                    check_type: check_type.to_string(),
                    search_params: params,
                    iteration_number,
                    priority,
                });
            }
        }
        queries
    }

    /// Builds search params from subject + KB enrichment — whichever fields
    /// the information type cares about (name variants, confirmed DOB,
    /// known states/counties, known employers, known schools).
    fn build_params(
        info_type: InformationType,
        subject: &SubjectProfile,
        kb: &KnowledgeBase,
        _check_type: &str,
    ) -> HashMap<String, serde_json::Value> {
        let mut params = HashMap::new();
        params.insert("full_name".to_string(), serde_json::json!(subject.full_name));

        let mut name_variants = subject.name_variants.clone();
        name_variants.extend(kb.confirmed_names.iter().cloned());
        if !name_variants.is_empty() {
            params.insert("name_variants".to_string(), serde_json::json!(name_variants));
        }

        let dob = kb.confirmed_dob.clone().or_else(|| subject.dob.clone());
        if let Some(dob) = dob {
            params.insert("dob".to_string(), serde_json::json!(dob));
        }

        if let Some(ssn_last4) = kb.confirmed_ssn_last4.clone().or_else(|| subject.ssn_last4.clone()) {
            params.insert("ssn_last4".to_string(), serde_json::json!(ssn_last4));
        }

        match info_type {
            InformationType::Criminal | InformationType::Civil | InformationType::Regulatory => {
                if !kb.known_states.is_empty() {
                    params.insert("states".to_string(), serde_json::json!(kb.known_states.iter().collect::<Vec<_>>()));
                }
                if !kb.known_counties.is_empty() {
                    params.insert("counties".to_string(), serde_json::json!(kb.known_counties.iter().collect::<Vec<_>>()));
                }
            }
            InformationType::Employment | InformationType::NetworkD2 | InformationType::NetworkD3 => {
                if !kb.confirmed_employers.is_empty() {
                    params.insert("known_employers".to_string(), serde_json::json!(kb.confirmed_employers));
                }
            }
            InformationType::Education => {
                if !kb.confirmed_schools.is_empty() {
                    params.insert("known_schools".to_string(), serde_json::json!(kb.confirmed_schools));
                }
            }
            _ => {}
        }

        let addresses: Vec<String> = subject.addresses.iter().cloned().chain(kb.confirmed_addresses.iter().cloned()).collect();
        if !addresses.is_empty() {
            params.insert("addresses".to_string(), serde_json::json!(addresses));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_cross_product_of_check_types_and_providers() {
        let subject = SubjectProfile {
            full_name: "Jane Doe".to_string(),
            ..Default::default()
        };
        let kb = KnowledgeBase::default();
        let queries = QueryPlanner::plan(
            InformationType::Sanctions,
            &subject,
            &kb,
            "US",
            Tier::Standard,
            &["provider-a", "provider-b"],
            1,
            QueryType::Initial,
            3,
        );
        assert_eq!(queries.len(), 4); // 2 check-types * 2 providers
    }

    #[test]
    fn enhanced_only_type_plans_nothing_at_standard_tier() {
        let subject = SubjectProfile::default();
        let kb = KnowledgeBase::default();
        let queries = QueryPlanner::plan(
            InformationType::DigitalFootprint,
            &subject,
            &kb,
            "US",
            Tier::Standard,
            &["provider-a"],
            1,
            QueryType::Initial,
            2,
        );
        assert!(queries.is_empty());
    }

    #[test]
    fn criminal_query_enriches_with_known_states() {
        let subject = SubjectProfile::default();
        let mut kb = KnowledgeBase::default();
        kb.known_states.insert("CA".to_string());
        let queries = QueryPlanner::plan(
            InformationType::Criminal,
            &subject,
            &kb,
            "US",
            Tier::Standard,
            &["provider-a"],
            2,
            QueryType::Enriched,
            3,
        );
        assert!(queries[0].search_params.contains_key("states"));
    }
}
