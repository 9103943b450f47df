//! `ResultAssessor`: turns a batch of `QueryResult`s into facts, gaps,
//! inconsistencies, discovered entities, and a confidence score for one
//! iteration of one information type's SAR loop.

use crate::confidence::ConfidenceScorer;
use crate::types::{
    AssessmentResult, DiscoveredEntity, DiscoveredEntityType, Fact, Gap, Inconsistency, InconsistencySeverity,
    InconsistencyType, InformationType, KnowledgeBase, QueryResult, default_deception_score,
};
use std::collections::HashMap;

/// One payload key this info-type extracts facts from.
struct FieldSpec {
    key: &'static str,
    fact_type: &'static str,
    array: bool,
}

impl FieldSpec {
    const fn scalar(key: &'static str, fact_type: &'static str) -> Self {
        Self { key, fact_type, array: false }
    }

    const fn array(key: &'static str, fact_type: &'static str) -> Self {
        Self { key, fact_type, array: true }
    }
}

/// Record-types report either a list of records or a `clear` boolean, never
/// both. `clear_spec` is consulted separately from `field_map` because the
/// two are mutually exclusive per payload.
struct ClearSpec {
    record_key: &'static str,
    clear_key: &'static str,
    clear_fact_type: &'static str,
}

/// Per-information-type field map: raw payload key → fact type, with an
/// `array` flag for list-valued payload fields (one fact per entry).
fn field_map(info_type: InformationType) -> &'static [FieldSpec] {
    match info_type {
        InformationType::Identity => &[
            FieldSpec::scalar("full_name", "name_variant"),
            FieldSpec::array("name_variants", "name_variant"),
            FieldSpec::scalar("date_of_birth", "dob"),
            FieldSpec::scalar("ssn_last4", "ssn_last4"),
            FieldSpec::array("addresses", "address"),
            FieldSpec::scalar("phone", "phone"),
        ],
        InformationType::Employment => &[FieldSpec::array("employers", "employer")],
        InformationType::Education => &[FieldSpec::array("schools", "school")],
        InformationType::Criminal | InformationType::Civil | InformationType::Regulatory => {
            &[FieldSpec::array("records", "criminal_record")]
        }
        InformationType::Financial => &[FieldSpec::array("records", "financial_record")],
        InformationType::Licenses => &[FieldSpec::array("licenses", "license")],
        InformationType::Sanctions => &[FieldSpec::array("matches", "sanctions_match")],
        InformationType::AdverseMedia => &[FieldSpec::array("articles", "adverse_media_item")],
        InformationType::DigitalFootprint => &[FieldSpec::array("profiles", "digital_profile")],
        InformationType::NetworkD2 | InformationType::NetworkD3 => &[FieldSpec::array("connections", "network_connection")],
        InformationType::Reconciliation => &[
            FieldSpec::scalar("name_consistency", "reconciliation.name"),
            FieldSpec::scalar("dob_consistency", "reconciliation.dob"),
            FieldSpec::scalar("employment_consistency", "reconciliation.employment"),
            FieldSpec::scalar("education_consistency", "reconciliation.education"),
            FieldSpec::scalar("criminal_consistency", "reconciliation.criminal"),
        ],
    }
}

fn clear_spec(info_type: InformationType) -> Option<ClearSpec> {
    match info_type {
        InformationType::Criminal | InformationType::Civil | InformationType::Regulatory => Some(ClearSpec {
            record_key: "records",
            clear_key: "clear",
            clear_fact_type: "criminal_clear",
        }),
        InformationType::Financial => Some(ClearSpec {
            record_key: "records",
            clear_key: "clear",
            clear_fact_type: "financial_clear",
        }),
        InformationType::Sanctions => Some(ClearSpec {
            record_key: "matches",
            clear_key: "clear",
            clear_fact_type: "sanctions_clear",
        }),
        _ => None,
    }
}

/// Naive Levenshtein distance, used only on short name/date strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }
    row[b.len()]
}

fn similarity_ratio(a: &str, b: &str) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(a, b) as f64 / max_len as f64)
}

pub struct ResultAssessor;

impl ResultAssessor {
    /// Assesses one iteration's results for one information type, updating
    /// `kb` in place (monotonic accumulation) and returning the iteration's
    /// `AssessmentResult`.
    pub fn assess(info_type: InformationType, results: &[QueryResult], kb: &mut KnowledgeBase, iteration_number: u32) -> AssessmentResult {
        let fields = field_map(info_type);
        let clear = clear_spec(info_type);
        let mut facts = Vec::new();
        let mut new_facts_count = 0;
        let mut field_values: HashMap<&'static str, Vec<(String, serde_json::Value)>> = HashMap::new();
        let mut successful_queries = 0;
        let mut distinct_sources = std::collections::HashSet::new();

        for result in results {
            if !result.success {
                continue;
            }
            successful_queries += 1;
            let Some(payload) = &result.payload else { continue };
            let provider_id = &result.query.provider_id;
            distinct_sources.insert(provider_id.clone());

            for spec in fields {
                let Some(raw) = payload.get(spec.key) else { continue };
                if spec.array {
                    let Some(entries) = raw.as_array() else { continue };
                    for entry in entries {
                        if entry.is_null() {
                            continue;
                        }
                        Self::record_fact(spec.fact_type, entry.clone(), provider_id, &mut field_values, &mut facts, &mut new_facts_count, kb);
                    }
                } else if !raw.is_null() {
                    Self::record_fact(spec.fact_type, raw.clone(), provider_id, &mut field_values, &mut facts, &mut new_facts_count, kb);
                }
            }

            if let Some(clear) = &clear {
                let has_records = payload.get(clear.record_key).and_then(|v| v.as_array()).map(|a| !a.is_empty()).unwrap_or(false);
                let is_clear = payload.get(clear.clear_key).and_then(|v| v.as_bool()).unwrap_or(false);
                if is_clear && !has_records {
                    Self::record_fact(clear.clear_fact_type, serde_json::json!(true), provider_id, &mut field_values, &mut facts, &mut new_facts_count, kb);
                }
            }
        }

        Self::update_knowledge_base(info_type, &field_values, kb);
        let gaps = Self::identify_gaps(info_type, &field_values);
        let inconsistencies = Self::detect_inconsistencies(&field_values);
        let discovered_entities = Self::discover_entities(info_type, &field_values);
        kb.discovered_entities.extend(discovered_entities);

        let total_fact_types = field_values.len();
        let corroborated_types = field_values.values().filter(|v| v.len() >= 2).count();
        let fact_confidences: Vec<f64> = facts.iter().map(|f| f.confidence).collect();

        let factors = ConfidenceScorer::score(
            info_type,
            facts.len(),
            corroborated_types,
            total_fact_types,
            successful_queries,
            results.len(),
            &fact_confidences,
            distinct_sources.len(),
        );
        let confidence_score = factors.weighted_score();

        let queries_executed = results.len();
        let info_gain_rate = new_facts_count as f64 / queries_executed.max(1) as f64;

        AssessmentResult {
            info_type,
            facts,
            new_facts_count,
            gaps,
            inconsistencies,
            confidence_factors: factors.as_map(),
            confidence_score,
            info_gain_rate,
            iteration_number,
        }
    }

    fn record_fact(
        fact_type: &'static str,
        value: serde_json::Value,
        provider_id: &str,
        field_values: &mut HashMap<&'static str, Vec<(String, serde_json::Value)>>,
        facts: &mut Vec<Fact>,
        new_facts_count: &mut usize,
        kb: &mut KnowledgeBase,
    ) {
        field_values.entry(fact_type).or_default().push((provider_id.to_string(), value.clone()));
        if kb.observe_fact(fact_type, &value, provider_id) {
            *new_facts_count += 1;
        }
        facts.push(Fact::new(fact_type, value, provider_id.to_string()));
    }

    fn update_knowledge_base(info_type: InformationType, field_values: &HashMap<&'static str, Vec<(String, serde_json::Value)>>, kb: &mut KnowledgeBase) {
        match info_type {
            InformationType::Identity => {
                if let Some(values) = field_values.get("name_variant") {
                    for (_, v) in values {
                        if let Some(name) = v.as_str() {
                            kb.add_name(name);
                        }
                    }
                }
                if let Some(values) = field_values.get("dob") {
                    if kb.confirmed_dob.is_none() {
                        if let Some((_, v)) = values.first() {
                            kb.confirmed_dob = v.as_str().map(|s| s.to_string());
                        }
                    }
                }
                if let Some(values) = field_values.get("ssn_last4") {
                    if kb.confirmed_ssn_last4.is_none() {
                        if let Some((_, v)) = values.first() {
                            kb.confirmed_ssn_last4 = v.as_str().map(|s| s.to_string());
                        }
                    }
                }
                if let Some(values) = field_values.get("address") {
                    for (_, v) in values {
                        if let Some(address) = v.as_str() {
                            kb.add_address(address);
                        }
                    }
                }
            }
            InformationType::Employment => {
                if let Some(values) = field_values.get("employer") {
                    for (_, v) in values {
                        if let Some(name) = v.get("name").and_then(|n| n.as_str()) {
                            if !kb.confirmed_employers.iter().any(|e| e.name == name) {
                                kb.confirmed_employers.push(crate::types::Employer {
                                    name: name.to_string(),
                                    title: v.get("title").and_then(|t| t.as_str()).map(str::to_string),
                                    start_date: v.get("start_date").and_then(|t| t.as_str()).map(str::to_string),
                                    end_date: v.get("end_date").and_then(|t| t.as_str()).map(str::to_string),
                                    location: v.get("location").and_then(|t| t.as_str()).map(str::to_string),
                                    current: v.get("current").and_then(|c| c.as_bool()).unwrap_or(false),
                                });
                            }
                        }
                    }
                }
            }
            InformationType::Education => {
                if let Some(values) = field_values.get("school") {
                    for (_, v) in values {
                        if let Some(name) = v.get("name").and_then(|n| n.as_str()) {
                            if !kb.confirmed_schools.iter().any(|s| s.name == name) {
                                kb.confirmed_schools.push(crate::types::School {
                                    name: name.to_string(),
                                    degree: v.get("degree").and_then(|d| d.as_str()).map(str::to_string),
                                    graduation_year: v.get("graduation_year").and_then(|y| y.as_u64()).map(|y| y as u32),
                                });
                            }
                        }
                    }
                }
            }
            InformationType::Licenses => {
                if let Some(values) = field_values.get("license") {
                    for (_, v) in values {
                        if !kb.licenses.contains(v) {
                            kb.licenses.push(v.clone());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Gap types/priorities per information type, per the concrete gap
    /// table: `"no_*"` when a type has nothing at all, a specific named gap
    /// when part of the record is present but a named piece is missing.
    fn identify_gaps(info_type: InformationType, field_values: &HashMap<&'static str, Vec<(String, serde_json::Value)>>) -> Vec<Gap> {
        match info_type {
            InformationType::Identity => {
                let mut gaps = Vec::new();
                if !field_values.contains_key("address") {
                    gaps.push(Gap {
                        gap_type: "missing_address".to_string(),
                        description: "no confirmed address on file".to_string(),
                        info_type,
                        priority: 2,
                        can_query: true,
                    });
                }
                if !field_values.contains_key("dob") {
                    gaps.push(Gap {
                        gap_type: "missing_dob".to_string(),
                        description: "date of birth not confirmed".to_string(),
                        info_type,
                        priority: 1,
                        can_query: true,
                    });
                }
                gaps
            }
            InformationType::Employment => match field_values.get("employer") {
                None => vec![Gap {
                    gap_type: "no_employment_found".to_string(),
                    description: "no employment history returned by any provider".to_string(),
                    info_type,
                    priority: 1,
                    can_query: true,
                }],
                Some(values) => {
                    if values.iter().any(|(_, v)| Self::employer_missing_end_date(v)) {
                        vec![Gap {
                            gap_type: "missing_end_date".to_string(),
                            description: "an employer record is missing an end date".to_string(),
                            info_type,
                            priority: 2,
                            can_query: true,
                        }]
                    } else {
                        Vec::new()
                    }
                }
            },
            InformationType::Education => {
                if field_values.contains_key("school") {
                    Vec::new()
                } else {
                    vec![Gap {
                        gap_type: "no_education_found".to_string(),
                        description: "no education history returned by any provider".to_string(),
                        info_type,
                        priority: 1,
                        can_query: true,
                    }]
                }
            }
            InformationType::Criminal | InformationType::Civil | InformationType::Regulatory | InformationType::Financial | InformationType::Sanctions => {
                if field_values.is_empty() {
                    vec![Gap {
                        gap_type: format!("no_{}_data", info_type.as_str().to_lowercase()),
                        description: format!("no {} data returned by any provider", info_type),
                        info_type,
                        priority: 1,
                        can_query: true,
                    }]
                } else {
                    Vec::new()
                }
            }
            _ => {
                if field_values.is_empty() {
                    vec![Gap {
                        gap_type: "no_data_found".to_string(),
                        description: format!("no {} data returned by any provider", info_type),
                        info_type,
                        priority: 9,
                        can_query: true,
                    }]
                } else {
                    field_map(info_type)
                        .iter()
                        .filter(|spec| !field_values.contains_key(spec.fact_type))
                        .map(|spec| Gap {
                            gap_type: format!("missing_{}", spec.fact_type),
                            description: format!("{} field not returned for {}", spec.fact_type, info_type),
                            info_type,
                            priority: 5,
                            can_query: true,
                        })
                        .collect()
                }
            }
        }
    }

    fn employer_missing_end_date(value: &serde_json::Value) -> bool {
        let has_end_date = value.get("end_date").map(|v| !v.is_null()).unwrap_or(false);
        let is_current = value.get("current").and_then(|v| v.as_bool()).unwrap_or(false);
        !has_end_date && !is_current
    }

    /// Flags disagreement between two sources for the same field: close
    /// strings are a spelling variant, dates that differ are a date
    /// discrepancy, anything else is a material conflict.
    fn detect_inconsistencies(field_values: &HashMap<&'static str, Vec<(String, serde_json::Value)>>) -> Vec<Inconsistency> {
        let mut inconsistencies = Vec::new();
        for (field, values) in field_values {
            for i in 0..values.len() {
                for j in (i + 1)..values.len() {
                    let (_, a) = &values[i];
                    let (_, b) = &values[j];
                    if a == b {
                        continue;
                    }
                    let classified = if let (Some(a_str), Some(b_str)) = (a.as_str(), b.as_str()) {
                        if field.contains("date") {
                            (a_str != b_str).then_some((InconsistencyType::DateDiscrepancy, InconsistencySeverity::Major))
                        } else {
                            let ratio = similarity_ratio(a_str, b_str);
                            if ratio >= 0.85 {
                                None
                            } else if ratio >= 0.5 {
                                Some((InconsistencyType::SpellingVariant, InconsistencySeverity::Minor))
                            } else {
                                Some((InconsistencyType::MaterialConflict, InconsistencySeverity::Major))
                            }
                        }
                    } else {
                        Some((InconsistencyType::Other, InconsistencySeverity::Minor))
                    };

                    if let Some((kind, severity)) = classified {
                        inconsistencies.push(Inconsistency {
                            field: field.to_string(),
                            source_a_value: a.clone(),
                            source_b_value: b.clone(),
                            severity,
                            kind,
                            deception_score: default_deception_score(severity),
                        });
                    }
                }
            }
        }
        inconsistencies
    }

    fn discover_entities(info_type: InformationType, field_values: &HashMap<&'static str, Vec<(String, serde_json::Value)>>) -> Vec<DiscoveredEntity> {
        if !matches!(info_type, InformationType::NetworkD2 | InformationType::NetworkD3) {
            return Vec::new();
        }
        field_values
            .get("network_connection")
            .map(|values| {
                values
                    .iter()
                    .filter_map(|(provider, v)| {
                        v.get("name").and_then(|n| n.as_str()).map(|name| DiscoveredEntity {
                            entity_type: DiscoveredEntityType::Person,
                            name: name.to_string(),
                            discovered_from: info_type.to_string(),
                            source_provider: provider.clone(),
                            relationship_to_subject: v.get("relationship").and_then(|r| r.as_str()).unwrap_or("associate").to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QueryType, SearchQuery};
    use uuid::Uuid;

    fn make_query(info_type: InformationType, provider: &str) -> SearchQuery {
        SearchQuery {
            query_id: Uuid::new_v4(),
            info_type,
            query_type: QueryType::Initial,
            provider_id: provider.to_string(),
            check_type: "IDENTITY_VERIFICATION".to_string(),
            search_params: HashMap::new(),
            iteration_number: 1,
            priority: 3,
        }
    }

    #[test]
    fn extracts_facts_from_successful_payload() {
        let mut kb = KnowledgeBase::default();
        let results = vec![QueryResult {
            query: make_query(InformationType::Identity, "provider-a"),
            success: true,
            payload: Some(serde_json::json!({"full_name": "Jane Doe", "date_of_birth": "1990-01-01"})),
        }];
        let assessment = ResultAssessor::assess(InformationType::Identity, &results, &mut kb, 1);
        assert_eq!(assessment.new_facts_count, 2);
        assert!(kb.confirmed_names.contains("jane doe"));
    }

    #[test]
    fn no_successful_results_yields_type_specific_no_data_gap() {
        let mut kb = KnowledgeBase::default();
        let results = vec![QueryResult {
            query: make_query(InformationType::Criminal, "provider-a"),
            success: false,
            payload: None,
        }];
        let assessment = ResultAssessor::assess(InformationType::Criminal, &results, &mut kb, 1);
        assert_eq!(assessment.gaps.len(), 1);
        assert_eq!(assessment.gaps[0].gap_type, "no_criminal_data");
    }

    #[test]
    fn clean_criminal_record_produces_a_clear_fact_not_a_gap() {
        let mut kb = KnowledgeBase::default();
        let results = vec![QueryResult {
            query: make_query(InformationType::Criminal, "provider-a"),
            success: true,
            payload: Some(serde_json::json!({"clear": true})),
        }];
        let assessment = ResultAssessor::assess(InformationType::Criminal, &results, &mut kb, 1);
        assert!(assessment.gaps.is_empty());
        assert!(assessment.facts.iter().any(|f| f.fact_type == "criminal_clear" && f.value == serde_json::json!(true)));
    }

    #[test]
    fn multiple_employers_each_produce_a_fact() {
        let mut kb = KnowledgeBase::default();
        let results = vec![QueryResult {
            query: make_query(InformationType::Employment, "provider-a"),
            success: true,
            payload: Some(serde_json::json!({"employers": [
                {"name": "Acme Corp", "end_date": "2020-01-01"},
                {"name": "Beta Inc", "current": true},
            ]})),
        }];
        let assessment = ResultAssessor::assess(InformationType::Employment, &results, &mut kb, 1);
        assert_eq!(assessment.facts.len(), 2);
        assert_eq!(kb.confirmed_employers.len(), 2);
        assert!(assessment.gaps.is_empty());
    }

    #[test]
    fn employer_without_end_date_or_current_flag_produces_missing_end_date_gap() {
        let mut kb = KnowledgeBase::default();
        let results = vec![QueryResult {
            query: make_query(InformationType::Employment, "provider-a"),
            success: true,
            payload: Some(serde_json::json!({"employers": [{"name": "Acme Corp"}]})),
        }];
        let assessment = ResultAssessor::assess(InformationType::Employment, &results, &mut kb, 1);
        assert!(assessment.gaps.iter().any(|g| g.gap_type == "missing_end_date"));
    }

    #[test]
    fn no_employers_at_all_produces_no_employment_found_gap() {
        let mut kb = KnowledgeBase::default();
        let results = vec![QueryResult {
            query: make_query(InformationType::Employment, "provider-a"),
            success: true,
            payload: Some(serde_json::json!({})),
        }];
        let assessment = ResultAssessor::assess(InformationType::Employment, &results, &mut kb, 1);
        assert!(assessment.gaps.iter().any(|g| g.gap_type == "no_employment_found"));
    }

    #[test]
    fn conflicting_names_across_sources_flagged_as_inconsistency() {
        let mut kb = KnowledgeBase::default();
        let results = vec![
            QueryResult {
                query: make_query(InformationType::Identity, "provider-a"),
                success: true,
                payload: Some(serde_json::json!({"full_name": "Jon Smith"})),
            },
            QueryResult {
                query: make_query(InformationType::Identity, "provider-b"),
                success: true,
                payload: Some(serde_json::json!({"full_name": "Robert Jones"})),
            },
        ];
        let assessment = ResultAssessor::assess(InformationType::Identity, &results, &mut kb, 1);
        assert!(!assessment.inconsistencies.is_empty());
    }

    #[test]
    fn network_d2_discovers_associate_entities() {
        let mut kb = KnowledgeBase::default();
        let results = vec![QueryResult {
            query: make_query(InformationType::NetworkD2, "provider-a"),
            success: true,
            payload: Some(serde_json::json!({"connections": [{"name": "Sam Associate", "relationship": "business_partner"}]})),
        }];
        ResultAssessor::assess(InformationType::NetworkD2, &results, &mut kb, 1);
        assert_eq!(kb.discovered_entities.len(), 1);
        assert_eq!(kb.discovered_entities[0].name, "Sam Associate");
        assert_eq!(kb.discovered_entities[0].relationship_to_subject, "business_partner");
    }

    #[test]
    fn repeated_fact_across_iterations_is_not_counted_as_new_twice() {
        let mut kb = KnowledgeBase::default();
        let results = vec![QueryResult {
            query: make_query(InformationType::Identity, "provider-a"),
            success: true,
            payload: Some(serde_json::json!({"full_name": "Jane Doe"})),
        }];
        let first = ResultAssessor::assess(InformationType::Identity, &results, &mut kb, 1);
        let second = ResultAssessor::assess(InformationType::Identity, &results, &mut kb, 2);
        assert_eq!(first.new_facts_count, 1);
        assert_eq!(second.new_facts_count, 0);
    }
}
