//! `QueryRefiner`: turns an iteration's gaps into the next iteration's
//! `SearchQuery` batch.
//!
//! Gaps are grouped into three ordering categories: `"no_*"` gap types first
//! (nothing at all was found, highest value to fill), then `"missing_*"`
//! (partial records, a specific field absent), then everything else. Within
//! a category, lower `Gap::priority` sorts first (1 is the highest priority).

use crate::planner::check_types_for;
use crate::types::{Gap, QueryType, SearchQuery};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub const MAX_QUERIES_PER_GAP: usize = 3;
pub const MAX_TOTAL_QUERIES: usize = 15;

fn gap_category(gap_type: &str) -> u8 {
    if gap_type.starts_with("no_") {
        1
    } else if gap_type.starts_with("missing_") {
        2
    } else {
        3
    }
}

fn query_signature(provider_id: &str, check_type: &str, gap_type: &str, params: &HashMap<String, serde_json::Value>) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();
    let serialized_params = keys
        .iter()
        .map(|k| format!("{}={}", k, params[*k]))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}|{}|{}|{}", provider_id, check_type, gap_type, serialized_params)
}

pub struct QueryRefiner;

impl QueryRefiner {
    /// Builds the next iteration's queries from this iteration's gaps,
    /// deduplicated against `already_issued` signatures from prior iterations.
    pub fn refine(
        gaps: &[Gap],
        available_providers: &[&str],
        iteration_number: u32,
        already_issued: &mut HashSet<String>,
    ) -> Vec<SearchQuery> {
        let mut ordered: Vec<&Gap> = gaps.iter().filter(|g| g.can_query).collect();
        ordered.sort_by(|a, b| {
            gap_category(&a.gap_type)
                .cmp(&gap_category(&b.gap_type))
                .then(a.priority.cmp(&b.priority))
        });

        let mut queries = Vec::new();
        for gap in ordered {
            if queries.len() >= MAX_TOTAL_QUERIES {
                break;
            }
            let mut issued_for_gap = 0;
            for &check_type in check_types_for(gap.info_type) {
                for &provider_id in available_providers {
                    if issued_for_gap >= MAX_QUERIES_PER_GAP || queries.len() >= MAX_TOTAL_QUERIES {
                        break;
                    }
                    let mut params = HashMap::new();
                    params.insert("targeting_gap".to_string(), serde_json::json!(gap.gap_type));
                    params.insert("focus".to_string(), serde_json::json!(gap.description));

                    let signature = query_signature(provider_id, check_type, &gap.gap_type, &params);
                    if !already_issued.insert(signature) {
                        continue;
                    }

                    queries.push(SearchQuery {
                        query_id: Uuid::new_v4(),
                        info_type: gap.info_type,
                        query_type: QueryType::GapFill,
                        provider_id: provider_id.to_string(),
                        check_type: check_type.to_string(),
                        search_params: params,
                        iteration_number,
                        priority: i32::from(gap.priority),
                    });
                    issued_for_gap += 1;
                }
            }
        }

        queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InformationType;

    fn gap(gap_type: &str, priority: u8, info_type: InformationType) -> Gap {
        Gap {
            gap_type: gap_type.to_string(),
            description: "test gap".to_string(),
            info_type,
            priority,
            can_query: true,
        }
    }

    #[test]
    fn no_category_gaps_refine_before_missing_category() {
        let gaps = vec![
            gap("missing_employer_dates", 5, InformationType::Employment),
            gap("no_county_search", 5, InformationType::Criminal),
        ];
        let mut seen = HashSet::new();
        let queries = QueryRefiner::refine(&gaps, &["provider-a"], 2, &mut seen);
        assert_eq!(queries[0].info_type, InformationType::Criminal);
    }

    #[test]
    fn unqueryable_gaps_are_skipped() {
        let mut g = gap("no_x", 1, InformationType::Criminal);
        g.can_query = false;
        let mut seen = HashSet::new();
        let queries = QueryRefiner::refine(&[g], &["provider-a"], 2, &mut seen);
        assert!(queries.is_empty());
    }

    #[test]
    fn respects_max_total_queries() {
        let gaps: Vec<Gap> = (0..10).map(|i| gap(&format!("no_gap_{}", i), 1, InformationType::Criminal)).collect();
        let mut seen = HashSet::new();
        let queries = QueryRefiner::refine(&gaps, &["provider-a", "provider-b", "provider-c"], 2, &mut seen);
        assert!(queries.len() <= MAX_TOTAL_QUERIES);
    }

    #[test]
    fn lower_priority_number_refines_before_higher_within_a_category() {
        let gaps = vec![
            gap("no_employment_found", 3, InformationType::Employment),
            gap("no_county_search", 1, InformationType::Criminal),
        ];
        let mut seen = HashSet::new();
        let queries = QueryRefiner::refine(&gaps, &["provider-a"], 2, &mut seen);
        assert_eq!(queries[0].info_type, InformationType::Criminal);
    }

    #[test]
    fn dedups_against_already_issued_signatures() {
        let gaps = vec![gap("no_county_search", 5, InformationType::Criminal)];
        let mut seen = HashSet::new();
        let first = QueryRefiner::refine(&gaps, &["provider-a"], 2, &mut seen);
        let second = QueryRefiner::refine(&gaps, &["provider-a"], 3, &mut seen);
        assert!(!first.is_empty());
        assert!(second.is_empty());
    }
}
