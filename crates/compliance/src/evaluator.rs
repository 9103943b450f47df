//! `ComplianceEvaluator`: given (locale, check-type, role, tier), decides
//! whether a check is permitted and what consent/disclosure it requires.

use crate::rules::{ComplianceRule, RestrictionKind, ENHANCED_ONLY_CHECK_TYPES};
use investigation_core::Tier;
use std::collections::HashMap;

/// Outcome of evaluating one (locale, check-type, role, tier) tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub permitted: bool,
    pub lookback_days: Option<u32>,
    pub requires_consent: bool,
    pub requires_disclosure: bool,
    pub requires_enhanced_tier: bool,
    pub block_reason: Option<String>,
    pub restrictions: Vec<RestrictionKind>,
}

impl Evaluation {
    fn blocked(reason: impl Into<String>) -> Self {
        Self {
            permitted: false,
            lookback_days: None,
            requires_consent: false,
            requires_disclosure: false,
            requires_enhanced_tier: false,
            block_reason: Some(reason.into()),
            restrictions: vec![RestrictionKind::Blocked],
        }
    }

    fn tier_gated() -> Self {
        Self {
            permitted: false,
            lookback_days: None,
            requires_consent: false,
            requires_disclosure: false,
            requires_enhanced_tier: true,
            block_reason: Some("tier".to_string()),
            restrictions: vec![RestrictionKind::TierRestricted],
        }
    }

    fn role_blocked() -> Self {
        Self {
            permitted: false,
            lookback_days: None,
            requires_consent: false,
            requires_disclosure: false,
            requires_enhanced_tier: false,
            block_reason: Some("role".to_string()),
            restrictions: vec![RestrictionKind::RoleRestricted],
        }
    }

    fn permitted_from(rule: &ComplianceRule) -> Self {
        Self {
            permitted: true,
            lookback_days: rule.lookback_days,
            requires_consent: rule.requires_consent,
            requires_disclosure: rule.requires_disclosure,
            requires_enhanced_tier: rule.requires_enhanced_tier,
            block_reason: None,
            restrictions: vec![rule.restriction],
        }
    }

    fn default_permit() -> Self {
        Self {
            permitted: true,
            lookback_days: None,
            requires_consent: true,
            requires_disclosure: false,
            requires_enhanced_tier: false,
            block_reason: None,
            restrictions: vec![RestrictionKind::None],
        }
    }
}

/// Evaluates compliance rules for a tenant, layering tenant-supplied
/// overrides under a built-in default rule table.
pub struct ComplianceEvaluator {
    /// Keyed by `(locale, check_type)`; within a key, at most one rule per role.
    rules: HashMap<(String, String), Vec<ComplianceRule>>,
}

impl ComplianceEvaluator {
    /// Builds an evaluator from the built-in default rule set.
    pub fn new() -> Self {
        Self::with_rules(crate::rules::default_rules())
    }

    /// Builds an evaluator from a rule set, typically `default_rules()`
    /// extended or overridden with tenant-specific rules.
    pub fn with_rules(rules: Vec<ComplianceRule>) -> Self {
        let mut index: HashMap<(String, String), Vec<ComplianceRule>> = HashMap::new();
        for rule in rules {
            index
                .entry((rule.locale.clone(), rule.check_type.clone()))
                .or_default()
                .push(rule);
        }
        Self { rules: index }
    }

    /// Adds or replaces tenant-specific override rules, taking precedence
    /// over whatever default rule previously occupied the same key.
    pub fn with_overrides(mut self, overrides: Vec<ComplianceRule>) -> Self {
        for rule in overrides {
            self.rules
                .insert((rule.locale.clone(), rule.check_type.clone()), vec![rule]);
        }
        self
    }

    /// `evaluate(locale, check_type, role?, tier) → Evaluation`.
    pub fn evaluate(&self, locale: &str, check_type: &str, role: Option<&str>, tier: Tier) -> Evaluation {
        // Step 2 first: tier gate is independent of any per-locale rule.
        if tier == Tier::Standard && ENHANCED_ONLY_CHECK_TYPES.contains(&check_type) {
            return Evaluation::tier_gated();
        }

        // Step 1: look up rule at the most specific locale, walking to parent locales.
        let rule = self.resolve_rule(locale, check_type, role);

        let Some(rule) = rule else {
            // No rule anywhere in the chain: built-in default rejects only
            // what is explicitly tier-gated, which step 2 already handled.
            return Evaluation::default_permit();
        };

        // Step 3: blocked restriction.
        if rule.restriction == RestrictionKind::Blocked {
            return Evaluation::blocked(rule.notes.clone().unwrap_or_else(|| "blocked".to_string()));
        }

        // Step 4: role-restricted.
        if rule.restriction == RestrictionKind::RoleRestricted {
            let permitted = role.map(|r| rule.permitted_roles.iter().any(|pr| pr == r)).unwrap_or(false);
            if !permitted {
                return Evaluation::role_blocked();
            }
        }

        // Step 5: permit, carrying lookback/consent/disclosure flags from the rule.
        Evaluation::permitted_from(&rule)
    }

    /// Walks `locale → parent locale → none`, preferring a role-specific rule
    /// over a locale-wide one at each level.
    fn resolve_rule(&self, locale: &str, check_type: &str, role: Option<&str>) -> Option<ComplianceRule> {
        let mut candidate = Some(locale.to_string());
        while let Some(loc) = candidate {
            if let Some(rules) = self.rules.get(&(loc.clone(), check_type.to_string())) {
                if let Some(role) = role {
                    if let Some(r) = rules.iter().find(|r| r.role.as_deref() == Some(role)) {
                        return Some(r.clone());
                    }
                }
                if let Some(r) = rules.iter().find(|r| r.role.is_none()) {
                    return Some(r.clone());
                }
            }
            candidate = parent_locale(&loc);
        }
        None
    }

    /// `validate_checks(locale, [check-types], role?, tier) → (permitted[], blocked[(check, reason)])`.
    /// Prunes the desired check set before any routing work begins.
    pub fn validate_checks(
        &self,
        locale: &str,
        check_types: &[&str],
        role: Option<&str>,
        tier: Tier,
    ) -> (Vec<String>, Vec<(String, String)>) {
        let mut permitted = Vec::new();
        let mut blocked = Vec::new();

        for &check_type in check_types {
            let evaluation = self.evaluate(locale, check_type, role, tier);
            if evaluation.permitted {
                permitted.push(check_type.to_string());
            } else {
                blocked.push((
                    check_type.to_string(),
                    evaluation.block_reason.unwrap_or_else(|| "blocked".to_string()),
                ));
            }
        }

        (permitted, blocked)
    }
}

impl Default for ComplianceEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// `US_CA → US`, `US → None`. Locale codes below the country level use `_`
/// as the region separator (e.g. `US_CA`, `US_NY`).
fn parent_locale(locale: &str) -> Option<String> {
    locale.rsplit_once('_').map(|(parent, _region)| parent.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_gate_rejects_enhanced_only_checks_at_standard() {
        let evaluator = ComplianceEvaluator::new();
        let eval = evaluator.evaluate("US", "DIGITAL_FOOTPRINT", None, Tier::Standard);
        assert!(!eval.permitted);
        assert!(eval.requires_enhanced_tier);
    }

    #[test]
    fn enhanced_only_checks_permitted_at_enhanced_tier_absent_other_rule() {
        let evaluator = ComplianceEvaluator::new();
        let eval = evaluator.evaluate("US", "DIGITAL_FOOTPRINT", None, Tier::Enhanced);
        assert!(eval.permitted);
    }

    #[test]
    fn state_rule_overrides_country_rule() {
        let evaluator = ComplianceEvaluator::new();
        let eval = evaluator.evaluate("US_CA", "CREDIT_REPORT", Some("finance"), Tier::Standard);
        assert!(!eval.permitted);
        assert_eq!(eval.block_reason.as_deref(), Some("CA ICRAA: credit checks restricted outside enumerated exemptions"));
    }

    #[test]
    fn falls_back_to_parent_locale_when_no_state_override() {
        let evaluator = ComplianceEvaluator::new();
        let eval = evaluator.evaluate("US_NY", "EMPLOYMENT_VERIFICATION", None, Tier::Standard);
        assert!(eval.permitted);
        assert!(eval.requires_disclosure);
    }

    #[test]
    fn eu_blocks_credit_report_for_employment() {
        let evaluator = ComplianceEvaluator::new();
        let eval = evaluator.evaluate("EU", "CREDIT_REPORT", None, Tier::Standard);
        assert!(!eval.permitted);
        assert_eq!(
            eval.block_reason.as_deref(),
            Some("GDPR Article 9: Credit checks generally prohibited for employment")
        );
    }

    #[test]
    fn role_restricted_rule_blocks_unlisted_role() {
        let evaluator = ComplianceEvaluator::new();
        let eval = evaluator.evaluate("UK", "CRIMINAL_NATIONAL", Some("sales"), Tier::Standard);
        assert!(!eval.permitted);
        assert_eq!(eval.block_reason.as_deref(), Some("role"));
    }

    #[test]
    fn role_restricted_rule_permits_listed_role() {
        let evaluator = ComplianceEvaluator::new();
        let eval = evaluator.evaluate("UK", "CRIMINAL_NATIONAL", Some("finance"), Tier::Standard);
        assert!(eval.permitted);
    }

    #[test]
    fn unknown_locale_and_check_type_default_permits() {
        let evaluator = ComplianceEvaluator::new();
        let eval = evaluator.evaluate("JP", "SOME_NEW_CHECK", None, Tier::Standard);
        assert!(eval.permitted);
    }

    #[test]
    fn validate_checks_partitions_permitted_and_blocked() {
        let evaluator = ComplianceEvaluator::new();
        let (permitted, blocked) = evaluator.validate_checks(
            "EU",
            &["EMPLOYMENT_VERIFICATION", "CREDIT_REPORT"],
            None,
            Tier::Standard,
        );
        assert_eq!(permitted, vec!["EMPLOYMENT_VERIFICATION".to_string()]);
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].0, "CREDIT_REPORT");
    }
}
