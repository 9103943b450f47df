//! Compliance rule model and the built-in default rule set.

use serde::{Deserialize, Serialize};

/// How a `ComplianceRule` restricts a check-type, keyed by (locale, check-type, role?).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionKind {
    None,
    Blocked,
    LookbackLimited,
    RoleRestricted,
    Conditional,
    TierRestricted,
}

/// One compliance rule. Rules form a two-level inheritance (country →
/// region/state); a more specific rule overrides its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRule {
    pub locale: String,
    pub check_type: String,
    pub role: Option<String>,
    pub restriction: RestrictionKind,
    pub lookback_days: Option<u32>,
    pub permitted_roles: Vec<String>,
    pub requires_consent: bool,
    pub requires_disclosure: bool,
    pub requires_enhanced_tier: bool,
    pub notes: Option<String>,
}

impl ComplianceRule {
    pub fn new(locale: impl Into<String>, check_type: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            check_type: check_type.into(),
            role: None,
            restriction: RestrictionKind::None,
            lookback_days: None,
            permitted_roles: Vec::new(),
            requires_consent: true,
            requires_disclosure: false,
            requires_enhanced_tier: false,
            notes: None,
        }
    }

    pub fn blocked(mut self, notes: impl Into<String>) -> Self {
        self.restriction = RestrictionKind::Blocked;
        self.notes = Some(notes.into());
        self
    }

    pub fn role_restricted(mut self, roles: &[&str]) -> Self {
        self.restriction = RestrictionKind::RoleRestricted;
        self.permitted_roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn lookback_limited(mut self, days: u32) -> Self {
        self.restriction = RestrictionKind::LookbackLimited;
        self.lookback_days = Some(days);
        self
    }

    pub fn disclosure_required(mut self) -> Self {
        self.requires_disclosure = true;
        self
    }

    pub fn no_consent(mut self) -> Self {
        self.requires_consent = false;
        self
    }
}

/// Check-types that may only run at `Tier::Enhanced`, independent of any
/// per-locale rule. The evaluator's tier gate checks this before consulting
/// the rule table.
pub const ENHANCED_ONLY_CHECK_TYPES: &[&str] = &["DIGITAL_FOOTPRINT", "NETWORK_D3"];

/// Built-in default rule set, loaded at evaluator construction and layered
/// under any tenant-supplied override rules. Covers the locales demonstrating
/// two-level inheritance (`US` → `US_CA`/`US_NY`) plus the other named
/// jurisdictions.
pub fn default_rules() -> Vec<ComplianceRule> {
    vec![
        // US federal baseline: FCRA-bound, disclosure required on every check.
        ComplianceRule::new("US", "CRIMINAL_NATIONAL").disclosure_required(),
        ComplianceRule::new("US", "EMPLOYMENT_VERIFICATION").disclosure_required(),
        ComplianceRule::new("US", "EDUCATION_VERIFICATION").disclosure_required(),
        ComplianceRule::new("US", "CREDIT_REPORT")
            .disclosure_required()
            .role_restricted(&["finance", "executive"]),
        ComplianceRule::new("US", "SANCTIONS_OFAC").disclosure_required(),

        // US_CA state override: criminal lookback capped at 7 years (CA ICRAA).
        ComplianceRule::new("US_CA", "CRIMINAL_NATIONAL")
            .disclosure_required()
            .lookback_limited(7 * 365),
        ComplianceRule::new("US_CA", "CREDIT_REPORT")
            .blocked("CA ICRAA: credit checks restricted outside enumerated exemptions"),

        // US_NY state override: fair-chance ordering, no blanket ban here but disclosure-bound.
        ComplianceRule::new("US_NY", "CRIMINAL_NATIONAL").disclosure_required(),

        // EU: GDPR-bound, credit checks blocked for employment purposes.
        ComplianceRule::new("EU", "CREDIT_REPORT")
            .blocked("GDPR Article 9: Credit checks generally prohibited for employment"),
        ComplianceRule::new("EU", "CRIMINAL_NATIONAL").disclosure_required(),
        ComplianceRule::new("EU", "EMPLOYMENT_VERIFICATION"),
        ComplianceRule::new("EU", "EDUCATION_VERIFICATION"),

        // UK: DBS-style criminal checks, role-gated for regulated roles.
        ComplianceRule::new("UK", "CRIMINAL_NATIONAL").role_restricted(&["regulated", "finance", "childcare"]),
        ComplianceRule::new("UK", "CREDIT_REPORT"),

        // CA (Canada): PIPEDA-bound, consent required on everything.
        ComplianceRule::new("CA", "CRIMINAL_NATIONAL"),
        ComplianceRule::new("CA", "CREDIT_REPORT").role_restricted(&["finance", "executive"]),

        // AU: no blanket blocks in the default set.
        ComplianceRule::new("AU", "CRIMINAL_NATIONAL"),
    ]
}
