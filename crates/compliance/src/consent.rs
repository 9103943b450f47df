//! `ConsentStore`: verifies subject consent covers a required check set, and
//! the FCRA disclosure check for US locales.

use chrono::{DateTime, Utc};
use investigation_core::SubjectId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// How a consent was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    ESignature,
    WetSignature,
    HrisApi,
    RecordedVerbal,
    ManualAttestation,
}

/// Closed set of consent scopes. `BackgroundCheck` is an umbrella scope that
/// covers the basic-covered set without needing each scope granted individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentScope {
    BackgroundCheck,
    CriminalRecords,
    EmploymentVerification,
    EducationVerification,
    LicenseVerification,
    SanctionsCheck,
    CreditCheck,
    DrugTesting,
    SocialMedia,
    DigitalFootprint,
    LocationData,
    BehavioralData,
    ContinuousMonitoring,
}

/// Scopes covered by the `BackgroundCheck` umbrella scope.
const BASIC_COVERED_SET: &[ConsentScope] = &[
    ConsentScope::CriminalRecords,
    ConsentScope::EmploymentVerification,
    ConsentScope::EducationVerification,
    ConsentScope::LicenseVerification,
    ConsentScope::SanctionsCheck,
];

/// FCRA disclosure sub-record of a consent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FcraDisclosure {
    pub standalone_disclosure: bool,
    pub summary_of_rights_provided: bool,
    pub state_specific_disclosures: Vec<String>,
    /// Upstream-supplied flag, never inferred locally.
    pub investigative_consumer_report: bool,
}

/// A granted consent record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub subject_id: SubjectId,
    pub scopes: HashSet<ConsentScope>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub verification_method: VerificationMethod,
    pub locale: String,
    pub fcra_disclosure: Option<FcraDisclosure>,
    pub revoked: bool,
}

impl ConsentRecord {
    /// A consent is valid iff not revoked and not expired.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.revoked {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }

    fn covers(&self, scope: ConsentScope, now: DateTime<Utc>) -> bool {
        if !self.is_valid(now) {
            return false;
        }
        if self.scopes.contains(&scope) {
            return true;
        }
        self.scopes.contains(&ConsentScope::BackgroundCheck) && BASIC_COVERED_SET.contains(&scope)
    }
}

/// Result of `ConsentStore::verify`.
#[derive(Debug, Clone, Default)]
pub struct ConsentResult {
    pub valid: bool,
    pub consent_id: Option<SubjectId>,
    pub missing_scopes: Vec<ConsentScope>,
    pub errors: Vec<String>,
}

/// In-memory consent store keyed by subject. Persistence is a collaborator's
/// concern; this is the evaluation surface the orchestrator calls.
pub struct ConsentStore {
    records: RwLock<HashMap<SubjectId, ConsentRecord>>,
}

impl ConsentStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn grant(&self, record: ConsentRecord) {
        self.records.write().unwrap().insert(record.subject_id, record);
    }

    pub fn revoke(&self, subject_id: SubjectId) {
        if let Some(record) = self.records.write().unwrap().get_mut(&subject_id) {
            record.revoked = true;
        }
    }

    /// `verify(subject_id, required_scopes[]) → ConsentResult`.
    pub fn verify(&self, subject_id: SubjectId, required_scopes: &[ConsentScope]) -> ConsentResult {
        let now = Utc::now();
        let records = self.records.read().unwrap();

        let Some(record) = records.get(&subject_id) else {
            return ConsentResult {
                valid: false,
                consent_id: None,
                missing_scopes: required_scopes.to_vec(),
                errors: vec!["no consent on file".to_string()],
            };
        };

        let missing_scopes: Vec<ConsentScope> = required_scopes
            .iter()
            .copied()
            .filter(|scope| !record.covers(*scope, now))
            .collect();

        if !record.is_valid(now) {
            return ConsentResult {
                valid: false,
                consent_id: Some(subject_id),
                missing_scopes: required_scopes.to_vec(),
                errors: vec!["consent expired or revoked".to_string()],
            };
        }

        ConsentResult {
            valid: missing_scopes.is_empty(),
            consent_id: Some(subject_id),
            missing_scopes,
            errors: Vec::new(),
        }
    }

    /// `verify_fcra_disclosure(consent, locale) → (ok, errors[])`. Only
    /// applicable when `locale` starts with `US`; other locales return ok.
    pub fn verify_fcra_disclosure(&self, subject_id: SubjectId, locale: &str) -> (bool, Vec<String>) {
        if !locale.starts_with("US") {
            return (true, Vec::new());
        }

        let records = self.records.read().unwrap();
        let Some(record) = records.get(&subject_id) else {
            return (false, vec!["no consent on file".to_string()]);
        };

        let Some(disclosure) = &record.fcra_disclosure else {
            return (false, vec!["no FCRA disclosure recorded".to_string()]);
        };

        let mut errors = Vec::new();

        if !disclosure.standalone_disclosure {
            errors.push("standalone disclosure not recorded".to_string());
        }
        if !disclosure.summary_of_rights_provided {
            errors.push("summary of rights not provided".to_string());
        }
        if locale == "US_CA" && !disclosure.state_specific_disclosures.iter().any(|d| d == "CA_ICRAA") {
            errors.push("CA_ICRAA disclosure missing".to_string());
        }
        if locale == "US_NY" && !disclosure.state_specific_disclosures.iter().any(|d| d == "NY_FAIR_CHANCE") {
            errors.push("NY_FAIR_CHANCE disclosure missing".to_string());
        }

        (errors.is_empty(), errors)
    }

    /// Translates a check-type into the scope required to run it.
    pub fn scope_for_check_type(check_type: &str) -> ConsentScope {
        match check_type {
            "CRIMINAL_NATIONAL" | "CRIMINAL_COUNTY" | "CRIMINAL_FEDERAL" => ConsentScope::CriminalRecords,
            "EMPLOYMENT_VERIFICATION" => ConsentScope::EmploymentVerification,
            "EDUCATION_VERIFICATION" => ConsentScope::EducationVerification,
            "LICENSE_VERIFICATION" | "PROFESSIONAL_LICENSE" => ConsentScope::LicenseVerification,
            "SANCTIONS_OFAC" | "SANCTIONS_GLOBAL" => ConsentScope::SanctionsCheck,
            "CREDIT_REPORT" => ConsentScope::CreditCheck,
            "DRUG_TEST" => ConsentScope::DrugTesting,
            "ADVERSE_MEDIA_SEARCH" => ConsentScope::SocialMedia,
            "DIGITAL_FOOTPRINT" => ConsentScope::DigitalFootprint,
            "ADDRESS_HISTORY" => ConsentScope::LocationData,
            "NETWORK_D2" | "NETWORK_D3" => ConsentScope::ContinuousMonitoring,
            _ => ConsentScope::BackgroundCheck,
        }
    }
}

impl Default for ConsentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn granted(subject_id: SubjectId, scopes: &[ConsentScope]) -> ConsentRecord {
        ConsentRecord {
            subject_id,
            scopes: scopes.iter().copied().collect(),
            granted_at: Utc::now(),
            expires_at: None,
            verification_method: VerificationMethod::ESignature,
            locale: "US".to_string(),
            fcra_disclosure: None,
            revoked: false,
        }
    }

    #[test]
    fn background_check_scope_covers_basic_set() {
        let store = ConsentStore::new();
        let subject = SubjectId::new();
        store.grant(granted(subject, &[ConsentScope::BackgroundCheck]));

        let result = store.verify(subject, &[ConsentScope::CriminalRecords, ConsentScope::EmploymentVerification]);
        assert!(result.valid);
    }

    #[test]
    fn credit_check_is_always_explicit() {
        let store = ConsentStore::new();
        let subject = SubjectId::new();
        store.grant(granted(subject, &[ConsentScope::BackgroundCheck]));

        let result = store.verify(subject, &[ConsentScope::CreditCheck]);
        assert!(!result.valid);
        assert_eq!(result.missing_scopes, vec![ConsentScope::CreditCheck]);
    }

    #[test]
    fn expired_consent_fails_verification() {
        let store = ConsentStore::new();
        let subject = SubjectId::new();
        let mut record = granted(subject, &[ConsentScope::BackgroundCheck]);
        record.expires_at = Some(Utc::now() - Duration::days(1));
        store.grant(record);

        let result = store.verify(subject, &[ConsentScope::CriminalRecords]);
        assert!(!result.valid);
    }

    #[test]
    fn revoked_consent_fails_verification() {
        let store = ConsentStore::new();
        let subject = SubjectId::new();
        store.grant(granted(subject, &[ConsentScope::BackgroundCheck]));
        store.revoke(subject);

        let result = store.verify(subject, &[ConsentScope::CriminalRecords]);
        assert!(!result.valid);
    }

    #[test]
    fn missing_subject_returns_no_consent_on_file() {
        let store = ConsentStore::new();
        let result = store.verify(SubjectId::new(), &[ConsentScope::CriminalRecords]);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["no consent on file".to_string()]);
    }

    #[test]
    fn fcra_disclosure_required_in_us_locales_only() {
        let store = ConsentStore::new();
        let subject = SubjectId::new();
        let mut record = granted(subject, &[ConsentScope::BackgroundCheck]);
        record.locale = "EU".to_string();
        store.grant(record);

        let (ok, errors) = store.verify_fcra_disclosure(subject, "EU");
        assert!(ok);
        assert!(errors.is_empty());
    }

    #[test]
    fn fcra_disclosure_missing_in_us_fails() {
        let store = ConsentStore::new();
        let subject = SubjectId::new();
        store.grant(granted(subject, &[ConsentScope::BackgroundCheck]));

        let (ok, errors) = store.verify_fcra_disclosure(subject, "US");
        assert!(!ok);
        assert!(!errors.is_empty());
    }

    #[test]
    fn us_ca_requires_ca_icraa_disclosure() {
        let store = ConsentStore::new();
        let subject = SubjectId::new();
        let mut record = granted(subject, &[ConsentScope::BackgroundCheck]);
        record.fcra_disclosure = Some(FcraDisclosure {
            standalone_disclosure: true,
            summary_of_rights_provided: true,
            state_specific_disclosures: Vec::new(),
            investigative_consumer_report: false,
        });
        store.grant(record);

        let (ok, errors) = store.verify_fcra_disclosure(subject, "US_CA");
        assert!(!ok);
        assert!(errors.iter().any(|e| e.contains("CA_ICRAA")));
    }

    #[test]
    fn us_ca_passes_with_ca_icraa_disclosure() {
        let store = ConsentStore::new();
        let subject = SubjectId::new();
        let mut record = granted(subject, &[ConsentScope::BackgroundCheck]);
        record.fcra_disclosure = Some(FcraDisclosure {
            standalone_disclosure: true,
            summary_of_rights_provided: true,
            state_specific_disclosures: vec!["CA_ICRAA".to_string()],
            investigative_consumer_report: false,
        });
        store.grant(record);

        let (ok, _) = store.verify_fcra_disclosure(subject, "US_CA");
        assert!(ok);
    }

    #[test]
    fn scope_for_check_type_maps_known_checks() {
        assert_eq!(ConsentStore::scope_for_check_type("CRIMINAL_NATIONAL"), ConsentScope::CriminalRecords);
        assert_eq!(ConsentStore::scope_for_check_type("CREDIT_REPORT"), ConsentScope::CreditCheck);
        assert_eq!(ConsentStore::scope_for_check_type("DIGITAL_FOOTPRINT"), ConsentScope::DigitalFootprint);
        assert_eq!(ConsentStore::scope_for_check_type("NETWORK_D3"), ConsentScope::ContinuousMonitoring);
    }
}
