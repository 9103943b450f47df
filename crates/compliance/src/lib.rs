//! Compliance evaluation and consent verification for background screenings.
//!
//! Mirrors the locale/role rule-resolution shape of a generic compliance
//! framework trait, specialized to the single `evaluate`/`validate_checks`
//! contract this domain actually needs instead of a multi-framework
//! assessment/report/PIA surface.

pub mod consent;
pub mod evaluator;
pub mod rules;

pub use consent::{ConsentRecord, ConsentResult, ConsentScope, ConsentStore, FcraDisclosure, VerificationMethod};
pub use evaluator::{ComplianceEvaluator, Evaluation, RestrictionKind};
pub use rules::{default_rules, ComplianceRule};
