//! `InformationTypeManager` + `PhaseSequencer`: dependency-ordered type
//! scheduling across phases.

use crate::types::{InformationType, Phase};
use investigation_compliance::ComplianceEvaluator;
use investigation_core::Tier;

/// Type-to-phase and dependency table.
fn phase_of(info_type: InformationType) -> Phase {
    match info_type {
        InformationType::Identity | InformationType::Employment | InformationType::Education => Phase::Foundation,
        InformationType::Criminal
        | InformationType::Civil
        | InformationType::Financial
        | InformationType::Licenses
        | InformationType::Sanctions
        | InformationType::Regulatory => Phase::Records,
        InformationType::AdverseMedia | InformationType::DigitalFootprint => Phase::Intelligence,
        InformationType::NetworkD2 | InformationType::NetworkD3 => Phase::Network,
        InformationType::Reconciliation => Phase::Reconciliation,
    }
}

fn dependencies_of(info_type: InformationType) -> &'static [InformationType] {
    use InformationType::*;
    match info_type {
        Identity => &[],
        Employment => &[Identity],
        Education => &[Identity],
        Criminal | Civil | Financial | Licenses | Sanctions => &[Identity],
        Regulatory => &[Identity, Employment],
        AdverseMedia => &[Identity, Employment],
        DigitalFootprint => &[Identity],
        NetworkD2 => &[Identity, Employment],
        NetworkD3 => &[NetworkD2],
        Reconciliation => &[Identity, Employment, Education, Criminal],
    }
}

/// Primary check-type the compliance evaluator is consulted against for
/// each information type, used to decide whether it may run at all.
fn primary_check_type_of(info_type: InformationType) -> &'static str {
    match info_type {
        InformationType::Identity => "IDENTITY_VERIFICATION",
        InformationType::Employment => "EMPLOYMENT_VERIFICATION",
        InformationType::Education => "EDUCATION_VERIFICATION",
        InformationType::Criminal => "CRIMINAL_NATIONAL",
        InformationType::Civil => "CIVIL_RECORDS",
        InformationType::Financial => "CREDIT_REPORT",
        InformationType::Licenses => "LICENSE_VERIFICATION",
        InformationType::Sanctions => "SANCTIONS_OFAC",
        InformationType::Regulatory => "REGULATORY_RECORDS",
        InformationType::AdverseMedia => "ADVERSE_MEDIA_SEARCH",
        InformationType::DigitalFootprint => "DIGITAL_FOOTPRINT",
        InformationType::NetworkD2 => "NETWORK_D2",
        InformationType::NetworkD3 => "NETWORK_D3",
        InformationType::Reconciliation => "RECONCILIATION",
    }
}

pub const ALL_TYPES: [InformationType; 14] = [
    InformationType::Identity,
    InformationType::Employment,
    InformationType::Education,
    InformationType::Criminal,
    InformationType::Civil,
    InformationType::Financial,
    InformationType::Licenses,
    InformationType::Sanctions,
    InformationType::Regulatory,
    InformationType::AdverseMedia,
    InformationType::DigitalFootprint,
    InformationType::NetworkD2,
    InformationType::NetworkD3,
    InformationType::Reconciliation,
];

pub struct TypeSequence {
    pub eligible: Vec<InformationType>,
    pub blocked_types: Vec<(InformationType, String)>,
}

pub struct InformationTypeManager<'a> {
    evaluator: &'a ComplianceEvaluator,
}

impl<'a> InformationTypeManager<'a> {
    pub fn new(evaluator: &'a ComplianceEvaluator) -> Self {
        Self { evaluator }
    }

    /// `get_next_types(completed, tier, locale, role) → TypeSequence`.
    pub fn get_next_types(
        &self,
        completed: &[InformationType],
        tier: Tier,
        locale: &str,
        role: Option<&str>,
    ) -> TypeSequence {
        let mut eligible = Vec::new();
        let mut blocked_types = Vec::new();

        for &info_type in ALL_TYPES.iter() {
            if completed.contains(&info_type) {
                continue;
            }

            let dependencies_met = dependencies_of(info_type).iter().all(|d| completed.contains(d));
            if !dependencies_met {
                continue;
            }

            if tier == Tier::Standard && info_type.is_enhanced_only() {
                blocked_types.push((info_type, "tier".to_string()));
                continue;
            }

            let evaluation = self.evaluator.evaluate(locale, primary_check_type_of(info_type), role, tier);
            if !evaluation.permitted {
                blocked_types.push((info_type, evaluation.block_reason.unwrap_or_else(|| "blocked".to_string())));
                continue;
            }

            eligible.push(info_type);
        }

        TypeSequence { eligible, blocked_types }
    }

    /// Returns the phase for a given type, and whether all types of a phase
    /// (among `scheduled`) have terminated — used by the phase sequencer to
    /// decide when to advance to the next phase in `Phase::ORDER`.
    pub fn phase_of(info_type: InformationType) -> Phase {
        phase_of(info_type)
    }

    pub fn types_in_phase(phase: Phase) -> Vec<InformationType> {
        ALL_TYPES.iter().copied().filter(|t| phase_of(*t) == phase).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use investigation_compliance::ComplianceEvaluator;

    #[test]
    fn identity_is_eligible_with_no_dependencies() {
        let evaluator = ComplianceEvaluator::new();
        let manager = InformationTypeManager::new(&evaluator);
        let sequence = manager.get_next_types(&[], Tier::Standard, "US", None);
        assert!(sequence.eligible.contains(&InformationType::Identity));
        assert!(!sequence.eligible.contains(&InformationType::Employment));
    }

    #[test]
    fn employment_becomes_eligible_once_identity_completes() {
        let evaluator = ComplianceEvaluator::new();
        let manager = InformationTypeManager::new(&evaluator);
        let sequence = manager.get_next_types(&[InformationType::Identity], Tier::Standard, "US", None);
        assert!(sequence.eligible.contains(&InformationType::Employment));
    }

    #[test]
    fn enhanced_only_types_blocked_at_standard_tier() {
        let evaluator = ComplianceEvaluator::new();
        let manager = InformationTypeManager::new(&evaluator);
        let sequence = manager.get_next_types(&[InformationType::Identity], Tier::Standard, "US", None);
        assert!(sequence.blocked_types.iter().any(|(t, reason)| *t == InformationType::DigitalFootprint && reason == "tier"));
    }

    #[test]
    fn network_d3_depends_on_network_d2() {
        let evaluator = ComplianceEvaluator::new();
        let manager = InformationTypeManager::new(&evaluator);
        let completed = vec![InformationType::Identity, InformationType::Employment];
        let sequence = manager.get_next_types(&completed, Tier::Enhanced, "US", None);
        assert!(sequence.eligible.contains(&InformationType::NetworkD2));
        assert!(!sequence.eligible.contains(&InformationType::NetworkD3));
    }

    #[test]
    fn reconciliation_requires_four_dependencies() {
        let completed = vec![InformationType::Identity, InformationType::Employment, InformationType::Education];
        let evaluator = ComplianceEvaluator::new();
        let manager = InformationTypeManager::new(&evaluator);
        let sequence = manager.get_next_types(&completed, Tier::Standard, "US", None);
        assert!(!sequence.eligible.contains(&InformationType::Reconciliation));
    }
}
