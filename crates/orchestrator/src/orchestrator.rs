//! `ScreeningOrchestrator`: drives one screening end-to-end — tenant/consent
//! gating, then phases in dependency order, each phase fanning out
//! concurrently across its eligible information types and waiting on all of
//! them (the phase barrier) before advancing, finishing with risk scoring.

use crate::repository::ScreeningRepository;
use crate::types::{OrchestratorConfig, ScreeningOutcome, ScreeningRequest, TypeOutcome};
use chrono::{DateTime, Utc};
use investigation_compliance::{ComplianceEvaluator, ConsentStore};
use investigation_core::{AuditEventKind, Error, Result, ScreeningId, Tier};
use investigation_engine::{
    InformationType, InformationTypeManager, IterationController, KnowledgeBase, Phase, QueryPlanner, QueryRefiner, QueryType,
    ResultAssessor, SarStateMachine, SubjectProfile,
};
use investigation_risk::{ClassifiableFact, FindingClassifier, RiskScorer};
use investigation_routing::{canonicalize_subject, PriorityDispatcher, RoutedRequest};
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as TokioMutex;
use tokio_util::sync::CancellationToken;

/// Mirrors `InformationTypeManager`'s private table — the consent scope a
/// type's primary check needs is a small, independently-stable fact about
/// the domain, not worth exposing a cross-crate dependency for.
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

pub struct ScreeningOrchestrator {
    dispatcher: Arc<PriorityDispatcher>,
    evaluator: Arc<ComplianceEvaluator>,
    consent_store: Arc<ConsentStore>,
    repository: Arc<dyn ScreeningRepository>,
    config: OrchestratorConfig,
}

impl ScreeningOrchestrator {
    pub fn new(
        dispatcher: Arc<PriorityDispatcher>,
        evaluator: Arc<ComplianceEvaluator>,
        consent_store: Arc<ConsentStore>,
        repository: Arc<dyn ScreeningRepository>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            dispatcher,
            evaluator,
            consent_store,
            repository,
            config,
        }
    }

    /// Fail-fast feasibility check for the REST layer to call before
    /// enqueuing: are there any phase-1 (dependency-free) information types
    /// this request could even start with? If every one of them is blocked
    /// by compliance policy, or lacks consent, the whole screening is
    /// rejected synchronously rather than run to a foregone conclusion.
    ///
    /// This only evaluates phase 1 — a screening that clears phase 1 but
    /// then has every later-phase type blocked still runs to completion and
    /// reports those blocks in `ScreeningOutcome::blocked_types`, per the
    /// non-fatal error surfacing policy.
    pub fn precheck(&self, tenant_id: investigation_core::TenantId, subject_id: investigation_core::SubjectId, tier: Tier, locale: &str, role: Option<&str>) -> Result<()> {
        let manager = InformationTypeManager::new(&self.evaluator);
        let sequence = manager.get_next_types(&[], tier, locale, role);
        let phase1_blocked: Vec<(InformationType, String)> = sequence
            .blocked_types
            .into_iter()
            .filter(|(t, _)| InformationTypeManager::phase_of(*t) == Phase::ORDER[0])
            .collect();
        let phase1_eligible: Vec<InformationType> =
            sequence.eligible.into_iter().filter(|t| InformationTypeManager::phase_of(*t) == Phase::ORDER[0]).collect();

        if phase1_eligible.is_empty() && phase1_blocked.is_empty() {
            // No phase-1 type applies at all (shouldn't happen for a real
            // tier/locale/role combination); nothing to reject up front.
            return Ok(());
        }

        if phase1_eligible.is_empty() {
            let reasons: Vec<String> = phase1_blocked.iter().map(|(t, reason)| format!("{}: {}", t.as_str(), reason)).collect();
            return Err(Error::compliance_block(reasons.join("; ")).with_context(
                investigation_core::ErrorContext::new().with_tenant_id(tenant_id.0.to_string()),
            ));
        }

        let any_consented = phase1_eligible.iter().any(|&info_type| {
            let scope = ConsentStore::scope_for_check_type(primary_check_type_of(info_type));
            self.consent_store.verify(subject_id, std::slice::from_ref(&scope)).valid
        });

        if any_consented {
            return Ok(());
        }

        Err(Error::consent_missing("required consent scope not granted for any requested check").with_context(
            investigation_core::ErrorContext::new().with_tenant_id(tenant_id.0.to_string()),
        ))
    }

    /// Convenience entry point for callers that don't need to know the
    /// `ScreeningId` before the screening finishes, or to cancel it
    /// mid-flight — both are generated internally.
    pub async fn run_screening(&self, request: ScreeningRequest) -> Result<ScreeningOutcome> {
        self.run_screening_with_id(ScreeningId::new(), request, CancellationToken::new()).await
    }

    /// Runs a screening under a caller-supplied id and cancellation token.
    /// The REST layer generates both before spawning the background task so
    /// it can answer `GET`/`DELETE` against the id while the screening is
    /// still in flight.
    pub async fn run_screening_with_id(
        &self,
        screening_id: ScreeningId,
        request: ScreeningRequest,
        cancellation: CancellationToken,
    ) -> Result<ScreeningOutcome> {
        let tenant = self.repository.get_tenant(request.tenant_id).await?;
        if !tenant.active {
            return Err(Error::forbidden("tenant is not active"));
        }

        self.repository
            .append_audit(request.tenant_id, AuditEventKind::ScreeningInitiated, serde_json::json!({"screening_id": screening_id.0}))
            .await?;

        let deadline = Utc::now() + chrono::Duration::from_std(self.config.deadline_for(request.tier)).expect("deadline fits in chrono::Duration");

        let subject = SubjectProfile {
            full_name: request.subject.full_name.clone(),
            name_variants: Vec::new(),
            dob: request.subject.date_of_birth.clone(),
            ssn_last4: request.subject.ssn_last4.clone(),
            addresses: request.subject.addresses.clone(),
        };

        let controller = IterationController::new(
            self.config.foundation_confidence_threshold,
            self.config.standard_confidence_threshold,
            self.config.foundation_max_iterations,
            self.config.standard_max_iterations,
            self.config.diminishing_returns_info_gain_rate,
            self.config.diminishing_returns_confidence_delta,
        );

        let kb = Arc::new(TokioMutex::new(KnowledgeBase::default()));
        let state_machine = Arc::new(StdMutex::new(SarStateMachine::new(controller)));
        let issued_signatures = Arc::new(StdMutex::new(HashSet::new()));

        let mut completed: Vec<InformationType> = Vec::new();
        let mut blocked_types: Vec<(InformationType, String)> = Vec::new();
        let mut type_outcomes: Vec<TypeOutcome> = Vec::new();
        let mut cancelled = false;

        for &phase in Phase::ORDER.iter() {
            if Utc::now() >= deadline {
                cancellation.cancel();
                cancelled = true;
                break;
            }

            let manager = InformationTypeManager::new(&self.evaluator);
            let sequence = manager.get_next_types(&completed, request.tier, &request.locale, request.role.as_deref());
            blocked_types.extend(sequence.blocked_types.iter().filter(|(t, _)| InformationTypeManager::phase_of(*t) == phase).cloned());

            let mut eligible: Vec<InformationType> = sequence
                .eligible
                .into_iter()
                .filter(|t| InformationTypeManager::phase_of(*t) == phase)
                .collect();

            // Consent gate: drop types whose primary check lacks valid consent.
            eligible.retain(|&info_type| {
                let scope = ConsentStore::scope_for_check_type(primary_check_type_of(info_type));
                let result = self.consent_store.verify(request.subject_id, std::slice::from_ref(&scope));
                if !result.valid {
                    blocked_types.push((info_type, "consent_missing".to_string()));
                }
                result.valid
            });

            if eligible.is_empty() {
                continue;
            }

            let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent_types_per_phase));
            let mut handles = Vec::new();
            for info_type in eligible {
                let semaphore = semaphore.clone();
                let dispatcher = self.dispatcher.clone();
                let kb = kb.clone();
                let state_machine = state_machine.clone();
                let issued_signatures = issued_signatures.clone();
                let cancellation = cancellation.clone();
                let subject = subject.clone();
                let locale = request.locale.clone();
                let tier = request.tier;
                let tenant_id = request.tenant_id;
                let subject_id_str = request.subject_id.0.to_string();
                let phase_str = phase.as_str();

                handles.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                    run_type_sar_loop(
                        dispatcher,
                        kb,
                        state_machine,
                        issued_signatures,
                        info_type,
                        subject,
                        locale,
                        tier,
                        screening_id,
                        tenant_id,
                        subject_id_str,
                        deadline,
                        phase_str,
                        cancellation,
                    )
                    .await
                }));
            }

            for handle in handles {
                match handle.await {
                    Ok(outcome) => {
                        completed.push(outcome.info_type);
                        type_outcomes.push(outcome);
                    }
                    Err(join_err) => {
                        tracing::error!(error = %join_err, "SAR loop task panicked");
                    }
                }
            }
        }

        if Utc::now() >= deadline {
            cancelled = true;
        }

        let role = request.role.as_deref();
        let all_facts: Vec<&investigation_engine::Fact> = type_outcomes.iter().flat_map(|o| o.facts.iter()).collect();
        let findings = build_findings(&all_facts, role);
        let risk_score = RiskScorer::score(&findings);

        let partial_failures: Vec<(InformationType, String)> = type_outcomes
            .iter()
            .filter_map(|outcome| {
                outcome
                    .skip_reason
                    .as_deref()
                    .filter(|reason| *reason == "screening_deadline_exceeded")
                    .map(|reason| (outcome.info_type, reason.to_string()))
            })
            .collect();

        let outcome = ScreeningOutcome {
            screening_id,
            type_outcomes,
            blocked_types,
            partial_failures,
            risk_score,
            cancelled,
        };

        let event_kind = if cancelled {
            AuditEventKind::ScreeningCancelled
        } else {
            AuditEventKind::ScreeningCompleted
        };
        self.repository
            .append_audit(request.tenant_id, event_kind, serde_json::json!({"screening_id": screening_id.0}))
            .await?;
        self.repository.save_screening(screening_id, &outcome).await?;

        Ok(outcome)
    }
}

/// Maps every fact surfaced across the screening into the risk crate's
/// decoupled `ClassifiableFact` shape and classifies them. Corroboration is
/// determined here (not in the engine) since it requires seeing facts from
/// every information type together.
fn build_findings(facts: &[&investigation_engine::Fact], role: Option<&str>) -> Vec<investigation_risk::Finding> {
    let mut source_counts: std::collections::HashMap<&str, std::collections::HashSet<&str>> = std::collections::HashMap::new();
    for fact in facts {
        source_counts.entry(fact.fact_type.as_str()).or_default().insert(fact.source_provider.as_str());
    }

    let classifiable: Vec<ClassifiableFact> = facts
        .iter()
        .map(|fact| ClassifiableFact {
            fact_type: fact.fact_type.clone(),
            value: fact.value.clone(),
            confidence: fact.confidence,
            corroborated: source_counts.get(fact.fact_type.as_str()).map(|s| s.len() >= 2).unwrap_or(false),
            occurred_at: Some(fact.discovered_at),
            severity_hint: None,
        })
        .collect();

    FindingClassifier::classify_facts(&classifiable, role)
}

#[allow(clippy::too_many_arguments)]
async fn run_type_sar_loop(
    dispatcher: Arc<PriorityDispatcher>,
    kb: Arc<TokioMutex<KnowledgeBase>>,
    state_machine: Arc<StdMutex<SarStateMachine>>,
    issued_signatures: Arc<StdMutex<HashSet<String>>>,
    info_type: InformationType,
    subject: SubjectProfile,
    locale: String,
    tier: Tier,
    screening_id: ScreeningId,
    tenant_id: investigation_core::TenantId,
    entity_id: String,
    deadline: DateTime<Utc>,
    phase_str: &'static str,
    cancellation: CancellationToken,
) -> TypeOutcome {
    {
        let mut guard = state_machine.lock().unwrap();
        let _ = guard.initialize(info_type);
    }

    let available_providers = ["routed"];
    let mut previous_gaps: Option<Vec<investigation_engine::Gap>> = None;
    let mut collected_facts: Vec<investigation_engine::Fact> = Vec::new();
    let mut skip_reason: Option<String> = None;

    loop {
        if cancellation.is_cancelled() || Utc::now() >= deadline {
            let mut guard = state_machine.lock().unwrap();
            guard.skip(info_type, "screening_deadline_exceeded");
            skip_reason = Some("screening_deadline_exceeded".to_string());
            break;
        }

        let iteration_number = {
            let mut guard = state_machine.lock().unwrap();
            match guard.start_iteration(info_type) {
                Ok(iteration) => iteration.iteration_number,
                Err(_) => break,
            }
        };

        let queries = if let Some(gaps) = &previous_gaps {
            QueryRefiner::refine(gaps, &available_providers, iteration_number, &mut issued_signatures.lock().unwrap())
        } else {
            let kb_guard = kb.lock().await;
            QueryPlanner::plan(info_type, &subject, &kb_guard, &locale, tier, &available_providers, iteration_number, QueryType::Initial, 0)
        };

        if queries.is_empty() {
            let mut guard = state_machine.lock().unwrap();
            guard.skip(info_type, "no_queries_available");
            skip_reason = Some("no_queries_available".to_string());
            break;
        }

        let subject_fingerprint = canonicalize_subject(
            &subject.full_name,
            subject.dob.as_deref().unwrap_or(""),
            subject.ssn_last4.as_deref().unwrap_or(""),
        );

        for query in &queries {
            let request = RoutedRequest {
                check_type: query.check_type.clone(),
                subject_fingerprint_input: subject_fingerprint.clone(),
                locale: locale.clone(),
                entity_id: entity_id.clone(),
                tenant_id,
                tier,
                screening_id,
                attempt: 0,
                deadline,
            };
            dispatcher.submit(request, info_type.as_str(), phase_str, &[]);
        }

        let routed_results = dispatcher.dispatch_for_type(info_type.as_str()).await;
        let query_results: Vec<investigation_engine::QueryResult> = queries
            .into_iter()
            .zip(routed_results.into_iter())
            .map(|(query, routed)| investigation_engine::QueryResult {
                query,
                success: routed.success,
                payload: routed.provider_result.map(|p| p.payload),
            })
            .collect();

        let queries_executed = query_results.len();
        let assessment = {
            let mut kb_guard = kb.lock().await;
            ResultAssessor::assess(info_type, &query_results, &mut kb_guard, iteration_number)
        };
        previous_gaps = Some(assessment.gaps.clone());
        collected_facts.extend(assessment.facts.iter().cloned());

        let should_continue = {
            let mut guard = state_machine.lock().unwrap();
            guard.complete_iteration(info_type, assessment.new_facts_count, assessment.facts.len(), queries_executed, assessment.confidence_score)
        };

        match should_continue {
            Ok(true) => continue,
            Ok(false) => break,
            Err(_) => break,
        }
    }

    let state = state_machine.lock().unwrap().state(info_type).cloned();
    let state = state.expect("type was initialized at loop entry");
    TypeOutcome {
        info_type,
        facts: collected_facts,
        final_confidence: state.final_confidence,
        completion_reason: state.completion_reason,
        skip_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use investigation_compliance::{ConsentRecord, ConsentScope, VerificationMethod};
    use investigation_core::Error as CoreError;
    use investigation_engine::ALL_TYPES;
    use investigation_routing::{BackoffConfig, CacheStore, ProviderAdapter, ProviderExecution, ProviderOutcomeError, ProviderResultRecord};
    use std::sync::Mutex as StdMutex2;

    #[test]
    fn primary_check_type_of_covers_every_information_type() {
        for info_type in ALL_TYPES.iter() {
            let check_type = primary_check_type_of(*info_type);
            assert!(!check_type.is_empty());
        }
    }

    #[test]
    fn deadline_for_picks_tier_specific_duration() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.deadline_for(Tier::Standard), config.standard_tier_deadline);
        assert_eq!(config.deadline_for(Tier::Enhanced), config.enhanced_tier_deadline);
    }

    struct InMemoryRepository {
        tenant: Tenant,
        audit_events: StdMutex2<Vec<AuditEventKind>>,
    }

    #[async_trait]
    impl ScreeningRepository for InMemoryRepository {
        async fn get_tenant(&self, _tenant_id: investigation_core::TenantId) -> Result<Tenant> {
            if self.tenant.active {
                Ok(self.tenant.clone())
            } else {
                Err(CoreError::forbidden("tenant not active"))
            }
        }

        async fn save_screening(&self, _screening_id: ScreeningId, _outcome: &ScreeningOutcome) -> Result<()> {
            Ok(())
        }

        async fn load_screening(&self, _screening_id: ScreeningId) -> Result<Option<ScreeningOutcome>> {
            Ok(None)
        }

        async fn put_cache(&self, _key: &str, _value: serde_json::Value) -> Result<()> {
            Ok(())
        }

        async fn get_cache(&self, _key: &str) -> Result<Option<serde_json::Value>> {
            Ok(None)
        }

        async fn append_audit(&self, _tenant_id: investigation_core::TenantId, kind: AuditEventKind, _detail: serde_json::Value) -> Result<()> {
            self.audit_events.lock().unwrap().push(kind);
            Ok(())
        }

        async fn put_retention_record(
            &self,
            _tenant_id: investigation_core::TenantId,
            _data_type: investigation_core::RetentionDataType,
            _reference: &str,
        ) -> Result<()> {
            Ok(())
        }
    }

    /// Returns an empty payload for every check, regardless of type — drives
    /// every SAR loop straight to its max-iterations cap with no facts.
    struct EmptyPayloadProvider {
        checks: Vec<&'static str>,
    }

    #[async_trait]
    impl ProviderAdapter for EmptyPayloadProvider {
        fn provider_id(&self) -> &str {
            "stub-provider"
        }

        fn supported_checks(&self) -> &[&str] {
            &self.checks
        }

        async fn execute(&self, _request: &RoutedRequest) -> std::result::Result<ProviderExecution, ProviderOutcomeError> {
            Ok(ProviderExecution {
                result: ProviderResultRecord {
                    provider_id: "stub-provider".to_string(),
                    payload: serde_json::json!({}),
                    raw_payload_hash: "stub".to_string(),
                    latency_ms: 1,
                    cost_cents: 0,
                    cache_hit: false,
                    acquired_at: Utc::now(),
                },
                fresh_for_seconds: 0,
                stale_for_seconds: 0,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    /// Mirrors `QueryPlanner`'s check-type table so the stub provider can
    /// register for every check type a screening might issue.
    fn all_check_types() -> Vec<&'static str> {
        vec![
            "IDENTITY_VERIFICATION",
            "EMPLOYMENT_VERIFICATION",
            "EDUCATION_VERIFICATION",
            "CRIMINAL_NATIONAL",
            "CRIMINAL_COUNTY",
            "CRIMINAL_FEDERAL",
            "CIVIL_RECORDS",
            "CREDIT_REPORT",
            "LICENSE_VERIFICATION",
            "SANCTIONS_OFAC",
            "SANCTIONS_GLOBAL",
            "REGULATORY_RECORDS",
            "ADVERSE_MEDIA_SEARCH",
            "DIGITAL_FOOTPRINT",
            "NETWORK_D2",
            "NETWORK_D3",
        ]
    }

    fn build_orchestrator(tenant_active: bool) -> (ScreeningOrchestrator, Arc<InMemoryRepository>) {
        let cache = Arc::new(CacheStore::new());
        let router = Arc::new(investigation_routing::RequestRouter::new(cache, BackoffConfig::default(), 5, 30, 6000));
        let provider: Arc<dyn ProviderAdapter> = Arc::new(EmptyPayloadProvider { checks: all_check_types() });
        for &check_type in all_check_types().iter() {
            router.register_provider(check_type, provider.clone());
        }
        let dispatcher = Arc::new(PriorityDispatcher::new(router, 6000));

        let evaluator = Arc::new(ComplianceEvaluator::new());

        let consent_store = Arc::new(ConsentStore::new());
        let subject_id = investigation_core::SubjectId::new();
        consent_store.grant(ConsentRecord {
            subject_id,
            scopes: [
                ConsentScope::BackgroundCheck,
                ConsentScope::CreditCheck,
                ConsentScope::SocialMedia,
                ConsentScope::DigitalFootprint,
                ConsentScope::ContinuousMonitoring,
            ]
            .into_iter()
            .collect(),
            granted_at: Utc::now(),
            expires_at: None,
            verification_method: VerificationMethod::ESignature,
            locale: "US".to_string(),
            fcra_disclosure: None,
            revoked: false,
        });

        let repository = Arc::new(InMemoryRepository {
            tenant: Tenant {
                tenant_id: investigation_core::TenantId(uuid::Uuid::new_v4()),
                active: tenant_active,
                webhook_secret: None,
            },
            audit_events: StdMutex2::new(Vec::new()),
        });

        let orchestrator = ScreeningOrchestrator::new(
            dispatcher,
            evaluator,
            consent_store,
            repository.clone() as Arc<dyn ScreeningRepository>,
            OrchestratorConfig {
                max_concurrent_types_per_phase: 4,
                standard_tier_deadline: std::time::Duration::from_secs(60),
                enhanced_tier_deadline: std::time::Duration::from_secs(120),
                ..OrchestratorConfig::default()
            },
        );

        (orchestrator, repository)
    }

    fn request(subject_id: investigation_core::SubjectId, tenant_id: investigation_core::TenantId) -> ScreeningRequest {
        ScreeningRequest {
            tenant_id,
            subject_id,
            subject: crate::types::SubjectInput {
                full_name: "Jane Doe".to_string(),
                date_of_birth: Some("1990-01-01".to_string()),
                ssn_last4: Some("1234".to_string()),
                addresses: vec!["100 Main St".to_string()],
            },
            tier: Tier::Standard,
            role: None,
            locale: "US".to_string(),
        }
    }

    #[tokio::test]
    async fn inactive_tenant_is_rejected() {
        let (orchestrator, repository) = build_orchestrator(false);
        let result = orchestrator
            .run_screening(request(investigation_core::SubjectId::new(), repository.tenant.tenant_id))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn screening_runs_every_foundation_type_and_produces_a_risk_score() {
        let (orchestrator, repository) = build_orchestrator(true);
        let outcome = orchestrator
            .run_screening(request(investigation_core::SubjectId::new(), repository.tenant.tenant_id))
            .await
            .expect("screening should not error");

        let completed: Vec<InformationType> = outcome.type_outcomes.iter().map(|o| o.info_type).collect();
        assert!(completed.contains(&InformationType::Identity));
        assert!(completed.contains(&InformationType::Employment));
        assert!(completed.contains(&InformationType::Education));
        assert!(!outcome.cancelled);
        assert!(outcome.risk_score.overall >= 0);

        let events = repository.audit_events.lock().unwrap();
        assert!(events.contains(&AuditEventKind::ScreeningInitiated));
        assert!(events.contains(&AuditEventKind::ScreeningCompleted));
    }
}
