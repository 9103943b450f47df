//! The Search-Assess-Refine (SAR) loop: the iterative investigation engine
//! that turns a scheduled information type into queries, assesses what comes
//! back, decides whether to continue, and hands off the next type.

pub mod assessor;
pub mod confidence;
pub mod info_type_manager;
pub mod iteration_controller;
pub mod planner;
pub mod refiner;
pub mod state_machine;
pub mod types;

pub use assessor::ResultAssessor;
pub use confidence::{ConfidenceFactors, ConfidenceScorer};
pub use info_type_manager::{InformationTypeManager, TypeSequence, ALL_TYPES};
pub use iteration_controller::IterationController;
pub use planner::{QueryPlanner, SubjectProfile};
pub use refiner::QueryRefiner;
pub use state_machine::SarStateMachine;
pub use types::{
    default_deception_score, AssessmentResult, CompletionReason, DiscoveredEntity, DiscoveredEntityType, Employer, Fact, Gap,
    InconsistencySeverity, InconsistencyType, Inconsistency, InformationType, KnowledgeBase, Phase, QueryResult, QueryType,
    SarIterationState, SarPhase, SarTypeState, School, SearchQuery,
};
