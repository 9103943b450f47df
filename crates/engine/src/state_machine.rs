//! `SARStateMachine`: owns one `SarTypeState` per information type ever
//! scheduled in a screening. A screening exclusively owns its state machine.

use crate::iteration_controller::IterationController;
use crate::types::{CompletionReason, InformationType, SarIterationState, SarPhase, SarTypeState};
use investigation_core::{Error, Result};
use std::collections::HashMap;

pub struct SarStateMachine {
    types: HashMap<InformationType, SarTypeState>,
    controller: IterationController,
}

impl SarStateMachine {
    pub fn new(controller: IterationController) -> Self {
        Self {
            types: HashMap::new(),
            controller,
        }
    }

    pub fn state(&self, info_type: InformationType) -> Option<&SarTypeState> {
        self.types.get(&info_type)
    }

    pub fn completed_types(&self) -> Vec<InformationType> {
        self.types
            .values()
            .filter(|s| {
                matches!(
                    s.phase,
                    SarPhase::Complete | SarPhase::Capped | SarPhase::Diminished | SarPhase::Skipped
                )
            })
            .map(|s| s.info_type)
            .collect()
    }

    /// `initialize(type)`: create `SarTypeState` in IDLE. Errors if already initialized.
    pub fn initialize(&mut self, info_type: InformationType) -> Result<()> {
        if self.types.contains_key(&info_type) {
            return Err(Error::validation(format!("{} already initialized", info_type)));
        }
        self.types.insert(info_type, SarTypeState::new(info_type));
        Ok(())
    }

    /// `start_iteration(type)`: transition to SEARCH, append a new iteration state.
    pub fn start_iteration(&mut self, info_type: InformationType) -> Result<&SarIterationState> {
        let state = self
            .types
            .get_mut(&info_type)
            .ok_or_else(|| Error::validation(format!("{} not initialized", info_type)))?;

        state.phase = SarPhase::Search;
        let iteration_number = state.iterations.len() as u32 + 1;
        state.iterations.push(SarIterationState::new(iteration_number));
        Ok(state.iterations.last().unwrap())
    }

    /// `complete_iteration(type, metrics)`: compute info-gain rate, transition
    /// to ASSESS, ask `IterationController`. Returns `true` if the loop
    /// should continue (→ REFINE), `false` if it has terminated.
    pub fn complete_iteration(
        &mut self,
        info_type: InformationType,
        new_facts: usize,
        facts_extracted: usize,
        queries_executed: usize,
        confidence: f64,
    ) -> Result<bool> {
        let state = self
            .types
            .get_mut(&info_type)
            .ok_or_else(|| Error::validation(format!("{} not initialized", info_type)))?;

        let iteration_index = state.iterations.len() - 1;
        {
            let iteration = &mut state.iterations[iteration_index];
            iteration.new_facts = new_facts;
            iteration.facts_extracted = facts_extracted;
            iteration.queries_executed = queries_executed;
            iteration.confidence = confidence;
            iteration.info_gain_rate = new_facts as f64 / queries_executed.max(1) as f64;
            iteration.completed_at = Some(chrono::Utc::now());
        }
        state.phase = SarPhase::Assess;
        state.total_facts += facts_extracted;
        state.total_queries += queries_executed;

        let previous = if iteration_index > 0 {
            Some(state.iterations[iteration_index - 1].clone())
        } else {
            None
        };
        let current = state.iterations[iteration_index].clone();

        let decision = self.controller.should_continue(info_type, &current, previous.as_ref());

        match decision {
            None => {
                state.phase = SarPhase::Refine;
                Ok(true)
            }
            Some(reason) => {
                state.phase = match reason {
                    CompletionReason::ConfidenceThresholdMet => SarPhase::Complete,
                    CompletionReason::MaxIterationsReached => SarPhase::Capped,
                    CompletionReason::DiminishingReturns => SarPhase::Diminished,
                    CompletionReason::Skipped => SarPhase::Skipped,
                };
                state.completion_reason = Some(reason);
                state.final_confidence = confidence;
                Ok(false)
            }
        }
    }

    /// `skip(type, reason)`: terminal SKIPPED with confidence 0.
    pub fn skip(&mut self, info_type: InformationType, _reason: &str) {
        let state = self.types.entry(info_type).or_insert_with(|| SarTypeState::new(info_type));
        state.phase = SarPhase::Skipped;
        state.completion_reason = Some(CompletionReason::Skipped);
        state.final_confidence = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> SarStateMachine {
        SarStateMachine::new(IterationController::new(0.90, 0.85, 4, 3, 0.1, 0.05))
    }

    #[test]
    fn initialize_twice_errors() {
        let mut machine = machine();
        machine.initialize(InformationType::Criminal).unwrap();
        assert!(machine.initialize(InformationType::Criminal).is_err());
    }

    #[test]
    fn single_high_confidence_iteration_completes() {
        let mut machine = machine();
        machine.initialize(InformationType::Criminal).unwrap();
        machine.start_iteration(InformationType::Criminal).unwrap();
        let should_continue = machine.complete_iteration(InformationType::Criminal, 1, 1, 1, 0.95).unwrap();
        assert!(!should_continue);
        assert_eq!(machine.state(InformationType::Criminal).unwrap().phase, SarPhase::Complete);
    }

    #[test]
    fn low_confidence_iteration_continues_to_refine() {
        let mut machine = machine();
        machine.initialize(InformationType::Criminal).unwrap();
        machine.start_iteration(InformationType::Criminal).unwrap();
        let should_continue = machine.complete_iteration(InformationType::Criminal, 2, 2, 2, 0.3).unwrap();
        assert!(should_continue);
        assert_eq!(machine.state(InformationType::Criminal).unwrap().phase, SarPhase::Refine);
    }

    #[test]
    fn skip_marks_terminal_with_zero_confidence() {
        let mut machine = machine();
        machine.skip(InformationType::NetworkD3, "tier gated");
        let state = machine.state(InformationType::NetworkD3).unwrap();
        assert_eq!(state.phase, SarPhase::Skipped);
        assert_eq!(state.final_confidence, 0.0);
    }
}
