//! `IterationController`: decides whether a type's SAR loop continues,
//! evaluated in order, first match wins.

use crate::types::{CompletionReason, InformationType, SarIterationState};

pub struct IterationController {
    pub foundation_confidence_threshold: f64,
    pub standard_confidence_threshold: f64,
    pub foundation_max_iterations: u32,
    pub standard_max_iterations: u32,
    pub diminishing_returns_info_gain_rate: f64,
    pub diminishing_returns_confidence_delta: f64,
}

impl IterationController {
    pub fn new(
        foundation_confidence_threshold: f64,
        standard_confidence_threshold: f64,
        foundation_max_iterations: u32,
        standard_max_iterations: u32,
        diminishing_returns_info_gain_rate: f64,
        diminishing_returns_confidence_delta: f64,
    ) -> Self {
        Self {
            foundation_confidence_threshold,
            standard_confidence_threshold,
            foundation_max_iterations,
            standard_max_iterations,
            diminishing_returns_info_gain_rate,
            diminishing_returns_confidence_delta,
        }
    }

    fn effective_threshold(&self, info_type: InformationType) -> f64 {
        if info_type.is_foundation() {
            self.foundation_confidence_threshold
        } else {
            self.standard_confidence_threshold
        }
    }

    fn max_iterations(&self, info_type: InformationType) -> u32 {
        if info_type.is_foundation() {
            self.foundation_max_iterations
        } else {
            self.standard_max_iterations
        }
    }

    /// Decision in order: threshold met, max iterations reached, diminishing
    /// returns, else continue. Returns `None` to continue (next phase REFINE).
    pub fn should_continue(
        &self,
        info_type: InformationType,
        current: &SarIterationState,
        previous: Option<&SarIterationState>,
    ) -> Option<CompletionReason> {
        if current.confidence >= self.effective_threshold(info_type) {
            return Some(CompletionReason::ConfidenceThresholdMet);
        }

        if current.iteration_number >= self.max_iterations(info_type) {
            return Some(CompletionReason::MaxIterationsReached);
        }

        if current.iteration_number > 1 {
            let confidence_delta = previous.map(|p| current.confidence - p.confidence).unwrap_or(f64::MAX);
            if current.info_gain_rate < self.diminishing_returns_info_gain_rate
                || confidence_delta < self.diminishing_returns_confidence_delta
            {
                return Some(CompletionReason::DiminishingReturns);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> IterationController {
        IterationController::new(0.90, 0.85, 4, 3, 0.1, 0.05)
    }

    fn iteration(number: u32, confidence: f64, info_gain_rate: f64) -> SarIterationState {
        let mut state = SarIterationState::new(number);
        state.confidence = confidence;
        state.info_gain_rate = info_gain_rate;
        state
    }

    #[test]
    fn stops_when_foundation_threshold_met() {
        let controller = controller();
        let current = iteration(1, 0.95, 0.5);
        assert_eq!(
            controller.should_continue(InformationType::Identity, &current, None),
            Some(CompletionReason::ConfidenceThresholdMet)
        );
    }

    #[test]
    fn standard_type_uses_lower_threshold() {
        let controller = controller();
        let current = iteration(1, 0.87, 0.5);
        assert_eq!(
            controller.should_continue(InformationType::Criminal, &current, None),
            Some(CompletionReason::ConfidenceThresholdMet)
        );
    }

    #[test]
    fn stops_at_max_iterations_for_standard_types() {
        let controller = controller();
        let current = iteration(3, 0.5, 0.5);
        assert_eq!(
            controller.should_continue(InformationType::Criminal, &current, None),
            Some(CompletionReason::MaxIterationsReached)
        );
    }

    #[test]
    fn foundation_types_get_extra_iteration() {
        let controller = controller();
        let current = iteration(3, 0.5, 0.5);
        assert_eq!(controller.should_continue(InformationType::Identity, &current, None), None);
    }

    #[test]
    fn stops_on_diminishing_info_gain() {
        let controller = controller();
        let previous = iteration(1, 0.5, 0.5);
        let current = iteration(2, 0.55, 0.05);
        assert_eq!(
            controller.should_continue(InformationType::Criminal, &current, Some(&previous)),
            Some(CompletionReason::DiminishingReturns)
        );
    }

    #[test]
    fn stops_on_diminishing_confidence_delta() {
        let controller = controller();
        let previous = iteration(1, 0.50, 0.5);
        let current = iteration(2, 0.52, 0.5);
        assert_eq!(
            controller.should_continue(InformationType::Criminal, &current, Some(&previous)),
            Some(CompletionReason::DiminishingReturns)
        );
    }

    #[test]
    fn continues_when_no_stop_condition_met() {
        let controller = controller();
        let previous = iteration(1, 0.30, 0.5);
        let current = iteration(2, 0.50, 0.5);
        assert_eq!(controller.should_continue(InformationType::Criminal, &current, Some(&previous)), None);
    }

    #[test]
    fn first_iteration_never_triggers_diminishing_returns() {
        let controller = controller();
        let current = iteration(1, 0.3, 0.01);
        assert_eq!(controller.should_continue(InformationType::Criminal, &current, None), None);
    }
}
