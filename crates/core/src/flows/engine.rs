use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome};
use crate::flows::states::{SessionStep, StepAction, StepContext, StepEvent, TransitionOutcome};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StepTransitionError {
    #[error("a base component must be selected before leaving {step:?}")]
    MissingBaseComponent { step: SessionStep },
    #[error("invalid transition from {step:?} using event {event:?}")]
    InvalidTransition { step: SessionStep, event: StepEvent },
}

/// Linear selection workflow: base, parts, preview, review.
///
/// Forward moves are guarded, backward moves always succeed and never clear state.
#[derive(Clone, Debug, Default)]
pub struct StepEngine;

impl StepEngine {
    pub fn initial_step(&self) -> SessionStep {
        SessionStep::SelectingBase
    }

    pub fn apply(
        &self,
        current: SessionStep,
        event: StepEvent,
        context: &StepContext,
    ) -> Result<TransitionOutcome, StepTransitionError> {
        transition(current, event, context)
    }

    /// Audit record for a finished step move. Callers emit it only after the move's
    /// actions ran, so a failed action is recorded as a rejection.
    pub fn audit_event<E>(
        &self,
        audit: &AuditContext,
        current: SessionStep,
        event: StepEvent,
        result: &Result<TransitionOutcome, E>,
    ) -> AuditEvent
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(outcome) => audit
                .event("session.step_applied", AuditCategory::Session, AuditOutcome::Success)
                .with_metadata("from", outcome.from.as_key())
                .with_metadata("to", outcome.to.as_key())
                .with_metadata("event", format!("{event:?}")),
            Err(error) => audit
                .event("session.step_rejected", AuditCategory::Session, AuditOutcome::Rejected)
                .with_metadata("from", current.as_key())
                .with_metadata("event", format!("{event:?}"))
                .with_metadata("error", error.to_string()),
        }
    }
}

fn transition(
    current: SessionStep,
    event: StepEvent,
    context: &StepContext,
) -> Result<TransitionOutcome, StepTransitionError> {
    use SessionStep::{Previewing, Reviewing, SelectingBase, SelectingParts};
    use StepEvent::{Back, Next};

    let (to, actions) = match (current, event) {
        (SelectingBase, Next) => {
            if !context.has_base_component {
                return Err(StepTransitionError::MissingBaseComponent { step: current });
            }
            (SelectingParts, Vec::new())
        }
        (SelectingParts, Next) => (Previewing, Vec::new()),
        (Previewing, Next) => (Reviewing, vec![StepAction::ComputeBillOfMaterials]),
        (Reviewing, Next) => {
            return Err(StepTransitionError::InvalidTransition { step: current, event });
        }
        (SelectingBase, Back) => (SelectingBase, Vec::new()),
        (SelectingParts, Back) => (SelectingBase, Vec::new()),
        (Previewing, Back) => (SelectingParts, Vec::new()),
        (Reviewing, Back) => (Previewing, Vec::new()),
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}
