use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Lifecycle phases a battle can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    /// Riders can still join; the organizer has not started the battle yet.
    Registration,
    /// Turns rotate among active participants until one remains.
    Active,
    /// A winner has been recorded; the battle is frozen.
    Completed,
    /// The organizer called the battle off before completion.
    Cancelled,
}

impl BattlePhase {
    /// Whether the phase admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, BattlePhase::Completed | BattlePhase::Cancelled)
    }
}

/// Why a battle reached the completed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// Every other participant collected the full elimination word.
    SoleSurvivor,
    /// A judge or the organizer declared the winner outright.
    Declared,
}

/// Events that can be applied to a battle's lifecycle machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleEvent {
    /// The organizer starts the battle with enough registered riders.
    Start,
    /// The battle ends with a winner.
    Complete(CompletionReason),
    /// The organizer cancels the battle.
    Cancel,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the machine was in when the invalid event was received.
    pub from: BattlePhase,
    /// The event that cannot be applied from this phase.
    pub event: BattleEvent,
}

/// Errors that can occur when planning a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when the plan was created.
        expected: BattlePhase,
        /// Current phase.
        actual: BattlePhase,
    },
    /// Version changed since the plan was created.
    VersionMismatch {
        /// Version the plan would move to.
        expected: usize,
        /// Version the machine would actually move to.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned lifecycle transition.
pub type PlanId = Uuid;

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the machine is currently in.
    pub from: BattlePhase,
    /// Phase the machine will transition to.
    pub to: BattlePhase,
    /// Event that triggered this transition.
    pub event: BattleEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of a battle lifecycle machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: BattlePhase,
    /// Version number (increments on each applied transition).
    pub version: usize,
    /// Phase a pending plan would move to, if any.
    pub pending: Option<BattlePhase>,
}

/// Per-battle lifecycle machine with a two-step commit protocol.
///
/// Mutations are first validated into a [`Plan`], side effects run, then the
/// plan is applied (or aborted on failure). The version counter makes the
/// apply a conditional update: a plan computed against a stale phase or
/// version is refused rather than silently clobbering concurrent progress.
#[derive(Debug, Clone)]
pub struct BattleStateMachine {
    phase: BattlePhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for BattleStateMachine {
    fn default() -> Self {
        Self {
            phase: BattlePhase::Registration,
            version: 0,
            pending: None,
        }
    }
}

impl BattleStateMachine {
    /// Create a machine in the registration phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// Create a snapshot of the machine.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from the
    /// current phase. Returns a [`Plan`] that can later be applied or aborted.
    pub fn plan(&mut self, event: BattleEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the machine to the next phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<BattlePhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: BattleEvent) -> Result<BattlePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (BattlePhase::Registration, BattleEvent::Start) => BattlePhase::Active,
            (BattlePhase::Active, BattleEvent::Complete(..)) => BattlePhase::Completed,
            (BattlePhase::Registration | BattlePhase::Active, BattleEvent::Cancel) => {
                BattlePhase::Cancelled
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut BattleStateMachine, event: BattleEvent) -> BattlePhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_state_is_registration() {
        let sm = BattleStateMachine::new();
        assert_eq!(sm.phase(), BattlePhase::Registration);
    }

    #[test]
    fn elimination_run_to_completion() {
        let mut sm = BattleStateMachine::new();

        assert_eq!(apply(&mut sm, BattleEvent::Start), BattlePhase::Active);
        assert_eq!(
            apply(
                &mut sm,
                BattleEvent::Complete(CompletionReason::SoleSurvivor)
            ),
            BattlePhase::Completed
        );
    }

    #[test]
    fn cancel_is_allowed_before_completion() {
        let mut sm = BattleStateMachine::new();
        assert_eq!(apply(&mut sm, BattleEvent::Cancel), BattlePhase::Cancelled);

        let mut sm = BattleStateMachine::new();
        apply(&mut sm, BattleEvent::Start);
        assert_eq!(apply(&mut sm, BattleEvent::Cancel), BattlePhase::Cancelled);
    }

    #[test]
    fn terminal_phases_refuse_events() {
        let mut sm = BattleStateMachine::new();
        apply(&mut sm, BattleEvent::Start);
        apply(&mut sm, BattleEvent::Complete(CompletionReason::Declared));

        for event in [
            BattleEvent::Start,
            BattleEvent::Cancel,
            BattleEvent::Complete(CompletionReason::Declared),
        ] {
            let err = sm.plan(event).unwrap_err();
            match err {
                PlanError::InvalidTransition(invalid) => {
                    assert_eq!(invalid.from, BattlePhase::Completed);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn complete_requires_active() {
        let mut sm = BattleStateMachine::new();
        let err = sm
            .plan(BattleEvent::Complete(CompletionReason::SoleSurvivor))
            .unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, BattlePhase::Registration);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn planning_twice_without_apply_is_refused() {
        let mut sm = BattleStateMachine::new();
        let _plan = sm.plan(BattleEvent::Start).unwrap();
        assert_eq!(
            sm.plan(BattleEvent::Cancel).unwrap_err(),
            PlanError::AlreadyPending
        );
    }

    #[test]
    fn apply_with_wrong_plan_id_keeps_pending() {
        let mut sm = BattleStateMachine::new();
        let plan = sm.plan(BattleEvent::Start).unwrap();

        let err = sm.apply(Uuid::new_v4()).unwrap_err();
        match err {
            ApplyError::IdMismatch { expected, .. } => assert_eq!(expected, plan.id),
            other => panic!("unexpected error: {other:?}"),
        }

        // The original plan is still pending and can be applied.
        assert_eq!(sm.apply(plan.id).unwrap(), BattlePhase::Active);
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = BattleStateMachine::new();
        let plan = sm.plan(BattleEvent::Start).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
        assert_eq!(sm.phase(), BattlePhase::Registration);
    }
}
