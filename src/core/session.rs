// src/core/session.rs

//! The multi-step command state machine.
//!
//! At most one command is active at a time. While one is, every submitted line
//! goes to its step handler instead of being resolved as a new command.

use crate::models::CommandDefinition;

/// What a step handler reports once a step has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Move to the next step.
    Advance {
        /// Mask the input of the next step.
        hide_input: bool,
    },
    /// Stay on the same step and re-prompt it.
    Freeze,
    /// The command is complete; no further step.
    Finish,
    /// The step failed.
    Fail {
        /// End the session instead of resuming at the fallback step.
        terminal: bool,
        /// Message shown to the user.
        reason: String,
    },
}

/// The active multi-step command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    /// Canonical name of the running command.
    pub command: String,
    /// Current step, starting at 0.
    pub step: usize,
    /// Step resumed after a recoverable failure.
    pub fallback_step: usize,
    /// Echo of the current step's input is masked.
    pub hide_input: bool,
    /// Clear the display when the session ends.
    pub clear_after_use: bool,
}

/// What the session looks like after applying an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Still active at the given step.
    Continue(usize),
    /// Returned to idle.
    Ended,
}

/// Owner of the single session record and the input lock.
#[derive(Debug, Default)]
pub struct SessionMachine {
    active: Option<ActiveSession>,
    input_locked: bool,
}

impl SessionMachine {
    /// Creates an idle machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active session, if any.
    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    /// Returns `true` while a multi-step command is running.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a session for `definition` at step 0. Replaces nothing: callers
    /// must only start a session while idle.
    pub fn start(&mut self, definition: &CommandDefinition) -> &ActiveSession {
        log::debug!("Session started for '{}'", definition.name);
        self.active.insert(ActiveSession {
            command: definition.name.clone(),
            step: 0,
            fallback_step: definition.fallback_step,
            hide_input: definition.hide_input,
            clear_after_use: definition.clear_after_use,
        })
    }

    /// Applies a step handler's outcome to the active session.
    ///
    /// Returns `None` if no session is active (for example because it was aborted
    /// while the step was in flight).
    pub fn apply(&mut self, outcome: &StepOutcome) -> Option<Transition> {
        let session = self.active.as_mut()?;
        let transition = match outcome {
            StepOutcome::Advance { hide_input } => {
                session.step += 1;
                session.hide_input = *hide_input;
                Transition::Continue(session.step)
            }
            StepOutcome::Freeze => Transition::Continue(session.step),
            StepOutcome::Fail { terminal: false, .. } => {
                session.step = session.fallback_step;
                Transition::Continue(session.step)
            }
            StepOutcome::Finish | StepOutcome::Fail { terminal: true, .. } => Transition::Ended,
        };
        log::debug!(
            "Session '{}' applied {:?} -> {:?}",
            session.command,
            outcome,
            transition
        );
        if transition == Transition::Ended {
            self.reset();
        }
        Some(transition)
    }

    /// Ends the active session. Returns the session that was aborted, if any.
    /// Calling this while idle is a no-op.
    pub fn abort(&mut self) -> Option<ActiveSession> {
        let aborted = self.active.take();
        if let Some(session) = &aborted {
            log::debug!("Session '{}' aborted at step {}", session.command, session.step);
        }
        self.input_locked = false;
        aborted
    }

    /// Returns to idle and releases the input lock.
    pub fn reset(&mut self) {
        self.active = None;
        self.input_locked = false;
    }

    /// Returns `true` while a step (or a top-level resolution) is in flight.
    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    /// Sets the re-entrancy guard.
    pub fn lock_input(&mut self) {
        self.input_locked = true;
    }

    /// Clears the re-entrancy guard.
    pub fn unlock_input(&mut self) {
        self.input_locked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wizard() -> CommandDefinition {
        CommandDefinition {
            name: "register".to_string(),
            multi_step: true,
            fallback_step: 1,
            ..Default::default()
        }
    }

    fn advance() -> StepOutcome {
        StepOutcome::Advance { hide_input: false }
    }

    #[test]
    fn test_start_sets_cursor_to_zero() {
        let mut machine = SessionMachine::new();
        let session = machine.start(&wizard());
        assert_eq!(session.step, 0);
        assert!(machine.is_active());
    }

    #[test]
    fn test_advance_increments_and_freeze_holds() {
        let mut machine = SessionMachine::new();
        machine.start(&wizard());
        assert_eq!(machine.apply(&advance()), Some(Transition::Continue(1)));
        assert_eq!(machine.apply(&advance()), Some(Transition::Continue(2)));
        assert_eq!(machine.apply(&StepOutcome::Freeze), Some(Transition::Continue(2)));
        assert_eq!(machine.active().map(|s| s.step), Some(2));
    }

    #[test]
    fn test_recoverable_failure_routes_to_fallback_step() {
        let mut machine = SessionMachine::new();
        machine.start(&wizard());
        machine.apply(&advance());
        machine.apply(&advance());
        machine.apply(&advance());
        let failure = StepOutcome::Fail {
            terminal: false,
            reason: "taken".to_string(),
        };
        assert_eq!(machine.apply(&failure), Some(Transition::Continue(1)));
        assert!(machine.is_active());
    }

    #[test]
    fn test_terminal_failure_and_finish_return_to_idle() {
        let mut machine = SessionMachine::new();
        machine.start(&wizard());
        machine.apply(&advance());
        let failure = StepOutcome::Fail {
            terminal: true,
            reason: "denied".to_string(),
        };
        assert_eq!(machine.apply(&failure), Some(Transition::Ended));
        assert!(!machine.is_active());

        machine.start(&wizard());
        assert_eq!(machine.apply(&StepOutcome::Finish), Some(Transition::Ended));
        assert!(machine.active().is_none());
    }

    #[test]
    fn test_abort_is_idempotent() {
        let mut machine = SessionMachine::new();
        assert!(machine.abort().is_none());

        machine.start(&wizard());
        machine.lock_input();
        let aborted = machine.abort().unwrap();
        assert_eq!(aborted.command, "register");
        assert!(!machine.is_input_locked());
        assert!(machine.abort().is_none());
    }

    #[test]
    fn test_apply_without_session_is_ignored() {
        let mut machine = SessionMachine::new();
        assert_eq!(machine.apply(&advance()), None);
    }

    #[test]
    fn test_advance_can_mask_next_input() {
        let mut machine = SessionMachine::new();
        machine.start(&wizard());
        machine.apply(&StepOutcome::Advance { hide_input: true });
        assert!(machine.active().unwrap().hide_input);
    }
}
