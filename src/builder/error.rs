//! Build errors for state machine and transition builders.

use crate::analyzer::Violation;
use thiserror::Error;

/// Errors that can occur when building a state machine.
///
/// Registration errors inside builder closures are deferred and surface
/// from `build()`, so the fluent API stays infallible mid-chain.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No states registered. Add at least one top-level state")]
    NoStates,

    #[error("Initial state not specified and no top-level leaf to default to")]
    MissingInitialState,

    #[error("State '{name}' is already registered")]
    DuplicateState { name: String },

    #[error("Reference to unregistered state '{name}'")]
    UnknownState { name: String },

    #[error("Transition list for '{trigger}' on state '{state}' already ends in a guardless entry; the guardless choice must stay last")]
    NullChoiceMustBeLast { state: String, trigger: String },

    #[error("State '{state}' mixes nested and concurrent children")]
    MixedChildModes { state: String },

    #[error("Fork on state '{state}' needs at least two targets")]
    ForkTooFewTargets { state: String },

    #[error("Transition trigger not specified. Call .on(event)")]
    MissingTrigger,

    #[error("Transition target not specified. Call .to(state), .fork(states) or .join(state)")]
    MissingTarget,

    #[error("State machine rejected by analysis: {violations:?}")]
    InvalidStateMachine { violations: Vec<Violation> },
}
