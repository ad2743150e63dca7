//! Runtime errors delivered through apply handles.

use thiserror::Error;

/// Errors that can occur while dispatching events.
///
/// Runtime errors never mutate the active configuration; they are
/// delivered through the per-event [`ApplyHandle`](crate::engine::ApplyHandle).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The event's tag matched no transition anywhere from any active leaf
    /// up to the root. Downgraded to a log line in production mode.
    #[error("No transition for event '{event}' from state '{from}'")]
    InvalidTransition { from: String, event: String },

    /// The dispatcher task is gone, so the event can no longer be applied.
    #[error("State machine dispatcher is no longer running")]
    Stopped,
}
