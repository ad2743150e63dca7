//! Core state machine types.
//!
//! This module contains the pure value types of the library:
//! - State and event tags via the `State` and `Event` traits
//! - Guard predicates for transition control
//! - Active configurations (`StatePath`, `StateOfMind`)
//! - Immutable history tracking
//!
//! Everything here is pure data; the event loop lives in `engine`.

mod guard;
mod history;
mod path;
mod state;

pub use guard::Guard;
pub use history::{StateHistory, TransitionRecord};
pub use path::{StateOfMind, StatePath};
pub use state::{Event, State};
