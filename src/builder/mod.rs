//! Builder API for ergonomic state machine construction.
//!
//! This module provides fluent builders and macros for declaring
//! hierarchical state machines with minimal boilerplate: top-level states
//! on [`MachineBuilder`], nesting, regions and transitions on
//! [`StateBuilder`], and guard/effect combinations on
//! [`TransitionBuilder`].

pub mod error;
pub mod machine;
pub mod macros;
pub mod state;
pub mod transition;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use state::StateBuilder;
pub use transition::TransitionBuilder;
