//! Mindtree: hierarchical state machines in the style of UML 2 statecharts.
//!
//! Mindtree models nested states, orthogonal (concurrent) regions, guarded
//! transitions, fork/join pseudostates and entry/exit actions on top of a
//! serialized async event loop: events are queued and applied one at a
//! time, so the active configuration always moves through a well-defined
//! sequence even under concurrent submission.
//!
//! # Core Concepts
//!
//! - **State / Event**: tag traits identifying tree nodes and routing
//!   events (`state_enum!` / `event_enum!` derive them for plain enums)
//! - **StateOfMind**: the active configuration, a set of root-to-leaf
//!   paths (several when orthogonal regions are active)
//! - **Guards**: pure predicates over the event, consulted in authoring
//!   order
//! - **Analyzer**: construction-time validation of reachability, fork and
//!   join shape, and target soundness
//!
//! # Example
//!
//! ```rust
//! use mindtree::{event_enum, state_enum, Machine};
//!
//! state_enum! {
//!     enum Matter {
//!         Solid,
//!         Liquid,
//!         Gas,
//!     }
//! }
//!
//! event_enum! {
//!     enum Thermal {
//!         Melted,
//!         Vaporized,
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let machine = Machine::create(
//!     |b| {
//!         b.initial(Matter::Solid)
//!             .state(Matter::Solid, |s| {
//!                 s.on(Thermal::Melted, Matter::Liquid);
//!             })
//!             .state(Matter::Liquid, |s| {
//!                 s.on(Thermal::Vaporized, Matter::Gas);
//!             })
//!             .state(Matter::Gas, |_| {})
//!     },
//!     false,
//! )
//! .unwrap();
//!
//! machine.apply(Thermal::Melted).await.unwrap();
//! assert!(machine.is_in(&Matter::Liquid));
//! # }
//! ```

pub mod analyzer;
pub mod builder;
pub mod core;
pub mod engine;
pub mod export;
pub mod graph;

// Re-export commonly used types
pub use analyzer::{Analyzer, Violation};
pub use builder::{BuildError, MachineBuilder, StateBuilder, TransitionBuilder};
pub use self::core::{Event, Guard, State, StateHistory, StateOfMind, StatePath, TransitionRecord};
pub use engine::{ApplyHandle, EngineError, Machine};
pub use export::DiagramFormat;
pub use graph::{ChildrenMode, Graph, StateNode};
