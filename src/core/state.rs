//! Core tag traits for state machine states and events.
//!
//! The engine never inspects user values beyond their stable tag: states
//! are indexed by value (hence `Eq + Hash`), events are routed by `name()`.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state kinds.
///
/// A state kind is a plain tag: it carries no payload and identifies one
/// node of the state tree. Kinds must be globally unique within a machine.
///
/// # Required Traits
///
/// - `Clone + Eq + Hash`: kinds are flat-index keys
/// - `Debug`: kinds must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: active configurations and history
///   records are serializable
///
/// # Example
///
/// ```rust
/// use mindtree::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Matter {
///     Solid,
///     Liquid,
///     Gas,
/// }
///
/// impl State for Matter {
///     fn name(&self) -> &str {
///         match self {
///             Self::Solid => "Solid",
///             Self::Liquid => "Liquid",
///             Self::Gas => "Gas",
///         }
///     }
/// }
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for display, logging and diagram export.
    fn name(&self) -> &str;
}

/// Trait for events.
///
/// Events may carry payload fields; transition lookup only ever uses the
/// stable tag returned by `name()`. Guards receive the full event value and
/// may inspect the payload.
///
/// # Example
///
/// ```rust
/// use mindtree::core::Event;
///
/// #[derive(Clone, Debug)]
/// enum Thermal {
///     Melted,
///     Heat { delta_degrees: i32 },
/// }
///
/// impl Event for Thermal {
///     fn name(&self) -> &str {
///         match self {
///             Self::Melted => "Melted",
///             Self::Heat { .. } => "Heat",
///         }
///     }
/// }
///
/// assert_eq!(Thermal::Heat { delta_degrees: 50 }.name(), "Heat");
/// ```
pub trait Event: Clone + Debug + Send + Sync + 'static {
    /// Get the event's stable tag.
    ///
    /// Two events with the same tag are routed through the same transition
    /// lists regardless of payload.
    fn name(&self) -> &str;
}
