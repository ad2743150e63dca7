//! Builder for constructing state transitions.

use crate::builder::error::BuildError;
use crate::core::{Event, Guard, State};
use crate::graph::EffectFn;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Unresolved transition target, still expressed in kinds.
pub(crate) enum TargetSpec<S: State> {
    Plain(S),
    Fork(Vec<S>),
    Join(S),
}

/// One authored transition before target resolution.
pub(crate) struct TransitionSpec<S: State, E: Event> {
    pub(crate) trigger: String,
    pub(crate) guard: Option<Guard<E>>,
    pub(crate) effect: Option<EffectFn<E>>,
    pub(crate) target: TargetSpec<S>,
}

/// Builder for constructing transitions with a fluent API.
///
/// The trigger is given as a prototype event value; only its tag is kept,
/// so payload fields on the prototype are ignored.
///
/// # Example
///
/// ```rust
/// use mindtree::builder::TransitionBuilder;
/// use mindtree::{event_enum, state_enum};
///
/// state_enum! {
///     enum Matter {
///         Solid,
///         Liquid,
///         Boiling,
///     }
/// }
///
/// event_enum! {
///     enum Thermal {
///         Heat { delta_degrees: i32 },
///     }
/// }
///
/// let builder = TransitionBuilder::new()
///     .on(Thermal::Heat { delta_degrees: 0 })
///     .to(Matter::Boiling)
///     .when(|e: &Thermal| {
///         let Thermal::Heat { delta_degrees } = e;
///         *delta_degrees > 100
///     });
/// ```
pub struct TransitionBuilder<S: State, E: Event> {
    trigger: Option<String>,
    target: Option<TargetSpec<S>>,
    guard: Option<Guard<E>>,
    effect: Option<EffectFn<E>>,
}

impl<S: State, E: Event> TransitionBuilder<S, E> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            trigger: None,
            target: None,
            guard: None,
            effect: None,
        }
    }

    /// Set the triggering event (required). Only the tag of the prototype
    /// value is stored.
    pub fn on(mut self, trigger: E) -> Self {
        self.trigger = Some(trigger.name().to_string());
        self
    }

    /// Target exactly one state.
    pub fn to(mut self, target: S) -> Self {
        self.target = Some(TargetSpec::Plain(target));
        self
    }

    /// Fan out into several orthogonal regions.
    pub fn fork<I>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        self.target = Some(TargetSpec::Fork(targets.into_iter().collect()));
        self
    }

    /// Gather every concurrent sibling into one target.
    pub fn join(mut self, target: S) -> Self {
        self.target = Some(TargetSpec::Join(target));
        self
    }

    /// Add a guard (optional).
    pub fn guard(mut self, guard: Guard<E>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Attach a side effect (optional). Runs exactly once per firing.
    pub fn effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&E) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.effect = Some(Arc::new(effect));
        self
    }

    /// Build the transition spec.
    pub(crate) fn build(self) -> Result<TransitionSpec<S, E>, BuildError> {
        let trigger = self.trigger.ok_or(BuildError::MissingTrigger)?;
        let target = self.target.ok_or(BuildError::MissingTarget)?;

        Ok(TransitionSpec {
            trigger,
            guard: self.guard,
            effect: self.effect,
            target,
        })
    }
}

impl<S: State, E: Event> Default for TransitionBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
