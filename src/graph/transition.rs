//! Frozen transition definitions.

use crate::core::{Event, Guard};
use crate::graph::node::NodeId;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Async side effect attached to a transition.
///
/// Runs exactly once per firing, between the exit and enter phases, even
/// when a fork enters several targets. Handlers return a boxed pinned
/// future and clone what they need out of the borrowed event.
pub type EffectFn<E> = Arc<dyn Fn(&E) -> BoxFuture<'static, ()> + Send + Sync>;

/// Where a transition leads.
///
/// A no-op outcome ("try an ancestor") is synthesized during selection and
/// never stored in the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionTarget {
    /// Exactly one target.
    Plain(NodeId),
    /// Fan out into two or more orthogonal regions.
    Fork(Vec<NodeId>),
    /// Gather every concurrent sibling into one target.
    Join(NodeId),
}

/// One authored transition entry.
///
/// Entries live in per-trigger lists on their source node; list order is
/// authoring order and decides which guard is consulted first.
pub struct Transition<E: Event> {
    pub(crate) trigger: String,
    pub(crate) guard: Option<Guard<E>>,
    pub(crate) effect: Option<EffectFn<E>>,
    pub(crate) target: TransitionTarget,
}

impl<E: Event> Transition<E> {
    /// True when the guard is absent or passes for this event.
    pub(crate) fn matches(&self, event: &E) -> bool {
        self.guard.as_ref().is_none_or(|g| g.check(event))
    }

    /// True when the entry has no guard.
    pub(crate) fn is_unguarded(&self) -> bool {
        self.guard.is_none()
    }

    /// The event tag this entry listens for.
    pub(crate) fn trigger(&self) -> &str {
        &self.trigger
    }
}
