//! Per-state builder used inside `MachineBuilder::state` closures.

use crate::builder::machine::Arena;
use crate::builder::transition::{TargetSpec, TransitionBuilder, TransitionSpec};
use crate::builder::BuildError;
use crate::core::{Event, Guard, State};
use crate::graph::ChildrenMode;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Scoped builder for one state.
///
/// Obtained inside the closures passed to [`MachineBuilder::state`],
/// [`nested`](Self::nested) and [`concurrent`](Self::concurrent). A state
/// may have nested children or concurrent children, never both.
///
/// [`MachineBuilder::state`]: crate::builder::MachineBuilder::state
pub struct StateBuilder<'a, S: State, E: Event> {
    pub(crate) arena: &'a mut Arena<S, E>,
    pub(crate) node: usize,
}

impl<S: State, E: Event> StateBuilder<'_, S, E> {
    /// Add a mutually-exclusive child state.
    ///
    /// The first nested child is the default descent target when this state
    /// is entered without naming a deeper leaf.
    pub fn nested<F>(&mut self, kind: S, configure: F) -> &mut Self
    where
        F: FnOnce(&mut StateBuilder<'_, S, E>),
    {
        self.child(ChildrenMode::Nested, kind, configure)
    }

    /// Add an orthogonal region.
    ///
    /// All regions of this state are simultaneously active whenever the
    /// state is entered.
    pub fn concurrent<F>(&mut self, kind: S, configure: F) -> &mut Self
    where
        F: FnOnce(&mut StateBuilder<'_, S, E>),
    {
        self.child(ChildrenMode::Concurrent, kind, configure)
    }

    fn child<F>(&mut self, mode: ChildrenMode, kind: S, configure: F) -> &mut Self
    where
        F: FnOnce(&mut StateBuilder<'_, S, E>),
    {
        let current = self.arena.nodes[self.node].mode;
        if current == ChildrenMode::Leaf {
            self.arena.nodes[self.node].mode = mode;
        } else if current != mode {
            let state = self.arena.nodes[self.node].kind.name().to_string();
            self.arena.fail(BuildError::MixedChildModes { state });
            return self;
        }
        if let Some(idx) = self.arena.register(kind, Some(self.node)) {
            let mut builder = StateBuilder {
                arena: &mut *self.arena,
                node: idx,
            };
            configure(&mut builder);
        }
        self
    }

    /// Add an unguarded transition to `target`.
    ///
    /// Must be the last entry registered for this trigger on this state.
    pub fn on(&mut self, trigger: E, target: S) -> &mut Self {
        self.push(TransitionSpec {
            trigger: trigger.name().to_string(),
            guard: None,
            effect: None,
            target: TargetSpec::Plain(target),
        })
    }

    /// Add a guarded transition to `target`.
    pub fn on_when<F>(&mut self, trigger: E, target: S, predicate: F) -> &mut Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.push(TransitionSpec {
            trigger: trigger.name().to_string(),
            guard: Some(Guard::new(predicate)),
            effect: None,
            target: TargetSpec::Plain(target),
        })
    }

    /// Add a fork fanning out into two or more orthogonal regions.
    pub fn on_fork<I>(&mut self, trigger: E, targets: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
    {
        let targets: Vec<S> = targets.into_iter().collect();
        if targets.len() < 2 {
            let state = self.arena.nodes[self.node].kind.name().to_string();
            self.arena.fail(BuildError::ForkTooFewTargets { state });
            return self;
        }
        self.push(TransitionSpec {
            trigger: trigger.name().to_string(),
            guard: None,
            effect: None,
            target: TargetSpec::Fork(targets),
        })
    }

    /// Declare this state as the join source for its region.
    ///
    /// The join fires once every sibling region declares the same trigger
    /// and target and every region sits at its declared source.
    pub fn on_join(&mut self, trigger: E, target: S) -> &mut Self {
        self.push(TransitionSpec {
            trigger: trigger.name().to_string(),
            guard: None,
            effect: None,
            target: TargetSpec::Join(target),
        })
    }

    /// Add a fully-configured transition (guard and effect combinations).
    pub fn transition(&mut self, builder: TransitionBuilder<S, E>) -> &mut Self {
        match builder.build() {
            Ok(spec) => {
                self.push(spec);
            }
            Err(error) => self.arena.fail(error),
        }
        self
    }

    /// Set the enter callback, invoked with the transition's source kind
    /// and the triggering event.
    pub fn on_enter<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&S, &E) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.arena.nodes[self.node].on_enter = Some(Arc::new(callback));
        self
    }

    /// Set the exit callback, invoked with the transition's primary target
    /// kind and the triggering event.
    pub fn on_exit<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&S, &E) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.arena.nodes[self.node].on_exit = Some(Arc::new(callback));
        self
    }

    fn push(&mut self, spec: TransitionSpec<S, E>) -> &mut Self {
        self.arena.add_transition(self.node, spec);
        self
    }
}
