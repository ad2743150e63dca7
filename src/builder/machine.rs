//! Builder for constructing state machines.

use crate::analyzer::Analyzer;
use crate::builder::error::BuildError;
use crate::builder::state::StateBuilder;
use crate::builder::transition::{TargetSpec, TransitionSpec};
use crate::core::{Event, State};
use crate::engine::Machine;
use crate::graph::{
    ChildrenMode, Graph, LifecycleFn, NodeId, ObserverFn, ParentLink, StateNode, Transition,
    TransitionTarget,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Mutable node record while the tree is under construction.
pub(crate) struct NodeSpec<S: State, E: Event> {
    pub(crate) kind: S,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) mode: ChildrenMode,
    pub(crate) transitions: Vec<TransitionSpec<S, E>>,
    pub(crate) on_enter: Option<LifecycleFn<S, E>>,
    pub(crate) on_exit: Option<LifecycleFn<S, E>>,
}

/// Growing arena shared by the nested state builders.
///
/// Registration problems are recorded here and surfaced from `build()`;
/// only the first error is kept.
pub(crate) struct Arena<S: State, E: Event> {
    pub(crate) nodes: Vec<NodeSpec<S, E>>,
    pub(crate) index: HashMap<S, usize>,
    pub(crate) error: Option<BuildError>,
}

impl<S: State, E: Event> Arena<S, E> {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            error: None,
        }
    }

    pub(crate) fn fail(&mut self, error: BuildError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub(crate) fn register(&mut self, kind: S, parent: Option<usize>) -> Option<usize> {
        if self.index.contains_key(&kind) {
            self.fail(BuildError::DuplicateState {
                name: kind.name().to_string(),
            });
            return None;
        }
        let idx = self.nodes.len();
        self.index.insert(kind.clone(), idx);
        self.nodes.push(NodeSpec {
            kind,
            parent,
            children: Vec::new(),
            mode: ChildrenMode::Leaf,
            transitions: Vec::new(),
            on_enter: None,
            on_exit: None,
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(idx);
        }
        Some(idx)
    }

    pub(crate) fn add_transition(&mut self, node: usize, spec: TransitionSpec<S, E>) {
        let guardless_already_last = self.nodes[node]
            .transitions
            .iter()
            .any(|t| t.trigger == spec.trigger && t.guard.is_none());
        if guardless_already_last {
            let state = self.nodes[node].kind.name().to_string();
            self.fail(BuildError::NullChoiceMustBeLast {
                state,
                trigger: spec.trigger,
            });
            return;
        }
        self.nodes[node].transitions.push(spec);
    }
}

/// Builder for constructing state machines with a fluent API.
///
/// Top-level states are declared with [`state`](Self::state); nesting and
/// transitions happen inside the per-state closure. `build()` freezes the
/// graph, runs the analyzer (unless in production mode) and spawns the
/// machine's dispatcher, so it must be called within a tokio runtime.
///
/// # Example
///
/// ```rust,no_run
/// use mindtree::builder::MachineBuilder;
/// use mindtree::{event_enum, state_enum};
///
/// state_enum! {
///     enum Matter {
///         Solid,
///         Liquid,
///     }
/// }
///
/// event_enum! {
///     enum Thermal {
///         Melted,
///     }
/// }
///
/// # async fn example() {
/// let machine = MachineBuilder::new()
///     .initial(Matter::Solid)
///     .state(Matter::Solid, |s| {
///         s.on(Thermal::Melted, Matter::Liquid);
///     })
///     .state(Matter::Liquid, |_| {})
///     .build()
///     .unwrap();
/// # let _ = machine;
/// # }
/// ```
pub struct MachineBuilder<S: State, E: Event> {
    arena: Arena<S, E>,
    initial: Option<S>,
    production: bool,
    observers: Vec<ObserverFn<S, E>>,
}

impl<S: State, E: Event> MachineBuilder<S, E> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            initial: None,
            production: false,
            observers: Vec::new(),
        }
    }

    /// Set the initial leaf state.
    ///
    /// Defaults to the first registered top-level leaf when unspecified.
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Toggle production mode.
    ///
    /// Production machines skip analysis at build time and downgrade
    /// unmatched events to a log line instead of failing the apply handle.
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Register a global observer called with `(from, event, to)` for every
    /// executed sub-transition.
    pub fn observe<F>(mut self, observer: F) -> Self
    where
        F: Fn(&S, &E, &S) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Register a top-level state and configure it inside the closure.
    pub fn state<F>(mut self, kind: S, configure: F) -> Self
    where
        F: FnOnce(&mut StateBuilder<'_, S, E>),
    {
        if let Some(idx) = self.arena.register(kind, None) {
            let mut builder = StateBuilder {
                arena: &mut self.arena,
                node: idx,
            };
            configure(&mut builder);
        }
        self
    }

    /// Freeze the graph, analyze it and start the machine.
    pub fn build(self) -> Result<Machine<S, E>, BuildError> {
        let MachineBuilder {
            mut arena,
            initial,
            production,
            observers,
        } = self;

        if let Some(error) = arena.error.take() {
            return Err(error);
        }
        if arena.nodes.is_empty() {
            return Err(BuildError::NoStates);
        }

        let initial_idx = match &initial {
            Some(kind) => *arena.index.get(kind).ok_or_else(|| BuildError::UnknownState {
                name: kind.name().to_string(),
            })?,
            None => arena
                .nodes
                .iter()
                .position(|n| n.parent.is_none() && n.children.is_empty())
                .ok_or(BuildError::MissingInitialState)?,
        };

        let index: HashMap<S, NodeId> = arena
            .index
            .iter()
            .map(|(kind, &idx)| (kind.clone(), NodeId(idx)))
            .collect();

        // Children are always registered after their parent, so depths can
        // be computed in one forward pass.
        let mut depths = vec![0usize; arena.nodes.len()];
        for (idx, spec) in arena.nodes.iter().enumerate() {
            if let Some(p) = spec.parent {
                depths[idx] = depths[p] + 1;
            }
        }

        let top_level: Vec<NodeId> = arena
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(idx, _)| NodeId(idx))
            .collect();

        let mut nodes = Vec::with_capacity(arena.nodes.len());
        for (idx, spec) in arena.nodes.into_iter().enumerate() {
            let mut transitions: HashMap<String, Vec<Transition<E>>> = HashMap::new();
            for t in spec.transitions {
                let target = resolve_target(&index, t.target)?;
                transitions.entry(t.trigger.clone()).or_default().push(Transition {
                    trigger: t.trigger,
                    guard: t.guard,
                    effect: t.effect,
                    target,
                });
            }
            nodes.push(StateNode {
                kind: spec.kind,
                parent: match spec.parent {
                    None => ParentLink::Root,
                    Some(p) => ParentLink::Node(NodeId(p)),
                },
                children: spec.children.into_iter().map(NodeId).collect(),
                mode: spec.mode,
                depth: depths[idx],
                transitions,
                on_enter: spec.on_enter,
                on_exit: spec.on_exit,
            });
        }

        let graph = Graph {
            nodes,
            index,
            top_level,
            initial: NodeId(initial_idx),
            observers,
        };

        if !production {
            let violations = Analyzer::new(&graph).check();
            if !violations.is_empty() {
                for violation in &violations {
                    tracing::error!(%violation, "state machine analysis failed");
                }
                return Err(BuildError::InvalidStateMachine { violations });
            }
        }

        Ok(Machine::start(graph, production))
    }
}

impl<S: State, E: Event> Default for MachineBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_target<S: State>(
    index: &HashMap<S, NodeId>,
    spec: TargetSpec<S>,
) -> Result<TransitionTarget, BuildError> {
    let resolve = |kind: &S| {
        index.get(kind).copied().ok_or_else(|| BuildError::UnknownState {
            name: kind.name().to_string(),
        })
    };
    Ok(match spec {
        TargetSpec::Plain(kind) => TransitionTarget::Plain(resolve(&kind)?),
        TargetSpec::Fork(kinds) => TransitionTarget::Fork(
            kinds.iter().map(|k| resolve(k)).collect::<Result<_, _>>()?,
        ),
        TargetSpec::Join(kind) => TransitionTarget::Join(resolve(&kind)?),
    })
}
