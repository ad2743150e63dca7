//! Nodes of the frozen state tree.

use crate::core::{Event, State};
use crate::graph::transition::Transition;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// Stable identifier of a node in the graph's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) usize);

/// Non-owning back-link to the enclosing node.
///
/// `Root` terminates upward walks; top-level states have no parent node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParentLink {
    Root,
    Node(NodeId),
}

/// How a node's children relate to each other.
///
/// `Nested` children are mutually exclusive; `Concurrent` children are all
/// simultaneously active whenever the parent is entered.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChildrenMode {
    Leaf,
    Nested,
    Concurrent,
}

/// Async callback invoked when a node is entered or exited.
///
/// Receives the other end of the transition (the source kind on enter, the
/// primary target kind on exit) and the triggering event. Handlers return a
/// boxed pinned future: `|other, event| Box::pin(async move { .. })`,
/// cloning whatever they need out of the borrowed arguments.
pub type LifecycleFn<S, E> = Arc<dyn Fn(&S, &E) -> BoxFuture<'static, ()> + Send + Sync>;

/// One node in the state tree.
pub struct StateNode<S: State, E: Event> {
    pub(crate) kind: S,
    pub(crate) parent: ParentLink,
    pub(crate) children: Vec<NodeId>,
    pub(crate) mode: ChildrenMode,
    pub(crate) depth: usize,
    pub(crate) transitions: HashMap<String, Vec<Transition<E>>>,
    pub(crate) on_enter: Option<LifecycleFn<S, E>>,
    pub(crate) on_exit: Option<LifecycleFn<S, E>>,
}

impl<S: State, E: Event> StateNode<S, E> {
    /// The kind tagging this node.
    pub fn kind(&self) -> &S {
        &self.kind
    }

    /// Back-link to the enclosing node.
    pub fn parent(&self) -> ParentLink {
        self.parent
    }

    /// Ordered child ids.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Relationship between this node's children.
    pub fn mode(&self) -> ChildrenMode {
        self.mode
    }

    /// True when the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True when the node has children and therefore cannot be occupied
    /// directly.
    pub fn is_abstract(&self) -> bool {
        !self.children.is_empty()
    }

    /// Transition entries for the given event tag, in authoring order.
    pub(crate) fn transitions_for(&self, tag: &str) -> Option<&[Transition<E>]> {
        self.transitions.get(tag).map(Vec::as_slice)
    }

    /// True when no transition leaves this node at all.
    pub(crate) fn has_no_transitions(&self) -> bool {
        self.transitions.is_empty()
    }
}
