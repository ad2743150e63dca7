//! The frozen state tree.
//!
//! A `Graph` is built once by the builder, validated by the analyzer, and
//! then shared immutably for the machine's lifetime. Nodes live in an arena
//! and refer to each other through stable `NodeId`s; the parent link is a
//! non-owning back-reference terminated by `ParentLink::Root`.

mod node;
mod transition;

pub use node::{ChildrenMode, LifecycleFn, NodeId, ParentLink, StateNode};
pub use transition::{EffectFn, Transition, TransitionTarget};

use crate::core::{Event, State, StatePath};
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked with `(from, event, to)` for every executed
/// sub-transition. Forks notify once per entered target.
pub type ObserverFn<S, E> = Arc<dyn Fn(&S, &E, &S) + Send + Sync>;

/// Immutable state tree with a flat index by kind.
pub struct Graph<S: State, E: Event> {
    pub(crate) nodes: Vec<StateNode<S, E>>,
    pub(crate) index: HashMap<S, NodeId>,
    pub(crate) top_level: Vec<NodeId>,
    pub(crate) initial: NodeId,
    pub(crate) observers: Vec<ObserverFn<S, E>>,
}

impl<S: State, E: Event> Graph<S, E> {
    /// O(1) lookup of a node by kind.
    pub fn lookup(&self, kind: &S) -> Option<&StateNode<S, E>> {
        self.index.get(kind).map(|&id| self.node(id))
    }

    /// Immediate children of the virtual root, in registration order.
    pub fn top_level_nodes(&self) -> impl Iterator<Item = &StateNode<S, E>> {
        self.top_level.iter().map(|&id| self.node(id))
    }

    /// The configured initial leaf.
    pub fn initial_leaf(&self) -> &StateNode<S, E> {
        self.node(self.initial)
    }

    /// Registered global transition observers.
    pub fn observers(&self) -> &[ObserverFn<S, E>] {
        &self.observers
    }

    /// Relationship between a state's children, if the kind is registered.
    pub fn children_mode(&self, kind: &S) -> Option<ChildrenMode> {
        self.lookup(kind).map(StateNode::mode)
    }

    /// The enclosing state's kind, if any.
    pub fn parent_kind(&self, kind: &S) -> Option<&S> {
        match self.lookup(kind)?.parent {
            ParentLink::Root => None,
            ParentLink::Node(p) => Some(&self.node(p).kind),
        }
    }

    /// True when no transition leaves this state or any of its ancestors.
    ///
    /// Unregistered kinds are vacuously terminal.
    pub fn is_terminal(&self, kind: &S) -> bool {
        let Some(mut id) = self.lookup_id(kind) else {
            return true;
        };
        loop {
            if !self.node(id).has_no_transitions() {
                return false;
            }
            match self.node(id).parent {
                ParentLink::Root => return true,
                ParentLink::Node(p) => id = p,
            }
        }
    }

    pub(crate) fn lookup_id(&self, kind: &S) -> Option<NodeId> {
        self.index.get(kind).copied()
    }

    pub(crate) fn node(&self, id: NodeId) -> &StateNode<S, E> {
        &self.nodes[id.0]
    }

    pub(crate) fn kind_of(&self, id: NodeId) -> &S {
        &self.node(id).kind
    }

    /// Chain of ids from the top-level ancestor down to `id`, inclusive.
    pub(crate) fn chain_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut cursor = id;
        while let ParentLink::Node(p) = self.node(cursor).parent {
            chain.push(p);
            cursor = p;
        }
        chain.reverse();
        chain
    }

    /// True when `ancestor` lies strictly above `id`.
    pub(crate) fn is_proper_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = id;
        while let ParentLink::Node(p) = self.node(cursor).parent {
            if p == ancestor {
                return true;
            }
            cursor = p;
        }
        false
    }

    pub(crate) fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor == id || self.is_proper_ancestor(ancestor, id)
    }

    /// True when `id` lies strictly below `lca` (`None` means the virtual
    /// root, below which every node lies).
    pub(crate) fn is_below(&self, id: NodeId, lca: Option<NodeId>) -> bool {
        match lca {
            None => true,
            Some(l) => self.is_proper_ancestor(l, id),
        }
    }

    /// Deepest node that is a proper ancestor of every given id.
    ///
    /// `None` means only the virtual root encloses them all.
    pub(crate) fn lca(&self, ids: &[NodeId]) -> Option<NodeId> {
        let mut common: Option<Vec<NodeId>> = None;
        for &id in ids {
            let mut chain = self.chain_to(id);
            chain.pop();
            common = Some(match common {
                None => chain,
                Some(prev) => prev
                    .into_iter()
                    .zip(chain)
                    .take_while(|(a, b)| a == b)
                    .map(|(a, _)| a)
                    .collect(),
            });
        }
        common.and_then(|c| c.last().copied())
    }

    /// Default-descent expansion: chains from `id` down to the leaves it
    /// activates. Nested nodes descend into their first child; concurrent
    /// nodes activate every region.
    pub(crate) fn expand(&self, id: NodeId) -> Vec<Vec<NodeId>> {
        let node = self.node(id);
        match node.mode {
            ChildrenMode::Leaf => vec![vec![id]],
            ChildrenMode::Nested => self
                .expand(node.children[0])
                .into_iter()
                .map(|tail| prefixed(id, tail))
                .collect(),
            ChildrenMode::Concurrent => node
                .children
                .iter()
                .flat_map(|&c| self.expand(c))
                .map(|tail| prefixed(id, tail))
                .collect(),
        }
    }

    /// Full root-to-leaf chains activated by occupying `id`.
    pub(crate) fn full_chains(&self, id: NodeId) -> Vec<Vec<NodeId>> {
        let mut prefix = self.chain_to(id);
        prefix.pop();
        self.expand(id)
            .into_iter()
            .map(|tail| {
                let mut chain = prefix.clone();
                chain.extend(tail);
                chain
            })
            .collect()
    }

    /// Complete a set of entry chains so that every region of a newly
    /// entered concurrent node has a path.
    ///
    /// Regions already covered by one of the chains are left alone; the
    /// rest get default-descent chains. Concurrent nodes at or above the
    /// transition's common ancestor keep their existing active paths and
    /// are skipped.
    pub(crate) fn complete_regions(&self, chains: &mut Vec<Vec<NodeId>>, lca: Option<NodeId>) {
        let snapshot = chains.clone();
        for chain in &snapshot {
            for &node in chain {
                if !self.is_below(node, lca) {
                    continue;
                }
                if self.node(node).mode != ChildrenMode::Concurrent {
                    continue;
                }
                for &region in &self.node(node).children {
                    let covered = chains.iter().any(|c| c.contains(&region));
                    if covered {
                        continue;
                    }
                    let prefix = self.chain_to(node);
                    for tail in self.expand(region) {
                        let mut full = prefix.clone();
                        full.extend(tail);
                        chains.push(full);
                    }
                }
            }
        }
    }

    /// Every chain activated by entering `target` in isolation, uncovered
    /// sibling regions included.
    pub(crate) fn entry_chains(&self, target: NodeId) -> Vec<Vec<NodeId>> {
        let mut chains = self.full_chains(target);
        self.complete_regions(&mut chains, None);
        chains
    }

    /// Search a region's subtree for the state declaring a join with this
    /// trigger and target.
    pub(crate) fn find_join_source(
        &self,
        region: NodeId,
        trigger: &str,
        target: NodeId,
    ) -> Option<NodeId> {
        let mut stack = vec![region];
        while let Some(id) = stack.pop() {
            if let Some(list) = self.node(id).transitions_for(trigger) {
                if list
                    .iter()
                    .any(|t| t.target == TransitionTarget::Join(target))
                {
                    return Some(id);
                }
            }
            stack.extend(self.node(id).children.iter().copied());
        }
        None
    }

    /// Nearest concurrent ancestor and the region child containing `id`.
    pub(crate) fn region_of(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        let mut child = id;
        loop {
            match self.node(child).parent {
                ParentLink::Root => return None,
                ParentLink::Node(p) => {
                    if self.node(p).mode == ChildrenMode::Concurrent {
                        return Some((p, child));
                    }
                    child = p;
                }
            }
        }
    }

    pub(crate) fn path_of(&self, chain: &[NodeId]) -> StatePath<S> {
        StatePath::new(chain.iter().map(|&id| self.node(id).kind.clone()).collect())
    }
}

fn prefixed(id: NodeId, tail: Vec<NodeId>) -> Vec<NodeId> {
    let mut chain = Vec::with_capacity(tail.len() + 1);
    chain.push(id);
    chain.extend(tail);
    chain
}
