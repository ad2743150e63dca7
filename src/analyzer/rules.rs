//! Static analysis rules for frozen state graphs.

use crate::analyzer::violations::Violation;
use crate::core::{Event, State};
use crate::graph::{ChildrenMode, Graph, NodeId, TransitionTarget};
use std::collections::HashSet;

/// Construction-time validator for a state graph.
///
/// `check` accumulates every violation it finds; `report` logs them and
/// returns whether the graph is sound. Non-production builds refuse to
/// start a machine whose graph fails analysis.
pub struct Analyzer<'g, S: State, E: Event> {
    graph: &'g Graph<S, E>,
}

impl<'g, S: State, E: Event> Analyzer<'g, S, E> {
    pub fn new(graph: &'g Graph<S, E>) -> Self {
        Self { graph }
    }

    /// Run every rule and collect all violations.
    pub fn check(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.check_initial(&mut violations);
        self.check_reachability(&mut violations);
        self.check_targets(&mut violations);
        self.check_forks(&mut violations);
        self.check_joins(&mut violations);
        violations
    }

    /// Log every violation and return whether the graph is sound.
    pub fn report(&self) -> bool {
        let violations = self.check();
        for violation in &violations {
            tracing::error!(%violation, "state machine analysis failed");
        }
        if violations.is_empty() {
            tracing::debug!("state machine analysis passed");
            true
        } else {
            false
        }
    }

    fn check_initial(&self, violations: &mut Vec<Violation>) {
        let initial = self.graph.initial_leaf();
        if !initial.is_leaf() {
            violations.push(Violation::InitialStateNotLeaf {
                name: initial.kind().name().to_string(),
            });
        }
    }

    /// Fixpoint over the set of nodes that can ever become active: the
    /// initial configuration seeds it, and every transition from an active
    /// node activates its targets (with their default descents and
    /// ancestor chains). Leaves outside the fixpoint are unreachable.
    fn check_reachability(&self, violations: &mut Vec<Violation>) {
        let g = self.graph;
        let mut active: HashSet<NodeId> = HashSet::new();
        for chain in g.entry_chains(g.initial) {
            active.extend(chain);
        }

        loop {
            let mut grew = false;
            let snapshot: Vec<NodeId> = active.iter().copied().collect();
            for id in snapshot {
                for list in g.node(id).transitions.values() {
                    for transition in list {
                        for target in target_ids(&transition.target) {
                            for chain in g.entry_chains(target) {
                                for node in chain {
                                    grew |= active.insert(node);
                                }
                            }
                        }
                    }
                }
            }
            if !grew {
                break;
            }
        }

        for (idx, node) in g.nodes.iter().enumerate() {
            if node.is_leaf() && !active.contains(&NodeId(idx)) {
                violations.push(Violation::UnreachableState {
                    name: node.kind().name().to_string(),
                });
            }
        }
    }

    /// Plain and join transitions must land on leaves; only forks may name
    /// a region root, which the enter phase extends to a leaf.
    fn check_targets(&self, violations: &mut Vec<Violation>) {
        let g = self.graph;
        for node in &g.nodes {
            for list in node.transitions.values() {
                for transition in list {
                    let target = match transition.target {
                        TransitionTarget::Plain(d) | TransitionTarget::Join(d) => d,
                        TransitionTarget::Fork(_) => continue,
                    };
                    if g.node(target).is_abstract() {
                        violations.push(Violation::AbstractTargetState {
                            from: node.kind().name().to_string(),
                            target: g.kind_of(target).name().to_string(),
                        });
                    }
                }
            }
        }
    }

    fn check_forks(&self, violations: &mut Vec<Violation>) {
        let g = self.graph;
        for node in &g.nodes {
            for list in node.transitions.values() {
                for transition in list {
                    let TransitionTarget::Fork(ref targets) = transition.target else {
                        continue;
                    };
                    if !self.fork_is_orthogonal(targets) {
                        violations.push(Violation::ForkTargetsNotConcurrent {
                            from: node.kind().name().to_string(),
                        });
                    }
                }
            }
        }
    }

    /// The targets' common ancestor must be a concurrent node and each
    /// target must fall into a different region of it.
    fn fork_is_orthogonal(&self, targets: &[NodeId]) -> bool {
        let g = self.graph;
        let Some(common) = g.lca(targets) else {
            return false;
        };
        if g.node(common).mode() != ChildrenMode::Concurrent {
            return false;
        }
        let mut regions = HashSet::new();
        for &target in targets {
            let chain = g.chain_to(target);
            let region = chain
                .iter()
                .position(|&n| n == common)
                .and_then(|pos| chain.get(pos + 1));
            match region {
                Some(&r) => {
                    if !regions.insert(r) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        regions.len() == targets.len()
    }

    /// Every sibling region must declare the same join (trigger and
    /// target); partial coverage can never fire and is rejected.
    fn check_joins(&self, violations: &mut Vec<Violation>) {
        let g = self.graph;
        for (idx, node) in g.nodes.iter().enumerate() {
            for list in node.transitions.values() {
                for transition in list {
                    let TransitionTarget::Join(target) = transition.target else {
                        continue;
                    };
                    let Some((parent, _)) = g.region_of(NodeId(idx)) else {
                        violations.push(Violation::JoinOutsideConcurrent {
                            from: node.kind().name().to_string(),
                            trigger: transition.trigger().to_string(),
                        });
                        continue;
                    };
                    let covered = g
                        .node(parent)
                        .children()
                        .iter()
                        .all(|&region| {
                            g.find_join_source(region, transition.trigger(), target)
                                .is_some()
                        });
                    if !covered {
                        violations.push(Violation::JoinSourcesIncomplete {
                            trigger: transition.trigger().to_string(),
                            target: g.kind_of(target).name().to_string(),
                            parent: g.kind_of(parent).name().to_string(),
                        });
                    }
                }
            }
        }
    }
}

fn target_ids(target: &TransitionTarget) -> Vec<NodeId> {
    match target {
        TransitionTarget::Plain(d) | TransitionTarget::Join(d) => vec![*d],
        TransitionTarget::Fork(ds) => ds.clone(),
    }
}
