//! Transition selection and execution.
//!
//! Selection walks the active leaf's ancestor chain looking for the first
//! entry whose guard passes; execution commits the exit / effect / enter
//! sequence around the least common ancestor of the endpoints.

use crate::core::{Event, State, StateOfMind, StatePath, TransitionRecord};
use crate::engine::error::EngineError;
use crate::graph::{Graph, NodeId, ParentLink, Transition, TransitionTarget};
use chrono::Utc;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Outcome of transition selection for one active leaf.
pub(crate) enum Selection<'g, E: Event> {
    /// A transition entry matched on `owner` (the leaf or one of its
    /// ancestors).
    Fire {
        owner: NodeId,
        transition: &'g Transition<E>,
    },
    /// Nothing matched. `saw_trigger` remembers whether any list for the
    /// event's tag existed on the chain at all.
    NoOp { saw_trigger: bool },
}

/// Walk from the leaf upward and return the first entry whose guard is
/// absent or passes. A list with no passing entry falls through to the
/// ancestor; a join entry only matches once every sibling region sits at
/// its declared source.
pub(crate) fn select<'g, S: State, E: Event>(
    graph: &'g Graph<S, E>,
    mind: &StateOfMind<S>,
    leaf: NodeId,
    event: &E,
) -> Selection<'g, E> {
    let tag = event.name();
    let mut saw_trigger = false;
    let mut cursor = Some(leaf);
    while let Some(id) = cursor {
        let node = graph.node(id);
        if let Some(list) = node.transitions_for(tag) {
            saw_trigger = true;
            for transition in list {
                if !transition.matches(event) {
                    continue;
                }
                if let TransitionTarget::Join(target) = transition.target {
                    if !join_ready(graph, mind, id, transition.trigger(), target) {
                        continue;
                    }
                }
                return Selection::Fire {
                    owner: id,
                    transition,
                };
            }
        }
        cursor = match node.parent() {
            ParentLink::Root => None,
            ParentLink::Node(p) => Some(p),
        };
    }
    Selection::NoOp { saw_trigger }
}

/// A join is ready when every region of the enclosing concurrent state has
/// its active leaf sitting on that region's declared join source.
fn join_ready<S: State, E: Event>(
    graph: &Graph<S, E>,
    mind: &StateOfMind<S>,
    owner: NodeId,
    trigger: &str,
    target: NodeId,
) -> bool {
    let Some((parent, _)) = graph.region_of(owner) else {
        return false;
    };
    graph.node(parent).children().iter().all(|&region| {
        let Some(source) = graph.find_join_source(region, trigger, target) else {
            return false;
        };
        let region_kind = graph.kind_of(region);
        mind.paths()
            .iter()
            .find(|p| p.contains(region_kind))
            .and_then(|p| graph.lookup_id(p.leaf()))
            .is_some_and(|leaf| leaf == source)
    })
}

/// Apply one event to the configuration: select per active leaf (snapshot
/// taken before any mutation), execute what matched, and report the
/// executed sub-transitions.
///
/// Fails with `InvalidTransition` only when no active leaf saw the event's
/// tag anywhere on its ancestor chain; in that case the configuration is
/// untouched.
pub(crate) async fn dispatch_event<S: State, E: Event>(
    graph: &Graph<S, E>,
    mind: &mut StateOfMind<S>,
    event: &E,
) -> Result<Vec<TransitionRecord<S>>, EngineError> {
    let snapshot = mind.paths().to_vec();
    let mut any_trigger = false;
    let mut records = Vec::new();

    for path in &snapshot {
        // A join or an ancestor transition may have retired this path
        // while handling an earlier leaf of the same snapshot.
        if !mind.contains_path(path) {
            continue;
        }
        let Some(leaf) = graph.lookup_id(path.leaf()) else {
            continue;
        };
        match select(graph, mind, leaf, event) {
            Selection::Fire { owner, transition } => {
                any_trigger = true;
                execute(graph, mind, owner, transition, event, &mut records).await;
            }
            Selection::NoOp { saw_trigger } => any_trigger |= saw_trigger,
        }
    }

    if !any_trigger {
        let from = snapshot
            .first()
            .map(|p| p.leaf().name().to_string())
            .unwrap_or_default();
        return Err(EngineError::InvalidTransition {
            from,
            event: event.name().to_string(),
        });
    }
    Ok(records)
}

/// Commit one selected transition: exit leaf-first below the LCA, run the
/// side effect exactly once, enter root-first with default descent, then
/// notify observers per target branch.
async fn execute<S: State, E: Event>(
    graph: &Graph<S, E>,
    mind: &mut StateOfMind<S>,
    owner: NodeId,
    transition: &Transition<E>,
    event: &E,
    records: &mut Vec<TransitionRecord<S>>,
) {
    let (sources, targets) = endpoints(graph, owner, transition);
    let mut endpoints_all = sources.clone();
    endpoints_all.extend(targets.iter().copied());
    let lca = graph.lca(&endpoints_all);

    // Exit phase: retire every path related to a source below the LCA,
    // invoking exits deepest-first with shared ancestors exited once.
    let exiting: Vec<StatePath<S>> = mind
        .paths()
        .iter()
        .filter(|p| path_exits(graph, p, lca, &sources))
        .cloned()
        .collect();

    let mut exit_nodes: Vec<NodeId> = Vec::new();
    let mut seen_exit = HashSet::new();
    for path in &exiting {
        for &id in chain_ids(graph, path).iter().rev() {
            if graph.is_below(id, lca) && seen_exit.insert(id) {
                exit_nodes.push(id);
            }
        }
    }
    exit_nodes.sort_by_key(|&id| std::cmp::Reverse(graph.node(id).depth));

    let primary_target = graph.kind_of(targets[0]).clone();
    for &id in &exit_nodes {
        if let Some(callback) = &graph.node(id).on_exit {
            callback(&primary_target, event).await;
        }
    }
    for path in &exiting {
        mind.remove(path);
    }

    // Side effect, exactly once even for multi-target forks.
    if let Some(effect) = &transition.effect {
        effect(event).await;
    }

    // Enter phase: build the new chains, give uncovered regions their
    // default descent, and enter new nodes root-first.
    let mut chains: Vec<Vec<NodeId>> = Vec::new();
    for &target in &targets {
        chains.extend(graph.full_chains(target));
    }
    graph.complete_regions(&mut chains, lca);

    let source_kind = graph.kind_of(owner).clone();
    let mut entered: Vec<NodeId> = Vec::new();
    let mut seen_enter = HashSet::new();
    for chain in &chains {
        for &id in chain {
            if graph.is_below(id, lca)
                && !mind.contains(graph.kind_of(id))
                && seen_enter.insert(id)
            {
                entered.push(id);
            }
        }
    }
    for &id in &entered {
        if let Some(callback) = &graph.node(id).on_enter {
            callback(&source_kind, event).await;
        }
    }
    for chain in &chains {
        mind.insert(graph.path_of(chain));
    }

    // Observer notification and history, once per declared target branch.
    for &target in &targets {
        let to = graph.kind_of(target);
        for observer in graph.observers() {
            let outcome = catch_unwind(AssertUnwindSafe(|| observer(&source_kind, event, to)));
            if outcome.is_err() {
                tracing::error!(
                    from = source_kind.name(),
                    to = to.name(),
                    "transition observer panicked"
                );
            }
        }
        records.push(TransitionRecord {
            from: source_kind.clone(),
            event: event.name().to_string(),
            to: to.clone(),
            timestamp: Utc::now(),
        });
    }
}

/// Sources and targets of a selected transition. Joins gather the declared
/// source of every sibling region.
fn endpoints<S: State, E: Event>(
    graph: &Graph<S, E>,
    owner: NodeId,
    transition: &Transition<E>,
) -> (Vec<NodeId>, Vec<NodeId>) {
    match &transition.target {
        TransitionTarget::Plain(d) => (vec![owner], vec![*d]),
        TransitionTarget::Fork(ds) => (vec![owner], ds.clone()),
        TransitionTarget::Join(d) => {
            let mut sources = Vec::new();
            if let Some((parent, _)) = graph.region_of(owner) {
                for &region in graph.node(parent).children() {
                    if let Some(source) =
                        graph.find_join_source(region, transition.trigger(), *d)
                    {
                        sources.push(source);
                    }
                }
            }
            if sources.is_empty() {
                sources.push(owner);
            }
            (sources, vec![*d])
        }
    }
}

/// A path leaves the configuration when it passes through a node below the
/// LCA that is an ancestor or descendant of some source.
fn path_exits<S: State, E: Event>(
    graph: &Graph<S, E>,
    path: &StatePath<S>,
    lca: Option<NodeId>,
    sources: &[NodeId],
) -> bool {
    chain_ids(graph, path).iter().any(|&node| {
        graph.is_below(node, lca)
            && sources.iter().any(|&source| {
                graph.is_ancestor_or_self(node, source) || graph.is_ancestor_or_self(source, node)
            })
    })
}

fn chain_ids<S: State, E: Event>(graph: &Graph<S, E>, path: &StatePath<S>) -> Vec<NodeId> {
    path.kinds()
        .iter()
        .filter_map(|kind| graph.lookup_id(kind))
        .collect()
}
