//! Diagram text renderers for frozen state graphs.
//!
//! Renderers are pure functions from a graph to diagram source text;
//! `Machine::export` writes the result to disk. Nested states become
//! clusters or composite states, concurrent regions are marked in each
//! dialect's own way, and every transition edge is labelled with its
//! trigger tag (guarded entries get a `[guarded]` marker).

use crate::core::{Event, State};
use crate::graph::{ChildrenMode, Graph, NodeId, TransitionTarget};
use std::fmt::Write;

/// Supported diagram dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagramFormat {
    /// Graphviz dot with clusters for nested states.
    Dot,
    /// Mermaid `stateDiagram-v2`.
    Mermaid,
    /// state-machine-cat.
    Smcat,
}

/// Render the graph in the requested dialect.
pub fn render<S: State, E: Event>(graph: &Graph<S, E>, format: DiagramFormat) -> String {
    match format {
        DiagramFormat::Dot => render_dot(graph),
        DiagramFormat::Mermaid => render_mermaid(graph),
        DiagramFormat::Smcat => render_smcat(graph),
    }
}

/// Edges of one node, with trigger labels, in a stable order.
fn edges<S: State, E: Event>(graph: &Graph<S, E>, id: NodeId) -> Vec<(String, String, String)> {
    let node = graph.node(id);
    let mut tags: Vec<&String> = node.transitions.keys().collect();
    tags.sort();

    let mut out = Vec::new();
    for tag in tags {
        for transition in &node.transitions[tag] {
            let label = if transition.is_unguarded() {
                tag.clone()
            } else {
                format!("{tag} [guarded]")
            };
            let from = node.kind().name().to_string();
            match &transition.target {
                TransitionTarget::Plain(d) | TransitionTarget::Join(d) => {
                    out.push((from, graph.kind_of(*d).name().to_string(), label));
                }
                TransitionTarget::Fork(ds) => {
                    for d in ds {
                        out.push((
                            from.clone(),
                            graph.kind_of(*d).name().to_string(),
                            label.clone(),
                        ));
                    }
                }
            }
        }
    }
    out
}

fn render_dot<S: State, E: Event>(graph: &Graph<S, E>) -> String {
    let mut out = String::new();
    out.push_str("digraph statemachine {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  compound=true;\n");
    for &id in &graph.top_level {
        dot_node(graph, id, 1, &mut out);
    }
    for idx in 0..graph.nodes.len() {
        for (from, to, label) in edges(graph, NodeId(idx)) {
            let _ = writeln!(out, "  \"{from}\" -> \"{to}\" [label=\"{label}\"];");
        }
    }
    out.push_str("}\n");
    out
}

fn dot_node<S: State, E: Event>(graph: &Graph<S, E>, id: NodeId, indent: usize, out: &mut String) {
    let node = graph.node(id);
    let pad = "  ".repeat(indent);
    let name = node.kind().name();
    if node.is_leaf() {
        let _ = writeln!(out, "{pad}\"{name}\" [shape=box, style=rounded];");
        return;
    }
    let _ = writeln!(out, "{pad}subgraph \"cluster_{name}\" {{");
    let _ = writeln!(out, "{pad}  label=\"{name}\";");
    if node.mode() == ChildrenMode::Concurrent {
        let _ = writeln!(out, "{pad}  style=dashed;");
    }
    let _ = writeln!(out, "{pad}  \"{name}\" [shape=point];");
    for &child in node.children() {
        dot_node(graph, child, indent + 1, out);
    }
    let _ = writeln!(out, "{pad}}}");
}

fn render_mermaid<S: State, E: Event>(graph: &Graph<S, E>) -> String {
    let mut out = String::new();
    out.push_str("stateDiagram-v2\n");
    let _ = writeln!(out, "    [*] --> {}", graph.initial_leaf().kind().name());
    for &id in &graph.top_level {
        mermaid_node(graph, id, 1, &mut out);
    }
    for idx in 0..graph.nodes.len() {
        for (from, to, label) in edges(graph, NodeId(idx)) {
            let _ = writeln!(out, "    {from} --> {to} : {label}");
        }
    }
    out
}

fn mermaid_node<S: State, E: Event>(
    graph: &Graph<S, E>,
    id: NodeId,
    indent: usize,
    out: &mut String,
) {
    let node = graph.node(id);
    let pad = "    ".repeat(indent);
    let name = node.kind().name();
    if node.is_leaf() {
        let _ = writeln!(out, "{pad}{name}");
        return;
    }
    let _ = writeln!(out, "{pad}state {name} {{");
    for (i, &child) in node.children().iter().enumerate() {
        if i > 0 && node.mode() == ChildrenMode::Concurrent {
            let _ = writeln!(out, "{pad}    --");
        }
        mermaid_node(graph, child, indent + 1, out);
    }
    let _ = writeln!(out, "{pad}}}");
}

fn render_smcat<S: State, E: Event>(graph: &Graph<S, E>) -> String {
    let mut out = String::new();
    let states: Vec<String> = graph
        .top_level
        .iter()
        .map(|&id| smcat_node(graph, id))
        .collect();
    out.push_str(&states.join(",\n"));
    out.push_str(";\n");
    for idx in 0..graph.nodes.len() {
        for (from, to, label) in edges(graph, NodeId(idx)) {
            let _ = writeln!(out, "{from} => {to} : {label};");
        }
    }
    out
}

fn smcat_node<S: State, E: Event>(graph: &Graph<S, E>, id: NodeId) -> String {
    let node = graph.node(id);
    let name = node.kind().name();
    if node.is_leaf() {
        return name.to_string();
    }
    let children: Vec<String> = node
        .children()
        .iter()
        .map(|&child| smcat_node(graph, child))
        .collect();
    let attrs = if node.mode() == ChildrenMode::Concurrent {
        " [type=parallel]"
    } else {
        ""
    };
    format!("{name}{attrs} {{ {}; }}", children.join(", "))
}
