// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Step dependency graph
//!
//! Builds the dependency graph of a flow's steps: chain edges from each chain
//! step to the next, and parameter edges from a referenced step to the step
//! whose hyperparameter references it. Used to detect cycles and orphan steps,
//! and to render the document.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use petgraph::Direction;
use std::fmt;

use super::{DataRef, Flow};
use crate::errors::{FlowError, FlowResult};

/// Why one step depends on another
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Chain data flow
    Data,
    /// Step reference from the named hyperparameter
    Param(String),
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::Param(name) => write!(f, "{}", name),
        }
    }
}

/// Dependency graph over one flow's steps (node weight = step index)
#[derive(Debug)]
pub struct StepGraph {
    graph: DiGraph<usize, Dependency>,
    nodes: Vec<NodeIndex>,
    labels: Vec<String>,
    chain: Vec<usize>,
}

impl StepGraph {
    /// Build the graph of `flow`.
    ///
    /// References that do not resolve are skipped; the validator reports
    /// them.
    pub fn build(flow: &Flow) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..flow.steps.len()).map(|i| graph.add_node(i)).collect();
        let chain = flow.chain();

        for &index in &chain {
            let source = flow.steps[index]
                .input_reference()
                .and_then(DataRef::parse)
                .and_then(|r| r.step_index());

            if let Some(source) = source.filter(|s| *s < nodes.len()) {
                graph.add_edge(nodes[source], nodes[index], Dependency::Data);
            }
        }

        for (index, step) in flow.steps.iter().enumerate() {
            for (name, reference) in step.step_references() {
                for &target in reference.indices() {
                    if target < nodes.len() {
                        graph.add_edge(
                            nodes[target],
                            nodes[index],
                            Dependency::Param(name.to_string()),
                        );
                    }
                }
            }
        }

        Self {
            graph,
            nodes,
            labels: flow.steps.iter().map(|s| s.label()).collect(),
            chain,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Steps taking part in a reference cycle, sorted
    pub fn cycle(&self) -> Option<Vec<usize>> {
        if toposort(&self.graph, None).is_ok() {
            return None;
        }

        let mut members: Vec<usize> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .flatten()
            .map(|n| self.graph[n])
            .collect();
        members.sort_unstable();

        Some(members)
    }

    /// Fail with [`FlowError::CyclicStepReference`] when the graph has a cycle
    pub fn check_acyclic(&self) -> FlowResult<()> {
        match self.cycle() {
            Some(steps) => Err(FlowError::CyclicStepReference { steps }),
            None => Ok(()),
        }
    }

    /// Step indices with every step after its dependencies
    pub fn topological_order(&self) -> FlowResult<Vec<usize>> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n]).collect())
            .map_err(|_| FlowError::CyclicStepReference {
                steps: self.cycle().unwrap_or_default(),
            })
    }

    /// Steps `step` depends on, sorted
    pub fn dependencies(&self, step: usize) -> Vec<usize> {
        self.neighbors(step, Direction::Incoming)
    }

    /// Steps depending on `step`, sorted
    pub fn dependents(&self, step: usize) -> Vec<usize> {
        self.neighbors(step, Direction::Outgoing)
    }

    fn neighbors(&self, step: usize, direction: Direction) -> Vec<usize> {
        let Some(node) = self.nodes.get(step) else {
            return Vec::new();
        };

        let mut steps: Vec<usize> = self
            .graph
            .neighbors_directed(*node, direction)
            .map(|n| self.graph[n])
            .collect();
        steps.sort_unstable();
        steps.dedup();
        steps
    }

    /// Steps that are neither chain members nor needed by one
    pub fn orphans(&self) -> Vec<usize> {
        let reversed = Reversed(&self.graph);
        let mut reachable = vec![false; self.nodes.len()];

        for &index in &self.chain {
            let mut dfs = Dfs::new(reversed, self.nodes[index]);
            while let Some(node) = dfs.next(reversed) {
                reachable[self.graph[node]] = true;
            }
        }

        reachable
            .iter()
            .enumerate()
            .filter(|(_, reached)| !**reached)
            .map(|(i, _)| i)
            .collect()
    }

    /// Numbered listing in dependency order
    pub fn to_text(&self) -> FlowResult<String> {
        let order = self.topological_order()?;
        let mut out = String::new();

        for (i, step) in order.iter().enumerate() {
            let marker = if self.chain.contains(step) { "*" } else { " " };
            out.push_str(&format!("{}. {}[{}] {}", i + 1, marker, step, self.labels[*step]));

            let deps = self.dependencies(*step);
            if !deps.is_empty() {
                let deps: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        Ok(out)
    }

    /// Graphviz rendering
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph flow {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for (step, label) in self.labels.iter().enumerate() {
            let style = if self.chain.contains(&step) { ", style=\"rounded,bold\"" } else { "" };
            out.push_str(&format!(
                "    s{} [label=\"{}: {}\"{}];\n",
                step,
                step,
                escape(label),
                style
            ));
        }

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    s{} -> s{} [label=\"{}\"];\n",
                self.graph[edge.source()],
                self.graph[edge.target()],
                escape(&edge.weight().to_string())
            ));
        }

        out.push_str("}\n");
        out
    }

    /// Mermaid rendering
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for (step, label) in self.labels.iter().enumerate() {
            out.push_str(&format!("    s{}[\"{}: {}\"]\n", step, step, label.replace('"', "'")));
        }

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    s{} -->|{}| s{}\n",
                self.graph[edge.source()],
                edge.weight(),
                self.graph[edge.target()]
            ));
        }

        out
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
