//! Structural queries over a rendered graph.
//!
//! `Topology` projects a `GraphState` onto a petgraph `DiGraph` so that
//! callers can ask about neighbours and cycles. Only resolved edges are
//! projected; dangling edges stay visible through `dangling()`.

use std::collections::HashMap;

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::core::task::TaskId;
use crate::graph::reconcile::{GraphState, RenderEdge};

pub struct Topology<'a> {
    graph: DiGraph<&'a TaskId, &'a RenderEdge>,
    index: HashMap<&'a TaskId, NodeIndex>,
    dangling: Vec<&'a RenderEdge>,
}

impl<'a> Topology<'a> {
    pub fn from_state(state: &'a GraphState) -> Self {
        let mut graph = DiGraph::with_capacity(state.nodes.len(), state.edges.len());
        let mut index = HashMap::with_capacity(state.nodes.len());
        for node in &state.nodes {
            let ix = graph.add_node(&node.id);
            index.insert(&node.id, ix);
        }

        let mut dangling = Vec::new();
        for edge in &state.edges {
            match (index.get(&edge.source), index.get(&edge.target)) {
                (Some(&from), Some(&to)) => {
                    graph.add_edge(from, to, edge);
                }
                _ => dangling.push(edge),
            }
        }

        Self {
            graph,
            index,
            dangling,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of projected (resolved) edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    pub fn has_dependency(&self, from: &TaskId, to: &TaskId) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Tasks that `id` depends on, sorted.
    pub fn dependencies_of(&self, id: &TaskId) -> Vec<&'a TaskId> {
        self.neighbours(id, Direction::Outgoing)
    }

    /// Tasks that depend on `id`, sorted.
    pub fn dependents_of(&self, id: &TaskId) -> Vec<&'a TaskId> {
        self.neighbours(id, Direction::Incoming)
    }

    fn neighbours(&self, id: &TaskId, direction: Direction) -> Vec<&'a TaskId> {
        let Some(&ix) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&'a TaskId> = self
            .graph
            .neighbors_directed(ix, direction)
            .map(|n| self.graph[n])
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Edges whose source and target coincide, in edge order.
    pub fn self_loops(&self) -> Vec<&'a RenderEdge> {
        self.graph
            .edge_references()
            .filter(|e| e.source() == e.target())
            .map(|e| *e.weight())
            .collect()
    }

    /// Groups of tasks that reach each other.
    ///
    /// Each group is sorted and the list is sorted by first member. A single
    /// task only forms a group when it has a self-loop.
    pub fn cycles(&self) -> Vec<Vec<&'a TaskId>> {
        let mut groups: Vec<Vec<&'a TaskId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| match scc.as_slice() {
                [single] => self.graph.find_edge(*single, *single).is_some(),
                _ => true,
            })
            .map(|scc| {
                let mut ids: Vec<&'a TaskId> = scc.into_iter().map(|ix| self.graph[ix]).collect();
                ids.sort();
                ids
            })
            .collect();
        groups.sort();
        groups
    }

    /// Edges whose target (or source) is not a node of the graph.
    pub fn dangling(&self) -> &[&'a RenderEdge] {
        &self.dangling
    }
}

impl std::fmt::Debug for Topology<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topology")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("dangling", &self.dangling.len())
            .finish()
    }
}
