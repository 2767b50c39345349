//! Reconciles a task collection against the previously rendered graph.
//!
//! Every call produces a full replacement `GraphState`. Stability comes from
//! identity: node ids, edge ids and remembered positions carry over, so a
//! renderer can diff two states by id.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::task::{TaskId, TaskRecord};
use crate::error::Result;
use crate::graph::builder::build;
use crate::graph::layout::{place, LayoutConfig, Position, Positions};
use crate::tglog_debug;

/// A node ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: TaskId,
    pub label: String,
    pub position: Position,
}

/// A directed edge ready to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub id: String,
    pub source: TaskId,
    pub target: TaskId,
    /// False when the target task is not part of the current graph.
    pub resolved: bool,
}

/// Complete snapshot handed to a renderer.
///
/// `positions` is the position memory: it covers every node currently in
/// the graph and keeps entries for nodes that have since disappeared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphState {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    #[serde(default)]
    pub positions: Positions,
}

/// Ids that changed between two states.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GraphDelta {
    pub added_nodes: Vec<TaskId>,
    pub updated_nodes: Vec<TaskId>,
    pub removed_nodes: Vec<TaskId>,
    pub added_edges: Vec<String>,
    pub updated_edges: Vec<String>,
    pub removed_edges: Vec<String>,
}

impl GraphDelta {
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.updated_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.updated_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

impl std::fmt::Display for GraphDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "nodes +{} ~{} -{}, edges +{} ~{} -{}",
            self.added_nodes.len(),
            self.updated_nodes.len(),
            self.removed_nodes.len(),
            self.added_edges.len(),
            self.updated_edges.len(),
            self.removed_edges.len()
        )
    }
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Edges whose target is not a node of this graph.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &RenderEdge> {
        self.edges.iter().filter(|e| !e.resolved)
    }

    /// Positions of the nodes currently in the graph.
    pub fn current_positions(&self) -> Positions {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .collect()
    }

    /// Everything this state remembers: node positions, with `positions`
    /// taking precedence. A state saved without `positions` still keeps
    /// its nodes in place.
    pub fn position_memory(&self) -> Positions {
        let mut memory = self.current_positions();
        memory.extend(self.positions.iter().map(|(id, p)| (id.clone(), *p)));
        memory
    }

    /// What changed going from `self` to `next`, ordered by id.
    pub fn diff(&self, next: &GraphState) -> GraphDelta {
        let before: BTreeMap<&TaskId, &RenderNode> =
            self.nodes.iter().map(|n| (&n.id, n)).collect();
        let after: BTreeMap<&TaskId, &RenderNode> =
            next.nodes.iter().map(|n| (&n.id, n)).collect();
        let (added_nodes, updated_nodes, removed_nodes) = diff_maps(&before, &after);

        let before: BTreeMap<&String, &RenderEdge> =
            self.edges.iter().map(|e| (&e.id, e)).collect();
        let after: BTreeMap<&String, &RenderEdge> =
            next.edges.iter().map(|e| (&e.id, e)).collect();
        let (added_edges, updated_edges, removed_edges) = diff_maps(&before, &after);

        GraphDelta {
            added_nodes,
            updated_nodes,
            removed_nodes,
            added_edges,
            updated_edges,
            removed_edges,
        }
    }
}

type Changes<K> = (Vec<K>, Vec<K>, Vec<K>);

fn diff_maps<K, V>(before: &BTreeMap<&K, &V>, after: &BTreeMap<&K, &V>) -> Changes<K>
where
    K: Ord + Clone,
    V: PartialEq,
{
    let mut added = Vec::new();
    let mut updated = Vec::new();
    for (key, value) in after {
        match before.get(key) {
            None => added.push((*key).clone()),
            Some(old) if old != value => updated.push((*key).clone()),
            Some(_) => {}
        }
    }
    let removed = before
        .keys()
        .filter(|key| !after.contains_key(*key))
        .map(|key| (*key).clone())
        .collect();
    (added, updated, removed)
}

/// Compute the next graph state for `tasks`.
///
/// # Errors
/// Propagates `MalformedInput` from the builder. `previous` is only
/// borrowed, so the caller still holds the last good state.
pub fn reconcile(
    previous: &GraphState,
    tasks: &[TaskRecord],
    config: &LayoutConfig,
) -> Result<GraphState> {
    let spec = build(tasks)?;
    let mut positions = previous.position_memory();
    let placed = place(&spec.nodes, &positions, config);

    let node_ids: HashSet<&TaskId> = spec.nodes.iter().map(|n| &n.node_id).collect();

    let nodes = spec
        .nodes
        .iter()
        .map(|n| RenderNode {
            id: n.node_id.clone(),
            label: n.label.clone(),
            position: placed.get(&n.node_id).copied().unwrap_or_default(),
        })
        .collect();

    let edges: Vec<RenderEdge> = spec
        .edges
        .iter()
        .map(|e| RenderEdge {
            id: e.edge_id.clone(),
            source: e.source_id.clone(),
            target: e.target_id.clone(),
            resolved: node_ids.contains(&e.target_id),
        })
        .collect();

    positions.extend(placed);

    let dangling = edges.iter().filter(|e| !e.resolved).count();
    tglog_debug!(
        "reconcile: tasks={} nodes={} edges={} dangling={} remembered={}",
        tasks.len(),
        spec.nodes.len(),
        edges.len(),
        dangling,
        positions.len()
    );

    Ok(GraphState {
        nodes,
        edges,
        positions,
    })
}

/// Ids of nodes that appear in `positions` but not in the graph.
pub fn departed_nodes(state: &GraphState) -> BTreeSet<&TaskId> {
    let live: HashSet<&TaskId> = state.nodes.iter().map(|n| &n.id).collect();
    state
        .positions
        .keys()
        .filter(|id| !live.contains(id))
        .collect()
}
