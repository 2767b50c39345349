//! Graph builder: task records to nodes and directed edges.
//!
//! The builder reports the literal structure of the data. It does not check
//! referential integrity, so edges may point at tasks that are not in the
//! collection, and cycles or self-loops pass through untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::task::{TaskId, TaskRecord};
use crate::error::{Error, Result};
use crate::tglog_trace;

/// A node to be placed and rendered, one per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub node_id: TaskId,
    pub label: String,
}

/// A directed dependency edge from `source_id` to `target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub edge_id: String,
    pub source_id: TaskId,
    pub target_id: TaskId,
}

impl EdgeSpec {
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}

/// Output of a single build, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

/// Node label: the title, with the status in parentheses on a second line.
pub fn node_label(task: &TaskRecord) -> String {
    match task.status_text() {
        Some(status) => format!("{}\n({})", task.title, status),
        None => task.title.clone(),
    }
}

/// Id used for a dependency that carries none of its own.
pub fn synthesize_edge_id(source: &str, target: &str) -> String {
    format!("{}->{}", source, target)
}

/// Build the node and edge sets for a task collection.
///
/// Duplicate task ids keep the last record in input order; the earlier
/// record is dropped together with its dependencies. Duplicate edge ids
/// keep the last edge in global traversal order, in that edge's slot.
///
/// # Errors
/// `Error::MalformedInput` if any record has an absent or blank id. Nothing
/// is built in that case.
pub fn build(tasks: &[TaskRecord]) -> Result<GraphSpec> {
    let mut ids = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        let id = task.valid_id().ok_or_else(|| Error::MalformedInput {
            index,
            reason: match task.id {
                None => "missing id".to_string(),
                Some(_) => "empty id".to_string(),
            },
        })?;
        ids.push(id);
    }

    let last_task = last_occurrence(ids.iter().copied());

    let mut nodes = Vec::with_capacity(last_task.len());
    let mut edges = Vec::new();
    for (index, (task, &id)) in tasks.iter().zip(&ids).enumerate() {
        if last_task.get(id) != Some(&index) {
            tglog_trace!("build: task {} at index {} superseded", id, index);
            continue;
        }

        nodes.push(NodeSpec {
            node_id: TaskId::new(id),
            label: node_label(task),
        });

        for dep in &task.dependencies_out {
            let edge_id = match dep.explicit_id() {
                Some(explicit) => explicit.to_string(),
                None => synthesize_edge_id(id, &dep.to_id),
            };
            edges.push(EdgeSpec {
                edge_id,
                source_id: TaskId::new(id),
                target_id: TaskId::new(dep.to_id.as_str()),
            });
        }
    }

    let last_edge = last_occurrence(edges.iter().map(|e| e.edge_id.as_str()));
    let edges = edges
        .iter()
        .enumerate()
        .filter(|(index, edge)| last_edge.get(edge.edge_id.as_str()) == Some(index))
        .map(|(_, edge)| edge.clone())
        .collect();

    Ok(GraphSpec { nodes, edges })
}

/// Map each key to the index of its final occurrence.
fn last_occurrence<'a>(keys: impl Iterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    keys.enumerate().map(|(index, key)| (key, index)).collect()
}
