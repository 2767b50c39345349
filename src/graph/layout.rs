//! Grid layout with position memory.
//!
//! Positions depend only on node identity and order, never on edges, so
//! dependency edits cannot move anything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::task::TaskId;
use crate::error::{Error, Result};
use crate::graph::builder::NodeSpec;

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Node id to position, ordered by id for stable output.
pub type Positions = BTreeMap<TaskId, Position>;

/// Grid settings for newly placed nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Nodes per row.
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_column_spacing")]
    pub column_spacing: f64,
    #[serde(default = "default_row_spacing")]
    pub row_spacing: f64,
}

fn default_columns() -> usize {
    5
}

fn default_column_spacing() -> f64 {
    220.0
}

fn default_row_spacing() -> f64 {
    160.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            column_spacing: default_column_spacing(),
            row_spacing: default_row_spacing(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 {
            return Err(Error::Validation(
                "layout.columns must be greater than zero".to_string(),
            ));
        }
        for (name, value) in [
            ("column_spacing", self.column_spacing),
            ("row_spacing", self.row_spacing),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Validation(format!(
                    "layout.{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Grid cell for the `ordinal`-th newly seen node.
    pub fn slot(&self, ordinal: usize) -> Position {
        // Guards the division for configs that bypassed validation.
        let columns = self.columns.max(1);
        let column = ordinal % columns;
        let row = ordinal / columns;
        Position::new(
            column as f64 * self.column_spacing,
            row as f64 * self.row_spacing,
        )
    }
}

/// Assign a position to every node.
///
/// Nodes already in `previous` keep their position verbatim. The rest fill
/// grid slots in input order, numbered among the new nodes only. The result
/// holds exactly the ids in `nodes`.
pub fn place(nodes: &[NodeSpec], previous: &Positions, config: &LayoutConfig) -> Positions {
    let mut placed = Positions::new();
    let mut ordinal = 0;

    for node in nodes {
        if placed.contains_key(&node.node_id) {
            continue;
        }
        let position = match previous.get(&node.node_id) {
            Some(&existing) => existing,
            None => {
                let fresh = config.slot(ordinal);
                ordinal += 1;
                fresh
            }
        };
        placed.insert(node.node_id.clone(), position);
    }

    placed
}
