//! Render adapters.
//!
//! A renderer receives a complete `GraphState` and must not need anything
//! else to draw it. Dangling edges are drawn as unresolved stubs.

use std::io::Write;

use crate::error::Result;
use crate::graph::reconcile::GraphState;

pub trait RenderAdapter {
    fn render(&mut self, state: &GraphState) -> Result<()>;
}

/// Plain-text listing of nodes and edges.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderAdapter for TextRenderer<W> {
    fn render(&mut self, state: &GraphState) -> Result<()> {
        writeln!(self.out, "nodes ({}):", state.nodes.len())?;
        for node in &state.nodes {
            writeln!(
                self.out,
                "  {} @ ({}, {})  {}",
                node.id,
                node.position.x,
                node.position.y,
                node.label.replace('\n', " / ")
            )?;
        }

        writeln!(self.out, "edges ({}):", state.edges.len())?;
        for edge in &state.edges {
            let stub = if edge.resolved { "" } else { " (unresolved)" };
            writeln!(
                self.out,
                "  {} -> {} [{}]{}",
                edge.source, edge.target, edge.id, stub
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Pretty-printed JSON of the whole state, one document per render.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderAdapter for JsonRenderer<W> {
    fn render(&mut self, state: &GraphState) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, state)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
