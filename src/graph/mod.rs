//! Task dependency graph.
//!
//! Task records flow through three stages:
//! - `builder`: records to node and edge specs
//! - `layout`: stable grid positions for nodes
//! - `reconcile`: full `GraphState` threaded from one snapshot to the next
//!
//! `topology` answers structural questions about a reconciled state.

pub mod builder;
pub mod layout;
pub mod reconcile;
pub mod topology;

pub use builder::{build, EdgeSpec, GraphSpec, NodeSpec};
pub use layout::{place, LayoutConfig, Position, Positions};
pub use reconcile::{reconcile, GraphDelta, GraphState, RenderEdge, RenderNode};
pub use topology::Topology;
