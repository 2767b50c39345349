pub mod config;
pub mod core;
pub mod error;
pub mod graph;
pub mod log;
pub mod render;
pub mod source;
pub mod view;

pub use error::{Error, Result};
pub use graph::{reconcile, GraphDelta, GraphState, LayoutConfig, Position};
pub use view::GraphView;
