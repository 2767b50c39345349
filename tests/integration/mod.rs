//! Integration test suite for taskgraph.
//!
//! These tests drive the public API end to end: task records in, rendered
//! graph state out.
//!
//! # Test Categories
//!
//! - `properties`: behaviour guaranteed by the builder, layout and reconciler
//! - `live_updates`: snapshot feed, file source and view session together
//! - `performance`: reconcile cost on realistic task counts


mod live_updates;
mod properties;
