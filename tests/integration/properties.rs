//! Graph properties across builder, layout and reconciler.

use taskgraph::core::task::TaskRecord;
use taskgraph::graph::{build, reconcile, GraphState, LayoutConfig, Position, Topology};
use taskgraph::{Error, GraphView};

use crate::fixtures::{abc, chain, diamond, fresh, task};

#[test]
fn test_reconcile_is_deterministic() {
    let config = LayoutConfig::default();
    let previous = fresh(&abc());
    let tasks = chain();

    let first = reconcile(&previous, &tasks, &config).unwrap();
    let second = reconcile(&previous, &tasks, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_positions_stable_under_dependency_edits() {
    let config = LayoutConfig::default();
    let previous = fresh(&diamond());

    let mut rewired = diamond();
    rewired[0].dependencies_out.clear();
    rewired[3] = task("base").depends_on("top");

    let before = reconcile(&previous, &diamond(), &config).unwrap();
    let after = reconcile(&previous, &rewired, &config).unwrap();
    assert_eq!(before.positions, after.positions);
    for node in &after.nodes {
        assert_eq!(Some(node.position), before.node(node.id.as_str()).map(|n| n.position));
    }
}

#[test]
fn test_positions_stable_from_empty_previous() {
    // Even without memory, layout ignores edges entirely.
    let config = LayoutConfig::default();
    let plain = abc();
    let wired = vec![task("a").depends_on("c"), task("b").depends_on("a"), task("c")];

    let a = reconcile(&GraphState::new(), &plain, &config).unwrap();
    let b = reconcile(&GraphState::new(), &wired, &config).unwrap();
    assert_eq!(a.positions, b.positions);
}

#[test]
fn test_new_node_placement_on_grid() {
    let state = fresh(&abc());
    assert_eq!(state.node("a").unwrap().position, Position::new(0.0, 0.0));
    assert_eq!(state.node("b").unwrap().position, Position::new(220.0, 0.0));
    assert_eq!(state.node("c").unwrap().position, Position::new(440.0, 0.0));
}

#[test]
fn test_grid_relation_holds_for_custom_width() {
    let config = LayoutConfig {
        columns: 3,
        column_spacing: 100.0,
        row_spacing: 50.0,
    };
    let tasks: Vec<TaskRecord> = (0..10).map(|i| task(&format!("n{}", i))).collect();
    let state = reconcile(&GraphState::new(), &tasks, &config).unwrap();

    for (i, node) in state.nodes.iter().enumerate() {
        let expected = Position::new((i % 3) as f64 * 100.0, (i / 3) as f64 * 50.0);
        assert_eq!(node.position, expected, "node {}", node.id);
    }
}

#[test]
fn test_self_loop_survives() {
    let state = fresh(&[task("a").depends_on("a")]);
    assert_eq!(state.edges.len(), 1);
    let edge = &state.edges[0];
    assert_eq!(edge.source.as_str(), "a");
    assert_eq!(edge.target.as_str(), "a");
    assert!(edge.resolved);
}

#[test]
fn test_two_node_cycle_survives() {
    let state = fresh(&[task("a").depends_on("b"), task("b").depends_on("a")]);
    assert_eq!(state.nodes.len(), 2);
    assert_eq!(state.edges.len(), 2);

    let topology = Topology::from_state(&state);
    assert!(!topology.is_acyclic());
    assert_eq!(topology.cycles().len(), 1);
}

#[test]
fn test_dangling_edge_without_phantom_node() {
    let state = fresh(&[task("a").depends_on("z")]);
    assert_eq!(state.nodes.len(), 1);
    assert!(state.node("z").is_none());
    assert!(!state.positions.contains_key("z"));

    let edge = state.edge("a->z").unwrap();
    assert!(!edge.resolved);
}

#[test]
fn test_dangling_edge_resolves_when_target_appears() {
    let config = LayoutConfig::default();
    let first = fresh(&[task("a").depends_on("z")]);
    let second = reconcile(&first, &[task("a").depends_on("z"), task("z")], &config).unwrap();

    assert!(second.edge("a->z").unwrap().resolved);
    assert_eq!(second.node("a").unwrap().position, first.node("a").unwrap().position);
}

#[test]
fn test_duplicate_edge_id_collapses_to_later() {
    let tasks = vec![
        task("a").depends_on_via("shared", "b"),
        task("b"),
        task("c").depends_on_via("shared", "b"),
    ];
    let spec = build(&tasks).unwrap();
    let shared: Vec<_> = spec.edges.iter().filter(|e| e.edge_id == "shared").collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].source_id.as_str(), "c");

    let state = fresh(&tasks);
    assert_eq!(state.edge("shared").unwrap().source.as_str(), "c");
}

#[test]
fn test_synthesized_id_collision_from_duplicate_records() {
    // The same dependency listed twice on one task yields one edge.
    let tasks = vec![task("a").depends_on("b").depends_on("b"), task("b")];
    let state = fresh(&tasks);
    assert_eq!(state.edges.len(), 1);
    assert_eq!(state.edges[0].id, "a->b");
}

#[test]
fn test_duplicate_task_id_later_record_wins() {
    let tasks = vec![
        TaskRecord::new("a", "First").with_status("todo"),
        task("b"),
        TaskRecord::new("a", "Second").with_status("done"),
    ];
    let state = fresh(&tasks);
    assert_eq!(state.nodes.len(), 2);
    assert_eq!(state.node("a").unwrap().label, "Second\n(done)");
    // Slot of the surviving record: second among the nodes.
    assert_eq!(state.node("a").unwrap().position, Position::new(220.0, 0.0));
}

#[test]
fn test_malformed_input_keeps_previous_state() {
    let config = LayoutConfig::default();
    let previous = fresh(&chain());

    let mut broken = chain();
    broken[2].id = None;
    let result = reconcile(&previous, &broken, &config);
    assert!(matches!(result, Err(Error::MalformedInput { index: 2, .. })));

    let mut view = GraphView::with_state(config, previous.clone());
    let err = view.apply(&broken).unwrap_err();
    assert!(err.is_malformed_input());
    assert_eq!(view.state(), &previous);
    assert!(!view.state().is_empty());
}

#[test]
fn test_labels_from_title_and_status() {
    let state = fresh(&chain());
    assert_eq!(state.node("schema").unwrap().label, "Task SCHEMA\n(done)");
    assert_eq!(state.node("api").unwrap().label, "Task API\n(in_progress)");

    let plain = fresh(&[TaskRecord::new("x", "No status")]);
    assert_eq!(plain.node("x").unwrap().label, "No status");
}

#[test]
fn test_deleted_and_restored_task_returns_home() {
    let config = LayoutConfig::default();
    let full = fresh(&chain());
    let home = full.node("api").unwrap().position;

    let without: Vec<TaskRecord> = chain()
        .into_iter()
        .filter(|t| t.valid_id() != Some("api"))
        .collect();
    let removed = reconcile(&full, &without, &config).unwrap();
    assert!(removed.node("api").is_none());
    assert!(!removed.edge("ui->api").unwrap().resolved);

    let restored = reconcile(&removed, &chain(), &config).unwrap();
    assert_eq!(restored.node("api").unwrap().position, home);
}

#[test]
fn test_topology_on_diamond() {
    let state = fresh(&diamond());
    let topology = Topology::from_state(&state);
    assert!(topology.is_acyclic());
    assert!(topology.cycles().is_empty());
    assert_eq!(topology.edge_count(), 4);

    let deps: Vec<String> = topology
        .dependencies_of(&"top".into())
        .iter()
        .map(|id| id.to_string())
        .collect();
    assert_eq!(deps, vec!["left".to_string(), "right".to_string()]);
}
