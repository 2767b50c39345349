//! Live update tests: snapshots arriving from a changing task source.

use std::thread;
use std::time::Duration;

use taskgraph::core::task::TaskRecord;
use taskgraph::graph::{LayoutConfig, Position};
use taskgraph::source::{TaskFilePublisher, TaskFileWatcher};
use taskgraph::view::{snapshot_channel, GraphView, Snapshot, SnapshotReceiver};

use crate::fixtures::{abc, chain, task, TaskFile};

#[test]
fn test_concurrent_publishers_latest_wins() {
    let (tx, rx) = snapshot_channel();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let tx = tx.clone();
            thread::spawn(move || {
                let mut last = 0;
                for i in 0..50 {
                    last = tx.publish(vec![task(&format!("w{}-{}", worker, i))]);
                }
                last
            })
        })
        .collect();
    let newest = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .max()
        .unwrap();

    let mut view = GraphView::default();
    view.drain(&rx).unwrap();
    assert_eq!(view.applied_version(), Some(newest));
    assert_eq!(view.state().nodes.len(), 1);
    assert!(rx.try_recv().is_err(), "Only one snapshot should be pending");
}

#[test]
fn test_out_of_order_delivery_keeps_newest() {
    let older = Snapshot::new(abc());
    let newer = Snapshot::new(chain());

    let mut view = GraphView::default();
    view.apply_snapshot(newer).unwrap();
    let shown = view.state().clone();

    assert!(view.apply_snapshot(older).unwrap().is_none());
    assert_eq!(view.state(), &shown);
}

#[test]
fn test_malformed_snapshot_between_good_ones() {
    let (tx, rx) = snapshot_channel();
    let mut view = GraphView::default();

    tx.publish(abc());
    view.drain(&rx).unwrap();
    let good = view.state().clone();

    tx.publish(vec![task("a"), TaskRecord::default()]);
    assert!(view.drain(&rx).is_err());
    assert_eq!(view.state(), &good);

    tx.publish(vec![task("c"), task("d")]);
    let delta = view.drain(&rx).unwrap().unwrap();
    assert_eq!(delta.removed_nodes.len(), 2);
    assert_eq!(view.state().node("c").unwrap().position, Position::new(440.0, 0.0));
    assert_eq!(view.state().node("d").unwrap().position, Position::new(0.0, 0.0));
}

#[test]
fn test_file_edits_flow_into_view() {
    let file = TaskFile::new(&abc());
    let (tx, rx) = snapshot_channel();
    let mut publisher = TaskFilePublisher::new(&file.path, tx);
    let mut view = GraphView::new(LayoutConfig::default());

    publisher.refresh().unwrap();
    view.drain(&rx).unwrap();
    let original_b = view.state().node("b").unwrap().position;

    file.write(&[task("b").depends_on("a"), task("a"), task("c")]);
    publisher.refresh().unwrap();
    let delta = view.drain(&rx).unwrap().unwrap();

    assert_eq!(delta.added_edges, vec!["b->a".to_string()]);
    assert!(delta.added_nodes.is_empty());
    assert_eq!(view.state().node("b").unwrap().position, original_b);
}

#[test]
fn test_broken_file_keeps_last_snapshot() {
    let file = TaskFile::new(&abc());
    let (tx, rx) = snapshot_channel();
    let mut publisher = TaskFilePublisher::new(&file.path, tx);
    let mut view = GraphView::default();

    publisher.refresh().unwrap();
    view.drain(&rx).unwrap();

    file.write_raw("[{\"id\": ");
    assert!(publisher.refresh().is_err());
    assert!(view.drain(&rx).unwrap().is_none());
    assert_eq!(view.state().nodes.len(), 3);
}

#[test]
fn test_watcher_publishes_initial_content() {
    let file = TaskFile::new(&chain());
    let (tx, rx) = snapshot_channel();
    let watcher = TaskFileWatcher::start(&file.path, tx).expect("Failed to start watcher");
    assert_eq!(watcher.path(), file.path.as_path());

    let snapshot = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Initial snapshot should be published");
    assert_eq!(snapshot.tasks.len(), 4);
}

/// Wait for a snapshot matching `want`, skipping intermediate ones.
fn recv_until(
    rx: &SnapshotReceiver,
    want: impl Fn(&Snapshot) -> bool,
) -> Option<Snapshot> {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while let Some(left) = deadline.checked_duration_since(std::time::Instant::now()) {
        match rx.recv_timeout(left) {
            Ok(snapshot) if want(&snapshot) => return Some(snapshot),
            Ok(_) => {}
            Err(_) => return None,
        }
    }
    None
}

#[test]
fn test_watcher_republishes_after_file_changes() {
    let file = TaskFile::new(&chain());
    let (tx, rx) = snapshot_channel();
    let _watcher = TaskFileWatcher::start(&file.path, tx).expect("Failed to start watcher");
    let initial = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Initial snapshot should be published");

    file.write(&[task("x"), task("y")]);
    let updated = recv_until(&rx, |s| s.tasks.len() == 2)
        .expect("Rewriting the file should publish a new snapshot");
    assert!(updated.version > initial.version);
    assert_eq!(updated.tasks[0].valid_id(), Some("x"));

    let mut view = GraphView::default();
    view.apply_snapshot(updated).unwrap();
    assert_eq!(view.state().nodes.len(), 2);
}

#[test]
fn test_watcher_ignores_sibling_files() {
    let file = TaskFile::new(&chain());
    let (tx, rx) = snapshot_channel();
    let _watcher = TaskFileWatcher::start(&file.path, tx).expect("Failed to start watcher");
    rx.recv_timeout(Duration::from_secs(5))
        .expect("Initial snapshot should be published");

    std::fs::write(file.dir.path().join("notes.json"), "[]").unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
}
