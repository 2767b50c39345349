//! Graph view session.
//!
//! A `GraphView` owns the `GraphState` for one on-screen graph and threads
//! it through successive reconciles. Snapshots from a live task source
//! arrive over a bounded(1) channel: a publisher replaces any older pending
//! snapshot, and the view refuses anything older than what it has shown.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::core::task::TaskRecord;
use crate::error::Result;
use crate::graph::layout::LayoutConfig;
use crate::graph::reconcile::{reconcile, GraphDelta, GraphState};
use crate::{tglog_debug, tglog_warn};

static SNAPSHOT_VERSION: AtomicU64 = AtomicU64::new(0);

/// Next snapshot version. Strictly increasing for the life of the process.
pub fn next_version() -> u64 {
    SNAPSHOT_VERSION.fetch_add(1, Ordering::Relaxed) + 1
}

/// A versioned task collection.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub tasks: Vec<TaskRecord>,
}

impl Snapshot {
    pub fn new(tasks: Vec<TaskRecord>) -> Self {
        Self {
            version: next_version(),
            tasks,
        }
    }
}

/// Publishing end of the snapshot feed.
#[derive(Clone)]
pub struct SnapshotSender {
    tx: Sender<Snapshot>,
    // Kept to evict a pending snapshot before sending a newer one.
    stale: Receiver<Snapshot>,
}

impl SnapshotSender {
    /// Publish tasks as a new snapshot, replacing any pending one.
    ///
    /// Returns the snapshot version.
    pub fn publish(&self, tasks: Vec<TaskRecord>) -> u64 {
        self.send(Snapshot::new(tasks))
    }

    /// Send a snapshot, keeping whichever of it and the pending one is newer.
    pub fn send(&self, snapshot: Snapshot) -> u64 {
        let version = snapshot.version;
        let mut pending = snapshot;
        loop {
            if let Ok(old) = self.stale.try_recv() {
                if old.version > pending.version {
                    // A concurrent publisher got there with a newer one.
                    tglog_debug!("snapshot v{} superseded by v{}", pending.version, old.version);
                    pending = old;
                } else {
                    tglog_debug!("snapshot v{} superseded by v{}", old.version, pending.version);
                }
            }
            match self.tx.try_send(pending) {
                Ok(()) => return version,
                // Another publisher filled the slot in between; evict again.
                Err(TrySendError::Full(back)) => pending = back,
                // Unreachable while `stale` is alive; nothing left to notify.
                Err(TrySendError::Disconnected(_)) => return version,
            }
        }
    }
}

pub type SnapshotReceiver = Receiver<Snapshot>;

/// Create a latest-wins snapshot feed.
pub fn snapshot_channel() -> (SnapshotSender, SnapshotReceiver) {
    let (tx, rx) = crossbeam_channel::bounded::<Snapshot>(1);
    (
        SnapshotSender {
            tx,
            stale: rx.clone(),
        },
        rx,
    )
}

/// Owner of the graph state shown by one view.
#[derive(Debug)]
pub struct GraphView {
    config: LayoutConfig,
    state: GraphState,
    applied_version: Option<u64>,
}

impl GraphView {
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_state(config, GraphState::default())
    }

    /// Resume from a previously rendered state, keeping its positions.
    pub fn with_state(config: LayoutConfig, state: GraphState) -> Self {
        Self {
            config,
            state,
            applied_version: None,
        }
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn into_state(self) -> GraphState {
        self.state
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Version of the last snapshot applied through `apply_snapshot`.
    pub fn applied_version(&self) -> Option<u64> {
        self.applied_version
    }

    /// Reconcile against `tasks` and replace the current state.
    ///
    /// # Errors
    /// `MalformedInput` leaves the current state in place.
    pub fn apply(&mut self, tasks: &[TaskRecord]) -> Result<GraphDelta> {
        let next = match reconcile(&self.state, tasks, &self.config) {
            Ok(next) => next,
            Err(e) => {
                tglog_warn!("keeping last good graph: {}", e);
                return Err(e);
            }
        };
        let delta = self.state.diff(&next);
        tglog_debug!("GraphView::apply {}", delta);
        self.state = next;
        Ok(delta)
    }

    /// Apply a snapshot unless a newer one has already been shown.
    ///
    /// Returns `Ok(None)` for a stale snapshot. A failed snapshot still
    /// counts as seen, so an older one cannot slip in after it.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> Result<Option<GraphDelta>> {
        if let Some(applied) = self.applied_version {
            if snapshot.version <= applied {
                tglog_debug!(
                    "dropping stale snapshot v{} (applied v{})",
                    snapshot.version,
                    applied
                );
                return Ok(None);
            }
        }
        self.applied_version = Some(snapshot.version);
        self.apply(&snapshot.tasks).map(Some)
    }

    /// Apply the newest snapshot waiting on `rx`, if any.
    pub fn drain(&mut self, rx: &SnapshotReceiver) -> Result<Option<GraphDelta>> {
        match rx.try_iter().max_by_key(|s| s.version) {
            Some(snapshot) => self.apply_snapshot(snapshot),
            None => Ok(None),
        }
    }

    /// Tear the view down: forget nodes, edges and remembered positions.
    pub fn reset(&mut self) {
        tglog_debug!("GraphView::reset");
        self.state = GraphState::default();
        self.applied_version = None;
    }
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
