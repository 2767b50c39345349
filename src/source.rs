//! File-backed task source.
//!
//! Reads task snapshots from a JSON file and, when watching, republishes the
//! file into a snapshot feed every time it changes on disk.

use std::fs;
use std::path::{Path, PathBuf};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;

use crate::core::task::TaskRecord;
use crate::error::Result;
use crate::view::SnapshotSender;
use crate::{tglog, tglog_debug, tglog_trace, tglog_warn};

/// Accepted layouts of a task file.
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskFile {
    List(Vec<TaskRecord>),
    Wrapped { tasks: Vec<TaskRecord> },
}

/// Parse a task collection: a JSON array, or an object with a `tasks` array.
pub fn parse_tasks(json: &str) -> Result<Vec<TaskRecord>> {
    let file: TaskFile = serde_json::from_str(json)?;
    Ok(match file {
        TaskFile::List(tasks) => tasks,
        TaskFile::Wrapped { tasks } => tasks,
    })
}

pub fn load_tasks(path: &Path) -> Result<Vec<TaskRecord>> {
    tglog_debug!("load_tasks path={}", path.display());
    let tasks = parse_tasks(&fs::read_to_string(path)?)?;
    tglog_trace!("loaded {} task records", tasks.len());
    Ok(tasks)
}

/// Republishes a task file when it changes.
///
/// Unchanged content is not republished, so the several events an editor
/// emits for one save produce a single snapshot. Unreadable or unparsable
/// content is logged and skipped; the view keeps its last good graph.
pub struct TaskFilePublisher {
    path: PathBuf,
    sender: SnapshotSender,
    last: Option<Vec<TaskRecord>>,
}

impl TaskFilePublisher {
    pub fn new(path: &Path, sender: SnapshotSender) -> Self {
        Self {
            path: path.to_path_buf(),
            sender,
            last: None,
        }
    }

    /// Reload the file and publish it if its tasks changed.
    ///
    /// Returns the published snapshot version.
    pub fn refresh(&mut self) -> Result<Option<u64>> {
        let tasks = load_tasks(&self.path)?;
        if self.last.as_ref() == Some(&tasks) {
            tglog_trace!("{} unchanged, not republishing", self.path.display());
            return Ok(None);
        }
        self.last = Some(tasks.clone());
        let version = self.sender.publish(tasks);
        tglog_debug!("published {} as v{}", self.path.display(), version);
        Ok(Some(version))
    }

    fn is_relevant(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == self.path.file_name())
    }

    fn handle(&mut self, res: notify::Result<Event>) {
        match res {
            Ok(event) if self.is_relevant(&event) => {
                if let Err(e) = self.refresh() {
                    tglog_warn!("skipping update of {}: {}", self.path.display(), e);
                }
            }
            Ok(_) => {}
            Err(e) => tglog_warn!("watch error on {}: {}", self.path.display(), e),
        }
    }
}

/// Keeps a file watcher alive. Dropping it stops watching.
pub struct TaskFileWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl TaskFileWatcher {
    /// Publish the current file content, then watch for changes.
    ///
    /// The parent directory is watched rather than the file itself so that
    /// editors which save by rename are still seen.
    pub fn start(path: &Path, sender: SnapshotSender) -> Result<Self> {
        let mut publisher = TaskFilePublisher::new(path, sender);
        if let Err(e) = publisher.refresh() {
            tglog_warn!("initial load of {} failed: {}", path.display(), e);
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| publisher.handle(res),
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tglog!("watching {}", path.display());

        Ok(Self {
            _watcher: watcher,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
