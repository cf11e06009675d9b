//! Background work whose results are applied by the owning thread.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use tracing::{debug, warn};

use crate::storage::{StorageError, TreeScan, take_snapshot};

/// Result of a finished job.
#[derive(Debug)]
pub enum JobEvent {
    Scanned {
        path: PathBuf,
        result: Result<TreeScan, StorageError>,
    },
    Snapshot {
        root: PathBuf,
        result: Result<PathBuf, StorageError>,
    },
}

/// Sends a worker's event exactly once.
///
/// A worker that unwinds before sending reports `fallback` from `Drop`, so
/// every spawned job produces one event and blocking waits always return.
struct Reply {
    tx: Sender<JobEvent>,
    fallback: Option<JobEvent>,
}

impl Reply {
    fn new(tx: Sender<JobEvent>, fallback: JobEvent) -> Self {
        Self {
            tx,
            fallback: Some(fallback),
        }
    }

    fn send(mut self, event: JobEvent) {
        self.fallback = None;
        // the receiver lives as long as the sidebar
        let _ = self.tx.send(event);
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        if let Some(event) = self.fallback.take() {
            warn!(?event, "worker stopped without reporting");
            let _ = self.tx.send(event);
        }
    }
}

fn interrupted(path: &std::path::Path) -> StorageError {
    StorageError::Interrupted {
        path: path.to_path_buf(),
    }
}

/// Clears the snapshot flag when dropped, also during unwinding.
struct RunningFlag(Arc<AtomicBool>);

impl Drop for RunningFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Worker threads reporting back over a channel.
///
/// Workers never see the sidebar; they only send a [`JobEvent`].
#[derive(Debug)]
pub struct Jobs {
    tx: Sender<JobEvent>,
    rx: Receiver<JobEvent>,
    snapshot_running: Arc<AtomicBool>,
    in_flight: usize,
}

impl Default for Jobs {
    fn default() -> Self {
        Self::new()
    }
}

impl Jobs {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            snapshot_running: Arc::new(AtomicBool::new(false)),
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_snapshot_running(&self) -> bool {
        self.snapshot_running.load(Ordering::Acquire)
    }

    /// Scans `path` on a worker thread.
    pub fn spawn_scan(&mut self, path: PathBuf) {
        let fallback = JobEvent::Scanned {
            path: path.clone(),
            result: Err(interrupted(&path)),
        };
        let reply = Reply::new(self.tx.clone(), fallback);
        self.in_flight += 1;
        thread::spawn(move || {
            let result = TreeScan::run(&path);
            reply.send(JobEvent::Scanned { path, result });
        });
    }

    /// Copies `root` into a new snapshot on a worker thread.
    ///
    /// Returns `false` without starting anything while a snapshot is running.
    pub fn spawn_snapshot(&mut self, root: PathBuf, at: DateTime<Utc>) -> bool {
        if self
            .snapshot_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(root = %root.display(), "snapshot already running");
            return false;
        }

        let fallback = JobEvent::Snapshot {
            root: root.clone(),
            result: Err(interrupted(&root)),
        };
        let reply = Reply::new(self.tx.clone(), fallback);
        let running = RunningFlag(Arc::clone(&self.snapshot_running));
        self.in_flight += 1;
        thread::spawn(move || {
            let result = take_snapshot(&root, at);
            drop(running);
            reply.send(JobEvent::Snapshot { root, result });
        });
        true
    }

    /// Next finished job, without blocking.
    pub fn try_next(&mut self) -> Option<JobEvent> {
        match self.rx.try_recv() {
            Ok(event) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(event)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Next finished job, blocking while any is still running.
    pub fn next_blocking(&mut self) -> Option<JobEvent> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.rx.recv().ok()?;
        self.in_flight -= 1;
        Some(event)
    }
}
