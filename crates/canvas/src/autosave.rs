//! Debounced graph persistence.
//!
//! Edits submit full snapshots; any snapshot arriving within the debounce
//! window replaces the pending one, so at most one write lands per idle
//! window and the last edit of a burst is the one persisted.

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use serde_json::Value;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SavePayload {
    pub project_id: String,
    pub nodes: Value,
    pub edges: Value,
}

enum SaveMsg {
    Snapshot(SavePayload),
    Shutdown,
}

/// Owned handle to the autosave worker. Dropping it flushes any pending
/// snapshot before the worker exits.
pub struct AutosaveHandle {
    tx: Sender<SaveMsg>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AutosaveHandle {
    /// Spawn a worker that persists snapshots into the registry database at
    /// `db_path`. The worker opens its own connection.
    pub fn spawn(db_path: PathBuf, window: Duration) -> Self {
        Self::spawn_with(window, move |payload: SavePayload| {
            let db = match project::RegistryDb::open_or_create(&db_path) {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!(%err, "autosave: registry open failed");
                    return;
                }
            };
            if let Err(err) = db.put_graph(&payload.project_id, &payload.nodes, &payload.edges) {
                tracing::error!(%err, project = %payload.project_id, "autosave failed");
            }
        })
    }

    /// Spawn with a custom persist function. Used by tests and by callers
    /// that already own a store.
    pub fn spawn_with<F>(window: Duration, mut persist: F) -> Self
    where
        F: FnMut(SavePayload) + Send + 'static,
    {
        let (tx, rx) = unbounded::<SaveMsg>();
        let worker = thread::spawn(move || {
            let mut pending: Option<SavePayload> = None;
            loop {
                let msg = if pending.is_some() {
                    match rx.recv_timeout(window) {
                        Ok(msg) => msg,
                        Err(RecvTimeoutError::Timeout) => {
                            if let Some(payload) = pending.take() {
                                persist(payload);
                            }
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                } else {
                    match rx.recv() {
                        Ok(msg) => msg,
                        Err(_) => break,
                    }
                };
                match msg {
                    // A newer snapshot cancels the pending one and restarts
                    // the window.
                    SaveMsg::Snapshot(payload) => pending = Some(payload),
                    SaveMsg::Shutdown => break,
                }
            }
            // Last edit of a burst must land even on shutdown.
            if let Some(payload) = pending {
                persist(payload);
            }
        });
        Self { tx, worker: Some(worker) }
    }

    pub fn submit(&self, payload: SavePayload) {
        let _ = self.tx.send(SaveMsg::Snapshot(payload));
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(SaveMsg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    fn payload(tag: &str) -> SavePayload {
        SavePayload {
            project_id: "p1".into(),
            nodes: json!([{ "tag": tag }]),
            edges: json!([]),
        }
    }

    #[test]
    fn burst_collapses_to_last_snapshot() {
        let saved: Arc<Mutex<Vec<SavePayload>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = saved.clone();
        let handle = AutosaveHandle::spawn_with(Duration::from_millis(40), move |p| {
            sink.lock().push(p);
        });

        handle.submit(payload("first"));
        handle.submit(payload("second"));
        handle.submit(payload("third"));
        thread::sleep(Duration::from_millis(200));

        let saved = saved.lock();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].nodes, json!([{ "tag": "third" }]));
    }

    #[test]
    fn pending_snapshot_flushes_on_drop() {
        let saved: Arc<Mutex<Vec<SavePayload>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = saved.clone();
        let handle = AutosaveHandle::spawn_with(Duration::from_secs(60), move |p| {
            sink.lock().push(p);
        });

        handle.submit(payload("only"));
        drop(handle);

        let saved = saved.lock();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].nodes, json!([{ "tag": "only" }]));
    }

    #[test]
    fn separated_edits_each_persist() {
        let saved: Arc<Mutex<Vec<SavePayload>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = saved.clone();
        let handle = AutosaveHandle::spawn_with(Duration::from_millis(30), move |p| {
            sink.lock().push(p);
        });

        handle.submit(payload("a"));
        thread::sleep(Duration::from_millis(150));
        handle.submit(payload("b"));
        thread::sleep(Duration::from_millis(150));

        assert_eq!(saved.lock().len(), 2);
    }
}
