//! Durable storage for the planner state.
//!
//! The whole [`AppState`] is one pretty-printed JSON document. Writes go
//! through a temp file and a rename so a crash never leaves a torn file.
//! [`Persister`] owns a single background thread that applies writes strictly
//! in the order they were submitted.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, mpsc},
    thread::{self, JoinHandle},
};

use tracing::{debug, error, info};

use crate::error::{PlannerError, Result};
use crate::models::AppState;

pub fn load_state(path: &Path) -> Result<AppState> {
    let text = fs::read_to_string(path)?;
    let state: AppState = serde_json::from_str(&text)?;
    Ok(state)
}

pub fn encode_state(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

pub fn save_state(path: &Path, state: &AppState) -> Result<()> {
    let text = encode_state(state)?;
    write_atomic(path, &text)
}

fn write_atomic(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    fs::write(&tmp_path, text)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

enum PersistCommand {
    Write(Arc<AppState>),
    Flush(mpsc::Sender<()>),
    Shutdown,
}

/// Serial write queue backed by one worker thread.
pub struct Persister {
    sender: mpsc::Sender<PersistCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
    path: PathBuf,
}

impl Persister {
    pub fn spawn(path: PathBuf) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<PersistCommand>();
        let path_for_thread = path.clone();

        let worker = thread::Builder::new()
            .name("planner-persist".into())
            .spawn(move || {
                while let Ok(command) = receiver.recv() {
                    match command {
                        PersistCommand::Write(state) => {
                            match save_state(&path_for_thread, &state) {
                                Ok(()) => debug!("state persisted to {}", path_for_thread.display()),
                                Err(err) => error!(
                                    "failed to persist state to {}: {err}",
                                    path_for_thread.display()
                                ),
                            }
                        }
                        PersistCommand::Flush(reply) => {
                            let _ = reply.send(());
                        }
                        PersistCommand::Shutdown => break,
                    }
                }
                info!("persistence worker shutting down");
            })?;

        Ok(Self {
            sender,
            worker: Mutex::new(Some(worker)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queues a snapshot. Returns immediately; failures are only logged.
    pub fn submit(&self, state: Arc<AppState>) {
        if self.sender.send(PersistCommand::Write(state)).is_err() {
            error!("persistence worker is gone, dropping write");
        }
    }

    /// Blocks until every write submitted before this call has been handled.
    pub fn flush(&self) -> Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.sender
            .send(PersistCommand::Flush(reply_tx))
            .map_err(|_| PlannerError::PersistenceClosed)?;
        reply_rx.recv().map_err(|_| PlannerError::PersistenceClosed)
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(PersistCommand::Shutdown) {
                error!("failed to send shutdown to persistence worker: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("failed to join persistence worker: {join_err:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut state = AppState::default();
        state.identity.display_name = "Ada".into();

        save_state(&path, &state).unwrap();
        assert_eq!(load_state(&path).unwrap(), state);
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_state(&path), Err(PlannerError::Json(_))));
        assert!(matches!(
            load_state(&dir.path().join("missing.json")),
            Err(PlannerError::Io(_))
        ));
    }

    #[test]
    fn worker_applies_writes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let persister = Persister::spawn(path.clone()).unwrap();

        for i in 0..50 {
            let mut state = AppState::default();
            state.progress.xp = i;
            persister.submit(Arc::new(state));
        }
        persister.flush().unwrap();

        assert_eq!(load_state(&path).unwrap().progress.xp, 49);
    }
}
