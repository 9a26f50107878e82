use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::errors::{FrameError, Result};

/// Backing key-value store. Values that are missing or of the wrong type read
/// as "not set".
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    fn remove(&self, key: &str);

    /// Applies several changes as one write. `None` removes the key.
    fn set_many(&self, entries: Vec<(String, Option<Value>)>) {
        for (key, value) in entries {
            match value {
                Some(value) => self.set(&key, value),
                None => self.remove(&key),
            }
        }
    }

    /// Blocks until every earlier write has reached the backing medium.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn set_string(&self, key: &str, value: &str) {
        self.set(key, Value::String(value.to_string()));
    }

    fn get_float(&self, key: &str) -> Option<f32> {
        self.get(key)?.as_f64().map(|v| v as f32)
    }

    fn set_float(&self, key: &str, value: f32) {
        match float_value(value) {
            Some(value) => self.set(key, value),
            None => self.remove(key),
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.set(key, Value::Bool(value));
    }
}

/// NaN and infinities have no JSON form.
pub fn float_value(value: f32) -> Option<Value> {
    serde_json::Number::from_f64(f64::from(value)).map(Value::Number)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Volatile store, used in tests and when no data directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        lock(&self.values).insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        lock(&self.values).remove(key);
    }
}

enum WriterMessage {
    Save(BTreeMap<String, Value>),
    Flush(Sender<Result<()>>),
}

/// A JSON object on disk. Reads are served from memory; every change hands a
/// snapshot to a writer thread so callers never block on I/O.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, Value>>,
    writer: Mutex<Option<Sender<WriterMessage>>>,
    handle: Option<JoinHandle<()>>,
}

impl JsonFileStore {
    /// Opens `state.json` in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dirs = crate::settings::project_dirs().ok_or_else(|| FrameError::StoreError {
            message: "no data directory available".to_string(),
        })?;
        Self::open(&dirs.data_dir().join("state.json"))
    }

    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let values = read_values(path);
        tracing::debug!(path = %path.display(), keys = values.len(), "opened state store");

        let (tx, rx) = mpsc::channel::<WriterMessage>();
        let target = path.to_path_buf();
        let handle = thread::Builder::new()
            .name("store-writer".to_string())
            .spawn(move || {
                let mut last_error: Option<String> = None;
                while let Ok(first) = rx.recv() {
                    // Only the newest queued snapshot needs to reach the disk
                    let mut latest = None;
                    for message in std::iter::once(first).chain(rx.try_iter()) {
                        match message {
                            WriterMessage::Save(snapshot) => latest = Some(snapshot),
                            WriterMessage::Flush(ack) => {
                                if let Some(snapshot) = latest.take() {
                                    last_error = persist(&target, &snapshot);
                                }
                                let result = match last_error.take() {
                                    Some(message) => Err(FrameError::StoreError { message }),
                                    None => Ok(()),
                                };
                                let _ = ack.send(result);
                            }
                        }
                    }
                    if let Some(snapshot) = latest {
                        last_error = persist(&target, &snapshot);
                    }
                }
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            values: Mutex::new(values),
            writer: Mutex::new(Some(tx)),
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn schedule_write(&self, snapshot: BTreeMap<String, Value>) {
        if let Some(tx) = lock(&self.writer).as_ref() {
            if tx.send(WriterMessage::Save(snapshot)).is_err() {
                tracing::warn!("state writer is gone, change not persisted");
            }
        }
    }

    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, Value>)) {
        // Queue while still holding the values so snapshots arrive in order
        let mut values = lock(&self.values);
        change(&mut values);
        self.schedule_write(values.clone());
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.update(|values| {
            values.insert(key.to_string(), value);
        });
    }

    fn remove(&self, key: &str) {
        self.update(|values| {
            values.remove(key);
        });
    }

    fn set_many(&self, entries: Vec<(String, Option<Value>)>) {
        self.update(|values| {
            for (key, value) in entries {
                match value {
                    Some(value) => values.insert(key, value),
                    None => values.remove(&key),
                };
            }
        });
    }

    fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        {
            let writer = lock(&self.writer);
            let tx = writer.as_ref().ok_or(FrameError::Cancelled)?;
            tx.send(WriterMessage::Flush(ack_tx)).map_err(|_| FrameError::StoreError {
                message: "state writer stopped".to_string(),
            })?;
        }
        ack_rx.recv().map_err(|_| FrameError::StoreError {
            message: "state writer stopped".to_string(),
        })?
    }
}

impl Drop for JsonFileStore {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain and exit
        lock(&self.writer).take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn read_values(path: &Path) -> BTreeMap<String, Value> {
    if !path.exists() {
        return BTreeMap::new();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(FrameError::from)
        .and_then(|content| serde_json::from_str(&content).map_err(FrameError::from));
    match parsed {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "state file unreadable, starting empty");
            BTreeMap::new()
        }
    }
}

fn persist(path: &Path, values: &BTreeMap<String, Value>) -> Option<String> {
    let result = write_values(path, values);
    if let Err(e) = &result {
        tracing::warn!(path = %path.display(), error = %e, "failed to write state");
    }
    result.err().map(|e| e.to_string())
}

fn write_values(path: &Path, values: &BTreeMap<String, Value>) -> Result<()> {
    let content = serde_json::to_string_pretty(values)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_typed_access_on_memory_store() {
        let store = MemoryStore::new();
        store.set_string("name", "frame");
        store.set_float("level", 0.25);
        store.set_bool("flag", true);

        assert_eq!(store.get_string("name").as_deref(), Some("frame"));
        assert_eq!(store.get_float("level"), Some(0.25));
        assert_eq!(store.get_bool("flag"), Some(true));

        // Wrong type reads as missing
        assert_eq!(store.get_bool("name"), None);
        assert_eq!(store.get_string("level"), None);
        assert_eq!(store.get_float("missing"), None);

        store.remove("name");
        assert_eq!(store.get_string("name"), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_non_finite_float_is_not_stored() {
        let store = MemoryStore::new();
        store.set_float("x", 1.0);
        store.set_float("x", f32::NAN);
        assert_eq!(store.get_float("x"), None);
    }

    #[test]
    fn test_json_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set_string("last_uri", "/photos/a.jpg");
            store.set_float("brightness_level_a", 0.6);
            store.flush().unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_string("last_uri").as_deref(), Some("/photos/a.jpg"));
        assert_eq!(store.get_float("brightness_level_a"), Some(0.6));
    }

    #[test]
    fn test_drop_drains_pending_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            for i in 0..20 {
                store.set_float("counter", i as f32);
            }
        }
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_float("counter"), Some(19.0));
    }

    #[test]
    fn test_set_many_applies_sets_and_removals() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set_float("stale", 1.0);
            store.set_many(vec![
                ("x".to_string(), float_value(-40.0)),
                ("scale".to_string(), float_value(2.5)),
                ("stale".to_string(), float_value(f32::INFINITY)),
            ]);
            store.flush().unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_float("x"), Some(-40.0));
        assert_eq!(store.get_float("scale"), Some(2.5));
        assert_eq!(store.get_float("stale"), None);
    }

    #[test]
    fn test_concurrent_setters_keep_latest_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let store = std::sync::Arc::new(JsonFileStore::open(&path).unwrap());
            let workers: Vec<_> = ["left", "right"]
                .into_iter()
                .map(|key| {
                    let store = std::sync::Arc::clone(&store);
                    thread::spawn(move || {
                        for i in 0..50 {
                            store.set_float(key, i as f32);
                        }
                    })
                })
                .collect();
            for worker in workers {
                worker.join().unwrap();
            }
            store.flush().unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_float("left"), Some(49.0));
        assert_eq!(store.get_float("right"), Some(49.0));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_string("anything"), None);
    }
}
