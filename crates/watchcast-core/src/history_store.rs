use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use watchcast_models::SeenRecord;
use crate::error::StoreError;

/// Durable record of delivered event ids.
///
/// A record exists only for events whose delivery was confirmed. `commit` is
/// idempotent and keeps the original `recorded_at`. Callers run one cycle at a
/// time, so implementations need no locking beyond a per-write atomic commit.
pub trait HistoryStore: Send {
    fn contains(&self, event_id: &str) -> Result<bool, StoreError>;

    fn commit(&mut self, event_id: &str, recorded_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Remove every record with `recorded_at < older_than`, returning how many went
    fn prune(&mut self, older_than: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Remove a single record so its event is delivered again on the next check
    fn forget(&mut self, event_id: &str) -> Result<bool, StoreError>;

    fn records(&self) -> Result<Vec<SeenRecord>, StoreError>;
}

/// Scoped access to a store: each cycle opens its own handle and drops it when done
pub trait StoreProvider: Send + Sync {
    type Store: HistoryStore;

    fn open(&self) -> Result<Self::Store, StoreError>;

    /// Open a handle for reading only. Opening must not write anything.
    fn open_read_only(&self) -> Result<Self::Store, StoreError> {
        self.open()
    }
}

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    records: Vec<SeenRecord>,
}

/// Earlier deployments wrote a bare array of event ids
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Current(HistoryFile),
    Legacy(Vec<String>),
}

/// History store kept in a single JSON file.
///
/// The whole file is loaded on open. Every mutation rewrites it through a temp
/// file and rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    records: BTreeMap<String, DateTime<Utc>>,
}

impl JsonHistoryStore {
    /// Open the store at `path`. A missing file is an empty store. A file that
    /// cannot be parsed is an error: treating it as empty would re-deliver the
    /// whole lookback window. A legacy file is rewritten in the current format.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::load(path, true)
    }

    /// Like [`open`](Self::open), but a legacy file is converted in memory only
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        Self::load(path, false)
    }

    fn load(path: &Path, migrate: bool) -> Result<Self, StoreError> {
        let mut store = Self {
            path: path.to_path_buf(),
            records: BTreeMap::new(),
        };

        if !path.exists() {
            debug!(path = %path.display(), "History file does not exist, starting empty");
            return Ok(store);
        }

        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        if content.trim().is_empty() {
            return Ok(store);
        }

        let stored: StoredHistory = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        match stored {
            StoredHistory::Current(file) => {
                if file.version > FORMAT_VERSION {
                    return Err(StoreError::Corrupt {
                        path: path.to_path_buf(),
                        message: format!("unsupported format version {}", file.version),
                    });
                }
                for record in file.records {
                    store
                        .records
                        .entry(record.event_id)
                        .or_insert(record.recorded_at);
                }
            }
            StoredHistory::Legacy(ids) => {
                let migrated_at = Utc::now();
                for id in ids {
                    store.records.entry(id).or_insert(migrated_at);
                }
                if !migrate {
                    debug!(path = %path.display(), "Legacy history file read without migrating");
                    return Ok(store);
                }
                store.persist()?;
                info!(
                    operation = "history_migrated",
                    records = store.records.len(),
                    path = %path.display(),
                    "Migrated legacy history file"
                );
            }
        }

        debug!(records = store.records.len(), path = %path.display(), "Opened history store");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn snapshot(&self) -> Vec<SeenRecord> {
        self.records
            .iter()
            .map(|(event_id, recorded_at)| SeenRecord {
                event_id: event_id.clone(),
                recorded_at: *recorded_at,
            })
            .collect()
    }

    // Atomic write: write to temp file, then rename
    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let file = HistoryFile {
            version: FORMAT_VERSION,
            records: self.snapshot(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(|e| StoreError::io(&temp_path, e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn contains(&self, event_id: &str) -> Result<bool, StoreError> {
        Ok(self.records.contains_key(event_id))
    }

    fn commit(&mut self, event_id: &str, recorded_at: DateTime<Utc>) -> Result<(), StoreError> {
        if self.records.contains_key(event_id) {
            return Ok(());
        }

        self.records.insert(event_id.to_string(), recorded_at);
        if let Err(e) = self.persist() {
            // Memory must not claim what the disk does not hold
            self.records.remove(event_id);
            return Err(e);
        }
        Ok(())
    }

    fn prune(&mut self, older_than: DateTime<Utc>) -> Result<usize, StoreError> {
        let expired: Vec<(String, DateTime<Utc>)> = self
            .records
            .iter()
            .filter(|(_, recorded_at)| **recorded_at < older_than)
            .map(|(id, at)| (id.clone(), *at))
            .collect();

        if expired.is_empty() {
            return Ok(0);
        }

        for (id, _) in &expired {
            self.records.remove(id);
        }
        if let Err(e) = self.persist() {
            self.records.extend(expired);
            return Err(e);
        }
        Ok(expired.len())
    }

    fn forget(&mut self, event_id: &str) -> Result<bool, StoreError> {
        let Some(recorded_at) = self.records.remove(event_id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist() {
            self.records.insert(event_id.to_string(), recorded_at);
            return Err(e);
        }
        Ok(true)
    }

    fn records(&self) -> Result<Vec<SeenRecord>, StoreError> {
        Ok(self.snapshot())
    }
}

/// Opens a fresh [`JsonHistoryStore`] for every cycle
#[derive(Debug, Clone)]
pub struct JsonStoreProvider {
    path: PathBuf,
}

impl JsonStoreProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreProvider for JsonStoreProvider {
    type Store = JsonHistoryStore;

    fn open(&self) -> Result<Self::Store, StoreError> {
        JsonHistoryStore::open(&self.path)
    }

    fn open_read_only(&self) -> Result<Self::Store, StoreError> {
        JsonHistoryStore::open_read_only(&self.path)
    }
}
