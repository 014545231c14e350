//! `file` store: all drafts in one JSON document under the work dir.
//!
//! - `drafts.json`: `{ "entries": { "<agent>/<user>/burstTokenData": { "record": {...}, "expiresAt": "..." } } }`
//!
//! Every write rewrites the whole file and drops expired entries; an
//! unparseable file is moved aside first. Reads treat an expired entry as
//! absent without touching disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{draft_key, DraftStore};
use crate::error::AppError;
use crate::launch::draft::DraftRecord;

pub const FILE_NAME: &str = "drafts.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct DraftsFile {
    #[serde(default)]
    entries: BTreeMap<String, StoredDraft>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDraft {
    record: DraftRecord,
    expires_at: DateTime<Utc>,
}

pub struct FileDraftStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileDraftStore {
    /// Open (and create if needed) the drafts file at `path`.
    pub fn open(path: PathBuf) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Store(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let store = Self { path, guard: Mutex::new(()) };
        if !store.path.exists() {
            store.write(&DraftsFile::default())?;
        }
        Ok(store)
    }

    fn read_raw(&self) -> Result<Option<String>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Store(format!("cannot read {}: {e}", self.path.display()))),
        }
    }

    fn read(&self) -> Result<DraftsFile, AppError> {
        match self.read_raw()? {
            None => Ok(DraftsFile::default()),
            Some(data) => serde_json::from_str(&data)
                .map_err(|e| AppError::Store(format!("parse {}: {e}", self.path.display()))),
        }
    }

    /// Read for a write. An unparseable file is moved aside so the store
    /// keeps working from an empty document.
    fn read_for_update(&self) -> Result<DraftsFile, AppError> {
        let Some(data) = self.read_raw()? else {
            return Ok(DraftsFile::default());
        };
        match serde_json::from_str(&data) {
            Ok(file) => Ok(file),
            Err(e) => {
                let aside = self
                    .path
                    .with_extension(format!("json.corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S")));
                fs::rename(&self.path, &aside).map_err(|re| {
                    AppError::Store(format!("cannot move corrupt {} aside: {re}", self.path.display()))
                })?;
                warn!(path = %self.path.display(), moved_to = %aside.display(), "corrupt drafts file: {e}");
                Ok(DraftsFile::default())
            }
        }
    }

    fn write(&self, file: &DraftsFile) -> Result<(), AppError> {
        let data = serde_json::to_string_pretty(file)
            .map_err(|e| AppError::Store(format!("serialise drafts: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)
            .map_err(|e| AppError::Store(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| AppError::Store(format!("cannot replace {}: {e}", self.path.display())))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, AppError> {
        self.guard
            .lock()
            .map_err(|_| AppError::Store("file store lock poisoned".into()))
    }
}

impl DraftStore for FileDraftStore {
    fn store_type(&self) -> &str {
        "file"
    }

    fn load(&self, agent_id: &str, user_id: &str) -> Result<Option<DraftRecord>, AppError> {
        let _held = self.lock()?;
        let file = self.read()?;
        let now = Utc::now();
        Ok(file
            .entries
            .get(&draft_key(agent_id, user_id))
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.record.clone()))
    }

    fn set(
        &self,
        agent_id: &str,
        user_id: &str,
        record: &DraftRecord,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|e| AppError::Store(format!("ttl out of range: {e}")))?;
        let _held = self.lock()?;
        let mut file = self.read_for_update()?;
        let now = Utc::now();

        let before = file.entries.len();
        file.entries.retain(|_, stored| stored.expires_at > now);
        if file.entries.len() != before {
            debug!(pruned = before - file.entries.len(), "dropped expired drafts");
        }

        file.entries.insert(
            draft_key(agent_id, user_id),
            StoredDraft { record: record.clone(), expires_at: now + ttl },
        );
        self.write(&file)
    }

    fn delete(&self, agent_id: &str, user_id: &str) -> Result<bool, AppError> {
        let _held = self.lock()?;
        let mut file = self.read_for_update()?;
        let existed = file.entries.remove(&draft_key(agent_id, user_id)).is_some();
        if existed {
            self.write(&file)?;
        }
        Ok(existed)
    }
}
