//! Draft store: one [`DraftRecord`] per (agent, user) with a time-to-live.
//!
//! Stores are `Send + Sync` and use blocking calls; a turn touches the store
//! at most a handful of times, so nothing here is async. Concurrent writers
//! for the same key are last-write-wins.

pub mod file;
pub mod memory;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::config::{DraftStoreKind, DraftsConfig};
use crate::error::AppError;
use crate::launch::draft::DraftRecord;

/// Key a draft is stored under.
pub fn draft_key(agent_id: &str, user_id: &str) -> String {
    format!("{agent_id}/{user_id}/burstTokenData")
}

pub trait DraftStore: Send + Sync {
    /// Unique type name (`"memory"`, `"file"`).
    fn store_type(&self) -> &str;

    /// Fetch the live record, `None` when absent or expired.
    fn load(&self, agent_id: &str, user_id: &str) -> Result<Option<DraftRecord>, AppError>;

    /// Overwrite the record and reset its expiry to `now + ttl`.
    fn set(
        &self,
        agent_id: &str,
        user_id: &str,
        record: &DraftRecord,
        ttl: Duration,
    ) -> Result<(), AppError>;

    /// Remove the record. Returns whether one existed.
    fn delete(&self, agent_id: &str, user_id: &str) -> Result<bool, AppError>;

    /// The stored record or a fresh default. Never fails; backend errors are
    /// logged and read as absence.
    fn get(&self, agent_id: &str, user_id: &str) -> DraftRecord {
        match self.load(agent_id, user_id) {
            Ok(record) => record.unwrap_or_default(),
            Err(e) => {
                warn!(store = self.store_type(), %user_id, "draft load failed, starting fresh: {e}");
                DraftRecord::default()
            }
        }
    }
}

/// Construct the configured store.
pub fn build(config: &DraftsConfig, work_dir: &Path) -> Result<Arc<dyn DraftStore>, AppError> {
    match config.store {
        DraftStoreKind::Memory => Ok(Arc::new(memory::MemoryDraftStore::new())),
        DraftStoreKind::File => {
            let store = file::FileDraftStore::open(work_dir.join(file::FILE_NAME))?;
            Ok(Arc::new(store))
        }
    }
}
