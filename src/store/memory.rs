//! `memory` store: drafts live in process memory and vanish on exit.
//!
//! Expiry is measured on the tokio clock so paused-time tests can step past
//! the TTL without sleeping.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::{draft_key, DraftStore};
use crate::error::AppError;
use crate::launch::draft::DraftRecord;

struct Entry {
    record: DraftRecord,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryDraftStore {
    data: Mutex<HashMap<String, Entry>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, AppError> {
        self.data
            .lock()
            .map_err(|_| AppError::Store("memory store lock poisoned".into()))
    }
}

impl DraftStore for MemoryDraftStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    fn load(&self, agent_id: &str, user_id: &str) -> Result<Option<DraftRecord>, AppError> {
        let key = draft_key(agent_id, user_id);
        let mut data = self.lock()?;
        match data.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.record.clone())),
            Some(_) => {
                data.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(
        &self,
        agent_id: &str,
        user_id: &str,
        record: &DraftRecord,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let now = Instant::now();
        let mut data = self.lock()?;
        let before = data.len();
        data.retain(|_, entry| entry.expires_at > now);
        if data.len() != before {
            debug!(pruned = before - data.len(), "dropped expired drafts");
        }
        data.insert(draft_key(agent_id, user_id), Entry { record: record.clone(), expires_at: now + ttl });
        Ok(())
    }

    fn delete(&self, agent_id: &str, user_id: &str) -> Result<bool, AppError> {
        Ok(self.lock()?.remove(&draft_key(agent_id, user_id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn named(name: &str) -> DraftRecord {
        DraftRecord { name: Some(name.into()), ..Default::default() }
    }

    #[test]
    fn set_get_delete() {
        let store = MemoryDraftStore::new();
        assert!(store.get("a", "u").is_untouched());

        store.set("a", "u", &named("One"), WEEK).unwrap();
        assert_eq!(store.get("a", "u").name.as_deref(), Some("One"));

        store.set("a", "u", &named("Two"), WEEK).unwrap();
        assert_eq!(store.get("a", "u").name.as_deref(), Some("Two"));

        assert!(store.delete("a", "u").unwrap());
        assert!(store.get("a", "u").is_untouched());
        assert!(!store.delete("a", "u").unwrap());
    }

    #[test]
    fn users_and_agents_are_independent() {
        let store = MemoryDraftStore::new();
        store.set("a", "u1", &named("U1"), WEEK).unwrap();
        store.set("a", "u2", &named("U2"), WEEK).unwrap();
        store.set("b", "u1", &named("B"), WEEK).unwrap();

        assert_eq!(store.get("a", "u1").name.as_deref(), Some("U1"));
        assert_eq!(store.get("a", "u2").name.as_deref(), Some("U2"));
        assert_eq!(store.get("b", "u1").name.as_deref(), Some("B"));
    }

    #[tokio::test(start_paused = true)]
    async fn record_expires_after_ttl() {
        let store = MemoryDraftStore::new();
        store.set("a", "u", &named("Keep"), WEEK).unwrap();

        tokio::time::advance(WEEK - Duration::from_secs(1)).await;
        assert_eq!(store.get("a", "u").name.as_deref(), Some("Keep"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("a", "u").is_untouched());
    }

    #[tokio::test(start_paused = true)]
    async fn set_prunes_abandoned_drafts() {
        let store = MemoryDraftStore::new();
        for i in 0..1000 {
            store.set("a", &format!("old{i}"), &named("x"), Duration::from_secs(10)).unwrap();
        }
        tokio::time::advance(Duration::from_secs(3600)).await;
        for i in 0..10 {
            store.set("a", &format!("new{i}"), &named("y"), WEEK).unwrap();
        }
        assert_eq!(store.data.lock().unwrap().len(), 10);
        assert_eq!(store.get("a", "new3").name.as_deref(), Some("y"));
    }

    #[tokio::test(start_paused = true)]
    async fn set_refreshes_expiry() {
        let store = MemoryDraftStore::new();
        let ttl = Duration::from_secs(100);
        store.set("a", "u", &named("x"), ttl).unwrap();
        tokio::time::advance(Duration::from_secs(90)).await;
        store.set("a", "u", &named("y"), ttl).unwrap();
        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(store.get("a", "u").name.as_deref(), Some("y"));
    }
}
