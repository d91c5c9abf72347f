//! Session-state service: per-session maps with eviction, and per-session
//! turn locks.
//!
//! Entries are created on first write and live until `remove` or until they
//! sit idle longer than the configured TTL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::ReasonError;

#[derive(Debug)]
struct Entry<T> {
    value: T,
    touched: Instant,
}

/// Concurrency-safe map keyed by session id
#[derive(Debug)]
pub struct SessionStore<T> {
    name: &'static str,
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T: Clone> SessionStore<T> {
    /// Create an empty store; `name` shows up in lock errors
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry<T>>>, ReasonError> {
        self.entries
            .lock()
            .map_err(|e| ReasonError::Store(format!("{} lock poisoned: {}", self.name, e)))
    }

    /// Read a value, refreshing its idle timer
    pub fn get(&self, session_id: &str) -> Result<Option<T>, ReasonError> {
        let mut entries = self.lock()?;
        Ok(entries.get_mut(session_id).map(|entry| {
            entry.touched = Instant::now();
            entry.value.clone()
        }))
    }

    pub fn set(&self, session_id: &str, value: T) -> Result<(), ReasonError> {
        let mut entries = self.lock()?;
        entries.insert(
            session_id.to_string(),
            Entry {
                value,
                touched: Instant::now(),
            },
        );
        Ok(())
    }

    /// Read-modify-write under one lock. `None` in the slot means absent;
    /// leaving `None` behind removes the entry.
    pub fn update<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Option<T>) -> R,
    ) -> Result<R, ReasonError> {
        let mut entries = self.lock()?;
        let mut slot = entries.remove(session_id).map(|entry| entry.value);
        let result = f(&mut slot);
        if let Some(value) = slot {
            entries.insert(
                session_id.to_string(),
                Entry {
                    value,
                    touched: Instant::now(),
                },
            );
        }
        Ok(result)
    }

    pub fn remove(&self, session_id: &str) -> Result<Option<T>, ReasonError> {
        let mut entries = self.lock()?;
        Ok(entries.remove(session_id).map(|entry| entry.value))
    }

    /// Drop entries idle for at least `ttl`; returns how many were dropped
    pub fn evict_idle(&self, ttl: Duration) -> Result<usize, ReasonError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.touched) < ttl);
        Ok(before - entries.len())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock()
            .map(|entries| entries.contains_key(session_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One async mutex per session id.
///
/// Holding the guard for a whole turn keeps turns of the same session
/// strictly ordered; different sessions never wait on each other.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session_id`
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            // The map only holds Arcs; a poisoned guard still has a usable map.
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Forget the lock of a session nobody is holding or waiting on
    pub fn release(&self, session_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session_id);
        }
    }

    /// Drop every lock nobody is holding or waiting on
    pub fn sweep(&self) -> usize {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_remove() {
        let store: SessionStore<u32> = SessionStore::new("test");
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", 3).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(3));
        assert!(store.contains("a"));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove("a").unwrap(), Some(3));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_creates_and_removes() {
        let store: SessionStore<Vec<u32>> = SessionStore::new("test");

        let len = store
            .update("a", |slot| {
                slot.get_or_insert_with(Vec::new).push(7);
                slot.as_ref().map(|v| v.len()).unwrap_or(0)
            })
            .unwrap();
        assert_eq!(len, 1);
        assert_eq!(store.get("a").unwrap(), Some(vec![7]));

        store.update("a", |slot| *slot = None).unwrap();
        assert!(!store.contains("a"));
    }

    #[test]
    fn test_evict_idle() {
        let store: SessionStore<u32> = SessionStore::new("test");
        store.set("a", 1).unwrap();
        store.set("b", 2).unwrap();

        assert_eq!(store.evict_idle(Duration::from_secs(3600)).unwrap(), 0);
        assert_eq!(store.evict_idle(Duration::ZERO).unwrap(), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_locks_serialize_same_session() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("s1").await;

        // a different session is not blocked
        let other = locks.acquire("s2").await;
        drop(other);

        // same session is blocked while the guard lives
        let lock = locks
            .locks
            .lock()
            .unwrap()
            .get("s1")
            .cloned()
            .unwrap();
        assert!(lock.try_lock().is_err());

        drop(guard);
        assert!(lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_sweep_keeps_held_locks() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("held").await;
        drop(locks.acquire("idle").await);

        assert_eq!(locks.sweep(), 1);
        assert_eq!(locks.len(), 1);

        drop(guard);
        locks.release("held");
        assert!(locks.is_empty());
    }
}
