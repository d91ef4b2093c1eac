//! Process-wide, time-bounded token store.
//!
//! Holds both session tokens (keyed by the opaque `session_id` cookie value)
//! and privilege tokens (keyed by [`privilege_token_key`]). Each entry carries
//! its own deadline; nothing survives a restart.

use dashmap::DashMap;
use secrecy::Secret;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Key/value store with a TTL per entry.
pub trait SessionStore: Send + Sync {
    fn put(&self, key: &str, token: &str, ttl: Duration);

    /// Returns `None` for unknown and for expired keys.
    fn get(&self, key: &str) -> Option<Secret<String>>;

    fn delete(&self, key: &str);

    /// Drop every expired entry, returning how many were removed.
    fn purge_expired(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn privilege_token_key(session_id: &str, token_id: i64) -> String {
    format!("privilegeToken_{}_{}", session_id, token_id)
}

struct Entry {
    token: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, Entry>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, key: &str, token: &str, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                token: token.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn get(&self, key: &str) -> Option<Secret<String>> {
        let now = Instant::now();
        // The read guard must be dropped before removing the same key.
        let token = {
            let entry = self.entries.get(key)?;
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.token.clone())
            }
        };

        match token {
            Some(token) => Some(Secret::new(token)),
            None => {
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                None
            }
        }
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Periodically purge expired entries until the runtime shuts down.
pub fn spawn_janitor(store: Arc<dyn SessionStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // First tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = store.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = store.len(), "Purged expired sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn returns_token_until_ttl_elapses() {
        let store = MemorySessionStore::new();
        store.put("session-1", "jwt-abc", Duration::from_millis(80));

        let token = store.get("session-1").expect("token should be present");
        assert_eq!(token.expose_secret(), "jwt-abc");

        std::thread::sleep(Duration::from_millis(120));
        assert!(store.get("session-1").is_none());
        // Expired entries are dropped on read.
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn unknown_key_is_a_miss() {
        let store = MemorySessionStore::new();
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn put_overwrites_and_resets_ttl() {
        let store = MemorySessionStore::new();
        store.put("k", "first", Duration::from_millis(10));
        store.put("k", "second", Duration::from_secs(60));

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(store.get("k").unwrap().expose_secret(), "second");
    }

    #[test]
    fn delete_removes_entry() {
        let store = MemorySessionStore::new();
        store.put("k", "v", Duration::from_secs(60));
        store.delete("k");
        assert!(store.get("k").is_none());
    }

    #[test]
    fn purge_only_removes_expired() {
        let store = MemorySessionStore::new();
        store.put("short", "a", Duration::from_millis(5));
        store.put("long", "b", Duration::from_secs(60));

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("long").is_some());
    }

    #[test]
    fn privilege_key_is_scoped_to_session_and_vehicle() {
        assert_eq!(privilege_token_key("abc", 7), "privilegeToken_abc_7");
        assert_ne!(privilege_token_key("abc", 7), privilege_token_key("abc", 8));
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let store = MemorySessionStore::new();
        store.put("k", "super-secret", Duration::from_secs(60));
        let printed = format!("{:?}", store);
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn concurrent_writers_do_not_lose_entries() {
        let store = Arc::new(MemorySessionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        store.put(&format!("{}-{}", i, j), "t", Duration::from_secs(60));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 800);
    }
}
