//! Concurrent per-client state registry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::bucket::{BucketPolicy, TokenBucket};

/// State tracked for one client identifier.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    /// The client's token bucket.
    pub bucket: TokenBucket,
    /// Timestamp of the most recent request attributed to this client.
    /// Monotonically non-decreasing while the record exists.
    pub last_seen: Instant,
}

/// The mapping from client identifier to tracked state.
///
/// A single mutex guards the whole map and every record's fields, so an
/// admission check and an eviction sweep are mutually exclusive per access:
/// a record is either fully present and consistent or fully absent. The lock
/// is only ever held across one lookup+mutate, never across I/O or an await
/// point.
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, ClientRecord>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Look up `client_id`, creating a fresh full-bucket record on first
    /// sight, and apply `f` to it under the lock. `last_seen` is advanced to
    /// `now` regardless of what `f` decides.
    pub fn with_record<F, T>(&self, client_id: &str, policy: &BucketPolicy, now: Instant, f: F) -> T
    where
        F: FnOnce(&mut ClientRecord) -> T,
    {
        let mut clients = self.clients.lock();
        // Probe before insert so the steady state allocates nothing; the key
        // is only cloned to a String on first sight.
        if !clients.contains_key(client_id) {
            debug!(client = %client_id, "Tracking new client");
            clients.insert(
                client_id.to_string(),
                ClientRecord {
                    bucket: TokenBucket::new(policy, now),
                    last_seen: now,
                },
            );
        }
        let record = clients
            .get_mut(client_id)
            .expect("record present, inserted above under the same lock");

        if now > record.last_seen {
            record.last_seen = now;
        }
        f(record)
    }

    /// Remove every record idle for longer than `idle_timeout`.
    ///
    /// Total over the registry state; safe to call on an empty or
    /// concurrently shrinking map. Returns the number of evicted records.
    pub fn sweep(&self, now: Instant, idle_timeout: Duration) -> usize {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|_, record| now.saturating_duration_since(record.last_seen) <= idle_timeout);
        let evicted = before - clients.len();

        if evicted > 0 {
            debug!(evicted, remaining = clients.len(), "Evicted idle clients");
        }
        evicted
    }

    /// Get the number of tracked clients.
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    /// Whether no clients are currently tracked.
    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// Whether a record exists for `client_id`.
    pub fn contains(&self, client_id: &str) -> bool {
        self.clients.lock().contains_key(client_id)
    }

    /// Get the current token count for `client_id`, if tracked.
    ///
    /// Returns `None` for unknown clients. Primarily useful for testing.
    pub fn token_count(&self, client_id: &str) -> Option<f64> {
        self.clients
            .lock()
            .get(client_id)
            .map(|record| record.bucket.tokens())
    }

    /// Clear all records.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.clients.lock().clear();
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_starts_empty() {
        let registry = ClientRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_first_sight_creates_full_bucket() {
        let registry = ClientRegistry::new();
        let policy = BucketPolicy::default();
        let now = Instant::now();

        let tokens = registry.with_record("10.0.0.1", &policy, now, |r| r.bucket.tokens());

        assert_eq!(tokens, policy.burst_capacity);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("10.0.0.1"));
    }

    #[test]
    fn test_last_seen_is_non_decreasing() {
        let registry = ClientRegistry::new();
        let policy = BucketPolicy::default();
        let start = Instant::now();
        let later = start + Duration::from_secs(1);

        registry.with_record("10.0.0.1", &policy, later, |_| ());
        // A stale timestamp must not move last_seen backwards.
        let last_seen = registry.with_record("10.0.0.1", &policy, start, |r| r.last_seen);

        assert_eq!(last_seen, later);
    }

    #[test]
    fn test_sweep_removes_only_idle_records() {
        let registry = ClientRegistry::new();
        let policy = BucketPolicy::default();
        let start = Instant::now();

        registry.with_record("idle", &policy, start, |_| ());
        registry.with_record("active", &policy, start + Duration::from_secs(170), |_| ());

        let evicted = registry.sweep(start + Duration::from_secs(200), Duration::from_secs(180));

        assert_eq!(evicted, 1);
        assert!(!registry.contains("idle"));
        assert!(registry.contains("active"));
    }

    #[test]
    fn test_sweep_on_empty_registry() {
        let registry = ClientRegistry::new();
        assert_eq!(registry.sweep(Instant::now(), Duration::from_secs(180)), 0);
    }

    #[test]
    fn test_evicted_client_returns_fresh() {
        let registry = ClientRegistry::new();
        let policy = BucketPolicy::default();
        let start = Instant::now();

        // Drain the client completely.
        registry.with_record("10.0.0.1", &policy, start, |r| {
            while r.bucket.try_acquire(&policy, start) {}
        });
        assert_eq!(registry.token_count("10.0.0.1"), Some(0.0));

        registry.sweep(start + Duration::from_secs(300), Duration::from_secs(180));
        assert!(!registry.contains("10.0.0.1"));

        // Re-entry is indistinguishable from a first-time client.
        let now = start + Duration::from_secs(300);
        let allowed = registry.with_record("10.0.0.1", &policy, now, |r| {
            r.bucket.try_acquire(&policy, now)
        });
        assert!(allowed);
        assert_eq!(
            registry.token_count("10.0.0.1"),
            Some(policy.burst_capacity - 1.0)
        );
    }

    #[test]
    fn test_clear() {
        let registry = ClientRegistry::new();
        let policy = BucketPolicy::default();

        registry.with_record("10.0.0.1", &policy, Instant::now(), |_| ());
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
    }
}
