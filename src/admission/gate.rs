//! Admission gate: the allow/deny decision on the request path.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace};

use super::bucket::BucketPolicy;
use super::registry::ClientRegistry;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// The client is out of tokens; the request should be rejected.
    Deny,
}

impl Decision {
    /// Whether this decision admits the request.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// The admission gate evaluated once per inbound request.
///
/// Holds the shared client registry and the bucket policy. Safe to share
/// across tasks; `admit` never blocks on anything but the registry's
/// in-memory lock and performs no I/O.
pub struct AdmissionGate {
    registry: Arc<ClientRegistry>,
    policy: BucketPolicy,
}

impl AdmissionGate {
    /// Create a gate over `registry` with the given bucket policy.
    pub fn new(registry: Arc<ClientRegistry>, policy: BucketPolicy) -> Self {
        Self { registry, policy }
    }

    /// Decide whether a request from `client_id` at time `now` is admitted.
    ///
    /// Looks up (or creates) the client's record, refills its bucket for the
    /// elapsed time, and consumes one token on allow. `last_seen` is updated
    /// regardless of the outcome. The caller must reject empty identifiers
    /// before reaching the gate.
    pub fn admit(&self, client_id: &str, now: Instant) -> Decision {
        debug_assert!(!client_id.is_empty(), "empty client id must be caught by the boundary");

        trace!(client = %client_id, "Checking admission");

        let allowed = self.registry.with_record(client_id, &self.policy, now, |record| {
            record.bucket.try_acquire(&self.policy, now)
        });

        if allowed {
            Decision::Allow
        } else {
            debug!(client = %client_id, "Admission denied");
            Decision::Deny
        }
    }

    /// The registry backing this gate.
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// The bucket policy applied to every client.
    pub fn policy(&self) -> &BucketPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn gate(rate: f64, capacity: f64) -> AdmissionGate {
        AdmissionGate::new(
            Arc::new(ClientRegistry::new()),
            BucketPolicy {
                refill_rate: rate,
                burst_capacity: capacity,
            },
        )
    }

    #[test]
    fn test_fresh_client_gets_full_burst() {
        let gate = gate(2.0, 4.0);
        let now = Instant::now();

        for _ in 0..4 {
            assert_eq!(gate.admit("10.0.0.1", now), Decision::Allow);
        }
        assert_eq!(gate.admit("10.0.0.1", now), Decision::Deny);
    }

    #[test]
    fn test_refill_recovery() {
        let gate = gate(2.0, 4.0);
        let start = Instant::now();

        for _ in 0..4 {
            assert_eq!(gate.admit("10.0.0.1", start), Decision::Allow);
        }
        assert_eq!(gate.admit("10.0.0.1", start), Decision::Deny);

        // 1/refill_rate seconds later exactly one token has regenerated.
        let later = start + Duration::from_millis(500);
        assert_eq!(gate.admit("10.0.0.1", later), Decision::Allow);
        assert_eq!(gate.admit("10.0.0.1", later), Decision::Deny);
    }

    #[test]
    fn test_clients_are_isolated() {
        let gate = gate(2.0, 2.0);
        let now = Instant::now();

        assert_eq!(gate.admit("10.0.0.1", now), Decision::Allow);
        assert_eq!(gate.admit("10.0.0.1", now), Decision::Allow);
        assert_eq!(gate.admit("10.0.0.1", now), Decision::Deny);

        // Exhausting one client's budget must not deny another.
        assert_eq!(gate.admit("10.0.0.2", now), Decision::Allow);
    }

    #[test]
    fn test_denied_call_updates_last_seen_only() {
        let gate = gate(2.0, 1.0);
        let now = Instant::now();

        assert_eq!(gate.admit("10.0.0.1", now), Decision::Allow);
        let drained = gate.registry().token_count("10.0.0.1").unwrap();

        assert_eq!(gate.admit("10.0.0.1", now), Decision::Deny);
        assert_eq!(gate.registry().token_count("10.0.0.1"), Some(drained));
    }

    #[tokio::test]
    async fn test_concurrent_admits_never_exceed_serial_count() {
        let gate = Arc::new(gate(2.0, 4.0));
        let now = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..64 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                gate.admit("10.0.0.1", now).is_allow()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        // All callers share one instant, so no refill occurs: a serial
        // execution admits exactly the burst capacity.
        assert_eq!(admitted, 4);
        assert_eq!(gate.registry().len(), 1);
    }
}
