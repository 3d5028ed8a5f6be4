//! Hostname-resolution cache for messages from non-default locations.
//!
//! Resolution goes through an external asynchronous lookup collaborator
//! ([`DnsLookupClient`]); the cache memoizes successful resolutions per
//! (hostname, location) key and single-flights concurrent misses so the
//! collaborator sees at most one in-flight lookup per key. Failures are
//! never cached — the next request for the same key retries.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

/// Cache key: a hostname as seen at one deployment location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HostAtLocation {
    pub hostname: String,
    pub location: String,
}

/// Handle for one pending lookup. The collaborator answers from
/// wherever it runs (a worker thread, an async runtime bridge) by
/// sending on the paired channel; the converting worker blocks on
/// [`DnsLookup::wait`], bounded by the configured timeout.
#[derive(Debug)]
pub struct DnsLookup {
    rx: Receiver<Option<String>>,
}

impl DnsLookup {
    /// Create a pending lookup plus the sender used to complete it.
    pub fn channel() -> (Sender<Option<String>>, DnsLookup) {
        let (tx, rx) = bounded(1);
        (tx, DnsLookup { rx })
    }

    /// A lookup that already completed, for synchronous client
    /// implementations and tests.
    pub fn ready(result: Option<String>) -> DnsLookup {
        let (tx, lookup) = Self::channel();
        let _ = tx.send(result);
        lookup
    }

    /// Block until the collaborator answers, at most `timeout` when one
    /// is set. `Ok(None)` is a negative answer; `Err` is a timeout or
    /// an abandoned lookup (collaborator dropped the sender).
    pub fn wait(&self, timeout: Option<Duration>) -> Result<Option<String>, LookupWaitError> {
        match timeout {
            Some(timeout) => self.rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => LookupWaitError::TimedOut,
                RecvTimeoutError::Disconnected => LookupWaitError::Abandoned,
            }),
            None => self.rx.recv().map_err(|_| LookupWaitError::Abandoned),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LookupWaitError {
    #[error("lookup timed out")]
    TimedOut,
    #[error("lookup abandoned by the collaborator")]
    Abandoned,
}

/// Asynchronous hostname-resolution collaborator.
pub trait DnsLookupClient: Send + Sync {
    fn lookup(&self, hostname: &str, location: &str, system_id: &str) -> DnsLookup;
}

/// State shared between the leader performing a lookup and followers
/// that arrived while it was in flight.
#[derive(Debug, Default)]
struct Inflight {
    result: Mutex<Option<Option<IpAddr>>>,
    ready: Condvar,
}

impl Inflight {
    fn complete(&self, resolved: Option<IpAddr>) {
        *self.result.lock().unwrap() = Some(resolved);
        self.ready.notify_all();
    }

    fn wait(&self, timeout: Option<Duration>) -> Option<IpAddr> {
        let mut result = self.result.lock().unwrap();
        match timeout {
            None => {
                while result.is_none() {
                    result = self.ready.wait(result).unwrap();
                }
                result.flatten()
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while result.is_none() {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return None;
                    }
                    let (guard, _) = self.ready.wait_timeout(result, remaining).unwrap();
                    result = guard;
                }
                result.flatten()
            }
        }
    }
}

/// (hostname, location) → resolved-address cache.
///
/// Entries are populated on successful lookups only and are never
/// evicted or overwritten. A miss blocks the calling conversion on the
/// collaborator — this is the pipeline's single suspension point; with
/// no timeout configured, a hung resolver stalls the worker
/// indefinitely.
pub struct DnsCache {
    client: Arc<dyn DnsLookupClient>,
    entries: RwLock<HashMap<HostAtLocation, IpAddr>>,
    inflight: Mutex<HashMap<HostAtLocation, Arc<Inflight>>>,
}

impl DnsCache {
    pub fn new(client: Arc<dyn DnsLookupClient>) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `hostname` at `location`, consulting the cache first.
    ///
    /// On a miss, exactly one of the concurrent callers for this key
    /// invokes the collaborator; the rest wait on its result (bounded
    /// by the same timeout). Interruption, timeout and lookup failure
    /// are logged and surface as `None` without poisoning the cache.
    pub fn resolve(
        &self,
        hostname: &str,
        location: &str,
        system_id: &str,
        timeout: Option<Duration>,
    ) -> Option<IpAddr> {
        let key = HostAtLocation {
            hostname: hostname.to_string(),
            location: location.to_string(),
        };

        if let Some(addr) = self.entries.read().unwrap().get(&key) {
            return Some(*addr);
        }

        let (flight, leader) = {
            let mut inflight = self.inflight.lock().unwrap();
            match inflight.get(&key) {
                Some(flight) => (Arc::clone(flight), false),
                None => {
                    let flight = Arc::new(Inflight::default());
                    inflight.insert(key.clone(), Arc::clone(&flight));
                    (flight, true)
                }
            }
        };

        if leader {
            let resolved = self.perform_lookup(&key, system_id, timeout);
            if let Some(addr) = resolved {
                self.entries.write().unwrap().insert(key.clone(), addr);
            }
            flight.complete(resolved);
            self.inflight.lock().unwrap().remove(&key);
            resolved
        } else {
            let resolved = flight.wait(timeout);
            if resolved.is_none() {
                tracing::warn!(
                    hostname = %key.hostname,
                    location = %key.location,
                    "in-flight lookup did not resolve within the wait bound"
                );
            }
            resolved
        }
    }

    fn perform_lookup(
        &self,
        key: &HostAtLocation,
        system_id: &str,
        timeout: Option<Duration>,
    ) -> Option<IpAddr> {
        let lookup = self.client.lookup(&key.hostname, &key.location, system_id);
        match lookup.wait(timeout) {
            Ok(Some(address)) => match address.parse::<IpAddr>() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    tracing::warn!(
                        hostname = %key.hostname,
                        location = %key.location,
                        %address,
                        "lookup returned an unparseable address"
                    );
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(
                    hostname = %key.hostname,
                    location = %key.location,
                    "hostname did not resolve"
                );
                None
            }
            Err(error) => {
                tracing::warn!(
                    hostname = %key.hostname,
                    location = %key.location,
                    %error,
                    "exception while resolving hostname"
                );
                None
            }
        }
    }

    /// Number of successfully resolved entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test collaborator answering from a worker thread after an
    /// optional delay, counting invocations.
    struct ScriptedClient {
        answer: Option<String>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(answer: Option<&str>, delay: Option<Duration>) -> Self {
            Self {
                answer: answer.map(str::to_string),
                delay,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DnsLookupClient for ScriptedClient {
        fn lookup(&self, _hostname: &str, _location: &str, _system_id: &str) -> DnsLookup {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.delay {
                None => DnsLookup::ready(self.answer.clone()),
                Some(delay) => {
                    let (tx, lookup) = DnsLookup::channel();
                    let answer = self.answer.clone();
                    std::thread::spawn(move || {
                        std::thread::sleep(delay);
                        let _ = tx.send(answer);
                    });
                    lookup
                }
            }
        }
    }

    /// Collaborator that never answers but keeps the lookup alive.
    #[derive(Default)]
    struct SilentClient {
        pending: Mutex<Vec<Sender<Option<String>>>>,
    }

    impl DnsLookupClient for SilentClient {
        fn lookup(&self, _hostname: &str, _location: &str, _system_id: &str) -> DnsLookup {
            let (tx, lookup) = DnsLookup::channel();
            self.pending.lock().unwrap().push(tx);
            lookup
        }
    }

    #[test]
    fn test_hit_skips_collaborator() {
        let client = Arc::new(ScriptedClient::new(Some("192.0.2.7"), None));
        let cache = DnsCache::new(client.clone());

        let first = cache.resolve("gw01", "branch-a", "sys", None);
        let second = cache.resolve("gw01", "branch-a", "sys", None);

        assert_eq!(first, Some("192.0.2.7".parse().unwrap()));
        assert_eq!(second, first);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_lookup_retried_not_cached() {
        let client = Arc::new(ScriptedClient::new(None, None));
        let cache = DnsCache::new(client.clone());

        assert_eq!(cache.resolve("gw01", "branch-a", "sys", None), None);
        assert_eq!(cache.resolve("gw01", "branch-a", "sys", None), None);

        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unparseable_address_not_cached() {
        let client = Arc::new(ScriptedClient::new(Some("not-an-address"), None));
        let cache = DnsCache::new(client.clone());

        assert_eq!(cache.resolve("gw01", "branch-a", "sys", None), None);
        assert!(cache.is_empty());
        assert_eq!(cache.resolve("gw01", "branch-a", "sys", None), None);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_distinct_locations_are_distinct_keys() {
        let client = Arc::new(ScriptedClient::new(Some("192.0.2.7"), None));
        let cache = DnsCache::new(client.clone());

        cache.resolve("gw01", "branch-a", "sys", None);
        cache.resolve("gw01", "branch-b", "sys", None);

        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_misses_single_flight() {
        let client = Arc::new(ScriptedClient::new(
            Some("192.0.2.7"),
            Some(Duration::from_millis(100)),
        ));
        let cache = Arc::new(DnsCache::new(client.clone()));

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let cache = Arc::clone(&cache);
                    scope.spawn(move || cache.resolve("gw01", "branch-a", "sys", None))
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), Some("192.0.2.7".parse().unwrap()));
            }
        });

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bounded_wait_times_out() {
        let client = Arc::new(SilentClient::default());
        let cache = DnsCache::new(client);

        let started = Instant::now();
        let resolved = cache.resolve(
            "gw01",
            "branch-a",
            "sys",
            Some(Duration::from_millis(50)),
        );
        assert_eq!(resolved, None);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(cache.is_empty());
    }
}
