//! Compile-once cache for configured regular expressions.
//!
//! Rule and hide-rule expressions come from configuration and repeat
//! for every message, so each distinct expression is compiled exactly
//! once and memoized for the life of the cache. An expression with
//! invalid syntax is memoized too, as a non-matching sentinel: the
//! compilation warning is logged once and repeated use never
//! re-attempts compilation. Keys never expire.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use regex::{Regex, RegexBuilder};

/// Thread-safe expression-string → compiled-pattern cache.
///
/// Each entry is a per-key once-cell behind a short-lived map lock:
/// concurrent requests for the same expression fan in on one
/// compilation, and compiling one key never blocks lookups of other
/// keys. All patterns compile with multi-line semantics.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: RwLock<HashMap<String, Arc<OnceLock<Option<Arc<Regex>>>>>>,
    lookups: AtomicUsize,
    hits: AtomicUsize,
    compilations: AtomicUsize,
    failures: AtomicUsize,
}

/// Point-in-time counters for monitoring and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternCacheStats {
    /// Total pattern requests.
    pub lookups: usize,
    /// Requests answered from an already-populated entry.
    pub hits: usize,
    /// Compilation attempts (at most one per distinct expression).
    pub compilations: usize,
    /// Compilation attempts that failed and were cached as sentinels.
    pub failures: usize,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or compile the pattern for `expression`.
    ///
    /// Returns `None` for an expression with invalid regex syntax; the
    /// sentinel is cached, so the warning below fires once per distinct
    /// malformed expression.
    pub fn pattern(&self, expression: &str) -> Option<Arc<Regex>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let cell = {
            let patterns = self.patterns.read().unwrap();
            patterns.get(expression).cloned()
        };
        let cell = match cell {
            Some(cell) => cell,
            None => {
                let mut patterns = self.patterns.write().unwrap();
                patterns.entry(expression.to_string()).or_default().clone()
            }
        };

        if cell.get().is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        // The map lock is released here; get_or_init serializes callers
        // of this key only.
        cell.get_or_init(|| {
            self.compilations.fetch_add(1, Ordering::Relaxed);
            match RegexBuilder::new(expression).multi_line(true).build() {
                Ok(pattern) => Some(Arc::new(pattern)),
                Err(error) => {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%expression, %error, "failed to compile regex pattern");
                    None
                }
            }
        })
        .clone()
    }

    pub fn stats(&self) -> PatternCacheStats {
        PatternCacheStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            compilations: self.compilations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Number of distinct expressions seen, sentinels included.
    pub fn len(&self) -> usize {
        self.patterns.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_once_then_hit() {
        let cache = PatternCache::new();

        let first = cache.pattern("fail(ed)?").unwrap();
        let stats = cache.stats();
        assert_eq!(stats.lookups, 1);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.compilations, 1);

        let second = cache.pattern("fail(ed)?").unwrap();
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.compilations, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_malformed_expression_cached_as_sentinel() {
        let cache = PatternCache::new();

        assert!(cache.pattern("([unclosed").is_none());
        assert!(cache.pattern("([unclosed").is_none());

        let stats = cache.stats();
        assert_eq!(stats.compilations, 1, "compilation attempted only once");
        assert_eq!(stats.failures, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_multiline_semantics() {
        let cache = PatternCache::new();
        let pattern = cache.pattern("^line2$").unwrap();
        assert!(pattern.is_match("line1\nline2"));
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let cache = PatternCache::new();
        assert!(cache.pattern("([bad").is_none());
        assert!(cache.pattern("good").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_requests_compile_once() {
        let cache = Arc::new(PatternCache::new());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let cache = Arc::clone(&cache);
                scope.spawn(move || {
                    for _ in 0..100 {
                        assert!(cache.pattern(r"disk (\S+) at (\d+)%").is_some());
                    }
                });
            }
        });

        let stats = cache.stats();
        assert_eq!(stats.compilations, 1);
        assert_eq!(stats.lookups, 800);
    }
}
