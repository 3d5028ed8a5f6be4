//! Shared caches used across concurrent conversions.
//!
//! The pattern cache and the resolution cache are the only state shared
//! between conversions. Both are long-lived service objects constructed
//! explicitly and passed to the converter, so tests can run with fresh
//! caches instead of ambient global state.

pub mod dns;
pub mod pattern;

pub use dns::{DnsCache, DnsLookup, DnsLookupClient, HostAtLocation};
pub use pattern::{PatternCache, PatternCacheStats};
