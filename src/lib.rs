//! # Syslog Event Engine
//!
//! A Rust library that translates raw, already-delimited syslog
//! datagrams into structured management events, applying configurable
//! rule-based reclassification, parameter extraction, hostname/address
//! resolution, partial-timestamp reconstruction, and sensitive-data
//! redaction.
//!
//! Wire-level parsing is a collaborator concern: the embedding system
//! supplies a [`MessageParser`] that turns bytes into a
//! [`SyslogMessage`], and the engine takes it from there.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use syslog_event_engine::{Datagram, MessageConverter, TranslatorConfig};
//!
//! let config = TranslatorConfig::from_yaml(r#"
//! rules:
//!   - uei: "uei/auth/loginFailed"
//!     facilities: [auth, authpriv]
//!     match:
//!       type: substring
//!       expression: "login failed"
//! hide-rules:
//!   - match:
//!       type: substring
//!       expression: "password"
//! "#)?;
//!
//! let converter = MessageConverter::new(Arc::new(config), parser)
//!     .with_identity("00000000-0000-0000-0000-000000000000", "Default")
//!     .with_host("collector01");
//!
//! let datagram = Datagram::new(sender_addr, payload);
//! match converter.convert(&datagram) {
//!     Ok(event) => deliver(event),
//!     Err(e) if e.is_discard() => tracing::debug!(%e, "dropped"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Remote locations
//!
//! Messages from a non-default location resolve their hostname through
//! a shared [`DnsCache`] backed by an asynchronous [`DnsLookupClient`]
//! collaborator, and attribute a node id through a [`NodeIndex`]:
//!
//! ```rust,ignore
//! let dns = Arc::new(DnsCache::new(lookup_client));
//! let converter = MessageConverter::new(config, parser)
//!     .with_identity(system_id, "branch-a")
//!     .with_dns_cache(dns)
//!     .with_node_index(node_index);
//! ```
//!
//! ## Batch Processing
//!
//! ```rust,ignore
//! let results = converter.convert_batch(&datagrams);
//! let produced = results.iter().filter(|r| r.is_ok()).count();
//! println!("{produced}/{} events produced", datagrams.len());
//! ```

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod event;
pub mod message;
pub mod rules;

// Orchestrator surface
pub use convert::{
    trim_trailing_nulls, Datagram, MessageConverter, NodeIndex, DEFAULT_UEI_PREFIX, EVENT_SOURCE,
    HIDDEN_MESSAGE,
};

// Configuration and rules
pub use config::{is_default_location, TranslatorConfig, DEFAULT_LOCATION, DISCARD_UEI};
pub use rules::{ClassificationRule, HideRule, MatchSpec, ParameterAssignment};

// Core types and errors
pub use error::{Result, TranslateError};
pub use event::{Event, EventBuilder, EventParam, PartialTime};
pub use message::{Facility, MessageParser, ParseError, Severity, SyslogMessage};

// Shared caches
pub use cache::{DnsCache, DnsLookup, DnsLookupClient, HostAtLocation, PatternCache, PatternCacheStats};
