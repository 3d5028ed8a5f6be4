//! Conversion orchestration: one datagram in, zero-or-one event out.
//!
//! [`MessageConverter`] sequences the pipeline — normalize, parse,
//! enrich, classify, redact — and surfaces either one finalized
//! [`Event`] or a [`TranslateError::Discarded`] carrying the reason.
//! Conversions are independent of each other; the pattern and
//! resolution caches are the only shared state, so a converter can be
//! driven from a pool of workers or through [`convert_batch`].
//!
//! [`convert_batch`]: MessageConverter::convert_batch

mod classify;
mod enrich;
mod redact;

pub use enrich::{NodeIndex, DEFAULT_UEI_PREFIX, EVENT_SOURCE};
pub use redact::HIDDEN_MESSAGE;

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use rayon::prelude::*;

use crate::cache::{DnsCache, PatternCache};
use crate::config::{TranslatorConfig, DEFAULT_LOCATION};
use crate::error::{Result, TranslateError};
use crate::event::Event;
use crate::message::{MessageParser, ParseError};
use classify::RuleOutcome;
use enrich::EnrichContext;
use redact::HideMatcher;

/// One received datagram plus its receive-side metadata.
#[derive(Clone, Debug)]
pub struct Datagram {
    /// The remote sender's address, used as the hostname fallback.
    pub source: IpAddr,
    /// Raw payload as delivered (trailing NUL padding is tolerated).
    pub bytes: Vec<u8>,
    /// Receipt timestamp, used only as the last-resort time source.
    pub received: Option<DateTime<FixedOffset>>,
}

impl Datagram {
    pub fn new(source: IpAddr, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source,
            bytes: bytes.into(),
            received: None,
        }
    }

    pub fn with_received(mut self, received: DateTime<FixedOffset>) -> Self {
        self.received = Some(received);
        self
    }
}

/// Drop trailing NUL padding, as appended by some senders that fill
/// fixed-size datagram buffers.
pub fn trim_trailing_nulls(buffer: &[u8]) -> &[u8] {
    let mut end = buffer.len();
    while end > 0 && buffer[end - 1] == 0 {
        end -= 1;
    }
    &buffer[..end]
}

/// The conversion orchestrator.
///
/// Long-lived: construct once per deployment identity with the
/// configuration and collaborators, then call
/// [`convert`](Self::convert) per datagram from any number of workers.
pub struct MessageConverter {
    config: Arc<TranslatorConfig>,
    parser: Arc<dyn MessageParser>,
    patterns: Arc<PatternCache>,
    dns: Option<Arc<DnsCache>>,
    node_index: Option<Arc<dyn NodeIndex>>,
    hide: HideMatcher,
    system_id: String,
    location: String,
    host: String,
}

impl MessageConverter {
    pub fn new(config: Arc<TranslatorConfig>, parser: Arc<dyn MessageParser>) -> Self {
        let hide = HideMatcher::new(&config.hide_rules);
        Self {
            config,
            parser,
            patterns: Arc::new(PatternCache::new()),
            dns: None,
            node_index: None,
            hide,
            system_id: String::new(),
            location: DEFAULT_LOCATION.to_string(),
            host: "localhost".to_string(),
        }
    }

    /// Set the deployment identity stamped onto produced events and
    /// used as the resolution-cache location key.
    pub fn with_identity(
        mut self,
        system_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        self.system_id = system_id.into();
        self.location = location.into();
        self
    }

    /// Name of the processing host carried on produced events.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Share a pattern cache with other converters (or a test).
    pub fn with_pattern_cache(mut self, patterns: Arc<PatternCache>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Attach the resolution cache used for non-default locations.
    /// Without one, remote-location hostnames are left unresolved.
    pub fn with_dns_cache(mut self, dns: Arc<DnsCache>) -> Self {
        self.dns = Some(dns);
        self
    }

    /// Attach the node-location index used for node attribution.
    pub fn with_node_index(mut self, index: Arc<dyn NodeIndex>) -> Self {
        self.node_index = Some(index);
        self
    }

    pub fn pattern_cache(&self) -> &Arc<PatternCache> {
        &self.patterns
    }

    /// Convert one datagram into one event, or discard it.
    pub fn convert(&self, datagram: &Datagram) -> Result<Event> {
        let trimmed = trim_trailing_nulls(&datagram.bytes);
        let text = String::from_utf8_lossy(trimmed);

        let mut message = match self.parser.parse(trimmed) {
            Ok(message) => message,
            Err(ParseError::NoMatch) => {
                return Err(TranslateError::Discarded(format!(
                    "message does not match the parser grammar: '{text}'"
                )));
            }
            Err(ParseError::Malformed(detail)) => {
                tracing::debug!(message = %text, %detail, "unable to parse message");
                return Err(TranslateError::Discarded(format!(
                    "unable to parse message '{text}': {detail}"
                )));
            }
        };

        if message.text.is_empty() {
            return Err(TranslateError::Discarded(format!(
                "message parsed to an empty body: '{text}'"
            )));
        }

        if self.config.include_raw_message {
            message
                .parameters
                .push(("rawmessage".to_string(), text.to_string()));
        }

        // If no hostname was provided, use the sender's address.
        if message.hostname.is_none() {
            message.hostname = Some(datagram.source.to_string());
        }

        let ctx = EnrichContext {
            system_id: &self.system_id,
            location: &self.location,
            host: &self.host,
            received: datagram.received,
            dns: self.dns.as_deref(),
            node_index: self.node_index.as_deref(),
            lookup_timeout: self.config.lookup_timeout(),
        };
        let mut bldr = enrich::build_event(&message, &ctx);

        match classify::classify(
            &self.config.rules,
            &self.config.discard_uei,
            &message,
            &self.patterns,
        ) {
            RuleOutcome::Matched { uei, parameters } => {
                bldr.set_uei(uei);
                for param in parameters {
                    bldr.add_param(param.name, param.value);
                }
            }
            RuleOutcome::Discarded { reason } => {
                return Err(TranslateError::Discarded(reason));
            }
            RuleOutcome::NoMatch => {}
        }

        if !self.hide.is_empty() && self.hide.matches(&message.as_rfc3164_message(), &self.patterns)
        {
            tracing::debug!("hiding message text, it may contain sensitive data");
            bldr.set_log_message(HIDDEN_MESSAGE);
            bldr.set_param("syslogmessage", HIDDEN_MESSAGE);
        }

        Ok(bldr.build())
    }

    /// Convert a batch of datagrams on the rayon pool. Results keep
    /// the input order; no ordering is implied between the conversions
    /// themselves.
    pub fn convert_batch(&self, datagrams: &[Datagram]) -> Vec<Result<Event>> {
        datagrams
            .par_iter()
            .map(|datagram| self.convert(datagram))
            .collect()
    }
}
