//! Baseline event enrichment: parsed message → event draft.
//!
//! Enrichment produces the default-classified draft before any rule
//! runs: identity fields, the structured parameter set, host-address
//! resolution with node attribution, and timestamp reconstruction.

use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::cache::DnsCache;
use crate::config::is_default_location;
use crate::event::EventBuilder;
use crate::message::{rfc3164_timestamp, SyslogMessage};

/// Source tag carried by every produced event.
pub const EVENT_SOURCE: &str = "syslogd";

/// Prefix of the facility/severity-derived default UEI.
pub const DEFAULT_UEI_PREFIX: &str = "uei/syslogd/";

/// Node-location index collaborator: maps a resolved interface address
/// within a location to at most one node id.
pub trait NodeIndex: Send + Sync {
    fn first_node_id(&self, location: &str, addr: IpAddr) -> Option<u64>;
}

/// Deployment identity and collaborators threaded through enrichment.
pub(crate) struct EnrichContext<'a> {
    pub system_id: &'a str,
    pub location: &'a str,
    pub host: &'a str,
    pub received: Option<DateTime<FixedOffset>>,
    pub dns: Option<&'a DnsCache>,
    pub node_index: Option<&'a dyn NodeIndex>,
    pub lookup_timeout: Option<Duration>,
}

/// Build the baseline draft for `message`.
///
/// The parameter list is ordered: `hostname`, every message-supplied
/// parameter verbatim, then `syslogmessage`, `severity`, `timestamp`
/// (canonical RFC 3164 re-rendering of the current event time),
/// `messageid`, `process`, `service`, `processid` — optional ones only
/// when the message carries them.
pub(crate) fn build_event(message: &SyslogMessage, ctx: &EnrichContext<'_>) -> EventBuilder {
    let facility_txt = message.facility.as_str();
    let severity_txt = message.severity.as_str();

    let mut bldr = EventBuilder::new(
        format!("{DEFAULT_UEI_PREFIX}{facility_txt}/{severity_txt}"),
        EVENT_SOURCE,
    );
    bldr.set_system_id(ctx.system_id);
    bldr.set_host(ctx.host);

    bldr.add_param("hostname", message.hostname.clone().unwrap_or_default());
    for (name, value) in &message.parameters {
        bldr.add_param(name.clone(), value.clone());
    }

    if let Some(addr) = resolve_host_address(message, ctx) {
        if let Some(index) = ctx.node_index {
            if let Some(node_id) = index.first_node_id(ctx.location, addr) {
                bldr.set_node_id(node_id);
            }
        }
        bldr.set_interface(addr);
    }

    if let Some(ts) = message.timestamp {
        // The message has a complete timestamp; it wins outright.
        bldr.set_time(ts);
    } else {
        let mut did_set_partial_date = false;

        if let Some(year) = message.year {
            bldr.set_year(year);
            did_set_partial_date = true;
        }
        if let Some(month) = message.month {
            bldr.set_month(month);
            did_set_partial_date = true;
        }
        if let Some(day) = message.day {
            bldr.set_day_of_month(day);
            did_set_partial_date = true;
        }
        if let Some(hour) = message.hour {
            bldr.set_hour_of_day(hour);
            did_set_partial_date = true;
        }
        if let Some(minute) = message.minute {
            bldr.set_minute(minute);
            did_set_partial_date = true;
        }
        if let Some(second) = message.second {
            bldr.set_second(second);
            did_set_partial_date = true;
        }
        if let Some(millisecond) = message.millisecond {
            bldr.set_millisecond(millisecond);
            did_set_partial_date = true;
        }
        if let Some(zone) = message.zone {
            bldr.set_zone(zone);
            did_set_partial_date = true;
        }

        if !did_set_partial_date {
            // No date information at all on the message; fall back to
            // the externally supplied receipt timestamp when present.
            if let Some(received) = ctx.received {
                bldr.set_time(received);
            }
        }
    }

    bldr.set_log_message(message.text.clone());
    bldr.add_param("syslogmessage", message.text.clone());
    bldr.add_param("severity", severity_txt);
    bldr.add_param("timestamp", rfc3164_timestamp(&bldr.current_event_time()));
    if let Some(message_id) = &message.message_id {
        bldr.add_param("messageid", message_id.clone());
    }
    if let Some(process) = &message.process_name {
        bldr.add_param("process", process.clone());
    }
    bldr.add_param("service", facility_txt);
    if let Some(pid) = message.process_id {
        bldr.add_param("processid", pid.to_string());
    }

    bldr
}

/// Pick the event's interface address.
///
/// The default location trusts the address parsed out of the message;
/// any other location resolves the message hostname through the cache,
/// skipping resolution when there is no hostname or no cache.
fn resolve_host_address(message: &SyslogMessage, ctx: &EnrichContext<'_>) -> Option<IpAddr> {
    if is_default_location(ctx.location) {
        return message.host_address;
    }

    let hostname = message.hostname.as_deref().unwrap_or_default();
    if hostname.is_empty() {
        return None;
    }
    let dns = ctx.dns?;
    dns.resolve(hostname, ctx.location, ctx.system_id, ctx.lookup_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DnsLookup, DnsLookupClient};
    use crate::config::DEFAULT_LOCATION;
    use crate::message::{Facility, Severity};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn context(location: &str) -> EnrichContext<'_> {
        EnrichContext {
            system_id: "sys-1",
            location,
            host: "collector01",
            received: None,
            dns: None,
            node_index: None,
            lookup_timeout: None,
        }
    }

    fn message() -> SyslogMessage {
        let mut msg = SyslogMessage::new(Facility::Auth, Severity::Err, "login failed for root");
        msg.hostname = Some("gw01".to_string());
        msg.process_name = Some("sshd".to_string());
        msg.process_id = Some(4242);
        msg
    }

    #[test]
    fn test_default_uei_and_identity() {
        let bldr = build_event(&message(), &context(DEFAULT_LOCATION));
        let event = bldr.build();
        assert_eq!(event.uei, "uei/syslogd/auth/err");
        assert_eq!(event.source, "syslogd");
        assert_eq!(event.system_id, "sys-1");
        assert_eq!(event.host, "collector01");
        assert_eq!(event.log_message, "login failed for root");
    }

    #[test]
    fn test_parameter_set_and_order() {
        let mut msg = message();
        msg.message_id = Some("ID47".to_string());
        msg.parameters.push(("tenant".to_string(), "acme".to_string()));
        let event = build_event(&msg, &context(DEFAULT_LOCATION)).build();

        let names: Vec<&str> = event.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "hostname",
                "tenant",
                "syslogmessage",
                "severity",
                "timestamp",
                "messageid",
                "process",
                "service",
                "processid"
            ]
        );
        assert_eq!(event.parameter("hostname"), Some("gw01"));
        assert_eq!(event.parameter("severity"), Some("err"));
        assert_eq!(event.parameter("service"), Some("auth"));
        assert_eq!(event.parameter("processid"), Some("4242"));
    }

    #[test]
    fn test_default_location_uses_embedded_address() {
        let mut msg = message();
        msg.host_address = Some("192.0.2.9".parse().unwrap());
        let event = build_event(&msg, &context(DEFAULT_LOCATION)).build();
        assert_eq!(event.interface, Some("192.0.2.9".parse().unwrap()));
    }

    #[test]
    fn test_remote_location_without_cache_leaves_unresolved() {
        let mut msg = message();
        msg.host_address = Some("192.0.2.9".parse().unwrap());
        let event = build_event(&msg, &context("branch-a")).build();
        assert_eq!(event.interface, None);
        assert_eq!(event.node_id, None);
    }

    #[test]
    fn test_remote_location_resolves_and_attributes_node() {
        struct StaticClient;
        impl DnsLookupClient for StaticClient {
            fn lookup(&self, _h: &str, _l: &str, _s: &str) -> DnsLookup {
                DnsLookup::ready(Some("198.51.100.4".to_string()))
            }
        }
        struct StaticIndex;
        impl NodeIndex for StaticIndex {
            fn first_node_id(&self, location: &str, addr: IpAddr) -> Option<u64> {
                assert_eq!(location, "branch-a");
                assert_eq!(addr, "198.51.100.4".parse::<IpAddr>().unwrap());
                Some(17)
            }
        }

        let dns = DnsCache::new(Arc::new(StaticClient));
        let mut ctx = context("branch-a");
        ctx.dns = Some(&dns);
        ctx.node_index = Some(&StaticIndex);

        let event = build_event(&message(), &ctx).build();
        assert_eq!(event.interface, Some("198.51.100.4".parse().unwrap()));
        assert_eq!(event.node_id, Some(17));
    }

    #[test]
    fn test_full_timestamp_wins_over_partial_fields() {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 7, 14, 5, 9)
            .unwrap();
        let mut msg = message();
        msg.timestamp = Some(ts);
        msg.month = Some(12);
        msg.day = Some(31);
        let event = build_event(&msg, &context(DEFAULT_LOCATION)).build();
        assert_eq!(event.time, Some(ts));
        assert!(event.partial_time.is_empty());
        assert_eq!(event.parameter("timestamp"), Some("Mar  7 14:05:09"));
    }

    #[test]
    fn test_partial_fields_copied_independently() {
        let mut msg = message();
        msg.month = Some(3);
        msg.day = Some(7);
        msg.hour = Some(14);
        let received = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap();
        let mut ctx = context(DEFAULT_LOCATION);
        ctx.received = Some(received);

        let event = build_event(&msg, &ctx).build();
        // Partial fields suppress the received-timestamp fallback.
        assert_eq!(event.time, None);
        assert_eq!(event.partial_time.month, Some(3));
        assert_eq!(event.partial_time.day, Some(7));
        assert_eq!(event.partial_time.hour, Some(14));
        assert_eq!(event.partial_time.year, None);
        assert_eq!(event.partial_time.minute, None);
    }

    #[test]
    fn test_received_timestamp_is_last_resort() {
        let received = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap();
        let mut ctx = context(DEFAULT_LOCATION);
        ctx.received = Some(received);

        let event = build_event(&message(), &ctx).build();
        assert_eq!(event.time, Some(received));
        assert!(event.partial_time.is_empty());
    }

    #[test]
    fn test_no_time_source_leaves_time_unset() {
        let event = build_event(&message(), &context(DEFAULT_LOCATION)).build();
        assert_eq!(event.time, None);
        assert!(event.partial_time.is_empty());
    }
}
