//! The produced management event and its mutable draft.
//!
//! [`EventBuilder`] is the accumulator the conversion pipeline writes
//! into; [`EventBuilder::build`] freezes it into the immutable
//! [`Event`] handed to the downstream delivery collaborator.

use std::net::IpAddr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// One named event parameter. Parameters keep their insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventParam {
    pub name: String,
    pub value: String,
}

impl EventParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Discrete timestamp components, used when the message carried only a
/// fragmentary date (an RFC 3164 header has no year, some relays strip
/// the zone). Any subset may be present; the zone is kept as seconds
/// east of UTC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PartialTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub millisecond: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_secs: Option<i32>,
}

impl PartialTime {
    pub fn is_empty(&self) -> bool {
        *self == PartialTime::default()
    }
}

/// One finalized, immutable management event.
///
/// Exactly one of `time`, a non-empty `partial_time`, or neither is set
/// by the pipeline's timestamp precedence; they are never merged.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub uei: String,
    pub source: String,
    pub system_id: String,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "PartialTime::is_empty")]
    pub partial_time: PartialTime,
    pub log_message: String,
    pub parameters: Vec<EventParam>,
}

impl Event {
    /// Serialize for the downstream event-delivery collaborator.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// First parameter with the given name, if any.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// Mutable event draft filled in by enrichment, classification and
/// redaction, in that order.
#[derive(Clone, Debug)]
pub struct EventBuilder {
    uei: String,
    source: String,
    system_id: String,
    host: String,
    interface: Option<IpAddr>,
    node_id: Option<u64>,
    time: Option<DateTime<FixedOffset>>,
    partial_time: PartialTime,
    log_message: String,
    parameters: Vec<EventParam>,
}

impl EventBuilder {
    pub fn new(uei: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            uei: uei.into(),
            source: source.into(),
            system_id: String::new(),
            host: String::new(),
            interface: None,
            node_id: None,
            time: None,
            partial_time: PartialTime::default(),
            log_message: String::new(),
            parameters: Vec::new(),
        }
    }

    pub fn uei(&self) -> &str {
        &self.uei
    }

    pub fn set_uei(&mut self, uei: impl Into<String>) {
        self.uei = uei.into();
    }

    pub fn set_system_id(&mut self, system_id: impl Into<String>) {
        self.system_id = system_id.into();
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    pub fn set_interface(&mut self, addr: IpAddr) {
        self.interface = Some(addr);
    }

    pub fn set_node_id(&mut self, node_id: u64) {
        self.node_id = Some(node_id);
    }

    pub fn set_time(&mut self, time: DateTime<FixedOffset>) {
        self.time = Some(time);
    }

    pub fn set_year(&mut self, year: i32) {
        self.partial_time.year = Some(year);
    }

    pub fn set_month(&mut self, month: u32) {
        self.partial_time.month = Some(month);
    }

    pub fn set_day_of_month(&mut self, day: u32) {
        self.partial_time.day = Some(day);
    }

    pub fn set_hour_of_day(&mut self, hour: u32) {
        self.partial_time.hour = Some(hour);
    }

    pub fn set_minute(&mut self, minute: u32) {
        self.partial_time.minute = Some(minute);
    }

    pub fn set_second(&mut self, second: u32) {
        self.partial_time.second = Some(second);
    }

    pub fn set_millisecond(&mut self, millisecond: u32) {
        self.partial_time.millisecond = Some(millisecond);
    }

    pub fn set_zone(&mut self, zone: FixedOffset) {
        self.partial_time.utc_offset_secs = Some(zone.local_minus_utc());
    }

    pub fn set_log_message(&mut self, message: impl Into<String>) {
        self.log_message = message.into();
    }

    /// Append a parameter, preserving insertion order. Duplicate names
    /// are allowed, mirroring message-supplied parameters.
    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.push(EventParam::new(name, value));
    }

    /// Replace the value of the first parameter with this name, or
    /// append it if absent.
    pub fn set_param(&mut self, name: &str, value: impl Into<String>) {
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(param) => param.value = value.into(),
            None => self.parameters.push(EventParam::new(name, value)),
        }
    }

    /// The event time as known so far: the full timestamp when one was
    /// set, otherwise the current wall-clock time. Used to re-render
    /// the canonical `timestamp` parameter.
    pub fn current_event_time(&self) -> DateTime<FixedOffset> {
        self.time.unwrap_or_else(|| Utc::now().fixed_offset())
    }

    /// Freeze the draft into the immutable produced event.
    pub fn build(self) -> Event {
        Event {
            uei: self.uei,
            source: self.source,
            system_id: self.system_id,
            host: self.host,
            interface: self.interface,
            node_id: self.node_id,
            time: self.time,
            partial_time: self.partial_time,
            log_message: self.log_message,
            parameters: self.parameters,
        }
    }
}
