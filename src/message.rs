//! In-memory representation of a single parsed syslog message.
//!
//! The wire-level grammar is a collaborator concern: an upstream
//! [`MessageParser`] turns one already-delimited datagram into a
//! [`SyslogMessage`], and everything downstream of it operates on this
//! structured form only.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Syslog facilities from RFC 5424. Names follow the Linux convention.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facility {
    Kern = 0,
    User = 1,
    Mail = 2,
    Daemon = 3,
    Auth = 4,
    Syslog = 5,
    Lpr = 6,
    News = 7,
    Uucp = 8,
    Cron = 9,
    Authpriv = 10,
    Ftp = 11,
    Ntp = 12,
    Audit = 13,
    Alert = 14,
    Clockd = 15,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

impl Facility {
    /// Convert the wire-serialization integer into a `Facility`.
    pub fn from_int(i: u8) -> Option<Self> {
        let facility = match i {
            0 => Facility::Kern,
            1 => Facility::User,
            2 => Facility::Mail,
            3 => Facility::Daemon,
            4 => Facility::Auth,
            5 => Facility::Syslog,
            6 => Facility::Lpr,
            7 => Facility::News,
            8 => Facility::Uucp,
            9 => Facility::Cron,
            10 => Facility::Authpriv,
            11 => Facility::Ftp,
            12 => Facility::Ntp,
            13 => Facility::Audit,
            14 => Facility::Alert,
            15 => Facility::Clockd,
            16 => Facility::Local0,
            17 => Facility::Local1,
            18 => Facility::Local2,
            19 => Facility::Local3,
            20 => Facility::Local4,
            21 => Facility::Local5,
            22 => Facility::Local6,
            23 => Facility::Local7,
            _ => return None,
        };

        Some(facility)
    }

    /// Unique lowercase text form, as used in default UEIs and the
    /// `service` event parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Facility::Kern => "kern",
            Facility::User => "user",
            Facility::Mail => "mail",
            Facility::Daemon => "daemon",
            Facility::Auth => "auth",
            Facility::Syslog => "syslog",
            Facility::Lpr => "lpr",
            Facility::News => "news",
            Facility::Uucp => "uucp",
            Facility::Cron => "cron",
            Facility::Authpriv => "authpriv",
            Facility::Ftp => "ftp",
            Facility::Ntp => "ntp",
            Facility::Audit => "audit",
            Facility::Alert => "alert",
            Facility::Clockd => "clockd",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syslog severities from RFC 5424.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Err = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    /// Convert the wire-serialization integer into a `Severity`.
    pub fn from_int(i: u8) -> Option<Self> {
        let severity = match i {
            0 => Severity::Emerg,
            1 => Severity::Alert,
            2 => Severity::Crit,
            3 => Severity::Err,
            4 => Severity::Warning,
            5 => Severity::Notice,
            6 => Severity::Info,
            7 => Severity::Debug,
            _ => return None,
        };

        Some(severity)
    }

    /// Unique lowercase text form, as used in default UEIs and the
    /// `severity` event parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Emerg => "emerg",
            Severity::Alert => "alert",
            Severity::Crit => "crit",
            Severity::Err => "err",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed syslog message, as handed over by the upstream parser.
///
/// Immutable once inside a conversion, with one exception: a message
/// without a hostname has the sender's literal source address filled in
/// by the orchestrator before enrichment runs.
///
/// The timestamp fields are mutually independent: a parser that
/// recovered a complete timestamp sets `timestamp`; a parser that only
/// recovered fragments (an RFC 3164 header has no year, some relays
/// strip the zone) sets whichever discrete components it saw.
#[derive(Clone, Debug, PartialEq)]
pub struct SyslogMessage {
    pub facility: Facility,
    pub severity: Severity,
    /// Complete timestamp, when the parser recovered one.
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    pub millisecond: Option<u32>,
    pub zone: Option<FixedOffset>,
    pub hostname: Option<String>,
    /// Source address as parsed out of the message itself, if any.
    pub host_address: Option<IpAddr>,
    pub process_name: Option<String>,
    pub process_id: Option<u32>,
    pub message_id: Option<String>,
    /// Free-text message body.
    pub text: String,
    /// Ordered key/value parameters supplied inside the message
    /// (e.g. RFC 5424 structured data flattened by the parser).
    pub parameters: Vec<(String, String)>,
}

impl SyslogMessage {
    pub fn new(facility: Facility, severity: Severity, text: impl Into<String>) -> Self {
        Self {
            facility,
            severity,
            timestamp: None,
            year: None,
            month: None,
            day: None,
            hour: None,
            minute: None,
            second: None,
            millisecond: None,
            zone: None,
            hostname: None,
            host_address: None,
            process_name: None,
            process_id: None,
            message_id: None,
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    /// True when at least one discrete timestamp component is present.
    pub fn has_partial_timestamp(&self) -> bool {
        self.year.is_some()
            || self.month.is_some()
            || self.day.is_some()
            || self.hour.is_some()
            || self.minute.is_some()
            || self.second.is_some()
            || self.millisecond.is_some()
            || self.zone.is_some()
    }

    /// Render the message the way it would appear on an RFC 3164 wire,
    /// omitting header parts the parser did not recover. Hide rules are
    /// evaluated against this rendering, not the raw body.
    pub fn as_rfc3164_message(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        if let Some(ts) = &self.timestamp {
            out.push_str(&rfc3164_timestamp(ts));
            out.push(' ');
        }
        if let Some(host) = &self.hostname {
            out.push_str(host);
            out.push(' ');
        }
        match (&self.process_name, self.process_id) {
            (Some(process), Some(pid)) => {
                let _ = write!(out, "{process}[{pid}]: ");
            }
            (Some(process), None) => {
                let _ = write!(out, "{process}: ");
            }
            _ => {}
        }
        out.push_str(&self.text);
        out
    }
}

/// Format a timestamp in the RFC 3164 header form (`Mmm dd hh:mm:ss`,
/// day of month space-padded).
pub fn rfc3164_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format("%b %e %H:%M:%S").to_string()
}

/// Failure modes of the upstream structural parser.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The datagram does not match the parser grammar at all.
    #[error("message does not match the parser grammar")]
    NoMatch,

    /// The datagram matched structurally but a field could not be decoded.
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Structural parser collaborator: one already-delimited datagram in,
/// one [`SyslogMessage`] out.
pub trait MessageParser: Send + Sync {
    fn parse(&self, buf: &[u8]) -> std::result::Result<SyslogMessage, ParseError>;
}
