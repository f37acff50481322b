//! Acknowledgments and free-text status messages.

use std::borrow::Cow;
use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::config::LinkConfig;
use crate::core::field::{FieldReader, PutFields};
use crate::error::Result;
use crate::protocol::message::{MessageKind, WireMessage};

/// Reply to a ground command (PID 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Acknowledgment {
    /// Polarity flag as sent; non-zero means positive
    pub positive: u8,
    /// PID of the command being acknowledged
    pub source_pid: u8,
}

impl Acknowledgment {
    pub fn positive(source: MessageKind) -> Self {
        Self {
            positive: 1,
            source_pid: source.pid(),
        }
    }

    pub fn negative(source: MessageKind) -> Self {
        Self {
            positive: 0,
            source_pid: source.pid(),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.positive != 0
    }

    /// Kind of the acknowledged command, if the PID is in the catalog
    pub fn source_kind(&self) -> Option<MessageKind> {
        MessageKind::try_from(self.source_pid).ok()
    }
}

impl WireMessage for Acknowledgment {
    const KIND: MessageKind = MessageKind::Acknowledgment;

    fn encode_payload(&self, buf: &mut BytesMut, _link: &LinkConfig) -> Result<()> {
        buf.put_u8(self.positive);
        buf.put_u8(self.source_pid);
        Ok(())
    }

    fn decode_payload(reader: &mut FieldReader<'_>, _link: &LinkConfig) -> Result<Self> {
        Ok(Self {
            positive: reader.u8()?,
            source_pid: reader.u8()?,
        })
    }
}

impl fmt::Display for Acknowledgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let polarity = if self.is_positive() { "Positive" } else { "Negative" };
        match self.source_kind().filter(|kind| kind.is_command()) {
            Some(kind) => writeln!(f, "{polarity} acknowledgement of: {kind} packet"),
            None => writeln!(
                f,
                "{polarity} acknowledgement of: Unrecognized (PID = {}) packet",
                self.source_pid
            ),
        }
    }
}

/// Severity of a [`MessageString`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Severity::Debug),
            1 => Some(Severity::Info),
            2 => Some(Severity::Warning),
            3 => Some(Severity::Error),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Debug => "Debug",
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        })
    }
}

/// Free-text message from the drone-side client (PID 4)
///
/// The type byte and the text are kept raw so unknown severities and text in
/// any character set survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageString {
    pub message_type: u8,
    pub message: Vec<u8>,
}

impl MessageString {
    pub fn new(severity: Severity, message: impl Into<Vec<u8>>) -> Self {
        Self {
            message_type: severity.as_u8(),
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        Severity::from_u8(self.message_type)
    }

    /// Message text with invalid UTF-8 replaced
    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.message)
    }
}

impl WireMessage for MessageString {
    const KIND: MessageKind = MessageKind::MessageString;

    fn encode_payload(&self, buf: &mut BytesMut, _link: &LinkConfig) -> Result<()> {
        buf.put_u8(self.message_type);
        buf.put_string_field(&self.message)
    }

    fn decode_payload(reader: &mut FieldReader<'_>, _link: &LinkConfig) -> Result<Self> {
        let message_type = reader.u8()?;
        let mut budget = reader.remaining();
        let message = reader.string(&mut budget);
        Ok(Self {
            message_type,
            message,
        })
    }
}

impl fmt::Display for MessageString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity() {
            Some(severity) => write!(f, "{severity}")?,
            None => write!(f, "Unrecognized (Type = {})", self.message_type)?,
        }
        writeln!(f, " message received: {}", self.text_lossy())
    }
}
