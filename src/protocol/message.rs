//! # Messages
//!
//! The DroneComms message catalog and the contract every message type follows.
//!
//! Each message type implements [`WireMessage`]: it knows its PID and length
//! rule, encodes its payload with the field codec and decodes a payload with a
//! [`FieldReader`]. The provided `serialize*`/`deserialize*` methods add the
//! header, checksum and validation around that, so every type rejects packets
//! the same way:
//!
//! 1. size field or checksum wrong: `ProtocolError::CorruptPacket`
//! 2. PID belongs to another type: `ProtocolError::PidMismatch`
//! 3. length breaks the type's rule: `ProtocolError::InvalidLength`
//! 4. a bounded field overran: `ProtocolError::FieldOverrun`
//!
//! Decoding always builds a fresh value, so a failed decode never leaves a
//! half-written message behind.
//!
//! [`Message`] wraps every type for PID-based dispatch.

use std::fmt;

use bytes::BytesMut;

use crate::config::{LinkConfig, FRAME_OVERHEAD};
use crate::core::field::FieldReader;
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};
use crate::protocol::command::{
    CameraControl, EmergencyCommand, ExecuteWaypointMission, VirtualStickCommand,
};
use crate::protocol::imagery::{CompressedImage, Image};
use crate::protocol::status::{Acknowledgment, MessageString};
use crate::protocol::telemetry::{CoreTelemetry, ExtendedTelemetry};

/// Every message type in the catalog, keyed by PID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    CoreTelemetry,
    ExtendedTelemetry,
    Image,
    Acknowledgment,
    MessageString,
    CompressedImage,
    VirtualStickCommand,
    ExecuteWaypointMission,
    CameraControl,
    EmergencyCommand,
}

impl MessageKind {
    pub const ALL: [MessageKind; 10] = [
        MessageKind::CoreTelemetry,
        MessageKind::ExtendedTelemetry,
        MessageKind::Image,
        MessageKind::Acknowledgment,
        MessageKind::MessageString,
        MessageKind::CompressedImage,
        MessageKind::VirtualStickCommand,
        MessageKind::ExecuteWaypointMission,
        MessageKind::CameraControl,
        MessageKind::EmergencyCommand,
    ];

    pub const fn pid(self) -> u8 {
        match self {
            MessageKind::CoreTelemetry => 0,
            MessageKind::ExtendedTelemetry => 1,
            MessageKind::Image => 2,
            MessageKind::Acknowledgment => 3,
            MessageKind::MessageString => 4,
            MessageKind::CompressedImage => 5,
            MessageKind::VirtualStickCommand => 252,
            MessageKind::ExecuteWaypointMission => 253,
            MessageKind::CameraControl => 254,
            MessageKind::EmergencyCommand => 255,
        }
    }

    /// Total packet lengths this kind accepts
    pub const fn length(self) -> LengthRule {
        match self {
            MessageKind::CoreTelemetry => LengthRule::Exact(FRAME_OVERHEAD + 69),
            MessageKind::ExtendedTelemetry => LengthRule::AtLeast(FRAME_OVERHEAD + 16),
            MessageKind::Image => LengthRule::AtLeast(FRAME_OVERHEAD + 8),
            MessageKind::Acknowledgment => LengthRule::Exact(FRAME_OVERHEAD + 2),
            MessageKind::MessageString => LengthRule::AtLeast(FRAME_OVERHEAD + 5),
            MessageKind::CompressedImage => LengthRule::AtLeast(FRAME_OVERHEAD + 4),
            MessageKind::VirtualStickCommand => LengthRule::Exact(FRAME_OVERHEAD + 21),
            MessageKind::ExecuteWaypointMission => LengthRule::AtLeast(FRAME_OVERHEAD + 42),
            MessageKind::CameraControl => LengthRule::Exact(FRAME_OVERHEAD + 5),
            MessageKind::EmergencyCommand => LengthRule::Exact(FRAME_OVERHEAD + 1),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            MessageKind::CoreTelemetry => "Core Telemetry",
            MessageKind::ExtendedTelemetry => "Extended Telemetry",
            MessageKind::Image => "Image",
            MessageKind::Acknowledgment => "Acknowledgment",
            MessageKind::MessageString => "Message String",
            MessageKind::CompressedImage => "Compressed Image",
            MessageKind::VirtualStickCommand => "Virtual Stick Command",
            MessageKind::ExecuteWaypointMission => "Execute Waypoint Mission",
            MessageKind::CameraControl => "Camera Control",
            MessageKind::EmergencyCommand => "Emergency Command",
        }
    }

    /// Commands flow ground to drone; everything else flows drone to ground
    pub const fn is_command(self) -> bool {
        self.pid() >= 252
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = ProtocolError;

    fn try_from(pid: u8) -> Result<Self> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.pid() == pid)
            .ok_or(ProtocolError::UnknownPid(pid))
    }
}

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> u8 {
        kind.pid()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepted total packet length for a message kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    Exact(usize),
    AtLeast(usize),
}

impl LengthRule {
    pub const fn admits(self, len: usize) -> bool {
        match self {
            LengthRule::Exact(n) => len == n,
            LengthRule::AtLeast(n) => len >= n,
        }
    }

    pub const fn minimum(self) -> usize {
        match self {
            LengthRule::Exact(n) | LengthRule::AtLeast(n) => n,
        }
    }
}

/// Payload of `packet` after integrity, PID and length checks for `kind`
pub(crate) fn validated_payload(packet: &Packet, kind: MessageKind) -> Result<&[u8]> {
    if !packet.verify_checksum() {
        return Err(ProtocolError::CorruptPacket);
    }
    let found = packet.pid().ok_or(ProtocolError::CorruptPacket)?;
    if found != kind.pid() {
        return Err(ProtocolError::PidMismatch {
            expected: kind.pid(),
            found,
        });
    }
    if !kind.length().admits(packet.len()) {
        return Err(ProtocolError::InvalidLength {
            pid: found,
            len: packet.len(),
        });
    }
    Ok(packet.payload())
}

/// Serialize/deserialize contract shared by every catalog type
pub trait WireMessage: Sized {
    const KIND: MessageKind;

    /// Append the payload fields in wire order
    fn encode_payload(&self, buf: &mut BytesMut, link: &LinkConfig) -> Result<()>;

    /// Decode the payload fields; `reader` holds exactly the payload
    fn decode_payload(reader: &mut FieldReader<'_>, link: &LinkConfig) -> Result<Self>;

    fn serialize(&self) -> Result<Packet> {
        self.serialize_with(&LinkConfig::default())
    }

    /// Encode into a complete packet: header, payload, checksum
    fn serialize_with(&self, link: &LinkConfig) -> Result<Packet> {
        let mut payload = BytesMut::new();
        self.encode_payload(&mut payload, link)?;
        Packet::assemble(Self::KIND.pid(), &payload)
    }

    fn deserialize(packet: &Packet) -> Result<Self> {
        Self::deserialize_with(packet, &LinkConfig::default())
    }

    /// Validate `packet` and decode a fresh value from it
    fn deserialize_with(packet: &Packet, link: &LinkConfig) -> Result<Self> {
        let payload = validated_payload(packet, Self::KIND)?;
        let mut reader = FieldReader::new(payload);
        let message = Self::decode_payload(&mut reader, link)?;
        if reader.overrun() {
            return Err(ProtocolError::FieldOverrun(Self::KIND.name().to_string()));
        }
        Ok(message)
    }
}

/// Any DroneComms message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    CoreTelemetry(CoreTelemetry),
    ExtendedTelemetry(ExtendedTelemetry),
    Image(Image),
    Acknowledgment(Acknowledgment),
    MessageString(MessageString),
    CompressedImage(CompressedImage),
    VirtualStickCommand(VirtualStickCommand),
    ExecuteWaypointMission(ExecuteWaypointMission),
    CameraControl(CameraControl),
    EmergencyCommand(EmergencyCommand),
}

// Runs `$body` with `$inner` bound to the wrapped message, whatever its type
macro_rules! with_inner {
    ($msg:expr, $inner:ident => $body:expr) => {
        match $msg {
            Message::CoreTelemetry($inner) => $body,
            Message::ExtendedTelemetry($inner) => $body,
            Message::Image($inner) => $body,
            Message::Acknowledgment($inner) => $body,
            Message::MessageString($inner) => $body,
            Message::CompressedImage($inner) => $body,
            Message::VirtualStickCommand($inner) => $body,
            Message::ExecuteWaypointMission($inner) => $body,
            Message::CameraControl($inner) => $body,
            Message::EmergencyCommand($inner) => $body,
        }
    };
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::CoreTelemetry(_) => MessageKind::CoreTelemetry,
            Message::ExtendedTelemetry(_) => MessageKind::ExtendedTelemetry,
            Message::Image(_) => MessageKind::Image,
            Message::Acknowledgment(_) => MessageKind::Acknowledgment,
            Message::MessageString(_) => MessageKind::MessageString,
            Message::CompressedImage(_) => MessageKind::CompressedImage,
            Message::VirtualStickCommand(_) => MessageKind::VirtualStickCommand,
            Message::ExecuteWaypointMission(_) => MessageKind::ExecuteWaypointMission,
            Message::CameraControl(_) => MessageKind::CameraControl,
            Message::EmergencyCommand(_) => MessageKind::EmergencyCommand,
        }
    }

    pub fn pid(&self) -> u8 {
        self.kind().pid()
    }

    pub fn serialize(&self) -> Result<Packet> {
        self.serialize_with(&LinkConfig::default())
    }

    pub fn serialize_with(&self, link: &LinkConfig) -> Result<Packet> {
        with_inner!(self, m => m.serialize_with(link))
    }

    pub fn from_packet(packet: &Packet) -> Result<Self> {
        Self::from_packet_with(packet, &LinkConfig::default())
    }

    /// Decode whichever message type the packet's PID names
    ///
    /// # Errors
    /// `CorruptPacket` if the packet fails size/checksum validation,
    /// `UnknownPid` for an identifier outside the catalog, otherwise whatever
    /// the selected type's `deserialize_with` reports.
    pub fn from_packet_with(packet: &Packet, link: &LinkConfig) -> Result<Self> {
        if !packet.verify_checksum() {
            return Err(ProtocolError::CorruptPacket);
        }
        let pid = packet.pid().ok_or(ProtocolError::CorruptPacket)?;

        Ok(match MessageKind::try_from(pid)? {
            MessageKind::CoreTelemetry => {
                Message::CoreTelemetry(CoreTelemetry::deserialize_with(packet, link)?)
            }
            MessageKind::ExtendedTelemetry => {
                Message::ExtendedTelemetry(ExtendedTelemetry::deserialize_with(packet, link)?)
            }
            MessageKind::Image => Message::Image(Image::deserialize_with(packet, link)?),
            MessageKind::Acknowledgment => {
                Message::Acknowledgment(Acknowledgment::deserialize_with(packet, link)?)
            }
            MessageKind::MessageString => {
                Message::MessageString(MessageString::deserialize_with(packet, link)?)
            }
            MessageKind::CompressedImage => {
                Message::CompressedImage(CompressedImage::deserialize_with(packet, link)?)
            }
            MessageKind::VirtualStickCommand => {
                Message::VirtualStickCommand(VirtualStickCommand::deserialize_with(packet, link)?)
            }
            MessageKind::ExecuteWaypointMission => Message::ExecuteWaypointMission(
                ExecuteWaypointMission::deserialize_with(packet, link)?,
            ),
            MessageKind::CameraControl => {
                Message::CameraControl(CameraControl::deserialize_with(packet, link)?)
            }
            MessageKind::EmergencyCommand => {
                Message::EmergencyCommand(EmergencyCommand::deserialize_with(packet, link)?)
            }
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.kind())?;
        with_inner!(self, m => fmt::Display::fmt(m, f))
    }
}

macro_rules! impl_from_variant {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Message {
                fn from(msg: $ty) -> Self {
                    Message::$ty(msg)
                }
            }
        )*
    };
}

impl_from_variant!(
    CoreTelemetry,
    ExtendedTelemetry,
    Image,
    Acknowledgment,
    MessageString,
    CompressedImage,
    VirtualStickCommand,
    ExecuteWaypointMission,
    CameraControl,
    EmergencyCommand,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_table() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::try_from(kind.pid()).ok(), Some(kind));
        }
        assert_eq!(MessageKind::EmergencyCommand.pid(), 255);
        assert_eq!(MessageKind::VirtualStickCommand.pid(), 252);
        assert!(matches!(
            MessageKind::try_from(6),
            Err(ProtocolError::UnknownPid(6))
        ));
    }

    #[test]
    fn test_length_rules() {
        assert_eq!(MessageKind::CoreTelemetry.length(), LengthRule::Exact(78));
        assert_eq!(MessageKind::ExtendedTelemetry.length(), LengthRule::AtLeast(25));
        assert_eq!(MessageKind::Image.length(), LengthRule::AtLeast(17));
        assert_eq!(MessageKind::Acknowledgment.length(), LengthRule::Exact(11));
        assert_eq!(MessageKind::MessageString.length(), LengthRule::AtLeast(14));
        assert_eq!(MessageKind::CompressedImage.length(), LengthRule::AtLeast(13));
        assert_eq!(MessageKind::VirtualStickCommand.length(), LengthRule::Exact(30));
        assert_eq!(MessageKind::ExecuteWaypointMission.length(), LengthRule::AtLeast(51));
        assert_eq!(MessageKind::CameraControl.length(), LengthRule::Exact(14));
        assert_eq!(MessageKind::EmergencyCommand.length(), LengthRule::Exact(10));

        assert!(LengthRule::AtLeast(10).admits(11));
        assert!(!LengthRule::Exact(10).admits(11));
    }

    #[test]
    fn test_commands_are_top_of_pid_range() {
        let commands: Vec<_> = MessageKind::ALL
            .into_iter()
            .filter(|k| k.is_command())
            .collect();
        assert_eq!(commands.len(), 4);
    }

    #[test]
    fn test_validation_order() {
        // checksum is checked before anything else
        let corrupt = Packet::from_bytes(&[0xDA, 0xA7, 0, 0, 0, 10, 0xFF, 1, 0, 0]);
        assert!(matches!(
            validated_payload(&corrupt, MessageKind::EmergencyCommand),
            Err(ProtocolError::CorruptPacket)
        ));

        let Ok(ack) = Packet::assemble(3, &[1, 255]) else {
            panic!("assemble failed");
        };
        assert!(matches!(
            validated_payload(&ack, MessageKind::EmergencyCommand),
            Err(ProtocolError::PidMismatch {
                expected: 255,
                found: 3
            })
        ));

        let Ok(short) = Packet::assemble(255, &[]) else {
            panic!("assemble failed");
        };
        assert!(matches!(
            validated_payload(&short, MessageKind::EmergencyCommand),
            Err(ProtocolError::InvalidLength { pid: 255, len: 9 })
        ));
    }
}
