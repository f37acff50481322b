//! # Packet
//!
//! One in-flight DroneComms packet: an append-only byte buffer plus an explicit
//! framing state.
//!
//! A sender builds a packet in one pass with [`Packet::assemble`]. A receiver
//! appends whatever chunks arrive from the stream, asks [`Packet::is_complete`]
//! after each append, validates with [`Packet::verify_checksum`] and, when the
//! bytes turn out to be garbage, calls [`Packet::scan_forward_for_sync`] to
//! realign on the next sync marker.
//!
//! ## Layout
//! ```text
//! [0xDA 0xA7] [Size(4)] [PID(1)] [Payload(Size-9)] [SumA(1)] [SumB(1)]
//! ```
//! `Size` is the total packet length, header and checksum included.
//!
//! ## Integrity
//! The trailer is a two-stage additive running sum. It catches truncation and
//! accidental corruption only; it offers no protection against tampering.

use tracing::debug;

use crate::config::{CHECKSUM_SIZE, FRAME_OVERHEAD, HEADER_SIZE, SYNC_MARKER};
use crate::error::{ProtocolError, Result};

/// Size and PID parsed from the first seven bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Advertised total packet length
    pub size: u32,
    /// Message type identifier
    pub pid: u8,
}

impl Header {
    fn parse(bytes: &[u8]) -> Option<Self> {
        let header = bytes.get(..HEADER_SIZE)?;
        Some(Self {
            size: u32::from_be_bytes([header[2], header[3], header[4], header[5]]),
            pid: header[6],
        })
    }
}

/// Framing state of a [`Packet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacketState {
    #[default]
    Empty,
    /// Fewer than seven bytes buffered
    Accumulating,
    /// Header parsed, more bytes needed
    HeaderKnown(Header),
    /// At least the advertised number of bytes buffered
    Complete(Header),
}

impl PacketState {
    pub fn header(self) -> Option<Header> {
        match self {
            PacketState::HeaderKnown(header) | PacketState::Complete(header) => Some(header),
            PacketState::Empty | PacketState::Accumulating => None,
        }
    }
}

/// Two-stage running sum over `bytes`: `a += byte; b += a`, both mod 256
pub fn checksum(bytes: &[u8]) -> [u8; 2] {
    let (a, b) = bytes.iter().fold((0u8, 0u8), |(a, b), &byte| {
        let a = a.wrapping_add(byte);
        (a, b.wrapping_add(a))
    });
    [a, b]
}

/// Byte buffer for one protocol packet
#[derive(Debug, Clone, Default)]
pub struct Packet {
    data: Vec<u8>,
    state: PacketState,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            state: PacketState::Empty,
        }
    }

    /// Packet holding a copy of `bytes`, not validated
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut packet = Self::with_capacity(bytes.len());
        packet.extend_from_slice(bytes);
        packet
    }

    /// Build header + payload + checksum in one pass
    ///
    /// The size field is computed from the payload, so messages whose length is
    /// only known after encoding (compressed imagery) need no header patching.
    ///
    /// # Errors
    /// Returns `ProtocolError::OversizedPacket` if the total length does not fit
    /// the 32-bit size field.
    pub fn assemble(pid: u8, payload: &[u8]) -> Result<Self> {
        let total = payload.len() + FRAME_OVERHEAD;
        let size = u32::try_from(total).map_err(|_| ProtocolError::OversizedPacket(total))?;

        let mut packet = Self::with_capacity(total);
        packet.write_header(size, pid);
        packet.extend_from_slice(payload);
        packet.append_checksum();
        Ok(packet)
    }

    /// Drop all buffered bytes
    pub fn clear(&mut self) {
        self.data.clear();
        self.state = PacketState::Empty;
    }

    /// Append freshly received bytes
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.refresh_state();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn state(&self) -> PacketState {
        self.state
    }

    /// Size and PID, once seven bytes are buffered
    pub fn header(&self) -> Option<Header> {
        self.state.header()
    }

    /// Message type identifier, once seven bytes are buffered
    pub fn pid(&self) -> Option<u8> {
        self.header().map(|h| h.pid)
    }

    /// Payload bytes between header and checksum (empty below nine bytes)
    pub fn payload(&self) -> &[u8] {
        if self.data.len() < FRAME_OVERHEAD {
            return &[];
        }
        &self.data[HEADER_SIZE..self.data.len() - CHECKSUM_SIZE]
    }

    /// Whether the buffer holds at least the advertised number of bytes
    ///
    /// Always false until the seven header bytes have arrived.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, PacketState::Complete(_))
    }

    /// Bytes still missing before the packet is complete
    ///
    /// `None` until the header is known.
    pub fn bytes_needed(&self) -> Option<u32> {
        self.header().map(|h| {
            let have = u32::try_from(self.data.len()).unwrap_or(u32::MAX);
            h.size.saturating_sub(have)
        })
    }

    /// Append sync marker, size and PID
    pub fn write_header(&mut self, size: u32, pid: u8) {
        self.data.reserve(HEADER_SIZE);
        self.data.extend_from_slice(&SYNC_MARKER);
        self.data.extend_from_slice(&size.to_be_bytes());
        self.data.push(pid);
        self.refresh_state();
    }

    /// Append the running-sum trailer computed over every buffered byte
    pub fn append_checksum(&mut self) {
        let sum = checksum(&self.data);
        self.data.extend_from_slice(&sum);
        self.refresh_state();
    }

    /// Size field matches the buffer length and the trailer matches the bytes
    pub fn verify_checksum(&self) -> bool {
        if self.data.len() < FRAME_OVERHEAD {
            return false;
        }
        // re-read rather than trust the cached header
        let Some(header) = Header::parse(&self.data) else {
            return false;
        };
        if header.size as usize != self.data.len() {
            return false;
        }
        let (body, trailer) = self.data.split_at(self.data.len() - CHECKSUM_SIZE);
        checksum(body) == [trailer[0], trailer[1]]
    }

    /// [`Packet::verify_checksum`] plus a PID match
    pub fn verify_checksum_size_and_pid(&self, pid: u8) -> bool {
        self.verify_checksum() && self.data[HEADER_SIZE - 1] == pid
    }

    /// Realign on the next sync marker after index 0
    ///
    /// Index 0 is assumed already rejected by the caller. If a marker is found,
    /// everything before it is discarded. Otherwise a trailing `0xDA` (a marker
    /// split across reads) is kept on its own, and failing that the buffer is
    /// cleared. The buffer always shrinks unless it was empty.
    pub fn scan_forward_for_sync(&mut self) {
        if self.data.is_empty() {
            return;
        }

        let found = self
            .data
            .windows(SYNC_MARKER.len())
            .skip(1)
            .position(|w| w == SYNC_MARKER)
            .map(|i| i + 1);

        match found {
            Some(head) => {
                debug!(discarded = head, remaining = self.data.len() - head, "Sync marker found");
                self.data.drain(..head);
            }
            None if self.data.len() > 1 && self.data.last() == Some(&SYNC_MARKER[0]) => {
                debug!(discarded = self.data.len() - 1, "Keeping possible partial sync marker");
                let keep = self.data.len() - 1;
                self.data.drain(..keep);
            }
            None => {
                debug!(discarded = self.data.len(), "No sync marker, clearing buffer");
                self.data.clear();
            }
        }
        self.state = PacketState::Empty;
        self.refresh_state();
    }

    /// Split off everything from `at` onwards into a new packet
    ///
    /// Used when a completed buffer already holds the start of the next packet.
    ///
    /// # Panics
    /// Panics if `at > self.len()`.
    pub fn split_off(&mut self, at: usize) -> Packet {
        let tail = self.data.split_off(at);
        self.state = PacketState::Empty;
        self.refresh_state();
        let mut next = Packet::new();
        next.data = tail;
        next.refresh_state();
        next
    }

    fn refresh_state(&mut self) {
        let len = self.data.len();
        self.state = match self.state {
            _ if len == 0 => PacketState::Empty,
            _ if len < HEADER_SIZE => PacketState::Accumulating,
            PacketState::HeaderKnown(header) | PacketState::Complete(header) => {
                Self::classify(header, len)
            }
            PacketState::Empty | PacketState::Accumulating => match Header::parse(&self.data) {
                Some(header) => Self::classify(header, len),
                None => PacketState::Accumulating,
            },
        };
    }

    fn classify(header: Header, len: usize) -> PacketState {
        if len >= header.size as usize {
            PacketState::Complete(header)
        } else {
            PacketState::HeaderKnown(header)
        }
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Packet {}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_packet(pid: u8, payload: &[u8]) -> Vec<u8> {
        Packet::assemble(pid, payload)
            .map(Packet::into_bytes)
            .unwrap_or_default()
    }

    #[test]
    fn test_checksum_vector() {
        assert_eq!(checksum(&[0x00, 0x01, 0x02]), [3, 4]);
        assert_eq!(checksum(&[]), [0, 0]);
    }

    #[test]
    fn test_checksum_wraps_mod_256() {
        assert_eq!(checksum(&[0xFF, 0x02]), [0x01, 0x00]);
    }

    #[test]
    fn test_header_layout() {
        let mut packet = Packet::new();
        packet.write_header(11, 3);
        assert_eq!(packet.as_bytes(), &[0xDA, 0xA7, 0, 0, 0, 11, 3]);
        assert_eq!(
            packet.state(),
            PacketState::HeaderKnown(Header { size: 11, pid: 3 })
        );
        assert_eq!(packet.bytes_needed(), Some(4));
    }

    #[test]
    fn test_assemble_appends_checksum_over_header_and_payload() {
        let bytes = valid_packet(3, &[1, 0]);
        assert_eq!(bytes.len(), 11);
        assert_eq!(&bytes[..9], &[0xDA, 0xA7, 0, 0, 0, 11, 3, 1, 0]);
        assert_eq!(&bytes[9..], &checksum(&bytes[..9]));
        assert!(Packet::from_bytes(&bytes).verify_checksum_size_and_pid(3));
        assert!(!Packet::from_bytes(&bytes).verify_checksum_size_and_pid(4));
    }

    #[test]
    fn test_state_transitions() {
        let bytes = valid_packet(255, &[7]);
        let mut packet = Packet::new();
        assert_eq!(packet.state(), PacketState::Empty);
        assert_eq!(packet.bytes_needed(), None);

        packet.extend_from_slice(&bytes[..6]);
        assert_eq!(packet.state(), PacketState::Accumulating);
        assert!(!packet.is_complete());
        assert_eq!(packet.pid(), None);

        packet.extend_from_slice(&bytes[6..7]);
        assert_eq!(packet.pid(), Some(255));
        assert_eq!(packet.bytes_needed(), Some(3));
        assert!(!packet.is_complete());

        packet.extend_from_slice(&bytes[7..]);
        assert!(packet.is_complete());
        assert_eq!(packet.bytes_needed(), Some(0));
        assert_eq!(packet.payload(), &[7]);

        packet.clear();
        assert_eq!(packet.state(), PacketState::Empty);
    }

    #[test]
    fn test_verify_rejects_size_mismatch_and_bad_sum() {
        let mut bytes = valid_packet(254, &[1, 0, 0, 0, 0]);
        let mut longer = bytes.clone();
        longer.push(0);
        assert!(!Packet::from_bytes(&longer).verify_checksum());

        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(!Packet::from_bytes(&bytes).verify_checksum());
        assert!(!Packet::from_bytes(&bytes[..8]).verify_checksum());
    }

    #[test]
    fn test_scan_discards_bytes_before_marker() {
        let mut bytes = vec![0xFF, 0xFF, 0xFF];
        bytes.extend(valid_packet(255, &[1]));
        let mut packet = Packet::from_bytes(&bytes);
        packet.scan_forward_for_sync();
        assert_eq!(packet.as_bytes(), &bytes[3..]);
        assert!(packet.is_complete());
        assert!(packet.verify_checksum());
    }

    #[test]
    fn test_scan_skips_index_zero() {
        let bytes = valid_packet(255, &[1]);
        let mut packet = Packet::from_bytes(&bytes);
        packet.scan_forward_for_sync();
        // the marker at index 0 is not a candidate, nothing else matches
        assert!(packet.len() < bytes.len());
    }

    #[test]
    fn test_scan_keeps_trailing_partial_marker() {
        let mut packet = Packet::from_bytes(&[0x01, 0x02, 0xDA]);
        packet.scan_forward_for_sync();
        assert_eq!(packet.as_bytes(), &[0xDA]);
        assert_eq!(packet.state(), PacketState::Accumulating);
    }

    #[test]
    fn test_scan_clears_when_nothing_found() {
        let mut packet = Packet::from_bytes(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        packet.scan_forward_for_sync();
        assert!(packet.is_empty());
        assert_eq!(packet.state(), PacketState::Empty);

        // a lone 0xDA still shrinks
        let mut single = Packet::from_bytes(&[0xDA]);
        single.scan_forward_for_sync();
        assert!(single.is_empty());

        let mut empty = Packet::new();
        empty.scan_forward_for_sync();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_scan_invalidates_cached_header() {
        let mut bytes = vec![0xDA, 0xA7, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
        bytes.extend(valid_packet(3, &[1, 255]));
        let mut packet = Packet::from_bytes(&bytes);
        assert_eq!(packet.header().map(|h| h.size), Some(u32::MAX));

        packet.scan_forward_for_sync();
        assert_eq!(packet.header(), Some(Header { size: 11, pid: 3 }));
        assert!(packet.verify_checksum());
    }

    #[test]
    fn test_split_off_separates_next_packet() {
        let first = valid_packet(255, &[1]);
        let second = valid_packet(255, &[2]);
        let mut joined = first.clone();
        joined.extend_from_slice(&second[..4]);

        let mut packet = Packet::from_bytes(&joined);
        assert!(packet.is_complete());
        let tail = packet.split_off(first.len());
        assert!(packet.verify_checksum());
        assert_eq!(tail.as_bytes(), &second[..4]);
        assert_eq!(tail.state(), PacketState::Accumulating);
    }
}
