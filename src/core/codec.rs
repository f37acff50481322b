//! # Codec
//!
//! Stream framing for DroneComms over any byte stream.
//!
//! [`PacketCodec`] implements the receive loop a link needs on top of
//! [`Packet`]: it pulls only as many bytes from the stream as the packet in
//! progress can use, realigns on the sync marker whenever the buffered bytes do
//! not start a plausible packet, and only yields packets whose size field and
//! checksum have been verified. Corruption never surfaces as an error; it shows
//! up in the logs and in [`LinkMetrics`].
//!
//! [`MessageCodec`] goes one step further and yields decoded [`Message`] values,
//! dropping well-framed packets that do not decode.
//!
//! Both implement [`tokio_util::codec::Decoder`] / [`Encoder`] so they plug into
//! `FramedRead`, `FramedWrite` and `Framed`.

use std::sync::Arc;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::config::{LinkConfig, FRAME_OVERHEAD, HEADER_SIZE, SYNC_MARKER};
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::Message;
use crate::utils::metrics::LinkMetrics;

/// Framing codec yielding validated [`Packet`]s
#[derive(Debug, Default)]
pub struct PacketCodec {
    pending: Packet,
    link: LinkConfig,
    metrics: Option<Arc<LinkMetrics>>,
}

impl PacketCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(link: LinkConfig) -> Self {
        Self {
            link,
            ..Self::default()
        }
    }

    /// Record framing events into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<LinkMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &LinkConfig {
        &self.link
    }

    pub fn metrics(&self) -> Option<&Arc<LinkMetrics>> {
        self.metrics.as_ref()
    }

    /// Bytes held back in the packet currently being assembled
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn misaligned(&self) -> bool {
        match self.pending.as_bytes() {
            [] => false,
            [first] => *first != SYNC_MARKER[0],
            [first, second, ..] => [*first, *second] != SYNC_MARKER,
        }
    }

    fn resync(&mut self, reason: &'static str) {
        let before = self.pending.len();
        self.pending.scan_forward_for_sync();
        let discarded = before - self.pending.len();
        warn!(reason, discarded, kept = self.pending.len(), "Resynchronising link");
        if let Some(m) = &self.metrics {
            m.resync(discarded);
        }
    }

    /// Move the bytes the pending packet can use from `src`
    fn feed(&mut self, src: &mut BytesMut) {
        let wanted = match self.pending.bytes_needed() {
            Some(needed) => needed as usize,
            None => HEADER_SIZE - self.pending.len(),
        };
        let chunk = src.split_to(wanted.min(src.len()));
        self.pending.extend_from_slice(&chunk);
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    /// Assemble the next validated packet from `src`
    ///
    /// Returns `Ok(None)` once `src` is exhausted without completing a packet;
    /// the partial packet is kept for the next call.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        loop {
            if self.misaligned() {
                self.resync("sync marker");
                continue;
            }

            if let Some(header) = self.pending.header() {
                let size = header.size as usize;
                if size < FRAME_OVERHEAD || size > self.link.max_packet_size {
                    debug!(size, pid = header.pid, "Implausible packet size");
                    if let Some(m) = &self.metrics {
                        m.oversized_header();
                    }
                    self.resync("packet size");
                    continue;
                }

                if self.pending.is_complete() {
                    // after a resync the buffer may already hold the next packet
                    let tail = if self.pending.len() > size {
                        self.pending.split_off(size)
                    } else {
                        Packet::new()
                    };

                    if self.pending.verify_checksum() {
                        let packet = std::mem::replace(&mut self.pending, tail);
                        debug!(pid = header.pid, size, "Packet received");
                        if let Some(m) = &self.metrics {
                            m.packet_received(size);
                        }
                        return Ok(Some(packet));
                    }

                    if let Some(m) = &self.metrics {
                        m.checksum_failure();
                    }
                    self.pending.extend_from_slice(tail.as_bytes());
                    self.resync("checksum");
                    continue;
                }
            }

            if src.is_empty() {
                return Ok(None);
            }
            self.feed(src);
        }
    }

    /// Like [`decode`](Decoder::decode), but drops any unfinished packet
    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Packet>> {
        if let Some(packet) = self.decode(buf)? {
            return Ok(Some(packet));
        }

        let leftover = self.pending.len() + buf.len();
        if leftover > 0 {
            debug!(leftover, "Stream ended inside a packet");
            if let Some(m) = &self.metrics {
                m.discarded(leftover);
            }
            self.pending.clear();
            buf.clear();
        }
        Ok(None)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    /// Copy an assembled packet into the outgoing buffer
    ///
    /// # Errors
    /// Returns `ProtocolError::OversizedPacket` if the packet is larger than the
    /// configured maximum, since the peer would discard it.
    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<()> {
        if packet.len() > self.link.max_packet_size {
            return Err(ProtocolError::OversizedPacket(packet.len()));
        }

        dst.reserve(packet.len());
        dst.extend_from_slice(packet.as_bytes());
        if let Some(m) = &self.metrics {
            m.packet_sent(packet.len());
        }
        Ok(())
    }
}

impl Encoder<Message> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<()> {
        let packet = message.serialize_with(&self.link)?;
        Encoder::<Packet>::encode(self, packet, dst)
    }
}

/// Framing codec yielding decoded [`Message`]s
///
/// Packets that pass framing but fail to decode (unknown PID, wrong length,
/// bad imagery) are logged, counted as decode failures and skipped.
#[derive(Debug, Default)]
pub struct MessageCodec {
    inner: PacketCodec,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(link: LinkConfig) -> Self {
        Self {
            inner: PacketCodec::with_config(link),
        }
    }

    pub fn with_metrics(self, metrics: Arc<LinkMetrics>) -> Self {
        Self {
            inner: self.inner.with_metrics(metrics),
        }
    }

    pub fn packet_codec(&self) -> &PacketCodec {
        &self.inner
    }

    fn open(&self, packet: &Packet) -> Option<Message> {
        match Message::from_packet_with(packet, &self.inner.link) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(pid = ?packet.pid(), error = %e, "Dropping undecodable packet");
                if let Some(m) = &self.inner.metrics {
                    m.decode_failure();
                }
                None
            }
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        while let Some(packet) = self.inner.decode(src)? {
            if let Some(message) = self.open(&packet) {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Message>> {
        while let Some(packet) = self.inner.decode_eof(buf)? {
            if let Some(message) = self.open(&packet) {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<()> {
        self.inner.encode(message, dst)
    }
}
