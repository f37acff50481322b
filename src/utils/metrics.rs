//! Link Metrics
//!
//! Counters for one drone link (or a group of links sharing an `Arc`).
//! A [`PacketCodec`](crate::core::codec::PacketCodec) updates them as bytes are
//! framed; callers read them through [`LinkMetrics::snapshot`].
//!
//! Uses relaxed atomic counters; values are monotonic but not mutually consistent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Atomic counters for packet framing on a link
#[derive(Debug)]
pub struct LinkMetrics {
    /// Validated packets handed to the caller
    pub packets_received: AtomicU64,
    /// Packets written by the encoder
    pub packets_sent: AtomicU64,
    /// Bytes of validated packets received
    pub bytes_received: AtomicU64,
    /// Bytes of packets written
    pub bytes_sent: AtomicU64,
    /// Complete packets whose size or trailer failed validation
    pub checksum_failures: AtomicU64,
    /// Headers advertising a size below the minimum or above the limit
    pub oversized_headers: AtomicU64,
    /// Calls to the sync-marker scan
    pub resyncs: AtomicU64,
    /// Bytes thrown away while realigning
    pub bytes_discarded: AtomicU64,
    /// Valid packets that did not decode into a message
    pub decode_failures: AtomicU64,
    start_time: Instant,
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self {
            packets_received: AtomicU64::new(0),
            packets_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            checksum_failures: AtomicU64::new(0),
            oversized_headers: AtomicU64::new(0),
            resyncs: AtomicU64::new(0),
            bytes_discarded: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn packet_received(&self, byte_count: usize) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    pub fn packet_sent(&self, byte_count: usize) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    pub fn checksum_failure(&self) {
        self.checksum_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn oversized_header(&self) {
        self.oversized_headers.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one realignment and how many bytes it dropped
    pub fn resync(&self, discarded: usize) {
        self.resyncs.fetch_add(1, Ordering::Relaxed);
        self.bytes_discarded
            .fetch_add(discarded as u64, Ordering::Relaxed);
    }

    /// Bytes dropped outside a resync (e.g. a partial packet at end of stream)
    pub fn discarded(&self, byte_count: usize) {
        self.bytes_discarded
            .fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    pub fn decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LinkMetricsSnapshot {
        LinkMetricsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            checksum_failures: self.checksum_failures.load(Ordering::Relaxed),
            oversized_headers: self.oversized_headers.load(Ordering::Relaxed),
            resyncs: self.resyncs.load(Ordering::Relaxed),
            bytes_discarded: self.bytes_discarded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            packets_received = snapshot.packets_received,
            packets_sent = snapshot.packets_sent,
            bytes_received = snapshot.bytes_received,
            bytes_sent = snapshot.bytes_sent,
            checksum_failures = snapshot.checksum_failures,
            oversized_headers = snapshot.oversized_headers,
            resyncs = snapshot.resyncs,
            bytes_discarded = snapshot.bytes_discarded,
            decode_failures = snapshot.decode_failures,
            uptime_seconds = snapshot.uptime_seconds,
            "Link metrics snapshot"
        );
    }
}

impl Default for LinkMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`LinkMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkMetricsSnapshot {
    pub packets_received: u64,
    pub packets_sent: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub checksum_failures: u64,
    pub oversized_headers: u64,
    pub resyncs: u64,
    pub bytes_discarded: u64,
    pub decode_failures: u64,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = LinkMetrics::new();
        metrics.packet_received(78);
        metrics.packet_received(11);
        metrics.packet_sent(10);
        metrics.resync(3);
        metrics.resync(4);
        metrics.discarded(2);
        metrics.checksum_failure();

        let snap = metrics.snapshot();
        assert_eq!(snap.packets_received, 2);
        assert_eq!(snap.bytes_received, 89);
        assert_eq!(snap.packets_sent, 1);
        assert_eq!(snap.bytes_sent, 10);
        assert_eq!(snap.resyncs, 2);
        assert_eq!(snap.bytes_discarded, 9);
        assert_eq!(snap.checksum_failures, 1);
        assert_eq!(snap.decode_failures, 0);
    }
}
