//! Async stream tests: the codecs driven through tokio-util framing over an
//! in-memory duplex pipe, the way a serial or TCP link would carry them.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use drone_comms::core::codec::{MessageCodec, PacketCodec};
use drone_comms::protocol::command::{CameraControl, EmergencyCommand, VirtualStickCommand};
use drone_comms::protocol::message::{Message, MessageKind, WireMessage};
use drone_comms::protocol::status::{Acknowledgment, MessageString, Severity};
use drone_comms::protocol::telemetry::CoreTelemetry;
use drone_comms::utils::LinkMetrics;
use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{FramedRead, FramedWrite};

fn traffic() -> Vec<Message> {
    vec![
        CoreTelemetry {
            is_flying: 1,
            latitude: 44.97,
            longitude: -93.23,
            altitude: 300.0,
            hag: 35.0,
            ..Default::default()
        }
        .into(),
        MessageString::new(Severity::Info, "Taking off").into(),
        VirtualStickCommand::north_east(0.0, 1.5, -0.5).into(),
        CameraControl {
            action: 1,
            target_fps: 2.0,
        }
        .into(),
        Acknowledgment::positive(MessageKind::CameraControl).into(),
        EmergencyCommand { action: 0 }.into(),
    ]
}

#[tokio::test]
async fn test_framed_roundtrip() {
    let (client, server) = tokio::io::duplex(64);
    let mut sink = FramedWrite::new(client, MessageCodec::new());
    let mut stream = FramedRead::new(server, MessageCodec::new());

    let sent = traffic();
    let outgoing = sent.clone();
    let writer = tokio::spawn(async move {
        for msg in outgoing {
            sink.send(msg).await.expect("send");
        }
    });

    let mut received = Vec::new();
    while received.len() < sent.len() {
        let msg = stream.next().await.expect("stream open").expect("decode");
        received.push(msg);
    }
    writer.await.unwrap();
    assert_eq!(received, sent);
}

#[tokio::test]
async fn test_noisy_chunked_link() {
    let (mut client, server) = tokio::io::duplex(256);
    let metrics = Arc::new(LinkMetrics::new());
    let mut stream = FramedRead::new(server, MessageCodec::new().with_metrics(metrics.clone()));

    let sent = traffic();
    let mut wire = Vec::new();
    for (i, msg) in sent.iter().enumerate() {
        // line noise that never contains the marker's first byte
        wire.extend(std::iter::repeat(0x55).take(i * 3));
        wire.extend_from_slice(msg.serialize().unwrap().as_bytes());
    }

    let writer = tokio::spawn(async move {
        for chunk in wire.chunks(5) {
            client.write_all(chunk).await.expect("write");
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        client.shutdown().await.expect("shutdown");
    });

    let mut received = Vec::new();
    while let Some(msg) = stream.next().await {
        received.push(msg.expect("decode"));
    }
    writer.await.unwrap();

    assert_eq!(received, sent);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.packets_received, sent.len() as u64);
    assert_eq!(snapshot.bytes_discarded, (0..sent.len() as u64).map(|i| i * 3).sum::<u64>());
}

#[tokio::test]
async fn test_stream_end_mid_packet() {
    let (mut client, server) = tokio::io::duplex(64);
    let mut stream = FramedRead::new(server, PacketCodec::new());

    let whole = EmergencyCommand { action: 4 }.serialize().unwrap();
    let partial = CameraControl::default().serialize().unwrap();

    client.write_all(whole.as_bytes()).await.unwrap();
    client.write_all(&partial.as_bytes()[..8]).await.unwrap();
    drop(client);

    assert_eq!(stream.next().await.unwrap().unwrap(), whole);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_sender_counts_packets() {
    let (client, server) = tokio::io::duplex(1024);
    let metrics = Arc::new(LinkMetrics::new());
    let mut sink = FramedWrite::new(client, PacketCodec::new().with_metrics(metrics.clone()));
    let mut stream = FramedRead::new(server, PacketCodec::new());

    let packet = EmergencyCommand { action: 1 }.serialize().unwrap();
    sink.send(packet.clone()).await.unwrap();
    sink.send(packet.clone()).await.unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), packet);
    assert_eq!(stream.next().await.unwrap().unwrap(), packet);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.packets_sent, 2);
    assert_eq!(snapshot.bytes_sent, 20);
}
