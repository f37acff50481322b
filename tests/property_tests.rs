//! Property-based tests using proptest
//!
//! These tests check the framing invariants against arbitrary messages, chunk
//! boundaries and line noise.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::BytesMut;
use drone_comms::core::codec::{MessageCodec, PacketCodec};
use drone_comms::core::packet::{checksum, Packet};
use drone_comms::protocol::command::{CameraControl, EmergencyCommand, VirtualStickCommand};
use drone_comms::protocol::message::{Message, WireMessage};
use drone_comms::protocol::status::{Acknowledgment, MessageString};
use drone_comms::protocol::telemetry::{CoreTelemetry, ExtendedTelemetry};
use proptest::prelude::*;
use tokio_util::codec::Decoder;

fn core_telemetry() -> impl Strategy<Value = CoreTelemetry> {
    (
        any::<u8>(),
        (-90.0f64..90.0, -180.0f64..180.0, -500.0f64..9000.0, 0.0f64..500.0),
        (-30.0f32..30.0, -30.0f32..30.0, -30.0f32..30.0),
        (-180.0f64..180.0, -90.0f64..90.0, -180.0f64..180.0),
    )
        .prop_map(
            |(is_flying, (latitude, longitude, altitude, hag), (v_north, v_east, v_down), (yaw, pitch, roll))| {
                CoreTelemetry {
                    is_flying,
                    latitude,
                    longitude,
                    altitude,
                    hag,
                    v_north,
                    v_east,
                    v_down,
                    yaw,
                    pitch,
                    roll,
                }
            },
        )
}

fn lossless_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        core_telemetry().prop_map(Message::from),
        (any::<u16>(), any::<u8>(), any::<u16>(), prop::collection::vec(any::<u8>(), 0..32)).prop_map(
            |(gnss_sat_count, bat_level, mission_id, drone_serial)| {
                Message::from(ExtendedTelemetry {
                    gnss_sat_count,
                    bat_level,
                    mission_id,
                    drone_serial,
                    ..Default::default()
                })
            }
        ),
        (any::<u8>(), any::<u8>()).prop_map(|(positive, source_pid)| {
            Message::from(Acknowledgment {
                positive,
                source_pid,
            })
        }),
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..64)).prop_map(|(message_type, message)| {
            Message::from(MessageString {
                message_type,
                message,
            })
        }),
        (any::<u8>(), 0.0f32..60.0)
            .prop_map(|(action, target_fps)| Message::from(CameraControl { action, target_fps })),
        any::<u8>().prop_map(|action| Message::from(EmergencyCommand { action })),
    ]
}

// Property: serialize then from_packet is the identity for lossless messages
proptest! {
    #[test]
    fn prop_message_roundtrip(msg in lossless_message()) {
        let packet = msg.serialize().expect("serialize");
        prop_assert!(packet.verify_checksum_size_and_pid(msg.pid()));
        let decoded = Message::from_packet(&packet).expect("decode");
        prop_assert_eq!(decoded, msg);
    }
}

// Property: yaw survives a virtual stick round trip within f32 precision
proptest! {
    #[test]
    fn prop_virtual_stick_yaw(yaw in -3.1f32..3.1, v_x in -15.0f32..15.0, v_y in -15.0f32..15.0) {
        let cmd = VirtualStickCommand::north_east(yaw, v_x, v_y);
        let decoded = VirtualStickCommand::deserialize(&cmd.serialize().unwrap()).unwrap();
        prop_assert!((decoded.yaw - yaw).abs() < 1e-5);
        prop_assert_eq!(decoded.v_x, v_x);
        prop_assert_eq!(decoded.v_y, v_y);
    }
}

// Property: the checksum is a running sum, so it can be extended byte by byte
proptest! {
    #[test]
    fn prop_checksum_is_incremental(data in prop::collection::vec(any::<u8>(), 0..512), extra in any::<u8>()) {
        let [a, b] = checksum(&data);
        let mut extended = data.clone();
        extended.push(extra);
        let next_a = a.wrapping_add(extra);
        prop_assert_eq!(checksum(&extended), [next_a, b.wrapping_add(next_a)]);
    }
}

// Property: byte-at-a-time accumulation completes exactly where a single append does
proptest! {
    #[test]
    fn prop_chunking_invariance(msg in lossless_message()) {
        let bytes = msg.serialize().unwrap().into_bytes();

        let mut incremental = Packet::new();
        let mut completed_at = None;
        for (i, byte) in bytes.iter().enumerate() {
            incremental.extend_from_slice(std::slice::from_ref(byte));
            if completed_at.is_none() && incremental.is_complete() {
                completed_at = Some(i + 1);
            }
        }
        prop_assert_eq!(completed_at, Some(bytes.len()));

        let whole = Packet::from_bytes(&bytes);
        prop_assert!(whole.is_complete());
        prop_assert_eq!(
            Message::from_packet(&incremental).unwrap(),
            Message::from_packet(&whole).unwrap()
        );
    }
}

// Property: arbitrary split points through the codec yield the same messages
proptest! {
    #[test]
    fn prop_codec_split_invariance(
        msgs in prop::collection::vec(lossless_message(), 1..6),
        chunk in 1usize..40,
    ) {
        let mut wire = Vec::new();
        for msg in &msgs {
            wire.extend_from_slice(msg.serialize().unwrap().as_bytes());
        }

        let mut codec = MessageCodec::new();
        let mut src = BytesMut::new();
        let mut decoded = Vec::new();
        for piece in wire.chunks(chunk) {
            src.extend_from_slice(piece);
            while let Some(msg) = codec.decode(&mut src).unwrap() {
                decoded.push(msg);
            }
        }
        prop_assert_eq!(decoded, msgs);
    }
}

// Property: noise in front of a packet never hides it, as long as the noise
// cannot itself contain the sync marker
proptest! {
    #[test]
    fn prop_leading_noise_is_skipped(
        noise in prop::collection::vec(0u8..0xDA, 0..64),
        msg in lossless_message(),
    ) {
        let mut wire = noise;
        wire.extend_from_slice(msg.serialize().unwrap().as_bytes());

        let mut codec = MessageCodec::new();
        let mut src = BytesMut::from(&wire[..]);
        prop_assert_eq!(codec.decode(&mut src).unwrap(), Some(msg));
    }
}

// Property: garbage never panics and never yields an unverified packet
proptest! {
    #[test]
    fn prop_garbage_never_panics(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let mut codec = PacketCodec::new();
        let mut src = BytesMut::from(&data[..]);
        while let Some(packet) = codec.decode(&mut src).unwrap() {
            prop_assert!(packet.verify_checksum());
        }
        prop_assert!(src.is_empty());
        let _ = codec.decode_eof(&mut src);

        let _ = Message::from_packet(&Packet::from_bytes(&data));
    }
}

// Property: a resync always shrinks a non-empty buffer
proptest! {
    #[test]
    fn prop_scan_forward_shrinks(data in prop::collection::vec(any::<u8>(), 1..256)) {
        let mut packet = Packet::from_bytes(&data);
        packet.scan_forward_for_sync();
        prop_assert!(packet.len() < data.len());
        if !packet.is_empty() {
            prop_assert_eq!(packet.as_bytes()[0], 0xDA);
            prop_assert!(data.ends_with(packet.as_bytes()));
        }
    }
}
