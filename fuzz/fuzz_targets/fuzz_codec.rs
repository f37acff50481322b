#![no_main]

use bytes::BytesMut;
use drone_comms::core::codec::PacketCodec;
use drone_comms::{Message, Packet};
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // Raw bytes straight into the message decoder
    let _ = Message::from_packet(&Packet::from_bytes(data));

    // Same bytes through the stream codec, split at an input-chosen point
    let split = data.first().map_or(0, |b| usize::from(*b)).min(data.len());
    let mut codec = PacketCodec::new();
    let mut src = BytesMut::from(&data[..split]);
    for tail in [&data[split..], &[][..]] {
        src.extend_from_slice(tail);
        while let Ok(Some(packet)) = codec.decode(&mut src) {
            assert!(packet.verify_checksum());
            let _ = Message::from_packet(&packet);
        }
    }
    let _ = codec.decode_eof(&mut src);
});
