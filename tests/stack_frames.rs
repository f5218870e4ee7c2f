//! Framing behaviour of complete stacks over the demo protocol

mod common;

use bytes::BytesMut;
use common::{CrcStack, DemoStack, MsgKind, RAW_FRAME, RawBytes};
use proptest::prelude::*;
use wirestack::layer::{ChecksumCalc, Crc16Ccitt};
use wirestack::message::{MessageId, MessageValid, MessageWrite};
use wirestack::{Error, ErrorClass, ErrorStatus, SliceWriter, StreamWriter, WriteBuf, WriteStatus};

fn raw_data(stack_msg: &dyn common::DemoMessage) -> Vec<u8> {
    let mut out = Vec::new();
    stack_msg.write(&mut out).unwrap();
    out
}

#[test_log::test]
fn test_reference_frame() {
    let stack = DemoStack::default();
    let mut buf: &[u8] = &RAW_FRAME;
    let msg = stack.read(&mut buf).unwrap();
    assert_eq!(msg.id(), MsgKind::RawBytes);
    assert_eq!(raw_data(&*msg), vec![0x01, 0x02]);
    assert!(msg.valid());
    assert!(buf.is_empty());
}

#[test_log::test]
fn test_encode_reference_frame() {
    let stack = DemoStack::default();
    let msg = RawBytes::with_data(&[1, 2]);
    assert_eq!(stack.length(&msg), RAW_FRAME.len());
    assert_eq!(stack.encode(&msg).unwrap(), RAW_FRAME.to_vec());
}

#[test_log::test]
fn test_every_truncation_is_recoverable() {
    let stack = DemoStack::default();
    for cut in 0..RAW_FRAME.len() {
        let mut buf = &RAW_FRAME[..cut];
        let err = stack.read(&mut buf).unwrap_err();
        match err {
            Error::NotEnoughData { missing: Some(missing) } => {
                assert!(missing > 0 && missing <= RAW_FRAME.len() - cut, "cut {cut}: {missing}");
            }
            other => panic!("cut {cut}: unexpected {other:?}"),
        }
        assert_eq!(buf.len(), cut);
        assert_eq!(ErrorStatus::from(err).class(), ErrorClass::Insufficiency);
    }
}

#[test_log::test]
fn test_sync_corruption() {
    let stack = DemoStack::default();
    for byte in 0..2 {
        for bit in 0..8 {
            let mut frame = RAW_FRAME;
            frame[byte] ^= 1 << bit;
            let mut buf: &[u8] = &frame;
            assert_eq!(stack.read(&mut buf).unwrap_err(), Error::ProtocolError);
        }
    }
}

#[test_log::test]
fn test_checksum_corruption() {
    let stack = DemoStack::default();
    for byte in 4..RAW_FRAME.len() {
        for bit in 0..8 {
            let mut frame = RAW_FRAME;
            frame[byte] ^= 1 << bit;
            let mut buf: &[u8] = &frame;
            assert_eq!(
                stack.read(&mut buf).unwrap_err(),
                Error::ProtocolError,
                "byte {byte} bit {bit}"
            );
        }
    }
}

#[test_log::test]
fn test_size_corruption_never_decodes() {
    let stack = DemoStack::default();
    for byte in 2..4 {
        for bit in 0..8 {
            let mut frame = RAW_FRAME;
            frame[byte] ^= 1 << bit;
            let mut buf: &[u8] = &frame;
            let err = stack.read(&mut buf).unwrap_err();
            // A larger declared size waits for more input
            assert!(
                err == Error::ProtocolError || matches!(err, Error::NotEnoughData { .. }),
                "byte {byte} bit {bit}: {err:?}"
            );
        }
    }
}

#[test_log::test]
fn test_unknown_id() {
    let stack = DemoStack::default();
    let mut frame = RAW_FRAME;
    frame[4] = 0x09;
    frame[7] = 0x0f;
    let mut buf: &[u8] = &frame;
    assert_eq!(stack.read(&mut buf).unwrap_err(), Error::InvalidMsgId);
    assert_eq!(buf.len(), frame.len());
}

#[test_log::test]
fn test_size_offset_counts_crc() {
    let stack = CrcStack::default();
    let msg = RawBytes::with_data(&[0x01, 0x02]);
    let frame = stack.encode(&msg).unwrap();

    let size = u16::from_be_bytes([frame[2], frame[3]]);
    assert_eq!(usize::from(size), 2 + 1 + 2);
    assert_eq!(frame.len(), 2 + 2 + 1 + 2 + 2);

    let crc = Crc16Ccitt::calc(&frame[2..7]);
    assert_eq!(&frame[7..], &crc.to_be_bytes()[6..]);

    let mut buf = frame.as_slice();
    let decoded = stack.read(&mut buf).unwrap();
    assert_eq!(raw_data(&*decoded), vec![0x01, 0x02]);
}

#[test_log::test]
fn test_stream_sink_requires_update() {
    let stack = DemoStack::default();
    let msg = RawBytes::with_data(&[1, 2]);
    let mut out = StreamWriter::new(BytesMut::new());
    assert_eq!(stack.write(&msg, &mut out), Ok(WriteStatus::UpdateRequired));
    assert_eq!(ErrorStatus::of_write(&Ok(WriteStatus::UpdateRequired)), ErrorStatus::UpdateRequired);

    let mut frame = out.into_inner();
    assert_ne!(&frame[..], &RAW_FRAME[..]);
    assert_eq!(stack.update(&mut frame), Ok(RAW_FRAME.len()));
    assert_eq!(&frame[..], &RAW_FRAME[..]);
}

#[test_log::test]
fn test_slice_sink_is_complete() {
    let stack = DemoStack::default();
    let msg = RawBytes::with_data(&[1, 2]);
    let mut storage = [0u8; 16];
    let mut out = SliceWriter::new(&mut storage);
    assert_eq!(stack.write(&msg, &mut out), Ok(WriteStatus::Complete));
    assert_eq!(out.position(), RAW_FRAME.len());
    assert_eq!(out.written(), &RAW_FRAME[..]);
}

#[test_log::test]
fn test_output_too_small() {
    let stack = DemoStack::default();
    let msg = RawBytes::with_data(&[1, 2]);
    let mut out = StreamWriter::with_limit(Vec::new(), RAW_FRAME.len() - 1);
    assert_eq!(stack.write(&msg, &mut out), Err(Error::BufferOverflow));
    assert!(out.into_inner().is_empty());
}

#[test_log::test]
fn test_cached_transport_fields() {
    let stack = DemoStack::default();
    let mut fields = Default::default();
    let mut buf: &[u8] = &RAW_FRAME;
    stack.read_fields_cached(&mut fields, &mut buf).unwrap();

    let (sync, (checksum, (size, (id, body)))) = &fields;
    assert_eq!(sync.value(), 0xabcd);
    assert_eq!(checksum.value(), 0x07);
    assert_eq!(size.value(), 3);
    assert_eq!(id.value(), Some(MsgKind::RawBytes));
    assert_eq!(&body[..], &[0x01, 0x02]);
}

#[test_log::test]
fn test_back_to_back_frames() {
    let stack = DemoStack::default();
    let mut input = Vec::new();
    input.extend_from_slice(&RAW_FRAME);
    input.extend_from_slice(&stack.encode(&RawBytes::with_data(&[9, 9, 9])).unwrap());
    input.extend_from_slice(&RAW_FRAME[..3]);

    let mut buf = input.as_slice();
    let first = stack.read(&mut buf).unwrap();
    let second = stack.read(&mut buf).unwrap();
    assert_eq!(raw_data(&*first), vec![1, 2]);
    assert_eq!(raw_data(&*second), vec![9, 9, 9]);
    assert!(matches!(stack.read(&mut buf), Err(Error::NotEnoughData { .. })));
    assert_eq!(buf, &RAW_FRAME[..3]);
}

#[test_log::test]
fn test_resync_after_garbage() {
    let stack = DemoStack::default();
    let mut input = vec![0x00, 0xab, 0x11];
    input.extend_from_slice(&RAW_FRAME);

    let mut buf = input.as_slice();
    let mut dropped = 0;
    let msg = loop {
        match stack.read(&mut buf) {
            Ok(msg) => break msg,
            Err(Error::ProtocolError) => {
                buf = &buf[1..];
                dropped += 1;
            }
            Err(err) => panic!("unexpected {err:?}"),
        }
    };
    assert_eq!(dropped, 3);
    assert_eq!(raw_data(&*msg), vec![1, 2]);
}

#[test_log::test]
fn test_metrics_track_frames() {
    let stack = DemoStack::default();
    let before = wirestack::metrics::snapshot();
    let mut buf: &[u8] = &RAW_FRAME;
    stack.read(&mut buf).unwrap();
    let mut bad = RAW_FRAME;
    bad[7] ^= 0xff;
    let mut buf: &[u8] = &bad;
    let _ = stack.read(&mut buf);

    let after = wirestack::metrics::snapshot();
    assert!(after.frames_read > before.frames_read);
    assert!(after.malformed_errors > before.malformed_errors);
    assert!(after.max_frame_len >= RAW_FRAME.len() as u64);
}

proptest! {
    #[test]
    fn test_raw_payload_round_trip(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let stack = DemoStack::default();
        let frame = stack.encode(&RawBytes::with_data(&data)).unwrap();
        prop_assert_eq!(frame.len(), 2 + 2 + 1 + data.len() + 1);

        let mut buf = frame.as_slice();
        let msg = stack.read(&mut buf).unwrap();
        prop_assert!(buf.is_empty());
        prop_assert_eq!(raw_data(&*msg), data);
    }

    #[test]
    fn test_body_bit_flip_detected(
        data in proptest::collection::vec(any::<u8>(), 1..32),
        pick in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let stack = DemoStack::default();
        let mut frame = stack.encode(&RawBytes::with_data(&data)).unwrap();
        let at = 4 + pick.index(frame.len() - 4);
        frame[at] ^= 1 << bit;
        let mut buf = frame.as_slice();
        prop_assert_eq!(stack.read(&mut buf).unwrap_err(), Error::ProtocolError);
    }

    #[test]
    fn test_truncated_frame_waits(
        data in proptest::collection::vec(any::<u8>(), 0..32),
        pick in any::<prop::sample::Index>(),
    ) {
        let stack = DemoStack::default();
        let frame = stack.encode(&RawBytes::with_data(&data)).unwrap();
        let cut = pick.index(frame.len());
        let mut buf = &frame[..cut];
        let err = stack.read(&mut buf).unwrap_err();
        prop_assert!(err.is_recoverable());
        prop_assert_eq!(buf.len(), cut);
    }
}
