//! Message contents, dispatch and allocation over the demo protocol

mod common;

use common::{
    Colour, DemoStack, EnumsAndBits, Floats, InPlaceStack, Lists, MsgKind, Optionals, RAW_FRAME,
    Recorder,
};
use wirestack::Error;
use wirestack::field::{Field, OptionalMode, StringField};
use wirestack::message::{
    MessageDispatch, MessageId, MessageLength, MessageRead, MessageRefresh, MessageValid,
};

fn round_trip(stack: &DemoStack, msg: &(dyn common::DemoMessage + 'static)) -> Box<dyn common::DemoMessage> {
    let frame = stack.encode(msg).unwrap();
    let mut buf = frame.as_slice();
    let decoded = stack.read(&mut buf).unwrap();
    assert!(buf.is_empty());
    decoded
}

#[test_log::test]
fn test_dispatch_prefers_dedicated_method() {
    let stack = DemoStack::default();
    let mut recorder = Recorder::default();

    let mut buf: &[u8] = &RAW_FRAME;
    let mut raw = stack.read(&mut buf).unwrap();
    raw.dispatch(&mut recorder);

    let mut floats = stack.create_msg(MsgKind::Floats).unwrap();
    floats.dispatch(&mut recorder);

    let mut optionals = stack.create_msg(MsgKind::Optionals).unwrap();
    optionals.dispatch(&mut recorder);

    assert_eq!(recorder.seen, vec!["raw", "Floats", "optionals"]);
}

#[test_log::test]
fn test_optional_presence_follows_flags() {
    let stack = DemoStack::default();
    let mut msg = Optionals::default();
    msg.fields.0.set_bit_value(1, true);
    assert!(msg.refresh());
    assert!(!msg.refresh());
    msg.fields.2.field_mut().set_value("hi");

    let frame = stack.encode(&msg).unwrap();
    assert_eq!(&frame[4..frame.len() - 1], &[0x03, 0x02, 0x02, b'h', b'i']);

    let decoded = round_trip(&stack, &msg);
    assert_eq!(decoded.id(), MsgKind::Optionals);
    assert_eq!(decoded.length(), 4);
}

#[test_log::test]
fn test_optional_fields_read_back() {
    let mut msg = Optionals::default();
    let mut buf: &[u8] = &[0x01, 0x12, 0x34, 0xff];
    msg.read(&mut buf).unwrap();
    assert_eq!(buf, &[0xff]);
    assert_eq!(msg.fields.1.mode(), OptionalMode::Exists);
    assert_eq!(msg.fields.1.field().value(), 0x1234);
    assert_eq!(msg.fields.2.mode(), OptionalMode::Missing);
    assert!(msg.fields.2.get().is_none());
}

#[test_log::test]
fn test_enum_and_reserved_bits_validity() {
    let stack = DemoStack::default();
    let mut msg = EnumsAndBits::default();
    msg.fields.0.set_value(Colour::Blue);
    msg.fields.1.set_bits(0x05);
    assert!(msg.valid());
    assert!(round_trip(&stack, &msg).valid());

    msg.fields.1.set_bits(0x80);
    assert!(!msg.valid());
    // Well-formed bytes still decode; validity is left to the caller
    assert!(!round_trip(&stack, &msg).valid());

    let mut unknown = EnumsAndBits::default();
    let mut buf: &[u8] = &[0x07, 0x00];
    unknown.read(&mut buf).unwrap();
    assert_eq!(unknown.fields.0.value(), None);
    assert_eq!(unknown.fields.0.raw(), 7);
    assert!(!unknown.valid());
}

#[test_log::test]
fn test_lists_layout() {
    let stack = DemoStack::default();
    let mut msg = Lists::default();
    msg.fields.0.set_value(300);
    msg.fields.1.push(wirestack::field::IntValue::new(0x0102)).unwrap();
    msg.fields.1.push(wirestack::field::IntValue::new(0x0304)).unwrap();
    msg.fields.2.push(StringField::new("ab")).unwrap();

    let body = &stack.encode(&msg).unwrap()[5..];
    assert_eq!(
        &body[..body.len() - 1],
        &[
            0x82, 0x2c, // var-length 300
            0x02, 0x01, 0x02, 0x03, 0x04, // count-prefixed u16 list
            0x00, 0x03, 0x02, b'a', b'b', // byte-length-prefixed string list
        ]
    );

    let decoded = round_trip(&stack, &msg);
    assert_eq!(decoded.length(), msg.fields.0.length() + 5 + 5);
}

#[test_log::test]
fn test_in_place_list_capacity() {
    let mut msg = Lists::default();
    for _ in 0..4 {
        msg.fields.2.push(StringField::new("x")).unwrap();
    }
    assert_eq!(
        msg.fields.2.push(StringField::new("y")),
        Err(Error::BufferOverflow)
    );

    let mut payload = vec![0x00, 0x00, 0x00, 0x0a];
    for _ in 0..5 {
        payload.extend_from_slice(&[0x01, b'z']);
    }
    let mut decoded = Lists::default();
    let mut buf = payload.as_slice();
    assert!(decoded.read(&mut buf).is_err());
    assert_eq!(buf.len(), payload.len());
}

#[test_log::test]
fn test_floats_and_scaling() {
    let stack = DemoStack::default();
    let mut msg = Floats::default();
    msg.fields.0.set_value(42.5);
    msg.fields.1.set_value(-1.25);
    msg.fields.2.set_scaled(12.34);
    assert_eq!(msg.fields.2.value(), 1234);

    let frame = stack.encode(&msg).unwrap();
    assert_eq!(&frame[5..9], &42.5f32.to_be_bytes());
    assert_eq!(&frame[9..17], &(-1.25f64).to_le_bytes());
    assert!(round_trip(&stack, &msg).valid());

    msg.fields.0.set_value(120.0);
    assert!(!msg.valid());
    assert!((msg.fields.2.scale_as() - 12.34).abs() < 1e-9);
}

#[test_log::test]
fn test_in_place_allocation_is_exclusive() {
    let stack = InPlaceStack::default();
    let mut buf: &[u8] = &RAW_FRAME;
    let first = stack.read(&mut buf).unwrap();
    assert_eq!(first.id(), MsgKind::RawBytes);

    let mut buf: &[u8] = &RAW_FRAME;
    assert_eq!(stack.read(&mut buf).unwrap_err(), Error::MsgAllocFailure);
    assert_eq!(buf.len(), RAW_FRAME.len());
    assert!(matches!(first.as_catalog(), common::DemoCatalog::RawBytes(raw) if raw.data() == [1, 2]));

    drop(first);
    let mut buf: &[u8] = &RAW_FRAME;
    assert!(stack.read(&mut buf).is_ok());
}

#[test_log::test]
fn test_create_msg_then_send() {
    let stack = DemoStack::default();
    let mut msg = stack.create_msg(MsgKind::RawBytes).unwrap();
    assert_eq!(msg.name(), "RawBytes");
    let mut buf: &[u8] = &[0x01, 0x02];
    msg.read(&mut buf).unwrap();
    assert_eq!(stack.encode(&*msg).unwrap(), RAW_FRAME.to_vec());
    assert_eq!(stack.create_msg(MsgKind::Lists).unwrap().name(), "Lists");
}
