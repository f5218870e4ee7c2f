//! Demo protocol shared by the integration tests

#![allow(dead_code)]

use std::fmt::Debug;

use tinyvec::ArrayVec;
use wirestack::ProtocolStack;
use wirestack::field::{
    ArrayList, BitmaskValue, EnumValue, FieldTuple, FloatValue, IntValue, Optional, Options,
    StringField,
};
use wirestack::layer::{
    BasicSum, ChecksumLayer, Crc16Ccitt, MsgIdLayer, PayloadLayer, SizeLayer, SyncPrefixLayer,
};
use wirestack::message::{
    DynamicFactory, InPlaceFactory, InPlaceMsg, MessageBase, MessageDispatch, MessageId,
    MessageLength, MessageRead, MessageRefresh, MessageValid, MessageWrite, MsgPtr,
};

wirestack::int_enum! {
    /// Message identifiers of the demo protocol
    pub enum MsgKind: u8 {
        RawBytes = 1,
        EnumsAndBits = 2,
        Optionals = 3,
        Lists = 4,
        Floats = 5,
    }
}

wirestack::int_enum! {
    pub enum Colour: u8 {
        Red = 0,
        Green = 1,
        Blue = 2,
    }
}

wirestack::field_spec! {
    pub SyncWord = Options::new().default_value(0xabcd);
    pub SizeWithCrc = Options::new().ser_offset(2);
    pub LowNibble = Options::new().reserved_bits(0xf0);
    pub Named = Options::new().length_prefix(1);
    pub Counted = Options::new().count_prefix(1);
    pub ByteSized = Options::new().length_prefix(2);
    pub VarCounter = Options::new().var_length(1, 4);
    pub Centi = Options::new().scaling_ratio(1, 100);
    pub Percent = Options::new().float_range(0.0, 100.0);
    pub LittleDouble = Options::new().little_endian()
}

wirestack::message_interface! {
    /// Interface every demo message provides
    pub trait DemoMessage: MessageId<Id = MsgKind>
        + MessageRead
        + MessageWrite
        + MessageLength
        + MessageValid
        + MessageRefresh
        + MessageDispatch<dyn DemoHandler>
        + Debug
}

wirestack::message_handler! {
    /// Handler of demo messages
    pub trait DemoHandler for dyn DemoMessage {
        fn handle_raw_bytes(RawBytes);
        fn handle_enums_and_bits(EnumsAndBits);
        fn handle_optionals(Optionals);
        fn handle_lists(Lists);
        fn handle_floats(Floats);
    }
}

macro_rules! demo_message {
    ($name:ident, $fields:ty) => {
        impl MessageBase for $name {
            type Id = MsgKind;
            type Fields = $fields;
            const ID: MsgKind = MsgKind::$name;
            const NAME: &'static str = stringify!($name);

            fn fields(&self) -> &Self::Fields {
                &self.fields
            }

            fn fields_mut(&mut self) -> &mut Self::Fields {
                &mut self.fields
            }
        }
    };
}

#[derive(Debug, Default)]
pub struct RawBytes {
    pub fields: (ArrayList<IntValue<u8>>,),
}

demo_message!(RawBytes, (ArrayList<IntValue<u8>>,));

impl RawBytes {
    pub fn with_data(data: &[u8]) -> Self {
        let mut msg = Self::default();
        for &byte in data {
            msg.fields.0.push(IntValue::new(byte)).unwrap();
        }
        msg
    }

    pub fn data(&self) -> Vec<u8> {
        self.fields.0.iter().map(IntValue::value).collect()
    }
}

#[derive(Debug, Default)]
pub struct EnumsAndBits {
    pub fields: (EnumValue<Colour>, BitmaskValue<u8, LowNibble>),
}

demo_message!(EnumsAndBits, (EnumValue<Colour>, BitmaskValue<u8, LowNibble>));

type OptionalFields = (
    BitmaskValue<u8>,
    Optional<IntValue<u16>>,
    Optional<StringField<Named>>,
);

/// Flags bit 0 announces the number, bit 1 the label
#[derive(Debug, Default)]
pub struct Optionals {
    pub fields: OptionalFields,
}

impl MessageBase for Optionals {
    type Id = MsgKind;
    type Fields = OptionalFields;
    const ID: MsgKind = MsgKind::Optionals;
    const NAME: &'static str = "Optionals";

    fn fields(&self) -> &Self::Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Self::Fields {
        &mut self.fields
    }

    fn read_impl(&mut self, buf: &mut &[u8]) -> wirestack::Result<()> {
        self.fields.read_until(1, buf)?;
        self.refresh_impl();
        self.fields.read_from(1, buf)
    }

    fn refresh_impl(&mut self) -> bool {
        let number = self.fields.0.bit_value(0);
        let label = self.fields.0.bit_value(1);
        let changed = self.fields.1.set_exists(number);
        self.fields.2.set_exists(label) || changed
    }
}

type ListFields = (
    IntValue<u32, VarCounter>,
    ArrayList<IntValue<u16>, Counted>,
    ArrayList<StringField<Named>, ByteSized, ArrayVec<[StringField<Named>; 4]>>,
);

#[derive(Debug, Default)]
pub struct Lists {
    pub fields: ListFields,
}

demo_message!(Lists, ListFields);

#[derive(Debug, Default)]
pub struct Floats {
    pub fields: (
        FloatValue<f32, Percent>,
        FloatValue<f64, LittleDouble>,
        IntValue<i16, Centi>,
    ),
}

demo_message!(
    Floats,
    (
        FloatValue<f32, Percent>,
        FloatValue<f64, LittleDouble>,
        IntValue<i16, Centi>,
    )
);

wirestack::message_catalog! {
    pub enum DemoCatalog: dyn DemoMessage {
        RawBytes(RawBytes),
        EnumsAndBits(EnumsAndBits),
        Optionals(Optionals),
        Lists(Lists),
        Floats(Floats),
    }
}

type Body<Fac, P> = SizeLayer<IntValue<u16>, MsgIdLayer<EnumValue<MsgKind>, Fac, PayloadLayer<P>>>;

/// `sync(2) | size(2) | id(1) | payload | sum(1)`, heap-allocated messages
pub type DemoStack = ProtocolStack<
    SyncPrefixLayer<
        IntValue<u16, SyncWord>,
        ChecksumLayer<IntValue<u8>, BasicSum, Body<DynamicFactory<DemoCatalog>, MsgPtr<dyn DemoMessage>>>,
    >,
>;

/// Same framing with a single in-place message slot
pub type InPlaceStack = ProtocolStack<
    SyncPrefixLayer<
        IntValue<u16, SyncWord>,
        ChecksumLayer<IntValue<u8>, BasicSum, Body<InPlaceFactory<DemoCatalog>, InPlaceMsg<DemoCatalog>>>,
    >,
>;

/// `sync(2) | size(2) | id(1) | payload | crc16(2)` where the size also
/// counts the trailing CRC
pub type CrcStack = ProtocolStack<
    SyncPrefixLayer<
        IntValue<u16, SyncWord>,
        ChecksumLayer<
            IntValue<u16>,
            Crc16Ccitt,
            SizeLayer<
                IntValue<u16, SizeWithCrc>,
                MsgIdLayer<EnumValue<MsgKind>, DynamicFactory<DemoCatalog>, PayloadLayer<MsgPtr<dyn DemoMessage>>>,
            >,
        >,
    >,
>;

/// The reference frame: raw bytes message carrying `01 02`
pub const RAW_FRAME: [u8; 8] = [0xab, 0xcd, 0x00, 0x03, 0x01, 0x01, 0x02, 0x07];

/// Handler recording which method saw each message
#[derive(Debug, Default)]
pub struct Recorder {
    pub seen: Vec<&'static str>,
}

impl DemoHandler for Recorder {
    fn handle(&mut self, msg: &mut dyn DemoMessage) {
        self.seen.push(msg.name());
    }

    fn handle_raw_bytes(&mut self, msg: &mut RawBytes) {
        assert!(!msg.data().is_empty());
        self.seen.push("raw");
    }

    fn handle_optionals(&mut self, _msg: &mut Optionals) {
        self.seen.push("optionals");
    }
}
