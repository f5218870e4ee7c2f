//! Small message set shared by the layer tests

use std::fmt::Debug;

use super::PayloadLayer;
use crate::field::{ArrayList, IntValue};
use crate::message::{
    DynamicFactory, InPlaceFactory, InPlaceMsg, MessageBase, MessageId, MessageLength,
    MessageRead, MessageWrite, MsgPtr,
};

crate::message_interface! {
    pub trait TestMsg: MessageId<Id = u8> + MessageRead + MessageWrite + MessageLength + Debug
}

#[derive(Debug, Default)]
pub struct Ping {
    pub fields: (IntValue<u8>, IntValue<u8>),
}

impl MessageBase for Ping {
    type Id = u8;
    type Fields = (IntValue<u8>, IntValue<u8>);
    const ID: u8 = 1;
    const NAME: &'static str = "Ping";

    fn fields(&self) -> &Self::Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Self::Fields {
        &mut self.fields
    }
}

#[derive(Debug, Default)]
pub struct Blob {
    pub fields: (ArrayList<IntValue<u8>>,),
}

impl MessageBase for Blob {
    type Id = u8;
    type Fields = (ArrayList<IntValue<u8>>,);
    const ID: u8 = 2;
    const NAME: &'static str = "Blob";

    fn fields(&self) -> &Self::Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Self::Fields {
        &mut self.fields
    }
}

crate::message_catalog! {
    pub enum TestCatalog: dyn TestMsg {
        Ping(Ping),
        Blob(Blob),
    }
}

pub type TestFactory = DynamicFactory<TestCatalog>;
pub type Payload = PayloadLayer<MsgPtr<dyn TestMsg>>;
pub type InPlacePayload = PayloadLayer<InPlaceMsg<TestCatalog>>;
pub type TestInPlaceFactory = InPlaceFactory<TestCatalog>;

pub struct Frame;

impl Frame {
    pub fn ping(first: u8, second: u8) -> MsgPtr<dyn TestMsg> {
        let mut msg = Ping::default();
        msg.fields.0.set_value(first);
        msg.fields.1.set_value(second);
        Box::new(msg)
    }

    /// Serialised body of a decoded message
    pub fn payload_of(msg: Option<&dyn TestMsg>) -> Option<Vec<u8>> {
        let msg = msg?;
        let mut out = Vec::new();
        msg.write(&mut out).ok()?;
        Some(out)
    }
}
