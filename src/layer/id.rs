//! Message identifier layer

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace};

use super::{CreateMsg, ProtocolLayer};
use crate::cursor::WriteBuf;
use crate::error::{Error, Result, WriteStatus};
use crate::field::{Field, IdField};
use crate::message::{MessageId, MsgFactory};

/// Layer reading the message identifier and creating the message
///
/// The factory decides the allocation strategy (see
/// [`DynamicFactory`](crate::message::DynamicFactory) and
/// [`InPlaceFactory`](crate::message::InPlaceFactory)).
pub struct MsgIdLayer<F, Fac, Next> {
    factory: Fac,
    next: Next,
    _field: PhantomData<fn() -> F>,
}

impl<F, Fac, Next> MsgIdLayer<F, Fac, Next> {
    /// Wrap `next`, creating messages with `factory`
    pub fn new(factory: Fac, next: Next) -> Self {
        Self {
            factory,
            next,
            _field: PhantomData,
        }
    }

    /// Message factory
    pub fn factory(&self) -> &Fac {
        &self.factory
    }

    /// Inner layer
    pub fn next(&self) -> &Next {
        &self.next
    }
}

impl<F, Fac: Default, Next: Default> Default for MsgIdLayer<F, Fac, Next> {
    fn default() -> Self {
        Self::new(Fac::default(), Next::default())
    }
}

impl<F, Fac: fmt::Debug, Next: fmt::Debug> fmt::Debug for MsgIdLayer<F, Fac, Next> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MsgIdLayer")
            .field("factory", &self.factory)
            .field("next", &self.next)
            .finish()
    }
}

fn field_length<F: Field>(buf: &[u8]) -> Result<usize> {
    let mut cursor = buf;
    F::default().read(&mut cursor)?;
    Ok(buf.len() - cursor.len())
}

impl<F, Fac, Next> ProtocolLayer for MsgIdLayer<F, Fac, Next>
where
    F: IdField<Id = <Fac::Msg as MessageId>::Id>,
    Fac: MsgFactory,
    Next: ProtocolLayer<Msg = Fac::Msg, MsgPtr = Fac::Ptr>,
{
    type Msg = Fac::Msg;
    type MsgPtr = Fac::Ptr;
    type AllFields = (F, Next::AllFields);

    fn read_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &mut Option<Fac::Ptr>,
        buf: &mut &[u8],
    ) -> Result<()> {
        *msg = None;
        let mut cursor = *buf;
        let mut field = F::default();
        field.read(&mut cursor)?;
        let id = field.to_id().ok_or(Error::InvalidMsgId)?;
        trace!(?id, "message id");

        *msg = Some(self.factory.create(id).inspect_err(|err| {
            debug!(?id, %err, "message not created");
        })?);
        fields.0 = field;

        if let Err(err) = self.next.read_fields_cached(&mut fields.1, msg, &mut cursor) {
            *msg = None;
            return Err(err);
        }
        *buf = cursor;
        Ok(())
    }

    fn write_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &Fac::Msg,
        out: &mut dyn WriteBuf,
    ) -> Result<WriteStatus> {
        let field = F::from_id(msg.id());
        field.write(out)?;
        fields.0 = field;
        self.next.write_fields_cached(&mut fields.1, msg, out)
    }

    fn update(&self, buf: &mut [u8]) -> Result<usize> {
        let own = field_length::<F>(buf)?;
        let inner = self.next.update(&mut buf[own..])?;
        Ok(own + inner)
    }

    fn length(&self, msg: &Fac::Msg) -> usize {
        F::from_id(msg.id()).length() + self.next.length(msg)
    }

    fn frame_length(&self, buf: &[u8]) -> Result<Option<usize>> {
        let own = field_length::<F>(buf)?;
        Ok(self.next.frame_length(&buf[own..])?.map(|inner| own + inner))
    }
}

impl<F, Fac, Next> CreateMsg for MsgIdLayer<F, Fac, Next>
where
    F: IdField<Id = <Fac::Msg as MessageId>::Id>,
    Fac: MsgFactory,
    Next: ProtocolLayer<Msg = Fac::Msg, MsgPtr = Fac::Ptr>,
{
    fn create_msg(&self, id: <Fac::Msg as MessageId>::Id) -> Result<Fac::Ptr> {
        self.factory.create(id)
    }
}
