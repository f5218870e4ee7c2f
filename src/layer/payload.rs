//! Terminal layer handing the body to the message

use std::fmt;
use std::marker::PhantomData;
use std::ops::DerefMut;

use bytes::Bytes;
use tracing::trace;

use super::ProtocolLayer;
use crate::cursor::WriteBuf;
use crate::error::{Error, Result, WriteStatus};
use crate::message::{MessageId, MessageLength, MessageRead, MessageWrite};

/// Innermost layer: reads and writes the message body
///
/// `P` is the owning message handle of the stack. The cached field is a copy
/// of the body bytes.
pub struct PayloadLayer<P> {
    _ptr: PhantomData<fn() -> P>,
}

impl<P> PayloadLayer<P> {
    /// Create the layer
    #[must_use]
    pub const fn new() -> Self {
        Self { _ptr: PhantomData }
    }
}

impl<P> Default for PayloadLayer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for PayloadLayer<P> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for PayloadLayer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PayloadLayer")
    }
}

impl<P> ProtocolLayer for PayloadLayer<P>
where
    P: DerefMut,
    P::Target: MessageId + MessageRead + MessageWrite + MessageLength,
{
    type Msg = P::Target;
    type MsgPtr = P;
    type AllFields = Bytes;

    fn read_fields_cached(
        &self,
        fields: &mut Bytes,
        msg: &mut Option<P>,
        buf: &mut &[u8],
    ) -> Result<()> {
        let target = msg.as_deref_mut().ok_or(Error::NotSupported)?;
        let start = *buf;
        let mut cursor = start;
        target.read(&mut cursor)?;
        let consumed = start.len() - cursor.len();
        trace!(consumed, name = target.name(), "payload read");
        *fields = Bytes::copy_from_slice(&start[..consumed]);
        *buf = cursor;
        Ok(())
    }

    fn write_fields_cached(
        &self,
        fields: &mut Bytes,
        msg: &P::Target,
        out: &mut dyn WriteBuf,
    ) -> Result<WriteStatus> {
        let mark = out.position();
        msg.write(out)?;
        *fields = out
            .written_since(mark)
            .map(Bytes::copy_from_slice)
            .unwrap_or_default();
        Ok(WriteStatus::Complete)
    }

    fn update(&self, buf: &mut [u8]) -> Result<usize> {
        Ok(buf.len())
    }

    fn length(&self, msg: &P::Target) -> usize {
        msg.length()
    }

    fn frame_length(&self, _buf: &[u8]) -> Result<Option<usize>> {
        Ok(None)
    }
}
