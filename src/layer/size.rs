//! Size prefix layer

use std::fmt;
use std::marker::PhantomData;

use tracing::trace;

use super::{ProtocolLayer, forward_create_msg};
use crate::cursor::WriteBuf;
use crate::error::{Error, Result, WriteStatus};
use crate::field::NumericField;
use crate::field::sequence::within_span;

/// Layer prefixing the frame with the length of everything it wraps
///
/// The field's `ser_offset` option biases the serialised value, e.g. to also
/// count a trailing checksum written by an outer layer. On read only the
/// declared span is forwarded inwards; bytes of the span the inner layers
/// leave unread are skipped.
pub struct SizeLayer<F, Next> {
    next: Next,
    _field: PhantomData<fn() -> F>,
}

impl<F, Next> SizeLayer<F, Next> {
    /// Wrap `next`
    pub fn new(next: Next) -> Self {
        Self {
            next,
            _field: PhantomData,
        }
    }

    /// Inner layer
    pub fn next(&self) -> &Next {
        &self.next
    }
}

impl<F, Next: Default> Default for SizeLayer<F, Next> {
    fn default() -> Self {
        Self::new(Next::default())
    }
}

impl<F, Next: fmt::Debug> fmt::Debug for SizeLayer<F, Next> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeLayer").field("next", &self.next).finish()
    }
}

/// Read the size field, returning it with its own length and the declared span
fn read_size<F: NumericField>(buf: &[u8]) -> Result<(F, usize, usize)> {
    let mut cursor = buf;
    let mut field = F::default();
    field.read(&mut cursor)?;
    // A raw value below `ser_offset` wraps and no longer re-serialises
    if !field.fits_wire() {
        trace!(size = ?field, "size below offset");
        return Err(Error::ProtocolError);
    }
    let declared = usize::try_from(field.as_u64()).map_err(|_| Error::ProtocolError)?;
    Ok((field, buf.len() - cursor.len(), declared))
}

impl<F: NumericField, Next: ProtocolLayer> ProtocolLayer for SizeLayer<F, Next> {
    type Msg = Next::Msg;
    type MsgPtr = Next::MsgPtr;
    type AllFields = (F, Next::AllFields);

    fn read_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &mut Option<Next::MsgPtr>,
        buf: &mut &[u8],
    ) -> Result<()> {
        let (field, own, declared) = read_size::<F>(buf)?;
        let available = buf.len() - own;
        if declared > available {
            trace!(declared, available, "frame incomplete");
            return Err(Error::missing(declared - available));
        }
        let (mut span, rest) = buf[own..].split_at(declared);
        fields.0 = field;
        self.next
            .read_fields_cached(&mut fields.1, msg, &mut span)
            .map_err(within_span)?;
        *buf = rest;
        Ok(())
    }

    fn write_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &Next::Msg,
        out: &mut dyn WriteBuf,
    ) -> Result<WriteStatus> {
        let inner = self.next.length(msg);
        let mut field = F::default();
        field.set_u64(inner as u64);
        if field.as_u64() != inner as u64 || !field.fits_wire() {
            trace!(inner, "size does not fit field");
            return Err(Error::InvalidMsgData);
        }
        field.write(out)?;
        fields.0 = field;
        self.next.write_fields_cached(&mut fields.1, msg, out)
    }

    fn update(&self, buf: &mut [u8]) -> Result<usize> {
        let (_, own, declared) = read_size::<F>(buf)?;
        let end = own + declared;
        if end > buf.len() {
            return Err(Error::missing(end - buf.len()));
        }
        self.next.update(&mut buf[own..end])?;
        Ok(end)
    }

    fn length(&self, msg: &Next::Msg) -> usize {
        let inner = self.next.length(msg);
        let mut field = F::default();
        field.set_u64(inner as u64);
        field.length() + inner
    }

    fn frame_length(&self, buf: &[u8]) -> Result<Option<usize>> {
        let (_, own, declared) = read_size::<F>(buf)?;
        Ok(Some(own + declared))
    }
}

forward_create_msg!(SizeLayer<F>);
