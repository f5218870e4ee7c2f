//! Synchronisation prefix layer

use std::fmt;

use tracing::debug;

use super::{ProtocolLayer, forward_create_msg};
use crate::cursor::{SliceWriter, WriteBuf};
use crate::error::{Error, Result, WriteStatus};
use crate::field::Field;

/// Layer expecting a fixed pattern in front of every frame
///
/// The pattern is the field's default value unless given explicitly.
pub struct SyncPrefixLayer<F, Next> {
    pattern: F,
    next: Next,
}

impl<F: Field, Next> SyncPrefixLayer<F, Next> {
    /// Wrap `next`, expecting the field's default value
    pub fn new(next: Next) -> Self {
        Self::with_pattern(F::default(), next)
    }

    /// Wrap `next`, expecting `pattern`
    pub fn with_pattern(pattern: F, next: Next) -> Self {
        Self { pattern, next }
    }

    /// Expected pattern
    pub fn pattern(&self) -> &F {
        &self.pattern
    }

    /// Inner layer
    pub fn next(&self) -> &Next {
        &self.next
    }

    /// Whether `partial` could still be the start of the pattern
    fn could_match(&self, partial: &[u8]) -> bool {
        let mut scratch = [0u8; 16];
        let mut encoded = SliceWriter::new(&mut scratch);
        match self.pattern.write(&mut encoded) {
            Ok(()) => encoded.written().starts_with(partial),
            Err(_) => true,
        }
    }

    fn own_span<'a>(&self, buf: &'a [u8]) -> Result<&'a [u8]> {
        let own = self.pattern.length();
        buf.get(own..)
            .ok_or_else(|| Error::missing(own - buf.len()))
    }
}

impl<F: Field, Next: Default> Default for SyncPrefixLayer<F, Next> {
    fn default() -> Self {
        Self::new(Next::default())
    }
}

impl<F: Field, Next: fmt::Debug> fmt::Debug for SyncPrefixLayer<F, Next> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncPrefixLayer")
            .field("pattern", &self.pattern)
            .field("next", &self.next)
            .finish()
    }
}

impl<F: Field + PartialEq, Next: ProtocolLayer> ProtocolLayer for SyncPrefixLayer<F, Next> {
    type Msg = Next::Msg;
    type MsgPtr = Next::MsgPtr;
    type AllFields = (F, Next::AllFields);

    fn read_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &mut Option<Next::MsgPtr>,
        buf: &mut &[u8],
    ) -> Result<()> {
        let mut cursor = *buf;
        let mut field = F::default();
        match field.read(&mut cursor) {
            Ok(()) if field == self.pattern => {}
            Ok(()) => {
                debug!(received = ?field, expected = ?self.pattern, "sync prefix mismatch");
                return Err(Error::ProtocolError);
            }
            Err(err @ Error::NotEnoughData { .. }) => {
                if !self.could_match(buf) {
                    debug!("sync prefix mismatch in partial input");
                    return Err(Error::ProtocolError);
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        }
        fields.0 = field;
        self.next.read_fields_cached(&mut fields.1, msg, &mut cursor)?;
        *buf = cursor;
        Ok(())
    }

    fn write_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &Next::Msg,
        out: &mut dyn WriteBuf,
    ) -> Result<WriteStatus> {
        self.pattern.write(out)?;
        fields.0 = self.pattern.clone();
        self.next.write_fields_cached(&mut fields.1, msg, out)
    }

    fn update(&self, buf: &mut [u8]) -> Result<usize> {
        let own = self.pattern.length();
        if buf.len() < own {
            return Err(Error::missing(own - buf.len()));
        }
        Ok(own + self.next.update(&mut buf[own..])?)
    }

    fn length(&self, msg: &Next::Msg) -> usize {
        self.pattern.length() + self.next.length(msg)
    }

    fn frame_length(&self, buf: &[u8]) -> Result<Option<usize>> {
        let own = self.pattern.length();
        let inner = self.next.frame_length(self.own_span(buf)?)?;
        Ok(inner.map(|len| own + len))
    }
}

impl<F: Field + Clone, Next: Clone> Clone for SyncPrefixLayer<F, Next> {
    fn clone(&self) -> Self {
        Self::with_pattern(self.pattern.clone(), self.next.clone())
    }
}

forward_create_msg!(SyncPrefixLayer<F>);
