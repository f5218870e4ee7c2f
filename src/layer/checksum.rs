//! Trailing checksum layer and checksum calculators

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace};
use xxhash_rust::xxh3::xxh3_64;

use super::{ProtocolLayer, forward_create_msg};
use crate::cursor::{SliceWriter, WriteBuf};
use crate::error::{Error, Result, WriteStatus};
use crate::field::NumericField;
use crate::field::sequence::within_span;

/// Checksum algorithm over a byte span
///
/// The result is truncated to the width of the checksum field.
pub trait ChecksumCalc {
    /// Algorithm name used in diagnostics
    const NAME: &'static str;

    /// Checksum of `data`
    fn calc(data: &[u8]) -> u64;
}

/// Wrapping sum of all bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSum;

impl ChecksumCalc for BasicSum {
    const NAME: &'static str = "sum";

    fn calc(data: &[u8]) -> u64 {
        data.iter()
            .fold(0u64, |acc, &byte| acc.wrapping_add(u64::from(byte)))
    }
}

/// CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF, no reflection)
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc16Ccitt;

impl ChecksumCalc for Crc16Ccitt {
    const NAME: &'static str = "crc16-ccitt";

    fn calc(data: &[u8]) -> u64 {
        let mut crc: u16 = 0xFFFF;
        for &byte in data {
            crc ^= u16::from(byte) << 8;
            for _ in 0..8 {
                crc = if crc & 0x8000 == 0 {
                    crc << 1
                } else {
                    (crc << 1) ^ 0x1021
                };
            }
        }
        u64::from(crc)
    }
}

/// CRC-32 (ISO-HDLC, reflected poly 0xEDB88320)
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl ChecksumCalc for Crc32 {
    const NAME: &'static str = "crc32";

    fn calc(data: &[u8]) -> u64 {
        let mut crc: u32 = 0xFFFF_FFFF;
        for &byte in data {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                crc = if crc & 1 == 0 {
                    crc >> 1
                } else {
                    (crc >> 1) ^ 0xEDB8_8320
                };
            }
        }
        u64::from(crc ^ 0xFFFF_FFFF)
    }
}

/// 64-bit XXH3 hash
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3;

impl ChecksumCalc for Xxh3 {
    const NAME: &'static str = "xxh3";

    fn calc(data: &[u8]) -> u64 {
        xxh3_64(data)
    }
}

/// Layer appending a checksum over everything it wraps
///
/// On read the checksum is verified before any inner layer interprets the
/// frame, so a corrupted frame never reaches the id layer or the message.
/// Writing into a sequential sink leaves a placeholder and reports
/// [`WriteStatus::UpdateRequired`]; [`ProtocolLayer::update`] fills it in.
pub struct ChecksumLayer<F, C, Next> {
    next: Next,
    _field: PhantomData<fn() -> (F, C)>,
}

impl<F, C, Next> ChecksumLayer<F, C, Next> {
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

impl<F, C, Next: Default> Default for ChecksumLayer<F, C, Next> {
    fn default() -> Self {
        Self::new(Next::default())
    }
}

impl<F, C: ChecksumCalc, Next: fmt::Debug> fmt::Debug for ChecksumLayer<F, C, Next> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChecksumLayer")
            .field("algorithm", &C::NAME)
            .field("next", &self.next)
            .finish()
    }
}

impl<F: NumericField, C: ChecksumCalc, Next: ProtocolLayer> ChecksumLayer<F, C, Next> {
    /// Serialised checksum width, shared by reads, writes and length peeks
    const TRAILER: usize = {
        assert!(
            F::MIN_LENGTH == F::MAX_LENGTH,
            "checksum field must have a fixed width"
        );
        F::MIN_LENGTH
    };

    /// Length of the checksummed span at the start of `buf`
    fn span(&self, buf: &[u8]) -> Result<usize> {
        match self.next.frame_length(buf)? {
            Some(span) if span > buf.len() => Err(Error::missing(span - buf.len() + Self::TRAILER)),
            Some(span) => Ok(span),
            None => buf
                .len()
                .checked_sub(Self::TRAILER)
                .ok_or_else(|| Error::missing(Self::TRAILER - buf.len())),
        }
    }

    /// Checksum of `body` truncated to the trailer width
    fn expected(body: &[u8]) -> F {
        let bits = Self::TRAILER * 8;
        let mask = if bits >= 64 { u64::MAX } else { (1 << bits) - 1 };
        let mut field = F::default();
        field.set_u64(C::calc(body) & mask);
        field
    }
}

impl<F, C, Next> ProtocolLayer for ChecksumLayer<F, C, Next>
where
    F: NumericField,
    C: ChecksumCalc,
    Next: ProtocolLayer,
{
    type Msg = Next::Msg;
    type MsgPtr = Next::MsgPtr;
    type AllFields = (F, Next::AllFields);

    fn read_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &mut Option<Next::MsgPtr>,
        buf: &mut &[u8],
    ) -> Result<()> {
        let span = self.span(buf)?;
        let (body, mut tail) = buf.split_at(span);

        let mut received = F::default();
        received.read(&mut tail)?;
        let expected = Self::expected(body);
        if received.as_u64() != expected.as_u64() {
            debug!(
                algorithm = C::NAME,
                received = received.as_u64(),
                expected = expected.as_u64(),
                "checksum mismatch"
            );
            return Err(Error::ProtocolError);
        }
        trace!(algorithm = C::NAME, span, "checksum verified");

        fields.0 = received;
        let mut body = body;
        self.next
            .read_fields_cached(&mut fields.1, msg, &mut body)
            .map_err(within_span)?;
        *buf = tail;
        Ok(())
    }

    fn write_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &Next::Msg,
        out: &mut dyn WriteBuf,
    ) -> Result<WriteStatus> {
        let mark = out.position();
        let inner = self.next.write_fields_cached(&mut fields.1, msg, out)?;
        let (field, status) = match out.written_since(mark) {
            Some(body) if inner == WriteStatus::Complete => (Self::expected(body), inner),
            _ => {
                trace!(algorithm = C::NAME, "checksum deferred to update");
                (F::default(), WriteStatus::UpdateRequired)
            }
        };
        field.write(out)?;
        fields.0 = field;
        Ok(inner.merge(status))
    }

    fn update(&self, buf: &mut [u8]) -> Result<usize> {
        let span = self.span(buf)?;
        self.next.update(&mut buf[..span])?;
        let (body, tail) = buf.split_at_mut(span);
        let field = Self::expected(body);
        let mut out = SliceWriter::new(tail);
        field.write(&mut out)?;
        Ok(span + out.position())
    }

    fn length(&self, msg: &Next::Msg) -> usize {
        self.next.length(msg) + Self::TRAILER
    }

    fn frame_length(&self, buf: &[u8]) -> Result<Option<usize>> {
        Ok(self.next.frame_length(buf)?.map(|span| span + Self::TRAILER))
    }
}

forward_create_msg!(ChecksumLayer<F, C>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::IntValue;
    use crate::layer::testing::{Frame, Payload, TestFactory};
    use crate::layer::{MsgIdLayer, SizeLayer};
    use crate::cursor::StreamWriter;

    type Stack = ChecksumLayer<
        IntValue<u8>,
        BasicSum,
        SizeLayer<IntValue<u16>, MsgIdLayer<IntValue<u8>, TestFactory, Payload>>,
    >;

    type Unsized = ChecksumLayer<IntValue<u16>, Crc16Ccitt, MsgIdLayer<IntValue<u8>, TestFactory, Payload>>;

    #[test]
    fn test_check_values() {
        let data = b"123456789";
        assert_eq!(Crc16Ccitt::calc(data), 0x29B1);
        assert_eq!(Crc32::calc(data), 0xCBF4_3926);
        assert_eq!(BasicSum::calc(&[0xff, 0x02]), 0x101);
        assert_eq!(Xxh3::calc(data), xxh3_64(data));
    }

    #[test]
    fn test_write_then_read() {
        let layer = Stack::default();
        let msg = Frame::ping(1, 2);
        let mut out = Vec::new();
        assert_eq!(layer.write(&*msg, &mut out), Ok(WriteStatus::Complete));
        assert_eq!(out, vec![0x00, 0x03, 0x01, 0x01, 0x02, 0x07]);
        assert_eq!(layer.length(&*msg), out.len());

        let mut slot = None;
        let mut buf = out.as_slice();
        layer.read(&mut slot, &mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(Frame::payload_of(slot.as_deref()), Some(vec![1, 2]));
    }

    #[test]
    fn test_mismatch_is_protocol_error() {
        let layer = Stack::default();
        let mut slot = None;
        let mut buf: &[u8] = &[0x00, 0x03, 0x01, 0x01, 0x02, 0x08];
        assert_eq!(layer.read(&mut slot, &mut buf), Err(Error::ProtocolError));
        assert!(slot.is_none());
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn test_short_frame_reports_missing() {
        let layer = Stack::default();
        let mut slot = None;
        let mut buf: &[u8] = &[0x00, 0x03, 0x01];
        assert_eq!(layer.read(&mut slot, &mut buf), Err(Error::missing(3)));
    }

    #[test]
    fn test_unbounded_body_takes_trailer_from_end() {
        let layer = Unsized::default();
        let msg = Frame::ping(9, 8);
        let mut out = Vec::new();
        layer.write(&*msg, &mut out).unwrap();
        let crc = Crc16Ccitt::calc(&[0x01, 9, 8]);
        assert_eq!(&out[3..], &crc.to_be_bytes()[6..]);

        let mut slot = None;
        let mut buf = out.as_slice();
        layer.read(&mut slot, &mut buf).unwrap();
        assert_eq!(Frame::payload_of(slot.as_deref()), Some(vec![9, 8]));
    }

    #[test]
    fn test_trailer_width_consistent() {
        crate::field_spec! {
            ThreeBytes = crate::field::Options::new().fixed_length(3)
        }
        type Narrow = ChecksumLayer<
            IntValue<u32, ThreeBytes>,
            Crc32,
            SizeLayer<IntValue<u8>, MsgIdLayer<IntValue<u8>, TestFactory, Payload>>,
        >;

        let layer = Narrow::default();
        let msg = Frame::ping(1, 2);
        let mut out = Vec::new();
        layer.write(&*msg, &mut out).unwrap();
        assert_eq!(out.len(), 4 + 3);
        assert_eq!(layer.length(&*msg), out.len());
        assert_eq!(layer.frame_length(&out), Ok(Some(out.len())));
        let crc = Crc32::calc(&out[..4]);
        assert_eq!(&out[4..], &crc.to_be_bytes()[5..]);

        let mut slot = None;
        let mut buf = &out[..5];
        assert_eq!(layer.read(&mut slot, &mut buf), Err(Error::missing(2)));

        let mut streamed = StreamWriter::new(Vec::new());
        layer.write(&*msg, &mut streamed).unwrap();
        let mut frame = streamed.into_inner();
        assert_eq!(layer.update(&mut frame), Ok(7));
        assert_eq!(frame, out);
    }

    #[test]
    fn test_stream_write_needs_update() {
        let layer = Stack::default();
        let msg = Frame::ping(1, 2);
        let mut out = StreamWriter::new(bytes::BytesMut::new());
        assert_eq!(
            layer.write(&*msg, &mut out),
            Ok(WriteStatus::UpdateRequired)
        );
        let mut frame = out.into_inner().to_vec();
        assert_eq!(frame[5], 0);
        assert_eq!(layer.update(&mut frame), Ok(6));
        assert_eq!(frame, vec![0x00, 0x03, 0x01, 0x01, 0x02, 0x07]);
    }

    #[test]
    fn test_cached_fields_hold_checksum() {
        let layer = Stack::default();
        let mut fields = <Stack as ProtocolLayer>::AllFields::default();
        let mut slot = None;
        let mut buf: &[u8] = &[0x00, 0x03, 0x01, 0x01, 0x02, 0x07];
        layer.read_fields_cached(&mut fields, &mut slot, &mut buf).unwrap();
        assert_eq!(fields.0.value(), 7);
        assert_eq!(fields.1.0.value(), 3);
        assert_eq!(fields.1.1.0.value(), 1);
        assert_eq!(&fields.1.1.1[..], &[1, 2]);
    }
}
