//! Delimiting shared by lists and strings

use super::num::{self, read_uint, write_uint};
use super::options::{Endian, Sequence};
use crate::cursor::WriteBuf;
use crate::error::{Error, Result};

/// Serialised length bounds of a sequence of `capacity` elements, each
/// between `elem_min` and `elem_max` bytes
pub(crate) const fn bounds(
    seq: Sequence,
    elem_min: usize,
    elem_max: usize,
    capacity: usize,
) -> (usize, usize) {
    let body_max = elem_max.saturating_mul(capacity);
    match seq {
        Sequence::Remaining => (0, body_max),
        Sequence::Fixed(count) => (
            elem_min.saturating_mul(count),
            elem_max.saturating_mul(count),
        ),
        Sequence::CountPrefix(width) | Sequence::LengthPrefix(width) => {
            (width, width.saturating_add(body_max))
        }
        Sequence::Terminated(terminator) => (
            terminator.len(),
            terminator.len().saturating_add(body_max),
        ),
    }
}

/// Bytes taken by the delimiter of `seq` (prefix or terminator)
pub(crate) const fn overhead(seq: Sequence) -> usize {
    match seq {
        Sequence::Remaining | Sequence::Fixed(_) => 0,
        Sequence::CountPrefix(width) | Sequence::LengthPrefix(width) => width,
        Sequence::Terminated(terminator) => terminator.len(),
    }
}

/// Read a count or length prefix
pub(crate) fn read_prefix(buf: &mut &[u8], width: usize, endian: Endian) -> Result<usize> {
    let value = read_uint(buf, width, endian)?;
    usize::try_from(value).map_err(|_| Error::ProtocolError)
}

/// Write a count or length prefix, rejecting values wider than the prefix
pub(crate) fn write_prefix<W: WriteBuf + ?Sized>(
    out: &mut W,
    value: usize,
    width: usize,
    endian: Endian,
) -> Result<()> {
    if !prefix_fits(value, width) {
        return Err(Error::InvalidMsgData);
    }
    write_uint(out, value as u64, width, endian)
}

/// Whether `value` can be represented in a `width`-byte prefix
pub(crate) fn prefix_fits(value: usize, width: usize) -> bool {
    width >= 8 || (value as u64) < (1u64 << (8 * width))
}

/// Split off a length-prefixed span, failing with the exact shortfall
pub(crate) fn take_span<'a>(buf: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    num::ensure_available(buf, len)?;
    let (span, rest) = buf.split_at(len);
    *buf = rest;
    Ok(span)
}

/// Map a shortfall inside a complete span to a framing error
pub(crate) fn within_span(err: Error) -> Error {
    match err {
        Error::NotEnoughData { .. } => Error::ProtocolError,
        other => other,
    }
}

/// Minimum additional bytes before `terminator` can follow `buf`
pub(crate) fn terminator_shortfall(buf: &[u8], terminator: &[u8]) -> usize {
    if terminator.starts_with(buf) {
        terminator.len() - buf.len()
    } else {
        1
    }
}
