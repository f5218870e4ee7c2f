//! UTF-8 string fields

use std::fmt;
use std::marker::PhantomData;

use super::num::ensure_space;
use super::options::{DefaultSpec, FieldSpec, Sequence};
use super::{sequence, Field};
use crate::cursor::WriteBuf;
use crate::error::{Error, Result};

/// Text delimited like a byte sequence
///
/// Count and length prefixes both carry the byte length. A `Fixed(n)`
/// string occupies exactly `n` bytes: it is zero-padded on write and cut at
/// the first zero byte on read.
pub struct StringField<S: FieldSpec = DefaultSpec> {
    value: String,
    _spec: PhantomData<S>,
}

impl<S: FieldSpec> StringField<S> {
    /// Field holding `value`
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _spec: PhantomData,
        }
    }

    /// Current text
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Mutable access to the text
    pub fn value_mut(&mut self) -> &mut String {
        &mut self.value
    }

    fn decode(bytes: &[u8]) -> Result<String> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidMsgData)
    }
}

impl<S: FieldSpec> Default for StringField<S> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<S: FieldSpec> Clone for StringField<S> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<S: FieldSpec> PartialEq for StringField<S> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<S: FieldSpec> Eq for StringField<S> {}

impl<S: FieldSpec> fmt::Debug for StringField<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StringField").field(&self.value).finish()
    }
}

impl<S: FieldSpec> Field for StringField<S> {
    const MIN_LENGTH: usize = sequence::bounds(S::OPTIONS.sequence, 1, 1, usize::MAX).0;
    const MAX_LENGTH: usize = sequence::bounds(S::OPTIONS.sequence, 1, 1, usize::MAX).1;

    fn length(&self) -> usize {
        match S::OPTIONS.sequence {
            Sequence::Fixed(count) => count,
            seq => sequence::overhead(seq) + self.value.len(),
        }
    }

    fn valid(&self) -> bool {
        match S::OPTIONS.sequence {
            Sequence::Fixed(count) => self.value.len() <= count,
            Sequence::CountPrefix(width) | Sequence::LengthPrefix(width) => {
                sequence::prefix_fits(self.value.len(), width)
            }
            Sequence::Terminated(terminator) => {
                !self.value.as_bytes().windows(terminator.len()).any(|w| w == terminator)
            }
            Sequence::Remaining => true,
        }
    }

    fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
        let opts = S::OPTIONS;
        let mut cursor = *buf;
        let text = match opts.sequence {
            Sequence::Remaining => {
                let all = cursor;
                cursor = &[];
                all
            }
            Sequence::Fixed(count) => {
                let span = sequence::take_span(&mut cursor, count)?;
                let end = span.iter().position(|&b| b == 0).unwrap_or(span.len());
                &span[..end]
            }
            Sequence::CountPrefix(width) | Sequence::LengthPrefix(width) => {
                let len = sequence::read_prefix(&mut cursor, width, opts.endian)?;
                sequence::take_span(&mut cursor, len)?
            }
            Sequence::Terminated(terminator) => {
                let Some(end) = cursor.windows(terminator.len()).position(|w| w == terminator)
                else {
                    let tail_start = cursor.len().saturating_sub(terminator.len() - 1);
                    let tail = &cursor[tail_start..];
                    let partial = (0..tail.len())
                        .find(|&i| terminator.starts_with(&tail[i..]))
                        .map_or(&[][..], |i| &tail[i..]);
                    return Err(Error::missing(sequence::terminator_shortfall(
                        partial, terminator,
                    )));
                };
                let text = &cursor[..end];
                cursor = &cursor[end + terminator.len()..];
                text
            }
        };
        self.value = Self::decode(text)?;
        *buf = cursor;
        Ok(())
    }

    fn write<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()> {
        let opts = S::OPTIONS;
        if !self.valid() {
            return Err(Error::InvalidMsgData);
        }
        ensure_space(out, self.length())?;
        let bytes = self.value.as_bytes();
        match opts.sequence {
            Sequence::Remaining => out.put_slice(bytes),
            Sequence::Fixed(count) => {
                out.put_slice(bytes);
                for _ in bytes.len()..count {
                    out.put_slice(&[0]);
                }
            }
            Sequence::CountPrefix(width) | Sequence::LengthPrefix(width) => {
                sequence::write_prefix(out, bytes.len(), width, opts.endian)?;
                out.put_slice(bytes);
            }
            Sequence::Terminated(terminator) => {
                out.put_slice(bytes);
                out.put_slice(terminator);
            }
        }
        Ok(())
    }
}
