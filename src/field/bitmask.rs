//! Bitmask fields

use std::fmt;
use std::marker::PhantomData;

use super::num::{self, IntType};
use super::options::{DefaultSpec, FieldSpec, InvalidPolicy};
use super::Field;
use crate::cursor::WriteBuf;
use crate::error::{Error, Result};

/// Integer treated as a set of bits
///
/// Bits listed in the reserved mask must be zero for the value to be valid.
pub struct BitmaskValue<T: IntType, S: FieldSpec = DefaultSpec> {
    bits: T,
    _spec: PhantomData<S>,
}

impl<T: IntType, S: FieldSpec> BitmaskValue<T, S> {
    /// Field holding `bits`
    #[must_use]
    pub fn new(bits: T) -> Self {
        Self {
            bits,
            _spec: PhantomData,
        }
    }

    /// Raw bits
    #[must_use]
    pub fn value(&self) -> T {
        self.bits
    }

    /// Replace all bits
    pub fn set_value(&mut self, bits: T) {
        self.bits = bits;
    }

    fn word(&self) -> u64 {
        #[allow(clippy::cast_sign_loss)]
        let word = self.bits.to_i128() as u64;
        word
    }

    fn store(&mut self, word: u64) {
        self.bits = T::from_i128(i128::from(word));
    }

    /// Whether every bit of `mask` is set
    #[must_use]
    pub fn has_all_bits_set(&self, mask: u64) -> bool {
        self.word() & mask == mask
    }

    /// Whether any bit of `mask` is set
    #[must_use]
    pub fn has_any_bits_set(&self, mask: u64) -> bool {
        self.word() & mask != 0
    }

    /// Set every bit of `mask`
    pub fn set_bits(&mut self, mask: u64) {
        self.store(self.word() | mask);
    }

    /// Clear every bit of `mask`
    pub fn clear_bits(&mut self, mask: u64) {
        self.store(self.word() & !mask);
    }

    /// State of bit `index`
    #[must_use]
    pub fn bit_value(&self, index: u32) -> bool {
        index < 64 && self.word() & (1 << index) != 0
    }

    /// Set or clear bit `index`
    pub fn set_bit_value(&mut self, index: u32, on: bool) {
        if index >= 64 {
            return;
        }
        if on {
            self.set_bits(1 << index);
        } else {
            self.clear_bits(1 << index);
        }
    }

    fn accepts(word: u64) -> bool {
        word & S::OPTIONS.reserved_bits == 0
    }
}

impl<T: IntType, S: FieldSpec> Default for BitmaskValue<T, S> {
    fn default() -> Self {
        Self::new(T::from_i128(i128::from(S::OPTIONS.default_value)))
    }
}

impl<T: IntType, S: FieldSpec> Clone for BitmaskValue<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: IntType, S: FieldSpec> Copy for BitmaskValue<T, S> {}

impl<T: IntType, S: FieldSpec> PartialEq for BitmaskValue<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T: IntType, S: FieldSpec> Eq for BitmaskValue<T, S> {}

impl<T: IntType, S: FieldSpec> fmt::Debug for BitmaskValue<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitmaskValue({:#x})", self.word())
    }
}

impl<T: IntType, S: FieldSpec> Field for BitmaskValue<T, S> {
    const MIN_LENGTH: usize = num::width_bounds(T::BYTES, &S::OPTIONS).0;
    const MAX_LENGTH: usize = num::width_bounds(T::BYTES, &S::OPTIONS).1;

    fn length(&self) -> usize {
        num::int_length(self.bits.to_i128(), T::SIGNED, T::BYTES, &S::OPTIONS)
    }

    fn valid(&self) -> bool {
        Self::accepts(self.word())
    }

    fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
        let mut cursor = *buf;
        let raw = num::read_int(&mut cursor, T::SIGNED, T::BYTES, &S::OPTIONS)?;
        let candidate = Self::new(T::from_i128(raw));
        if S::OPTIONS.on_invalid == InvalidPolicy::Fail && !candidate.valid() {
            return Err(Error::InvalidMsgData);
        }
        *self = candidate;
        *buf = cursor;
        Ok(())
    }

    fn write<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()> {
        num::write_int(out, self.bits.to_i128(), T::SIGNED, T::BYTES, &S::OPTIONS)
    }
}
