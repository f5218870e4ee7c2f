//! Integer fields

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::fmt;
use std::marker::PhantomData;

use super::num::{self, IntType};
use super::options::{DefaultSpec, FieldSpec, InvalidPolicy};
use super::{Field, IdField, NumericField};
use crate::cursor::WriteBuf;
use crate::error::{Error, Result};

/// Integer value with configurable width, offset, ranges and scaling
///
/// The serialised value is `value + ser_offset`.
///
/// ```
/// use wirestack::field::{Field, IntValue, Options};
///
/// wirestack::field_spec! {
///     pub ThreeBytes = Options::new().fixed_length(3)
/// }
///
/// let value = IntValue::<u32, ThreeBytes>::new(0x0102_03);
/// let mut out = Vec::new();
/// value.write(&mut out).unwrap();
/// assert_eq!(out, [0x01, 0x02, 0x03]);
/// ```
pub struct IntValue<T: IntType, S: FieldSpec = DefaultSpec> {
    value: T,
    _spec: PhantomData<S>,
}

impl<T: IntType, S: FieldSpec> IntValue<T, S> {
    /// Field holding `value`
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            _spec: PhantomData,
        }
    }

    /// Current value
    #[must_use]
    pub fn value(&self) -> T {
        self.value
    }

    /// Replace the value
    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }

    /// Mutable access to the value
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Value multiplied by the configured scaling ratio
    #[must_use]
    pub fn scale_as(&self) -> f64 {
        let (num, den) = S::OPTIONS.scaling;
        self.value.to_i128() as f64 * num as f64 / den as f64
    }

    /// Store `scaled` divided by the scaling ratio, rounded to nearest
    pub fn set_scaled(&mut self, scaled: f64) {
        let (num, den) = S::OPTIONS.scaling;
        let raw = (scaled * den as f64 / num as f64).round();
        self.value = T::from_i128(raw as i128);
    }

    fn serialised(&self) -> i128 {
        self.value.to_i128() + i128::from(S::OPTIONS.ser_offset)
    }
}

impl<T: IntType, S: FieldSpec> Default for IntValue<T, S> {
    fn default() -> Self {
        Self::new(T::from_i128(i128::from(S::OPTIONS.default_value)))
    }
}

impl<T: IntType, S: FieldSpec> Clone for IntValue<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: IntType, S: FieldSpec> Copy for IntValue<T, S> {}

impl<T: IntType, S: FieldSpec> PartialEq for IntValue<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: IntType, S: FieldSpec> Eq for IntValue<T, S> {}

impl<T: IntType, S: FieldSpec> fmt::Debug for IntValue<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntValue").field(&self.value).finish()
    }
}

impl<T: IntType, S: FieldSpec> From<T> for IntValue<T, S> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: IntType, S: FieldSpec> Field for IntValue<T, S> {
    const MIN_LENGTH: usize = num::width_bounds(T::BYTES, &S::OPTIONS).0;
    const MAX_LENGTH: usize = num::width_bounds(T::BYTES, &S::OPTIONS).1;

    /// Serialised length; the maximum width when a variable-width value does
    /// not fit, see [`NumericField::fits_wire`]
    fn length(&self) -> usize {
        num::int_length(self.serialised(), T::SIGNED, T::BYTES, &S::OPTIONS)
    }

    fn valid(&self) -> bool {
        S::OPTIONS.in_ranges(self.value.to_i128())
    }

    fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
        let mut cursor = *buf;
        let raw = num::read_int(&mut cursor, T::SIGNED, T::BYTES, &S::OPTIONS)?;
        let value = T::from_i128(raw - i128::from(S::OPTIONS.ser_offset));
        if S::OPTIONS.on_invalid == InvalidPolicy::Fail && !S::OPTIONS.in_ranges(value.to_i128()) {
            return Err(Error::InvalidMsgData);
        }
        self.value = value;
        *buf = cursor;
        Ok(())
    }

    fn write<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()> {
        num::write_int(out, self.serialised(), T::SIGNED, T::BYTES, &S::OPTIONS)
    }
}

impl<T: IntType, S: FieldSpec> IdField for IntValue<T, S> {
    type Id = T;

    fn from_id(id: T) -> Self {
        Self::new(id)
    }

    fn to_id(&self) -> Option<T> {
        Some(self.value)
    }
}

impl<T: IntType, S: FieldSpec> NumericField for IntValue<T, S> {
    fn as_u64(&self) -> u64 {
        self.value.to_i128() as u64
    }

    fn set_u64(&mut self, value: u64) {
        self.value = T::from_i128(i128::from(value));
    }

    fn fits_wire(&self) -> bool {
        num::int_fits(self.serialised(), T::SIGNED, T::BYTES, &S::OPTIONS)
    }
}
