//! Floating point fields

use std::fmt;
use std::marker::PhantomData;

use super::num::{self, FloatType};
use super::options::{DefaultSpec, FieldSpec, InvalidPolicy};
use super::Field;
use crate::cursor::WriteBuf;
use crate::error::{Error, Result};

/// IEEE-754 value in the configured byte order
pub struct FloatValue<T: FloatType, S: FieldSpec = DefaultSpec> {
    value: T,
    _spec: PhantomData<S>,
}

impl<T: FloatType, S: FieldSpec> FloatValue<T, S> {
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

    fn accepts(value: T) -> bool {
        match S::OPTIONS.float_range {
            Some((min, max)) => {
                let v = value.to_f64();
                min <= v && v <= max
            }
            None => true,
        }
    }
}

impl<T: FloatType, S: FieldSpec> Default for FloatValue<T, S> {
    fn default() -> Self {
        #[allow(clippy::cast_precision_loss)]
        let initial = S::OPTIONS.default_value as f64;
        Self::new(T::from_f64(initial))
    }
}

impl<T: FloatType, S: FieldSpec> Clone for FloatValue<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: FloatType, S: FieldSpec> Copy for FloatValue<T, S> {}

impl<T: FloatType, S: FieldSpec> PartialEq for FloatValue<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: FloatType, S: FieldSpec> fmt::Debug for FloatValue<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FloatValue").field(&self.value).finish()
    }
}

impl<T: FloatType, S: FieldSpec> Field for FloatValue<T, S> {
    const MIN_LENGTH: usize = T::BYTES;
    const MAX_LENGTH: usize = T::BYTES;

    fn length(&self) -> usize {
        T::BYTES
    }

    fn valid(&self) -> bool {
        Self::accepts(self.value)
    }

    fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
        num::ensure_available(buf, T::BYTES)?;
        let mut cursor = *buf;
        let value = T::get(&mut cursor, S::OPTIONS.endian);
        if S::OPTIONS.on_invalid == InvalidPolicy::Fail && !Self::accepts(value) {
            return Err(Error::InvalidMsgData);
        }
        self.value = value;
        *buf = cursor;
        Ok(())
    }

    fn write<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()> {
        num::ensure_space(out, T::BYTES)?;
        self.value.put(out, S::OPTIONS.endian);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Options;

    crate::field_spec! {
        Unit = Options::new().little_endian().float_range(0.0, 1.0)
    }

    #[test]
    fn test_little_endian_layout() {
        let field = FloatValue::<f32, Unit>::new(0.25);
        let mut out = Vec::new();
        field.write(&mut out).unwrap();
        assert_eq!(out, 0.25f32.to_le_bytes().to_vec());
        assert!(field.valid());
    }

    #[test]
    fn test_range_validity() {
        assert!(!FloatValue::<f64, Unit>::new(1.5).valid());
        assert!(!FloatValue::<f64, Unit>::new(f64::NAN).valid());
        assert!(FloatValue::<f64>::new(1.0e9).valid());
    }

    #[test]
    fn test_short_read() {
        let mut field = FloatValue::<f64>::default();
        let mut buf: &[u8] = &[0; 5];
        assert_eq!(field.read(&mut buf), Err(Error::missing(3)));
        assert_eq!(buf.len(), 5);
    }
}
