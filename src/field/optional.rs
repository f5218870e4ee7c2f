//! Fields with runtime presence

use std::fmt;
use std::marker::PhantomData;

use super::options::{DefaultSpec, FieldSpec, OptionalMode};
use super::Field;
use crate::cursor::WriteBuf;
use crate::error::Result;

/// Wrapper whose presence on the wire is governed by an [`OptionalMode`]
///
/// The initial mode comes from the `optional_mode` option. Messages usually
/// switch it from a flags field in their refresh hook.
pub struct Optional<F: Field, S: FieldSpec = DefaultSpec> {
    field: F,
    mode: OptionalMode,
    _spec: PhantomData<S>,
}

impl<F: Field, S: FieldSpec> Optional<F, S> {
    /// Present field holding `field`
    #[must_use]
    pub fn exists(field: F) -> Self {
        Self {
            field,
            mode: OptionalMode::Exists,
            _spec: PhantomData,
        }
    }

    /// Absent field
    #[must_use]
    pub fn missing() -> Self {
        Self {
            field: F::default(),
            mode: OptionalMode::Missing,
            _spec: PhantomData,
        }
    }

    /// Current mode
    #[must_use]
    pub fn mode(&self) -> OptionalMode {
        self.mode
    }

    /// Change the mode
    pub fn set_mode(&mut self, mode: OptionalMode) {
        self.mode = mode;
    }

    /// Set `Exists` when `present`, `Missing` otherwise. Returns whether the
    /// mode changed.
    pub fn set_exists(&mut self, present: bool) -> bool {
        let mode = if present {
            OptionalMode::Exists
        } else {
            OptionalMode::Missing
        };
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    /// Whether the field is present
    #[must_use]
    pub fn does_exist(&self) -> bool {
        self.mode == OptionalMode::Exists
    }

    /// Inner field regardless of mode
    #[must_use]
    pub fn field(&self) -> &F {
        &self.field
    }

    /// Inner field, mutably
    pub fn field_mut(&mut self) -> &mut F {
        &mut self.field
    }

    /// Inner field when present
    #[must_use]
    pub fn get(&self) -> Option<&F> {
        self.does_exist().then_some(&self.field)
    }
}

impl<F: Field, S: FieldSpec> Default for Optional<F, S> {
    fn default() -> Self {
        Self {
            field: F::default(),
            mode: S::OPTIONS.optional_mode,
            _spec: PhantomData,
        }
    }
}

impl<F: Field, S: FieldSpec> Clone for Optional<F, S> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            mode: self.mode,
            _spec: PhantomData,
        }
    }
}

impl<F: Field + PartialEq, S: FieldSpec> PartialEq for Optional<F, S> {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && (self.mode != OptionalMode::Exists || self.field == other.field)
    }
}

impl<F: Field, S: FieldSpec> fmt::Debug for Optional<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            OptionalMode::Exists => f.debug_tuple("Exists").field(&self.field).finish(),
            OptionalMode::Missing => f.write_str("Missing"),
            OptionalMode::Tentative => f.write_str("Tentative"),
        }
    }
}

impl<F: Field, S: FieldSpec> Field for Optional<F, S> {
    const MIN_LENGTH: usize = 0;
    const MAX_LENGTH: usize = F::MAX_LENGTH;

    fn length(&self) -> usize {
        if self.does_exist() {
            self.field.length()
        } else {
            0
        }
    }

    fn valid(&self) -> bool {
        !self.does_exist() || self.field.valid()
    }

    fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
        match self.mode {
            OptionalMode::Missing => Ok(()),
            OptionalMode::Tentative if buf.is_empty() => {
                self.mode = OptionalMode::Missing;
                Ok(())
            }
            OptionalMode::Tentative | OptionalMode::Exists => {
                self.field.read(buf)?;
                self.mode = OptionalMode::Exists;
                Ok(())
            }
        }
    }

    fn write<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()> {
        if self.does_exist() {
            self.field.write(out)
        } else {
            Ok(())
        }
    }

    fn refresh(&mut self) -> bool {
        self.does_exist() && self.field.refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::field::{IntValue, Options};

    crate::field_spec! {
        StartsPresent = Options::new().optional_mode(OptionalMode::Exists)
    }

    type MaybeWord = Optional<IntValue<u16>>;

    #[test]
    fn test_tentative_without_data_becomes_missing() {
        let mut field = MaybeWord::default();
        assert_eq!(field.mode(), OptionalMode::Tentative);
        let mut buf: &[u8] = &[];
        field.read(&mut buf).unwrap();
        assert_eq!(field.mode(), OptionalMode::Missing);
        assert_eq!(field.length(), 0);
    }

    #[test]
    fn test_tentative_with_data_becomes_present() {
        let mut field = MaybeWord::default();
        let mut buf: &[u8] = &[0x12, 0x34];
        field.read(&mut buf).unwrap();
        assert!(field.does_exist());
        assert_eq!(field.get().map(IntValue::value), Some(0x1234));
    }

    #[test]
    fn test_tentative_is_not_written() {
        let field = MaybeWord::default();
        let mut out = Vec::new();
        field.write(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_exists_requires_data() {
        let mut field = Optional::<IntValue<u16>, StartsPresent>::default();
        let mut buf: &[u8] = &[0x01];
        assert_eq!(field.read(&mut buf), Err(Error::missing(1)));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_missing_skips_read() {
        let mut field = MaybeWord::missing();
        let mut buf: &[u8] = &[1, 2];
        field.read(&mut buf).unwrap();
        assert_eq!(buf.len(), 2);
        assert!(field.valid());
        assert!(field.set_exists(true));
        assert!(!field.set_exists(true));
    }
}
