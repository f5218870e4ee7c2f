//! Enumeration fields

use std::fmt::{self, Debug};
use std::hash::Hash;
use std::marker::PhantomData;

use super::num::{self, IntType};
use super::options::{DefaultSpec, FieldSpec, InvalidPolicy};
use super::{Field, IdField};
use crate::cursor::WriteBuf;
use crate::error::{Error, Result};

/// Enumeration with an integer wire representation
pub trait IntEnum: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Underlying integer type
    type Repr: IntType;

    /// Integer value of the enumerant
    fn to_repr(self) -> Self::Repr;

    /// Enumerant for `repr`, `None` when unknown
    fn from_repr(repr: Self::Repr) -> Option<Self>;
}

/// Declare a fieldless enum implementing [`IntEnum`]
///
/// ```
/// use wirestack::field::IntEnum;
///
/// wirestack::int_enum! {
///     pub enum Color: u8 {
///         Red = 1,
///         Green = 2,
///     }
/// }
///
/// assert_eq!(Color::from_repr(2), Some(Color::Green));
/// assert_eq!(Color::from_repr(3), None);
/// ```
#[macro_export]
macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr($repr)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $crate::field::IntEnum for $name {
            type Repr = $repr;

            fn to_repr(self) -> $repr {
                self as $repr
            }

            fn from_repr(repr: $repr) -> ::core::option::Option<Self> {
                $(
                    if repr == $value {
                        return ::core::option::Option::Some(Self::$variant);
                    }
                )+
                ::core::option::Option::None
            }
        }
    };
}

/// Enumeration value stored as its raw representation
///
/// Unknown values can be read and held; they are reported by
/// [`Field::valid`] and by [`EnumValue::value`] returning `None`.
pub struct EnumValue<E: IntEnum, S: FieldSpec = DefaultSpec> {
    raw: E::Repr,
    _spec: PhantomData<S>,
}

impl<E: IntEnum, S: FieldSpec> EnumValue<E, S> {
    /// Field holding `value`
    #[must_use]
    pub fn new(value: E) -> Self {
        Self::from_raw(value.to_repr())
    }

    /// Field holding an arbitrary raw representation
    #[must_use]
    pub fn from_raw(raw: E::Repr) -> Self {
        Self {
            raw,
            _spec: PhantomData,
        }
    }

    /// Current enumerant, `None` when the raw value is unknown
    #[must_use]
    pub fn value(&self) -> Option<E> {
        E::from_repr(self.raw)
    }

    /// Raw representation
    #[must_use]
    pub fn raw(&self) -> E::Repr {
        self.raw
    }

    /// Replace the value
    pub fn set_value(&mut self, value: E) {
        self.raw = value.to_repr();
    }

    fn accepts(raw: E::Repr) -> bool {
        E::from_repr(raw).is_some() && S::OPTIONS.in_ranges(raw.to_i128())
    }
}

impl<E: IntEnum, S: FieldSpec> Default for EnumValue<E, S> {
    fn default() -> Self {
        Self::from_raw(E::Repr::from_i128(i128::from(S::OPTIONS.default_value)))
    }
}

impl<E: IntEnum, S: FieldSpec> Clone for EnumValue<E, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: IntEnum, S: FieldSpec> Copy for EnumValue<E, S> {}

impl<E: IntEnum, S: FieldSpec> PartialEq for EnumValue<E, S> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<E: IntEnum, S: FieldSpec> Eq for EnumValue<E, S> {}

impl<E: IntEnum, S: FieldSpec> fmt::Debug for EnumValue<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => f.debug_tuple("EnumValue").field(&value).finish(),
            None => f.debug_tuple("EnumValue").field(&self.raw).finish(),
        }
    }
}

impl<E: IntEnum, S: FieldSpec> From<E> for EnumValue<E, S> {
    fn from(value: E) -> Self {
        Self::new(value)
    }
}

impl<E: IntEnum, S: FieldSpec> Field for EnumValue<E, S> {
    const MIN_LENGTH: usize = num::width_bounds(E::Repr::BYTES, &S::OPTIONS).0;
    const MAX_LENGTH: usize = num::width_bounds(E::Repr::BYTES, &S::OPTIONS).1;

    fn length(&self) -> usize {
        let serialised = self.raw.to_i128() + i128::from(S::OPTIONS.ser_offset);
        num::int_length(serialised, E::Repr::SIGNED, E::Repr::BYTES, &S::OPTIONS)
    }

    fn valid(&self) -> bool {
        Self::accepts(self.raw)
    }

    fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
        let mut cursor = *buf;
        let serialised = num::read_int(&mut cursor, E::Repr::SIGNED, E::Repr::BYTES, &S::OPTIONS)?;
        let raw = E::Repr::from_i128(serialised - i128::from(S::OPTIONS.ser_offset));
        if S::OPTIONS.on_invalid == InvalidPolicy::Fail && !Self::accepts(raw) {
            return Err(Error::InvalidMsgData);
        }
        self.raw = raw;
        *buf = cursor;
        Ok(())
    }

    fn write<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()> {
        let serialised = self.raw.to_i128() + i128::from(S::OPTIONS.ser_offset);
        num::write_int(out, serialised, E::Repr::SIGNED, E::Repr::BYTES, &S::OPTIONS)
    }
}

impl<E: IntEnum, S: FieldSpec> IdField for EnumValue<E, S> {
    type Id = E;

    fn from_id(id: E) -> Self {
        Self::new(id)
    }

    fn to_id(&self) -> Option<E> {
        self.value()
    }
}
