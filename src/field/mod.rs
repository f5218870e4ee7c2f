//! Field abstractions
//!
//! A field is a value that knows its own serialised length, validity and
//! wire encoding. Reads take a `&mut &[u8]` cursor that only advances when
//! the read succeeds; writes check the available space before emitting
//! anything.
//!
//! # Field kinds
//!
//! | Type | Wire form |
//! |------|-----------|
//! | [`IntValue`] | fixed, native or base-128 integer |
//! | [`EnumValue`] | integer restricted to known enumerants |
//! | [`BitmaskValue`] | integer with named bits and reserved bits |
//! | [`FloatValue`] | IEEE-754 `f32`/`f64` |
//! | [`ArrayList`] | sequence of fields |
//! | [`StringField`] | UTF-8 text sequence |
//! | [`Optional`] | field with runtime presence |
//! | tuples | ordered bundle of fields |

use std::fmt::Debug;

use crate::cursor::WriteBuf;
use crate::error::Result;

mod array_list;
mod bitmask;
mod bundle;
mod enum_value;
mod float_value;
mod int_value;
mod num;
mod optional;
pub mod options;
pub(crate) mod sequence;
mod string;

pub use array_list::{ArrayList, Storage};
pub use bitmask::BitmaskValue;
pub use bundle::FieldTuple;
pub use enum_value::{EnumValue, IntEnum};
pub use float_value::FloatValue;
pub use int_value::IntValue;
pub use num::{FloatType, IntType};
pub use optional::Optional;
pub use options::{
    DefaultSpec, Endian, FieldSpec, InvalidPolicy, OptionalMode, Options, Sequence, Width,
};
pub use string::StringField;

pub(crate) use num::{ensure_space, read_uint, write_uint};

/// A serialisable protocol value
pub trait Field: Clone + Default + Debug {
    /// Smallest possible serialised length
    const MIN_LENGTH: usize;
    /// Largest possible serialised length (`usize::MAX` when unbounded)
    const MAX_LENGTH: usize;

    /// Current serialised length
    fn length(&self) -> usize;

    /// Whether the current value satisfies the configured constraints
    fn valid(&self) -> bool;

    /// Decode from `buf`, advancing it only on success
    fn read(&mut self, buf: &mut &[u8]) -> Result<()>;

    /// Encode into `out`; fails with `BufferOverflow` without writing when
    /// the value does not fit
    fn write<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()>;

    /// Bring dependent state up to date. Returns whether anything changed.
    fn refresh(&mut self) -> bool {
        false
    }
}

/// Field usable as a message identifier
pub trait IdField: Field {
    /// Identifier type carried by the field
    type Id: crate::message::MsgId;

    /// Field holding `id`
    fn from_id(id: Self::Id) -> Self;

    /// Identifier held by the field, `None` when not representable
    fn to_id(&self) -> Option<Self::Id>;
}

/// Field exposing its value as an unsigned machine word
///
/// Used by framing layers that compute sizes and checksums.
pub trait NumericField: Field {
    /// Value reinterpreted as `u64`
    fn as_u64(&self) -> u64;

    /// Replace the value, truncating to the storage type
    fn set_u64(&mut self, value: u64);

    /// Whether the serialised value fits the configured wire width
    fn fits_wire(&self) -> bool;
}
