//! Declarative field options
//!
//! Every field type takes a [`FieldSpec`] marker whose associated
//! [`Options`] constant is resolved at compile time. Options that do not
//! apply to a field kind are ignored by it.

use std::fmt;

/// Byte order of multi-byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    /// Most significant byte first
    #[default]
    Big,
    /// Least significant byte first
    Little,
}

/// Serialised width of numeric values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Width of the storage type
    Native,
    /// Exactly `n` bytes (1..=8)
    Fixed(usize),
    /// Base-128 encoding using between `min` and `max` bytes
    Var {
        /// Minimum number of bytes written
        min: usize,
        /// Maximum number of bytes accepted
        max: usize,
    },
}

/// Behaviour when a well-formed value read from the wire is not valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidPolicy {
    /// Keep the value; `valid()` reports false
    #[default]
    Ignore,
    /// Reject the read with `InvalidMsgData`
    Fail,
}

/// How a sequence (list or string) delimits its elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    /// Consume all remaining input
    Remaining,
    /// Exactly `n` elements, no prefix
    Fixed(usize),
    /// Element count prefix of the given byte width
    CountPrefix(usize),
    /// Serialised byte length prefix of the given byte width
    LengthPrefix(usize),
    /// Elements followed by the given terminator bytes
    Terminated(&'static [u8]),
}

/// Presence mode of an optional field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionalMode {
    /// Present if input remains on read; not written
    #[default]
    Tentative,
    /// Always read and written
    Exists,
    /// Never read or written
    Missing,
}

/// Consolidated option bundle for a field
#[derive(Clone, Copy, PartialEq)]
pub struct Options {
    /// Byte order
    pub endian: Endian,
    /// Serialised width for numeric fields
    pub width: Width,
    /// Added to the value on write, subtracted on read
    pub ser_offset: i64,
    /// Value of a default-constructed numeric field
    pub default_value: i64,
    /// Primary valid range (inclusive)
    pub valid_range: Option<(i64, i64)>,
    /// Additional valid ranges (inclusive)
    pub extra_ranges: &'static [(i64, i64)],
    /// Valid range of floating point fields (inclusive)
    pub float_range: Option<(f64, f64)>,
    /// Reaction to invalid values on read
    pub on_invalid: InvalidPolicy,
    /// Scaling ratio `(num, den)` applied by `scale_as`
    pub scaling: (i64, i64),
    /// Bits of a bitmask that must be zero
    pub reserved_bits: u64,
    /// Sequence delimiting for lists and strings
    pub sequence: Sequence,
    /// Initial mode of optional fields
    pub optional_mode: OptionalMode,
}

impl Options {
    /// Big endian, native width, no offsets, every value valid
    pub const DEFAULT: Self = Self {
        endian: Endian::Big,
        width: Width::Native,
        ser_offset: 0,
        default_value: 0,
        valid_range: None,
        extra_ranges: &[],
        float_range: None,
        on_invalid: InvalidPolicy::Ignore,
        scaling: (1, 1),
        reserved_bits: 0,
        sequence: Sequence::Remaining,
        optional_mode: OptionalMode::Tentative,
    };

    /// Start from [`Options::DEFAULT`]
    #[must_use]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Most significant byte first
    #[must_use]
    pub const fn big_endian(mut self) -> Self {
        self.endian = Endian::Big;
        self
    }

    /// Least significant byte first
    #[must_use]
    pub const fn little_endian(mut self) -> Self {
        self.endian = Endian::Little;
        self
    }

    /// Serialise numeric values using exactly `len` bytes
    #[must_use]
    pub const fn fixed_length(mut self, len: usize) -> Self {
        assert!(len >= 1 && len <= 8, "fixed length must be 1..=8 bytes");
        self.width = Width::Fixed(len);
        self
    }

    /// Serialise numeric values in base-128 using `min..=max` bytes
    #[must_use]
    pub const fn var_length(mut self, min: usize, max: usize) -> Self {
        assert!(min >= 1 && min <= max && max <= 10, "invalid var length bounds");
        self.width = Width::Var { min, max };
        self
    }

    /// Add `offset` to numeric values when serialising
    #[must_use]
    pub const fn ser_offset(mut self, offset: i64) -> Self {
        self.ser_offset = offset;
        self
    }

    /// Initial value of default-constructed numeric fields
    #[must_use]
    pub const fn default_value(mut self, value: i64) -> Self {
        self.default_value = value;
        self
    }

    /// Primary inclusive valid range
    #[must_use]
    pub const fn valid_range(mut self, min: i64, max: i64) -> Self {
        self.valid_range = Some((min, max));
        self
    }

    /// Additional inclusive valid ranges
    #[must_use]
    pub const fn valid_ranges(mut self, ranges: &'static [(i64, i64)]) -> Self {
        self.extra_ranges = ranges;
        self
    }

    /// Inclusive valid range of floating point fields
    #[must_use]
    pub const fn float_range(mut self, min: f64, max: f64) -> Self {
        self.float_range = Some((min, max));
        self
    }

    /// Reject reads producing invalid values
    #[must_use]
    pub const fn fail_on_invalid(mut self) -> Self {
        self.on_invalid = InvalidPolicy::Fail;
        self
    }

    /// Accept reads producing invalid values
    #[must_use]
    pub const fn ignore_invalid(mut self) -> Self {
        self.on_invalid = InvalidPolicy::Ignore;
        self
    }

    /// Ratio applied when converting to a scaled float
    #[must_use]
    pub const fn scaling_ratio(mut self, num: i64, den: i64) -> Self {
        assert!(num != 0 && den != 0, "scaling ratio terms must be non-zero");
        self.scaling = (num, den);
        self
    }

    /// Bits of a bitmask that must remain cleared
    #[must_use]
    pub const fn reserved_bits(mut self, mask: u64) -> Self {
        self.reserved_bits = mask;
        self
    }

    /// Sequence extends to the end of the input
    #[must_use]
    pub const fn remaining(mut self) -> Self {
        self.sequence = Sequence::Remaining;
        self
    }

    /// Sequence of exactly `count` elements
    #[must_use]
    pub const fn fixed_size(mut self, count: usize) -> Self {
        self.sequence = Sequence::Fixed(count);
        self
    }

    /// Sequence preceded by an element count of `width` bytes
    #[must_use]
    pub const fn count_prefix(mut self, width: usize) -> Self {
        assert!(width >= 1 && width <= 8, "prefix width must be 1..=8 bytes");
        self.sequence = Sequence::CountPrefix(width);
        self
    }

    /// Sequence preceded by its byte length in `width` bytes
    #[must_use]
    pub const fn length_prefix(mut self, width: usize) -> Self {
        assert!(width >= 1 && width <= 8, "prefix width must be 1..=8 bytes");
        self.sequence = Sequence::LengthPrefix(width);
        self
    }

    /// Sequence closed by `terminator`
    #[must_use]
    pub const fn terminated(mut self, terminator: &'static [u8]) -> Self {
        assert!(!terminator.is_empty(), "terminator must not be empty");
        self.sequence = Sequence::Terminated(terminator);
        self
    }

    /// Initial mode of an optional field
    #[must_use]
    pub const fn optional_mode(mut self, mode: OptionalMode) -> Self {
        self.optional_mode = mode;
        self
    }

    /// Whether `value` satisfies the configured numeric ranges
    pub(crate) fn in_ranges(&self, value: i128) -> bool {
        if self.valid_range.is_none() && self.extra_ranges.is_empty() {
            return true;
        }
        let within = |(min, max): (i64, i64)| i128::from(min) <= value && value <= i128::from(max);
        self.valid_range.is_some_and(within) || self.extra_ranges.iter().copied().any(within)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("endian", &self.endian)
            .field("width", &self.width)
            .field("ser_offset", &self.ser_offset)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

/// Compile-time option selection for a field type
pub trait FieldSpec: 'static {
    /// Resolved options
    const OPTIONS: Options;
}

/// Spec using [`Options::DEFAULT`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DefaultSpec;

impl FieldSpec for DefaultSpec {
    const OPTIONS: Options = Options::DEFAULT;
}

/// Declare a [`FieldSpec`] marker type
///
/// ```
/// use wirestack::field::{Field, IntValue, Options};
///
/// wirestack::field_spec! {
///     /// Two-byte little endian counter limited to 0..=100
///     pub CounterSpec = Options::new().little_endian().valid_range(0, 100)
/// }
///
/// let counter = IntValue::<u16, CounterSpec>::new(42);
/// assert!(counter.valid());
/// ```
#[macro_export]
macro_rules! field_spec {
    ($($(#[$meta:meta])* $vis:vis $name:ident = $options:expr);+ $(;)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            $vis struct $name;

            impl $crate::field::FieldSpec for $name {
                const OPTIONS: $crate::field::Options = $options;
            }
        )+
    };
}
