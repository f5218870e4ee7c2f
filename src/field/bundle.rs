//! Ordered field bundles
//!
//! Tuples of fields (up to twelve members) serialise their members in
//! order. They are used both as the field list of a message and as a
//! compound field inside other fields.

use std::fmt::Debug;

use super::Field;
use crate::cursor::WriteBuf;
use crate::error::Result;

/// Ordered collection of fields addressed by index
///
/// Ranged operations cover members `from..until`. Reads are staged on a copy
/// and committed only when every member in the range succeeded.
pub trait FieldTuple: Clone + Default + Debug {
    /// Number of members
    const COUNT: usize;
    /// Sum of the members' minimum lengths
    const MIN_LENGTH: usize;
    /// Sum of the members' maximum lengths, saturating
    const MAX_LENGTH: usize;

    /// Read members `from..until`
    fn read_range(&mut self, from: usize, until: usize, buf: &mut &[u8]) -> Result<()>;

    /// Write members `from..until`
    fn write_range<W: WriteBuf + ?Sized>(&self, from: usize, until: usize, out: &mut W)
    -> Result<()>;

    /// Serialised length of members `from..until`
    fn length_range(&self, from: usize, until: usize) -> usize;

    /// Whether every member is valid
    fn valid_all(&self) -> bool;

    /// Refresh every member; returns whether any changed
    fn refresh_all(&mut self) -> bool;

    /// Read every member
    fn read_all(&mut self, buf: &mut &[u8]) -> Result<()> {
        self.read_range(0, Self::COUNT, buf)
    }

    /// Read members before index `until`
    fn read_until(&mut self, until: usize, buf: &mut &[u8]) -> Result<()> {
        self.read_range(0, until, buf)
    }

    /// Read members from index `from` onwards
    fn read_from(&mut self, from: usize, buf: &mut &[u8]) -> Result<()> {
        self.read_range(from, Self::COUNT, buf)
    }

    /// Write every member
    fn write_all<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()> {
        self.write_range(0, Self::COUNT, out)
    }

    /// Write members before index `until`
    fn write_until<W: WriteBuf + ?Sized>(&self, until: usize, out: &mut W) -> Result<()> {
        self.write_range(0, until, out)
    }

    /// Write members from index `from` onwards
    fn write_from<W: WriteBuf + ?Sized>(&self, from: usize, out: &mut W) -> Result<()> {
        self.write_range(from, Self::COUNT, out)
    }

    /// Serialised length of every member
    fn length_all(&self) -> usize {
        self.length_range(0, Self::COUNT)
    }
}

impl FieldTuple for () {
    const COUNT: usize = 0;
    const MIN_LENGTH: usize = 0;
    const MAX_LENGTH: usize = 0;

    fn read_range(&mut self, _from: usize, _until: usize, _buf: &mut &[u8]) -> Result<()> {
        Ok(())
    }

    fn write_range<W: WriteBuf + ?Sized>(
        &self,
        _from: usize,
        _until: usize,
        _out: &mut W,
    ) -> Result<()> {
        Ok(())
    }

    fn length_range(&self, _from: usize, _until: usize) -> usize {
        0
    }

    fn valid_all(&self) -> bool {
        true
    }

    fn refresh_all(&mut self) -> bool {
        false
    }
}

macro_rules! tuple_impls {
    ($($idx:tt => $name:ident),+) => {
        impl<$($name: Field),+> FieldTuple for ($($name,)+) {
            const COUNT: usize = [$($idx),+].len();
            const MIN_LENGTH: usize = 0usize $(.saturating_add($name::MIN_LENGTH))+;
            const MAX_LENGTH: usize = 0usize $(.saturating_add($name::MAX_LENGTH))+;

            fn read_range(&mut self, from: usize, until: usize, buf: &mut &[u8]) -> Result<()> {
                let mut staged = self.clone();
                let mut cursor = *buf;
                $(
                    if (from..until).contains(&$idx) {
                        staged.$idx.read(&mut cursor)?;
                    }
                )+
                *self = staged;
                *buf = cursor;
                Ok(())
            }

            fn write_range<W: WriteBuf + ?Sized>(
                &self,
                from: usize,
                until: usize,
                out: &mut W,
            ) -> Result<()> {
                super::ensure_space(out, self.length_range(from, until))?;
                $(
                    if (from..until).contains(&$idx) {
                        self.$idx.write(out)?;
                    }
                )+
                Ok(())
            }

            fn length_range(&self, from: usize, until: usize) -> usize {
                let mut len = 0;
                $(
                    if (from..until).contains(&$idx) {
                        len += self.$idx.length();
                    }
                )+
                len
            }

            fn valid_all(&self) -> bool {
                $(self.$idx.valid())&&+
            }

            fn refresh_all(&mut self) -> bool {
                let mut changed = false;
                $(changed |= self.$idx.refresh();)+
                changed
            }
        }

        impl<$($name: Field),+> Field for ($($name,)+) {
            const MIN_LENGTH: usize = <Self as FieldTuple>::MIN_LENGTH;
            const MAX_LENGTH: usize = <Self as FieldTuple>::MAX_LENGTH;

            fn length(&self) -> usize {
                self.length_all()
            }

            fn valid(&self) -> bool {
                self.valid_all()
            }

            fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
                self.read_all(buf)
            }

            fn write<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()> {
                self.write_all(out)
            }

            fn refresh(&mut self) -> bool {
                self.refresh_all()
            }
        }
    };
}

tuple_impls!(0 => A);
tuple_impls!(0 => A, 1 => B);
tuple_impls!(0 => A, 1 => B, 2 => C);
tuple_impls!(0 => A, 1 => B, 2 => C, 3 => D);
tuple_impls!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
tuple_impls!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);
tuple_impls!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G);
tuple_impls!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H);
tuple_impls!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I);
tuple_impls!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J);
tuple_impls!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J, 10 => K);
tuple_impls!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J, 10 => K, 11 => L);
