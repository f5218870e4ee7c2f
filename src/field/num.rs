//! Numeric storage types and their wire encodings
//!
//! Fixed-width values are read through [`bytes::Buf`] and sign-extended
//! from the serialised width. Variable-width values use 7-bit groups with a
//! continuation bit: least significant group first for little endian, most
//! significant group first for big endian.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

use std::fmt::Debug;
use std::hash::Hash;

use bytes::Buf;

use super::options::{Endian, Options, Width};
use crate::cursor::WriteBuf;
use crate::error::{Error, Result};

/// Integer storage type of numeric fields
pub trait IntType: Copy + Default + Debug + Eq + Hash + Send + Sync + 'static {
    /// Size in bytes
    const BYTES: usize;
    /// Whether the type is signed
    const SIGNED: bool;

    /// Widen losslessly
    fn to_i128(self) -> i128;

    /// Narrow by truncation
    fn from_i128(value: i128) -> Self;
}

macro_rules! int_type {
    ($($ty:ty => $signed:expr),+ $(,)?) => {
        $(
            impl IntType for $ty {
                const BYTES: usize = std::mem::size_of::<$ty>();
                const SIGNED: bool = $signed;

                fn to_i128(self) -> i128 {
                    self as i128
                }

                fn from_i128(value: i128) -> Self {
                    value as $ty
                }
            }
        )+
    };
}

int_type! {
    u8 => false,
    u16 => false,
    u32 => false,
    u64 => false,
    i8 => true,
    i16 => true,
    i32 => true,
    i64 => true,
}

/// Floating point storage type
pub trait FloatType: Copy + Default + Debug + PartialEq + PartialOrd + Send + Sync + 'static {
    /// Size in bytes
    const BYTES: usize;

    /// Widen losslessly
    fn to_f64(self) -> f64;

    /// Narrow, rounding to nearest
    fn from_f64(value: f64) -> Self;

    /// Read using the given byte order
    fn get(buf: &mut &[u8], endian: Endian) -> Self;

    /// Serialise using the given byte order
    fn put<W: WriteBuf + ?Sized>(self, out: &mut W, endian: Endian);
}

impl FloatType for f32 {
    const BYTES: usize = 4;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn get(buf: &mut &[u8], endian: Endian) -> Self {
        match endian {
            Endian::Big => buf.get_f32(),
            Endian::Little => buf.get_f32_le(),
        }
    }

    fn put<W: WriteBuf + ?Sized>(self, out: &mut W, endian: Endian) {
        match endian {
            Endian::Big => out.put_slice(&self.to_be_bytes()),
            Endian::Little => out.put_slice(&self.to_le_bytes()),
        }
    }
}

impl FloatType for f64 {
    const BYTES: usize = 8;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }

    fn get(buf: &mut &[u8], endian: Endian) -> Self {
        match endian {
            Endian::Big => buf.get_f64(),
            Endian::Little => buf.get_f64_le(),
        }
    }

    fn put<W: WriteBuf + ?Sized>(self, out: &mut W, endian: Endian) {
        match endian {
            Endian::Big => out.put_slice(&self.to_be_bytes()),
            Endian::Little => out.put_slice(&self.to_le_bytes()),
        }
    }
}

/// Serialised byte bounds of an integer of type `T` under `opts`
pub(crate) const fn width_bounds(native: usize, opts: &Options) -> (usize, usize) {
    match opts.width {
        Width::Native => (native, native),
        Width::Fixed(n) => (n, n),
        Width::Var { min, max } => (min, max),
    }
}

/// Fail with the exact shortfall when fewer than `needed` bytes remain
pub(crate) fn ensure_available(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(Error::missing(needed - buf.len()));
    }
    Ok(())
}

/// Fail with `BufferOverflow` when fewer than `needed` bytes can be written
pub(crate) fn ensure_space<W: WriteBuf + ?Sized>(out: &W, needed: usize) -> Result<()> {
    if out.remaining_mut() < needed {
        return Err(Error::BufferOverflow);
    }
    Ok(())
}

/// Read an unsigned value of `width` bytes (1..=8)
pub(crate) fn read_uint(buf: &mut &[u8], width: usize, endian: Endian) -> Result<u64> {
    ensure_available(buf, width)?;
    Ok(match endian {
        Endian::Big => buf.get_uint(width),
        Endian::Little => buf.get_uint_le(width),
    })
}

/// Write the low `width` bytes (1..=8) of `value`
pub(crate) fn write_uint<W: WriteBuf + ?Sized>(
    out: &mut W,
    value: u64,
    width: usize,
    endian: Endian,
) -> Result<()> {
    ensure_space(out, width)?;
    match endian {
        Endian::Big => out.put_slice(&value.to_be_bytes()[8 - width..]),
        Endian::Little => out.put_slice(&value.to_le_bytes()[..width]),
    }
    Ok(())
}

fn sign_extend(raw: u128, bits: u32) -> i128 {
    if bits == 0 || bits >= 128 {
        return raw as i128;
    }
    let shift = 128 - bits;
    ((raw << shift) as i128) >> shift
}

/// Read a serialised integer, sign-extending when `signed`
pub(crate) fn read_int(buf: &mut &[u8], signed: bool, native: usize, opts: &Options) -> Result<i128> {
    match opts.width {
        Width::Var { max, .. } => read_var(buf, signed, max, opts.endian),
        Width::Native | Width::Fixed(_) => {
            let (width, _) = width_bounds(native, opts);
            let raw = read_uint(buf, width, opts.endian)?;
            if signed {
                Ok(sign_extend(u128::from(raw), (width * 8) as u32))
            } else {
                Ok(i128::from(raw))
            }
        }
    }
}

/// Write a serialised integer using the configured width
pub(crate) fn write_int<W: WriteBuf + ?Sized>(
    out: &mut W,
    value: i128,
    signed: bool,
    native: usize,
    opts: &Options,
) -> Result<()> {
    match opts.width {
        Width::Var { min, max } => {
            let (groups, len) = var_groups(value, signed, min, max)?;
            ensure_space(out, len)?;
            let mut encoded = [0u8; 10];
            for (i, slot) in encoded[..len].iter_mut().enumerate() {
                let group = match opts.endian {
                    Endian::Little => groups[i],
                    Endian::Big => groups[len - 1 - i],
                };
                *slot = if i + 1 < len { group | 0x80 } else { group };
            }
            out.put_slice(&encoded[..len]);
            Ok(())
        }
        Width::Native | Width::Fixed(_) => {
            let (width, _) = width_bounds(native, opts);
            write_uint(out, value as u64, width, opts.endian)
        }
    }
}

/// Whether `value` can be serialised under `opts` without losing bits
pub(crate) fn int_fits(value: i128, signed: bool, native: usize, opts: &Options) -> bool {
    match opts.width {
        Width::Var { min, max } => var_groups(value, signed, min, max).is_ok(),
        Width::Native | Width::Fixed(_) => {
            let bits = (width_bounds(native, opts).0 * 8) as u32;
            if signed {
                let half = 1i128 << (bits - 1);
                (-half..half).contains(&value)
            } else {
                (0..1i128 << bits).contains(&value)
            }
        }
    }
}

/// Serialised length of `value`
///
/// A variable-width value that does not fit reports the maximum width; its
/// write fails instead.
pub(crate) fn int_length(value: i128, signed: bool, native: usize, opts: &Options) -> usize {
    match opts.width {
        Width::Var { min, max } => var_groups(value, signed, min, max).map_or(max, |(_, len)| len),
        Width::Native | Width::Fixed(_) => width_bounds(native, opts).0,
    }
}

/// Split `value` into 7-bit groups, least significant first
fn var_groups(value: i128, signed: bool, min: usize, max: usize) -> Result<([u8; 10], usize)> {
    if !signed && value < 0 {
        return Err(Error::InvalidMsgData);
    }
    let mut groups = [0u8; 10];
    let mut rest = value;
    let mut len = 0;
    loop {
        let group = (rest & 0x7f) as u8;
        rest >>= 7;
        let exhausted = if signed {
            (rest == 0 && group & 0x40 == 0) || (rest == -1 && group & 0x40 != 0)
        } else {
            rest == 0
        };
        if len == groups.len() || len == max {
            return Err(Error::InvalidMsgData);
        }
        groups[len] = group;
        len += 1;
        if exhausted && len >= min {
            return Ok((groups, len));
        }
    }
}

fn read_var(buf: &mut &[u8], signed: bool, max: usize, endian: Endian) -> Result<i128> {
    let mut raw: u128 = 0;
    for count in 1..=max {
        ensure_available(buf, 1)?;
        let byte = buf.get_u8();
        let group = u128::from(byte & 0x7f);
        raw = match endian {
            Endian::Little => raw | (group << (7 * (count - 1))),
            Endian::Big => (raw << 7) | group,
        };
        if byte & 0x80 == 0 {
            let bits = (7 * count) as u32;
            return Ok(if signed {
                sign_extend(raw, bits)
            } else {
                raw as i128
            });
        }
    }
    Err(Error::ProtocolError)
}
