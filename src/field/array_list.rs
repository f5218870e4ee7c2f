//! Sequences of fields

use std::fmt::{self, Debug};
use std::marker::PhantomData;

use tinyvec::ArrayVec;

use super::num::ensure_space;
use super::options::{DefaultSpec, FieldSpec, Sequence};
use super::{sequence, Field};
use crate::cursor::WriteBuf;
use crate::error::{Error, Result};

/// Element storage of an [`ArrayList`]
///
/// `Vec` grows on demand; `tinyvec::ArrayVec` keeps the elements inline
/// with a fixed capacity.
pub trait Storage<E>: Clone + Default + Debug {
    /// Maximum number of elements (`usize::MAX` when unbounded)
    const CAPACITY: usize;

    /// Stored elements
    fn as_slice(&self) -> &[E];

    /// Stored elements, mutably
    fn as_mut_slice(&mut self) -> &mut [E];

    /// Remove every element
    fn clear(&mut self);

    /// Append `elem`, failing with `BufferOverflow` when full
    fn try_push(&mut self, elem: E) -> Result<()>;
}

impl<E: Clone + Debug> Storage<E> for Vec<E> {
    const CAPACITY: usize = usize::MAX;

    fn as_slice(&self) -> &[E] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [E] {
        self
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn try_push(&mut self, elem: E) -> Result<()> {
        self.push(elem);
        Ok(())
    }
}

impl<E: Clone + Debug + Default, const N: usize> Storage<E> for ArrayVec<[E; N]> {
    const CAPACITY: usize = N;

    fn as_slice(&self) -> &[E] {
        ArrayVec::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [E] {
        ArrayVec::as_mut_slice(self)
    }

    fn clear(&mut self) {
        ArrayVec::clear(self);
    }

    fn try_push(&mut self, elem: E) -> Result<()> {
        match ArrayVec::try_push(self, elem) {
            None => Ok(()),
            Some(_) => Err(Error::BufferOverflow),
        }
    }
}

/// List of fields delimited according to the field's [`Sequence`] option
///
/// ```
/// use wirestack::field::{ArrayList, Field, IntValue, Options};
///
/// wirestack::field_spec! {
///     pub Counted = Options::new().count_prefix(1)
/// }
///
/// let mut list = ArrayList::<IntValue<u16>, Counted>::default();
/// list.push(IntValue::new(0x0102)).unwrap();
///
/// let mut out = Vec::new();
/// list.write(&mut out).unwrap();
/// assert_eq!(out, [0x01, 0x01, 0x02]);
/// ```
pub struct ArrayList<E: Field, S: FieldSpec = DefaultSpec, C: Storage<E> = Vec<E>> {
    elems: C,
    forced_count: Option<usize>,
    _marker: PhantomData<(E, S)>,
}

impl<E: Field, S: FieldSpec, C: Storage<E>> ArrayList<E, S, C> {
    /// Empty list
    #[must_use]
    pub fn new() -> Self {
        Self {
            elems: C::default(),
            forced_count: None,
            _marker: PhantomData,
        }
    }

    /// List holding every element of `iter`
    pub fn try_from_iter<I: IntoIterator<Item = E>>(iter: I) -> Result<Self> {
        let mut list = Self::new();
        for elem in iter {
            list.push(elem)?;
        }
        Ok(list)
    }

    /// Stored elements
    #[must_use]
    pub fn value(&self) -> &[E] {
        self.elems.as_slice()
    }

    /// Stored elements, mutably
    pub fn value_mut(&mut self) -> &mut [E] {
        self.elems.as_mut_slice()
    }

    /// Underlying storage
    pub fn storage_mut(&mut self) -> &mut C {
        &mut self.elems
    }

    /// Append an element
    pub fn push(&mut self, elem: E) -> Result<()> {
        self.elems.try_push(elem)
    }

    /// Remove every element
    pub fn clear(&mut self) {
        self.elems.clear();
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.value().len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }

    /// Iterate over the elements
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.value().iter()
    }

    /// Read exactly `count` elements on the next read, overriding
    /// `Remaining` and `Fixed` delimiting
    pub fn force_read_elem_count(&mut self, count: usize) {
        self.forced_count = Some(count);
    }

    /// Drop a count set by [`ArrayList::force_read_elem_count`]
    pub fn clear_read_elem_count(&mut self) {
        self.forced_count = None;
    }

    fn elems_length(&self) -> usize {
        self.iter().map(Field::length).sum()
    }

    fn read_elem(elems: &mut C, buf: &mut &[u8]) -> Result<()> {
        let mut elem = E::default();
        elem.read(buf)?;
        elems.try_push(elem)
    }

    fn read_count(elems: &mut C, count: usize, buf: &mut &[u8]) -> Result<()> {
        if count > C::CAPACITY {
            return Err(Error::BufferOverflow);
        }
        let needed = count.saturating_mul(E::MIN_LENGTH);
        if needed > buf.len() {
            return Err(Error::missing(needed - buf.len()));
        }
        for _ in 0..count {
            Self::read_elem(elems, buf)?;
        }
        Ok(())
    }

    /// Count taken from the wire; every element must consume input
    fn read_prefixed_count(elems: &mut C, count: usize, buf: &mut &[u8]) -> Result<()> {
        if E::MIN_LENGTH > 0 {
            return Self::read_count(elems, count, buf);
        }
        if count > C::CAPACITY {
            return Err(Error::BufferOverflow);
        }
        for _ in 0..count {
            let before = buf.len();
            Self::read_elem(elems, buf)?;
            if buf.len() == before {
                return Err(Error::ProtocolError);
            }
        }
        Ok(())
    }

    fn read_to_end(elems: &mut C, buf: &mut &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let before = buf.len();
            Self::read_elem(elems, buf)?;
            if buf.len() == before {
                return Err(Error::ProtocolError);
            }
        }
        Ok(())
    }

    fn read_terminated(elems: &mut C, terminator: &[u8], buf: &mut &[u8]) -> Result<()> {
        loop {
            if let Some(rest) = buf.strip_prefix(terminator) {
                *buf = rest;
                return Ok(());
            }
            if buf.len() < terminator.len() && terminator.starts_with(buf) {
                return Err(Error::missing(sequence::terminator_shortfall(buf, terminator)));
            }
            let before = buf.len();
            Self::read_elem(elems, buf)?;
            if buf.len() == before {
                return Err(Error::ProtocolError);
            }
        }
    }
}

impl<E: Field, S: FieldSpec, C: Storage<E>> Default for ArrayList<E, S, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Field, S: FieldSpec, C: Storage<E>> Clone for ArrayList<E, S, C> {
    fn clone(&self) -> Self {
        Self {
            elems: self.elems.clone(),
            forced_count: self.forced_count,
            _marker: PhantomData,
        }
    }
}

impl<E: Field + PartialEq, S: FieldSpec, C: Storage<E>> PartialEq for ArrayList<E, S, C> {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl<E: Field, S: FieldSpec, C: Storage<E>> fmt::Debug for ArrayList<E, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<E: Field, S: FieldSpec, C: Storage<E>> Field for ArrayList<E, S, C> {
    const MIN_LENGTH: usize =
        sequence::bounds(S::OPTIONS.sequence, E::MIN_LENGTH, E::MAX_LENGTH, C::CAPACITY).0;
    const MAX_LENGTH: usize =
        sequence::bounds(S::OPTIONS.sequence, E::MIN_LENGTH, E::MAX_LENGTH, C::CAPACITY).1;

    fn length(&self) -> usize {
        match S::OPTIONS.sequence {
            Sequence::Fixed(count) => {
                let present: usize = self.iter().take(count).map(Field::length).sum();
                let padding = count.saturating_sub(self.len()) * E::default().length();
                present + padding
            }
            seq => sequence::overhead(seq) + self.elems_length(),
        }
    }

    fn valid(&self) -> bool {
        let delimited = match S::OPTIONS.sequence {
            Sequence::Fixed(count) => self.len() <= count,
            Sequence::CountPrefix(width) => sequence::prefix_fits(self.len(), width),
            Sequence::LengthPrefix(width) => sequence::prefix_fits(self.elems_length(), width),
            Sequence::Remaining | Sequence::Terminated(_) => true,
        };
        delimited && self.iter().all(Field::valid)
    }

    fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
        let opts = S::OPTIONS;
        let mut cursor = *buf;
        let mut elems = C::default();
        match (self.forced_count, opts.sequence) {
            (Some(count), Sequence::Remaining | Sequence::Fixed(_)) | (None, Sequence::Fixed(count)) => {
                Self::read_count(&mut elems, count, &mut cursor)?;
            }
            (_, Sequence::Remaining) => Self::read_to_end(&mut elems, &mut cursor)?,
            (_, Sequence::CountPrefix(width)) => {
                let count = sequence::read_prefix(&mut cursor, width, opts.endian)?;
                Self::read_prefixed_count(&mut elems, count, &mut cursor)?;
            }
            (_, Sequence::LengthPrefix(width)) => {
                let len = sequence::read_prefix(&mut cursor, width, opts.endian)?;
                let mut span = sequence::take_span(&mut cursor, len)?;
                Self::read_to_end(&mut elems, &mut span).map_err(sequence::within_span)?;
            }
            (_, Sequence::Terminated(terminator)) => {
                Self::read_terminated(&mut elems, terminator, &mut cursor)?;
            }
        }
        self.elems = elems;
        *buf = cursor;
        Ok(())
    }

    fn write<W: WriteBuf + ?Sized>(&self, out: &mut W) -> Result<()> {
        let opts = S::OPTIONS;
        ensure_space(out, self.length())?;
        match opts.sequence {
            Sequence::Fixed(count) => {
                if self.len() > count {
                    return Err(Error::InvalidMsgData);
                }
                for elem in self.iter() {
                    elem.write(out)?;
                }
                let padding = E::default();
                for _ in self.len()..count {
                    padding.write(out)?;
                }
                return Ok(());
            }
            Sequence::CountPrefix(width) => {
                sequence::write_prefix(out, self.len(), width, opts.endian)?;
            }
            Sequence::LengthPrefix(width) => {
                sequence::write_prefix(out, self.elems_length(), width, opts.endian)?;
            }
            Sequence::Remaining | Sequence::Terminated(_) => {}
        }
        for elem in self.iter() {
            elem.write(out)?;
        }
        if let Sequence::Terminated(terminator) = opts.sequence {
            out.put_slice(terminator);
        }
        Ok(())
    }

    fn refresh(&mut self) -> bool {
        let mut changed = false;
        for elem in self.value_mut() {
            changed |= elem.refresh();
        }
        changed
    }
}
