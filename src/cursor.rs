//! Write-side cursors
//!
//! Reads use a plain `&mut &[u8]`: the slice is both the position and the
//! number of bytes still available, and it only moves forward on success.
//! Writes go through [`WriteBuf`], which bounds the output length and tells
//! layers whether already-written bytes can be read back (random access) or
//! not (sequential sink).

use bytes::{BufMut, BytesMut};

/// Destination of serialised bytes
pub trait WriteBuf {
    /// Number of bytes written through this cursor so far
    fn position(&self) -> usize;

    /// Number of bytes that can still be written
    fn remaining_mut(&self) -> usize;

    /// Append bytes. Callers check [`WriteBuf::remaining_mut`] first.
    fn put_slice(&mut self, src: &[u8]);

    /// Bytes written since `mark` (a previous [`WriteBuf::position`]).
    ///
    /// Returns `None` for sequential sinks that cannot be read back.
    fn written_since(&self, mark: usize) -> Option<&[u8]>;
}

/// Random-access cursor over a caller-owned slice
#[derive(Debug)]
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    /// Wrap the provided output slice
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Consume the cursor and return the written prefix
    #[must_use]
    pub fn into_written(self) -> &'a mut [u8] {
        &mut self.buf[..self.pos]
    }
}

impl WriteBuf for SliceWriter<'_> {
    fn position(&self) -> usize {
        self.pos
    }

    fn remaining_mut(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn put_slice(&mut self, src: &[u8]) {
        let end = self.pos + src.len();
        self.buf[self.pos..end].copy_from_slice(src);
        self.pos = end;
    }

    fn written_since(&self, mark: usize) -> Option<&[u8]> {
        self.buf.get(mark..self.pos)
    }
}

impl WriteBuf for Vec<u8> {
    fn position(&self) -> usize {
        self.len()
    }

    fn remaining_mut(&self) -> usize {
        isize::MAX as usize - self.len()
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.extend_from_slice(src);
    }

    fn written_since(&self, mark: usize) -> Option<&[u8]> {
        self.get(mark..)
    }
}

impl WriteBuf for BytesMut {
    fn position(&self) -> usize {
        self.len()
    }

    fn remaining_mut(&self) -> usize {
        BufMut::remaining_mut(self)
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.extend_from_slice(src);
    }

    fn written_since(&self, mark: usize) -> Option<&[u8]> {
        self.get(mark..)
    }
}

/// Sequential sink over any [`BufMut`]; written bytes cannot be read back
#[derive(Debug)]
pub struct StreamWriter<B> {
    inner: B,
    written: usize,
    limit: usize,
}

impl<B: BufMut> StreamWriter<B> {
    /// Wrap a sink without an explicit length bound
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            written: 0,
            limit: usize::MAX,
        }
    }

    /// Wrap a sink that accepts at most `limit` bytes
    pub fn with_limit(inner: B, limit: usize) -> Self {
        Self {
            inner,
            written: 0,
            limit,
        }
    }

    /// Consume the writer and return the underlying sink
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: BufMut> WriteBuf for StreamWriter<B> {
    fn position(&self) -> usize {
        self.written
    }

    fn remaining_mut(&self) -> usize {
        self.inner
            .remaining_mut()
            .min(self.limit.saturating_sub(self.written))
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.inner.put_slice(src);
        self.written += src.len();
    }

    fn written_since(&self, _mark: usize) -> Option<&[u8]> {
        None
    }
}
