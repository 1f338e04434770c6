//! Growable byte buffer with nested sub-buffers for depth-first encoding.
//!
//! A [`DynBuf`] owns its storage and grows on demand in both directions. A
//! [`SubBuf`] is a reserved window inside an ancestor's storage: content can
//! be written into it, a tag+length header prepended once the content length
//! is known, and the window folded back into the ancestor — all without
//! copying content that is already in place. Every byte at every nesting
//! depth lives in the single top-level allocation; a sub-buffer never owns
//! memory and grows only by delegating to its master.
//!
//! Failures are sticky: the first error is recorded and every later
//! operation on the same buffer is a no-op failure, so a whole nested
//! structure can be built speculatively and checked once at `finish` or
//! `detach`.

use mossl_types::CodecError;

use crate::asn1::{encode_header, header_len};
use crate::buf::Buf;

/// Minimum growth increment; smaller requests round up to amortize
/// repeated small growths.
const GROW_MIN: usize = 64;

/// Head room reserved when opening a constructed tag, enough for a
/// short-form tag+length header.
const CONSTRUCTED_HEADROOM: usize = 4;

/// Initial capacity of a constructed-tag sub-buffer.
const CONSTRUCTED_HINT: usize = 20;

/// Shared view of a dynamic buffer for the generic append/prepend/grow
/// paths. Offsets are absolute indices into the top-level storage.
trait DynBufCore {
    /// The whole top-level storage.
    fn arena_mut(&mut self) -> &mut [u8];
    /// Filled window, `(start, end)`.
    fn win(&self) -> (usize, usize);
    /// Region bounds this buffer may fill, `(lo, hi)`.
    fn bounds(&self) -> (usize, usize);
    fn set_win(&mut self, start: usize, end: usize);
    /// Make room: `head` extra bytes before the window, `tail` after.
    fn grow(&mut self, head: usize, tail: usize) -> bool;
    fn failed(&self) -> Option<CodecError>;
    fn poison(&mut self, err: CodecError);
}

fn append_core<'a>(b: &'a mut dyn DynBufCore, n: usize) -> Option<&'a mut [u8]> {
    if b.failed().is_some() {
        return None;
    }
    let (_, end) = b.win();
    let (_, hi) = b.bounds();
    if end + n > hi && !b.grow(0, n) {
        return None;
    }
    let (start, end) = b.win();
    b.set_win(start, end + n);
    Some(&mut b.arena_mut()[end..end + n])
}

fn prepend_core<'a>(b: &'a mut dyn DynBufCore, n: usize) -> Option<&'a mut [u8]> {
    if b.failed().is_some() {
        return None;
    }
    let (start, _) = b.win();
    let (lo, _) = b.bounds();
    if start < lo + n && !b.grow(n, 0) {
        return None;
    }
    let (start, end) = b.win();
    b.set_win(start - n, end);
    Some(&mut b.arena_mut()[start - n..start])
}

fn reserve_prepend_core(b: &mut dyn DynBufCore, n: usize) {
    if b.failed().is_some() {
        return;
    }
    // Only does anything while nothing has been written; the prepend path
    // grows on demand otherwise.
    let (start, end) = b.win();
    let (_, hi) = b.bounds();
    if start == end && end + n <= hi {
        b.set_win(start + n, end + n);
    }
}

fn append_bytes_core(b: &mut dyn DynBufCore, bytes: &[u8]) {
    if let Some(dst) = append_core(b, bytes.len()) {
        dst.copy_from_slice(bytes);
    }
}

fn append_tlv_core(b: &mut dyn DynBufCore, tag: u8, content: &[u8]) {
    let hdr = header_len(content.len());
    if let Some(dst) = append_core(b, hdr + content.len()) {
        encode_header(tag, content.len(), dst);
        dst[hdr..].copy_from_slice(content);
    }
}

fn append_utf8_core(b: &mut dyn DynBufCore, ch: u32) {
    // Certificate string fields never need more than this range.
    if ch > 0x1FFFF {
        b.poison(CodecError::InvalidArg);
        return;
    }
    if ch < 0x80 {
        if let Some(dst) = append_core(b, 1) {
            dst[0] = ch as u8;
        }
    } else if ch <= 0x7FF {
        if let Some(dst) = append_core(b, 2) {
            dst[0] = 0xC0 | (ch >> 6) as u8;
            dst[1] = 0x80 | (ch & 0x3F) as u8;
        }
    } else if ch <= 0xFFFF {
        if let Some(dst) = append_core(b, 3) {
            dst[0] = 0xE0 | (ch >> 12) as u8;
            dst[1] = 0x80 | ((ch >> 6) & 0x3F) as u8;
            dst[2] = 0x80 | (ch & 0x3F) as u8;
        }
    } else if let Some(dst) = append_core(b, 4) {
        dst[0] = 0xF0 | (ch >> 18) as u8;
        dst[1] = 0x80 | ((ch >> 12) & 0x3F) as u8;
        dst[2] = 0x80 | ((ch >> 6) & 0x3F) as u8;
        dst[3] = 0x80 | (ch & 0x3F) as u8;
    }
}

fn sub_init<'m>(master: &'m mut (dyn DynBufCore + 'm), capacity: usize) -> SubBuf<'m> {
    if append_core(master, capacity).is_some() {
        let (_, end) = master.win();
        SubBuf {
            off: end - capacity,
            start: end - capacity,
            end: end - capacity,
            size: capacity,
            err: None,
            master,
        }
    } else {
        master.poison(CodecError::MemAllocFail);
        SubBuf {
            off: 0,
            start: 0,
            end: 0,
            size: 0,
            err: Some(CodecError::MemAllocFail),
            master,
        }
    }
}

fn sub_init_at<'m>(
    master: &'m mut (dyn DynBufCore + 'm),
    at: usize,
    length: usize,
) -> SubBuf<'m> {
    if master.failed().is_none() {
        let (start, end) = master.win();
        if at + length <= end - start {
            let off = start + at;
            return SubBuf {
                off,
                start: off,
                end: off,
                size: length,
                err: None,
                master,
            };
        }
    }
    master.poison(CodecError::InvalidArg);
    SubBuf {
        off: 0,
        start: 0,
        end: 0,
        size: 0,
        err: Some(CodecError::InvalidArg),
        master,
    }
}

/// A growable buffer that owns its storage.
pub struct DynBuf {
    buf: Buf,
    err: Option<CodecError>,
}

impl DynBuf {
    /// Create a buffer with an initial capacity guess. An allocation
    /// failure is recorded as the sticky error rather than returned.
    pub fn with_capacity(capacity: usize) -> Self {
        match Buf::with_capacity(capacity) {
            Ok(buf) => Self { buf, err: None },
            Err(e) => Self {
                buf: Buf::default(),
                err: Some(e),
            },
        }
    }

    /// Reserve `n` bytes at the tail, growing if needed.
    pub fn append(&mut self, n: usize) -> Option<&mut [u8]> {
        append_core(self, n)
    }

    /// Append a byte slice.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        append_bytes_core(self, bytes);
    }

    /// Reserve `n` bytes at the head, growing if needed.
    pub fn prepend(&mut self, n: usize) -> Option<&mut [u8]> {
        prepend_core(self, n)
    }

    /// Reserve head room for later prepending; only useful while empty.
    pub fn reserve_prepend(&mut self, n: usize) {
        reserve_prepend_core(self, n);
    }

    /// Append one Unicode scalar value as UTF-8 (1-4 bytes). Values above
    /// `0x1FFFF` are rejected as `InvalidArg`.
    pub fn append_utf8(&mut self, ch: u32) {
        append_utf8_core(self, ch);
    }

    /// Append a complete tag+length+content value.
    pub fn append_tlv(&mut self, tag: u8, content: &[u8]) {
        append_tlv_core(self, tag, content);
    }

    /// Carve a sub-buffer of `capacity` fresh bytes at the tail.
    pub fn begin_sub(&mut self, capacity: usize) -> SubBuf<'_> {
        sub_init(self, capacity)
    }

    /// Carve a sub-buffer aliasing `length` already-filled bytes at window
    /// offset `at`, to be overwritten and re-tagged.
    pub fn begin_sub_at(&mut self, at: usize, length: usize) -> SubBuf<'_> {
        sub_init_at(self, at, length)
    }

    /// Open a constructed value whose length is not yet known; fill the
    /// returned sub-buffer, then call [`SubBuf::end_constructed`].
    pub fn begin_constructed(&mut self) -> SubBuf<'_> {
        let mut sub = sub_init(self, CONSTRUCTED_HINT);
        reserve_prepend_core(&mut sub, CONSTRUCTED_HEADROOM);
        sub
    }

    /// The filled window.
    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The sticky error state.
    pub fn check(&self) -> Result<(), CodecError> {
        match self.err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Hand the filled bytes to the caller, or the sticky error if any
    /// operation failed along the way.
    pub fn detach(self) -> Result<Vec<u8>, CodecError> {
        if let Some(e) = self.err {
            return Err(e);
        }
        self.buf.detach()
    }
}

impl DynBufCore for DynBuf {
    fn arena_mut(&mut self) -> &mut [u8] {
        self.buf.storage_mut()
    }

    fn win(&self) -> (usize, usize) {
        self.buf.window()
    }

    fn bounds(&self) -> (usize, usize) {
        (0, self.buf.capacity())
    }

    fn set_win(&mut self, start: usize, end: usize) {
        self.buf.set_window(start, end);
    }

    fn grow(&mut self, mut head: usize, mut tail: usize) -> bool {
        if self.err.is_some() {
            return false;
        }
        if head != 0 && head < GROW_MIN {
            head = GROW_MIN;
        }
        if tail < GROW_MIN {
            tail = GROW_MIN;
        }
        let headroom = self.buf.headroom();
        let tailroom = self.buf.tailroom();
        let filled = self.buf.len();
        head += headroom;
        tail += tailroom;
        let mut fresh = match Buf::with_capacity(head + filled + tail) {
            Ok(b) => b,
            Err(e) => {
                // Prior content stays valid; the buffer is just failed.
                self.err = Some(e);
                return false;
            }
        };
        fresh.reserve_prepend(head);
        if let Some(dst) = fresh.append_size(filled) {
            dst.copy_from_slice(self.buf.as_slice());
        }
        self.buf = fresh;
        true
    }

    fn failed(&self) -> Option<CodecError> {
        self.err
    }

    fn poison(&mut self, err: CodecError) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }
}

/// A nested window inside a [`DynBuf`] (or another `SubBuf`).
///
/// Holding a `SubBuf` mutably borrows its master, so the master cannot be
/// touched until this sub-buffer is finished, ended, or dropped. Dropping
/// without finishing abandons the window's writes without folding them
/// back (the cancel path); the reserved bytes stay in the master.
pub struct SubBuf<'m> {
    master: &'m mut (dyn DynBufCore + 'm),
    /// Region bounds within the arena: `[off, off + size)`.
    off: usize,
    size: usize,
    /// Filled window within the region.
    start: usize,
    end: usize,
    err: Option<CodecError>,
}

impl<'m> SubBuf<'m> {
    /// Reserve `n` bytes at the tail, growing (through the master) if
    /// needed.
    pub fn append(&mut self, n: usize) -> Option<&mut [u8]> {
        append_core(self, n)
    }

    /// Append a byte slice.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        append_bytes_core(self, bytes);
    }

    /// Reserve `n` bytes at the head.
    pub fn prepend(&mut self, n: usize) -> Option<&mut [u8]> {
        prepend_core(self, n)
    }

    /// Reserve head room for later prepending; only useful while empty.
    pub fn reserve_prepend(&mut self, n: usize) {
        reserve_prepend_core(self, n);
    }

    /// Append one Unicode scalar value as UTF-8.
    pub fn append_utf8(&mut self, ch: u32) {
        append_utf8_core(self, ch);
    }

    /// Append a complete tag+length+content value.
    pub fn append_tlv(&mut self, tag: u8, content: &[u8]) {
        append_tlv_core(self, tag, content);
    }

    /// Carve a nested sub-buffer at this buffer's tail.
    pub fn begin_sub(&mut self, capacity: usize) -> SubBuf<'_> {
        sub_init(self, capacity)
    }

    /// Carve a nested sub-buffer over already-filled bytes.
    pub fn begin_sub_at(&mut self, at: usize, length: usize) -> SubBuf<'_> {
        sub_init_at(self, at, length)
    }

    /// Open a nested constructed value.
    pub fn begin_constructed(&mut self) -> SubBuf<'_> {
        let mut sub = sub_init(self, CONSTRUCTED_HINT);
        reserve_prepend_core(&mut sub, CONSTRUCTED_HEADROOM);
        sub
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Fold the filled content back into the master: content moves to the
    /// start of the reserved window, the master's bytes after the window
    /// shift left over the unused room, and the master's tail pointer is
    /// adjusted. An errored sub-buffer instead propagates its error to the
    /// master and moves nothing.
    pub fn finish(self) -> Result<(), CodecError> {
        let SubBuf {
            master,
            off,
            size,
            start,
            end,
            err,
        } = self;
        if let Some(e) = err {
            master.poison(e);
            return Err(e);
        }
        let total = size;
        let filled = end - start;
        let (m_start, m_end) = master.win();
        let offset_tail = m_end - (off + size);
        if off != start && filled > 0 {
            master.arena_mut().copy_within(start..start + filled, off);
        }
        if offset_tail > 0 {
            master
                .arena_mut()
                .copy_within(m_end - offset_tail..m_end, m_end - total + filled - offset_tail);
        }
        master.set_win(m_start, m_end - total + filled);
        Ok(())
    }

    /// Prepend the tag+length header for the accumulated content, then
    /// fold this sub-buffer back into the master.
    pub fn end_constructed(mut self, tag: u8) -> Result<(), CodecError> {
        let len = self.end - self.start;
        let hdr = header_len(len);
        if let Some(dst) = prepend_core(&mut self, hdr) {
            encode_header(tag, len, dst);
        }
        self.finish()
    }

    /// Abandon this sub-buffer without folding anything back. The master
    /// keeps the reserved bytes but its window is not advanced or errored.
    pub fn cancel(self) {}
}

impl<'m> DynBufCore for SubBuf<'m> {
    fn arena_mut(&mut self) -> &mut [u8] {
        self.master.arena_mut()
    }

    fn win(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    fn bounds(&self) -> (usize, usize) {
        (self.off, self.off + self.size)
    }

    fn set_win(&mut self, start: usize, end: usize) {
        debug_assert!(self.off <= start && start <= end && end <= self.off + self.size);
        self.start = start;
        self.end = end;
    }

    fn grow(&mut self, mut head: usize, mut tail: usize) -> bool {
        if self.err.is_some() {
            return false;
        }
        if head != 0 && head < GROW_MIN {
            head = GROW_MIN;
        }
        if tail < GROW_MIN {
            tail = GROW_MIN;
        }
        let headroom = self.start - self.off;
        let tailroom = (self.off + self.size) - self.end;
        let filled = self.end - self.start;
        let (m_start, m_end) = self.master.win();
        let offset = self.off - m_start;
        let offset_tail = m_end - (self.off + self.size);
        // The extra room is inserted contiguously around this window, so
        // the master grows once by the combined amount.
        if !self.master.grow(0, head + tail) {
            self.err = Some(self.master.failed().unwrap_or(CodecError::MemAllocFail));
            return false;
        }
        let (m_start, m_end) = self.master.win();
        let m_end = m_end + head + tail;
        self.master.set_win(m_start, m_end);
        if offset_tail > 0 {
            let src = m_end - offset_tail - head - tail;
            self.master
                .arena_mut()
                .copy_within(src..src + offset_tail, m_end - offset_tail);
        }
        // Recompute against the (possibly relocated) master storage.
        self.off = m_start + offset;
        self.start = self.off + headroom + head;
        if head > 0 && filled > 0 {
            let from = self.start - head;
            self.master
                .arena_mut()
                .copy_within(from..from + filled, self.start);
        }
        self.end = self.start + filled;
        self.size = head + headroom + filled + tailroom + tail;
        true
    }

    fn failed(&self) -> Option<CodecError> {
        self.err
    }

    fn poison(&mut self, err: CodecError) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }
}
