//! Forward-only parse cursor over borrowed input, with nested sub-cursors
//! for descending into constructed DER values.
//!
//! Errors are sticky: the first failure is recorded and every later read
//! returns the no-progress result, so a caller can chain an arbitrary
//! sequence of reads and inspect [`ParseBuf::check`] once at the end.

use std::ops::{Deref, DerefMut};

use mossl_types::CodecError;

use crate::asn1::MAX_TAG_CONTENT;

/// Tag-length summary of the value at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLen {
    /// Total encoded size, header plus content.
    pub total: usize,
    /// Header size (tag byte plus length octets).
    pub hdr: usize,
}

impl TagLen {
    /// Content length of the value.
    pub fn content(&self) -> usize {
        self.total - self.hdr
    }
}

/// A forward-only cursor over a borrowed byte slice.
pub struct ParseBuf<'a> {
    data: &'a [u8],
    pos: usize,
    err: Option<CodecError>,
}

impl<'a> ParseBuf<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            err: None,
        }
    }

    /// The unconsumed input.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The sticky error state.
    pub fn check(&self) -> Result<(), CodecError> {
        match self.err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    fn peek_inner(&self, tag: Option<u8>) -> Result<TagLen, CodecError> {
        let b = self.remaining();
        if b.len() < 2 {
            return Err(CodecError::TruncatedInput);
        }
        if let Some(t) = tag {
            if b[0] != t {
                return Err(CodecError::UnexpectedTag);
            }
        }
        let l = b[1];
        let (len, hdr) = if l < 0x80 {
            (usize::from(l), 2)
        } else {
            if l == 0x80 || l > 0x84 {
                // Indefinite and over-wide length forms are not DER.
                return Err(CodecError::MalformedLength);
            }
            let n = usize::from(l & 0x7F);
            if b.len() < 2 + n {
                return Err(CodecError::MalformedLength);
            }
            // DER requires the minimal length form.
            if n == 1 && b[2] < 0x80 {
                return Err(CodecError::MalformedLength);
            }
            if n > 1 && b[2] == 0 {
                return Err(CodecError::MalformedLength);
            }
            let mut len = 0usize;
            for &byte in &b[2..2 + n] {
                len = (len << 8) | usize::from(byte);
            }
            (len, 2 + n)
        };
        if len > MAX_TAG_CONTENT {
            return Err(CodecError::ValueTooLarge);
        }
        let total = hdr + len;
        if total > b.len() {
            return Err(CodecError::TruncatedInput);
        }
        Ok(TagLen { total, hdr })
    }

    /// Tag-length of the value at the cursor without consuming it, or
    /// `None` if the cursor is errored or no well-formed value is present.
    pub fn peek_tag_len(&self) -> Option<TagLen> {
        if self.err.is_some() {
            return None;
        }
        self.peek_inner(None).ok()
    }

    /// Whether a complete value with the given tag sits at the cursor.
    pub fn can_read(&self, tag: u8) -> bool {
        self.err.is_none() && self.peek_inner(Some(tag)).is_ok()
    }

    /// Consume `lit` if the input starts with it. Returns the number of
    /// bytes consumed (0 on mismatch, without error).
    pub fn try_skip_bytes(&mut self, lit: &[u8]) -> usize {
        if self.err.is_some() {
            return 0;
        }
        if self.remaining().starts_with(lit) {
            self.pos += lit.len();
            lit.len()
        } else {
            0
        }
    }

    /// Like [`Self::try_skip_bytes`] but a mismatch is an error.
    pub fn skip_bytes(&mut self, lit: &[u8]) -> usize {
        let n = self.try_skip_bytes(lit);
        if n == 0 && self.err.is_none() {
            self.err = Some(CodecError::UnexpectedTag);
        }
        n
    }

    /// Descend into the content of the value with the given tag. On
    /// failure the returned sub-cursor is errored and this cursor is left
    /// untouched; progress happens only at [`ParseSub::finish`].
    pub fn try_read_sub<'p>(&'p mut self, tag: u8) -> ParseSub<'p, 'a> {
        match self.maybe_sub(tag) {
            Ok(sub) => sub,
            Err((sub, _)) => sub,
        }
    }

    /// Like [`Self::try_read_sub`] but a failure also poisons this cursor.
    pub fn read_sub<'p>(&'p mut self, tag: u8) -> ParseSub<'p, 'a> {
        match self.maybe_sub(tag) {
            Ok(sub) => sub,
            Err((sub, e)) => {
                sub.master.err.get_or_insert(e);
                sub
            }
        }
    }

    fn maybe_sub<'p>(
        &'p mut self,
        tag: u8,
    ) -> Result<ParseSub<'p, 'a>, (ParseSub<'p, 'a>, CodecError)> {
        if let Some(e) = self.err {
            let sub = ParseSub {
                cur: ParseBuf {
                    data: &[],
                    pos: 0,
                    err: Some(e),
                },
                span: 0,
                master: self,
            };
            return Err((sub, e));
        }
        match self.peek_inner(Some(tag)) {
            Ok(tl) => {
                let content = &self.remaining()[tl.hdr..tl.total];
                Ok(ParseSub {
                    cur: ParseBuf::new(content),
                    span: tl.total,
                    master: self,
                })
            }
            Err(e) => {
                let sub = ParseSub {
                    cur: ParseBuf {
                        data: &[],
                        pos: 0,
                        err: Some(e),
                    },
                    span: 0,
                    master: self,
                };
                Err((sub, e))
            }
        }
    }

    /// Read the content bytes of the value with the given tag, consuming
    /// the whole value. Returns `None` and poisons the cursor on failure.
    pub fn read_tag_ref(&mut self, tag: u8) -> Option<&'a [u8]> {
        if self.err.is_some() {
            return None;
        }
        match self.peek_inner(Some(tag)) {
            Ok(tl) => {
                let content = &self.remaining()[tl.hdr..tl.total];
                self.pos += tl.total;
                Some(content)
            }
            Err(e) => {
                self.err = Some(e);
                None
            }
        }
    }

    /// Skip a whole value with the given tag if present. Returns the
    /// bytes consumed (0 on mismatch, without error).
    pub fn try_skip_tag(&mut self, tag: u8) -> usize {
        if self.err.is_some() {
            return 0;
        }
        match self.peek_inner(Some(tag)) {
            Ok(tl) => {
                self.pos += tl.total;
                tl.total
            }
            Err(_) => 0,
        }
    }

    /// Like [`Self::try_skip_tag`] but a mismatch is an error.
    pub fn skip_tag(&mut self, tag: u8) -> usize {
        if self.err.is_some() {
            return 0;
        }
        match self.peek_inner(Some(tag)) {
            Ok(tl) => {
                self.pos += tl.total;
                tl.total
            }
            Err(e) => {
                self.err = Some(e);
                0
            }
        }
    }

    /// Copy all unconsumed bytes into `target`; the sticky error (if any)
    /// wins over the copy.
    pub fn copy_all(&self, target: &mut [u8]) -> Result<usize, CodecError> {
        if let Some(e) = self.err {
            return Err(e);
        }
        let src = self.remaining();
        if target.len() < src.len() {
            return Err(CodecError::OutputTooSmall {
                need: src.len(),
                got: target.len(),
            });
        }
        target[..src.len()].copy_from_slice(src);
        Ok(src.len())
    }
}

/// A sub-cursor over the content of one constructed value.
///
/// Dereferences to the inner [`ParseBuf`], so all read operations apply.
/// The parent cursor advances past the whole value only at [`finish`];
/// [`cancel`] (or dropping) leaves the parent where it was.
///
/// [`finish`]: Self::finish
/// [`cancel`]: Self::cancel
pub struct ParseSub<'p, 'a> {
    master: &'p mut ParseBuf<'a>,
    cur: ParseBuf<'a>,
    span: usize,
}

impl<'p, 'a> ParseSub<'p, 'a> {
    /// Commit: advance the parent past the parsed value. An errored
    /// sub-cursor propagates its error to the parent instead.
    pub fn finish(self) -> Result<(), CodecError> {
        if let Some(e) = self.cur.err {
            self.master.err.get_or_insert(e);
            return Err(e);
        }
        self.master.pos += self.span;
        Ok(())
    }

    /// Abandon without advancing or erroring the parent.
    pub fn cancel(self) {}
}

impl<'p, 'a> Deref for ParseSub<'p, 'a> {
    type Target = ParseBuf<'a>;

    fn deref(&self) -> &ParseBuf<'a> {
        &self.cur
    }
}

impl<'p, 'a> DerefMut for ParseSub<'p, 'a> {
    fn deref_mut(&mut self) -> &mut ParseBuf<'a> {
        &mut self.cur
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::{encode_header, header_len, tags};

    // SEQUENCE { SET { INTEGER 42 } }
    const NESTED: &[u8] = &[0x30, 0x05, 0x31, 0x03, 0x02, 0x01, 0x2A];

    #[test]
    fn test_peek_short_and_long_form() {
        let pb = ParseBuf::new(NESTED);
        assert_eq!(pb.peek_tag_len(), Some(TagLen { total: 7, hdr: 2 }));

        let mut long = vec![0x04, 0x82, 0x01, 0x00];
        long.extend(std::iter::repeat(0xAA).take(256));
        let pb = ParseBuf::new(&long);
        let tl = pb.peek_tag_len().unwrap();
        assert_eq!(tl, TagLen { total: 260, hdr: 4 });
        assert_eq!(tl.content(), 256);
    }

    #[test]
    fn test_peek_rejects_non_minimal_length() {
        // 0x81 with a value below 0x80 must use the short form.
        let pb = ParseBuf::new(&[0x04, 0x81, 0x7F]);
        assert_eq!(pb.peek_inner(None), Err(CodecError::MalformedLength));
        // Multi-octet length with a leading zero.
        let mut data = vec![0x04, 0x82, 0x00, 0x90];
        data.extend(std::iter::repeat(0).take(0x90));
        let pb = ParseBuf::new(&data);
        assert_eq!(pb.peek_inner(None), Err(CodecError::MalformedLength));
    }

    #[test]
    fn test_peek_rejects_indefinite_and_wide_forms() {
        let pb = ParseBuf::new(&[0x30, 0x80, 0x00, 0x00]);
        assert_eq!(pb.peek_inner(None), Err(CodecError::MalformedLength));
        let pb = ParseBuf::new(&[0x04, 0x85, 0x01, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(pb.peek_inner(None), Err(CodecError::MalformedLength));
    }

    #[test]
    fn test_peek_truncated_content() {
        let pb = ParseBuf::new(&[0x02, 0x03, 0x01]);
        assert_eq!(pb.peek_inner(None), Err(CodecError::TruncatedInput));
        let pb = ParseBuf::new(&[0x02]);
        assert_eq!(pb.peek_inner(None), Err(CodecError::TruncatedInput));
    }

    #[test]
    fn test_peek_roundtrips_encoded_headers() {
        for &len in &[0usize, 1, 127, 128, 255, 256, 65535, 65536, 16_777_215, 16_777_216] {
            let hdr = header_len(len);
            let mut data = vec![0u8; hdr + len];
            encode_header(tags::OCTET_STRING, len, &mut data);
            let pb = ParseBuf::new(&data);
            let tl = pb.peek_tag_len().unwrap_or_else(|| panic!("len {len}"));
            assert_eq!(tl.hdr, hdr);
            assert_eq!(tl.content(), len);
        }
    }

    #[test]
    fn test_nested_sub_parse() {
        let mut pb = ParseBuf::new(NESTED);
        let mut seq = pb.read_sub(tags::SEQUENCE);
        let mut set = seq.read_sub(tags::SET);
        let int = set.read_tag_ref(tags::INTEGER).unwrap();
        assert_eq!(int, &[0x2A]);
        assert_eq!(set.remaining_len(), 0);
        set.finish().unwrap();
        seq.finish().unwrap();
        assert_eq!(pb.remaining_len(), 0);
        assert!(pb.check().is_ok());
    }

    #[test]
    fn test_failed_reads_accumulate_without_progress() {
        let data = [0x02, 0x01, 0x05];
        let mut pb = ParseBuf::new(&data);
        for _ in 0..5 {
            let sub = pb.read_sub(tags::SEQUENCE);
            assert!(sub.finish().is_err());
        }
        assert_eq!(pb.remaining_len(), 3);
        assert_eq!(pb.check(), Err(CodecError::UnexpectedTag));
        // Once errored, even a matching read refuses to make progress.
        assert!(pb.read_tag_ref(tags::INTEGER).is_none());
        assert_eq!(pb.remaining_len(), 3);
    }

    #[test]
    fn test_try_read_sub_leaves_master_clean() {
        let data = [0x02, 0x01, 0x05];
        let mut pb = ParseBuf::new(&data);
        let sub = pb.try_read_sub(tags::SEQUENCE);
        sub.cancel();
        assert!(pb.check().is_ok());
        assert_eq!(pb.read_tag_ref(tags::INTEGER), Some(&[0x05][..]));
    }

    #[test]
    fn test_cancel_keeps_parent_position() {
        let mut pb = ParseBuf::new(NESTED);
        let seq = pb.try_read_sub(tags::SEQUENCE);
        seq.cancel();
        assert_eq!(pb.remaining_len(), NESTED.len());
        // The same value can still be read afterwards.
        let seq = pb.read_sub(tags::SEQUENCE);
        seq.finish().unwrap();
        assert_eq!(pb.remaining_len(), 0);
    }

    #[test]
    fn test_skip_bytes_literal() {
        let mut pb = ParseBuf::new(b"\x30\x03abc");
        assert_eq!(pb.try_skip_bytes(b"\x30\x03"), 2);
        assert_eq!(pb.try_skip_bytes(b"xyz"), 0);
        assert!(pb.check().is_ok());
        assert_eq!(pb.skip_bytes(b"xyz"), 0);
        assert_eq!(pb.check(), Err(CodecError::UnexpectedTag));
    }

    #[test]
    fn test_skip_tag_variants() {
        let data = [0x05, 0x00, 0x02, 0x01, 0x07];
        let mut pb = ParseBuf::new(&data);
        assert_eq!(pb.try_skip_tag(tags::INTEGER), 0);
        assert_eq!(pb.skip_tag(tags::NULL), 2);
        assert_eq!(pb.skip_tag(tags::INTEGER), 3);
        assert_eq!(pb.remaining_len(), 0);
        assert!(pb.check().is_ok());
    }

    #[test]
    fn test_can_read() {
        let pb = ParseBuf::new(NESTED);
        assert!(pb.can_read(tags::SEQUENCE));
        assert!(!pb.can_read(tags::SET));
    }

    #[test]
    fn test_copy_all() {
        let mut pb = ParseBuf::new(NESTED);
        pb.skip_bytes(&[0x30, 0x05]);
        let mut out = [0u8; 8];
        assert_eq!(pb.copy_all(&mut out), Ok(5));
        assert_eq!(&out[..5], &NESTED[2..]);
        let mut small = [0u8; 2];
        assert_eq!(
            pb.copy_all(&mut small),
            Err(CodecError::OutputTooSmall { need: 5, got: 2 })
        );
    }
}
