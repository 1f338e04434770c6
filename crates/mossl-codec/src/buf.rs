//! Fixed-capacity byte region with a movable filled window.

use mossl_types::CodecError;

/// A fixed-capacity byte region with a filled sub-window.
///
/// The window `[start, end)` always satisfies `start <= end <= capacity`.
/// Content may be appended (extending `end` rightward) or prepended
/// (extending `start` leftward into previously reserved headroom) without
/// reallocation, as long as room remains.
pub struct Buf {
    storage: Vec<u8>,
    start: usize,
    end: usize,
}

impl Default for Buf {
    fn default() -> Self {
        Self {
            storage: Vec::new(),
            start: 0,
            end: 0,
        }
    }
}

impl Buf {
    /// Allocate a region of `capacity` bytes with an empty window.
    pub fn with_capacity(capacity: usize) -> Result<Self, CodecError> {
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| CodecError::MemAllocFail)?;
        storage.resize(capacity, 0);
        Ok(Self {
            storage,
            start: 0,
            end: 0,
        })
    }

    /// Allocate a region holding a copy of `data`, window already filled.
    pub fn from_data(data: &[u8]) -> Result<Self, CodecError> {
        let mut buf = Self::with_capacity(data.len())?;
        buf.storage.copy_from_slice(data);
        buf.end = data.len();
        Ok(buf)
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Length of the filled window.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Unused bytes before the window.
    pub fn headroom(&self) -> usize {
        self.start
    }

    /// Unused bytes after the window.
    pub fn tailroom(&self) -> usize {
        self.storage.len() - self.end
    }

    /// The filled window.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.start..self.end]
    }

    /// Extend the window by `n` bytes at the tail, returning the newly
    /// exposed bytes, or `None` if capacity is exhausted.
    pub fn append_size(&mut self, n: usize) -> Option<&mut [u8]> {
        if self.end + n > self.storage.len() {
            return None;
        }
        let at = self.end;
        self.end += n;
        Some(&mut self.storage[at..at + n])
    }

    /// Reserve `n` bytes of headroom for later prepending.
    ///
    /// Only meaningful while the window is empty; silently does nothing if
    /// there is no room.
    pub fn reserve_prepend(&mut self, n: usize) {
        debug_assert!(self.start == self.end);
        if self.end + n <= self.storage.len() {
            self.start += n;
            self.end += n;
        }
    }

    /// Extend the window by `n` bytes at the head, returning the newly
    /// exposed bytes, or `None` if there is not enough headroom.
    pub fn prepend_size(&mut self, n: usize) -> Option<&mut [u8]> {
        if self.start < n {
            return None;
        }
        self.start -= n;
        Some(&mut self.storage[self.start..self.start + n])
    }

    /// Hand the filled window to the caller as a minimal allocation,
    /// consuming the region.
    pub fn detach(self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        out.try_reserve_exact(self.len())
            .map_err(|_| CodecError::MemAllocFail)?;
        out.extend_from_slice(self.as_slice());
        Ok(out)
    }

    /// Render the filled window as lowercase hex.
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(self.len() * 2);
        for b in self.as_slice() {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }

    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    pub(crate) fn window(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub(crate) fn set_window(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end && end <= self.storage.len());
        self.start = start;
        self.end = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_within_capacity() {
        let mut buf = Buf::with_capacity(8).unwrap();
        buf.append_size(4).unwrap().copy_from_slice(b"abcd");
        assert_eq!(buf.as_slice(), b"abcd");
        assert_eq!(buf.tailroom(), 4);
        assert!(buf.append_size(5).is_none());
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_reserve_then_prepend() {
        let mut buf = Buf::with_capacity(8).unwrap();
        buf.reserve_prepend(3);
        buf.append_size(2).unwrap().copy_from_slice(b"cd");
        buf.prepend_size(2).unwrap().copy_from_slice(b"ab");
        assert_eq!(buf.as_slice(), b"abcd");
        // Only one byte of headroom left.
        assert!(buf.prepend_size(2).is_none());
        assert!(buf.prepend_size(1).is_some());
    }

    #[test]
    fn test_prepend_without_headroom_fails() {
        let mut buf = Buf::with_capacity(4).unwrap();
        assert!(buf.prepend_size(1).is_none());
    }

    #[test]
    fn test_detach_copies_window_only() {
        let mut buf = Buf::with_capacity(16).unwrap();
        buf.reserve_prepend(5);
        buf.append_size(3).unwrap().copy_from_slice(b"xyz");
        let out = buf.detach().unwrap();
        assert_eq!(out, b"xyz");
    }

    #[test]
    fn test_from_data() {
        let buf = Buf::from_data(b"hello").unwrap();
        assert_eq!(buf.as_slice(), b"hello");
        assert_eq!(buf.headroom(), 0);
        assert_eq!(buf.tailroom(), 0);
    }

    #[test]
    fn test_as_hex() {
        let buf = Buf::from_data(&[0x00, 0x1f, 0xab, 0xff]).unwrap();
        assert_eq!(buf.as_hex(), "001fabff");
    }
}
