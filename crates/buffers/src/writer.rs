//! Auto-growing binary buffer writer.

/// A binary buffer writer.
///
/// Bytes are appended at the cursor `x`. Everything between `x0` and `x` is
/// the message currently being built; [`Writer::flush`] hands it out and
/// moves `x0` forward. When the buffer runs out of room the unflushed tail is
/// compacted to the front before growing.
///
/// # Example
///
/// ```
/// use graphpack_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u32(0x01020304);
/// assert_eq!(writer.flush(), vec![1, 2, 3, 4]);
/// writer.u8(5);
/// assert_eq!(writer.flush(), vec![5]);
/// ```
#[derive(Debug, Clone)]
pub struct Writer {
    /// The underlying buffer.
    pub uint8: Vec<u8>,
    /// Start of the unflushed region.
    pub x0: usize,
    /// Current write position.
    pub x: usize,
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with default allocation size (64 KiB).
    pub fn new() -> Self {
        Self::with_alloc_size(64 * 1024)
    }

    /// Creates a new writer with a custom allocation size.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        let alloc_size = alloc_size.max(1);
        Self {
            uint8: vec![0; alloc_size],
            x0: 0,
            x: 0,
            alloc_size,
        }
    }

    /// Makes sure at least `capacity` more bytes can be written at `x`.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if self.x + capacity <= self.uint8.len() {
            return;
        }
        if self.x0 > 0 {
            self.uint8.copy_within(self.x0..self.x, 0);
            self.x -= self.x0;
            self.x0 = 0;
            if self.x + capacity <= self.uint8.len() {
                return;
            }
        }
        let required = self.x + capacity;
        let size = required.max(self.uint8.len() * 2).max(self.alloc_size);
        self.uint8.resize(size, 0);
    }

    /// Discards all written data, keeping the allocation.
    pub fn reset(&mut self) {
        self.x0 = 0;
        self.x = 0;
    }

    /// Returns the unflushed bytes and starts a new region after them.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[self.x0..self.x].to_vec();
        self.x0 = self.x;
        result
    }

    /// Returns the unflushed bytes without consuming them.
    pub fn unflushed(&self) -> &[u8] {
        &self.uint8[self.x0..self.x]
    }

    /// Moves the cursor back to `x`, dropping everything written after it.
    ///
    /// Positions before `x0` cannot be restored.
    pub fn truncate(&mut self, x: usize) {
        if x >= self.x0 && x < self.x {
            self.x = x;
        }
    }

    #[inline]
    fn put<const N: usize>(&mut self, bytes: [u8; N]) {
        self.ensure_capacity(N);
        self.uint8[self.x..self.x + N].copy_from_slice(&bytes);
        self.x += N;
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.put([val]);
    }

    /// Writes a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.put(val.to_be_bytes());
    }

    /// Writes an unsigned 16-bit integer (big-endian).
    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.put(val.to_be_bytes());
    }

    /// Writes a signed 16-bit integer (big-endian).
    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.put(val.to_be_bytes());
    }

    /// Writes an unsigned 32-bit integer (big-endian).
    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.put(val.to_be_bytes());
    }

    /// Writes a signed 32-bit integer (big-endian).
    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.put(val.to_be_bytes());
    }

    /// Writes an unsigned 64-bit integer (big-endian).
    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.put(val.to_be_bytes());
    }

    /// Writes a signed 64-bit integer (big-endian).
    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.put(val.to_be_bytes());
    }

    /// Writes a 32-bit float as its big-endian bit pattern.
    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.put(val.to_be_bytes());
    }

    /// Writes a 64-bit float as its big-endian bit pattern.
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.put(val.to_be_bytes());
    }

    /// Writes raw bytes.
    pub fn buf(&mut self, data: &[u8]) {
        self.ensure_capacity(data.len());
        self.uint8[self.x..self.x + data.len()].copy_from_slice(data);
        self.x += data.len();
    }

    /// Writes the UTF-8 bytes of a string and returns the byte count.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.buf(s.as_bytes());
        s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grows_past_alloc_size() {
        let mut writer = Writer::with_alloc_size(2);
        writer.u32(0xdeadbeef);
        writer.u8(1);
        assert_eq!(writer.flush(), vec![0xde, 0xad, 0xbe, 0xef, 1]);
    }

    #[test]
    fn test_flush_regions() {
        let mut writer = Writer::with_alloc_size(4);
        writer.u16(0x0102);
        assert_eq!(writer.flush(), vec![1, 2]);
        writer.u16(0x0304);
        writer.u16(0x0506);
        assert_eq!(writer.x0, 0);
        assert_eq!(writer.flush(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_truncate() {
        let mut writer = Writer::new();
        writer.u8(1);
        let mark = writer.x;
        writer.u32(7);
        writer.truncate(mark);
        writer.u8(2);
        assert_eq!(writer.flush(), vec![1, 2]);
    }

    #[test]
    fn test_truncate_ignores_flushed_positions() {
        let mut writer = Writer::new();
        writer.u8(1);
        writer.flush();
        writer.u8(2);
        writer.truncate(0);
        assert_eq!(writer.unflushed(), &[2]);
    }

    #[test]
    fn test_reset() {
        let mut writer = Writer::new();
        writer.u64(42);
        writer.reset();
        assert!(writer.unflushed().is_empty());
    }

    #[test]
    fn test_utf8_returns_byte_count() {
        let mut writer = Writer::new();
        assert_eq!(writer.utf8("日本"), 6);
    }
}
