//! Bounds-checked big-endian cursor over a byte slice.

use crate::BufferError;

/// Cursor over `uint8[x..end]`.
///
/// Reads that need more bytes than remain return
/// [`BufferError::EndOfBuffer`] and leave `x` untouched, so a caller can
/// rewind or wait for more input without tracking partial progress.
///
/// ```
/// use graphpack_buffers::Reader;
///
/// let frame = [0x0b, 0x00, 0x00, 0x00, 0x02, 0xff];
/// let mut reader = Reader::new(&frame);
/// assert_eq!(reader.u8(), Ok(0x0b));
/// assert_eq!(reader.u32(), Ok(2));
/// assert_eq!(reader.size(), 1);
/// assert!(reader.u16().is_err());
/// assert_eq!(reader.x, 5);
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    pub uint8: &'a [u8],
    /// Next byte to read.
    pub x: usize,
    /// One past the last readable byte.
    pub end: usize,
}

macro_rules! read_be {
    ($($name:ident -> $ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self) -> Result<$ty, BufferError> {
                Ok(<$ty>::from_be_bytes(self.take()?))
            }
        )*
    };
}

impl<'a> Reader<'a> {
    pub fn new(uint8: &'a [u8]) -> Self {
        Self::from_slice(uint8, 0, uint8.len())
    }

    /// Reader over `uint8[x..end]`; both bounds are clamped to the slice.
    pub fn from_slice(uint8: &'a [u8], x: usize, end: usize) -> Self {
        let end = end.min(uint8.len());
        Self {
            uint8,
            x: x.min(end),
            end,
        }
    }

    /// Points the reader at the start of `uint8`.
    pub fn reset(&mut self, uint8: &'a [u8]) {
        *self = Self::new(uint8);
    }

    /// Bytes left before `end`.
    pub fn size(&self) -> usize {
        self.end - self.x
    }

    fn ensure(&self, len: usize) -> Result<(), BufferError> {
        if len > self.size() {
            Err(BufferError::EndOfBuffer)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let bytes = self.buf(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Next byte, without moving the cursor.
    pub fn peek(&self) -> Result<u8, BufferError> {
        self.ensure(1)?;
        Ok(self.uint8[self.x])
    }

    pub fn skip(&mut self, len: usize) -> Result<(), BufferError> {
        self.ensure(len)?;
        self.x += len;
        Ok(())
    }

    /// The next `len` bytes, borrowed from the input.
    pub fn buf(&mut self, len: usize) -> Result<&'a [u8], BufferError> {
        self.ensure(len)?;
        let start = self.x;
        self.x += len;
        Ok(&self.uint8[start..self.x])
    }

    read_be! {
        u8 -> u8,
        i8 -> i8,
        u16 -> u16,
        i16 -> i16,
        u32 -> u32,
        i32 -> i32,
        u64 -> u64,
        i64 -> i64,
        f32 -> f32,
        f64 -> f64,
    }

    /// `len` bytes of UTF-8. Invalid input is rejected without consuming it.
    pub fn utf8(&mut self, len: usize) -> Result<&'a str, BufferError> {
        self.ensure(len)?;
        let text = std::str::from_utf8(&self.uint8[self.x..self.x + len])
            .map_err(|_| BufferError::InvalidUtf8)?;
        self.x += len;
        Ok(text)
    }

    /// `len` ISO-8859-1 characters, one byte each.
    pub fn latin1(&mut self, len: usize) -> Result<String, BufferError> {
        Ok(self.buf(len)?.iter().copied().map(char::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_big_endian() {
        let bytes = [0x12, 0x34, 0x56, 0x78, 0xfe, 0xdc];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.u16(), Ok(0x1234));
        assert_eq!(reader.i16(), Ok(0x5678));
        assert_eq!(reader.i16(), Ok(-292));
        assert_eq!(reader.size(), 0);
    }

    #[test]
    fn running_out_keeps_the_cursor() {
        let bytes = [0x03, 0x00, 0x00, 0x01];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.u8(), Ok(3));
        assert_eq!(reader.i64(), Err(BufferError::EndOfBuffer));
        assert_eq!(reader.x, 1);
        assert_eq!(reader.skip(4), Err(BufferError::EndOfBuffer));
        assert_eq!(reader.buf(3), Ok(&bytes[1..]));
        assert_eq!(reader.peek(), Err(BufferError::EndOfBuffer));
    }

    #[test]
    fn window_is_clamped() {
        let bytes = [9, 8, 7, 6];
        let mut reader = Reader::from_slice(&bytes, 1, 3);
        assert_eq!(reader.size(), 2);
        assert_eq!(reader.u16(), Ok(0x0807));
        assert_eq!(Reader::from_slice(&bytes, 10, 20).size(), 0);
        reader.reset(&bytes[..1]);
        assert_eq!((reader.x, reader.end), (0, 1));
    }

    #[test]
    fn strings() {
        let mut reader = Reader::new("añb".as_bytes());
        assert_eq!(reader.utf8(3), Ok("añ"));
        assert_eq!(reader.utf8(1), Ok("b"));

        let bad = [b'a', 0xc3];
        let mut reader = Reader::new(&bad);
        assert_eq!(reader.utf8(2), Err(BufferError::InvalidUtf8));
        assert_eq!(reader.x, 0);
        assert_eq!(reader.latin1(2), Ok("aÃ".to_owned()));
    }

    #[test]
    fn float_bit_patterns() {
        let mut reader = Reader::new(&[0x3f, 0x80, 0, 0, 0xc0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(reader.f32(), Ok(1.0));
        assert_eq!(reader.f64(), Ok(-2.0));
    }
}
