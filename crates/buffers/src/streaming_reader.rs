//! Receive buffer for decoding messages that arrive in pieces.

use crate::{BufferError, Reader, Writer};

/// Accumulates incoming chunks until a decoder can make sense of them.
///
/// The unread bytes live between `buffer.x0 + cursor` and `buffer.x`. A
/// decoder works on a [`Reader`] obtained from [`StreamingReader::reader`];
/// when it finishes a message the caller advances past it with
/// [`StreamingReader::skip`] and releases the space with
/// [`StreamingReader::consume`]. A decoder that runs out of input simply
/// drops its reader and waits for the next [`StreamingReader::push`].
#[derive(Debug, Clone)]
pub struct StreamingReader {
    buffer: Writer,
    /// Read position relative to `buffer.x0`.
    cursor: usize,
}

impl Default for StreamingReader {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingReader {
    /// 16 KiB initial buffer.
    pub fn new() -> Self {
        Self::with_alloc_size(16 * 1024)
    }

    pub fn with_alloc_size(alloc_size: usize) -> Self {
        Self {
            buffer: Writer::with_alloc_size(alloc_size),
            cursor: 0,
        }
    }

    /// Absolute offset of the first unread byte in the backing buffer.
    pub fn x(&self) -> usize {
        self.buffer.x0 + self.cursor
    }

    /// Unread byte count.
    pub fn size(&self) -> usize {
        self.buffer.x - self.x()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.buf(chunk);
    }

    /// Moves the read position forward by `length` bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        if length > self.size() {
            return Err(BufferError::EndOfBuffer);
        }
        self.cursor += length;
        Ok(())
    }

    /// Drops everything before the read position; the buffer may reuse it.
    pub fn consume(&mut self) {
        self.buffer.x0 = self.x();
        self.cursor = 0;
    }

    /// A reader over the unread bytes, starting at [`StreamingReader::x`].
    pub fn reader(&self) -> Reader<'_> {
        Reader::from_slice(&self.buffer.uint8, self.x(), self.buffer.x)
    }

    /// Discards all buffered input and starts over with `data`.
    pub fn reset(&mut self, data: &[u8]) {
        self.buffer.reset();
        self.cursor = 0;
        self.push(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_has_nothing_to_read() {
        let stream = StreamingReader::default();
        assert_eq!(stream.size(), 0);
        assert_eq!(stream.reader().peek(), Err(BufferError::EndOfBuffer));
    }

    #[test]
    fn header_split_across_chunks() {
        let mut stream = StreamingReader::new();
        stream.push(&[0xca, 0xfe]);
        assert_eq!(stream.reader().u32(), Err(BufferError::EndOfBuffer));
        stream.push(&[0xba, 0xbe, 0x07]);
        let mut reader = stream.reader();
        assert_eq!(reader.u32(), Ok(0xcafe_babe));
        assert_eq!(reader.x - stream.x(), 4);
        stream.skip(4).unwrap();
        assert_eq!(stream.size(), 1);
        assert_eq!(stream.reader().u8(), Ok(7));
    }

    #[test]
    fn skip_never_passes_the_end() {
        let mut stream = StreamingReader::new();
        stream.push(&[1, 2]);
        assert_eq!(stream.skip(3), Err(BufferError::EndOfBuffer));
        assert_eq!(stream.size(), 2);
        assert_eq!(stream.skip(2), Ok(()));
        assert_eq!(stream.size(), 0);
    }

    #[test]
    fn consumed_space_is_reused() {
        let mut stream = StreamingReader::with_alloc_size(4);
        stream.push(&[1, 2, 3]);
        stream.skip(2).unwrap();
        stream.consume();
        stream.push(&[4, 5, 6]);
        assert_eq!(stream.size(), 4);
        assert_eq!(stream.reader().u32(), Ok(0x0304_0506));
    }

    #[test]
    fn reset_replaces_input() {
        let mut stream = StreamingReader::new();
        stream.push(&[1, 2, 3]);
        stream.skip(1).unwrap();
        stream.reset(&[9]);
        assert_eq!(stream.size(), 1);
        assert_eq!(stream.reader().u8(), Ok(9));
    }
}
