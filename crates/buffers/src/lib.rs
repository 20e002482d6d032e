//! Big-endian byte buffers for the graphpack wire format.
//!
//! - [`Writer`] appends fixed-width integers, floats and raw bytes to a
//!   growable buffer and hands out finished messages with [`Writer::flush`].
//! - [`Reader`] walks a byte slice with a cursor. Every read is
//!   bounds-checked, so running out of input is an ordinary
//!   [`BufferError::EndOfBuffer`] the caller can recover from.
//! - [`StreamingReader`] collects chunks from a transport until a whole
//!   message is available.
//!
//! ```
//! use graphpack_buffers::{BufferError, Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.u8(11);
//! writer.u32(7);
//! writer.f64(0.5);
//! let message = writer.flush();
//! assert_eq!(message.len(), 13);
//!
//! let mut reader = Reader::new(&message[..6]);
//! assert_eq!(reader.u8(), Ok(11));
//! assert_eq!(reader.u32(), Ok(7));
//! assert_eq!(reader.f64(), Err(BufferError::EndOfBuffer));
//! ```

mod reader;
mod streaming_reader;
mod writer;

pub use reader::Reader;
pub use streaming_reader::StreamingReader;
pub use writer::Writer;

use std::fmt;

/// Failure of a buffer read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// The read needs more bytes than remain.
    EndOfBuffer,
    /// String bytes are not valid UTF-8.
    InvalidUtf8,
    /// An offset and length do not describe a range of the input.
    InvalidRange,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BufferError::EndOfBuffer => "unexpected end of input",
            BufferError::InvalidUtf8 => "string is not valid UTF-8",
            BufferError::InvalidRange => "offset and length fall outside the input",
        })
    }
}

impl std::error::Error for BufferError {}
