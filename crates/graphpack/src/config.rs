//! Codec configuration shared by both ends of a connection.

/// How string payloads are laid out on the wire.
///
/// Both peers must agree; the choice is not transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringEncoding {
    /// Length prefix counts bytes, payload is UTF-8.
    #[default]
    Utf8,
    /// Length prefix counts characters, one byte each (ISO-8859-1).
    /// Characters above U+00FF are rejected at encode time.
    Latin1,
}

/// Settings for [`GraphEncoder`](crate::GraphEncoder) and
/// [`GraphDecoder`](crate::GraphDecoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    pub string_encoding: StringEncoding,
    /// Initial buffer allocation for writers and stream buffers.
    pub alloc_size: usize,
    /// Most children or constants a decoded model description may list.
    pub max_entries: usize,
    /// Longest field or constant name, in bytes, a decoded description may carry.
    pub max_name_len: usize,
    /// Deepest model or value nesting the decoder follows.
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            string_encoding: StringEncoding::Utf8,
            alloc_size: 16 * 1024,
            max_entries: 1 << 16,
            max_name_len: 1024,
            max_depth: 256,
        }
    }
}

impl CodecConfig {
    pub fn latin1() -> Self {
        Self {
            string_encoding: StringEncoding::Latin1,
            ..Self::default()
        }
    }
}
