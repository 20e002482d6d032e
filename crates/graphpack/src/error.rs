//! Codec error type.

use graphpack_buffers::BufferError;
use thiserror::Error;

use crate::model::ModelId;
use crate::tag::Tag;

/// Error type for inspection, encoding, decoding and path mutation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// The type cannot be modeled at this position.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    /// The decoded tag disagrees with what the model expects.
    #[error("protocol mismatch at offset {offset}: expected {expected}, found tag 0x{actual:02x}")]
    ProtocolMismatch {
        expected: Tag,
        actual: u8,
        offset: usize,
    },
    /// A model id was referenced before its description was seen.
    #[error("unknown model reference {0}")]
    UnknownModelReference(ModelId),
    /// An object model was used before its field list was complete.
    #[error("model {0} has no field list")]
    IncompleteModel(ModelId),
    /// A path index exceeds the node's child count.
    #[error("path index {index} out of range at depth {depth} (len {len})")]
    PathOutOfRange {
        depth: usize,
        index: usize,
        len: usize,
    },
    /// A scalar's kind disagrees with the addressed slot.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Enum ordinal outside the constant list.
    #[error("ordinal {ordinal} out of range for enum with {count} constants")]
    OrdinalOutOfRange { ordinal: i64, count: usize },
    /// A reflected instance produced a value that disagrees with its model.
    #[error("instance does not match model {model}: found {found}")]
    InstanceMismatch { model: ModelId, found: &'static str },
    /// Byte is not a known tag.
    #[error("invalid tag 0x{0:02x}")]
    InvalidTag(u8),
    /// String cannot be represented in the configured encoding.
    #[error("string not representable: {0}")]
    InvalidString(&'static str),
    /// Bit vector is longer than the 16-bit length prefix allows.
    #[error("bit vector of {0} bits exceeds the 65535-bit limit")]
    BitVectorTooLong(usize),
    /// Input nests models or values deeper than the configured limit.
    #[error("nesting exceeds {0} levels")]
    NestingTooDeep(usize),
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),
}

impl GraphError {
    /// Whether the error only means the input ended early.
    pub fn is_end_of_buffer(&self) -> bool {
        matches!(self, GraphError::Buffer(BufferError::EndOfBuffer))
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
