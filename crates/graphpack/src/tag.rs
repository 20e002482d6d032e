//! One-byte wire tags and primitive kinds.

use std::fmt;

use crate::error::GraphError;

/// Leading byte of every value and model description on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Null = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    String = 5,
    Boolean = 6,
    Float = 7,
    Double = 8,
    BitVector = 9,
    Array = 10,
    Model = 11,
    Object = 12,
    Enum = 13,
    Unknown = 14,
}

impl Tag {
    pub fn from_u8(byte: u8) -> Option<Tag> {
        Some(match byte {
            0 => Tag::Null,
            1 => Tag::Byte,
            2 => Tag::Short,
            3 => Tag::Int,
            4 => Tag::Long,
            5 => Tag::String,
            6 => Tag::Boolean,
            7 => Tag::Float,
            8 => Tag::Double,
            9 => Tag::BitVector,
            10 => Tag::Array,
            11 => Tag::Model,
            12 => Tag::Object,
            13 => Tag::Enum,
            14 => Tag::Unknown,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Null => "null",
            Tag::Byte => "byte",
            Tag::Short => "short",
            Tag::Int => "int",
            Tag::Long => "long",
            Tag::String => "string",
            Tag::Boolean => "boolean",
            Tag::Float => "float",
            Tag::Double => "double",
            Tag::BitVector => "bitvector",
            Tag::Array => "array",
            Tag::Model => "model",
            Tag::Object => "object",
            Tag::Enum => "enum",
            Tag::Unknown => "unknown",
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = GraphError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Tag::from_u8(byte).ok_or(GraphError::InvalidTag(byte))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar kinds a field can hold without further structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    String,
    BitVector,
}

impl PrimitiveKind {
    pub fn tag(self) -> Tag {
        match self {
            PrimitiveKind::Byte => Tag::Byte,
            PrimitiveKind::Short => Tag::Short,
            PrimitiveKind::Int => Tag::Int,
            PrimitiveKind::Long => Tag::Long,
            PrimitiveKind::Float => Tag::Float,
            PrimitiveKind::Double => Tag::Double,
            PrimitiveKind::Boolean => Tag::Boolean,
            PrimitiveKind::String => Tag::String,
            PrimitiveKind::BitVector => Tag::BitVector,
        }
    }

    pub fn from_tag(tag: Tag) -> Option<PrimitiveKind> {
        Some(match tag {
            Tag::Byte => PrimitiveKind::Byte,
            Tag::Short => PrimitiveKind::Short,
            Tag::Int => PrimitiveKind::Int,
            Tag::Long => PrimitiveKind::Long,
            Tag::Float => PrimitiveKind::Float,
            Tag::Double => PrimitiveKind::Double,
            Tag::Boolean => PrimitiveKind::Boolean,
            Tag::String => PrimitiveKind::String,
            Tag::BitVector => PrimitiveKind::BitVector,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        self.tag().as_str()
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Int | PrimitiveKind::Long
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
