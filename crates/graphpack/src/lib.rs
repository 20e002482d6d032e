//! Self-describing binary codec for reflected object graphs.
//!
//! Types opt in with [`reflect_object!`] and [`reflect_enum!`]. A
//! [`ModelRegistry`] turns a type into a graph of [`ModelNode`]s with one
//! id per distinct shape; cycles and repeated types share ids. The
//! [`GraphEncoder`] writes each model in full the first time it is needed
//! and by id afterwards, interleaved with tagged values. The
//! [`GraphDecoder`] rebuilds the models on the other side and returns
//! values as a [`ValueTree`] that can be navigated by field name or index
//! path and edited with [`set_tree_value`].
//!
//! ```
//! use graphpack::{reflect_enum, reflect_object, GraphDecoder, GraphEncoder, Scalar, Value};
//!
//! enum Suit { Hearts, Spades }
//! reflect_enum!(Suit { Hearts, Spades });
//!
//! struct Card { rank: i8, suit: Suit }
//! reflect_object!(Card { rank: i8, suit: Suit });
//!
//! let mut encoder = GraphEncoder::new();
//! let bytes = encoder.encode_object(&Card { rank: 12, suit: Suit::Spades }).unwrap();
//!
//! let mut decoder = GraphDecoder::new();
//! let (tree, consumed) = decoder.decode_object(&bytes).unwrap();
//! assert_eq!(consumed, bytes.len());
//! assert_eq!(tree.field(&decoder.registry, "suit"), Some(&Value::Scalar(Scalar::Int(1))));
//! ```

pub mod bitvec;
pub mod config;
pub mod decoder;
pub mod encoder;
mod error;
pub mod model;
pub mod path;
pub mod reflect;
pub mod registry;
pub mod scalar;
pub mod stream;
pub mod tag;
pub mod value;
pub mod wire;

pub use bitvec::BitVector;
pub use config::{CodecConfig, StringEncoding};
pub use decoder::GraphDecoder;
pub use encoder::GraphEncoder;
pub use error::{GraphError, Result};
pub use model::{ElementKind, ModelChild, ModelId, ModelKind, ModelNode, ModelTree};
pub use path::{set_instance_value, set_tree_value};
pub use reflect::{
    AnyObject, EnumInfo, Enumeration, FieldDef, FieldMut, FieldType, FieldValue, OptionSlot,
    Reflect, Slot, TypeInfo,
};
pub use registry::{Checkpoint, ModelRegistry};
pub use scalar::Scalar;
pub use stream::StreamDecoder;
pub use tag::{PrimitiveKind, Tag};
pub use value::{Value, ValueTree};
