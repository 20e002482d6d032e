//! Graph decoder: rebuilds models from the wire and reads values into
//! [`ValueTree`]s.

use graphpack_buffers::Reader;

use crate::config::CodecConfig;
use crate::error::{GraphError, Result};
use crate::model::{ElementKind, ModelChild, ModelId, ModelKind, ModelNode};
use crate::registry::ModelRegistry;
use crate::scalar::Scalar;
use crate::tag::{PrimitiveKind, Tag};
use crate::value::{Value, ValueTree};
use crate::wire::{expect_tag, read_raw_string, read_scalar, read_tag, read_tag_or_null};

/// Decoder for one incoming connection.
///
/// Mirrors [`GraphEncoder`](crate::GraphEncoder): models described in
/// earlier messages are remembered and later referenced by id.
#[derive(Debug, Default)]
pub struct GraphDecoder {
    pub registry: ModelRegistry,
    config: CodecConfig,
    /// Bytes used by the last successful read.
    consumed: usize,
}

impl GraphDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            registry: ModelRegistry::new(),
            config,
            consumed: 0,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Bytes used by the last successful [`GraphDecoder::read_object`].
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn reset(&mut self) {
        self.registry.reset();
        self.consumed = 0;
    }

    /// Decodes one message from the start of `bytes`.
    ///
    /// Returns the tree and the number of bytes it occupied; trailing bytes
    /// are left for the next call.
    pub fn decode_object(&mut self, bytes: &[u8]) -> Result<(ValueTree, usize)> {
        let mut reader = Reader::new(bytes);
        let tree = self.read_object(&mut reader)?;
        Ok((tree, self.consumed))
    }

    /// Reads a model-or-reference followed by an object value.
    ///
    /// On failure the reader is rewound and models learned during the call
    /// are forgotten, so the same bytes can be retried once more input is
    /// available.
    pub fn read_object(&mut self, reader: &mut Reader<'_>) -> Result<ValueTree> {
        let start = reader.x;
        let checkpoint = self.registry.checkpoint();
        match self.read_root(reader) {
            Ok(tree) => {
                self.consumed = reader.x - start;
                Ok(tree)
            }
            Err(err) => {
                self.registry.rollback(checkpoint);
                reader.x = start;
                self.consumed = 0;
                tracing::debug!(error = %err, offset = start, "decoder.rollback");
                Err(err)
            }
        }
    }

    fn read_root(&mut self, reader: &mut Reader<'_>) -> Result<ValueTree> {
        let id = self.read_model_or_reference(reader)?;
        let kind = &self.registry.require(id)?.kind;
        if !matches!(kind, ModelKind::Object { .. }) {
            return Err(GraphError::UnsupportedType(format!(
                "root model {id} is {}",
                kind.tag()
            )));
        }
        let offset = reader.x;
        match self.read_value(reader, id)? {
            Value::Tree(tree) => Ok(tree),
            _ => Err(GraphError::ProtocolMismatch {
                expected: Tag::Object,
                actual: Tag::Null as u8,
                offset,
            }),
        }
    }

    /// Reads `Model` + id, and the description when the id is new.
    ///
    /// An unseen id must be followed by a plausible description: known kind
    /// tag, counts and names within the configured limits, and a `Model` tag
    /// after each child name. Anything else means the peer sent a reference
    /// to a model this decoder never learned.
    pub fn read_model_or_reference(&mut self, reader: &mut Reader<'_>) -> Result<ModelId> {
        self.read_model(reader, 0)
    }

    fn read_model(&mut self, reader: &mut Reader<'_>, depth: usize) -> Result<ModelId> {
        self.enter(depth)?;
        expect_tag(reader, Tag::Model)?;
        let id = ModelId(reader.u32()?);
        if self.registry.contains(id) {
            return Ok(id);
        }
        let kind = match read_tag(reader) {
            // A description never starts with these.
            Ok(Tag::Null | Tag::Model) | Err(GraphError::InvalidTag(_)) => {
                return Err(GraphError::UnknownModelReference(id))
            }
            other => other?,
        };
        match kind {
            Tag::Object => {
                let count = self.read_count(reader, id)?;
                self.registry
                    .insert(ModelNode::new(id, ModelKind::Object { children: None }));
                let mut children = Vec::with_capacity(count.min(reader.size()));
                for _ in 0..count {
                    let name = self.read_name(reader, id)?;
                    if reader.peek()? != Tag::Model as u8 {
                        return Err(GraphError::UnknownModelReference(id));
                    }
                    let model = self.read_model(reader, depth + 1)?;
                    children.push(ModelChild { name, model });
                }
                self.registry.complete_object(id, children)?;
            }
            Tag::Array => {
                let element = match read_tag(reader) {
                    Ok(tag) => ElementKind::from_tag(tag),
                    Err(GraphError::InvalidTag(_)) => None,
                    Err(err) => return Err(err),
                }
                .ok_or(GraphError::UnknownModelReference(id))?;
                let element_model = match element {
                    ElementKind::Primitive(_) => None,
                    _ => match Tag::from_u8(reader.peek()?) {
                        Some(Tag::Null) => {
                            reader.skip(1)?;
                            None
                        }
                        Some(Tag::Model) => Some(self.read_model(reader, depth + 1)?),
                        _ => return Err(GraphError::UnknownModelReference(id)),
                    },
                };
                self.registry.insert(ModelNode::new(
                    id,
                    ModelKind::Array {
                        element,
                        element_model,
                    },
                ));
            }
            Tag::Enum => {
                let count = self.read_count(reader, id)?;
                let mut constants = Vec::with_capacity(count.min(reader.size()));
                for _ in 0..count {
                    constants.push(self.read_name(reader, id)?);
                }
                self.registry
                    .insert(ModelNode::new(id, ModelKind::Enum { constants }));
            }
            Tag::Unknown => self.registry.insert(ModelNode::new(id, ModelKind::Unknown)),
            tag => {
                let primitive = PrimitiveKind::from_tag(tag).ok_or(GraphError::InvalidTag(tag as u8))?;
                self.registry
                    .insert(ModelNode::new(id, ModelKind::Primitive(primitive)));
            }
        }
        Ok(id)
    }

    fn enter(&self, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(GraphError::NestingTooDeep(self.config.max_depth));
        }
        Ok(())
    }

    /// Child or constant count of the description of `id`.
    fn read_count(&self, reader: &mut Reader<'_>, id: ModelId) -> Result<usize> {
        let count = reader.u32()? as usize;
        if count > self.config.max_entries {
            return Err(GraphError::UnknownModelReference(id));
        }
        Ok(count)
    }

    fn read_name(&self, reader: &mut Reader<'_>, id: ModelId) -> Result<String> {
        let offset = reader.x;
        if reader.u32()? as usize > self.config.max_name_len {
            return Err(GraphError::UnknownModelReference(id));
        }
        reader.x = offset;
        read_raw_string(reader, self.config.string_encoding)
    }

    /// Reads one value of model `id`.
    ///
    /// Unknown slots and objects without a field list occupy no bytes and
    /// come back as empty trees.
    pub fn read_value(&mut self, reader: &mut Reader<'_>, id: ModelId) -> Result<Value> {
        self.read_value_at(reader, id, 0)
    }

    fn read_value_at(&mut self, reader: &mut Reader<'_>, id: ModelId, depth: usize) -> Result<Value> {
        self.enter(depth)?;
        let kind = self.registry.require(id)?.kind.clone();
        match kind {
            ModelKind::Unknown | ModelKind::Object { children: None } => {
                Ok(Value::Tree(ValueTree::new(Some(id))))
            }
            ModelKind::Primitive(kind) => {
                Ok(read_scalar(reader, kind, self.config.string_encoding)?
                    .map_or(Value::Null, Value::Scalar))
            }
            ModelKind::Enum { constants } => {
                if read_tag_or_null(reader, Tag::Int)?.is_none() {
                    return Ok(Value::Null);
                }
                let ordinal = reader.i32()?;
                if usize::try_from(ordinal).map_or(true, |i| i >= constants.len()) {
                    return Err(GraphError::OrdinalOutOfRange {
                        ordinal: i64::from(ordinal),
                        count: constants.len(),
                    });
                }
                Ok(Value::Scalar(Scalar::Int(ordinal)))
            }
            ModelKind::Object {
                children: Some(children),
            } => {
                if read_tag_or_null(reader, Tag::Object)?.is_none() {
                    return Ok(Value::Null);
                }
                let mut tree = ValueTree::new(Some(id));
                tree.values.reserve(children.len());
                for child in &children {
                    let value = self.read_value_at(reader, child.model, depth + 1)?;
                    tree.values.push(value);
                }
                Ok(Value::Tree(tree))
            }
            ModelKind::Array {
                element,
                element_model,
            } => {
                if read_tag_or_null(reader, Tag::Array)?.is_none() {
                    return Ok(Value::Null);
                }
                expect_tag(reader, element.tag())?;
                let count = reader.u32()? as usize;
                let mut tree = ValueTree::new(Some(id));
                tree.values.reserve(count.min(reader.size()));
                for _ in 0..count {
                    let value = self.read_element(reader, element, element_model, depth + 1)?;
                    tree.values.push(value);
                }
                Ok(Value::Tree(tree))
            }
        }
    }

    fn read_element(
        &mut self,
        reader: &mut Reader<'_>,
        element: ElementKind,
        element_model: Option<ModelId>,
        depth: usize,
    ) -> Result<Value> {
        match (element, element_model) {
            (ElementKind::Primitive(kind), _) => {
                Ok(read_scalar(reader, kind, self.config.string_encoding)?
                    .map_or(Value::Null, Value::Scalar))
            }
            (_, Some(model)) => self.read_value_at(reader, model, depth),
            (_, None) => {
                if reader.peek()? == Tag::Null as u8 {
                    reader.skip(1)?;
                    return Ok(Value::Null);
                }
                let model = self.read_model(reader, depth)?;
                tracing::trace!(model = %model, "decoder.discover");
                self.read_value_at(reader, model, depth)
            }
        }
    }
}
