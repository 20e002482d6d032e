//! Graph encoder: model descriptions interleaved with value payloads.

use std::collections::HashSet;

use graphpack_buffers::Writer;

use crate::config::CodecConfig;
use crate::error::{GraphError, Result};
use crate::model::{ElementKind, ModelId, ModelKind};
use crate::reflect::{FieldValue, Reflect};
use crate::registry::ModelRegistry;
use crate::tag::Tag;
use crate::wire::{write_raw_string, write_scalar, write_tag};

/// Encoder for one outgoing connection.
///
/// Each model is described in full the first time it is sent and by id
/// afterwards, so the encoder must see every message of the connection in
/// order.
///
/// # Example
///
/// ```
/// use graphpack::{reflect_object, GraphEncoder};
///
/// struct Point { x: i32, y: i32 }
/// reflect_object!(Point { x: i32, y: i32 });
///
/// let mut encoder = GraphEncoder::new();
/// let first = encoder.encode_object(&Point { x: 1, y: 2 }).unwrap();
/// let second = encoder.encode_object(&Point { x: 1, y: 2 }).unwrap();
/// assert!(second.len() < first.len());
/// ```
#[derive(Debug)]
pub struct GraphEncoder {
    pub registry: ModelRegistry,
    pub writer: Writer,
    sent: HashSet<ModelId>,
    /// Ids in the order they were first sent, for rollback.
    sent_log: Vec<ModelId>,
    config: CodecConfig,
}

impl Default for GraphEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphEncoder {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            registry: ModelRegistry::new(),
            writer: Writer::with_alloc_size(config.alloc_size),
            sent: HashSet::new(),
            sent_log: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Whether the description of `id` has already gone out.
    pub fn is_sent(&self, id: ModelId) -> bool {
        self.sent.contains(&id)
    }

    /// Starts a new session: forgets all models and sent descriptions.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.sent.clear();
        self.sent_log.clear();
        self.writer.reset();
    }

    /// Encodes `object` as one self-contained message.
    ///
    /// On failure nothing is written and no model is marked as sent.
    pub fn encode_object(&mut self, object: &dyn Reflect) -> Result<Vec<u8>> {
        let checkpoint = self.registry.checkpoint();
        let sent_mark = self.sent_log.len();
        let written = self.writer.x - self.writer.x0;
        match self.add_object(object) {
            Ok(()) => Ok(self.writer.flush()),
            Err(err) => {
                for id in self.sent_log.drain(sent_mark..) {
                    self.sent.remove(&id);
                }
                self.registry.rollback(checkpoint);
                self.writer.truncate(self.writer.x0 + written);
                tracing::debug!(error = %err, "encoder.rollback");
                Err(err)
            }
        }
    }

    /// Writes the model of `object`'s runtime type followed by its value.
    pub fn add_object(&mut self, object: &dyn Reflect) -> Result<()> {
        let id = self.registry.inspect_type(object.type_info());
        self.add_model_or_reference(id)?;
        self.add_value(id, &FieldValue::Object(object))
    }

    /// Writes `Model` + id, followed by the full description on first use.
    pub fn add_model_or_reference(&mut self, id: ModelId) -> Result<()> {
        write_tag(&mut self.writer, Tag::Model);
        self.writer.u32(id.0);
        if !self.sent.insert(id) {
            return Ok(());
        }
        self.sent_log.push(id);
        let kind = self.registry.require(id)?.kind.clone();
        write_tag(&mut self.writer, kind.tag());
        match kind {
            ModelKind::Primitive(_) | ModelKind::Unknown => {}
            ModelKind::Object { children: None } => return Err(GraphError::IncompleteModel(id)),
            ModelKind::Object {
                children: Some(children),
            } => {
                self.writer.u32(children.len() as u32);
                for child in &children {
                    write_raw_string(&mut self.writer, &child.name, self.config.string_encoding)?;
                    self.add_model_or_reference(child.model)?;
                }
            }
            ModelKind::Array {
                element,
                element_model,
            } => {
                write_tag(&mut self.writer, element.tag());
                if !matches!(element, ElementKind::Primitive(_)) {
                    match element_model {
                        Some(model) => self.add_model_or_reference(model)?,
                        None => write_tag(&mut self.writer, Tag::Null),
                    }
                }
            }
            ModelKind::Enum { constants } => {
                self.writer.u32(constants.len() as u32);
                for constant in &constants {
                    write_raw_string(&mut self.writer, constant, self.config.string_encoding)?;
                }
            }
        }
        Ok(())
    }

    /// Writes `value` as an instance of model `id`.
    pub fn add_value(&mut self, id: ModelId, value: &FieldValue<'_>) -> Result<()> {
        let kind = self.registry.require(id)?.kind.clone();
        match (kind, value) {
            (ModelKind::Unknown, _) => Ok(()),
            (_, FieldValue::Null) => {
                write_tag(&mut self.writer, Tag::Null);
                Ok(())
            }
            (ModelKind::Primitive(kind), FieldValue::Scalar(scalar)) if scalar.kind() == kind => {
                write_scalar(&mut self.writer, scalar, self.config.string_encoding)
            }
            (ModelKind::Object { children: None }, FieldValue::Object(_)) => {
                Err(GraphError::IncompleteModel(id))
            }
            (
                ModelKind::Object {
                    children: Some(children),
                },
                FieldValue::Object(object),
            ) => {
                if self.registry.model_of_type(object.type_info().type_id) != Some(id) {
                    return Err(GraphError::InstanceMismatch {
                        model: id,
                        found: object.type_info().name,
                    });
                }
                write_tag(&mut self.writer, Tag::Object);
                for (index, child) in children.iter().enumerate() {
                    let field = object.field(index).ok_or(GraphError::InstanceMismatch {
                        model: id,
                        found: "missing field",
                    })?;
                    self.add_value(child.model, &field)?;
                }
                Ok(())
            }
            (
                ModelKind::Array {
                    element,
                    element_model,
                },
                FieldValue::Array(items),
            ) => {
                write_tag(&mut self.writer, Tag::Array);
                write_tag(&mut self.writer, element.tag());
                self.writer.u32(items.len() as u32);
                for item in items {
                    self.add_element(id, element, element_model, item)?;
                }
                Ok(())
            }
            (ModelKind::Enum { constants }, FieldValue::Enum(ordinal)) => {
                if *ordinal as usize >= constants.len() {
                    return Err(GraphError::OrdinalOutOfRange {
                        ordinal: i64::from(*ordinal),
                        count: constants.len(),
                    });
                }
                write_tag(&mut self.writer, Tag::Int);
                self.writer.i32(*ordinal as i32);
                Ok(())
            }
            (_, value) => Err(GraphError::InstanceMismatch {
                model: id,
                found: value.kind_name(),
            }),
        }
    }

    fn add_element(
        &mut self,
        array: ModelId,
        element: ElementKind,
        element_model: Option<ModelId>,
        item: &FieldValue<'_>,
    ) -> Result<()> {
        match (element, element_model, item) {
            (_, _, FieldValue::Null) => {
                write_tag(&mut self.writer, Tag::Null);
                Ok(())
            }
            (ElementKind::Primitive(kind), _, FieldValue::Scalar(scalar))
                if scalar.kind() == kind =>
            {
                write_scalar(&mut self.writer, scalar, self.config.string_encoding)
            }
            (ElementKind::Primitive(_), _, item) => Err(GraphError::InstanceMismatch {
                model: array,
                found: item.kind_name(),
            }),
            (_, Some(model), item) => self.add_value(model, item),
            (ElementKind::Object, None, FieldValue::Object(object)) => {
                let info = object.type_info();
                let discovered = self.registry.inspect_type(info);
                tracing::trace!(array = %array, model = %discovered, ty = info.name, "encoder.discover");
                self.add_model_or_reference(discovered)?;
                self.add_value(discovered, item)
            }
            (_, None, item) => Err(GraphError::InstanceMismatch {
                model: array,
                found: item.kind_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::AnyObject;

    struct Point {
        x: i32,
        y: i32,
    }
    crate::reflect_object!(Point { x: i32, y: i32 });

    struct Dog {
        name: String,
    }
    crate::reflect_object!(Dog { name: String });

    struct Kennel {
        pets: Vec<AnyObject>,
    }
    crate::reflect_object!(Kennel { pets: Vec<AnyObject> });

    struct Liar;

    impl crate::Reflect for Liar {
        fn describe() -> crate::TypeInfo {
            crate::TypeInfo::of::<Liar>("Liar", || {
                vec![crate::FieldDef::new(
                    "n",
                    crate::FieldType::Primitive(crate::PrimitiveKind::Int),
                )]
            })
        }

        fn type_info(&self) -> crate::TypeInfo {
            Self::describe()
        }

        fn field(&self, index: usize) -> Option<FieldValue<'_>> {
            (index == 0).then(|| FieldValue::Scalar(crate::Scalar::String("nope".into())))
        }

        fn field_mut(&mut self, _index: usize) -> Option<crate::FieldMut<'_>> {
            None
        }
    }

    #[test]
    fn first_message_carries_the_description() {
        let mut encoder = GraphEncoder::new();
        let bytes = encoder.encode_object(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(
            bytes,
            vec![
                11, 0, 0, 0, 0, 12, 0, 0, 0, 2, 0, 0, 0, 1, b'x', 11, 0, 0, 0, 1, 3, 0, 0, 0, 1,
                b'y', 11, 0, 0, 0, 1, 12, 3, 0, 0, 0, 1, 3, 0, 0, 0, 2
            ]
        );
        let bytes = encoder.encode_object(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(bytes, vec![11, 0, 0, 0, 0, 12, 3, 0, 0, 0, 1, 3, 0, 0, 0, 2]);
    }

    #[test]
    fn lazy_elements_register_models() {
        let mut encoder = GraphEncoder::new();
        let kennel = Kennel {
            pets: vec![AnyObject::new(Dog { name: "rex".into() })],
        };
        encoder.encode_object(&kennel).unwrap();
        // Kennel, the lazy array, Dog, string
        assert_eq!(encoder.registry.len(), 4);
        let dog = encoder.registry.model_of_type(std::any::TypeId::of::<Dog>());
        assert!(dog.is_some_and(|id| encoder.is_sent(id)));
    }

    #[test]
    fn failed_encode_leaves_no_trace() {
        let mut encoder = GraphEncoder::new();
        encoder.encode_object(&Point { x: 0, y: 0 }).unwrap();
        let err = encoder.encode_object(&Liar).unwrap_err();
        assert!(matches!(err, GraphError::InstanceMismatch { found: "string", .. }));
        assert!(encoder.writer.unflushed().is_empty());
        assert_eq!(encoder.registry.len(), 2);
        assert!(!encoder.is_sent(ModelId(2)));
        let bytes = encoder.encode_object(&Point { x: 0, y: 0 }).unwrap();
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn reset_resends_descriptions() {
        let mut encoder = GraphEncoder::new();
        let first = encoder.encode_object(&Point { x: 5, y: 6 }).unwrap();
        encoder.reset();
        let again = encoder.encode_object(&Point { x: 5, y: 6 }).unwrap();
        assert_eq!(first, again);
    }
}
