//! Model registry and type inspector.
//!
//! The registry is an arena of [`ModelNode`]s keyed by [`ModelId`]. Nodes
//! reference each other only by id, so cyclic types need no special
//! ownership. On the encoding side every distinct shape (a struct or enum
//! type, a primitive kind, an array layout) is inspected once and keeps its
//! id for the rest of the session; on the decoding side nodes are inserted
//! under the ids read from the wire.

use std::any::TypeId;
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{GraphError, Result};
use crate::model::{ElementKind, ModelChild, ModelId, ModelKind, ModelNode, ModelTree};
use crate::reflect::{EnumInfo, FieldType, Reflect, TypeInfo};
use crate::tag::PrimitiveKind;

/// Identity of a shape on the inspecting side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ShapeKey {
    Primitive(PrimitiveKind),
    Type(TypeId),
    Array(ElementKind, Option<ModelId>),
    Unknown,
}

#[derive(Debug, Clone)]
struct Entry {
    node: ModelNode,
    key: Option<ShapeKey>,
}

/// Registry state to return to when an encode or decode call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    len: usize,
    next_id: u32,
}

/// Session-scoped table of models.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: IndexMap<ModelId, Entry>,
    keys: HashMap<ShapeKey, ModelId>,
    /// Object models whose fields are being inspected.
    stack: Vec<ModelId>,
    next_id: u32,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: ModelId) -> Option<&ModelNode> {
        self.entries.get(&id).map(|entry| &entry.node)
    }

    /// Like [`ModelRegistry::get`], failing with `UnknownModelReference`.
    pub fn require(&self, id: ModelId) -> Result<&ModelNode> {
        self.get(id).ok_or(GraphError::UnknownModelReference(id))
    }

    /// Nodes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelNode> {
        self.entries.values().map(|entry| &entry.node)
    }

    /// Id previously assigned to a struct or enum type.
    pub fn model_of_type(&self, type_id: TypeId) -> Option<ModelId> {
        self.keys.get(&ShapeKey::Type(type_id)).copied()
    }

    /// Drops every model, starting a new session.
    pub fn reset(&mut self) {
        tracing::debug!(models = self.entries.len(), "registry.reset");
        self.entries.clear();
        self.keys.clear();
        self.stack.clear();
        self.next_id = 0;
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            len: self.entries.len(),
            next_id: self.next_id,
        }
    }

    /// Removes every model registered after `checkpoint` was taken.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.entries.len() > checkpoint.len {
            let Some((id, entry)) = self.entries.pop() else {
                break;
            };
            if let Some(key) = entry.key {
                self.keys.remove(&key);
            }
            tracing::trace!(model = %id, "registry.rollback");
        }
        self.next_id = checkpoint.next_id;
        self.stack.clear();
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Returns the model of `T`, inspecting it on first use.
    pub fn inspect<T: Reflect>(&mut self) -> ModelId {
        self.inspect_type(T::describe())
    }

    pub fn inspect_type(&mut self, info: TypeInfo) -> ModelId {
        self.object_model(info)
    }

    /// Inspects a declared type as a message root.
    ///
    /// Only composite types can be roots.
    pub fn inspect_field_type(&mut self, ty: &FieldType) -> Result<ModelId> {
        match ty {
            FieldType::Object(info) => Ok(self.object_model(*info)),
            FieldType::Primitive(kind) => Err(GraphError::UnsupportedType(format!(
                "{kind} cannot be a root model"
            ))),
            FieldType::Array(_) => Err(GraphError::UnsupportedType(
                "array cannot be a root model".to_owned(),
            )),
            FieldType::Enum(info) => Err(GraphError::UnsupportedType(format!(
                "enum {} cannot be a root model",
                info.name
            ))),
            FieldType::Dynamic => Err(GraphError::UnsupportedType(
                "dynamic reference cannot be a root model".to_owned(),
            )),
        }
    }

    fn model_for(&mut self, ty: &FieldType) -> ModelId {
        match ty {
            FieldType::Primitive(kind) => {
                self.intern(ShapeKey::Primitive(*kind), ModelKind::Primitive(*kind))
            }
            FieldType::Object(info) => self.object_model(*info),
            FieldType::Enum(info) => self.enum_model(info),
            FieldType::Array(element) => self.array_model(element),
            FieldType::Dynamic => self.intern(ShapeKey::Unknown, ModelKind::Unknown),
        }
    }

    fn object_model(&mut self, info: TypeInfo) -> ModelId {
        let key = ShapeKey::Type(info.type_id);
        if let Some(&id) = self.keys.get(&key) {
            if self.stack.contains(&id) {
                tracing::trace!(model = %id, ty = info.name, "registry.cycle_cut");
            }
            return id;
        }
        let id = self.allocate(key, ModelKind::Object { children: None });
        tracing::trace!(model = %id, ty = info.name, "registry.inspect");
        self.stack.push(id);
        let children = (info.fields)()
            .into_iter()
            .map(|field| ModelChild {
                name: field.name.to_owned(),
                model: self.model_for(&field.ty),
            })
            .collect();
        self.stack.pop();
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.node.kind = ModelKind::Object {
                children: Some(children),
            };
        }
        id
    }

    fn enum_model(&mut self, info: &EnumInfo) -> ModelId {
        let constants = info.constants.iter().map(|c| (*c).to_owned()).collect();
        self.intern(ShapeKey::Type(info.type_id), ModelKind::Enum { constants })
    }

    fn array_model(&mut self, element: &FieldType) -> ModelId {
        let (element, element_model) = match element {
            FieldType::Primitive(kind) => (ElementKind::Primitive(*kind), None),
            FieldType::Object(info) => (ElementKind::Object, Some(self.object_model(*info))),
            FieldType::Dynamic => (ElementKind::Object, None),
            FieldType::Enum(info) => (ElementKind::Enum, Some(self.enum_model(info))),
            FieldType::Array(inner) => (ElementKind::Array, Some(self.array_model(inner))),
        };
        self.intern(
            ShapeKey::Array(element, element_model),
            ModelKind::Array {
                element,
                element_model,
            },
        )
    }

    fn intern(&mut self, key: ShapeKey, kind: ModelKind) -> ModelId {
        match self.keys.get(&key) {
            Some(&id) => id,
            None => self.allocate(key, kind),
        }
    }

    fn allocate(&mut self, key: ShapeKey, kind: ModelKind) -> ModelId {
        let id = ModelId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            Entry {
                node: ModelNode::new(id, kind),
                key: Some(key),
            },
        );
        self.keys.insert(key, id);
        id
    }

    // -----------------------------------------------------------------------
    // Decoder side
    // -----------------------------------------------------------------------

    /// Stores a node learned from the wire under its transmitted id.
    pub fn insert(&mut self, node: ModelNode) {
        self.next_id = self.next_id.max(node.id.0.saturating_add(1));
        tracing::trace!(model = %node.id, kind = %node.kind.tag(), "registry.learn");
        self.entries.insert(node.id, Entry { node, key: None });
    }

    /// Attaches the field list of an object learned from the wire.
    pub fn complete_object(&mut self, id: ModelId, children: Vec<ModelChild>) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(GraphError::UnknownModelReference(id))?;
        entry.node.kind = ModelKind::Object {
            children: Some(children),
        };
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Expands the model `id` into a nested tree.
    pub fn tree(&self, id: ModelId) -> Result<ModelTree> {
        let mut ancestors = Vec::new();
        self.build_tree(id, String::new(), &mut ancestors)
    }

    fn build_tree(
        &self,
        id: ModelId,
        name: String,
        ancestors: &mut Vec<ModelId>,
    ) -> Result<ModelTree> {
        let node = self.require(id)?;
        let mut tree = ModelTree {
            id,
            name,
            tag: node.kind.tag(),
            children: None,
            element_kind: None,
            element: None,
            constants: Vec::new(),
        };
        match &node.kind {
            ModelKind::Object {
                children: Some(children),
            } if !ancestors.contains(&id) => {
                ancestors.push(id);
                let mut expanded = Vec::with_capacity(children.len());
                for child in children {
                    expanded.push(self.build_tree(child.model, child.name.clone(), ancestors)?);
                }
                ancestors.pop();
                tree.children = Some(expanded);
            }
            ModelKind::Array {
                element,
                element_model,
            } => {
                tree.element_kind = Some(*element);
                if let Some(model) = element_model {
                    let element = self.build_tree(*model, String::new(), ancestors)?;
                    tree.element = Some(Box::new(element));
                }
            }
            ModelKind::Enum { constants } => tree.constants = constants.clone(),
            _ => {}
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::AnyObject;
    use crate::tag::Tag;

    struct Point {
        x: i32,
        y: i32,
    }
    crate::reflect_object!(Point { x: i32, y: i32 });

    struct Segment {
        a: Point,
        b: Point,
        label: String,
    }
    crate::reflect_object!(Segment {
        a: Point,
        b: Point,
        label: String,
    });

    struct Node {
        value: i32,
        next: Option<Box<Node>>,
    }
    crate::reflect_object!(Node {
        value: i32,
        next: Option<Box<Node>>,
    });

    struct Parent {
        child: Option<Box<Child>>,
    }
    struct Child {
        parent: Option<Box<Parent>>,
    }
    crate::reflect_object!(Parent { child: Option<Box<Child>> });
    crate::reflect_object!(Child { parent: Option<Box<Parent>> });

    enum Level {
        Low,
        High,
    }
    crate::reflect_enum!(Level { Low, High });

    struct Gauge {
        now: Level,
        max: Level,
        history: Vec<Level>,
    }
    crate::reflect_object!(Gauge {
        now: Level,
        max: Level,
        history: Vec<Level>,
    });

    struct Bag {
        items: Vec<AnyObject>,
        extra: Option<AnyObject>,
        raw: Vec<i8>,
    }
    crate::reflect_object!(Bag {
        items: Vec<AnyObject>,
        extra: Option<AnyObject>,
        raw: Vec<i8>,
    });

    #[test]
    fn inspect_is_idempotent() {
        let mut registry = ModelRegistry::new();
        let first = registry.inspect::<Segment>();
        let tree = registry.tree(first).unwrap();
        let len = registry.len();
        let second = registry.inspect::<Segment>();
        assert_eq!(first, second);
        assert_eq!(registry.tree(second).unwrap(), tree);
        assert_eq!(registry.len(), len);
    }

    #[test]
    fn repeated_types_share_one_id() {
        let mut registry = ModelRegistry::new();
        let id = registry.inspect::<Segment>();
        let node = registry.get(id).unwrap();
        let children = node.children().unwrap();
        assert_eq!(children[0].model, children[1].model);
        assert_eq!(registry.model_of_type(TypeId::of::<Point>()), Some(children[0].model));
        // Segment, Point, int, string
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn direct_cycle_terminates() {
        let mut registry = ModelRegistry::new();
        let id = registry.inspect::<Node>();
        let tree = registry.tree(id).unwrap();
        let next = tree.child("next").unwrap();
        assert_eq!(next.id, id);
        assert_eq!(next.tag, Tag::Object);
        assert!(next.children.is_none());
        assert!(next.is_leaf());
    }

    #[test]
    fn indirect_cycle_terminates() {
        let mut registry = ModelRegistry::new();
        let parent = registry.inspect::<Parent>();
        let tree = registry.tree(parent).unwrap();
        let child = tree.child("child").unwrap();
        assert!(child.children.is_some());
        let back = child.child("parent").unwrap();
        assert_eq!(back.id, parent);
        assert!(back.children.is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn enum_model_is_shared() {
        let mut registry = ModelRegistry::new();
        let id = registry.inspect::<Gauge>();
        let children = registry.get(id).unwrap().children().unwrap().to_vec();
        assert_eq!(children[0].model, children[1].model);
        assert_eq!(
            registry.get(children[0].model).unwrap().kind,
            ModelKind::Enum {
                constants: vec!["Low".to_owned(), "High".to_owned()]
            }
        );
        let history = registry.get(children[2].model).unwrap();
        assert_eq!(
            history.kind,
            ModelKind::Array {
                element: ElementKind::Enum,
                element_model: Some(children[0].model),
            }
        );
    }

    #[test]
    fn dynamic_slots() {
        let mut registry = ModelRegistry::new();
        let id = registry.inspect::<Bag>();
        let children = registry.get(id).unwrap().children().unwrap().to_vec();
        assert_eq!(
            registry.get(children[0].model).unwrap().kind,
            ModelKind::Array {
                element: ElementKind::Object,
                element_model: None,
            }
        );
        assert_eq!(registry.get(children[1].model).unwrap().kind, ModelKind::Unknown);
        assert!(registry.get(children[2].model).unwrap().is_leaf());
    }

    #[test]
    fn primitive_root_is_unsupported() {
        let mut registry = ModelRegistry::new();
        let err = registry.inspect_field_type(&FieldType::Primitive(PrimitiveKind::Int));
        assert!(matches!(err, Err(GraphError::UnsupportedType(_))));
        assert!(registry.is_empty());
        let ok = registry.inspect_field_type(&<Point as crate::Slot>::field_type());
        assert!(ok.is_ok());
    }

    #[test]
    fn rollback_forgets_later_models() {
        let mut registry = ModelRegistry::new();
        let point = registry.inspect::<Point>();
        let checkpoint = registry.checkpoint();
        registry.inspect::<Node>();
        assert_eq!(registry.len(), 3);
        registry.rollback(checkpoint);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.model_of_type(TypeId::of::<Node>()), None);
        assert_eq!(registry.inspect::<Point>(), point);
        let node = registry.inspect::<Node>();
        assert_eq!(node, ModelId(2));
    }

    #[test]
    fn unknown_reference() {
        let registry = ModelRegistry::new();
        assert_eq!(
            registry.require(ModelId(7)),
            Err(GraphError::UnknownModelReference(ModelId(7)))
        );
    }
}
