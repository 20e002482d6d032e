//! Structural model nodes.

use std::fmt;

use crate::tag::{PrimitiveKind, Tag};

/// Identifier of a model within one registry session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub u32);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of the elements of an array model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Primitive(PrimitiveKind),
    Object,
    Enum,
    Array,
}

impl ElementKind {
    pub fn tag(self) -> Tag {
        match self {
            ElementKind::Primitive(kind) => kind.tag(),
            ElementKind::Object => Tag::Object,
            ElementKind::Enum => Tag::Enum,
            ElementKind::Array => Tag::Array,
        }
    }

    pub fn from_tag(tag: Tag) -> Option<ElementKind> {
        match tag {
            Tag::Object => Some(ElementKind::Object),
            Tag::Enum => Some(ElementKind::Enum),
            Tag::Array => Some(ElementKind::Array),
            _ => PrimitiveKind::from_tag(tag).map(ElementKind::Primitive),
        }
    }
}

/// A named field of an object model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChild {
    pub name: String,
    pub model: ModelId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelKind {
    Primitive(PrimitiveKind),
    /// `children` is `None` while the object is still being described.
    Object { children: Option<Vec<ModelChild>> },
    /// `element_model` is `None` for primitive elements and for elements
    /// whose concrete type is discovered per value.
    Array {
        element: ElementKind,
        element_model: Option<ModelId>,
    },
    /// Constant names in declaration order; the index is the ordinal.
    Enum { constants: Vec<String> },
    /// Opaque slot; no value bytes are exchanged for it.
    Unknown,
}

impl ModelKind {
    pub fn tag(&self) -> Tag {
        match self {
            ModelKind::Primitive(kind) => kind.tag(),
            ModelKind::Object { .. } => Tag::Object,
            ModelKind::Array { .. } => Tag::Array,
            ModelKind::Enum { .. } => Tag::Enum,
            ModelKind::Unknown => Tag::Unknown,
        }
    }
}

/// Shape of one distinct type, stored in a registry arena.
///
/// Nodes are shared between fields, so a field's name lives on the
/// [`ModelChild`] entry of its parent, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNode {
    pub id: ModelId,
    pub kind: ModelKind,
}

impl ModelNode {
    pub fn new(id: ModelId, kind: ModelKind) -> Self {
        Self { id, kind }
    }

    /// Whether values of this model carry no nested structure to decode.
    pub fn is_leaf(&self) -> bool {
        match &self.kind {
            ModelKind::Primitive(_) | ModelKind::Unknown => true,
            ModelKind::Object { children } => children.is_none(),
            ModelKind::Array { element, .. } => matches!(element, ElementKind::Primitive(_)),
            ModelKind::Enum { .. } => false,
        }
    }

    pub fn children(&self) -> Option<&[ModelChild]> {
        match &self.kind {
            ModelKind::Object { children } => children.as_deref(),
            _ => None,
        }
    }

    /// Position of the field called `name`.
    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children()?.iter().position(|c| c.name == name)
    }
}

/// Expanded, owned view of a model rooted at one id.
///
/// A nested occurrence of an ancestor's id is cut: it keeps the id but has
/// `children == None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTree {
    pub id: ModelId,
    /// Field name, empty for the root and for array elements.
    pub name: String,
    pub tag: Tag,
    pub children: Option<Vec<ModelTree>>,
    /// Element kind of an array.
    pub element_kind: Option<ElementKind>,
    /// Element model of an array, when it is known statically.
    pub element: Option<Box<ModelTree>>,
    /// Enum constants in declaration order.
    pub constants: Vec<String>,
}

impl ModelTree {
    pub fn is_leaf(&self) -> bool {
        match self.tag {
            Tag::Object => self.children.is_none(),
            Tag::Array => matches!(self.element_kind, Some(ElementKind::Primitive(_))),
            Tag::Enum => false,
            _ => true,
        }
    }

    pub fn child(&self, name: &str) -> Option<&ModelTree> {
        self.children.as_ref()?.iter().find(|c| c.name == name)
    }
}
