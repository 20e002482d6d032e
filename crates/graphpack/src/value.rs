//! Decoded values.

use serde_json::{Map, Number, Value as JsonValue};

use crate::model::{ModelId, ModelKind};
use crate::registry::ModelRegistry;
use crate::scalar::Scalar;

/// One slot of a [`ValueTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Scalar(Scalar),
    Tree(ValueTree),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ValueTree> {
        match self {
            Value::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut ValueTree> {
        match self {
            Value::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Scalar(scalar) => scalar.kind().as_str(),
            Value::Tree(_) => "tree",
        }
    }
}

/// A decoded object or array.
///
/// `values` follows the field order of `model` for objects and element order
/// for arrays. Nodes are addressed from the root by index paths; there are no
/// parent links.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueTree {
    pub model: Option<ModelId>,
    pub values: Vec<Value>,
}

impl ValueTree {
    pub fn new(model: Option<ModelId>) -> Self {
        Self {
            model,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Slot at `path`, one index per level. An empty path addresses nothing.
    pub fn get(&self, path: &[usize]) -> Option<&Value> {
        let (&last, parents) = path.split_last()?;
        let mut tree = self;
        for &index in parents {
            tree = tree.values.get(index)?.as_tree()?;
        }
        tree.values.get(last)
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Value> {
        let (&last, parents) = path.split_last()?;
        let mut tree = self;
        for &index in parents {
            tree = tree.values.get_mut(index)?.as_tree_mut()?;
        }
        tree.values.get_mut(last)
    }

    /// Value of the field called `name`, looked up through the model.
    pub fn field(&self, registry: &ModelRegistry, name: &str) -> Option<&Value> {
        let index = registry.get(self.model?)?.child_index(name)?;
        self.values.get(index)
    }

    /// Renders the tree as JSON: objects keyed by field name, enums by
    /// constant name, bit vectors as the list of set bit indices.
    pub fn to_json(&self, registry: &ModelRegistry) -> JsonValue {
        match self.model.and_then(|id| registry.get(id)).map(|node| &node.kind) {
            Some(ModelKind::Object {
                children: Some(children),
            }) => {
                let mut map = Map::new();
                for (child, value) in children.iter().zip(&self.values) {
                    map.insert(child.name.clone(), slot_json(registry, Some(child.model), value));
                }
                JsonValue::Object(map)
            }
            Some(ModelKind::Array { element_model, .. }) => JsonValue::Array(
                self.values
                    .iter()
                    .map(|value| slot_json(registry, *element_model, value))
                    .collect(),
            ),
            Some(ModelKind::Unknown) => JsonValue::Null,
            _ => JsonValue::Array(
                self.values
                    .iter()
                    .map(|value| slot_json(registry, None, value))
                    .collect(),
            ),
        }
    }
}

fn slot_json(registry: &ModelRegistry, slot: Option<ModelId>, value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Tree(tree) => tree.to_json(registry),
        Value::Scalar(Scalar::Int(ordinal)) => {
            let constant = match slot.and_then(|id| registry.get(id)).map(|node| &node.kind) {
                Some(ModelKind::Enum { constants }) => usize::try_from(*ordinal)
                    .ok()
                    .and_then(|index| constants.get(index)),
                _ => None,
            };
            match constant {
                Some(name) => JsonValue::String(name.clone()),
                None => JsonValue::from(*ordinal),
            }
        }
        Value::Scalar(scalar) => scalar_json(scalar),
    }
}

fn scalar_json(scalar: &Scalar) -> JsonValue {
    match scalar {
        Scalar::Byte(v) => JsonValue::from(*v),
        Scalar::Short(v) => JsonValue::from(*v),
        Scalar::Int(v) => JsonValue::from(*v),
        Scalar::Long(v) => JsonValue::from(*v),
        Scalar::Float(v) => Number::from_f64(f64::from(*v)).map_or(JsonValue::Null, JsonValue::Number),
        Scalar::Double(v) => Number::from_f64(*v).map_or(JsonValue::Null, JsonValue::Number),
        Scalar::Boolean(v) => JsonValue::Bool(*v),
        Scalar::String(v) => JsonValue::String(v.clone()),
        Scalar::BitVector(bits) => JsonValue::Array(bits.ones().map(JsonValue::from).collect()),
    }
}
