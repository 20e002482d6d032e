//! Scalar writes addressed by index paths.
//!
//! A path lists one index per level from the root: a field index inside an
//! object, an element index inside an array. The addressed slot must hold a
//! scalar or an enum. Values are converted to the slot's declared kind with
//! [`Scalar::convert_to`], so widening always works and narrowing only when
//! nothing is lost. Failed writes leave the target unchanged.

use crate::error::{GraphError, Result};
use crate::model::{ElementKind, ModelId, ModelKind};
use crate::reflect::{FieldMut, FieldType, Reflect};
use crate::registry::ModelRegistry;
use crate::scalar::Scalar;
use crate::tag::PrimitiveKind;
use crate::value::{Value, ValueTree};

/// Declared type of a writable slot.
enum Leaf {
    Primitive(PrimitiveKind),
    /// Enum with this many constants.
    Enum(usize),
}

/// Replaces the scalar at `path` in a decoded tree.
pub fn set_tree_value(
    registry: &ModelRegistry,
    tree: &mut ValueTree,
    path: &[usize],
    value: Scalar,
) -> Result<()> {
    let Some((&last, parents)) = path.split_last() else {
        return Err(GraphError::TypeMismatch {
            expected: "scalar",
            found: "tree",
        });
    };
    let mut node = tree;
    for (depth, &index) in parents.iter().enumerate() {
        let len = node.values.len();
        node = match node.values.get_mut(index) {
            Some(Value::Tree(child)) => child,
            Some(other) => {
                return Err(GraphError::TypeMismatch {
                    expected: "tree",
                    found: other.kind_name(),
                })
            }
            None => return Err(GraphError::PathOutOfRange { depth, index, len }),
        };
    }
    let len = node.values.len();
    if last >= len {
        return Err(GraphError::PathOutOfRange {
            depth: parents.len(),
            index: last,
            len,
        });
    }
    let converted = match tree_leaf(registry, node.model, last)? {
        Leaf::Primitive(kind) => convert(&value, kind)?,
        Leaf::Enum(count) => Scalar::Int(enum_ordinal(&value, count)? as i32),
    };
    node.values[last] = Value::Scalar(converted);
    Ok(())
}

fn tree_leaf(registry: &ModelRegistry, parent: Option<ModelId>, index: usize) -> Result<Leaf> {
    let parent = parent.ok_or(GraphError::TypeMismatch {
        expected: "modeled tree",
        found: "untyped tree",
    })?;
    let node = registry.require(parent)?;
    let slot = match &node.kind {
        ModelKind::Object {
            children: Some(children),
        } => children.get(index).map(|child| child.model),
        ModelKind::Array {
            element: ElementKind::Primitive(kind),
            ..
        } => return Ok(Leaf::Primitive(*kind)),
        ModelKind::Array { element_model, .. } => *element_model,
        _ => None,
    };
    let slot = slot.ok_or(GraphError::TypeMismatch {
        expected: "scalar",
        found: node.kind.tag().as_str(),
    })?;
    match &registry.require(slot)?.kind {
        ModelKind::Primitive(kind) => Ok(Leaf::Primitive(*kind)),
        ModelKind::Enum { constants } => Ok(Leaf::Enum(constants.len())),
        other => Err(GraphError::TypeMismatch {
            expected: "scalar",
            found: other.tag().as_str(),
        }),
    }
}

/// Writes `value` into the field at `path` of a live instance.
pub fn set_instance_value(target: &mut dyn Reflect, path: &[usize], value: Scalar) -> Result<()> {
    let Some((&index, rest)) = path.split_first() else {
        return Err(GraphError::TypeMismatch {
            expected: "scalar",
            found: "object",
        });
    };
    let len = target.type_info().field_count();
    let field = target
        .field_mut(index)
        .ok_or(GraphError::PathOutOfRange { depth: 0, index, len })?;
    assign(field, rest, 1, value)
}

fn assign(slot: FieldMut<'_>, path: &[usize], depth: usize, value: Scalar) -> Result<()> {
    let Some((&index, rest)) = path.split_first() else {
        return write_leaf(slot, value);
    };
    match slot {
        FieldMut::Object(object) => {
            let len = object.type_info().field_count();
            let field = object
                .field_mut(index)
                .ok_or(GraphError::PathOutOfRange { depth, index, len })?;
            assign(field, rest, depth + 1, value)
        }
        FieldMut::Array(items) => {
            let len = items.len();
            let item = items
                .into_iter()
                .nth(index)
                .ok_or(GraphError::PathOutOfRange { depth, index, len })?;
            assign(item, rest, depth + 1, value)
        }
        other => Err(GraphError::TypeMismatch {
            expected: "object",
            found: slot_name(&other),
        }),
    }
}

macro_rules! store {
    ($slot:expr, $value:expr, $kind:ident) => {
        match $value.convert_to(PrimitiveKind::$kind) {
            Some(Scalar::$kind(v)) => {
                *$slot = v;
                Ok(())
            }
            _ => Err(mismatch(&$value, PrimitiveKind::$kind)),
        }
    };
}

fn write_leaf(slot: FieldMut<'_>, value: Scalar) -> Result<()> {
    match slot {
        FieldMut::Byte(slot) => store!(slot, value, Byte),
        FieldMut::Short(slot) => store!(slot, value, Short),
        FieldMut::Int(slot) => store!(slot, value, Int),
        FieldMut::Long(slot) => store!(slot, value, Long),
        FieldMut::Float(slot) => store!(slot, value, Float),
        FieldMut::Double(slot) => store!(slot, value, Double),
        FieldMut::Boolean(slot) => store!(slot, value, Boolean),
        FieldMut::String(slot) => store!(slot, value, String),
        FieldMut::BitVector(slot) => store!(slot, value, BitVector),
        FieldMut::Enum(slot) => {
            let count = slot.enum_info().constants.len();
            let ordinal = enum_ordinal(&value, count)?;
            if slot.set_ordinal(ordinal) {
                Ok(())
            } else {
                Err(GraphError::OrdinalOutOfRange {
                    ordinal: i64::from(ordinal),
                    count,
                })
            }
        }
        FieldMut::Optional(slot) => {
            let filled = match slot.declared() {
                FieldType::Primitive(kind) => convert(&value, kind)?,
                FieldType::Enum(info) => {
                    Scalar::Int(enum_ordinal(&value, info.constants.len())? as i32)
                }
                _ => {
                    return Err(GraphError::TypeMismatch {
                        expected: "scalar",
                        found: "null",
                    })
                }
            };
            if slot.fill(&filled) {
                Ok(())
            } else {
                Err(GraphError::TypeMismatch {
                    expected: "scalar",
                    found: value.kind().as_str(),
                })
            }
        }
        other => Err(GraphError::TypeMismatch {
            expected: "scalar",
            found: slot_name(&other),
        }),
    }
}

fn slot_name(slot: &FieldMut<'_>) -> &'static str {
    match slot {
        FieldMut::Optional(_) => "null",
        FieldMut::Object(_) => "object",
        FieldMut::Array(_) => "array",
        FieldMut::Enum(_) => "enum",
        _ => "scalar",
    }
}

fn mismatch(value: &Scalar, kind: PrimitiveKind) -> GraphError {
    GraphError::TypeMismatch {
        expected: kind.as_str(),
        found: value.kind().as_str(),
    }
}

fn convert(value: &Scalar, kind: PrimitiveKind) -> Result<Scalar> {
    value.convert_to(kind).ok_or_else(|| mismatch(value, kind))
}

fn enum_ordinal(value: &Scalar, count: usize) -> Result<u32> {
    let ordinal = match value.convert_to(PrimitiveKind::Long) {
        Some(Scalar::Long(ordinal)) if value.kind().is_integer() => ordinal,
        _ => return Err(mismatch(value, PrimitiveKind::Int)),
    };
    match usize::try_from(ordinal) {
        Ok(index) if index < count => Ok(index as u32),
        _ => Err(GraphError::OrdinalOutOfRange { ordinal, count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphDecoder, GraphEncoder};

    #[derive(Debug, PartialEq)]
    enum Phase {
        Idle,
        Busy,
    }
    crate::reflect_enum!(Phase { Idle, Busy });

    struct Inner {
        ratio: f32,
        phase: Phase,
        limit: Option<i64>,
        fallback: Option<Phase>,
    }
    crate::reflect_object!(Inner {
        ratio: f32,
        phase: Phase,
        limit: Option<i64>,
        fallback: Option<Phase>,
    });

    struct Outer {
        id: i32,
        inner: Inner,
        counts: Vec<i64>,
        note: Option<String>,
    }
    crate::reflect_object!(Outer {
        id: i32,
        inner: Inner,
        counts: Vec<i64>,
        note: Option<String>,
    });

    fn outer() -> Outer {
        Outer {
            id: 1,
            inner: Inner {
                ratio: 0.5,
                phase: Phase::Idle,
                limit: None,
                fallback: None,
            },
            counts: vec![10, 20],
            note: None,
        }
    }

    fn decoded() -> (GraphDecoder, ValueTree) {
        let bytes = GraphEncoder::new().encode_object(&outer()).unwrap();
        let mut decoder = GraphDecoder::new();
        let (tree, _) = decoder.decode_object(&bytes).unwrap();
        (decoder, tree)
    }

    #[test]
    fn instance_nested_writes() {
        let mut value = outer();
        set_instance_value(&mut value, &[1, 0], Scalar::Double(0.25)).unwrap();
        set_instance_value(&mut value, &[1, 1], Scalar::Int(1)).unwrap();
        set_instance_value(&mut value, &[2, 1], Scalar::Int(7)).unwrap();
        assert_eq!(value.inner.ratio, 0.25);
        assert_eq!(value.inner.phase, Phase::Busy);
        assert_eq!(value.counts, vec![10, 7]);
    }

    #[test]
    fn instance_rejects_lossy_narrowing() {
        let mut value = outer();
        let err = set_instance_value(&mut value, &[0], Scalar::Long(1 << 40));
        assert_eq!(
            err,
            Err(GraphError::TypeMismatch {
                expected: "int",
                found: "long",
            })
        );
        assert_eq!(value.id, 1);
        set_instance_value(&mut value, &[0], Scalar::Long(-3)).unwrap();
        assert_eq!(value.id, -3);
    }

    #[test]
    fn instance_bounds() {
        let mut value = outer();
        assert_eq!(
            set_instance_value(&mut value, &[2, 5], Scalar::Long(0)),
            Err(GraphError::PathOutOfRange {
                depth: 1,
                index: 5,
                len: 2,
            })
        );
        assert_eq!(
            set_instance_value(&mut value, &[1, 1], Scalar::Int(2)),
            Err(GraphError::OrdinalOutOfRange {
                ordinal: 2,
                count: 2,
            })
        );
        assert_eq!(
            set_instance_value(&mut value, &[1, 3], Scalar::Int(2)),
            Err(GraphError::OrdinalOutOfRange {
                ordinal: 2,
                count: 2,
            })
        );
        assert_eq!(value.inner.fallback, None);
        assert!(matches!(
            set_instance_value(&mut value, &[3, 0], Scalar::Int(0)),
            Err(GraphError::TypeMismatch { found: "null", .. })
        ));
    }

    #[test]
    fn instance_fills_empty_optionals() {
        let mut value = outer();
        set_instance_value(&mut value, &[3], Scalar::String("hi".into())).unwrap();
        set_instance_value(&mut value, &[1, 2], Scalar::Short(12)).unwrap();
        set_instance_value(&mut value, &[1, 3], Scalar::Byte(1)).unwrap();
        assert_eq!(value.note.as_deref(), Some("hi"));
        assert_eq!(value.inner.limit, Some(12));
        assert_eq!(value.inner.fallback, Some(Phase::Busy));

        set_instance_value(&mut value, &[1, 2], Scalar::Int(-1)).unwrap();
        assert_eq!(value.inner.limit, Some(-1));
        assert!(matches!(
            set_instance_value(&mut value, &[3], Scalar::Boolean(true)),
            Err(GraphError::TypeMismatch { expected: "string", .. })
        ));
        assert_eq!(value.note.as_deref(), Some("hi"));
    }

    #[test]
    fn tree_writes_follow_the_model() {
        let (decoder, mut tree) = decoded();
        set_tree_value(&decoder.registry, &mut tree, &[1, 0], Scalar::Byte(2)).unwrap();
        set_tree_value(&decoder.registry, &mut tree, &[1, 1], Scalar::Short(1)).unwrap();
        set_tree_value(&decoder.registry, &mut tree, &[2, 0], Scalar::Int(5)).unwrap();
        set_tree_value(&decoder.registry, &mut tree, &[3], Scalar::String("hi".into())).unwrap();
        assert_eq!(tree.get(&[1, 0]), Some(&Value::Scalar(Scalar::Float(2.0))));
        assert_eq!(tree.get(&[1, 1]), Some(&Value::Scalar(Scalar::Int(1))));
        assert_eq!(tree.get(&[2, 0]), Some(&Value::Scalar(Scalar::Long(5))));
        assert_eq!(tree.get(&[3]), Some(&Value::Scalar(Scalar::String("hi".into()))));
    }

    #[test]
    fn tree_errors_leave_values_alone() {
        let (decoder, mut tree) = decoded();
        let before = tree.clone();
        assert!(matches!(
            set_tree_value(&decoder.registry, &mut tree, &[0], Scalar::Boolean(true)),
            Err(GraphError::TypeMismatch { .. })
        ));
        assert!(matches!(
            set_tree_value(&decoder.registry, &mut tree, &[1, 7], Scalar::Int(0)),
            Err(GraphError::PathOutOfRange { depth: 1, index: 7, len: 4 })
        ));
        assert!(matches!(
            set_tree_value(&decoder.registry, &mut tree, &[1], Scalar::Int(0)),
            Err(GraphError::TypeMismatch { .. })
        ));
        assert_eq!(tree, before);
    }
}
