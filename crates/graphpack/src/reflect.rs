//! Static type descriptions and runtime field access.
//!
//! A composite type opts in by implementing [`Reflect`], usually through
//! [`reflect_object!`](crate::reflect_object). Field types implement
//! [`Slot`]; the crate covers primitives, `String`, [`BitVector`],
//! `Option`, `Box`, `Vec` and [`AnyObject`], and the registration macros
//! cover user structs and enums.
//!
//! ```
//! use graphpack::{reflect_enum, reflect_object};
//!
//! enum Shape { Circle, Square }
//! reflect_enum!(Shape { Circle, Square });
//!
//! struct Tile { id: i32, shape: Shape, next: Option<Box<Tile>> }
//! reflect_object!(Tile { id: i32, shape: Shape, next: Option<Box<Tile>> });
//! ```

use std::any::{Any, TypeId};
use std::fmt;

use crate::bitvec::BitVector;
use crate::scalar::Scalar;
use crate::tag::PrimitiveKind;

/// Static description of a composite type.
///
/// Field lists are produced lazily through a function pointer, so
/// self-referencing types can be described without infinite recursion.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub type_id: TypeId,
    pub fields: fn() -> Vec<FieldDef>,
}

impl TypeInfo {
    pub fn of<T: Any>(name: &'static str, fields: fn() -> Vec<FieldDef>) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            fields,
        }
    }

    pub fn field_count(&self) -> usize {
        (self.fields)().len()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo").field("name", &self.name).finish()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

/// Static description of an enumeration: constant names in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct EnumInfo {
    pub name: &'static str,
    pub type_id: TypeId,
    pub constants: &'static [&'static str],
}

impl EnumInfo {
    pub fn of<T: Any>(name: &'static str, constants: &'static [&'static str]) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            constants,
        }
    }
}

/// Declared type of a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    Primitive(PrimitiveKind),
    Object(TypeInfo),
    Array(Box<FieldType>),
    Enum(EnumInfo),
    /// A reference whose concrete type is only known at runtime.
    Dynamic,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldDef {
    pub fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// Read access to a field's current value.
pub enum FieldValue<'a> {
    Null,
    Scalar(Scalar),
    Enum(u32),
    Object(&'a dyn Reflect),
    Array(Vec<FieldValue<'a>>),
}

impl FieldValue<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Scalar(s) => s.kind().as_str(),
            FieldValue::Enum(_) => "enum",
            FieldValue::Object(_) => "object",
            FieldValue::Array(_) => "array",
        }
    }
}

/// Write access to a field, used by path mutation.
pub enum FieldMut<'a> {
    /// An optional field that currently holds nothing.
    Optional(&'a mut dyn OptionSlot),
    Byte(&'a mut i8),
    Short(&'a mut i16),
    Int(&'a mut i32),
    Long(&'a mut i64),
    Float(&'a mut f32),
    Double(&'a mut f64),
    Boolean(&'a mut bool),
    String(&'a mut String),
    BitVector(&'a mut BitVector),
    Enum(&'a mut dyn Enumeration),
    Object(&'a mut dyn Reflect),
    Array(Vec<FieldMut<'a>>),
}

/// A composite type whose fields can be walked at runtime.
pub trait Reflect: Any {
    /// Declared shape of the implementing type.
    fn describe() -> TypeInfo
    where
        Self: Sized;

    /// Concrete runtime type of `self`.
    fn type_info(&self) -> TypeInfo;

    /// Value of the field at `index` in declaration order.
    fn field(&self, index: usize) -> Option<FieldValue<'_>>;

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
}

/// A fieldless enum addressed by ordinal.
pub trait Enumeration {
    fn info() -> EnumInfo
    where
        Self: Sized;

    /// [`Enumeration::info`] through a trait object.
    fn enum_info(&self) -> EnumInfo;

    fn ordinal(&self) -> u32;

    /// Replaces `self` with the constant at `ordinal`; false if out of range.
    fn set_ordinal(&mut self, ordinal: u32) -> bool;
}

/// A type that can appear as a field of a [`Reflect`] type.
pub trait Slot {
    fn field_type() -> FieldType;
    fn value(&self) -> FieldValue<'_>;
    fn value_mut(&mut self) -> FieldMut<'_>;

    /// Builds a value from a scalar of exactly the declared kind, or an
    /// `Int` ordinal for enums. Composite slots return `None`.
    fn from_scalar(_value: &Scalar) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

/// An empty `Option<T>` field that path mutation can fill.
pub trait OptionSlot {
    /// Declared type of the wrapped value.
    fn declared(&self) -> FieldType;

    /// Stores `Some` built from `value`; false if `value` cannot build one.
    fn fill(&mut self, value: &Scalar) -> bool;
}

impl<T: Slot> OptionSlot for Option<T> {
    fn declared(&self) -> FieldType {
        T::field_type()
    }

    fn fill(&mut self, value: &Scalar) -> bool {
        match T::from_scalar(value) {
            Some(v) => {
                *self = Some(v);
                true
            }
            None => false,
        }
    }
}

/// Owned reference to a value of any reflected type.
///
/// Declaring a field or array element as `AnyObject` defers model discovery
/// to encode time, where the concrete type of each value is inspected.
pub struct AnyObject(pub Box<dyn Reflect>);

impl AnyObject {
    pub fn new<T: Reflect>(value: T) -> Self {
        Self(Box::new(value))
    }
}

impl fmt::Debug for AnyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyObject").field(&self.0.type_info().name).finish()
    }
}

macro_rules! primitive_slot {
    ($ty:ty, $kind:ident) => {
        impl Slot for $ty {
            fn field_type() -> FieldType {
                FieldType::Primitive(PrimitiveKind::$kind)
            }

            fn value(&self) -> FieldValue<'_> {
                FieldValue::Scalar(Scalar::$kind(Clone::clone(self)))
            }

            fn value_mut(&mut self) -> FieldMut<'_> {
                FieldMut::$kind(self)
            }

            fn from_scalar(value: &Scalar) -> Option<Self> {
                match value {
                    Scalar::$kind(v) => Some(Clone::clone(v)),
                    _ => None,
                }
            }
        }
    };
}

primitive_slot!(i8, Byte);
primitive_slot!(i16, Short);
primitive_slot!(i32, Int);
primitive_slot!(i64, Long);
primitive_slot!(f32, Float);
primitive_slot!(f64, Double);
primitive_slot!(bool, Boolean);
primitive_slot!(String, String);
primitive_slot!(BitVector, BitVector);

impl<T: Slot> Slot for Option<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn value(&self) -> FieldValue<'_> {
        match self {
            Some(v) => v.value(),
            None => FieldValue::Null,
        }
    }

    fn value_mut(&mut self) -> FieldMut<'_> {
        match self {
            Some(v) => v.value_mut(),
            empty @ None => FieldMut::Optional(empty),
        }
    }
}

impl<T: Slot> Slot for Box<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn value(&self) -> FieldValue<'_> {
        (**self).value()
    }

    fn value_mut(&mut self) -> FieldMut<'_> {
        (**self).value_mut()
    }

    fn from_scalar(value: &Scalar) -> Option<Self> {
        T::from_scalar(value).map(Box::new)
    }
}

impl<T: Slot> Slot for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::Array(Box::new(T::field_type()))
    }

    fn value(&self) -> FieldValue<'_> {
        FieldValue::Array(self.iter().map(Slot::value).collect())
    }

    fn value_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Array(self.iter_mut().map(Slot::value_mut).collect())
    }
}

impl Slot for AnyObject {
    fn field_type() -> FieldType {
        FieldType::Dynamic
    }

    fn value(&self) -> FieldValue<'_> {
        FieldValue::Object(&*self.0)
    }

    fn value_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Object(&mut *self.0)
    }
}

/// Implements [`Reflect`] and [`Slot`] for a struct.
///
/// List the fields to expose, with their types, in wire order.
#[macro_export]
macro_rules! reflect_object {
    ($ty:ident { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Reflect for $ty {
            fn describe() -> $crate::TypeInfo {
                fn fields() -> ::std::vec::Vec<$crate::FieldDef> {
                    ::std::vec![$(
                        $crate::FieldDef::new(
                            ::std::stringify!($field),
                            <$fty as $crate::Slot>::field_type(),
                        )
                    ),*]
                }
                $crate::TypeInfo::of::<$ty>(::std::stringify!($ty), fields)
            }

            fn type_info(&self) -> $crate::TypeInfo {
                <Self as $crate::Reflect>::describe()
            }

            #[allow(unused_mut, unused_assignments, unused_variables)]
            fn field(&self, index: usize) -> ::std::option::Option<$crate::FieldValue<'_>> {
                let mut at = 0usize;
                $(
                    if index == at {
                        return ::std::option::Option::Some($crate::Slot::value(&self.$field));
                    }
                    at += 1;
                )*
                ::std::option::Option::None
            }

            #[allow(unused_mut, unused_assignments, unused_variables)]
            fn field_mut(&mut self, index: usize) -> ::std::option::Option<$crate::FieldMut<'_>> {
                let mut at = 0usize;
                $(
                    if index == at {
                        return ::std::option::Option::Some($crate::Slot::value_mut(&mut self.$field));
                    }
                    at += 1;
                )*
                ::std::option::Option::None
            }
        }

        impl $crate::Slot for $ty {
            fn field_type() -> $crate::FieldType {
                $crate::FieldType::Object(<$ty as $crate::Reflect>::describe())
            }

            fn value(&self) -> $crate::FieldValue<'_> {
                $crate::FieldValue::Object(self)
            }

            fn value_mut(&mut self) -> $crate::FieldMut<'_> {
                $crate::FieldMut::Object(self)
            }
        }
    };
}

/// Implements [`Enumeration`] and [`Slot`] for a fieldless enum.
///
/// Variants must be listed in declaration order; the position in the list
/// is the ordinal sent on the wire.
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::Enumeration for $ty {
            fn info() -> $crate::EnumInfo {
                $crate::EnumInfo::of::<$ty>(
                    ::std::stringify!($ty),
                    &[$(::std::stringify!($variant)),+],
                )
            }

            fn enum_info(&self) -> $crate::EnumInfo {
                <Self as $crate::Enumeration>::info()
            }

            fn ordinal(&self) -> u32 {
                let hits = [$(::std::matches!(self, $ty::$variant)),+];
                hits.iter().position(|hit| *hit).unwrap_or(0) as u32
            }

            fn set_ordinal(&mut self, ordinal: u32) -> bool {
                let constants = [$($ty::$variant),+];
                match constants.into_iter().nth(ordinal as usize) {
                    ::std::option::Option::Some(constant) => {
                        *self = constant;
                        true
                    }
                    ::std::option::Option::None => false,
                }
            }
        }

        impl $crate::Slot for $ty {
            fn field_type() -> $crate::FieldType {
                $crate::FieldType::Enum(<$ty as $crate::Enumeration>::info())
            }

            fn value(&self) -> $crate::FieldValue<'_> {
                $crate::FieldValue::Enum($crate::Enumeration::ordinal(self))
            }

            fn value_mut(&mut self) -> $crate::FieldMut<'_> {
                $crate::FieldMut::Enum(self)
            }

            fn from_scalar(value: &$crate::Scalar) -> ::std::option::Option<Self> {
                let $crate::Scalar::Int(ordinal) = value else {
                    return ::std::option::Option::None;
                };
                let constants = [$($ty::$variant),+];
                <usize as ::std::convert::TryFrom<i32>>::try_from(*ordinal)
                    .ok()
                    .and_then(|index| constants.into_iter().nth(index))
            }
        }
    };
}
