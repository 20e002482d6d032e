//! Scalar values and checked numeric conversion.

use crate::bitvec::BitVector;
use crate::tag::PrimitiveKind;

/// A single primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    BitVector(BitVector),
}

impl Scalar {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Scalar::Byte(_) => PrimitiveKind::Byte,
            Scalar::Short(_) => PrimitiveKind::Short,
            Scalar::Int(_) => PrimitiveKind::Int,
            Scalar::Long(_) => PrimitiveKind::Long,
            Scalar::Float(_) => PrimitiveKind::Float,
            Scalar::Double(_) => PrimitiveKind::Double,
            Scalar::Boolean(_) => PrimitiveKind::Boolean,
            Scalar::String(_) => PrimitiveKind::String,
            Scalar::BitVector(_) => PrimitiveKind::BitVector,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::Byte(v) => Some(v.into()),
            Scalar::Short(v) => Some(v.into()),
            Scalar::Int(v) => Some(v.into()),
            Scalar::Long(v) => Some(v),
            Scalar::Float(v) => exact_integer(v.into()),
            Scalar::Double(v) => exact_integer(v),
            _ => None,
        }
    }

    /// Converts to `kind` without losing information.
    ///
    /// Widening always succeeds. Narrowing succeeds only when the value is
    /// exactly representable in the target kind (`Long(5)` fits an `Int`
    /// slot, `Long(1 << 40)` does not; `Double(0.5)` fits a `Float` slot,
    /// `Double(0.1)` does not). Non-numeric kinds convert only to themselves.
    pub fn convert_to(&self, kind: PrimitiveKind) -> Option<Scalar> {
        if self.kind() == kind {
            return Some(self.clone());
        }
        if !self.kind().is_integer() && !self.kind().is_float() {
            return None;
        }
        match kind {
            PrimitiveKind::Byte => self.as_i64().and_then(|v| i8::try_from(v).ok()).map(Scalar::Byte),
            PrimitiveKind::Short => self
                .as_i64()
                .and_then(|v| i16::try_from(v).ok())
                .map(Scalar::Short),
            PrimitiveKind::Int => self.as_i64().and_then(|v| i32::try_from(v).ok()).map(Scalar::Int),
            PrimitiveKind::Long => self.as_i64().map(Scalar::Long),
            PrimitiveKind::Float => match *self {
                Scalar::Double(v) => {
                    let narrowed = v as f32;
                    (f64::from(narrowed) == v || v.is_nan()).then_some(Scalar::Float(narrowed))
                }
                _ => {
                    let v = self.as_i64()?;
                    let f = v as f32;
                    (f as i128 == i128::from(v)).then_some(Scalar::Float(f))
                }
            },
            PrimitiveKind::Double => match *self {
                Scalar::Float(v) => Some(Scalar::Double(v.into())),
                _ => {
                    let v = self.as_i64()?;
                    let f = v as f64;
                    (f as i128 == i128::from(v)).then_some(Scalar::Double(f))
                }
            },
            PrimitiveKind::Boolean | PrimitiveKind::String | PrimitiveKind::BitVector => None,
        }
    }
}

fn exact_integer(v: f64) -> Option<i64> {
    // 2^63 is the first value past i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (v.fract() == 0.0 && (-LIMIT..LIMIT).contains(&v)).then_some(v as i64)
}
