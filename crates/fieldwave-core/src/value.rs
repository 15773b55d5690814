//! Tagged values shared between devices
//!
//! Every value a program exports travels as a [`Value`]: a self-describing
//! variant that carries its own type tag. The receiving program converts it
//! back with [`Exportable::from_value`], which doubles as the schema check for
//! that alignment point: a shape that does not match yields `None` and the
//! neighbor is treated as having no value there.

use std::collections::BTreeMap;

use crate::{DeviceId, LogicalTime};

/// Value type tags (also the wire tags)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    Unit = 0x00,
    Bool = 0x01,
    Int = 0x02,
    Real = 0x03,
    Device = 0x04,
    Tuple = 0x05,
    List = 0x06,
    Map = 0x07,
}

impl ValueKind {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(ValueKind::Unit),
            0x01 => Some(ValueKind::Bool),
            0x02 => Some(ValueKind::Int),
            0x03 => Some(ValueKind::Real),
            0x04 => Some(ValueKind::Device),
            0x05 => Some(ValueKind::Tuple),
            0x06 => Some(ValueKind::List),
            0x07 => Some(ValueKind::Map),
            _ => None,
        }
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Self-describing exported value
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Real(f64),
    Device(DeviceId),
    /// Fixed-arity heterogeneous group
    Tuple(Vec<Value>),
    /// Homogeneous sequence
    List(Vec<Value>),
    /// Key/value pairs in key order
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unit => ValueKind::Unit,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Real(_) => ValueKind::Real,
            Value::Device(_) => ValueKind::Device,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Numeric view used by observers (storage summaries)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Nesting depth (scalars are 0)
    pub fn depth(&self) -> usize {
        match self {
            Value::Tuple(items) | Value::List(items) => {
                1 + items.iter().map(Value::depth).max().unwrap_or(0)
            }
            Value::Map(entries) => {
                1 + entries
                    .iter()
                    .map(|(k, v)| k.depth().max(v.depth()))
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }
}

/// A type that can be exported to neighbors or kept as temporal state
pub trait Exportable: Sized {
    fn to_value(&self) -> Value;

    /// `None` when `value` does not have this type's shape
    fn from_value(value: &Value) -> Option<Self>;
}

impl Exportable for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl Exportable for () {
    fn to_value(&self) -> Value {
        Value::Unit
    }

    fn from_value(value: &Value) -> Option<Self> {
        matches!(value, Value::Unit).then_some(())
    }
}

impl Exportable for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

macro_rules! checked_int_exportable {
    ($($t:ty),*) => {
        $(
            impl Exportable for $t {
                fn to_value(&self) -> Value {
                    Value::Int(*self as i64)
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(i) => <$t>::try_from(*i).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

checked_int_exportable!(i8, i16, i32, i64, u8, u16, u32, usize);

// u64 travels bit-for-bit through the i64 slot
impl Exportable for u64 {
    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i as u64),
            _ => None,
        }
    }
}

impl Exportable for f64 {
    fn to_value(&self) -> Value {
        Value::Real(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }
}

impl Exportable for DeviceId {
    fn to_value(&self) -> Value {
        Value::Device(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Device(id) => Some(*id),
            _ => None,
        }
    }
}

impl Exportable for LogicalTime {
    fn to_value(&self) -> Value {
        Value::Real(self.0)
    }

    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(LogicalTime)
    }
}

impl<A: Exportable, B: Exportable> Exportable for (A, B) {
    fn to_value(&self) -> Value {
        Value::Tuple(vec![self.0.to_value(), self.1.to_value()])
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Tuple(items) if items.len() == 2 => {
                Some((A::from_value(&items[0])?, B::from_value(&items[1])?))
            }
            _ => None,
        }
    }
}

impl<A: Exportable, B: Exportable, C: Exportable> Exportable for (A, B, C) {
    fn to_value(&self) -> Value {
        Value::Tuple(vec![
            self.0.to_value(),
            self.1.to_value(),
            self.2.to_value(),
        ])
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Tuple(items) if items.len() == 3 => Some((
                A::from_value(&items[0])?,
                B::from_value(&items[1])?,
                C::from_value(&items[2])?,
            )),
            _ => None,
        }
    }
}

impl<T: Exportable> Exportable for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Exportable::to_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: Exportable> Exportable for Option<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Exportable::to_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) if items.is_empty() => Some(None),
            Value::List(items) if items.len() == 1 => T::from_value(&items[0]).map(Some),
            _ => None,
        }
    }
}

impl<K: Exportable + Ord, V: Exportable> Exportable for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            _ => None,
        }
    }
}
